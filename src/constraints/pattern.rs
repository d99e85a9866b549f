//! Regular expression matching.

use super::{Constraint, ConstraintBase, Expectation};
use crate::core::{SourceLine, Value, ValueType};
use crate::error::ConfigError;
use regex::Regex;

/// `matches`: the whole string must match the pattern.
#[derive(Debug)]
pub struct PatternConstraint {
    base: ConstraintBase,
    pattern: Expectation<Regex>,
}

impl PatternConstraint {
    /// Create a pattern constraint; an uncompilable pattern is an invalid
    /// expectation.
    pub fn new(key: &str, expectation: Value, defined_at: SourceLine) -> Self {
        let pattern = expectation
            .as_str()
            .and_then(|p| Regex::new(&format!("^(?:{})$", p)).ok())
            .into();
        Self {
            base: ConstraintBase::new(key, expectation, defined_at),
            pattern,
        }
    }
}

impl Constraint for PatternConstraint {
    fn name(&self) -> &'static str {
        "matches"
    }

    fn base(&self) -> &ConstraintBase {
        &self.base
    }

    fn supports(&self, value_type: ValueType) -> bool {
        value_type == ValueType::String
    }

    fn is_valid_expectation(&self) -> bool {
        self.pattern.is_valid()
    }

    fn do_validate(&self, value: &Value) -> Option<ConfigError> {
        let pattern = self.pattern.get()?;
        let text = value.as_str()?;
        (!pattern.is_match(text)).then(|| self.violation(value))
    }
}
