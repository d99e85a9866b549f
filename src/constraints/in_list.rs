//! Membership in an enumerated set of values.

use super::{Constraint, ConstraintBase};
use crate::core::{SourceLine, Value, ValueType};
use crate::error::ConfigError;

/// `inList`: value must equal one of the listed values.
#[derive(Debug)]
pub struct InListConstraint {
    base: ConstraintBase,
}

impl InListConstraint {
    /// Create an in-list constraint.
    pub fn new(key: &str, expectation: Value, defined_at: SourceLine) -> Self {
        Self {
            base: ConstraintBase::new(key, expectation, defined_at),
        }
    }

    fn allowed(&self) -> Option<&[Value]> {
        self.base.expectation.as_list().filter(|items| !items.is_empty())
    }
}

impl Constraint for InListConstraint {
    fn name(&self) -> &'static str {
        "inList"
    }

    fn base(&self) -> &ConstraintBase {
        &self.base
    }

    fn supports(&self, _value_type: ValueType) -> bool {
        true
    }

    fn is_valid_expectation(&self) -> bool {
        self.allowed().is_some()
    }

    fn do_validate(&self, value: &Value) -> Option<ConfigError> {
        let allowed = self.allowed()?;
        (!allowed.contains(value)).then(|| self.violation(value))
    }
}
