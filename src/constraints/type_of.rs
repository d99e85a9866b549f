//! Runtime type expectations.

use super::{Constraint, ConstraintBase, Expectation};
use crate::core::{SourceLine, Value, ValueType};
use crate::error::ConfigError;

/// Type names accepted by `type`, with the runtime types each one admits.
fn admitted_types(name: &str) -> Option<&'static [ValueType]> {
    let types: &'static [ValueType] = match name.trim().to_ascii_lowercase().as_str() {
        "string" => &[ValueType::String],
        "integer" | "int" | "long" => &[ValueType::Integer],
        "float" | "double" => &[ValueType::Float],
        "decimal" | "bigdecimal" => &[ValueType::Decimal],
        "number" => &[ValueType::Integer, ValueType::Float, ValueType::Decimal],
        "boolean" | "bool" => &[ValueType::Bool],
        "list" => &[ValueType::List],
        "map" => &[ValueType::Map],
        "url" | "uri" => &[ValueType::Url],
        _ => return None,
    };
    Some(types)
}

/// `type`: value's runtime type must be the named one.
#[derive(Debug)]
pub struct TypeConstraint {
    base: ConstraintBase,
    admitted: Expectation<&'static [ValueType]>,
}

impl TypeConstraint {
    /// Create a type constraint.
    pub fn new(key: &str, expectation: Value, defined_at: SourceLine) -> Self {
        let admitted = expectation.as_str().and_then(admitted_types).into();
        Self {
            base: ConstraintBase::new(key, expectation, defined_at),
            admitted,
        }
    }
}

impl Constraint for TypeConstraint {
    fn name(&self) -> &'static str {
        "type"
    }

    fn base(&self) -> &ConstraintBase {
        &self.base
    }

    fn supports(&self, _value_type: ValueType) -> bool {
        true
    }

    fn is_valid_expectation(&self) -> bool {
        self.admitted.is_valid()
    }

    fn do_validate(&self, value: &Value) -> Option<ConfigError> {
        let admitted = self.admitted.get()?;
        (!admitted.contains(&value.value_type())).then(|| self.violation(value))
    }
}
