//! Membership in a typed interval.

use super::{Constraint, ConstraintBase};
use crate::core::{RangeBound, SourceLine, Value, ValueRange, ValueType};
use crate::error::ConfigError;

/// `range`: value must lie within `from..to` / `from..<to`.
///
/// The value's type has to match the range's bound type: integer ranges take
/// integers, decimal ranges take floats and decimals, string ranges take
/// strings. A comparable value of another type yields
/// [`ConfigError::RangeTypeMismatch`].
#[derive(Debug)]
pub struct RangeConstraint {
    base: ConstraintBase,
}

impl RangeConstraint {
    /// Create a range constraint.
    pub fn new(key: &str, expectation: Value, defined_at: SourceLine) -> Self {
        Self {
            base: ConstraintBase::new(key, expectation, defined_at),
        }
    }

    fn range(&self) -> Option<&ValueRange> {
        match &self.base.expectation {
            Value::Range(range) if range.is_well_formed() => Some(range),
            _ => None,
        }
    }
}

/// Convert a value into a bound of the given range's kind, if types match.
fn as_bound(value: &Value, range: &ValueRange) -> Option<RangeBound> {
    match (&range.from, value) {
        (RangeBound::Integer(_), Value::Integer(i)) => Some(RangeBound::Integer(*i)),
        (RangeBound::Decimal(_), Value::Decimal(d)) => Some(RangeBound::Decimal(d.clone())),
        (RangeBound::Decimal(_), Value::Float(_)) => match value.decimal_repr() {
            Some(Ok(d)) => Some(RangeBound::Decimal(d)),
            _ => None,
        },
        (RangeBound::Text(_), Value::String(s)) => Some(RangeBound::Text(s.clone())),
        _ => None,
    }
}

impl Constraint for RangeConstraint {
    fn name(&self) -> &'static str {
        "range"
    }

    fn base(&self) -> &ConstraintBase {
        &self.base
    }

    fn supports(&self, value_type: ValueType) -> bool {
        value_type.is_numeric() || value_type == ValueType::String
    }

    fn is_valid_expectation(&self) -> bool {
        self.range().is_some()
    }

    fn do_validate(&self, value: &Value) -> Option<ConfigError> {
        let range = self.range()?;
        if let Value::Float(x) = value
            && !x.is_finite()
            && matches!(range.from, RangeBound::Decimal(_))
        {
            return Some(ConfigError::InvalidNumber {
                constraint: self.name(),
                key: self.key().to_string(),
                value: value.clone(),
                defined_at: self.defined_at().clone(),
            });
        }
        let Some(bound) = as_bound(value, range) else {
            return Some(ConfigError::RangeTypeMismatch {
                key: self.key().to_string(),
                value: value.clone(),
                value_type: value.value_type(),
                range: self.expectation().clone(),
                bound_type: range.bound_type(),
                defined_at: self.defined_at().clone(),
            });
        };
        match range.contains(&bound) {
            Some(true) => None,
            _ => Some(self.violation(value)),
        }
    }
}
