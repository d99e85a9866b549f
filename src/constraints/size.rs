//! Length of strings and lists.

use super::{Constraint, ConstraintBase, Expectation};
use crate::core::{RangeBound, SourceLine, Value, ValueRange, ValueType};
use crate::error::ConfigError;

/// Accepted sizes, both ends inclusive unless stated otherwise.
#[derive(Debug, Clone, PartialEq)]
pub enum SizeBounds {
    /// Exactly this many elements or characters.
    Exact(usize),
    /// Within an integer range.
    Within(ValueRange),
}

/// `size`: string length (in characters) or list length must match.
///
/// Accepts `size: 3`, `size: 1..10` or `size: 0..<8`.
#[derive(Debug)]
pub struct SizeConstraint {
    base: ConstraintBase,
    bounds: Expectation<SizeBounds>,
}

impl SizeConstraint {
    /// Create a size constraint.
    pub fn new(key: &str, expectation: Value, defined_at: SourceLine) -> Self {
        let bounds = parse_bounds(&expectation).into();
        Self {
            base: ConstraintBase::new(key, expectation, defined_at),
            bounds,
        }
    }
}

fn parse_bounds(expectation: &Value) -> Option<SizeBounds> {
    match expectation {
        Value::Integer(n) => usize::try_from(*n).ok().map(SizeBounds::Exact),
        Value::Range(range) => {
            let (from, _) = range.integer_bounds()?;
            (from >= 0 && range.is_well_formed()).then(|| SizeBounds::Within(range.clone()))
        }
        _ => None,
    }
}

impl Constraint for SizeConstraint {
    fn name(&self) -> &'static str {
        "size"
    }

    fn base(&self) -> &ConstraintBase {
        &self.base
    }

    fn supports(&self, value_type: ValueType) -> bool {
        matches!(value_type, ValueType::String | ValueType::List)
    }

    fn is_valid_expectation(&self) -> bool {
        self.bounds.is_valid()
    }

    fn do_validate(&self, value: &Value) -> Option<ConfigError> {
        let size = match value {
            Value::String(s) => s.chars().count(),
            Value::List(items) => items.len(),
            _ => return Some(self.violation(value)),
        };
        let accepted = match self.bounds.get()? {
            SizeBounds::Exact(expected) => size == *expected,
            SizeBounds::Within(range) => i64::try_from(size)
                .ok()
                .and_then(|size| range.contains(&RangeBound::Integer(size)))
                .unwrap_or(false),
        };
        (!accepted).then(|| self.violation(value))
    }
}
