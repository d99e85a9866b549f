//! Numeric bounds compared as arbitrary precision decimals.
//!
//! Both sides are converted through their string form into a `BigDecimal`
//! before comparing, so integers, floats and decimals compare uniformly
//! without assuming a shared native representation. A number whose string
//! form is not a decimal (NaN, infinity) is reported as
//! [`ConfigError::InvalidNumber`].

use super::{Constraint, ConstraintBase, Expectation};
use crate::core::{SourceLine, Value, ValueType};
use crate::error::ConfigError;
use bigdecimal::BigDecimal;
use std::cmp::Ordering;

/// How a value is compared with the expectation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericComparison {
    /// `min`: value >= expectation
    AtLeast,
    /// `max`: value <= expectation
    AtMost,
    /// `greaterThan`: value > expectation
    GreaterThan,
    /// `lessThan`: value < expectation
    LessThan,
}

impl NumericComparison {
    /// Constraint name for this comparison.
    pub fn name(self) -> &'static str {
        match self {
            Self::AtLeast => "min",
            Self::AtMost => "max",
            Self::GreaterThan => "greaterThan",
            Self::LessThan => "lessThan",
        }
    }

    fn accepts(self, ordering: Ordering) -> bool {
        match self {
            Self::AtLeast => ordering.is_ge(),
            Self::AtMost => ordering.is_le(),
            Self::GreaterThan => ordering.is_gt(),
            Self::LessThan => ordering.is_lt(),
        }
    }
}

/// `min`, `max`, `greaterThan` and `lessThan`.
#[derive(Debug)]
pub struct NumericConstraint {
    base: ConstraintBase,
    comparison: NumericComparison,
    limit: Expectation<BigDecimal>,
}

impl NumericConstraint {
    /// Create a numeric constraint.
    pub fn new(
        comparison: NumericComparison,
        key: &str,
        expectation: Value,
        defined_at: SourceLine,
    ) -> Self {
        let limit = expectation.decimal_repr().and_then(Result::ok).into();
        Self {
            base: ConstraintBase::new(key, expectation, defined_at),
            comparison,
            limit,
        }
    }
}

impl Constraint for NumericConstraint {
    fn name(&self) -> &'static str {
        self.comparison.name()
    }

    fn base(&self) -> &ConstraintBase {
        &self.base
    }

    fn supports(&self, value_type: ValueType) -> bool {
        value_type.is_numeric()
    }

    fn is_valid_expectation(&self) -> bool {
        self.limit.is_valid()
    }

    fn do_validate(&self, value: &Value) -> Option<ConfigError> {
        let limit = self.limit.get()?;
        let actual = match value.decimal_repr() {
            Some(Ok(actual)) => actual,
            _ => {
                return Some(ConfigError::InvalidNumber {
                    constraint: self.name(),
                    key: self.key().to_string(),
                    value: value.clone(),
                    defined_at: self.defined_at().clone(),
                });
            }
        };
        (!self.comparison.accepts(actual.cmp(limit))).then(|| self.violation(value))
    }
}
