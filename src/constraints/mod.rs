//! Constraints: single-key rules checked against a loaded configuration.
//!
//! Every constraint kind implements [`Constraint`]. The provided
//! [`Constraint::validate`] method runs the shared guards (expectation shape,
//! null and blank skipping, supported value types) before delegating to the
//! kind-specific [`Constraint::do_validate`].

mod credit_card;
mod domain;
mod email;
mod in_list;
mod inet;
mod multi;
mod numeric;
mod pattern;
mod range;
mod registry;
mod size;
mod type_of;
mod url;

pub use credit_card::{CardBrand, CreditCardConstraint};
pub use domain::{DomainRules, is_known_tld};
pub use email::EmailConstraint;
pub use in_list::InListConstraint;
pub use inet::{InetAddressConstraint, IpVersion};
pub use multi::{CollectionKey, IndexSelector, MultiKeyConstraint};
pub use numeric::{NumericComparison, NumericConstraint};
pub use pattern::PatternConstraint;
pub use range::RangeConstraint;
pub use registry::{ConstraintFactory, ConstraintRegistry, FnFactory, UnknownConstraint};
pub use size::SizeConstraint;
pub use type_of::TypeConstraint;
pub use self::url::UrlConstraint;

use crate::core::{Config, SourceLine, Value, ValueType};
use crate::error::{ConfigError, violation_message};
use crate::message::Message;
use std::cmp::Ordering;
use std::fmt;

const NULL: &Value = &Value::Null;

/// A named rule bound to one configuration key.
pub trait Constraint: fmt::Debug + Send + Sync {
    /// Name used in specification files, e.g. `size`.
    fn name(&self) -> &'static str;

    /// Key and declaration site shared by all kinds.
    fn base(&self) -> &ConstraintBase;

    /// Whether values of this runtime type can be judged at all.
    fn supports(&self, value_type: ValueType) -> bool;

    /// Kind-specific check for a present, non-skipped, supported value.
    fn do_validate(&self, value: &Value) -> Option<ConfigError>;

    /// Whether the expectation has the shape this kind requires.
    fn is_valid_expectation(&self) -> bool {
        true
    }

    /// Absent and null values pass without being checked.
    fn skip_null_values(&self) -> bool {
        true
    }

    /// Whitespace-only strings pass without being checked.
    fn skip_blank_values(&self) -> bool {
        true
    }

    /// Key this constraint applies to.
    fn key(&self) -> &str {
        &self.base().key
    }

    /// Declared expectation.
    fn expectation(&self) -> &Value {
        &self.base().expectation
    }

    /// Where this constraint was declared.
    fn defined_at(&self) -> &SourceLine {
        &self.base().defined_at
    }

    /// Message describing why `rejected` fails this constraint.
    fn message(&self, rejected: &Value) -> Message {
        violation_message(
            self.name(),
            self.defined_at(),
            self.key(),
            rejected,
            self.expectation(),
        )
    }

    /// Check this constraint's key in `config`.
    fn validate(&self, config: &Config) -> Option<ConfigError> {
        if !self.is_valid_expectation() {
            return Some(ConfigError::InvalidExpectation {
                constraint: self.name(),
                key: self.key().to_string(),
                expectation: self.expectation().clone(),
                defined_at: self.defined_at().clone(),
            });
        }

        let value = config.get(self.key()).unwrap_or(NULL);
        if value.is_null() && self.skip_null_values() {
            return None;
        }

        if value.is_blank() && self.skip_blank_values() {
            return None;
        }

        let value_type = value.value_type();
        if value_type != ValueType::Null && !self.supports(value_type) {
            return Some(ConfigError::UnsupportedValueType {
                constraint: self.name(),
                key: self.key().to_string(),
                value: value.clone(),
                value_type,
                defined_at: self.defined_at().clone(),
            });
        }

        self.do_validate(value)
    }

    /// Violation error for `rejected`.
    fn violation(&self, rejected: &Value) -> ConfigError {
        ConfigError::Violation {
            constraint: self.name(),
            key: self.key().to_string(),
            value: rejected.clone(),
            expectation: self.expectation().clone(),
            defined_at: self.defined_at().clone(),
        }
    }
}

/// Fields every constraint carries.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintBase {
    /// Constrained key
    pub key: String,
    /// Expectation as declared
    pub expectation: Value,
    /// Declaration site
    pub defined_at: SourceLine,
}

impl ConstraintBase {
    /// Bundle the shared fields.
    pub fn new(key: impl Into<String>, expectation: Value, defined_at: SourceLine) -> Self {
        Self {
            key: key.into(),
            expectation,
            defined_at,
        }
    }
}

/// Canonical constraint order: key, then name, then declaration site.
pub fn compare_constraints(a: &dyn Constraint, b: &dyn Constraint) -> Ordering {
    a.key()
        .cmp(b.key())
        .then_with(|| a.name().cmp(b.name()))
        .then_with(|| a.defined_at().cmp(b.defined_at()))
}

/// Sort constraints into canonical order.
pub fn sort_constraints(constraints: &mut [Box<dyn Constraint>]) {
    constraints.sort_by(|a, b| compare_constraints(a.as_ref(), b.as_ref()));
}

/// Result of matching an expectation against the shape a kind accepts.
///
/// `Invalid` feeds [`Constraint::is_valid_expectation`].
#[derive(Debug, Clone, PartialEq)]
pub enum Expectation<T> {
    /// Well-formed, parsed expectation.
    Valid(T),
    /// The declared value has the wrong shape.
    Invalid,
}

impl<T> Expectation<T> {
    /// Parsed form, if valid.
    pub fn get(&self) -> Option<&T> {
        match self {
            Self::Valid(value) => Some(value),
            Self::Invalid => None,
        }
    }

    /// Whether parsing succeeded.
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }
}

impl<T> From<Option<T>> for Expectation<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Invalid, Self::Valid)
    }
}

/// Parse a boolean / name / list-of-names expectation.
///
/// `true` and `[]` select every option, `false` disables the constraint
/// (`Some(None)`), and any unknown name makes the whole expectation invalid.
pub(crate) fn parse_selection<T: Copy>(
    expectation: &Value,
    all: &[T],
    lookup: impl Fn(&str) -> Option<T>,
) -> Option<Option<Vec<T>>> {
    match expectation {
        Value::Bool(true) => Some(Some(all.to_vec())),
        Value::Bool(false) => Some(None),
        Value::String(name) => lookup(name).map(|item| Some(vec![item])),
        Value::List(items) if items.is_empty() => Some(Some(all.to_vec())),
        Value::List(items) => items
            .iter()
            .map(|item| item.as_str().and_then(&lookup))
            .collect::<Option<Vec<_>>>()
            .map(Some),
        _ => None,
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn at(line: usize) -> SourceLine {
        SourceLine::new("test.spec", line)
    }

    pub fn check(constraint: &dyn Constraint, value: impl Into<Value>) -> Option<ConfigError> {
        constraint.validate(&Config::single(constraint.key().to_string(), value.into()))
    }

    pub fn is_violation(error: &Option<ConfigError>) -> bool {
        matches!(error, Some(ConfigError::Violation { .. }))
    }
}
