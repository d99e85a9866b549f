//! Error types for config-validator.
//!
//! Two layers live here. [`ValidatorError`] is the operational error returned
//! from public entry points. [`ConfigError`] is plain data: every problem found
//! while loading, converting or validating is recorded as one of its variants
//! and collected into a single report.

use crate::core::{SourceLine, Value, ValueType};
use crate::message::{DefaultMessages, Message, MessageRenderer};
use std::fmt;
use std::path::PathBuf;

/// Result type alias for config-validator operations.
pub type Result<T> = std::result::Result<T, ValidatorError>;

/// Errors returned by the validator's entry points.
#[derive(Debug, thiserror::Error)]
pub enum ValidatorError {
    /// Failed to load a configuration source.
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    /// Failed to parse a configuration or specification source.
    #[error("Failed to parse: {0}")]
    ParseError(String),

    /// IO error occurred.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Validation found problems. The message lists every one of them.
    #[error("{report}")]
    ValidationFailed {
        /// Every problem found, in report order.
        errors: Vec<ConfigError>,
        /// `errors` rendered as one report.
        report: String,
    },
}

impl ValidatorError {
    /// Failure carrying `errors`, rendered with `renderer`.
    pub fn validation_failed(errors: Vec<ConfigError>, renderer: &dyn MessageRenderer) -> Self {
        let report = render_report(&errors, renderer);
        Self::ValidationFailed { errors, report }
    }

    /// Errors carried by a failed validation, empty for other variants.
    pub fn config_errors(&self) -> &[ConfigError] {
        match self {
            Self::ValidationFailed { errors, .. } => errors,
            _ => &[],
        }
    }
}

/// Render the aggregated report: a header line followed by one `- ` line per
/// error.
pub fn render_report(errors: &[ConfigError], renderer: &dyn MessageRenderer) -> String {
    let mut report = renderer.render(&Message::new("validation.header", Vec::<String>::new()));
    for error in errors {
        report.push_str("\n- ");
        report.push_str(&error.render(renderer));
    }
    report
}

/// A single problem found in configuration or specification data.
///
/// Variants carry structured fields so callers can match on shape instead of
/// text. Use [`ConfigError::message`] for the code/argument form and
/// `Display` for the default English rendering.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A configuration or specification source does not exist.
    NoSuchFile {
        /// Missing path
        path: PathBuf,
    },

    /// A configuration file has an extension no loader understands.
    UnsupportedFormat {
        /// Offending path
        path: PathBuf,
    },

    /// A source exists but could not be read or parsed.
    LoadFailed {
        /// Source name
        source_name: String,
        /// Underlying failure
        cause: String,
    },

    /// A specification statement could not be parsed.
    SpecificationSyntax {
        /// Statement location
        defined_at: SourceLine,
        /// What was wrong
        reason: String,
    },

    /// A specification names a constraint the registry does not know.
    UnknownConstraint {
        /// Requested constraint name
        name: String,
        /// Key the constraint was declared for
        key: String,
        /// Statement location
        defined_at: SourceLine,
    },

    /// A conversion directive names an unknown target type.
    InvalidConversion {
        /// Key the directive was declared for
        key: String,
        /// Requested target type
        target: String,
        /// Statement location
        defined_at: SourceLine,
    },

    /// A key looks like a collection key but cannot be parsed as one.
    InvalidCollectionKey {
        /// Offending key
        key: String,
        /// Statement location
        defined_at: SourceLine,
    },

    /// A value could not be coerced to its declared type.
    ConversionFailed {
        /// Converted key
        key: String,
        /// Original value, left in place
        value: Value,
        /// Target type name
        target: String,
        /// Why coercion failed
        reason: String,
        /// Directive location
        defined_at: SourceLine,
    },

    /// A constraint's expectation is malformed for its kind.
    InvalidExpectation {
        /// Constraint name
        constraint: &'static str,
        /// Constrained key
        key: String,
        /// The malformed expectation
        expectation: Value,
        /// Constraint location
        defined_at: SourceLine,
    },

    /// A constraint cannot judge values of this runtime type.
    UnsupportedValueType {
        /// Constraint name
        constraint: &'static str,
        /// Constrained key
        key: String,
        /// Rejected value
        value: Value,
        /// Its runtime type
        value_type: ValueType,
        /// Constraint location
        defined_at: SourceLine,
    },

    /// A value fails a constraint.
    Violation {
        /// Constraint name
        constraint: &'static str,
        /// Constrained key
        key: String,
        /// Rejected value
        value: Value,
        /// Constraint expectation
        expectation: Value,
        /// Constraint location
        defined_at: SourceLine,
    },

    /// A numeric value has no decimal string form.
    InvalidNumber {
        /// Constraint name
        constraint: &'static str,
        /// Constrained key
        key: String,
        /// Rejected value
        value: Value,
        /// Constraint location
        defined_at: SourceLine,
    },

    /// A range was checked against a value of a different type than its bounds.
    RangeTypeMismatch {
        /// Constrained key
        key: String,
        /// Rejected value
        value: Value,
        /// Its runtime type
        value_type: ValueType,
        /// The range expectation
        range: Value,
        /// The range's bound type name
        bound_type: &'static str,
        /// Constraint location
        defined_at: SourceLine,
    },

    /// A collection key's base value is missing or not a list.
    NotACollection {
        /// Collection key as declared
        key: String,
        /// Constraint location
        defined_at: SourceLine,
    },

    /// A collection element has no such property.
    UnsupportedEntryProperty {
        /// Collection key as declared
        key: String,
        /// Element index
        index: usize,
        /// Requested property
        property: String,
        /// Constraint location
        defined_at: SourceLine,
    },

    /// A collection element property exists but cannot be reached.
    EntryPropertyAccess {
        /// Collection key as declared
        key: String,
        /// Element index
        index: usize,
        /// Requested property
        property: String,
        /// Why access failed
        reason: String,
        /// Constraint location
        defined_at: SourceLine,
    },

    /// Per-element failures of one collection constraint.
    Multi(MultiConfigError),

    /// Strict mode: keys no constraint or conversion covers.
    KeysWithoutSpecification {
        /// Uncovered keys, sorted
        keys: Vec<String>,
    },
}

/// Per-element failures of one collection key, reported as one block.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiConfigError {
    /// Collection key as declared
    pub key: String,
    /// Constraint location
    pub defined_at: SourceLine,
    /// Element index and the error produced for it
    pub errors: Vec<(usize, ConfigError)>,
}

impl ConfigError {
    /// Code and arguments for this error.
    pub fn message(&self) -> Message {
        match self {
            Self::NoSuchFile { path } => Message::new("load.no_such_file", [path.display()]),
            Self::UnsupportedFormat { path } => {
                Message::new("load.unsupported_format", [path.display()])
            }
            Self::LoadFailed { source_name, cause } => {
                Message::new("load.failed", [source_name, cause])
            }
            Self::SpecificationSyntax { defined_at, reason } => {
                Message::new("spec.syntax", [defined_at.to_string(), reason.clone()])
            }
            Self::UnknownConstraint {
                name,
                key,
                defined_at,
            } => Message::new(
                "spec.unknown_constraint",
                [defined_at.to_string(), name.clone(), key.clone()],
            ),
            Self::InvalidConversion {
                key,
                target,
                defined_at,
            } => Message::new(
                "spec.invalid_conversion",
                [defined_at.to_string(), key.clone(), target.clone()],
            ),
            Self::InvalidCollectionKey { key, defined_at } => Message::new(
                "spec.invalid_collection_key",
                [defined_at.to_string(), key.clone()],
            ),
            Self::ConversionFailed {
                key,
                value,
                target,
                reason,
                defined_at,
            } => Message::new(
                "conversion.failed",
                [
                    defined_at.to_string(),
                    key.clone(),
                    value.to_string(),
                    target.clone(),
                    reason.clone(),
                ],
            ),
            Self::InvalidExpectation {
                constraint,
                key,
                expectation,
                defined_at,
            } => Message::new(
                "constraint.invalid_expectation",
                [
                    defined_at.to_string(),
                    key.clone(),
                    constraint.to_string(),
                    expectation.to_string(),
                ],
            ),
            Self::UnsupportedValueType {
                constraint,
                key,
                value,
                value_type,
                defined_at,
            } => Message::new(
                "constraint.unsupported_type",
                [
                    defined_at.to_string(),
                    key.clone(),
                    constraint.to_string(),
                    value.to_string(),
                    value_type.to_string(),
                ],
            ),
            Self::Violation {
                constraint,
                key,
                value,
                expectation,
                defined_at,
            } => violation_message(constraint, defined_at, key, value, expectation),
            Self::InvalidNumber {
                constraint,
                key,
                value,
                defined_at,
            } => Message::new(
                "constraint.invalid_number",
                [
                    defined_at.to_string(),
                    key.clone(),
                    value.to_string(),
                    constraint.to_string(),
                ],
            ),
            Self::RangeTypeMismatch {
                key,
                value,
                value_type,
                range,
                bound_type,
                defined_at,
            } => Message::new(
                "constraint.range_type_mismatch",
                [
                    defined_at.to_string(),
                    key.clone(),
                    value.to_string(),
                    value_type.to_string(),
                    range.to_string(),
                    bound_type.to_string(),
                ],
            ),
            Self::NotACollection { key, defined_at } => Message::new(
                "collection.not_a_collection",
                [defined_at.to_string(), key.clone()],
            ),
            Self::UnsupportedEntryProperty {
                key,
                index,
                property,
                defined_at,
            } => Message::new(
                "collection.unsupported_property",
                [
                    defined_at.to_string(),
                    key.clone(),
                    index.to_string(),
                    property.clone(),
                ],
            ),
            Self::EntryPropertyAccess {
                key,
                index,
                property,
                reason,
                defined_at,
            } => Message::new(
                "collection.property_access",
                [
                    defined_at.to_string(),
                    key.clone(),
                    index.to_string(),
                    property.clone(),
                    reason.clone(),
                ],
            ),
            Self::Multi(multi) => Message::new(
                "collection.errors",
                [multi.defined_at.to_string(), multi.key.clone()],
            ),
            Self::KeysWithoutSpecification { keys } => {
                Message::new("strict.keys_without_specification", [keys.join(", ")])
            }
        }
    }

    /// Render through the given renderer.
    ///
    /// Collection errors render as a header line followed by one indented
    /// line per element error.
    pub fn render(&self, renderer: &dyn MessageRenderer) -> String {
        let mut text = renderer.render(&self.message());
        if let Self::Multi(multi) = self {
            for (index, error) in &multi.errors {
                let inner = error.render(renderer).replace('\n', "\n    ");
                text.push_str(&format!("\n    [{}] {}", index, inner));
            }
        }
        text
    }

    /// Key the error is about, when it concerns a single key.
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::UnknownConstraint { key, .. }
            | Self::InvalidConversion { key, .. }
            | Self::InvalidCollectionKey { key, .. }
            | Self::ConversionFailed { key, .. }
            | Self::InvalidExpectation { key, .. }
            | Self::UnsupportedValueType { key, .. }
            | Self::Violation { key, .. }
            | Self::InvalidNumber { key, .. }
            | Self::RangeTypeMismatch { key, .. }
            | Self::NotACollection { key, .. }
            | Self::UnsupportedEntryProperty { key, .. }
            | Self::EntryPropertyAccess { key, .. } => Some(key),
            Self::Multi(multi) => Some(&multi.key),
            Self::NoSuchFile { .. }
            | Self::UnsupportedFormat { .. }
            | Self::LoadFailed { .. }
            | Self::SpecificationSyntax { .. }
            | Self::KeysWithoutSpecification { .. } => None,
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(&DefaultMessages::new()))
    }
}

/// Message for a constraint violation: code `constraint.<name>` with
/// arguments source line, key, value, expectation, name.
pub fn violation_message(
    constraint: &str,
    defined_at: &SourceLine,
    key: &str,
    value: &Value,
    expectation: &Value,
) -> Message {
    Message::new(
        format!("constraint.{}", constraint),
        [
            defined_at.to_string(),
            key.to_string(),
            value.to_string(),
            expectation.to_string(),
            constraint.to_string(),
        ],
    )
}
