//! The parsed specification: conversions, constraints and definition errors.

use crate::constraints::{Constraint, sort_constraints};
use crate::core::TypeConverter;
use crate::error::ConfigError;
use std::collections::BTreeSet;

/// Everything a validation run needs from specification files.
///
/// Constraints are kept in canonical order (key, name, declaration site), so
/// evaluating them in sequence yields a reproducible report.
#[derive(Debug, Default)]
pub struct ConfigSpecification {
    type_converter: TypeConverter,
    constraints: Vec<Box<dyn Constraint>>,
    errors: Vec<ConfigError>,
}

impl ConfigSpecification {
    /// Assemble a specification, sorting `constraints`.
    pub fn new(
        type_converter: TypeConverter,
        mut constraints: Vec<Box<dyn Constraint>>,
        errors: Vec<ConfigError>,
    ) -> Self {
        sort_constraints(&mut constraints);
        Self {
            type_converter,
            constraints,
            errors,
        }
    }

    /// Conversion directives.
    pub fn type_converter(&self) -> &TypeConverter {
        &self.type_converter
    }

    /// Constraints in canonical order.
    pub fn constraints(&self) -> &[Box<dyn Constraint>] {
        &self.constraints
    }

    /// Problems found while reading the specification.
    pub fn errors(&self) -> &[ConfigError] {
        &self.errors
    }

    /// Record a definition-time problem.
    pub fn push_error(&mut self, error: ConfigError) {
        self.errors.push(error);
    }

    /// Keys covered by a constraint or a conversion, as declared.
    ///
    /// Collection keys appear in their bracket form; they never cover the
    /// list key they address.
    pub fn covered_keys(&self) -> BTreeSet<&str> {
        self.constraints
            .iter()
            .map(|c| c.key())
            .chain(self.type_converter.keys())
            .collect()
    }

    /// Fold another specification into this one, keeping canonical order.
    pub fn merge(&mut self, other: ConfigSpecification) {
        self.type_converter.merge(other.type_converter);
        self.constraints.extend(other.constraints);
        sort_constraints(&mut self.constraints);
        self.errors.extend(other.errors);
    }
}
