//! The validation entry point.

use crate::constraints::ConstraintRegistry;
use crate::core::{Config, ConfigLoader, ConfigSpecification, ValidatorBuilder, validation};
use crate::error::{ConfigError, Result, ValidatorError, render_report};
use crate::message::MessageRenderer;
use crate::sources::ConfigSource;
use crate::spec::SpecificationLoader;
use std::fmt;
use std::path::PathBuf;
use tracing::{info, warn};

/// Validates configuration sources against specification sources.
///
/// One call to [`Validator::validate`] runs a single pass: load the
/// configuration, load the specification, apply type conversions, evaluate
/// every constraint and (in strict mode) check key coverage. Every problem
/// found along the way ends up in one report.
///
/// # Examples
///
/// ```rust,no_run
/// use config_validator::prelude::*;
///
/// # fn example() -> Result<()> {
/// let validator = Validator::builder()
///     .with_config_source("config/app.yaml")
///     .with_specification_source("config/app.spec")
///     .build();
///
/// if let Err(error) = validator.validate() {
///     eprintln!("{}", error);
/// }
/// # Ok(())
/// # }
/// ```
pub struct Validator {
    pub(crate) config_paths: Vec<PathBuf>,
    pub(crate) custom_sources: Vec<Box<dyn ConfigSource>>,
    pub(crate) specification_paths: Vec<PathBuf>,
    pub(crate) profile: Option<String>,
    pub(crate) recursive: bool,
    pub(crate) strict: bool,
    pub(crate) parallelism: usize,
    pub(crate) registry: ConstraintRegistry,
    pub(crate) renderer: Box<dyn MessageRenderer>,
}

impl Validator {
    /// Create a new builder for constructing a validator.
    pub fn builder() -> ValidatorBuilder {
        ValidatorBuilder::new()
    }

    /// Load, convert and validate.
    ///
    /// # Errors
    ///
    /// Returns [`ValidatorError::ValidationFailed`] carrying every problem
    /// found, in report order. Its message is the rendered report.
    pub fn validate(&self) -> Result<()> {
        let config = self.load_config();
        let specification = self.load_specification();
        let errors = self.validate_config(config, &specification);
        if errors.is_empty() {
            info!("Configuration is valid");
            return Ok(());
        }
        warn!(errors = errors.len(), "Configuration is invalid");
        Err(ValidatorError::validation_failed(errors, self.renderer.as_ref()))
    }

    /// Convert and validate an already-loaded config.
    ///
    /// Errors attached to `config` and to `specification` are reported first,
    /// followed by conversion failures, constraint errors and the strict-mode
    /// error.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use config_validator::prelude::*;
    ///
    /// let registry = ConstraintRegistry::with_builtins();
    /// let specification = SpecificationParser::new(&registry, "inline.spec")
    ///     .parse(r#""port"(as: Integer, range: 1..65535)"#);
    /// let config: Config = [("port", "8080")].into_iter().collect();
    ///
    /// let errors = Validator::builder().build().validate_config(config, &specification);
    /// assert!(errors.is_empty());
    /// ```
    pub fn validate_config(
        &self,
        config: Config,
        specification: &ConfigSpecification,
    ) -> Vec<ConfigError> {
        validation::run(config, specification, self.strict, self.parallelism)
    }

    /// Render `errors` as a report with this validator's renderer.
    pub fn render_report(&self, errors: &[ConfigError]) -> String {
        render_report(errors, self.renderer.as_ref())
    }

    /// Constraint kinds available to specifications.
    pub fn registry(&self) -> &ConstraintRegistry {
        &self.registry
    }

    fn load_config(&self) -> Config {
        let mut loader = ConfigLoader::new().recursive(self.recursive);
        if let Some(profile) = &self.profile {
            loader = loader.with_profile(profile.clone());
        }
        let mut config = loader.load(&self.config_paths);
        for source in &self.custom_sources {
            loader.load_source(source.as_ref(), &mut config);
        }
        config
    }

    fn load_specification(&self) -> ConfigSpecification {
        SpecificationLoader::new(&self.registry)
            .recursive(self.recursive)
            .parallelism(self.parallelism)
            .load(&self.specification_paths)
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validator")
            .field("config_paths", &self.config_paths)
            .field("custom_sources", &self.custom_sources.len())
            .field("specification_paths", &self.specification_paths)
            .field("profile", &self.profile)
            .field("recursive", &self.recursive)
            .field("strict", &self.strict)
            .field("parallelism", &self.parallelism)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}
