//! Builder for constructing Validator instances.

use crate::constraints::ConstraintRegistry;
use crate::core::Validator;
use crate::message::{DefaultMessages, MessageRenderer};
use crate::sources::ConfigSource;
use std::path::PathBuf;
use std::thread;

/// Upper bound for the default worker count.
const MAX_DEFAULT_PARALLELISM: usize = 8;

/// Builder for constructing a [`Validator`].
///
/// Provides a fluent interface for configuring sources, modes and
/// collaborators.
///
/// # Examples
///
/// ```rust,no_run
/// use config_validator::prelude::*;
///
/// # fn example() -> Result<()> {
/// Validator::builder()
///     .with_config_source("config/default.yaml")
///     .with_config_source("config/production.yaml")
///     .with_specification_source("config/app.spec")
///     .strict(true)
///     .build()
///     .validate()?;
/// # Ok(())
/// # }
/// ```
pub struct ValidatorBuilder {
    config_paths: Vec<PathBuf>,
    custom_sources: Vec<Box<dyn ConfigSource>>,
    specification_paths: Vec<PathBuf>,
    profile: Option<String>,
    recursive: bool,
    strict: bool,
    parallelism: usize,
    registry: Option<ConstraintRegistry>,
    renderer: Option<Box<dyn MessageRenderer>>,
}

impl ValidatorBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config_paths: Vec::new(),
            custom_sources: Vec::new(),
            specification_paths: Vec::new(),
            profile: None,
            recursive: false,
            strict: false,
            parallelism: default_parallelism(),
            registry: None,
            renderer: None,
        }
    }

    /// Add a configuration file or directory.
    ///
    /// Supported formats: YAML (.yaml, .yml), TOML (.toml), JSON (.json),
    /// INI (.ini). Sources are merged in the order they are specified, so
    /// later files override earlier ones.
    pub fn with_config_source(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_paths.push(path.into());
        self
    }

    /// Add several configuration files or directories.
    pub fn with_config_sources<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.config_paths.extend(paths.into_iter().map(Into::into));
        self
    }

    /// Add a custom configuration source, merged after all file sources.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use config_validator::prelude::*;
    ///
    /// let config: Config = [("port", 8080)].into_iter().collect();
    /// let validator = Validator::builder().with_source(config).build();
    /// assert!(validator.validate().is_ok());
    /// ```
    pub fn with_source<S: ConfigSource + 'static>(mut self, source: S) -> Self {
        self.custom_sources.push(Box::new(source));
        self
    }

    /// Add a specification file or directory of `.spec` files.
    pub fn with_specification_source(mut self, path: impl Into<PathBuf>) -> Self {
        self.specification_paths.push(path.into());
        self
    }

    /// Also load `name-<profile>.ext` after each configuration file.
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    /// Descend into subdirectories of directory sources.
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Report configuration keys no constraint or conversion covers.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Worker threads for constraint evaluation and specification parsing.
    ///
    /// `1` evaluates sequentially. Values below 1 are treated as 1.
    pub fn parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism.max(1);
        self
    }

    /// Use `registry` instead of the built-in constraint kinds.
    pub fn with_registry(mut self, registry: ConstraintRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Render the failure report with `renderer`.
    pub fn with_message_renderer(mut self, renderer: impl MessageRenderer + 'static) -> Self {
        self.renderer = Some(Box::new(renderer));
        self
    }

    /// Build the validator.
    pub fn build(self) -> Validator {
        Validator {
            config_paths: self.config_paths,
            custom_sources: self.custom_sources,
            specification_paths: self.specification_paths,
            profile: self.profile,
            recursive: self.recursive,
            strict: self.strict,
            parallelism: self.parallelism,
            registry: self.registry.unwrap_or_else(ConstraintRegistry::with_builtins),
            renderer: self
                .renderer
                .unwrap_or_else(|| Box::new(DefaultMessages::new())),
        }
    }
}

impl Default for ValidatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn default_parallelism() -> usize {
    thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .min(MAX_DEFAULT_PARALLELISM)
}
