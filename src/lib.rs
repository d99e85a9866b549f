//! # config-validator
//!
//! Declarative validation of flat key/value configuration with aggregated
//! error reporting.
//!
//! ## Overview
//!
//! `config-validator` checks loaded configuration against specification
//! files that declare, per key:
//! - type conversions applied before validation (`as: Integer`)
//! - constraints such as `size`, `range`, `min`, `matches`, `email` or `url`
//! - collection keys that address elements of a list (`servers.[*].port`)
//!
//! Every problem found in one pass (missing files, unknown constraints,
//! failed conversions, violations, uncovered keys in strict mode) is
//! collected into a single report instead of failing on the first one.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use config_validator::prelude::*;
//!
//! # fn example() -> Result<()> {
//! // app.spec:
//! //   "server.port"(as: Integer, range: 1..65535)
//! //   "admin.email"(email: {customTLDs: [corp]})
//! //   "upstreams.[*].url"(url: true)
//! let validator = Validator::builder()
//!     .with_config_source("config/default.yaml")
//!     .with_specification_source("config/app.spec")
//!     .strict(true)
//!     .build();
//!
//! match validator.validate() {
//!     Ok(()) => println!("configuration is valid"),
//!     Err(error) => eprintln!("{}", error),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! Configuration file formats are behind features, all enabled by default:
//! `yaml`, `toml`, `json` and `ini`.

#![warn(missing_docs, rust_2024_compatibility)]
#![deny(unsafe_code)]

pub mod constraints;
pub mod core;
pub mod error;
pub mod message;
pub mod sources;
pub mod spec;

/// Convenient re-exports for common usage patterns.
pub mod prelude {
    pub use crate::constraints::{Constraint, ConstraintFactory, ConstraintRegistry};
    pub use crate::core::{Config, ConfigSpecification, Validator, ValidatorBuilder, Value};
    pub use crate::error::{ConfigError, Result, ValidatorError};
    pub use crate::message::{DefaultMessages, MessageRenderer};
    pub use crate::sources::{ConfigSource, FileSource};
    pub use crate::spec::{SpecificationLoader, SpecificationParser};
}
