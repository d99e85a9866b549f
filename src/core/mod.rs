//! Core types: values, configs, conversions and validation orchestration.

mod builder;
mod config;
mod converter;
mod loader;
mod specification;
mod validation;
mod validator;
mod value;

pub use builder::ValidatorBuilder;
pub use config::{Config, SourceLine};
pub use converter::{TargetType, TypeConverter};
pub use loader::ConfigLoader;
pub use specification::ConfigSpecification;
pub use validator::Validator;
pub use value::{RangeBound, Value, ValueRange, ValueType};
