//! Configuration source implementations.

mod config_source;
mod file;

pub use config_source::ConfigSource;
pub use file::FileSource;
