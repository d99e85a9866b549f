//! Configuration source trait.

use crate::core::Config;
use crate::error::Result;

/// Trait for configuration sources.
///
/// Implement this trait to validate configuration that does not live in a
/// file (an in-memory map, a key-value store, a service response). Sources
/// produce flat configs whose keys are dotted paths.
pub trait ConfigSource: Send + Sync {
    /// Load the source into a flat config.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be read or parsed. The loader
    /// records it as a problem in the report and carries on with the next
    /// source.
    fn load(&self) -> Result<Config>;

    /// Human-readable name for this source (for logging and reports).
    fn name(&self) -> String;
}

impl ConfigSource for Config {
    fn load(&self) -> Result<Config> {
        let mut copy = self.clone();
        copy.take_errors();
        Ok(copy)
    }

    fn name(&self) -> String {
        "memory".to_string()
    }
}
