//! Flat configuration entries and specification source locations.

use crate::core::Value;
use crate::error::ConfigError;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Loaded configuration: dotted keys mapped to values, plus every error
/// collected while producing or validating it.
///
/// Lookups are by exact key; `server.port` is never resolved by walking into
/// a `server` map.
///
/// # Examples
///
/// ```rust
/// use config_validator::core::{Config, Value};
///
/// let mut config = Config::new();
/// config.insert("server.port", 8080);
/// assert_eq!(config.get("server.port"), Some(&Value::Integer(8080)));
/// assert!(config.get("server").is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Config {
    entries: BTreeMap<String, Value>,
    #[serde(skip)]
    errors: Vec<ConfigError>,
}

impl Config {
    /// Create an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration holding a single entry.
    pub fn single(key: impl Into<String>, value: Value) -> Self {
        let mut config = Self::new();
        config.entries.insert(key.into(), value);
        config
    }

    /// Insert or replace an entry.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Look up an entry by its exact key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Mutable access to an entry.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.entries.get_mut(key)
    }

    /// Whether the key is present (even with a null value).
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// All keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// All entries in key order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Errors accumulated so far.
    pub fn errors(&self) -> &[ConfigError] {
        &self.errors
    }

    /// Append one error.
    pub fn push_error(&mut self, error: ConfigError) {
        self.errors.push(error);
    }

    /// Append several errors, keeping their order.
    pub fn extend_errors(&mut self, errors: impl IntoIterator<Item = ConfigError>) {
        self.errors.extend(errors);
    }

    /// Take the accumulated errors out of the configuration.
    pub fn take_errors(&mut self) -> Vec<ConfigError> {
        std::mem::take(&mut self.errors)
    }

    /// Merge another configuration into this one.
    ///
    /// Entries from `other` replace entries with the same key; error lists
    /// are concatenated.
    pub fn merge(&mut self, other: Config) {
        self.entries.extend(other.entries);
        self.errors.extend(other.errors);
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Config {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
            errors: Vec::new(),
        }
    }
}

/// Where a specification statement was declared.
///
/// Ordered by file path, then line number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SourceLine {
    file: PathBuf,
    line: usize,
}

impl SourceLine {
    /// Create a source location; `line` is 1-based.
    pub fn new(file: impl Into<PathBuf>, line: usize) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }

    /// File the statement came from.
    pub fn file(&self) -> &Path {
        &self.file
    }

    /// 1-based line number.
    pub fn line(&self) -> usize {
        self.line
    }
}

impl fmt::Display for SourceLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file.display(), self.line)
    }
}
