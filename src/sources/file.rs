//! File-based configuration source.

use super::ConfigSource;
use crate::core::{Config, Value};
use crate::error::{Result, ValidatorError};
use bigdecimal::BigDecimal;
use config::{File, FileFormat, ValueKind};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// File-based configuration source.
///
/// Loads configuration from YAML, TOML, JSON or INI files with format
/// detection based on file extension. Nested tables are flattened into
/// dotted keys; arrays stay whole under their key. Keys keep their case.
///
/// # Examples
///
/// ```rust,no_run
/// use config_validator::sources::{ConfigSource, FileSource};
///
/// let config = FileSource::new("config/default.yaml").load()?;
/// println!("{} keys", config.len());
/// # Ok::<(), config_validator::error::ValidatorError>(())
/// ```
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    /// Create a new file source.
    ///
    /// The format is detected from the file extension:
    /// - `.yaml`, `.yml` -> YAML
    /// - `.toml` -> TOML
    /// - `.json` -> JSON
    /// - `.ini` -> INI
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path this source reads.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether files with this path's extension can be loaded.
    pub fn is_supported(path: &Path) -> bool {
        format_of(path).is_some()
    }

    fn format(&self) -> Result<FileFormat> {
        format_of(&self.path).ok_or_else(|| {
            ValidatorError::LoadError(format!(
                "Unsupported file extension: {}. Supported: .yaml, .yml, .toml, .json, .ini",
                self.path.display()
            ))
        })
    }
}

fn format_of(path: &Path) -> Option<FileFormat> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    match extension.as_str() {
        #[cfg(feature = "yaml")]
        "yaml" | "yml" => Some(FileFormat::Yaml),
        #[cfg(feature = "toml")]
        "toml" => Some(FileFormat::Toml),
        #[cfg(feature = "json")]
        "json" => Some(FileFormat::Json),
        #[cfg(feature = "ini")]
        "ini" => Some(FileFormat::Ini),
        _ => None,
    }
}

impl ConfigSource for FileSource {
    fn load(&self) -> Result<Config> {
        let format = self.format()?;

        if !self.path.is_file() {
            return Err(ValidatorError::LoadError(format!(
                "Configuration file not found: {}",
                self.path.display()
            )));
        }

        let loaded = config::Config::builder()
            .add_source(File::from(self.path.clone()).format(format).required(true))
            .build()
            .map_err(|e| ValidatorError::ParseError(format!("Failed to load file: {}", e)))?;

        let root = loaded
            .try_deserialize::<HashMap<String, config::Value>>()
            .map_err(|e| ValidatorError::ParseError(format!("Failed to parse file: {}", e)))?;

        let mut config = Config::new();
        for (key, value) in root {
            flatten(key, value, &mut config);
        }
        Ok(config)
    }

    fn name(&self) -> String {
        format!("file:{}", self.path.display())
    }
}

/// Insert `value` under `key`, descending into non-empty tables.
fn flatten(key: String, value: config::Value, config: &mut Config) {
    match value.kind {
        ValueKind::Table(table) if !table.is_empty() => {
            for (child, value) in table {
                flatten(format!("{}.{}", key, child), value, config);
            }
        }
        kind => config.insert(key, convert(kind)),
    }
}

fn convert(kind: ValueKind) -> Value {
    match kind {
        ValueKind::Nil => Value::Null,
        ValueKind::Boolean(b) => Value::Bool(b),
        ValueKind::I64(i) => Value::Integer(i),
        ValueKind::I128(i) => wide_integer(i64::try_from(i).ok(), &i.to_string()),
        ValueKind::U64(u) => wide_integer(i64::try_from(u).ok(), &u.to_string()),
        ValueKind::U128(u) => wide_integer(i64::try_from(u).ok(), &u.to_string()),
        ValueKind::Float(f) => Value::Float(f),
        ValueKind::String(s) => Value::String(s),
        ValueKind::Array(items) => {
            Value::List(items.into_iter().map(|item| convert(item.kind)).collect())
        }
        ValueKind::Table(table) => Value::Map(
            table
                .into_iter()
                .map(|(key, value)| (key, convert(value.kind)))
                .collect::<BTreeMap<_, _>>(),
        ),
    }
}

fn wide_integer(narrow: Option<i64>, text: &str) -> Value {
    match (narrow, BigDecimal::from_str(text)) {
        (Some(i), _) => Value::Integer(i),
        (None, Ok(decimal)) => Value::Decimal(decimal),
        (None, Err(_)) => Value::String(text.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_supported_extensions() {
        assert!(FileSource::is_supported(Path::new("config.yaml")));
        assert!(FileSource::is_supported(Path::new("config.YML")));
        assert!(FileSource::is_supported(Path::new("config.toml")));
        assert!(FileSource::is_supported(Path::new("config.json")));
        assert!(FileSource::is_supported(Path::new("config.ini")));
        assert!(!FileSource::is_supported(Path::new("config.txt")));
        assert!(!FileSource::is_supported(Path::new("config")));
    }

    #[test]
    fn test_load_yaml_file_flattens_tables() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        fs::write(
            &config_path,
            r#"
server:
  port: 8080
  host: localhost
  tls:
    enabled: false
items:
  - field: a.b
  - field: bad
ratio: 0.5
"#,
        )
        .unwrap();

        let config = FileSource::new(&config_path).load().unwrap();
        assert_eq!(config.get("server.port"), Some(&Value::Integer(8080)));
        assert_eq!(config.get("server.host"), Some(&Value::from("localhost")));
        assert_eq!(config.get("server.tls.enabled"), Some(&Value::Bool(false)));
        assert_eq!(config.get("ratio"), Some(&Value::Float(0.5)));
        assert!(!config.contains_key("server"));

        let items = config.get("items").and_then(Value::as_list).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(
            items[1].as_map().and_then(|m| m.get("field")),
            Some(&Value::from("bad"))
        );
    }

    #[test]
    fn test_load_json_and_toml() {
        let temp_dir = TempDir::new().unwrap();
        let json = temp_dir.path().join("app.json");
        fs::write(&json, r#"{"db": {"pool": 4, "hosts": ["a", "b"]}}"#).unwrap();
        let config = FileSource::new(&json).load().unwrap();
        assert_eq!(config.get("db.pool"), Some(&Value::Integer(4)));
        assert_eq!(config.get("db.hosts"), Some(&Value::from(vec!["a", "b"])));

        let toml = temp_dir.path().join("app.toml");
        fs::write(&toml, "[db]\npool = 8\n").unwrap();
        let config = FileSource::new(&toml).load().unwrap();
        assert_eq!(config.get("db.pool"), Some(&Value::Integer(8)));
    }

    #[test]
    fn test_key_case_is_kept() {
        let temp_dir = TempDir::new().unwrap();
        let yaml = temp_dir.path().join("app.yaml");
        fs::write(&yaml, "serverPort: 80\nnested:\n  innerKey: 1\n").unwrap();
        let config = FileSource::new(&yaml).load().unwrap();
        assert_eq!(config.keys().collect::<Vec<_>>(), vec!["nested.innerKey", "serverPort"]);

        let json = temp_dir.path().join("app.json");
        fs::write(&json, r#"{"maxConnections": 5, "Pool": {"idleTimeout": 30}}"#).unwrap();
        let config = FileSource::new(&json).load().unwrap();
        assert_eq!(config.get("maxConnections"), Some(&Value::Integer(5)));
        assert_eq!(config.get("Pool.idleTimeout"), Some(&Value::Integer(30)));

        let toml = temp_dir.path().join("app.toml");
        fs::write(&toml, "[logLevels]\nrootLogger = \"warn\"\n").unwrap();
        let config = FileSource::new(&toml).load().unwrap();
        assert_eq!(config.get("logLevels.rootLogger"), Some(&Value::from("warn")));
    }

    #[test]
    fn test_load_nonexistent_file() {
        let source = FileSource::new("/nonexistent/config.yaml");
        assert!(matches!(source.load(), Err(ValidatorError::LoadError(_))));
    }

    #[test]
    fn test_load_unsupported_extension() {
        let source = FileSource::new("config.txt");
        assert!(matches!(source.load(), Err(ValidatorError::LoadError(_))));
    }

    #[test]
    fn test_load_malformed_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            FileSource::new(&path).load(),
            Err(ValidatorError::ParseError(_))
        ));
    }

    #[test]
    fn test_name() {
        let source = FileSource::new("config.yaml");
        assert!(source.name().contains("config.yaml"));
    }
}
