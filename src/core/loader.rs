//! Configuration loader that merges multiple sources.

use crate::core::Config;
use crate::error::ConfigError;
use crate::sources::{ConfigSource, FileSource};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, trace, warn};

/// Loads and merges configuration from files, directories and custom sources.
///
/// Sources are merged in the order given, so later sources override values
/// from earlier ones. Problems never abort loading: a missing file, an
/// unknown format or a parse failure is recorded on the returned config and
/// the remaining sources are still loaded.
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    profile: Option<String>,
    recursive: bool,
}

impl ConfigLoader {
    /// Create a new configuration loader.
    pub fn new() -> Self {
        Self::default()
    }

    /// Also load `name-<profile>.ext` after each loaded `name.ext`.
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    /// Descend into subdirectories of directory sources.
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Load and merge every path, in order.
    ///
    /// A directory contributes its supported files in sorted order. Files
    /// inside directories with unknown extensions are skipped silently;
    /// explicitly named ones are reported.
    pub fn load(&self, paths: &[PathBuf]) -> Config {
        let mut config = Config::new();
        for path in paths {
            self.load_path(path, &mut config);
        }
        info!(
            sources = paths.len(),
            keys = config.len(),
            errors = config.errors().len(),
            "Loaded configuration"
        );
        config
    }

    /// Load one custom source and merge it into `config`.
    pub fn load_source(&self, source: &dyn ConfigSource, config: &mut Config) {
        match source.load() {
            Ok(loaded) => {
                debug!(source = %source.name(), keys = loaded.len(), "Loaded configuration source");
                config.merge(loaded);
            }
            Err(e) => {
                warn!(source = %source.name(), error = %e, "Failed to load configuration source");
                config.push_error(ConfigError::LoadFailed {
                    source_name: source.name(),
                    cause: e.to_string(),
                });
            }
        }
    }

    fn load_path(&self, path: &Path, config: &mut Config) {
        if path.is_dir() {
            for file in self.list_directory(path, config) {
                self.load_file(&file, config);
            }
        } else if !path.exists() {
            warn!(path = %path.display(), "Configuration source does not exist");
            config.push_error(ConfigError::NoSuchFile {
                path: path.to_path_buf(),
            });
        } else if !FileSource::is_supported(path) {
            config.push_error(ConfigError::UnsupportedFormat {
                path: path.to_path_buf(),
            });
        } else {
            self.load_file(path, config);
        }
    }

    fn load_file(&self, path: &Path, config: &mut Config) {
        self.load_source(&FileSource::new(path), config);
        if let Some(variant) = self.profile_variant(path)
            && variant.is_file()
        {
            trace!(path = %variant.display(), "Loading profile variant");
            self.load_source(&FileSource::new(variant), config);
        }
    }

    /// `dir/name-<profile>.ext` for `dir/name.ext`.
    fn profile_variant(&self, path: &Path) -> Option<PathBuf> {
        let profile = self.profile.as_deref()?;
        let stem = path.file_stem()?.to_str()?;
        let extension = path.extension()?.to_str()?;
        Some(path.with_file_name(format!("{}-{}.{}", stem, profile, extension)))
    }

    /// Whether `path` is the profile variant of a sibling base file, which
    /// is then loaded together with its base instead of on its own.
    fn is_profile_variant(&self, path: &Path) -> bool {
        let Some(profile) = self.profile.as_deref() else {
            return false;
        };
        let (Some(stem), Some(extension)) = (
            path.file_stem().and_then(|s| s.to_str()),
            path.extension().and_then(|e| e.to_str()),
        ) else {
            return false;
        };
        stem.strip_suffix(profile)
            .and_then(|base| base.strip_suffix('-'))
            .is_some_and(|base| path.with_file_name(format!("{}.{}", base, extension)).is_file())
    }

    fn list_directory(&self, dir: &Path, config: &mut Config) -> Vec<PathBuf> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                config.push_error(ConfigError::LoadFailed {
                    source_name: format!("dir:{}", dir.display()),
                    cause: e.to_string(),
                });
                return Vec::new();
            }
        };
        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|entry| entry.path()))
            .collect();
        paths.sort();

        let mut files = Vec::new();
        for path in paths {
            if path.is_dir() {
                if self.recursive {
                    files.extend(self.list_directory(&path, config));
                }
            } else if !FileSource::is_supported(&path) {
                trace!(path = %path.display(), "Skipping unsupported file");
            } else if !self.is_profile_variant(&path) {
                files.push(path);
            }
        }
        files
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Value;
    use crate::error::{Result, ValidatorError};
    use tempfile::TempDir;

    struct MockSource {
        name: String,
        values: Vec<(&'static str, i64)>,
        fail: bool,
    }

    impl ConfigSource for MockSource {
        fn load(&self) -> Result<Config> {
            if self.fail {
                return Err(ValidatorError::LoadError("unreachable".to_string()));
            }
            Ok(self.values.iter().copied().collect())
        }

        fn name(&self) -> String {
            self.name.clone()
        }
    }

    fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_later_sources_override() {
        let temp = TempDir::new().unwrap();
        let base = write(temp.path(), "base.yaml", "port: 8080\nhost: localhost\n");
        let over = write(temp.path(), "over.json", r#"{"port": 9090}"#);

        let config = ConfigLoader::new().load(&[base, over]);
        assert_eq!(config.get("port"), Some(&Value::Integer(9090)));
        assert_eq!(config.get("host"), Some(&Value::from("localhost")));
        assert!(config.errors().is_empty());
    }

    #[test]
    fn test_problems_are_recorded_not_raised() {
        let temp = TempDir::new().unwrap();
        let good = write(temp.path(), "good.yaml", "a: 1\n");
        let broken = write(temp.path(), "broken.json", "{ nope");
        let unknown = write(temp.path(), "notes.txt", "a = 1");
        let missing = temp.path().join("missing.yaml");

        let config = ConfigLoader::new().load(&[missing.clone(), broken, unknown.clone(), good]);
        assert_eq!(config.get("a"), Some(&Value::Integer(1)));
        let errors = config.errors();
        assert_eq!(errors.len(), 3);
        assert_eq!(errors[0], ConfigError::NoSuchFile { path: missing });
        assert!(matches!(errors[1], ConfigError::LoadFailed { .. }));
        assert_eq!(errors[2], ConfigError::UnsupportedFormat { path: unknown });
    }

    #[test]
    fn test_directory_sorted_and_recursive() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "b.yaml", "value: b\n");
        write(temp.path(), "a.yaml", "value: a\nonly_a: 1\n");
        write(temp.path(), "readme.md", "ignored");
        write(temp.path(), "nested/c.yaml", "nested: true\n");

        let flat = ConfigLoader::new().load(&[temp.path().to_path_buf()]);
        assert_eq!(flat.get("value"), Some(&Value::from("b")));
        assert_eq!(flat.get("only_a"), Some(&Value::Integer(1)));
        assert!(!flat.contains_key("nested"));
        assert!(flat.errors().is_empty());

        let deep = ConfigLoader::new()
            .recursive(true)
            .load(&[temp.path().to_path_buf()]);
        assert_eq!(deep.get("nested"), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_profile_variant_follows_base() {
        let temp = TempDir::new().unwrap();
        let base = write(temp.path(), "app.yaml", "port: 80\nname: app\n");
        write(temp.path(), "app-prod.yaml", "port: 443\n");

        let plain = ConfigLoader::new().load(&[base.clone()]);
        assert_eq!(plain.get("port"), Some(&Value::Integer(80)));

        let prod = ConfigLoader::new().with_profile("prod").load(&[base]);
        assert_eq!(prod.get("port"), Some(&Value::Integer(443)));
        assert_eq!(prod.get("name"), Some(&Value::from("app")));

        let dir = ConfigLoader::new()
            .with_profile("prod")
            .load(&[temp.path().to_path_buf()]);
        assert_eq!(dir.get("port"), Some(&Value::Integer(443)));
    }

    #[test]
    fn test_custom_sources() {
        let loader = ConfigLoader::new();
        let mut config = Config::new();
        loader.load_source(
            &MockSource {
                name: "defaults".to_string(),
                values: vec![("port", 1), ("workers", 4)],
                fail: false,
            },
            &mut config,
        );
        loader.load_source(
            &MockSource {
                name: "remote".to_string(),
                values: Vec::new(),
                fail: true,
            },
            &mut config,
        );
        assert_eq!(config.get("workers"), Some(&Value::Integer(4)));
        assert!(matches!(
            &config.errors()[0],
            ConfigError::LoadFailed { source_name, .. } if source_name == "remote"
        ));
    }
}
