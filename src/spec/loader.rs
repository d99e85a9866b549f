//! Discovers and parses specification files.

use super::SpecificationParser;
use crate::constraints::ConstraintRegistry;
use crate::core::ConfigSpecification;
use crate::error::ConfigError;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use tracing::{info, trace, warn};

/// Extension of specification files found in directories.
pub const SPECIFICATION_EXTENSION: &str = "spec";

/// Loads specifications from files and directories.
///
/// Files named explicitly are parsed whatever their extension; directories
/// contribute their `.spec` files in sorted order. Each file is parsed by its
/// own [`SpecificationParser`], optionally on several threads; results are
/// merged in file order.
#[derive(Debug, Clone, Copy)]
pub struct SpecificationLoader<'a> {
    registry: &'a ConstraintRegistry,
    recursive: bool,
    parallelism: usize,
}

impl<'a> SpecificationLoader<'a> {
    /// Loader creating constraints from `registry`.
    pub fn new(registry: &'a ConstraintRegistry) -> Self {
        Self {
            registry,
            recursive: false,
            parallelism: 1,
        }
    }

    /// Descend into subdirectories of directory sources.
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Number of files parsed at once.
    pub fn parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism.max(1);
        self
    }

    /// Load every source into one specification.
    ///
    /// Missing sources and unreadable files become errors of the result.
    pub fn load(&self, sources: &[PathBuf]) -> ConfigSpecification {
        let mut errors = Vec::new();
        let mut files = Vec::new();
        for source in sources {
            if source.is_dir() {
                self.discover(source, &mut files, &mut errors);
            } else if source.is_file() {
                files.push(source.clone());
            } else {
                warn!(path = %source.display(), "Specification source does not exist");
                errors.push(ConfigError::NoSuchFile {
                    path: source.clone(),
                });
            }
        }

        let mut specification = ConfigSpecification::new(Default::default(), Vec::new(), errors);
        for parsed in self.parse_all(&files) {
            specification.merge(parsed);
        }
        info!(
            files = files.len(),
            constraints = specification.constraints().len(),
            errors = specification.errors().len(),
            "Loaded specification"
        );
        specification
    }

    /// Read and parse one file.
    pub fn load_file(&self, path: &Path) -> ConfigSpecification {
        match fs::read_to_string(path) {
            Ok(text) => SpecificationParser::new(self.registry, path).parse(&text),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read specification");
                ConfigSpecification::new(
                    Default::default(),
                    Vec::new(),
                    vec![ConfigError::LoadFailed {
                        source_name: format!("spec:{}", path.display()),
                        cause: e.to_string(),
                    }],
                )
            }
        }
    }

    fn parse_all(&self, files: &[PathBuf]) -> Vec<ConfigSpecification> {
        let workers = self.parallelism.min(files.len()).max(1);
        if workers == 1 {
            return files.iter().map(|file| self.load_file(file)).collect();
        }

        let chunk_size = files.len().div_ceil(workers);
        thread::scope(|scope| {
            let handles: Vec<_> = files
                .chunks(chunk_size)
                .map(|chunk| {
                    scope.spawn(move || {
                        chunk
                            .iter()
                            .map(|file| self.load_file(file))
                            .collect::<Vec<_>>()
                    })
                })
                .collect();
            handles
                .into_iter()
                .flat_map(|handle| match handle.join() {
                    Ok(parsed) => parsed,
                    Err(panic) => std::panic::resume_unwind(panic),
                })
                .collect()
        })
    }

    fn discover(&self, dir: &Path, files: &mut Vec<PathBuf>, errors: &mut Vec<ConfigError>) {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                errors.push(ConfigError::LoadFailed {
                    source_name: format!("dir:{}", dir.display()),
                    cause: e.to_string(),
                });
                return;
            }
        };
        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|entry| entry.path()))
            .collect();
        paths.sort();

        for path in paths {
            if path.is_dir() {
                if self.recursive {
                    self.discover(&path, files, errors);
                }
            } else if path.extension().and_then(|e| e.to_str()) == Some(SPECIFICATION_EXTENSION) {
                files.push(path);
            } else {
                trace!(path = %path.display(), "Skipping non-specification file");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_directory_discovery() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "b.spec", "\"b\"(max: 1)\n");
        write(temp.path(), "a.spec", "\"a\"(max: 1)\n");
        write(temp.path(), "notes.txt", "\"ignored\"(max: 1)\n");
        write(temp.path(), "nested/c.spec", "\"c\"(max: 1)\n");

        let registry = ConstraintRegistry::with_builtins();
        let flat = SpecificationLoader::new(&registry).load(&[temp.path().to_path_buf()]);
        let keys: Vec<_> = flat.constraints().iter().map(|c| c.key()).collect();
        assert_eq!(keys, vec!["a", "b"]);

        let deep = SpecificationLoader::new(&registry)
            .recursive(true)
            .load(&[temp.path().to_path_buf()]);
        assert_eq!(deep.constraints().len(), 3);
        assert!(deep.errors().is_empty());
    }

    #[test]
    fn test_explicit_file_with_any_extension() {
        let temp = TempDir::new().unwrap();
        let path = write(temp.path(), "rules.txt", "\"port\"(as: Integer)\n");
        let registry = ConstraintRegistry::with_builtins();
        let spec = SpecificationLoader::new(&registry).load(&[path]);
        assert_eq!(spec.type_converter().len(), 1);
    }

    #[test]
    fn test_missing_source() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("missing.spec");
        let registry = ConstraintRegistry::with_builtins();
        let spec = SpecificationLoader::new(&registry).load(&[missing.clone()]);
        assert_eq!(spec.errors(), &[ConfigError::NoSuchFile { path: missing }]);
    }

    #[test]
    fn test_errors_carry_their_file() {
        let temp = TempDir::new().unwrap();
        let first = write(temp.path(), "first.spec", "\n\"a\"(nope: 1)\n");
        let second = write(temp.path(), "second.spec", "\"b\"(nope: 1)\n");
        let registry = ConstraintRegistry::with_builtins();
        let spec = SpecificationLoader::new(&registry).load(&[first.clone(), second.clone()]);

        let sites: Vec<_> = spec
            .errors()
            .iter()
            .map(|e| match e {
                ConfigError::UnknownConstraint { defined_at, .. } => {
                    (defined_at.file().to_path_buf(), defined_at.line())
                }
                other => panic!("unexpected {:?}", other),
            })
            .collect();
        assert_eq!(sites, vec![(first, 2), (second, 1)]);
    }

    #[test]
    fn test_parallel_parsing_matches_sequential() {
        let temp = TempDir::new().unwrap();
        let files: Vec<_> = (0..12)
            .map(|i| {
                write(
                    temp.path(),
                    &format!("f{:02}.spec", i),
                    &format!("\"k{:02}\"(max: {})\n\"k{:02}\"(bogus: 1)\n", i, i, i),
                )
            })
            .collect();
        let registry = ConstraintRegistry::with_builtins();
        let sequential = SpecificationLoader::new(&registry).load(&files);
        let parallel = SpecificationLoader::new(&registry)
            .parallelism(4)
            .load(&files);

        assert_eq!(sequential.errors(), parallel.errors());
        let keys = |spec: &ConfigSpecification| -> Vec<String> {
            spec.constraints().iter().map(|c| c.key().to_string()).collect()
        };
        assert_eq!(keys(&sequential), keys(&parallel));
        assert_eq!(parallel.constraints().len(), 12);
    }
}
