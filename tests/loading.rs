//! Integration tests for loading configuration and specification sources.

use config_validator::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
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
fn test_later_files_override_earlier_keys() {
    let temp_dir = TempDir::new().unwrap();
    let default_path = write(
        temp_dir.path(),
        "default.yaml",
        "server:\n  port: 80\n  host: localhost\n",
    );
    let override_path = write(temp_dir.path(), "override.toml", "[server]\nport = 8080\n");
    let spec_path = write(
        temp_dir.path(),
        "app.spec",
        "\"server.port\"(min: 1024)\n\"server.host\"(size: 1..64)\n",
    );

    let validator = Validator::builder()
        .with_config_sources([&default_path, &override_path])
        .with_specification_source(&spec_path)
        .strict(true)
        .build();
    assert!(validator.validate().is_ok());

    let reversed = Validator::builder()
        .with_config_sources([&override_path, &default_path])
        .with_specification_source(&spec_path)
        .build();
    let error = reversed.validate().unwrap_err();
    assert!(matches!(
        error.config_errors(),
        [ConfigError::Violation { constraint: "min", key, .. }] if key == "server.port"
    ));
}

#[test]
fn test_profile_variant_is_applied() {
    let temp_dir = TempDir::new().unwrap();
    let config_dir = temp_dir.path().join("config");
    write(&config_dir, "app.yaml", "mode: debug\nworkers: 2\n");
    write(&config_dir, "app-prod.yaml", "mode: release\n");
    let spec_path = write(
        temp_dir.path(),
        "app.spec",
        "\"mode\"(inList: [release])\n\"workers\"(min: 1)\n",
    );

    let without_profile = Validator::builder()
        .with_config_source(&config_dir)
        .with_specification_source(&spec_path)
        .build();
    assert_eq!(without_profile.validate().unwrap_err().config_errors().len(), 1);

    let with_profile = Validator::builder()
        .with_config_source(&config_dir)
        .with_specification_source(&spec_path)
        .with_profile("prod")
        .strict(true)
        .build();
    assert!(with_profile.validate().is_ok());
}

#[test]
fn test_directories_and_recursion() {
    let temp_dir = TempDir::new().unwrap();
    let config_dir = temp_dir.path().join("config");
    write(&config_dir, "a.json", r#"{"name": "service"}"#);
    write(&config_dir, "notes.txt", "ignored");
    write(&config_dir, "nested/b.yaml", "timeout: 0\n");

    let spec_dir = temp_dir.path().join("spec");
    write(&spec_dir, "names.spec", "\"name\"(matches: \"[a-z]+\")\n");
    write(&spec_dir, "README.md", "not a specification");
    write(&spec_dir, "nested/timeouts.spec", "\"timeout\"(greaterThan: 0)\n");

    let flat = Validator::builder()
        .with_config_source(&config_dir)
        .with_specification_source(&spec_dir)
        .strict(true)
        .build();
    assert!(flat.validate().is_ok());

    let recursive = Validator::builder()
        .with_config_source(&config_dir)
        .with_specification_source(&spec_dir)
        .recursive(true)
        .build();
    let error = recursive.validate().unwrap_err();
    assert!(matches!(
        error.config_errors(),
        [ConfigError::Violation { constraint: "greaterThan", key, .. }] if key == "timeout"
    ));
}

#[test]
fn test_source_problems_are_reported_together() {
    let temp_dir = TempDir::new().unwrap();
    let missing_config = temp_dir.path().join("absent.yaml");
    let unsupported = write(temp_dir.path(), "settings.xml", "<settings/>");
    let malformed = write(temp_dir.path(), "broken.json", "{\"port\": ");
    let missing_spec = temp_dir.path().join("absent.spec");
    let spec_path = write(temp_dir.path(), "app.spec", "\"port\"(unknownKind: 1)\n");

    let error = Validator::builder()
        .with_config_sources([&missing_config, &unsupported, &malformed])
        .with_specification_source(&missing_spec)
        .with_specification_source(&spec_path)
        .build()
        .validate()
        .unwrap_err();

    let errors = error.config_errors();
    assert_eq!(errors.len(), 5, "{:#?}", errors);
    assert_eq!(errors[0], ConfigError::NoSuchFile { path: missing_config });
    assert_eq!(errors[1], ConfigError::UnsupportedFormat { path: unsupported });
    assert!(matches!(&errors[2], ConfigError::LoadFailed { .. }));
    assert_eq!(errors[3], ConfigError::NoSuchFile { path: missing_spec });
    assert!(matches!(
        &errors[4],
        ConfigError::UnknownConstraint { name, key, .. } if name == "unknownKind" && key == "port"
    ));
}

#[test]
fn test_custom_source_is_merged_last() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = write(temp_dir.path(), "app.yaml", "retries: 100\n");
    let spec_path = write(temp_dir.path(), "app.spec", "\"retries\"(max: 10)\n");
    let overrides: Config = [("retries", 3)].into_iter().collect();

    let validator = Validator::builder()
        .with_source(overrides)
        .with_config_source(&config_path)
        .with_specification_source(&spec_path)
        .build();
    assert!(validator.validate().is_ok());
}

#[test]
fn test_camel_case_keys_are_matched_exactly() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = write(
        temp_dir.path(),
        "app.yaml",
        "serverPort: 0\nnested:\n  innerKey: 1\n",
    );
    let spec_path = write(
        temp_dir.path(),
        "app.spec",
        "\"serverPort\"(min: 1)\n\"nested.innerKey\"(max: 0)\n",
    );

    let error = Validator::builder()
        .with_config_source(&config_path)
        .with_specification_source(&spec_path)
        .strict(true)
        .build()
        .validate()
        .unwrap_err();

    let errors = error.config_errors();
    assert_eq!(errors.len(), 2, "{:#?}", errors);
    assert!(matches!(
        &errors[0],
        ConfigError::Violation { constraint: "max", key, .. } if key == "nested.innerKey"
    ));
    assert!(matches!(
        &errors[1],
        ConfigError::Violation { constraint: "min", key, .. } if key == "serverPort"
    ));
}
