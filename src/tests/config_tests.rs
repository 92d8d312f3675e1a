//! Tests for the configuration module.
//!
//! Each test that touches the environment uses its own prefix so tests can
//! run in parallel.

use crate::config::{ConfigLoader, LoaderSettings, LogConfig, PueoConfig, Validate};
use crate::data_structures::IndexConfig;
use crate::error::config::ConfigError;

use super::test_utils::TestFixture;

/// Test that default configuration can be created and is valid.
#[test]
fn test_default_config_is_valid() {
    let config = PueoConfig::default();
    assert!(config.validate().is_ok());
    assert_eq!(config.index.default_max_distance(), 1);
    assert_eq!(config.loader.field_delimiter, '\t');
    assert_eq!(config.log.level, "warn");
}

/// Test that configuration validation catches invalid values.
#[test]
fn test_config_validation() {
    let mut config = PueoConfig::default();

    config.loader.worker_threads = 5000;
    assert!(matches!(
        config.validate(),
        Err(ConfigError::ValueOutOfRange { .. })
    ));

    config.loader.worker_threads = 4;
    config.loader.field_delimiter = '\n';
    assert!(config.validate().is_err());

    config.loader.field_delimiter = ',';
    config.log.level = "loud".to_string();
    assert!(matches!(
        config.validate(),
        Err(ConfigError::ValidationError(_))
    ));

    config.log.level = "debug".to_string();
    config.index = IndexConfig::new().with_phrase_separator('\r');
    assert!(config.validate().is_err());

    config.index = IndexConfig::new().with_phrase_separator('_');
    assert!(config.validate().is_ok());
}

#[test]
fn test_effective_workers() {
    let settings = LoaderSettings::default();
    assert!(settings.effective_workers() >= 1);

    let settings = LoaderSettings {
        worker_threads: 3,
        ..LoaderSettings::default()
    };
    assert_eq!(settings.effective_workers(), 3);
}

/// Test loading configuration from a file.
#[test]
fn test_load_config_from_file() {
    let fixture = TestFixture::new().unwrap();
    let path = fixture
        .write_file(
            "pueo.toml",
            r#"
            [index]
            case_sensitive = false
            default_max_distance = 2

            [loader]
            worker_threads = 2
            field_delimiter = ","
            "#,
        )
        .unwrap();

    let config = ConfigLoader::new(Some(&path), "TEST_PUEO_FILE").load().unwrap();

    assert!(!config.index.case_sensitive());
    assert_eq!(config.index.default_max_distance(), 2);
    assert_eq!(config.loader.worker_threads, 2);
    assert_eq!(config.loader.field_delimiter, ',');

    // Untouched values keep their defaults
    assert_eq!(config.index.default_max_results(), 10);
    assert_eq!(config.log, LogConfig::default());
}

#[test]
fn test_load_config_from_json() {
    let fixture = TestFixture::new().unwrap();
    let path = fixture
        .write_file("pueo.json", r#"{ "log": { "level": "debug", "json": true } }"#)
        .unwrap();

    let config = ConfigLoader::new(Some(&path), "TEST_PUEO_JSON").load().unwrap();
    assert_eq!(config.log.level, "debug");
    assert!(config.log.json);
}

/// Test loading configuration with environment variable overrides.
#[test]
fn test_env_var_override() {
    let mut fixture = TestFixture::new().unwrap();
    let path = fixture
        .write_file("pueo.toml", "[index]\ndefault_max_distance = 2\n")
        .unwrap();

    fixture.set_env("TEST_PUEO_ENV__INDEX__DEFAULT_MAX_DISTANCE", "3");
    fixture.set_env("TEST_PUEO_ENV__LOG__LEVEL", "info");

    let config = ConfigLoader::new(Some(&path), "TEST_PUEO_ENV").load().unwrap();

    assert_eq!(config.index.default_max_distance(), 3);
    assert_eq!(config.log.level, "info");
}

#[test]
fn test_env_only_config() {
    let mut fixture = TestFixture::new().unwrap();
    fixture.set_env("TEST_PUEO_ENV_ONLY__LOADER__WORKER_THREADS", "6");

    let config = ConfigLoader::new(None::<&str>, "TEST_PUEO_ENV_ONLY").load().unwrap();
    assert_eq!(config.loader.worker_threads, 6);
}

/// Test that loading an invalid configuration file returns an error.
#[test]
fn test_load_invalid_config() {
    let fixture = TestFixture::new().unwrap();
    let path = fixture
        .write_file("invalid.toml", "[index\ncase_sensitive = maybe\"\n")
        .unwrap();

    let loader = ConfigLoader::new(Some(&path), "TEST_PUEO_INVALID");
    assert!(matches!(loader.load(), Err(ConfigError::ParseError(_))));
}

#[test]
fn test_load_rejects_invalid_values() {
    let fixture = TestFixture::new().unwrap();
    let path = fixture
        .write_file("limits.toml", "[index]\ndefault_max_results = 0\n")
        .unwrap();

    let loader = ConfigLoader::new(Some(&path), "TEST_PUEO_LIMITS");
    assert!(matches!(
        loader.load(),
        Err(ConfigError::ValueOutOfRange { .. })
    ));
}

#[test]
fn test_missing_and_unsupported_files() {
    let fixture = TestFixture::new().unwrap();

    let missing = fixture.temp_dir.path().join("absent.toml");
    assert!(matches!(
        ConfigLoader::new(Some(&missing), "TEST_PUEO_MISSING").load(),
        Err(ConfigError::FileNotFound(_))
    ));

    let ini = fixture.write_file("pueo.ini", "level = debug").unwrap();
    assert!(matches!(
        ConfigLoader::new(Some(&ini), "TEST_PUEO_INI").load(),
        Err(ConfigError::ParseError(_))
    ));
}
