//! Configuration module for Pueo.
//!
//! This module provides the configuration system: settings are loaded from
//! built-in defaults, then an optional file (TOML, YAML, JSON), then environment
//! variables. All configuration values are validated before use.

use std::path::{Path, PathBuf};

use config::{Config, ConfigError as ExternalConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::data_structures::pueo_index::IndexConfig;
use crate::error::config::ConfigError;

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Default environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "PUEO";

/// Upper bound on loader worker threads
const MAX_WORKER_THREADS: usize = 1024;

/// A trait for types that can be validated.
pub trait Validate {
    /// Validates that the configuration is correct.
    fn validate(&self) -> ConfigResult<()>;
}

/// Main configuration for Pueo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PueoConfig {
    /// Index behaviour and search defaults
    pub index: IndexConfig,

    /// Bulk loading of input files
    pub loader: LoaderSettings,

    /// Log configuration
    pub log: LogConfig,
}

impl Validate for PueoConfig {
    fn validate(&self) -> ConfigResult<()> {
        self.index.validate()?;
        self.loader.validate()?;
        self.log.validate()?;
        Ok(())
    }
}

impl Validate for IndexConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.default_max_results() == 0 {
            return Err(ConfigError::ValueOutOfRange {
                key: "index.default_max_results".to_string(),
                message: "must be at least 1".to_string(),
            });
        }

        if matches!(self.phrase_separator(), '\n' | '\r') {
            return Err(ConfigError::ValidationError(
                "index.phrase_separator cannot be a line break".to_string(),
            ));
        }

        Ok(())
    }
}

/// Settings for loading tab-separated input files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderSettings {
    /// Number of loader threads (0 = number of CPUs)
    pub worker_threads: usize,

    /// Character separating the key from the value on each line
    pub field_delimiter: char,
}

impl LoaderSettings {
    /// Worker count with the CPU default applied.
    pub fn effective_workers(&self) -> usize {
        if self.worker_threads == 0 {
            num_cpus::get()
        } else {
            self.worker_threads
        }
    }
}

impl Default for LoaderSettings {
    fn default() -> Self {
        Self {
            worker_threads: 0,
            field_delimiter: '\t',
        }
    }
}

impl Validate for LoaderSettings {
    fn validate(&self) -> ConfigResult<()> {
        if self.worker_threads > MAX_WORKER_THREADS {
            return Err(ConfigError::ValueOutOfRange {
                key: "loader.worker_threads".to_string(),
                message: format!("must be at most {MAX_WORKER_THREADS}"),
            });
        }

        if matches!(self.field_delimiter, '\n' | '\r') {
            return Err(ConfigError::ValidationError(
                "loader.field_delimiter cannot be a line break".to_string(),
            ));
        }

        Ok(())
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Whether to log in JSON format
    pub json: bool,

    /// Whether to include source code locations in logs
    pub source_location: bool,

    /// Log file path (None for stderr)
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            json: false,
            source_location: false,
            file: None,
        }
    }
}

impl Validate for LogConfig {
    fn validate(&self) -> ConfigResult<()> {
        match self.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
            _ => Err(ConfigError::ValidationError(format!(
                "Invalid log level: {}",
                self.level
            ))),
        }
    }
}

/// Configuration loader for Pueo.
#[derive(Debug)]
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
    env_prefix: String,
}

impl ConfigLoader {
    /// Creates a new configuration loader.
    ///
    /// # Arguments
    ///
    /// * `config_path` - Optional path to the configuration file
    /// * `env_prefix` - Prefix for environment variables that override configuration values
    pub fn new<P: AsRef<Path>>(config_path: Option<P>, env_prefix: &str) -> Self {
        Self {
            config_path: config_path.map(|p| p.as_ref().to_path_buf()),
            env_prefix: env_prefix.to_string(),
        }
    }

    /// Loads the configuration from a file and environment variables.
    pub fn load(&self) -> ConfigResult<PueoConfig> {
        let mut builder = Config::builder().add_source(
            Config::try_from(&PueoConfig::default())
                .map_err(|e| ConfigError::ParseError(e.to_string()))?,
        );

        if let Some(path) = &self.config_path {
            if !path.exists() {
                return Err(ConfigError::FileNotFound(path.clone()));
            }

            let format = match path.extension().and_then(|ext| ext.to_str()) {
                Some("toml") => FileFormat::Toml,
                Some("json") => FileFormat::Json,
                Some("yaml" | "yml") => FileFormat::Yaml,
                _ => {
                    return Err(ConfigError::ParseError(format!(
                        "Unsupported file extension for: {path:?}"
                    )))
                }
            };
            builder = builder.add_source(File::from(path.as_path()).format(format));
        }

        builder = builder.add_source(
            Environment::with_prefix(&self.env_prefix)
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().map_err(|e| match e {
            ExternalConfigError::NotFound(path) => ConfigError::FileNotFound(PathBuf::from(path)),
            ExternalConfigError::FileParse { uri, cause } => ConfigError::ParseError(format!(
                "{}: {cause}",
                uri.unwrap_or_else(|| "<unknown>".to_string())
            )),
            other => ConfigError::ParseError(other.to_string()),
        })?;

        let pueo_config: PueoConfig = config
            .try_deserialize()
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;

        pueo_config.validate()?;
        tracing::debug!(path = ?self.config_path, "configuration loaded");

        Ok(pueo_config)
    }
}
