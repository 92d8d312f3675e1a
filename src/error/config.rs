//! Configuration errors.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or validating a [`PueoConfig`](crate::config::PueoConfig).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The configuration file does not exist.
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    /// A source could not be parsed or deserialized into the configuration.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// A value parsed but violates a constraint.
    #[error("Configuration validation error: {0}")]
    ValidationError(String),

    /// A numeric value lies outside its allowed range.
    #[error("Configuration value {key} is out of valid range: {message}")]
    ValueOutOfRange { key: String, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let error = ConfigError::ValueOutOfRange {
            key: "loader.worker_threads".to_string(),
            message: "must be at most 1024".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Configuration value loader.worker_threads is out of valid range: must be at most 1024"
        );
        assert_eq!(
            ConfigError::FileNotFound(PathBuf::from("pueo.toml")).to_string(),
            "Configuration file not found: pueo.toml"
        );
    }
}
