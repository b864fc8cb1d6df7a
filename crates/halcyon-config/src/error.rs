//! Configuration error types.

use thiserror::Error;

/// Errors that can occur while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A config file existed but could not be read.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// Path of the offending file.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A config file existed but failed to parse as TOML.
    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        /// Path of the offending file.
        path: String,
        /// Underlying parse error.
        #[source]
        source: toml::de::Error,
    },

    /// The merged configuration failed a validation rule.
    #[error("invalid configuration: {field}: {message}")]
    ValidationError {
        /// Dotted field path that failed validation.
        field: String,
        /// Human-readable explanation.
        message: String,
    },

    /// The user's home directory could not be determined.
    #[error("could not determine home directory")]
    NoHomeDir,
}

/// Convenience result alias.
pub type ConfigResult<T> = Result<T, ConfigError>;
