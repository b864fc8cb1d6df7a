//! Telemetry error types.

use thiserror::Error;

/// Errors that can occur with telemetry operations.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The requested log configuration could not be applied.
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// The global tracing subscriber could not be installed (usually
    /// because one was already installed).
    #[error("initialization error: {0}")]
    InitError(String),

    /// I/O error while opening a log file target.
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
