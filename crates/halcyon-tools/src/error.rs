//! Tool execution errors.

use thiserror::Error;

/// Errors that can occur while a tool runs. These are distinct from a
/// failed [`crate::types::ToolResult`] — a `ToolError` represents an
/// unrecoverable condition the invocation pipeline turns into an error
/// result; tools themselves never see this type in their return value.
#[derive(Debug, Error)]
pub enum ToolError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid arguments.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    /// Execution failed.
    #[error("execution failed: {0}")]
    ExecutionFailed(String),

    /// Path not found.
    #[error("path not found: {0}")]
    PathNotFound(String),

    /// Timeout.
    #[error("timeout after {0}ms")]
    Timeout(u64),

    /// Network request failed.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Other error.
    #[error("{0}")]
    Other(String),
}
