//! Storage errors.

use thiserror::Error;

/// Errors from the key-value store or the session/checkpoint persistence
/// manager.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The requested session or checkpoint id does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Underlying filesystem operation failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored JSON did not parse, or a value failed to serialise.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A platform directory (data/config) could not be resolved.
    #[error(transparent)]
    Core(#[from] halcyon_core::CoreError),
}

/// Convenience result alias.
pub type StorageResult<T> = Result<T, StorageError>;
