//! Shared error type for core-level failures.

use thiserror::Error;

/// Errors that can occur in `halcyon-core` itself (directory resolution,
/// retry exhaustion bookkeeping).
#[derive(Debug, Error)]
pub enum CoreError {
    /// The platform data or config directory could not be determined.
    #[error("could not determine platform {kind} directory")]
    NoPlatformDir {
        /// Which directory kind failed to resolve ("data" or "config").
        kind: &'static str,
    },

    /// An I/O error while creating or accessing a platform directory.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result alias.
pub type CoreResult<T> = Result<T, CoreError>;
