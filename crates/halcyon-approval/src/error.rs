//! Approval-engine errors.

use thiserror::Error;

/// Errors from the approval subsystem. The classifier itself is infallible
/// (spec §4.3: "determinism: same inputs -> same decision; no state"); this
/// type exists for the manager's front-end interaction path.
#[derive(Debug, Error)]
pub enum ApprovalError {
    /// The registered front-end callback panicked or otherwise failed.
    #[error("approval callback failed: {0}")]
    CallbackFailed(String),
}

/// Convenience result alias.
pub type ApprovalResult<T> = Result<T, ApprovalError>;
