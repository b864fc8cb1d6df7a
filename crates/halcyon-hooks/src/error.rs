//! Hook dispatch errors.

use thiserror::Error;

/// Errors from spawning or running a hook's subprocess.
///
/// Per spec §4.4 ("hook failures are logged but never fail the host
/// operation") these never propagate past the executor — they are caught
/// and folded into a [`crate::result::HookOutcome::Failed`] instead.
#[derive(Debug, Error)]
pub enum HookError {
    /// The subprocess could not be spawned.
    #[error("failed to spawn hook command: {0}")]
    Spawn(#[from] std::io::Error),

    /// The subprocess did not finish within its timeout.
    #[error("hook timed out after {0}ms")]
    Timeout(u64),
}

/// Convenience result alias.
pub type HookResult<T> = Result<T, HookError>;
