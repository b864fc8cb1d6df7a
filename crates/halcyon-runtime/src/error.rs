//! Runtime error types.

use thiserror::Error;

/// Errors that can occur while driving a session's turn loop.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The LLM provider failed (after its own retry budget was exhausted).
    #[error("llm error: {0}")]
    Llm(#[from] halcyon_llm::LlmError),

    /// Session persistence failed.
    #[error("storage error: {0}")]
    Storage(#[from] halcyon_storage::StorageError),

    /// Configuration could not be resolved into a runnable session.
    #[error("configuration error: {0}")]
    Config(String),

    /// A requested session id has no snapshot on disk.
    #[error("session not found: {0}")]
    SessionNotFound(String),

    /// The sub-agent deadline elapsed before it finished.
    #[error("sub-agent timed out after {0}s")]
    SubAgentTimeout(u64),
}

/// Convenience result alias.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
