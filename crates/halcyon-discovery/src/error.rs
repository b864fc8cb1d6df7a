//! Discovery errors, preserved in the three categories spec §4.11 names.

use std::path::PathBuf;

use thiserror::Error;

/// One failure encountered while scanning a tool descriptor directory.
/// Categorised exactly as spec §4.11 names them: `load`, `parse`,
/// `instantiate`.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The descriptor file could not be read.
    #[error("failed to load '{path}': {source}")]
    Load {
        /// File that failed to load.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The descriptor file's contents did not parse as TOML, or were
    /// structurally invalid.
    #[error("failed to parse '{path}': {reason}")]
    Parse {
        /// File that failed to parse.
        path: PathBuf,
        /// Why it failed.
        reason: String,
    },

    /// The descriptor parsed, but the tool it names could not be
    /// instantiated (e.g. an MCP-style server descriptor failed to
    /// connect).
    #[error("failed to instantiate tool from '{path}': {reason}")]
    Instantiate {
        /// File the descriptor came from.
        path: PathBuf,
        /// Why instantiation failed.
        reason: String,
    },
}

/// Convenience result alias.
pub type DiscoveryResult<T> = Result<T, DiscoveryError>;
