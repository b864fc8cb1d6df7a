//! MCP supervisor errors.

use thiserror::Error;

/// Errors from connecting to, or calling, an MCP server.
#[derive(Debug, Error)]
pub enum McpError {
    /// The server's configuration was invalid (neither/both of
    /// `command`/`url` set).
    #[error("server '{name}' config is invalid: {reason}")]
    InvalidConfig {
        /// Server name.
        name: String,
        /// Why the config is invalid.
        reason: String,
    },

    /// Connecting did not complete within the configured timeout.
    #[error("server '{name}' did not respond within {timeout_secs}s")]
    ConnectTimeout {
        /// Server name.
        name: String,
        /// Configured timeout.
        timeout_secs: u64,
    },

    /// The subprocess transport could not be spawned.
    #[error("failed to spawn server '{name}': {source}")]
    Spawn {
        /// Server name.
        name: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The HTTP transport failed.
    #[error("http transport error for server '{name}': {source}")]
    Http {
        /// Server name.
        name: String,
        /// Underlying HTTP error.
        #[source]
        source: reqwest::Error,
    },

    /// The server returned a JSON-RPC error response.
    #[error("server '{name}' returned an error: {message}")]
    Rpc {
        /// Server name.
        name: String,
        /// Error message from the response.
        message: String,
    },

    /// No server with this name is connected.
    #[error("no connected mcp server named '{0}'")]
    ServerNotConnected(String),

    /// No tool with this name exists on the named server.
    #[error("server '{server}' has no tool named '{tool}'")]
    UnknownTool {
        /// Server name.
        server: String,
        /// Tool name.
        tool: String,
    },

    /// Malformed JSON-RPC response.
    #[error("malformed mcp response: {0}")]
    MalformedResponse(String),
}

/// Convenience result alias.
pub type McpResult<T> = Result<T, McpError>;
