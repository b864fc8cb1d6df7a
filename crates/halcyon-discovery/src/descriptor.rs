//! Descriptor file parsing — one `.toml` file names either an MCP-style
//! subprocess tool server, or a single static tool.
//!
//! Grounded on the teacher's `astrid-mcp::config::ServerConfig` TOML shape
//! (`command`, `args`, `env`, `cwd`), extended with a `[tool]` table for
//! the spec's second descriptor kind.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;

use crate::error::DiscoveryError;

/// The parsed contents of one descriptor file.
#[derive(Debug, Clone)]
pub enum ToolDescriptor {
    /// A subprocess MCP server exposing possibly many tools.
    McpServer(McpServerDescriptor),
    /// A single static tool invoked by running a command per call.
    Static(StaticToolDescriptor),
}

/// `[server]` table: an MCP-style subprocess tool server.
#[derive(Debug, Clone, Deserialize)]
pub struct McpServerDescriptor {
    /// Subprocess command.
    pub command: String,
    /// Arguments.
    #[serde(default)]
    pub args: Vec<String>,
    /// Environment variables.
    #[serde(default)]
    pub env: HashMap<String, String>,
    /// Working directory; defaults to the session cwd.
    #[serde(default)]
    pub cwd: Option<PathBuf>,
    /// Connect timeout, seconds.
    #[serde(default = "default_startup_timeout")]
    pub startup_timeout_sec: u64,
}

fn default_startup_timeout() -> u64 {
    10
}

/// `[tool]` table: a single static tool.
#[derive(Debug, Clone, Deserialize)]
pub struct StaticToolDescriptor {
    /// Tool name, registered as-is (not namespaced).
    pub name: String,
    /// Description surfaced to the LLM.
    #[serde(default)]
    pub description: String,
    /// JSON Schema for the tool's arguments.
    #[serde(default = "default_schema")]
    pub schema: Value,
    /// Shell command to run per invocation. Arguments are passed as JSON
    /// on stdin.
    pub command: String,
    /// Whether invocations mutate state (drives the approval default).
    #[serde(default)]
    pub mutating: bool,
}

fn default_schema() -> Value {
    serde_json::json!({"type": "object"})
}

#[derive(Debug, Deserialize)]
struct DescriptorFile {
    server: Option<McpServerDescriptor>,
    tool: Option<StaticToolDescriptor>,
}

/// Parse one descriptor file's contents.
pub fn parse(path: &Path, contents: &str) -> Result<ToolDescriptor, DiscoveryError> {
    let parsed: DescriptorFile =
        toml::from_str(contents).map_err(|e| DiscoveryError::Parse { path: path.to_path_buf(), reason: e.to_string() })?;

    match (parsed.server, parsed.tool) {
        (Some(server), None) => Ok(ToolDescriptor::McpServer(server)),
        (None, Some(tool)) => Ok(ToolDescriptor::Static(tool)),
        (Some(_), Some(_)) => {
            Err(DiscoveryError::Parse { path: path.to_path_buf(), reason: "descriptor has both [server] and [tool]".to_owned() })
        },
        (None, None) => {
            Err(DiscoveryError::Parse { path: path.to_path_buf(), reason: "descriptor has neither [server] nor [tool]".to_owned() })
        },
    }
}
