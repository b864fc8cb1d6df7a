//! [`McpClient`] — a single connected server: initialize, list tools,
//! call a tool.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use halcyon_config::types::McpServerSection;
use serde_json::Value;

use crate::error::{McpError, McpResult};
use crate::rpc::RpcToolDefinition;
use crate::transport::{HttpTransport, StdioTransport, Transport};

/// A connected MCP server.
pub struct McpClient {
    name: String,
    transport: Transport,
}

impl McpClient {
    /// Connect to `config`, enforcing `config.startup_timeout_sec` across
    /// both the transport spawn/dial and the `initialize` handshake (spec
    /// §5: "MCP connect: `startupTimeoutSec`").
    pub async fn connect(name: &str, config: &McpServerSection, default_cwd: &std::path::Path) -> McpResult<Self> {
        let timeout = Duration::from_secs(config.startup_timeout_sec);
        tokio::time::timeout(timeout, Self::connect_inner(name, config, default_cwd))
            .await
            .map_err(|_| McpError::ConnectTimeout { name: name.to_owned(), timeout_secs: config.startup_timeout_sec })?
    }

    async fn connect_inner(name: &str, config: &McpServerSection, default_cwd: &std::path::Path) -> McpResult<Self> {
        let transport = match (&config.command, &config.url) {
            (Some(command), None) => {
                let cwd: PathBuf = config.cwd.clone().unwrap_or_else(|| default_cwd.to_path_buf());
                let stdio = StdioTransport::spawn(name, command, &config.args, &config.env, Some(&cwd))?;
                Transport::Stdio(tokio::sync::Mutex::new(stdio))
            },
            (None, Some(url)) => Transport::Http(HttpTransport::new(url.clone())),
            (Some(_), Some(_)) => {
                return Err(McpError::InvalidConfig { name: name.to_owned(), reason: "both command and url set".to_owned() })
            },
            (None, None) => {
                return Err(McpError::InvalidConfig { name: name.to_owned(), reason: "neither command nor url set".to_owned() })
            },
        };

        let client = Self { name: name.to_owned(), transport };
        client.initialize().await?;
        Ok(client)
    }

    async fn initialize(&self) -> McpResult<()> {
        self.transport
            .call(&self.name, "initialize", Some(serde_json::json!({"protocolVersion": "2024-11-05"})))
            .await?;
        Ok(())
    }

    /// Server name this client is connected to.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// List the tools this server exposes.
    pub async fn list_tools(&self) -> McpResult<Vec<RpcToolDefinition>> {
        let result = self.transport.call(&self.name, "tools/list", None).await?;
        let tools = result
            .get("tools")
            .cloned()
            .ok_or_else(|| McpError::MalformedResponse(format!("{}: tools/list missing 'tools'", self.name)))?;
        serde_json::from_value(tools).map_err(|e| McpError::MalformedResponse(format!("{}: {e}", self.name)))
    }

    /// Call a tool by its unqualified name.
    pub async fn call_tool(&self, tool_name: &str, arguments: Value) -> McpResult<Value> {
        let params = serde_json::json!({"name": tool_name, "arguments": arguments});
        self.transport.call(&self.name, "tools/call", Some(params)).await
    }

    /// A cheap liveness probe: re-list tools and discard the result,
    /// used by the health-check sweep (spec §5: "runs on a repeating 60s
    /// timer until shutdown").
    pub async fn ping(&self) -> McpResult<()> {
        self.list_tools().await.map(|_| ())
    }

    /// Disconnect, killing the subprocess if this is a stdio transport.
    pub async fn shutdown(&self) {
        self.transport.shutdown().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn invalid_config_rejects_neither_command_nor_url() {
        let config = McpServerSection { enabled: true, command: None, args: Vec::new(), env: HashMap::new(), url: None, startup_timeout_sec: 5, cwd: None };
        let err = McpClient::connect("x", &config, std::path::Path::new("/tmp")).await.unwrap_err();
        assert!(matches!(err, McpError::InvalidConfig { .. }));
    }

    #[tokio::test]
    async fn invalid_config_rejects_both_command_and_url() {
        let config = McpServerSection {
            enabled: true,
            command: Some("echo".to_owned()),
            args: Vec::new(),
            env: HashMap::new(),
            url: Some("http://localhost".to_owned()),
            startup_timeout_sec: 5,
            cwd: None,
        };
        let err = McpClient::connect("x", &config, std::path::Path::new("/tmp")).await.unwrap_err();
        assert!(matches!(err, McpError::InvalidConfig { .. }));
    }
}
