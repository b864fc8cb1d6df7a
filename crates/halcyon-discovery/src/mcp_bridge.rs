//! Bridges an MCP-style descriptor into connected tools registered as
//! *discovered* (not session-configured MCP servers) — `reload()` and the
//! MCP supervisor's health sweep each own a disjoint set of connections.

use std::path::Path;
use std::sync::Arc;

use halcyon_config::types::McpServerSection;
use halcyon_mcp::{McpClient, McpTool};
use halcyon_tools::{Tool, ToolRegistry};

/// Connect to the server described by `config`, list its tools, and
/// register each as a discovered [`McpTool`]. Returns the connected client
/// so its lifetime can be tied to the discovery manager.
pub async fn register_mcp_server_tools(
    server_name: &str,
    config: &McpServerSection,
    default_cwd: &Path,
    registry: &mut ToolRegistry,
) -> Result<Arc<McpClient>, String> {
    let client = Arc::new(McpClient::connect(server_name, config, default_cwd).await.map_err(|e| e.to_string())?);

    let tools = client.list_tools().await.map_err(|e| e.to_string())?;
    for definition in tools {
        let tool: Arc<dyn Tool> = Arc::new(McpTool::new(
            server_name,
            definition.name,
            definition.description.unwrap_or_default(),
            definition.input_schema,
            Arc::clone(&client),
        ));
        registry.register_discovered(tool);
    }

    Ok(client)
}
