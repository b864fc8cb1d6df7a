//! [`McpTool`] — bridges one MCP server's tool into the [`halcyon_tools::Tool`]
//! contract so the turn loop never has to know a tool's provenance.

use std::sync::Arc;

use halcyon_tools::{Tool, ToolContext, ToolInvocation, ToolKind, ToolResult};
use serde_json::Value;

use crate::client::McpClient;

/// Wraps one tool exposed by a connected MCP server.
pub struct McpTool {
    /// Namespaced name: `<server>__<tool>`.
    namespaced_name: String,
    /// The tool's own name on the server, unqualified.
    remote_name: String,
    description: String,
    schema: Value,
    client: Arc<McpClient>,
}

impl McpTool {
    /// Build a tool wrapper, namespacing `remote_name` under `server_name`
    /// (spec §4.10: "tool registration as `<server>__<tool>`").
    #[must_use]
    pub fn new(server_name: &str, remote_name: String, description: String, schema: Value, client: Arc<McpClient>) -> Self {
        Self { namespaced_name: format!("{server_name}__{remote_name}"), remote_name, description, schema, client }
    }
}

#[async_trait::async_trait]
impl Tool for McpTool {
    fn name(&self) -> &str {
        &self.namespaced_name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn kind(&self) -> ToolKind {
        ToolKind::Mcp
    }

    fn schema(&self) -> Value {
        self.schema.clone()
    }

    async fn execute(&self, invocation: &ToolInvocation, _ctx: &ToolContext) -> ToolResult {
        match self.client.call_tool(&self.remote_name, invocation.arguments.clone()).await {
            Ok(value) => ToolResult::success(render_result(&value)),
            Err(e) => ToolResult::failure(e.to_string()),
        }
    }
}

/// Render an MCP `tools/call` result as text for the model. Prefers a
/// `content` array of `{type: "text", text: ...}` entries (the common MCP
/// shape); falls back to the raw JSON otherwise.
fn render_result(value: &Value) -> String {
    if let Some(items) = value.get("content").and_then(Value::as_array) {
        let text: Vec<&str> = items.iter().filter_map(|item| item.get("text").and_then(Value::as_str)).collect();
        if !text.is_empty() {
            return text.join("\n");
        }
    }
    value.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_result_extracts_text_content() {
        let value = serde_json::json!({"content": [{"type": "text", "text": "hello"}]});
        assert_eq!(render_result(&value), "hello");
    }

    #[test]
    fn render_result_falls_back_to_raw_json() {
        let value = serde_json::json!({"ok": true});
        assert_eq!(render_result(&value), "{\"ok\":true}");
    }
}
