//! A minimal JSON-RPC 2.0 subset: `initialize`, `tools/list`, `tools/call`.
//!
//! The wire protocol itself is out of scope (SPEC_FULL.md): this is enough
//! to drive the handful of methods the turn loop needs from an MCP server,
//! modelled on the request/response shape `rmcp` uses in the teacher's
//! `astrid-mcp::client`, without pulling in the full SDK.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A JSON-RPC request.
#[derive(Debug, Clone, Serialize)]
pub struct RpcRequest {
    jsonrpc: &'static str,
    id: u64,
    method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    params: Option<Value>,
}

impl RpcRequest {
    /// Build a request with the given id, method, and optional params.
    #[must_use]
    pub fn new(id: u64, method: impl Into<String>, params: Option<Value>) -> Self {
        Self { jsonrpc: "2.0", id, method: method.into(), params }
    }

    /// Render as a single line of JSON, newline-terminated, as the stdio
    /// transport expects.
    #[must_use]
    pub fn to_line(&self) -> String {
        format!("{}\n", serde_json::to_string(self).unwrap_or_default())
    }
}

/// A JSON-RPC response.
#[derive(Debug, Clone, Deserialize)]
pub struct RpcResponse {
    /// Echoed request id.
    #[serde(default)]
    pub id: Option<u64>,
    /// Successful result payload.
    #[serde(default)]
    pub result: Option<Value>,
    /// Error payload, mutually exclusive with `result`.
    #[serde(default)]
    pub error: Option<RpcErrorPayload>,
}

/// The `error` member of a JSON-RPC response.
#[derive(Debug, Clone, Deserialize)]
pub struct RpcErrorPayload {
    /// JSON-RPC error code.
    pub code: i64,
    /// Human-readable message.
    pub message: String,
}

/// A discovered tool, as reported by `tools/list`.
#[derive(Debug, Clone, Deserialize)]
pub struct RpcToolDefinition {
    /// Tool name, unqualified (no server prefix).
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: Option<String>,
    /// JSON Schema for the tool's input.
    #[serde(default = "default_schema", rename = "inputSchema")]
    pub input_schema: Value,
}

fn default_schema() -> Value {
    serde_json::json!({"type": "object"})
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_as_single_line() {
        let req = RpcRequest::new(1, "tools/list", None);
        let line = req.to_line();
        assert!(line.ends_with('\n'));
        assert!(line.contains("\"tools/list\""));
        assert!(serde_json::from_str::<Value>(line.trim()).is_ok());
    }

    #[test]
    fn response_error_parses() {
        let json = r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32601,"message":"method not found"}}"#;
        let resp: RpcResponse = serde_json::from_str(json).unwrap();
        assert!(resp.result.is_none());
        assert_eq!(resp.error.unwrap().code, -32601);
    }

    #[test]
    fn tool_definition_defaults_schema_when_absent() {
        let json = r#"{"name":"search"}"#;
        let def: RpcToolDefinition = serde_json::from_str(json).unwrap();
        assert_eq!(def.input_schema, serde_json::json!({"type": "object"}));
    }
}
