//! halcyon-mcp — MCP server supervisor and tool bridge (spec §4.10).
//!
//! Each configured server is reached over stdio (subprocess) or HTTP,
//! mutually exclusive per server. Connection is a minimal JSON-RPC subset
//! (`initialize`, `tools/list`, `tools/call`) — the full MCP wire protocol
//! is out of scope. Discovered tools are bridged into a [`halcyon_tools::ToolRegistry`]
//! as namespaced [`tool::McpTool`]s.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod client;
pub mod error;
pub mod rpc;
pub mod supervisor;
pub mod tool;
pub mod transport;

pub use client::McpClient;
pub use error::{McpError, McpResult};
pub use supervisor::{ConnectReport, McpSupervisor};
pub use tool::McpTool;
