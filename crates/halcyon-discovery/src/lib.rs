//! halcyon-discovery — tool-plugin descriptor discovery (spec §4.11).
//!
//! Scans `{cwd}/.halcyon/tools` and the global tools directory for `.toml`
//! descriptor files naming either a static tool (a fixed command invoked
//! per call) or an MCP-style subprocess server. This replaces the original
//! design's dynamic loading of compiled plugin modules — a descriptor file
//! format is the idiomatic Rust analogue (see `DESIGN.md`).

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod descriptor;
pub mod error;
pub mod manager;
pub mod mcp_bridge;
pub mod static_tool;

pub use descriptor::{McpServerDescriptor, StaticToolDescriptor, ToolDescriptor};
pub use error::{DiscoveryError, DiscoveryResult};
pub use manager::DiscoveryManager;
pub use static_tool::StaticTool;
