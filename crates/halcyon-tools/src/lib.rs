//! Tool contract, built-in tool shims, and registry for the halcyon agent
//! orchestration engine.
//!
//! Every tool — built-in, discovered, or MCP-sourced — implements [`Tool`].
//! The turn loop and invocation pipeline (in `halcyon-runtime`) program
//! against this trait only.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod bash;
mod context;
mod edit_file;
mod error;
mod glob;
mod grep;
mod memory;
mod read_file;
mod todo;
mod types;
mod web_fetch;
mod write_file;

pub use bash::BashTool;
pub use context::{
    MemoryStore, SubAgentRequest, SubAgentResult, SubAgentSpawner, TodoItem, TodoStatus,
    ToolContext,
};
pub use edit_file::EditFileTool;
pub use error::ToolError;
pub use glob::GlobTool;
pub use grep::GrepTool;
pub use memory::{MemoryGetTool, MemorySetTool};
pub use read_file::ReadFileTool;
pub use todo::{TodoReadTool, TodoWriteTool};
pub use types::{FileDiff, ToolConfirmation, ToolInvocation, ToolKind, ToolResult};
pub use web_fetch::WebFetchTool;
pub use write_file::WriteFileTool;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use halcyon_llm::LlmToolDefinition;
use serde_json::Value;

/// Maximum output size in characters before truncation.
const MAX_OUTPUT_CHARS: usize = 30_000;

/// A tool the agent can invoke, whether built in, discovered from a plugin
/// descriptor, or sourced from an MCP server (spec §4.1).
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    /// Globally unique tool name. MCP-originated tools are namespaced
    /// `<server>__<tool>`.
    fn name(&self) -> &str;

    /// Human-readable description for the LLM.
    fn description(&self) -> &str;

    /// Tool category, driving the default mutating policy.
    fn kind(&self) -> ToolKind;

    /// JSON schema for tool input parameters.
    fn schema(&self) -> Value;

    /// Whether this particular invocation mutates state. Defaults to the
    /// kind's default policy; tools may override for argument-dependent
    /// cases (e.g. a dry-run flag).
    fn is_mutating(&self, _args: &Value) -> bool {
        self.kind().is_mutating_by_default()
    }

    /// Validate arguments, returning a list of human-readable error
    /// strings (empty if valid).
    fn validate(&self, _args: &Value) -> Vec<String> {
        Vec::new()
    }

    /// Build a confirmation prompt for this invocation, or `None` if no
    /// confirmation is needed. Only called for mutating invocations by
    /// the invocation pipeline; tools may still return `None` themselves
    /// (e.g. a mutating tool the policy has pre-approved).
    fn get_confirmation(&self, invocation: &ToolInvocation) -> Option<ToolConfirmation> {
        if self.is_mutating(&invocation.arguments) {
            Some(ToolConfirmation::default_for(
                self.name(),
                invocation.arguments.clone(),
            ))
        } else {
            None
        }
    }

    /// Execute the tool with the given invocation.
    async fn execute(&self, invocation: &ToolInvocation, ctx: &ToolContext) -> ToolResult;
}

/// Registry of tools available for lookup and LLM definition export.
///
/// Stores three maps per spec §4.2: built-in and discovered tools share
/// one map (with discovered names tracked separately so they can be
/// hot-reloaded without touching built-ins), and MCP-sourced tools live in
/// a second map keyed by their namespaced name.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    discovered_names: HashSet<String>,
    mcp_tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
            discovered_names: HashSet::new(),
            mcp_tools: HashMap::new(),
        }
    }

    /// Create a registry with all built-in tools registered.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register_builtin(Arc::new(ReadFileTool));
        registry.register_builtin(Arc::new(WriteFileTool));
        registry.register_builtin(Arc::new(EditFileTool));
        registry.register_builtin(Arc::new(GlobTool));
        registry.register_builtin(Arc::new(GrepTool));
        registry.register_builtin(Arc::new(BashTool));
        registry.register_builtin(Arc::new(WebFetchTool::new()));
        registry.register_builtin(Arc::new(TodoWriteTool));
        registry.register_builtin(Arc::new(TodoReadTool));
        registry.register_builtin(Arc::new(MemoryGetTool));
        registry.register_builtin(Arc::new(MemorySetTool));
        registry
    }

    /// Register a compiled-in tool.
    pub fn register_builtin(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_owned(), tool);
    }

    /// Register a tool discovered from a plugin descriptor. Tracked
    /// separately from built-ins so [`Self::clear_discovered`] can drop
    /// just this subset on hot-reload.
    pub fn register_discovered(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_owned();
        self.discovered_names.insert(name.clone());
        self.tools.insert(name, tool);
    }

    /// Remove all discovered tools, leaving built-ins untouched.
    pub fn clear_discovered(&mut self) {
        for name in self.discovered_names.drain() {
            self.tools.remove(&name);
        }
    }

    /// Register an MCP-sourced tool under its namespaced name.
    pub fn register_mcp(&mut self, tool: Arc<dyn Tool>) {
        self.mcp_tools.insert(tool.name().to_owned(), tool);
    }

    /// Remove all tools sourced from a given MCP server (by namespace
    /// prefix `"<server>__"`), called when a server disconnects.
    pub fn clear_mcp_server(&mut self, server_name: &str) {
        let prefix = format!("{server_name}__");
        self.mcp_tools.retain(|name, _| !name.starts_with(&prefix));
    }

    /// Get a tool by name: searches built-in/discovered first, then MCP.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools
            .get(name)
            .or_else(|| self.mcp_tools.get(name))
            .cloned()
    }

    /// The union of all tools, filtered by an optional allow-list from
    /// configuration.
    #[must_use]
    pub fn get_tools(&self, allow_list: Option<&[String]>) -> Vec<Arc<dyn Tool>> {
        let all = self.tools.values().chain(self.mcp_tools.values()).cloned();
        match allow_list {
            Some(allowed) => all.filter(|t| allowed.iter().any(|a| a == t.name())).collect(),
            None => all.collect(),
        }
    }

    /// Export all tool definitions for the LLM, subject to the same
    /// allow-list filtering as [`Self::get_tools`].
    #[must_use]
    pub fn all_definitions(&self, allow_list: Option<&[String]>) -> Vec<LlmToolDefinition> {
        self.get_tools(allow_list)
            .iter()
            .map(|t| {
                LlmToolDefinition::new(t.name())
                    .with_description(t.description().to_owned())
                    .with_schema(t.schema())
            })
            .collect()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Truncate output to stay within LLM context limits.
///
/// If `output` exceeds [`MAX_OUTPUT_CHARS`], it is truncated and a notice
/// is appended.
#[must_use]
pub fn truncate_output(output: String) -> (String, bool) {
    if output.len() <= MAX_OUTPUT_CHARS {
        return (output, false);
    }
    let mut truncated = output[..MAX_OUTPUT_CHARS].to_owned();
    truncated.push_str("\n\n... (output truncated — exceeded 30000 character limit)");
    (truncated, true)
}
