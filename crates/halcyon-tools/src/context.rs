//! Shared context and supporting trait objects for built-in tools.
//!
//! Trait objects ([`MemoryStore`], [`SubAgentSpawner`]) are defined here and
//! implemented by higher crates (`halcyon-storage`, `halcyon-runtime`),
//! avoiding a circular dependency between `halcyon-tools` and either.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// Shared context available to all built-in tools.
pub struct ToolContext {
    /// Workspace root directory.
    pub workspace_root: PathBuf,
    /// Current working directory (persists across bash invocations).
    pub cwd: Arc<RwLock<PathBuf>>,
    /// Persisted user-preferences memory, if configured.
    memory: Option<Arc<dyn MemoryStore>>,
    /// Ephemeral per-session todo list.
    todos: Arc<RwLock<Vec<TodoItem>>>,
    /// Sub-agent spawner (set by runtime before each turn, cleared after).
    subagent_spawner: RwLock<Option<Arc<dyn SubAgentSpawner>>>,
}

impl ToolContext {
    /// Create a new tool context with no memory store configured.
    #[must_use]
    pub fn new(workspace_root: PathBuf) -> Self {
        let cwd = Arc::new(RwLock::new(workspace_root.clone()));
        Self {
            workspace_root,
            cwd,
            memory: None,
            todos: Arc::new(RwLock::new(Vec::new())),
            subagent_spawner: RwLock::new(None),
        }
    }

    /// Create a per-turn tool context that shares `cwd` and `todos` with
    /// other turns in the same session but has its own independent
    /// spawner slot, preventing concurrent turns from racing on it.
    #[must_use]
    pub fn with_shared_state(
        workspace_root: PathBuf,
        cwd: Arc<RwLock<PathBuf>>,
        todos: Arc<RwLock<Vec<TodoItem>>>,
        memory: Option<Arc<dyn MemoryStore>>,
    ) -> Self {
        Self {
            workspace_root,
            cwd,
            memory,
            todos,
            subagent_spawner: RwLock::new(None),
        }
    }

    /// Attach a memory store.
    #[must_use]
    pub fn with_memory(mut self, memory: Arc<dyn MemoryStore>) -> Self {
        self.memory = Some(memory);
        self
    }

    /// The configured memory store, if any.
    #[must_use]
    pub fn memory(&self) -> Option<&Arc<dyn MemoryStore>> {
        self.memory.as_ref()
    }

    /// The shared todo list handle.
    #[must_use]
    pub fn todos(&self) -> Arc<RwLock<Vec<TodoItem>>> {
        self.todos.clone()
    }

    /// Set the sub-agent spawner (called by the runtime at turn start).
    pub async fn set_subagent_spawner(&self, spawner: Option<Arc<dyn SubAgentSpawner>>) {
        *self.subagent_spawner.write().await = spawner;
    }

    /// Get the sub-agent spawner (called by the task tool).
    pub async fn subagent_spawner(&self) -> Option<Arc<dyn SubAgentSpawner>> {
        self.subagent_spawner.read().await.clone()
    }
}

/// A single entry in the ephemeral per-session todo list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TodoItem {
    /// Short description of the task.
    pub content: String,
    /// Current status.
    pub status: TodoStatus,
}

/// Status of a todo item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TodoStatus {
    /// Not yet started.
    Pending,
    /// Currently being worked on.
    InProgress,
    /// Finished.
    Completed,
}

/// Persisted key-value memory, serialised to the well-known data directory
/// and injected into the next session's system prompt as a
/// user-preferences block (spec §3).
#[async_trait::async_trait]
pub trait MemoryStore: Send + Sync {
    /// Fetch a value by key.
    async fn get(&self, key: &str) -> Option<String>;

    /// Set a value, overwriting any existing entry.
    async fn set(&self, key: &str, value: &str) -> Result<(), String>;

    /// All entries, for injection into the system prompt.
    async fn all(&self) -> HashMap<String, String>;
}

/// Request to spawn a sub-agent.
#[derive(Debug, Clone)]
pub struct SubAgentRequest {
    /// Short description of the task (shown in status/logs).
    pub description: String,
    /// Detailed instructions for the sub-agent.
    pub prompt: String,
    /// Optional timeout (falls back to the executor default if `None`).
    pub timeout: Option<Duration>,
}

/// Result returned by a completed sub-agent.
#[derive(Debug, Clone)]
pub struct SubAgentResult {
    /// Whether the sub-agent completed successfully.
    pub success: bool,
    /// Output text from the sub-agent (last assistant message).
    pub output: String,
    /// Wall-clock duration in milliseconds.
    pub duration_ms: u64,
    /// Number of tool calls the sub-agent made.
    pub tool_calls: usize,
    /// Error message, present when `success` is false.
    pub error: Option<String>,
}

/// Trait for spawning sub-agents from built-in tools.
///
/// Implemented by the sub-agent executor in `halcyon-runtime` and injected
/// into [`ToolContext`] as `Arc<dyn SubAgentSpawner>`.
#[async_trait::async_trait]
pub trait SubAgentSpawner: Send + Sync {
    /// Spawn a sub-agent and wait for its result.
    async fn spawn(&self, request: SubAgentRequest) -> Result<SubAgentResult, String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn context_starts_with_no_spawner() {
        let ctx = ToolContext::new(std::env::temp_dir());
        assert!(ctx.subagent_spawner().await.is_none());
    }

    #[tokio::test]
    async fn todos_start_empty() {
        let ctx = ToolContext::new(std::env::temp_dir());
        assert!(ctx.todos().read().await.is_empty());
    }
}
