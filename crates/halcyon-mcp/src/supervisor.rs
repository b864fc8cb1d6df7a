//! [`McpSupervisor`] — owns every connected MCP server for a session.
//!
//! Grounded on the teacher's `McpClient`/`ServerManager` split
//! (`astrid-mcp::client`, `astrid-mcp::registry`) for the "hold a cache,
//! bridge tools into the registry, watch health in the background" shape —
//! simplified to the spec's single flat server map (no global/workspace
//! layering) and a hand-rolled JSON-RPC subset instead of `rmcp`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use halcyon_config::types::McpServerSection;
use halcyon_tools::ToolRegistry;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use crate::client::McpClient;
use crate::error::McpError;
use crate::tool::McpTool;

/// Interval between health-check sweeps (spec §5: "runs on a repeating
/// 60s timer until shutdown").
const HEALTH_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Outcome of a bulk connect attempt.
#[derive(Debug, Default)]
pub struct ConnectReport {
    /// Servers that connected successfully.
    pub connected: Vec<String>,
    /// Servers that failed to connect, with why.
    pub failed: Vec<(String, McpError)>,
}

/// A configured server's connection attempt, kept around so the health
/// sweep can retry servers that never connected in the first place (spec
/// §4.10: "if status ≠ connected, attempt connect and record the updated
/// status").
#[derive(Clone)]
struct ServerConfig {
    config: McpServerSection,
    cwd: PathBuf,
}

/// Owns every connected MCP server and bridges their tools into a
/// [`ToolRegistry`].
pub struct McpSupervisor {
    clients: RwLock<HashMap<String, Arc<McpClient>>>,
    /// Every enabled server's config, including ones that have never
    /// connected, so the health sweep has something to retry.
    configs: RwLock<HashMap<String, ServerConfig>>,
}

impl Default for McpSupervisor {
    fn default() -> Self {
        Self::new()
    }
}

impl McpSupervisor {
    /// Build an empty supervisor.
    #[must_use]
    pub fn new() -> Self {
        Self { clients: RwLock::new(HashMap::new()), configs: RwLock::new(HashMap::new()) }
    }

    /// Connect to every enabled server in `servers`, in parallel, each
    /// wrapped in its own timeout. Failures are isolated (spec §5: "the
    /// supervisor waits for all settled").
    pub async fn connect_all(&self, servers: &HashMap<String, McpServerSection>, cwd: &Path) -> ConnectReport {
        {
            let mut configs = self.configs.write().await;
            for (name, cfg) in servers.iter().filter(|(_, cfg)| cfg.enabled) {
                configs.insert(name.clone(), ServerConfig { config: cfg.clone(), cwd: cwd.to_path_buf() });
            }
        }

        let attempts = servers.iter().filter(|(_, cfg)| cfg.enabled).map(|(name, cfg)| {
            let name = name.clone();
            let cfg = cfg.clone();
            let cwd: PathBuf = cwd.to_path_buf();
            async move {
                let result = McpClient::connect(&name, &cfg, &cwd).await;
                (name, result)
            }
        });

        let results = futures::future::join_all(attempts).await;

        let mut report = ConnectReport::default();
        let mut clients = self.clients.write().await;
        for (name, result) in results {
            match result {
                Ok(client) => {
                    clients.insert(name.clone(), Arc::new(client));
                    report.connected.push(name);
                },
                Err(e) => {
                    tracing::warn!(server = %name, error = %e, "mcp server failed to connect");
                    report.failed.push((name, e));
                },
            }
        }
        report
    }

    /// List the tools of every connected server and register them into
    /// `registry` under `<server>__<tool>` (spec §4.10).
    pub async fn register_all_tools(&self, registry: &mut ToolRegistry) {
        let clients = self.clients.read().await;
        for (server_name, client) in clients.iter() {
            match client.list_tools().await {
                Ok(tools) => {
                    for tool in tools {
                        let wrapped = McpTool::new(server_name, tool.name, tool.description.unwrap_or_default(), tool.input_schema, Arc::clone(client));
                        registry.register_mcp(Arc::new(wrapped));
                    }
                },
                Err(e) => {
                    tracing::warn!(server = %server_name, error = %e, "failed to list tools");
                },
            }
        }
    }

    /// Names of every currently connected server (for `/mcp`).
    pub async fn connected_server_names(&self) -> Vec<String> {
        self.clients.read().await.keys().cloned().collect()
    }

    /// Ping every connected server once, dropping and de-registering any
    /// that fail, then attempt to (re)connect every configured server that
    /// isn't currently connected (spec §4.10: "every 60s, a health sweep
    /// iterates known clients; if status ≠ connected, attempt connect and
    /// record the updated status"; individual reconnect failures never
    /// abort the sweep).
    pub async fn sweep_once(&self, registry: &RwLock<ToolRegistry>) {
        let dead: Vec<String> = {
            let clients = self.clients.read().await;
            let mut dead = Vec::new();
            for (name, client) in clients.iter() {
                if let Err(e) = client.ping().await {
                    tracing::warn!(server = %name, error = %e, "mcp health check failed, dropping server");
                    dead.push(name.clone());
                }
            }
            dead
        };

        if !dead.is_empty() {
            let mut clients = self.clients.write().await;
            let mut reg = registry.write().await;
            for name in dead {
                if let Some(client) = clients.remove(&name) {
                    client.shutdown().await;
                }
                reg.clear_mcp_server(&name);
            }
        }

        self.reconnect_disconnected(registry).await;
    }

    /// Attempt `McpClient::connect` for every configured server that isn't
    /// currently in `self.clients`, registering its tools on success.
    /// Reconnect failures are logged and otherwise ignored so one broken
    /// server never stops the rest of the sweep (spec §4.10).
    async fn reconnect_disconnected(&self, registry: &RwLock<ToolRegistry>) {
        let to_retry: Vec<(String, ServerConfig)> = {
            let configs = self.configs.read().await;
            let clients = self.clients.read().await;
            configs.iter().filter(|(name, _)| !clients.contains_key(*name)).map(|(name, cfg)| (name.clone(), cfg.clone())).collect()
        };

        for (name, entry) in to_retry {
            match McpClient::connect(&name, &entry.config, &entry.cwd).await {
                Ok(client) => {
                    tracing::info!(server = %name, "mcp server reconnected");
                    let client = Arc::new(client);
                    self.clients.write().await.insert(name.clone(), Arc::clone(&client));
                    match client.list_tools().await {
                        Ok(tools) => {
                            let mut reg = registry.write().await;
                            for tool in tools {
                                let wrapped = McpTool::new(&name, tool.name, tool.description.unwrap_or_default(), tool.input_schema, Arc::clone(&client));
                                reg.register_mcp(Arc::new(wrapped));
                            }
                        },
                        Err(e) => {
                            tracing::warn!(server = %name, error = %e, "reconnected but failed to list tools");
                        },
                    }
                },
                Err(e) => {
                    tracing::debug!(server = %name, error = %e, "mcp server still not reachable");
                },
            }
        }
    }

    /// Spawn the repeating background health sweep. The handle is aborted
    /// when the session shuts down.
    pub fn spawn_health_sweep(self: &Arc<Self>, registry: Arc<RwLock<ToolRegistry>>) -> JoinHandle<()> {
        let supervisor = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(HEALTH_SWEEP_INTERVAL);
            interval.tick().await; // first tick fires immediately; skip it
            loop {
                interval.tick().await;
                supervisor.sweep_once(&registry).await;
            }
        })
    }

    /// Disconnect every connected server in parallel, suppressing errors
    /// (spec §5: "MCP shutdown: parallel disconnect of all clients; all
    /// errors suppressed").
    pub async fn shutdown_all(&self) {
        let mut clients = self.clients.write().await;
        let shutdowns = clients.values().map(|client| client.shutdown());
        futures::future::join_all(shutdowns).await;
        clients.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn connect_all_skips_disabled_servers() {
        let mut servers = HashMap::new();
        servers.insert(
            "disabled".to_owned(),
            McpServerSection { enabled: false, command: Some("nonexistent-binary-xyz".to_owned()), args: Vec::new(), env: HashMap::new(), url: None, startup_timeout_sec: 1, cwd: None },
        );
        let supervisor = McpSupervisor::new();
        let report = supervisor.connect_all(&servers, Path::new("/tmp")).await;
        assert!(report.connected.is_empty());
        assert!(report.failed.is_empty());
    }

    #[tokio::test]
    async fn connect_all_isolates_failures() {
        let mut servers = HashMap::new();
        servers.insert(
            "broken".to_owned(),
            McpServerSection { enabled: true, command: Some("definitely-not-a-real-binary-xyz".to_owned()), args: Vec::new(), env: HashMap::new(), url: None, startup_timeout_sec: 2, cwd: None },
        );
        let supervisor = McpSupervisor::new();
        let report = supervisor.connect_all(&servers, Path::new("/tmp")).await;
        assert!(report.connected.is_empty());
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "broken");
    }

    #[tokio::test]
    async fn shutdown_all_on_empty_supervisor_is_a_noop() {
        let supervisor = McpSupervisor::new();
        supervisor.shutdown_all().await;
        assert!(supervisor.connected_server_names().await.is_empty());
    }

    #[tokio::test]
    async fn sweep_retries_a_server_that_failed_at_startup() {
        let mut servers = HashMap::new();
        servers.insert(
            "broken".to_owned(),
            McpServerSection { enabled: true, command: Some("definitely-not-a-real-binary-xyz".to_owned()), args: Vec::new(), env: HashMap::new(), url: None, startup_timeout_sec: 1, cwd: None },
        );
        let supervisor = McpSupervisor::new();
        let report = supervisor.connect_all(&servers, Path::new("/tmp")).await;
        assert!(report.connected.is_empty());

        // The server that failed at startup is still tracked in `configs`,
        // so a sweep tries it again instead of ignoring it forever.
        let registry = RwLock::new(ToolRegistry::new());
        supervisor.sweep_once(&registry).await;
        assert!(supervisor.connected_server_names().await.is_empty());

        let to_retry = {
            let configs = supervisor.configs.read().await;
            let clients = supervisor.clients.read().await;
            configs.iter().filter(|(name, _)| !clients.contains_key(*name)).count()
        };
        assert_eq!(to_retry, 1);
    }
}
