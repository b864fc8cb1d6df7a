//! [`DiscoveryManager`] — scans the workspace and global tool-descriptor
//! directories, instantiating each descriptor and registering it into a
//! [`halcyon_tools::ToolRegistry`] (spec §4.11).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use halcyon_core::dirs;
use halcyon_mcp::McpClient;
use halcyon_tools::{Tool, ToolRegistry};
use halcyon_config::types::McpServerSection;

use crate::descriptor::{self, ToolDescriptor};
use crate::error::DiscoveryError;
use crate::static_tool::StaticTool;
use crate::mcp_bridge::register_mcp_server_tools;

/// Scans `{cwd}/.halcyon/tools` and the global tools directory for `.toml`
/// descriptors, instantiates each, and keeps a running list of errors
/// encountered along the way.
pub struct DiscoveryManager {
    cwd: PathBuf,
    /// Errors accumulated by the most recent [`Self::discover_all`] call.
    errors: Vec<DiscoveryError>,
    /// MCP clients connected for server-style descriptors, kept alive for
    /// the lifetime of the discovered tools (and torn down on reload).
    clients: Vec<Arc<McpClient>>,
}

impl DiscoveryManager {
    /// Build a manager rooted at `cwd`.
    #[must_use]
    pub fn new(cwd: PathBuf) -> Self {
        Self { cwd, errors: Vec::new(), clients: Vec::new() }
    }

    /// Errors accumulated by the most recent discovery pass.
    #[must_use]
    pub fn errors(&self) -> &[DiscoveryError] {
        &self.errors
    }

    /// Scan the workspace and global tool directories, instantiate every
    /// descriptor found, and register the results into `registry` as
    /// discovered tools. Clears prior errors first (spec §4.11: "clear
    /// prior errors").
    pub async fn discover_all(&mut self, registry: &mut ToolRegistry) {
        self.errors.clear();
        self.shutdown_clients().await;

        let mut dirs_to_scan = vec![dirs::workspace_tools_dir(&self.cwd)];
        match dirs::global_tools_dir() {
            Ok(dir) => dirs_to_scan.push(dir),
            Err(e) => tracing::debug!(error = %e, "global tools dir unavailable, skipping"),
        }

        for dir in dirs_to_scan {
            if !dir.is_dir() {
                continue;
            }
            self.discover_dir(&dir, registry).await;
        }
    }

    /// Unregister all previously discovered tools and repeat discovery
    /// (spec §4.11: "`reload()` unregisters previously discovered tools
    /// and repeats discovery").
    pub async fn reload(&mut self, registry: &mut ToolRegistry) {
        registry.clear_discovered();
        self.discover_all(registry).await;
    }

    async fn discover_dir(&mut self, dir: &Path, registry: &mut ToolRegistry) {
        let mut read_dir = match tokio::fs::read_dir(dir).await {
            Ok(rd) => rd,
            Err(e) => {
                self.errors.push(DiscoveryError::Load { path: dir.to_path_buf(), source: e });
                return;
            },
        };

        loop {
            let entry = match read_dir.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    self.errors.push(DiscoveryError::Load { path: dir.to_path_buf(), source: e });
                    break;
                },
            };

            let path = entry.path();
            if path.extension().and_then(std::ffi::OsStr::to_str) != Some("toml") {
                continue;
            }
            self.discover_file(&path, registry).await;
        }
    }

    async fn discover_file(&mut self, path: &Path, registry: &mut ToolRegistry) {
        let contents = match tokio::fs::read_to_string(path).await {
            Ok(c) => c,
            Err(e) => {
                self.errors.push(DiscoveryError::Load { path: path.to_path_buf(), source: e });
                return;
            },
        };

        let parsed = match descriptor::parse(path, &contents) {
            Ok(p) => p,
            Err(e) => {
                self.errors.push(e);
                return;
            },
        };

        match parsed {
            ToolDescriptor::Static(static_desc) => {
                let tool: Arc<dyn Tool> = Arc::new(StaticTool::new(static_desc));
                registry.register_discovered(tool);
            },
            ToolDescriptor::McpServer(server_desc) => {
                let server_name = path.file_stem().and_then(std::ffi::OsStr::to_str).unwrap_or("server").to_owned();
                let config = McpServerSection {
                    enabled: true,
                    command: Some(server_desc.command),
                    args: server_desc.args,
                    env: server_desc.env,
                    url: None,
                    startup_timeout_sec: server_desc.startup_timeout_sec,
                    cwd: server_desc.cwd,
                };
                match register_mcp_server_tools(&server_name, &config, &self.cwd, registry).await {
                    Ok(client) => self.clients.push(client),
                    Err(reason) => {
                        self.errors.push(DiscoveryError::Instantiate { path: path.to_path_buf(), reason });
                    },
                }
            },
        }
    }

    async fn shutdown_clients(&mut self) {
        for client in self.clients.drain(..) {
            client.shutdown().await;
        }
    }
}
