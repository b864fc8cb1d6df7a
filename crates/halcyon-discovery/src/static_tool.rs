//! [`StaticTool`] — a discovered tool that invokes a configured command
//! per call, piping arguments in as JSON on stdin and reading stdout back.
//!
//! Grounded on the same subprocess pattern halcyon-tools' `bash.rs` and
//! halcyon-hooks' `executor.rs` use, narrowed to a single fixed command
//! per tool rather than an arbitrary one per invocation.

use std::time::Duration;

use halcyon_tools::{Tool, ToolContext, ToolInvocation, ToolKind, ToolResult};
use serde_json::Value;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::descriptor::StaticToolDescriptor;

const EXECUTION_TIMEOUT: Duration = Duration::from_secs(60);

/// A statically-descriptor tool, invoked by running `command` with the
/// call's arguments serialised as a JSON object on stdin.
pub struct StaticTool {
    name: String,
    description: String,
    schema: Value,
    command: String,
    mutating: bool,
}

impl StaticTool {
    /// Build a tool from its parsed descriptor.
    #[must_use]
    pub fn new(descriptor: StaticToolDescriptor) -> Self {
        Self {
            name: descriptor.name,
            description: descriptor.description,
            schema: descriptor.schema,
            command: descriptor.command,
            mutating: descriptor.mutating,
        }
    }
}

#[async_trait::async_trait]
impl Tool for StaticTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn kind(&self) -> ToolKind {
        if self.mutating { ToolKind::Shell } else { ToolKind::Read }
    }

    fn schema(&self) -> Value {
        self.schema.clone()
    }

    fn is_mutating(&self, _args: &Value) -> bool {
        self.mutating
    }

    async fn execute(&self, invocation: &ToolInvocation, ctx: &ToolContext) -> ToolResult {
        let cwd = ctx.cwd.read().await.clone();
        let payload = match serde_json::to_vec(&invocation.arguments) {
            Ok(bytes) => bytes,
            Err(e) => return ToolResult::failure(format!("failed to serialize arguments: {e}")),
        };

        let mut child = match Command::new("sh")
            .arg("-c")
            .arg(&self.command)
            .current_dir(&cwd)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .kill_on_drop(true)
            .spawn()
        {
            Ok(child) => child,
            Err(e) => return ToolResult::failure(format!("failed to spawn '{}': {e}", self.command)),
        };

        if let Some(mut stdin) = child.stdin.take() {
            if let Err(e) = stdin.write_all(&payload).await {
                return ToolResult::failure(format!("failed to write arguments to stdin: {e}"));
            }
        }

        let wait = tokio::time::timeout(EXECUTION_TIMEOUT, child.wait_with_output()).await;
        match wait {
            Ok(Ok(output)) => {
                let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
                let stderr = String::from_utf8_lossy(&output.stderr);
                if !stderr.is_empty() {
                    if !combined.is_empty() {
                        combined.push('\n');
                    }
                    combined.push_str(&stderr);
                }
                if output.status.success() {
                    ToolResult::success(combined)
                } else {
                    ToolResult::failure(format!("command exited with status {}", output.status.code().unwrap_or(-1)))
                        .with_partial_output(combined)
                }
            },
            Ok(Err(e)) => ToolResult::failure(format!("I/O error: {e}")),
            Err(_) => ToolResult::failure(format!("'{}' timed out after {}s", self.command, EXECUTION_TIMEOUT.as_secs())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(command: &str) -> StaticToolDescriptor {
        StaticToolDescriptor {
            name: "echo_tool".to_owned(),
            description: "echoes stdin".to_owned(),
            schema: serde_json::json!({"type": "object"}),
            command: command.to_owned(),
            mutating: false,
        }
    }

    #[tokio::test]
    async fn successful_invocation_returns_stdout() {
        let tool = StaticTool::new(descriptor("cat"));
        let ctx = ToolContext::new(std::env::temp_dir());
        let inv = ToolInvocation::new(serde_json::json!({"hello": "world"}), std::env::temp_dir());
        let result = tool.execute(&inv, &ctx).await;
        assert!(result.success);
        assert!(result.output.contains("hello"));
    }

    #[tokio::test]
    async fn nonzero_exit_is_a_failure() {
        let tool = StaticTool::new(descriptor("exit 1"));
        let ctx = ToolContext::new(std::env::temp_dir());
        let inv = ToolInvocation::new(serde_json::json!({}), std::env::temp_dir());
        let result = tool.execute(&inv, &ctx).await;
        assert!(!result.success);
    }

    #[test]
    fn mutating_flag_drives_kind() {
        let mut d = descriptor("cat");
        d.mutating = true;
        let tool = StaticTool::new(d);
        assert_eq!(tool.kind(), ToolKind::Shell);
        assert!(tool.is_mutating(&serde_json::json!({})));
    }
}
