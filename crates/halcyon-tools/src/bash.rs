//! Bash tool — runs a shell command with a wall-clock timeout.
//!
//! `cd <dir>` is special-cased: instead of spawning a subshell (whose
//! directory change wouldn't survive the process exit), it updates the
//! shared [`ToolContext::cwd`] so subsequent invocations in the same
//! session see the new directory (spec §3: "Current working directory
//! (persists across bash invocations)").

use std::time::Duration;

use serde_json::Value;
use tokio::process::Command;

use crate::{Tool, ToolContext, ToolConfirmation, ToolInvocation, ToolKind, ToolResult};

/// Default wall-clock timeout, in milliseconds (spec §5: default 120s).
const DEFAULT_TIMEOUT_MS: u64 = 120_000;
/// Maximum wall-clock timeout a caller may request, in milliseconds (spec §5: max 600s).
const MAX_TIMEOUT_MS: u64 = 600_000;

/// Built-in tool for running shell commands.
pub struct BashTool;

impl BashTool {
    fn parse_timeout(args: &Value) -> u64 {
        args.get("timeout_ms")
            .and_then(Value::as_u64)
            .map_or(DEFAULT_TIMEOUT_MS, |v| v.min(MAX_TIMEOUT_MS))
    }
}

#[async_trait::async_trait]
impl Tool for BashTool {
    fn name(&self) -> &str {
        "bash"
    }

    fn description(&self) -> &str {
        "Runs a shell command and returns its stdout/stderr. Has a wall-clock timeout \
         (default 120s, max 600s). `cd <dir>` changes the working directory for subsequent \
         bash invocations in this session instead of spawning a subshell."
    }

    fn kind(&self) -> ToolKind {
        ToolKind::Shell
    }

    fn schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "command": {
                    "type": "string",
                    "description": "The shell command to run"
                },
                "timeout_ms": {
                    "type": "integer",
                    "description": "Wall-clock timeout in milliseconds (default 120000, max 600000)"
                }
            },
            "required": ["command"]
        })
    }

    fn validate(&self, args: &Value) -> Vec<String> {
        if args.get("command").and_then(Value::as_str).map(str::trim).unwrap_or("").is_empty() {
            vec!["command is required".to_owned()]
        } else {
            Vec::new()
        }
    }

    fn get_confirmation(&self, invocation: &ToolInvocation) -> Option<ToolConfirmation> {
        let command = invocation
            .arguments
            .get("command")
            .and_then(Value::as_str)
            .unwrap_or_default();
        Some(ToolConfirmation::default_for(self.name(), invocation.arguments.clone()).with_command(command))
    }

    async fn execute(&self, invocation: &ToolInvocation, ctx: &ToolContext) -> ToolResult {
        let args = &invocation.arguments;
        let Some(command) = args.get("command").and_then(Value::as_str) else {
            return ToolResult::failure("command is required");
        };
        let command = command.trim();
        if command.is_empty() {
            return ToolResult::failure("command is required");
        }

        let timeout_ms = Self::parse_timeout(args);

        if let Some(dir) = command.strip_prefix("cd ").map(str::trim) {
            let current = ctx.cwd.read().await.clone();
            let target = if dir.starts_with('/') {
                std::path::PathBuf::from(dir)
            } else {
                current.join(dir)
            };
            let canonical = match tokio::fs::canonicalize(&target).await {
                Ok(p) => p,
                Err(e) => return ToolResult::failure(format!("cd: {e}")),
            };
            if !canonical.is_dir() {
                return ToolResult::failure(format!("cd: not a directory: {dir}"));
            }
            *ctx.cwd.write().await = canonical.clone();
            return ToolResult::success(format!("changed directory to {}", canonical.display()));
        }

        let cwd = ctx.cwd.read().await.clone();
        let child = match Command::new("sh")
            .arg("-c")
            .arg(command)
            .current_dir(&cwd)
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .kill_on_drop(true)
            .spawn()
        {
            Ok(child) => child,
            Err(e) => return ToolResult::failure(format!("failed to spawn shell: {e}")),
        };

        let wait = tokio::time::timeout(Duration::from_millis(timeout_ms), child.wait_with_output()).await;

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
                let (combined, truncated) = crate::truncate_output(combined);
                let exit_code = output.status.code().unwrap_or(-1);

                if output.status.success() {
                    ToolResult::success(combined).with_exit_code(exit_code).with_truncated(truncated)
                } else {
                    ToolResult::failure(format!("command exited with status {exit_code}"))
                        .with_partial_output(combined)
                        .with_exit_code(exit_code)
                        .with_truncated(truncated)
                }
            },
            Ok(Err(e)) => ToolResult::failure(format!("I/O error: {e}")),
            Err(_) => ToolResult::failure(format!("command timed out after {timeout_ms}ms")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> ToolContext {
        ToolContext::new(std::env::temp_dir())
    }

    fn invocation(args: Value) -> ToolInvocation {
        ToolInvocation::new(args, std::env::temp_dir())
    }

    #[tokio::test]
    async fn test_bash_echo() {
        let result = BashTool
            .execute(&invocation(serde_json::json!({"command": "echo hello"})), &ctx())
            .await;
        assert!(result.success);
        assert!(result.output.contains("hello"));
        assert_eq!(result.exit_code, Some(0));
    }

    #[tokio::test]
    async fn test_bash_nonzero_exit() {
        let result = BashTool
            .execute(&invocation(serde_json::json!({"command": "exit 3"})), &ctx())
            .await;
        assert!(!result.success);
        assert_eq!(result.exit_code, Some(3));
    }

    #[tokio::test]
    async fn test_bash_timeout() {
        let result = BashTool
            .execute(
                &invocation(serde_json::json!({"command": "sleep 2", "timeout_ms": 50})),
                &ctx(),
            )
            .await;
        assert!(!result.success);
        assert!(result.error.unwrap().contains("timed out"));
    }

    #[tokio::test]
    async fn test_bash_cd_persists() {
        let context = ctx();
        let tmp = tempfile::TempDir::new().unwrap();
        let cd_result = BashTool
            .execute(
                &invocation(serde_json::json!({"command": format!("cd {}", tmp.path().display())})),
                &context,
            )
            .await;
        assert!(cd_result.success);

        let pwd_result = BashTool
            .execute(&invocation(serde_json::json!({"command": "pwd"})), &context)
            .await;
        assert!(pwd_result.output.trim().ends_with(tmp.path().file_name().unwrap().to_str().unwrap()));
    }

    #[tokio::test]
    async fn test_bash_missing_command() {
        let result = BashTool.execute(&invocation(serde_json::json!({})), &ctx()).await;
        assert!(!result.success);
    }

    #[test]
    fn confirmation_carries_command() {
        let inv = invocation(serde_json::json!({"command": "rm -rf /"}));
        let confirmation = BashTool.get_confirmation(&inv).unwrap();
        assert_eq!(confirmation.command.as_deref(), Some("rm -rf /"));
    }
}
