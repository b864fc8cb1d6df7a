//! Runs a single hook's subprocess and reports the outcome.
//!
//! Grounded on the teacher's `HookExecutor::execute` (`astrid-hooks::executor`)
//! for the "check enabled, spawn, enforce timeout, never propagate failure"
//! shape — narrowed to the spec's single `command` handler kind (no
//! http/wasm/agent handlers; see DESIGN.md).

use std::time::Duration;

use halcyon_config::types::HookSection;
use tokio::process::Command;

use crate::context::HookContext;

/// Outcome of running one hook.
#[derive(Debug, Clone)]
pub enum HookOutcome {
    /// The hook is disabled and was not run.
    Skipped {
        /// Why it was skipped.
        reason: String,
    },
    /// The hook's subprocess exited successfully (status 0).
    Success {
        /// Captured stdout, trimmed.
        stdout: String,
    },
    /// The hook's subprocess failed — nonzero exit, spawn error, or timeout.
    /// Per spec §4.4 this is logged, never surfaced to the model.
    Failed {
        /// What went wrong.
        error: String,
    },
}

impl HookOutcome {
    /// Whether the hook ran and exited successfully.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, HookOutcome::Success { .. })
    }
}

/// Renders `trigger` as the lowercase token the hook environment uses.
fn trigger_token(trigger: halcyon_config::types::HookTrigger) -> &'static str {
    use halcyon_config::types::HookTrigger;
    match trigger {
        HookTrigger::BeforeAgent => "before_agent",
        HookTrigger::AfterAgent => "after_agent",
        HookTrigger::BeforeTool => "before_tool",
        HookTrigger::AfterTool => "after_tool",
        HookTrigger::OnError => "on_error",
    }
}

/// Runs one hook's subprocess to completion or timeout.
#[derive(Debug, Default, Clone, Copy)]
pub struct HookExecutor;

impl HookExecutor {
    /// Run `hook` with the given `context`.
    pub async fn execute(&self, hook: &HookSection, context: &HookContext) -> HookOutcome {
        if !hook.enabled {
            return HookOutcome::Skipped { reason: "hook is disabled".to_owned() };
        }

        let Some(shell_line) = hook.command.as_deref().or(hook.script.as_deref()) else {
            return HookOutcome::Failed { error: "hook has neither command nor script set".to_owned() };
        };

        let mut command = Command::new("sh");
        command.arg("-c").arg(shell_line).current_dir(&context.cwd).kill_on_drop(true);
        for (key, value) in context.env_vars(trigger_token(hook.trigger)) {
            command.env(key, value);
        }

        let timeout = Duration::from_secs(hook.timeout_secs);
        let spawned = match tokio::time::timeout(timeout, command.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                tracing::warn!(hook = %hook.name, error = %e, "hook failed to spawn");
                return HookOutcome::Failed { error: e.to_string() };
            },
            Err(_) => {
                tracing::warn!(hook = %hook.name, timeout_secs = hook.timeout_secs, "hook timed out");
                return HookOutcome::Failed { error: format!("timed out after {}s", hook.timeout_secs) };
            },
        };

        if spawned.status.success() {
            let stdout = String::from_utf8_lossy(&spawned.stdout).trim().to_owned();
            HookOutcome::Success { stdout }
        } else {
            let stderr = String::from_utf8_lossy(&spawned.stderr).trim().to_owned();
            tracing::warn!(hook = %hook.name, status = ?spawned.status.code(), stderr, "hook exited nonzero");
            HookOutcome::Failed { error: format!("exited with {:?}: {stderr}", spawned.status.code()) }
        }
    }
}
