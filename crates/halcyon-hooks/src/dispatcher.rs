//! [`HookDispatcher`] — runs all hooks registered for one trigger.

use halcyon_config::types::{HookSection, HookTrigger};

use crate::context::HookContext;
use crate::executor::{HookExecutor, HookOutcome};

/// Holds the configured hook list and runs the ones matching a trigger,
/// in configuration order, each failure logged and swallowed (spec §4.4:
/// "hook failures are logged but never fail the host operation").
#[derive(Debug, Clone)]
pub struct HookDispatcher {
    hooks: Vec<HookSection>,
    enabled: bool,
    executor: HookExecutor,
}

impl HookDispatcher {
    /// Build a dispatcher. `enabled` mirrors the session's `hooksEnabled`
    /// flag — when false, [`HookDispatcher::dispatch`] is a no-op regardless
    /// of what `hooks` contains.
    #[must_use]
    pub fn new(hooks: Vec<HookSection>, enabled: bool) -> Self {
        Self { hooks, enabled, executor: HookExecutor }
    }

    /// Run every enabled hook registered for `trigger`, in order.
    pub async fn dispatch(&self, trigger: HookTrigger, context: &HookContext) -> Vec<HookOutcome> {
        if !self.enabled {
            return Vec::new();
        }

        let mut outcomes = Vec::new();
        for hook in self.hooks.iter().filter(|h| h.trigger == trigger) {
            let outcome = self.executor.execute(hook, context).await;
            if let HookOutcome::Failed { error } = &outcome {
                tracing::warn!(hook = %hook.name, trigger = ?trigger, error, "hook failed, continuing");
            }
            outcomes.push(outcome);
        }
        outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn hook(trigger: HookTrigger, command: &str) -> HookSection {
        HookSection { trigger, command: Some(command.to_owned()), ..HookSection::default() }
    }

    #[tokio::test]
    async fn only_matching_trigger_runs() {
        let hooks = vec![hook(HookTrigger::BeforeTool, "echo before"), hook(HookTrigger::AfterTool, "echo after")];
        let dispatcher = HookDispatcher::new(hooks, true);
        let outcomes = dispatcher.dispatch(HookTrigger::BeforeTool, &HookContext::default()).await;
        assert_eq!(outcomes.len(), 1);
        assert!(outcomes[0].is_success());
    }

    #[tokio::test]
    async fn disabled_dispatcher_runs_nothing() {
        let hooks = vec![hook(HookTrigger::BeforeTool, "echo x")];
        let dispatcher = HookDispatcher::new(hooks, false);
        let outcomes = dispatcher.dispatch(HookTrigger::BeforeTool, &HookContext::default()).await;
        assert!(outcomes.is_empty());
    }

    #[tokio::test]
    async fn a_failing_hook_does_not_stop_later_ones() {
        let hooks = vec![hook(HookTrigger::BeforeTool, "exit 1"), hook(HookTrigger::BeforeTool, "echo still ran")];
        let dispatcher = HookDispatcher::new(hooks, true);
        let outcomes = dispatcher.dispatch(HookTrigger::BeforeTool, &HookContext::for_tool(PathBuf::from(std::env::temp_dir()), "bash", &serde_json::json!({}), None)).await;
        assert_eq!(outcomes.len(), 2);
        assert!(!outcomes[0].is_success());
        assert!(outcomes[1].is_success());
    }
}
