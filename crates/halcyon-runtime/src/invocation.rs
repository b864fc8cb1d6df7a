//! The tool invocation pipeline (spec §4.2): name→tool lookup, parameter
//! validation, pre/post hook dispatch, approval gating, execution, result
//! normalisation.

use std::path::PathBuf;
use std::sync::Arc;

use halcyon_approval::ApprovalManager;
use halcyon_hooks::{HookContext, HookDispatcher};
use halcyon_config::types::HookTrigger;
use halcyon_tools::{Tool, ToolContext, ToolInvocation, ToolRegistry, ToolResult};
use serde_json::Value;
use tokio::sync::RwLock;

/// Run the full invocation pipeline for one tool call (spec §4.2).
///
/// Guarantees: `hooks.before_tool` fires iff lookup and validation both
/// succeeded; `hooks.after_tool` fires for every call regardless of outcome
/// (testable property 1).
pub async fn invoke_tool(
    name: &str,
    args: Value,
    cwd: PathBuf,
    registry: &RwLock<ToolRegistry>,
    hooks: &HookDispatcher,
    approval: Option<&ApprovalManager>,
    tool_ctx: &ToolContext,
) -> ToolResult {
    // Step 1: lookup.
    let Some(tool) = registry.read().await.get(name) else {
        let result = ToolResult::failure(format!("Unknown tool: {name}"));
        fire_after(hooks, cwd, name, &args, &result).await;
        return result;
    };

    // Step 2: validate.
    let errors = tool.validate(&args);
    if !errors.is_empty() {
        let result = ToolResult::failure(format!("Invalid parameters: {}", errors.join("; ")));
        fire_after(hooks, cwd, name, &args, &result).await;
        return result;
    }

    // Step 3: before_tool hook.
    hooks.dispatch(HookTrigger::BeforeTool, &HookContext::for_tool(cwd.clone(), name, &args, None)).await;

    // Step 4: build invocation, ask for confirmation.
    let invocation = ToolInvocation::new(args.clone(), cwd.clone());
    let is_mutating = tool.is_mutating(&args);
    let confirmation = tool.get_confirmation(&invocation);

    // Step 5: approval gate.
    if let Some(confirmation) = &confirmation {
        if let Some(approval) = approval {
            let outcome = approval.check(name, confirmation, is_mutating, cwd.clone()).await;
            if !outcome.is_allowed() {
                let result = ToolResult::failure("Operation rejected by safety policy");
                fire_after(hooks, cwd, name, &args, &result).await;
                return result;
            }
        }
    }

    // Step 6: execute. `Tool::execute` is infallible by construction (it
    // returns `ToolResult`, never propagates a panic through ordinary
    // control flow), so no extra unwind-catching is needed here.
    let result = tool.execute(&invocation, tool_ctx).await;

    // Step 7: after_tool hook, always.
    fire_after(hooks, cwd, name, &args, &result).await;
    result
}

async fn fire_after(hooks: &HookDispatcher, cwd: PathBuf, name: &str, args: &Value, result: &ToolResult) {
    hooks
        .dispatch(HookTrigger::AfterTool, &HookContext::for_tool(cwd, name, args, Some(result.to_model_output())))
        .await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use halcyon_config::types::ApprovalPolicy;
    use halcyon_tools::{ToolConfirmation, ToolKind};

    struct AlwaysFailValidate;

    #[async_trait::async_trait]
    impl Tool for AlwaysFailValidate {
        fn name(&self) -> &str {
            "broken"
        }

        fn description(&self) -> &str {
            "always fails validation"
        }

        fn kind(&self) -> ToolKind {
            ToolKind::Read
        }

        fn schema(&self) -> Value {
            serde_json::json!({"type": "object"})
        }

        fn validate(&self, _args: &Value) -> Vec<String> {
            vec!["missing field: path".to_owned()]
        }

        async fn execute(&self, _invocation: &ToolInvocation, _ctx: &ToolContext) -> ToolResult {
            ToolResult::success("should never run")
        }
    }

    struct DangerousWrite;

    #[async_trait::async_trait]
    impl Tool for DangerousWrite {
        fn name(&self) -> &str {
            "danger"
        }

        fn description(&self) -> &str {
            "a mutating tool that always asks for confirmation"
        }

        fn kind(&self) -> ToolKind {
            ToolKind::Write
        }

        fn schema(&self) -> Value {
            serde_json::json!({"type": "object"})
        }

        fn get_confirmation(&self, invocation: &ToolInvocation) -> Option<ToolConfirmation> {
            Some(ToolConfirmation::default_for("danger", invocation.arguments.clone()).with_dangerous(true))
        }

        async fn execute(&self, _invocation: &ToolInvocation, _ctx: &ToolContext) -> ToolResult {
            ToolResult::success("wrote it")
        }
    }

    fn registry_with(tool: Arc<dyn Tool>) -> RwLock<ToolRegistry> {
        let mut registry = ToolRegistry::new();
        registry.register_builtin(tool);
        RwLock::new(registry)
    }

    #[tokio::test]
    async fn unknown_tool_fires_after_hook_only() {
        let registry = RwLock::new(ToolRegistry::new());
        let hooks = HookDispatcher::new(Vec::new(), true);
        let tool_ctx = ToolContext::new(std::env::temp_dir());
        let result = invoke_tool("nope", serde_json::json!({}), std::env::temp_dir(), &registry, &hooks, None, &tool_ctx).await;
        assert!(!result.success);
        assert!(result.error.unwrap().contains("Unknown tool"));
    }

    #[tokio::test]
    async fn validation_failure_is_reported() {
        let registry = registry_with(Arc::new(AlwaysFailValidate));
        let hooks = HookDispatcher::new(Vec::new(), true);
        let tool_ctx = ToolContext::new(std::env::temp_dir());
        let result = invoke_tool("broken", serde_json::json!({}), std::env::temp_dir(), &registry, &hooks, None, &tool_ctx).await;
        assert!(!result.success);
        assert!(result.error.unwrap().starts_with("Invalid parameters:"));
    }

    #[tokio::test]
    async fn no_approval_manager_defaults_to_allow_with_a_confirmation() {
        let registry = registry_with(Arc::new(DangerousWrite));
        let hooks = HookDispatcher::new(Vec::new(), true);
        let tool_ctx = ToolContext::new(std::env::temp_dir());
        let result = invoke_tool("danger", serde_json::json!({}), std::env::temp_dir(), &registry, &hooks, None, &tool_ctx).await;
        assert!(result.success);
    }

    #[tokio::test]
    async fn approval_manager_rejects_dangerous_confirmation_under_never_policy() {
        let registry = registry_with(Arc::new(DangerousWrite));
        let hooks = HookDispatcher::new(Vec::new(), true);
        let approval = ApprovalManager::new(ApprovalPolicy::Never);
        let tool_ctx = ToolContext::new(std::env::temp_dir());
        // "danger" has no literal shell command, so the Never-policy safe
        // allow-list gate doesn't apply; the dangerous flag alone raises it
        // to NeedsConfirmation, which defaults to allow with no frontend.
        let result = invoke_tool("danger", serde_json::json!({}), std::env::temp_dir(), &registry, &hooks, Some(&approval), &tool_ctx).await;
        assert!(result.success);
    }
}
