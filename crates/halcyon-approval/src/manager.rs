//! [`ApprovalManager`] — wraps the stateless classifier with the
//! front-end resolution step for `NeedsConfirmation` (spec §4.2 step 5).
//!
//! Grounded on the teacher's `ApprovalManager` (`astrid-approval::manager`)
//! for the shape of "classify, then ask the front-end if undecided" — the
//! teacher's allowance store and deferred-resolution queue are deliberately
//! not carried over; the spec's model has no per-session memory of past
//! decisions (see DESIGN.md).

use std::path::PathBuf;
use std::sync::Arc;

use halcyon_config::types::ApprovalPolicy;
use halcyon_core::frontend::{ApprovalChoice, ApprovalPrompt, Frontend};
use halcyon_core::types::RiskLevel;
use halcyon_tools::ToolConfirmation;

use crate::action::ApprovalContext;
use crate::policy::{check_approval, Decision};

/// Final, resolved outcome of an approval check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalOutcome {
    /// Proceed with the invocation.
    Allowed,
    /// Refuse the invocation.
    Denied,
}

impl ApprovalOutcome {
    /// Whether this outcome permits the invocation to proceed.
    #[must_use]
    pub fn is_allowed(self) -> bool {
        matches!(self, ApprovalOutcome::Allowed)
    }
}

/// Risk level used when prompting the front-end for a `NeedsConfirmation`
/// decision. Mirrors the confirmation's `dangerous` flag and whether a path
/// escape was involved.
fn risk_for(ctx: &ApprovalContext) -> RiskLevel {
    if ctx.is_dangerous {
        RiskLevel::Critical
    } else if ctx.has_path_escape() {
        RiskLevel::High
    } else {
        RiskLevel::Medium
    }
}

/// Runs the classifier and, when it returns `NeedsConfirmation`, asks a
/// [`Frontend`] to resolve it.
pub struct ApprovalManager {
    policy: ApprovalPolicy,
    frontend: Option<Arc<dyn Frontend>>,
}

impl ApprovalManager {
    /// Build a manager with no front-end registered. Any `NeedsConfirmation`
    /// decision is approved by default (spec §4.2 step 5: "If there is no
    /// front-end... default to approve").
    #[must_use]
    pub fn new(policy: ApprovalPolicy) -> Self {
        Self { policy, frontend: None }
    }

    /// Build a manager that resolves `NeedsConfirmation` by asking `frontend`.
    #[must_use]
    pub fn with_frontend(policy: ApprovalPolicy, frontend: Arc<dyn Frontend>) -> Self {
        Self { policy, frontend: Some(frontend) }
    }

    /// Current policy.
    #[must_use]
    pub fn policy(&self) -> ApprovalPolicy {
        self.policy
    }

    /// Replace the policy (e.g. the `/approval` slash command).
    pub fn set_policy(&mut self, policy: ApprovalPolicy) {
        self.policy = policy;
    }

    /// Decide whether a tool invocation may proceed.
    pub async fn check(&self, tool_name: &str, confirmation: &ToolConfirmation, is_mutating: bool, cwd: PathBuf) -> ApprovalOutcome {
        let ctx = ApprovalContext::from_confirmation(tool_name, confirmation, is_mutating, cwd);
        self.check_context(&ctx, &confirmation.description).await
    }

    /// Decide on an already-built [`ApprovalContext`].
    pub async fn check_context(&self, ctx: &ApprovalContext, summary: &str) -> ApprovalOutcome {
        match check_approval(ctx, self.policy) {
            Decision::Approved => ApprovalOutcome::Allowed,
            Decision::Rejected => ApprovalOutcome::Denied,
            Decision::NeedsConfirmation => self.resolve_confirmation(ctx, summary).await,
        }
    }

    async fn resolve_confirmation(&self, ctx: &ApprovalContext, summary: &str) -> ApprovalOutcome {
        let Some(frontend) = &self.frontend else {
            tracing::debug!(tool = %ctx.tool_name, "no frontend registered, defaulting to approve");
            return ApprovalOutcome::Allowed;
        };

        let prompt = ApprovalPrompt {
            tool_name: ctx.tool_name.clone(),
            summary: summary.to_owned(),
            risk: risk_for(ctx),
            diff: None,
        };

        let choice = frontend.request_approval(prompt).await;
        if choice.allows() {
            ApprovalOutcome::Allowed
        } else {
            ApprovalOutcome::Denied
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct FixedFrontend {
        choice: ApprovalChoice,
        called: AtomicBool,
    }

    #[async_trait]
    impl Frontend for FixedFrontend {
        async fn request_approval(&self, _prompt: ApprovalPrompt) -> ApprovalChoice {
            self.called.store(true, Ordering::SeqCst);
            self.choice
        }
    }

    #[tokio::test]
    async fn no_frontend_defaults_to_allow_on_needs_confirmation() {
        let manager = ApprovalManager::new(ApprovalPolicy::OnRequest);
        let confirmation = ToolConfirmation::default_for("make", serde_json::json!({})).with_command("make build");
        let outcome = manager.check("bash", &confirmation, true, PathBuf::from("/home/u")).await;
        assert_eq!(outcome, ApprovalOutcome::Allowed);
    }

    #[tokio::test]
    async fn frontend_deny_rejects_needs_confirmation() {
        let frontend = Arc::new(FixedFrontend { choice: ApprovalChoice::Deny, called: AtomicBool::new(false) });
        let manager = ApprovalManager::with_frontend(ApprovalPolicy::OnRequest, frontend.clone());
        let confirmation = ToolConfirmation::default_for("make", serde_json::json!({})).with_command("make build");
        let outcome = manager.check("bash", &confirmation, true, PathBuf::from("/home/u")).await;
        assert_eq!(outcome, ApprovalOutcome::Denied);
        assert!(frontend.called.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn frontend_not_consulted_when_classifier_decides_outright() {
        let frontend = Arc::new(FixedFrontend { choice: ApprovalChoice::Deny, called: AtomicBool::new(false) });
        let manager = ApprovalManager::with_frontend(ApprovalPolicy::OnRequest, frontend.clone());
        let confirmation = ToolConfirmation::default_for("ls", serde_json::json!({})).with_command("ls -la");
        let outcome = manager.check("bash", &confirmation, true, PathBuf::from("/home/u")).await;
        assert_eq!(outcome, ApprovalOutcome::Allowed);
        assert!(!frontend.called.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn rejected_never_reaches_frontend() {
        let frontend = Arc::new(FixedFrontend { choice: ApprovalChoice::AllowOnce, called: AtomicBool::new(false) });
        let manager = ApprovalManager::with_frontend(ApprovalPolicy::OnRequest, frontend.clone());
        let confirmation = ToolConfirmation::default_for("rm", serde_json::json!({})).with_command("rm -rf /");
        let outcome = manager.check("bash", &confirmation, true, PathBuf::from("/home/u")).await;
        assert_eq!(outcome, ApprovalOutcome::Denied);
        assert!(!frontend.called.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn set_policy_changes_subsequent_decisions() {
        let mut manager = ApprovalManager::new(ApprovalPolicy::Never);
        let confirmation = ToolConfirmation::default_for("make", serde_json::json!({})).with_command("make build");
        assert_eq!(manager.check("bash", &confirmation, true, PathBuf::from("/h")).await, ApprovalOutcome::Denied);
        manager.set_policy(ApprovalPolicy::Yolo);
        assert_eq!(manager.check("bash", &confirmation, true, PathBuf::from("/h")).await, ApprovalOutcome::Allowed);
    }
}
