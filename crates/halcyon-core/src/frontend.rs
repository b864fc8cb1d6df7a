//! Decouples the turn loop from any particular UI.
//!
//! The runtime drives a `Frontend` to surface approval prompts and
//! progress notices. A headless caller (tests, batch automation) can
//! supply a `Frontend` that auto-approves everything, or omit one
//! entirely — the engine treats a missing frontend as "approve
//! anything a policy didn't already deny".

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::RiskLevel;

/// A request for a human decision on a sensitive action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalPrompt {
    /// Tool name the request concerns.
    pub tool_name: String,
    /// One-line description of what would happen.
    pub summary: String,
    /// Risk classification driving which options are offered.
    pub risk: RiskLevel,
    /// Optional unified diff, for edit-like actions.
    pub diff: Option<String>,
}

/// The user's answer to an [`ApprovalPrompt`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApprovalChoice {
    /// Allow this one invocation.
    AllowOnce,
    /// Allow this tool for the rest of the session.
    AllowSession,
    /// Allow this tool for every session rooted at this workspace.
    AllowWorkspace,
    /// Allow this tool everywhere, permanently.
    AllowAlways,
    /// Deny this invocation.
    Deny,
}

impl ApprovalChoice {
    /// Whether this choice permits the action to proceed.
    #[must_use]
    pub fn allows(self) -> bool {
        !matches!(self, ApprovalChoice::Deny)
    }
}

/// Everything the turn loop needs from a front-end.
///
/// Implementations are expected to be cheap to clone (wrap an `Arc` around
/// shared state) since the runtime hands a reference down through nested
/// sub-agent runs.
#[async_trait]
pub trait Frontend: Send + Sync {
    /// Ask the user to approve a sensitive action. Returns the choice.
    async fn request_approval(&self, prompt: ApprovalPrompt) -> ApprovalChoice;

    /// Notify the front-end of a free-form status line (e.g. "compacting
    /// context", "reconnecting to mcp server 'github'").
    async fn show_status(&self, message: &str) {
        let _ = message;
    }

    /// Notify the front-end that a tool call started.
    async fn tool_started(&self, call_id: &str, name: &str) {
        let _ = (call_id, name);
    }

    /// Notify the front-end that a tool call finished.
    async fn tool_completed(&self, call_id: &str, success: bool) {
        let _ = (call_id, success);
    }
}

/// A frontend that approves everything without prompting. Used in headless
/// contexts (`yolo` approval policy, tests, CI automation).
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoApproveFrontend;

#[async_trait]
impl Frontend for AutoApproveFrontend {
    async fn request_approval(&self, _prompt: ApprovalPrompt) -> ApprovalChoice {
        ApprovalChoice::AllowOnce
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn auto_approve_always_allows() {
        let fe = AutoApproveFrontend;
        let choice = fe
            .request_approval(ApprovalPrompt {
                tool_name: "bash".into(),
                summary: "run `ls`".into(),
                risk: RiskLevel::Low,
                diff: None,
            })
            .await;
        assert!(choice.allows());
    }

    #[test]
    fn deny_does_not_allow() {
        assert!(!ApprovalChoice::Deny.allows());
    }
}
