//! A plain-`println!` [`Frontend`] — deliberately minimal. Rich rendering
//! (spinners, diff coloring, a TUI) is an explicit Non-goal of this crate;
//! the point of shipping one here is that every engine callback has a
//! concrete caller, not that this is the final front-end (spec §6).

use std::io::Write;

use async_trait::async_trait;
use halcyon_core::frontend::{ApprovalChoice, ApprovalPrompt, Frontend};

/// Reads a yes/no answer from stdin for every approval prompt and prints
/// status lines and tool progress to stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleFrontend;

#[async_trait]
impl Frontend for ConsoleFrontend {
    async fn request_approval(&self, prompt: ApprovalPrompt) -> ApprovalChoice {
        println!("\n[approval] {} wants to: {}", prompt.tool_name, prompt.summary);
        if let Some(diff) = &prompt.diff {
            println!("{diff}");
        }
        print!("Allow? [y/N] ");
        let _ = std::io::stdout().flush();

        let mut line = String::new();
        if std::io::stdin().read_line(&mut line).is_err() {
            return ApprovalChoice::Deny;
        }
        match line.trim().to_lowercase().as_str() {
            "y" | "yes" => ApprovalChoice::AllowOnce,
            _ => ApprovalChoice::Deny,
        }
    }

    async fn show_status(&self, message: &str) {
        eprintln!("[status] {message}");
    }

    async fn tool_started(&self, call_id: &str, name: &str) {
        eprintln!("[tool] {name} ({call_id}) started");
    }

    async fn tool_completed(&self, call_id: &str, success: bool) {
        eprintln!("[tool] {call_id} {}", if success { "ok" } else { "failed" });
    }
}
