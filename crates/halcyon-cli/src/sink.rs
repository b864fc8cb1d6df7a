//! Renders the engine's [`AgentEvent`] stream as plain text on stdout/
//! stderr — the minimal rendering this crate commits to (spec §6).

use std::io::Write;

use async_trait::async_trait;
use halcyon_core::event::AgentEvent;
use halcyon_runtime::session::EventSink;

/// Prints text deltas as they arrive and tool activity to stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleEventSink;

#[async_trait]
impl EventSink for ConsoleEventSink {
    async fn emit(&self, event: AgentEvent) {
        match event {
            AgentEvent::AgentStart { .. } => {},
            AgentEvent::TextDelta { content } => {
                print!("{content}");
                let _ = std::io::stdout().flush();
            },
            AgentEvent::TextComplete { .. } => {
                println!();
            },
            AgentEvent::ToolCallStart { name, call_id, .. } => {
                eprintln!("[tool] {name} ({call_id})");
            },
            AgentEvent::ToolCallComplete { name, success, error, .. } => {
                if success {
                    eprintln!("[tool] {name} done");
                } else {
                    eprintln!("[tool] {name} failed: {}", error.unwrap_or_default());
                }
            },
            AgentEvent::AgentError { error, .. } => {
                eprintln!("[error] {error}");
            },
            AgentEvent::AgentEnd { usage, .. } => {
                tracing::debug!(prompt = usage.prompt, completion = usage.completion, total = usage.total, "turn finished");
            },
        }
    }
}
