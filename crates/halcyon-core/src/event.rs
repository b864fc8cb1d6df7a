//! The engine→front-end event stream.
//!
//! A front-end (console, TUI, automation harness) consumes a stream of
//! [`AgentEvent`] values emitted by the turn loop. The set and shape of
//! variants here is the wire contract described in the spec's "External
//! Interfaces" section — front-ends render these however they like.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::TokenUsage;

/// One event emitted by the turn loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    /// A new turn started for this user message.
    AgentStart {
        /// The user's input for this turn.
        message: String,
    },

    /// An incremental slice of assistant text.
    TextDelta {
        /// The text fragment.
        content: String,
    },

    /// The assistant finished a contiguous block of text (no tool calls
    /// followed in this LLM response).
    TextComplete {
        /// The complete text block.
        content: String,
    },

    /// A tool call was received from the model and is about to be
    /// dispatched through the registry.
    ToolCallStart {
        /// The tool-call id the assistant message recorded.
        call_id: String,
        /// Tool name.
        name: String,
        /// Parsed arguments.
        args: Value,
    },

    /// A tool call finished executing.
    ToolCallComplete {
        /// The tool-call id this result answers.
        call_id: String,
        /// Tool name.
        name: String,
        /// Whether the tool reported success.
        success: bool,
        /// Output text (may be empty on failure).
        output: String,
        /// Error text, set only on failure.
        error: Option<String>,
        /// Free-form metadata the tool attached.
        metadata: serde_json::Map<String, Value>,
        /// Whether output was truncated before being shown here.
        truncated: bool,
        /// Exit code, for shell-like tools.
        exit_code: Option<i32>,
    },

    /// A recoverable or terminal error occurred mid-turn.
    AgentError {
        /// Human-readable error summary.
        error: String,
        /// Optional structured detail.
        details: Option<String>,
    },

    /// The turn ended (either text-only response, or turn-limit exhaustion).
    AgentEnd {
        /// The final assistant text, if any.
        response: Option<String>,
        /// Cumulative usage for the whole run so far.
        usage: TokenUsage,
    },
}
