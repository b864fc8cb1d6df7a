//! LLM provider abstraction for the halcyon agent orchestration engine.
//!
//! Every provider implements [`LlmProvider`], so the turn loop never needs
//! to know whether it's talking to Claude, OpenAI, or a local
//! OpenAI-compatible server.
//!
//! ```rust,no_run
//! use halcyon_llm::prelude::*;
//!
//! # async fn run() -> LlmResult<()> {
//! let provider = ClaudeProvider::new(ProviderConfig::new("sk-ant-...", "claude-sonnet-4-20250514"));
//! let response = provider.complete_simple("Say hello").await?;
//! println!("{response}");
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![warn(unreachable_pub)]

mod claude;
mod error;
mod openai_compat;
mod provider;
mod types;

pub mod prelude;

pub use claude::ClaudeProvider;
pub use error::{LlmError, LlmResult};
pub use openai_compat::OpenAiCompatProvider;
pub use provider::{LlmProvider, ProviderConfig, StreamBox};
pub use types::{
    ContentPart, LlmResponse, LlmToolDefinition, Message, MessageContent, MessageRole, StopReason,
    StreamEvent, ToolCall, ToolCallResult, Usage,
};
