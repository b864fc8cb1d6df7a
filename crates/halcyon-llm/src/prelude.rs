//! Commonly used types re-exported for convenience.

pub use crate::claude::ClaudeProvider;
pub use crate::error::{LlmError, LlmResult};
pub use crate::openai_compat::OpenAiCompatProvider;
pub use crate::provider::{LlmProvider, ProviderConfig, StreamBox};
pub use crate::types::{
    ContentPart, LlmResponse, LlmToolDefinition, Message, MessageContent, MessageRole, StopReason,
    StreamEvent, ToolCall, ToolCallResult, Usage,
};
