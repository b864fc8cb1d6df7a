//! [`Compactor`] — summarises the running conversation via a non-streaming
//! LLM call when the context is near full (spec §4.6).

use halcyon_core::types::TokenUsage;
use halcyon_llm::{LlmProvider, Message, MessageContent, MessageRole};

use crate::context::{ContextManager, StoredMessage};

const COMPRESSION_SYSTEM_PROMPT: &str = "You are a conversation summarization assistant. Summarize the \
    conversation history below concisely, preserving the user's goals, any decisions made, and the \
    current state of in-progress work, so the assistant can resume seamlessly.";

const TOOL_OUTPUT_LIMIT: usize = 2_000;
const ASSISTANT_TEXT_LIMIT: usize = 3_000;
const USER_TEXT_LIMIT: usize = 1_500;

/// Builds a flattened-history summarisation prompt and invokes the LLM
/// non-streaming to produce a replacement summary.
#[derive(Debug, Default, Clone, Copy)]
pub struct Compactor;

impl Compactor {
    /// Attempt to summarise `context`'s history via `provider`.
    ///
    /// Returns `(None, None)` on any failure or empty completion (spec
    /// §4.6: "the agent continues without compacting").
    pub async fn compress(&self, context: &ContextManager, provider: &dyn LlmProvider) -> (Option<String>, Option<TokenUsage>) {
        let flattened = flatten_history(context.stored_messages());
        let prompt = Message::user(flattened);

        // Spec §4.7/§7: the same retry contract as the streaming turn loop
        // applies to the compactor's non-streaming completion call.
        let messages = [prompt];
        let outcome = halcyon_core::retry::retry(halcyon_core::retry::RetryConfig::standard(), halcyon_llm::LlmError::is_retryable, || {
            provider.complete(&messages, &[], COMPRESSION_SYSTEM_PROMPT)
        })
        .await;

        match outcome {
            Ok(response) => {
                let text = response.message.text().unwrap_or("").trim().to_owned();
                if text.is_empty() {
                    (None, None)
                } else {
                    let usage = TokenUsage::new(response.usage.input_tokens as u64, response.usage.output_tokens as u64);
                    (Some(text), Some(usage))
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, "compaction call failed, continuing without compacting");
                (None, None)
            },
        }
    }
}

/// Flatten stored messages into a single text block, each entry truncated
/// per its role and joined by `"\n\n---\n\n"` (spec §4.6).
fn flatten_history(messages: &[StoredMessage]) -> String {
    messages
        .iter()
        .map(|stored| render_entry(&stored.message))
        .collect::<Vec<_>>()
        .join("\n\n---\n\n")
}

fn render_entry(message: &Message) -> String {
    match message.role {
        MessageRole::User => format!("User: {}", truncate(message_text(message), USER_TEXT_LIMIT)),
        MessageRole::Assistant => format!("Assistant: {}", truncate(message_text(message), ASSISTANT_TEXT_LIMIT)),
        MessageRole::Tool => format!("Tool output: {}", truncate(message_text(message), TOOL_OUTPUT_LIMIT)),
        MessageRole::System => format!("System: {}", truncate(message_text(message), USER_TEXT_LIMIT)),
    }
}

fn message_text(message: &Message) -> String {
    match &message.content {
        MessageContent::Text(s) => s.clone(),
        MessageContent::ToolResult(r) => r.content.clone(),
        MessageContent::ToolCalls(calls) => calls
            .iter()
            .map(|c| format!("called {}({})", c.name, c.arguments))
            .collect::<Vec<_>>()
            .join(", "),
        MessageContent::MultiPart(_) => String::new(),
    }
}

fn truncate(text: String, limit: usize) -> String {
    if text.len() <= limit {
        text
    } else {
        let mut truncated: String = text.chars().take(limit).collect();
        truncated.push_str("...");
        truncated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use halcyon_llm::{LlmResponse, LlmResult, LlmToolDefinition, StopReason, StreamBox, Usage};

    struct StubProvider {
        response_text: String,
    }

    #[async_trait::async_trait]
    impl LlmProvider for StubProvider {
        fn name(&self) -> &str {
            "stub"
        }

        fn model(&self) -> &str {
            "stub-model"
        }

        async fn stream(&self, _messages: &[Message], _tools: &[LlmToolDefinition], _system: &str) -> LlmResult<StreamBox> {
            unimplemented!("compactor never streams")
        }

        async fn complete(&self, _messages: &[Message], _tools: &[LlmToolDefinition], system: &str) -> LlmResult<LlmResponse> {
            assert_eq!(system, COMPRESSION_SYSTEM_PROMPT);
            Ok(LlmResponse {
                message: Message::assistant(self.response_text.clone()),
                has_tool_calls: false,
                stop_reason: StopReason::EndTurn,
                usage: Usage { input_tokens: 500, output_tokens: 50 },
            })
        }

        fn max_context_length(&self) -> usize {
            200_000
        }
    }

    #[tokio::test]
    async fn compress_returns_summary_and_usage_on_success() {
        let provider = StubProvider { response_text: "the user asked about X".to_owned() };
        let mut ctx = ContextManager::new("sys", 1000);
        ctx.add_user_message("hello there", &provider);
        let compactor = Compactor;
        let (summary, usage) = compactor.compress(&ctx, &provider).await;
        assert_eq!(summary.as_deref(), Some("the user asked about X"));
        assert_eq!(usage.unwrap().total, 550);
    }

    #[tokio::test]
    async fn compress_returns_none_on_empty_completion() {
        let provider = StubProvider { response_text: String::new() };
        let ctx = ContextManager::new("sys", 1000);
        let compactor = Compactor;
        let (summary, usage) = compactor.compress(&ctx, &provider).await;
        assert!(summary.is_none());
        assert!(usage.is_none());
    }

    #[test]
    fn flatten_truncates_tool_output_to_two_thousand_chars() {
        let long = "x".repeat(5_000);
        let text = truncate(long, TOOL_OUTPUT_LIMIT);
        assert!(text.len() <= TOOL_OUTPUT_LIMIT + 3);
        assert!(text.ends_with("..."));
    }
}
