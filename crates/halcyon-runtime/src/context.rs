//! [`ContextManager`] — the running conversation, token accounting, and
//! stale tool-output pruning (spec §4.5).
//!
//! Grounded on the shape documented in the teacher's `astrid-runtime`
//! public API (`ContextManager`, `ContextStats`, `SummarizationResult`):
//! a message list plus an immutable system prompt, with pruning and
//! compaction as separate concerns from the LLM request/response cycle
//! itself.

use halcyon_core::types::{Timestamp, TokenUsage};
use halcyon_llm::{LlmProvider, Message, MessageContent, MessageRole, ToolCall, ToolCallResult};

/// Tokens protected from pruning, counted from the end of the
/// conversation backwards (spec §4.5, Open Question resolved in
/// DESIGN.md: kept as a hard-coded constant rather than scaled to
/// `contextWindow`).
pub const PRUNE_PROTECT_TOKENS: usize = 40_000;

/// Minimum total candidate size before a pruning pass actually clears
/// anything (spec §4.5).
pub const PRUNE_MINIMUM_TOKENS: usize = 20_000;

/// Fraction of the context window that triggers compaction (spec §4.5).
pub const COMPACTION_THRESHOLD: f64 = 0.8;

const ACK_STUB: &str = "Understood — I have the full context from that summary.";
const CONTINUE_STUB: &str = "Please continue with the remaining work.";

/// A message plus the accounting metadata the context manager tracks
/// alongside it (spec §3: "Each message carries a token count and an
/// optional pruned-at timestamp").
#[derive(Debug, Clone)]
pub struct StoredMessage {
    /// The wire-form message.
    pub message: Message,
    /// Token count for this message's content.
    pub tokens: usize,
    /// When this message's content was cleared by pruning, if ever.
    pub pruned_at: Option<Timestamp>,
}

/// Stats surfaced by `/stats` and sub-agent bookkeeping.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContextStats {
    /// Number of stored messages (excluding the system prompt).
    pub message_count: usize,
    /// Sum of every stored message's token count.
    pub total_tokens: usize,
    /// Cumulative usage across the whole run.
    pub total_usage: TokenUsage,
}

/// Outcome of a summarisation pass, mirroring the teacher's
/// `SummarizationResult`.
#[derive(Debug, Clone)]
pub struct SummarizationResult {
    /// The summary text the compactor returned.
    pub summary: String,
    /// Usage consumed by the compaction LLM call itself.
    pub usage: TokenUsage,
}

/// Holds the message list and the immutable system prompt (spec §3, §4.5).
#[derive(Debug, Clone)]
pub struct ContextManager {
    system_prompt: String,
    messages: Vec<StoredMessage>,
    latest_usage: TokenUsage,
    total_usage: TokenUsage,
    context_window: usize,
}

impl ContextManager {
    /// Build a context manager with a fixed system prompt (spec §3:
    /// "immutable for the session") and the model's context window.
    #[must_use]
    pub fn new(system_prompt: impl Into<String>, context_window: usize) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            messages: Vec::new(),
            latest_usage: TokenUsage::default(),
            total_usage: TokenUsage::default(),
            context_window,
        }
    }

    /// The immutable system prompt.
    #[must_use]
    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Append a user message, counting tokens via `provider`.
    pub fn add_user_message(&mut self, text: impl Into<String>, provider: &dyn LlmProvider) {
        let text = text.into();
        let tokens = provider.count_tokens(&text);
        self.push(Message::user(text), tokens);
    }

    /// Append an assistant message. `text` is `None` when the turn
    /// produced only tool calls; `tool_calls` is empty for a text-only
    /// turn. Exactly one of the two is non-trivial per spec §4.9, but both
    /// may be recorded on the same turn when a provider interleaves them —
    /// callers are expected to call this once per turn with whichever
    /// content the model actually returned.
    pub fn add_assistant_message(
        &mut self,
        text: Option<String>,
        tool_calls: Vec<ToolCall>,
        provider: &dyn LlmProvider,
    ) {
        if !tool_calls.is_empty() {
            let tokens = tool_calls
                .iter()
                .map(|c| provider.count_tokens(&c.name) + provider.count_tokens(&c.arguments.to_string()))
                .sum();
            self.push(Message::assistant_with_tools(tool_calls), tokens);
        } else {
            let text = text.unwrap_or_default();
            let tokens = provider.count_tokens(&text);
            self.push(Message::assistant(text), tokens);
        }
    }

    /// Append a tool result answering `call_id` (spec §4.5).
    pub fn add_tool_result(
        &mut self,
        call_id: impl Into<String>,
        content: impl Into<String>,
        is_error: bool,
        provider: &dyn LlmProvider,
    ) {
        let content = content.into();
        let tokens = provider.count_tokens(&content);
        let result = if is_error {
            ToolCallResult::error(call_id.into(), content)
        } else {
            ToolCallResult::success(call_id.into(), content)
        };
        self.push(Message::tool_result(result), tokens);
    }

    fn push(&mut self, message: Message, tokens: usize) {
        self.messages.push(StoredMessage { message, tokens, pruned_at: None });
    }

    /// `[system, ...messages]` in provider-neutral wire form (spec §4.5).
    #[must_use]
    pub fn get_messages(&self) -> Vec<Message> {
        let mut out = Vec::with_capacity(self.messages.len() + 1);
        out.push(Message::system(self.system_prompt.clone()));
        out.extend(self.messages.iter().map(|m| m.message.clone()));
        out
    }

    /// Every tool-call record on the assistant message, for bijection
    /// checks against subsequent tool-result messages (testable property
    /// 2).
    #[must_use]
    pub fn last_assistant_tool_call_ids(&self) -> Vec<String> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.message.role == MessageRole::Assistant)
            .and_then(|m| m.message.tool_calls())
            .map(|calls| calls.iter().map(|c| c.id.clone()).collect())
            .unwrap_or_default()
    }

    /// Record the latest single-turn usage.
    pub fn set_latest_usage(&mut self, usage: TokenUsage) {
        self.latest_usage = usage;
    }

    /// The latest single-turn usage.
    #[must_use]
    pub fn latest_usage(&self) -> TokenUsage {
        self.latest_usage
    }

    /// Accumulate `usage` into the run's cumulative total (spec §3:
    /// "additive").
    pub fn add_usage(&mut self, usage: TokenUsage) {
        self.total_usage += usage;
    }

    /// Cumulative usage across the whole run.
    #[must_use]
    pub fn total_usage(&self) -> TokenUsage {
        self.total_usage
    }

    /// Whether the latest usage is within [`COMPACTION_THRESHOLD`] of
    /// `context_window` (spec §4.5).
    #[must_use]
    pub fn needs_compression(&self) -> bool {
        self.context_window > 0
            && (self.latest_usage.total as f64) > COMPACTION_THRESHOLD * self.context_window as f64
    }

    /// Replace the entire message history with a three-message stub
    /// carrying `summary` verbatim (spec §4.5, testable property 7).
    pub fn replace_with_summary(&mut self, summary: &str, provider: &dyn LlmProvider) {
        self.messages.clear();
        let preamble = format!("Here is a summary of the conversation so far:\n\n{summary}");
        self.add_user_message(preamble, provider);
        let ack_tokens = provider.count_tokens(ACK_STUB);
        self.push(Message::assistant(ACK_STUB), ack_tokens);
        self.add_user_message(CONTINUE_STUB, provider);
    }

    /// Iterate tool messages newest-first, protecting the most recent
    /// [`PRUNE_PROTECT_TOKENS`] tokens' worth of tool output, and clear
    /// everything older than that tail — but only if the clearable total
    /// reaches [`PRUNE_MINIMUM_TOKENS`] (spec §4.5, testable property 4).
    ///
    /// Returns the number of messages actually cleared.
    pub fn prune_tool_outputs(&mut self) -> usize {
        let mut running = 0usize;
        let mut candidates = Vec::new();
        let mut candidate_tokens = 0usize;

        for idx in (0..self.messages.len()).rev() {
            if self.messages[idx].message.role != MessageRole::Tool {
                continue;
            }
            if self.messages[idx].pruned_at.is_some() {
                // Already cleared by an earlier pass; everything further
                // back was handled then too.
                break;
            }
            if running >= PRUNE_PROTECT_TOKENS {
                candidate_tokens += self.messages[idx].tokens;
                candidates.push(idx);
            }
            running += self.messages[idx].tokens;
        }

        if candidate_tokens < PRUNE_MINIMUM_TOKENS {
            return 0;
        }

        for idx in &candidates {
            let stored = &mut self.messages[*idx];
            if let MessageContent::ToolResult(result) = &stored.message.content {
                let cleared = ToolCallResult { call_id: result.call_id.clone(), content: "[Old tool result content cleared]".to_owned(), is_error: result.is_error };
                stored.message = Message::tool_result(cleared);
            }
            stored.tokens = "[Old tool result content cleared]".len() / 4;
            stored.pruned_at = Some(Timestamp::now());
        }
        candidates.len()
    }

    /// Drop every stored message, keeping the system prompt.
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Update the context window used to drive the 0.8x compaction
    /// trigger, e.g. after swapping the LLM provider mid-session.
    pub fn set_context_window(&mut self, context_window: usize) {
        self.context_window = context_window;
    }

    /// Snapshot of current size/usage, for `/stats`.
    #[must_use]
    pub fn stats(&self) -> ContextStats {
        ContextStats {
            message_count: self.messages.len(),
            total_tokens: self.messages.iter().map(|m| m.tokens).sum(),
            total_usage: self.total_usage,
        }
    }

    /// Borrow the stored messages, e.g. for the compactor's flattening
    /// pass or for a session snapshot.
    #[must_use]
    pub fn stored_messages(&self) -> &[StoredMessage] {
        &self.messages
    }

    /// Replace the message list wholesale with previously-saved wire-form
    /// messages, recomputing token counts (spec §4.13: session resume).
    pub fn restore_messages(&mut self, messages: Vec<Message>, provider: &dyn LlmProvider) {
        self.messages = messages
            .into_iter()
            .map(|message| {
                let tokens = message.approx_tokens().max(provider.count_tokens(&message_text(&message)));
                StoredMessage { message, tokens, pruned_at: None }
            })
            .collect();
    }
}

fn message_text(message: &Message) -> String {
    match &message.content {
        MessageContent::Text(s) => s.clone(),
        MessageContent::ToolResult(r) => r.content.clone(),
        MessageContent::ToolCalls(calls) => calls.iter().map(|c| format!("{}{}", c.name, c.arguments)).collect(),
        MessageContent::MultiPart(_) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct StubProvider {
        max_context: usize,
        calls: Mutex<Vec<String>>,
    }

    impl StubProvider {
        fn new(max_context: usize) -> Self {
            Self { max_context, calls: Mutex::new(Vec::new()) }
        }
    }

    #[async_trait::async_trait]
    impl LlmProvider for StubProvider {
        fn name(&self) -> &str {
            "stub"
        }

        fn model(&self) -> &str {
            "stub-model"
        }

        async fn stream(
            &self,
            _messages: &[Message],
            _tools: &[halcyon_llm::LlmToolDefinition],
            _system: &str,
        ) -> halcyon_llm::LlmResult<halcyon_llm::StreamBox> {
            unimplemented!("not exercised by context manager tests")
        }

        async fn complete(
            &self,
            _messages: &[Message],
            _tools: &[halcyon_llm::LlmToolDefinition],
            _system: &str,
        ) -> halcyon_llm::LlmResult<halcyon_llm::LlmResponse> {
            unimplemented!("not exercised by context manager tests")
        }

        fn count_tokens(&self, text: &str) -> usize {
            self.calls.lock().unwrap().push(text.to_owned());
            text.len() / 4
        }

        fn max_context_length(&self) -> usize {
            self.max_context
        }
    }

    #[test]
    fn get_messages_prefixes_system_prompt() {
        let provider = StubProvider::new(1000);
        let mut ctx = ContextManager::new("you are helpful", 1000);
        ctx.add_user_message("hi", &provider);
        let messages = ctx.get_messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, MessageRole::System);
        assert_eq!(messages[0].text(), Some("you are helpful"));
    }

    #[test]
    fn needs_compression_at_eighty_percent() {
        let mut ctx = ContextManager::new("sys", 1000);
        ctx.set_latest_usage(TokenUsage::new(750, 100)); // total 850 > 800
        assert!(ctx.needs_compression());
        ctx.set_latest_usage(TokenUsage::new(500, 100)); // total 600 < 800
        assert!(!ctx.needs_compression());
    }

    #[test]
    fn replace_with_summary_yields_three_fixed_stub_messages() {
        let provider = StubProvider::new(1000);
        let mut ctx = ContextManager::new("sys", 1000);
        ctx.add_user_message("turn one", &provider);
        ctx.add_user_message("turn two", &provider);
        ctx.replace_with_summary("the user asked about X and Y", &provider);

        let messages = ctx.get_messages();
        // system + 3 stub messages
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[1].role, MessageRole::User);
        assert!(messages[1].text().unwrap().contains("the user asked about X and Y"));
        assert_eq!(messages[2].role, MessageRole::Assistant);
        assert_eq!(messages[3].role, MessageRole::User);
        assert!(messages[3].text().unwrap().contains("continue"));
    }

    #[test]
    fn pruning_clears_messages_beyond_protected_tail_when_over_minimum() {
        let provider = StubProvider::new(1_000_000);
        let mut ctx = ContextManager::new("sys", 1_000_000);
        // 7 tool messages of 10k tokens each (40k chars => ~10k tokens).
        for i in 0..7 {
            ctx.add_tool_result(format!("call-{i}"), "x".repeat(40_000), false, &provider);
        }
        let cleared = ctx.prune_tool_outputs();
        // running tail protects the 4 most recent (40k tokens); the 3
        // oldest (30k >= 20k minimum) get cleared.
        assert_eq!(cleared, 3);
        let stats = ctx.stats();
        assert!(stats.total_tokens < 7 * 10_000);
    }

    #[test]
    fn pruning_below_minimum_clears_nothing() {
        let provider = StubProvider::new(1_000_000);
        let mut ctx = ContextManager::new("sys", 1_000_000);
        // Only one 10k-token message beyond the protected tail => 10k < 20k minimum.
        for i in 0..5 {
            ctx.add_tool_result(format!("call-{i}"), "x".repeat(40_000), false, &provider);
        }
        let cleared = ctx.prune_tool_outputs();
        assert_eq!(cleared, 0);
    }

    #[test]
    fn usage_accumulates_additively() {
        let mut ctx = ContextManager::new("sys", 1000);
        ctx.add_usage(TokenUsage::new(10, 5));
        ctx.add_usage(TokenUsage::new(3, 2));
        assert_eq!(ctx.total_usage().total, 20);
    }
}
