//! LLM provider trait.
//!
//! Defines the interface every LLM provider implements, regardless of
//! transport. The turn loop programs against this trait, never against a
//! concrete provider.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use crate::error::LlmResult;
use crate::types::{LlmResponse, LlmToolDefinition, Message, StreamEvent};

/// Boxed stream of [`StreamEvent`]s.
pub type StreamBox = Pin<Box<dyn Stream<Item = LlmResult<StreamEvent>> + Send>>;

/// LLM provider trait. Implementors provide access to a language model
/// with both streaming and non-streaming completion.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name, for logging.
    fn name(&self) -> &str;

    /// The model identifier in use.
    fn model(&self) -> &str;

    /// Stream a completion. Returns a stream of events as the model
    /// generates output.
    async fn stream(
        &self,
        messages: &[Message],
        tools: &[LlmToolDefinition],
        system: &str,
    ) -> LlmResult<StreamBox>;

    /// Complete without streaming. Returns the full response once
    /// generation finishes. Used by the compactor's summarisation call,
    /// which doesn't need incremental output.
    async fn complete(
        &self,
        messages: &[Message],
        tools: &[LlmToolDefinition],
        system: &str,
    ) -> LlmResult<LlmResponse>;

    /// Simple text completion with no tools and no system prompt.
    async fn complete_simple(&self, prompt: &str) -> LlmResult<String> {
        let messages = vec![Message::user(prompt)];
        let response = self.complete(&messages, &[], "").await?;
        Ok(response.message.text().unwrap_or("").to_owned())
    }

    /// Approximate token count for `text`. The default is the ≈4-chars-
    /// per-token estimator; providers with a real tokenizer should
    /// override this.
    fn count_tokens(&self, text: &str) -> usize {
        text.len() / 4
    }

    /// The model's context window in tokens, used to drive the 0.8x
    /// compaction trigger.
    fn max_context_length(&self) -> usize;
}

#[async_trait]
impl LlmProvider for Box<dyn LlmProvider> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn model(&self) -> &str {
        (**self).model()
    }

    async fn stream(
        &self,
        messages: &[Message],
        tools: &[LlmToolDefinition],
        system: &str,
    ) -> LlmResult<StreamBox> {
        (**self).stream(messages, tools, system).await
    }

    async fn complete(
        &self,
        messages: &[Message],
        tools: &[LlmToolDefinition],
        system: &str,
    ) -> LlmResult<LlmResponse> {
        (**self).complete(messages, tools, system).await
    }

    fn count_tokens(&self, text: &str) -> usize {
        (**self).count_tokens(text)
    }

    fn max_context_length(&self) -> usize {
        (**self).max_context_length()
    }
}

/// Configuration shared by every provider implementation.
#[derive(Clone)]
pub struct ProviderConfig {
    /// API key.
    pub api_key: String,
    /// Model name sent to the provider.
    pub model: String,
    /// Maximum tokens to generate per response.
    pub max_tokens: usize,
    /// Sampling temperature.
    pub temperature: f64,
    /// API base URL, overriding the provider's default endpoint.
    pub base_url: Option<String>,
    /// Context window override. When set, used instead of the provider's
    /// built-in default for the model.
    pub context_window: Option<usize>,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("has_api_key", &!self.api_key.is_empty())
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("has_base_url", &self.base_url.is_some())
            .field("context_window", &self.context_window)
            .finish()
    }
}

impl ProviderConfig {
    /// Create a new config with an API key and model name.
    #[must_use]
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            max_tokens: 4096,
            temperature: 0.7,
            base_url: None,
            context_window: None,
        }
    }

    /// Set max tokens.
    #[must_use]
    pub fn max_tokens(mut self, max: usize) -> Self {
        self.max_tokens = max;
        self
    }

    /// Set temperature, clamped to `[0.0, 1.0]`.
    #[must_use]
    pub fn temperature(mut self, temp: f64) -> Self {
        self.temperature = temp.clamp(0.0, 1.0);
        self
    }

    /// Set a custom base URL.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Override the context window size.
    #[must_use]
    pub fn context_window(mut self, size: usize) -> Self {
        self.context_window = Some(size);
        self
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "claude-sonnet-4-20250514".to_owned(),
            max_tokens: 4096,
            temperature: 0.7,
            base_url: None,
            context_window: None,
        }
    }
}
