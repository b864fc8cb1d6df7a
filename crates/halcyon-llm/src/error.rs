//! LLM-related error types.

use thiserror::Error;

/// Errors that can occur during an LLM provider call.
#[derive(Debug, Error)]
pub enum LlmError {
    /// No API key was configured for this provider.
    #[error("API key not configured for {provider}")]
    ApiKeyNotConfigured {
        /// Provider name.
        provider: String,
    },

    /// The HTTP request itself failed (before any response status check).
    #[error("API request failed: {0}")]
    ApiRequestFailed(String),

    /// The provider returned HTTP 429.
    #[error("rate limit exceeded, retry after {retry_after_secs} seconds")]
    RateLimitExceeded {
        /// Seconds the provider asked us to wait before retrying.
        retry_after_secs: u64,
    },

    /// The provider's response body didn't match the expected shape.
    #[error("invalid API response: {0}")]
    InvalidResponse(String),

    /// Error while reading a streamed response body.
    #[error("streaming error: {0}")]
    StreamingError(String),

    /// The request or response body could not be serialized/deserialized.
    #[error("serialization error: {0}")]
    SerializationError(String),

    /// Transport-level HTTP error.
    #[error("http error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// A provider-specific configuration value was invalid.
    #[error("configuration error: {0}")]
    ConfigError(String),
}

impl LlmError {
    /// Whether this error is transient and worth retrying (network hiccups,
    /// 5xx responses, rate limits). Auth/config errors are not.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LlmError::ApiRequestFailed(_)
                | LlmError::RateLimitExceeded { .. }
                | LlmError::StreamingError(_)
                | LlmError::HttpError(_)
        )
    }
}

/// Result type for LLM operations.
pub type LlmResult<T> = Result<T, LlmError>;
