//! Shared identifier and accounting types.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A session identifier (RFC-4122 v4).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Generate a new random session id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// An identifier for an agent (top-level or sub-agent) instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentId(pub Uuid);

impl AgentId {
    /// Generate a new random agent id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AgentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Wall-clock timestamp, always UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(pub chrono::DateTime<chrono::Utc>);

impl Timestamp {
    /// The current time.
    #[must_use]
    pub fn now() -> Self {
        Self(chrono::Utc::now())
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

/// Token accounting for a single LLM exchange, or accumulated across many.
///
/// Additive: `a + b` sums every field. `cached` counts prompt tokens served
/// from the provider's prompt cache and is informational only — it is not
/// subtracted from `prompt`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Prompt (input) tokens.
    pub prompt: u64,
    /// Completion (output) tokens.
    pub completion: u64,
    /// Total tokens (usually `prompt + completion`, but kept explicit since
    /// some providers report it independently).
    pub total: u64,
    /// Prompt tokens served from cache.
    pub cached: u64,
}

impl TokenUsage {
    /// Construct from prompt/completion counts, deriving `total`.
    #[must_use]
    pub fn new(prompt: u64, completion: u64) -> Self {
        Self {
            prompt,
            completion,
            total: prompt + completion,
            cached: 0,
        }
    }

    /// Add `cached` prompt-token count.
    #[must_use]
    pub fn with_cached(mut self, cached: u64) -> Self {
        self.cached = cached;
        self
    }
}

impl std::ops::Add for TokenUsage {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            prompt: self.prompt + rhs.prompt,
            completion: self.completion + rhs.completion,
            total: self.total + rhs.total,
            cached: self.cached + rhs.cached,
        }
    }
}

impl std::ops::AddAssign for TokenUsage {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

/// Risk level attached to a request for user approval or a workspace escape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskLevel {
    /// Read-only, low blast radius.
    Low,
    /// Could surface sensitive data or touch files outside the obvious scope.
    Medium,
    /// Mutating, could be disruptive if wrong.
    High,
    /// Destructive or irreversible.
    Critical,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_usage_is_additive() {
        let a = TokenUsage::new(100, 50);
        let b = TokenUsage::new(10, 5);
        let sum = a + b;
        assert_eq!(sum.prompt, 110);
        assert_eq!(sum.completion, 55);
        assert_eq!(sum.total, 165);
    }

    #[test]
    fn session_id_round_trips_through_string() {
        let id = SessionId::new();
        let s = id.to_string();
        let parsed: SessionId = s.parse().unwrap();
        assert_eq!(id, parsed);
    }
}
