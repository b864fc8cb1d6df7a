//! halcyon-core — foundation types and traits for the halcyon agent
//! orchestration engine.
//!
//! This crate provides the types every other halcyon crate depends on:
//! identifiers, the event stream that front-ends consume, the `Frontend`
//! trait that decouples the engine from any particular UI, retry helpers,
//! and platform data/config directory resolution.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod dirs;
pub mod error;
pub mod event;
pub mod frontend;
pub mod retry;
pub mod types;

pub use error::{CoreError, CoreResult};
pub use event::AgentEvent;
pub use frontend::{ApprovalChoice, ApprovalPrompt, Frontend};
pub use retry::{RetryConfig, RetryOutcome, retry};
pub use types::{AgentId, SessionId, Timestamp, TokenUsage};
