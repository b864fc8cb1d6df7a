//! halcyon-hooks — lifecycle hook dispatch (spec §4.4).
//!
//! A hook is a subprocess spawned at one of five lifecycle points
//! (`before_agent`, `after_agent`, `before_tool`, `after_tool`, `on_error`),
//! given the agent's cwd and a fixed set of `AI_AGENT_*` environment
//! variables describing what triggered it. Hooks are advisory: a failure
//! is logged and never fails the operation that triggered it.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod context;
pub mod dispatcher;
pub mod error;
pub mod executor;

pub use context::HookContext;
pub use dispatcher::HookDispatcher;
pub use error::{HookError, HookResult};
pub use executor::{HookExecutor, HookOutcome};
