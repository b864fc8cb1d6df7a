//! The turn-loop engine: context management, compaction, loop detection,
//! tool invocation, sub-agents, and the [`Session`] that wires them
//! together (spec §3, §4).

pub mod compactor;
pub mod context;
pub mod error;
pub mod invocation;
pub mod loop_detector;
pub mod session;
pub mod subagent;

pub use compactor::Compactor;
pub use context::{ContextManager, ContextStats, StoredMessage, SummarizationResult};
pub use error::{RuntimeError, RuntimeResult};
pub use invocation::invoke_tool;
pub use loop_detector::{Action, LoopDetector};
pub use session::{EventSink, NullEventSink, Session};
pub use subagent::SubAgentTool;
