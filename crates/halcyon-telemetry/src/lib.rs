//! Logging and tracing for the halcyon agent orchestration engine.
//!
//! This crate provides:
//! - Configurable logging setup with multiple output formats.
//! - Request context for correlating log lines across a turn, tool call,
//!   or MCP round trip.
//! - Integration with the `tracing` ecosystem — every other halcyon crate
//!   logs through `tracing`'s macros and leaves subscriber setup to this
//!   crate.
//!
//! # Example
//!
//! ```rust,no_run
//! use halcyon_telemetry::{LogConfig, LogFormat, setup_logging, RequestContext};
//!
//! # fn main() -> Result<(), halcyon_telemetry::TelemetryError> {
//! let config = LogConfig::new("debug")
//!     .with_format(LogFormat::Pretty)
//!     .with_directive("halcyon_mcp=trace");
//!
//! setup_logging(&config)?;
//!
//! let ctx = RequestContext::new("turn_loop").with_operation("run");
//! let _guard = ctx.enter();
//! tracing::info!("processing turn");
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![warn(unreachable_pub)]

pub mod prelude;

mod context;
mod error;
mod logging;

pub use context::{RequestContext, RequestGuard};
pub use error::{TelemetryError, TelemetryResult};
pub use logging::{LogConfig, LogFormat, LogTarget, setup_default_logging, setup_logging};
