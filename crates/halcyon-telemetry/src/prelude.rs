//! Commonly used types, for `use halcyon_telemetry::prelude::*;`.

pub use crate::{
    LogConfig, LogFormat, LogTarget, RequestContext, RequestGuard, TelemetryError,
    TelemetryResult, setup_default_logging, setup_logging,
};
