//! Tracing subscriber setup.

use std::path::PathBuf;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::error::{TelemetryError, TelemetryResult};

/// Output rendering for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Single-line, human-readable. Good for an interactive terminal.
    #[default]
    Compact,
    /// Multi-line, human-readable, includes spans. Good for local debugging.
    Pretty,
    /// One JSON object per line. Good for shipping to a log aggregator.
    Json,
}

/// Where log lines are written.
#[derive(Debug, Clone)]
pub enum LogTarget {
    /// The process's stderr.
    Stderr,
    /// A file, rotated daily, under the given directory with the given
    /// filename prefix.
    RollingFile {
        /// Directory the rotated files are written into.
        directory: PathBuf,
        /// Filename prefix (e.g. `"halcyon"` produces `halcyon.2026-07-27`).
        prefix: String,
    },
}

impl Default for LogTarget {
    fn default() -> Self {
        Self::Stderr
    }
}

/// Logging configuration.
///
/// Built with the `with_*` builder methods, then passed to
/// [`setup_logging`].
#[derive(Debug, Clone)]
pub struct LogConfig {
    level: String,
    format: LogFormat,
    target: LogTarget,
    directives: Vec<String>,
    ansi: bool,
}

impl LogConfig {
    /// Start a config at the given base level (`"trace"`, `"debug"`,
    /// `"info"`, `"warn"`, `"error"`, or any `tracing_subscriber::EnvFilter`
    /// directive string).
    #[must_use]
    pub fn new(level: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            format: LogFormat::default(),
            target: LogTarget::default(),
            directives: Vec::new(),
            ansi: true,
        }
    }

    /// Set the output format.
    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the output target.
    #[must_use]
    pub fn with_target(mut self, target: LogTarget) -> Self {
        self.target = target;
        self
    }

    /// Add a per-module directive (e.g. `"halcyon_mcp=trace"`) on top of
    /// the base level.
    #[must_use]
    pub fn with_directive(mut self, directive: impl Into<String>) -> Self {
        self.directives.push(directive.into());
        self
    }

    /// Disable ANSI color codes, e.g. when writing to a file or a
    /// non-interactive pipe.
    #[must_use]
    pub fn without_ansi(mut self) -> Self {
        self.ansi = false;
        self
    }

    fn env_filter(&self) -> TelemetryResult<EnvFilter> {
        let mut spec = self.level.clone();
        for directive in &self.directives {
            spec.push(',');
            spec.push_str(directive);
        }
        EnvFilter::try_new(&spec).map_err(|e| TelemetryError::ConfigError(e.to_string()))
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::new("info")
    }
}

/// Install the global tracing subscriber per `config`.
///
/// # Errors
///
/// Returns [`TelemetryError::ConfigError`] if `config`'s directives don't
/// parse, or [`TelemetryError::InitError`] if a global subscriber is
/// already installed.
pub fn setup_logging(config: &LogConfig) -> TelemetryResult<()> {
    let filter = config.env_filter()?;

    let result = match (&config.format, &config.target) {
        (LogFormat::Json, LogTarget::Stderr) => tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init(),
        (LogFormat::Pretty, LogTarget::Stderr) => tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_ansi(config.ansi)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
        (LogFormat::Compact, LogTarget::Stderr) => tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_ansi(config.ansi)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
        (format, LogTarget::RollingFile { directory, prefix }) => {
            std::fs::create_dir_all(directory)?;
            let appender = tracing_appender::rolling::daily(directory, prefix);
            // Leaking the guard is intentional: the subscriber must outlive
            // every call site for the life of the process.
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            std::mem::forget(guard);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(non_blocking);
            match format {
                LogFormat::Json => tracing_subscriber::registry()
                    .with(filter)
                    .with(layer.json())
                    .try_init(),
                LogFormat::Pretty => tracing_subscriber::registry()
                    .with(filter)
                    .with(layer.pretty())
                    .try_init(),
                LogFormat::Compact => tracing_subscriber::registry()
                    .with(filter)
                    .with(layer.compact())
                    .try_init(),
            }
        },
    };

    result.map_err(|e| TelemetryError::InitError(e.to_string()))
}

/// Convenience wrapper: `setup_logging` with `info`-level compact output
/// to stderr, honoring `RUST_LOG`/`HALCYON_LOG` if set.
///
/// # Errors
///
/// Returns a [`TelemetryError`] under the same conditions as
/// [`setup_logging`].
pub fn setup_default_logging() -> TelemetryResult<()> {
    let level = std::env::var("HALCYON_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "info".to_owned());
    setup_logging(&LogConfig::new(level))
}
