#![deny(unsafe_code)]
#![warn(missing_docs)]
//! Layered configuration system for the halcyon agent orchestration engine.
//!
//! # Usage
//!
//! ```rust,no_run
//! use halcyon_config::Config;
//!
//! let resolved = Config::load(Some(std::path::Path::new(".")), None).unwrap();
//! let config = resolved.config;
//! println!("using model: {}", config.model.name);
//! ```
//!
//! # Configuration precedence
//!
//! From highest to lowest priority:
//!
//! 1. **Project** (`{cwd}/.halcyon/config.toml`)
//! 2. **User** (`{config-dir}/config.toml`)
//! 3. **Environment variables** (`API_KEY`/`OPENAI_API_KEY`, `BASE_URL`/`OPENAI_API_BASE_URL`) — fallback only
//! 4. **Embedded defaults**
//!
//! # Design
//!
//! This crate has no dependency on any other internal halcyon crate. It
//! only depends on `serde`, `toml`, `thiserror`, `tracing`, and
//! `directories`. Conversion from config types to the domain types each
//! crate actually uses happens at the integration boundary.

/// Environment variable fallback resolution.
pub mod env;
/// Configuration error types.
pub mod error;
/// Configuration file discovery and loading.
pub mod loader;
/// Layered configuration merging with precedence tracking.
pub mod merge;
/// Resolved configuration display and serialization.
pub mod show;
/// Configuration struct definitions.
pub mod types;
/// Configuration validation rules.
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use show::{ResolvedConfig, ShowFormat};
pub use types::*;

impl Config {
    /// Load configuration with the full project → user → env → defaults
    /// precedence chain.
    ///
    /// `project_root` is usually the session's `cwd`; `config_dir` is
    /// usually `halcyon_core::dirs::config_dir()`. Either may be `None` to
    /// skip that layer (e.g. when no project directory is known yet).
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if any config file is malformed or the
    /// final configuration fails validation.
    pub fn load(
        project_root: Option<&std::path::Path>,
        config_dir: Option<&std::path::Path>,
    ) -> ConfigResult<ResolvedConfig> {
        loader::load(project_root, config_dir)
    }

    /// Load configuration from a single file, with no layering.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be read, parsed, or
    /// fails validation.
    pub fn load_file(path: &std::path::Path) -> ConfigResult<Self> {
        loader::load_file(path)
    }
}
