//! `halcyon` — thin binary front-end for the agent orchestration engine.
//!
//! Single-shot mode (`halcyon "do the thing"`) prints the final response
//! and exits non-zero on failure or an empty result. With no positional
//! prompt, a minimal line-oriented REPL takes over (spec §6): rich
//! rendering is an explicit Non-goal, the front-end proper is a pluggable
//! external collaborator (spec §1).

#![deny(unsafe_code)]
#![warn(clippy::all)]

mod frontend;
mod memory_store;
mod provider;
mod repl;
mod sink;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use halcyon_core::dirs;
use halcyon_llm::LlmProvider;
use halcyon_runtime::Session;
use halcyon_storage::{JsonFileKvStore, PersistenceManager};
use halcyon_telemetry::{LogConfig, setup_logging};

use frontend::ConsoleFrontend;
use memory_store::KvMemoryStore;
use sink::ConsoleEventSink;

/// Command-line arguments (spec §6: "Program accepts `[prompt]`
/// positional ... and option `-c/--cwd <path>`").
#[derive(Parser, Debug)]
#[command(name = "halcyon", author, version, about = "An interactive coding agent")]
struct Cli {
    /// Single-shot prompt. When omitted, an interactive REPL starts.
    prompt: Option<String>,

    /// Working directory the agent operates in. Defaults to the process's
    /// current directory.
    #[arg(short = 'c', long)]
    cwd: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    let exit_code = run().await;
    std::process::exit(exit_code);
}

async fn run() -> i32 {
    let cli = Cli::parse();
    let cli_prompt = cli.prompt;

    let cwd = match resolve_cwd(cli.cwd) {
        Ok(cwd) => cwd,
        Err(e) => {
            eprintln!("error: {e}");
            return 1;
        },
    };

    let config_dir = dirs::config_dir().ok();
    let resolved = match halcyon_config::Config::load(Some(&cwd), config_dir.as_deref()) {
        Ok(resolved) => resolved,
        Err(e) => {
            eprintln!("error: invalid configuration: {e}");
            return 1;
        },
    };
    let mut config = resolved.config;
    if config.cwd.is_none() {
        config.cwd = Some(cwd.clone());
    }

    let log_level = if config.debug { "debug" } else { "info" };
    let log_config = std::env::var("HALCYON_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .map(LogConfig::new)
        .unwrap_or_else(|_| LogConfig::new(log_level));
    if let Err(e) = setup_logging(&log_config) {
        eprintln!("warning: failed to initialize logging: {e}");
    }

    let credentials = repl::Credentials { api_key: config.model.api_key.clone(), base_url: config.model.base_url.clone() };

    let provider = match provider::build_provider(&config.model.name, credentials.api_key.as_deref(), credentials.base_url.as_deref()) {
        Ok(provider) => Arc::from(provider) as Arc<dyn LlmProvider>,
        Err(e) => {
            eprintln!("error: {e}");
            return 1;
        },
    };

    let memory: Arc<dyn halcyon_tools::MemoryStore> = match dirs::user_memory_path() {
        Ok(path) => Arc::new(KvMemoryStore::new(JsonFileKvStore::new(path))),
        Err(e) => {
            tracing::warn!(error = %e, "user memory unavailable, continuing without it");
            return run_without_memory(cwd, config, provider, cli_prompt, credentials).await;
        },
    };

    let mut session = Session::with_memory(cwd, config, provider, Some(memory))
        .with_frontend(Arc::new(ConsoleFrontend))
        .with_event_sink(Arc::new(ConsoleEventSink));

    if let Err(e) = session.initialize().await {
        eprintln!("error: failed to initialize session: {e}");
        return 1;
    }

    let result = dispatch(&mut session, cli_prompt, &credentials).await;
    session.close().await;
    result
}

async fn run_without_memory(
    cwd: PathBuf,
    config: halcyon_config::Config,
    provider: Arc<dyn LlmProvider>,
    prompt: Option<String>,
    credentials: repl::Credentials,
) -> i32 {
    let mut session = Session::new(cwd, config, provider)
        .with_frontend(Arc::new(ConsoleFrontend))
        .with_event_sink(Arc::new(ConsoleEventSink));

    if let Err(e) = session.initialize().await {
        eprintln!("error: failed to initialize session: {e}");
        return 1;
    }

    let result = dispatch(&mut session, prompt, &credentials).await;
    session.close().await;
    result
}

async fn dispatch(session: &mut Session, prompt: Option<String>, credentials: &repl::Credentials) -> i32 {
    match prompt {
        Some(prompt) => match session.run(prompt).await {
            Ok(Some(_response)) => 0,
            Ok(None) => {
                eprintln!("error: no final response was produced");
                1
            },
            Err(e) => {
                eprintln!("error: {e}");
                1
            },
        },
        None => {
            let persistence = match PersistenceManager::from_home() {
                Ok(persistence) => persistence,
                Err(e) => {
                    eprintln!("error: could not open session storage: {e}");
                    return 1;
                },
            };
            repl::run(session, &persistence, credentials).await;
            0
        },
    }
}

fn resolve_cwd(cwd: Option<PathBuf>) -> std::io::Result<PathBuf> {
    match cwd {
        Some(path) => std::fs::canonicalize(path),
        None => std::env::current_dir(),
    }
}
