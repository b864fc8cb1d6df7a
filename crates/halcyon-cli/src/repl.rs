//! A minimal line-oriented REPL.
//!
//! Every slash command named in spec §6 calls straight through to a
//! `Session` (or `PersistenceManager`) entry point and prints the result
//! with a bare `println!` — richer rendering belongs to a front-end this
//! crate deliberately isn't (SPEC_FULL.md §6).

use std::io::Write;
use std::sync::Arc;

use halcyon_config::types::ApprovalPolicy;
use halcyon_llm::LlmProvider;
use halcyon_runtime::Session;
use halcyon_storage::PersistenceManager;

use crate::provider::build_provider;

/// Credentials carried over from the config that built the session's
/// initial provider, reused when `/model` switches to a new one.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    /// API key, if one was configured.
    pub api_key: Option<String>,
    /// Base URL override, if one was configured.
    pub base_url: Option<String>,
}

const HELP_TEXT: &str = "\
Commands:
  /help               show this message
  /config             show the resolved configuration
  /clear              drop the running conversation
  /model <name>       switch the active model
  /approval <policy>  set the approval policy (on-request|on-failure|auto|auto-edit|never|yolo)
  /stats              show turn count and token usage
  /tools              list registered tools
  /mcp                list connected MCP servers
  /mcp-health         alias of /mcp
  /reload             re-run tool discovery
  /save               persist the current session
  /sessions           list saved sessions
  /resume <id>        replace the conversation with a saved session
  /checkpoint         save a named checkpoint of the current session
  /restore <id>       restore a checkpoint by its full id
  /exit, /quit        leave the REPL
Anything else is sent to the model as a new turn.";

/// Run the REPL until the user exits or stdin closes.
pub async fn run(session: &mut Session, persistence: &PersistenceManager, credentials: &Credentials) {
    println!("halcyon — type /help for commands, /exit to quit.");

    loop {
        print!("> ");
        if std::io::stdout().flush().is_err() {
            break;
        }

        let mut line = String::new();
        let bytes_read = std::io::stdin().read_line(&mut line);
        match bytes_read {
            Ok(0) | Err(_) => break, // EOF or read error
            Ok(_) => {},
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(rest) = line.strip_prefix('/') {
            if handle_command(rest, session, persistence, credentials).await {
                break;
            }
            continue;
        }

        match session.run(line.to_owned()).await {
            Ok(Some(response)) => println!("{response}"),
            Ok(None) => println!("[no response — turn limit reached]"),
            Err(e) => println!("[error] {e}"),
        }
    }
}

/// Returns `true` when the REPL should exit.
async fn handle_command(command: &str, session: &mut Session, persistence: &PersistenceManager, credentials: &Credentials) -> bool {
    let mut parts = command.splitn(2, ' ');
    let name = parts.next().unwrap_or_default();
    let arg = parts.next().map(str::trim).unwrap_or_default();

    match name {
        "help" => println!("{HELP_TEXT}"),
        "exit" | "quit" => return true,
        "clear" => {
            session.clear();
            println!("conversation cleared.");
        },
        "stats" => {
            let stats = session.context_stats();
            println!(
                "turn {} · {} messages · {} stored tokens · {} total tokens used",
                session.turn_count(),
                stats.message_count,
                stats.total_tokens,
                stats.total_usage.total
            );
        },
        "tools" => {
            let tools = session.list_tools().await;
            if tools.is_empty() {
                println!("no tools registered.");
            } else {
                for tool in tools {
                    println!("- {tool}");
                }
            }
        },
        "mcp" | "mcp-health" => {
            let servers = session.connected_mcp_servers().await;
            if servers.is_empty() {
                println!("no mcp servers connected.");
            } else {
                for server in servers {
                    println!("- {server}: connected");
                }
            }
        },
        "reload" => {
            session.reload_tools().await;
            let errors = session.discovery_errors();
            if errors.is_empty() {
                println!("tool discovery reloaded.");
            } else {
                println!("tool discovery reloaded with {} error(s):", errors.len());
                for error in errors {
                    println!("- {error}");
                }
            }
        },
        "approval" => {
            if arg.is_empty() {
                println!("current policy: {}", session.approval_manager().policy());
            } else {
                match arg.parse::<ApprovalPolicy>() {
                    Ok(policy) => {
                        session.approval_manager_mut().set_policy(policy);
                        println!("approval policy set to {policy}");
                    },
                    Err(e) => println!("[error] {e}"),
                }
            }
        },
        "model" => {
            if arg.is_empty() {
                println!("current model: {}", session.model_name());
            } else {
                match build_provider(arg, credentials.api_key.as_deref(), credentials.base_url.as_deref()) {
                    Ok(provider) => {
                        session.set_provider(Arc::from(provider) as Arc<dyn LlmProvider>);
                        println!("model switched to {arg}");
                    },
                    Err(e) => println!("[error] {e}"),
                }
            }
        },
        "save" => match session.save(persistence).await {
            Ok(()) => println!("session {} saved.", session.id()),
            Err(e) => println!("[error] {e}"),
        },
        "sessions" => match persistence.list().await {
            Ok(summaries) => {
                if summaries.is_empty() {
                    println!("no saved sessions.");
                } else {
                    for summary in summaries {
                        println!("- {} (turn {}, updated {})", summary.id, summary.turn_count, summary.updated_at);
                    }
                }
            },
            Err(e) => println!("[error] {e}"),
        },
        "resume" => {
            if arg.is_empty() {
                println!("usage: /resume <session-id>");
            } else {
                match arg.parse() {
                    Ok(id) => match persistence.load(&id).await {
                        Ok(snapshot) => {
                            session.restore(snapshot);
                            println!("resumed session {id}.");
                        },
                        Err(e) => println!("[error] {e}"),
                    },
                    Err(_) => println!("[error] {arg:?} is not a valid session id"),
                }
            }
        },
        "checkpoint" => match persistence.save_checkpoint(&session.snapshot()).await {
            Ok(checkpoint_id) => println!("checkpoint saved: {checkpoint_id}"),
            Err(e) => println!("[error] {e}"),
        },
        "restore" => {
            if arg.is_empty() {
                println!("usage: /restore <checkpoint-id>");
            } else {
                match persistence.load_checkpoint(arg).await {
                    Ok(snapshot) => {
                        session.restore(snapshot);
                        println!("restored checkpoint {arg}.");
                    },
                    Err(e) => println!("[error] {e}"),
                }
            }
        },
        "config" => println!("model: {} · approval: {}", session.model_name(), session.approval_manager().policy()),
        other => println!("unknown command /{other} — type /help for the list."),
    }

    false
}
