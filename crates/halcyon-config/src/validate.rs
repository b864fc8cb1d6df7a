//! Configuration validation rules.

use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;

/// Validate a fully-merged configuration.
///
/// # Errors
///
/// Returns a [`ConfigError::ValidationError`] naming the first rule that
/// fails.
pub fn validate(config: &Config) -> ConfigResult<()> {
    if !(0.0..=2.0).contains(&config.model.temperature) {
        return Err(ConfigError::ValidationError {
            field: "model.temperature".to_owned(),
            message: format!(
                "temperature must be between 0.0 and 2.0, got {}",
                config.model.temperature
            ),
        });
    }

    if config.model.context_window == 0 {
        return Err(ConfigError::ValidationError {
            field: "model.context_window".to_owned(),
            message: "context_window must be greater than zero".to_owned(),
        });
    }

    if config.max_turns == 0 {
        return Err(ConfigError::ValidationError {
            field: "max_turns".to_owned(),
            message: "max_turns must be greater than zero".to_owned(),
        });
    }

    for (name, server) in &config.mcp_servers {
        if !server.enabled {
            continue;
        }
        match (&server.command, &server.url) {
            (Some(_), Some(_)) => {
                return Err(ConfigError::ValidationError {
                    field: format!("mcp_servers.{name}"),
                    message: "must set exactly one of command or url, not both".to_owned(),
                });
            },
            (None, None) => {
                return Err(ConfigError::ValidationError {
                    field: format!("mcp_servers.{name}"),
                    message: "must set one of command or url".to_owned(),
                });
            },
            _ => {},
        }
    }

    for hook in &config.hooks {
        match (&hook.command, &hook.script) {
            (Some(_), Some(_)) => {
                return Err(ConfigError::ValidationError {
                    field: format!("hooks[{}]", hook.name),
                    message: "must set exactly one of command or script, not both".to_owned(),
                });
            },
            (None, None) => {
                return Err(ConfigError::ValidationError {
                    field: format!("hooks[{}]", hook.name),
                    message: "must set one of command or script".to_owned(),
                });
            },
            _ => {},
        }
    }

    for sub in &config.subagents {
        if sub.name.is_empty() {
            return Err(ConfigError::ValidationError {
                field: "subagents[].name".to_owned(),
                message: "sub-agent definitions must have a non-empty name".to_owned(),
            });
        }
        if sub.max_turns == 0 {
            return Err(ConfigError::ValidationError {
                field: format!("subagents.{}.max_turns", sub.name),
                message: "max_turns must be greater than zero".to_owned(),
            });
        }
    }

    Ok(())
}
