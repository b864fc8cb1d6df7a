//! Configuration struct definitions.
//!
//! All types are self-contained with no dependency on other internal
//! halcyon crates; conversion to the domain types each crate actually
//! works with happens at the integration boundary (`halcyon-cli` startup,
//! `halcyon-runtime::Session::initialize`). Every struct implements
//! [`Default`] so a bare `[section]` header (or an absent one entirely)
//! in TOML still produces a working configuration.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize};

/// Root configuration for the halcyon runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// LLM model selection and request shaping.
    pub model: ModelConfig,
    /// Working directory the session operates in. `None` means "use the
    /// process's actual cwd at startup".
    pub cwd: Option<PathBuf>,
    /// Default approval policy.
    pub approval: ApprovalPolicy,
    /// Per-run turn cap.
    pub max_turns: u32,
    /// Shell tool environment sanitisation.
    pub shell_environment: ShellEnvironmentSection,
    /// Whether the hook system is active at all.
    pub hooks_enabled: bool,
    /// Configured hooks.
    pub hooks: Vec<HookSection>,
    /// Named MCP server definitions.
    pub mcp_servers: HashMap<String, McpServerSection>,
    /// Custom sub-agent definitions.
    pub subagents: Vec<SubagentSection>,
    /// Tool allow-list. `None` means every registered tool is usable.
    pub allowed_tools: Option<Vec<String>>,
    /// System-prompt augmentation supplied by whoever configured the agent.
    pub developer_instructions: Option<String>,
    /// System-prompt augmentation supplied by the end user. Falls back to
    /// an `AGENT.MD` file in `cwd` when both this and the file are absent.
    pub user_instructions: Option<String>,
    /// Verbose discovery/health logging.
    pub debug: bool,
}

/// LLM provider selection and request shaping.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Model id sent to the provider API.
    #[serde(alias = "model")]
    pub name: String,
    /// Sampling temperature.
    pub temperature: f64,
    /// Context window size in tokens; drives the 0.8x compaction trigger.
    #[serde(alias = "context_window")]
    pub context_window: usize,
    /// API key. Prefer the `API_KEY` / `OPENAI_API_KEY` environment
    /// variables over storing this in a file.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Base URL, overriding the provider's default endpoint. Env fallback
    /// `BASE_URL` / `OPENAI_API_BASE_URL`.
    #[serde(skip_serializing)]
    pub base_url: Option<String>,
}

impl std::fmt::Debug for ModelConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelConfig")
            .field("name", &self.name)
            .field("temperature", &self.temperature)
            .field("context_window", &self.context_window)
            .field("has_api_key", &self.api_key.is_some())
            .field("has_base_url", &self.base_url.is_some())
            .finish()
    }
}

impl Serialize for ModelConfig {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ModelConfig", 3)?;
        state.serialize_field("name", &self.name)?;
        state.serialize_field("temperature", &self.temperature)?;
        state.serialize_field("context_window", &self.context_window)?;
        // api_key and base_url are intentionally omitted.
        state.end()
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: "claude-sonnet-4-20250514".to_owned(),
            temperature: 0.7,
            context_window: 200_000,
            api_key: None,
            base_url: None,
        }
    }
}

/// Approval policy governing sensitive-action classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ApprovalPolicy {
    /// Ask for anything not on the safe allow-list.
    OnRequest,
    /// Approve unless the tool itself reports failure on a dry run.
    OnFailure,
    /// Approve everything except dangerous patterns.
    Auto,
    /// Like `on-request`, but edits within the workspace are pre-approved.
    AutoEdit,
    /// Approve only the safe allow-list; reject everything else outright.
    Never,
    /// Approve everything, including escapes — dangerous patterns still
    /// block.
    Yolo,
}

impl Default for ApprovalPolicy {
    fn default() -> Self {
        Self::OnRequest
    }
}

impl std::str::FromStr for ApprovalPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "on-request" => Ok(Self::OnRequest),
            "on-failure" => Ok(Self::OnFailure),
            "auto" => Ok(Self::Auto),
            "auto-edit" => Ok(Self::AutoEdit),
            "never" => Ok(Self::Never),
            "yolo" => Ok(Self::Yolo),
            other => Err(format!(
                "unknown approval policy {other:?} (expected one of: on-request, on-failure, auto, auto-edit, never, yolo)"
            )),
        }
    }
}

impl std::fmt::Display for ApprovalPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::OnRequest => "on-request",
            Self::OnFailure => "on-failure",
            Self::Auto => "auto",
            Self::AutoEdit => "auto-edit",
            Self::Never => "never",
            Self::Yolo => "yolo",
        };
        f.write_str(s)
    }
}

/// Shell tool environment sanitisation knobs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellEnvironmentSection {
    /// Skip the built-in default exclude list (credentials-shaped
    /// variable names) entirely.
    pub ignore_default_excludes: bool,
    /// Additional glob patterns of env var names to exclude.
    pub exclude_patterns: Vec<String>,
    /// Extra variables to set (or override) in the spawned shell.
    pub set_vars: HashMap<String, String>,
}

/// A single configured hook.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HookSection {
    /// Hook name, used in logs.
    pub name: String,
    /// Lifecycle point this hook fires on.
    pub trigger: HookTrigger,
    /// Subprocess command to run. Mutually exclusive with `script`.
    pub command: Option<String>,
    /// Inline shell script to run. Mutually exclusive with `command`.
    pub script: Option<String>,
    /// Per-invocation timeout.
    pub timeout_secs: u64,
    /// Whether this hook is active.
    pub enabled: bool,
}

impl Default for HookSection {
    fn default() -> Self {
        Self {
            name: String::new(),
            trigger: HookTrigger::BeforeTool,
            command: None,
            script: None,
            timeout_secs: 30,
            enabled: true,
        }
    }
}

/// Lifecycle point a hook fires on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookTrigger {
    /// Before the turn loop starts processing a user message.
    BeforeAgent,
    /// After the turn loop finishes (success, error, or turn-limit).
    AfterAgent,
    /// Before a tool call is dispatched.
    BeforeTool,
    /// After a tool call returns.
    AfterTool,
    /// On any error surfaced mid-turn.
    OnError,
}

/// A named MCP server definition.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct McpServerSection {
    /// Whether this server is connected at session start.
    pub enabled: bool,
    /// Subprocess command for a stdio-transport server. Mutually exclusive
    /// with `url`.
    pub command: Option<String>,
    /// Arguments passed to `command`.
    pub args: Vec<String>,
    /// Environment variables set for the subprocess.
    pub env: HashMap<String, String>,
    /// Endpoint for an HTTP/SSE-transport server. Mutually exclusive with
    /// `command`.
    pub url: Option<String>,
    /// Connect timeout.
    pub startup_timeout_sec: u64,
    /// Working directory for the subprocess. Defaults to the session cwd.
    pub cwd: Option<PathBuf>,
}

/// A custom sub-agent definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SubagentSection {
    /// Tool name this sub-agent is registered under.
    pub name: String,
    /// Description surfaced in the tool schema.
    pub description: String,
    /// System prompt used to seed the sub-agent's goal.
    pub goal_prompt: String,
    /// Tool allow-list applied to the sub-agent. `None` inherits the
    /// parent's.
    pub allowed_tools: Option<Vec<String>>,
    /// Per-run turn cap for the sub-agent.
    pub max_turns: u32,
    /// Wall-clock deadline for the sub-agent run.
    pub timeout_seconds: u64,
}

impl Default for SubagentSection {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            goal_prompt: String::new(),
            allowed_tools: None,
            max_turns: 20,
            timeout_seconds: 600,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: ModelConfig::default(),
            cwd: None,
            approval: ApprovalPolicy::default(),
            max_turns: 100,
            shell_environment: ShellEnvironmentSection::default(),
            hooks_enabled: false,
            hooks: Vec::new(),
            mcp_servers: HashMap::new(),
            subagents: Vec::new(),
            allowed_tools: None,
            developer_instructions: None,
            user_instructions: None,
            debug: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_config_debug_redacts_api_key() {
        let mut cfg = ModelConfig::default();
        cfg.api_key = Some("sk-secret-12345".to_owned());
        cfg.base_url = Some("https://proxy.internal.example.com".to_owned());

        let debug_str = format!("{cfg:?}");
        assert!(!debug_str.contains("sk-secret-12345"));
        assert!(!debug_str.contains("proxy.internal.example.com"));
        assert!(debug_str.contains("has_api_key: true"));
    }

    #[test]
    fn model_config_serialize_omits_api_key() {
        let mut cfg = ModelConfig::default();
        cfg.api_key = Some("sk-secret-12345".to_owned());

        let json = serde_json::to_string(&cfg).unwrap();
        assert!(!json.contains("sk-secret-12345"));
        assert!(!json.contains("api_key"));
    }

    #[test]
    fn approval_policy_defaults_to_on_request() {
        assert_eq!(ApprovalPolicy::default(), ApprovalPolicy::OnRequest);
    }

    #[test]
    fn config_default_is_usable() {
        let cfg = Config::default();
        assert_eq!(cfg.model.name, "claude-sonnet-4-20250514");
        assert!(cfg.mcp_servers.is_empty());
        assert!(!cfg.hooks_enabled);
    }

    #[test]
    fn approval_policy_from_str_round_trips_through_display() {
        for policy in [
            ApprovalPolicy::OnRequest,
            ApprovalPolicy::OnFailure,
            ApprovalPolicy::Auto,
            ApprovalPolicy::AutoEdit,
            ApprovalPolicy::Never,
            ApprovalPolicy::Yolo,
        ] {
            let rendered = policy.to_string();
            assert_eq!(rendered.parse::<ApprovalPolicy>().unwrap(), policy);
        }
    }

    #[test]
    fn approval_policy_from_str_rejects_unknown() {
        assert!("not-a-policy".parse::<ApprovalPolicy>().is_err());
    }
}
