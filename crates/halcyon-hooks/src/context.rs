//! [`HookContext`] — the lifecycle data a hook's environment is built from.

use std::path::PathBuf;

/// Everything a subprocess hook might need to know about the lifecycle
/// point it fired on (spec §6: "Hook environment").
#[derive(Debug, Clone, Default)]
pub struct HookContext {
    /// Working directory the hook subprocess inherits.
    pub cwd: PathBuf,
    /// Name of the tool being invoked, for `before_tool`/`after_tool`.
    pub tool_name: Option<String>,
    /// JSON-serialised tool arguments, for `before_tool`/`after_tool`.
    pub tool_params: Option<String>,
    /// Rendered tool result text, for `after_tool`.
    pub tool_result: Option<String>,
    /// The user's message, for `before_agent`.
    pub user_message: Option<String>,
    /// The assistant's final response, for `after_agent`.
    pub response: Option<String>,
    /// Error text, for `on_error`.
    pub error: Option<String>,
}

impl HookContext {
    /// Build a context for a `before_agent`/`after_agent` event.
    #[must_use]
    pub fn for_agent(cwd: PathBuf, user_message: Option<String>, response: Option<String>) -> Self {
        Self { cwd, user_message, response, ..Self::default() }
    }

    /// Build a context for a `before_tool`/`after_tool` event.
    #[must_use]
    pub fn for_tool(cwd: PathBuf, tool_name: impl Into<String>, params: &serde_json::Value, result: Option<String>) -> Self {
        Self {
            cwd,
            tool_name: Some(tool_name.into()),
            tool_params: Some(params.to_string()),
            tool_result: result,
            ..Self::default()
        }
    }

    /// Build a context for an `on_error` event.
    #[must_use]
    pub fn for_error(cwd: PathBuf, error: impl Into<String>) -> Self {
        Self { cwd, error: Some(error.into()), ..Self::default() }
    }

    /// Render the `AI_AGENT_*` environment variables this context carries
    /// (spec §6: `AI_AGENT_TRIGGER`, `AI_AGENT_CWD`, and whichever optional
    /// fields apply).
    #[must_use]
    pub fn env_vars(&self, trigger: &str) -> Vec<(String, String)> {
        let mut vars = vec![
            ("AI_AGENT_TRIGGER".to_owned(), trigger.to_owned()),
            ("AI_AGENT_CWD".to_owned(), self.cwd.display().to_string()),
        ];
        if let Some(name) = &self.tool_name {
            vars.push(("AI_AGENT_TOOL_NAME".to_owned(), name.clone()));
        }
        if let Some(params) = &self.tool_params {
            vars.push(("AI_AGENT_TOOL_PARAMS".to_owned(), params.clone()));
        }
        if let Some(result) = &self.tool_result {
            vars.push(("AI_AGENT_TOOL_RESULT".to_owned(), result.clone()));
        }
        if let Some(message) = &self.user_message {
            vars.push(("AI_AGENT_USER_MESSAGE".to_owned(), message.clone()));
        }
        if let Some(response) = &self.response {
            vars.push(("AI_AGENT_RESPONSE".to_owned(), response.clone()));
        }
        if let Some(error) = &self.error {
            vars.push(("AI_AGENT_ERROR".to_owned(), error.clone()));
        }
        vars
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_context_carries_serialized_params() {
        let ctx = HookContext::for_tool(PathBuf::from("/tmp"), "bash", &serde_json::json!({"command": "ls"}), None);
        let vars = ctx.env_vars("before_tool");
        assert!(vars.contains(&("AI_AGENT_TOOL_NAME".to_owned(), "bash".to_owned())));
        assert!(vars.iter().any(|(k, v)| k == "AI_AGENT_TOOL_PARAMS" && v.contains("command")));
    }

    #[test]
    fn agent_context_omits_tool_fields() {
        let ctx = HookContext::for_agent(PathBuf::from("/tmp"), Some("hi".to_owned()), None);
        let vars = ctx.env_vars("before_agent");
        assert!(!vars.iter().any(|(k, _)| k == "AI_AGENT_TOOL_NAME"));
        assert!(vars.contains(&("AI_AGENT_USER_MESSAGE".to_owned(), "hi".to_owned())));
    }
}
