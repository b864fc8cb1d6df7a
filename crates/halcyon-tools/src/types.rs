//! Tool contract types: [`ToolKind`], [`ToolInvocation`], [`ToolResult`],
//! [`FileDiff`], and [`ToolConfirmation`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The category a tool falls into. Drives the default mutating policy and
/// is carried on MCP-sourced tools too (always [`ToolKind::Mcp`] unless the
/// server advertises a more specific kind).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    /// Read-only filesystem access.
    Read,
    /// Filesystem mutation.
    Write,
    /// Arbitrary process execution.
    Shell,
    /// Outbound network access.
    Network,
    /// Persisted key-value memory.
    Memory,
    /// MCP-sourced tool of unknown native kind.
    Mcp,
}

impl ToolKind {
    /// Default mutating policy: a tool is mutating iff its kind is one of
    /// `{write, shell, network, memory}` (spec §4.1).
    #[must_use]
    pub fn is_mutating_by_default(self) -> bool {
        matches!(
            self,
            ToolKind::Write | ToolKind::Shell | ToolKind::Network | ToolKind::Memory
        )
    }
}

/// A single tool invocation's arguments and execution context.
#[derive(Debug, Clone)]
pub struct ToolInvocation {
    /// Arguments as a JSON object.
    pub arguments: Value,
    /// Working directory the tool should operate relative to.
    pub working_directory: std::path::PathBuf,
}

impl ToolInvocation {
    /// Create a new invocation.
    #[must_use]
    pub fn new(arguments: Value, working_directory: std::path::PathBuf) -> Self {
        Self {
            arguments,
            working_directory,
        }
    }
}

/// The outcome of executing a tool.
///
/// A success result carries only output; a failure result must carry
/// error text and may carry partial output (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// Whether the tool succeeded.
    pub success: bool,
    /// Output text (partial, if this is a failure with partial output).
    pub output: String,
    /// Error text, present only on failure.
    pub error: Option<String>,
    /// Arbitrary structured metadata (e.g. line counts, byte counts).
    #[serde(default)]
    pub metadata: Map<String, Value>,
    /// Whether `output` was truncated to stay within size limits.
    #[serde(default)]
    pub truncated: bool,
    /// File diff, when this result came from a file-editing tool.
    pub diff: Option<FileDiff>,
    /// Process exit code, when this result came from a shell tool.
    pub exit_code: Option<i32>,
}

impl ToolResult {
    /// Build a success result.
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
            error: None,
            metadata: Map::new(),
            truncated: false,
            diff: None,
            exit_code: None,
        }
    }

    /// Build a failure result. `error` is required; `output` may be empty
    /// or may carry whatever partial output was produced before failure.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            output: String::new(),
            error: Some(error.into()),
            metadata: Map::new(),
            truncated: false,
            diff: None,
            exit_code: None,
        }
    }

    /// Attach partial output to a failure result.
    #[must_use]
    pub fn with_partial_output(mut self, output: impl Into<String>) -> Self {
        self.output = output.into();
        self
    }

    /// Attach a file diff.
    #[must_use]
    pub fn with_diff(mut self, diff: FileDiff) -> Self {
        self.diff = Some(diff);
        self
    }

    /// Attach an exit code.
    #[must_use]
    pub fn with_exit_code(mut self, code: i32) -> Self {
        self.exit_code = Some(code);
        self
    }

    /// Mark truncated.
    #[must_use]
    pub fn with_truncated(mut self, truncated: bool) -> Self {
        self.truncated = truncated;
        self
    }

    /// Attach a metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Render this result as the text the model sees in a tool-result
    /// message: output on success, `"Error: {error}"` (with any partial
    /// output prefixed) on failure.
    #[must_use]
    pub fn to_model_output(&self) -> String {
        if self.success {
            self.output.clone()
        } else {
            let error = self.error.as_deref().unwrap_or("unknown error");
            if self.output.is_empty() {
                format!("Error: {error}")
            } else {
                format!("{}\nError: {error}", self.output)
            }
        }
    }
}

/// A file edit, renderable as a unified diff on demand.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileDiff {
    /// Path to the affected file.
    pub path: std::path::PathBuf,
    /// Content before the edit. Empty for a new file.
    pub old_content: String,
    /// Content after the edit. Empty for a deletion.
    pub new_content: String,
    /// Whether this diff creates a new file.
    pub is_new: bool,
    /// Whether this diff deletes the file.
    pub is_deletion: bool,
}

impl FileDiff {
    /// Build a diff for an edit to an existing file.
    #[must_use]
    pub fn edit(
        path: std::path::PathBuf,
        old_content: impl Into<String>,
        new_content: impl Into<String>,
    ) -> Self {
        Self {
            path,
            old_content: old_content.into(),
            new_content: new_content.into(),
            is_new: false,
            is_deletion: false,
        }
    }

    /// Build a diff for a newly created file.
    #[must_use]
    pub fn create(path: std::path::PathBuf, content: impl Into<String>) -> Self {
        Self {
            path,
            old_content: String::new(),
            new_content: content.into(),
            is_new: true,
            is_deletion: false,
        }
    }

    /// Build a diff for a file deletion.
    #[must_use]
    pub fn delete(path: std::path::PathBuf, old_content: impl Into<String>) -> Self {
        Self {
            path,
            old_content: old_content.into(),
            new_content: String::new(),
            is_new: false,
            is_deletion: true,
        }
    }

    /// Render this diff as unified-diff text.
    #[must_use]
    pub fn to_unified_diff(&self) -> String {
        let path_str = self.path.display().to_string();
        let mut out = format!("--- a/{path_str}\n+++ b/{path_str}\n");

        if self.is_new {
            for line in self.new_content.lines() {
                out.push('+');
                out.push_str(line);
                out.push('\n');
            }
            return out;
        }

        if self.is_deletion {
            for line in self.old_content.lines() {
                out.push('-');
                out.push_str(line);
                out.push('\n');
            }
            return out;
        }

        let old_lines: Vec<&str> = self.old_content.lines().collect();
        let new_lines: Vec<&str> = self.new_content.lines().collect();
        for line in &old_lines {
            if !new_lines.contains(line) {
                out.push('-');
                out.push_str(line);
                out.push('\n');
            }
        }
        for line in &new_lines {
            if !old_lines.contains(line) {
                out.push('+');
                out.push_str(line);
                out.push('\n');
            }
        }
        out
    }
}

/// A request for the user (or an automated policy) to approve a mutating
/// tool invocation before it runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolConfirmation {
    /// Name of the tool requesting confirmation.
    pub tool_name: String,
    /// Arguments the tool will run with.
    pub arguments: Value,
    /// Human-readable one-line description of what will happen.
    pub description: String,
    /// Diff preview, for file-editing tools.
    pub diff: Option<FileDiff>,
    /// Paths this invocation will touch.
    pub affected_paths: BTreeMap<std::path::PathBuf, ()>,
    /// The literal shell command, for the bash tool.
    pub command: Option<String>,
    /// Whether this invocation matches a known-dangerous pattern.
    pub dangerous: bool,
}

impl ToolConfirmation {
    /// Build the default confirmation: a one-line description, no diff,
    /// no affected paths (spec §4.1: "the default confirmation carries a
    /// one-line description and no diff").
    pub fn default_for(tool_name: impl Into<String>, arguments: Value) -> Self {
        let tool_name = tool_name.into();
        Self {
            description: format!("Run {tool_name}"),
            tool_name,
            arguments,
            diff: None,
            affected_paths: BTreeMap::new(),
            command: None,
            dangerous: false,
        }
    }

    /// Attach a diff and the path it affects.
    #[must_use]
    pub fn with_diff(mut self, diff: FileDiff) -> Self {
        self.affected_paths.insert(diff.path.clone(), ());
        self.description = format!("Edit {}", diff.path.display());
        self.diff = Some(diff);
        self
    }

    /// Attach a shell command.
    #[must_use]
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        let command = command.into();
        self.description = format!("Run: {command}");
        self.command = Some(command);
        self
    }

    /// Mark as dangerous.
    #[must_use]
    pub fn with_dangerous(mut self, dangerous: bool) -> Self {
        self.dangerous = dangerous;
        self
    }

    /// The set of affected paths.
    #[must_use]
    pub fn affected_paths(&self) -> Vec<&std::path::Path> {
        self.affected_paths.keys().map(AsRef::as_ref).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mutating_policy_matches_spec() {
        assert!(!ToolKind::Read.is_mutating_by_default());
        assert!(ToolKind::Write.is_mutating_by_default());
        assert!(ToolKind::Shell.is_mutating_by_default());
        assert!(ToolKind::Network.is_mutating_by_default());
        assert!(ToolKind::Memory.is_mutating_by_default());
        assert!(!ToolKind::Mcp.is_mutating_by_default());
    }

    #[test]
    fn success_result_has_no_error() {
        let result = ToolResult::success("done");
        assert!(result.success);
        assert!(result.error.is_none());
        assert_eq!(result.to_model_output(), "done");
    }

    #[test]
    fn failure_result_renders_error() {
        let result = ToolResult::failure("boom");
        assert!(!result.success);
        assert_eq!(result.to_model_output(), "Error: boom");
    }

    #[test]
    fn failure_with_partial_output_prefixes_error() {
        let result = ToolResult::failure("boom").with_partial_output("partial output");
        assert_eq!(result.to_model_output(), "partial output\nError: boom");
    }

    #[test]
    fn diff_renders_unified_format_for_new_file() {
        let diff = FileDiff::create("new.txt".into(), "hello\nworld");
        let rendered = diff.to_unified_diff();
        assert!(rendered.contains("+hello"));
        assert!(rendered.contains("+world"));
    }

    #[test]
    fn default_confirmation_has_no_diff() {
        let confirmation = ToolConfirmation::default_for("bash", serde_json::json!({}));
        assert!(confirmation.diff.is_none());
        assert!(!confirmation.description.is_empty());
    }
}
