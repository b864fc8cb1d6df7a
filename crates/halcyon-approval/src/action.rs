//! [`ApprovalContext`] — the input the policy classifier reasons about.

use std::path::{Path, PathBuf};

use halcyon_tools::ToolConfirmation;
use serde_json::Value;

/// Everything the classifier needs to decide on one tool invocation
/// (spec §4.2 step 5, §4.3).
#[derive(Debug, Clone)]
pub struct ApprovalContext {
    /// Name of the tool being invoked.
    pub tool_name: String,
    /// Arguments the tool will run with.
    pub arguments: Value,
    /// Whether the invocation pipeline classified this call as mutating.
    pub is_mutating: bool,
    /// Paths the invocation will touch, as reported by the tool's
    /// confirmation.
    pub affected_paths: Vec<PathBuf>,
    /// The literal shell command, when this is the bash tool.
    pub command: Option<String>,
    /// Whether the tool flagged this invocation as dangerous on its own
    /// terms (distinct from the command-pattern classifier in step 2).
    pub is_dangerous: bool,
    /// Working directory invocations are scoped to, for the path-escape
    /// check in step 3.
    pub cwd: PathBuf,
}

impl ApprovalContext {
    /// Build a context for a non-mutating invocation (always approved).
    #[must_use]
    pub fn read_only(tool_name: impl Into<String>, arguments: Value, cwd: PathBuf) -> Self {
        Self {
            tool_name: tool_name.into(),
            arguments,
            is_mutating: false,
            affected_paths: Vec::new(),
            command: None,
            is_dangerous: false,
            cwd,
        }
    }

    /// Whether any affected path escapes `cwd` (spec §4.3 step 3: "the
    /// relative path from cwd escapes cwd (begins with `..`)").
    #[must_use]
    pub fn has_path_escape(&self) -> bool {
        self.affected_paths.iter().any(|path| path_escapes(&self.cwd, path))
    }

    /// Build a context from a tool's confirmation and the invocation
    /// pipeline's mutating classification (spec §4.2 step 5).
    #[must_use]
    pub fn from_confirmation(tool_name: &str, confirmation: &ToolConfirmation, is_mutating: bool, cwd: PathBuf) -> Self {
        Self {
            tool_name: tool_name.to_owned(),
            arguments: confirmation.arguments.clone(),
            is_mutating,
            affected_paths: confirmation.affected_paths().into_iter().map(Path::to_path_buf).collect(),
            command: confirmation.command.clone(),
            is_dangerous: confirmation.dangerous,
            cwd,
        }
    }
}

/// Whether `path`, made relative to `cwd`, begins with a parent-dir
/// component — i.e. it would resolve outside `cwd`.
#[must_use]
pub fn path_escapes(cwd: &Path, path: &Path) -> bool {
    let relative: PathBuf = if path.is_absolute() {
        match pathdiff(path, cwd) {
            Some(rel) => rel,
            None => return true,
        }
    } else {
        path.to_path_buf()
    };
    relative
        .components()
        .next()
        .is_some_and(|c| matches!(c, std::path::Component::ParentDir))
}

/// Minimal lexical diff of `path` relative to `base`, without requiring
/// either to exist on disk (unlike `Path::canonicalize`).
fn pathdiff(path: &Path, base: &Path) -> Option<PathBuf> {
    let path_components: Vec<_> = path.components().collect();
    let base_components: Vec<_> = base.components().collect();

    let common = path_components
        .iter()
        .zip(base_components.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut result = PathBuf::new();
    for _ in common..base_components.len() {
        result.push("..");
    }
    for component in &path_components[common..] {
        result.push(component.as_os_str());
    }
    Some(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sibling_path_escapes() {
        assert!(path_escapes(Path::new("/home/user"), Path::new("/home/other/file.txt")));
    }

    #[test]
    fn nested_path_does_not_escape() {
        assert!(!path_escapes(Path::new("/home/user"), Path::new("/home/user/docs/file.txt")));
    }

    #[test]
    fn relative_parent_escapes() {
        assert!(path_escapes(Path::new("/home/user"), Path::new("../secret")));
    }

    #[test]
    fn relative_child_does_not_escape() {
        assert!(!path_escapes(Path::new("/home/user"), Path::new("docs/file.txt")));
    }
}
