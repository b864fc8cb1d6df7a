//! Edit file tool — performs exact string replacements in files.

use serde_json::Value;

use crate::types::FileDiff;
use crate::{Tool, ToolConfirmation, ToolContext, ToolInvocation, ToolKind, ToolResult};

/// Built-in tool for editing files via string replacement.
pub struct EditFileTool;

#[async_trait::async_trait]
impl Tool for EditFileTool {
    fn name(&self) -> &str {
        "edit_file"
    }

    fn description(&self) -> &str {
        "Performs exact string replacements in files. The old_string must be unique in the file \
         unless replace_all is true. Fails if old_string is not found or matches multiple times \
         (without replace_all)."
    }

    fn kind(&self) -> ToolKind {
        ToolKind::Write
    }

    fn schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "file_path": {
                    "type": "string",
                    "description": "Absolute path to the file to edit"
                },
                "old_string": {
                    "type": "string",
                    "description": "The exact text to find and replace"
                },
                "new_string": {
                    "type": "string",
                    "description": "The replacement text"
                },
                "replace_all": {
                    "type": "boolean",
                    "description": "Replace all occurrences (default: false)",
                    "default": false
                }
            },
            "required": ["file_path", "old_string", "new_string"]
        })
    }

    fn validate(&self, args: &Value) -> Vec<String> {
        let mut errors = Vec::new();
        for field in ["file_path", "old_string", "new_string"] {
            if args.get(field).and_then(Value::as_str).is_none() {
                errors.push(format!("{field} is required"));
            }
        }
        errors
    }

    fn get_confirmation(&self, invocation: &ToolInvocation) -> Option<ToolConfirmation> {
        let args = &invocation.arguments;
        let file_path = args.get("file_path")?.as_str()?;
        let old_string = args.get("old_string")?.as_str()?;
        let new_string = args.get("new_string")?.as_str()?;
        let replace_all = args.get("replace_all").and_then(Value::as_bool).unwrap_or(false);

        let path = std::path::PathBuf::from(file_path);
        let content = std::fs::read_to_string(&path).ok()?;
        let new_content = if replace_all {
            content.replace(old_string, new_string)
        } else {
            content.replacen(old_string, new_string, 1)
        };

        let diff = FileDiff::edit(path, content, new_content);
        Some(ToolConfirmation::default_for(self.name(), invocation.arguments.clone()).with_diff(diff))
    }

    async fn execute(&self, invocation: &ToolInvocation, _ctx: &ToolContext) -> ToolResult {
        let args = &invocation.arguments;
        let Some(file_path) = args.get("file_path").and_then(Value::as_str) else {
            return ToolResult::failure("file_path is required");
        };
        let Some(old_string) = args.get("old_string").and_then(Value::as_str) else {
            return ToolResult::failure("old_string is required");
        };
        let Some(new_string) = args.get("new_string").and_then(Value::as_str) else {
            return ToolResult::failure("new_string is required");
        };
        let replace_all = args.get("replace_all").and_then(Value::as_bool).unwrap_or(false);

        let path = std::path::Path::new(file_path);
        if !path.exists() {
            return ToolResult::failure(format!("path not found: {file_path}"));
        }

        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) => return ToolResult::failure(format!("I/O error: {e}")),
        };

        let count = content.matches(old_string).count();

        if count == 0 {
            return ToolResult::failure(format!("old_string not found in {file_path}"));
        }

        if count > 1 && !replace_all {
            return ToolResult::failure(format!(
                "old_string found {count} times in {file_path} — use replace_all or provide more context to make it unique"
            ));
        }

        let new_content = if replace_all {
            content.replace(old_string, new_string)
        } else {
            content.replacen(old_string, new_string, 1)
        };

        if let Err(e) = tokio::fs::write(path, &new_content).await {
            return ToolResult::failure(format!("I/O error: {e}"));
        }

        let diff = FileDiff::edit(path.to_path_buf(), content, new_content);

        let message = if replace_all && count > 1 {
            format!("Replaced {count} occurrences in {file_path}")
        } else {
            format!("Edited {file_path}")
        };

        ToolResult::success(message).with_diff(diff)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn ctx() -> ToolContext {
        ToolContext::new(std::env::temp_dir())
    }

    fn invocation(args: Value) -> ToolInvocation {
        ToolInvocation::new(args, std::env::temp_dir())
    }

    #[tokio::test]
    async fn test_edit_file_basic() {
        let mut f = NamedTempFile::new().unwrap();
        write!(f, "hello world").unwrap();

        let result = EditFileTool
            .execute(
                &invocation(serde_json::json!({
                    "file_path": f.path().to_str().unwrap(),
                    "old_string": "hello",
                    "new_string": "goodbye"
                })),
                &ctx(),
            )
            .await;

        assert!(result.success);
        assert!(result.output.contains("Edited"));
        assert_eq!(std::fs::read_to_string(f.path()).unwrap(), "goodbye world");
    }

    #[tokio::test]
    async fn test_edit_file_not_found() {
        let result = EditFileTool
            .execute(
                &invocation(serde_json::json!({
                    "file_path": "/tmp/halcyon_nonexistent_12345.txt",
                    "old_string": "a",
                    "new_string": "b"
                })),
                &ctx(),
            )
            .await;

        assert!(!result.success);
    }

    #[tokio::test]
    async fn test_edit_file_old_string_not_found() {
        let mut f = NamedTempFile::new().unwrap();
        write!(f, "hello world").unwrap();

        let result = EditFileTool
            .execute(
                &invocation(serde_json::json!({
                    "file_path": f.path().to_str().unwrap(),
                    "old_string": "foobar",
                    "new_string": "baz"
                })),
                &ctx(),
            )
            .await;

        assert!(!result.success);
        assert!(result.error.unwrap().contains("not found"));
    }

    #[tokio::test]
    async fn test_edit_file_non_unique_fails() {
        let mut f = NamedTempFile::new().unwrap();
        write!(f, "aaa bbb aaa").unwrap();

        let result = EditFileTool
            .execute(
                &invocation(serde_json::json!({
                    "file_path": f.path().to_str().unwrap(),
                    "old_string": "aaa",
                    "new_string": "ccc"
                })),
                &ctx(),
            )
            .await;

        assert!(!result.success);
        assert!(result.error.unwrap().contains("2 times"));
    }

    #[tokio::test]
    async fn test_edit_file_replace_all() {
        let mut f = NamedTempFile::new().unwrap();
        write!(f, "aaa bbb aaa").unwrap();

        let result = EditFileTool
            .execute(
                &invocation(serde_json::json!({
                    "file_path": f.path().to_str().unwrap(),
                    "old_string": "aaa",
                    "new_string": "ccc",
                    "replace_all": true
                })),
                &ctx(),
            )
            .await;

        assert!(result.output.contains("2 occurrences"));
        assert_eq!(std::fs::read_to_string(f.path()).unwrap(), "ccc bbb ccc");
    }
}
