//! Write file tool — writes content to a file, creating parent directories
//! as needed.

use serde_json::Value;

use crate::types::FileDiff;
use crate::{Tool, ToolConfirmation, ToolContext, ToolInvocation, ToolKind, ToolResult};

/// Built-in tool for writing files.
pub struct WriteFileTool;

#[async_trait::async_trait]
impl Tool for WriteFileTool {
    fn name(&self) -> &str {
        "write_file"
    }

    fn description(&self) -> &str {
        "Writes content to a file. Creates parent directories if they don't exist. \
         Overwrites the file if it already exists."
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
                    "description": "Absolute path to the file to write"
                },
                "content": {
                    "type": "string",
                    "description": "The content to write to the file"
                }
            },
            "required": ["file_path", "content"]
        })
    }

    fn validate(&self, args: &Value) -> Vec<String> {
        let mut errors = Vec::new();
        if args.get("file_path").and_then(Value::as_str).is_none() {
            errors.push("file_path is required".to_owned());
        }
        if args.get("content").and_then(Value::as_str).is_none() {
            errors.push("content is required".to_owned());
        }
        errors
    }

    fn get_confirmation(&self, invocation: &ToolInvocation) -> Option<ToolConfirmation> {
        let file_path = invocation.arguments.get("file_path")?.as_str()?;
        let new_content = invocation
            .arguments
            .get("content")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let path = std::path::PathBuf::from(file_path);
        let old_content = std::fs::read_to_string(&path).unwrap_or_default();
        let is_new = !path.exists();
        let diff = if is_new {
            FileDiff::create(path, new_content)
        } else {
            FileDiff::edit(path, old_content, new_content)
        };
        Some(ToolConfirmation::default_for(self.name(), invocation.arguments.clone()).with_diff(diff))
    }

    async fn execute(&self, invocation: &ToolInvocation, _ctx: &ToolContext) -> ToolResult {
        let args = &invocation.arguments;
        let Some(file_path) = args.get("file_path").and_then(Value::as_str) else {
            return ToolResult::failure("file_path is required");
        };
        let Some(content) = args.get("content").and_then(Value::as_str) else {
            return ToolResult::failure("content is required");
        };

        let path = std::path::Path::new(file_path);
        if !path.is_absolute() {
            return ToolResult::failure("file_path must be an absolute path");
        }

        let is_new = !path.exists();
        let old_content = tokio::fs::read_to_string(path).await.unwrap_or_default();

        if let Some(parent) = path.parent() {
            if let Err(e) = tokio::fs::create_dir_all(parent).await {
                return ToolResult::failure(format!("I/O error: {e}"));
            }
        }

        if let Err(e) = tokio::fs::write(path, content).await {
            return ToolResult::failure(format!("I/O error: {e}"));
        }

        let bytes = content.len();
        let diff = if is_new {
            FileDiff::create(path.to_path_buf(), content)
        } else {
            FileDiff::edit(path.to_path_buf(), old_content, content)
        };

        ToolResult::success(format!("Wrote {bytes} bytes to {file_path}")).with_diff(diff)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn ctx() -> ToolContext {
        ToolContext::new(std::env::temp_dir())
    }

    fn invocation(args: Value) -> ToolInvocation {
        ToolInvocation::new(args, std::env::temp_dir())
    }

    #[tokio::test]
    async fn test_write_file_basic() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.txt");

        let result = WriteFileTool
            .execute(
                &invocation(serde_json::json!({
                    "file_path": path.to_str().unwrap(),
                    "content": "hello world"
                })),
                &ctx(),
            )
            .await;

        assert!(result.success);
        assert!(result.output.contains("11 bytes"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello world");
    }

    #[tokio::test]
    async fn test_write_file_creates_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a").join("b").join("c").join("test.txt");

        let result = WriteFileTool
            .execute(
                &invocation(serde_json::json!({
                    "file_path": path.to_str().unwrap(),
                    "content": "nested"
                })),
                &ctx(),
            )
            .await;

        assert!(result.success);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "nested");
    }

    #[tokio::test]
    async fn test_write_file_overwrites_and_carries_diff() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.txt");
        std::fs::write(&path, "old content").unwrap();

        let result = WriteFileTool
            .execute(
                &invocation(serde_json::json!({
                    "file_path": path.to_str().unwrap(),
                    "content": "new content"
                })),
                &ctx(),
            )
            .await;

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new content");
        let diff = result.diff.unwrap();
        assert!(!diff.is_new);
        assert_eq!(diff.old_content, "old content");
    }

    #[tokio::test]
    async fn test_write_file_missing_args() {
        let result = WriteFileTool
            .execute(
                &invocation(serde_json::json!({"file_path": "/tmp/test.txt"})),
                &ctx(),
            )
            .await;
        assert!(!result.success);
    }

    #[test]
    fn confirmation_includes_diff() {
        let invocation = invocation(serde_json::json!({
            "file_path": "/tmp/halcyon_confirm_test.txt",
            "content": "hello"
        }));
        let confirmation = WriteFileTool.get_confirmation(&invocation).unwrap();
        assert!(confirmation.diff.is_some());
    }
}
