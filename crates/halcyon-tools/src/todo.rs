//! Todo tools — an ephemeral per-session task list the model uses to track
//! its own multi-step plans (spec §3 "Plan / Todos / Memory").

use std::fmt::Write;

use serde_json::Value;

use crate::context::{TodoItem, TodoStatus};
use crate::{Tool, ToolContext, ToolInvocation, ToolKind, ToolResult};

/// Replaces the entire todo list with a new one.
pub struct TodoWriteTool;

#[async_trait::async_trait]
impl Tool for TodoWriteTool {
    fn name(&self) -> &str {
        "todo_write"
    }

    fn description(&self) -> &str {
        "Replaces the current session's todo list. Use to plan and track progress on \
         multi-step tasks. Each item has content and a status of pending, in_progress, \
         or completed."
    }

    fn kind(&self) -> ToolKind {
        ToolKind::Memory
    }

    fn schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "todos": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "content": {"type": "string"},
                            "status": {"type": "string", "enum": ["pending", "in_progress", "completed"]}
                        },
                        "required": ["content", "status"]
                    }
                }
            },
            "required": ["todos"]
        })
    }

    fn validate(&self, args: &Value) -> Vec<String> {
        if args.get("todos").and_then(Value::as_array).is_none() {
            vec!["todos must be an array".to_owned()]
        } else {
            Vec::new()
        }
    }

    async fn execute(&self, invocation: &ToolInvocation, ctx: &ToolContext) -> ToolResult {
        let Some(items) = invocation.arguments.get("todos").and_then(Value::as_array) else {
            return ToolResult::failure("todos must be an array");
        };

        let mut parsed = Vec::with_capacity(items.len());
        for item in items {
            let Some(content) = item.get("content").and_then(Value::as_str) else {
                return ToolResult::failure("each todo requires a content string");
            };
            let status = match item.get("status").and_then(Value::as_str) {
                Some("pending") => TodoStatus::Pending,
                Some("in_progress") => TodoStatus::InProgress,
                Some("completed") => TodoStatus::Completed,
                _ => return ToolResult::failure("status must be pending, in_progress, or completed"),
            };
            parsed.push(TodoItem { content: content.to_owned(), status });
        }

        let count = parsed.len();
        *ctx.todos().write().await = parsed;
        ToolResult::success(format!("todo list updated ({count} items)"))
    }
}

/// Reads back the current session's todo list.
pub struct TodoReadTool;

#[async_trait::async_trait]
impl Tool for TodoReadTool {
    fn name(&self) -> &str {
        "todo_read"
    }

    fn description(&self) -> &str {
        "Reads the current session's todo list."
    }

    fn kind(&self) -> ToolKind {
        ToolKind::Read
    }

    fn schema(&self) -> Value {
        serde_json::json!({"type": "object", "properties": {}})
    }

    async fn execute(&self, _invocation: &ToolInvocation, ctx: &ToolContext) -> ToolResult {
        let todos = ctx.todos().read().await;
        if todos.is_empty() {
            return ToolResult::success("(no todos)");
        }
        let mut output = String::new();
        for item in todos.iter() {
            let marker = match item.status {
                TodoStatus::Pending => "[ ]",
                TodoStatus::InProgress => "[~]",
                TodoStatus::Completed => "[x]",
            };
            let _ = writeln!(output, "{marker} {}", item.content);
        }
        ToolResult::success(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> ToolContext {
        ToolContext::new(std::env::temp_dir())
    }

    fn invocation(args: Value) -> ToolInvocation {
        ToolInvocation::new(args, std::env::temp_dir())
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let context = ctx();
        let write_result = TodoWriteTool
            .execute(
                &invocation(serde_json::json!({
                    "todos": [{"content": "do thing", "status": "pending"}]
                })),
                &context,
            )
            .await;
        assert!(write_result.success);

        let read_result = TodoReadTool.execute(&invocation(serde_json::json!({})), &context).await;
        assert!(read_result.output.contains("do thing"));
        assert!(read_result.output.contains("[ ]"));
    }

    #[tokio::test]
    async fn test_read_empty() {
        let result = TodoReadTool.execute(&invocation(serde_json::json!({})), &ctx()).await;
        assert!(result.output.contains("no todos"));
    }

    #[tokio::test]
    async fn test_write_rejects_bad_status() {
        let result = TodoWriteTool
            .execute(
                &invocation(serde_json::json!({"todos": [{"content": "x", "status": "nope"}]})),
                &ctx(),
            )
            .await;
        assert!(!result.success);
    }

    #[tokio::test]
    async fn test_write_replaces_previous_list() {
        let context = ctx();
        TodoWriteTool
            .execute(
                &invocation(serde_json::json!({"todos": [{"content": "first", "status": "pending"}]})),
                &context,
            )
            .await;
        TodoWriteTool
            .execute(
                &invocation(serde_json::json!({"todos": [{"content": "second", "status": "completed"}]})),
                &context,
            )
            .await;

        let read_result = TodoReadTool.execute(&invocation(serde_json::json!({})), &context).await;
        assert!(!read_result.output.contains("first"));
        assert!(read_result.output.contains("second"));
    }
}
