//! Read file tool — reads a file with line numbers (cat -n style).

use std::fmt::Write;

use serde_json::Value;

use crate::{Tool, ToolContext, ToolInvocation, ToolKind, ToolResult};

/// Default maximum lines to read.
const DEFAULT_LINE_LIMIT: usize = 2000;
/// Maximum line length before truncation.
const MAX_LINE_LENGTH: usize = 2000;

/// Built-in tool for reading files.
pub struct ReadFileTool;

#[async_trait::async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &str {
        "read_file"
    }

    fn description(&self) -> &str {
        "Reads a file from the filesystem. Returns contents with line numbers (cat -n format). \
         Default reads up to 2000 lines. Use offset and limit for large files. \
         Lines longer than 2000 characters are truncated."
    }

    fn kind(&self) -> ToolKind {
        ToolKind::Read
    }

    fn schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "file_path": {
                    "type": "string",
                    "description": "Absolute path to the file to read"
                },
                "offset": {
                    "type": "integer",
                    "description": "Line number to start reading from (1-based). Only provide for large files."
                },
                "limit": {
                    "type": "integer",
                    "description": "Number of lines to read. Only provide for large files."
                }
            },
            "required": ["file_path"]
        })
    }

    fn validate(&self, args: &Value) -> Vec<String> {
        let mut errors = Vec::new();
        if args.get("file_path").and_then(Value::as_str).is_none() {
            errors.push("file_path is required".to_owned());
        }
        errors
    }

    async fn execute(&self, invocation: &ToolInvocation, _ctx: &ToolContext) -> ToolResult {
        let args = &invocation.arguments;
        let Some(file_path) = args.get("file_path").and_then(Value::as_str) else {
            return ToolResult::failure("file_path is required");
        };

        let offset = args
            .get("offset")
            .and_then(Value::as_u64)
            .map(|v| usize::try_from(v).unwrap_or(usize::MAX));

        let limit = args
            .get("limit")
            .and_then(Value::as_u64)
            .map_or(DEFAULT_LINE_LIMIT, |v| {
                usize::try_from(v).unwrap_or(usize::MAX)
            });

        let path = std::path::Path::new(file_path);
        if !path.exists() {
            return ToolResult::failure(format!("path not found: {file_path}"));
        }

        let raw = match tokio::fs::read(path).await {
            Ok(raw) => raw,
            Err(e) => return ToolResult::failure(format!("I/O error: {e}")),
        };

        let check_len = raw.len().min(8192);
        if raw[..check_len].contains(&0) {
            return ToolResult::failure(format!("{file_path} appears to be a binary file"));
        }

        let content = match String::from_utf8(raw) {
            Ok(content) => content,
            Err(_) => return ToolResult::failure(format!("{file_path} is not valid UTF-8")),
        };

        let lines: Vec<&str> = content.lines().collect();
        let total_lines = lines.len();

        let start = offset.map_or(0, |o| o.saturating_sub(1));
        let end = start.saturating_add(limit).min(total_lines);

        if start >= total_lines {
            return ToolResult::success(format!(
                "(file has {total_lines} lines, offset {start} is past end)"
            ));
        }

        let mut output = String::new();
        for (idx, &line) in lines[start..end].iter().enumerate() {
            let line_num = start + idx + 1;
            let display_line = if line.len() > MAX_LINE_LENGTH {
                &line[..MAX_LINE_LENGTH]
            } else {
                line
            };
            let _ = writeln!(output, "{line_num:>6}\t{display_line}");
        }

        if end < total_lines {
            let _ = write!(
                output,
                "\n(showing lines {}-{} of {total_lines}; use offset/limit for more)",
                start.saturating_add(1),
                end
            );
        }

        ToolResult::success(output).with_metadata("total_lines", total_lines as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as IoWrite;
    use tempfile::NamedTempFile;

    fn ctx() -> ToolContext {
        ToolContext::new(std::env::temp_dir())
    }

    fn invocation(args: Value) -> ToolInvocation {
        ToolInvocation::new(args, std::env::temp_dir())
    }

    #[tokio::test]
    async fn test_read_file_basic() {
        let mut f = NamedTempFile::new().unwrap();
        writeln!(f, "line one").unwrap();
        writeln!(f, "line two").unwrap();
        writeln!(f, "line three").unwrap();

        let result = ReadFileTool
            .execute(
                &invocation(serde_json::json!({"file_path": f.path().to_str().unwrap()})),
                &ctx(),
            )
            .await;

        assert!(result.success);
        assert!(result.output.contains("line one"));
        assert!(result.output.contains("     1\t"));
        assert!(result.output.contains("     3\t"));
    }

    #[tokio::test]
    async fn test_read_file_not_found() {
        let result = ReadFileTool
            .execute(
                &invocation(serde_json::json!({"file_path": "/tmp/halcyon_nonexistent_12345.txt"})),
                &ctx(),
            )
            .await;

        assert!(!result.success);
        assert!(result.error.unwrap().contains("not found"));
    }

    #[tokio::test]
    async fn test_read_file_with_offset_and_limit() {
        let mut f = NamedTempFile::new().unwrap();
        for i in 1..=20 {
            writeln!(f, "line {i}").unwrap();
        }

        let result = ReadFileTool
            .execute(
                &invocation(serde_json::json!({
                    "file_path": f.path().to_str().unwrap(),
                    "offset": 5,
                    "limit": 3
                })),
                &ctx(),
            )
            .await;

        assert!(result.output.contains("     5\t"));
        assert!(result.output.contains("line 7"));
        assert!(!result.output.contains("line 8"));
    }

    #[tokio::test]
    async fn test_read_binary_file() {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(&[0x00, 0x01, 0x02, 0xFF]).unwrap();

        let result = ReadFileTool
            .execute(
                &invocation(serde_json::json!({"file_path": f.path().to_str().unwrap()})),
                &ctx(),
            )
            .await;

        assert!(!result.success);
        assert!(result.error.unwrap().contains("binary file"));
    }

    #[tokio::test]
    async fn test_read_file_missing_arg() {
        let result = ReadFileTool
            .execute(&invocation(serde_json::json!({})), &ctx())
            .await;

        assert!(!result.success);
    }
}
