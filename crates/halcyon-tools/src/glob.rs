//! Glob tool — finds files matching a glob pattern.

use std::fmt::Write;
use std::path::PathBuf;
use std::time::SystemTime;

use serde_json::Value;
use walkdir::WalkDir;

use crate::{Tool, ToolContext, ToolInvocation, ToolKind, ToolResult};

/// Built-in tool for finding files by glob pattern.
pub struct GlobTool;

#[async_trait::async_trait]
impl Tool for GlobTool {
    fn name(&self) -> &str {
        "glob"
    }

    fn description(&self) -> &str {
        "Finds files matching a glob pattern (e.g. \"**/*.rs\", \"src/**/*.ts\"). \
         Returns matching file paths sorted by modification time (most recent first)."
    }

    fn kind(&self) -> ToolKind {
        ToolKind::Read
    }

    fn schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "pattern": {
                    "type": "string",
                    "description": "Glob pattern to match files against"
                },
                "path": {
                    "type": "string",
                    "description": "Directory to search in (defaults to the invocation's working directory)"
                }
            },
            "required": ["pattern"]
        })
    }

    fn validate(&self, args: &Value) -> Vec<String> {
        if args.get("pattern").and_then(Value::as_str).is_none() {
            vec!["pattern is required".to_owned()]
        } else {
            Vec::new()
        }
    }

    async fn execute(&self, invocation: &ToolInvocation, _ctx: &ToolContext) -> ToolResult {
        let args = &invocation.arguments;
        let Some(pattern) = args.get("pattern").and_then(Value::as_str) else {
            return ToolResult::failure("pattern is required");
        };

        let search_dir = args
            .get("path")
            .and_then(Value::as_str)
            .map_or_else(|| invocation.working_directory.clone(), PathBuf::from);

        if !search_dir.exists() {
            return ToolResult::failure(format!("path not found: {}", search_dir.display()));
        }

        let search_dir = match search_dir.canonicalize() {
            Ok(dir) => dir,
            Err(e) => return ToolResult::failure(format!("I/O error: {e}")),
        };

        let glob = match globset::GlobBuilder::new(pattern).literal_separator(false).build() {
            Ok(g) => g.compile_matcher(),
            Err(e) => return ToolResult::failure(format!("invalid glob pattern: {e}")),
        };

        let mut matches: Vec<(PathBuf, SystemTime)> = Vec::new();

        for entry in WalkDir::new(&search_dir).follow_links(false).into_iter().filter_entry(|e| {
            if e.depth() == 0 {
                return true;
            }
            e.file_name().to_str().is_none_or(|s| !s.starts_with('.'))
        }) {
            let Ok(entry) = entry else { continue };

            if entry.file_type().is_dir() {
                continue;
            }

            let rel_path = entry.path().strip_prefix(&search_dir).unwrap_or(entry.path());

            if glob.is_match(rel_path) {
                let mtime = entry
                    .metadata()
                    .ok()
                    .and_then(|m| m.modified().ok())
                    .unwrap_or(SystemTime::UNIX_EPOCH);
                matches.push((entry.path().to_path_buf(), mtime));
            }
        }

        matches.sort_by(|a, b| b.1.cmp(&a.1));

        if matches.is_empty() {
            return ToolResult::success(format!("No files matching \"{pattern}\" found"));
        }

        let mut output = String::new();
        for (path, _) in &matches {
            output.push_str(&path.display().to_string());
            output.push('\n');
        }

        let _ = write!(output, "\n({} files matched)", matches.len());
        ToolResult::success(output).with_metadata("match_count", matches.len() as u64)
    }
}
