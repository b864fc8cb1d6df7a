//! Grep tool — regex search across files.

use std::fmt::Write;
use std::path::PathBuf;

use regex::Regex;
use serde_json::Value;
use walkdir::WalkDir;

use crate::{Tool, ToolContext, ToolInvocation, ToolKind, ToolResult};

/// Maximum number of matching lines returned before truncation.
const MAX_MATCHES: usize = 500;

/// Built-in tool for regex search across files.
pub struct GrepTool;

#[async_trait::async_trait]
impl Tool for GrepTool {
    fn name(&self) -> &str {
        "grep"
    }

    fn description(&self) -> &str {
        "Searches file contents for a regular expression. Returns matching lines with file path \
         and line number. Supports an optional glob filter and a path to search under."
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
                    "description": "Regular expression to search for"
                },
                "path": {
                    "type": "string",
                    "description": "Directory to search in (defaults to the invocation's working directory)"
                },
                "glob": {
                    "type": "string",
                    "description": "Only search files matching this glob (e.g. \"*.rs\")"
                },
                "case_insensitive": {
                    "type": "boolean",
                    "description": "Case-insensitive match"
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

        let case_insensitive = args.get("case_insensitive").and_then(Value::as_bool).unwrap_or(false);
        let regex_src = if case_insensitive {
            format!("(?i){pattern}")
        } else {
            pattern.to_owned()
        };
        let regex = match Regex::new(&regex_src) {
            Ok(r) => r,
            Err(e) => return ToolResult::failure(format!("invalid regex: {e}")),
        };

        let search_dir = args
            .get("path")
            .and_then(Value::as_str)
            .map_or_else(|| invocation.working_directory.clone(), PathBuf::from);

        if !search_dir.exists() {
            return ToolResult::failure(format!("path not found: {}", search_dir.display()));
        }

        let glob_filter = match args.get("glob").and_then(Value::as_str) {
            Some(g) => match globset::Glob::new(g) {
                Ok(glob) => Some(glob.compile_matcher()),
                Err(e) => return ToolResult::failure(format!("invalid glob pattern: {e}")),
            },
            None => None,
        };

        let mut output = String::new();
        let mut match_count = 0usize;
        let mut truncated = false;

        'outer: for entry in WalkDir::new(&search_dir).follow_links(false).into_iter().filter_entry(|e| {
            e.depth() == 0 || e.file_name().to_str().is_none_or(|s| !s.starts_with('.'))
        }) {
            let Ok(entry) = entry else { continue };
            if !entry.file_type().is_file() {
                continue;
            }

            if let Some(ref matcher) = glob_filter {
                let rel = entry.path().strip_prefix(&search_dir).unwrap_or(entry.path());
                if !matcher.is_match(rel) {
                    continue;
                }
            }

            let Ok(content) = tokio::fs::read_to_string(entry.path()).await else {
                continue;
            };

            for (idx, line) in content.lines().enumerate() {
                if regex.is_match(line) {
                    if match_count >= MAX_MATCHES {
                        truncated = true;
                        break 'outer;
                    }
                    let _ = writeln!(
                        output,
                        "{}:{}:{}",
                        entry.path().display(),
                        idx + 1,
                        line.trim_end()
                    );
                    match_count += 1;
                }
            }
        }

        if match_count == 0 {
            return ToolResult::success(format!("No matches for \"{pattern}\""));
        }

        if truncated {
            let _ = write!(output, "\n... (truncated at {MAX_MATCHES} matches)");
        }

        ToolResult::success(output)
            .with_metadata("match_count", match_count as u64)
            .with_truncated(truncated)
    }
}
