//! Memory tools — persisted key-value user-preferences store (spec §3).
//!
//! Backed by whatever [`MemoryStore`] the session injected into the
//! [`ToolContext`]; the concrete implementation (atomic write-to-temp-then-
//! rename over `user_memory.json`) lives in `halcyon-storage`.

use serde_json::Value;

use crate::{Tool, ToolContext, ToolInvocation, ToolKind, ToolResult};

/// Fetches a single value from persisted memory.
pub struct MemoryGetTool;

#[async_trait::async_trait]
impl Tool for MemoryGetTool {
    fn name(&self) -> &str {
        "memory_get"
    }

    fn description(&self) -> &str {
        "Fetches a value from persisted cross-session memory by key."
    }

    fn kind(&self) -> ToolKind {
        ToolKind::Read
    }

    fn schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "key": {"type": "string", "description": "Memory key to look up"}
            },
            "required": ["key"]
        })
    }

    fn validate(&self, args: &Value) -> Vec<String> {
        if args.get("key").and_then(Value::as_str).is_none() {
            vec!["key is required".to_owned()]
        } else {
            Vec::new()
        }
    }

    async fn execute(&self, invocation: &ToolInvocation, ctx: &ToolContext) -> ToolResult {
        let Some(key) = invocation.arguments.get("key").and_then(Value::as_str) else {
            return ToolResult::failure("key is required");
        };

        let Some(memory) = ctx.memory() else {
            return ToolResult::failure("no memory store configured for this session");
        };

        match memory.get(key).await {
            Some(value) => ToolResult::success(value),
            None => ToolResult::success(format!("(no memory entry for \"{key}\")")),
        }
    }
}

/// Sets a value in persisted memory, overwriting any existing entry.
pub struct MemorySetTool;

#[async_trait::async_trait]
impl Tool for MemorySetTool {
    fn name(&self) -> &str {
        "memory_set"
    }

    fn description(&self) -> &str {
        "Sets a value in persisted cross-session memory. Overwrites any existing value for \
         the key. Injected into the system prompt of future sessions as user preferences."
    }

    fn kind(&self) -> ToolKind {
        ToolKind::Memory
    }

    fn schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "key": {"type": "string"},
                "value": {"type": "string"}
            },
            "required": ["key", "value"]
        })
    }

    fn validate(&self, args: &Value) -> Vec<String> {
        let mut errors = Vec::new();
        if args.get("key").and_then(Value::as_str).is_none() {
            errors.push("key is required".to_owned());
        }
        if args.get("value").and_then(Value::as_str).is_none() {
            errors.push("value is required".to_owned());
        }
        errors
    }

    async fn execute(&self, invocation: &ToolInvocation, ctx: &ToolContext) -> ToolResult {
        let args = &invocation.arguments;
        let (Some(key), Some(value)) = (
            args.get("key").and_then(Value::as_str),
            args.get("value").and_then(Value::as_str),
        ) else {
            return ToolResult::failure("key and value are required");
        };

        let Some(memory) = ctx.memory() else {
            return ToolResult::failure("no memory store configured for this session");
        };

        match memory.set(key, value).await {
            Ok(()) => ToolResult::success(format!("remembered \"{key}\"")),
            Err(e) => ToolResult::failure(format!("failed to persist memory: {e}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::MemoryStore;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::RwLock;

    struct FakeStore(RwLock<HashMap<String, String>>);

    #[async_trait::async_trait]
    impl MemoryStore for FakeStore {
        async fn get(&self, key: &str) -> Option<String> {
            self.0.read().await.get(key).cloned()
        }

        async fn set(&self, key: &str, value: &str) -> Result<(), String> {
            self.0.write().await.insert(key.to_owned(), value.to_owned());
            Ok(())
        }

        async fn all(&self) -> HashMap<String, String> {
            self.0.read().await.clone()
        }
    }

    fn ctx_with_memory() -> ToolContext {
        ToolContext::new(std::env::temp_dir()).with_memory(Arc::new(FakeStore(RwLock::new(HashMap::new()))))
    }

    fn invocation(args: Value) -> ToolInvocation {
        ToolInvocation::new(args, std::env::temp_dir())
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let ctx = ctx_with_memory();
        let set_result = MemorySetTool
            .execute(
                &invocation(serde_json::json!({"key": "name", "value": "astrid"})),
                &ctx,
            )
            .await;
        assert!(set_result.success);

        let get_result = MemoryGetTool
            .execute(&invocation(serde_json::json!({"key": "name"})), &ctx)
            .await;
        assert_eq!(get_result.output, "astrid");
    }

    #[tokio::test]
    async fn test_get_missing_key() {
        let ctx = ctx_with_memory();
        let result = MemoryGetTool
            .execute(&invocation(serde_json::json!({"key": "missing"})), &ctx)
            .await;
        assert!(result.output.contains("no memory entry"));
    }

    #[tokio::test]
    async fn test_no_store_configured() {
        let ctx = ToolContext::new(std::env::temp_dir());
        let result = MemoryGetTool
            .execute(&invocation(serde_json::json!({"key": "x"})), &ctx)
            .await;
        assert!(!result.success);
    }
}
