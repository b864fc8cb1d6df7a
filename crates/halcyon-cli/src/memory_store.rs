//! Adapts [`halcyon_storage::JsonFileKvStore`] to the `MemoryStore` trait
//! the `memory` tool and the session's system-prompt builder program
//! against (spec §3: "memory ... serialised ... and also injected into
//! the next session's system prompt as a user-preferences block").

use std::collections::HashMap;

use halcyon_storage::{JsonFileKvStore, KvStore};
use halcyon_tools::MemoryStore;

/// Backs the `memory` built-in tool with the on-disk `user_memory.json`
/// key-value store.
pub struct KvMemoryStore {
    inner: JsonFileKvStore,
}

impl KvMemoryStore {
    /// Wrap a [`JsonFileKvStore`] rooted at the platform data directory.
    #[must_use]
    pub fn new(inner: JsonFileKvStore) -> Self {
        Self { inner }
    }
}

#[async_trait::async_trait]
impl MemoryStore for KvMemoryStore {
    async fn get(&self, key: &str) -> Option<String> {
        match self.inner.get(key).await {
            Ok(Some(value)) => value.as_str().map(str::to_owned).or_else(|| Some(value.to_string())),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(error = %e, key, "failed to read memory key");
                None
            },
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), String> {
        self.inner.set(key, serde_json::Value::String(value.to_owned())).await.map_err(|e| e.to_string())
    }

    async fn all(&self) -> HashMap<String, String> {
        match self.inner.all().await {
            Ok(entries) => entries
                .into_iter()
                .map(|(key, value)| {
                    let rendered = value.as_str().map(str::to_owned).unwrap_or_else(|| value.to_string());
                    (key, rendered)
                })
                .collect(),
            Err(e) => {
                tracing::warn!(error = %e, "failed to list memory keys");
                HashMap::new()
            },
        }
    }
}
