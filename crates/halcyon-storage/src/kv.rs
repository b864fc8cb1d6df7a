//! Key-value persistence for `user_memory.json` (spec §4.13, §6).
//!
//! Grounded on `astrid-storage`'s `KvStore` trait shape (get/set/delete over
//! a namespaced store) — the teacher backs this with an embedded
//! `SurrealKV` LSM tree; SPEC_FULL.md resolves the simpler single-file need
//! here to a JSON document written atomically via temp-file-then-rename.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tokio::fs;

use crate::error::StorageResult;

/// Minimal async key-value contract the `memory` tool programs against.
#[async_trait::async_trait]
pub trait KvStore: Send + Sync {
    /// Fetch a value by key.
    async fn get(&self, key: &str) -> StorageResult<Option<Value>>;

    /// Set a value.
    async fn set(&self, key: &str, value: Value) -> StorageResult<()>;

    /// Remove a value, if present.
    async fn delete(&self, key: &str) -> StorageResult<()>;
}

/// A `KvStore` backed by a single JSON file, written atomically.
///
/// Every write reads the whole document, mutates one key, and rewrites it
/// via a sibling temp file renamed into place — adequate for the small,
/// low-frequency `user_memory.json` use case (spec §6: `memory` tool).
#[derive(Debug, Clone)]
pub struct JsonFileKvStore {
    path: PathBuf,
}

impl JsonFileKvStore {
    /// Build a store backed by `path`. The file is created lazily on first
    /// write; reads against a missing file see an empty store.
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    async fn read_all(&self) -> StorageResult<BTreeMap<String, Value>> {
        match fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_all(&self, map: &BTreeMap<String, Value>) -> StorageResult<()> {
        write_json_atomic(&self.path, map).await
    }

    /// Every key-value pair currently stored, for callers (the `memory`
    /// tool's `MemoryStore` adapter) that need to enumerate the whole
    /// store rather than look up one key.
    pub async fn all(&self) -> StorageResult<BTreeMap<String, Value>> {
        self.read_all().await
    }
}

#[async_trait::async_trait]
impl KvStore for JsonFileKvStore {
    async fn get(&self, key: &str) -> StorageResult<Option<Value>> {
        let map = self.read_all().await?;
        Ok(map.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> StorageResult<()> {
        let mut map = self.read_all().await?;
        map.insert(key.to_owned(), value);
        self.write_all(&map).await
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        let mut map = self.read_all().await?;
        map.remove(key);
        self.write_all(&map).await
    }
}

/// Serialise `value` to pretty JSON and write it to `path` atomically: a
/// sibling `.tmp` file is written and fsynced, then renamed over `path` so
/// readers never observe a partial write.
pub(crate) async fn write_json_atomic<T: serde::Serialize + Sync>(path: &Path, value: &T) -> StorageResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    let bytes = serde_json::to_vec_pretty(value)?;
    let tmp_path = path.with_extension("tmp");
    let mut file = fs::File::create(&tmp_path).await?;
    tokio::io::AsyncWriteExt::write_all(&mut file, &bytes).await?;
    tokio::io::AsyncWriteExt::flush(&mut file).await?;
    file.sync_all().await?;
    fs::rename(&tmp_path, path).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileKvStore::new(dir.path().join("user_memory.json"));
        assert_eq!(store.get("key").await.unwrap(), None);
    }

    #[tokio::test]
    async fn set_then_get_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileKvStore::new(dir.path().join("user_memory.json"));
        store.set("favorite_color", Value::String("teal".into())).await.unwrap();
        assert_eq!(store.get("favorite_color").await.unwrap(), Some(Value::String("teal".into())));
    }

    #[tokio::test]
    async fn delete_removes_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileKvStore::new(dir.path().join("user_memory.json"));
        store.set("k", Value::Bool(true)).await.unwrap();
        store.delete("k").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn writes_survive_across_store_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("user_memory.json");
        JsonFileKvStore::new(path.clone()).set("k", Value::from(42)).await.unwrap();
        let reopened = JsonFileKvStore::new(path);
        assert_eq!(reopened.get("k").await.unwrap(), Some(Value::from(42)));
    }
}
