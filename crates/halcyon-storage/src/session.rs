//! Session snapshots and checkpoints (spec §4.13).
//!
//! Grounded on the `SessionStore` API shape documented in the teacher's
//! `astrid-runtime` crate docs: `from_home`, `save`, `load`,
//! `list_with_metadata`, and checkpoint ids of the form `<id>_<timestamp>`.

use std::path::{Path, PathBuf};

use halcyon_core::types::{SessionId, Timestamp, TokenUsage};
use halcyon_llm::types::Message;
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::error::{StorageError, StorageResult};
use crate::kv::write_json_atomic;

/// A serialised conversation at a point in time (spec §4.13: "serialises
/// (id, created/updated, turn count, messages in wire-form, cumulative
/// usage) to JSON").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Session identifier.
    pub id: SessionId,
    /// When the session was first created.
    pub created_at: Timestamp,
    /// When this snapshot was taken.
    pub updated_at: Timestamp,
    /// Number of turns completed so far.
    pub turn_count: u64,
    /// Full message history, in wire form.
    pub messages: Vec<Message>,
    /// Cumulative token usage across the session.
    pub usage: TokenUsage,
}

/// Metadata surfaced by `/sessions` without loading the full message history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Session identifier.
    pub id: SessionId,
    /// When this snapshot was taken.
    pub updated_at: Timestamp,
    /// Number of turns completed so far.
    pub turn_count: u64,
}

impl From<&SessionSnapshot> for SessionSummary {
    fn from(snapshot: &SessionSnapshot) -> Self {
        Self { id: snapshot.id.clone(), updated_at: snapshot.updated_at, turn_count: snapshot.turn_count }
    }
}

/// Owns the `sessions/` and `checkpoints/` directories under the platform
/// data directory and provides save/load/list over both.
#[derive(Debug, Clone)]
pub struct PersistenceManager {
    sessions_dir: PathBuf,
    checkpoints_dir: PathBuf,
}

impl PersistenceManager {
    /// Build a manager rooted at the platform data directory (spec §4.13:
    /// "ensures sessions/ and checkpoints/ under the platform data
    /// directory exist").
    pub fn from_home() -> StorageResult<Self> {
        Ok(Self { sessions_dir: halcyon_core::dirs::sessions_dir()?, checkpoints_dir: halcyon_core::dirs::checkpoints_dir()? })
    }

    /// Build a manager rooted at an arbitrary directory (tests, custom data
    /// directories).
    #[must_use]
    pub fn at(root: &Path) -> Self {
        Self { sessions_dir: root.join("sessions"), checkpoints_dir: root.join("checkpoints") }
    }

    fn session_path(&self, id: &SessionId) -> PathBuf {
        self.sessions_dir.join(format!("{id}.json"))
    }

    fn checkpoint_path(&self, checkpoint_id: &str) -> PathBuf {
        self.checkpoints_dir.join(format!("{checkpoint_id}.json"))
    }

    /// Persist a session snapshot, overwriting any prior snapshot for the
    /// same id.
    pub async fn save(&self, snapshot: &SessionSnapshot) -> StorageResult<()> {
        write_json_atomic(&self.session_path(&snapshot.id), snapshot).await
    }

    /// Load a session snapshot by id.
    pub async fn load(&self, id: &SessionId) -> StorageResult<SessionSnapshot> {
        read_snapshot(&self.session_path(id)).await
    }

    /// List every saved session, most-recently-updated first (spec §4.13:
    /// "sorted by updated-at descending").
    pub async fn list(&self) -> StorageResult<Vec<SessionSummary>> {
        let mut summaries = Vec::new();
        let mut entries = match fs::read_dir(&self.sessions_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        while let Some(entry) = entries.next_entry().await? {
            if entry.path().extension().and_then(std::ffi::OsStr::to_str) != Some("json") {
                continue;
            }
            let snapshot = read_snapshot(&entry.path()).await?;
            summaries.push(SessionSummary::from(&snapshot));
        }
        summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(summaries)
    }

    /// Save a checkpoint. The checkpoint id is `<sessionId>_<timestamp>`
    /// (spec §4.13), returned so the caller (e.g. `/checkpoint`) can report
    /// it back to the user.
    pub async fn save_checkpoint(&self, snapshot: &SessionSnapshot) -> StorageResult<String> {
        let checkpoint_id = format!("{}_{}", snapshot.id, checkpoint_timestamp(snapshot.updated_at));
        write_json_atomic(&self.checkpoint_path(&checkpoint_id), snapshot).await?;
        Ok(checkpoint_id)
    }

    /// Load a checkpoint by its full id.
    pub async fn load_checkpoint(&self, checkpoint_id: &str) -> StorageResult<SessionSnapshot> {
        read_snapshot(&self.checkpoint_path(checkpoint_id)).await
    }
}

/// Render a timestamp as an ISO-like, filesystem-safe token (colons are not
/// valid in Windows file names).
fn checkpoint_timestamp(ts: Timestamp) -> String {
    ts.0.format("%Y%m%dT%H%M%S").to_string()
}

async fn read_snapshot(path: &Path) -> StorageResult<SessionSnapshot> {
    match fs::read(path).await {
        Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(StorageError::NotFound(path.display().to_string()))
        },
        Err(e) => Err(e.into()),
    }
}
