//! halcyon-storage — key-value persistence and session snapshot storage
//! (spec §4.13).

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod kv;
pub mod session;

pub use error::{StorageError, StorageResult};
pub use kv::{JsonFileKvStore, KvStore};
pub use session::{PersistenceManager, SessionSnapshot, SessionSummary};
