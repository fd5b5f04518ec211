//! Storage interfaces and implementations for persisting safety state.

mod json;
pub(crate) mod timestamp;

pub use json::{JsonSnapshotStore, read_json, write_json_atomic};

use crate::safety::SafetySnapshot;

/// SnapshotStore defines the interface for persisting the daily safety snapshot.
pub trait SnapshotStore: Send + Sync {
    /// Load returns the last persisted snapshot, or `None` if nothing was saved yet.
    fn load(&self) -> Result<Option<SafetySnapshot>, StorageError>;

    /// Save durably replaces the persisted snapshot.
    /// Must not return before the data is on storage.
    fn save(&self, snapshot: &SafetySnapshot) -> Result<(), StorageError>;

    /// Human-readable location, used in logs.
    fn location(&self) -> String;
}

/// StorageError represents errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid data: {0}")]
    Json(#[from] serde_json::Error),
}
