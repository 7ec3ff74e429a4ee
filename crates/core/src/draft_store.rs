//! Durable key-value slot for offline drafts.
//!
//! When the backend cannot be reached, the editor serialises the whole form
//! into a single [`OfflineSnapshot`] stored under [`OFFLINE_DRAFT_KEY`]. A
//! second offline save overwrites the first.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::form_field::FormField;
use crate::types::{Id, Timestamp};

/// Slot key of the pending offline draft.
pub const OFFLINE_DRAFT_KEY: &str = "hsseq.form_builder.offline_draft";

/// Everything needed to resume editing after reconnecting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfflineSnapshot {
    pub form_id: Option<Id>,
    pub title: String,
    pub description: Option<String>,
    pub fields: Vec<FormField>,
    pub saved_at: Timestamp,
}

/// A string key-value store that survives restarts.
pub trait DraftStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, CoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), CoreError>;
    fn remove(&self, key: &str) -> Result<(), CoreError>;
}

/// Write `snapshot` to the offline slot, replacing any previous one.
pub fn save_snapshot(store: &dyn DraftStore, snapshot: &OfflineSnapshot) -> Result<(), CoreError> {
    let json = serde_json::to_string(snapshot)
        .map_err(|e| CoreError::Internal(format!("Failed to encode offline draft: {e}")))?;
    store.set(OFFLINE_DRAFT_KEY, &json)
}

/// Read the pending offline snapshot, if any.
pub fn load_snapshot(store: &dyn DraftStore) -> Result<Option<OfflineSnapshot>, CoreError> {
    let Some(json) = store.get(OFFLINE_DRAFT_KEY)? else {
        return Ok(None);
    };
    serde_json::from_str(&json)
        .map(Some)
        .map_err(|e| CoreError::MalformedInput(format!("Unreadable offline draft: {e}")))
}

pub fn clear_snapshot(store: &dyn DraftStore) -> Result<(), CoreError> {
    store.remove(OFFLINE_DRAFT_KEY)
}

// ---------------------------------------------------------------------------
// Implementations
// ---------------------------------------------------------------------------

/// Process-local store. Survives editor sessions, not restarts.
#[derive(Default)]
pub struct MemoryDraftStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryDraftStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DraftStore for MemoryDraftStore {
    fn get(&self, key: &str) -> Result<Option<String>, CoreError> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CoreError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), CoreError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        Ok(())
    }
}

/// One JSON file per key inside a directory.
///
/// Writes go to a temporary sibling file which is then renamed over the
/// target, so a crash never leaves a half-written draft behind.
pub struct FileDraftStore {
    dir: PathBuf,
}

impl FileDraftStore {
    /// Use (and create if needed) `dir` as the storage directory.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, CoreError> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir).map_err(|e| {
            CoreError::Internal(format!("Cannot create draft directory {}: {e}", dir.display()))
        })?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let file: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '_' { c } else { '-' })
            .collect();
        self.dir.join(format!("{file}.json"))
    }
}

impl DraftStore for FileDraftStore {
    fn get(&self, key: &str) -> Result<Option<String>, CoreError> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CoreError::Internal(format!("Failed to read draft '{key}': {e}"))),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CoreError> {
        let target = self.path_for(key);
        let tmp = target.with_extension("json.tmp");
        std::fs::write(&tmp, value)
            .and_then(|()| std::fs::rename(&tmp, &target))
            .map_err(|e| CoreError::Internal(format!("Failed to write draft '{key}': {e}")))
    }

    fn remove(&self, key: &str) -> Result<(), CoreError> {
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CoreError::Internal(format!("Failed to remove draft '{key}': {e}"))),
        }
    }
}
