//! Durable local snapshot storage for in-progress drafts.
//!
//! Snapshots are keyed by editing surface: the new-article surface owns one
//! slot, and each remote-bound draft owns its own, so two in-progress edits
//! can never surface each other's recovery prompt.

mod file;

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::models::{DraftId, DraftSnapshot};

pub use file::FileSnapshotStore;

/// Identity of the editing surface a snapshot belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SnapshotKey {
    /// The single new-article composer surface
    NewArticle,
    /// A specific draft, once bound or when editing an existing one
    Draft(DraftId),
}

impl SnapshotKey {
    /// Stable storage slot name for this key.
    #[must_use]
    pub fn slot(&self) -> String {
        match self {
            Self::NewArticle => "draft-new".to_string(),
            Self::Draft(id) => format!("draft-{id}"),
        }
    }
}

/// Storage contract for local draft snapshots.
///
/// Writes are synchronous: by the time `save` returns, the snapshot is as
/// durable as the backing medium allows. Callers on the autosave path treat
/// failures as a degradation, not a fatal error.
pub trait SnapshotStore: Send + Sync {
    /// Persist a snapshot under the given key, replacing any previous one.
    fn save(&self, key: &SnapshotKey, snapshot: &DraftSnapshot) -> Result<()>;

    /// Load the last saved snapshot for the key, or `None`.
    fn load(&self, key: &SnapshotKey) -> Result<Option<DraftSnapshot>>;

    /// Remove the snapshot for the key. Removing a missing key is not an error.
    fn clear(&self, key: &SnapshotKey) -> Result<()>;
}

/// In-memory snapshot store (primarily for tests).
///
/// Values are kept serialized, mirroring what a real key/value cache holds.
#[derive(Default)]
pub struct MemorySnapshotStore {
    slots: Mutex<HashMap<String, String>>,
}

impl MemorySnapshotStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn save(&self, key: &SnapshotKey, snapshot: &DraftSnapshot) -> Result<()> {
        let serialized = serde_json::to_string(snapshot)?;
        self.slots.lock().insert(key.slot(), serialized);
        Ok(())
    }

    fn load(&self, key: &SnapshotKey) -> Result<Option<DraftSnapshot>> {
        let slots = self.slots.lock();
        let Some(raw) = slots.get(&key.slot()) else {
            return Ok(None);
        };
        let snapshot = serde_json::from_str(raw)
            .map_err(|error| Error::Snapshot(format!("corrupt snapshot: {error}")))?;
        Ok(Some(snapshot))
    }

    fn clear(&self, key: &SnapshotKey) -> Result<()> {
        self.slots.lock().remove(&key.slot());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DraftFields;
    use pretty_assertions::assert_eq;

    fn snapshot_with_title(title: &str) -> DraftSnapshot {
        DraftSnapshot::new(DraftFields {
            title: title.to_string(),
            ..DraftFields::default()
        })
    }

    #[test]
    fn save_load_clear_round_trip() {
        let store = MemorySnapshotStore::new();
        let key = SnapshotKey::NewArticle;

        assert!(store.load(&key).unwrap().is_none());

        let snapshot = snapshot_with_title("Hello");
        store.save(&key, &snapshot).unwrap();
        assert_eq!(store.load(&key).unwrap(), Some(snapshot));

        store.clear(&key).unwrap();
        assert!(store.load(&key).unwrap().is_none());
    }

    #[test]
    fn clear_missing_key_is_not_an_error() {
        let store = MemorySnapshotStore::new();
        store.clear(&SnapshotKey::NewArticle).unwrap();
    }

    #[test]
    fn keys_isolate_editing_surfaces() {
        let store = MemorySnapshotStore::new();
        let new_key = SnapshotKey::NewArticle;
        let draft_key = SnapshotKey::Draft(DraftId::new());

        store.save(&new_key, &snapshot_with_title("new")).unwrap();
        store
            .save(&draft_key, &snapshot_with_title("existing"))
            .unwrap();

        assert_eq!(store.load(&new_key).unwrap().unwrap().fields.title, "new");
        assert_eq!(
            store.load(&draft_key).unwrap().unwrap().fields.title,
            "existing"
        );

        store.clear(&new_key).unwrap();
        assert!(store.load(&new_key).unwrap().is_none());
        assert!(store.load(&draft_key).unwrap().is_some());
    }

    #[test]
    fn slot_names_are_distinct_per_draft() {
        let a = SnapshotKey::Draft(DraftId::new());
        let b = SnapshotKey::Draft(DraftId::new());
        assert_ne!(a.slot(), b.slot());
        assert_ne!(a.slot(), SnapshotKey::NewArticle.slot());
    }
}
