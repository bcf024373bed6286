//! Draft autosave and recovery engine.
//!
//! Keeps in-progress article edits durable across reloads, crashes, and
//! network interruptions by coordinating two persistence targets: a local
//! snapshot store written on a short debounce, and a remote draft record
//! synced on a fixed interval.
//!
//! Flow: construct a [`RecoveryManager`] for the editing surface first; if it
//! offers a pending snapshot, the user either recovers it (resuming any
//! remote binding) or discards it. Then start an [`AutosaveSession`] and feed
//! it edits; stop it on publish, discard, or navigation away.

mod reconcile;
mod recovery;
mod scheduler;
mod session;

pub use recovery::RecoveryManager;
pub use session::{AutosaveSession, SessionPhase};

use crate::models::{DraftFields, DraftId, DraftSnapshot};
use crate::snapshot::SnapshotKey;

/// How an editing session was entered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionMode {
    /// Composing a brand-new article
    NewArticle,
    /// Editing an existing draft; its persisted content is authoritative
    EditExisting(DraftId),
}

impl SessionMode {
    /// The local snapshot slot this mode's editing surface owns.
    pub(crate) fn snapshot_key(&self) -> SnapshotKey {
        match self {
            Self::NewArticle => SnapshotKey::NewArticle,
            Self::EditExisting(id) => SnapshotKey::Draft(*id),
        }
    }
}

/// Initial state for an [`AutosaveSession`].
#[derive(Debug, Clone)]
pub struct SessionStart {
    pub(crate) snapshot: DraftSnapshot,
    pub(crate) key: SnapshotKey,
}

impl SessionStart {
    /// Start composing a new article.
    #[must_use]
    pub fn new_article(fields: DraftFields) -> Self {
        Self {
            snapshot: DraftSnapshot::new(fields),
            key: SnapshotKey::NewArticle,
        }
    }

    /// Resume editing an existing remote draft.
    #[must_use]
    pub fn edit_existing(remote_id: DraftId, fields: DraftFields) -> Self {
        let mut snapshot = DraftSnapshot::new(fields);
        snapshot.remote_id = Some(remote_id);
        Self {
            snapshot,
            key: SnapshotKey::Draft(remote_id),
        }
    }

    /// Resume from a recovered snapshot (new-article surface only; recovery
    /// is never offered when editing an existing article).
    pub(crate) fn recovered(snapshot: DraftSnapshot) -> Self {
        Self {
            snapshot,
            key: SnapshotKey::NewArticle,
        }
    }

    /// The remote draft binding this session starts with, if any.
    #[must_use]
    pub fn remote_id(&self) -> Option<DraftId> {
        self.snapshot.remote_id
    }

    /// The field values this session starts with.
    #[must_use]
    pub fn fields(&self) -> &DraftFields {
        &self.snapshot.fields
    }
}
