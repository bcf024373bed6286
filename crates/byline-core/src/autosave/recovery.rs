//! Recovery of locally cached drafts at session start.

use std::sync::Arc;

use crate::error::Result;
use crate::models::{DraftFields, DraftSnapshot};
use crate::remote::DraftRepository;
use crate::snapshot::{SnapshotKey, SnapshotStore};
use crate::util::{format_relative_time, now_ms};

use super::{SessionMode, SessionStart};

/// Inspects the local snapshot for an editing surface before a session
/// starts and offers recovery or discard.
///
/// Recovery is only ever offered for the new-article surface. When editing
/// an existing article the persisted content is authoritative, so any local
/// snapshot is ignored (left in place, since under keyed storage it belongs
/// to that draft's own surface).
pub struct RecoveryManager {
    store: Arc<dyn SnapshotStore>,
    key: SnapshotKey,
    pending: Option<DraftSnapshot>,
}

impl RecoveryManager {
    /// Load and filter the surface's snapshot according to the session mode.
    pub fn inspect(store: Arc<dyn SnapshotStore>, mode: &SessionMode) -> Result<Self> {
        let key = mode.snapshot_key();
        let pending = match mode {
            SessionMode::EditExisting(_) => None,
            SessionMode::NewArticle => store.load(&key)?.filter(DraftSnapshot::is_recoverable),
        };

        if let Some(snapshot) = &pending {
            tracing::debug!(
                "Found recoverable draft snapshot (remote binding: {:?})",
                snapshot.remote_id
            );
        }

        Ok(Self {
            store,
            key,
            pending,
        })
    }

    /// Whether a recoverable snapshot is waiting for a decision.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// The pending snapshot, if any.
    #[must_use]
    pub fn pending_snapshot(&self) -> Option<&DraftSnapshot> {
        self.pending.as_ref()
    }

    /// Human-readable age of the pending snapshot ("edited 5m ago").
    #[must_use]
    pub fn message(&self) -> Option<String> {
        self.pending
            .as_ref()
            .map(|snapshot| format!("edited {}", format_relative_time(snapshot.last_saved_at, now_ms())))
    }

    /// Adopt the pending snapshot: the returned start resumes its fields and,
    /// if one was bound, its remote draft id.
    #[must_use]
    pub fn recover(self) -> Option<SessionStart> {
        self.pending.map(SessionStart::recovered)
    }

    /// Reject the pending snapshot: clears the surface's local slot so a
    /// fresh session starts with no remote binding.
    pub fn discard(self) -> Result<()> {
        self.store.clear(&self.key)
    }

    /// Fetch the remote copy of a pending remote-bound snapshot.
    ///
    /// For callers that suspect the local cache is stale (e.g. the previous
    /// session was degraded to remote-only). Returns `None` when the pending
    /// snapshot has no remote binding.
    pub async fn remote_copy(&self, repo: &dyn DraftRepository) -> Result<Option<DraftFields>> {
        let Some(id) = self.pending.as_ref().and_then(|snapshot| snapshot.remote_id) else {
            return Ok(None);
        };
        Ok(Some(repo.fetch(&id).await?))
    }
}
