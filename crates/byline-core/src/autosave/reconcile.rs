//! Create-vs-update reconciliation against the remote draft repository.

use std::sync::Arc;

use crate::models::{DraftFields, DraftId, UploadState};
use crate::remote::{DraftRepository, RemoteResult};

/// Result of a successful reconciliation tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ReconcileOutcome {
    /// A remote draft was created; the session must bind to this id
    Created(DraftId),
    /// The bound remote draft was updated in place
    Updated,
}

/// Decides whether a tick creates or updates the remote draft.
///
/// The decision depends only on the binding: unbound sessions create once;
/// bound sessions always update. An update failure is never answered with a
/// create — the binding is permanent for the session's lifetime.
pub(crate) struct Reconciler {
    repo: Arc<dyn DraftRepository>,
}

impl Reconciler {
    pub(crate) fn new(repo: Arc<dyn DraftRepository>) -> Self {
        Self { repo }
    }

    pub(crate) async fn reconcile(
        &self,
        fields: &DraftFields,
        bound: Option<&DraftId>,
    ) -> RemoteResult<ReconcileOutcome> {
        match bound {
            None => {
                let id = self.repo.create(fields).await?;
                tracing::debug!("Created remote draft {id}");
                Ok(ReconcileOutcome::Created(id))
            }
            Some(id) => {
                self.repo.update(id, fields).await?;
                tracing::debug!("Updated remote draft {id}");
                Ok(ReconcileOutcome::Updated)
            }
        }
    }
}

/// Fold the most recently resolved upload into the outgoing payload.
///
/// `applied_at` is the resolution watermark already reflected in `fields`;
/// only a strictly newer resolution (by `resolved_at`, not arrival order)
/// replaces the image reference. Returns the new watermark.
pub(crate) fn fold_resolved_image(
    fields: &mut DraftFields,
    upload: &UploadState,
    applied_at: i64,
) -> i64 {
    match &upload.resolved {
        Some(resolved) if resolved.resolved_at > applied_at => {
            fields.image_reference = Some(resolved.reference.clone());
            resolved.resolved_at
        }
        _ => applied_at,
    }
}
