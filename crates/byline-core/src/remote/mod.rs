//! Remote draft repository contract.
//!
//! The hosted data service is an external collaborator; this module defines
//! the slice of its API the autosave engine consumes and the error taxonomy
//! the reconciliation protocol is built on.

mod http;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{DraftFields, DraftId};

pub use http::HttpDraftRepository;

/// Errors from the remote draft repository.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Network failure or server-side error; retried on the next tick
    #[error("Transient remote error: {0}")]
    Transient(String),

    /// The targeted draft no longer exists (e.g. concurrently deleted).
    /// Never silently recovered from: recreating could duplicate published
    /// content.
    #[error("Remote draft not found: {0}")]
    NotFound(String),
}

impl RemoteError {
    /// Whether retrying the same call on a later tick can succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

/// Result type for remote repository calls.
pub type RemoteResult<T> = std::result::Result<T, RemoteError>;

/// The draft-shaped slice of the hosted data service.
///
/// Calls are individually atomic; nothing more is assumed. The reconciliation
/// protocol stays safe under at-least-once delivery because a session never
/// issues a second create once bound to an id.
#[async_trait]
pub trait DraftRepository: Send + Sync {
    /// Create a new remote draft, returning its identifier.
    async fn create(&self, fields: &DraftFields) -> RemoteResult<DraftId>;

    /// Update an existing remote draft in place.
    async fn update(&self, id: &DraftId, fields: &DraftFields) -> RemoteResult<()>;

    /// Fetch the current remote field values for a draft.
    async fn fetch(&self, id: &DraftId) -> RemoteResult<DraftFields>;
}
