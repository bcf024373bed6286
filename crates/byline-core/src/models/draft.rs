//! Draft model: the fields of an in-progress article and the locally cached
//! snapshot that keeps them durable between remote syncs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::util::now_ms;

/// A unique identifier for a remote draft record, using UUID v7 (time-sortable)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DraftId(Uuid);

impl DraftId {
    /// Create a new unique draft ID using UUID v7
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for DraftId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DraftId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DraftId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// The editable fields of an article draft
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftFields {
    /// Article title
    pub title: String,
    /// Short description shown in article previews
    pub description: String,
    /// Article body
    pub content: String,
    /// Category slug
    pub category: String,
    /// Tags, order-preserving
    pub tags: Vec<String>,
    /// Reference to the cover image, if one has been uploaded
    pub image_reference: Option<String>,
}

impl DraftFields {
    /// Whether the draft has enough content to be worth syncing remotely.
    ///
    /// A draft with both title and content empty (whitespace-only counts as
    /// empty) never leaves the local machine.
    #[must_use]
    pub fn is_substantial(&self) -> bool {
        !self.title.trim().is_empty() || !self.content.trim().is_empty()
    }

    /// Validate the fields for a final publish or manual save.
    ///
    /// Autosave is permissive and never calls this; only the user-initiated
    /// publish path does.
    pub fn validate_for_publish(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(Error::InvalidInput(
                "Article title cannot be empty".to_string(),
            ));
        }
        if self.content.trim().is_empty() {
            return Err(Error::InvalidInput(
                "Article content cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Apply a partial edit, replacing only the fields the patch carries.
    pub fn apply(&mut self, patch: DraftPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(content) = patch.content {
            self.content = content;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(tags) = patch.tags {
            self.tags = tags;
        }
    }
}

/// A partial update to [`DraftFields`]; `None` leaves a field untouched.
///
/// The cover image is not patched here — it flows in through the upload path
/// (see [`UploadState`]).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DraftPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl DraftPatch {
    /// Patch carrying only a new title.
    #[must_use]
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    /// Patch carrying only new body content.
    #[must_use]
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }
}

/// An image reference resolved by the upload pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedImage {
    /// Opaque reference handed back by the upload service
    pub reference: String,
    /// When the upload resolved (Unix ms); recency decides merge order
    pub resolved_at: i64,
}

/// State of the concurrent cover-image upload, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadState {
    /// Whether an upload is currently running
    pub in_progress: bool,
    /// Progress of the running upload, 0-100
    pub progress_percent: u8,
    /// The most recently resolved image reference
    pub resolved: Option<ResolvedImage>,
}

impl UploadState {
    /// Record a resolved upload, keeping the most recent resolution.
    ///
    /// Recency is decided by `resolved_at`, not arrival order: a slow older
    /// upload that completes after a newer one must not overwrite it.
    pub fn resolve(&mut self, reference: impl Into<String>, resolved_at: i64) {
        self.in_progress = false;
        self.progress_percent = 100;

        let newer = self
            .resolved
            .as_ref()
            .is_none_or(|existing| resolved_at > existing.resolved_at);
        if newer {
            self.resolved = Some(ResolvedImage {
                reference: reference.into(),
                resolved_at,
            });
        }
    }
}

/// The locally cached copy of a draft's in-progress state: the unit of
/// durability across reloads, crashes, and network interruptions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftSnapshot {
    /// Remote draft binding; absent until the first successful remote create
    pub remote_id: Option<DraftId>,
    /// The draft's field values
    pub fields: DraftFields,
    /// Timestamp of the last local write (Unix ms)
    pub last_saved_at: i64,
    /// Concurrent upload state
    pub upload: UploadState,
}

impl DraftSnapshot {
    /// Create a fresh, unbound snapshot from initial field values.
    #[must_use]
    pub fn new(fields: DraftFields) -> Self {
        Self {
            remote_id: None,
            fields,
            last_saved_at: now_ms(),
            upload: UploadState::default(),
        }
    }

    /// Whether this snapshot is worth offering for recovery: it carries
    /// either meaningful content or a remote binding.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        self.fields.is_substantial() || self.remote_id.is_some()
    }
}
