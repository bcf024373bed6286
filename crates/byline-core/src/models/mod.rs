//! Data models for Byline

mod draft;
mod reaction;

pub use draft::{DraftFields, DraftId, DraftPatch, DraftSnapshot, ResolvedImage, UploadState};
pub use reaction::{Reaction, ReactionKind};
