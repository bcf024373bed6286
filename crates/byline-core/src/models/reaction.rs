//! Reaction model: one row per user per target per kind.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// The kind of reaction a user can place on published content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReactionKind {
    /// A like on an article or comment
    Like,
    /// A bookmark/favorite on an article
    Favorite,
}

impl ReactionKind {
    /// Stable storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Like => "like",
            Self::Favorite => "favorite",
        }
    }
}

impl fmt::Display for ReactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReactionKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "like" => Ok(Self::Like),
            "favorite" => Ok(Self::Favorite),
            other => Err(Error::InvalidInput(format!(
                "Unknown reaction kind: {other}"
            ))),
        }
    }
}

/// A single reaction join-row.
///
/// The visible engagement counter for a target is always derived from the
/// number of these rows, never from a separately mutated integer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
    /// Reacting user
    pub user_id: String,
    /// Target content (article or comment) identifier
    pub target_id: String,
    /// Reaction kind
    pub kind: ReactionKind,
    /// When the reaction was placed (Unix ms)
    pub created_at: i64,
}
