//! Reaction repository implementation

use rusqlite::{params, Connection, OptionalExtension};

use crate::error::Result;
use crate::models::{Reaction, ReactionKind};
use crate::util::now_ms;

/// Trait for engagement reaction storage
pub trait ReactionRepository {
    /// Toggle a user's reaction on a target.
    ///
    /// Idempotent under repeated invocation: toggling twice returns the
    /// join-row and the derived counter to their original state. Returns
    /// whether the reaction is present after the call.
    fn toggle(&self, user_id: &str, target_id: &str, kind: ReactionKind) -> Result<bool>;

    /// The engagement counter for a target: the number of existing
    /// join-rows, never a cached integer.
    fn count(&self, target_id: &str, kind: ReactionKind) -> Result<u64>;

    /// Whether the user currently has this reaction on the target
    fn has_reacted(&self, user_id: &str, target_id: &str, kind: ReactionKind) -> Result<bool>;

    /// Get a user's reaction row, if present
    fn get(&self, user_id: &str, target_id: &str, kind: ReactionKind)
        -> Result<Option<Reaction>>;
}

/// `SQLite` implementation of `ReactionRepository`
pub struct SqliteReactionRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteReactionRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Parse a reaction from a database row
    fn parse_reaction(row: &rusqlite::Row<'_>) -> rusqlite::Result<Reaction> {
        let kind: String = row.get(2)?;
        Ok(Reaction {
            user_id: row.get(0)?,
            target_id: row.get(1)?,
            kind: kind.parse().unwrap_or(ReactionKind::Like),
            created_at: row.get(3)?,
        })
    }
}

impl ReactionRepository for SqliteReactionRepository<'_> {
    fn toggle(&self, user_id: &str, target_id: &str, kind: ReactionKind) -> Result<bool> {
        // Delete-then-insert inside one transaction keeps the toggle atomic
        // under concurrent reactions: no read-then-write on a cached count.
        let tx = self.conn.unchecked_transaction()?;

        let removed = tx.execute(
            "DELETE FROM reactions WHERE user_id = ? AND target_id = ? AND kind = ?",
            params![user_id, target_id, kind.as_str()],
        )?;

        let present = if removed == 0 {
            tx.execute(
                "INSERT INTO reactions (user_id, target_id, kind, created_at) VALUES (?, ?, ?, ?)",
                params![user_id, target_id, kind.as_str(), now_ms()],
            )?;
            true
        } else {
            false
        };

        tx.commit()?;
        Ok(present)
    }

    fn count(&self, target_id: &str, kind: ReactionKind) -> Result<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM reactions WHERE target_id = ? AND kind = ?",
            params![target_id, kind.as_str()],
            |row| row.get(0),
        )?;

        Ok(count.max(0).unsigned_abs())
    }

    fn has_reacted(&self, user_id: &str, target_id: &str, kind: ReactionKind) -> Result<bool> {
        Ok(self.get(user_id, target_id, kind)?.is_some())
    }

    fn get(
        &self,
        user_id: &str,
        target_id: &str,
        kind: ReactionKind,
    ) -> Result<Option<Reaction>> {
        let reaction = self
            .conn
            .query_row(
                "SELECT user_id, target_id, kind, created_at
                 FROM reactions
                 WHERE user_id = ? AND target_id = ? AND kind = ?",
                params![user_id, target_id, kind.as_str()],
                Self::parse_reaction,
            )
            .optional()?;

        Ok(reaction)
    }
}
