//! Error types for byline-core

use thiserror::Error;

use crate::remote::RemoteError;

/// Result type alias using byline-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in byline-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Local snapshot storage error
    #[error("Snapshot store error: {0}")]
    Snapshot(String),

    /// SQLite error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Remote draft repository error
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// Record not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
