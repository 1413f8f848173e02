//! Error types for the store module.

use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Record serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Record not found.
    #[error("record not found: {0}")]
    NotFound(String),

    /// Invalid data in storage.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// A lock guarding store state was poisoned by a panicking writer.
    #[error("store lock poisoned: {0}")]
    LockPoisoned(String),

    /// The blocking task running a query failed.
    #[error("store task failed: {0}")]
    Task(String),
}

impl StoreError {
    /// A record with this id is already stored.
    pub fn duplicate(what: &str, id: &str) -> Self {
        StoreError::InvalidData(format!("{} {} already exists", what, id))
    }

    /// The record's owning client, project or service is not stored.
    pub fn missing_parent(what: &str, id: &str) -> Self {
        StoreError::NotFound(format!("parent of {} {}", what, id))
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
