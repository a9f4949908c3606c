//! Error types for the storage layer.

use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur in storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Record not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Invalid data (bad import file, unparseable id in a row).
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// A previous writer panicked while holding the store lock.
    #[error("store lock poisoned")]
    LockPoisoned,

    /// Failure injected by [`MemoryBoardStore`](crate::MemoryBoardStore).
    #[error("injected failure: {0}")]
    Injected(String),
}
