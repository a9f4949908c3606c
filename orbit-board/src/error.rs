//! Error types for the board controller.

use orbit_order::OrderError;
use orbit_storage::StorageError;
use thiserror::Error;

/// Result type for controller operations.
pub type BoardResult<T> = Result<T, BoardError>;

/// Errors surfaced by [`BoardController`](crate::BoardController).
#[derive(Debug, Error)]
pub enum BoardError {
    /// The store failed. A failed move has already been rolled back when
    /// this is returned.
    #[error("persistence failure: {0}")]
    PersistenceFailure(#[from] StorageError),

    /// Sibling positions are no longer dense. Always a bug.
    #[error("invariant violation: {0}")]
    InvariantViolation(#[from] OrderError),

    /// The entity, or a scope the move renumbers, already has a move
    /// waiting on the store.
    #[error("a move of {0} is still in flight")]
    MoveInFlight(String),

    /// The operation needs a selected board.
    #[error("no board selected")]
    NoBoardSelected,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A blocking store call panicked or was cancelled.
    #[error("store task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
