//! Core type definitions for Orbit.
//!
//! This crate defines the small, storage-agnostic types shared by every
//! other crate in the workspace:
//! - Board, column, card and label identifiers (UUID v7)
//! - Millisecond wall-clock timestamps
//!
//! Domain records (boards, columns, cards) live in `orbit-model`.

mod ids;
mod timestamp;

pub use ids::{BoardId, CardId, ColumnId, LabelId};
pub use timestamp::Timestamp;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid UUID: {0}")]
    InvalidUuid(#[from] uuid::Error),
}
