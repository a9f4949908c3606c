//! Error types for sibling-set invariant checks.

use thiserror::Error;

/// Result type for ordering checks.
pub type OrderResult<T> = Result<T, OrderError>;

/// A broken ordering invariant.
///
/// These indicate a programming error in whoever produced the scope; the
/// engine's own operations never return a scope that fails the check.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    /// Two siblings share a position.
    #[error("invariant violation: position {position} is used more than once")]
    DuplicatePosition { position: u32 },

    /// Positions are not exactly `0..n`.
    #[error("invariant violation: expected position {expected}, found {found}")]
    PositionGap { expected: u32, found: u32 },

    /// The scope mixes children of different parents.
    #[error("invariant violation: scope contains entities of more than one parent")]
    MixedScope,
}
