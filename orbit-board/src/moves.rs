//! Move bookkeeping.
//!
//! A move runs `Idle -> Requested -> Computed -> Applied -> Confirmed |
//! RolledBack`. The only suspension point is the store write between
//! `Applied` and the outcome. While it is pending, a [`MoveTicket`] holds
//! the moved entity and every scope the move renumbers. A second move that
//! names the same entity or touches one of those scopes is refused until
//! the ticket is released. Moves in unrelated scopes proceed.

use crate::error::{BoardError, BoardResult};
use orbit_types::{BoardId, CardId, ColumnId};
use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Something a pending move holds: the entity it relocates, or a scope it
/// renumbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveKey {
    Column(ColumnId),
    Card(CardId),
    /// The column order of a board.
    ColumnsOf(BoardId),
    /// The card order of a column.
    CardsIn(ColumnId),
}

impl fmt::Display for MoveKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Column(id) => write!(f, "column {id}"),
            Self::Card(id) => write!(f, "card {id}"),
            Self::ColumnsOf(id) => write!(f, "columns of board {id}"),
            Self::CardsIn(id) => write!(f, "cards in column {id}"),
        }
    }
}

/// How a move ended when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveStatus {
    /// The store accepted the batch.
    Confirmed { rows: usize },
    /// The order would not change, so nothing was written.
    Unchanged,
    /// The move named an entity or target container that is gone, usually
    /// a drag that raced a delete. This is how an invalid move target is
    /// reported: it is not an error, and nothing was changed.
    Dropped,
}

/// Entities and scopes with a move in flight.
#[derive(Debug, Clone, Default)]
pub(crate) struct MoveTracker {
    pending: Arc<Mutex<HashSet<MoveKey>>>,
}

impl MoveTracker {
    fn lock(&self) -> MutexGuard<'_, HashSet<MoveKey>> {
        // The set stays consistent even if a holder panicked.
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Claims `key` for the duration of one move.
    pub(crate) fn begin(&self, key: MoveKey) -> BoardResult<MoveTicket> {
        self.begin_all(&[key])
    }

    /// Claims every key in `keys`, or none of them if any is already held.
    pub(crate) fn begin_all(&self, keys: &[MoveKey]) -> BoardResult<MoveTicket> {
        let mut pending = self.lock();
        if let Some(held) = keys.iter().find(|key| pending.contains(key)) {
            return Err(BoardError::MoveInFlight(held.to_string()));
        }
        let mut claimed = Vec::with_capacity(keys.len());
        for key in keys {
            if pending.insert(*key) {
                claimed.push(*key);
            }
        }
        Ok(MoveTicket {
            keys: claimed,
            tracker: self.clone(),
        })
    }

    pub(crate) fn is_pending(&self, key: MoveKey) -> bool {
        self.lock().contains(&key)
    }
}

/// Releases its keys when dropped, including when the move future is
/// cancelled mid-flight.
#[derive(Debug)]
pub(crate) struct MoveTicket {
    keys: Vec<MoveKey>,
    tracker: MoveTracker,
}

impl Drop for MoveTicket {
    fn drop(&mut self) {
        let mut pending = self.tracker.lock();
        for key in &self.keys {
            pending.remove(key);
        }
    }
}
