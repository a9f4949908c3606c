//! View-state controller for Orbit boards.
//!
//! [`BoardController`] owns the loaded [`BoardState`] and is the only
//! thing that changes it. Callers send [`Intent`]s (or call the matching
//! methods), read the projections, and subscribe to [`StateChange`]
//! notifications.
//!
//! Moves are optimistic: the new order is visible as soon as it is
//! computed, the position batch is written afterwards, and a rejected
//! write reloads the affected scopes from the store. A stale move (the
//! entity or its target was deleted meanwhile) is dropped without error.
//!
//! [`Debouncer`] provides the autosave used for card edits.

mod config;
mod controller;
mod debounce;
mod error;
mod intent;
mod moves;
mod state;

pub use config::BoardConfig;
pub use controller::BoardController;
pub use debounce::{Debouncer, EditSession};
pub use error::{BoardError, BoardResult};
pub use intent::{CardEdit, Intent, Outcome};
pub use moves::{MoveKey, MoveStatus};
pub use state::{BoardState, StateChange};
