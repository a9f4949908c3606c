//! Ordering engine for Orbit.
//!
//! Every column belongs to a board and every card to a column, and within
//! that parent scope siblings carry a dense zero-based `position`. This
//! crate keeps it that way:
//!
//! - [`sibling`]: normalize / insert / remove over one scope, plus the
//!   invariant check (positions are exactly `0..n`, unique, one parent)
//! - [`reorder`]: turns a move request into the complete set of
//!   `(id, parent_key, position)` rows for one or two scopes
//! - [`intent`]: resolves a pointer drop over laid-out siblings into a
//!   move request with an in-range target index
//!
//! Nothing here does I/O or owns state. Callers pass snapshots in and get
//! new snapshots (and the row diff to persist) back.
//!
//! # Example
//!
//! ```
//! use orbit_model::Card;
//! use orbit_order::reorder::{compute_move, MoveTarget};
//! use orbit_types::ColumnId;
//!
//! let column = ColumnId::new();
//! let cards: Vec<Card> = ["A", "B", "C"]
//!     .iter()
//!     .enumerate()
//!     .map(|(i, t)| Card::new(column, *t, i as u32))
//!     .collect();
//!
//! let outcome = compute_move(&cards, MoveTarget::SameScope, cards[2].id, 0);
//! let titles: Vec<_> = outcome.source().unwrap().iter().map(|c| c.title.as_str()).collect();
//! assert_eq!(titles, ["C", "A", "B"]);
//! assert_eq!(outcome.updates().len(), 3);
//! ```

mod error;
pub mod intent;
pub mod reorder;
pub mod sibling;

pub use error::{OrderError, OrderResult};
pub use intent::{DragGesture, Extent, LaidOut, MoveIntent, drop_index, translate_drop};
pub use reorder::{MoveOutcome, MovePlan, MoveTarget, compute_move};
pub use sibling::{check_invariants, index_of, insert_at, normalize, remove_at};
