//! Persistence for Orbit.
//!
//! [`BoardStore`] is the single boundary between the board controller and
//! whatever holds the data. Two implementations ship:
//!
//! - [`SqliteBoardStore`]: the on-disk store (rusqlite, foreign-key
//!   cascades, WAL journal)
//! - [`MemoryBoardStore`]: a process-local store for tests and previews,
//!   with failure injection for exercising rollback paths
//!
//! [`SiblingStore`] narrows a `BoardStore` to the capabilities the reorder
//! flow needs for one kind of positioned record (columns or cards).
//!
//! # Guarantees
//!
//! - Sibling listings are sorted ascending by `position`.
//! - Position batches are all-or-nothing: if any row cannot be applied the
//!   whole batch is discarded.
//! - Deleting a column or card compacts the positions of the survivors.
//! - Deleting a board or column cascades to everything it owns.

mod error;
mod memory;
mod sqlite;
mod store;

pub use error::{StorageError, StorageResult};
pub use memory::MemoryBoardStore;
pub use sqlite::SqliteBoardStore;
pub use store::{BoardStore, DEFAULT_SETTINGS, SiblingStore};
