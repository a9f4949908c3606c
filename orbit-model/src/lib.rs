//! Core record model for Orbit.
//!
//! Defines the types every other crate agrees on:
//! - [`Board`], [`Column`], [`Card`], [`Label`]: the persisted records
//! - [`Positioned`]: the contract for records that live in an ordered
//!   sibling scope (columns within a board, cards within a column)
//! - [`PositionUpdate`]: one `(id, parent_key, position)` row of a batch
//! - [`ExportData`]: the full-database snapshot used for export/import
//!
//! The records are plain data. Ordering logic lives in `orbit-order`,
//! persistence in `orbit-storage`.

mod export;
mod position;
mod record;

pub use export::{EXPORT_VERSION, ExportData};
pub use position::{CardPositionUpdate, ColumnPositionUpdate, PositionUpdate, Positioned};
pub use record::{Board, Card, CardLabel, Column, Label, Setting};
