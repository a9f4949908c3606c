use orbit_types::{BoardId, CardId, ColumnId};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::hash::Hash;

/// A record that belongs to exactly one parent scope and carries a dense,
/// zero-based `position` within it.
///
/// Implemented by [`Column`](crate::Column) (scope: board) and
/// [`Card`](crate::Card) (scope: column).
pub trait Positioned: Clone {
    type Id: Copy + Eq + Hash + Debug;
    type ParentKey: Copy + Eq + Hash + Debug;

    fn id(&self) -> Self::Id;
    fn parent_key(&self) -> Self::ParentKey;
    fn position(&self) -> u32;
    fn set_position(&mut self, position: u32);
    fn set_parent_key(&mut self, parent_key: Self::ParentKey);
}

/// One row of an atomic position batch.
///
/// `parent_key` is always present: a row that only changes position simply
/// repeats the current parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PositionUpdate<I, P> {
    pub id: I,
    pub parent_key: P,
    pub position: u32,
}

impl<I, P> PositionUpdate<I, P> {
    pub fn new(id: I, parent_key: P, position: u32) -> Self {
        Self {
            id,
            parent_key,
            position,
        }
    }
}

pub type ColumnPositionUpdate = PositionUpdate<ColumnId, BoardId>;
pub type CardPositionUpdate = PositionUpdate<CardId, ColumnId>;
