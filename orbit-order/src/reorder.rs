//! The reorder engine.
//!
//! [`compute_move`] relocates one entity inside its scope or into another
//! scope. It always rebuilds the affected scopes in full (remove, splice,
//! renumber `0..n`) and then diffs the result against the snapshot, so the
//! returned rows are exactly the entities whose parent or position changed.
//! Applying the same rows twice is harmless.

use crate::sibling::{insert_at, remove_at};
use orbit_model::{PositionUpdate, Positioned};
use std::collections::HashMap;

/// Where the moved entity should end up.
#[derive(Debug, Clone)]
pub enum MoveTarget<'a, T: Positioned> {
    /// Reorder within the source scope.
    SameScope,
    /// Move into another parent. `siblings` is that parent's current scope
    /// (possibly empty). A `parent_key` equal to the source parent is
    /// treated as [`MoveTarget::SameScope`].
    OtherScope {
        parent_key: T::ParentKey,
        siblings: &'a [T],
    },
}

/// The full result of a move that changes something.
#[derive(Debug, Clone, PartialEq)]
pub struct MovePlan<T: Positioned> {
    /// The source scope after the move, in display order.
    pub source: Vec<T>,
    /// The target scope after the move, for cross-scope moves.
    pub target: Option<Vec<T>>,
    /// Every `(id, parent_key, position)` row that differs from the snapshot.
    /// Source rows come first.
    pub updates: Vec<PositionUpdate<T::Id, T::ParentKey>>,
}

/// Result of [`compute_move`].
#[derive(Debug, Clone, PartialEq)]
pub enum MoveOutcome<T: Positioned> {
    /// The moved id is not in the source scope (stale drag). Nothing to do.
    Missing,
    /// The move leaves every row as it was. Nothing to persist.
    Unchanged,
    /// The move changes at least one row.
    Moved(MovePlan<T>),
}

impl<T: Positioned> MoveOutcome<T> {
    /// Rows to persist; empty unless the outcome is [`MoveOutcome::Moved`].
    pub fn updates(&self) -> &[PositionUpdate<T::Id, T::ParentKey>] {
        match self {
            Self::Moved(plan) => &plan.updates,
            _ => &[],
        }
    }

    /// The new source scope, when something moved.
    pub fn source(&self) -> Option<&[T]> {
        match self {
            Self::Moved(plan) => Some(&plan.source),
            _ => None,
        }
    }

    /// The new target scope, when the move crossed scopes.
    pub fn target(&self) -> Option<&[T]> {
        match self {
            Self::Moved(plan) => plan.target.as_deref(),
            _ => None,
        }
    }

    pub fn is_moved(&self) -> bool {
        matches!(self, Self::Moved(_))
    }

    pub fn into_plan(self) -> Option<MovePlan<T>> {
        match self {
            Self::Moved(plan) => Some(plan),
            _ => None,
        }
    }
}

/// Computes the new ordering for moving `moved_id` to `target_index`.
///
/// `target_index` is the desired index *after* the entity has been taken
/// out of its source scope; it is clamped to the valid range, never
/// rejected. The inputs are snapshots and are not modified.
pub fn compute_move<T: Positioned>(
    source: &[T],
    target: MoveTarget<'_, T>,
    moved_id: T::Id,
    target_index: usize,
) -> MoveOutcome<T> {
    let Some(moved) = source.iter().find(|e| e.id() == moved_id) else {
        return MoveOutcome::Missing;
    };

    match target {
        MoveTarget::OtherScope {
            parent_key,
            siblings,
        } if parent_key != moved.parent_key() => {
            move_across(source, siblings, moved.clone(), parent_key, target_index)
        }
        _ => move_within(source, moved.clone(), target_index),
    }
}

fn move_within<T: Positioned>(source: &[T], moved: T, target_index: usize) -> MoveOutcome<T> {
    let rest = remove_at(source.to_vec(), moved.id());
    let index = target_index.min(rest.len());
    let reordered = insert_at(rest, moved, index);

    let snapshot = snapshot_of([source]);
    let updates = diff(&snapshot, &reordered);
    if updates.is_empty() {
        return MoveOutcome::Unchanged;
    }
    MoveOutcome::Moved(MovePlan {
        source: reordered,
        target: None,
        updates,
    })
}

fn move_across<T: Positioned>(
    source: &[T],
    siblings: &[T],
    mut moved: T,
    parent_key: T::ParentKey,
    target_index: usize,
) -> MoveOutcome<T> {
    let moved_id = moved.id();
    let remaining = remove_at(source.to_vec(), moved_id);

    // A stale target snapshot may already list the entity; it can only
    // live in one scope, so drop that copy before inserting.
    let siblings_without: Vec<T> = siblings
        .iter()
        .filter(|e| e.id() != moved_id)
        .cloned()
        .collect();
    moved.set_parent_key(parent_key);
    let index = target_index.min(siblings_without.len());
    let new_target = insert_at(siblings_without, moved, index);

    let snapshot = snapshot_of([siblings, source]);
    let mut updates = diff(&snapshot, &remaining);
    updates.extend(diff(&snapshot, &new_target));

    MoveOutcome::Moved(MovePlan {
        source: remaining,
        target: Some(new_target),
        updates,
    })
}

type Snapshot<T> = HashMap<<T as Positioned>::Id, (<T as Positioned>::ParentKey, u32)>;

/// Indexes the snapshot scopes by id. Later scopes win on duplicate ids.
fn snapshot_of<'a, T: Positioned + 'a, const N: usize>(scopes: [&'a [T]; N]) -> Snapshot<T> {
    scopes
        .into_iter()
        .flatten()
        .map(|e| (e.id(), (e.parent_key(), e.position())))
        .collect()
}

fn diff<T: Positioned>(
    snapshot: &Snapshot<T>,
    scope: &[T],
) -> Vec<PositionUpdate<T::Id, T::ParentKey>> {
    scope
        .iter()
        .filter(|e| snapshot.get(&e.id()) != Some(&(e.parent_key(), e.position())))
        .map(|e| PositionUpdate::new(e.id(), e.parent_key(), e.position()))
        .collect()
}
