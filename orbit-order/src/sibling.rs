//! Operations over one ordered sibling scope.
//!
//! All functions take the scope by value and return the re-positioned scope
//! in display order. On return the positions are exactly `0..n` (checked in
//! debug builds).

use crate::error::{OrderError, OrderResult};
use orbit_model::Positioned;

/// Re-assigns positions `0..n` following the current relative order.
///
/// The sort is stable: siblings that claim the same position keep their
/// arrival order. Used after deletions and on stale or gappy snapshots.
pub fn normalize<T: Positioned>(mut entities: Vec<T>) -> Vec<T> {
    entities.sort_by_key(|e| e.position());
    renumber(&mut entities);
    entities
}

/// Inserts `entity` at `index` (clamped to `0..=n`) and returns the whole
/// scope re-positioned.
///
/// The parent key of `entity` is left as given; moving between scopes is
/// the reorder engine's job.
pub fn insert_at<T: Positioned>(entities: Vec<T>, entity: T, index: usize) -> Vec<T> {
    let mut entities = normalize(entities);
    let index = index.min(entities.len());
    entities.insert(index, entity);
    renumber(&mut entities);
    entities
}

/// Removes the sibling with `id` and closes the gap.
///
/// Unknown ids are a no-op: the input comes back untouched, so a retried
/// delete has at most one effect.
pub fn remove_at<T: Positioned>(entities: Vec<T>, id: T::Id) -> Vec<T> {
    let Some(found) = entities.iter().position(|e| e.id() == id) else {
        return entities;
    };
    let mut entities = entities;
    entities.remove(found);
    normalize(entities)
}

/// Index of `id` in display order, or `None` if it is not in the scope.
pub fn index_of<T: Positioned>(entities: &[T], id: T::Id) -> Option<usize> {
    let mut ordered: Vec<&T> = entities.iter().collect();
    ordered.sort_by_key(|e| e.position());
    ordered.iter().position(|e| e.id() == id)
}

/// Checks density, uniqueness and single-parent membership of one scope.
pub fn check_invariants<T: Positioned>(entities: &[T]) -> OrderResult<()> {
    if let Some(first) = entities.first() {
        let parent = first.parent_key();
        if entities.iter().any(|e| e.parent_key() != parent) {
            return Err(OrderError::MixedScope);
        }
    }
    check_density(entities)
}

fn check_density<T: Positioned>(entities: &[T]) -> OrderResult<()> {
    let mut positions: Vec<u32> = entities.iter().map(|e| e.position()).collect();
    positions.sort_unstable();
    for (index, &found) in positions.iter().enumerate() {
        let expected = index as u32;
        if found == expected {
            continue;
        }
        if index > 0 && positions[index - 1] == found {
            return Err(OrderError::DuplicatePosition { position: found });
        }
        return Err(OrderError::PositionGap { expected, found });
    }
    Ok(())
}

pub(crate) fn renumber<T: Positioned>(entities: &mut [T]) {
    for (index, entity) in entities.iter_mut().enumerate() {
        entity.set_position(index as u32);
    }
    debug_assert_eq!(check_density(entities), Ok(()));
}
