//! Drop-position resolution for drag gestures.
//!
//! The view lays siblings out along one axis (vertical for cards, horizontal
//! for columns) and reports the pointer coordinate on that axis at drop
//! time. The rule is fixed: the entity lands before the first remaining
//! sibling whose midpoint lies beyond the pointer, or at the end. The same
//! gesture over the same layout always yields the same index, and the index
//! is always within `0..=len` of the target scope.

use serde::{Deserialize, Serialize};

/// Extent of a rendered sibling along the drag axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub start: f64,
    pub length: f64,
}

impl Extent {
    pub fn new(start: f64, length: f64) -> Self {
        Self { start, length }
    }

    pub fn midpoint(&self) -> f64 {
        self.start + self.length / 2.0
    }
}

/// A sibling as currently rendered.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LaidOut<I> {
    pub id: I,
    pub extent: Extent,
}

/// A resolved request to move one entity, ready for the reorder engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MoveIntent<I, P> {
    pub moved_id: I,
    pub source_parent: P,
    pub target_parent: P,
    /// Index in the target scope once the moved entity has been removed
    /// from its source.
    pub target_index: usize,
}

impl<I, P: PartialEq> MoveIntent<I, P> {
    pub fn is_same_scope(&self) -> bool {
        self.source_parent == self.target_parent
    }
}

/// Index at which a drop at `pointer` lands among `extents` (display order).
///
/// A non-finite pointer lands at the end.
pub fn drop_index<E>(extents: E, pointer: f64) -> usize
where
    E: IntoIterator<Item = Extent>,
    E::IntoIter: ExactSizeIterator,
{
    let extents = extents.into_iter();
    let len = extents.len();
    if !pointer.is_finite() {
        return len;
    }
    extents
        .enumerate()
        .find(|(_, extent)| pointer < extent.midpoint())
        .map_or(len, |(index, _)| index)
}

/// Builds a [`MoveIntent`] for dropping `moved_id` over `layout`.
///
/// The moved entity's own slot is ignored when it appears in `layout`
/// (dropping within its own column), which makes the index relative to the
/// scope without it.
pub fn translate_drop<I, P>(
    moved_id: I,
    source_parent: P,
    target_parent: P,
    layout: &[LaidOut<I>],
    pointer: f64,
) -> MoveIntent<I, P>
where
    I: Copy + PartialEq,
{
    let others: Vec<Extent> = layout
        .iter()
        .filter(|item| item.id != moved_id)
        .map(|item| item.extent)
        .collect();
    MoveIntent {
        moved_id,
        source_parent,
        target_parent,
        target_index: drop_index(others, pointer),
    }
}

/// One drag gesture, from pick-up to drop or cancel.
///
/// Hovering resolves an intent on every pointer update so the view can show
/// a placeholder. Only [`DragGesture::release`] hands an intent onward;
/// cancelling consumes the gesture and produces nothing.
#[derive(Debug, Clone)]
pub struct DragGesture<I, P> {
    moved_id: I,
    source_parent: P,
    hovered: Option<MoveIntent<I, P>>,
}

impl<I: Copy + PartialEq, P: Copy> DragGesture<I, P> {
    pub fn start(moved_id: I, source_parent: P) -> Self {
        Self {
            moved_id,
            source_parent,
            hovered: None,
        }
    }

    pub fn moved_id(&self) -> I {
        self.moved_id
    }

    /// Records the pointer over `target_parent` and returns the intent a drop
    /// there would produce.
    pub fn hover(
        &mut self,
        target_parent: P,
        layout: &[LaidOut<I>],
        pointer: f64,
    ) -> MoveIntent<I, P> {
        let intent = translate_drop(
            self.moved_id,
            self.source_parent,
            target_parent,
            layout,
            pointer,
        );
        self.hovered = Some(intent);
        intent
    }

    /// The intent of the last hover, if the pointer has been over a target.
    pub fn hovered(&self) -> Option<&MoveIntent<I, P>> {
        self.hovered.as_ref()
    }

    /// Pointer left every drop target.
    pub fn leave(&mut self) {
        self.hovered = None;
    }

    /// Finishes the gesture. `None` when released outside any target.
    pub fn release(self) -> Option<MoveIntent<I, P>> {
        self.hovered
    }

    /// Abandons the gesture.
    pub fn cancel(self) {}
}
