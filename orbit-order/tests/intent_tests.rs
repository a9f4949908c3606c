use orbit_order::{DragGesture, Extent, LaidOut, MoveIntent, drop_index, translate_drop};

/// Cards stacked vertically, 40px tall with 10px gaps: A at 0, B at 50, C at 100.
fn column_layout(ids: &str) -> Vec<LaidOut<char>> {
    ids.chars()
        .enumerate()
        .map(|(i, id)| LaidOut {
            id,
            extent: Extent::new(i as f64 * 50.0, 40.0),
        })
        .collect()
}

fn extents(ids: &str) -> Vec<Extent> {
    column_layout(ids).into_iter().map(|l| l.extent).collect()
}

// ── drop_index ───────────────────────────────────────────────────

#[test]
fn pointer_above_first_midpoint_lands_first() {
    assert_eq!(drop_index(extents("ABC"), 5.0), 0);
    assert_eq!(drop_index(extents("ABC"), -100.0), 0);
}

#[test]
fn pointer_between_midpoints_lands_between() {
    // midpoints: 20, 70, 120
    assert_eq!(drop_index(extents("ABC"), 21.0), 1);
    assert_eq!(drop_index(extents("ABC"), 69.9), 1);
    assert_eq!(drop_index(extents("ABC"), 70.0), 2);
}

#[test]
fn pointer_below_last_lands_at_end() {
    assert_eq!(drop_index(extents("ABC"), 500.0), 3);
}

#[test]
fn empty_target_lands_at_zero() {
    assert_eq!(drop_index(Vec::new(), 42.0), 0);
}

#[test]
fn non_finite_pointer_lands_at_end() {
    assert_eq!(drop_index(extents("AB"), f64::NAN), 2);
    assert_eq!(drop_index(extents("AB"), f64::INFINITY), 2);
}

#[test]
fn identical_gestures_resolve_identically() {
    let first = drop_index(extents("ABCD"), 123.4);
    for _ in 0..10 {
        assert_eq!(drop_index(extents("ABCD"), 123.4), first);
    }
}

// ── translate_drop ───────────────────────────────────────────────

#[test]
fn same_column_ignores_own_slot() {
    // Dragging A downward past B's midpoint: without A the layout is B, C.
    let intent = translate_drop('A', 1u8, 1u8, &column_layout("ABC"), 75.0);
    assert_eq!(
        intent,
        MoveIntent {
            moved_id: 'A',
            source_parent: 1,
            target_parent: 1,
            target_index: 1,
        }
    );
    assert!(intent.is_same_scope());
}

#[test]
fn same_column_drop_at_bottom_is_last_index() {
    let intent = translate_drop('A', 1u8, 1u8, &column_layout("ABC"), 1_000.0);
    assert_eq!(intent.target_index, 2);
}

#[test]
fn other_column_index_within_bounds() {
    let intent = translate_drop('Q', 1u8, 2u8, &column_layout("XY"), 1_000.0);
    assert_eq!(intent.target_index, 2);
    assert!(!intent.is_same_scope());
}

// ── DragGesture ──────────────────────────────────────────────────

#[test]
fn gesture_release_returns_last_hover() {
    let mut gesture = DragGesture::start('B', 1u8);
    gesture.hover(1, &column_layout("ABC"), 0.0);
    let last = gesture.hover(2, &column_layout("XY"), 30.0);
    assert_eq!(gesture.hovered(), Some(&last));

    let intent = gesture.release().unwrap();
    assert_eq!(intent.target_parent, 2);
    assert_eq!(intent.target_index, 1);
}

#[test]
fn gesture_released_outside_targets_yields_nothing() {
    let mut gesture = DragGesture::start('B', 1u8);
    gesture.hover(1, &column_layout("ABC"), 0.0);
    gesture.leave();
    assert!(gesture.release().is_none());
}

#[test]
fn gesture_without_hover_yields_nothing() {
    let gesture: DragGesture<char, u8> = DragGesture::start('A', 1);
    assert_eq!(gesture.moved_id(), 'A');
    assert!(gesture.release().is_none());
}
