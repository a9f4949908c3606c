mod common;

use common::{Item, order, positions, scope};
use orbit_model::{Card, Column, PositionUpdate};
use orbit_order::{MoveOutcome, MoveTarget, check_invariants, compute_move, index_of};
use orbit_types::{BoardId, ColumnId};
use pretty_assertions::assert_eq;

fn other<'a>(parent: u8, siblings: &'a [Item]) -> MoveTarget<'a, Item> {
    MoveTarget::OtherScope {
        parent_key: parent,
        siblings,
    }
}

// ── Same scope ───────────────────────────────────────────────────

#[test]
fn move_last_card_to_front() {
    let cards = scope(1, "ABC");
    let outcome = compute_move(&cards, MoveTarget::SameScope, 'C', 0);
    let source = outcome.source().unwrap();
    assert_eq!(order(source), "CAB");
    assert_eq!(positions(source), vec![0, 1, 2]);
    assert!(outcome.target().is_none());
}

#[test]
fn move_first_column_to_end() {
    let board = BoardId::new();
    let columns: Vec<Column> = ["Todo", "Doing", "Done"]
        .iter()
        .enumerate()
        .map(|(i, name)| Column::new(board, *name, i as u32))
        .collect();

    let outcome = compute_move(&columns, MoveTarget::SameScope, columns[0].id, 2);
    let names: Vec<&str> = outcome
        .source()
        .unwrap()
        .iter()
        .map(|c| c.name.as_str())
        .collect();
    assert_eq!(names, ["Doing", "Done", "Todo"]);

    let expected: Vec<_> = vec![
        PositionUpdate::new(columns[1].id, board, 0),
        PositionUpdate::new(columns[2].id, board, 1),
        PositionUpdate::new(columns[0].id, board, 2),
    ];
    assert_eq!(outcome.updates(), expected.as_slice());
}

#[test]
fn updates_only_cover_changed_rows() {
    let items = scope(1, "ABCDE");
    let outcome = compute_move(&items, MoveTarget::SameScope, 'B', 2);
    let ids: String = outcome.updates().iter().map(|u| u.id).collect();
    assert_eq!(ids, "CB");
    assert_eq!(order(outcome.source().unwrap()), "ACBDE");
}

#[test]
fn same_index_is_unchanged() {
    let items = scope(1, "ABC");
    for (index, id) in "ABC".chars().enumerate() {
        let outcome = compute_move(&items, MoveTarget::SameScope, id, index);
        assert_eq!(outcome, MoveOutcome::Unchanged);
        assert!(outcome.updates().is_empty());
    }
}

#[test]
fn index_past_end_clamps_to_last_slot() {
    let items = scope(1, "ABC");
    let outcome = compute_move(&items, MoveTarget::SameScope, 'A', 10);
    assert_eq!(order(outcome.source().unwrap()), "BCA");

    let last = compute_move(&items, MoveTarget::SameScope, 'C', 10);
    assert_eq!(last, MoveOutcome::Unchanged);
}

#[test]
fn same_order_in_gappy_snapshot_repairs_positions() {
    let items = vec![
        Item {
            id: 'A',
            parent: 1,
            position: 0,
        },
        Item {
            id: 'B',
            parent: 1,
            position: 5,
        },
    ];
    let outcome = compute_move(&items, MoveTarget::SameScope, 'A', 0);
    assert_eq!(outcome.updates(), &[PositionUpdate::new('B', 1, 1)]);
}

#[test]
fn move_and_back_restores_order() {
    let items = scope(1, "ABCDE");
    let there = compute_move(&items, MoveTarget::SameScope, 'B', 3)
        .into_plan()
        .unwrap();
    assert_eq!(order(&there.source), "ACDBE");

    let back = compute_move(&there.source, MoveTarget::SameScope, 'B', 1)
        .into_plan()
        .unwrap();
    assert_eq!(back.source, items);
}

#[test]
fn repeated_move_settles() {
    let items = scope(1, "ABC");
    let first = compute_move(&items, MoveTarget::SameScope, 'A', 2)
        .into_plan()
        .unwrap();
    let second = compute_move(&first.source, MoveTarget::SameScope, 'A', 2);
    assert_eq!(second, MoveOutcome::Unchanged);
}

#[test]
fn other_scope_with_same_parent_is_a_reorder() {
    let items = scope(1, "ABC");
    let outcome = compute_move(&items, other(1, &items), 'A', 2);
    assert_eq!(order(outcome.source().unwrap()), "BCA");
    assert!(outcome.target().is_none());
}

// ── Cross scope ──────────────────────────────────────────────────

#[test]
fn move_card_to_other_column() {
    let column1 = scope(1, "AB");
    let column2 = scope(2, "C");

    let plan = compute_move(&column1, other(2, &column2), 'B', 0)
        .into_plan()
        .unwrap();
    assert_eq!(order(&plan.source), "A");
    let target = plan.target.as_ref().unwrap();
    assert_eq!(order(target), "BC");
    assert!(target.iter().all(|i| i.parent == 2));
    assert_eq!(
        plan.updates,
        vec![PositionUpdate::new('B', 2, 0), PositionUpdate::new('C', 2, 1)]
    );
}

#[test]
fn cross_move_renumbers_source() {
    let column1 = scope(1, "ABC");
    let column2 = scope(2, "");
    let plan = compute_move(&column1, other(2, &column2), 'A', 0)
        .into_plan()
        .unwrap();
    assert_eq!(order(&plan.source), "BC");
    assert_eq!(positions(&plan.source), vec![0, 1]);
    assert_eq!(plan.target.unwrap(), vec![Item { id: 'A', parent: 2, position: 0 }]);

    let ids: String = plan.updates.iter().map(|u| u.id).collect();
    assert_eq!(ids, "BCA");
}

#[test]
fn cross_move_clamps_target_index() {
    let column1 = scope(1, "A");
    let column2 = scope(2, "XY");
    let outcome = compute_move(&column1, other(2, &column2), 'A', 50);
    assert_eq!(order(outcome.target().unwrap()), "XYA");
}

#[test]
fn cross_move_conserves_count_and_reparents() {
    let column1 = scope(1, "ABCD");
    let column2 = scope(2, "XYZ");
    let plan = compute_move(&column1, other(2, &column2), 'C', 1)
        .into_plan()
        .unwrap();
    let target = plan.target.unwrap();
    assert_eq!(plan.source.len() + target.len(), 7);
    assert_eq!(target[index_of(&target, 'C').unwrap()].parent, 2);
    assert!(check_invariants(&plan.source).is_ok());
    assert!(check_invariants(&target).is_ok());
}

#[test]
fn stale_target_listing_moved_entity_keeps_one_copy() {
    let column1 = scope(1, "AB");
    let mut column2 = scope(2, "XY");
    column2.push(Item {
        id: 'B',
        parent: 2,
        position: 2,
    });
    let outcome = compute_move(&column1, other(2, &column2), 'B', 0);
    let target = outcome.target().unwrap();
    assert_eq!(order(target), "BXY");
    assert_eq!(target.iter().filter(|i| i.id == 'B').count(), 1);
}

#[test]
fn works_with_cards() {
    let from = ColumnId::new();
    let to = ColumnId::new();
    let source = vec![Card::new(from, "A", 0), Card::new(from, "B", 1)];
    let target = vec![Card::new(to, "C", 0)];

    let outcome = compute_move(
        &source,
        MoveTarget::OtherScope {
            parent_key: to,
            siblings: &target,
        },
        source[1].id,
        0,
    );
    let moved = &outcome.target().unwrap()[0];
    assert_eq!(moved.title, "B");
    assert_eq!(moved.column_id, to);
}

// ── Missing ids ──────────────────────────────────────────────────

#[test]
fn missing_id_is_a_no_op() {
    let column1 = scope(1, "AB");
    let column2 = scope(2, "C");
    let before = (column1.clone(), column2.clone());

    let outcome = compute_move(&column1, other(2, &column2), 'Z', 0);
    assert_eq!(outcome, MoveOutcome::Missing);
    assert!(outcome.updates().is_empty());
    assert!(outcome.source().is_none());
    assert_eq!((column1, column2), before);
}

#[test]
fn missing_in_empty_source() {
    let outcome = compute_move(&scope(1, ""), MoveTarget::SameScope, 'A', 0);
    assert_eq!(outcome, MoveOutcome::Missing);
}
