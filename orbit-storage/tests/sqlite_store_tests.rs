use orbit_model::{Board, Card, CardPositionUpdate, Column};
use orbit_storage::{BoardStore, SqliteBoardStore, StorageError};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn seeded(store: &SqliteBoardStore) -> (Board, Vec<Column>, Vec<Card>) {
    let board = Board::new("Work", Some("day job".to_string()));
    let columns = store
        .create_board(
            &board,
            &[Column::new(board.id, "One", 0), Column::new(board.id, "Two", 0)],
        )
        .unwrap();
    let cards = ["A", "B"]
        .iter()
        .map(|t| store.create_card(&Card::new(columns[0].id, *t, 0)).unwrap())
        .collect();
    (board, columns, cards)
}

// ── On-disk persistence ──────────────────────────────────────────

#[test]
fn data_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("orbit.db");

    let (board, columns, cards) = {
        let store = SqliteBoardStore::open(&path).unwrap();
        seeded(&store)
    };

    let store = SqliteBoardStore::open(&path).unwrap();
    assert_eq!(store.get_board(board.id).unwrap(), Some(board));
    assert_eq!(store.list_columns(columns[0].board_id).unwrap(), columns);
    assert_eq!(store.list_cards(columns[0].id).unwrap(), cards);
}

#[test]
fn reopen_does_not_reseed_settings() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("orbit.db");
    SqliteBoardStore::open(&path)
        .unwrap()
        .set_setting("darkMode", "true")
        .unwrap();

    let store = SqliteBoardStore::open(&path).unwrap();
    assert_eq!(store.get_setting("darkMode").unwrap().as_deref(), Some("true"));
}

#[test]
fn due_dates_round_trip() {
    let store = SqliteBoardStore::open_in_memory().unwrap();
    let (_, columns, _) = seeded(&store);
    let due = chrono::NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();
    let card = store
        .create_card(&Card::new(columns[1].id, "taxes", 0).with_due_date(due))
        .unwrap();

    assert_eq!(store.get_card(card.id).unwrap().unwrap().due_date, Some(due));
}

// ── Batch atomicity ──────────────────────────────────────────────

#[test]
fn card_batch_with_unknown_card_rolls_back() {
    let store = SqliteBoardStore::open_in_memory().unwrap();
    let (_, columns, cards) = seeded(&store);
    let updates = vec![
        CardPositionUpdate::new(cards[1].id, columns[0].id, 0),
        CardPositionUpdate::new(orbit_types::CardId::new(), columns[0].id, 1),
    ];

    let err = store.update_card_positions(&updates).unwrap_err();
    assert!(matches!(err, StorageError::NotFound(_)));
    assert_eq!(store.list_cards(columns[0].id).unwrap(), cards);
}
