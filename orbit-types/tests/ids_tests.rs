use orbit_types::{BoardId, CardId, ColumnId, LabelId};
use std::collections::HashSet;
use std::str::FromStr;

// ── CardId ────────────────────────────────────────────────────────

#[test]
fn card_id_new_is_unique() {
    let a = CardId::new();
    let b = CardId::new();
    assert_ne!(a, b);
}

#[test]
fn card_id_from_uuid_roundtrip() {
    let uuid = uuid::Uuid::now_v7();
    let id = CardId::from_uuid(uuid);
    assert_eq!(id.as_uuid(), uuid);
}

#[test]
fn card_id_display_and_parse() {
    let id = CardId::new();
    let parsed = CardId::parse(&id.to_string()).unwrap();
    assert_eq!(id, parsed);
}

#[test]
fn card_id_parse_invalid() {
    assert!(CardId::parse("not-a-uuid").is_err());
    assert!(CardId::from_str("garbage").is_err());
}

#[test]
fn card_id_hash_and_eq() {
    let id = CardId::new();
    let mut set = HashSet::new();
    set.insert(id);
    set.insert(id);
    assert_eq!(set.len(), 1);
}

#[test]
fn ids_are_time_ordered() {
    let first = ColumnId::new();
    std::thread::sleep(std::time::Duration::from_millis(2));
    let second = ColumnId::new();
    assert!(first < second);
}

// ── Serde ─────────────────────────────────────────────────────────

#[test]
fn ids_serialize_as_plain_strings() {
    let id = BoardId::new();
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, format!("\"{id}\""));

    let back: BoardId = serde_json::from_str(&json).unwrap();
    assert_eq!(back, id);
}

#[test]
fn label_id_rejects_non_uuid_json() {
    let result: Result<LabelId, _> = serde_json::from_str("\"label-1\"");
    assert!(result.is_err());
}

#[test]
fn error_wraps_uuid_failure() {
    let err: orbit_types::Error = BoardId::parse("nope").unwrap_err().into();
    assert!(err.to_string().starts_with("invalid UUID"));
}
