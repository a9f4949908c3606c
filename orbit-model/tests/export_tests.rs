use orbit_model::{Board, CardLabel, Column, EXPORT_VERSION, ExportData, Setting};
use pretty_assertions::assert_eq;

#[test]
fn empty_export_has_current_version() {
    let data = ExportData::empty();
    assert_eq!(data.version, EXPORT_VERSION);
    assert!(data.boards.is_empty());
    assert!(data.card_labels.is_empty());
}

#[test]
fn export_uses_camel_case_top_level_keys() {
    let mut data = ExportData::empty();
    data.settings.push(Setting {
        key: "darkMode".into(),
        value: "true".into(),
    });
    let json = serde_json::to_value(&data).unwrap();
    assert!(json.get("exportDate").is_some());
    assert!(json.get("cardLabels").is_some());
    assert!(json.get("export_date").is_none());
}

#[test]
fn export_json_roundtrip_preserves_records() {
    let mut data = ExportData::empty();
    let board = Board::new("Home", None);
    data.columns.push(Column::new(board.id, "Todo", 0));
    data.boards.push(board);

    let json = data.to_json_pretty().unwrap();
    let back = ExportData::from_json(&json).unwrap();
    assert_eq!(back, data);
}

#[test]
fn import_tolerates_missing_optional_sections() {
    let json = r#"{"version":"1.0","exportDate":"2026-01-01T00:00:00Z","boards":[]}"#;
    let data = ExportData::from_json(json).unwrap();
    assert!(data.columns.is_empty());
    assert!(data.settings.is_empty());
}

#[test]
fn card_label_is_copy() {
    let link = CardLabel {
        card_id: orbit_types::CardId::new(),
        label_id: orbit_types::LabelId::new(),
    };
    let copy = link;
    assert_eq!(copy, link);
}
