use crate::{Board, Card, CardLabel, Column, Label, Setting};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Version string written into every export.
pub const EXPORT_VERSION: &str = "1.0";

/// A complete snapshot of the database, used for export and import.
///
/// Field names are camelCase on the wire (`exportDate`, `cardLabels`) so
/// exports stay readable by earlier releases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportData {
    pub version: String,
    pub export_date: DateTime<Utc>,
    pub boards: Vec<Board>,
    #[serde(default)]
    pub columns: Vec<Column>,
    #[serde(default)]
    pub cards: Vec<Card>,
    #[serde(default)]
    pub labels: Vec<Label>,
    #[serde(default)]
    pub card_labels: Vec<CardLabel>,
    #[serde(default)]
    pub settings: Vec<Setting>,
}

impl ExportData {
    /// An empty snapshot stamped with the current version and time.
    pub fn empty() -> Self {
        Self {
            version: EXPORT_VERSION.to_string(),
            export_date: Utc::now(),
            boards: Vec::new(),
            columns: Vec::new(),
            cards: Vec::new(),
            labels: Vec::new(),
            card_labels: Vec::new(),
            settings: Vec::new(),
        }
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
