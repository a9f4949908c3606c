use crate::Positioned;
use chrono::NaiveDate;
use orbit_types::{BoardId, CardId, ColumnId, LabelId, Timestamp};
use serde::{Deserialize, Serialize};

/// A kanban board. Owns its columns and labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    pub id: BoardId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Board {
    /// Creates a board with a fresh id, stamped with the current time.
    pub fn new(name: impl Into<String>, description: Option<String>) -> Self {
        let now = Timestamp::now();
        Self {
            id: BoardId::new(),
            name: name.into(),
            description,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A column of a board, ordered by `position` among the board's columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub id: ColumnId,
    pub board_id: BoardId,
    pub name: String,
    pub position: u32,
    pub created_at: Timestamp,
}

impl Column {
    pub fn new(board_id: BoardId, name: impl Into<String>, position: u32) -> Self {
        Self {
            id: ColumnId::new(),
            board_id,
            name: name.into(),
            position,
            created_at: Timestamp::now(),
        }
    }
}

impl Positioned for Column {
    type Id = ColumnId;
    type ParentKey = BoardId;

    fn id(&self) -> ColumnId {
        self.id
    }

    fn parent_key(&self) -> BoardId {
        self.board_id
    }

    fn position(&self) -> u32 {
        self.position
    }

    fn set_position(&mut self, position: u32) {
        self.position = position;
    }

    fn set_parent_key(&mut self, parent_key: BoardId) {
        self.board_id = parent_key;
    }
}

/// A card, ordered by `position` among the cards of its column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub column_id: ColumnId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    pub position: u32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Card {
    pub fn new(column_id: ColumnId, title: impl Into<String>, position: u32) -> Self {
        let now = Timestamp::now();
        Self {
            id: CardId::new(),
            column_id,
            title: title.into(),
            description: None,
            notes: None,
            due_date: None,
            position,
            created_at: now,
            updated_at: now,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_due_date(mut self, due_date: NaiveDate) -> Self {
        self.due_date = Some(due_date);
        self
    }

    /// True when the card has a due date strictly before `today`.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.due_date.is_some_and(|due| due < today)
    }
}

impl Positioned for Card {
    type Id = CardId;
    type ParentKey = ColumnId;

    fn id(&self) -> CardId {
        self.id
    }

    fn parent_key(&self) -> ColumnId {
        self.column_id
    }

    fn position(&self) -> u32 {
        self.position
    }

    fn set_position(&mut self, position: u32) {
        self.position = position;
    }

    fn set_parent_key(&mut self, parent_key: ColumnId) {
        self.column_id = parent_key;
    }
}

/// A colored tag defined per board and attached to any of its cards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub id: LabelId,
    pub board_id: BoardId,
    pub name: String,
    /// CSS-style color string, stored verbatim (e.g. `#ef4444`).
    pub color: String,
}

impl Label {
    pub fn new(board_id: BoardId, name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id: LabelId::new(),
            board_id,
            name: name.into(),
            color: color.into(),
        }
    }
}

/// Link between a card and one of its board's labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CardLabel {
    pub card_id: CardId,
    pub label_id: LabelId,
}

/// A persisted key/value application setting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Setting {
    pub key: String,
    pub value: String,
}
