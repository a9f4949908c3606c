//! Messages accepted by [`BoardController::dispatch`](crate::BoardController::dispatch).

use crate::moves::MoveStatus;
use chrono::NaiveDate;
use orbit_model::{Board, Card, Column, Label};
use orbit_types::{BoardId, CardId, ColumnId, LabelId};

/// A user-level mutation of the board state.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    LoadBoards,
    SelectBoard(BoardId),
    CreateBoard {
        name: String,
        description: Option<String>,
    },
    UpdateBoard {
        id: BoardId,
        name: String,
        description: Option<String>,
    },
    DeleteBoard(BoardId),

    CreateColumn {
        name: String,
    },
    RenameColumn {
        id: ColumnId,
        name: String,
    },
    DeleteColumn(ColumnId),
    MoveColumn {
        id: ColumnId,
        index: usize,
    },

    CreateCard {
        column: ColumnId,
        title: String,
        description: Option<String>,
    },
    UpdateCard(CardEdit),
    DeleteCard(CardId),
    MoveCard {
        id: CardId,
        column: ColumnId,
        index: usize,
    },

    CreateLabel {
        name: String,
        color: String,
    },
    UpdateLabel {
        id: LabelId,
        name: String,
        color: String,
    },
    DeleteLabel(LabelId),
    AttachLabel {
        card: CardId,
        label: LabelId,
    },
    DetachLabel {
        card: CardId,
        label: LabelId,
    },
}

/// The editable fields of a card. `None` leaves a field as it is; use
/// `Some(None)` to clear an optional one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CardEdit {
    pub id: CardId,
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub notes: Option<Option<String>>,
    pub due_date: Option<Option<NaiveDate>>,
}

impl CardEdit {
    pub fn new(id: CardId) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: Option<String>) -> Self {
        self.description = Some(description);
        self
    }

    #[must_use]
    pub fn notes(mut self, notes: Option<String>) -> Self {
        self.notes = Some(notes);
        self
    }

    #[must_use]
    pub fn due_date(mut self, due_date: Option<NaiveDate>) -> Self {
        self.due_date = Some(due_date);
        self
    }

    /// Folds a later edit of the same card into this one.
    pub fn merge(&mut self, later: CardEdit) {
        if later.title.is_some() {
            self.title = later.title;
        }
        if later.description.is_some() {
            self.description = later.description;
        }
        if later.notes.is_some() {
            self.notes = later.notes;
        }
        if later.due_date.is_some() {
            self.due_date = later.due_date;
        }
    }

    pub(crate) fn apply_to(&self, card: &mut Card) {
        if let Some(title) = &self.title {
            card.title = title.trim().to_string();
        }
        if let Some(description) = &self.description {
            card.description = description.clone();
        }
        if let Some(notes) = &self.notes {
            card.notes = notes.clone();
        }
        if let Some(due_date) = self.due_date {
            card.due_date = due_date;
        }
    }
}

/// What a dispatched intent produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Done,
    Board(Board),
    Column(Column),
    Card(Card),
    Label(Label),
    Moved(MoveStatus),
}
