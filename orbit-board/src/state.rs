//! The application state owned by the controller, and the notifications
//! published when it changes.

use crate::moves::MoveKey;
use orbit_model::{Board, Card, CardLabel, Column, Label, Positioned};
use orbit_order::{OrderResult, check_invariants};
use orbit_types::{BoardId, CardId, ColumnId};
use std::collections::HashMap;
use std::fmt::Display;

/// Everything the views render.
///
/// Columns are kept in display order and every column has an entry in
/// `cards`, also in display order. Only the selected board's columns,
/// cards and labels are loaded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoardState {
    pub boards: Vec<Board>,
    pub current: Option<BoardId>,
    pub columns: Vec<Column>,
    pub cards: HashMap<ColumnId, Vec<Card>>,
    pub labels: Vec<Label>,
    pub card_labels: Vec<CardLabel>,
}

impl BoardState {
    pub fn current_board(&self) -> Option<&Board> {
        let id = self.current?;
        self.boards.iter().find(|b| b.id == id)
    }

    pub fn column(&self, id: ColumnId) -> Option<&Column> {
        self.columns.iter().find(|c| c.id == id)
    }

    /// Cards of a column in display order; empty for unknown columns.
    pub fn cards_in(&self, column: ColumnId) -> &[Card] {
        self.cards.get(&column).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn card(&self, id: CardId) -> Option<&Card> {
        self.cards.values().flatten().find(|c| c.id == id)
    }

    /// Labels attached to a card.
    pub fn labels_of(&self, card: CardId) -> Vec<&Label> {
        self.labels
            .iter()
            .filter(|l| {
                self.card_labels
                    .iter()
                    .any(|link| link.card_id == card && link.label_id == l.id)
            })
            .collect()
    }

    /// Checks that the columns and every card scope are dense.
    pub fn check_invariants(&self) -> OrderResult<()> {
        check_invariants(&self.columns)?;
        for cards in self.cards.values() {
            check_invariants(cards)?;
        }
        Ok(())
    }

    pub(crate) fn clear_board(&mut self) {
        self.current = None;
        self.columns.clear();
        self.cards.clear();
        self.labels.clear();
        self.card_labels.clear();
    }

    pub(crate) fn drop_cards_of(&mut self, column: ColumnId) {
        if let Some(cards) = self.cards.remove(&column) {
            self.card_labels
                .retain(|link| !cards.iter().any(|c| c.id == link.card_id));
        }
    }
}

/// What changed. Subscribers re-read the projections they care about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateChange {
    /// The board list changed.
    Boards,
    /// A different board (or none) is now selected.
    Selected(Option<BoardId>),
    /// Columns of the selected board changed.
    Columns(BoardId),
    /// The cards of these columns changed.
    Cards(Vec<ColumnId>),
    /// Labels or card/label links of the selected board changed.
    Labels(BoardId),
    /// A move was reverted after the store rejected it.
    MoveRolledBack { message: String },
}

/// Access to one kind of positioned record inside [`BoardState`], so the
/// move flow can be written once for columns and cards.
pub(crate) trait Scoped:
    Positioned<Id: Send + Sync + Display + 'static, ParentKey: Send + Sync + Display + 'static> + Send + Sync + 'static
{
    /// Parent of `id` in the loaded state.
    fn locate(state: &BoardState, id: Self::Id) -> Option<Self::ParentKey>;

    /// The loaded scope under `parent`, or `None` if `parent` is not loaded.
    fn scope(state: &BoardState, parent: Self::ParentKey) -> Option<Vec<Self>>;

    fn replace_scope(state: &mut BoardState, parent: Self::ParentKey, scope: Vec<Self>);

    fn changed(parents: &[Self::ParentKey]) -> StateChange;

    fn move_key(id: Self::Id) -> MoveKey;

    /// Key for the sibling order under `parent`.
    fn scope_key(parent: Self::ParentKey) -> MoveKey;
}

impl Scoped for Column {
    fn locate(state: &BoardState, id: ColumnId) -> Option<BoardId> {
        state.column(id).map(|c| c.board_id)
    }

    fn scope(state: &BoardState, parent: BoardId) -> Option<Vec<Column>> {
        (state.current == Some(parent)).then(|| state.columns.clone())
    }

    fn replace_scope(state: &mut BoardState, parent: BoardId, scope: Vec<Column>) {
        if state.current == Some(parent) {
            state.columns = scope;
        }
    }

    fn changed(parents: &[BoardId]) -> StateChange {
        match parents.first() {
            Some(board) => StateChange::Columns(*board),
            None => StateChange::Boards,
        }
    }

    fn move_key(id: ColumnId) -> MoveKey {
        MoveKey::Column(id)
    }

    fn scope_key(parent: BoardId) -> MoveKey {
        MoveKey::ColumnsOf(parent)
    }
}

impl Scoped for Card {
    fn locate(state: &BoardState, id: CardId) -> Option<ColumnId> {
        state.card(id).map(|c| c.column_id)
    }

    fn scope(state: &BoardState, parent: ColumnId) -> Option<Vec<Card>> {
        state.column(parent)?;
        Some(state.cards_in(parent).to_vec())
    }

    fn replace_scope(state: &mut BoardState, parent: ColumnId, scope: Vec<Card>) {
        if state.column(parent).is_some() {
            state.cards.insert(parent, scope);
        }
    }

    fn changed(parents: &[ColumnId]) -> StateChange {
        StateChange::Cards(parents.to_vec())
    }

    fn move_key(id: CardId) -> MoveKey {
        MoveKey::Card(id)
    }

    fn scope_key(parent: ColumnId) -> MoveKey {
        MoveKey::CardsIn(parent)
    }
}
