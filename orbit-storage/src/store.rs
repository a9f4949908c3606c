use crate::error::StorageResult;
use orbit_model::{
    Board, Card, CardLabel, CardPositionUpdate, Column, ColumnPositionUpdate, ExportData, Label,
    PositionUpdate, Positioned,
};
use orbit_types::{BoardId, CardId, ColumnId, LabelId};

/// Settings seeded into a fresh database.
pub const DEFAULT_SETTINGS: &[(&str, &str)] = &[("darkMode", "false")];

/// Everything the application persists.
///
/// Implementations must keep each sibling scope dense on every method that
/// adds or removes a positioned record, and must apply position batches
/// atomically.
pub trait BoardStore: Send + Sync {
    // ── Boards ───────────────────────────────────────────────────

    /// All boards, most recently updated first.
    fn list_boards(&self) -> StorageResult<Vec<Board>>;

    fn get_board(&self, id: BoardId) -> StorageResult<Option<Board>>;

    /// Inserts a board together with its initial columns in one transaction.
    /// Column positions are assigned `0..n` in slice order.
    fn create_board(&self, board: &Board, columns: &[Column]) -> StorageResult<Vec<Column>>;

    /// Updates name and description and bumps `updated_at`.
    fn update_board(&self, board: &Board) -> StorageResult<Board>;

    /// Deletes a board and everything it owns. Unknown ids are a no-op.
    fn delete_board(&self, id: BoardId) -> StorageResult<()>;

    // ── Columns ──────────────────────────────────────────────────

    /// Columns of a board, ascending by position.
    fn list_columns(&self, board_id: BoardId) -> StorageResult<Vec<Column>>;

    fn get_column(&self, id: ColumnId) -> StorageResult<Option<Column>>;

    /// Appends a column to its board; the stored position is the board's
    /// current column count regardless of `column.position`.
    fn create_column(&self, column: &Column) -> StorageResult<Column>;

    /// Renames a column. Position and board are not touched.
    fn update_column(&self, column: &Column) -> StorageResult<Column>;

    /// Deletes a column with its cards and compacts the remaining columns.
    /// Unknown ids are a no-op.
    fn delete_column(&self, id: ColumnId) -> StorageResult<()>;

    /// Applies a column position batch atomically.
    fn update_column_positions(&self, updates: &[ColumnPositionUpdate]) -> StorageResult<()>;

    // ── Cards ────────────────────────────────────────────────────

    /// Cards of a column, ascending by position.
    fn list_cards(&self, column_id: ColumnId) -> StorageResult<Vec<Card>>;

    /// Cards of every column of a board, by column position then card position.
    fn list_cards_by_board(&self, board_id: BoardId) -> StorageResult<Vec<Card>>;

    fn get_card(&self, id: CardId) -> StorageResult<Option<Card>>;

    /// Appends a card to its column; the stored position is the column's
    /// current card count regardless of `card.position`.
    fn create_card(&self, card: &Card) -> StorageResult<Card>;

    /// Updates title, description, notes and due date and bumps `updated_at`.
    /// Column and position are not touched.
    fn update_card(&self, card: &Card) -> StorageResult<Card>;

    /// Deletes a card with its label links and compacts its column.
    /// Unknown ids are a no-op.
    fn delete_card(&self, id: CardId) -> StorageResult<()>;

    /// Applies a card position batch (including column changes) atomically.
    fn update_card_positions(&self, updates: &[CardPositionUpdate]) -> StorageResult<()>;

    // ── Labels ───────────────────────────────────────────────────

    fn list_labels(&self, board_id: BoardId) -> StorageResult<Vec<Label>>;

    fn create_label(&self, label: &Label) -> StorageResult<Label>;

    fn update_label(&self, label: &Label) -> StorageResult<Label>;

    /// Deletes a label and detaches it from every card.
    fn delete_label(&self, id: LabelId) -> StorageResult<()>;

    /// Labels attached to a card.
    fn card_labels(&self, card_id: CardId) -> StorageResult<Vec<Label>>;

    /// Every card/label link on a board.
    fn list_card_labels_by_board(&self, board_id: BoardId) -> StorageResult<Vec<CardLabel>>;

    /// Attaches a label; attaching twice is a no-op.
    fn add_label_to_card(&self, card_id: CardId, label_id: LabelId) -> StorageResult<()>;

    fn remove_label_from_card(&self, card_id: CardId, label_id: LabelId) -> StorageResult<()>;

    // ── Settings ─────────────────────────────────────────────────

    fn get_setting(&self, key: &str) -> StorageResult<Option<String>>;

    fn set_setting(&self, key: &str, value: &str) -> StorageResult<()>;

    // ── Snapshot ─────────────────────────────────────────────────

    fn export_data(&self) -> StorageResult<ExportData>;

    /// Replaces the entire database contents with `data`.
    fn import_data(&self, data: &ExportData) -> StorageResult<()>;
}

/// The persistence capabilities the reorder flow needs for one kind of
/// positioned record.
///
/// Implemented for every [`BoardStore`] for both [`Column`] and [`Card`].
pub trait SiblingStore<T: Positioned> {
    /// The scope under `parent`, ascending by position.
    fn list_siblings(&self, parent: T::ParentKey) -> StorageResult<Vec<T>>;

    /// Applies `(id, parent_key, position)` rows atomically.
    fn batch_update_positions(
        &self,
        updates: &[PositionUpdate<T::Id, T::ParentKey>],
    ) -> StorageResult<()>;

    /// Appends `entity` to its scope and returns it as stored.
    fn create_entity(&self, entity: &T) -> StorageResult<T>;

    /// Deletes `id` and compacts its scope.
    fn delete_entity(&self, id: T::Id) -> StorageResult<()>;

    /// Deletes the container `parent` and everything below it.
    fn delete_container(&self, parent: T::ParentKey) -> StorageResult<()>;
}

impl<S: BoardStore + ?Sized> SiblingStore<Column> for S {
    fn list_siblings(&self, parent: BoardId) -> StorageResult<Vec<Column>> {
        self.list_columns(parent)
    }

    fn batch_update_positions(&self, updates: &[ColumnPositionUpdate]) -> StorageResult<()> {
        self.update_column_positions(updates)
    }

    fn create_entity(&self, entity: &Column) -> StorageResult<Column> {
        self.create_column(entity)
    }

    fn delete_entity(&self, id: ColumnId) -> StorageResult<()> {
        self.delete_column(id)
    }

    fn delete_container(&self, parent: BoardId) -> StorageResult<()> {
        self.delete_board(parent)
    }
}

impl<S: BoardStore + ?Sized> SiblingStore<Card> for S {
    fn list_siblings(&self, parent: ColumnId) -> StorageResult<Vec<Card>> {
        self.list_cards(parent)
    }

    fn batch_update_positions(&self, updates: &[CardPositionUpdate]) -> StorageResult<()> {
        self.update_card_positions(updates)
    }

    fn create_entity(&self, entity: &Card) -> StorageResult<Card> {
        self.create_card(entity)
    }

    fn delete_entity(&self, id: CardId) -> StorageResult<()> {
        self.delete_card(id)
    }

    fn delete_container(&self, parent: ColumnId) -> StorageResult<()> {
        self.delete_column(parent)
    }
}
