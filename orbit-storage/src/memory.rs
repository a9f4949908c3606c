//! Process-local [`BoardStore`].
//!
//! Keeps every table in a `Vec` behind one mutex, so each method observes
//! and leaves a consistent snapshot. Besides backing previews it is the
//! store the controller tests run against: writes can be made to fail
//! ([`fail_next_writes`](MemoryBoardStore::fail_next_writes),
//! [`fail_position_batches`](MemoryBoardStore::fail_position_batches)) and
//! position batches can be held open
//! ([`pause_batches`](MemoryBoardStore::pause_batches)) to observe a move
//! while its write is in flight.

use crate::error::{StorageError, StorageResult};
use crate::store::{BoardStore, DEFAULT_SETTINGS};
use chrono::Utc;
use orbit_model::{
    Board, Card, CardLabel, CardPositionUpdate, Column, ColumnPositionUpdate, EXPORT_VERSION,
    ExportData, Label, Positioned, Setting,
};
use orbit_order::normalize;
use orbit_types::{BoardId, CardId, ColumnId, LabelId, Timestamp};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard};
use tracing::{debug, warn};

#[derive(Default)]
struct Tables {
    boards: Vec<Board>,
    columns: Vec<Column>,
    cards: Vec<Card>,
    labels: Vec<Label>,
    card_labels: Vec<CardLabel>,
    settings: BTreeMap<String, String>,
}

impl Tables {
    fn seeded() -> Self {
        let settings = DEFAULT_SETTINGS
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Self {
            settings,
            ..Self::default()
        }
    }

    fn column_cards(&self, column_id: ColumnId) -> Vec<Card> {
        let mut cards: Vec<Card> = self
            .cards
            .iter()
            .filter(|c| c.column_id == column_id)
            .cloned()
            .collect();
        cards.sort_by_key(|c| c.position);
        cards
    }

    fn remove_cards_of_columns(&mut self, columns: &HashSet<ColumnId>) {
        let doomed: HashSet<CardId> = self
            .cards
            .iter()
            .filter(|c| columns.contains(&c.column_id))
            .map(|c| c.id)
            .collect();
        self.cards.retain(|c| !doomed.contains(&c.id));
        self.card_labels.retain(|l| !doomed.contains(&l.card_id));
    }
}

/// Rewrites the positions of the `parent` scope inside `rows` to `0..n`,
/// keeping the current relative order.
fn compact<T: Positioned>(rows: &mut [T], parent: T::ParentKey) {
    let scope: Vec<T> = rows
        .iter()
        .filter(|r| r.parent_key() == parent)
        .cloned()
        .collect();
    let positions: HashMap<T::Id, u32> = normalize(scope)
        .iter()
        .map(|r| (r.id(), r.position()))
        .collect();
    for row in rows.iter_mut() {
        if let Some(&position) = positions.get(&row.id()) {
            row.set_position(position);
        }
    }
}

/// In-memory board store with failure injection.
pub struct MemoryBoardStore {
    tables: Mutex<Tables>,
    failing_writes: AtomicUsize,
    fail_batches: AtomicBool,
    paused: Mutex<bool>,
    resumed: Condvar,
    batches_applied: AtomicUsize,
}

impl Default for MemoryBoardStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBoardStore {
    /// Creates an empty store seeded with the default settings.
    pub fn new() -> Self {
        Self {
            tables: Mutex::new(Tables::seeded()),
            failing_writes: AtomicUsize::new(0),
            fail_batches: AtomicBool::new(false),
            paused: Mutex::new(false),
            resumed: Condvar::new(),
            batches_applied: AtomicUsize::new(0),
        }
    }

    /// Makes the next `count` write calls fail with [`StorageError::Injected`]
    /// without touching any data.
    pub fn fail_next_writes(&self, count: usize) {
        self.failing_writes.store(count, Ordering::SeqCst);
    }

    /// While set, every position batch fails with [`StorageError::Injected`].
    pub fn fail_position_batches(&self, fail: bool) {
        self.fail_batches.store(fail, Ordering::SeqCst);
    }

    /// Blocks position batches until [`resume_batches`](Self::resume_batches).
    pub fn pause_batches(&self) {
        if let Ok(mut paused) = self.paused.lock() {
            *paused = true;
        }
    }

    pub fn resume_batches(&self) {
        if let Ok(mut paused) = self.paused.lock() {
            *paused = false;
        }
        self.resumed.notify_all();
    }

    /// Number of position batches that were applied successfully.
    pub fn batches_applied(&self) -> usize {
        self.batches_applied.load(Ordering::SeqCst)
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, Tables>> {
        self.tables.lock().map_err(|_| StorageError::LockPoisoned)
    }

    fn check_write(&self, op: &str) -> StorageResult<()> {
        let injected = self
            .failing_writes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            warn!("Injected failure for {op}");
            return Err(StorageError::Injected(op.to_string()));
        }
        Ok(())
    }

    fn check_batch(&self, op: &str) -> StorageResult<()> {
        {
            let mut paused = self.paused.lock().map_err(|_| StorageError::LockPoisoned)?;
            while *paused {
                paused = self
                    .resumed
                    .wait(paused)
                    .map_err(|_| StorageError::LockPoisoned)?;
            }
        }
        if self.fail_batches.load(Ordering::SeqCst) {
            warn!("Injected batch failure for {op}");
            return Err(StorageError::Injected(op.to_string()));
        }
        self.check_write(op)
    }
}

impl BoardStore for MemoryBoardStore {
    // ── Boards ───────────────────────────────────────────────────

    fn list_boards(&self) -> StorageResult<Vec<Board>> {
        let tables = self.lock()?;
        let mut boards: Vec<Board> = tables.boards.iter().rev().cloned().collect();
        boards.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(boards)
    }

    fn get_board(&self, id: BoardId) -> StorageResult<Option<Board>> {
        Ok(self.lock()?.boards.iter().find(|b| b.id == id).cloned())
    }

    fn create_board(&self, board: &Board, columns: &[Column]) -> StorageResult<Vec<Column>> {
        self.check_write("create_board")?;
        let mut tables = self.lock()?;
        if tables.boards.iter().any(|b| b.id == board.id) {
            return Err(StorageError::InvalidData(format!("board {} exists", board.id)));
        }
        let created: Vec<Column> = columns
            .iter()
            .enumerate()
            .map(|(position, column)| Column {
                board_id: board.id,
                position: position as u32,
                ..column.clone()
            })
            .collect();
        tables.boards.push(board.clone());
        tables.columns.extend(created.iter().cloned());
        debug!("Created board {} with {} columns", board.id, created.len());
        Ok(created)
    }

    fn update_board(&self, board: &Board) -> StorageResult<Board> {
        self.check_write("update_board")?;
        let mut tables = self.lock()?;
        let stored = tables
            .boards
            .iter_mut()
            .find(|b| b.id == board.id)
            .ok_or_else(|| StorageError::NotFound(format!("board {}", board.id)))?;
        stored.name = board.name.clone();
        stored.description = board.description.clone();
        stored.updated_at = board.updated_at.tick();
        Ok(stored.clone())
    }

    fn delete_board(&self, id: BoardId) -> StorageResult<()> {
        self.check_write("delete_board")?;
        let mut tables = self.lock()?;
        let columns: HashSet<ColumnId> = tables
            .columns
            .iter()
            .filter(|c| c.board_id == id)
            .map(|c| c.id)
            .collect();
        tables.remove_cards_of_columns(&columns);
        let labels: HashSet<LabelId> = tables
            .labels
            .iter()
            .filter(|l| l.board_id == id)
            .map(|l| l.id)
            .collect();
        tables.card_labels.retain(|l| !labels.contains(&l.label_id));
        tables.labels.retain(|l| l.board_id != id);
        tables.columns.retain(|c| c.board_id != id);
        tables.boards.retain(|b| b.id != id);
        Ok(())
    }

    // ── Columns ──────────────────────────────────────────────────

    fn list_columns(&self, board_id: BoardId) -> StorageResult<Vec<Column>> {
        let tables = self.lock()?;
        let mut columns: Vec<Column> = tables
            .columns
            .iter()
            .filter(|c| c.board_id == board_id)
            .cloned()
            .collect();
        columns.sort_by_key(|c| c.position);
        Ok(columns)
    }

    fn get_column(&self, id: ColumnId) -> StorageResult<Option<Column>> {
        Ok(self.lock()?.columns.iter().find(|c| c.id == id).cloned())
    }

    fn create_column(&self, column: &Column) -> StorageResult<Column> {
        self.check_write("create_column")?;
        let mut tables = self.lock()?;
        if !tables.boards.iter().any(|b| b.id == column.board_id) {
            return Err(StorageError::NotFound(format!("board {}", column.board_id)));
        }
        let position = tables
            .columns
            .iter()
            .filter(|c| c.board_id == column.board_id)
            .count() as u32;
        let stored = Column {
            position,
            ..column.clone()
        };
        tables.columns.push(stored.clone());
        Ok(stored)
    }

    fn update_column(&self, column: &Column) -> StorageResult<Column> {
        self.check_write("update_column")?;
        let mut tables = self.lock()?;
        let stored = tables
            .columns
            .iter_mut()
            .find(|c| c.id == column.id)
            .ok_or_else(|| StorageError::NotFound(format!("column {}", column.id)))?;
        stored.name = column.name.clone();
        Ok(stored.clone())
    }

    fn delete_column(&self, id: ColumnId) -> StorageResult<()> {
        self.check_write("delete_column")?;
        let mut tables = self.lock()?;
        let Some(board_id) = tables
            .columns
            .iter()
            .find(|c| c.id == id)
            .map(|c| c.board_id)
        else {
            return Ok(());
        };
        tables.remove_cards_of_columns(&HashSet::from([id]));
        tables.columns.retain(|c| c.id != id);
        compact(&mut tables.columns, board_id);
        debug!("Deleted column {id} from board {board_id}");
        Ok(())
    }

    fn update_column_positions(&self, updates: &[ColumnPositionUpdate]) -> StorageResult<()> {
        self.check_batch("update_column_positions")?;
        let mut tables = self.lock()?;

        let mut targets = Vec::with_capacity(updates.len());
        for update in updates {
            let index = tables
                .columns
                .iter()
                .position(|c| c.id == update.id && c.board_id == update.parent_key)
                .ok_or_else(|| {
                    StorageError::NotFound(format!(
                        "column {} on board {}",
                        update.id, update.parent_key
                    ))
                })?;
            targets.push((index, update.position));
        }
        for (index, position) in targets {
            tables.columns[index].position = position;
        }

        self.batches_applied.fetch_add(1, Ordering::SeqCst);
        debug!("Applied {} column position updates", updates.len());
        Ok(())
    }

    // ── Cards ────────────────────────────────────────────────────

    fn list_cards(&self, column_id: ColumnId) -> StorageResult<Vec<Card>> {
        Ok(self.lock()?.column_cards(column_id))
    }

    fn list_cards_by_board(&self, board_id: BoardId) -> StorageResult<Vec<Card>> {
        let tables = self.lock()?;
        let mut columns: Vec<&Column> = tables
            .columns
            .iter()
            .filter(|c| c.board_id == board_id)
            .collect();
        columns.sort_by_key(|c| c.position);
        Ok(columns
            .into_iter()
            .flat_map(|c| tables.column_cards(c.id))
            .collect())
    }

    fn get_card(&self, id: CardId) -> StorageResult<Option<Card>> {
        Ok(self.lock()?.cards.iter().find(|c| c.id == id).cloned())
    }

    fn create_card(&self, card: &Card) -> StorageResult<Card> {
        self.check_write("create_card")?;
        let mut tables = self.lock()?;
        if !tables.columns.iter().any(|c| c.id == card.column_id) {
            return Err(StorageError::NotFound(format!("column {}", card.column_id)));
        }
        let position = tables
            .cards
            .iter()
            .filter(|c| c.column_id == card.column_id)
            .count() as u32;
        let stored = Card {
            position,
            ..card.clone()
        };
        tables.cards.push(stored.clone());
        Ok(stored)
    }

    fn update_card(&self, card: &Card) -> StorageResult<Card> {
        self.check_write("update_card")?;
        let mut tables = self.lock()?;
        let stored = tables
            .cards
            .iter_mut()
            .find(|c| c.id == card.id)
            .ok_or_else(|| StorageError::NotFound(format!("card {}", card.id)))?;
        stored.title = card.title.clone();
        stored.description = card.description.clone();
        stored.notes = card.notes.clone();
        stored.due_date = card.due_date;
        stored.updated_at = card.updated_at.tick();
        Ok(stored.clone())
    }

    fn delete_card(&self, id: CardId) -> StorageResult<()> {
        self.check_write("delete_card")?;
        let mut tables = self.lock()?;
        let Some(column_id) = tables
            .cards
            .iter()
            .find(|c| c.id == id)
            .map(|c| c.column_id)
        else {
            return Ok(());
        };
        tables.cards.retain(|c| c.id != id);
        tables.card_labels.retain(|l| l.card_id != id);
        compact(&mut tables.cards, column_id);
        debug!("Deleted card {id} from column {column_id}");
        Ok(())
    }

    fn update_card_positions(&self, updates: &[CardPositionUpdate]) -> StorageResult<()> {
        self.check_batch("update_card_positions")?;
        let mut tables = self.lock()?;

        let mut targets = Vec::with_capacity(updates.len());
        for update in updates {
            if !tables.columns.iter().any(|c| c.id == update.parent_key) {
                return Err(StorageError::NotFound(format!("column {}", update.parent_key)));
            }
            let index = tables
                .cards
                .iter()
                .position(|c| c.id == update.id)
                .ok_or_else(|| StorageError::NotFound(format!("card {}", update.id)))?;
            targets.push((index, update.parent_key, update.position));
        }
        let now = Timestamp::now();
        for (index, column_id, position) in targets {
            let card = &mut tables.cards[index];
            card.column_id = column_id;
            card.position = position;
            card.updated_at = now;
        }

        self.batches_applied.fetch_add(1, Ordering::SeqCst);
        debug!("Applied {} card position updates", updates.len());
        Ok(())
    }

    // ── Labels ───────────────────────────────────────────────────

    fn list_labels(&self, board_id: BoardId) -> StorageResult<Vec<Label>> {
        Ok(self
            .lock()?
            .labels
            .iter()
            .filter(|l| l.board_id == board_id)
            .cloned()
            .collect())
    }

    fn create_label(&self, label: &Label) -> StorageResult<Label> {
        self.check_write("create_label")?;
        let mut tables = self.lock()?;
        if !tables.boards.iter().any(|b| b.id == label.board_id) {
            return Err(StorageError::NotFound(format!("board {}", label.board_id)));
        }
        tables.labels.push(label.clone());
        Ok(label.clone())
    }

    fn update_label(&self, label: &Label) -> StorageResult<Label> {
        self.check_write("update_label")?;
        let mut tables = self.lock()?;
        let stored = tables
            .labels
            .iter_mut()
            .find(|l| l.id == label.id)
            .ok_or_else(|| StorageError::NotFound(format!("label {}", label.id)))?;
        stored.name = label.name.clone();
        stored.color = label.color.clone();
        Ok(stored.clone())
    }

    fn delete_label(&self, id: LabelId) -> StorageResult<()> {
        self.check_write("delete_label")?;
        let mut tables = self.lock()?;
        tables.card_labels.retain(|l| l.label_id != id);
        tables.labels.retain(|l| l.id != id);
        Ok(())
    }

    fn card_labels(&self, card_id: CardId) -> StorageResult<Vec<Label>> {
        let tables = self.lock()?;
        let attached: HashSet<LabelId> = tables
            .card_labels
            .iter()
            .filter(|l| l.card_id == card_id)
            .map(|l| l.label_id)
            .collect();
        Ok(tables
            .labels
            .iter()
            .filter(|l| attached.contains(&l.id))
            .cloned()
            .collect())
    }

    fn list_card_labels_by_board(&self, board_id: BoardId) -> StorageResult<Vec<CardLabel>> {
        let tables = self.lock()?;
        let labels: HashSet<LabelId> = tables
            .labels
            .iter()
            .filter(|l| l.board_id == board_id)
            .map(|l| l.id)
            .collect();
        Ok(tables
            .card_labels
            .iter()
            .filter(|l| labels.contains(&l.label_id))
            .copied()
            .collect())
    }

    fn add_label_to_card(&self, card_id: CardId, label_id: LabelId) -> StorageResult<()> {
        self.check_write("add_label_to_card")?;
        let mut tables = self.lock()?;
        if !tables.cards.iter().any(|c| c.id == card_id) {
            return Err(StorageError::NotFound(format!("card {card_id}")));
        }
        if !tables.labels.iter().any(|l| l.id == label_id) {
            return Err(StorageError::NotFound(format!("label {label_id}")));
        }
        let link = CardLabel { card_id, label_id };
        if !tables.card_labels.contains(&link) {
            tables.card_labels.push(link);
        }
        Ok(())
    }

    fn remove_label_from_card(&self, card_id: CardId, label_id: LabelId) -> StorageResult<()> {
        self.check_write("remove_label_from_card")?;
        self.lock()?
            .card_labels
            .retain(|l| !(l.card_id == card_id && l.label_id == label_id));
        Ok(())
    }

    // ── Settings ─────────────────────────────────────────────────

    fn get_setting(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.lock()?.settings.get(key).cloned())
    }

    fn set_setting(&self, key: &str, value: &str) -> StorageResult<()> {
        self.check_write("set_setting")?;
        self.lock()?
            .settings
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    // ── Snapshot ─────────────────────────────────────────────────

    fn export_data(&self) -> StorageResult<ExportData> {
        let tables = self.lock()?;
        Ok(ExportData {
            version: EXPORT_VERSION.to_string(),
            export_date: Utc::now(),
            boards: tables.boards.clone(),
            columns: tables.columns.clone(),
            cards: tables.cards.clone(),
            labels: tables.labels.clone(),
            card_labels: tables.card_labels.clone(),
            settings: tables
                .settings
                .iter()
                .map(|(key, value)| Setting {
                    key: key.clone(),
                    value: value.clone(),
                })
                .collect(),
        })
    }

    fn import_data(&self, data: &ExportData) -> StorageResult<()> {
        if data.version.trim().is_empty() {
            return Err(StorageError::InvalidData(
                "import file has no version".to_string(),
            ));
        }
        self.check_write("import_data")?;

        let boards: HashSet<BoardId> = data.boards.iter().map(|b| b.id).collect();
        let columns: HashSet<ColumnId> = data.columns.iter().map(|c| c.id).collect();
        let cards: HashSet<CardId> = data.cards.iter().map(|c| c.id).collect();
        let labels: HashSet<LabelId> = data.labels.iter().map(|l| l.id).collect();
        if let Some(column) = data.columns.iter().find(|c| !boards.contains(&c.board_id)) {
            return Err(StorageError::InvalidData(format!(
                "column {} references unknown board {}",
                column.id, column.board_id
            )));
        }
        if let Some(card) = data.cards.iter().find(|c| !columns.contains(&c.column_id)) {
            return Err(StorageError::InvalidData(format!(
                "card {} references unknown column {}",
                card.id, card.column_id
            )));
        }
        if let Some(label) = data.labels.iter().find(|l| !boards.contains(&l.board_id)) {
            return Err(StorageError::InvalidData(format!(
                "label {} references unknown board {}",
                label.id, label.board_id
            )));
        }

        let mut next = Tables {
            boards: data.boards.clone(),
            columns: data.columns.clone(),
            cards: data.cards.clone(),
            labels: data.labels.clone(),
            card_labels: Vec::new(),
            settings: self.lock()?.settings.clone(),
        };
        for link in &data.card_labels {
            if cards.contains(&link.card_id)
                && labels.contains(&link.label_id)
                && !next.card_labels.contains(link)
            {
                next.card_labels.push(*link);
            }
        }
        for setting in &data.settings {
            next.settings.insert(setting.key.clone(), setting.value.clone());
        }
        for board in &boards {
            compact(&mut next.columns, *board);
        }
        for column in &columns {
            compact(&mut next.cards, *column);
        }

        *self.lock()? = next;
        Ok(())
    }
}
