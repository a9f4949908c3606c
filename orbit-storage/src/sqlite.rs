//! SQLite-backed [`BoardStore`].
//!
//! One connection behind a mutex. Multi-row writes run inside a
//! transaction so a failure part-way leaves nothing behind. Sibling
//! positions are deliberately not UNIQUE in the schema: a batch rewrites
//! rows one at a time and passes through transient duplicates before
//! committing a dense scope.

use crate::error::{StorageError, StorageResult};
use crate::store::{BoardStore, DEFAULT_SETTINGS};
use chrono::Utc;
use orbit_model::{
    Board, Card, CardLabel, CardPositionUpdate, Column, ColumnPositionUpdate, EXPORT_VERSION,
    ExportData, Label, Setting,
};
use orbit_order::normalize;
use orbit_types::{BoardId, CardId, ColumnId, LabelId, Timestamp};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, Transaction, params};
use std::path::Path;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS boards (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        description TEXT,
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL
    );

    CREATE TABLE IF NOT EXISTS columns (
        id TEXT PRIMARY KEY,
        board_id TEXT NOT NULL REFERENCES boards(id) ON DELETE CASCADE,
        name TEXT NOT NULL,
        position INTEGER NOT NULL DEFAULT 0,
        created_at INTEGER NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_columns_board ON columns(board_id, position);

    CREATE TABLE IF NOT EXISTS cards (
        id TEXT PRIMARY KEY,
        column_id TEXT NOT NULL REFERENCES columns(id) ON DELETE CASCADE,
        title TEXT NOT NULL,
        description TEXT,
        notes TEXT,
        due_date TEXT,
        position INTEGER NOT NULL DEFAULT 0,
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_cards_column ON cards(column_id, position);

    CREATE TABLE IF NOT EXISTS labels (
        id TEXT PRIMARY KEY,
        board_id TEXT NOT NULL REFERENCES boards(id) ON DELETE CASCADE,
        name TEXT NOT NULL,
        color TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS card_labels (
        card_id TEXT NOT NULL REFERENCES cards(id) ON DELETE CASCADE,
        label_id TEXT NOT NULL REFERENCES labels(id) ON DELETE CASCADE,
        PRIMARY KEY (card_id, label_id)
    );

    CREATE TABLE IF NOT EXISTS settings (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );
";

const COLUMN_FIELDS: &str = "id, board_id, name, position, created_at";
const CARD_FIELDS: &str =
    "id, column_id, title, description, notes, due_date, position, created_at, updated_at";

/// Persistent board store backed by SQLite.
pub struct SqliteBoardStore {
    conn: Mutex<Connection>,
}

impl SqliteBoardStore {
    /// Opens (or creates) a store at the given path.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        info!("Opened board store at {} (journal_mode={mode})", path.display());
        Self::init(conn)
    }

    /// Opens an in-memory store (for testing).
    pub fn open_in_memory() -> StorageResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> StorageResult<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;
        for (key, value) in DEFAULT_SETTINGS {
            conn.execute(
                "INSERT OR IGNORE INTO settings (key, value) VALUES (?1, ?2)",
                params![key, value],
            )?;
        }
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::LockPoisoned)
    }
}

// ── Row mapping ──────────────────────────────────────────────────

fn parse_id<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn board_from_row(row: &Row<'_>) -> rusqlite::Result<Board> {
    Ok(Board {
        id: parse_id(row, 0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        created_at: Timestamp::from_millis(row.get(3)?),
        updated_at: Timestamp::from_millis(row.get(4)?),
    })
}

fn column_from_row(row: &Row<'_>) -> rusqlite::Result<Column> {
    Ok(Column {
        id: parse_id(row, 0)?,
        board_id: parse_id(row, 1)?,
        name: row.get(2)?,
        position: row.get(3)?,
        created_at: Timestamp::from_millis(row.get(4)?),
    })
}

fn card_from_row(row: &Row<'_>) -> rusqlite::Result<Card> {
    Ok(Card {
        id: parse_id(row, 0)?,
        column_id: parse_id(row, 1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        notes: row.get(4)?,
        due_date: row.get(5)?,
        position: row.get(6)?,
        created_at: Timestamp::from_millis(row.get(7)?),
        updated_at: Timestamp::from_millis(row.get(8)?),
    })
}

fn label_from_row(row: &Row<'_>) -> rusqlite::Result<Label> {
    Ok(Label {
        id: parse_id(row, 0)?,
        board_id: parse_id(row, 1)?,
        name: row.get(2)?,
        color: row.get(3)?,
    })
}

// ── Transaction helpers ──────────────────────────────────────────

fn columns_in(tx: &Transaction<'_>, board_id: BoardId) -> StorageResult<Vec<Column>> {
    let mut stmt = tx.prepare(&format!(
        "SELECT {COLUMN_FIELDS} FROM columns WHERE board_id = ?1 ORDER BY position ASC, rowid ASC"
    ))?;
    let rows = stmt.query_map(params![board_id.to_string()], column_from_row)?;
    Ok(rows.collect::<Result<_, _>>()?)
}

fn cards_in(tx: &Transaction<'_>, column_id: ColumnId) -> StorageResult<Vec<Card>> {
    let mut stmt = tx.prepare(&format!(
        "SELECT {CARD_FIELDS} FROM cards WHERE column_id = ?1 ORDER BY position ASC, rowid ASC"
    ))?;
    let rows = stmt.query_map(params![column_id.to_string()], card_from_row)?;
    Ok(rows.collect::<Result<_, _>>()?)
}

/// Rewrites the positions of a board's columns to `0..n`.
fn compact_columns(tx: &Transaction<'_>, board_id: BoardId) -> StorageResult<()> {
    let before = columns_in(tx, board_id)?;
    let snapshot: Vec<u32> = before.iter().map(|c| c.position).collect();
    let mut stmt = tx.prepare("UPDATE columns SET position = ?1 WHERE id = ?2")?;
    for (column, old) in normalize(before).iter().zip(snapshot) {
        if column.position != old {
            stmt.execute(params![column.position, column.id.to_string()])?;
        }
    }
    Ok(())
}

/// Rewrites the positions of a column's cards to `0..n`.
fn compact_cards(tx: &Transaction<'_>, column_id: ColumnId) -> StorageResult<()> {
    let before = cards_in(tx, column_id)?;
    let snapshot: Vec<u32> = before.iter().map(|c| c.position).collect();
    let mut stmt = tx.prepare("UPDATE cards SET position = ?1 WHERE id = ?2")?;
    for (card, old) in normalize(before).iter().zip(snapshot) {
        if card.position != old {
            stmt.execute(params![card.position, card.id.to_string()])?;
        }
    }
    Ok(())
}

fn insert_column(tx: &Transaction<'_>, column: &Column) -> StorageResult<()> {
    tx.execute(
        "INSERT INTO columns (id, board_id, name, position, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            column.id.to_string(),
            column.board_id.to_string(),
            column.name,
            column.position,
            column.created_at.as_millis(),
        ],
    )?;
    Ok(())
}

fn insert_card(tx: &Transaction<'_>, card: &Card) -> StorageResult<()> {
    tx.execute(
        "INSERT INTO cards (id, column_id, title, description, notes, due_date, position, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            card.id.to_string(),
            card.column_id.to_string(),
            card.title,
            card.description,
            card.notes,
            card.due_date,
            card.position,
            card.created_at.as_millis(),
            card.updated_at.as_millis(),
        ],
    )?;
    Ok(())
}

fn count_rows(tx: &Transaction<'_>, sql: &str, parent: String) -> StorageResult<u32> {
    Ok(tx.query_row(sql, params![parent], |row| row.get(0))?)
}

/// `NotFound` unless `table` has a row with `id`. Runs ahead of inserts
/// that would otherwise fail on a foreign key.
fn require(conn: &Connection, table: &str, kind: &str, id: String) -> StorageResult<()> {
    let found = conn
        .query_row(
            &format!("SELECT 1 FROM {table} WHERE id = ?1"),
            params![id],
            |_| Ok(()),
        )
        .optional()?;
    found.ok_or_else(|| StorageError::NotFound(format!("{kind} {id}")))
}

impl BoardStore for SqliteBoardStore {
    // ── Boards ───────────────────────────────────────────────────

    fn list_boards(&self) -> StorageResult<Vec<Board>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, description, created_at, updated_at FROM boards
             ORDER BY updated_at DESC, rowid DESC",
        )?;
        let rows = stmt.query_map([], board_from_row)?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    fn get_board(&self, id: BoardId) -> StorageResult<Option<Board>> {
        let conn = self.lock()?;
        Ok(conn
            .query_row(
                "SELECT id, name, description, created_at, updated_at FROM boards WHERE id = ?1",
                params![id.to_string()],
                board_from_row,
            )
            .optional()?)
    }

    fn create_board(&self, board: &Board, columns: &[Column]) -> StorageResult<Vec<Column>> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO boards (id, name, description, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                board.id.to_string(),
                board.name,
                board.description,
                board.created_at.as_millis(),
                board.updated_at.as_millis(),
            ],
        )?;

        let mut created = Vec::with_capacity(columns.len());
        for (position, column) in columns.iter().enumerate() {
            let column = Column {
                board_id: board.id,
                position: position as u32,
                ..column.clone()
            };
            insert_column(&tx, &column)?;
            created.push(column);
        }
        tx.commit()?;

        debug!("Created board {} with {} columns", board.id, created.len());
        Ok(created)
    }

    fn update_board(&self, board: &Board) -> StorageResult<Board> {
        let conn = self.lock()?;
        let changed = conn.execute(
            "UPDATE boards SET name = ?1, description = ?2, updated_at = ?3 WHERE id = ?4",
            params![
                board.name,
                board.description,
                board.updated_at.tick().as_millis(),
                board.id.to_string(),
            ],
        )?;
        if changed == 0 {
            return Err(StorageError::NotFound(format!("board {}", board.id)));
        }
        Ok(conn.query_row(
            "SELECT id, name, description, created_at, updated_at FROM boards WHERE id = ?1",
            params![board.id.to_string()],
            board_from_row,
        )?)
    }

    fn delete_board(&self, id: BoardId) -> StorageResult<()> {
        let conn = self.lock()?;
        let removed = conn.execute("DELETE FROM boards WHERE id = ?1", params![id.to_string()])?;
        debug!("Deleted board {id} ({removed} rows)");
        Ok(())
    }

    // ── Columns ──────────────────────────────────────────────────

    fn list_columns(&self, board_id: BoardId) -> StorageResult<Vec<Column>> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let columns = columns_in(&tx, board_id)?;
        tx.commit()?;
        Ok(columns)
    }

    fn get_column(&self, id: ColumnId) -> StorageResult<Option<Column>> {
        let conn = self.lock()?;
        Ok(conn
            .query_row(
                &format!("SELECT {COLUMN_FIELDS} FROM columns WHERE id = ?1"),
                params![id.to_string()],
                column_from_row,
            )
            .optional()?)
    }

    fn create_column(&self, column: &Column) -> StorageResult<Column> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        require(&tx, "boards", "board", column.board_id.to_string())?;
        let position = count_rows(
            &tx,
            "SELECT COUNT(*) FROM columns WHERE board_id = ?1",
            column.board_id.to_string(),
        )?;
        let stored = Column {
            position,
            ..column.clone()
        };
        insert_column(&tx, &stored)?;
        tx.commit()?;
        Ok(stored)
    }

    fn update_column(&self, column: &Column) -> StorageResult<Column> {
        let conn = self.lock()?;
        let changed = conn.execute(
            "UPDATE columns SET name = ?1 WHERE id = ?2",
            params![column.name, column.id.to_string()],
        )?;
        if changed == 0 {
            return Err(StorageError::NotFound(format!("column {}", column.id)));
        }
        Ok(conn.query_row(
            &format!("SELECT {COLUMN_FIELDS} FROM columns WHERE id = ?1"),
            params![column.id.to_string()],
            column_from_row,
        )?)
    }

    fn delete_column(&self, id: ColumnId) -> StorageResult<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let board_id: Option<BoardId> = tx
            .query_row(
                "SELECT board_id FROM columns WHERE id = ?1",
                params![id.to_string()],
                |row| parse_id(row, 0),
            )
            .optional()?;
        let Some(board_id) = board_id else {
            return Ok(());
        };
        tx.execute("DELETE FROM columns WHERE id = ?1", params![id.to_string()])?;
        compact_columns(&tx, board_id)?;
        tx.commit()?;
        debug!("Deleted column {id} from board {board_id}");
        Ok(())
    }

    fn update_column_positions(&self, updates: &[ColumnPositionUpdate]) -> StorageResult<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        {
            let mut stmt =
                tx.prepare("UPDATE columns SET position = ?1 WHERE id = ?2 AND board_id = ?3")?;
            for update in updates {
                let changed = stmt.execute(params![
                    update.position,
                    update.id.to_string(),
                    update.parent_key.to_string(),
                ])?;
                if changed == 0 {
                    return Err(StorageError::NotFound(format!(
                        "column {} on board {}",
                        update.id, update.parent_key
                    )));
                }
            }
        }
        tx.commit()?;
        debug!("Applied {} column position updates", updates.len());
        Ok(())
    }

    // ── Cards ────────────────────────────────────────────────────

    fn list_cards(&self, column_id: ColumnId) -> StorageResult<Vec<Card>> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let cards = cards_in(&tx, column_id)?;
        tx.commit()?;
        Ok(cards)
    }

    fn list_cards_by_board(&self, board_id: BoardId) -> StorageResult<Vec<Card>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT c.id, c.column_id, c.title, c.description, c.notes, c.due_date, c.position,
                    c.created_at, c.updated_at
             FROM cards c
             JOIN columns col ON c.column_id = col.id
             WHERE col.board_id = ?1
             ORDER BY col.position ASC, c.position ASC, c.rowid ASC",
        )?;
        let rows = stmt.query_map(params![board_id.to_string()], card_from_row)?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    fn get_card(&self, id: CardId) -> StorageResult<Option<Card>> {
        let conn = self.lock()?;
        Ok(conn
            .query_row(
                &format!("SELECT {CARD_FIELDS} FROM cards WHERE id = ?1"),
                params![id.to_string()],
                card_from_row,
            )
            .optional()?)
    }

    fn create_card(&self, card: &Card) -> StorageResult<Card> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        require(&tx, "columns", "column", card.column_id.to_string())?;
        let position = count_rows(
            &tx,
            "SELECT COUNT(*) FROM cards WHERE column_id = ?1",
            card.column_id.to_string(),
        )?;
        let stored = Card {
            position,
            ..card.clone()
        };
        insert_card(&tx, &stored)?;
        tx.commit()?;
        Ok(stored)
    }

    fn update_card(&self, card: &Card) -> StorageResult<Card> {
        let conn = self.lock()?;
        let changed = conn.execute(
            "UPDATE cards SET title = ?1, description = ?2, notes = ?3, due_date = ?4, updated_at = ?5
             WHERE id = ?6",
            params![
                card.title,
                card.description,
                card.notes,
                card.due_date,
                card.updated_at.tick().as_millis(),
                card.id.to_string(),
            ],
        )?;
        if changed == 0 {
            return Err(StorageError::NotFound(format!("card {}", card.id)));
        }
        Ok(conn.query_row(
            &format!("SELECT {CARD_FIELDS} FROM cards WHERE id = ?1"),
            params![card.id.to_string()],
            card_from_row,
        )?)
    }

    fn delete_card(&self, id: CardId) -> StorageResult<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let column_id: Option<ColumnId> = tx
            .query_row(
                "SELECT column_id FROM cards WHERE id = ?1",
                params![id.to_string()],
                |row| parse_id(row, 0),
            )
            .optional()?;
        let Some(column_id) = column_id else {
            return Ok(());
        };
        tx.execute("DELETE FROM cards WHERE id = ?1", params![id.to_string()])?;
        compact_cards(&tx, column_id)?;
        tx.commit()?;
        debug!("Deleted card {id} from column {column_id}");
        Ok(())
    }

    fn update_card_positions(&self, updates: &[CardPositionUpdate]) -> StorageResult<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let now = Timestamp::now().as_millis();
        {
            let mut stmt = tx.prepare(
                "UPDATE cards SET column_id = ?1, position = ?2, updated_at = ?3 WHERE id = ?4",
            )?;
            for update in updates {
                require(&tx, "columns", "column", update.parent_key.to_string())?;
                let changed = stmt.execute(params![
                    update.parent_key.to_string(),
                    update.position,
                    now,
                    update.id.to_string(),
                ])?;
                if changed == 0 {
                    return Err(StorageError::NotFound(format!("card {}", update.id)));
                }
            }
        }
        tx.commit()?;
        debug!("Applied {} card position updates", updates.len());
        Ok(())
    }

    // ── Labels ───────────────────────────────────────────────────

    fn list_labels(&self, board_id: BoardId) -> StorageResult<Vec<Label>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, board_id, name, color FROM labels WHERE board_id = ?1 ORDER BY rowid",
        )?;
        let rows = stmt.query_map(params![board_id.to_string()], label_from_row)?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    fn create_label(&self, label: &Label) -> StorageResult<Label> {
        let conn = self.lock()?;
        require(&conn, "boards", "board", label.board_id.to_string())?;
        conn.execute(
            "INSERT INTO labels (id, board_id, name, color) VALUES (?1, ?2, ?3, ?4)",
            params![
                label.id.to_string(),
                label.board_id.to_string(),
                label.name,
                label.color,
            ],
        )?;
        Ok(label.clone())
    }

    fn update_label(&self, label: &Label) -> StorageResult<Label> {
        let conn = self.lock()?;
        let changed = conn.execute(
            "UPDATE labels SET name = ?1, color = ?2 WHERE id = ?3",
            params![label.name, label.color, label.id.to_string()],
        )?;
        if changed == 0 {
            return Err(StorageError::NotFound(format!("label {}", label.id)));
        }
        Ok(label.clone())
    }

    fn delete_label(&self, id: LabelId) -> StorageResult<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM labels WHERE id = ?1", params![id.to_string()])?;
        Ok(())
    }

    fn card_labels(&self, card_id: CardId) -> StorageResult<Vec<Label>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT l.id, l.board_id, l.name, l.color FROM labels l
             JOIN card_labels cl ON l.id = cl.label_id
             WHERE cl.card_id = ?1
             ORDER BY l.rowid",
        )?;
        let rows = stmt.query_map(params![card_id.to_string()], label_from_row)?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    fn list_card_labels_by_board(&self, board_id: BoardId) -> StorageResult<Vec<CardLabel>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT cl.card_id, cl.label_id FROM card_labels cl
             JOIN labels l ON l.id = cl.label_id
             WHERE l.board_id = ?1
             ORDER BY cl.rowid",
        )?;
        let rows = stmt.query_map(params![board_id.to_string()], |row| {
            Ok(CardLabel {
                card_id: parse_id(row, 0)?,
                label_id: parse_id(row, 1)?,
            })
        })?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    fn add_label_to_card(&self, card_id: CardId, label_id: LabelId) -> StorageResult<()> {
        let conn = self.lock()?;
        require(&conn, "cards", "card", card_id.to_string())?;
        require(&conn, "labels", "label", label_id.to_string())?;
        conn.execute(
            "INSERT OR IGNORE INTO card_labels (card_id, label_id) VALUES (?1, ?2)",
            params![card_id.to_string(), label_id.to_string()],
        )?;
        Ok(())
    }

    fn remove_label_from_card(&self, card_id: CardId, label_id: LabelId) -> StorageResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "DELETE FROM card_labels WHERE card_id = ?1 AND label_id = ?2",
            params![card_id.to_string(), label_id.to_string()],
        )?;
        Ok(())
    }

    // ── Settings ─────────────────────────────────────────────────

    fn get_setting(&self, key: &str) -> StorageResult<Option<String>> {
        let conn = self.lock()?;
        Ok(conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?)
    }

    fn set_setting(&self, key: &str, value: &str) -> StorageResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO settings (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    // ── Snapshot ─────────────────────────────────────────────────

    fn export_data(&self) -> StorageResult<ExportData> {
        let conn = self.lock()?;

        let boards = conn
            .prepare("SELECT id, name, description, created_at, updated_at FROM boards ORDER BY rowid")?
            .query_map([], board_from_row)?
            .collect::<Result<_, _>>()?;
        let columns = conn
            .prepare(&format!("SELECT {COLUMN_FIELDS} FROM columns ORDER BY board_id, position"))?
            .query_map([], column_from_row)?
            .collect::<Result<_, _>>()?;
        let cards = conn
            .prepare(&format!("SELECT {CARD_FIELDS} FROM cards ORDER BY column_id, position"))?
            .query_map([], card_from_row)?
            .collect::<Result<_, _>>()?;
        let labels = conn
            .prepare("SELECT id, board_id, name, color FROM labels ORDER BY rowid")?
            .query_map([], label_from_row)?
            .collect::<Result<_, _>>()?;
        let card_labels = conn
            .prepare("SELECT card_id, label_id FROM card_labels ORDER BY rowid")?
            .query_map([], |row| {
                Ok(CardLabel {
                    card_id: parse_id(row, 0)?,
                    label_id: parse_id(row, 1)?,
                })
            })?
            .collect::<Result<_, _>>()?;
        let settings = conn
            .prepare("SELECT key, value FROM settings ORDER BY key")?
            .query_map([], |row| {
                Ok(Setting {
                    key: row.get(0)?,
                    value: row.get(1)?,
                })
            })?
            .collect::<Result<_, _>>()?;

        Ok(ExportData {
            version: EXPORT_VERSION.to_string(),
            export_date: Utc::now(),
            boards,
            columns,
            cards,
            labels,
            card_labels,
            settings,
        })
    }

    fn import_data(&self, data: &ExportData) -> StorageResult<()> {
        if data.version.trim().is_empty() {
            return Err(StorageError::InvalidData(
                "import file has no version".to_string(),
            ));
        }

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        tx.execute_batch(
            "DELETE FROM card_labels;
             DELETE FROM labels;
             DELETE FROM cards;
             DELETE FROM columns;
             DELETE FROM boards;",
        )?;

        for board in &data.boards {
            tx.execute(
                "INSERT INTO boards (id, name, description, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    board.id.to_string(),
                    board.name,
                    board.description,
                    board.created_at.as_millis(),
                    board.updated_at.as_millis(),
                ],
            )?;
        }
        for column in &data.columns {
            insert_column(&tx, column)?;
        }
        for card in &data.cards {
            insert_card(&tx, card)?;
        }
        for label in &data.labels {
            tx.execute(
                "INSERT INTO labels (id, board_id, name, color) VALUES (?1, ?2, ?3, ?4)",
                params![
                    label.id.to_string(),
                    label.board_id.to_string(),
                    label.name,
                    label.color,
                ],
            )?;
        }
        for link in &data.card_labels {
            tx.execute(
                "INSERT OR IGNORE INTO card_labels (card_id, label_id) VALUES (?1, ?2)",
                params![link.card_id.to_string(), link.label_id.to_string()],
            )?;
        }
        for setting in &data.settings {
            tx.execute(
                "INSERT OR REPLACE INTO settings (key, value) VALUES (?1, ?2)",
                params![setting.key, setting.value],
            )?;
        }

        // Imports from older builds may carry gappy positions.
        for board in &data.boards {
            compact_columns(&tx, board.id)?;
        }
        for column in &data.columns {
            compact_cards(&tx, column.id)?;
        }
        tx.commit()?;

        info!(
            "Imported {} boards, {} columns, {} cards",
            data.boards.len(),
            data.columns.len(),
            data.cards.len()
        );
        Ok(())
    }
}
