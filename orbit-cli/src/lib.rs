//! Command definitions and execution for the `orbit` binary.
//!
//! Every command runs through a [`BoardController`], selecting the board
//! that owns the addressed column or card first, and returns its result
//! as a JSON value.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use orbit_board::{BoardConfig, BoardController, CardEdit, MoveStatus};
use orbit_model::{Card, ExportData};
use orbit_storage::{BoardStore, SqliteBoardStore};
use orbit_types::{BoardId, CardId, ColumnId, LabelId};
use serde_json::{Value, json};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "orbit")]
#[command(about = "Local kanban boards from the command line")]
pub struct Cli {
    /// Path to the board database
    #[arg(long, default_value = "orbit.db", global = true)]
    pub db: PathBuf,

    /// Enable verbose debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage boards
    #[command(subcommand)]
    Board(BoardCommand),

    /// Manage the columns of a board
    #[command(subcommand)]
    Column(ColumnCommand),

    /// Manage cards
    #[command(subcommand)]
    Card(CardCommand),

    /// Manage labels
    #[command(subcommand)]
    Label(LabelCommand),

    /// Write the whole database to a JSON file
    Export { file: PathBuf },

    /// Replace the whole database with a JSON export
    Import { file: PathBuf },
}

#[derive(Subcommand, Debug)]
pub enum BoardCommand {
    /// List boards, most recently updated first
    List,
    /// Create a board with the default columns
    Create {
        name: String,
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Rename a board
    Rename {
        id: BoardId,
        name: String,
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Delete a board with all its columns, cards and labels
    Delete { id: BoardId },
}

#[derive(Subcommand, Debug)]
pub enum ColumnCommand {
    List { board: BoardId },
    /// Append a column to a board
    Add { board: BoardId, name: String },
    Rename { id: ColumnId, name: String },
    Delete { id: ColumnId },
    /// Move a column to a new index on its board
    Move { id: ColumnId, index: usize },
}

#[derive(Subcommand, Debug)]
pub enum CardCommand {
    List { column: ColumnId },
    /// Append a card to a column
    Add {
        column: ColumnId,
        title: String,
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Edit card fields
    Edit {
        id: CardId,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        notes: Option<String>,
        /// Due date as YYYY-MM-DD
        #[arg(long, conflicts_with = "clear_due")]
        due: Option<NaiveDate>,
        #[arg(long)]
        clear_due: bool,
    },
    Delete { id: CardId },
    /// Move a card within its column or into another one
    Move {
        id: CardId,
        /// Target column (defaults to the card's own column)
        #[arg(long)]
        column: Option<ColumnId>,
        #[arg(long)]
        index: usize,
    },
}

#[derive(Subcommand, Debug)]
pub enum LabelCommand {
    List { board: BoardId },
    Add {
        board: BoardId,
        name: String,
        color: String,
    },
    Delete { id: LabelId },
    /// Attach a label to a card
    Attach { card: CardId, label: LabelId },
    /// Detach a label from a card
    Detach { card: CardId, label: LabelId },
}

/// Opens the SQLite database at `path` behind a controller.
pub fn open_controller(path: &Path) -> Result<BoardController<SqliteBoardStore>> {
    let store = SqliteBoardStore::open(path)
        .with_context(|| format!("failed to open database {}", path.display()))?;
    Ok(BoardController::new(Arc::new(store), BoardConfig::default()))
}

/// Runs one command and returns its JSON result.
pub async fn execute<S>(controller: &BoardController<S>, command: Command) -> Result<Value>
where
    S: BoardStore + ?Sized + 'static,
{
    match command {
        Command::Board(command) => board(controller, command).await,
        Command::Column(command) => column(controller, command).await,
        Command::Card(command) => card(controller, command).await,
        Command::Label(command) => label(controller, command).await,
        Command::Export { file } => export(controller, &file),
        Command::Import { file } => import(controller, &file).await,
    }
}

async fn board<S>(controller: &BoardController<S>, command: BoardCommand) -> Result<Value>
where
    S: BoardStore + ?Sized + 'static,
{
    Ok(match command {
        BoardCommand::List => {
            controller.load_boards().await?;
            json!(controller.boards().await)
        }
        BoardCommand::Create { name, description } => {
            json!(controller.create_board(&name, description).await?)
        }
        BoardCommand::Rename {
            id,
            name,
            description,
        } => json!(controller.update_board(id, &name, description).await?),
        BoardCommand::Delete { id } => {
            controller.delete_board(id).await?;
            json!({ "deleted": id })
        }
    })
}

async fn column<S>(controller: &BoardController<S>, command: ColumnCommand) -> Result<Value>
where
    S: BoardStore + ?Sized + 'static,
{
    Ok(match command {
        ColumnCommand::List { board } => {
            controller.select_board(board).await?;
            json!(controller.columns().await)
        }
        ColumnCommand::Add { board, name } => {
            controller.select_board(board).await?;
            json!(controller.create_column(&name).await?)
        }
        ColumnCommand::Rename { id, name } => {
            select_column_board(controller, id).await?;
            json!(controller.rename_column(id, &name).await?)
        }
        ColumnCommand::Delete { id } => {
            select_column_board(controller, id).await?;
            controller.delete_column(id).await?;
            json!({ "deleted": id })
        }
        ColumnCommand::Move { id, index } => {
            select_column_board(controller, id).await?;
            let status = controller.move_column(id, index).await?;
            json!({ "status": move_status(status), "columns": controller.columns().await })
        }
    })
}

async fn card<S>(controller: &BoardController<S>, command: CardCommand) -> Result<Value>
where
    S: BoardStore + ?Sized + 'static,
{
    Ok(match command {
        CardCommand::List { column } => {
            select_column_board(controller, column).await?;
            let mut cards = Vec::new();
            for card in controller.cards_in(column).await {
                let labels: Vec<String> = controller
                    .labels_of(card.id)
                    .await
                    .into_iter()
                    .map(|label| label.name)
                    .collect();
                cards.push(json!({ "card": card, "labels": labels }));
            }
            json!(cards)
        }
        CardCommand::Add {
            column,
            title,
            description,
        } => {
            select_column_board(controller, column).await?;
            json!(controller.create_card(column, &title, description).await?)
        }
        CardCommand::Edit {
            id,
            title,
            description,
            notes,
            due,
            clear_due,
        } => {
            let mut edit = CardEdit::new(id);
            if let Some(title) = title {
                edit = edit.title(title);
            }
            if description.is_some() {
                edit = edit.description(description);
            }
            if notes.is_some() {
                edit = edit.notes(notes);
            }
            if due.is_some() || clear_due {
                edit = edit.due_date(due);
            }
            json!(controller.update_card(edit).await?)
        }
        CardCommand::Delete { id } => {
            select_card_board(controller, id).await?;
            controller.delete_card(id).await?;
            json!({ "deleted": id })
        }
        CardCommand::Move { id, column, index } => {
            let card = select_card_board(controller, id).await?;
            let target = column.unwrap_or(card.column_id);
            let status = controller.move_card(id, target, index).await?;
            json!({ "status": move_status(status), "cards": controller.cards_in(target).await })
        }
    })
}

async fn label<S>(controller: &BoardController<S>, command: LabelCommand) -> Result<Value>
where
    S: BoardStore + ?Sized + 'static,
{
    Ok(match command {
        LabelCommand::List { board } => {
            controller.select_board(board).await?;
            json!(controller.labels().await)
        }
        LabelCommand::Add { board, name, color } => {
            controller.select_board(board).await?;
            json!(controller.create_label(&name, &color).await?)
        }
        LabelCommand::Delete { id } => {
            controller.delete_label(id).await?;
            json!({ "deleted": id })
        }
        LabelCommand::Attach { card, label } => {
            select_card_board(controller, card).await?;
            controller.attach_label(card, label).await?;
            json!({ "card": card, "labels": controller.labels_of(card).await })
        }
        LabelCommand::Detach { card, label } => {
            select_card_board(controller, card).await?;
            controller.detach_label(card, label).await?;
            json!({ "card": card, "labels": controller.labels_of(card).await })
        }
    })
}

fn export<S>(controller: &BoardController<S>, file: &Path) -> Result<Value>
where
    S: BoardStore + ?Sized + 'static,
{
    let data = controller.store().export_data()?;
    fs::write(file, data.to_json_pretty()?)
        .with_context(|| format!("failed to write {}", file.display()))?;
    info!("Exported {} boards to {}", data.boards.len(), file.display());
    Ok(json!({
        "file": file.display().to_string(),
        "boards": data.boards.len(),
        "cards": data.cards.len(),
    }))
}

async fn import<S>(controller: &BoardController<S>, file: &Path) -> Result<Value>
where
    S: BoardStore + ?Sized + 'static,
{
    let json = fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let data = ExportData::from_json(&json)
        .with_context(|| format!("{} is not an Orbit export", file.display()))?;
    controller.store().import_data(&data)?;
    controller.load_boards().await?;
    Ok(json!({
        "file": file.display().to_string(),
        "boards": data.boards.len(),
        "cards": data.cards.len(),
    }))
}

async fn select_column_board<S>(controller: &BoardController<S>, column: ColumnId) -> Result<()>
where
    S: BoardStore + ?Sized + 'static,
{
    let stored = controller
        .store()
        .get_column(column)?
        .with_context(|| format!("column {column} not found"))?;
    controller.select_board(stored.board_id).await?;
    Ok(())
}

async fn select_card_board<S>(controller: &BoardController<S>, card: CardId) -> Result<Card>
where
    S: BoardStore + ?Sized + 'static,
{
    let stored = controller
        .store()
        .get_card(card)?
        .with_context(|| format!("card {card} not found"))?;
    select_column_board(controller, stored.column_id).await?;
    Ok(stored)
}

fn move_status(status: MoveStatus) -> Value {
    match status {
        MoveStatus::Confirmed { rows } => json!({ "result": "confirmed", "rows": rows }),
        MoveStatus::Unchanged => json!({ "result": "unchanged" }),
        MoveStatus::Dropped => json!({ "result": "dropped" }),
    }
}
