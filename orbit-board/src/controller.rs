//! The board controller.
//!
//! [`BoardController`] is the one owner of [`BoardState`]. Views read it
//! through the projections and change it through [`dispatch`] (or the
//! method for each intent). Every committed change is announced on a
//! broadcast channel.
//!
//! Store calls are synchronous, so they run on the blocking pool. The
//! state lock is never held across a store call: a move applies its new
//! order to the state, releases the lock, and only then waits on the write.
//!
//! [`dispatch`]: BoardController::dispatch

use crate::config::BoardConfig;
use crate::debounce::Debouncer;
use crate::error::{BoardError, BoardResult};
use crate::intent::{CardEdit, Intent, Outcome};
use crate::moves::{MoveKey, MoveStatus, MoveTracker};
use crate::state::{BoardState, Scoped, StateChange};
use orbit_model::{Board, Card, CardLabel, Column, Label, PositionUpdate};
use orbit_order::{MoveOutcome, MoveTarget, compute_move, remove_at};
use orbit_storage::{BoardStore, SiblingStore, StorageResult};
use orbit_types::{BoardId, CardId, ColumnId, LabelId};
use std::sync::Arc;
use tokio::sync::{RwLock, broadcast};
use tracing::{debug, info, warn};

fn non_empty(value: &str, what: &str) -> BoardResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(BoardError::InvalidInput(format!("{what} must not be empty")));
    }
    Ok(trimmed.to_string())
}

/// Owns the board state and mediates every change to it.
pub struct BoardController<S: BoardStore + ?Sized> {
    store: Arc<S>,
    config: BoardConfig,
    state: RwLock<BoardState>,
    moves: MoveTracker,
    changes: broadcast::Sender<StateChange>,
}

impl<S: BoardStore + ?Sized + 'static> BoardController<S> {
    pub fn new(store: Arc<S>, config: BoardConfig) -> Self {
        let (changes, _) = broadcast::channel(config.notify_capacity.max(1));
        Self {
            store,
            config,
            state: RwLock::new(BoardState::default()),
            moves: MoveTracker::default(),
            changes,
        }
    }

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Receives every [`StateChange`] published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.changes.subscribe()
    }

    fn publish(&self, change: StateChange) {
        // No subscribers is fine.
        let _ = self.changes.send(change);
    }

    async fn run<R, F>(&self, op: F) -> BoardResult<R>
    where
        R: Send + 'static,
        F: FnOnce(&S) -> StorageResult<R> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        Ok(tokio::task::spawn_blocking(move || op(store.as_ref())).await??)
    }

    // ── Projections ──────────────────────────────────────────────

    /// A snapshot of the whole state.
    pub async fn state(&self) -> BoardState {
        self.state.read().await.clone()
    }

    pub async fn boards(&self) -> Vec<Board> {
        self.state.read().await.boards.clone()
    }

    pub async fn current_board(&self) -> Option<Board> {
        self.state.read().await.current_board().cloned()
    }

    /// Columns of the selected board in display order.
    pub async fn columns(&self) -> Vec<Column> {
        self.state.read().await.columns.clone()
    }

    /// Cards of a column in display order.
    pub async fn cards_in(&self, column: ColumnId) -> Vec<Card> {
        self.state.read().await.cards_in(column).to_vec()
    }

    pub async fn labels(&self) -> Vec<Label> {
        self.state.read().await.labels.clone()
    }

    pub async fn labels_of(&self, card: CardId) -> Vec<Label> {
        self.state
            .read()
            .await
            .labels_of(card)
            .into_iter()
            .cloned()
            .collect()
    }

    /// True while a move of `key` is waiting on the store.
    pub fn is_moving(&self, key: MoveKey) -> bool {
        self.moves.is_pending(key)
    }

    // ── Dispatch ─────────────────────────────────────────────────

    /// Applies one intent.
    pub async fn dispatch(&self, intent: Intent) -> BoardResult<Outcome> {
        debug!("Dispatching {intent:?}");
        Ok(match intent {
            Intent::LoadBoards => {
                self.load_boards().await?;
                Outcome::Done
            }
            Intent::SelectBoard(id) => Outcome::Board(self.select_board(id).await?),
            Intent::CreateBoard { name, description } => {
                Outcome::Board(self.create_board(&name, description).await?)
            }
            Intent::UpdateBoard {
                id,
                name,
                description,
            } => Outcome::Board(self.update_board(id, &name, description).await?),
            Intent::DeleteBoard(id) => {
                self.delete_board(id).await?;
                Outcome::Done
            }
            Intent::CreateColumn { name } => Outcome::Column(self.create_column(&name).await?),
            Intent::RenameColumn { id, name } => {
                Outcome::Column(self.rename_column(id, &name).await?)
            }
            Intent::DeleteColumn(id) => {
                self.delete_column(id).await?;
                Outcome::Done
            }
            Intent::MoveColumn { id, index } => Outcome::Moved(self.move_column(id, index).await?),
            Intent::CreateCard {
                column,
                title,
                description,
            } => Outcome::Card(self.create_card(column, &title, description).await?),
            Intent::UpdateCard(edit) => Outcome::Card(self.update_card(edit).await?),
            Intent::DeleteCard(id) => {
                self.delete_card(id).await?;
                Outcome::Done
            }
            Intent::MoveCard { id, column, index } => {
                Outcome::Moved(self.move_card(id, column, index).await?)
            }
            Intent::CreateLabel { name, color } => {
                Outcome::Label(self.create_label(&name, &color).await?)
            }
            Intent::UpdateLabel { id, name, color } => {
                Outcome::Label(self.update_label(id, &name, &color).await?)
            }
            Intent::DeleteLabel(id) => {
                self.delete_label(id).await?;
                Outcome::Done
            }
            Intent::AttachLabel { card, label } => {
                self.attach_label(card, label).await?;
                Outcome::Done
            }
            Intent::DetachLabel { card, label } => {
                self.detach_label(card, label).await?;
                Outcome::Done
            }
        })
    }

    // ── Boards ───────────────────────────────────────────────────

    /// Reloads the board list.
    pub async fn load_boards(&self) -> BoardResult<()> {
        let boards = self.run(|s| s.list_boards()).await?;
        self.state.write().await.boards = boards;
        self.publish(StateChange::Boards);
        Ok(())
    }

    /// Loads a board's columns, cards and labels and makes it current.
    pub async fn select_board(&self, id: BoardId) -> BoardResult<Board> {
        let (board, columns, cards, labels, card_labels) = self
            .run(move |s| {
                let board = s.get_board(id)?;
                let columns = s.list_columns(id)?;
                let cards = s.list_cards_by_board(id)?;
                let labels = s.list_labels(id)?;
                let card_labels = s.list_card_labels_by_board(id)?;
                Ok((board, columns, cards, labels, card_labels))
            })
            .await?;
        let board = board.ok_or_else(|| BoardError::NotFound(format!("board {id}")))?;

        let mut state = self.state.write().await;
        state.clear_board();
        state.current = Some(id);
        state.cards = columns.iter().map(|c| (c.id, Vec::new())).collect();
        for card in cards {
            state.cards.entry(card.column_id).or_default().push(card);
        }
        state.columns = columns;
        state.labels = labels;
        state.card_labels = card_labels;
        if !state.boards.iter().any(|b| b.id == id) {
            state.boards.push(board.clone());
        }
        drop(state);

        info!("Selected board {} ({})", board.name, board.id);
        self.publish(StateChange::Selected(Some(id)));
        Ok(board)
    }

    /// Creates a board with the configured default columns.
    pub async fn create_board(
        &self,
        name: &str,
        description: Option<String>,
    ) -> BoardResult<Board> {
        let board = Board::new(non_empty(name, "board name")?, description);
        let columns: Vec<Column> = self
            .config
            .default_columns
            .iter()
            .map(|name| Column::new(board.id, name.as_str(), 0))
            .collect();

        let stored = board.clone();
        self.run(move |s| s.create_board(&stored, &columns)).await?;

        self.state.write().await.boards.insert(0, board.clone());
        info!("Created board {} ({})", board.name, board.id);
        self.publish(StateChange::Boards);
        Ok(board)
    }

    pub async fn update_board(
        &self,
        id: BoardId,
        name: &str,
        description: Option<String>,
    ) -> BoardResult<Board> {
        let name = non_empty(name, "board name")?;
        let existing = self
            .state
            .read()
            .await
            .boards
            .iter()
            .find(|b| b.id == id)
            .cloned();
        let mut board = match existing {
            Some(board) => board,
            None => self
                .run(move |s| s.get_board(id))
                .await?
                .ok_or_else(|| BoardError::NotFound(format!("board {id}")))?,
        };
        board.name = name;
        board.description = description;

        let updated = self.run(move |s| s.update_board(&board)).await?;

        let mut state = self.state.write().await;
        state.boards.retain(|b| b.id != id);
        state.boards.insert(0, updated.clone());
        drop(state);

        self.publish(StateChange::Boards);
        Ok(updated)
    }

    /// Deletes a board with everything on it. Deselects it if current.
    pub async fn delete_board(&self, id: BoardId) -> BoardResult<()> {
        self.run(move |s| SiblingStore::<Column>::delete_container(s, id))
            .await?;

        let mut state = self.state.write().await;
        state.boards.retain(|b| b.id != id);
        let was_current = state.current == Some(id);
        if was_current {
            state.clear_board();
        }
        drop(state);

        info!("Deleted board {id}");
        self.publish(StateChange::Boards);
        if was_current {
            self.publish(StateChange::Selected(None));
        }
        Ok(())
    }

    async fn current_board_id(&self) -> BoardResult<BoardId> {
        self.state
            .read()
            .await
            .current
            .ok_or(BoardError::NoBoardSelected)
    }

    // ── Columns ──────────────────────────────────────────────────

    /// Appends a column to the selected board.
    pub async fn create_column(&self, name: &str) -> BoardResult<Column> {
        let board_id = self.current_board_id().await?;
        let column = Column::new(board_id, non_empty(name, "column name")?, 0);
        let created = self
            .run(move |s| SiblingStore::<Column>::create_entity(s, &column))
            .await?;

        let mut state = self.state.write().await;
        if state.current == Some(board_id) {
            state.cards.insert(created.id, Vec::new());
            state.columns.push(created.clone());
        }
        drop(state);

        self.publish(StateChange::Columns(board_id));
        Ok(created)
    }

    pub async fn rename_column(&self, id: ColumnId, name: &str) -> BoardResult<Column> {
        let name = non_empty(name, "column name")?;
        let mut column = self
            .state
            .read()
            .await
            .column(id)
            .cloned()
            .ok_or_else(|| BoardError::NotFound(format!("column {id}")))?;
        column.name = name;

        let updated = self.run(move |s| s.update_column(&column)).await?;

        let mut state = self.state.write().await;
        if let Some(column) = state.columns.iter_mut().find(|c| c.id == id) {
            column.name = updated.name.clone();
        }
        drop(state);

        self.publish(StateChange::Columns(updated.board_id));
        Ok(updated)
    }

    /// Deletes a column and its cards; the remaining columns close the gap.
    pub async fn delete_column(&self, id: ColumnId) -> BoardResult<()> {
        self.run(move |s| SiblingStore::<Column>::delete_entity(s, id))
            .await?;

        let mut state = self.state.write().await;
        let Some(board_id) = state.column(id).map(|c| c.board_id) else {
            return Ok(());
        };
        state.drop_cards_of(id);
        state.columns = remove_at(std::mem::take(&mut state.columns), id);
        drop(state);

        self.publish(StateChange::Columns(board_id));
        Ok(())
    }

    /// Moves a column of the selected board to `index`.
    pub async fn move_column(&self, id: ColumnId, index: usize) -> BoardResult<MoveStatus> {
        let board_id = self.current_board_id().await?;
        self.move_entity::<Column>(id, board_id, index).await
    }

    // ── Cards ────────────────────────────────────────────────────

    /// Appends a card to a column of the selected board.
    pub async fn create_card(
        &self,
        column: ColumnId,
        title: &str,
        description: Option<String>,
    ) -> BoardResult<Card> {
        if self.state.read().await.column(column).is_none() {
            return Err(BoardError::NotFound(format!("column {column}")));
        }
        let mut card = Card::new(column, non_empty(title, "card title")?, 0);
        card.description = description;

        let created = self
            .run(move |s| SiblingStore::<Card>::create_entity(s, &card))
            .await?;

        let mut state = self.state.write().await;
        if state.column(column).is_some() {
            state.cards.entry(column).or_default().push(created.clone());
        }
        drop(state);

        self.publish(StateChange::Cards(vec![column]));
        Ok(created)
    }

    /// Edits card fields. Never changes column or position.
    pub async fn update_card(&self, edit: CardEdit) -> BoardResult<Card> {
        let id = edit.id;
        if let Some(title) = &edit.title {
            non_empty(title, "card title")?;
        }
        let loaded = self.state.read().await.card(id).cloned();
        let mut card = match loaded {
            Some(card) => card,
            None => self
                .run(move |s| s.get_card(id))
                .await?
                .ok_or_else(|| BoardError::NotFound(format!("card {id}")))?,
        };
        edit.apply_to(&mut card);

        let updated = self.run(move |s| s.update_card(&card)).await?;

        let mut state = self.state.write().await;
        if let Some(card) = state
            .cards
            .get_mut(&updated.column_id)
            .and_then(|cards| cards.iter_mut().find(|c| c.id == id))
        {
            *card = Card {
                position: card.position,
                column_id: card.column_id,
                ..updated.clone()
            };
        }
        drop(state);

        self.publish(StateChange::Cards(vec![updated.column_id]));
        Ok(updated)
    }

    /// Deletes a card; the rest of its column closes the gap.
    pub async fn delete_card(&self, id: CardId) -> BoardResult<()> {
        self.run(move |s| SiblingStore::<Card>::delete_entity(s, id))
            .await?;

        let mut state = self.state.write().await;
        let Some(column) = state.card(id).map(|c| c.column_id) else {
            return Ok(());
        };
        if let Some(cards) = state.cards.remove(&column) {
            state.cards.insert(column, remove_at(cards, id));
        }
        state.card_labels.retain(|link| link.card_id != id);
        drop(state);

        self.publish(StateChange::Cards(vec![column]));
        Ok(())
    }

    /// Moves a card to `index` in `column` (its own or another one).
    pub async fn move_card(
        &self,
        id: CardId,
        column: ColumnId,
        index: usize,
    ) -> BoardResult<MoveStatus> {
        self.move_entity::<Card>(id, column, index).await
    }

    /// A debouncer that saves card edits through
    /// [`update_card`](Self::update_card) after the configured quiet period.
    /// Edits of the same card made within that period are merged.
    pub fn card_autosave(self: &Arc<Self>) -> Debouncer<CardId, CardEdit> {
        let controller = Arc::clone(self);
        Debouncer::new(self.config.autosave_debounce(), move |id: CardId, edit: CardEdit| {
            let controller = Arc::clone(&controller);
            async move {
                if let Err(e) = controller.update_card(edit).await {
                    warn!("Autosave of card {id} failed: {e}");
                }
            }
        })
        .with_merge(|pending: &mut CardEdit, later| pending.merge(later))
    }

    // ── Labels ───────────────────────────────────────────────────

    /// Creates a label on the selected board.
    pub async fn create_label(&self, name: &str, color: &str) -> BoardResult<Label> {
        let board_id = self.current_board_id().await?;
        let label = Label::new(board_id, non_empty(name, "label name")?, color.trim());
        let created = self.run(move |s| s.create_label(&label)).await?;

        self.state.write().await.labels.push(created.clone());
        self.publish(StateChange::Labels(board_id));
        Ok(created)
    }

    pub async fn update_label(&self, id: LabelId, name: &str, color: &str) -> BoardResult<Label> {
        let mut label = self
            .state
            .read()
            .await
            .labels
            .iter()
            .find(|l| l.id == id)
            .cloned()
            .ok_or_else(|| BoardError::NotFound(format!("label {id}")))?;
        label.name = non_empty(name, "label name")?;
        label.color = color.trim().to_string();

        let updated = self.run(move |s| s.update_label(&label)).await?;

        let mut state = self.state.write().await;
        if let Some(label) = state.labels.iter_mut().find(|l| l.id == id) {
            *label = updated.clone();
        }
        drop(state);

        self.publish(StateChange::Labels(updated.board_id));
        Ok(updated)
    }

    pub async fn delete_label(&self, id: LabelId) -> BoardResult<()> {
        self.run(move |s| s.delete_label(id)).await?;

        let mut state = self.state.write().await;
        state.labels.retain(|l| l.id != id);
        state.card_labels.retain(|link| link.label_id != id);
        let board = state.current;
        drop(state);

        if let Some(board) = board {
            self.publish(StateChange::Labels(board));
        }
        Ok(())
    }

    pub async fn attach_label(&self, card: CardId, label: LabelId) -> BoardResult<()> {
        self.run(move |s| s.add_label_to_card(card, label)).await?;

        let mut state = self.state.write().await;
        let link = CardLabel {
            card_id: card,
            label_id: label,
        };
        if !state.card_labels.contains(&link) {
            state.card_labels.push(link);
        }
        let board = state.current;
        drop(state);

        if let Some(board) = board {
            self.publish(StateChange::Labels(board));
        }
        Ok(())
    }

    pub async fn detach_label(&self, card: CardId, label: LabelId) -> BoardResult<()> {
        self.run(move |s| s.remove_label_from_card(card, label))
            .await?;

        let mut state = self.state.write().await;
        state
            .card_labels
            .retain(|link| !(link.card_id == card && link.label_id == label));
        let board = state.current;
        drop(state);

        if let Some(board) = board {
            self.publish(StateChange::Labels(board));
        }
        Ok(())
    }

    // ── Moves ────────────────────────────────────────────────────

    async fn move_entity<T>(
        &self,
        id: T::Id,
        target_parent: T::ParentKey,
        index: usize,
    ) -> BoardResult<MoveStatus>
    where
        T: Scoped,
        S: SiblingStore<T>,
    {
        let _entity = self.moves.begin(T::move_key(id))?;

        // Requested -> Computed -> Applied, under one write lock.
        let mut state = self.state.write().await;
        let Some(source_parent) = T::locate(&state, id) else {
            debug!("Dropping move of {id}: no longer loaded");
            return Ok(MoveStatus::Dropped);
        };
        // Held until the write and any rollback finish.
        let _scopes = self
            .moves
            .begin_all(&[T::scope_key(source_parent), T::scope_key(target_parent)])?;
        let (Some(source), Some(target)) = (
            T::scope(&state, source_parent),
            T::scope(&state, target_parent),
        ) else {
            debug!("Dropping move of {id}: scope {target_parent} is not loaded");
            return Ok(MoveStatus::Dropped);
        };

        let move_target = if source_parent == target_parent {
            MoveTarget::SameScope
        } else {
            MoveTarget::OtherScope {
                parent_key: target_parent,
                siblings: &target,
            }
        };
        let plan = match compute_move(&source, move_target, id, index) {
            MoveOutcome::Missing => return Ok(MoveStatus::Dropped),
            MoveOutcome::Unchanged => return Ok(MoveStatus::Unchanged),
            MoveOutcome::Moved(plan) => plan,
        };

        let mut parents = vec![source_parent];
        T::replace_scope(&mut state, source_parent, plan.source);
        if let Some(new_target) = plan.target {
            T::replace_scope(&mut state, target_parent, new_target);
            parents.push(target_parent);
        }
        debug_assert_eq!(state.check_invariants(), Ok(()));
        drop(state);
        self.publish(T::changed(&parents));

        // Applied -> Confirmed | RolledBack.
        let updates: Vec<PositionUpdate<T::Id, T::ParentKey>> = plan.updates;
        let rows = updates.len();
        let written = self
            .run(move |s| SiblingStore::<T>::batch_update_positions(s, &updates))
            .await;

        match written {
            Ok(()) => {
                debug!("Moved {id} to {target_parent}[{index}] ({rows} rows)");
                Ok(MoveStatus::Confirmed { rows })
            }
            Err(e) => {
                warn!("Move of {id} failed, rolling back: {e}");
                self.roll_back::<T>(&parents, source, target).await;
                self.publish(StateChange::MoveRolledBack {
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Resynchronizes the scopes of a failed move from the store. If the
    /// store cannot be read either, restores the pre-move snapshots.
    async fn roll_back<T>(&self, parents: &[T::ParentKey], source: Vec<T>, target: Vec<T>)
    where
        T: Scoped,
        S: SiblingStore<T>,
    {
        let keys = parents.to_vec();
        let reloaded = self
            .run(move |s| {
                keys.iter()
                    .map(|parent| Ok((*parent, SiblingStore::<T>::list_siblings(s, *parent)?)))
                    .collect::<StorageResult<Vec<_>>>()
            })
            .await;

        let mut state = self.state.write().await;
        match reloaded {
            Ok(scopes) => {
                for (parent, scope) in scopes {
                    T::replace_scope(&mut state, parent, scope);
                }
            }
            Err(e) => {
                warn!("Reload after failed move failed, restoring snapshot: {e}");
                let mut snapshots = [source, target].into_iter();
                for parent in parents {
                    if let Some(scope) = snapshots.next() {
                        T::replace_scope(&mut state, *parent, scope);
                    }
                }
            }
        }
        drop(state);
        self.publish(T::changed(parents));
    }
}
