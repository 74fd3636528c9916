use chrono::NaiveDate;

use super::columns::BoardColumns;
use super::engine::{DragOutcome, DropTarget, ReorderEngine, RollbackPolicy};
use super::filters::TaskFilters;
use crate::backend::SharedBackend;
use crate::common::presence::{self, PresenceEvent, PresenceRoster};
use crate::common::{
    Board, BoardId, BoardUpdate, BoardUser, Column, ColumnId, ColumnUpdate, ColumnWithTasks,
    NewColumn, NewTask, Priority, Task, TaskId,
};
use crate::errors::SessionError;

/// Fields for a task created from the board page.
#[derive(Debug, Clone, Default)]
pub struct NewTaskInput {
    pub title: String,
    pub description: Option<String>,
    pub assignee: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub priority: Priority,
}

/// State of one open board: the board record, its columns (owned by the
/// reorder engine), its users, and who is currently looking at it.
///
/// Every backend failure is recorded as a message in the error field, which
/// is shared with the engine so gesture failures and CRUD failures surface in
/// one place.
pub struct BoardSession {
    backend: SharedBackend,
    board_id: BoardId,
    board: Option<Board>,
    engine: ReorderEngine,
    users: Vec<BoardUser>,
    presence: PresenceRoster,
    pub filters: TaskFilters,
    loading: bool,
}

impl BoardSession {
    pub fn new(backend: SharedBackend, board_id: BoardId) -> Self {
        Self {
            engine: ReorderEngine::new(backend.clone(), BoardColumns::default()),
            backend,
            board_id,
            board: None,
            users: Vec::new(),
            presence: PresenceRoster::new(),
            filters: TaskFilters::default(),
            loading: false,
        }
    }

    pub fn with_policy(mut self, policy: RollbackPolicy) -> Self {
        self.engine = self.engine.with_policy(policy);
        self
    }

    pub fn board_id(&self) -> BoardId {
        self.board_id
    }

    pub fn board(&self) -> Option<&Board> {
        self.board.as_ref()
    }

    pub fn columns(&self) -> &[ColumnWithTasks] {
        self.engine.columns().as_slice()
    }

    pub fn engine(&self) -> &ReorderEngine {
        &self.engine
    }

    pub fn users(&self) -> &[BoardUser] {
        &self.users
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.engine.error()
    }

    pub fn take_error(&mut self) -> Option<String> {
        self.engine.take_error()
    }

    pub fn task_count(&self) -> usize {
        self.engine.columns().task_count()
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    /// Fetch the board, its columns, and its users together, then its tasks.
    /// Failures land in the error field.
    pub async fn load(&mut self) {
        self.loading = true;
        self.engine.clear_error();
        let result = self.fetch().await;
        self.loading = false;

        match result {
            Ok((board, columns, users)) => {
                tracing::debug!(board_id = %self.board_id, columns = columns.len(), "board loaded");
                self.board = Some(board);
                self.users = users;
                self.engine.replace_columns(columns.into_inner());
            }
            Err(e) => {
                let message = format!(
                    "Failed to load board with ID [{}]: {}",
                    self.board_id,
                    e.user_message()
                );
                tracing::warn!(board_id = %self.board_id, error = %message, "board load failed");
                self.engine.record_error(message);
            }
        }
    }

    async fn fetch(&self) -> Result<(Board, BoardColumns, Vec<BoardUser>), SessionError> {
        let id = self.board_id;
        let (board, columns, users) = tokio::try_join!(
            self.backend.get_board(id),
            self.backend.list_columns(id),
            self.backend.list_board_users(id),
        )?;
        let tasks = self.backend.list_tasks(id).await?;
        Ok((board, BoardColumns::assemble(columns, tasks), users))
    }

    fn fail<T>(&mut self, err: SessionError) -> Result<T, SessionError> {
        tracing::warn!(board_id = %self.board_id, error = %err, "board operation failed");
        self.engine.record_error(err.user_message());
        Err(err)
    }

    pub async fn update_board(&mut self, update: BoardUpdate) -> Result<&Board, SessionError> {
        if update.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return self.fail(SessionError::BlankField { field: "title" });
        }
        match self.backend.update_board(self.board_id, &update).await {
            Ok(board) => Ok(self.board.insert(board)),
            Err(e) => self.fail(e.into()),
        }
    }

    /// Append a new task to `column_id`.
    pub async fn create_task(
        &mut self,
        column_id: ColumnId,
        input: NewTaskInput,
    ) -> Result<Task, SessionError> {
        let title = input.title.trim();
        if title.is_empty() {
            return self.fail(SessionError::BlankField { field: "title" });
        }
        let Some(column) = self.engine.columns().column(&column_id) else {
            return self.fail(SessionError::ColumnNotFound { id: column_id });
        };

        let new = NewTask {
            column_id,
            title: title.to_string(),
            description: input.description,
            assignee: input.assignee,
            due_date: input.due_date,
            priority: input.priority,
            sort_order: i32::try_from(column.tasks.len()).unwrap_or(i32::MAX),
        };
        match self.backend.create_task(&new).await {
            Ok(task) => {
                self.engine.columns_mut().push_task(task.clone());
                Ok(task)
            }
            Err(e) => self.fail(e.into()),
        }
    }

    pub async fn create_task_in_first_column(
        &mut self,
        input: NewTaskInput,
    ) -> Result<Task, SessionError> {
        let Some(first) = self.engine.columns().first().map(|c| c.id()) else {
            return self.fail(SessionError::NoColumn);
        };
        self.create_task(first, input).await
    }

    pub async fn create_column(&mut self, title: &str) -> Result<Column, SessionError> {
        if self.board.is_none() {
            return self.fail(SessionError::BoardNotLoaded);
        }
        let title = title.trim();
        if title.is_empty() {
            return self.fail(SessionError::BlankField { field: "title" });
        }

        let new = NewColumn {
            board_id: self.board_id,
            title: title.to_string(),
            sort_order: i32::try_from(self.engine.columns().len()).unwrap_or(i32::MAX),
        };
        match self.backend.create_column(&new).await {
            Ok(column) => {
                self.engine.columns_mut().push_column(column.clone());
                Ok(column)
            }
            Err(e) => self.fail(e.into()),
        }
    }

    pub async fn update_column(
        &mut self,
        column_id: ColumnId,
        update: ColumnUpdate,
    ) -> Result<Column, SessionError> {
        if update.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return self.fail(SessionError::BlankField { field: "title" });
        }
        match self.backend.update_column(column_id, &update).await {
            Ok(column) => {
                self.engine.columns_mut().merge_column(column.clone());
                Ok(column)
            }
            Err(e) => self.fail(e.into()),
        }
    }

    /// Move a task outside of a drag gesture. The local order only changes
    /// once the backend has accepted the move.
    pub async fn move_task(
        &mut self,
        task_id: TaskId,
        column_id: ColumnId,
        position: usize,
    ) -> Result<(), SessionError> {
        if self.engine.columns().locate(&task_id).is_none() {
            return self.fail(SessionError::TaskNotFound { id: task_id });
        }
        if self.engine.columns().column(&column_id).is_none() {
            return self.fail(SessionError::ColumnNotFound { id: column_id });
        }
        let sort_order = i32::try_from(position).unwrap_or(i32::MAX);
        if let Err(e) = self.backend.move_task(task_id, column_id, sort_order).await {
            return self.fail(e.into());
        }
        self.engine.columns_mut().relocate(&task_id, &column_id, position);
        Ok(())
    }

    // ── Gestures ─────────────────────────────────────────────────────

    pub fn begin_drag(&mut self, task_id: TaskId) {
        self.engine.begin_drag(task_id);
    }

    pub fn drag_over(&mut self, active_id: TaskId, over: DropTarget) {
        self.engine.drag_over(active_id, over);
    }

    pub async fn end_drag(&mut self, active_id: TaskId, over: Option<DropTarget>) -> DragOutcome {
        self.engine.end_drag(active_id, over).await
    }

    // ── Filters ──────────────────────────────────────────────────────

    pub fn filtered_columns(&self) -> Vec<ColumnWithTasks> {
        self.filters.apply(self.columns())
    }

    pub fn active_filter_count(&self) -> usize {
        self.filters.active_count()
    }

    // ── Presence ─────────────────────────────────────────────────────

    pub fn presence_channel(&self) -> String {
        presence::channel_name(&self.board_id)
    }

    pub fn apply_presence(&mut self, event: PresenceEvent) {
        self.presence.apply(event);
    }

    pub fn presence(&self) -> &PresenceRoster {
        &self.presence
    }
}
