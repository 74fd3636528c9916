//! In-memory `BoardBackend` used by unit tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use uuid::Uuid;

use super::{BackendResult, BoardBackend};
use crate::common::{
    Board, BoardId, BoardSummary, BoardUpdate, BoardUser, Column, ColumnId, ColumnUpdate,
    NewBoard, NewColumn, NewTask, Priority, Task, TaskId,
};
use crate::errors::BackendError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveCall {
    pub task_id: TaskId,
    pub column_id: ColumnId,
    pub position: i32,
}

#[derive(Default)]
pub struct MockBackend {
    pub boards: Mutex<Vec<Board>>,
    pub columns: Mutex<Vec<Column>>,
    pub tasks: Mutex<Vec<Task>>,
    pub users: Mutex<Vec<BoardUser>>,
    pub moves: Mutex<Vec<MoveCall>>,
    pub created_columns: Mutex<Vec<NewColumn>>,
    pub created_tasks: Mutex<Vec<NewTask>>,
    fail_moves: AtomicBool,
    fail_all: AtomicBool,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every `move_task` call fail with "network down".
    pub fn fail_moves(&self, fail: bool) {
        self.fail_moves.store(fail, Ordering::SeqCst);
    }

    /// Make every call fail with "backend unavailable".
    pub fn fail_all(&self, fail: bool) {
        self.fail_all.store(fail, Ordering::SeqCst);
    }

    pub fn move_calls(&self) -> Vec<MoveCall> {
        self.moves.lock().unwrap().clone()
    }

    fn check(&self) -> BackendResult<()> {
        if self.fail_all.load(Ordering::SeqCst) {
            return Err(BackendError::Rejected("backend unavailable".into()));
        }
        Ok(())
    }

    pub fn add_board(&self, title: &str) -> Board {
        let board = board(title);
        self.boards.lock().unwrap().push(board.clone());
        board
    }

    pub fn add_column(&self, board_id: BoardId, title: &str, sort_order: i32) -> Column {
        let column = Column {
            id: Uuid::new_v4(),
            board_id,
            title: title.to_string(),
            sort_order,
            created_at: fixed_time(),
        };
        self.columns.lock().unwrap().push(column.clone());
        column
    }

    pub fn add_task(&self, column_id: ColumnId, title: &str, sort_order: i32) -> Task {
        let task = task(column_id, title, sort_order);
        self.tasks.lock().unwrap().push(task.clone());
        task
    }
}

pub fn fixed_time() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap()
}

pub fn board(title: &str) -> Board {
    Board {
        id: Uuid::new_v4(),
        title: title.to_string(),
        description: None,
        color: "bg-blue-500".into(),
        created_at: fixed_time(),
        updated_at: fixed_time(),
        creator: "Ana".into(),
    }
}

pub fn column(board_id: BoardId, title: &str, sort_order: i32) -> Column {
    Column {
        id: Uuid::new_v4(),
        board_id,
        title: title.to_string(),
        sort_order,
        created_at: fixed_time(),
    }
}

pub fn task(column_id: ColumnId, title: &str, sort_order: i32) -> Task {
    Task {
        id: Uuid::new_v4(),
        column_id,
        title: title.to_string(),
        description: None,
        assignee: None,
        due_date: None,
        priority: Priority::Medium,
        sort_order,
        created_at: fixed_time(),
    }
}

#[async_trait]
impl BoardBackend for MockBackend {
    async fn list_boards(&self) -> BackendResult<Vec<BoardSummary>> {
        self.check()?;
        let boards = self.boards.lock().unwrap().clone();
        let columns = self.columns.lock().unwrap().clone();
        let tasks = self.tasks.lock().unwrap().clone();
        let mut out: Vec<BoardSummary> = boards
            .into_iter()
            .map(|board| {
                let tasks = tasks
                    .iter()
                    .filter(|t| {
                        columns
                            .iter()
                            .any(|c| c.id == t.column_id && c.board_id == board.id)
                    })
                    .cloned()
                    .collect();
                BoardSummary { board, tasks }
            })
            .collect();
        out.sort_by(|a, b| b.board.created_at.cmp(&a.board.created_at));
        Ok(out)
    }

    async fn create_board(&self, new: &NewBoard) -> BackendResult<Board> {
        self.check()?;
        let mut created = board(&new.title);
        created.description = new.description.clone();
        created.color = new.color.clone();
        created.creator = new.creator.clone();
        self.boards.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn get_board(&self, board_id: BoardId) -> BackendResult<Board> {
        self.check()?;
        self.boards
            .lock()
            .unwrap()
            .iter()
            .find(|b| b.id == board_id)
            .cloned()
            .ok_or(BackendError::NotFound {
                entity: "Board",
                id: board_id.to_string(),
            })
    }

    async fn update_board(&self, board_id: BoardId, update: &BoardUpdate) -> BackendResult<Board> {
        self.check()?;
        let mut boards = self.boards.lock().unwrap();
        let board = boards
            .iter_mut()
            .find(|b| b.id == board_id)
            .ok_or(BackendError::NotFound {
                entity: "Board",
                id: board_id.to_string(),
            })?;
        if let Some(title) = &update.title {
            board.title = title.clone();
        }
        if let Some(description) = &update.description {
            board.description = Some(description.clone());
        }
        if let Some(color) = &update.color {
            board.color = color.clone();
        }
        Ok(board.clone())
    }

    async fn list_columns(&self, board_id: BoardId) -> BackendResult<Vec<Column>> {
        self.check()?;
        let mut cols: Vec<Column> = self
            .columns
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.board_id == board_id)
            .cloned()
            .collect();
        cols.sort_by_key(|c| c.sort_order);
        Ok(cols)
    }

    async fn create_column(&self, new: &NewColumn) -> BackendResult<Column> {
        self.check()?;
        self.created_columns.lock().unwrap().push(new.clone());
        Ok(self.add_column(new.board_id, &new.title, new.sort_order))
    }

    async fn update_column(
        &self,
        column_id: ColumnId,
        update: &ColumnUpdate,
    ) -> BackendResult<Column> {
        self.check()?;
        let mut cols = self.columns.lock().unwrap();
        let col = cols
            .iter_mut()
            .find(|c| c.id == column_id)
            .ok_or(BackendError::NotFound {
                entity: "Column",
                id: column_id.to_string(),
            })?;
        if let Some(title) = &update.title {
            col.title = title.clone();
        }
        if let Some(order) = update.sort_order {
            col.sort_order = order;
        }
        Ok(col.clone())
    }

    async fn list_tasks(&self, board_id: BoardId) -> BackendResult<Vec<Task>> {
        self.check()?;
        let columns = self.columns.lock().unwrap().clone();
        let mut tasks: Vec<Task> = self
            .tasks
            .lock()
            .unwrap()
            .iter()
            .filter(|t| {
                columns
                    .iter()
                    .any(|c| c.id == t.column_id && c.board_id == board_id)
            })
            .cloned()
            .collect();
        tasks.sort_by_key(|t| t.sort_order);
        Ok(tasks)
    }

    async fn create_task(&self, new: &NewTask) -> BackendResult<Task> {
        self.check()?;
        self.created_tasks.lock().unwrap().push(new.clone());
        let mut created = task(new.column_id, &new.title, new.sort_order);
        created.description = new.description.clone();
        created.assignee = new.assignee.clone();
        created.due_date = new.due_date;
        created.priority = new.priority;
        self.tasks.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn move_task(
        &self,
        task_id: TaskId,
        column_id: ColumnId,
        position: i32,
    ) -> BackendResult<()> {
        self.check()?;
        self.moves.lock().unwrap().push(MoveCall {
            task_id,
            column_id,
            position,
        });
        if self.fail_moves.load(Ordering::SeqCst) {
            return Err(BackendError::Rejected("network down".into()));
        }
        if let Some(t) = self.tasks.lock().unwrap().iter_mut().find(|t| t.id == task_id) {
            t.column_id = column_id;
            t.sort_order = position;
        }
        Ok(())
    }

    async fn list_board_users(&self, _board_id: BoardId) -> BackendResult<Vec<BoardUser>> {
        self.check()?;
        Ok(self.users.lock().unwrap().clone())
    }
}
