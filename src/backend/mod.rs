//! Client side of the hosted board backend.
//!
//! Everything the board needs from storage goes through [`BoardBackend`].
//! Real implementation: [`RestBackend`]. Test double: `mock::MockBackend`.

#[cfg(test)]
pub mod mock;
pub mod rest;

use std::sync::Arc;

use async_trait::async_trait;

use crate::common::{
    Board, BoardId, BoardSummary, BoardUpdate, BoardUser, Column, ColumnId, ColumnUpdate,
    NewBoard, NewColumn, NewTask, Task, TaskId,
};
use crate::errors::BackendError;

pub use rest::RestBackend;

pub type BackendResult<T> = Result<T, BackendError>;

/// Abstraction over the backend's request/response API.
#[async_trait]
pub trait BoardBackend: Send + Sync {
    /// Boards visible to the caller, newest first, each with its flattened tasks.
    async fn list_boards(&self) -> BackendResult<Vec<BoardSummary>>;

    async fn create_board(&self, board: &NewBoard) -> BackendResult<Board>;

    async fn get_board(&self, board_id: BoardId) -> BackendResult<Board>;

    async fn update_board(&self, board_id: BoardId, update: &BoardUpdate) -> BackendResult<Board>;

    /// Columns of a board ordered by `sort_order` ascending.
    async fn list_columns(&self, board_id: BoardId) -> BackendResult<Vec<Column>>;

    async fn create_column(&self, column: &NewColumn) -> BackendResult<Column>;

    async fn update_column(
        &self,
        column_id: ColumnId,
        update: &ColumnUpdate,
    ) -> BackendResult<Column>;

    /// Every task on a board ordered by `sort_order` ascending.
    async fn list_tasks(&self, board_id: BoardId) -> BackendResult<Vec<Task>>;

    async fn create_task(&self, task: &NewTask) -> BackendResult<Task>;

    /// Authoritative move: sets both the task's column and its sort order,
    /// unconditionally.
    async fn move_task(
        &self,
        task_id: TaskId,
        column_id: ColumnId,
        position: i32,
    ) -> BackendResult<()>;

    async fn list_board_users(&self, board_id: BoardId) -> BackendResult<Vec<BoardUser>>;
}

pub type SharedBackend = Arc<dyn BoardBackend>;
