use futures::future::join_all;

use super::filters::BoardFilters;
use crate::backend::SharedBackend;
use crate::common::{Board, BoardSummary, NewBoard, NewColumn};
use crate::errors::BackendError;

pub const DEFAULT_COLOR: &str = "bg-blue-500";
pub const DEFAULT_CREATOR: &str = "No Name";

pub fn default_columns() -> Vec<String> {
    ["To Do", "In Progress", "Review", "Done"]
        .into_iter()
        .map(String::from)
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct NewBoardInput {
    pub title: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub creator: Option<String>,
}

/// The caller's board list.
pub struct Dashboard {
    backend: SharedBackend,
    boards: Vec<BoardSummary>,
    default_columns: Vec<String>,
    default_color: String,
    pub filters: BoardFilters,
    error: Option<String>,
    loading: bool,
}

impl Dashboard {
    pub fn new(backend: SharedBackend) -> Self {
        Self {
            backend,
            boards: Vec::new(),
            default_columns: default_columns(),
            default_color: DEFAULT_COLOR.to_string(),
            filters: BoardFilters::default(),
            error: None,
            loading: false,
        }
    }

    /// Columns created with every new board, in order.
    pub fn with_default_columns(mut self, columns: Vec<String>) -> Self {
        self.default_columns = columns;
        self
    }

    pub fn with_default_color(mut self, color: impl Into<String>) -> Self {
        self.default_color = color.into();
        self
    }

    pub fn boards(&self) -> &[BoardSummary] {
        &self.boards
    }

    pub fn filtered_boards(&self) -> Vec<&BoardSummary> {
        self.filters.apply(&self.boards)
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn take_error(&mut self) -> Option<String> {
        self.error.take()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub async fn load(&mut self) {
        self.loading = true;
        self.error = None;
        match self.backend.list_boards().await {
            Ok(boards) => self.boards = boards,
            Err(e) => {
                tracing::warn!(error = %e, "failed to load boards");
                self.error = Some(e.user_message());
            }
        }
        self.loading = false;
    }

    /// Create a board and its default columns. The board is prepended to
    /// the list even if some default columns fail to create.
    pub async fn create_board(&mut self, input: NewBoardInput) -> Result<Board, BackendError> {
        let new = NewBoard {
            title: input.title.trim().to_string(),
            description: input.description.filter(|d| !d.trim().is_empty()),
            color: input
                .color
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| self.default_color.clone()),
            creator: input
                .creator
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_CREATOR.to_string()),
        };

        let board = match self.backend.create_board(&new).await {
            Ok(board) => board,
            Err(e) => {
                tracing::warn!(error = %e, "failed to create board");
                self.error = Some(e.user_message());
                return Err(e);
            }
        };

        let creates = self.default_columns.iter().enumerate().map(|(i, title)| {
            let column = NewColumn {
                board_id: board.id,
                title: title.clone(),
                sort_order: i32::try_from(i).unwrap_or(i32::MAX),
            };
            let backend = self.backend.clone();
            async move { backend.create_column(&column).await }
        });
        for result in join_all(creates).await {
            if let Err(e) = result {
                tracing::warn!(board_id = %board.id, error = %e, "failed to create default column");
            }
        }

        tracing::info!(board_id = %board.id, title = %board.title, "board created");
        self.boards.insert(
            0,
            BoardSummary {
                board: board.clone(),
                tasks: Vec::new(),
            },
        );
        Ok(board)
    }
}
