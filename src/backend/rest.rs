use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use super::{BackendResult, BoardBackend};
use crate::common::{
    Board, BoardId, BoardSummary, BoardUpdate, BoardUser, Column, ColumnId, ColumnUpdate,
    NewBoard, NewColumn, NewTask, Task, TaskId,
};
use crate::config::BackendSection;
use crate::errors::BackendError;

/// Select clause for the dashboard listing: every board with the tasks of
/// every column nested underneath.
const BOARD_LISTING_SELECT: &str = "*,columns(tasks(*))";

/// Select clause for a board's tasks, joined through their column.
const BOARD_TASKS_SELECT: &str = "*,columns!inner(board_id)";

/// Row shape returned by the dashboard listing query.
#[derive(Debug, Deserialize)]
struct BoardListingRow {
    #[serde(flatten)]
    board: Board,
    #[serde(default)]
    columns: Vec<NestedColumn>,
}

#[derive(Debug, Deserialize)]
struct NestedColumn {
    #[serde(default)]
    tasks: Vec<Task>,
}

impl From<BoardListingRow> for BoardSummary {
    fn from(row: BoardListingRow) -> Self {
        BoardSummary {
            board: row.board,
            tasks: row.columns.into_iter().flat_map(|c| c.tasks).collect(),
        }
    }
}

/// Error body returned by the REST layer on non-2xx responses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

/// `BoardBackend` over the PostgREST-style API of the hosted backend.
#[derive(Debug, Clone)]
pub struct RestBackend {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    access_token: Option<String>,
}

impl RestBackend {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            access_token: None,
        }
    }

    /// Act on behalf of a signed-in user instead of the anonymous key.
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn from_config(section: &BackendSection) -> BackendResult<Self> {
        let url = section.url.as_deref().ok_or_else(|| {
            BackendError::NotConfigured("backend.url (or TASKBOARD_BACKEND_URL)".into())
        })?;
        let api_key = section.api_key.as_deref().ok_or_else(|| {
            BackendError::NotConfigured("backend.api_key (or TASKBOARD_API_KEY)".into())
        })?;
        let backend = Self::new(url, api_key);
        Ok(match &section.access_token {
            Some(token) => backend.with_access_token(token.clone()),
            None => backend,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn rpc_url(&self, function: &str) -> String {
        format!("{}/rest/v1/rpc/{}", self.base_url, function)
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let bearer = self.access_token.as_deref().unwrap_or(&self.api_key);
        self.client
            .request(method, url)
            .header("apikey", &self.api_key)
            .bearer_auth(bearer)
            .header("Accept", "application/json")
    }

    async fn send(&self, req: RequestBuilder, url: &str) -> BackendResult<Response> {
        let resp = req.send().await.map_err(|source| BackendError::Transport {
            url: url.to_string(),
            source,
        })?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let body = resp.text().await.unwrap_or_default();
        tracing::debug!(%url, status = status.as_u16(), %body, "backend request failed");
        Err(BackendError::Status {
            status: status.as_u16(),
            message: error_message(&body, status),
        })
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        req: RequestBuilder,
        url: &str,
    ) -> BackendResult<T> {
        let resp = self.send(req, url).await?;
        let bytes = resp.bytes().await.map_err(|source| BackendError::Transport {
            url: url.to_string(),
            source,
        })?;
        serde_json::from_slice(&bytes).map_err(|e| BackendError::Decode(e.to_string()))
    }

    /// Decode a representation array and take its single row.
    async fn send_single<T: DeserializeOwned>(
        &self,
        req: RequestBuilder,
        url: &str,
        entity: &'static str,
        id: String,
    ) -> BackendResult<T> {
        let rows: Vec<T> = self.send_json(req, url).await?;
        rows.into_iter()
            .next()
            .ok_or(BackendError::NotFound { entity, id })
    }
}

/// Prefer the server's `message` field; fall back to the raw body, then the
/// status reason.
fn error_message(body: &str, status: reqwest::StatusCode) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body)
        && let Some(message) = parsed.message.or(parsed.error)
    {
        return message;
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        trimmed.to_string()
    }
}

/// RPC results come back as either a single object or a one-row array.
fn first_row<T: DeserializeOwned>(value: serde_json::Value, entity: &'static str) -> BackendResult<T> {
    let row = match value {
        serde_json::Value::Array(rows) => rows.into_iter().next().ok_or(BackendError::NotFound {
            entity,
            id: "(rpc result)".into(),
        })?,
        other => other,
    };
    serde_json::from_value(row).map_err(|e| BackendError::Decode(e.to_string()))
}

fn eq(id: impl std::fmt::Display) -> String {
    format!("eq.{}", id)
}

#[async_trait]
impl BoardBackend for RestBackend {
    async fn list_boards(&self) -> BackendResult<Vec<BoardSummary>> {
        let url = self.table_url("boards");
        let req = self
            .request(Method::GET, &url)
            .query(&[("select", BOARD_LISTING_SELECT), ("order", "created_at.desc")]);
        let rows: Vec<BoardListingRow> = self.send_json(req, &url).await?;
        Ok(rows.into_iter().map(BoardSummary::from).collect())
    }

    async fn create_board(&self, board: &NewBoard) -> BackendResult<Board> {
        let url = self.rpc_url("create_board");
        let req = self.request(Method::POST, &url).json(board);
        let value: serde_json::Value = self.send_json(req, &url).await?;
        first_row(value, "Board")
    }

    async fn get_board(&self, board_id: BoardId) -> BackendResult<Board> {
        let url = self.table_url("boards");
        let req = self
            .request(Method::GET, &url)
            .query(&[("select", "*".to_string()), ("id", eq(board_id))]);
        self.send_single(req, &url, "Board", board_id.to_string())
            .await
    }

    async fn update_board(&self, board_id: BoardId, update: &BoardUpdate) -> BackendResult<Board> {
        let url = self.table_url("boards");
        let req = self
            .request(Method::PATCH, &url)
            .query(&[("id", eq(board_id))])
            .header("Prefer", "return=representation")
            .json(update);
        self.send_single(req, &url, "Board", board_id.to_string())
            .await
    }

    async fn list_columns(&self, board_id: BoardId) -> BackendResult<Vec<Column>> {
        let url = self.table_url("columns");
        let req = self.request(Method::GET, &url).query(&[
            ("select", "*".to_string()),
            ("board_id", eq(board_id)),
            ("order", "sort_order.asc".to_string()),
        ]);
        self.send_json(req, &url).await
    }

    async fn create_column(&self, column: &NewColumn) -> BackendResult<Column> {
        let url = self.table_url("columns");
        let req = self
            .request(Method::POST, &url)
            .header("Prefer", "return=representation")
            .json(column);
        self.send_single(req, &url, "Column", "(inserted)".into())
            .await
    }

    async fn update_column(
        &self,
        column_id: ColumnId,
        update: &ColumnUpdate,
    ) -> BackendResult<Column> {
        let url = self.table_url("columns");
        let req = self
            .request(Method::PATCH, &url)
            .query(&[("id", eq(column_id))])
            .header("Prefer", "return=representation")
            .json(update);
        self.send_single(req, &url, "Column", column_id.to_string())
            .await
    }

    async fn list_tasks(&self, board_id: BoardId) -> BackendResult<Vec<Task>> {
        let url = self.table_url("tasks");
        let req = self.request(Method::GET, &url).query(&[
            ("select", BOARD_TASKS_SELECT.to_string()),
            ("columns.board_id", eq(board_id)),
            ("order", "sort_order.asc".to_string()),
        ]);
        self.send_json(req, &url).await
    }

    async fn create_task(&self, task: &NewTask) -> BackendResult<Task> {
        let url = self.table_url("tasks");
        let req = self
            .request(Method::POST, &url)
            .header("Prefer", "return=representation")
            .json(task);
        self.send_single(req, &url, "Task", "(inserted)".into())
            .await
    }

    async fn move_task(
        &self,
        task_id: TaskId,
        column_id: ColumnId,
        position: i32,
    ) -> BackendResult<()> {
        let url = self.table_url("tasks");
        let req = self
            .request(Method::PATCH, &url)
            .query(&[("id", eq(task_id))])
            .json(&serde_json::json!({
                "column_id": column_id,
                "sort_order": position,
            }));
        self.send(req, &url).await?;
        tracing::debug!(%task_id, %column_id, position, "task moved");
        Ok(())
    }

    async fn list_board_users(&self, board_id: BoardId) -> BackendResult<Vec<BoardUser>> {
        let url = self.rpc_url("get_users_for_board");
        let req = self
            .request(Method::POST, &url)
            .json(&serde_json::json!({ "board_id_arg": board_id }));
        let users: Option<Vec<BoardUser>> = self.send_json(req, &url).await?;
        Ok(users.unwrap_or_default())
    }
}
