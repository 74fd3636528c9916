//! In-process stand-in for the hosted REST backend, just enough of the
//! PostgREST surface for the board commands.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use axum::extract::{RawQuery, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{TimeZone, Utc};
use serde_json::{Value, json};
use uuid::Uuid;

pub const API_KEY: &str = "test-anon-key";

pub const BOARD_ID: Uuid = Uuid::from_u128(0xb0);
pub const TODO_ID: Uuid = Uuid::from_u128(0xc1);
pub const DONE_ID: Uuid = Uuid::from_u128(0xc2);
pub const TASK_A: Uuid = Uuid::from_u128(0xa1);
pub const TASK_B: Uuid = Uuid::from_u128(0xa2);
pub const TASK_C: Uuid = Uuid::from_u128(0xa3);

/// One PATCH the fake received.
#[derive(Debug, Clone)]
pub struct RecordedPatch {
    pub query: String,
    pub body: Value,
    pub api_key: Option<String>,
    pub authorization: Option<String>,
}

#[derive(Default)]
pub struct FakeState {
    pub patches: Vec<RecordedPatch>,
    pub inserted_tasks: Vec<Value>,
    /// When set, task PATCHes fail with this message.
    pub reject_moves: Option<String>,
}

pub type Shared = Arc<Mutex<FakeState>>;

fn timestamp() -> String {
    Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0)
        .single()
        .map(|t| t.to_rfc3339())
        .unwrap_or_default()
}

fn board_json() -> Value {
    json!({
        "id": BOARD_ID,
        "title": "Launch",
        "description": "Release checklist",
        "color": "bg-blue-500",
        "created_at": timestamp(),
        "updated_at": timestamp(),
        "creator": "Ada"
    })
}

fn column_json(id: Uuid, title: &str, order: i32) -> Value {
    json!({
        "id": id,
        "board_id": BOARD_ID,
        "title": title,
        "sort_order": order,
        "created_at": timestamp()
    })
}

fn task_json(id: Uuid, column_id: Uuid, title: &str, order: i32, priority: &str) -> Value {
    json!({
        "id": id,
        "column_id": column_id,
        "title": title,
        "description": null,
        "assignee": null,
        "due_date": null,
        "priority": priority,
        "sort_order": order,
        "created_at": timestamp(),
        "columns": { "board_id": BOARD_ID }
    })
}

pub fn tasks_json() -> Vec<Value> {
    vec![
        task_json(TASK_A, TODO_ID, "Write notes", 0, "high"),
        task_json(TASK_B, TODO_ID, "Tag release", 1, "medium"),
        task_json(TASK_C, TODO_ID, "Announce", 2, "low"),
    ]
}

async fn boards(RawQuery(query): RawQuery) -> Json<Value> {
    let query = query.unwrap_or_default();
    if query.contains("columns") {
        let mut listing = board_json();
        listing["columns"] = json!([{ "tasks": tasks_json() }, { "tasks": [] }]);
        return Json(json!([listing]));
    }
    if query.contains(&BOARD_ID.to_string()) {
        Json(json!([board_json()]))
    } else {
        Json(json!([]))
    }
}

async fn columns() -> Json<Value> {
    Json(json!([
        column_json(TODO_ID, "To Do", 0),
        column_json(DONE_ID, "Done", 1)
    ]))
}

async fn tasks() -> Json<Value> {
    Json(Value::Array(tasks_json()))
}

async fn insert_task(State(state): State<Shared>, Json(body): Json<Value>) -> Json<Value> {
    let mut row = body.clone();
    row["id"] = json!(Uuid::from_u128(0xa9));
    row["created_at"] = json!(timestamp());
    if let Ok(mut state) = state.lock() {
        state.inserted_tasks.push(body);
    }
    Json(json!([row]))
}

async fn patch_task(
    State(state): State<Shared>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(String::from)
    };
    let mut state = match state.lock() {
        Ok(state) => state,
        Err(_) => return StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    };
    state.patches.push(RecordedPatch {
        query: query.unwrap_or_default(),
        body,
        api_key: header("apikey"),
        authorization: header("authorization"),
    });
    match &state.reject_moves {
        Some(message) => (
            StatusCode::FORBIDDEN,
            Json(json!({ "code": "42501", "message": message })),
        )
            .into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

async fn board_users() -> Json<Value> {
    Json(json!([
        {
            "id": Uuid::from_u128(0xe1),
            "full_name": "Ada Lovelace",
            "avatar_img_name": "ada.png",
            "avatar_img_cb": "1"
        }
    ]))
}

/// Bind the fake on an ephemeral port and return its base URL.
pub async fn spawn_backend(state: Shared) -> String {
    let app = Router::new()
        .route("/rest/v1/boards", get(boards))
        .route("/rest/v1/columns", get(columns))
        .route(
            "/rest/v1/tasks",
            get(tasks).post(insert_task).patch(patch_task),
        )
        .route("/rest/v1/rpc/get_users_for_board", post(board_users))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}
