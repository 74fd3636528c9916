//! Board sessions driven against an in-process REST backend.

mod common;

use std::sync::{Arc, Mutex};

use common::*;
use serde_json::json;
use taskboard::backend::{BoardBackend, RestBackend, SharedBackend};
use taskboard::board::{BoardSession, DragOutcome, DropTarget, NewTaskInput, RollbackPolicy};
use taskboard::common::Priority;

async fn setup() -> (Arc<Mutex<FakeState>>, SharedBackend) {
    let state = Arc::new(Mutex::new(FakeState::default()));
    let url = spawn_backend(state.clone()).await;
    let backend: SharedBackend = Arc::new(RestBackend::new(url, API_KEY));
    (state, backend)
}

fn titles(session: &BoardSession, column: usize) -> Vec<String> {
    session.columns()[column]
        .tasks
        .iter()
        .map(|t| t.title.clone())
        .collect()
}

#[tokio::test]
async fn test_load_assembles_board() {
    let (_state, backend) = setup().await;
    let mut session = BoardSession::new(backend, BOARD_ID);
    session.load().await;

    assert_eq!(session.error(), None);
    assert_eq!(session.board().map(|b| b.title.as_str()), Some("Launch"));
    assert_eq!(session.columns().len(), 2);
    assert_eq!(
        titles(&session, 0),
        vec!["Write notes", "Tag release", "Announce"]
    );
    assert!(session.columns()[1].tasks.is_empty());
    assert_eq!(session.task_count(), 3);
    assert_eq!(session.user_count(), 1);
}

#[tokio::test]
async fn test_load_unknown_board_records_error() {
    let (_state, backend) = setup().await;
    let missing = uuid::Uuid::from_u128(0xdead);
    let mut session = BoardSession::new(backend, missing);
    session.load().await;

    let error = session.take_error().unwrap();
    assert!(error.starts_with(&format!("Failed to load board with ID [{}]", missing)));
    assert!(session.board().is_none());
}

#[tokio::test]
async fn test_drag_persists_single_patch() {
    let (state, backend) = setup().await;
    let mut session = BoardSession::new(backend, BOARD_ID);
    session.load().await;

    session.begin_drag(TASK_C);
    session.drag_over(TASK_C, DropTarget::Task(TASK_A));
    let outcome = session.end_drag(TASK_C, Some(DropTarget::Task(TASK_A))).await;

    assert_eq!(
        outcome,
        DragOutcome::Persisted {
            task_id: TASK_C,
            column_id: TODO_ID,
            position: 0,
        }
    );
    assert_eq!(
        titles(&session, 0),
        vec!["Announce", "Write notes", "Tag release"]
    );

    let state = state.lock().unwrap();
    assert_eq!(state.patches.len(), 1);
    let patch = &state.patches[0];
    assert_eq!(patch.query, format!("id=eq.{}", TASK_C));
    assert_eq!(
        patch.body,
        json!({ "column_id": TODO_ID, "sort_order": 0 })
    );
    assert_eq!(patch.api_key.as_deref(), Some(API_KEY));
    assert_eq!(
        patch.authorization.as_deref(),
        Some(format!("Bearer {}", API_KEY).as_str())
    );
}

#[tokio::test]
async fn test_drop_on_empty_column_appends() {
    let (state, backend) = setup().await;
    let mut session = BoardSession::new(backend, BOARD_ID);
    session.load().await;

    session.begin_drag(TASK_B);
    let outcome = session
        .end_drag(TASK_B, Some(DropTarget::Column(DONE_ID)))
        .await;

    assert_eq!(
        outcome,
        DragOutcome::Persisted {
            task_id: TASK_B,
            column_id: DONE_ID,
            position: 0,
        }
    );
    assert_eq!(titles(&session, 0), vec!["Write notes", "Announce"]);
    assert_eq!(titles(&session, 1), vec!["Tag release"]);
    assert_eq!(state.lock().unwrap().patches.len(), 1);
}

#[tokio::test]
async fn test_rejected_move_surfaces_server_message() {
    let (state, backend) = setup().await;
    state.lock().unwrap().reject_moves = Some("permission denied for table tasks".into());

    let mut session = BoardSession::new(backend, BOARD_ID);
    session.load().await;

    session.begin_drag(TASK_C);
    let outcome = session.end_drag(TASK_C, Some(DropTarget::Task(TASK_A))).await;

    assert!(matches!(outcome, DragOutcome::Failed { ref message, .. } if message == "permission denied for table tasks"));
    assert_eq!(session.error(), Some("permission denied for table tasks"));
    // Optimistic order is kept.
    assert_eq!(
        titles(&session, 0),
        vec!["Announce", "Write notes", "Tag release"]
    );
}

#[tokio::test]
async fn test_rejected_move_restores_with_restore_policy() {
    let (state, backend) = setup().await;
    state.lock().unwrap().reject_moves = Some("denied".into());

    let mut session =
        BoardSession::new(backend, BOARD_ID).with_policy(RollbackPolicy::RestoreSnapshot);
    session.load().await;

    session.begin_drag(TASK_C);
    session.drag_over(TASK_C, DropTarget::Task(TASK_A));
    session.end_drag(TASK_C, Some(DropTarget::Task(TASK_A))).await;

    assert_eq!(session.error(), Some("denied"));
    assert_eq!(
        titles(&session, 0),
        vec!["Write notes", "Tag release", "Announce"]
    );
}

#[tokio::test]
async fn test_create_task_in_first_column() {
    let (state, backend) = setup().await;
    let mut session = BoardSession::new(backend, BOARD_ID);
    session.load().await;

    let task = session
        .create_task_in_first_column(NewTaskInput {
            title: "  Update changelog ".into(),
            priority: Priority::High,
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(task.title, "Update changelog");
    assert_eq!(task.column_id, TODO_ID);
    assert_eq!(task.sort_order, 3);
    assert_eq!(session.task_count(), 4);

    let state = state.lock().unwrap();
    assert_eq!(state.inserted_tasks.len(), 1);
    assert_eq!(state.inserted_tasks[0]["priority"], "high");
    assert_eq!(state.inserted_tasks[0]["sort_order"], 3);
}

#[tokio::test]
async fn test_backend_listing_counts_tasks() {
    let (_state, backend) = setup().await;
    let boards = backend.list_boards().await.unwrap();
    assert_eq!(boards.len(), 1);
    assert_eq!(boards[0].tasks.len(), 3);
}
