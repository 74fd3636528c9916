//! Drag-and-drop reorder engine.
//!
//! A gesture is `begin_drag` → zero or more `drag_over` → `end_drag`.
//! `drag_over` rearranges tasks inside one column immediately and never
//! touches the network. `end_drag` applies any cross-column move locally and
//! then awaits exactly one `move_task` call (or none, when nothing changed).
//! A failed call is recorded in the engine's error field; it never escapes
//! `end_drag`.

use serde::{Deserialize, Serialize};

use super::columns::BoardColumns;
use crate::backend::SharedBackend;
use crate::common::{ColumnId, ColumnWithTasks, Task, TaskId};

/// What to do with the optimistic local state when the move call fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RollbackPolicy {
    /// Leave the local order as the user dropped it; the next reload corrects drift.
    #[default]
    #[serde(rename = "keep")]
    KeepOptimistic,
    /// Put the columns back the way they were when the gesture began.
    #[serde(rename = "restore")]
    RestoreSnapshot,
}

impl std::str::FromStr for RollbackPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "keep" => Ok(Self::KeepOptimistic),
            "restore" => Ok(Self::RestoreSnapshot),
            _ => Err(format!("Invalid rollback policy: {} (expected keep|restore)", s)),
        }
    }
}

/// Where a dragged task was released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropTarget {
    /// The column container or its empty space.
    Column(ColumnId),
    /// Another task.
    Task(TaskId),
}

/// Result of finishing a gesture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragOutcome {
    /// Nothing to persist: cancelled, unresolved, or dropped where it started.
    Ignored,
    Persisted {
        task_id: TaskId,
        column_id: ColumnId,
        position: i32,
    },
    Failed {
        task_id: TaskId,
        column_id: ColumnId,
        position: i32,
        message: String,
    },
}

#[derive(Debug, Clone)]
struct Gesture {
    task_id: TaskId,
    origin_column: ColumnId,
    origin_index: usize,
    snapshot: Option<BoardColumns>,
}

pub struct ReorderEngine {
    backend: SharedBackend,
    columns: BoardColumns,
    active: Option<Task>,
    gesture: Option<Gesture>,
    /// Last task `drag_over` placed the active task against.
    placed_over: Option<TaskId>,
    error: Option<String>,
    policy: RollbackPolicy,
}

impl ReorderEngine {
    pub fn new(backend: SharedBackend, columns: BoardColumns) -> Self {
        Self {
            backend,
            columns,
            active: None,
            gesture: None,
            placed_over: None,
            error: None,
            policy: RollbackPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: RollbackPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> RollbackPolicy {
        self.policy
    }

    pub fn columns(&self) -> &BoardColumns {
        &self.columns
    }

    pub(crate) fn columns_mut(&mut self) -> &mut BoardColumns {
        &mut self.columns
    }

    /// Replace the whole column list, e.g. after a reload. Any gesture in
    /// flight is dropped.
    pub fn replace_columns(&mut self, columns: Vec<ColumnWithTasks>) {
        self.columns = BoardColumns::new(columns);
        self.active = None;
        self.gesture = None;
        self.placed_over = None;
    }

    /// Task being dragged, for preview rendering only.
    pub fn active_task(&self) -> Option<&Task> {
        self.active.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn take_error(&mut self) -> Option<String> {
        self.error.take()
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub fn record_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    pub fn begin_drag(&mut self, task_id: TaskId) {
        let Some((ci, ti)) = self.columns.locate(&task_id) else {
            tracing::debug!(%task_id, "begin_drag: unknown task");
            return;
        };
        let column = &self.columns.as_slice()[ci];
        self.active = Some(column.tasks[ti].clone());
        self.placed_over = None;
        self.gesture = Some(Gesture {
            task_id,
            origin_column: column.id(),
            origin_index: ti,
            snapshot: match self.policy {
                RollbackPolicy::RestoreSnapshot => Some(self.columns.clone()),
                RollbackPolicy::KeepOptimistic => None,
            },
        });
    }

    /// Live same-column reordering while the pointer hovers over `over`.
    /// Repeat events for the target last placed against are ignored, so a
    /// pointer resting on one task does not keep swapping the pair.
    pub fn drag_over(&mut self, active_id: TaskId, over: DropTarget) {
        let DropTarget::Task(over_id) = over else {
            return;
        };
        if self.placed_over == Some(over_id) {
            return;
        }
        let (Some((src, from)), Some((dst, to))) =
            (self.columns.locate(&active_id), self.columns.locate(&over_id))
        else {
            tracing::debug!(%active_id, %over_id, "drag_over: unresolved task");
            return;
        };
        if src != dst || from == to {
            return;
        }
        self.columns.move_within(src, from, to);
        self.placed_over = Some(over_id);
    }

    /// Finish the gesture and persist the final placement of `active_id`.
    pub async fn end_drag(&mut self, active_id: TaskId, over: Option<DropTarget>) -> DragOutcome {
        self.active = None;
        let placed_over = self.placed_over.take();
        let gesture = self.gesture.take().filter(|g| g.task_id == active_id);

        let Some(target) = over else {
            return DragOutcome::Ignored;
        };

        let placement = match target {
            DropTarget::Column(column_id) => self.drop_on_column(active_id, column_id),
            DropTarget::Task(over_id) => {
                self.drop_on_task(active_id, over_id, placed_over, gesture.as_ref())
            }
        };
        let Some((column_id, index)) = placement else {
            return DragOutcome::Ignored;
        };
        let position = i32::try_from(index).unwrap_or(i32::MAX);

        match self.backend.move_task(active_id, column_id, position).await {
            Ok(()) => DragOutcome::Persisted {
                task_id: active_id,
                column_id,
                position,
            },
            Err(e) => {
                let message = e.user_message();
                tracing::warn!(task_id = %active_id, %column_id, position, error = %message, "failed to persist task move");
                self.error = Some(message.clone());
                if let Some(snapshot) = gesture.and_then(|g| g.snapshot) {
                    self.columns = snapshot;
                }
                DragOutcome::Failed {
                    task_id: active_id,
                    column_id,
                    position,
                    message,
                }
            }
        }
    }

    /// Append to `column_id` when the task lives elsewhere.
    fn drop_on_column(&mut self, active_id: TaskId, column_id: ColumnId) -> Option<(ColumnId, usize)> {
        let source = self.columns.column_of(&active_id)?;
        if source == column_id {
            return None;
        }
        let position = self.columns.column(&column_id)?.tasks.len();
        let index = self.columns.relocate(&active_id, &column_id, position)?;
        Some((column_id, index))
    }

    fn drop_on_task(
        &mut self,
        active_id: TaskId,
        over_id: TaskId,
        placed_over: Option<TaskId>,
        gesture: Option<&Gesture>,
    ) -> Option<(ColumnId, usize)> {
        let (src, current) = self.columns.locate(&active_id)?;
        let (dst, over_index) = self.columns.locate(&over_id)?;
        let target_id = self.columns.as_slice()[dst].id();

        if src != dst {
            let index = self.columns.relocate(&active_id, &target_id, over_index)?;
            return Some((target_id, index));
        }

        let new_index = if over_id == active_id || placed_over == Some(over_id) {
            current
        } else {
            over_index
        };
        let old_index = match gesture {
            Some(g) if g.origin_column == target_id => g.origin_index,
            _ => current,
        };
        if old_index == new_index {
            // Undo any hover-time splice so the view matches the stored order.
            if current != new_index {
                self.columns.move_within(src, current, new_index);
            }
            return None;
        }
        if current != new_index {
            self.columns.move_within(src, current, new_index);
        }
        self.columns
            .relocate(&active_id, &target_id, new_index)
            .map(|index| (target_id, index))
    }
}
