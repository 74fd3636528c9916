//! Ordered column list of an open board, each column holding its ordered
//! tasks. Pure data operations only; nothing here talks to the backend.

use crate::common::{Column, ColumnId, ColumnWithTasks, Task, TaskId};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoardColumns(Vec<ColumnWithTasks>);

impl BoardColumns {
    pub fn new(columns: Vec<ColumnWithTasks>) -> Self {
        Self(columns)
    }

    /// Distribute `tasks` into `columns`. Both lists are ordered by
    /// `sort_order` with ties kept in arrival order. Tasks whose column is
    /// not on the board are dropped.
    pub fn assemble(mut columns: Vec<Column>, mut tasks: Vec<Task>) -> Self {
        columns.sort_by_key(|c| c.sort_order);
        tasks.sort_by_key(|t| t.sort_order);

        let mut out: Vec<ColumnWithTasks> =
            columns.into_iter().map(ColumnWithTasks::new).collect();
        for task in tasks {
            match out.iter_mut().find(|c| c.id() == task.column_id) {
                Some(col) => col.tasks.push(task),
                None => {
                    tracing::debug!(task_id = %task.id, column_id = %task.column_id, "dropping task with unknown column");
                }
            }
        }
        Self(out)
    }

    pub fn as_slice(&self) -> &[ColumnWithTasks] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<ColumnWithTasks> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn first(&self) -> Option<&ColumnWithTasks> {
        self.0.first()
    }

    pub fn column(&self, column_id: &ColumnId) -> Option<&ColumnWithTasks> {
        self.0.iter().find(|c| c.id() == *column_id)
    }

    pub fn column_index(&self, column_id: &ColumnId) -> Option<usize> {
        self.0.iter().position(|c| c.id() == *column_id)
    }

    /// `(column index, task index)` of a task.
    pub fn locate(&self, task_id: &TaskId) -> Option<(usize, usize)> {
        self.0
            .iter()
            .enumerate()
            .find_map(|(ci, col)| col.task_index(task_id).map(|ti| (ci, ti)))
    }

    pub fn find_task(&self, task_id: &TaskId) -> Option<&Task> {
        self.locate(task_id).map(|(ci, ti)| &self.0[ci].tasks[ti])
    }

    /// Id of the column currently holding `task_id`.
    pub fn column_of(&self, task_id: &TaskId) -> Option<ColumnId> {
        self.locate(task_id).map(|(ci, _)| self.0[ci].id())
    }

    pub fn all_tasks(&self) -> impl Iterator<Item = &Task> {
        self.0.iter().flat_map(|c| c.tasks.iter())
    }

    pub fn task_count(&self) -> usize {
        self.0.iter().map(|c| c.tasks.len()).sum()
    }

    /// Remove the task at `from` and reinsert it at `to` within one column.
    /// Out-of-range indices leave the column untouched.
    pub fn move_within(&mut self, column_idx: usize, from: usize, to: usize) -> bool {
        let Some(col) = self.0.get_mut(column_idx) else {
            return false;
        };
        if from >= col.tasks.len() || to >= col.tasks.len() {
            return false;
        }
        if from != to {
            let task = col.tasks.remove(from);
            col.tasks.insert(to, task);
        }
        true
    }

    /// Take `task_id` out of whatever column holds it and insert it into
    /// `column_id` at `index` (clamped to the column length). The task's
    /// `column_id` and `sort_order` are updated to the new placement.
    /// Returns the index it landed on.
    pub fn relocate(&mut self, task_id: &TaskId, column_id: &ColumnId, index: usize) -> Option<usize> {
        let target_idx = self.column_index(column_id)?;
        let (ci, ti) = self.locate(task_id)?;
        let mut task = self.0[ci].tasks.remove(ti);

        let target = &mut self.0[target_idx];
        let index = index.min(target.tasks.len());
        task.column_id = *column_id;
        task.sort_order = i32::try_from(index).unwrap_or(i32::MAX);
        target.tasks.insert(index, task);
        Some(index)
    }

    pub(crate) fn push_column(&mut self, column: Column) {
        self.0.push(ColumnWithTasks::new(column));
    }

    pub(crate) fn push_task(&mut self, task: Task) -> bool {
        match self.0.iter_mut().find(|c| c.id() == task.column_id) {
            Some(col) => {
                col.tasks.push(task);
                true
            }
            None => false,
        }
    }

    /// Replace a column's own fields, keeping its tasks.
    pub(crate) fn merge_column(&mut self, column: Column) -> bool {
        match self.0.iter_mut().find(|c| c.id() == column.id) {
            Some(col) => {
                col.column = column;
                true
            }
            None => false,
        }
    }
}
