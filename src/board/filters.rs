//! View filters for the board page and the dashboard. Filtering produces a
//! new view and never touches the underlying columns.

use std::collections::BTreeSet;

use chrono::NaiveDate;

use crate::common::{BoardSummary, ColumnWithTasks, Priority, Task};

/// Filters applied to the tasks of an open board.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilters {
    /// Empty set means every priority.
    pub priorities: BTreeSet<Priority>,
    /// Empty set means every assignee. The empty string selects unassigned tasks.
    pub assignees: BTreeSet<String>,
    pub due_date: Option<NaiveDate>,
}

impl TaskFilters {
    pub fn is_empty(&self) -> bool {
        self.active_count() == 0
    }

    /// Number of individual filter selections in effect.
    pub fn active_count(&self) -> usize {
        usize::from(self.due_date.is_some()) + self.priorities.len() + self.assignees.len()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn matches(&self, task: &Task) -> bool {
        if !self.priorities.is_empty() && !self.priorities.contains(&task.priority) {
            return false;
        }
        if !self.assignees.is_empty() {
            let assignee = task.assignee.as_deref().unwrap_or("");
            if !self.assignees.contains(assignee) {
                return false;
            }
        }
        if let Some(due) = self.due_date
            && task.due_date != Some(due)
        {
            return false;
        }
        true
    }

    /// Columns with only the tasks that pass, in their current order.
    pub fn apply(&self, columns: &[ColumnWithTasks]) -> Vec<ColumnWithTasks> {
        columns
            .iter()
            .map(|col| ColumnWithTasks {
                column: col.column.clone(),
                tasks: col.tasks.iter().filter(|t| self.matches(t)).cloned().collect(),
            })
            .collect()
    }
}

/// Filters applied to the dashboard's board list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoardFilters {
    pub search: Option<String>,
    pub updated_from: Option<NaiveDate>,
    pub updated_to: Option<NaiveDate>,
    pub min_tasks: Option<usize>,
    pub max_tasks: Option<usize>,
}

impl BoardFilters {
    pub fn matches(&self, summary: &BoardSummary) -> bool {
        if let Some(search) = self.search.as_deref().map(str::trim)
            && !search.is_empty()
            && !summary
                .board
                .title
                .to_lowercase()
                .contains(&search.to_lowercase())
        {
            return false;
        }

        let updated = summary.board.updated_at.date_naive();
        if self.updated_from.is_some_and(|from| updated < from) {
            return false;
        }
        if self.updated_to.is_some_and(|to| updated > to) {
            return false;
        }

        let count = summary.tasks.len();
        if self.min_tasks.is_some_and(|min| count < min) {
            return false;
        }
        if self.max_tasks.is_some_and(|max| count > max) {
            return false;
        }
        true
    }

    pub fn apply<'a>(&self, boards: &'a [BoardSummary]) -> Vec<&'a BoardSummary> {
        boards.iter().filter(|b| self.matches(b)).collect()
    }
}
