//! Board state on the client: the reorder engine and the session and
//! dashboard glue around it.

pub mod columns;
pub mod dashboard;
pub mod engine;
pub mod filters;
pub mod session;

pub use columns::BoardColumns;
pub use dashboard::{Dashboard, NewBoardInput};
pub use engine::{DragOutcome, DropTarget, ReorderEngine, RollbackPolicy};
pub use filters::{BoardFilters, TaskFilters};
pub use session::{BoardSession, NewTaskInput};
