pub mod panel;
pub mod task;

pub use panel::{centered_area, render_panel};
pub use task::{TaskCompleted, TaskId, TaskSeq, TaskStarted, TaskState};
