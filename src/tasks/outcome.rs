use std::sync::Arc;
use std::time::Duration;

use crate::error::{TaskError, TaskFailure};
use crate::tasks::TaskId;

/// Completion record deposited into the result sink, one per task.
#[derive(Debug, Clone)]
pub struct TaskOutcome<T> {
    /// Launch position of the task.
    pub id: TaskId,
    /// Label used in events.
    pub label: Arc<str>,
    /// Value produced by the work, or the captured error.
    pub result: Result<T, TaskError>,
    /// Time spent holding the gate slot (the work itself).
    pub elapsed: Duration,
}

impl<T> TaskOutcome<T> {
    /// True if the work produced a value.
    #[inline]
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    /// Converts the outcome into a plain result tagged with the task id.
    pub fn into_result(self) -> Result<T, TaskFailure> {
        self.result.map_err(|cause| TaskFailure { id: self.id, cause })
    }
}
