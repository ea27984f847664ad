//! Error types used by the runner and by individual tasks.
//!
//! - [`RunError`]: errors raised for a whole run (bad arguments, interruption).
//! - [`TaskError`]: errors raised by one task execution; collected, never thrown.
//! - [`TaskFailure`]: a [`TaskError`] paired with the id of the task that produced it.
//!
//! All types provide `as_label` for logs/metrics.

use std::any::Any;
use std::time::Duration;
use thiserror::Error;

use crate::tasks::TaskId;

/// # Errors produced for a whole run.
///
/// Precondition violations are returned straight from `run`. Interruptions
/// (`Canceled`, `DeadlineExceeded`) are reported on the partial
/// [`Batch`](crate::Batch) and surface as errors only through
/// [`Batch::ensure_complete`](crate::Batch::ensure_complete).
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RunError {
    /// The run was asked to launch zero tasks.
    #[error("task count must be greater than zero")]
    InvalidTaskCount,

    /// The run was given a zero concurrency limit.
    #[error("concurrency limit must be greater than zero")]
    InvalidConcurrency,

    /// The run was cancelled before every task completed.
    #[error("run cancelled; {completed}/{expected} tasks completed")]
    Canceled {
        /// Outcomes collected before cancellation.
        completed: usize,
        /// Number of tasks launched.
        expected: usize,
    },

    /// The global run deadline elapsed before every task completed.
    #[error("run deadline {deadline:?} exceeded; {completed}/{expected} tasks completed; pending: {pending:?}")]
    DeadlineExceeded {
        /// The configured deadline.
        deadline: Duration,
        /// Outcomes collected before the deadline.
        completed: usize,
        /// Number of tasks launched.
        expected: usize,
        /// Labels of tasks that had not reported.
        pending: Vec<String>,
    },

    /// Some tasks never reported although nothing interrupted the run.
    ///
    /// Happens only when a task's tokio task dies outside the runner's panic
    /// capture (for example a panicking `Task::label`).
    #[error("run incomplete; {completed}/{expected} tasks completed; pending: {pending:?}")]
    Incomplete {
        /// Outcomes collected.
        completed: usize,
        /// Number of tasks launched.
        expected: usize,
        /// Labels of tasks that had not reported.
        pending: Vec<String>,
    },
}

impl RunError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use gatevisor::RunError;
    ///
    /// let err = RunError::Canceled { completed: 2, expected: 6 };
    /// assert_eq!(err.as_label(), "run_canceled");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RunError::InvalidTaskCount => "run_invalid_task_count",
            RunError::InvalidConcurrency => "run_invalid_concurrency",
            RunError::Canceled { .. } => "run_canceled",
            RunError::DeadlineExceeded { .. } => "run_deadline_exceeded",
            RunError::Incomplete { .. } => "run_incomplete",
        }
    }

    /// True for interruptions that still carry a partial batch.
    pub fn is_interruption(&self) -> bool {
        matches!(
            self,
            RunError::Canceled { .. } | RunError::DeadlineExceeded { .. }
        )
    }
}

/// # Errors produced by one task execution.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// Task execution exceeded the per-task timeout.
    #[error("timed out after {timeout:?}")]
    Timeout {
        /// The timeout duration that was exceeded.
        timeout: Duration,
    },

    /// The unit of work reported a failure.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// The unit of work panicked; the panic was caught.
    #[error("task panicked: {info}")]
    Panicked {
        /// Panic payload rendered as text.
        info: String,
    },

    /// Task observed cancellation (run cancelled or deadline hit).
    #[error("context cancelled")]
    Canceled,
}

impl TaskError {
    /// Shorthand for [`TaskError::Fail`].
    ///
    /// ```
    /// use gatevisor::TaskError;
    ///
    /// let err = TaskError::fail("disk full");
    /// assert_eq!(err.to_string(), "execution failed: disk full");
    /// ```
    pub fn fail(error: impl Into<String>) -> Self {
        TaskError::Fail {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use gatevisor::TaskError;
    /// use std::time::Duration;
    ///
    /// let err = TaskError::Timeout { timeout: Duration::from_secs(1) };
    /// assert_eq!(err.as_label(), "task_timeout");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Timeout { .. } => "task_timeout",
            TaskError::Fail { .. } => "task_failed",
            TaskError::Panicked { .. } => "task_panicked",
            TaskError::Canceled => "task_canceled",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            TaskError::Timeout { timeout } => format!("timeout: {timeout:?}"),
            TaskError::Fail { error } => format!("error: {error}"),
            TaskError::Panicked { info } => format!("panic: {info}"),
            TaskError::Canceled => "context cancelled".to_string(),
        }
    }
}

/// Renders a caught panic payload as text.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// A failed task: its id and the captured cause.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("task {id} failed: {cause}")]
pub struct TaskFailure {
    /// Id of the failing task.
    pub id: TaskId,
    /// What went wrong.
    #[source]
    pub cause: TaskError,
}
