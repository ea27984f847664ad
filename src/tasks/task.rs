//! # Task abstraction.
//!
//! A [`Task`] produces one value of type `T` per run. It receives its
//! [`TaskId`] and a [`CancellationToken`]; the token fires when the run is
//! cancelled, the run deadline elapses, or the per-task timeout expires.
//! Implementors should check it and exit promptly.

use std::{future::Future, pin::Pin, sync::Arc};

use tokio_util::sync::CancellationToken;

use crate::{error::TaskError, tasks::TaskId};

/// Boxed future returned by [`Task::spawn`].
pub type BoxTaskFuture<T> = Pin<Box<dyn Future<Output = Result<T, TaskError>> + Send + 'static>>;

/// # Shared handle to a task object.
///
/// This is the primary type passed to the runner.
pub type TaskRef<T> = Arc<dyn Task<T>>;

/// # Asynchronous, cancelable unit of work.
///
/// # Example
/// ```
/// use tokio_util::sync::CancellationToken;
/// use gatevisor::{BoxTaskFuture, Task, TaskError, TaskId};
///
/// struct Square;
///
/// impl Task<usize> for Square {
///     fn spawn(&self, id: TaskId, ctx: CancellationToken) -> BoxTaskFuture<usize> {
///         Box::pin(async move {
///             if ctx.is_cancelled() {
///                 return Err(TaskError::Canceled);
///             }
///             Ok(id.index() * id.index())
///         })
///     }
/// }
/// ```
pub trait Task<T>: Send + Sync + 'static {
    /// Returns the label used in events and outcomes for the task at `id`.
    ///
    /// Default: `no{id}`.
    fn label(&self, id: TaskId) -> String {
        id.label()
    }

    /// Creates a fresh future performing the work for `id`.
    fn spawn(&self, id: TaskId, ctx: CancellationToken) -> BoxTaskFuture<T>;
}
