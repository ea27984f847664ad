//! # Function-backed task (`TaskFn`)
//!
//! [`TaskFn`] wraps a closure `F: Fn(TaskId, CancellationToken) -> Fut`, producing a fresh
//! future per spawn. The same closure serves every id of a batch.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use gatevisor::{TaskFn, TaskId, TaskError, TaskRef};
//!
//! let t: TaskRef<usize> = TaskFn::arc(|id: TaskId, _ctx: CancellationToken| async move {
//!     tokio::time::sleep(Duration::from_millis(10)).await;
//!     Ok::<_, TaskError>(id.index())
//! });
//!
//! assert_eq!(t.label(TaskId::new(4)), "no4");
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::error::TaskError;
use crate::tasks::{BoxTaskFuture, Task, TaskId};

/// Function-backed task implementation.
#[derive(Debug)]
pub struct TaskFn<F> {
    prefix: Option<Cow<'static, str>>,
    f: F,
}

impl<F> TaskFn<F> {
    /// Creates a new function-backed task labelled `no{id}`.
    pub fn new(f: F) -> Self {
        Self { prefix: None, f }
    }

    /// Creates a task whose labels read `{prefix}-{id}`.
    pub fn named(prefix: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            prefix: Some(prefix.into()),
            f,
        }
    }

    /// Creates the task and returns it as a shared handle.
    pub fn arc(f: F) -> Arc<Self> {
        Arc::new(Self::new(f))
    }
}

impl<T, F, Fut> Task<T> for TaskFn<F>
where
    T: Send + 'static,
    F: Fn(TaskId, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, TaskError>> + Send + 'static,
{
    fn label(&self, id: TaskId) -> String {
        match &self.prefix {
            Some(prefix) => format!("{prefix}-{id}"),
            None => id.label(),
        }
    }

    fn spawn(&self, id: TaskId, ctx: CancellationToken) -> BoxTaskFuture<T> {
        Box::pin((self.f)(id, ctx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fresh_future_per_spawn() {
        let task = TaskFn::new(|id: TaskId, _ctx: CancellationToken| async move {
            Ok::<_, TaskError>(id.index() * 10)
        });
        let token = CancellationToken::new();

        assert_eq!(task.spawn(TaskId::new(1), token.clone()).await, Ok(10));
        assert_eq!(task.spawn(TaskId::new(2), token).await, Ok(20));
    }

    #[test]
    fn test_named_labels() {
        let task = TaskFn::named("fetch", |_id: TaskId, _ctx: CancellationToken| async {
            Ok::<(), TaskError>(())
        });
        assert_eq!(Task::<()>::label(&task, TaskId::new(7)), "fetch-7");
    }
}
