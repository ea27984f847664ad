//! # Task abstractions and per-task outcomes.
//!
//! This module provides the task-related types:
//! - [`Task`] - trait for implementing async cancelable units of work
//! - [`TaskFn`] - function-backed task implementation
//! - [`TaskRef`] - shared reference to a task (`Arc<dyn Task<T>>`)
//! - [`TaskId`] - position of a task inside its batch
//! - [`TaskOutcome`] - completion record deposited into the result sink

mod id;
mod outcome;
mod task;
mod task_fn;

pub use id::TaskId;
pub use outcome::TaskOutcome;
pub use task::{BoxTaskFuture, Task, TaskRef};
pub use task_fn::TaskFn;
