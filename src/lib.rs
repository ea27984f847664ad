//! # gatevisor
//!
//! **Gatevisor** is a bounded-concurrency task runner for Rust.
//!
//! It launches a fixed batch of N async tasks, lets at most M of them work at
//! the same time, and waits (without polling) until every task has reported.
//! Failures, timeouts and panics are captured per task instead of aborting the
//! batch.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │  task no0    │   │  task no1    │   │  task noN-1  │
//!     │ (TaskRef<T>) │   │ (TaskRef<T>) │   │ (TaskRef<T>) │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Runner (per-run orchestrator)                                    │
//! │  - AdmissionGate (capacity M, instrumented)                       │
//! │  - ResultSink   (capacity N, completion barrier)                  │
//! │  - Bus          (broadcast events)                                │
//! │  - SubscriberSet (fans out to user subscribers)                   │
//! └──────┬──────────────────┬──────────────────┬───────────────┬──────┘
//!        ▼                  ▼                  ▼               │
//!   acquire slot       acquire slot       acquire slot         │
//!   work(id, ctx)      work(id, ctx)      (waits at gate)      │
//!   deposit outcome    deposit outcome                         │
//!   release slot       release slot                            │
//!        │                  │                                  │
//!        │ TaskAdmitted     │ TaskCompleted                    │ RunStarted
//!        │ TaskFailed       │ TimeoutHit                       │ RunFinished
//!        ▼                  ▼                                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                        Bus (broadcast channel)                    │
//! │                   (capacity: Config::bus_capacity)                │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//!                       ┌────────────────────────┐
//!                       │  subscriber listener   │
//!                       │      (in Runner)       │
//!                       └───────────┬────────────┘
//!                                   ▼
//!                             SubscriberSet
//!                            (per-sub queues)
//!                         ┌─────────┼─────────┐
//!                         ▼         ▼         ▼
//!                      worker1   worker2   workerN
//! ```
//!
//! ### Lifecycle
//! ```text
//! run(N, work)
//!   ├─► validate (N > 0)
//!   ├─► publish RunStarted
//!   ├─► spawn N tasks ──► each: acquire ─► work ─► deposit ─► release
//!   ├─► sink.fill(stop)
//!   │       ├─ N outcomes      ─► Batch (complete)
//!   │       ├─ token cancelled ─► CancelRequested, grace, abort ─► Batch (Canceled)
//!   │       └─ deadline        ─► DeadlineExceeded, grace, abort ─► Batch (DeadlineExceeded)
//!   └─► publish RunFinished
//! ```
//!
//! ## Features
//! | Area              | Description                                                  | Key types / traits                          |
//! |-------------------|--------------------------------------------------------------|---------------------------------------------|
//! | **Runner**        | Launch a batch under a concurrency limit and wait for it.    | [`Runner`], [`run`], [`Batch`]              |
//! | **Gate & sink**   | Instrumented admission gate and completion barrier.          | [`AdmissionGate`], [`ResultSink`]           |
//! | **Subscriber API**| Hook into run/task lifecycle events.                         | [`Subscribe`], [`Event`], [`EventKind`]     |
//! | **Errors**        | Typed per-task and per-run errors.                           | [`TaskError`], [`RunError`], [`TaskFailure`]|
//! | **Tasks**         | Define tasks as closures or trait objects.                   | [`Task`], [`TaskFn`], [`TaskRef`]           |
//! | **Configuration** | Limit, timeouts, deadline, grace, signals.                   | [`Config`]                                  |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use gatevisor::{Config, Runner, TaskError, TaskId};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut cfg = Config::with_limit(3);
//!     cfg.task_timeout = Duration::from_secs(5);
//!
//!     #[cfg(feature = "logging")]
//!     let subs: Vec<Arc<dyn gatevisor::Subscribe>> = vec![Arc::new(gatevisor::LogWriter)];
//!     #[cfg(not(feature = "logging"))]
//!     let subs: Vec<Arc<dyn gatevisor::Subscribe>> = Vec::new();
//!
//!     let runner = Runner::builder(cfg).with_subscribers(subs).build();
//!
//!     let batch = runner
//!         .run(6, |id: TaskId, _ctx: CancellationToken| async move {
//!             tokio::time::sleep(Duration::from_millis(20)).await;
//!             Ok::<_, TaskError>(id.index() * 10)
//!         })
//!         .await?
//!         .ensure_complete()?;
//!
//!     assert_eq!(batch.len(), 6);
//!     assert!(batch.gate().peak <= 3);
//!     Ok(())
//! }
//! ```
mod config;
mod core;
mod error;
mod events;
mod gate;
mod subscribers;
mod tasks;

// ---- Public re-exports ----

pub use config::Config;
pub use core::{Batch, Interrupt, Runner, RunnerBuilder, run, wait_for_shutdown_signal};
pub use error::{RunError, TaskError, TaskFailure};
pub use events::{Bus, Event, EventKind};
pub use gate::{AdmissionGate, Fill, GatePermit, GateStats, ResultSink, SinkSender};
pub use subscribers::{Subscribe, SubscriberSet};
pub use tasks::{BoxTaskFuture, Task, TaskFn, TaskId, TaskOutcome, TaskRef};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
