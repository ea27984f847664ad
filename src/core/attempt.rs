//! # Run a single task of a batch.
//!
//! Drives one task through the four steps of the runner contract and
//! publishes lifecycle events to the [`Bus`].
//!
//! ```text
//! gate.acquire() ──► publish TaskAdmitted
//!      │
//!      ▼
//! task.spawn(id, child) (timeout + panic capture)
//!      │
//!      ├─ Ok(v)         ──► publish TaskCompleted
//!      ├─ Err(Timeout)  ──► publish TimeoutHit, TaskFailed
//!      ├─ Err(Panicked) ──► publish TaskPanicked
//!      └─ Err(other)    ──► publish TaskFailed
//!      │
//!      ▼
//! sink.deposit(outcome) ──► drop(permit)
//! ```
//!
//! ## Rules
//! - A task that never gets a slot (run cancelled, gate closed) deposits nothing.
//! - An admitted task always deposits **exactly one** outcome, then releases its slot.
//! - Each task works under a **child token**; its timeout never touches siblings.

use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::{
    error::{TaskError, panic_message},
    events::{Bus, Event, EventKind},
    gate::{AdmissionGate, SinkSender},
    tasks::{TaskId, TaskOutcome, TaskRef},
};

/// Everything one launched task shares with the rest of its run.
pub(crate) struct Launch<T> {
    pub gate: Arc<AdmissionGate>,
    pub sink: SinkSender<T>,
    pub bus: Bus,
    pub token: CancellationToken,
    pub timeout: Option<Duration>,
}

impl<T> Clone for Launch<T> {
    fn clone(&self) -> Self {
        Self {
            gate: Arc::clone(&self.gate),
            sink: self.sink.clone(),
            bus: self.bus.clone(),
            token: self.token.clone(),
            timeout: self.timeout,
        }
    }
}

/// Acquires a slot, runs the task, deposits its outcome and releases the slot.
pub(crate) async fn run_admitted<T: Send + 'static>(
    launch: Launch<T>,
    task: TaskRef<T>,
    id: TaskId,
    label: Arc<str>,
) {
    let Some(permit) = launch.gate.acquire(&launch.token).await else {
        debug!(task = %label, "not admitted; run is stopping");
        return;
    };
    launch.bus.publish(
        Event::new(EventKind::TaskAdmitted)
            .with_task(Arc::clone(&label))
            .with_task_id(id.index())
            .with_in_flight(permit.in_flight_at_admission()),
    );

    let started = Instant::now();
    let result = run_once(&task, id, &launch.token, launch.timeout).await;
    let elapsed = started.elapsed();

    publish_outcome(&launch.bus, &label, id, elapsed, &result);

    let deposited = launch.sink.deposit(TaskOutcome {
        id,
        label: Arc::clone(&label),
        result,
        elapsed,
    });
    if !deposited {
        debug!(task = %label, "outcome discarded; runner stopped waiting");
    }
    drop(permit);
}

/// Executes the work for `id` under a child token with optional timeout.
///
/// Panics inside the work are caught and returned as [`TaskError::Panicked`].
/// On timeout the child token is cancelled before returning.
async fn run_once<T: Send + 'static>(
    task: &TaskRef<T>,
    id: TaskId,
    parent: &CancellationToken,
    timeout: Option<Duration>,
) -> Result<T, TaskError> {
    let child = parent.child_token();
    let ctx = child.clone();
    // `spawn` itself may panic before handing back a future.
    let work = std::panic::AssertUnwindSafe(async move { task.spawn(id, ctx).await })
        .catch_unwind()
        .map(|res| {
            res.unwrap_or_else(|payload| {
                Err(TaskError::Panicked {
                    info: panic_message(payload.as_ref()),
                })
            })
        });

    match timeout.filter(|d| *d > Duration::ZERO) {
        Some(dur) => match time::timeout(dur, work).await {
            Ok(res) => res,
            Err(_elapsed) => {
                child.cancel();
                Err(TaskError::Timeout { timeout: dur })
            }
        },
        None => work.await,
    }
}

fn publish_outcome<T>(
    bus: &Bus,
    label: &Arc<str>,
    id: TaskId,
    elapsed: Duration,
    result: &Result<T, TaskError>,
) {
    let base = |kind| {
        Event::new(kind)
            .with_task(Arc::clone(label))
            .with_task_id(id.index())
            .with_elapsed(elapsed)
    };

    match result {
        Ok(_) => bus.publish(base(EventKind::TaskCompleted)),
        Err(TaskError::Panicked { info }) => {
            bus.publish(base(EventKind::TaskPanicked).with_reason(info.as_str()));
        }
        Err(e) => {
            if let TaskError::Timeout { timeout } = e {
                bus.publish(base(EventKind::TimeoutHit).with_timeout(*timeout));
            }
            bus.publish(base(EventKind::TaskFailed).with_reason(e.to_string()));
        }
    }
}
