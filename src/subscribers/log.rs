//! # LogWriter: event logger
//!
//! A subscriber that renders incoming [`Event`]s through `tracing`.
//! Install a `tracing` subscriber (e.g. `tracing-subscriber`) to see output.
//!
//! ## Example output
//! ```text
//! INFO  run started total=6 limit=3
//! DEBUG task admitted task=no0 in_flight=1
//! INFO  task completed task=no0 elapsed_ms=3000
//! WARN  task failed task=no3 reason="execution failed: boom"
//! INFO  run finished completed=6 total=6 elapsed_ms=6001
//! ```

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let task = e.task.as_deref().unwrap_or("unknown");
        let reason = e.reason.as_deref().unwrap_or("unknown");

        match e.kind {
            EventKind::RunStarted => {
                info!(total = e.total, limit = e.limit, "run started");
            }
            EventKind::TaskAdmitted => {
                debug!(task, in_flight = e.in_flight, "task admitted");
            }
            EventKind::TaskCompleted => {
                info!(task, elapsed_ms = e.elapsed_ms, "task completed");
            }
            EventKind::TaskFailed => {
                warn!(task, reason, elapsed_ms = e.elapsed_ms, "task failed");
            }
            EventKind::TaskPanicked => {
                error!(task, reason, "task panicked");
            }
            EventKind::TimeoutHit => {
                warn!(task, timeout_ms = e.timeout_ms, "task timed out");
            }
            EventKind::CancelRequested => {
                warn!(completed = e.completed, total = e.total, "cancel requested");
            }
            EventKind::DeadlineExceeded => {
                warn!(
                    completed = e.completed,
                    total = e.total,
                    deadline_ms = e.timeout_ms,
                    "run deadline exceeded"
                );
            }
            EventKind::RunFinished => {
                info!(
                    completed = e.completed,
                    total = e.total,
                    elapsed_ms = e.elapsed_ms,
                    "run finished"
                );
            }
            EventKind::SubscriberOverflow => {
                warn!(subscriber = task, reason, "subscriber overflow");
            }
            EventKind::SubscriberPanicked => {
                error!(subscriber = task, reason, "subscriber panicked");
            }
        }
    }

    fn name(&self) -> &'static str {
        "log-writer"
    }
}
