//! # Runtime events emitted by the runner and its tasks.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Run events**: batch lifecycle (started, cancel requested, deadline, finished)
//! - **Task events**: admission through the gate and terminal outcome
//! - **Subscriber events**: overflow and panic inside event consumers
//!
//! The [`Event`] struct carries metadata such as timestamps, task label,
//! reasons and gate occupancy.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//!
//! ## Example
//! ```rust
//! use gatevisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::TaskFailed)
//!     .with_task("no3")
//!     .with_reason("boom");
//!
//! assert_eq!(ev.kind, EventKind::TaskFailed);
//! assert_eq!(ev.task.as_deref(), Some("no3"));
//! assert_eq!(ev.reason.as_deref(), Some("boom"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(1);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `task`: subscriber name
    /// - `reason`: panic info/message
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `task`: subscriber name
    /// - `reason`: reason string (e.g., "full", "closed")
    SubscriberOverflow,

    // === Run events ===
    /// A batch was launched.
    ///
    /// Sets:
    /// - `total`: number of tasks launched
    /// - `limit`: gate capacity (absent when unlimited)
    RunStarted,

    /// The run token was cancelled (explicitly or by an OS signal).
    ///
    /// Sets:
    /// - `completed`, `total`
    CancelRequested,

    /// The run deadline elapsed before all tasks reported.
    ///
    /// Sets:
    /// - `completed`, `total`
    /// - `timeout_ms`: configured deadline (ms)
    DeadlineExceeded,

    /// The runner stopped waiting (complete or interrupted).
    ///
    /// Sets:
    /// - `completed`, `total`
    /// - `elapsed_ms`: wall time of the run
    RunFinished,

    // === Task events ===
    /// Task acquired a gate slot and is about to do its work.
    ///
    /// Sets:
    /// - `task`, `task_id`
    /// - `in_flight`: gate occupancy including this task
    TaskAdmitted,

    /// Task work produced a value.
    ///
    /// Sets:
    /// - `task`, `task_id`
    /// - `elapsed_ms`: time spent in the work
    TaskCompleted,

    /// Task work failed (error, timeout or cancellation).
    ///
    /// Sets:
    /// - `task`, `task_id`
    /// - `reason`: failure message
    /// - `elapsed_ms`
    TaskFailed,

    /// Task work panicked; the panic was caught.
    ///
    /// Sets:
    /// - `task`, `task_id`
    /// - `reason`: panic payload
    TaskPanicked,

    /// Task exceeded the per-task timeout (always followed by `TaskFailed`).
    ///
    /// Sets:
    /// - `task`, `task_id`
    /// - `timeout_ms`
    TimeoutHit,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Label of the task (or subscriber name for subscriber events).
    pub task: Option<Arc<str>>,
    /// Launch position of the task.
    pub task_id: Option<usize>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
    /// Timeout or deadline in milliseconds (compact).
    pub timeout_ms: Option<u32>,
    /// Elapsed time in milliseconds (compact).
    pub elapsed_ms: Option<u32>,
    /// Gate occupancy observed at admission.
    pub in_flight: Option<u32>,
    /// Gate capacity.
    pub limit: Option<u32>,
    /// Outcomes collected so far.
    pub completed: Option<u32>,
    /// Tasks launched in the batch.
    pub total: Option<u32>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            task: None,
            task_id: None,
            reason: None,
            timeout_ms: None,
            elapsed_ms: None,
            in_flight: None,
            limit: None,
            completed: None,
            total: None,
        }
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a task label.
    #[inline]
    pub fn with_task(mut self, task: impl Into<Arc<str>>) -> Self {
        self.task = Some(task.into());
        self
    }

    /// Attaches the task's launch position.
    #[inline]
    pub fn with_task_id(mut self, id: usize) -> Self {
        self.task_id = Some(id);
        self
    }

    /// Attaches a timeout duration (stored as milliseconds).
    #[inline]
    pub fn with_timeout(mut self, d: Duration) -> Self {
        self.timeout_ms = Some(millis(d));
        self
    }

    /// Attaches an elapsed duration (stored as milliseconds).
    #[inline]
    pub fn with_elapsed(mut self, d: Duration) -> Self {
        self.elapsed_ms = Some(millis(d));
        self
    }

    /// Attaches gate occupancy.
    #[inline]
    pub fn with_in_flight(mut self, n: usize) -> Self {
        self.in_flight = Some(saturate(n));
        self
    }

    /// Attaches gate capacity; `None` means unlimited and leaves the field empty.
    #[inline]
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit.map(saturate);
        self
    }

    /// Attaches progress counters.
    #[inline]
    pub fn with_progress(mut self, completed: usize, total: usize) -> Self {
        self.completed = Some(saturate(completed));
        self.total = Some(saturate(total));
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_task(subscriber)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_task(subscriber)
            .with_reason(info)
    }

    /// True for events produced by subscriber workers themselves.
    #[inline]
    pub fn is_subscriber_event(&self) -> bool {
        matches!(
            self.kind,
            EventKind::SubscriberOverflow | EventKind::SubscriberPanicked
        )
    }
}

fn millis(d: Duration) -> u32 {
    d.as_millis().min(u128::from(u32::MAX)) as u32
}

fn saturate(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seq_is_monotonic() {
        let a = Event::new(EventKind::RunStarted);
        let b = Event::new(EventKind::RunFinished);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn test_durations_saturate() {
        let ev = Event::new(EventKind::TimeoutHit).with_timeout(Duration::from_secs(u64::MAX));
        assert_eq!(ev.timeout_ms, Some(u32::MAX));
    }

    #[test]
    fn test_unlimited_leaves_limit_empty() {
        let ev = Event::new(EventKind::RunStarted)
            .with_limit(None)
            .with_progress(0, 6);
        assert_eq!(ev.limit, None);
        assert_eq!(ev.total, Some(6));
    }
}
