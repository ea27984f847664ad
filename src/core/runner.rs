//! # Runner: launches a batch, throttles it, waits for every outcome.
//!
//! The [`Runner`] owns the run configuration and the user subscribers. Each
//! call to a `run*` method builds fresh per-run state (bus, gate, sink), spawns
//! one tokio task per job, and blocks on the result sink until the batch is
//! complete or interrupted.
//!
//! ## High-level architecture
//! ```text
//! run(task_count, work)
//!   │
//!   ├─ Bus + subscriber listener (only when subscribers exist)
//!   ├─ AdmissionGate(cfg.max_concurrent)     ResultSink(task_count)
//!   │
//!   ├─ spawn task 0 ──► gate.acquire ──► work ──► sink.deposit ──► release
//!   ├─ spawn task 1 ──►      ...
//!   └─ spawn task N-1 ─►     ...
//!
//! Completion barrier:
//!   sink.fill(stop) ─┬─ Complete     → join tasks → Batch (complete)
//!                    └─ Interrupted  → publish CancelRequested / DeadlineExceeded
//!                                    → cancel run token, close gate
//!                                    → wait up to cfg.grace, abort stragglers
//!                                    → Batch (partial, with pending labels)
//! ```
//!
//! ## Rules
//! - Exactly `task_count` tasks are spawned per run.
//! - At most `cfg.max_concurrent` tasks hold a gate slot at any instant.
//! - Task failures and panics are captured per outcome (fail-soft).
//! - The caller's token is never cancelled by the runner; deadlines and
//!   signals cancel a child token.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use gatevisor::{Config, Runner, TaskError, TaskId};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let runner = Runner::new(Config::with_limit(3));
//!
//!     let batch = runner
//!         .run(6, |id: TaskId, _ctx: CancellationToken| async move {
//!             tokio::time::sleep(Duration::from_millis(10)).await;
//!             Ok::<_, TaskError>(id.index())
//!         })
//!         .await?;
//!
//!     assert_eq!(batch.len(), 6);
//!     assert!(batch.gate().peak <= 3);
//!     Ok(())
//! }
//! ```

use std::future::{Future, pending};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast::error::RecvError;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    config::Config,
    error::{RunError, TaskError},
    events::{Bus, Event, EventKind},
    gate::{AdmissionGate, Fill, ResultSink},
    subscribers::{Subscribe, SubscriberSet},
    tasks::{TaskFn, TaskId, TaskOutcome, TaskRef},
};

use super::{
    attempt::{Launch, run_admitted},
    batch::{Batch, Interrupt},
    builder::RunnerBuilder,
    shutdown,
};

/// Launches bounded batches and collects their outcomes.
pub struct Runner {
    cfg: Config,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl Runner {
    /// Creates a runner without subscribers.
    pub fn new(cfg: Config) -> Self {
        Self::new_internal(cfg, Vec::new())
    }

    /// Returns a builder for a runner with subscribers.
    pub fn builder(cfg: Config) -> RunnerBuilder {
        RunnerBuilder::new(cfg)
    }

    pub(crate) fn new_internal(cfg: Config, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        Self { cfg, subscribers }
    }

    /// Returns the runner configuration.
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Runs `work` once for every id in `[0, task_count)`.
    pub async fn run<T, F, Fut>(&self, task_count: usize, work: F) -> Result<Batch<T>, RunError>
    where
        T: Send + 'static,
        F: Fn(TaskId, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, TaskError>> + Send + 'static,
    {
        self.run_with_token(task_count, work, CancellationToken::new())
            .await
    }

    /// Same as [`run`](Self::run), stopping early when `token` is cancelled.
    ///
    /// On cancellation the returned batch is partial and
    /// [`Batch::interrupt`] is `Some(Interrupt::Canceled)`.
    pub async fn run_with_token<T, F, Fut>(
        &self,
        task_count: usize,
        work: F,
        token: CancellationToken,
    ) -> Result<Batch<T>, RunError>
    where
        T: Send + 'static,
        F: Fn(TaskId, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, TaskError>> + Send + 'static,
    {
        let task: TaskRef<T> = TaskFn::arc(work);
        self.run_task(task_count, task, token).await
    }

    /// Runs one shared task object for every id in `[0, task_count)`.
    pub async fn run_task<T: Send + 'static>(
        &self,
        task_count: usize,
        task: TaskRef<T>,
        token: CancellationToken,
    ) -> Result<Batch<T>, RunError> {
        let jobs = (0..task_count)
            .map(|i| (TaskId::new(i), Arc::clone(&task)))
            .collect();
        self.execute(jobs, token).await
    }

    /// Runs a heterogeneous list of tasks; task `i` gets id `i`.
    pub async fn run_tasks<T: Send + 'static>(
        &self,
        tasks: Vec<TaskRef<T>>,
        token: CancellationToken,
    ) -> Result<Batch<T>, RunError> {
        let jobs = tasks
            .into_iter()
            .enumerate()
            .map(|(i, task)| (TaskId::new(i), task))
            .collect();
        self.execute(jobs, token).await
    }

    async fn execute<T: Send + 'static>(
        &self,
        jobs: Vec<(TaskId, TaskRef<T>)>,
        token: CancellationToken,
    ) -> Result<Batch<T>, RunError> {
        let expected = jobs.len();
        if expected == 0 {
            return Err(RunError::InvalidTaskCount);
        }

        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let listener = self.subscriber_listener(&bus);
        let run_token = token.child_token();
        let signals = self
            .cfg
            .handle_signals
            .then(|| shutdown::cancel_on_signal(run_token.clone()));

        let limit = self.cfg.concurrency_limit();
        let gate = AdmissionGate::new(limit);
        let (sink_tx, mut sink) = ResultSink::new(expected);
        let launch = Launch {
            gate: Arc::clone(&gate),
            sink: sink_tx,
            bus: bus.clone(),
            token: run_token.clone(),
            timeout: self.cfg.task_timeout(),
        };

        let started = Instant::now();
        bus.publish(
            Event::new(EventKind::RunStarted)
                .with_limit(limit)
                .with_progress(0, expected),
        );
        debug!(total = expected, ?limit, "run started");

        let mut labels: Vec<Arc<str>> = Vec::with_capacity(expected);
        let mut set = JoinSet::new();
        for (id, task) in jobs {
            let label: Arc<str> = task.label(id).into();
            labels.push(Arc::clone(&label));
            set.spawn(run_admitted(launch.clone(), task, id, label));
        }
        drop(launch);

        let stop = stop_signal(run_token.clone(), started, self.cfg.deadline());
        let interrupt = match sink.fill(stop).await {
            Fill::Complete => {
                join_all(&mut set).await;
                None
            }
            Fill::Disconnected => {
                join_all(&mut set).await;
                run_token.is_cancelled().then_some(Interrupt::Canceled)
            }
            Fill::Interrupted(reason) => {
                self.publish_interrupt(&bus, reason, sink.len(), expected);
                run_token.cancel();
                gate.close();
                self.wait_all_with_grace(&mut set).await;
                Some(reason)
            }
        };
        gate.close();
        if let Some(handle) = signals {
            handle.abort();
        }

        let outcomes = sink.into_outcomes();
        let pending = pending_labels(&labels, &outcomes);
        let elapsed = started.elapsed();

        bus.publish(
            Event::new(EventKind::RunFinished)
                .with_progress(outcomes.len(), expected)
                .with_elapsed(elapsed),
        );
        info!(
            completed = outcomes.len(),
            total = expected,
            elapsed_ms = elapsed.as_millis() as u64,
            interrupted = interrupt.is_some(),
            "run finished"
        );
        finish_listener(listener).await;

        Ok(Batch {
            outcomes,
            expected,
            pending,
            gate: gate.stats(),
            elapsed,
            interrupt,
        })
    }

    /// Subscribes to the bus and forwards events to the subscriber set until `RunFinished`.
    ///
    /// Subscriber panics or overflows raised while the set drains its queues
    /// after `RunFinished` are only logged by the set itself.
    ///
    /// Returns `None` when there are no subscribers (no listener is spawned).
    fn subscriber_listener(&self, bus: &Bus) -> Option<JoinHandle<SubscriberSet>> {
        if self.subscribers.is_empty() {
            return None;
        }
        let mut rx = bus.subscribe();
        let set = SubscriberSet::new(self.subscribers.clone(), bus.clone());

        Some(tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(ev) => {
                        let last = ev.kind == EventKind::RunFinished;
                        set.emit(&ev);
                        if last {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "event listener lagged behind the bus");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            set
        }))
    }

    fn publish_interrupt(&self, bus: &Bus, reason: Interrupt, completed: usize, expected: usize) {
        match reason {
            Interrupt::Canceled => {
                info!(completed, total = expected, "run cancelled");
                bus.publish(
                    Event::new(EventKind::CancelRequested).with_progress(completed, expected),
                );
            }
            Interrupt::DeadlineExceeded { deadline } => {
                warn!(completed, total = expected, ?deadline, "run deadline exceeded");
                bus.publish(
                    Event::new(EventKind::DeadlineExceeded)
                        .with_progress(completed, expected)
                        .with_timeout(deadline),
                );
            }
        }
    }

    /// Waits for in-flight tasks to wind down within [`Config::grace`], then aborts the rest.
    async fn wait_all_with_grace(&self, set: &mut JoinSet<()>) {
        let grace = self.cfg.grace;
        if !grace.is_zero() {
            let done = async { while set.join_next().await.is_some() {} };
            if time::timeout(grace, done).await.is_ok() {
                return;
            }
            warn!(?grace, remaining = set.len(), "grace exceeded; aborting tasks");
        }
        set.abort_all();
        while set.join_next().await.is_some() {}
    }
}

/// Runs `work` once for every id in `[0, task_count)` with at most
/// `concurrency_limit` tasks in flight.
///
/// Shorthand for `Runner::new(Config::with_limit(concurrency_limit)).run(..)`
/// that rejects a zero limit instead of treating it as unlimited.
///
/// ```rust
/// use tokio_util::sync::CancellationToken;
/// use gatevisor::{TaskError, TaskId};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let batch = gatevisor::run(4, 2, |id: TaskId, _ctx: CancellationToken| async move {
///     Ok::<_, TaskError>(id.index() * 2)
/// })
/// .await
/// .unwrap();
///
/// let mut values: Vec<usize> = batch.successes().copied().collect();
/// values.sort_unstable();
/// assert_eq!(values, vec![0, 2, 4, 6]);
/// # }
/// ```
pub async fn run<T, F, Fut>(
    task_count: usize,
    concurrency_limit: usize,
    work: F,
) -> Result<Batch<T>, RunError>
where
    T: Send + 'static,
    F: Fn(TaskId, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, TaskError>> + Send + 'static,
{
    if concurrency_limit == 0 {
        return Err(RunError::InvalidConcurrency);
    }
    Runner::new(Config::with_limit(concurrency_limit))
        .run(task_count, work)
        .await
}

/// Resolves when the run token is cancelled or the deadline elapses.
async fn stop_signal(
    token: CancellationToken,
    started: Instant,
    deadline: Option<Duration>,
) -> Interrupt {
    let deadline_hit = async {
        match deadline {
            Some(d) => {
                time::sleep_until(started + d).await;
                d
            }
            None => pending().await,
        }
    };
    tokio::select! {
        _ = token.cancelled() => Interrupt::Canceled,
        deadline = deadline_hit => Interrupt::DeadlineExceeded { deadline },
    }
}

async fn join_all(set: &mut JoinSet<()>) {
    while let Some(res) = set.join_next().await {
        if let Err(e) = res {
            warn!(error = %e, "task join failed");
        }
    }
}

async fn finish_listener(listener: Option<JoinHandle<SubscriberSet>>) {
    let Some(handle) = listener else { return };
    match handle.await {
        Ok(set) => set.shutdown().await,
        Err(e) => warn!(error = %e, "event listener failed"),
    }
}

fn pending_labels<T>(labels: &[Arc<str>], outcomes: &[TaskOutcome<T>]) -> Vec<String> {
    let mut reported = vec![false; labels.len()];
    for o in outcomes {
        if let Some(seen) = reported.get_mut(o.id.index()) {
            *seen = true;
        }
    }
    labels
        .iter()
        .zip(reported)
        .filter(|(_, seen)| !seen)
        .map(|(label, _)| label.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const T: Duration = Duration::from_secs(3);

    fn sleeper(
        interval: Duration,
    ) -> impl Fn(TaskId, CancellationToken) -> futures::future::BoxFuture<'static, Result<usize, TaskError>>
    + Send
    + Sync
    + 'static {
        move |id: TaskId, _ctx: CancellationToken| {
            Box::pin(async move {
                time::sleep(interval).await;
                Ok(id.index())
            })
        }
    }

    fn cooperative(
        interval: Duration,
    ) -> impl Fn(TaskId, CancellationToken) -> futures::future::BoxFuture<'static, Result<usize, TaskError>>
    + Send
    + Sync
    + 'static {
        move |id: TaskId, ctx: CancellationToken| {
            Box::pin(async move {
                tokio::select! {
                    _ = time::sleep(interval) => Ok(id.index()),
                    _ = ctx.cancelled() => Err(TaskError::Canceled),
                }
            })
        }
    }

    fn sorted_values(batch: &Batch<usize>) -> Vec<usize> {
        let mut values: Vec<usize> = batch.successes().copied().collect();
        values.sort_unstable();
        values
    }

    #[tokio::test(start_paused = true)]
    async fn test_six_tasks_limit_three_take_two_rounds() {
        let batch = run(6, 3, sleeper(T)).await.expect("run");

        assert!(batch.is_complete());
        assert_eq!(batch.len(), 6);
        assert_eq!(sorted_values(&batch), vec![0, 1, 2, 3, 4, 5]);
        assert!(batch.elapsed() >= 2 * T, "elapsed {:?}", batch.elapsed());
        assert!(batch.elapsed() < 2 * T + Duration::from_millis(100));

        let gate = batch.gate();
        assert_eq!(gate.capacity, Some(3));
        assert_eq!(gate.peak, 3);
        assert_eq!(gate.admitted, 6);
        assert_eq!(gate.in_flight, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_limit_at_or_above_count_is_unlimited() {
        let batch = run(4, 10, sleeper(T)).await.expect("run");

        assert_eq!(batch.len(), 4);
        assert_eq!(batch.gate().peak, 4);
        assert!(batch.elapsed() < T + Duration::from_millis(100));

        let unlimited = Runner::new(Config::default())
            .run(4, sleeper(T))
            .await
            .expect("run");
        assert_eq!(unlimited.gate().capacity, None);
        assert_eq!(unlimited.gate().peak, 4);
        assert!(unlimited.elapsed() < T + Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_task_single_slot() {
        let batch = run(1, 1, sleeper(T)).await.expect("run");
        assert!(batch.is_complete());
        assert_eq!(sorted_values(&batch), vec![0]);
        assert_eq!(batch.outcomes()[0].label.as_ref(), "no0");
    }

    #[tokio::test(start_paused = true)]
    async fn test_heterogeneous_durations_never_exceed_limit() {
        let current = Arc::new(AtomicUsize::new(0));
        let observed = Arc::new(AtomicUsize::new(0));

        let work = {
            let current = Arc::clone(&current);
            let observed = Arc::clone(&observed);
            move |id: TaskId, _ctx: CancellationToken| {
                let current = Arc::clone(&current);
                let observed = Arc::clone(&observed);
                async move {
                    let now = current.fetch_add(1, Ordering::SeqCst) + 1;
                    observed.fetch_max(now, Ordering::SeqCst);
                    let ms = 100 * (id.index() as u64 % 5 + 1);
                    time::sleep(Duration::from_millis(ms)).await;
                    current.fetch_sub(1, Ordering::SeqCst);
                    Ok::<_, TaskError>(id.index())
                }
            }
        };

        let batch = run(20, 4, work).await.expect("run");
        assert_eq!(batch.len(), 20);
        assert!(observed.load(Ordering::SeqCst) <= 4);
        assert!(batch.gate().peak <= 4);
        assert_eq!(batch.gate().admitted, 20);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_is_captured_not_fatal() {
        let batch = run(6, 3, |id: TaskId, _ctx: CancellationToken| async move {
            time::sleep(Duration::from_millis(50)).await;
            if id.index() == 3 {
                return Err(TaskError::fail("disk full"));
            }
            Ok(id.index())
        })
        .await
        .expect("run");

        assert!(batch.is_complete());
        assert_eq!(batch.successes().count(), 5);

        let failures = batch.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].id, TaskId::new(3));
        assert_eq!(failures[0].cause, TaskError::fail("disk full"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_task_does_not_hang() {
        let batch = run(4, 2, |id: TaskId, _ctx: CancellationToken| async move {
            if id.index() == 2 {
                panic!("task two exploded");
            }
            Ok::<_, TaskError>(id.index())
        })
        .await
        .expect("run");

        assert!(batch.is_complete());
        let failures = batch.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(
            failures[0].cause,
            TaskError::Panicked {
                info: "task two exploded".into()
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_batch_twice_same_multiset() {
        let runner = Runner::new(Config::with_limit(2));
        let first = runner.run(5, sleeper(T)).await.expect("first");
        let second = runner.run(5, sleeper(T)).await.expect("second");
        assert_eq!(sorted_values(&first), sorted_values(&second));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_returns_partial_batch() {
        let token = CancellationToken::new();
        {
            let token = token.clone();
            tokio::spawn(async move {
                time::sleep(Duration::from_millis(1500)).await;
                token.cancel();
            });
        }

        let runner = Runner::new(Config::with_limit(3));
        let batch = runner
            .run_with_token(6, cooperative(Duration::from_secs(1)), token)
            .await
            .expect("run");

        assert_eq!(batch.interrupt(), Some(Interrupt::Canceled));
        assert!(!batch.is_complete());
        assert_eq!(sorted_values(&batch), vec![0, 1, 2]);
        let canceled = batch
            .failures()
            .into_iter()
            .filter(|f| f.cause == TaskError::Canceled)
            .count();
        assert_eq!(canceled, 3);
        assert!(batch.pending().is_empty());
        assert_eq!(batch.gate().in_flight, 0);

        assert_eq!(
            batch.ensure_complete().unwrap_err(),
            RunError::Canceled {
                completed: 6,
                expected: 6
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_before_start_launches_nothing() {
        let token = CancellationToken::new();
        token.cancel();

        let batch = Runner::new(Config::with_limit(2))
            .run_with_token(3, sleeper(T), token)
            .await
            .expect("run");

        assert_eq!(batch.interrupt(), Some(Interrupt::Canceled));
        assert!(batch.is_empty());
        assert_eq!(batch.pending(), ["no0", "no1", "no2"]);
        assert_eq!(batch.gate().admitted, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_aborts_stragglers() {
        let mut cfg = Config::with_limit(3);
        cfg.deadline = Duration::from_millis(1500);
        cfg.grace = Duration::ZERO;

        let batch = Runner::new(cfg)
            .run(6, sleeper(Duration::from_secs(1)))
            .await
            .expect("run");

        assert_eq!(
            batch.interrupt(),
            Some(Interrupt::DeadlineExceeded {
                deadline: Duration::from_millis(1500)
            })
        );
        assert_eq!(sorted_values(&batch), vec![0, 1, 2]);
        assert_eq!(batch.pending(), ["no3", "no4", "no5"]);
        assert_eq!(batch.gate().in_flight, 0);

        match batch.ensure_complete() {
            Err(RunError::DeadlineExceeded {
                completed,
                expected,
                pending,
                ..
            }) => {
                assert_eq!((completed, expected), (3, 6));
                assert_eq!(pending, vec!["no3", "no4", "no5"]);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_task_timeout_only_hits_slow_task() {
        let mut cfg = Config::with_limit(2);
        cfg.task_timeout = Duration::from_secs(1);

        let batch = Runner::new(cfg)
            .run(3, |id: TaskId, _ctx: CancellationToken| async move {
                let secs = if id.index() == 0 { 10 } else { 0 };
                time::sleep(Duration::from_secs(secs)).await;
                Ok::<_, TaskError>(id.index())
            })
            .await
            .expect("run");

        assert!(batch.is_complete());
        assert_eq!(sorted_values(&batch), vec![1, 2]);
        let failures = batch.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].id, TaskId::new(0));
        assert_eq!(
            failures[0].cause,
            TaskError::Timeout {
                timeout: Duration::from_secs(1)
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_tasks_keeps_labels() {
        let fetch: TaskRef<String> =
            TaskFn::arc(|_id: TaskId, _ctx: CancellationToken| async move {
                Ok::<_, TaskError>("fetched".to_string())
            });
        let parse: TaskRef<String> = Arc::new(TaskFn::named(
            "parse",
            |_id: TaskId, _ctx: CancellationToken| async move {
                Ok::<_, TaskError>("parsed".to_string())
            },
        ));

        let batch = Runner::new(Config::with_limit(1))
            .run_tasks(vec![fetch, parse], CancellationToken::new())
            .await
            .expect("run");

        let sorted = batch.into_sorted();
        assert_eq!(sorted[0].label.as_ref(), "no0");
        assert_eq!(sorted[1].label.as_ref(), "parse-1");
        assert_eq!(sorted[1].result.as_deref(), Ok("parsed"));
    }

    #[tokio::test]
    async fn test_invalid_arguments_rejected() {
        let err = run(0, 3, sleeper(T)).await.unwrap_err();
        assert_eq!(err, RunError::InvalidTaskCount);

        let err = run(3, 0, sleeper(T)).await.unwrap_err();
        assert_eq!(err, RunError::InvalidConcurrency);

        let err = Runner::new(Config::default())
            .run_tasks(Vec::<TaskRef<usize>>::new(), CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err, RunError::InvalidTaskCount);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sync_panic_in_work_is_captured() {
        let batch = run(6, 3, |id: TaskId, _ctx: CancellationToken| {
            if id.index() == 3 {
                panic!("sync boom");
            }
            async move { Ok::<_, TaskError>(id.index()) }
        })
        .await
        .expect("run");

        assert!(batch.is_complete());
        assert_eq!(batch.len(), 6);
        assert!(batch.pending().is_empty());
        let failures = batch.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].id, TaskId::new(3));
        assert_eq!(
            failures[0].cause,
            TaskError::Panicked {
                info: "sync boom".into()
            }
        );
        assert!(batch.ensure_complete().is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_grace_expiry_aborts_stubborn_tasks() {
        let mut cfg = Config::default();
        cfg.grace = Duration::from_secs(1);

        let token = CancellationToken::new();
        {
            let token = token.clone();
            tokio::spawn(async move {
                time::sleep(Duration::from_millis(500)).await;
                token.cancel();
            });
        }

        let batch = Runner::new(cfg)
            .run_with_token(4, sleeper(Duration::from_secs(10)), token)
            .await
            .expect("run");

        assert_eq!(batch.interrupt(), Some(Interrupt::Canceled));
        assert_eq!(batch.elapsed(), Duration::from_millis(1500));
        assert!(batch.is_empty());
        assert_eq!(batch.pending(), ["no0", "no1", "no2", "no3"]);
        assert_eq!(batch.gate().in_flight, 0);
        assert_eq!(batch.gate().admitted, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_signal_watcher_does_not_disturb_a_clean_run() {
        let mut cfg = Config::with_limit(2);
        cfg.handle_signals = true;

        let batch = Runner::new(cfg)
            .run(4, sleeper(Duration::from_millis(100)))
            .await
            .expect("run");

        assert!(batch.is_complete());
        assert_eq!(batch.interrupt(), None);
        assert_eq!(sorted_values(&batch), vec![0, 1, 2, 3]);
    }

    struct Recorder {
        kinds: Mutex<Vec<EventKind>>,
    }

    #[async_trait]
    impl Subscribe for Recorder {
        async fn on_event(&self, ev: &Event) {
            self.kinds.lock().unwrap().push(ev.kind);
        }

        fn name(&self) -> &'static str {
            "recorder"
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscriber_sees_full_lifecycle() {
        let recorder = Arc::new(Recorder {
            kinds: Mutex::new(Vec::new()),
        });
        let runner = Runner::builder(Config::with_limit(2))
            .with_subscriber(recorder.clone())
            .build();

        let batch = runner
            .run(4, |id: TaskId, _ctx: CancellationToken| async move {
                if id.index() == 1 {
                    return Err(TaskError::fail("nope"));
                }
                Ok(id.index())
            })
            .await
            .expect("run");
        assert!(batch.is_complete());

        let kinds = recorder.kinds.lock().unwrap().clone();
        let count = |k: EventKind| kinds.iter().filter(|x| **x == k).count();
        assert_eq!(kinds.first(), Some(&EventKind::RunStarted));
        assert_eq!(kinds.last(), Some(&EventKind::RunFinished));
        assert_eq!(count(EventKind::TaskAdmitted), 4);
        assert_eq!(count(EventKind::TaskCompleted), 3);
        assert_eq!(count(EventKind::TaskFailed), 1);
    }
}
