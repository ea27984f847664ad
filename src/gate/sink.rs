//! # Result sink and completion barrier
//!
//! [`ResultSink`] owns a bounded `mpsc` channel sized to the batch. Each task
//! deposits exactly one [`TaskOutcome`] through its [`SinkSender`]; the runner
//! awaits [`ResultSink::fill`], which returns once every expected outcome
//! arrived, the stop future fires, or every sender is gone.
//!
//! ```text
//! task 0 ─┐
//! task 1 ─┼─ deposit(outcome) ──► [mpsc, cap = N] ──► fill() ──► outcomes (completion order)
//! task N ─┘
//! ```

use std::future::Future;

use tokio::select;
use tokio::sync::mpsc;

use crate::tasks::TaskOutcome;

/// How a [`ResultSink::fill`] call ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fill<R> {
    /// All expected outcomes arrived.
    Complete,
    /// The stop future resolved first.
    Interrupted(R),
    /// Every sender was dropped before the batch was complete.
    Disconnected,
}

/// Write side handed to each task.
#[derive(Debug)]
pub struct SinkSender<T> {
    tx: mpsc::Sender<TaskOutcome<T>>,
}

impl<T> Clone for SinkSender<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<T> SinkSender<T> {
    /// Deposits one outcome without waiting.
    ///
    /// Returns `false` if the sink is gone (the runner stopped waiting) or the
    /// sink is over-filled; both mean the outcome was discarded.
    pub fn deposit(&self, outcome: TaskOutcome<T>) -> bool {
        self.tx.try_send(outcome).is_ok()
    }
}

/// Bounded buffer collecting one outcome per task.
#[derive(Debug)]
pub struct ResultSink<T> {
    rx: mpsc::Receiver<TaskOutcome<T>>,
    expected: usize,
    outcomes: Vec<TaskOutcome<T>>,
}

impl<T> ResultSink<T> {
    /// Creates a sink for `expected` outcomes (channel capacity `expected`, min 1)
    /// together with the sender to clone into each producer.
    pub fn new(expected: usize) -> (SinkSender<T>, Self) {
        let (tx, rx) = mpsc::channel(expected.max(1));
        let sink = Self {
            rx,
            expected,
            outcomes: Vec::with_capacity(expected),
        };
        (SinkSender { tx }, sink)
    }

    /// Number of outcomes the sink waits for.
    #[inline]
    pub fn expected(&self) -> usize {
        self.expected
    }

    /// Number of outcomes collected so far.
    #[inline]
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    /// True if nothing was collected yet.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// True once every expected outcome arrived.
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.outcomes.len() >= self.expected
    }

    /// Waits until the batch is complete, `stop` resolves, or all senders are dropped.
    ///
    /// Deposited outcomes win over `stop`: a batch whose last outcome is
    /// ready when `stop` fires still ends as [`Fill::Complete`].
    pub async fn fill<F, R>(&mut self, stop: F) -> Fill<R>
    where
        F: Future<Output = R>,
    {
        tokio::pin!(stop);

        while !self.is_complete() {
            select! {
                biased;

                received = self.rx.recv() => match received {
                    Some(outcome) => self.outcomes.push(outcome),
                    None => return Fill::Disconnected,
                },
                reason = &mut stop => return Fill::Interrupted(reason),
            }
        }
        Fill::Complete
    }

    /// Collects outcomes already deposited, without waiting.
    pub fn drain_ready(&mut self) {
        while let Ok(outcome) = self.rx.try_recv() {
            self.outcomes.push(outcome);
        }
    }

    /// Closes the channel and returns the outcomes in completion order.
    pub fn into_outcomes(mut self) -> Vec<TaskOutcome<T>> {
        self.rx.close();
        self.drain_ready();
        self.outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::TaskId;
    use std::future::pending;
    use std::time::Duration;

    fn outcome(id: usize) -> TaskOutcome<usize> {
        TaskOutcome {
            id: TaskId::new(id),
            label: TaskId::new(id).label().into(),
            result: Ok(id),
            elapsed: Duration::ZERO,
        }
    }

    #[tokio::test]
    async fn test_fill_completes_in_arrival_order() {
        let (tx, mut sink) = ResultSink::new(3);
        let senders: Vec<_> = (0..3).map(|_| tx.clone()).collect();
        drop(tx);

        for (tx, id) in senders.iter().zip([2, 0, 1]) {
            assert!(tx.deposit(outcome(id)));
        }
        assert_eq!(sink.fill(pending::<()>()).await, Fill::Complete);

        let ids: Vec<usize> = sink.into_outcomes().iter().map(|o| o.id.index()).collect();
        assert_eq!(ids, vec![2, 0, 1]);
    }

    #[tokio::test]
    async fn test_fill_reports_disconnect() {
        let (tx, mut sink) = ResultSink::<usize>::new(2);
        assert!(tx.deposit(outcome(0)));
        drop(tx);

        assert_eq!(sink.fill(pending::<()>()).await, Fill::Disconnected);
        assert_eq!(sink.len(), 1);
    }

    #[tokio::test]
    async fn test_ready_outcomes_win_over_stop() {
        let (tx, mut sink) = ResultSink::<usize>::new(2);
        assert!(tx.deposit(outcome(0)));
        assert!(tx.deposit(outcome(1)));

        assert_eq!(sink.fill(async { "stop" }).await, Fill::Complete);
        assert_eq!(sink.len(), 2);
    }

    #[tokio::test]
    async fn test_fill_interrupted_then_drained() {
        let (tx, mut sink) = ResultSink::<usize>::new(3);
        assert!(tx.deposit(outcome(0)));

        let res = sink.fill(async { "stop" }).await;
        assert_eq!(res, Fill::Interrupted("stop"));

        assert!(tx.deposit(outcome(1)));
        sink.drain_ready();
        assert_eq!(sink.len(), 2);
        assert!(!sink.is_complete());
    }
}
