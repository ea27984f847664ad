//! # Batch: aggregated result of one run.
//!
//! Outcomes are kept in **completion order**. A batch is either complete
//! (`interrupt() == None`, one outcome per task) or partial, in which case it
//! names the [`Interrupt`] and the labels of the tasks that never reported.

use std::time::Duration;

use crate::{
    error::{RunError, TaskFailure},
    gate::GateStats,
    tasks::TaskOutcome,
};

/// Why a run stopped waiting before every task reported.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Interrupt {
    /// The run token was cancelled (explicitly or by an OS signal).
    Canceled,
    /// The configured run deadline elapsed.
    DeadlineExceeded {
        /// The configured deadline.
        deadline: Duration,
    },
}

/// Aggregated outcomes of one run.
#[derive(Debug)]
pub struct Batch<T> {
    pub(crate) outcomes: Vec<TaskOutcome<T>>,
    pub(crate) expected: usize,
    pub(crate) pending: Vec<String>,
    pub(crate) gate: GateStats,
    pub(crate) elapsed: Duration,
    pub(crate) interrupt: Option<Interrupt>,
}

impl<T> Batch<T> {
    /// Outcomes in completion order.
    pub fn outcomes(&self) -> &[TaskOutcome<T>] {
        &self.outcomes
    }

    /// Consumes the batch, returning outcomes in completion order.
    pub fn into_outcomes(self) -> Vec<TaskOutcome<T>> {
        self.outcomes
    }

    /// Number of outcomes collected.
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    /// True if no outcome was collected.
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Number of tasks launched.
    pub fn expected(&self) -> usize {
        self.expected
    }

    /// True when every launched task reported and nothing interrupted the run.
    pub fn is_complete(&self) -> bool {
        self.interrupt.is_none() && self.outcomes.len() == self.expected
    }

    /// Why the run stopped early, if it did.
    pub fn interrupt(&self) -> Option<Interrupt> {
        self.interrupt
    }

    /// Labels of tasks that never deposited an outcome (sorted by id).
    pub fn pending(&self) -> &[String] {
        &self.pending
    }

    /// Gate counters observed after the run.
    pub fn gate(&self) -> GateStats {
        self.gate
    }

    /// Wall-clock time of the run.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Iterates over values produced by successful tasks.
    pub fn successes(&self) -> impl Iterator<Item = &T> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().ok())
    }

    /// Collects the failures, tagged with their task ids.
    pub fn failures(&self) -> Vec<TaskFailure> {
        self.outcomes
            .iter()
            .filter_map(|o| {
                o.result.as_ref().err().map(|cause| TaskFailure {
                    id: o.id,
                    cause: cause.clone(),
                })
            })
            .collect()
    }

    /// Outcomes reordered by task id (launch order).
    pub fn into_sorted(mut self) -> Vec<TaskOutcome<T>> {
        self.outcomes.sort_by_key(|o| o.id);
        self.outcomes
    }

    /// Returns the batch if complete, or the matching [`RunError`] otherwise.
    pub fn ensure_complete(self) -> Result<Self, RunError> {
        let completed = self.outcomes.len();
        let expected = self.expected;
        match self.interrupt {
            None if completed == expected => Ok(self),
            None => Err(RunError::Incomplete {
                completed,
                expected,
                pending: self.pending,
            }),
            Some(Interrupt::Canceled) => Err(RunError::Canceled {
                completed,
                expected,
            }),
            Some(Interrupt::DeadlineExceeded { deadline }) => Err(RunError::DeadlineExceeded {
                deadline,
                completed,
                expected,
                pending: self.pending,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TaskError;
    use crate::tasks::TaskId;

    fn outcome(id: usize, result: Result<usize, TaskError>) -> TaskOutcome<usize> {
        TaskOutcome {
            id: TaskId::new(id),
            label: TaskId::new(id).label().into(),
            result,
            elapsed: Duration::ZERO,
        }
    }

    fn batch(outcomes: Vec<TaskOutcome<usize>>, expected: usize) -> Batch<usize> {
        Batch {
            outcomes,
            expected,
            pending: Vec::new(),
            gate: GateStats {
                capacity: Some(2),
                in_flight: 0,
                peak: 2,
                admitted: expected,
            },
            elapsed: Duration::ZERO,
            interrupt: None,
        }
    }

    #[test]
    fn test_successes_and_failures_split() {
        let b = batch(
            vec![
                outcome(1, Ok(10)),
                outcome(0, Err(TaskError::fail("boom"))),
                outcome(2, Ok(20)),
            ],
            3,
        );
        assert!(b.is_complete());
        assert_eq!(b.successes().copied().collect::<Vec<_>>(), vec![10, 20]);

        let failures = b.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].id, TaskId::new(0));

        let ids: Vec<usize> = b.into_sorted().iter().map(|o| o.id.index()).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn test_deadline_surfaces_pending() {
        let mut b = batch(vec![outcome(0, Ok(0))], 3);
        b.pending = vec!["no1".into(), "no2".into()];
        b.interrupt = Some(Interrupt::DeadlineExceeded {
            deadline: Duration::from_secs(2),
        });

        assert!(!b.is_complete());
        let err = b.ensure_complete().unwrap_err();
        assert_eq!(
            err,
            RunError::DeadlineExceeded {
                deadline: Duration::from_secs(2),
                completed: 1,
                expected: 3,
                pending: vec!["no1".into(), "no2".into()],
            }
        );
    }

    #[test]
    fn test_missing_outcomes_without_interrupt_are_incomplete() {
        let mut b = batch(vec![outcome(0, Ok(0))], 2);
        b.pending = vec!["no1".into()];
        assert_eq!(
            b.ensure_complete().unwrap_err(),
            RunError::Incomplete {
                completed: 1,
                expected: 2,
                pending: vec!["no1".into()],
            }
        );
    }

    #[test]
    fn test_cancel_maps_to_canceled() {
        let mut b = batch(vec![outcome(0, Ok(0))], 2);
        b.interrupt = Some(Interrupt::Canceled);
        assert_eq!(
            b.ensure_complete().unwrap_err(),
            RunError::Canceled {
                completed: 1,
                expected: 2
            }
        );
    }
}
