//! # Runner configuration.
//!
//! Provides [`Config`], the centralized settings for a [`Runner`](crate::Runner).
//!
//! ## Sentinel values
//! - `max_concurrent = 0` → unlimited (gate admits every task immediately)
//! - `task_timeout = 0s` → no per-task timeout
//! - `deadline = 0s` → no global run deadline
//! - `grace = 0s` → abort in-flight tasks immediately on interruption

use std::time::Duration;

/// Configuration for a bounded run.
///
/// ## Field semantics
/// - `max_concurrent`: admission gate capacity (`0` = unlimited)
/// - `task_timeout`: per-task timeout (`0s` = none)
/// - `deadline`: whole-run deadline (`0s` = none)
/// - `grace`: how long in-flight tasks may take to wind down after an interruption
/// - `bus_capacity`: event bus ring buffer size (min 1; clamped by Bus)
/// - `handle_signals`: cancel the run on SIGINT/SIGTERM/SIGQUIT (Ctrl-C elsewhere)
///
/// ## Notes
/// All fields are public. Prefer the helper accessors over sprinkling
/// sentinel checks (`0`) across the codebase.
#[derive(Clone, Debug)]
pub struct Config {
    /// Maximum number of tasks holding a gate slot at once.
    ///
    /// - `0` = unlimited
    /// - `n > 0` = at most `n` tasks do their work simultaneously
    pub max_concurrent: usize,

    /// Timeout applied to each task's work.
    ///
    /// On expiry the task's child token is cancelled and its outcome
    /// becomes `TaskError::Timeout`. The slot is released.
    pub task_timeout: Duration,

    /// Deadline for the whole run, measured from the first launch.
    ///
    /// On expiry all remaining work is cancelled and the runner returns the
    /// partial batch marked with `Interrupt::DeadlineExceeded`.
    pub deadline: Duration,

    /// Maximum wait for in-flight tasks after cancellation or deadline.
    ///
    /// Tasks observe their cancelled token and may still deposit an outcome
    /// (usually `TaskError::Canceled`) within this window; anything still
    /// running afterwards is aborted and reported as pending.
    pub grace: Duration,

    /// Capacity of the event bus broadcast channel ring buffer.
    pub bus_capacity: usize,

    /// Whether OS termination signals cancel the run.
    pub handle_signals: bool,
}

impl Config {
    /// Returns a config with the given concurrency limit and defaults elsewhere.
    pub fn with_limit(max_concurrent: usize) -> Self {
        Self {
            max_concurrent,
            ..Self::default()
        }
    }

    /// Returns the concurrency limit as an `Option`.
    ///
    /// - `None` → unlimited
    /// - `Some(n)` → at most `n` tasks in flight
    #[inline]
    pub fn concurrency_limit(&self) -> Option<usize> {
        if self.max_concurrent == 0 {
            None
        } else {
            Some(self.max_concurrent)
        }
    }

    /// Returns the per-task timeout as an `Option`.
    #[inline]
    pub fn task_timeout(&self) -> Option<Duration> {
        if self.task_timeout == Duration::ZERO {
            None
        } else {
            Some(self.task_timeout)
        }
    }

    /// Returns the run deadline as an `Option`.
    #[inline]
    pub fn deadline(&self) -> Option<Duration> {
        if self.deadline == Duration::ZERO {
            None
        } else {
            Some(self.deadline)
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `max_concurrent = 0` (unlimited)
    /// - `task_timeout = 0s` (no timeout)
    /// - `deadline = 0s` (no deadline)
    /// - `grace = 5s`
    /// - `bus_capacity = 1024`
    /// - `handle_signals = false`
    fn default() -> Self {
        Self {
            max_concurrent: 0,
            task_timeout: Duration::ZERO,
            deadline: Duration::ZERO,
            grace: Duration::from_secs(5),
            bus_capacity: 1024,
            handle_signals: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_sentinels_map_to_none() {
        let cfg = Config::default();
        assert_eq!(cfg.concurrency_limit(), None);
        assert_eq!(cfg.task_timeout(), None);
        assert_eq!(cfg.deadline(), None);
    }

    #[test]
    fn test_limit_and_clamp() {
        let mut cfg = Config::with_limit(3);
        cfg.bus_capacity = 0;
        assert_eq!(cfg.concurrency_limit(), Some(3));
        assert_eq!(cfg.bus_capacity_clamped(), 1);
    }
}
