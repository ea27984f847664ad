//! # Admission gate
//!
//! The gate bounds how many tasks do their work at the same time. A task
//! acquires a slot before its work and keeps it, as a [`GatePermit`], until the
//! work is over and its outcome is deposited. Dropping the permit frees the slot
//! for the next waiter.
//!
//! ## Invariants
//! - `in_flight <= capacity` at every instant (for a bounded gate).
//! - `peak` is the high-water mark of `in_flight` over the gate's lifetime.
//! - Waiting for a slot is cancellable; a closed gate admits nobody.
//!
//! ```text
//! acquire() ──► [semaphore permit] ──► in_flight += 1 ──► peak = max(peak, in_flight)
//!                                                     ...work...
//! drop(GatePermit) ──► in_flight -= 1 ──► semaphore permit released
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use tokio::select;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;

/// Point-in-time view of the gate counters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GateStats {
    /// Configured capacity (`None` = unlimited).
    pub capacity: Option<usize>,
    /// Tasks currently holding a slot.
    pub in_flight: usize,
    /// Highest number of tasks that held a slot at once.
    pub peak: usize,
    /// Total number of admissions.
    pub admitted: usize,
}

/// Counting gate of fixed capacity with occupancy instrumentation.
#[derive(Debug)]
pub struct AdmissionGate {
    semaphore: Option<Arc<Semaphore>>,
    capacity: Option<usize>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    admitted: AtomicUsize,
    closed_unlimited: AtomicBool,
}

impl AdmissionGate {
    /// Creates a gate; `None` builds an unlimited gate that only counts.
    pub fn new(capacity: Option<usize>) -> Arc<Self> {
        Arc::new(Self {
            semaphore: capacity.map(|n| Arc::new(Semaphore::new(n))),
            capacity,
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            admitted: AtomicUsize::new(0),
            closed_unlimited: AtomicBool::new(false),
        })
    }

    /// Waits for a free slot.
    ///
    /// Returns `None` when `token` is cancelled before a slot frees up, or
    /// when the gate has been closed.
    pub async fn acquire(self: &Arc<Self>, token: &CancellationToken) -> Option<GatePermit> {
        if token.is_cancelled() {
            return None;
        }
        let permit = match &self.semaphore {
            Some(sem) => {
                let permit_future = Arc::clone(sem).acquire_owned();
                tokio::pin!(permit_future);

                select! {
                    res = &mut permit_future => match res {
                        Ok(permit) => Some(permit),
                        Err(_closed) => return None,
                    },
                    _ = token.cancelled() => return None,
                }
            }
            None if self.is_closed() => return None,
            None => None,
        };

        let in_flight = self.in_flight.fetch_add(1, Ordering::AcqRel) + 1;
        self.peak.fetch_max(in_flight, Ordering::AcqRel);
        self.admitted.fetch_add(1, Ordering::Relaxed);

        Some(GatePermit {
            gate: Arc::clone(self),
            in_flight,
            _permit: permit,
        })
    }

    /// Closes the gate: pending and future `acquire` calls return `None`.
    ///
    /// Permits already handed out stay valid until dropped.
    pub fn close(&self) {
        if let Some(sem) = &self.semaphore {
            sem.close();
        }
        self.closed_unlimited.store(true, Ordering::Release);
    }

    /// True once [`close`](Self::close) was called.
    pub fn is_closed(&self) -> bool {
        match &self.semaphore {
            Some(sem) => sem.is_closed(),
            None => self.closed_unlimited.load(Ordering::Acquire),
        }
    }

    /// Configured capacity (`None` = unlimited).
    #[inline]
    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Tasks currently holding a slot.
    #[inline]
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Snapshot of all counters.
    pub fn stats(&self) -> GateStats {
        GateStats {
            capacity: self.capacity,
            in_flight: self.in_flight(),
            peak: self.peak.load(Ordering::Acquire),
            admitted: self.admitted.load(Ordering::Relaxed),
        }
    }
}

/// A held gate slot. Dropping it releases the slot.
#[derive(Debug)]
#[must_use = "dropping the permit releases the slot immediately"]
pub struct GatePermit {
    gate: Arc<AdmissionGate>,
    in_flight: usize,
    _permit: Option<OwnedSemaphorePermit>,
}

impl GatePermit {
    /// Gate occupancy right after this permit was granted (including itself).
    #[inline]
    pub fn in_flight_at_admission(&self) -> usize {
        self.in_flight
    }
}

impl Drop for GatePermit {
    fn drop(&mut self) {
        // Counter goes down before the semaphore permit (dropped after this body),
        // so `in_flight` never exceeds the number of permits handed out.
        self.gate.in_flight.fetch_sub(1, Ordering::AcqRel);
    }
}
