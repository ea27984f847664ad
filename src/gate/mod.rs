//! Per-run coordination primitives.
//!
//! - [`AdmissionGate`]: counting gate of fixed capacity; a task holds its
//!   [`GatePermit`] for the full duration of its work.
//! - [`ResultSink`]: bounded buffer collecting one [`TaskOutcome`](crate::TaskOutcome)
//!   per task; the runner waits on it as a completion barrier.
//!
//! Both are created once per run and closed after the runner stops waiting.

mod admission;
mod sink;

pub use admission::{AdmissionGate, GatePermit, GateStats};
pub use sink::{Fill, ResultSink, SinkSender};
