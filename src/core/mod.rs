//! Runtime core: batch orchestration and lifecycle.
//!
//! The public API from this module is [`Runner`] (plus the [`run`] shorthand),
//! which launches a batch, throttles it through the admission gate and waits
//! for every outcome.
//!
//! Internal modules:
//! - [`attempt`]: runs one admitted task with timeout, panic capture and event publishing;
//! - [`runner`]: spawns the batch, waits on the result sink, handles interruption;
//! - [`batch`]: aggregated result of one run;
//! - [`shutdown`]: cross-platform shutdown signal handling.

mod attempt;
mod batch;
mod builder;
mod runner;
mod shutdown;

pub use batch::{Batch, Interrupt};
pub use builder::RunnerBuilder;
pub use runner::{Runner, run};
pub use shutdown::wait_for_shutdown_signal;
