//! # Example: bounded_batch
//!
//! Launches 6 tasks behind a gate of capacity 3. Every task sleeps the same
//! interval, so the batch finishes in two rounds (about 2 × interval).
//!
//! Shows how to:
//! - Install a `tracing` subscriber and attach the built-in [`LogWriter`].
//! - Run a batch with [`Runner::run`] and read the gate counters.
//!
//! ## Flow
//! ```text
//! main()
//!   └─► Runner::run(6, work)
//!         ├─► no0..no2 admitted at t=0      (gate full)
//!         ├─► no3..no5 wait at the gate
//!         ├─► t=T: no0..no2 deposit, release ─► no3..no5 admitted
//!         └─► t=2T: sink holds 6 outcomes ─► Batch
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=info cargo run --example bounded_batch --features logging
//! ```

use std::{sync::Arc, time::Duration};

use gatevisor::{Config, LogWriter, Runner, TaskError, TaskId};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

const TASKS: usize = 6;
const LIMIT: usize = 3;
const INTERVAL: Duration = Duration::from_secs(1);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let runner = Runner::builder(Config::with_limit(LIMIT))
        .with_subscriber(Arc::new(LogWriter::new()))
        .build();

    let origin = Instant::now();
    let batch = runner
        .run(TASKS, move |id: TaskId, _ctx: CancellationToken| async move {
            println!("[{}] start at +{:?}", id.label(), origin.elapsed());
            tokio::time::sleep(INTERVAL).await;
            println!("[{}] end   at +{:?}", id.label(), origin.elapsed());
            Ok::<_, TaskError>(id.index())
        })
        .await?
        .ensure_complete()?;

    let order: Vec<String> = batch.outcomes().iter().map(|o| o.label.to_string()).collect();
    let gate = batch.gate();
    println!("completion order: {}", order.join(", "));
    println!(
        "elapsed={:?} peak={} admitted={} limit={:?}",
        batch.elapsed(),
        gate.peak,
        gate.admitted,
        gate.capacity
    );
    Ok(())
}
