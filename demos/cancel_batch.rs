//! # Example: cancel_batch
//!
//! Cancels a running batch from the outside and inspects the partial result.
//!
//! Shows how to:
//! - Implement the [`Subscribe`] trait to watch run events.
//! - Stop a batch with [`Runner::run_with_token`] and a [`CancellationToken`].
//! - Tell completed, cancelled and pending tasks apart.
//!
//! ## Flow
//! ```text
//! main()
//!   ├─► spawn canceller (sleeps 1.5s, then token.cancel())
//!   └─► Runner::run_with_token(8, work, token)
//!         ├─► first round (no0..no1) finishes at t=1s
//!         ├─► t=1.5s: CancelRequested ─► in-flight tasks see ctx.cancelled()
//!         └─► Batch { interrupt: Canceled, pending: [...] }
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example cancel_batch
//! ```

use std::{sync::Arc, time::Duration};

use gatevisor::{Config, Event, EventKind, Runner, Subscribe, TaskError, TaskId};
use tokio_util::sync::CancellationToken;

/// Prints run-level events only.
struct RunWatcher;

#[async_trait::async_trait]
impl Subscribe for RunWatcher {
    async fn on_event(&self, ev: &Event) {
        match ev.kind {
            EventKind::RunStarted => println!(
                "[watch] run started: total={} limit={:?}",
                ev.total.unwrap_or(0),
                ev.limit
            ),
            EventKind::CancelRequested => println!(
                "[watch] cancel requested after {} outcomes",
                ev.completed.unwrap_or(0)
            ),
            EventKind::RunFinished => println!(
                "[watch] run finished: {}/{} in {}ms",
                ev.completed.unwrap_or(0),
                ev.total.unwrap_or(0),
                ev.elapsed_ms.unwrap_or(0)
            ),
            _ => {}
        }
    }

    fn name(&self) -> &'static str {
        "run-watcher"
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let mut cfg = Config::with_limit(2);
    cfg.grace = Duration::from_millis(500);

    let runner = Runner::builder(cfg)
        .with_subscriber(Arc::new(RunWatcher))
        .build();

    let token = CancellationToken::new();
    let canceller = {
        let token = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(1500)).await;
            token.cancel();
        })
    };

    let batch = runner
        .run_with_token(
            8,
            |id: TaskId, ctx: CancellationToken| async move {
                tokio::select! {
                    _ = tokio::time::sleep(Duration::from_secs(1)) => Ok(id.index()),
                    _ = ctx.cancelled() => Err(TaskError::Canceled),
                }
            },
            token,
        )
        .await?;
    canceller.await?;

    println!("interrupt: {:?}", batch.interrupt());
    for o in batch.outcomes() {
        match &o.result {
            Ok(v) => println!("  {} ok={v}", o.label),
            Err(e) => println!("  {} {}", o.label, e.as_label()),
        }
    }
    println!("pending: {:?}", batch.pending());

    if let Err(e) = batch.ensure_complete() {
        println!("ensure_complete: {e}");
    }
    Ok(())
}
