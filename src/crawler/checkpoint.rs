//! Periodic checkpoint task
//!
//! Flushes the store on a fixed period while a pass is running. The flush
//! holds the store lock, so the processor blocks before its next mutation
//! until the save completes.

use crate::storage::SharedStore;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Flushes the store on the calling thread pool's blocking threads
pub async fn checkpoint_now(store: &SharedStore) -> crate::Result<()> {
    let store = store.clone();
    tokio::task::spawn_blocking(move || store.checkpoint())
        .await
        .map_err(|e| crate::DragnetError::Task(e.to_string()))??;
    Ok(())
}

/// Spawns the checkpoint task
///
/// The first checkpoint happens one `period` after the task starts. The task
/// exits when `stop` becomes `true` or its sender is dropped.
///
/// # Returns
///
/// A handle resolving to the number of successful checkpoints
pub fn spawn_checkpointer(
    store: SharedStore,
    period: Duration,
    mut stop: watch::Receiver<bool>,
) -> JoinHandle<usize> {
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut completed = 0;

        loop {
            if *stop.borrow() {
                break;
            }

            tokio::select! {
                _ = ticker.tick() => {
                    match checkpoint_now(&store).await {
                        Ok(()) => completed += 1,
                        Err(e) => tracing::error!("Checkpoint failed: {}", e),
                    }
                }
                changed = stop.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        tracing::trace!("Checkpoint task exiting after {} checkpoints", completed);
        completed
    })
}
