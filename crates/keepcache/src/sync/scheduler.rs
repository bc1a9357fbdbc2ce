//! Polling schedule for sync cycles.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};

use super::engine::Syncer;
use super::progress::ProgressCallback;
use super::types::CycleKind;

/// Shortest interval accepted by the scheduler.
const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Drives a [`Syncer`]: one full cycle immediately, then incremental cycles
/// on a fixed interval.
///
/// Cycles are never cancelled mid-flight. Shutdown is honoured between
/// cycles, and a failed cycle is logged and the schedule carries on.
pub struct Scheduler {
    syncer: Arc<Syncer>,
    interval: Duration,
}

impl Scheduler {
    pub fn new(syncer: Arc<Syncer>, interval: Duration) -> Self {
        Self {
            syncer,
            interval: interval.max(MIN_INTERVAL),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run until `shutdown` resolves. Returns the number of cycles started.
    pub async fn run<F>(&self, shutdown: F, on_progress: Option<&ProgressCallback>) -> usize
    where
        F: Future<Output = ()>,
    {
        tracing::info!("Performing initial full sync");
        self.run_logged(CycleKind::Full, on_progress).await;
        let mut cycles = 1;

        let mut ticker = tokio::time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::info!(
            interval_secs = self.interval.as_secs(),
            "Scheduled incremental sync"
        );

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                biased;
                () = &mut shutdown => {
                    tracing::info!("Shutting down sync scheduler");
                    break;
                }
                _ = ticker.tick() => {
                    self.run_logged(CycleKind::Incremental, on_progress).await;
                    cycles += 1;
                }
            }
        }

        cycles
    }

    async fn run_logged(&self, kind: CycleKind, on_progress: Option<&ProgressCallback>) {
        if let Err(err) = self.syncer.run_cycle(kind, on_progress).await {
            // Already recorded in the sync status by the syncer.
            tracing::warn!(kind = %kind, error = %err, "Sync cycle failed, will retry on schedule");
        }
    }
}
