use crate::modules::video::service::JobProcessor;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Periodically retries deletion of staged files that a job's cleanup left
/// behind, until `shutdown` is cancelled.
pub async fn start_reclaimer(
    processor: Arc<JobProcessor>,
    every: Duration,
    shutdown: CancellationToken,
) {
    info!("🧹 Starting stale file reclaimer (every {:?})", every);

    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => {
                if processor.pending_reclaim() == 0 {
                    continue;
                }
                let reclaimed = processor.reclaim_stale().await;
                info!(reclaimed, remaining = processor.pending_reclaim(), "Reclaim pass finished");
            }
        }
    }

    info!("🧹 Stale file reclaimer stopped");
}
