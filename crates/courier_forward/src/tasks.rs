//! Background drain loops.

use crate::{BulkOutcome, Forwarder, RetryOutcome};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, instrument};

/// Handles to the retry and bulk loops of one [`Forwarder`].
///
/// Dropping the handles leaves the loops running; call
/// [`shutdown`](Self::shutdown) to stop them.
#[derive(Debug)]
pub struct BackgroundTasks {
    retry: JoinHandle<()>,
    bulk: JoinHandle<()>,
}

impl BackgroundTasks {
    /// Abort both loops. In-flight work is dropped.
    #[instrument(skip(self))]
    pub async fn shutdown(self) {
        self.retry.abort();
        self.bulk.abort();
        let _ = self.retry.await;
        let _ = self.bulk.await;
        info!("Background loops stopped");
    }

    /// Whether either loop has exited.
    pub fn is_finished(&self) -> bool {
        self.retry.is_finished() || self.bulk.is_finished()
    }
}

impl Forwarder {
    /// Spawn the retry and bulk loops at the configured intervals.
    ///
    /// The first tick of each loop fires one full interval after spawning.
    pub fn spawn_background(&self) -> BackgroundTasks {
        let retry = {
            let forwarder = self.clone();
            let period = forwarder.config().retry_interval();
            tokio::spawn(async move {
                let mut ticks = ticker(period);
                loop {
                    ticks.tick().await;
                    match forwarder.run_retry_cycle().await {
                        RetryOutcome::Idle => {}
                        outcome => debug!(?outcome, "Retry cycle finished"),
                    }
                }
            })
        };

        let bulk = {
            let forwarder = self.clone();
            let period = forwarder.config().bulk_interval();
            tokio::spawn(async move {
                let mut ticks = ticker(period);
                loop {
                    ticks.tick().await;
                    if let Some(outcome) = forwarder.run_bulk_cycle().await {
                        match outcome {
                            BulkOutcome::Completed { source, total, .. } => {
                                debug!(%source, total, "Bulk cycle completed a job");
                            }
                            BulkOutcome::Failed { source, cursor } => {
                                debug!(%source, cursor, "Bulk cycle dropped a job");
                            }
                        }
                    }
                }
            })
        };

        info!("Background loops started");
        BackgroundTasks { retry, bulk }
    }
}

fn ticker(period: Duration) -> tokio::time::Interval {
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}
