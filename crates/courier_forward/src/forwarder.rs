//! The relay scheduler: live path, retry draining, bulk replay and the
//! operator command surface.

use crate::{
    ActiveJob, BulkJob, BulkReplayQueue, ForwardExecutor, ForwardFailure, ForwardMetrics,
    Notifier, PendingForward, RetryQueue, StatusSnapshot,
};
use courier_error::{ConfigError, CourierResult, ForwardError, ForwardErrorKind};
use courier_interface::{
    ChannelStore, FeedId, FeedInfo, MessageEvent, MessageRef, MessagingClient, NotificationSink,
};
use courier_rate_limit::{ForwardThrottle, ForwardingConfig};
use futures::TryStreamExt;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, error, info, instrument, warn};

const NO_DESTINATION_WARNING: &str = "⚠️ No dump channel set! Use /dump <channel_id>";
const QUEUED_DELIVERED: &str = "✅ Queued message forwarded successfully!";

/// What happened to one live message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiveOutcome {
    /// Source is not monitored.
    Ignored,
    /// No destination configured; message dropped with a warning.
    NoDestination,
    /// Forwarded, immediately or by the inline retry.
    Delivered,
    /// Left in the retry queue for the drain loop.
    Queued,
    /// Dropped after a permanent error.
    Abandoned,
}

/// Result of one retry-queue drain cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryOutcome {
    /// Nothing claimable in the queue.
    Idle,
    /// A bulk job holds the forward stream.
    Deferred,
    /// The claimed item was delivered and removed.
    Delivered(PendingForward),
    /// The claimed item failed permanently and was removed.
    Abandoned(PendingForward),
}

/// Result of one bulk job run to its end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BulkOutcome {
    /// Every item was handled.
    Completed {
        /// Replayed feed.
        source: FeedId,
        /// Items in the job.
        total: usize,
        /// Items delivered.
        delivered: usize,
        /// Items skipped after a permanent error.
        skipped: usize,
    },
    /// The job was abandoned at `cursor`.
    Failed {
        /// Replayed feed.
        source: FeedId,
        /// Items handled before the failure.
        cursor: usize,
    },
}

struct Inner {
    client: Arc<dyn MessagingClient>,
    store: Arc<dyn ChannelStore>,
    notifier: Notifier,
    executor: ForwardExecutor,
    config: ForwardingConfig,
    retry: Mutex<RetryQueue>,
    bulk: Mutex<BulkReplayQueue>,
    bulk_in_progress: AtomicBool,
    metrics: ForwardMetrics,
}

/// Owns the retry queue, the bulk replay queue and the shared executor.
///
/// Cheap to clone; clones drive the same relay.
#[derive(Clone)]
pub struct Forwarder {
    inner: Arc<Inner>,
}

/// Clears the bulk-in-progress flag when a bulk cycle ends, however it ends.
struct BulkGate<'a>(&'a AtomicBool);

impl Drop for BulkGate<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl Forwarder {
    /// Create a relay over its collaborators.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `config` fails [`ForwardingConfig::validate`].
    pub fn new(
        client: Arc<dyn MessagingClient>,
        store: Arc<dyn ChannelStore>,
        sink: Arc<dyn NotificationSink>,
        config: ForwardingConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let notifier = Notifier::new(sink);
        let metrics = ForwardMetrics::new();
        let executor = ForwardExecutor::new(
            client.clone(),
            notifier.clone(),
            ForwardThrottle::new(config.max_forwards_per_minute),
            metrics.clone(),
        );
        Ok(Self {
            inner: Arc::new(Inner {
                client,
                store,
                notifier,
                executor,
                config,
                retry: Mutex::new(RetryQueue::new()),
                bulk: Mutex::new(BulkReplayQueue::new()),
                bulk_in_progress: AtomicBool::new(false),
                metrics,
            }),
        })
    }

    /// Engine timing in effect.
    pub fn config(&self) -> &ForwardingConfig {
        &self.inner.config
    }

    /// The shared executor.
    pub fn executor(&self) -> &ForwardExecutor {
        &self.inner.executor
    }

    /// Forwarding counters.
    pub fn metrics(&self) -> &ForwardMetrics {
        &self.inner.metrics
    }

    /// Send an operator notification.
    pub async fn notify(&self, text: impl AsRef<str>) {
        self.inner.notifier.send(text).await;
    }

    /// Live messages awaiting retry, oldest first.
    pub fn pending_forwards(&self) -> Vec<PendingForward> {
        self.inner.retry.lock().items()
    }

    /// Number of queued bulk jobs, including the active one.
    pub fn bulk_jobs(&self) -> usize {
        self.inner.bulk.lock().len()
    }

    /// Whether a bulk job is being processed.
    pub fn bulk_in_progress(&self) -> bool {
        self.inner.bulk_in_progress.load(Ordering::SeqCst)
    }

    // ------------------------------------------------------------------
    // Live path
    // ------------------------------------------------------------------

    /// Handle one message observed on some feed.
    ///
    /// Consults the current monitored set, so add/remove take effect on the
    /// next event without re-registering anything.
    #[instrument(skip_all, fields(source = %event.source, message = %event.message))]
    pub async fn on_message(&self, event: MessageEvent) -> LiveOutcome {
        let MessageEvent { source, message } = event;

        match self.inner.store.is_monitored(source).await {
            Ok(true) => {}
            Ok(false) => return LiveOutcome::Ignored,
            Err(e) => {
                error!(error = %e, "Could not read monitored channels");
                self.notify(format!("❌ Error reading channel list: {e}"))
                    .await;
                return LiveOutcome::Ignored;
            }
        }

        let destination = match self.inner.store.destination().await {
            Ok(Some(destination)) => destination,
            Ok(None) => {
                warn!("Message dropped, no destination configured");
                self.notify(NO_DESTINATION_WARNING).await;
                return LiveOutcome::NoDestination;
            }
            Err(e) => {
                error!(error = %e, "Could not read destination");
                self.notify(format!("❌ Error reading dump channel: {e}"))
                    .await;
                return LiveOutcome::NoDestination;
            }
        };

        let executor = &self.inner.executor;
        match executor.attempt(destination, message, source).await {
            Ok(_) => LiveOutcome::Delivered,
            Err(ForwardFailure::Permanent(e)) => {
                self.inner.metrics.record_abandoned();
                error!(error = %e, "Live message abandoned");
                self.notify(format!("❌ Error forwarding message from {source}: {e}"))
                    .await;
                LiveOutcome::Abandoned
            }
            Err(ForwardFailure::RateLimited { .. }) => {
                let item = PendingForward::new(destination, message, source);
                let claimed = self.inner.retry.lock().push_claimed(item);
                executor.backoff().await;
                if !claimed {
                    debug!("Message already queued elsewhere");
                    return LiveOutcome::Queued;
                }
                self.retry_inline(item).await
            }
        }
    }

    /// The single inline retry after a live rate limit.
    async fn retry_inline(&self, item: PendingForward) -> LiveOutcome {
        let result = self
            .inner
            .executor
            .attempt(item.destination, item.message, item.source)
            .await;
        match result {
            Ok(_) => {
                self.inner.retry.lock().remove(&item);
                info!("Queued message delivered inline");
                self.notify(QUEUED_DELIVERED).await;
                LiveOutcome::Delivered
            }
            Err(ForwardFailure::RateLimited { .. }) => {
                self.inner.retry.lock().release(&item);
                debug!("Still rate limited, leaving item to the drain loop");
                LiveOutcome::Queued
            }
            Err(ForwardFailure::Permanent(e)) => {
                self.inner.retry.lock().remove(&item);
                self.inner.metrics.record_abandoned();
                error!(error = %e, "Queued message abandoned");
                self.notify(format!("❌ Failed to forward queued message: {e}"))
                    .await;
                LiveOutcome::Abandoned
            }
        }
    }

    // ------------------------------------------------------------------
    // Retry drain
    // ------------------------------------------------------------------

    /// Drain the oldest claimable retry item until it is delivered or abandoned.
    ///
    /// Does nothing while a bulk job is in progress, and yields the claimed
    /// item back if a bulk job starts between attempts.
    pub async fn run_retry_cycle(&self) -> RetryOutcome {
        if self.bulk_in_progress() {
            return RetryOutcome::Deferred;
        }
        let Some(item) = self.inner.retry.lock().claim_next() else {
            return RetryOutcome::Idle;
        };
        debug!(source = %item.source, message = %item.message, "Draining queued message");

        let executor = &self.inner.executor;
        loop {
            let gate = || !self.bulk_in_progress();
            let result = match executor
                .attempt_when(gate, item.destination, item.message, item.source)
                .await
            {
                Some(result) => result,
                None => {
                    self.inner.retry.lock().release(&item);
                    debug!("Bulk job started, deferring retry");
                    return RetryOutcome::Deferred;
                }
            };

            match result {
                Ok(_) => {
                    self.inner.retry.lock().remove(&item);
                    info!(source = %item.source, "Queued message delivered");
                    self.notify(QUEUED_DELIVERED).await;
                    return RetryOutcome::Delivered(item);
                }
                Err(ForwardFailure::RateLimited { .. }) => {
                    executor.backoff().await;
                }
                Err(ForwardFailure::Permanent(e)) => {
                    self.inner.retry.lock().remove(&item);
                    self.inner.metrics.record_abandoned();
                    error!(error = %e, source = %item.source, "Queued message abandoned");
                    self.notify(format!("❌ Failed to forward queued message: {e}"))
                        .await;
                    return RetryOutcome::Abandoned(item);
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Bulk replay
    // ------------------------------------------------------------------

    /// Run the head bulk job to completion or failure.
    ///
    /// Returns `None` if no job is queued or another cycle already holds the
    /// bulk-in-progress flag.
    pub async fn run_bulk_cycle(&self) -> Option<BulkOutcome> {
        if self.inner.bulk.lock().is_empty() {
            return None;
        }
        if self
            .inner
            .bulk_in_progress
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("Bulk job already in progress");
            return None;
        }
        let _gate = BulkGate(&self.inner.bulk_in_progress);
        self.replay_head().await
    }

    async fn replay_head(&self) -> Option<BulkOutcome> {
        let (source, title, total) = {
            let queue = self.inner.bulk.lock();
            let job = queue.head()?;
            (*job.source(), job.title().clone(), job.total())
        };
        info!(%source, total, "Bulk replay started");

        loop {
            let (message, cursor) = {
                let queue = self.inner.bulk.lock();
                let job = queue.head()?;
                (job.current(), job.cursor())
            };

            let Some(message) = message else {
                return Some(self.finish_job(source, &title, total).await);
            };

            let destination = match self.require_destination().await {
                Ok(destination) => destination,
                Err(e) => return Some(self.fail_job(e.to_string(), source, cursor).await),
            };

            match self.inner.executor.attempt(destination, message, source).await {
                Ok(_) => {
                    let cursor = self.update_head(BulkJob::mark_delivered);
                    if cursor % self.inner.config.progress_every == 0 {
                        self.notify(format!(
                            "📤 **Bulk Forward Progress**\n\n\
                             Progress: {cursor}/{total} messages\n\
                             Channel: `{source}`"
                        ))
                        .await;
                    }
                    tokio::time::sleep(self.inner.config.bulk_pacing()).await;
                }
                Err(ForwardFailure::RateLimited { wait }) => {
                    self.notify(format!(
                        "⏳ **FloodWait during bulk forward!**\n\n\
                         Waiting {} seconds...\n\
                         Progress: {cursor}/{total} messages\n\
                         Will resume automatically after wait.",
                        wait.as_secs()
                    ))
                    .await;
                    self.inner.executor.backoff().await;
                }
                Err(ForwardFailure::Permanent(e)) => {
                    warn!(error = %e, cursor, "Skipping bulk item");
                    self.inner.metrics.record_skipped();
                    self.notify(format!(
                        "❌ Error forwarding message {}/{total}: {e}\nSkipping and continuing...",
                        cursor + 1
                    ))
                    .await;
                    self.update_head(BulkJob::mark_skipped);
                }
            }
        }
    }

    /// Apply `step` to the head job and return its new cursor.
    fn update_head(&self, step: fn(&mut BulkJob)) -> usize {
        let mut queue = self.inner.bulk.lock();
        match queue.head_mut() {
            Some(job) => {
                step(job);
                job.cursor()
            }
            None => 0,
        }
    }

    async fn finish_job(&self, source: FeedId, title: &str, total: usize) -> BulkOutcome {
        let (delivered, skipped) = self
            .inner
            .bulk
            .lock()
            .pop()
            .map(|job| (*job.delivered(), *job.skipped()))
            .unwrap_or_default();
        info!(%source, total, delivered, skipped, "Bulk replay completed");
        self.notify(format!(
            "✅ **Bulk forward completed!**\n\n\
             Total forwarded: {total} messages\n\
             Delivered: {delivered}, skipped: {skipped}\n\
             Channel: {title} (`{source}`)"
        ))
        .await;
        BulkOutcome::Completed {
            source,
            total,
            delivered,
            skipped,
        }
    }

    async fn fail_job(&self, reason: String, source: FeedId, cursor: usize) -> BulkOutcome {
        self.inner.bulk.lock().pop();
        error!(%source, cursor, %reason, "Bulk replay failed");
        self.notify(format!("❌ Bulk forward failed: {reason}")).await;
        BulkOutcome::Failed { source, cursor }
    }

    async fn require_destination(&self) -> CourierResult<FeedId> {
        match self.inner.store.destination().await? {
            Some(destination) => Ok(destination),
            None => Err(ConfigError::new("No dump channel set").into()),
        }
    }

    // ------------------------------------------------------------------
    // Operator commands
    // ------------------------------------------------------------------

    /// Start monitoring `feed`.
    #[instrument(skip(self))]
    pub async fn add_channel(&self, feed: FeedId) -> String {
        let info = match self.inner.client.resolve(feed).await {
            Ok(info) => info,
            Err(e) if is_invalid_feed(&e) => return invalid_channel_text(),
            Err(e) => return format!("❌ **Error adding channel**\n\n{e}"),
        };
        let name = info.display_name();
        match self.inner.store.add_channel(feed).await {
            Ok(true) => {
                info!(%feed, %name, "Channel added");
                format!("✅ **Channel added successfully!**\n\nChannel: {name}\nID: {feed}")
            }
            Ok(false) => format!("⚠️ Channel already being monitored: {name}"),
            Err(e) => {
                error!(error = %e, "Could not persist channel");
                format!("❌ **Error adding channel**\n\n{e}")
            }
        }
    }

    /// Stop monitoring `feed`.
    #[instrument(skip(self))]
    pub async fn remove_channel(&self, feed: FeedId) -> String {
        match self.inner.store.remove_channel(feed).await {
            Ok(true) => {
                info!(%feed, "Channel removed");
                format!("✅ **Channel removed**\n\nChannel ID: {feed}")
            }
            Ok(false) => format!("❌ Channel {feed} is not in the monitored list"),
            Err(e) => {
                error!(error = %e, "Could not persist channel removal");
                format!("❌ **Error removing channel**\n\n{e}")
            }
        }
    }

    /// Point forwarding at `feed`.
    #[instrument(skip(self))]
    pub async fn set_destination(&self, feed: FeedId) -> String {
        let outcome = async {
            let info = self.inner.client.resolve(feed).await?;
            self.inner.store.set_destination(feed).await?;
            CourierResult::Ok(info)
        }
        .await;
        match outcome {
            Ok(info) => {
                info!(%feed, "Destination set");
                format!(
                    "✅ **Dump channel set!**\n\nChannel: {}\nID: {feed}\n\n\
                     All messages will be forwarded here.",
                    info.display_name()
                )
            }
            Err(e) => format!(
                "❌ **Error setting dump channel**\n\n{e}\n\n\
                 Make sure you have access to this channel."
            ),
        }
    }

    /// Enumerate `source`'s history and queue it for replay.
    #[instrument(skip(self))]
    pub async fn request_bulk_replay(&self, source: FeedId) -> String {
        match self.inner.store.destination().await {
            Ok(Some(_)) => {}
            Ok(None) => {
                return "❌ **No dump channel set!**\n\nUse /dump <channel_id> first.".to_string();
            }
            Err(e) => return format!("❌ **Error starting bulk forward**\n\n{e}"),
        }
        if self.bulk_in_progress() {
            return "⚠️ **Another bulk forward is in progress!**\n\n\
                    Please wait for it to complete."
                .to_string();
        }

        let info = match self.inner.client.resolve(source).await {
            Ok(info) => info,
            Err(e) if is_invalid_feed(&e) => return invalid_channel_text(),
            Err(e) => return format!("❌ **Error starting bulk forward**\n\n{e}"),
        };
        let name = info.display_name();
        if self.inner.bulk.lock().contains_source(source) {
            return format!("⚠️ Channel {name} is already queued for bulk forward");
        }

        self.notify(format!(
            "🔍 **Starting bulk forward...**\n\n\
             Channel: {name}\n\
             Fetching all messages, please wait..."
        ))
        .await;

        let mut messages = match self.collect_history(&info).await {
            Ok(messages) => messages,
            Err(e) => {
                error!(error = %e, "History enumeration failed");
                return format!("❌ **Error starting bulk forward**\n\n{e}");
            }
        };
        if messages.is_empty() {
            return "⚠️ No messages found in this channel.".to_string();
        }
        messages.reverse();
        let total = messages.len();

        self.inner.bulk.lock().push(BulkJob::new(source, name.clone(), messages));
        info!(%source, total, "Bulk job queued");
        format!(
            "📦 **Found {total} messages!**\n\n\
             Channel: {name}\n\
             Starting forward process...\n\n\
             This may take a while. You'll get progress updates every {} messages.",
            self.inner.config.progress_every
        )
    }

    async fn collect_history(&self, info: &FeedInfo) -> Result<Vec<MessageRef>, ForwardError> {
        self.inner.client.history(info.id).try_collect().await
    }

    /// Gather the current relay state.
    ///
    /// # Errors
    ///
    /// Fails if the channel store cannot be read.
    pub async fn snapshot(&self) -> CourierResult<StatusSnapshot> {
        let monitored_channels = self.inner.store.channels().await?;
        let destination = self.inner.store.destination().await?;
        let bulk_in_progress = self.bulk_in_progress();
        let (bulk_jobs_queued, active_job) = {
            let queue = self.inner.bulk.lock();
            let active = queue
                .head()
                .filter(|_| bulk_in_progress)
                .map(|job| ActiveJob {
                    source: *job.source(),
                    title: job.title().clone(),
                    cursor: job.cursor(),
                    total: job.total(),
                });
            (queue.len(), active)
        };
        let rate_limit = self.inner.executor.rate_limit();
        let rate_limited_for_secs = rate_limit.remaining().map(|d| d.as_secs().max(1));
        Ok(StatusSnapshot {
            monitored_channels,
            destination,
            pending_forwards: self.inner.retry.lock().len(),
            bulk_jobs_queued,
            bulk_in_progress,
            active_job,
            rate_limited_for_secs,
            rate_limited_until: rate_limit.resumes_at(),
            metrics: self.inner.metrics.snapshot(),
        })
    }

    /// Operator-facing status text.
    pub async fn get_status(&self) -> String {
        match self.snapshot().await {
            Ok(snapshot) => snapshot.render(),
            Err(e) => format!("❌ Error: {e}"),
        }
    }
}

impl std::fmt::Debug for Forwarder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Forwarder")
            .field("config", &self.inner.config)
            .field("bulk_in_progress", &self.bulk_in_progress())
            .finish_non_exhaustive()
    }
}

fn is_invalid_feed(e: &ForwardError) -> bool {
    matches!(
        e.kind(),
        ForwardErrorKind::InvalidFeed(_) | ForwardErrorKind::AccessDenied(_)
    )
}

fn invalid_channel_text() -> String {
    "❌ **Invalid channel ID**\n\n\
     Make sure:\n\
     • You're a member of the channel\n\
     • The ID is correct\n\
     • You have access to view messages"
        .to_string()
}
