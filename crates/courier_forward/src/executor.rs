//! The single choke-point for provider forward calls.
//!
//! Every producer (live path, retry queue, bulk replay) goes through one
//! [`ForwardExecutor`]. Provider calls are serialized behind a send lock and
//! each call first waits out any active suspension, so the three producers
//! share one logical forward stream and one rate budget.

use crate::{ForwardMetrics, Notifier};
use courier_error::ForwardError;
use courier_interface::{Delivered, FeedId, MessageRef, MessagingClient};
use courier_rate_limit::{ForwardThrottle, RateLimitState};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info, instrument, warn};

/// Why a forward did not deliver.
#[derive(Debug, Clone, derive_more::Display)]
pub enum ForwardFailure {
    /// Provider suspended sending; the suspension has been recorded.
    #[display("Rate limited for {}s", wait.as_secs())]
    RateLimited {
        /// Provider-specified wait.
        wait: Duration,
    },
    /// Provider rejected the forward for a non rate-limit reason.
    #[display("{}", _0)]
    Permanent(ForwardError),
}

/// Issues forward calls and applies provider backoff.
///
/// The executor never retries on its own; callers decide whether a
/// [`ForwardFailure`] means re-enqueue, skip, or loop.
pub struct ForwardExecutor {
    client: Arc<dyn MessagingClient>,
    notifier: Notifier,
    state: RateLimitState,
    throttle: ForwardThrottle,
    metrics: ForwardMetrics,
    send_lock: Mutex<()>,
    resume_pending: AtomicBool,
}

impl ForwardExecutor {
    /// Create an executor over `client`.
    pub fn new(
        client: Arc<dyn MessagingClient>,
        notifier: Notifier,
        throttle: ForwardThrottle,
        metrics: ForwardMetrics,
    ) -> Self {
        debug!(capped = throttle.is_limited(), "Forward executor ready");
        Self {
            client,
            notifier,
            state: RateLimitState::new(),
            throttle,
            metrics,
            send_lock: Mutex::new(()),
            resume_pending: AtomicBool::new(false),
        }
    }

    /// Current provider suspension.
    pub fn rate_limit(&self) -> &RateLimitState {
        &self.state
    }

    /// Make exactly one forward attempt.
    ///
    /// Waits out any active suspension first. On a rate-limit rejection the
    /// suspension is recorded and announced, and the caller gets
    /// [`ForwardFailure::RateLimited`] back immediately; use
    /// [`backoff`](Self::backoff) to wait it out.
    #[instrument(skip_all, fields(%destination, %message, %source))]
    pub async fn attempt(
        &self,
        destination: FeedId,
        message: MessageRef,
        source: FeedId,
    ) -> Result<Delivered, ForwardFailure> {
        let send = self.send_lock.lock().await;
        self.prepare().await;
        self.dispatch(send, destination, message, source).await
    }

    /// Like [`attempt`](Self::attempt), but re-checks `ready` once this task
    /// owns the send slot. Returns `None` without calling the provider if
    /// `ready` no longer holds.
    #[instrument(skip_all, fields(%destination, %message, %source))]
    pub async fn attempt_when<F>(
        &self,
        ready: F,
        destination: FeedId,
        message: MessageRef,
        source: FeedId,
    ) -> Option<Result<Delivered, ForwardFailure>>
    where
        F: Fn() -> bool,
    {
        let send = self.send_lock.lock().await;
        self.prepare().await;
        if !ready() {
            debug!("Send slot no longer wanted");
            return None;
        }
        Some(self.dispatch(send, destination, message, source).await)
    }

    /// Runs with the send slot held; callers queue behind it in order.
    async fn prepare(&self) {
        self.await_clearance().await;
        self.throttle.until_ready().await;
    }

    async fn dispatch(
        &self,
        send: MutexGuard<'_, ()>,
        destination: FeedId,
        message: MessageRef,
        source: FeedId,
    ) -> Result<Delivered, ForwardFailure> {
        let result = self.client.forward(destination, message, source).await;
        drop(send);

        match result {
            Ok(delivered) => {
                debug!("Forward delivered");
                self.metrics.record_delivered();
                Ok(delivered)
            }
            Err(e) => match e.retry_after() {
                Some(wait) => {
                    self.state.suspend(wait);
                    self.resume_pending.store(true, Ordering::SeqCst);
                    self.metrics.record_rate_limited();
                    warn!(wait_secs = wait.as_secs(), "Provider rate limit hit");
                    self.notifier
                        .send(format!(
                            "⏳ **FloodWait detected!**\n\n\
                             Sending paused for {} seconds.\n\
                             Pending messages will be forwarded automatically.",
                            wait.as_secs()
                        ))
                        .await;
                    Err(ForwardFailure::RateLimited { wait })
                }
                None => {
                    debug!(error = %e, "Forward rejected permanently");
                    Err(ForwardFailure::Permanent(e))
                }
            },
        }
    }

    /// Block the calling task until the current suspension has elapsed.
    pub async fn backoff(&self) {
        self.await_clearance().await;
    }

    /// Attempt once and, if rate limited, wait out the suspension before returning.
    pub async fn forward(
        &self,
        destination: FeedId,
        message: MessageRef,
        source: FeedId,
    ) -> Result<Delivered, ForwardFailure> {
        let result = self.attempt(destination, message, source).await;
        if matches!(result, Err(ForwardFailure::RateLimited { .. })) {
            self.backoff().await;
        }
        result
    }

    /// Wait for the suspension to clear; the first task through announces it.
    async fn await_clearance(&self) {
        self.state.wait_until_clear().await;
        if self.resume_pending.swap(false, Ordering::SeqCst) {
            info!("Rate limit cleared");
            self.notifier
                .send("▶️ **FloodWait over**, forwarding resumed.")
                .await;
        }
    }
}

impl std::fmt::Debug for ForwardExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForwardExecutor")
            .field("state", &self.state)
            .field("throttle", &self.throttle)
            .finish_non_exhaustive()
    }
}
