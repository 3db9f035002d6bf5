//! Process-wide provider suspension.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, instrument};

/// Upper bound for a single provider wait.
const MAX_SUSPENSION: Duration = Duration::from_secs(7 * 24 * 60 * 60);

#[derive(Debug, Clone, Copy)]
struct Suspension {
    until: Instant,
    resumes_at: DateTime<Utc>,
}

/// Tracks whether sending is suspended and until when.
///
/// Cloning shares the underlying state, so every producer holding a clone
/// observes the same suspension. A new rejection never shortens an active
/// suspension: the later deadline wins.
///
/// # Example
///
/// ```rust,ignore
/// let state = RateLimitState::new();
/// state.suspend(Duration::from_secs(5));
/// assert!(state.is_suspended());
/// state.wait_until_clear().await;
/// assert!(!state.is_suspended());
/// ```
#[derive(Debug, Clone, Default)]
pub struct RateLimitState {
    suspension: Arc<Mutex<Option<Suspension>>>,
}

impl RateLimitState {
    /// Create an unsuspended state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Suspend sending for `wait`, measured from now.
    ///
    /// Returns the instant sending may resume.
    #[instrument(skip(self))]
    pub fn suspend(&self, wait: Duration) -> Instant {
        let now = Instant::now();
        let until = now.checked_add(wait).unwrap_or(now + MAX_SUSPENSION);
        let mut guard = self.suspension.lock();
        match guard.as_ref() {
            Some(current) if current.until >= until => {
                debug!("Existing suspension outlasts new wait");
                current.until
            }
            _ => {
                let resumes_at = chrono::Duration::from_std(wait)
                    .ok()
                    .and_then(|d| Utc::now().checked_add_signed(d))
                    .unwrap_or(DateTime::<Utc>::MAX_UTC);
                *guard = Some(Suspension { until, resumes_at });
                debug!(%resumes_at, "Sending suspended");
                until
            }
        }
    }

    /// Time left until sending may resume, or `None` if not suspended.
    ///
    /// An expired suspension is cleared as a side effect.
    pub fn remaining(&self) -> Option<Duration> {
        let mut guard = self.suspension.lock();
        let suspension = (*guard)?;
        let now = Instant::now();
        if suspension.until <= now {
            *guard = None;
            return None;
        }
        Some(suspension.until - now)
    }

    /// Whether sending is currently suspended.
    pub fn is_suspended(&self) -> bool {
        self.remaining().is_some()
    }

    /// Wall-clock time sending resumes, if suspended.
    pub fn resumes_at(&self) -> Option<DateTime<Utc>> {
        self.remaining()?;
        (*self.suspension.lock()).map(|s| s.resumes_at)
    }

    /// Sleep until no suspension is active.
    ///
    /// Loops because another rejection may extend the deadline while waiting.
    pub async fn wait_until_clear(&self) {
        while let Some(remaining) = self.remaining() {
            debug!(remaining_ms = remaining.as_millis() as u64, "Waiting out suspension");
            tokio::time::sleep(remaining).await;
        }
    }
}
