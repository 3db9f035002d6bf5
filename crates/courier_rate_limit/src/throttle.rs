//! Optional proactive cap on the shared forward stream.
//!
//! Uses the governor crate (GCRA) the same way for every producer, so the
//! live path, the retry queue and bulk replay together never exceed the
//! configured number of forwards per minute.

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;
use tracing::debug;

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Admission gate applied before every provider call.
///
/// Without a configured cap this is a no-op; provider-imposed suspensions
/// are tracked separately by [`RateLimitState`](crate::RateLimitState).
#[derive(Clone, Default)]
pub struct ForwardThrottle {
    limiter: Option<Arc<DirectRateLimiter>>,
}

impl std::fmt::Debug for ForwardThrottle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForwardThrottle")
            .field("limited", &self.limiter.is_some())
            .finish()
    }
}

impl ForwardThrottle {
    /// Create a throttle allowing `per_minute` forwards, or unlimited if `None`.
    pub fn new(per_minute: Option<u32>) -> Self {
        let limiter = per_minute.and_then(NonZeroU32::new).map(|n| {
            let quota = Quota::per_minute(n);
            Arc::new(RateLimiter::direct(quota))
        });
        Self { limiter }
    }

    /// Whether a cap is configured.
    pub fn is_limited(&self) -> bool {
        self.limiter.is_some()
    }

    /// Wait until one more forward fits under the cap.
    pub async fn until_ready(&self) {
        if let Some(limiter) = &self.limiter {
            if limiter.check().is_err() {
                debug!("Forward throttle engaged, waiting for capacity");
                limiter.until_ready().await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    const PROMPT: Duration = Duration::from_millis(50);

    #[tokio::test]
    async fn test_unlimited_throttle_always_admits() {
        let throttle = ForwardThrottle::new(None);
        assert!(!throttle.is_limited());
        for _ in 0..1000 {
            assert!(timeout(PROMPT, throttle.until_ready()).await.is_ok());
        }
    }

    #[tokio::test]
    async fn test_cap_holds_back_burst_beyond_quota() {
        let throttle = ForwardThrottle::new(Some(2));
        assert!(throttle.is_limited());
        assert!(timeout(PROMPT, throttle.until_ready()).await.is_ok());
        assert!(timeout(PROMPT, throttle.until_ready()).await.is_ok());
        assert!(timeout(PROMPT, throttle.until_ready()).await.is_err());
    }

    #[test]
    fn test_zero_cap_means_unlimited() {
        let throttle = ForwardThrottle::new(Some(0));
        assert!(!throttle.is_limited());
    }
}
