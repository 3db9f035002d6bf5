//! Errors reported by the messaging provider when forwarding.

use std::time::Duration;

/// Result type for provider calls.
pub type ForwardResult<T> = Result<T, ForwardError>;

/// Provider-side failure conditions.
///
/// Only [`ForwardErrorKind::RateLimited`] is transient. Every other kind is
/// permanent: retrying the same call will not change the outcome.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum ForwardErrorKind {
    /// Provider suspended sending for an authoritative number of seconds.
    #[display("Rate limited: retry after {}s", seconds)]
    RateLimited {
        /// Seconds the provider asked us to wait.
        seconds: u64,
    },

    /// Access to a feed was revoked or never granted.
    #[display("Access denied: {}", _0)]
    AccessDenied(String),

    /// Feed identifier is unknown to the provider.
    #[display("Invalid feed: {}", _0)]
    InvalidFeed(String),

    /// Message no longer exists or cannot be forwarded.
    #[display("Message unavailable: {}", _0)]
    MessageUnavailable(String),

    /// Any other provider rejection.
    #[display("Provider error: {}", _0)]
    Provider(String),
}

impl ForwardErrorKind {
    /// Check if this is a rate-limit rejection.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    /// Provider-specified wait, if this is a rate-limit rejection.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { seconds } => Some(Duration::from_secs(*seconds)),
            _ => None,
        }
    }
}

/// Provider error with location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Forward Error: {} at line {} in {}", kind, line, file)]
pub struct ForwardError {
    /// The error kind
    pub kind: ForwardErrorKind,
    /// Line number where error occurred
    pub line: u32,
    /// File where error occurred
    pub file: &'static str,
}

impl ForwardError {
    /// Create a new ForwardError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: ForwardErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Shorthand for a rate-limit rejection.
    #[track_caller]
    pub fn rate_limited(seconds: u64) -> Self {
        Self::new(ForwardErrorKind::RateLimited { seconds })
    }

    /// Get the error kind.
    pub fn kind(&self) -> &ForwardErrorKind {
        &self.kind
    }

    /// Check if this is a rate-limit rejection.
    pub fn is_rate_limited(&self) -> bool {
        self.kind.is_rate_limited()
    }

    /// Provider-specified wait, if this is a rate-limit rejection.
    pub fn retry_after(&self) -> Option<Duration> {
        self.kind.retry_after()
    }
}
