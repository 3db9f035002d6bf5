//! Rate-limit tracking for the Courier relay.
//!
//! Messaging providers enforce their own limits and tell us, on rejection,
//! exactly how long to stay quiet. This crate keeps that authoritative
//! suspension in one place ([`RateLimitState`]) so every producer sharing
//! the destination observes it, and adds an optional proactive cap
//! ([`ForwardThrottle`]) for operators who want to stay under the limit.
//!
//! Forwarding intervals and pacing are configured through
//! [`CourierConfig`], loaded from bundled defaults plus user overrides.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod state;
mod throttle;

pub use config::{CourierConfig, ForwardingConfig, ForwardingConfigBuilder};
pub use state::RateLimitState;
pub use throttle::ForwardThrottle;
