//! Forwarding engine for the Courier relay.
//!
//! Three producers feed one logical stream of forward calls:
//!
//! - the **live path** ([`Forwarder::on_message`]) forwards messages as they
//!   arrive and, on a rate limit, queues the message, waits, and retries once
//!   inline;
//! - the **retry loop** ([`Forwarder::run_retry_cycle`]) drains the
//!   [`RetryQueue`] head-first, holding back while a bulk job runs;
//! - the **bulk loop** ([`Forwarder::run_bulk_cycle`]) replays whole feed
//!   histories from the [`BulkReplayQueue`], one job at a time, oldest message
//!   first.
//!
//! All of them go through a single [`ForwardExecutor`], which serializes
//! provider calls and owns the provider's rate-limit suspension.
//!
//! # Example
//!
//! ```rust,ignore
//! let forwarder = Forwarder::new(client, store, sink, ForwardingConfig::default())?;
//! let tasks = forwarder.spawn_background();
//!
//! println!("{}", forwarder.add_channel(FeedId(-1001)).await);
//! forwarder.on_message(MessageEvent::new(-1001, 42)).await;
//!
//! tasks.shutdown().await;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod bulk;
mod executor;
mod forwarder;
mod metrics;
mod notifier;
mod retry;
mod status;
mod tasks;

pub use bulk::{BulkJob, BulkReplayQueue};
pub use executor::{ForwardExecutor, ForwardFailure};
pub use forwarder::{BulkOutcome, Forwarder, LiveOutcome, RetryOutcome};
pub use metrics::{ForwardMetrics, MetricsSnapshot};
pub use notifier::Notifier;
pub use retry::{PendingForward, RetryQueue};
pub use status::{ActiveJob, StatusSnapshot};
pub use tasks::BackgroundTasks;
