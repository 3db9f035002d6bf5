//! Collaborator traits consumed by the forwarding engine.

use crate::{Delivered, FeedId, FeedInfo, MessageRef};
use async_trait::async_trait;
use courier_error::{ForwardResult, NotifyError, StoreResult};
use futures::stream::BoxStream;

/// Lazily produced, finite message history of one feed.
pub type HistoryStream<'a> = BoxStream<'a, ForwardResult<MessageRef>>;

/// Messaging provider operations the relay depends on.
///
/// # Errors
///
/// Rate-limit rejections must be reported as
/// [`ForwardErrorKind::RateLimited`](courier_error::ForwardErrorKind::RateLimited)
/// carrying the provider's authoritative wait. Any other error is treated as
/// permanent by the engine.
#[async_trait]
pub trait MessagingClient: Send + Sync {
    /// Forward `message` from `source` into `destination`.
    async fn forward(
        &self,
        destination: FeedId,
        message: MessageRef,
        source: FeedId,
    ) -> ForwardResult<Delivered>;

    /// Enumerate every message of `source`.
    ///
    /// Providers typically yield newest first; callers must not rely on order.
    fn history(&self, source: FeedId) -> HistoryStream<'_>;

    /// Look up a feed, failing if it does not exist or is not accessible.
    async fn resolve(&self, feed: FeedId) -> ForwardResult<FeedInfo>;
}

/// Destination for human-readable operator notifications.
///
/// Delivery is best-effort. The engine logs failures and never aborts
/// forwarding because of them.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Send one notification.
    async fn notify(&self, text: &str) -> Result<(), NotifyError>;
}

/// Source of the monitored feed set and the destination feed.
#[async_trait]
pub trait ChannelStore: Send + Sync {
    /// All monitored source feeds, in ascending id order.
    async fn channels(&self) -> StoreResult<Vec<FeedId>>;

    /// Whether `feed` is currently monitored.
    async fn is_monitored(&self, feed: FeedId) -> StoreResult<bool>;

    /// Start monitoring `feed`. Returns `false` if it was already monitored.
    async fn add_channel(&self, feed: FeedId) -> StoreResult<bool>;

    /// Stop monitoring `feed`. Returns `false` if it was not monitored.
    async fn remove_channel(&self, feed: FeedId) -> StoreResult<bool>;

    /// The destination feed, if one has been configured.
    async fn destination(&self) -> StoreResult<Option<FeedId>>;

    /// Replace the destination feed.
    async fn set_destination(&self, feed: FeedId) -> StoreResult<()>;
}
