//! Collaborators that only write to the log.
//!
//! Provider sessions are established outside this workspace. Until an
//! adapter is plugged in, the server runs the engine against these.

use async_trait::async_trait;
use courier_error::{ForwardResult, NotifyError};
use courier_interface::{
    Delivered, FeedId, FeedInfo, HistoryStream, MessageRef, MessagingClient, NotificationSink,
};
use tracing::{debug, info};

/// Messaging client that accepts every forward and has no history.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogOnlyClient;

impl LogOnlyClient {
    /// Create a new log-only client.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MessagingClient for LogOnlyClient {
    async fn forward(
        &self,
        destination: FeedId,
        message: MessageRef,
        source: FeedId,
    ) -> ForwardResult<Delivered> {
        debug!(%destination, %message, %source, "LogOnlyClient: forward() called (no action taken)");
        Ok(Delivered)
    }

    fn history(&self, source: FeedId) -> HistoryStream<'_> {
        debug!(%source, "LogOnlyClient: history() called (empty)");
        Box::pin(futures::stream::empty())
    }

    async fn resolve(&self, feed: FeedId) -> ForwardResult<FeedInfo> {
        Ok(FeedInfo {
            id: feed,
            title: None,
        })
    }
}

/// Notification sink that logs every notification at info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl TracingSink {
    /// Create a new tracing sink.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl NotificationSink for TracingSink {
    async fn notify(&self, text: &str) -> Result<(), NotifyError> {
        info!(target: "courier::notify", "{text}");
        Ok(())
    }
}
