//! Shared mocks for forwarding engine tests.

#![allow(dead_code)]

use async_trait::async_trait;
use courier_error::{
    ForwardError, ForwardErrorKind, ForwardResult, NotifyError, StoreError, StoreErrorKind,
    StoreResult,
};
use courier_forward::Forwarder;
use courier_interface::{
    ChannelStore, Delivered, FeedId, FeedInfo, HistoryStream, MessageRef, MessagingClient,
    NotificationSink,
};
use courier_rate_limit::ForwardingConfig;
use courier_store::MemoryChannelStore;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::time::Instant;

pub const DEST: FeedId = FeedId(-100);
pub const SOURCE: FeedId = FeedId(-200);
pub const OTHER: FeedId = FeedId(-300);

/// Scripted provider reply.
#[derive(Debug, Clone, Copy)]
pub enum Reply {
    Ok,
    RateLimited(u64),
    Permanent,
}

/// One recorded forward call.
#[derive(Debug, Clone, Copy)]
pub struct Attempt {
    pub destination: FeedId,
    pub message: MessageRef,
    pub source: FeedId,
    pub at: Instant,
}

/// Mock messaging provider.
///
/// Replies are scripted per `(source, message)` and consumed in order;
/// once a script runs out every forward succeeds.
#[derive(Default)]
pub struct MockClient {
    scripts: Mutex<HashMap<(FeedId, MessageRef), VecDeque<Reply>>>,
    attempts: Mutex<Vec<Attempt>>,
    histories: Mutex<HashMap<FeedId, Vec<MessageRef>>>,
    unknown: Mutex<HashSet<FeedId>>,
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(&self, source: FeedId, message: i64, replies: &[Reply]) {
        self.scripts
            .lock()
            .entry((source, MessageRef(message)))
            .or_default()
            .extend(replies.iter().copied());
    }

    /// Give `source` a history of messages `1..=count`, yielded newest first.
    pub fn with_history(&self, source: FeedId, count: i64) {
        let messages = (1..=count).rev().map(MessageRef).collect();
        self.histories.lock().insert(source, messages);
    }

    pub fn mark_unknown(&self, feed: FeedId) {
        self.unknown.lock().insert(feed);
    }

    pub fn attempts(&self) -> Vec<Attempt> {
        self.attempts.lock().clone()
    }

    pub fn attempts_from(&self, source: FeedId) -> Vec<MessageRef> {
        self.attempts
            .lock()
            .iter()
            .filter(|a| a.source == source)
            .map(|a| a.message)
            .collect()
    }
}

#[async_trait]
impl MessagingClient for MockClient {
    async fn forward(
        &self,
        destination: FeedId,
        message: MessageRef,
        source: FeedId,
    ) -> ForwardResult<Delivered> {
        self.attempts.lock().push(Attempt {
            destination,
            message,
            source,
            at: Instant::now(),
        });
        let reply = self
            .scripts
            .lock()
            .get_mut(&(source, message))
            .and_then(VecDeque::pop_front)
            .unwrap_or(Reply::Ok);
        match reply {
            Reply::Ok => Ok(Delivered),
            Reply::RateLimited(seconds) => Err(ForwardError::rate_limited(seconds)),
            Reply::Permanent => Err(ForwardError::new(ForwardErrorKind::MessageUnavailable(
                format!("message {message} was deleted"),
            ))),
        }
    }

    fn history(&self, source: FeedId) -> HistoryStream<'_> {
        let messages = self.histories.lock().get(&source).cloned().unwrap_or_default();
        Box::pin(futures::stream::iter(messages.into_iter().map(Ok)))
    }

    async fn resolve(&self, feed: FeedId) -> ForwardResult<FeedInfo> {
        if self.unknown.lock().contains(&feed) {
            return Err(ForwardError::new(ForwardErrorKind::InvalidFeed(feed.to_string())));
        }
        Ok(FeedInfo {
            id: feed,
            title: Some(format!("Feed {feed}")),
        })
    }
}

/// Mock notification sink recording every text.
#[derive(Default)]
pub struct MockSink {
    texts: Mutex<Vec<String>>,
    failing: bool,
}

impl MockSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink whose every delivery fails after recording the text.
    pub fn failing() -> Self {
        Self {
            texts: Mutex::new(Vec::new()),
            failing: true,
        }
    }

    pub fn texts(&self) -> Vec<String> {
        self.texts.lock().clone()
    }

    pub fn count(&self, needle: &str) -> usize {
        self.texts.lock().iter().filter(|t| t.contains(needle)).count()
    }
}

#[async_trait]
impl NotificationSink for MockSink {
    async fn notify(&self, text: &str) -> Result<(), NotifyError> {
        self.texts.lock().push(text.to_string());
        if self.failing {
            return Err(NotifyError::new("sink offline"));
        }
        Ok(())
    }
}

/// Memory store whose destination lookups can be made to fail.
pub struct FlakyStore {
    inner: MemoryChannelStore,
    fail_destination: AtomicBool,
}

impl FlakyStore {
    pub fn new(inner: MemoryChannelStore) -> Self {
        Self {
            inner,
            fail_destination: AtomicBool::new(false),
        }
    }

    pub fn break_destination(&self) {
        self.fail_destination.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl ChannelStore for FlakyStore {
    async fn channels(&self) -> StoreResult<Vec<FeedId>> {
        self.inner.channels().await
    }

    async fn is_monitored(&self, feed: FeedId) -> StoreResult<bool> {
        self.inner.is_monitored(feed).await
    }

    async fn add_channel(&self, feed: FeedId) -> StoreResult<bool> {
        self.inner.add_channel(feed).await
    }

    async fn remove_channel(&self, feed: FeedId) -> StoreResult<bool> {
        self.inner.remove_channel(feed).await
    }

    async fn destination(&self) -> StoreResult<Option<FeedId>> {
        if self.fail_destination.load(Ordering::SeqCst) {
            return Err(StoreError::new(StoreErrorKind::Unavailable(
                "storage went away".to_string(),
            )));
        }
        self.inner.destination().await
    }

    async fn set_destination(&self, feed: FeedId) -> StoreResult<()> {
        self.inner.set_destination(feed).await
    }
}

/// Relay wired to mocks: `SOURCE` monitored, destination `DEST`.
pub struct Harness {
    pub client: Arc<MockClient>,
    pub sink: Arc<MockSink>,
    pub forwarder: Forwarder,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_store(MemoryChannelStore::with_channels([SOURCE], Some(DEST)))
    }

    pub fn without_destination() -> Self {
        Self::with_store(MemoryChannelStore::with_channels([SOURCE], None))
    }

    pub fn with_store(store: impl ChannelStore + 'static) -> Self {
        Self::build(Arc::new(store), Arc::new(MockSink::new()))
    }

    pub fn build(store: Arc<dyn ChannelStore>, sink: Arc<MockSink>) -> Self {
        let client = Arc::new(MockClient::new());
        let forwarder = Forwarder::new(
            client.clone(),
            store,
            sink.clone(),
            ForwardingConfig::default(),
        )
        .expect("default config is valid");
        Self {
            client,
            sink,
            forwarder,
        }
    }
}
