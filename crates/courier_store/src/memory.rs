//! Volatile channel store.

use crate::data::ChannelData;
use async_trait::async_trait;
use courier_error::StoreResult;
use courier_interface::{ChannelStore, FeedId};
use parking_lot::Mutex;

/// In-memory channel store. Contents are lost on drop.
#[derive(Debug, Default)]
pub struct MemoryChannelStore {
    data: Mutex<ChannelData>,
}

impl MemoryChannelStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with monitored channels and a destination.
    pub fn with_channels(
        channels: impl IntoIterator<Item = FeedId>,
        destination: Option<FeedId>,
    ) -> Self {
        Self {
            data: Mutex::new(ChannelData {
                channels: channels.into_iter().collect(),
                dump_channel: destination,
            }),
        }
    }
}

#[async_trait]
impl ChannelStore for MemoryChannelStore {
    async fn channels(&self) -> StoreResult<Vec<FeedId>> {
        Ok(self.data.lock().channels.iter().copied().collect())
    }

    async fn is_monitored(&self, feed: FeedId) -> StoreResult<bool> {
        Ok(self.data.lock().channels.contains(&feed))
    }

    async fn add_channel(&self, feed: FeedId) -> StoreResult<bool> {
        Ok(self.data.lock().channels.insert(feed))
    }

    async fn remove_channel(&self, feed: FeedId) -> StoreResult<bool> {
        Ok(self.data.lock().channels.remove(&feed))
    }

    async fn destination(&self) -> StoreResult<Option<FeedId>> {
        Ok(self.data.lock().dump_channel)
    }

    async fn set_destination(&self, feed: FeedId) -> StoreResult<()> {
        self.data.lock().dump_channel = Some(feed);
        Ok(())
    }
}
