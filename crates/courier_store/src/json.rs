//! JSON file-backed channel store.

use crate::data::ChannelData;
use async_trait::async_trait;
use courier_error::{StoreError, StoreErrorKind, StoreResult};
use courier_interface::{ChannelStore, FeedId};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

/// Channel store persisted to a JSON file.
///
/// The whole file is rewritten after every mutation while the write lock is
/// held, so the file always reflects the latest in-memory state.
///
/// # Example
///
/// ```no_run
/// use courier_store::JsonChannelStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = JsonChannelStore::open("channels_data.json").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct JsonChannelStore {
    path: PathBuf,
    data: RwLock<ChannelData>,
}

impl JsonChannelStore {
    /// Open the store at `path`, starting empty if the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub async fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        let data = if tokio::fs::try_exists(&path)
            .await
            .map_err(|e| io_error(&path, e))?
        {
            debug!("Loading channel data");
            let json = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| io_error(&path, e))?;
            serde_json::from_str(&json).map_err(|e| {
                StoreError::new(StoreErrorKind::Serialization(format!(
                    "{}: {}",
                    path.display(),
                    e
                )))
            })?
        } else {
            info!("No channel data file, starting empty");
            ChannelData::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn save(&self, data: &ChannelData) -> StoreResult<()> {
        let json = serde_json::to_string_pretty(data)
            .map_err(|e| StoreError::new(StoreErrorKind::Serialization(e.to_string())))?;
        tokio::fs::write(&self.path, json)
            .await
            .map_err(|e| io_error(&self.path, e))?;
        debug!(path = %self.path.display(), "Channel data saved");
        Ok(())
    }
}

#[track_caller]
fn io_error(path: &Path, err: std::io::Error) -> StoreError {
    StoreError::new(StoreErrorKind::Io {
        path: path.display().to_string(),
        message: err.to_string(),
    })
}

#[async_trait]
impl ChannelStore for JsonChannelStore {
    async fn channels(&self) -> StoreResult<Vec<FeedId>> {
        Ok(self.data.read().await.channels.iter().copied().collect())
    }

    async fn is_monitored(&self, feed: FeedId) -> StoreResult<bool> {
        Ok(self.data.read().await.channels.contains(&feed))
    }

    #[instrument(skip(self))]
    async fn add_channel(&self, feed: FeedId) -> StoreResult<bool> {
        let mut data = self.data.write().await;
        if !data.channels.insert(feed) {
            return Ok(false);
        }
        if let Err(e) = self.save(&data).await {
            data.channels.remove(&feed);
            return Err(e);
        }
        Ok(true)
    }

    #[instrument(skip(self))]
    async fn remove_channel(&self, feed: FeedId) -> StoreResult<bool> {
        let mut data = self.data.write().await;
        if !data.channels.remove(&feed) {
            return Ok(false);
        }
        if let Err(e) = self.save(&data).await {
            data.channels.insert(feed);
            return Err(e);
        }
        Ok(true)
    }

    async fn destination(&self) -> StoreResult<Option<FeedId>> {
        Ok(self.data.read().await.dump_channel)
    }

    #[instrument(skip(self))]
    async fn set_destination(&self, feed: FeedId) -> StoreResult<()> {
        let mut data = self.data.write().await;
        let previous = data.dump_channel.replace(feed);
        if let Err(e) = self.save(&data).await {
            data.dump_channel = previous;
            return Err(e);
        }
        Ok(())
    }
}
