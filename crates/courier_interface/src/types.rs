//! Identifiers and events shared across the workspace.

use serde::{Deserialize, Serialize};

/// Provider-side identifier of a feed (channel, group or chat).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::From,
)]
#[display("{}", _0)]
#[serde(transparent)]
pub struct FeedId(pub i64);

/// Provider-side identifier of a message within its source feed.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::From,
)]
#[display("{}", _0)]
#[serde(transparent)]
pub struct MessageRef(pub i64);

/// One message observed on a source feed in real time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageEvent {
    /// Feed the message was posted to.
    pub source: FeedId,
    /// The message itself.
    pub message: MessageRef,
}

impl MessageEvent {
    /// Create a new message event.
    pub fn new(source: impl Into<FeedId>, message: impl Into<MessageRef>) -> Self {
        Self {
            source: source.into(),
            message: message.into(),
        }
    }
}

/// Metadata about a feed the provider could resolve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedInfo {
    /// Feed identifier.
    pub id: FeedId,
    /// Human-readable title, when the provider has one.
    pub title: Option<String>,
}

impl FeedInfo {
    /// Title if present, otherwise the numeric id.
    pub fn display_name(&self) -> String {
        match &self.title {
            Some(title) => title.clone(),
            None => self.id.to_string(),
        }
    }
}

/// Marker returned by a successful forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Delivered;
