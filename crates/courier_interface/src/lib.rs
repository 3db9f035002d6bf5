//! Domain types and collaborator traits for Courier.
//!
//! The forwarding engine never talks to a messaging provider, a notification
//! channel or a persistence layer directly. It goes through the three traits
//! defined here:
//!
//! - [`MessagingClient`]: forwards messages, enumerates history, resolves feeds
//! - [`NotificationSink`]: fire-and-forget operator notifications
//! - [`ChannelStore`]: the monitored feed set and the destination feed

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod traits;
mod types;

pub use traits::{ChannelStore, HistoryStream, MessagingClient, NotificationSink};
pub use types::{Delivered, FeedId, FeedInfo, MessageEvent, MessageRef};
