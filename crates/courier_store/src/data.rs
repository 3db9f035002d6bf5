//! Serialized shape shared by the store implementations.

use courier_interface::FeedId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct ChannelData {
    #[serde(default)]
    pub(crate) channels: BTreeSet<FeedId>,
    #[serde(default)]
    pub(crate) dump_channel: Option<FeedId>,
}
