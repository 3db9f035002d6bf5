//! Channel configuration storage.
//!
//! Two [`ChannelStore`](courier_interface::ChannelStore) implementations:
//! - [`MemoryChannelStore`]: volatile, for tests and dry runs
//! - [`JsonChannelStore`]: persisted to a pretty-printed JSON file of the form
//!   `{"channels": [..], "dump_channel": id}`

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod data;
mod json;
mod memory;

pub use json::JsonChannelStore;
pub use memory::MemoryChannelStore;
