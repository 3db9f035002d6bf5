//! Queue of live messages that were rejected by the rate limit.

use courier_interface::{FeedId, MessageRef};
use serde::Serialize;
use std::collections::VecDeque;

/// One undelivered live message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct PendingForward {
    /// Destination captured when the message was first attempted.
    pub destination: FeedId,
    /// The message to forward.
    pub message: MessageRef,
    /// Feed the message came from.
    pub source: FeedId,
}

impl PendingForward {
    /// Create a pending forward.
    pub fn new(destination: FeedId, message: MessageRef, source: FeedId) -> Self {
        Self {
            destination,
            message,
            source,
        }
    }

    fn same_message(&self, other: &PendingForward) -> bool {
        self.source == other.source && self.message == other.message
    }
}

#[derive(Debug, Clone)]
struct Entry {
    item: PendingForward,
    claimed: bool,
}

/// FIFO of [`PendingForward`] items, at most one entry per message.
///
/// A claimed entry is being retried by some task and is invisible to
/// [`claim_next`](Self::claim_next) until released or removed.
#[derive(Debug, Default)]
pub struct RetryQueue {
    entries: VecDeque<Entry>,
}

impl RetryQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of queued items, claimed or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn contains(&self, item: &PendingForward) -> bool {
        self.entries.iter().any(|e| e.item.same_message(item))
    }

    /// Enqueue `item` already claimed by the caller.
    ///
    /// Returns `false` if the message is already queued; the existing
    /// entry is left as is and the caller holds no claim.
    pub fn push_claimed(&mut self, item: PendingForward) -> bool {
        if self.contains(&item) {
            return false;
        }
        self.entries.push_back(Entry {
            item,
            claimed: true,
        });
        true
    }

    /// Claim the oldest unclaimed item.
    pub fn claim_next(&mut self) -> Option<PendingForward> {
        let entry = self.entries.iter_mut().find(|e| !e.claimed)?;
        entry.claimed = true;
        Some(entry.item)
    }

    /// Give up a claim, leaving the item queued in its original position.
    pub fn release(&mut self, item: &PendingForward) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.item.same_message(item)) {
            entry.claimed = false;
        }
    }

    /// Remove `item`. Returns `false` if it was not queued.
    pub fn remove(&mut self, item: &PendingForward) -> bool {
        match self.entries.iter().position(|e| e.item.same_message(item)) {
            Some(index) => {
                self.entries.remove(index);
                true
            }
            None => false,
        }
    }

    /// Queued items in FIFO order.
    pub fn items(&self) -> Vec<PendingForward> {
        self.entries.iter().map(|e| e.item).collect()
    }
}
