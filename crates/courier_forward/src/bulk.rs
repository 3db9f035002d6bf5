//! Backfill jobs and their strictly sequential queue.

use courier_interface::{FeedId, MessageRef};
use derive_getters::Getters;
use std::collections::VecDeque;

/// Replay of one source feed's full history, oldest first.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct BulkJob {
    /// Feed being replayed.
    source: FeedId,
    /// Human-readable feed name for notifications.
    title: String,
    /// Messages oldest first.
    messages: Vec<MessageRef>,
    #[getter(skip)]
    cursor: usize,
    /// Items the provider accepted.
    delivered: usize,
    /// Items skipped after a permanent error.
    skipped: usize,
}

impl BulkJob {
    /// Create a job over `messages`, which must already be oldest first.
    pub fn new(source: FeedId, title: impl Into<String>, messages: Vec<MessageRef>) -> Self {
        Self {
            source,
            title: title.into(),
            messages,
            cursor: 0,
            delivered: 0,
            skipped: 0,
        }
    }

    /// Index of the next message to forward.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Number of messages in the job.
    pub fn total(&self) -> usize {
        self.messages.len()
    }

    /// Message at the cursor, or `None` once complete.
    pub fn current(&self) -> Option<MessageRef> {
        self.messages.get(self.cursor).copied()
    }

    /// Whether every message has been handled.
    pub fn is_complete(&self) -> bool {
        self.cursor >= self.total()
    }

    /// Mark the current item delivered and move on.
    pub fn mark_delivered(&mut self) {
        if self.advance() {
            self.delivered += 1;
        }
    }

    /// Mark the current item skipped and move on.
    pub fn mark_skipped(&mut self) {
        if self.advance() {
            self.skipped += 1;
        }
    }

    fn advance(&mut self) -> bool {
        if self.is_complete() {
            return false;
        }
        self.cursor += 1;
        true
    }
}

/// FIFO of [`BulkJob`]s. Only the head job is ever worked on.
#[derive(Debug, Default)]
pub struct BulkReplayQueue {
    jobs: VecDeque<BulkJob>,
}

impl BulkReplayQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of jobs, including the active one.
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Whether no jobs are queued.
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Whether a job for `source` is already queued.
    pub fn contains_source(&self, source: FeedId) -> bool {
        self.jobs.iter().any(|job| job.source == source)
    }

    /// Append a job.
    pub fn push(&mut self, job: BulkJob) {
        self.jobs.push_back(job);
    }

    /// The job at the head.
    pub fn head(&self) -> Option<&BulkJob> {
        self.jobs.front()
    }

    /// Mutable access to the job at the head.
    pub fn head_mut(&mut self) -> Option<&mut BulkJob> {
        self.jobs.front_mut()
    }

    /// Remove and return the head job.
    pub fn pop(&mut self) -> Option<BulkJob> {
        self.jobs.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(n: i64) -> BulkJob {
        BulkJob::new(FeedId(9), "Archive", (1..=n).map(MessageRef).collect())
    }

    #[test]
    fn test_cursor_never_passes_total() {
        let mut job = job(3);
        assert_eq!(job.current(), Some(MessageRef(1)));
        job.mark_delivered();
        job.mark_skipped();
        job.mark_delivered();
        assert!(job.is_complete());
        assert_eq!(job.cursor(), 3);

        job.mark_delivered();
        job.mark_skipped();
        assert_eq!(job.cursor(), job.total());
        assert_eq!(*job.delivered(), 2);
        assert_eq!(*job.skipped(), 1);
        assert_eq!(job.current(), None);
    }

    #[test]
    fn test_empty_job_is_complete() {
        assert!(job(0).is_complete());
    }

    #[test]
    fn test_queue_is_fifo() {
        let mut queue = BulkReplayQueue::new();
        queue.push(BulkJob::new(FeedId(1), "a", vec![MessageRef(1)]));
        queue.push(BulkJob::new(FeedId(2), "b", vec![MessageRef(1)]));
        assert!(queue.contains_source(FeedId(2)));
        assert_eq!(queue.head().map(|j| *j.source()), Some(FeedId(1)));
        queue.pop();
        assert_eq!(queue.head().map(|j| *j.source()), Some(FeedId(2)));
        assert_eq!(queue.len(), 1);
    }
}
