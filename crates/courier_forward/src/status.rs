//! Point-in-time view of the relay for operators and the HTTP surface.

use crate::MetricsSnapshot;
use chrono::{DateTime, Utc};
use courier_interface::FeedId;
use serde::Serialize;
use std::fmt::Write;

/// Progress of the bulk job being replayed right now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActiveJob {
    /// Feed being replayed.
    pub source: FeedId,
    /// Feed name.
    pub title: String,
    /// Messages handled so far.
    pub cursor: usize,
    /// Messages in the job.
    pub total: usize,
}

/// Everything `get_status` reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusSnapshot {
    /// Monitored source feeds, ascending.
    pub monitored_channels: Vec<FeedId>,
    /// Destination feed, if set.
    pub destination: Option<FeedId>,
    /// Live messages awaiting retry.
    pub pending_forwards: usize,
    /// Bulk jobs queued, including the active one.
    pub bulk_jobs_queued: usize,
    /// Whether a bulk job is being processed right now.
    pub bulk_in_progress: bool,
    /// Job being replayed, present only while `bulk_in_progress` is set.
    pub active_job: Option<ActiveJob>,
    /// Seconds left on a provider suspension, if suspended.
    pub rate_limited_for_secs: Option<u64>,
    /// Wall-clock time sending resumes, if suspended.
    pub rate_limited_until: Option<DateTime<Utc>>,
    /// Forwarding counters.
    pub metrics: MetricsSnapshot,
}

impl StatusSnapshot {
    /// Render the operator-facing status text.
    pub fn render(&self) -> String {
        let mut text = String::from("🤖 **Bot Status**\n\n");
        let _ = writeln!(
            text,
            "📊 Monitored channels: {}",
            self.monitored_channels.len()
        );
        let _ = writeln!(
            text,
            "📤 Dump channel: {}",
            if self.destination.is_some() {
                "Set"
            } else {
                "Not set"
            }
        );
        let _ = writeln!(text, "⏳ Pending forwards: {}", self.pending_forwards);
        let _ = writeln!(text, "📦 Bulk tasks in queue: {}", self.bulk_jobs_queued);
        if let Some(job) = &self.active_job {
            let _ = writeln!(
                text,
                "🔄 Bulk progress: {}/{} ({})",
                job.cursor, job.total, job.title
            );
        }
        if let Some(secs) = self.rate_limited_for_secs {
            let _ = write!(text, "🚦 FloodWait: {secs}s remaining");
            if let Some(until) = self.rate_limited_until {
                let _ = write!(text, " (until {} UTC)", until.format("%H:%M:%S"));
            }
            text.push('\n');
        }
        text.push_str("✅ Status: Active");
        text
    }
}
