//! Best-effort operator notifications.

use courier_interface::NotificationSink;
use std::sync::Arc;
use tracing::warn;

/// Wraps a [`NotificationSink`] so that delivery failures are logged and swallowed.
#[derive(Clone)]
pub struct Notifier {
    sink: Arc<dyn NotificationSink>,
}

impl Notifier {
    /// Create a notifier over `sink`.
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self { sink }
    }

    /// Send `text`, never failing.
    pub async fn send(&self, text: impl AsRef<str>) {
        if let Err(e) = self.sink.notify(text.as_ref()).await {
            warn!(error = %e, "Notification dropped");
        }
    }
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier").finish_non_exhaustive()
    }
}
