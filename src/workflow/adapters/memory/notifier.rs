//! Recording implementation of the [`Notifier`] port.
//!
//! Captures every delivery for assertions instead of sending anything.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::workflow::domain::NotificationChannel;
use crate::workflow::ports::notifier::{Notifier, NotifierError, NotifierResult};

/// One captured notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentNotification {
    /// Resolved recipient addresses.
    pub recipients: Vec<String>,

    /// Rendered title.
    pub title: String,

    /// Rendered body.
    pub body: String,

    /// Delivery channel.
    pub channel: NotificationChannel,
}

/// Recording implementation of [`Notifier`].
///
/// Thread-safe via internal [`RwLock`]. Suitable for unit tests and for
/// hosts that only need an audit trail.
#[derive(Debug, Default, Clone)]
pub struct RecordingNotifier {
    sent: Arc<RwLock<Vec<SentNotification>>>,
}

impl RecordingNotifier {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every captured notification, in delivery order.
    #[must_use]
    pub fn sent(&self) -> Vec<SentNotification> {
        self.sent
            .read()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    /// Returns the number of captured notifications.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sent.read().map(|guard| guard.len()).unwrap_or(0)
    }

    /// Returns `true` if nothing was captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(
        &self,
        recipients: &[String],
        title: &str,
        body: &str,
        channel: NotificationChannel,
    ) -> NotifierResult<()> {
        let mut guard = self
            .sent
            .write()
            .map_err(|e| NotifierError::delivery(e.to_string()))?;

        guard.push(SentNotification {
            recipients: recipients.to_vec(),
            title: title.to_owned(),
            body: body.to_owned(),
            channel,
        });

        Ok(())
    }
}
