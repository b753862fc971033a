//! Notifier port for outbound notifications.
//!
//! Transport (mail, SMS, push, messaging APIs) is a collaborator concern;
//! the engine only asks for delivery and propagates typed failures.

use async_trait::async_trait;
use thiserror::Error;

use crate::workflow::domain::NotificationChannel;

/// Result type for notifier operations.
pub type NotifierResult<T> = Result<T, NotifierError>;

/// Errors that can occur during notification delivery.
#[derive(Debug, Clone, Error)]
pub enum NotifierError {
    /// The transport rejected or failed the delivery.
    #[error("delivery failed: {0}")]
    Delivery(String),

    /// The requested channel is not configured for this host.
    #[error("channel '{0}' is not available")]
    ChannelUnavailable(NotificationChannel),
}

impl NotifierError {
    /// Creates a delivery error.
    #[must_use]
    pub fn delivery(message: impl Into<String>) -> Self {
        Self::Delivery(message.into())
    }
}

/// Port for sending notifications.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Delivers a notification to the resolved recipients.
    ///
    /// # Errors
    ///
    /// Returns `NotifierError` when delivery fails; the engine treats the
    /// failure like any other action failure.
    async fn send(
        &self,
        recipients: &[String],
        title: &str,
        body: &str,
        channel: NotificationChannel,
    ) -> NotifierResult<()>;
}
