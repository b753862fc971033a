//! Recipient-resolver port mapping role groups to concrete recipients.

use async_trait::async_trait;
use thiserror::Error;

use crate::workflow::domain::RecipientSelector;

/// Result type for recipient resolution.
pub type RecipientResult<T> = Result<T, RecipientError>;

/// Errors that can occur while resolving recipients.
#[derive(Debug, Clone, Error)]
pub enum RecipientError {
    /// The named role group is not configured.
    #[error("unknown recipient role: '{0}'")]
    UnknownRole(String),
}

/// Port resolving a selector into concrete recipient addresses.
///
/// Direct selectors pass through unchanged; role selectors are looked up
/// in host configuration (staff directories, on-call rosters).
#[async_trait]
pub trait RecipientResolver: Send + Sync {
    /// Resolves a selector into recipient addresses.
    ///
    /// # Errors
    ///
    /// Returns `RecipientError::UnknownRole` for unconfigured role groups.
    async fn resolve(&self, selector: &RecipientSelector) -> RecipientResult<Vec<String>>;
}
