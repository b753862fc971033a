//! Intent-classifier port.
//!
//! Classification quality is a collaborator concern (an NLU backend, a
//! keyword table, a hosted model); the state machine only consumes the
//! resulting [`Intent`].

use async_trait::async_trait;
use thiserror::Error;

use crate::conversation::domain::Intent;

/// Result type for intent classification.
pub type ClassifierResult<T> = Result<T, ClassifierError>;

/// Errors that can occur during classification.
#[derive(Debug, Clone, Error)]
pub enum ClassifierError {
    /// The classifier backend failed or is unreachable.
    #[error("classifier unavailable: {0}")]
    Unavailable(String),
}

impl ClassifierError {
    /// Creates an unavailable error.
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }
}

/// Port classifying one message's intent.
#[async_trait]
pub trait IntentClassifier: Send + Sync {
    /// Classifies a message.
    ///
    /// # Errors
    ///
    /// Returns `ClassifierError` when the backend fails.
    async fn classify(&self, text: &str) -> ClassifierResult<Intent>;
}
