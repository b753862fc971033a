//! Domain error types for the conversation subsystem.

use thiserror::Error;

use super::ids::SessionId;
use crate::conversation::ports::classifier::ClassifierError;
use crate::conversation::ports::store::SessionStoreError;

/// Result type for conversation operations.
pub type ConversationResult<T> = Result<T, ConversationError>;

/// Errors surfaced to callers of the conversation service.
///
/// Handler mismatches are deliberately absent: they are configuration
/// bugs that the state machine logs and absorbs by resetting the session,
/// never propagating to the caller.
#[derive(Debug, Error)]
pub enum ConversationError {
    /// The session is neither live nor rehydratable; callers should
    /// start a new session.
    #[error("session not found: {0}; start a new session")]
    SessionNotFound(SessionId),

    /// The durable session store failed.
    #[error("session store failed: {0}")]
    Store(#[from] SessionStoreError),

    /// The intent classifier failed.
    #[error("intent classification failed: {0}")]
    Classifier(#[from] ClassifierError),

    /// The session map lock was poisoned by a panicking thread.
    #[error("session map unavailable: {0}")]
    SessionsUnavailable(String),
}
