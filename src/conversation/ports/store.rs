//! Session-store port: the durable mirror of in-memory sessions.
//!
//! Each turn mirrors the full session state after both the user message
//! and the computed reply were appended to history, so a process restart
//! can rehydrate in-flight tasks.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::conversation::domain::{ConversationSession, SessionId};

/// Result type for session-store operations.
pub type SessionStoreResult<T> = Result<T, SessionStoreError>;

/// Errors that can occur while mirroring sessions.
#[derive(Debug, Clone, Error)]
pub enum SessionStoreError {
    /// The backing store failed.
    #[error("session store backend error: {0}")]
    Backend(Arc<dyn std::error::Error + Send + Sync>),

    /// The session could not be serialised for storage.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl SessionStoreError {
    /// Creates a backend error from any error type.
    #[must_use]
    pub fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Backend(Arc::new(err))
    }
}

/// Port persisting session snapshots.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Stores or replaces the session snapshot.
    ///
    /// # Errors
    ///
    /// Returns `SessionStoreError` when the backing store fails.
    async fn save(&self, session: &ConversationSession) -> SessionStoreResult<()>;

    /// Loads a session snapshot.
    ///
    /// Returns `None` if no snapshot exists.
    ///
    /// # Errors
    ///
    /// Returns `SessionStoreError` when the backing store fails.
    async fn load(&self, session_id: SessionId) -> SessionStoreResult<Option<ConversationSession>>;

    /// Removes a session snapshot, if present.
    ///
    /// # Errors
    ///
    /// Returns `SessionStoreError` when the backing store fails.
    async fn remove(&self, session_id: SessionId) -> SessionStoreResult<()>;
}
