//! In-memory implementation of the [`SessionStore`] port.
//!
//! Provides a simple, thread-safe mirror for unit testing restart
//! recovery without a database.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::conversation::domain::{ConversationSession, SessionId};
use crate::conversation::ports::store::{SessionStore, SessionStoreError, SessionStoreResult};

/// In-memory implementation of [`SessionStore`].
///
/// Thread-safe via internal [`RwLock`].
#[derive(Debug, Default, Clone)]
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<SessionId, ConversationSession>>>,
}

impl InMemorySessionStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of mirrored sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.read().map(|guard| guard.len()).unwrap_or(0)
    }

    /// Returns `true` if no sessions are mirrored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn save(&self, session: &ConversationSession) -> SessionStoreResult<()> {
        let mut guard = self
            .sessions
            .write()
            .map_err(|e| SessionStoreError::backend(std::io::Error::other(e.to_string())))?;

        guard.insert(session.session_id, session.clone());
        Ok(())
    }

    async fn load(&self, session_id: SessionId) -> SessionStoreResult<Option<ConversationSession>> {
        let guard = self
            .sessions
            .read()
            .map_err(|e| SessionStoreError::backend(std::io::Error::other(e.to_string())))?;

        Ok(guard.get(&session_id).cloned())
    }

    async fn remove(&self, session_id: SessionId) -> SessionStoreResult<()> {
        let mut guard = self
            .sessions
            .write()
            .map_err(|e| SessionStoreError::backend(std::io::Error::other(e.to_string())))?;

        guard.remove(&session_id);
        Ok(())
    }
}
