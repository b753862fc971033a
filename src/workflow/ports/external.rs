//! External-call port for named host integrations.
//!
//! `CallExternal` steps invoke handlers registered by the host (webhooks,
//! third-party APIs). Calls are best-effort: a failure fails the step like
//! any other action failure, and no retry is attempted.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::workflow::domain::ExternalCallName;

/// Result type for external calls.
pub type ExternalCallResult<T> = Result<T, ExternalCallError>;

/// Errors that can occur during an external call.
#[derive(Debug, Clone, Error)]
pub enum ExternalCallError {
    /// No handler is registered under this name.
    #[error("unknown external call: '{0}'")]
    UnknownCall(ExternalCallName),

    /// The handler ran and failed.
    #[error("external call '{name}' failed: {reason}")]
    Failed {
        /// The handler that failed.
        name: ExternalCallName,
        /// Failure description.
        reason: String,
    },
}

impl ExternalCallError {
    /// Creates a failure for a named handler.
    #[must_use]
    pub fn failed(name: ExternalCallName, reason: impl Into<String>) -> Self {
        Self::Failed {
            name,
            reason: reason.into(),
        }
    }
}

/// Port invoking a registered external handler by name.
#[async_trait]
pub trait ExternalCallPort: Send + Sync {
    /// Invokes the named handler with rendered arguments and returns its
    /// result value.
    ///
    /// # Errors
    ///
    /// Returns `ExternalCallError` for unknown handlers or handler
    /// failures.
    async fn call(
        &self,
        name: &ExternalCallName,
        arguments: &BTreeMap<String, Value>,
    ) -> ExternalCallResult<Value>;
}
