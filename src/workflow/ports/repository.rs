//! Repository port for record persistence.
//!
//! Defines the abstract interface the engine uses to create and update
//! records, allowing different persistence implementations (relational,
//! in-memory, etc.). Persistence internals are outside this crate.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

use crate::workflow::domain::ModelName;

/// Result type for repository operations.
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Errors that can occur during record persistence.
#[derive(Debug, Clone, Error)]
pub enum RepositoryError {
    /// The model name is not known to the backing store.
    #[error("unknown model: '{0}'")]
    ModelNotFound(ModelName),

    /// No record exists under the given identifier.
    #[error("record '{record_id}' not found for model '{model}'")]
    RecordNotFound {
        /// The model that was queried.
        model: ModelName,
        /// The identifier that did not resolve.
        record_id: String,
    },

    /// The backing store failed.
    #[error("storage backend error: {0}")]
    Backend(Arc<dyn std::error::Error + Send + Sync>),

    /// A field map could not be serialised for storage.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl RepositoryError {
    /// Creates a backend error from any error type.
    #[must_use]
    pub fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Backend(Arc::new(err))
    }

    /// Creates a serialization error.
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization(message.into())
    }
}

/// Port for record persistence operations.
///
/// Implementations provide the actual storage mechanism while the engine
/// remains storage-agnostic.
///
/// # Implementation Notes
///
/// Implementations must ensure:
/// - Created record identifiers are unique per model
/// - `update` never creates records implicitly
/// - Concurrent access is handled safely
#[async_trait]
pub trait RecordRepository: Send + Sync {
    /// Creates a record and returns its identifier.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the model is unknown or the backing
    /// store fails.
    async fn create(
        &self,
        model: &ModelName,
        fields: &BTreeMap<String, Value>,
    ) -> RepositoryResult<String>;

    /// Updates fields of an existing record.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the model or record is unknown or the
    /// backing store fails.
    async fn update(
        &self,
        model: &ModelName,
        record_id: &str,
        fields: &BTreeMap<String, Value>,
    ) -> RepositoryResult<()>;
}
