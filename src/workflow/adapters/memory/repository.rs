//! In-memory implementation of the [`RecordRepository`] port.
//!
//! Provides a simple, thread-safe repository for unit testing without
//! database dependencies.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use crate::workflow::domain::ModelName;
use crate::workflow::ports::repository::{RecordRepository, RepositoryError, RepositoryResult};

/// A record held by the in-memory repository.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    /// Identifier assigned at creation.
    pub record_id: String,

    /// Current field values.
    pub fields: BTreeMap<String, Value>,
}

/// In-memory implementation of [`RecordRepository`].
///
/// Thread-safe via internal [`RwLock`]. Any model name is accepted;
/// records are grouped per model and identifiers are random UUIDs.
#[derive(Debug, Default, Clone)]
pub struct InMemoryRecordRepository {
    records: Arc<RwLock<HashMap<String, Vec<StoredRecord>>>>,
}

impl InMemoryRecordRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the records stored under a model, in creation order.
    #[must_use]
    pub fn records_for(&self, model: &ModelName) -> Vec<StoredRecord> {
        self.records
            .read()
            .map(|guard| guard.get(model.as_str()).cloned().unwrap_or_default())
            .unwrap_or_default()
    }

    /// Returns the total number of stored records across models.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records
            .read()
            .map(|guard| guard.values().map(Vec::len).sum())
            .unwrap_or(0)
    }

    /// Returns `true` if no records are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl RecordRepository for InMemoryRecordRepository {
    async fn create(
        &self,
        model: &ModelName,
        fields: &BTreeMap<String, Value>,
    ) -> RepositoryResult<String> {
        let mut guard = self
            .records
            .write()
            .map_err(|e| RepositoryError::backend(std::io::Error::other(e.to_string())))?;

        let record_id = Uuid::new_v4().to_string();
        guard
            .entry(model.as_str().to_owned())
            .or_default()
            .push(StoredRecord {
                record_id: record_id.clone(),
                fields: fields.clone(),
            });

        Ok(record_id)
    }

    async fn update(
        &self,
        model: &ModelName,
        record_id: &str,
        fields: &BTreeMap<String, Value>,
    ) -> RepositoryResult<()> {
        let mut guard = self
            .records
            .write()
            .map_err(|e| RepositoryError::backend(std::io::Error::other(e.to_string())))?;

        let records = guard
            .get_mut(model.as_str())
            .ok_or_else(|| RepositoryError::ModelNotFound(model.clone()))?;

        let record = records
            .iter_mut()
            .find(|record| record.record_id == record_id)
            .ok_or_else(|| RepositoryError::RecordNotFound {
                model: model.clone(),
                record_id: record_id.to_owned(),
            })?;

        for (key, value) in fields {
            record.fields.insert(key.clone(), value.clone());
        }

        Ok(())
    }
}
