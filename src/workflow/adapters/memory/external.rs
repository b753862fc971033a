//! Canned-response implementation of the [`ExternalCallPort`] port.
//!
//! Hosts register a fixed result per call name; invocations are recorded
//! for assertions.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde_json::Value;

use crate::workflow::domain::ExternalCallName;
use crate::workflow::ports::external::{ExternalCallError, ExternalCallPort, ExternalCallResult};

/// In-memory implementation of [`ExternalCallPort`] with canned responses.
#[derive(Debug, Default, Clone)]
pub struct InMemoryExternalCalls {
    responses: HashMap<String, Value>,
    invocations: Arc<RwLock<Vec<(ExternalCallName, BTreeMap<String, Value>)>>>,
}

impl InMemoryExternalCalls {
    /// Creates an adapter with no registered calls.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a canned response for a call name.
    #[must_use]
    pub fn with_response(mut self, name: impl Into<String>, response: Value) -> Self {
        self.responses.insert(name.into(), response);
        self
    }

    /// Returns the recorded invocations, in call order.
    #[must_use]
    pub fn invocations(&self) -> Vec<(ExternalCallName, BTreeMap<String, Value>)> {
        self.invocations
            .read()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ExternalCallPort for InMemoryExternalCalls {
    async fn call(
        &self,
        name: &ExternalCallName,
        arguments: &BTreeMap<String, Value>,
    ) -> ExternalCallResult<Value> {
        let response = self
            .responses
            .get(name.as_str())
            .cloned()
            .ok_or_else(|| ExternalCallError::UnknownCall(name.clone()))?;

        if let Ok(mut guard) = self.invocations.write() {
            guard.push((name.clone(), arguments.clone()));
        }

        Ok(response)
    }
}
