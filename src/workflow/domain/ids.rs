//! Domain identifier newtypes for the workflow subsystem.
//!
//! Registry keys (workflow ids, automation types, model names, external
//! call names) are caller-chosen strings wrapped in distinct newtypes so
//! they cannot be mixed accidentally; execution identifiers wrap UUIDs.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier of a registered workflow definition.
///
/// # Examples
///
/// ```
/// use barragan::workflow::domain::WorkflowId;
///
/// let id = WorkflowId::new("maintenance_intake");
/// assert_eq!(id.as_str(), "maintenance_intake");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkflowId(String);

impl WorkflowId {
    /// Creates a workflow identifier from a registry key.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkflowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for WorkflowId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// External event category mapped to a target workflow.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AutomationType(String);

impl AutomationType {
    /// Creates an automation type key.
    #[must_use]
    pub fn new(automation_type: impl Into<String>) -> Self {
        Self(automation_type.into())
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AutomationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AutomationType {
    fn from(automation_type: &str) -> Self {
        Self::new(automation_type)
    }
}

/// Name of a record model understood by the repository collaborator.
///
/// Successful `CreateRecord` actions write the created identifier back into
/// the execution context under `"{model}_id"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelName(String);

impl ModelName {
    /// Creates a model name.
    #[must_use]
    pub fn new(model: impl Into<String>) -> Self {
        Self(model.into())
    }

    /// Returns the model name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the context key that receives the created record identifier.
    #[must_use]
    pub fn id_key(&self) -> String {
        format!("{}_id", self.0)
    }
}

impl fmt::Display for ModelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ModelName {
    fn from(model: &str) -> Self {
        Self::new(model)
    }
}

/// Name of a registered external call handler.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExternalCallName(String);

impl ExternalCallName {
    /// Creates an external call name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExternalCallName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ExternalCallName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Unique identifier of one workflow execution.
///
/// # Examples
///
/// ```
/// use barragan::workflow::domain::ExecutionId;
///
/// let id = ExecutionId::new();
/// assert!(!id.as_ref().is_nil());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionId(Uuid);

impl ExecutionId {
    /// Creates a new random execution identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an execution identifier from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID value.
    #[must_use]
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for ExecutionId {
    fn default() -> Self {
        Self::new()
    }
}

impl AsRef<Uuid> for ExecutionId {
    fn as_ref(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for ExecutionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
