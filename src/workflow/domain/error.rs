//! Domain error types for workflow registration and execution.
//!
//! Uses `thiserror` for typed variants that can be inspected by callers.
//! Action failures are not represented here: a failing action marks its
//! execution record `Failed` rather than turning the `execute` call into
//! an `Err`.

use thiserror::Error;

use super::ids::WorkflowId;

/// Result type for workflow registry and execution operations.
pub type WorkflowResult<T> = Result<T, WorkflowError>;

/// Errors surfaced by the workflow engine itself.
#[derive(Debug, Clone, Error)]
pub enum WorkflowError {
    /// A definition with this identifier is already registered.
    #[error("workflow '{0}' is already registered")]
    DuplicateWorkflow(WorkflowId),

    /// No definition is registered under this identifier.
    #[error("unknown workflow: '{0}'")]
    UnknownWorkflow(WorkflowId),

    /// The registry or history lock was poisoned by a panicking thread.
    #[error("workflow registry unavailable: {0}")]
    RegistryUnavailable(String),
}
