//! Domain types for the workflow subsystem.
//!
//! This module contains pure domain types with no infrastructure
//! dependencies. All types are serialisable via serde; definitions are
//! immutable once registered with the engine.

mod condition;
mod context;
mod error;
mod execution;
mod ids;
mod step;


pub use condition::{Condition, ConditionOperator, ParseConditionOperatorError, all_hold};
pub use context::{ExecutionContext, display_value};
pub use error::{WorkflowError, WorkflowResult};
pub use execution::{ExecutionRecord, ExecutionStatus, HistoryStats, ParseExecutionStatusError};
pub use ids::{AutomationType, ExecutionId, ExternalCallName, ModelName, WorkflowId};
pub use step::{
    Action, NotificationChannel, ParseNotificationChannelError, RecipientSelector, Step,
    WorkflowDefinition,
};
