//! Task flows: multi-turn structured data collection.
//!
//! A task definition is an ordered sequence of named steps. Each step's
//! handler validates one user message, writes into the task's partial
//! data, and either advances, loops back, re-prompts, or commits through
//! the workflow engine.

use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::workflow::domain::{ExecutionContext, WorkflowId};

/// Kind of a multi-turn task a session can execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// Report a maintenance problem.
    MaintenanceRequest,

    /// Register an upcoming visit.
    VisitSchedule,

    /// Reserve a shared amenity.
    ReservationBook,
}

impl TaskKind {
    /// Returns the registry key for this kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::MaintenanceRequest => "maintenance_request",
            Self::VisitSchedule => "visit_schedule",
            Self::ReservationBook => "reservation_book",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Name of one step within a task flow.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskStepName(String);

impl TaskStepName {
    /// Creates a step name.
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

impl fmt::Display for TaskStepName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TaskStepName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Where the session goes after a step handler ran.
#[derive(Debug, Clone, PartialEq)]
pub enum StepTransition {
    /// Input was invalid; stay on the current step and re-prompt.
    Stay,

    /// Advance to the named step; the session remains in task execution.
    Next(TaskStepName),

    /// Loop back to an earlier named step (declined confirmation); the
    /// session remains in task execution.
    Restart(TaskStepName),

    /// Terminal: run the workflow with the collected context, clear the
    /// task, and return the session to conversation.
    Commit {
        /// Workflow executed at commit time.
        workflow: WorkflowId,
        /// Context seeded from the collected task data.
        context: ExecutionContext,
    },
}

/// Reply text plus the resulting transition for one handled message.
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    /// Reply shown to the user. Commit replies may reference keys of the
    /// final execution context (for example a created record id).
    pub reply: String,

    /// Transition applied to the session.
    pub transition: StepTransition,
}

impl StepOutcome {
    /// Re-prompt on the current step.
    #[must_use]
    pub fn stay(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            transition: StepTransition::Stay,
        }
    }

    /// Advance to the next step.
    #[must_use]
    pub fn next(reply: impl Into<String>, step: TaskStepName) -> Self {
        Self {
            reply: reply.into(),
            transition: StepTransition::Next(step),
        }
    }

    /// Loop back to an earlier step.
    #[must_use]
    pub fn restart(reply: impl Into<String>, step: TaskStepName) -> Self {
        Self {
            reply: reply.into(),
            transition: StepTransition::Restart(step),
        }
    }

    /// Commit through the workflow engine.
    #[must_use]
    pub fn commit(reply: impl Into<String>, workflow: WorkflowId, context: ExecutionContext) -> Self {
        Self {
            reply: reply.into(),
            transition: StepTransition::Commit { workflow, context },
        }
    }
}

/// Errors a task flow can report.
#[derive(Debug, Clone, Error)]
pub enum TaskFlowError {
    /// No handler exists for the `(kind, step)` pair. This is a
    /// configuration bug: the state machine logs it and fails closed by
    /// resetting the session to conversation.
    #[error("no handler for step '{step}' of task '{kind}'")]
    HandlerMismatch {
        /// The task kind being executed.
        kind: TaskKind,
        /// The step name with no handler.
        step: TaskStepName,
    },
}

/// A registered multi-turn task definition.
///
/// Implementations are pure input handling: they validate one message,
/// mutate the partial data map, and describe the transition. Side effects
/// happen only at commit time, through the workflow engine.
pub trait TaskFlow: Send + Sync {
    /// The task kind this flow implements.
    fn kind(&self) -> TaskKind;

    /// The step the task starts on.
    fn first_step(&self) -> TaskStepName;

    /// The prompt shown when the task begins.
    fn opening_prompt(&self) -> String;

    /// Handles one user message on the given step.
    ///
    /// # Errors
    ///
    /// Returns [`TaskFlowError::HandlerMismatch`] when the step name is
    /// not part of this flow.
    fn handle(
        &self,
        step: &TaskStepName,
        input: &str,
        data: &mut BTreeMap<String, Value>,
    ) -> Result<StepOutcome, TaskFlowError>;
}
