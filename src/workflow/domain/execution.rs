//! Execution records and terminal status tracking.
//!
//! Every `execute` call produces one [`ExecutionRecord`], appended to the
//! engine's bounded in-memory history for later inspection. Records are
//! process-lifetime only; they are not durable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::context::ExecutionContext;
use super::ids::{ExecutionId, WorkflowId};

/// Terminal and transient states of one workflow execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    /// Created but not yet started.
    Pending,

    /// Steps are being executed.
    InProgress,

    /// All steps ran or were skipped; no action failed.
    Completed,

    /// An action failed; later steps did not run.
    Failed,

    /// The execution deadline was reached before completion.
    Cancelled,
}

impl ExecutionStatus {
    /// Returns `true` if this is a terminal state.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// Returns the status as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when parsing an invalid status string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseExecutionStatusError(String);

impl fmt::Display for ParseExecutionStatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid execution status: '{}'", self.0)
    }
}

impl std::error::Error for ParseExecutionStatusError {}

impl TryFrom<&str> for ExecutionStatus {
    type Error = ParseExecutionStatusError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "pending" => Ok(Self::Pending),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(ParseExecutionStatusError(s.to_owned())),
        }
    }
}

/// Outcome of one `execute` call: terminal status, timing, step accounting,
/// and the final context snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    /// Unique identifier of this execution.
    pub execution_id: ExecutionId,

    /// The workflow that was executed.
    pub workflow_id: WorkflowId,

    /// Terminal status (or the in-flight status while executing).
    pub status: ExecutionStatus,

    /// When the execution started.
    pub started_at: DateTime<Utc>,

    /// When the execution reached a terminal state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,

    /// Steps whose action ran successfully.
    pub steps_executed: u32,

    /// Steps skipped because a condition did not hold.
    pub steps_skipped: u32,

    /// Failure description when `status` is `Failed` or `Cancelled`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Final context snapshot.
    pub context: ExecutionContext,
}

impl ExecutionRecord {
    /// Creates a pending record for a starting execution.
    #[must_use]
    pub fn started(
        workflow_id: WorkflowId,
        context: ExecutionContext,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            execution_id: ExecutionId::new(),
            workflow_id,
            status: ExecutionStatus::Pending,
            started_at,
            finished_at: None,
            steps_executed: 0,
            steps_skipped: 0,
            error: None,
            context,
        }
    }

    /// Marks the record terminal with the given status.
    pub fn finish(&mut self, status: ExecutionStatus, finished_at: DateTime<Utc>) {
        self.status = status;
        self.finished_at = Some(finished_at);
    }

    /// Returns `true` if the execution completed without failure.
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        matches!(self.status, ExecutionStatus::Completed)
    }
}

/// Aggregate view over the engine's bounded execution history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryStats {
    /// Records currently retained.
    pub total: usize,

    /// Records that completed.
    pub completed: usize,

    /// Records that failed.
    pub failed: usize,

    /// Records cancelled by deadline.
    pub cancelled: usize,
}
