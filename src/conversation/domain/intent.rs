//! The classified purpose of a single chat message.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::task::TaskKind;

/// Intent assigned to one inbound message by the classifier collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// Immediate danger; overrides any task in progress.
    Emergency,

    /// Start (or continue toward) a maintenance request.
    MaintenanceRequest,

    /// Start a visit-scheduling task.
    VisitSchedule,

    /// Start an amenity-reservation task.
    ReservationBook,

    /// Anything else: small talk, questions, unclassified text.
    General,
}

impl Intent {
    /// Maps task intents to their task kind.
    #[must_use]
    pub const fn task_kind(&self) -> Option<TaskKind> {
        match self {
            Self::MaintenanceRequest => Some(TaskKind::MaintenanceRequest),
            Self::VisitSchedule => Some(TaskKind::VisitSchedule),
            Self::ReservationBook => Some(TaskKind::ReservationBook),
            Self::Emergency | Self::General => None,
        }
    }

    /// Returns the intent as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Emergency => "emergency",
            Self::MaintenanceRequest => "maintenance_request",
            Self::VisitSchedule => "visit_schedule",
            Self::ReservationBook => "reservation_book",
            Self::General => "general",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
