//! Alerts raised by threshold monitoring.
//!
//! An alert is raised when a sampled metric crosses its configured
//! threshold and no unresolved alert with the same identifier exists.
//! Resolution clears the deduplication gate so a later breach can
//! re-alert.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::AlertId;

/// Severity of an alert, ordered from informational to emergency.
///
/// Severities at or above [`AlertSeverity::Critical`] gate workflow
/// escalation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    /// Informational; no action expected.
    Info,

    /// Needs attention during business hours.
    Warning,

    /// Needs prompt action; escalates to a workflow when configured.
    Critical,

    /// Immediate danger; escalates to a workflow when configured.
    Emergency,
}

impl AlertSeverity {
    /// Returns `true` for severities that trigger workflow escalation.
    #[must_use]
    pub const fn is_critical(&self) -> bool {
        matches!(self, Self::Critical | Self::Emergency)
    }

    /// Returns the severity as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Critical => "critical",
            Self::Emergency => "emergency",
        }
    }
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when parsing an invalid severity string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseAlertSeverityError(String);

impl fmt::Display for ParseAlertSeverityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid alert severity: '{}'", self.0)
    }
}

impl std::error::Error for ParseAlertSeverityError {}

impl TryFrom<&str> for AlertSeverity {
    type Error = ParseAlertSeverityError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "info" => Ok(Self::Info),
            "warning" => Ok(Self::Warning),
            "critical" => Ok(Self::Critical),
            "emergency" => Ok(Self::Emergency),
            _ => Err(ParseAlertSeverityError(s.to_owned())),
        }
    }
}

/// One raised alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    /// Deduplication identifier.
    pub id: AlertId,

    /// Rendered title.
    pub title: String,

    /// Rendered message.
    pub message: String,

    /// Severity at raise time.
    pub severity: AlertSeverity,

    /// Category the originating rule monitors.
    pub category: String,

    /// Sampled value that crossed the threshold.
    pub metric_value: f64,

    /// Whether the alert has been resolved.
    pub resolved: bool,

    /// When the alert was raised.
    pub raised_at: DateTime<Utc>,

    /// When the alert was resolved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Alert {
    /// Marks the alert resolved, clearing the deduplication gate.
    pub fn resolve(&mut self, at: DateTime<Utc>) {
        self.resolved = true;
        self.resolved_at = Some(at);
    }
}
