//! Workflow definitions, steps, and the closed action vocabulary.
//!
//! Actions are a tagged enum rather than string-dispatched kinds, so the
//! engine's dispatch match is exhaustive and unknown kinds cannot exist
//! past deserialisation.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use super::condition::Condition;
use super::ids::{ExternalCallName, ModelName, WorkflowId};

/// Notification recipients: an explicit list or a named role group
/// resolved through the recipient-resolver collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecipientSelector {
    /// Explicit recipient addresses.
    Direct(Vec<String>),

    /// Named role group (for example `"maintenance_staff"`).
    Role(String),
}

impl RecipientSelector {
    /// Creates a direct selector from recipient addresses.
    #[must_use]
    pub fn direct(recipients: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self::Direct(recipients.into_iter().map(Into::into).collect())
    }

    /// Creates a role-group selector.
    #[must_use]
    pub fn role(role: impl Into<String>) -> Self {
        Self::Role(role.into())
    }
}

/// Delivery channel for notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationChannel {
    /// Electronic mail.
    Email,

    /// Short message service.
    Sms,

    /// Mobile push notification.
    Push,

    /// `WhatsApp` message.
    Whatsapp,
}

impl NotificationChannel {
    /// Returns the channel as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Sms => "sms",
            Self::Push => "push",
            Self::Whatsapp => "whatsapp",
        }
    }
}

impl fmt::Display for NotificationChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when parsing an invalid channel string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseNotificationChannelError(String);

impl fmt::Display for ParseNotificationChannelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid notification channel: '{}'", self.0)
    }
}

impl std::error::Error for ParseNotificationChannelError {}

impl TryFrom<&str> for NotificationChannel {
    type Error = ParseNotificationChannelError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "email" => Ok(Self::Email),
            "sms" => Ok(Self::Sms),
            "push" => Ok(Self::Push),
            "whatsapp" => Ok(Self::Whatsapp),
            _ => Err(ParseNotificationChannelError(s.to_owned())),
        }
    }
}

/// One side-effecting operation kind.
///
/// String parameter values may embed `{key}` references into the current
/// execution context; they are rendered at dispatch time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Sends a notification through the notifier collaborator.
    Notify {
        /// Who receives the notification.
        recipients: RecipientSelector,
        /// Notification title (placeholder-rendered).
        title: String,
        /// Notification body (placeholder-rendered).
        body: String,
        /// Delivery channel.
        channel: NotificationChannel,
    },

    /// Creates a record through the repository collaborator.
    ///
    /// On success the created identifier is written back into the context
    /// under `"{model}_id"`.
    CreateRecord {
        /// Target record model.
        model: ModelName,
        /// Field map (placeholder-rendered).
        fields: BTreeMap<String, Value>,
    },

    /// Updates an existing record through the repository collaborator.
    UpdateRecord {
        /// Target record model.
        model: ModelName,
        /// Record identifier (placeholder-rendered).
        record_id: String,
        /// Field map (placeholder-rendered).
        fields: BTreeMap<String, Value>,
    },

    /// Invokes a registered external call by name; best-effort, a failure
    /// fails the step like any other action.
    CallExternal {
        /// Registered handler name.
        name: ExternalCallName,
        /// Argument map (placeholder-rendered).
        arguments: BTreeMap<String, Value>,
    },

    /// Suspends step progression for a duration.
    ///
    /// Waits are timer continuations: the executing task yields, no worker
    /// thread is held for the duration.
    Wait {
        /// How long to suspend.
        duration: Duration,
    },
}

/// One conditional action within a workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// Step name, used in logs and skip accounting.
    pub name: String,

    /// The action dispatched when all conditions hold.
    pub action: Action,

    /// Conditions with AND semantics; an empty list always passes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

impl Step {
    /// Creates an unconditional step.
    #[must_use]
    pub fn new(name: impl Into<String>, action: Action) -> Self {
        Self {
            name: name.into(),
            action,
            conditions: Vec::new(),
        }
    }

    /// Adds a condition to the step.
    #[must_use]
    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }
}

/// A named, ordered sequence of steps. Immutable once registered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    /// Registry identifier.
    pub id: WorkflowId,

    /// Human-readable name.
    pub name: String,

    /// Ordered steps.
    pub steps: Vec<Step>,
}

impl WorkflowDefinition {
    /// Creates an empty definition.
    #[must_use]
    pub fn new(id: WorkflowId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            steps: Vec::new(),
        }
    }

    /// Appends a step.
    #[must_use]
    pub fn with_step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    /// Returns the ordered steps.
    #[must_use]
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }
}
