//! Conversation sessions: mode, history, and the active task.
//!
//! A session is mutated only by the owning service, under a per-session
//! lock, so turns within one session are strictly sequential. At most one
//! task is active per session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

use super::ids::{SessionId, UserId};
use super::task::{TaskKind, TaskStepName};

/// Mode of a conversation session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    /// Free conversation; messages are classified for intent.
    Conversational,

    /// A task flow is collecting data; messages feed its current step.
    TaskExecution,

    /// An emergency was reported; the next message acknowledges follow-up.
    EmergencyResponse,
}

impl SessionMode {
    /// Returns the mode as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Conversational => "conversational",
            Self::TaskExecution => "task_execution",
            Self::EmergencyResponse => "emergency_response",
        }
    }
}

impl fmt::Display for SessionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when parsing an invalid mode string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseSessionModeError(String);

impl fmt::Display for ParseSessionModeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid session mode: '{}'", self.0)
    }
}

impl std::error::Error for ParseSessionModeError {}

impl TryFrom<&str> for SessionMode {
    type Error = ParseSessionModeError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "conversational" => Ok(Self::Conversational),
            "task_execution" => Ok(Self::TaskExecution),
            "emergency_response" => Ok(Self::EmergencyResponse),
            _ => Err(ParseSessionModeError(s.to_owned())),
        }
    }
}

/// Author of one conversation entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    /// The resident or visitor chatting with the system.
    User,

    /// The system's reply.
    Assistant,
}

/// One message in a session's ordered history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationEntry {
    /// Who authored the message.
    pub role: MessageRole,

    /// Message text.
    pub text: String,

    /// When the message was recorded.
    pub timestamp: DateTime<Utc>,
}

/// The in-progress multi-turn task of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveTask {
    /// Which task flow is running.
    pub kind: TaskKind,

    /// The step awaiting input.
    pub step: TaskStepName,

    /// Data collected so far.
    pub data: BTreeMap<String, Value>,
}

impl ActiveTask {
    /// Starts a task at its first step with no collected data.
    #[must_use]
    pub const fn new(kind: TaskKind, step: TaskStepName) -> Self {
        Self {
            kind,
            step,
            data: BTreeMap::new(),
        }
    }
}

/// One ongoing chat conversation's persistent state.
///
/// # Examples
///
/// ```
/// use barragan::conversation::domain::{ConversationSession, SessionMode, UserId};
/// use mockable::DefaultClock;
///
/// let clock = DefaultClock;
/// let session = ConversationSession::new(UserId::new(), &clock);
/// assert_eq!(session.mode, SessionMode::Conversational);
/// assert!(session.active_task.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationSession {
    /// Unique identifier of this session.
    pub session_id: SessionId,

    /// The user behind this session.
    pub user_id: UserId,

    /// Current mode.
    pub mode: SessionMode,

    /// Ordered conversation history.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<ConversationEntry>,

    /// The in-progress task, if any. At most one per session.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_task: Option<ActiveTask>,

    /// When the session started.
    pub started_at: DateTime<Utc>,

    /// When the last turn was recorded.
    pub last_activity_at: DateTime<Utc>,
}

impl ConversationSession {
    /// Creates a new conversational session.
    #[must_use]
    pub fn new(user_id: UserId, clock: &impl mockable::Clock) -> Self {
        let now = clock.utc();
        Self {
            session_id: SessionId::new(),
            user_id,
            mode: SessionMode::Conversational,
            history: Vec::new(),
            active_task: None,
            started_at: now,
            last_activity_at: now,
        }
    }

    /// Appends a user message to the history.
    pub fn record_user(&mut self, text: impl Into<String>, clock: &impl mockable::Clock) {
        self.push_entry(MessageRole::User, text.into(), clock.utc());
    }

    /// Appends an assistant reply to the history.
    pub fn record_assistant(&mut self, text: impl Into<String>, clock: &impl mockable::Clock) {
        self.push_entry(MessageRole::Assistant, text.into(), clock.utc());
    }

    /// Enters task execution at the flow's first step.
    pub fn begin_task(&mut self, kind: TaskKind, first_step: TaskStepName) {
        self.active_task = Some(ActiveTask::new(kind, first_step));
        self.mode = SessionMode::TaskExecution;
    }

    /// Drops the active task, if any.
    pub fn clear_task(&mut self) {
        self.active_task = None;
    }

    /// Returns `true` while a task is collecting data.
    #[must_use]
    pub const fn is_in_task(&self) -> bool {
        self.active_task.is_some()
    }

    fn push_entry(&mut self, role: MessageRole, text: String, at: DateTime<Utc>) {
        self.history.push(ConversationEntry {
            role,
            text,
            timestamp: at,
        });
        self.last_activity_at = at;
    }
}
