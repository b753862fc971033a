//! Tests for conversation session domain types.

use super::{ConversationSession, MessageRole, SessionMode, TaskKind, TaskStepName, UserId};
use mockable::DefaultClock;
use rstest::{fixture, rstest};

#[fixture]
fn clock() -> DefaultClock {
    DefaultClock
}

#[rstest]
fn new_session_is_conversational_with_no_task(clock: DefaultClock) {
    let session = ConversationSession::new(UserId::new(), &clock);

    assert_eq!(session.mode, SessionMode::Conversational);
    assert!(session.active_task.is_none());
    assert!(!session.is_in_task());
    assert!(session.history.is_empty());
    assert_eq!(session.started_at, session.last_activity_at);
}

#[rstest]
fn history_preserves_roles_and_order(clock: DefaultClock) {
    let mut session = ConversationSession::new(UserId::new(), &clock);
    session.record_user("Hola", &clock);
    session.record_assistant("Hola, ¿en qué puedo ayudarte?", &clock);
    session.record_user("Quiero reportar una fuga", &clock);

    let roles: Vec<MessageRole> = session.history.iter().map(|entry| entry.role).collect();
    assert_eq!(
        roles,
        vec![MessageRole::User, MessageRole::Assistant, MessageRole::User],
    );
    assert!(session.last_activity_at >= session.started_at);
}

#[rstest]
fn begin_task_enters_task_execution_at_the_first_step(clock: DefaultClock) {
    let mut session = ConversationSession::new(UserId::new(), &clock);
    session.begin_task(TaskKind::MaintenanceRequest, TaskStepName::new("describe_issue"));

    assert_eq!(session.mode, SessionMode::TaskExecution);
    assert!(session.is_in_task());
    let task = session.active_task.as_ref().map(|t| (t.kind, t.step.clone()));
    assert_eq!(
        task,
        Some((TaskKind::MaintenanceRequest, TaskStepName::new("describe_issue"))),
    );
}

#[rstest]
fn clear_task_drops_the_active_task(clock: DefaultClock) {
    let mut session = ConversationSession::new(UserId::new(), &clock);
    session.begin_task(TaskKind::VisitSchedule, TaskStepName::new("collect_visitor"));
    session.clear_task();

    assert!(session.active_task.is_none());
}

#[rstest]
fn mode_round_trips_through_strings() {
    for mode in [
        SessionMode::Conversational,
        SessionMode::TaskExecution,
        SessionMode::EmergencyResponse,
    ] {
        assert_eq!(SessionMode::try_from(mode.as_str()), Ok(mode));
    }
    assert!(SessionMode::try_from("afk").is_err());
}
