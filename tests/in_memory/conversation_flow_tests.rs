//! Integration tests for the conversational task flows.

use crate::in_memory::helpers::Stack;
use barragan::conversation::domain::{SessionMode, TaskStepName, UserId};
use barragan::workflow::domain::ModelName;
use serde_json::json;

#[tokio::test]
async fn maintenance_conversation_creates_one_high_priority_request() -> eyre::Result<()> {
    let stack = Stack::new();
    let conversation = stack.conversation();
    let session_id = conversation.start_session(UserId::new()).await?;

    conversation
        .handle_message(session_id, "Necesito reportar algo de mantenimiento")
        .await?;
    conversation.handle_message(session_id, "Puerta rota").await?;
    conversation
        .handle_message(session_id, "Entrada principal")
        .await?;
    let commit = conversation.handle_message(session_id, "3").await?;

    assert_eq!(commit.mode, SessionMode::Conversational);
    assert!(commit.text.contains("Folio"));

    let stored = stack
        .repository
        .records_for(&ModelName::new("maintenance_request"));
    assert_eq!(stored.len(), 1, "exactly one CreateRecord invocation");
    assert_eq!(
        stored.first().and_then(|r| r.fields.get("priority").cloned()),
        Some(json!("high")),
    );
    Ok(())
}

#[tokio::test]
async fn visit_denial_loops_while_staying_in_the_task() -> eyre::Result<()> {
    let stack = Stack::new();
    let conversation = stack.conversation();
    let session_id = conversation.start_session(UserId::new()).await?;

    conversation
        .handle_message(session_id, "Mañana llega un invitado")
        .await?;
    conversation.handle_message(session_id, "Ana Torres").await?;
    conversation.handle_message(session_id, "2026-03-14").await?;

    let declined = conversation.handle_message(session_id, "no").await?;
    assert_eq!(declined.mode, SessionMode::TaskExecution);

    let session = conversation.session_snapshot(session_id).await?;
    assert_eq!(
        session.active_task.as_ref().map(|task| task.step.clone()),
        Some(TaskStepName::new("collect_visitor")),
    );

    conversation.handle_message(session_id, "Ana Torres").await?;
    conversation.handle_message(session_id, "2026-03-14").await?;
    let committed = conversation.handle_message(session_id, "sí").await?;

    assert_eq!(committed.mode, SessionMode::Conversational);
    assert_eq!(stack.repository.records_for(&ModelName::new("visit")).len(), 1);
    Ok(())
}

#[tokio::test]
async fn emergency_overrides_an_active_task_and_then_recovers() -> eyre::Result<()> {
    let stack = Stack::new();
    let conversation = stack.conversation();
    let session_id = conversation.start_session(UserId::new()).await?;

    conversation
        .handle_message(session_id, "Quiero reservar el salón")
        .await?;
    let mid_task = conversation.session_snapshot(session_id).await?;
    assert!(mid_task.is_in_task());

    let emergency = conversation
        .handle_message(session_id, "¡Emergencia! Hay fuego en el estacionamiento")
        .await?;
    assert_eq!(emergency.mode, SessionMode::EmergencyResponse);

    let overridden = conversation.session_snapshot(session_id).await?;
    assert!(overridden.active_task.is_none(), "task data is discarded");

    // Security got the alert and an incident record exists.
    assert_eq!(stack.notifier.len(), 1);
    assert_eq!(stack.repository.records_for(&ModelName::new("incident")).len(), 1);

    let follow_up = conversation
        .handle_message(session_id, "ya está controlado")
        .await?;
    assert_eq!(follow_up.mode, SessionMode::Conversational);
    Ok(())
}

#[tokio::test]
async fn reservation_conversation_books_the_amenity() -> eyre::Result<()> {
    let stack = Stack::new();
    let conversation = stack.conversation();
    let session_id = conversation.start_session(UserId::new()).await?;

    conversation
        .handle_message(session_id, "Quiero reservar la alberca")
        .await?;
    conversation.handle_message(session_id, "alberca").await?;
    conversation.handle_message(session_id, "2026-05-01").await?;
    let commit = conversation.handle_message(session_id, "16:00").await?;

    assert_eq!(commit.mode, SessionMode::Conversational);
    let stored = stack.repository.records_for(&ModelName::new("reservation"));
    assert_eq!(stored.len(), 1);
    assert_eq!(
        stored.first().and_then(|r| r.fields.get("time_slot").cloned()),
        Some(json!("16:00")),
    );
    Ok(())
}

#[tokio::test]
async fn turns_within_a_session_serialise_under_concurrent_sends() -> eyre::Result<()> {
    let stack = Stack::new();
    let conversation = std::sync::Arc::new(stack.conversation());
    let session_id = conversation.start_session(UserId::new()).await?;

    // Two messages racing into the same session: the per-session lock
    // serialises them, so both turns land in history intact.
    let first = conversation.handle_message(session_id, "hola");
    let second = conversation.handle_message(session_id, "buenas tardes");
    let (first_reply, second_reply) = tokio::join!(first, second);
    first_reply?;
    second_reply?;

    let session = conversation.session_snapshot(session_id).await?;
    assert_eq!(session.history.len(), 4);
    Ok(())
}
