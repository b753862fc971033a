//! Integration tests for workflow execution semantics.

use crate::in_memory::helpers::Stack;
use barragan::workflow::domain::{
    Action, Condition, ConditionOperator, ExecutionContext, ExecutionStatus, ModelName,
    NotificationChannel, RecipientSelector, Step, WorkflowDefinition, WorkflowError, WorkflowId,
};
use serde_json::json;
use std::collections::BTreeMap;

fn escalation_definition() -> WorkflowDefinition {
    let mut fields = BTreeMap::new();
    fields.insert("summary".to_owned(), json!("{summary}"));
    fields.insert("unit".to_owned(), json!("{unit}"));
    fields.insert("status".to_owned(), json!("open"));

    WorkflowDefinition::new(WorkflowId::new("incident_escalation"), "Incident escalation")
        .with_step(Step::new(
            "create_incident",
            Action::CreateRecord {
                model: ModelName::new("incident"),
                fields,
            },
        ))
        .with_step(
            Step::new(
                "notify_security",
                Action::Notify {
                    recipients: RecipientSelector::role("security_staff"),
                    title: "Incidente en {unit}".to_owned(),
                    body: "{summary} (folio {incident_id})".to_owned(),
                    channel: NotificationChannel::Sms,
                },
            )
            .with_condition(Condition::new("severity", ConditionOperator::Equals, "critical")),
        )
}

#[tokio::test]
async fn placeholders_resolve_against_the_live_context() -> eyre::Result<()> {
    let stack = Stack::new();
    stack.engine.register(escalation_definition())?;

    let record = stack
        .engine
        .execute(
            &WorkflowId::new("incident_escalation"),
            ExecutionContext::new()
                .with("summary", "Cristal estrellado")
                .with("unit", "Torre B 4B")
                .with("severity", "critical"),
        )
        .await?;

    assert_eq!(record.status, ExecutionStatus::Completed);
    assert_eq!(record.steps_executed, 2);

    let sent = stack.notifier.sent();
    let notification = sent.first().expect("notification sent");
    assert_eq!(notification.title, "Incidente en Torre B 4B");
    assert!(notification.body.starts_with("Cristal estrellado (folio "));
    assert!(!notification.body.contains("{incident_id}"));
    Ok(())
}

#[tokio::test]
async fn absent_condition_field_skips_but_reaches_a_terminal_state() -> eyre::Result<()> {
    let stack = Stack::new();
    stack.engine.register(escalation_definition())?;

    // No "severity" in the context: the notify step is skipped, the
    // workflow still terminates as completed.
    let record = stack
        .engine
        .execute(
            &WorkflowId::new("incident_escalation"),
            ExecutionContext::new()
                .with("summary", "Lámpara fundida")
                .with("unit", "Pasillo 2"),
        )
        .await?;

    assert!(record.status.is_terminal());
    assert_eq!(record.status, ExecutionStatus::Completed);
    assert_eq!(record.steps_executed, 1);
    assert_eq!(record.steps_skipped, 1);
    assert!(stack.notifier.is_empty());
    Ok(())
}

#[tokio::test]
async fn duplicate_registration_and_unknown_execution_are_typed_errors() {
    let stack = Stack::new();
    stack
        .engine
        .register(escalation_definition())
        .expect("first registration succeeds");

    let duplicate = stack.engine.register(escalation_definition());
    assert!(matches!(duplicate, Err(WorkflowError::DuplicateWorkflow(_))));

    let unknown = stack
        .engine
        .execute(&WorkflowId::new("missing"), ExecutionContext::new())
        .await;
    assert!(matches!(unknown, Err(WorkflowError::UnknownWorkflow(_))));
}

#[tokio::test]
async fn update_after_create_reuses_the_written_record_id() -> eyre::Result<()> {
    let stack = Stack::new();

    let mut create_fields = BTreeMap::new();
    create_fields.insert("status".to_owned(), json!("open"));
    let mut update_fields = BTreeMap::new();
    update_fields.insert("status".to_owned(), json!("assigned"));

    let definition = WorkflowDefinition::new(WorkflowId::new("assign"), "Assign on intake")
        .with_step(Step::new(
            "create_ticket",
            Action::CreateRecord {
                model: ModelName::new("ticket"),
                fields: create_fields,
            },
        ))
        .with_step(Step::new(
            "mark_assigned",
            Action::UpdateRecord {
                model: ModelName::new("ticket"),
                record_id: "{ticket_id}".to_owned(),
                fields: update_fields,
            },
        ));
    stack.engine.register(definition)?;

    let record = stack
        .engine
        .execute(&WorkflowId::new("assign"), ExecutionContext::new())
        .await?;
    assert_eq!(record.status, ExecutionStatus::Completed);

    let stored = stack.repository.records_for(&ModelName::new("ticket"));
    assert_eq!(stored.len(), 1);
    assert_eq!(
        stored.first().and_then(|r| r.fields.get("status").cloned()),
        Some(json!("assigned")),
    );
    Ok(())
}

#[tokio::test]
async fn history_records_every_execution_with_final_status() -> eyre::Result<()> {
    let stack = Stack::new();
    stack.engine.register(escalation_definition())?;

    for _ in 0..3 {
        stack
            .engine
            .execute(
                &WorkflowId::new("incident_escalation"),
                ExecutionContext::new().with("summary", "x").with("unit", "y"),
            )
            .await?;
    }

    let history = stack.engine.history();
    // The built-in task workflows are registered but unexecuted; only
    // our three runs appear.
    assert_eq!(history.len(), 3);
    assert!(history.iter().all(|record| record.status.is_terminal()));

    let stats = stack.engine.history_stats();
    assert_eq!(stats.total, 3);
    assert_eq!(stats.completed, 3);
    Ok(())
}
