//! Integration tests for automation-type routing.

use crate::in_memory::helpers::Stack;
use barragan::workflow::domain::{
    Action, AutomationType, ExecutionStatus, ModelName, Step, WorkflowDefinition, WorkflowId,
};
use barragan::workflow::services::{AutomationError, AutomationRule};
use serde_json::json;
use std::collections::BTreeMap;

fn register_move_in_workflow(stack: &Stack) {
    let mut fields = BTreeMap::new();
    fields.insert("unit".to_owned(), json!("{unit}"));
    fields.insert("resident".to_owned(), json!("{resident_name}"));
    fields.insert("status".to_owned(), json!("scheduled"));

    let definition = WorkflowDefinition::new(WorkflowId::new("move_in_checklist"), "Move-in")
        .with_step(Step::new(
            "create_checklist",
            Action::CreateRecord {
                model: ModelName::new("move_in"),
                fields,
            },
        ));
    stack
        .engine
        .register(definition)
        .expect("workflow registration succeeds");
}

#[tokio::test]
async fn automation_event_routes_into_its_workflow() -> eyre::Result<()> {
    let stack = Stack::new();
    register_move_in_workflow(&stack);

    let automation = stack.automation();
    automation.register(
        AutomationRule::new(
            AutomationType::new("resident_move_in"),
            WorkflowId::new("move_in_checklist"),
        )
        .with_seed("resident_name", "{{ payload.resident.name }}"),
    )?;

    let record = automation
        .execute(
            &AutomationType::new("resident_move_in"),
            json!({"unit": "7C", "resident": {"name": "Carmen Ruiz"}}),
        )
        .await?;

    assert_eq!(record.status, ExecutionStatus::Completed);
    let stored = stack.repository.records_for(&ModelName::new("move_in"));
    assert_eq!(stored.len(), 1);
    assert_eq!(
        stored.first().and_then(|r| r.fields.get("resident").cloned()),
        Some(json!("Carmen Ruiz")),
    );
    assert_eq!(
        stored.first().and_then(|r| r.fields.get("unit").cloned()),
        Some(json!("7C")),
    );
    Ok(())
}

#[tokio::test]
async fn unknown_automation_type_is_a_typed_error_not_a_panic() {
    let stack = Stack::new();
    let automation = stack.automation();

    let result = automation
        .execute(&AutomationType::new("nonexistent"), json!({}))
        .await;

    assert!(matches!(
        result,
        Err(AutomationError::UnknownAutomationType(_)),
    ));
}

#[tokio::test]
async fn automation_pointing_at_a_missing_workflow_surfaces_the_engine_error() {
    let stack = Stack::new();
    let automation = stack.automation();
    automation
        .register(AutomationRule::new(
            AutomationType::new("orphan_event"),
            WorkflowId::new("never_registered"),
        ))
        .expect("rule registration succeeds");

    let result = automation
        .execute(&AutomationType::new("orphan_event"), json!({}))
        .await;
    assert!(matches!(result, Err(AutomationError::Workflow(_))));
}
