//! Tests for the conversational state machine.

use super::{ConversationService, TaskRegistry, default_task_workflows};
use crate::conversation::adapters::memory::{InMemorySessionStore, KeywordIntentClassifier};
use crate::conversation::domain::{
    ConversationError, MessageRole, SessionMode, StepOutcome, TaskFlow, TaskFlowError, TaskKind,
    TaskStepName, UserId,
};
use crate::workflow::adapters::memory::{
    InMemoryExternalCalls, InMemoryRecordRepository, RecordingNotifier, StaticRecipientResolver,
};
use crate::conversation::ports::store::SessionStore;
use crate::workflow::domain::ModelName;
use crate::workflow::services::WorkflowEngine;
use mockable::DefaultClock;
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::sync::Arc;

type MemoryEngine = WorkflowEngine<
    InMemoryRecordRepository,
    RecordingNotifier,
    StaticRecipientResolver,
    InMemoryExternalCalls,
    DefaultClock,
>;

type MemoryService = ConversationService<
    KeywordIntentClassifier,
    InMemorySessionStore,
    InMemoryRecordRepository,
    RecordingNotifier,
    StaticRecipientResolver,
    InMemoryExternalCalls,
    DefaultClock,
>;

struct ServiceHarness {
    service: MemoryService,
    repository: Arc<InMemoryRecordRepository>,
    notifier: Arc<RecordingNotifier>,
    store: Arc<InMemorySessionStore>,
    engine: Arc<MemoryEngine>,
}

fn create_engine() -> (Arc<MemoryEngine>, Arc<InMemoryRecordRepository>, Arc<RecordingNotifier>) {
    let repository = Arc::new(InMemoryRecordRepository::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let recipients = Arc::new(
        StaticRecipientResolver::new()
            .with_role("maintenance_staff", ["mantenimiento@edificio.mx"])
            .with_role("front_desk", ["porteria@edificio.mx"])
            .with_role("security_staff", ["vigilancia@edificio.mx"]),
    );
    let engine = Arc::new(WorkflowEngine::new(
        Arc::clone(&repository),
        Arc::clone(&notifier),
        recipients,
        Arc::new(InMemoryExternalCalls::new()),
        Arc::new(DefaultClock),
    ));
    (engine, repository, notifier)
}

fn create_service() -> ServiceHarness {
    let (engine, repository, notifier) = create_engine();
    for definition in default_task_workflows() {
        engine.register(definition).expect("workflow registration succeeds");
    }

    let store = Arc::new(InMemorySessionStore::new());
    let service = ConversationService::new(
        Arc::new(KeywordIntentClassifier::new()),
        Arc::clone(&store),
        Arc::clone(&engine),
        TaskRegistry::with_default_flows(),
        Arc::new(DefaultClock),
    );

    ServiceHarness {
        service,
        repository,
        notifier,
        store,
        engine,
    }
}

#[tokio::test]
async fn maintenance_flow_commits_with_high_priority() {
    let harness = create_service();
    let session_id = harness
        .service
        .start_session(UserId::new())
        .await
        .expect("session starts");

    let opening = harness
        .service
        .handle_message(session_id, "La puerta está rota")
        .await
        .expect("turn succeeds");
    assert_eq!(opening.mode, SessionMode::TaskExecution);

    harness
        .service
        .handle_message(session_id, "Puerta rota")
        .await
        .expect("turn succeeds");
    harness
        .service
        .handle_message(session_id, "Entrada principal")
        .await
        .expect("turn succeeds");
    let commit = harness
        .service
        .handle_message(session_id, "3")
        .await
        .expect("turn succeeds");

    assert_eq!(commit.mode, SessionMode::Conversational);
    let record = commit.execution.expect("commit ran a workflow");
    assert!(record.is_completed());

    // Exactly one CreateRecord, with priority mapped from "3" to "high".
    let stored = harness
        .repository
        .records_for(&ModelName::new("maintenance_request"));
    assert_eq!(stored.len(), 1);
    assert_eq!(
        stored.first().and_then(|r| r.fields.get("priority").cloned()),
        Some(json!("high")),
    );
    assert_eq!(
        stored.first().and_then(|r| r.fields.get("description").cloned()),
        Some(json!("Puerta rota")),
    );

    // High priority escalates to the staff notification step.
    assert_eq!(harness.notifier.len(), 1);

    let session = harness
        .service
        .session_snapshot(session_id)
        .await
        .expect("snapshot exists");
    assert!(session.active_task.is_none());
}

#[tokio::test]
async fn low_priority_maintenance_skips_the_staff_alert() {
    let harness = create_service();
    let session_id = harness
        .service
        .start_session(UserId::new())
        .await
        .expect("session starts");

    harness
        .service
        .handle_message(session_id, "el foco del pasillo está roto")
        .await
        .expect("turn succeeds");
    harness
        .service
        .handle_message(session_id, "Foco fundido")
        .await
        .expect("turn succeeds");
    harness
        .service
        .handle_message(session_id, "Pasillo del piso 2")
        .await
        .expect("turn succeeds");
    let commit = harness
        .service
        .handle_message(session_id, "1")
        .await
        .expect("turn succeeds");

    let record = commit.execution.expect("commit ran a workflow");
    assert!(record.is_completed());
    assert_eq!(record.steps_skipped, 1);
    assert!(harness.notifier.is_empty());
}

#[tokio::test]
async fn visit_confirmation_loop_restarts_then_commits() {
    let harness = create_service();
    let session_id = harness
        .service
        .start_session(UserId::new())
        .await
        .expect("session starts");

    harness
        .service
        .handle_message(session_id, "Quiero registrar una visita")
        .await
        .expect("turn succeeds");
    harness
        .service
        .handle_message(session_id, "Ana Torres")
        .await
        .expect("turn succeeds");
    harness
        .service
        .handle_message(session_id, "2026-03-14")
        .await
        .expect("turn succeeds");

    // Declining loops back to visitor collection, still in the task.
    let declined = harness
        .service
        .handle_message(session_id, "no")
        .await
        .expect("turn succeeds");
    assert_eq!(declined.mode, SessionMode::TaskExecution);

    let session = harness
        .service
        .session_snapshot(session_id)
        .await
        .expect("snapshot exists");
    assert_eq!(
        session.active_task.as_ref().map(|task| task.step.clone()),
        Some(TaskStepName::new("collect_visitor")),
    );

    // Collect again and confirm.
    harness
        .service
        .handle_message(session_id, "Luis Mendoza")
        .await
        .expect("turn succeeds");
    harness
        .service
        .handle_message(session_id, "2026-03-15")
        .await
        .expect("turn succeeds");
    let committed = harness
        .service
        .handle_message(session_id, "sí")
        .await
        .expect("turn succeeds");

    assert_eq!(committed.mode, SessionMode::Conversational);
    let stored = harness.repository.records_for(&ModelName::new("visit"));
    assert_eq!(stored.len(), 1);
    assert_eq!(
        stored.first().and_then(|r| r.fields.get("visitor_name").cloned()),
        Some(json!("Luis Mendoza")),
    );
}

#[tokio::test]
async fn emergency_mid_task_discards_the_task_and_switches_mode() {
    let harness = create_service();
    let session_id = harness
        .service
        .start_session(UserId::new())
        .await
        .expect("session starts");

    harness
        .service
        .handle_message(session_id, "la regadera gotea")
        .await
        .expect("turn succeeds");

    let emergency = harness
        .service
        .handle_message(session_id, "¡Hay un incendio en el edificio!")
        .await
        .expect("turn succeeds");
    assert_eq!(emergency.mode, SessionMode::EmergencyResponse);

    let session = harness
        .service
        .session_snapshot(session_id)
        .await
        .expect("snapshot exists");
    assert!(session.active_task.is_none());

    // The emergency workflow notified security and logged an incident.
    let record = emergency.execution.expect("emergency workflow fired");
    assert!(record.is_completed());
    assert_eq!(
        harness.repository.records_for(&ModelName::new("incident")).len(),
        1,
    );
    assert_eq!(harness.notifier.len(), 1);

    // The following message returns the session to conversation.
    let follow_up = harness
        .service
        .handle_message(session_id, "gracias, ya están aquí")
        .await
        .expect("turn succeeds");
    assert_eq!(follow_up.mode, SessionMode::Conversational);
}

#[tokio::test]
async fn unknown_session_asks_for_a_new_one() {
    let harness = create_service();
    let err = harness
        .service
        .handle_message(crate::conversation::domain::SessionId::new(), "hola")
        .await
        .expect_err("unknown session fails");
    assert!(matches!(err, ConversationError::SessionNotFound(_)));
}

#[tokio::test]
async fn session_is_mirrored_after_both_history_entries() {
    let harness = create_service();
    let session_id = harness
        .service
        .start_session(UserId::new())
        .await
        .expect("session starts");

    harness
        .service
        .handle_message(session_id, "hola, buenos días")
        .await
        .expect("turn succeeds");

    let mirrored = harness
        .store
        .load(session_id)
        .await
        .expect("store reachable")
        .expect("session mirrored");
    assert_eq!(mirrored.history.len(), 2);
    assert_eq!(
        mirrored.history.last().map(|entry| entry.role),
        Some(MessageRole::Assistant),
    );
}

#[tokio::test]
async fn session_rehydrates_from_the_store_after_restart() {
    let harness = create_service();
    let session_id = harness
        .service
        .start_session(UserId::new())
        .await
        .expect("session starts");
    harness
        .service
        .handle_message(session_id, "Quiero registrar una visita")
        .await
        .expect("turn succeeds");

    // A new service over the same store and engine stands in for a
    // restarted process.
    let revived = ConversationService::new(
        Arc::new(KeywordIntentClassifier::new()),
        Arc::clone(&harness.store),
        Arc::clone(&harness.engine),
        TaskRegistry::with_default_flows(),
        Arc::new(DefaultClock),
    );

    let reply = revived
        .handle_message(session_id, "Ana Torres")
        .await
        .expect("rehydrated turn succeeds");
    assert_eq!(reply.mode, SessionMode::TaskExecution);

    let session = revived
        .session_snapshot(session_id)
        .await
        .expect("snapshot exists");
    assert!(session.history.len() >= 4);
    assert_eq!(
        session.active_task.as_ref().map(|task| task.step.clone()),
        Some(TaskStepName::new("collect_date")),
    );
}

#[tokio::test]
async fn ended_sessions_are_gone_from_map_and_store() {
    let harness = create_service();
    let session_id = harness
        .service
        .start_session(UserId::new())
        .await
        .expect("session starts");

    harness
        .service
        .end_session(session_id)
        .await
        .expect("end succeeds");

    let err = harness
        .service
        .handle_message(session_id, "hola")
        .await
        .expect_err("ended session is gone");
    assert!(matches!(err, ConversationError::SessionNotFound(_)));
    assert!(harness.store.is_empty());
}

/// Flow whose advertised first step has no handler: a configuration bug.
#[derive(Debug)]
struct BrokenFlow;

impl TaskFlow for BrokenFlow {
    fn kind(&self) -> TaskKind {
        TaskKind::MaintenanceRequest
    }

    fn first_step(&self) -> TaskStepName {
        TaskStepName::new("ghost_step")
    }

    fn opening_prompt(&self) -> String {
        "¿Qué problema encontraste?".to_owned()
    }

    fn handle(
        &self,
        step: &TaskStepName,
        _input: &str,
        _data: &mut BTreeMap<String, Value>,
    ) -> Result<StepOutcome, TaskFlowError> {
        Err(TaskFlowError::HandlerMismatch {
            kind: self.kind(),
            step: step.clone(),
        })
    }
}

#[tokio::test]
async fn handler_mismatch_fails_closed_with_an_apology() {
    let (engine, _repository, _notifier) = create_engine();
    let mut flows = TaskRegistry::new();
    flows.register(Arc::new(BrokenFlow));

    let service: ConversationService<_, _, _, _, _, _, _> = ConversationService::new(
        Arc::new(KeywordIntentClassifier::new()),
        Arc::new(InMemorySessionStore::new()),
        engine,
        flows,
        Arc::new(DefaultClock),
    );

    let session_id = service
        .start_session(UserId::new())
        .await
        .expect("session starts");
    service
        .handle_message(session_id, "La puerta está rota")
        .await
        .expect("task starts");

    let reply = service
        .handle_message(session_id, "Puerta rota")
        .await
        .expect("mismatch never propagates");
    assert_eq!(reply.mode, SessionMode::Conversational);
    assert!(reply.text.contains("Lo siento"));

    let session = service
        .session_snapshot(session_id)
        .await
        .expect("snapshot exists");
    assert!(session.active_task.is_none());
}

#[tokio::test]
async fn missing_commit_workflow_resets_instead_of_panicking() {
    // Engine with no registered workflows: the commit cannot start.
    let (engine, repository, _notifier) = create_engine();
    let service: ConversationService<_, _, _, _, _, _, _> = ConversationService::new(
        Arc::new(KeywordIntentClassifier::new()),
        Arc::new(InMemorySessionStore::new()),
        engine,
        TaskRegistry::with_default_flows(),
        Arc::new(DefaultClock),
    );

    let session_id = service
        .start_session(UserId::new())
        .await
        .expect("session starts");
    service
        .handle_message(session_id, "La puerta está rota")
        .await
        .expect("task starts");
    service
        .handle_message(session_id, "Puerta rota")
        .await
        .expect("turn succeeds");
    service
        .handle_message(session_id, "Entrada principal")
        .await
        .expect("turn succeeds");

    let reply = service
        .handle_message(session_id, "3")
        .await
        .expect("missing workflow never propagates");
    assert_eq!(reply.mode, SessionMode::Conversational);
    assert!(reply.execution.is_none());
    assert!(repository.is_empty());
}
