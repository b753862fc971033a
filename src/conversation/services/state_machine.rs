//! The conversational task state machine.
//!
//! One service instance owns the live session map. Turns within a session
//! are strictly sequential (per-session mutex); sessions never contend
//! with each other. After both the user message and the computed reply
//! are appended to history, the whole session is mirrored to the durable
//! store, so a process restart can rehydrate in-flight tasks.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use mockable::Clock;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::conversation::domain::{
    ConversationError, ConversationResult, ConversationSession, Intent, SessionId, SessionMode,
    StepTransition, UserId,
};
use crate::conversation::ports::{IntentClassifier, SessionStore};
use crate::conversation::services::flows::{TaskRegistry, emergency_workflow_id};
use crate::workflow::domain::{ExecutionContext, ExecutionRecord, WorkflowId};
use crate::workflow::ports::{ExternalCallPort, Notifier, RecipientResolver, RecordRepository};
use crate::workflow::services::WorkflowEngine;

const GENERAL_REPLY: &str = "Puedo ayudarte a reportar mantenimiento, programar visitas o \
                             reservar áreas comunes. ¿Qué necesitas?";

const EMERGENCY_REPLY: &str = "Entiendo, es una emergencia. Ya notifiqué al equipo de \
                               seguridad; mantente en un lugar seguro. Si hay riesgo para tu \
                               vida llama también al 911.";

const EMERGENCY_FOLLOW_UP: &str = "Gracias por el aviso. El equipo de seguridad está al \
                                   tanto. ¿Puedo ayudarte con algo más?";

const RESET_APOLOGY: &str = "Lo siento, algo salió mal con tu solicitud. ¿En qué más puedo \
                             ayudarte?";

const COMMIT_FAILED_REPLY: &str = "Lo siento, no pude completar el registro. Intenta de \
                                   nuevo más tarde.";

/// Reply produced by one turn.
#[derive(Debug, Clone)]
pub struct TurnReply {
    /// Text shown to the user.
    pub text: String,

    /// Session mode after the turn.
    pub mode: SessionMode,

    /// The workflow execution the turn triggered, if any (task commits
    /// and emergency alerts).
    pub execution: Option<ExecutionRecord>,
}

impl TurnReply {
    fn text_only(text: impl Into<String>, mode: SessionMode) -> Self {
        Self {
            text: text.into(),
            mode,
            execution: None,
        }
    }
}

/// Per-session conversational state machine.
///
/// Task flows and the engine's workflow registry are fixed at
/// construction; the session map is the only mutable state.
pub struct ConversationService<I, S, R, N, V, X, C>
where
    I: IntentClassifier,
    S: SessionStore,
    R: RecordRepository,
    N: Notifier,
    V: RecipientResolver,
    X: ExternalCallPort,
    C: Clock + Send + Sync,
{
    classifier: Arc<I>,
    store: Arc<S>,
    engine: Arc<WorkflowEngine<R, N, V, X, C>>,
    flows: TaskRegistry,
    clock: Arc<C>,
    sessions: RwLock<HashMap<SessionId, Arc<Mutex<ConversationSession>>>>,
}

impl<I, S, R, N, V, X, C> ConversationService<I, S, R, N, V, X, C>
where
    I: IntentClassifier,
    S: SessionStore,
    R: RecordRepository,
    N: Notifier,
    V: RecipientResolver,
    X: ExternalCallPort,
    C: Clock + Send + Sync,
{
    /// Creates a service over the given collaborators and task flows.
    pub fn new(
        classifier: Arc<I>,
        store: Arc<S>,
        engine: Arc<WorkflowEngine<R, N, V, X, C>>,
        flows: TaskRegistry,
        clock: Arc<C>,
    ) -> Self {
        Self {
            classifier,
            store,
            engine,
            flows,
            clock,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Starts a new session for a user and mirrors it to the store.
    ///
    /// # Errors
    ///
    /// Returns [`ConversationError::SessionsUnavailable`] when the session
    /// map is unreachable.
    pub async fn start_session(&self, user_id: UserId) -> ConversationResult<SessionId> {
        let session = ConversationSession::new(user_id, self.clock.as_ref());
        let session_id = session.session_id;

        if let Err(err) = self.store.save(&session).await {
            warn!(session = %session_id, error = %err, "session mirror failed at creation");
        }

        let mut guard = self
            .sessions
            .write()
            .map_err(|e| ConversationError::SessionsUnavailable(e.to_string()))?;
        guard.insert(session_id, Arc::new(Mutex::new(session)));

        info!(session = %session_id, user = %user_id, "session started");
        Ok(session_id)
    }

    /// Ends a session: removes it from the live map and the store.
    ///
    /// # Errors
    ///
    /// Returns [`ConversationError::Store`] when the store removal fails.
    pub async fn end_session(&self, session_id: SessionId) -> ConversationResult<()> {
        if let Ok(mut guard) = self.sessions.write() {
            guard.remove(&session_id);
        }
        self.store.remove(session_id).await?;
        info!(session = %session_id, "session ended");
        Ok(())
    }

    /// Returns a snapshot of a live or stored session.
    ///
    /// # Errors
    ///
    /// Returns [`ConversationError::SessionNotFound`] when the session is
    /// neither live nor stored.
    pub async fn session_snapshot(
        &self,
        session_id: SessionId,
    ) -> ConversationResult<ConversationSession> {
        let entry = self.session_entry(session_id).await?;
        let session = entry.lock().await;
        Ok(session.clone())
    }

    /// Handles one inbound message for a session and returns the reply.
    ///
    /// Turns within a session are serialised by a per-session lock; the
    /// session is mirrored to the store after both history entries were
    /// appended (mirror failure is logged, never fatal to the turn).
    ///
    /// # Errors
    ///
    /// Returns [`ConversationError::SessionNotFound`] for unknown
    /// sessions (callers should start a new one) and
    /// [`ConversationError::Classifier`] when intent classification
    /// fails.
    pub async fn handle_message(
        &self,
        session_id: SessionId,
        text: &str,
    ) -> ConversationResult<TurnReply> {
        let entry = self.session_entry(session_id).await?;
        let mut session = entry.lock().await;

        session.record_user(text, self.clock.as_ref());

        let reply = match session.mode {
            SessionMode::EmergencyResponse => {
                session.mode = SessionMode::Conversational;
                TurnReply::text_only(EMERGENCY_FOLLOW_UP, session.mode)
            }
            SessionMode::Conversational => self.handle_conversational(&mut session, text).await?,
            SessionMode::TaskExecution => self.handle_task_turn(&mut session, text).await?,
        };

        session.record_assistant(&reply.text, self.clock.as_ref());

        if let Err(err) = self.store.save(&session).await {
            warn!(session = %session_id, error = %err, "session mirror failed; turn kept in memory");
        }

        Ok(reply)
    }

    /// A message while no task is active: classify and route.
    async fn handle_conversational(
        &self,
        session: &mut ConversationSession,
        text: &str,
    ) -> ConversationResult<TurnReply> {
        let intent = self.classifier.classify(text).await?;

        if intent == Intent::Emergency {
            return Ok(self.enter_emergency(session, text).await);
        }

        let Some(kind) = intent.task_kind() else {
            return Ok(TurnReply::text_only(GENERAL_REPLY, session.mode));
        };

        let Some(flow) = self.flows.get(kind) else {
            error!(task = %kind, "intent maps to an unregistered task flow");
            return Ok(TurnReply::text_only(RESET_APOLOGY, session.mode));
        };

        session.begin_task(kind, flow.first_step());
        info!(
            session = %session.session_id,
            task = %kind,
            "task started",
        );
        Ok(TurnReply::text_only(flow.opening_prompt(), session.mode))
    }

    /// A message while a task is collecting data.
    async fn handle_task_turn(
        &self,
        session: &mut ConversationSession,
        text: &str,
    ) -> ConversationResult<TurnReply> {
        let intent = self.classifier.classify(text).await?;

        // Emergencies override the task unconditionally; the collected
        // data is discarded, not recoverable.
        if intent == Intent::Emergency {
            warn!(
                session = %session.session_id,
                "emergency override: active task discarded",
            );
            return Ok(self.enter_emergency(session, text).await);
        }

        let Some(mut task) = session.active_task.take() else {
            warn!(session = %session.session_id, "task mode without an active task; resetting");
            session.mode = SessionMode::Conversational;
            return Ok(TurnReply::text_only(RESET_APOLOGY, session.mode));
        };

        let Some(flow) = self.flows.get(task.kind) else {
            error!(
                session = %session.session_id,
                task = %task.kind,
                "no task flow registered; resetting session",
            );
            session.mode = SessionMode::Conversational;
            return Ok(TurnReply::text_only(RESET_APOLOGY, session.mode));
        };

        match flow.handle(&task.step, text, &mut task.data) {
            Err(err) => {
                // Configuration bug: fail closed, never propagate.
                error!(
                    session = %session.session_id,
                    error = %err,
                    "task handler mismatch; resetting session",
                );
                session.mode = SessionMode::Conversational;
                Ok(TurnReply::text_only(RESET_APOLOGY, session.mode))
            }

            Ok(outcome) => match outcome.transition {
                StepTransition::Stay => {
                    session.active_task = Some(task);
                    Ok(TurnReply::text_only(outcome.reply, session.mode))
                }

                StepTransition::Next(step) | StepTransition::Restart(step) => {
                    task.step = step;
                    session.active_task = Some(task);
                    Ok(TurnReply::text_only(outcome.reply, session.mode))
                }

                StepTransition::Commit { workflow, context } => {
                    let reply = outcome.reply;
                    self.commit_task(session, &workflow, context, &reply).await
                }
            },
        }
    }

    /// Runs the commit workflow and closes out the task.
    async fn commit_task(
        &self,
        session: &mut ConversationSession,
        workflow: &WorkflowId,
        context: ExecutionContext,
        reply_template: &str,
    ) -> ConversationResult<TurnReply> {
        let mut seed = context;
        seed.insert("user_id", session.user_id.to_string());
        seed.insert("session_id", session.session_id.to_string());

        session.clear_task();
        session.mode = SessionMode::Conversational;

        match self.engine.execute(workflow, seed).await {
            Ok(record) if record.is_completed() => {
                info!(
                    session = %session.session_id,
                    workflow = %workflow,
                    execution = %record.execution_id,
                    "task committed",
                );
                let text = record.context.render(reply_template);
                Ok(TurnReply {
                    text,
                    mode: session.mode,
                    execution: Some(record),
                })
            }

            Ok(record) => {
                warn!(
                    session = %session.session_id,
                    workflow = %workflow,
                    status = %record.status,
                    "task commit workflow did not complete",
                );
                Ok(TurnReply {
                    text: COMMIT_FAILED_REPLY.to_owned(),
                    mode: session.mode,
                    execution: Some(record),
                })
            }

            Err(err) => {
                // Unregistered commit workflow is a configuration bug.
                error!(
                    session = %session.session_id,
                    workflow = %workflow,
                    error = %err,
                    "task commit failed to start; resetting session",
                );
                Ok(TurnReply::text_only(RESET_APOLOGY, session.mode))
            }
        }
    }

    /// Switches the session into emergency response and fires the alert
    /// workflow (best-effort: a missing workflow never blocks the reply).
    async fn enter_emergency(
        &self,
        session: &mut ConversationSession,
        text: &str,
    ) -> TurnReply {
        session.clear_task();
        session.mode = SessionMode::EmergencyResponse;

        let context = ExecutionContext::new()
            .with("message", text)
            .with("user_id", session.user_id.to_string())
            .with("session_id", session.session_id.to_string());

        let execution = match self.engine.execute(&emergency_workflow_id(), context).await {
            Ok(record) => Some(record),
            Err(err) => {
                warn!(
                    session = %session.session_id,
                    error = %err,
                    "emergency workflow unavailable; replying without it",
                );
                None
            }
        };

        TurnReply {
            text: EMERGENCY_REPLY.to_owned(),
            mode: session.mode,
            execution,
        }
    }

    /// Finds a live session or rehydrates it from the store.
    async fn session_entry(
        &self,
        session_id: SessionId,
    ) -> ConversationResult<Arc<Mutex<ConversationSession>>> {
        {
            let guard = self
                .sessions
                .read()
                .map_err(|e| ConversationError::SessionsUnavailable(e.to_string()))?;
            if let Some(entry) = guard.get(&session_id) {
                return Ok(Arc::clone(entry));
            }
        }

        let stored = self.store.load(session_id).await?;
        let Some(session) = stored else {
            return Err(ConversationError::SessionNotFound(session_id));
        };

        info!(session = %session_id, "session rehydrated from store");
        let mut guard = self
            .sessions
            .write()
            .map_err(|e| ConversationError::SessionsUnavailable(e.to_string()))?;
        let entry = guard
            .entry(session_id)
            .or_insert_with(|| Arc::new(Mutex::new(session)));
        Ok(Arc::clone(entry))
    }
}
