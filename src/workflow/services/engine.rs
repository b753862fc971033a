//! The workflow execution engine.
//!
//! Owns the definition registry and the bounded execution history, runs
//! steps sequentially, and dispatches actions to the collaborator ports.
//!
//! Execution semantics:
//!
//! - Conditions are evaluated against the *current* (possibly mutated)
//!   context; a failing condition skips the step and iteration continues.
//! - A failing action marks the execution `Failed` immediately; later
//!   steps do not run, and side effects already committed by earlier
//!   steps are **not** rolled back (no compensation).
//! - Execution is at-most-once per call; retries are the caller's
//!   responsibility.
//! - `Wait` suspends via a timer; no worker thread is held for the
//!   duration, and a configured deadline caps the wait.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, RwLock};

use chrono::{DateTime, Utc};
use mockable::Clock;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::workflow::domain::{
    Action, ExecutionContext, ExecutionRecord, ExecutionStatus, HistoryStats, WorkflowDefinition,
    WorkflowError, WorkflowId, WorkflowResult, all_hold,
};
use crate::workflow::ports::{
    ExternalCallError, ExternalCallPort, Notifier, NotifierError, RecipientError,
    RecipientResolver, RecordRepository, RepositoryError,
};

/// Maximum number of execution records retained; the oldest is evicted
/// first.
pub const HISTORY_CAPACITY: usize = 100;

/// Failure of one dispatched action.
///
/// An action error halts the owning execution and is recorded on its
/// [`ExecutionRecord`]; it never crosses the `execute` boundary as an
/// `Err`.
#[derive(Debug, Clone, Error)]
pub enum ActionError {
    /// The repository collaborator failed.
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// The notifier collaborator failed.
    #[error(transparent)]
    Notification(#[from] NotifierError),

    /// Recipient resolution failed.
    #[error(transparent)]
    Recipients(#[from] RecipientError),

    /// The external call collaborator failed.
    #[error(transparent)]
    External(#[from] ExternalCallError),
}

/// Signal returned by a dispatched step.
enum StepSignal {
    /// The action completed.
    Done,

    /// The execution deadline was reached mid-wait.
    DeadlineReached,
}

/// Step-based workflow executor.
///
/// Definitions are registered once at process start and are immutable
/// afterwards; the registry is safe for concurrent reads. Each `execute`
/// call owns its context, so concurrent executions of the same definition
/// never observe each other's mutations.
///
/// # Example
///
/// ```ignore
/// use barragan::workflow::services::WorkflowEngine;
///
/// let engine = WorkflowEngine::new(repository, notifier, recipients, external, clock);
/// engine.register(definition)?;
/// let record = engine.execute(&workflow_id, seed_context).await?;
/// assert!(record.is_completed());
/// ```
pub struct WorkflowEngine<R, N, V, X, C>
where
    R: RecordRepository,
    N: Notifier,
    V: RecipientResolver,
    X: ExternalCallPort,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    notifier: Arc<N>,
    recipients: Arc<V>,
    external: Arc<X>,
    clock: Arc<C>,
    definitions: RwLock<HashMap<WorkflowId, Arc<WorkflowDefinition>>>,
    history: Mutex<VecDeque<ExecutionRecord>>,
}

impl<R, N, V, X, C> WorkflowEngine<R, N, V, X, C>
where
    R: RecordRepository,
    N: Notifier,
    V: RecipientResolver,
    X: ExternalCallPort,
    C: Clock + Send + Sync,
{
    /// Creates an engine with an empty registry.
    pub fn new(
        repository: Arc<R>,
        notifier: Arc<N>,
        recipients: Arc<V>,
        external: Arc<X>,
        clock: Arc<C>,
    ) -> Self {
        Self {
            repository,
            notifier,
            recipients,
            external,
            clock,
            definitions: RwLock::new(HashMap::new()),
            history: Mutex::new(VecDeque::new()),
        }
    }

    /// Registers a workflow definition.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::DuplicateWorkflow`] if the identifier is
    /// already registered.
    pub fn register(&self, definition: WorkflowDefinition) -> WorkflowResult<()> {
        let workflow_id = definition.id.clone();
        let mut guard = self
            .definitions
            .write()
            .map_err(|e| WorkflowError::RegistryUnavailable(e.to_string()))?;

        if guard.contains_key(&workflow_id) {
            return Err(WorkflowError::DuplicateWorkflow(workflow_id));
        }

        info!(
            workflow = %workflow_id,
            steps = definition.steps.len(),
            "workflow registered",
        );
        guard.insert(workflow_id, Arc::new(definition));
        Ok(())
    }

    /// Returns `true` if a definition is registered under the identifier.
    #[must_use]
    pub fn is_registered(&self, workflow_id: &WorkflowId) -> bool {
        self.definitions
            .read()
            .map(|guard| guard.contains_key(workflow_id))
            .unwrap_or(false)
    }

    /// Executes a registered workflow against a caller-seeded context.
    ///
    /// The returned record is terminal: `Completed` when every step ran or
    /// was skipped, `Failed` when an action failed (later steps do not
    /// run; earlier side effects remain committed).
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::UnknownWorkflow`] if no definition is
    /// registered under the identifier.
    pub async fn execute(
        &self,
        workflow_id: &WorkflowId,
        initial_context: ExecutionContext,
    ) -> WorkflowResult<ExecutionRecord> {
        self.execute_with_deadline(workflow_id, initial_context, None)
            .await
    }

    /// Executes a registered workflow with a hard deadline.
    ///
    /// The deadline is checked before each step, and a `Wait` never
    /// sleeps past it. Deadline exhaustion yields a terminal `Cancelled`
    /// record, not an `Err`.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::UnknownWorkflow`] if no definition is
    /// registered under the identifier.
    pub async fn execute_with_deadline(
        &self,
        workflow_id: &WorkflowId,
        initial_context: ExecutionContext,
        deadline: Option<DateTime<Utc>>,
    ) -> WorkflowResult<ExecutionRecord> {
        let definition = self.definition(workflow_id)?;

        let mut record =
            ExecutionRecord::started(workflow_id.clone(), initial_context, self.clock.utc());
        record.status = ExecutionStatus::InProgress;
        info!(
            workflow = %workflow_id,
            execution = %record.execution_id,
            "workflow execution started",
        );

        let mut outcome = ExecutionStatus::Completed;
        for step in definition.steps() {
            if self.deadline_reached(deadline) {
                outcome = ExecutionStatus::Cancelled;
                record.error = Some("execution deadline exceeded".to_owned());
                break;
            }

            if !all_hold(&step.conditions, &record.context) {
                record.steps_skipped += 1;
                debug!(
                    workflow = %workflow_id,
                    step = %step.name,
                    "step skipped: conditions not met",
                );
                continue;
            }

            match self.dispatch(&step.action, &mut record.context, deadline).await {
                Ok(StepSignal::Done) => record.steps_executed += 1,
                Ok(StepSignal::DeadlineReached) => {
                    outcome = ExecutionStatus::Cancelled;
                    record.error = Some("execution deadline exceeded".to_owned());
                    break;
                }
                Err(err) => {
                    outcome = ExecutionStatus::Failed;
                    record.error = Some(err.to_string());
                    error!(
                        workflow = %workflow_id,
                        step = %step.name,
                        error = %err,
                        "workflow step failed; halting execution",
                    );
                    break;
                }
            }
        }

        record.finish(outcome, self.clock.utc());
        info!(
            workflow = %workflow_id,
            execution = %record.execution_id,
            status = %record.status,
            executed = record.steps_executed,
            skipped = record.steps_skipped,
            "workflow execution finished",
        );
        self.push_history(record.clone());
        Ok(record)
    }

    /// Returns a snapshot of the retained execution history, oldest first.
    #[must_use]
    pub fn history(&self) -> Vec<ExecutionRecord> {
        self.history
            .lock()
            .map(|guard| guard.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Returns aggregate counts over the retained history.
    #[must_use]
    pub fn history_stats(&self) -> HistoryStats {
        let mut stats = HistoryStats::default();
        for record in self.history() {
            stats.total += 1;
            match record.status {
                ExecutionStatus::Completed => stats.completed += 1,
                ExecutionStatus::Failed => stats.failed += 1,
                ExecutionStatus::Cancelled => stats.cancelled += 1,
                ExecutionStatus::Pending | ExecutionStatus::InProgress => {}
            }
        }
        stats
    }

    fn definition(&self, workflow_id: &WorkflowId) -> WorkflowResult<Arc<WorkflowDefinition>> {
        let guard = self
            .definitions
            .read()
            .map_err(|e| WorkflowError::RegistryUnavailable(e.to_string()))?;

        guard
            .get(workflow_id)
            .cloned()
            .ok_or_else(|| WorkflowError::UnknownWorkflow(workflow_id.clone()))
    }

    fn deadline_reached(&self, deadline: Option<DateTime<Utc>>) -> bool {
        deadline.is_some_and(|at| self.clock.utc() >= at)
    }

    async fn dispatch(
        &self,
        action: &Action,
        context: &mut ExecutionContext,
        deadline: Option<DateTime<Utc>>,
    ) -> Result<StepSignal, ActionError> {
        match action {
            Action::Notify {
                recipients,
                title,
                body,
                channel,
            } => {
                let resolved = self.recipients.resolve(recipients).await?;
                let rendered_title = context.render(title);
                let rendered_body = context.render(body);
                self.notifier
                    .send(&resolved, &rendered_title, &rendered_body, *channel)
                    .await?;
            }

            Action::CreateRecord { model, fields } => {
                let rendered = context.render_fields(fields);
                let record_id = self.repository.create(model, &rendered).await?;
                context.insert(model.id_key(), record_id);
            }

            Action::UpdateRecord {
                model,
                record_id,
                fields,
            } => {
                let resolved_id = context.render(record_id);
                let rendered = context.render_fields(fields);
                self.repository.update(model, &resolved_id, &rendered).await?;
            }

            Action::CallExternal { name, arguments } => {
                let rendered = context.render_fields(arguments);
                let result = self.external.call(name, &rendered).await?;
                context.insert(format!("{name}_result"), result);
            }

            Action::Wait { duration } => {
                return Ok(self.wait(*duration, deadline).await);
            }
        }

        Ok(StepSignal::Done)
    }

    /// Timer-based suspension, capped by the execution deadline.
    async fn wait(
        &self,
        duration: std::time::Duration,
        deadline: Option<DateTime<Utc>>,
    ) -> StepSignal {
        let Some(at) = deadline else {
            tokio::time::sleep(duration).await;
            return StepSignal::Done;
        };

        let remaining = (at - self.clock.utc())
            .to_std()
            .unwrap_or(std::time::Duration::ZERO);
        if duration <= remaining {
            tokio::time::sleep(duration).await;
            StepSignal::Done
        } else {
            tokio::time::sleep(remaining).await;
            StepSignal::DeadlineReached
        }
    }

    fn push_history(&self, record: ExecutionRecord) {
        match self.history.lock() {
            Ok(mut guard) => {
                if guard.len() >= HISTORY_CAPACITY {
                    guard.pop_front();
                }
                guard.push_back(record);
            }
            Err(e) => warn!(error = %e, "execution history unavailable; record dropped"),
        }
    }
}
