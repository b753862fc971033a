//! Shared test helpers for the in-memory integration suites.

use std::sync::{Arc, RwLock};

use barragan::conversation::adapters::memory::{InMemorySessionStore, KeywordIntentClassifier};
use barragan::conversation::services::{ConversationService, TaskRegistry, default_task_workflows};
use barragan::scheduler::adapters::memory::StaticMetricsSource;
use barragan::scheduler::services::Scheduler;
use barragan::workflow::adapters::memory::{
    InMemoryExternalCalls, InMemoryRecordRepository, RecordingNotifier, StaticRecipientResolver,
};
use barragan::workflow::services::{AutomationManager, WorkflowEngine};
use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;

/// Deterministic clock advanced explicitly by tests.
#[derive(Debug, Clone)]
pub struct ManualClock(Arc<RwLock<DateTime<Utc>>>);

impl ManualClock {
    /// Creates a clock frozen at the current wall time.
    #[must_use]
    pub fn start() -> Self {
        Self(Arc::new(RwLock::new(Utc::now())))
    }

    /// Moves the clock forward.
    pub fn advance(&self, delta: TimeDelta) {
        if let Ok(mut guard) = self.0.write() {
            *guard = *guard + delta;
        }
    }
}

impl Clock for ManualClock {
    fn local(&self) -> DateTime<chrono::Local> {
        self.utc().with_timezone(&chrono::Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.0.read().map(|guard| *guard).unwrap_or_else(|_| Utc::now())
    }
}

/// Engine wired to the in-memory adapters and a manual clock.
pub type MemoryEngine = WorkflowEngine<
    InMemoryRecordRepository,
    RecordingNotifier,
    StaticRecipientResolver,
    InMemoryExternalCalls,
    ManualClock,
>;

/// Scheduler over the in-memory stack.
pub type MemoryScheduler = Scheduler<
    InMemoryRecordRepository,
    RecordingNotifier,
    StaticRecipientResolver,
    InMemoryExternalCalls,
    ManualClock,
    StaticMetricsSource,
>;

/// Automation manager over the in-memory stack.
pub type MemoryAutomation = AutomationManager<
    InMemoryRecordRepository,
    RecordingNotifier,
    StaticRecipientResolver,
    InMemoryExternalCalls,
    ManualClock,
>;

/// Conversation service over the in-memory stack.
pub type MemoryConversation = ConversationService<
    KeywordIntentClassifier,
    InMemorySessionStore,
    InMemoryRecordRepository,
    RecordingNotifier,
    StaticRecipientResolver,
    InMemoryExternalCalls,
    ManualClock,
>;

/// The fully wired in-memory stack shared by the suites.
pub struct Stack {
    /// The workflow engine.
    pub engine: Arc<MemoryEngine>,
    /// Record repository adapter.
    pub repository: Arc<InMemoryRecordRepository>,
    /// Notification recorder.
    pub notifier: Arc<RecordingNotifier>,
    /// Metrics table driving threshold rules.
    pub metrics: Arc<StaticMetricsSource>,
    /// Session store mirror.
    pub store: Arc<InMemorySessionStore>,
    /// The manual clock shared by every component.
    pub clock: ManualClock,
}

impl Stack {
    /// Wires the in-memory stack and registers the built-in task
    /// workflows.
    #[must_use]
    pub fn new() -> Self {
        let clock = ManualClock::start();
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
            Arc::new(clock.clone()),
        ));

        for definition in default_task_workflows() {
            engine
                .register(definition)
                .expect("built-in workflow registration succeeds");
        }

        Self {
            engine,
            repository,
            notifier,
            metrics: Arc::new(StaticMetricsSource::new()),
            store: Arc::new(InMemorySessionStore::new()),
            clock,
        }
    }

    /// Builds a scheduler over this stack.
    #[must_use]
    pub fn scheduler(&self) -> Arc<MemoryScheduler> {
        Arc::new(Scheduler::new(
            Arc::clone(&self.engine),
            Arc::clone(&self.metrics),
            Arc::new(self.clock.clone()),
        ))
    }

    /// Builds an automation manager over this stack.
    #[must_use]
    pub fn automation(&self) -> MemoryAutomation {
        AutomationManager::new(Arc::clone(&self.engine))
    }

    /// Builds a conversation service over this stack.
    #[must_use]
    pub fn conversation(&self) -> MemoryConversation {
        ConversationService::new(
            Arc::new(KeywordIntentClassifier::new()),
            Arc::clone(&self.store),
            Arc::clone(&self.engine),
            TaskRegistry::with_default_flows(),
            Arc::new(self.clock.clone()),
        )
    }
}

impl Default for Stack {
    fn default() -> Self {
        Self::new()
    }
}
