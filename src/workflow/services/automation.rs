//! Automation routing: external event types mapped onto workflows.
//!
//! Hosts register an [`AutomationRule`] per automation type; an incoming
//! event renders the rule's seed context from its payload and delegates to
//! the engine. Unknown types are a typed error, never a panic.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use minijinja::Environment;
use mockable::Clock;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::info;

use crate::workflow::domain::{
    AutomationType, ExecutionContext, ExecutionRecord, WorkflowError, WorkflowId,
};
use crate::workflow::ports::{ExternalCallPort, Notifier, RecipientResolver, RecordRepository};
use crate::workflow::services::WorkflowEngine;

/// Result type for automation operations.
pub type AutomationResult<T> = Result<T, AutomationError>;

/// Errors surfaced by the automation manager.
#[derive(Debug, Clone, Error)]
pub enum AutomationError {
    /// A rule with this automation type is already registered.
    #[error("automation type '{0}' is already registered")]
    DuplicateAutomation(AutomationType),

    /// No rule is registered under this automation type.
    #[error("unknown automation type: '{0}'")]
    UnknownAutomationType(AutomationType),

    /// A seed template failed to render against the event payload.
    #[error("seed template for '{key}' failed to render: {reason}")]
    Template {
        /// The seed key whose template failed.
        key: String,
        /// Render failure description.
        reason: String,
    },

    /// The delegated workflow execution failed to start.
    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    /// The rule registry lock was poisoned by a panicking thread.
    #[error("automation registry unavailable: {0}")]
    RegistryUnavailable(String),
}

/// Mapping from an automation type to a target workflow with a seed
/// context.
///
/// Seed values are either literals or `minijinja` templates rendered
/// against the triggering payload (available as `payload`, with object
/// entries also exposed at the top level).
#[derive(Debug, Clone, PartialEq)]
pub struct AutomationRule {
    /// External event category this rule answers.
    pub automation_type: AutomationType,

    /// Workflow executed for matching events.
    pub workflow: WorkflowId,

    /// Static or templated initial context entries.
    pub seed: BTreeMap<String, Value>,
}

impl AutomationRule {
    /// Creates a rule with an empty seed.
    #[must_use]
    pub const fn new(automation_type: AutomationType, workflow: WorkflowId) -> Self {
        Self {
            automation_type,
            workflow,
            seed: BTreeMap::new(),
        }
    }

    /// Adds a seed entry (literal value or template string).
    #[must_use]
    pub fn with_seed(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.seed.insert(key.into(), value.into());
        self
    }
}

/// Facade mapping external automation-type events onto registered
/// workflows.
pub struct AutomationManager<R, N, V, X, C>
where
    R: RecordRepository,
    N: Notifier,
    V: RecipientResolver,
    X: ExternalCallPort,
    C: Clock + Send + Sync,
{
    engine: Arc<WorkflowEngine<R, N, V, X, C>>,
    rules: RwLock<HashMap<AutomationType, AutomationRule>>,
}

impl<R, N, V, X, C> AutomationManager<R, N, V, X, C>
where
    R: RecordRepository,
    N: Notifier,
    V: RecipientResolver,
    X: ExternalCallPort,
    C: Clock + Send + Sync,
{
    /// Creates a manager with no registered rules.
    pub fn new(engine: Arc<WorkflowEngine<R, N, V, X, C>>) -> Self {
        Self {
            engine,
            rules: RwLock::new(HashMap::new()),
        }
    }

    /// Registers an automation rule.
    ///
    /// # Errors
    ///
    /// Returns [`AutomationError::DuplicateAutomation`] if the type is
    /// already registered.
    pub fn register(&self, rule: AutomationRule) -> AutomationResult<()> {
        let automation_type = rule.automation_type.clone();
        let mut guard = self
            .rules
            .write()
            .map_err(|e| AutomationError::RegistryUnavailable(e.to_string()))?;

        if guard.contains_key(&automation_type) {
            return Err(AutomationError::DuplicateAutomation(automation_type));
        }

        info!(
            automation_type = %automation_type,
            workflow = %rule.workflow,
            "automation registered",
        );
        guard.insert(automation_type, rule);
        Ok(())
    }

    /// Returns `true` if a rule is registered under the automation type.
    #[must_use]
    pub fn is_registered(&self, automation_type: &AutomationType) -> bool {
        self.rules
            .read()
            .map(|guard| guard.contains_key(automation_type))
            .unwrap_or(false)
    }

    /// Handles an external event: renders the seed context from the
    /// payload and delegates to the engine.
    ///
    /// # Errors
    ///
    /// Returns [`AutomationError::UnknownAutomationType`] for unregistered
    /// types — a typed result, never an unhandled panic — and propagates
    /// seed-template and engine registry failures.
    pub async fn execute(
        &self,
        automation_type: &AutomationType,
        payload: Value,
    ) -> AutomationResult<ExecutionRecord> {
        let rule = {
            let guard = self
                .rules
                .read()
                .map_err(|e| AutomationError::RegistryUnavailable(e.to_string()))?;
            guard
                .get(automation_type)
                .cloned()
                .ok_or_else(|| AutomationError::UnknownAutomationType(automation_type.clone()))?
        };

        let context = render_seed(&rule, &payload)?;
        let record = self.engine.execute(&rule.workflow, context).await?;
        Ok(record)
    }
}

/// Builds the initial execution context for a rule: payload object entries
/// first, then rendered seed entries (seeds win on key collisions).
fn render_seed(rule: &AutomationRule, payload: &Value) -> AutomationResult<ExecutionContext> {
    let mut context = ExecutionContext::new();
    if let Value::Object(entries) = payload {
        for (key, value) in entries {
            context.insert(key.clone(), value.clone());
        }
    }

    let environment = Environment::new();
    let template_context = build_template_context(payload);
    for (key, value) in &rule.seed {
        let rendered = match value {
            Value::String(template) => {
                let text = environment
                    .render_str(template, &template_context)
                    .map_err(|error| AutomationError::Template {
                        key: key.clone(),
                        reason: error.to_string(),
                    })?;
                Value::String(text)
            }
            other => other.clone(),
        };
        context.insert(key.clone(), rendered);
    }

    Ok(context)
}

fn build_template_context(payload: &Value) -> Map<String, Value> {
    let mut context = Map::new();
    context.insert("payload".to_owned(), payload.clone());
    if let Value::Object(entries) = payload {
        for (key, value) in entries {
            context.insert(key.clone(), value.clone());
        }
    }
    context
}
