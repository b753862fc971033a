//! Interval jobs and threshold rules.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use super::alert::{Alert, AlertSeverity};
use super::ids::{AlertId, JobName, MetricName};
use crate::workflow::domain::{ExecutionContext, WorkflowId};

/// A workflow fired every period.
///
/// The context factory builds a fresh seed context per fire; without one,
/// fires run with an empty context.
#[derive(Clone)]
pub struct IntervalJob {
    name: JobName,
    workflow: WorkflowId,
    period: Duration,
    context_factory: Option<Arc<dyn Fn() -> ExecutionContext + Send + Sync>>,
}

impl IntervalJob {
    /// Creates a job firing `workflow` every `period`.
    #[must_use]
    pub const fn new(name: JobName, workflow: WorkflowId, period: Duration) -> Self {
        Self {
            name,
            workflow,
            period,
            context_factory: None,
        }
    }

    /// Sets the per-fire context factory.
    #[must_use]
    pub fn with_context_factory(
        mut self,
        factory: impl Fn() -> ExecutionContext + Send + Sync + 'static,
    ) -> Self {
        self.context_factory = Some(Arc::new(factory));
        self
    }

    /// Returns the job name.
    #[must_use]
    pub const fn name(&self) -> &JobName {
        &self.name
    }

    /// Returns the workflow fired by this job.
    #[must_use]
    pub const fn workflow(&self) -> &WorkflowId {
        &self.workflow
    }

    /// Returns the firing period.
    #[must_use]
    pub const fn period(&self) -> Duration {
        self.period
    }

    /// Builds the seed context for one fire.
    #[must_use]
    pub fn make_context(&self) -> ExecutionContext {
        self.context_factory
            .as_ref()
            .map_or_else(ExecutionContext::new, |factory| factory())
    }
}

impl fmt::Debug for IntervalJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntervalJob")
            .field("name", &self.name)
            .field("workflow", &self.workflow)
            .field("period", &self.period)
            .field("has_context_factory", &self.context_factory.is_some())
            .finish()
    }
}

/// A metric threshold checked on every scheduler tick.
///
/// Title and message templates may reference `{metric}`, `{category}`,
/// `{value}`, `{threshold}`, and `{severity}`.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdRule {
    /// Metric sampled through the metrics-source collaborator.
    pub metric: MetricName,

    /// Category used for alert grouping and deduplication.
    pub category: String,

    /// Breach boundary: a sampled value strictly above raises the alert.
    pub threshold: f64,

    /// Severity of raised alerts.
    pub severity: AlertSeverity,

    /// Alert title template.
    pub title: String,

    /// Alert message template.
    pub message: String,

    /// Workflow executed when a raised alert is critical or worse.
    pub escalation: Option<WorkflowId>,
}

impl ThresholdRule {
    /// Creates a rule with default alert text.
    #[must_use]
    pub fn new(
        metric: MetricName,
        category: impl Into<String>,
        threshold: f64,
        severity: AlertSeverity,
    ) -> Self {
        Self {
            metric,
            category: category.into(),
            threshold,
            severity,
            title: "Umbral excedido: {metric}".to_owned(),
            message: "{metric} = {value} (límite {threshold}, categoría {category})".to_owned(),
            escalation: None,
        }
    }

    /// Overrides the alert title and message templates.
    #[must_use]
    pub fn with_alert_text(mut self, title: impl Into<String>, message: impl Into<String>) -> Self {
        self.title = title.into();
        self.message = message.into();
        self
    }

    /// Sets the escalation workflow for critical severities.
    #[must_use]
    pub fn with_escalation(mut self, workflow: WorkflowId) -> Self {
        self.escalation = Some(workflow);
        self
    }

    /// Returns the deduplication identifier for this rule's alerts.
    #[must_use]
    pub fn alert_id(&self) -> AlertId {
        AlertId::for_metric(&self.metric, &self.category)
    }

    /// Builds the render context shared by alert text and escalation
    /// workflows.
    #[must_use]
    pub fn alert_context(&self, value: f64) -> ExecutionContext {
        ExecutionContext::new()
            .with("metric", self.metric.as_str())
            .with("category", self.category.as_str())
            .with("value", value)
            .with("threshold", self.threshold)
            .with("severity", self.severity.as_str())
    }

    /// Raises an alert for a breaching sample.
    #[must_use]
    pub fn raise(&self, value: f64, at: DateTime<Utc>) -> Alert {
        let context = self.alert_context(value);
        Alert {
            id: self.alert_id(),
            title: context.render(&self.title),
            message: context.render(&self.message),
            severity: self.severity,
            category: self.category.clone(),
            metric_value: value,
            resolved: false,
            raised_at: at,
            resolved_at: None,
        }
    }
}
