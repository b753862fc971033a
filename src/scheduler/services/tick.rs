//! The clock-driven scheduler service.
//!
//! `tick()` is the unit of work: it fires due interval jobs into the
//! workflow engine and checks threshold rules against sampled metrics.
//! Due instants advance by whole periods from the scheduled time, never
//! from the observed `now`, so firing does not drift and a job fires at
//! most once per tick (an overdue job catches up across subsequent
//! ticks). Hosts either call `tick()` from their own loop or spawn the
//! built-in interval loop.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::scheduler::domain::{Alert, AlertId, IntervalJob, JobName, ThresholdRule};
use crate::scheduler::ports::MetricsSource;
use crate::workflow::domain::{ExecutionContext, ExecutionRecord, WorkflowId};
use crate::workflow::ports::{ExternalCallPort, Notifier, RecipientResolver, RecordRepository};
use crate::workflow::services::WorkflowEngine;

/// Result type for scheduler operations.
pub type SchedulerResult<T> = Result<T, SchedulerError>;

/// Errors surfaced by the scheduler.
#[derive(Debug, Clone, Error)]
pub enum SchedulerError {
    /// A job with this name is already registered.
    #[error("job '{0}' is already registered")]
    DuplicateJob(JobName),

    /// The job period cannot be represented on the clock timeline.
    #[error("job '{0}' has an invalid period")]
    InvalidPeriod(JobName),

    /// A threshold rule with the same alert identifier is already
    /// registered.
    #[error("threshold for alert '{0}' is already registered")]
    DuplicateThreshold(AlertId),

    /// No alert exists under this identifier.
    #[error("unknown alert: '{0}'")]
    UnknownAlert(AlertId),

    /// A scheduler lock was poisoned by a panicking thread.
    #[error("scheduler state unavailable: {0}")]
    StateUnavailable(String),
}

/// Outcome of one `tick()` call.
#[derive(Debug, Clone, Default)]
pub struct TickReport {
    /// Executions fired by due interval jobs.
    pub fired: Vec<ExecutionRecord>,

    /// Alerts raised by threshold breaches.
    pub alerts_raised: Vec<Alert>,

    /// Executions fired by critical-severity escalation.
    pub escalations: Vec<ExecutionRecord>,

    /// Non-fatal failures observed during the tick.
    pub errors: Vec<String>,
}

impl TickReport {
    /// Returns `true` if the tick fired nothing and raised nothing.
    #[must_use]
    pub fn is_quiet(&self) -> bool {
        self.fired.is_empty() && self.alerts_raised.is_empty() && self.escalations.is_empty()
    }
}

/// Bookkeeping for one registered interval job.
#[derive(Debug, Clone)]
struct JobState {
    job: IntervalJob,
    period: TimeDelta,
    next_due: DateTime<Utc>,
}

/// Fires time-based triggers into the workflow engine.
///
/// Job and threshold registration happens at process start; the alert map
/// is interior-mutable behind an [`RwLock`] and safe to share with
/// request handlers that resolve alerts.
pub struct Scheduler<R, N, V, X, C, M>
where
    R: RecordRepository,
    N: Notifier,
    V: RecipientResolver,
    X: ExternalCallPort,
    C: Clock + Send + Sync,
    M: MetricsSource,
{
    engine: Arc<WorkflowEngine<R, N, V, X, C>>,
    metrics: Arc<M>,
    clock: Arc<C>,
    jobs: RwLock<Vec<JobState>>,
    thresholds: RwLock<Vec<ThresholdRule>>,
    alerts: RwLock<HashMap<AlertId, Alert>>,
}

impl<R, N, V, X, C, M> Scheduler<R, N, V, X, C, M>
where
    R: RecordRepository,
    N: Notifier,
    V: RecipientResolver,
    X: ExternalCallPort,
    C: Clock + Send + Sync,
    M: MetricsSource,
{
    /// Creates a scheduler with no jobs or thresholds.
    pub fn new(
        engine: Arc<WorkflowEngine<R, N, V, X, C>>,
        metrics: Arc<M>,
        clock: Arc<C>,
    ) -> Self {
        Self {
            engine,
            metrics,
            clock,
            jobs: RwLock::new(Vec::new()),
            thresholds: RwLock::new(Vec::new()),
            alerts: RwLock::new(HashMap::new()),
        }
    }

    /// Registers an interval job; its first fire is due one period from
    /// now.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::DuplicateJob`] for a repeated name and
    /// [`SchedulerError::InvalidPeriod`] for a period outside the clock
    /// timeline.
    pub fn add_job(&self, job: IntervalJob) -> SchedulerResult<()> {
        let period = TimeDelta::from_std(job.period())
            .map_err(|_| SchedulerError::InvalidPeriod(job.name().clone()))?;

        let mut guard = self
            .jobs
            .write()
            .map_err(|e| SchedulerError::StateUnavailable(e.to_string()))?;

        if guard.iter().any(|state| state.job.name() == job.name()) {
            return Err(SchedulerError::DuplicateJob(job.name().clone()));
        }

        let next_due = self.clock.utc() + period;
        info!(
            job = %job.name(),
            workflow = %job.workflow(),
            period_secs = job.period().as_secs(),
            "interval job registered",
        );
        guard.push(JobState {
            job,
            period,
            next_due,
        });
        Ok(())
    }

    /// Registers a threshold rule.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::DuplicateThreshold`] when a rule with
    /// the same `(metric, category)` pair is already registered.
    pub fn add_threshold(&self, rule: ThresholdRule) -> SchedulerResult<()> {
        let mut guard = self
            .thresholds
            .write()
            .map_err(|e| SchedulerError::StateUnavailable(e.to_string()))?;

        if guard.iter().any(|existing| existing.alert_id() == rule.alert_id()) {
            return Err(SchedulerError::DuplicateThreshold(rule.alert_id()));
        }

        info!(
            metric = %rule.metric,
            category = %rule.category,
            threshold = rule.threshold,
            "threshold rule registered",
        );
        guard.push(rule);
        Ok(())
    }

    /// Runs one scheduling pass against the injected clock.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::StateUnavailable`] only when internal
    /// state is unreachable; job failures and sampling failures are
    /// reported in the [`TickReport`], never as an `Err`.
    pub async fn tick(&self) -> SchedulerResult<TickReport> {
        let now = self.clock.utc();
        let mut report = TickReport::default();

        for (name, workflow, context) in self.collect_due(now)? {
            match self.engine.execute(&workflow, context).await {
                Ok(record) => {
                    debug!(job = %name, workflow = %workflow, status = %record.status, "interval job fired");
                    report.fired.push(record);
                }
                Err(err) => {
                    error!(job = %name, error = %err, "interval job failed to execute");
                    report.errors.push(format!("job '{name}': {err}"));
                }
            }
        }

        self.check_thresholds(now, &mut report).await?;
        Ok(report)
    }

    /// Resolves an alert, clearing its deduplication gate.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::UnknownAlert`] if no alert exists under
    /// the identifier.
    pub fn resolve(&self, alert_id: &AlertId) -> SchedulerResult<()> {
        let mut guard = self
            .alerts
            .write()
            .map_err(|e| SchedulerError::StateUnavailable(e.to_string()))?;

        let alert = guard
            .get_mut(alert_id)
            .ok_or_else(|| SchedulerError::UnknownAlert(alert_id.clone()))?;

        alert.resolve(self.clock.utc());
        info!(alert = %alert_id, "alert resolved");
        Ok(())
    }

    /// Returns every alert the scheduler has raised, oldest first.
    #[must_use]
    pub fn alerts(&self) -> Vec<Alert> {
        let mut alerts: Vec<Alert> = self
            .alerts
            .read()
            .map(|guard| guard.values().cloned().collect())
            .unwrap_or_default();
        alerts.sort_by_key(|alert| alert.raised_at);
        alerts
    }

    /// Returns the alerts whose deduplication gate is still closed.
    #[must_use]
    pub fn unresolved_alerts(&self) -> Vec<Alert> {
        self.alerts()
            .into_iter()
            .filter(|alert| !alert.resolved)
            .collect()
    }

    /// Spawns the background tick loop.
    ///
    /// The loop runs until the returned handle is aborted. Deterministic
    /// tests should drive [`Self::tick`] directly instead.
    pub fn spawn(self: &Arc<Self>, every: std::time::Duration) -> tokio::task::JoinHandle<()>
    where
        R: 'static,
        N: 'static,
        V: 'static,
        X: 'static,
        C: 'static,
        M: 'static,
    {
        let scheduler = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match scheduler.tick().await {
                    Ok(report) if report.is_quiet() => {}
                    Ok(report) => debug!(
                        fired = report.fired.len(),
                        alerts = report.alerts_raised.len(),
                        "scheduler tick",
                    ),
                    Err(err) => error!(error = %err, "scheduler tick failed"),
                }
            }
        })
    }

    /// Collects due jobs and advances their due instants by one period.
    fn collect_due(
        &self,
        now: DateTime<Utc>,
    ) -> SchedulerResult<Vec<(JobName, WorkflowId, ExecutionContext)>> {
        let mut guard = self
            .jobs
            .write()
            .map_err(|e| SchedulerError::StateUnavailable(e.to_string()))?;

        let mut due = Vec::new();
        for state in guard.iter_mut() {
            if now >= state.next_due {
                due.push((
                    state.job.name().clone(),
                    state.job.workflow().clone(),
                    state.job.make_context(),
                ));
                state.next_due = state.next_due + state.period;
            }
        }
        Ok(due)
    }

    async fn check_thresholds(
        &self,
        now: DateTime<Utc>,
        report: &mut TickReport,
    ) -> SchedulerResult<()> {
        let rules: Vec<ThresholdRule> = {
            let guard = self
                .thresholds
                .read()
                .map_err(|e| SchedulerError::StateUnavailable(e.to_string()))?;
            guard.clone()
        };

        for rule in rules {
            let value = match self.metrics.sample(&rule.metric).await {
                Ok(value) => value,
                Err(err) => {
                    warn!(metric = %rule.metric, error = %err, "metric sample failed; rule skipped");
                    report.errors.push(format!("metric '{}': {err}", rule.metric));
                    continue;
                }
            };

            if value <= rule.threshold {
                continue;
            }

            if !self.raise_if_unguarded(&rule, value, now, report)? {
                continue;
            }

            if rule.severity.is_critical() {
                if let Some(workflow) = &rule.escalation {
                    match self.engine.execute(workflow, rule.alert_context(value)).await {
                        Ok(record) => report.escalations.push(record),
                        Err(err) => {
                            error!(workflow = %workflow, error = %err, "alert escalation failed");
                            report.errors.push(format!("escalation '{workflow}': {err}"));
                        }
                    }
                }
            }
        }

        Ok(())
    }

    /// Raises the rule's alert unless an unresolved one already exists.
    ///
    /// Returns `true` when a new alert was raised.
    fn raise_if_unguarded(
        &self,
        rule: &ThresholdRule,
        value: f64,
        now: DateTime<Utc>,
        report: &mut TickReport,
    ) -> SchedulerResult<bool> {
        let mut guard = self
            .alerts
            .write()
            .map_err(|e| SchedulerError::StateUnavailable(e.to_string()))?;

        let alert_id = rule.alert_id();
        if guard.get(&alert_id).is_some_and(|alert| !alert.resolved) {
            return Ok(false);
        }

        let alert = rule.raise(value, now);
        warn!(
            alert = %alert_id,
            severity = %alert.severity,
            value,
            "alert raised",
        );
        guard.insert(alert_id, alert.clone());
        report.alerts_raised.push(alert);
        Ok(true)
    }
}
