//! Integration tests for deterministic scheduling and alert lifecycle.

use crate::in_memory::helpers::Stack;
use barragan::scheduler::domain::{AlertSeverity, IntervalJob, JobName, MetricName, ThresholdRule};
use barragan::workflow::domain::{
    Action, ExecutionContext, ModelName, NotificationChannel, RecipientSelector, Step,
    WorkflowDefinition, WorkflowId,
};
use chrono::TimeDelta;
use std::collections::BTreeMap;
use std::time::Duration;

fn register_digest_workflow(stack: &Stack) {
    let definition = WorkflowDefinition::new(WorkflowId::new("daily_digest"), "Daily digest")
        .with_step(Step::new(
            "store_digest",
            Action::CreateRecord {
                model: ModelName::new("digest"),
                fields: BTreeMap::new(),
            },
        ));
    stack
        .engine
        .register(definition)
        .expect("workflow registration succeeds");
}

fn register_escalation_workflow(stack: &Stack) {
    let definition =
        WorkflowDefinition::new(WorkflowId::new("security_escalation"), "Security escalation")
            .with_step(Step::new(
                "notify_security",
                Action::Notify {
                    recipients: RecipientSelector::role("security_staff"),
                    title: "Escalamiento: {metric}".to_owned(),
                    body: "Valor {value}, límite {threshold}".to_owned(),
                    channel: NotificationChannel::Sms,
                },
            ));
    stack
        .engine
        .register(definition)
        .expect("workflow registration succeeds");
}

#[tokio::test]
async fn a_period_advance_fires_the_job_exactly_once() -> eyre::Result<()> {
    let stack = Stack::new();
    register_digest_workflow(&stack);

    let scheduler = stack.scheduler();
    scheduler.add_job(
        IntervalJob::new(
            JobName::new("digest"),
            WorkflowId::new("daily_digest"),
            Duration::from_secs(86_400),
        )
        .with_context_factory(|| ExecutionContext::new().with("trigger", "interval")),
    )?;

    // Before the period elapses nothing fires.
    assert!(scheduler.tick().await?.fired.is_empty());

    // Advancing exactly one period fires exactly once.
    stack.clock.advance(TimeDelta::seconds(86_400));
    assert_eq!(scheduler.tick().await?.fired.len(), 1);
    assert!(scheduler.tick().await?.fired.is_empty());

    assert_eq!(stack.repository.records_for(&ModelName::new("digest")).len(), 1);
    Ok(())
}

#[tokio::test]
async fn alert_dedup_holds_until_resolution() -> eyre::Result<()> {
    let stack = Stack::new();
    let scheduler = stack.scheduler();

    let metric = MetricName::new("open_incidents");
    scheduler.add_threshold(ThresholdRule::new(
        metric.clone(),
        "operations",
        5.0,
        AlertSeverity::Warning,
    ))?;

    stack.metrics.set(&metric, 12.0);
    assert_eq!(scheduler.tick().await?.alerts_raised.len(), 1);
    assert!(scheduler.tick().await?.alerts_raised.is_empty());

    let alert_id = scheduler
        .unresolved_alerts()
        .first()
        .map(|alert| alert.id.clone())
        .expect("alert exists");
    scheduler.resolve(&alert_id)?;

    // The gate is open again: the ongoing breach re-alerts.
    assert_eq!(scheduler.tick().await?.alerts_raised.len(), 1);
    assert_eq!(scheduler.alerts().len(), 1);
    Ok(())
}

#[tokio::test]
async fn critical_breach_runs_the_escalation_workflow() -> eyre::Result<()> {
    let stack = Stack::new();
    register_escalation_workflow(&stack);
    let scheduler = stack.scheduler();

    let metric = MetricName::new("failed_logins");
    scheduler.add_threshold(
        ThresholdRule::new(metric.clone(), "security", 10.0, AlertSeverity::Critical)
            .with_escalation(WorkflowId::new("security_escalation")),
    )?;

    stack.metrics.set(&metric, 31.0);
    let report = scheduler.tick().await?;

    assert_eq!(report.alerts_raised.len(), 1);
    assert_eq!(report.escalations.len(), 1);

    let sent = stack.notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(
        sent.first().map(|n| n.title.clone()),
        Some("Escalamiento: failed_logins".to_owned()),
    );
    Ok(())
}

#[tokio::test]
async fn value_at_the_threshold_does_not_alert() -> eyre::Result<()> {
    let stack = Stack::new();
    let scheduler = stack.scheduler();

    let metric = MetricName::new("water_pressure");
    scheduler.add_threshold(ThresholdRule::new(
        metric.clone(),
        "infrastructure",
        80.0,
        AlertSeverity::Warning,
    ))?;

    stack.metrics.set(&metric, 80.0);
    let report = scheduler.tick().await?;
    assert!(report.alerts_raised.is_empty());
    assert!(scheduler.alerts().is_empty());
    Ok(())
}
