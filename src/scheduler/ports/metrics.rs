//! Metrics-source port for threshold sampling.

use async_trait::async_trait;
use thiserror::Error;

use crate::scheduler::domain::MetricName;

/// Result type for metric sampling.
pub type MetricsResult<T> = Result<T, MetricsError>;

/// Errors that can occur while sampling a metric.
#[derive(Debug, Clone, Error)]
pub enum MetricsError {
    /// The metric is not known to the source.
    #[error("unknown metric: '{0}'")]
    UnknownMetric(MetricName),

    /// The source failed to produce a sample.
    #[error("metrics source unavailable: {0}")]
    Unavailable(String),
}

/// Port sampling a named metric.
///
/// A sampling failure never fails a scheduler tick; the affected rule is
/// skipped and the failure is reported.
#[async_trait]
pub trait MetricsSource: Send + Sync {
    /// Samples the current value of a metric.
    ///
    /// # Errors
    ///
    /// Returns `MetricsError` for unknown metrics or source failures.
    async fn sample(&self, metric: &MetricName) -> MetricsResult<f64>;
}
