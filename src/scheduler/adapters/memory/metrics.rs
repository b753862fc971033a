//! Static-table implementation of the [`MetricsSource`] port.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::scheduler::domain::MetricName;
use crate::scheduler::ports::metrics::{MetricsError, MetricsResult, MetricsSource};

/// Metrics source backed by a mutable metric→value table.
///
/// Thread-safe via internal [`RwLock`]; tests drive threshold behaviour
/// by setting values between ticks.
#[derive(Debug, Default, Clone)]
pub struct StaticMetricsSource {
    values: Arc<RwLock<HashMap<String, f64>>>,
}

impl StaticMetricsSource {
    /// Creates a source with no metrics.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the current value of a metric.
    pub fn set(&self, metric: &MetricName, value: f64) {
        if let Ok(mut guard) = self.values.write() {
            guard.insert(metric.as_str().to_owned(), value);
        }
    }
}

#[async_trait]
impl MetricsSource for StaticMetricsSource {
    async fn sample(&self, metric: &MetricName) -> MetricsResult<f64> {
        let guard = self
            .values
            .read()
            .map_err(|e| MetricsError::Unavailable(e.to_string()))?;

        guard
            .get(metric.as_str())
            .copied()
            .ok_or_else(|| MetricsError::UnknownMetric(metric.clone()))
    }
}
