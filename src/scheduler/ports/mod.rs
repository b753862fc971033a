//! Port trait definitions for the scheduler subsystem.

pub mod metrics;

pub use metrics::{MetricsError, MetricsResult, MetricsSource};
