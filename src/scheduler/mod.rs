//! Interval jobs, threshold monitoring, and alert lifecycle.
//!
//! The scheduler fires time-based triggers into the workflow engine:
//! interval jobs run a workflow every period, and threshold rules sample
//! metrics and raise deduplicated alerts (escalating to a workflow at
//! critical severity). Ticks are driven by an injected clock, so
//! correctness is testable without real time.
//!
//! # Architecture
//!
//! - **Domain**: [`domain::IntervalJob`], [`domain::ThresholdRule`],
//!   [`domain::Alert`], [`domain::AlertSeverity`]
//! - **Ports**: [`ports::MetricsSource`]
//! - **Adapters**: [`adapters::memory::StaticMetricsSource`]
//! - **Services**: [`services::Scheduler`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;
