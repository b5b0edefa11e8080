//! Observability: runtime telemetry (metrics) and sink abstractions.
//!
//! Index logic never touches counters directly; it emits `MetricsEvent`s
//! through `sink::record`.

pub(crate) mod metrics;
pub(crate) mod sink;

// re-exports
pub use metrics::{EventOps, EventReport, IndexCounters};
pub use sink::{MetricsEvent, MetricsSink, metrics_report, metrics_reset_all, with_metrics_sink};
