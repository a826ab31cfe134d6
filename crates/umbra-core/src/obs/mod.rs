//! Observability: runtime counters and the sink abstraction they flow through.
//!
//! Engine code never touches the counters directly; every event goes
//! through [`sink::record`].

pub(crate) mod metrics;
pub(crate) mod sink;

// re-exports
pub use metrics::{EventOps, EventReport, EventState, TypeSummary};
pub use sink::{MetricsEvent, MetricsSink, ObserverKind, metrics_report, metrics_reset_all};
