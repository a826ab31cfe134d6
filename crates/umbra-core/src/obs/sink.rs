//! Metrics sink boundary.
//!
//! Engine logic never writes counters itself. Every instrumentation point
//! emits a [`MetricsEvent`], and this module routes it to the active sink.
use crate::obs::metrics::{self, EventReport};
use std::{cell::RefCell, rc::Rc};

thread_local! {
    static SINK_OVERRIDE: RefCell<Option<Rc<dyn MetricsSink>>> = RefCell::new(None);
}

///
/// ObserverKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ObserverKind {
    Object,
    Collection,
}

///
/// MetricsEvent
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MetricsEvent {
    TemplateBuilt,
    ObserverCreated {
        kind: ObserverKind,
        type_path: &'static str,
    },
    IdentityAnomaly {
        type_path: &'static str,
    },
    ChangesDetected {
        property_changes: u64,
        additions: u64,
        removals: u64,
    },
    SaveCompleted {
        objects: u64,
    },
    SaveRejected {
        failures: u64,
    },
}

///
/// MetricsSink
///

pub trait MetricsSink {
    fn record(&self, event: MetricsEvent);
}

///
/// GlobalMetricsSink
/// Default sink writing into the thread-local counters.
///

pub(crate) struct GlobalMetricsSink;

impl MetricsSink for GlobalMetricsSink {
    fn record(&self, event: MetricsEvent) {
        metrics::with_state_mut(|m| match event {
            MetricsEvent::TemplateBuilt => {
                m.ops.templates_built = m.ops.templates_built.saturating_add(1);
            }

            MetricsEvent::ObserverCreated { kind, type_path } => {
                match kind {
                    ObserverKind::Object => {
                        m.ops.object_observers = m.ops.object_observers.saturating_add(1);
                    }
                    ObserverKind::Collection => {
                        m.ops.collection_observers = m.ops.collection_observers.saturating_add(1);
                    }
                }
                let entry = m.types.entry(type_path.to_string()).or_default();
                entry.observers_created = entry.observers_created.saturating_add(1);
            }

            MetricsEvent::IdentityAnomaly { type_path } => {
                m.ops.identity_anomalies = m.ops.identity_anomalies.saturating_add(1);
                let entry = m.types.entry(type_path.to_string()).or_default();
                entry.identity_anomalies = entry.identity_anomalies.saturating_add(1);
            }

            MetricsEvent::ChangesDetected {
                property_changes,
                additions,
                removals,
            } => {
                m.ops.change_scans = m.ops.change_scans.saturating_add(1);
                m.ops.property_changes = m.ops.property_changes.saturating_add(property_changes);
                m.ops.collection_additions = m.ops.collection_additions.saturating_add(additions);
                m.ops.collection_removals = m.ops.collection_removals.saturating_add(removals);
            }

            MetricsEvent::SaveCompleted { objects } => {
                m.ops.saves = m.ops.saves.saturating_add(1);
                m.ops.objects_saved = m.ops.objects_saved.saturating_add(objects);
            }

            MetricsEvent::SaveRejected { failures } => {
                m.ops.saves_rejected = m.ops.saves_rejected.saturating_add(1);
                m.ops.consistency_failures = m.ops.consistency_failures.saturating_add(failures);
            }
        });
    }
}

pub(crate) const GLOBAL_METRICS_SINK: GlobalMetricsSink = GlobalMetricsSink;

pub(crate) fn record(event: MetricsEvent) {
    // Clone out of the slot so a sink may itself record without a borrow conflict.
    let active = SINK_OVERRIDE.with(|cell| cell.borrow().clone());

    match active {
        Some(sink) => sink.record(event),
        None => GLOBAL_METRICS_SINK.record(event),
    }
}

/// Snapshot the current metrics state.
///
/// `window_start_ms` filters by window start, not by per-event timestamps.
#[must_use]
pub fn metrics_report(window_start_ms: Option<u64>) -> EventReport {
    metrics::report_window_start(window_start_ms)
}

/// Reset all metrics state.
pub fn metrics_reset_all() {
    metrics::reset_all();
}

/// Run a closure with a temporary metrics sink override.
pub(crate) fn with_metrics_sink<T>(sink: Rc<dyn MetricsSink>, f: impl FnOnce() -> T) -> T {
    struct Guard(Option<Rc<dyn MetricsSink>>);

    impl Drop for Guard {
        fn drop(&mut self) {
            let previous = self.0.take();
            SINK_OVERRIDE.with(|cell| {
                *cell.borrow_mut() = previous;
            });
        }
    }

    let previous = SINK_OVERRIDE.with(|cell| cell.borrow_mut().replace(sink));
    let _guard = Guard(previous);

    f()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        cell::Cell,
        panic::{AssertUnwindSafe, catch_unwind},
    };

    #[derive(Default)]
    struct CountingSink {
        calls: Cell<usize>,
    }

    impl MetricsSink for CountingSink {
        fn record(&self, _: MetricsEvent) {
            self.calls.set(self.calls.get() + 1);
        }
    }

    #[test]
    fn with_metrics_sink_routes_and_restores_nested_overrides() {
        let outer = Rc::new(CountingSink::default());
        let inner = Rc::new(CountingSink::default());

        record(MetricsEvent::TemplateBuilt);
        assert_eq!(outer.calls.get(), 0);

        with_metrics_sink(outer.clone(), || {
            record(MetricsEvent::TemplateBuilt);
            assert_eq!(outer.calls.get(), 1);

            with_metrics_sink(inner.clone(), || {
                record(MetricsEvent::SaveCompleted { objects: 2 });
            });

            // restored to the outer override
            record(MetricsEvent::SaveRejected { failures: 1 });
        });

        assert_eq!(outer.calls.get(), 2);
        assert_eq!(inner.calls.get(), 1);
        SINK_OVERRIDE.with(|cell| assert!(cell.borrow().is_none()));
    }

    #[test]
    fn with_metrics_sink_restores_override_on_panic() {
        let sink = Rc::new(CountingSink::default());

        let panicked = catch_unwind(AssertUnwindSafe(|| {
            with_metrics_sink(sink.clone(), || {
                record(MetricsEvent::TemplateBuilt);
                panic!("intentional panic for guard test");
            });
        }))
        .is_err();

        assert!(panicked);
        assert_eq!(sink.calls.get(), 1);
        SINK_OVERRIDE.with(|cell| assert!(cell.borrow().is_none()));
    }

    #[test]
    fn metrics_report_accumulates_per_type_counters() {
        metrics_reset_all();

        record(MetricsEvent::ObserverCreated {
            kind: ObserverKind::Object,
            type_path: "shop::Customer",
        });
        record(MetricsEvent::IdentityAnomaly {
            type_path: "shop::Customer",
        });
        record(MetricsEvent::ChangesDetected {
            property_changes: 2,
            additions: 3,
            removals: 1,
        });

        let report = metrics_report(None);
        let counters = report.counters.expect("report should include counters");
        assert_eq!(counters.ops.object_observers, 1);
        assert_eq!(counters.ops.identity_anomalies, 1);
        assert_eq!(counters.ops.collection_additions, 3);
        assert_eq!(
            report.type_counters,
            vec![metrics::TypeSummary {
                path: "shop::Customer".to_string(),
                observers_created: 1,
                identity_anomalies: 1,
            }]
        );
    }

    #[test]
    fn metrics_report_window_start_after_window_returns_empty() {
        metrics_reset_all();
        let window_start = metrics::with_state(|m| m.window_start_ms);
        record(MetricsEvent::TemplateBuilt);

        let report = metrics_report(Some(window_start.saturating_add(1)));
        assert!(report.counters.is_none());
        assert!(report.type_counters.is_empty());
    }

    #[test]
    fn report_serialises_to_json() {
        metrics_reset_all();
        record(MetricsEvent::SaveCompleted { objects: 4 });

        let json = serde_json::to_value(metrics_report(None)).expect("report should serialise");
        assert_eq!(json["counters"]["ops"]["objects_saved"], 4);
    }
}
