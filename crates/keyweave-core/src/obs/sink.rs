//! Metrics sink boundary.
//!
//! Index logic MUST NOT depend on obs::metrics directly.
//! All instrumentation flows through MetricsEvent and MetricsSink.
use super::metrics::{self, EventReport, bump_index};
use std::{cell::RefCell, rc::Rc};

thread_local! {
    static SINK_OVERRIDE: RefCell<Option<Rc<dyn MetricsSink>>> = const { RefCell::new(None) };
}

///
/// MetricsEvent
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MetricsEvent<'a> {
    UniqueInsert {
        index: &'a str,
    },
    UniqueRemove {
        index: &'a str,
    },
    UniqueRekey {
        index: &'a str,
    },
    UniqueViolation {
        index: &'a str,
    },
    ForeignLink {
        index: &'a str,
    },
    ForeignUnlink {
        index: &'a str,
    },
    ForeignRelink {
        index: &'a str,
    },
    ForeignDuplicate {
        index: &'a str,
    },
    MissingParent {
        index: &'a str,
    },
    ConstraintCheck {
        index: &'a str,
        blocked: bool,
    },
    MutationRollback {
        failed_index: &'a str,
        steps: u64,
        failures: u64,
    },
}

///
/// MetricsSink
///

pub trait MetricsSink {
    fn record(&self, event: MetricsEvent<'_>);
}

/// GlobalMetricsSink
/// Default thread-local sink that writes into the global counters.
/// Acts as the concrete sink when no scoped override is installed.

pub(crate) struct GlobalMetricsSink;

impl MetricsSink for GlobalMetricsSink {
    fn record(&self, event: MetricsEvent<'_>) {
        metrics::with_state_mut(|m| match event {
            MetricsEvent::UniqueInsert { index } => {
                m.ops.unique_inserts = m.ops.unique_inserts.saturating_add(1);
                bump_index(m, index, |c| &mut c.inserts);
            }
            MetricsEvent::UniqueRemove { index } => {
                m.ops.unique_removes = m.ops.unique_removes.saturating_add(1);
                bump_index(m, index, |c| &mut c.removes);
            }
            MetricsEvent::UniqueRekey { index } => {
                m.ops.unique_rekeys = m.ops.unique_rekeys.saturating_add(1);
                bump_index(m, index, |c| &mut c.rekeys);
            }
            MetricsEvent::UniqueViolation { index } => {
                m.ops.unique_violations = m.ops.unique_violations.saturating_add(1);
                bump_index(m, index, |c| &mut c.duplicate_rejections);
            }
            MetricsEvent::ForeignLink { index } => {
                m.ops.foreign_links = m.ops.foreign_links.saturating_add(1);
                bump_index(m, index, |c| &mut c.inserts);
            }
            MetricsEvent::ForeignUnlink { index } => {
                m.ops.foreign_unlinks = m.ops.foreign_unlinks.saturating_add(1);
                bump_index(m, index, |c| &mut c.removes);
            }
            MetricsEvent::ForeignRelink { index } => {
                m.ops.foreign_relinks = m.ops.foreign_relinks.saturating_add(1);
                bump_index(m, index, |c| &mut c.rekeys);
            }
            MetricsEvent::ForeignDuplicate { index } => {
                m.ops.foreign_duplicates = m.ops.foreign_duplicates.saturating_add(1);
                bump_index(m, index, |c| &mut c.duplicate_rejections);
            }
            MetricsEvent::MissingParent { index } => {
                m.ops.missing_parents = m.ops.missing_parents.saturating_add(1);
                bump_index(m, index, |c| &mut c.missing_parents);
            }
            MetricsEvent::ConstraintCheck { index, blocked } => {
                m.ops.constraint_checks = m.ops.constraint_checks.saturating_add(1);
                bump_index(m, index, |c| &mut c.constraint_checks);
                if blocked {
                    m.ops.constraint_blocks = m.ops.constraint_blocks.saturating_add(1);
                    bump_index(m, index, |c| &mut c.constraint_blocks);
                }
            }
            MetricsEvent::MutationRollback {
                failed_index,
                steps,
                failures,
            } => {
                m.ops.rollbacks = m.ops.rollbacks.saturating_add(1);
                m.ops.rollback_steps = m.ops.rollback_steps.saturating_add(steps);
                m.ops.rollback_failures = m.ops.rollback_failures.saturating_add(failures);
                bump_index(m, failed_index, |c| &mut c.rollbacks);
            }
        });
    }
}

pub(crate) const GLOBAL_METRICS_SINK: GlobalMetricsSink = GlobalMetricsSink;

pub(crate) fn record(event: MetricsEvent<'_>) {
    // Clone out of the slot so a sink may itself record without a borrow clash.
    let sink = SINK_OVERRIDE.with(|cell| cell.borrow().clone());
    match sink {
        Some(sink) => sink.record(event),
        None => GLOBAL_METRICS_SINK.record(event),
    }
}

/// Snapshot the current thread's metrics state.
#[must_use]
pub fn metrics_report() -> EventReport {
    metrics::report()
}

/// Reset all metrics state.
pub fn metrics_reset_all() {
    metrics::reset_all();
}

/// Run a closure with a temporary metrics sink override.
///
/// The previous sink is restored on every exit, including unwind.
pub fn with_metrics_sink<T>(sink: Rc<dyn MetricsSink>, f: impl FnOnce() -> T) -> T {
    struct Guard(Option<Rc<dyn MetricsSink>>);

    impl Drop for Guard {
        fn drop(&mut self) {
            let prev = self.0.take();
            SINK_OVERRIDE.with(|cell| {
                *cell.borrow_mut() = prev;
            });
        }
    }

    let prev = SINK_OVERRIDE.with(|cell| cell.borrow_mut().replace(sink));
    let _guard = Guard(prev);

    f()
}
