use serde::{Deserialize, Serialize};
use std::{cell::RefCell, collections::BTreeMap};

///
/// EventState
/// Ephemeral, in-memory counters for index operations.
///

#[derive(Clone, Debug, Default)]
pub(crate) struct EventState {
    pub(crate) ops: EventOps,
    pub(crate) indexes: BTreeMap<String, IndexCounters>,
}

///
/// EventOps
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct EventOps {
    // Unique index maintenance
    pub unique_inserts: u64,
    pub unique_removes: u64,
    pub unique_rekeys: u64,
    pub unique_violations: u64,

    // Foreign index maintenance
    pub foreign_links: u64,
    pub foreign_unlinks: u64,
    pub foreign_relinks: u64,
    pub foreign_duplicates: u64,
    pub missing_parents: u64,

    // Constraint propagation
    pub constraint_checks: u64,
    pub constraint_blocks: u64,

    // Row mutations
    pub rollbacks: u64,
    pub rollback_steps: u64,
    pub rollback_failures: u64,
}

///
/// IndexCounters
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct IndexCounters {
    pub inserts: u64,
    pub removes: u64,
    pub rekeys: u64,
    pub duplicate_rejections: u64,
    pub missing_parents: u64,
    pub constraint_checks: u64,
    pub constraint_blocks: u64,
    pub rollbacks: u64,
}

thread_local! {
    static EVENT_STATE: RefCell<EventState> = RefCell::new(EventState::default());
}

/// Borrow metrics immutably.
pub(crate) fn with_state<R>(f: impl FnOnce(&EventState) -> R) -> R {
    EVENT_STATE.with(|m| f(&m.borrow()))
}

/// Borrow metrics mutably.
pub(crate) fn with_state_mut<R>(f: impl FnOnce(&mut EventState) -> R) -> R {
    EVENT_STATE.with(|m| f(&mut m.borrow_mut()))
}

/// Reset all counters.
pub(crate) fn reset_all() {
    with_state_mut(|m| *m = EventState::default());
}

/// Bump one per-index counter, creating the entry on first use.
pub(crate) fn bump_index(
    state: &mut EventState,
    index: &str,
    f: impl FnOnce(&mut IndexCounters) -> &mut u64,
) {
    let entry = state.indexes.entry(index.to_string()).or_default();
    let counter = f(entry);
    *counter = counter.saturating_add(1);
}

///
/// EventReport
/// Point-in-time copy of the counters.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct EventReport {
    pub ops: EventOps,
    pub indexes: BTreeMap<String, IndexCounters>,
}

impl EventReport {
    #[must_use]
    pub fn index(&self, name: &str) -> Option<&IndexCounters> {
        self.indexes.get(name)
    }
}

pub(crate) fn report() -> EventReport {
    with_state(|m| EventReport {
        ops: m.ops.clone(),
        indexes: m.indexes.clone(),
    })
}
