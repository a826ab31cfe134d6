use serde::{Deserialize, Serialize};
use std::{
    cell::RefCell,
    collections::BTreeMap,
    time::{SystemTime, UNIX_EPOCH},
};

///
/// EventState
/// Ephemeral, in-memory counters for engine activity on this thread.
///

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct EventState {
    pub ops: EventOps,
    pub types: BTreeMap<String, TypeCounters>,
    pub window_start_ms: u64,
}

impl Default for EventState {
    fn default() -> Self {
        Self {
            ops: EventOps::default(),
            types: BTreeMap::new(),
            window_start_ms: now_millis(),
        }
    }
}

///
/// EventOps
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct EventOps {
    // Metadata
    pub templates_built: u64,

    // Observer cache
    pub object_observers: u64,
    pub collection_observers: u64,
    pub identity_anomalies: u64,

    // Change detection
    pub change_scans: u64,
    pub property_changes: u64,
    pub collection_additions: u64,
    pub collection_removals: u64,

    // Saves
    pub saves: u64,
    pub objects_saved: u64,
    pub saves_rejected: u64,
    pub consistency_failures: u64,
}

///
/// TypeCounters
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct TypeCounters {
    pub observers_created: u64,
    pub identity_anomalies: u64,
}

thread_local! {
    static EVENT_STATE: RefCell<EventState> = RefCell::new(EventState::default());
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
}

/// Borrow metrics immutably.
pub(crate) fn with_state<R>(f: impl FnOnce(&EventState) -> R) -> R {
    EVENT_STATE.with(|m| f(&m.borrow()))
}

/// Borrow metrics mutably.
pub(crate) fn with_state_mut<R>(f: impl FnOnce(&mut EventState) -> R) -> R {
    EVENT_STATE.with(|m| f(&mut m.borrow_mut()))
}

pub(crate) fn reset_all() {
    with_state_mut(|m| *m = EventState::default());
}

///
/// EventReport
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EventReport {
    /// Counters since `window_start_ms`.
    pub counters: Option<EventState>,
    pub type_counters: Vec<TypeSummary>,
}

///
/// TypeSummary
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct TypeSummary {
    pub path: String,
    pub observers_created: u64,
    pub identity_anomalies: u64,
}

/// Build a report, empty when the window began before `window_start_ms`.
#[must_use]
pub(crate) fn report_window_start(window_start_ms: Option<u64>) -> EventReport {
    let snap = with_state(Clone::clone);
    if let Some(requested) = window_start_ms
        && requested > snap.window_start_ms
    {
        return EventReport::default();
    }

    let type_counters = snap
        .types
        .iter()
        .map(|(path, counters)| TypeSummary {
            path: path.clone(),
            observers_created: counters.observers_created,
            identity_anomalies: counters.identity_anomalies,
        })
        .collect();

    EventReport {
        counters: Some(snap),
        type_counters,
    }
}
