use crate::{
    tracking::{PropertyChange, Sequence, Snapshot},
    types::ObserverId,
};
use indexmap::IndexSet;
use parking_lot::Mutex;

///
/// ObjectTracker
///
/// Dirty-state machine of one observer. The dirty flag is only ever derived
/// from detected deltas, or cleared by `reset_dirty_flags` after a save.
///

#[derive(Debug)]
pub struct ObjectTracker {
    owner: ObserverId,
    state: Mutex<ObjectTrackerState>,
}

#[derive(Debug)]
struct ObjectTrackerState {
    is_transient: bool,
    is_dirty: bool,
    dirty_graph: IndexSet<ObserverId>,
    baseline: Option<Snapshot>,
    changes: Vec<PropertyChange>,
}

impl ObjectTracker {
    pub(crate) fn new(owner: ObserverId) -> Self {
        Self {
            owner,
            state: Mutex::new(ObjectTrackerState {
                is_transient: true,
                is_dirty: false,
                dirty_graph: IndexSet::new(),
                baseline: None,
                changes: Vec::new(),
            }),
        }
    }

    #[must_use]
    pub const fn owner(&self) -> ObserverId {
        self.owner
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.state.lock().is_dirty
    }

    /// True until the instance is known to exist in the backing store.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        self.state.lock().is_transient
    }

    #[must_use]
    pub fn is_persistent(&self) -> bool {
        !self.is_transient()
    }

    /// True if anything this observer transitively contains is dirty.
    #[must_use]
    pub fn has_dirty_object_graph(&self) -> bool {
        !self.state.lock().dirty_graph.is_empty()
    }

    /// Ids of dirty observers reachable below this one.
    #[must_use]
    pub fn dirty_objects(&self) -> Vec<ObserverId> {
        self.state.lock().dirty_graph.iter().copied().collect()
    }

    pub(crate) fn set_transient(&self, is_transient: bool) {
        self.state.lock().is_transient = is_transient;
    }

    pub(crate) fn mark_dirty(&self) {
        self.state.lock().is_dirty = true;
    }

    pub(crate) fn add_dirty_object(&self, id: ObserverId) -> bool {
        self.state.lock().dirty_graph.insert(id)
    }

    pub(crate) fn remove_from_dirty_object_graph(&self, id: ObserverId) -> bool {
        self.state.lock().dirty_graph.shift_remove(&id)
    }

    /// Record the first snapshot without producing changes.
    pub(crate) fn establish_baseline(&self, snapshot: Snapshot) {
        let mut state = self.state.lock();
        if state.baseline.is_none() {
            state.baseline = Some(snapshot);
        }
    }

    /// Diff `current` against the last snapshot and log every difference.
    /// Returns the changes found by this call.
    pub fn detect_changes(&self, current: Snapshot) -> Vec<PropertyChange> {
        let mut state = self.state.lock();

        let Some(previous) = state.baseline.replace(current.clone()) else {
            return Vec::new();
        };

        let changes: Vec<PropertyChange> = current
            .diff(&previous)
            .into_iter()
            .map(|(property, old, new)| PropertyChange {
                sequence: Sequence::next(),
                object: self.owner,
                property,
                old,
                new,
            })
            .collect();

        if !changes.is_empty() {
            state.is_dirty = true;
            state.changes.extend(changes.iter().cloned());
        }

        changes
    }

    /// Clear the dirty flag, the dirty graph and the change log.
    /// The snapshot baseline is kept unless a replacement is supplied.
    pub fn reset_dirty_flags(&self, rebaseline: Option<Snapshot>) {
        let mut state = self.state.lock();
        state.is_dirty = false;
        state.dirty_graph.clear();
        state.changes.clear();
        if let Some(snapshot) = rebaseline {
            state.baseline = Some(snapshot);
        }
    }

    #[must_use]
    pub fn property_changes(&self) -> Vec<PropertyChange> {
        self.state.lock().changes.clone()
    }

    #[must_use]
    pub fn property_changes_since(&self, sequence: u64) -> Vec<PropertyChange> {
        self.state
            .lock()
            .changes
            .iter()
            .filter(|change| change.sequence > sequence)
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn baseline(&self) -> Option<Snapshot> {
        self.state.lock().baseline.clone()
    }
}
