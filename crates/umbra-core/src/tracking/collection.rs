use crate::{
    error::Error,
    observer::ObjectObserver,
    tracking::{CollectionAdd, CollectionRemove, ObjectTracker, Sequence},
    types::{ObjectRef, ObserverId},
};
use derive_more::Deref;
use parking_lot::Mutex;
use std::{collections::HashSet, sync::Arc};

///
/// CollectionItemsTracker
///
/// Copied item snapshots of one collection plus the history of add/remove
/// records produced from them.
///

#[derive(Debug, Default)]
pub struct CollectionItemsTracker {
    previous: Vec<ObjectRef>,
    latest: Vec<ObjectRef>,
    additions: Vec<CollectionAdd>,
    removals: Vec<CollectionRemove>,
}

impl CollectionItemsTracker {
    /// Reference-identity set difference: `(current − latest, latest − current)`.
    /// Each element is reported once, in the order it appears.
    fn diff(&self, current: &[ObjectRef]) -> (Vec<ObjectRef>, Vec<ObjectRef>) {
        let latest: HashSet<usize> = self.latest.iter().map(ObjectRef::address).collect();
        let now: HashSet<usize> = current.iter().map(ObjectRef::address).collect();

        (
            unique_missing(current, &latest),
            unique_missing(&self.latest, &now),
        )
    }

    fn holds(&self, item: &ObjectRef) -> bool {
        self.latest.iter().any(|c| c.ptr_eq(item))
    }

    fn remove_latest(&mut self, item: &ObjectRef) {
        if let Some(index) = self.latest.iter().position(|c| c.ptr_eq(item)) {
            self.latest.remove(index);
        }
    }
}

fn unique_missing(items: &[ObjectRef], other: &HashSet<usize>) -> Vec<ObjectRef> {
    let mut seen = HashSet::new();

    items
        .iter()
        .filter(|item| !other.contains(&item.address()) && seen.insert(item.address()))
        .cloned()
        .collect()
}

///
/// CollectionChanges
/// Outcome of one collection diff.
///

#[derive(Debug, Default)]
pub struct CollectionChanges {
    pub added: Vec<CollectionAdd>,
    pub removed: Vec<CollectionRemove>,

    /// Transient elements whose pending addition was withdrawn.
    pub retracted: Vec<Arc<ObjectObserver>>,
}

impl CollectionChanges {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.retracted.is_empty()
    }
}

///
/// RemovalOutcome
///

#[derive(Debug)]
pub enum RemovalOutcome {
    Removed(CollectionRemove),
    Retracted,
}

///
/// CollectionTracker
///
/// Object tracker extended with pending add/remove records and the item
/// snapshots used to diff the collection.
///

#[derive(Debug, Deref)]
pub struct CollectionTracker {
    #[deref]
    base: ObjectTracker,
    state: Mutex<CollectionTrackerState>,
}

#[derive(Debug, Default)]
struct CollectionTrackerState {
    pending_additions: Vec<CollectionAdd>,
    pending_removals: Vec<CollectionRemove>,
    items: CollectionItemsTracker,
}

impl CollectionTrackerState {
    fn record_addition(
        &mut self,
        collection: ObserverId,
        element: Arc<ObjectObserver>,
    ) -> CollectionAdd {
        let record = CollectionAdd {
            sequence: Sequence::next(),
            collection,
            element,
        };
        self.pending_additions.push(record.clone());
        self.items.additions.push(record.clone());

        record
    }

    fn record_removal(
        &mut self,
        collection: ObserverId,
        element: Arc<ObjectObserver>,
    ) -> RemovalOutcome {
        // A never-saved element leaving before any save only withdraws its addition.
        if element.tracker().is_transient() && self.retract_addition(element.id()) {
            return RemovalOutcome::Retracted;
        }

        let record = CollectionRemove {
            sequence: Sequence::next(),
            collection,
            element,
        };
        self.pending_removals.push(record.clone());
        self.items.removals.push(record.clone());

        RemovalOutcome::Removed(record)
    }

    fn retract_addition(&mut self, element: ObserverId) -> bool {
        let Some(index) = self
            .pending_additions
            .iter()
            .rposition(|add| add.element.id() == element)
        else {
            return false;
        };
        let retracted = self.pending_additions.remove(index);
        self.items
            .additions
            .retain(|add| add.sequence != retracted.sequence);

        true
    }
}

impl CollectionTracker {
    pub(crate) fn new(owner: ObserverId) -> Self {
        Self {
            base: ObjectTracker::new(owner),
            state: Mutex::new(CollectionTrackerState::default()),
        }
    }

    #[must_use]
    pub const fn base(&self) -> &ObjectTracker {
        &self.base
    }

    /// Dirty if the base tracker is, or if any add/remove is pending.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        if self.base.is_dirty() {
            return true;
        }
        let state = self.state.lock();

        !state.pending_additions.is_empty() || !state.pending_removals.is_empty()
    }

    pub(crate) fn establish_baseline(&self, items: Vec<ObjectRef>) {
        let mut state = self.state.lock();
        state.items.previous.clone_from(&items);
        state.items.latest = items;
    }

    /// Diff `current` against the latest snapshot and record the delta.
    /// `resolve` maps an element to its observer; it must not touch this tracker.
    pub fn detect_changes(
        &self,
        current: Vec<ObjectRef>,
        mut resolve: impl FnMut(&ObjectRef) -> Result<Arc<ObjectObserver>, Error>,
    ) -> Result<CollectionChanges, Error> {
        let collection = self.base.owner();
        let mut state = self.state.lock();
        let (added, removed) = state.items.diff(&current);
        let mut changes = CollectionChanges::default();

        for item in &added {
            let element = resolve(item)?;
            changes.added.push(state.record_addition(collection, element));
        }
        for item in &removed {
            let element = resolve(item)?;
            match state.record_removal(collection, Arc::clone(&element)) {
                RemovalOutcome::Removed(record) => changes.removed.push(record),
                RemovalOutcome::Retracted => changes.retracted.push(element),
            }
        }

        let items = &mut state.items;
        items.previous = std::mem::replace(&mut items.latest, current);

        Ok(changes)
    }

    /// Record an add made through a proxy once it has reached the collection.
    /// An element already in the latest snapshot records nothing.
    pub(crate) fn mark_as_added(
        &self,
        element: Arc<ObjectObserver>,
        item: &ObjectRef,
    ) -> Option<CollectionAdd> {
        let collection = self.base.owner();
        let mut state = self.state.lock();
        if state.items.holds(item) {
            return None;
        }
        state.items.latest.push(item.clone());

        Some(state.record_addition(collection, element))
    }

    /// Record a remove made through a proxy once the element has left the
    /// collection. An element missing from the latest snapshot records nothing.
    pub(crate) fn mark_as_removed(
        &self,
        element: Arc<ObjectObserver>,
        item: &ObjectRef,
    ) -> Option<RemovalOutcome> {
        let collection = self.base.owner();
        let mut state = self.state.lock();
        if !state.items.holds(item) {
            return None;
        }
        state.items.remove_latest(item);

        Some(state.record_removal(collection, element))
    }

    /// Clear dirty state, pending records and their history.
    pub fn reset_dirty_flags(&self) {
        self.base.reset_dirty_flags(None);
        let mut state = self.state.lock();
        state.pending_additions.clear();
        state.pending_removals.clear();
        state.items.additions.clear();
        state.items.removals.clear();
    }

    #[must_use]
    pub fn additions_since(&self, sequence: u64) -> Vec<CollectionAdd> {
        self.state
            .lock()
            .items
            .additions
            .iter()
            .filter(|add| add.sequence > sequence)
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn removals_since(&self, sequence: u64) -> Vec<CollectionRemove> {
        self.state
            .lock()
            .items
            .removals
            .iter()
            .filter(|remove| remove.sequence > sequence)
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn pending_additions(&self) -> Vec<CollectionAdd> {
        self.state.lock().pending_additions.clone()
    }

    #[must_use]
    pub fn pending_removals(&self) -> Vec<CollectionRemove> {
        self.state.lock().pending_removals.clone()
    }

    #[must_use]
    pub fn latest_items(&self) -> Vec<ObjectRef> {
        self.state.lock().items.latest.clone()
    }

    #[must_use]
    pub fn previous_items(&self) -> Vec<ObjectRef> {
        self.state.lock().items.previous.clone()
    }
}
