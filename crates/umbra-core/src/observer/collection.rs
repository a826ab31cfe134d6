use crate::{
    error::{Error, ErrorOrigin},
    memo::Memo,
    model::{CollectionTemplate, PropertyTemplate},
    observer::{ObjectObserver, Observer, object::OuterProperty},
    tracking::{CollectionChanges, CollectionTracker, Sequence},
    types::{CollectionRef, ObjectRef, ObserverId, WeakCollectionRef},
};
use parking_lot::{Mutex, RwLock};
use std::{fmt, sync::Arc};

///
/// CollectionObserver
///
/// Tracking wrapper bound to one live collection. Change detection works by
/// diffing copied item snapshots, so mutations through any path are seen.
///

pub struct CollectionObserver {
    id: ObserverId,
    created_at: u64,
    template: Arc<CollectionTemplate>,
    real: RwLock<WeakCollectionRef>,
    tracker: Memo<CollectionTracker>,
    outer: Mutex<Vec<OuterProperty>>,
}

impl CollectionObserver {
    pub(crate) fn new(template: Arc<CollectionTemplate>, real: &CollectionRef) -> Self {
        Self {
            id: ObserverId::generate(),
            created_at: Sequence::next(),
            template,
            real: RwLock::new(real.downgrade()),
            tracker: Memo::new(),
            outer: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub const fn id(&self) -> ObserverId {
        self.id
    }

    #[must_use]
    pub const fn created_at(&self) -> u64 {
        self.created_at
    }

    #[must_use]
    pub const fn template(&self) -> &Arc<CollectionTemplate> {
        &self.template
    }

    pub fn real_collection(&self) -> Result<CollectionRef, Error> {
        self.real
            .read()
            .upgrade()
            .ok_or_else(|| Error::stale_instance(ErrorOrigin::Observer, self.id))
    }

    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.real.read().is_alive()
    }

    #[must_use]
    pub fn is_bound_to(&self, collection: &CollectionRef) -> bool {
        let real = self.real.read();
        real.is_alive() && real.refers_to(collection)
    }

    pub fn tracker(&self) -> &CollectionTracker {
        self.tracker.get_or_init(|| CollectionTracker::new(self.id))
    }

    pub(crate) fn establish_baseline(&self) -> Result<(), Error> {
        let items = self.real_collection()?.items();
        self.tracker().establish_baseline(items);

        Ok(())
    }

    /// Diff the live contents against the latest snapshot.
    pub fn detect_changes(
        &self,
        resolve: impl FnMut(&ObjectRef) -> Result<Arc<ObjectObserver>, Error>,
    ) -> Result<CollectionChanges, Error> {
        let items = self.real_collection()?.items();

        self.tracker().detect_changes(items, resolve)
    }

    pub(crate) fn bind_outer_property(
        &self,
        owner: &Arc<ObjectObserver>,
        property: &Arc<PropertyTemplate>,
    ) {
        let mut outer = self.outer.lock();
        if !outer.iter().any(|link| link.is(owner.id(), property.name())) {
            outer.push(OuterProperty::new(owner, Arc::clone(property)));
        }
    }

    pub(crate) fn unbind_outer_property(&self, owner: ObserverId, property: &str) {
        self.outer.lock().retain(|link| !link.is(owner, property));
    }

    pub(crate) fn outer_properties(&self) -> Vec<OuterProperty> {
        self.outer.lock().clone()
    }

    #[must_use]
    pub fn outer_observers(&self) -> Vec<Observer> {
        self.outer
            .lock()
            .iter()
            .filter_map(|link| link.owner.upgrade().map(Observer::Object))
            .collect()
    }
}

impl fmt::Debug for CollectionObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionObserver")
            .field("id", &self.id)
            .field("type", &self.template.name())
            .field("created_at", &self.created_at)
            .field("real", &*self.real.read())
            .finish_non_exhaustive()
    }
}
