use crate::{
    error::{ArgumentError, Error, ErrorOrigin},
    memo::Memo,
    model::{ClassTemplate, PropertyTemplate, Relationship},
    observer::{CollectionObserver, MethodObserver, Observer, PropertyObserver},
    tracking::{ObjectTracker, PropertyChange, Sequence, Snapshot},
    types::{ObjectRef, ObserverId, WeakObjectRef},
    value::Value,
};
use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};
use std::{
    fmt,
    sync::{Arc, Weak},
};

///
/// OuterProperty
/// A property of another object that currently points at an observed value.
///

#[derive(Clone)]
pub(crate) struct OuterProperty {
    pub owner: Weak<ObjectObserver>,
    pub owner_id: ObserverId,
    pub property: Arc<PropertyTemplate>,
}

impl OuterProperty {
    pub(crate) fn new(owner: &Arc<ObjectObserver>, property: Arc<PropertyTemplate>) -> Self {
        Self {
            owner: Arc::downgrade(owner),
            owner_id: owner.id(),
            property,
        }
    }

    pub(crate) fn is(&self, owner: ObserverId, property: &str) -> bool {
        self.owner_id == owner && self.property.name() == property
    }
}

#[derive(Default)]
struct OuterLinks {
    properties: Vec<OuterProperty>,
    collections: Vec<(ObserverId, Weak<CollectionObserver>)>,
}

///
/// ObjectObserver
///
/// Tracking wrapper bound to exactly one live domain instance. The instance
/// is held weakly; the observer never keeps it alive.
///

pub struct ObjectObserver {
    id: ObserverId,
    created_at: u64,
    template: Arc<ClassTemplate>,
    real: RwLock<WeakObjectRef>,
    lazy_load_persistent: bool,
    properties: Memo<IndexMap<String, PropertyObserver>>,
    methods: Memo<IndexMap<String, MethodObserver>>,
    tracker: Memo<ObjectTracker>,
    outer: Mutex<OuterLinks>,
}

impl ObjectObserver {
    pub(crate) fn new(
        template: Arc<ClassTemplate>,
        real: &ObjectRef,
        lazy_load_persistent: bool,
    ) -> Self {
        Self {
            id: ObserverId::generate(),
            created_at: Sequence::next(),
            template,
            real: RwLock::new(real.downgrade()),
            lazy_load_persistent,
            properties: Memo::new(),
            methods: Memo::new(),
            tracker: Memo::new(),
            outer: Mutex::new(OuterLinks::default()),
        }
    }

    #[must_use]
    pub const fn id(&self) -> ObserverId {
        self.id
    }

    /// Sequence number taken when the observer was created.
    #[must_use]
    pub const fn created_at(&self) -> u64 {
        self.created_at
    }

    #[must_use]
    pub const fn template(&self) -> &Arc<ClassTemplate> {
        &self.template
    }

    /// The bound instance, or `NotFound` once it has been dropped.
    pub fn real_object(&self) -> Result<ObjectRef, Error> {
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
    pub fn is_bound_to(&self, instance: &ObjectRef) -> bool {
        let real = self.real.read();
        real.is_alive() && real.refers_to(instance)
    }

    /// Rebind to another instance of the same type. Every resolved property
    /// value is dropped and method observers follow the new target. The new
    /// instance becomes the change baseline and the dirty state is cleared.
    pub(crate) fn set_real_object(&self, instance: &ObjectRef) -> Result<(), Error> {
        if instance.type_key() != self.template.type_key() {
            return Err(ArgumentError::UnexpectedObserver {
                expected: self.template.name().to_string(),
                actual: instance.type_key().short_name().to_string(),
            }
            .into_error(ErrorOrigin::Observer));
        }

        *self.real.write() = instance.downgrade();

        let lazy = self.should_lazy_load();
        if let Some(properties) = self.properties.get() {
            for property in properties.values() {
                property.reset(lazy);
            }
        }
        if let Some(methods) = self.methods.get() {
            for method in methods.values() {
                method.rebind(instance);
            }
        }
        self.tracker().reset_dirty_flags(Some(self.snapshot()?));

        Ok(())
    }

    pub fn properties(&self) -> &IndexMap<String, PropertyObserver> {
        self.properties.get_or_init(|| {
            let lazy = self.should_lazy_load();
            self.template
                .properties()
                .map(|template| {
                    (
                        template.name().to_string(),
                        PropertyObserver::new(Arc::clone(template), lazy),
                    )
                })
                .collect()
        })
    }

    pub fn property(&self, name: &str) -> Result<&PropertyObserver, Error> {
        self.properties()
            .get(name)
            .ok_or_else(|| Error::unknown_member(ErrorOrigin::Observer, self.template.name(), name))
    }

    /// Method observers, built on first access against the current instance.
    pub fn methods(&self) -> Result<&IndexMap<String, MethodObserver>, Error> {
        if let Some(methods) = self.methods.get() {
            return Ok(methods);
        }
        let real = self.real_object()?;

        Ok(self.methods.get_or_init(|| {
            self.template
                .methods()
                .map(|template| {
                    (
                        template.name().to_string(),
                        MethodObserver::new(Arc::clone(template), &real),
                    )
                })
                .collect()
        }))
    }

    pub fn method(&self, name: &str) -> Result<&MethodObserver, Error> {
        self.methods()?
            .get(name)
            .ok_or_else(|| Error::unknown_member(ErrorOrigin::Observer, self.template.name(), name))
    }

    pub fn tracker(&self) -> &ObjectTracker {
        self.tracker.get_or_init(|| ObjectTracker::new(self.id))
    }

    /// Current readable property values of the bound instance.
    pub fn snapshot(&self) -> Result<Snapshot, Error> {
        let real = self.real_object()?;
        let mut snapshot = Snapshot::default();

        for property in self.template.properties() {
            match real.get(property.name()) {
                Ok(value) => snapshot.insert(property.name(), value),
                Err(err) => {
                    tracing::trace!(
                        property = %property.full_name(),
                        error = %err,
                        "property skipped in snapshot"
                    );
                }
            }
        }

        Ok(snapshot)
    }

    pub(crate) fn establish_baseline(&self) -> Result<(), Error> {
        self.tracker().establish_baseline(self.snapshot()?);

        Ok(())
    }

    /// Diff the instance against the last snapshot.
    pub fn detect_changes(&self) -> Result<Vec<PropertyChange>, Error> {
        Ok(self.tracker().detect_changes(self.snapshot()?))
    }

    pub fn mark_as_persistent(&self) {
        if self.tracker().is_transient() {
            self.tracker().set_transient(false);
            self.check_if_properties_should_lazy_load();
        }
    }

    pub fn mark_as_transient(&self) {
        if self.tracker().is_persistent() {
            self.tracker().set_transient(true);
            self.check_if_properties_should_lazy_load();
        }
    }

    /// Persistent instances of persistable classes defer reference properties.
    #[must_use]
    pub fn should_lazy_load(&self) -> bool {
        self.lazy_load_persistent
            && self.template.is_persistable()
            && self.tracker().is_persistent()
    }

    /// Re-apply the lazy-load policy to every object and collection property.
    pub fn check_if_properties_should_lazy_load(&self) {
        let Some(properties) = self.properties.get() else {
            return;
        };
        let lazy = self.should_lazy_load();

        for property in properties.values() {
            if !property.template().is_non_reference() {
                property.reset(lazy);
            }
        }
    }

    /// Owned when held by a collection whose owning property is `Owns`, or
    /// when an outer property pointing here is declared `OwnedBy`.
    #[must_use]
    pub fn is_already_owned(&self) -> bool {
        let outer = self.outer.lock();

        let in_owning_collection = outer
            .collections
            .iter()
            .filter_map(|(_, collection)| collection.upgrade())
            .any(|collection| {
                collection
                    .outer_properties()
                    .iter()
                    .any(|outer| outer.property.relationship() == Some(Relationship::Owns))
            });

        in_owning_collection
            || outer
                .properties
                .iter()
                .any(|outer| outer.property.relationship() == Some(Relationship::OwnedBy))
    }

    pub(crate) fn bind_outer_property(
        &self,
        owner: &Arc<ObjectObserver>,
        property: &Arc<PropertyTemplate>,
    ) {
        let mut outer = self.outer.lock();
        if !outer
            .properties
            .iter()
            .any(|link| link.is(owner.id(), property.name()))
        {
            outer
                .properties
                .push(OuterProperty::new(owner, Arc::clone(property)));
        }
    }

    pub(crate) fn unbind_outer_property(&self, owner: ObserverId, property: &str) {
        self.outer
            .lock()
            .properties
            .retain(|link| !link.is(owner, property));
    }

    pub(crate) fn bind_outer_collection(&self, collection: &Arc<CollectionObserver>) {
        let mut outer = self.outer.lock();
        if !outer.collections.iter().any(|(id, _)| *id == collection.id()) {
            outer
                .collections
                .push((collection.id(), Arc::downgrade(collection)));
        }
    }

    pub(crate) fn unbind_outer_collection(&self, collection: ObserverId) {
        self.outer
            .lock()
            .collections
            .retain(|(id, _)| *id != collection);
    }

    /// Live observers that directly hold this one.
    #[must_use]
    pub fn outer_observers(&self) -> Vec<Observer> {
        let outer = self.outer.lock();

        outer
            .properties
            .iter()
            .filter_map(|link| link.owner.upgrade().map(Observer::Object))
            .chain(
                outer
                    .collections
                    .iter()
                    .filter_map(|(_, collection)| collection.upgrade().map(Observer::Collection)),
            )
            .collect()
    }

    /// Value of the id property, when the class has one and it is set.
    #[must_use]
    pub fn domain_key(&self) -> Option<Value> {
        let property = self.template.id_property()?;
        let value = self.real_object().ok()?.get(property.name()).ok()?;

        (!value.is_null()).then_some(value)
    }
}

impl fmt::Debug for ObjectObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectObserver")
            .field("id", &self.id)
            .field("type", &self.template.name())
            .field("created_at", &self.created_at)
            .field("real", &*self.real.read())
            .finish_non_exhaustive()
    }
}
