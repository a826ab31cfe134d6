use crate::{
    config::{IdentityConfig, TrackingConfig},
    error::{ArgumentError, Error, ErrorClass, ErrorOrigin},
    model::TemplateCache,
    obs::sink::{self, MetricsEvent, ObserverKind},
    observer::{CollectionObserver, ObjectObserver, Observer, ValueObserver},
    tracking::{DirtyObjectNotifier, Sequence},
    types::{CollectionRef, ObjectRef, ObserverId, TypeKey},
    value::{Value, ValueKind},
};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::{
    collections::{HashMap, VecDeque},
    fmt,
    sync::Arc,
};

///
/// IdentityAnomaly
///
/// Two distinct live instances presented for one domain identity.
/// Both keep their own observer; nothing is merged.
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct IdentityAnomaly {
    pub type_name: String,
    pub domain_key: String,
    pub existing: ObserverId,
    pub incoming: ObserverId,
    pub sequence: u64,
}

#[derive(Default)]
struct CacheState {
    objects: HashMap<usize, Arc<ObjectObserver>>,
    collections: HashMap<usize, Arc<CollectionObserver>>,
    values: HashMap<Value, Arc<ValueObserver>>,
    by_id: HashMap<ObserverId, Observer>,
    by_domain_key: HashMap<(TypeKey, Value), ObserverId>,
}

impl CacheState {
    // An existing observer for the same domain key bound to another live instance.
    fn conflicting_observer(
        &self,
        key: &(TypeKey, Value),
        instance: &ObjectRef,
    ) -> Option<ObserverId> {
        let id = self.by_domain_key.get(key)?;
        match self.by_id.get(id)? {
            Observer::Object(existing)
                if existing.is_alive() && !existing.is_bound_to(instance) =>
            {
                Some(*id)
            }
            _ => None,
        }
    }
}

///
/// ObserverCache
///
/// Identity map from live instances to their observers. Reference instances
/// are keyed by allocation and held weakly; scalars are keyed by value.
/// At most one observer exists per live reference instance.
///

pub struct ObserverCache {
    templates: Arc<TemplateCache>,
    lazy_load_persistent: bool,
    anomaly_log_limit: usize,
    reject_duplicates: bool,
    state: RwLock<CacheState>,
    anomalies: Mutex<VecDeque<IdentityAnomaly>>,
}

impl ObserverCache {
    #[must_use]
    pub fn new(
        templates: Arc<TemplateCache>,
        tracking: &TrackingConfig,
        identity: &IdentityConfig,
    ) -> Self {
        Self {
            templates,
            lazy_load_persistent: tracking.lazy_load_persistent,
            anomaly_log_limit: identity.anomaly_log_limit,
            reject_duplicates: identity.reject_duplicates,
            state: RwLock::new(CacheState::default()),
            anomalies: Mutex::new(VecDeque::new()),
        }
    }

    #[must_use]
    pub const fn templates(&self) -> &Arc<TemplateCache> {
        &self.templates
    }

    /// Observer for any value; null maps to [`Observer::Null`].
    pub fn get_observer(&self, value: &Value) -> Result<Observer, Error> {
        match value {
            Value::Null => Ok(Observer::Null),
            Value::Object(instance) => self.object_observer(instance).map(Observer::Object),
            Value::Collection(collection) => {
                self.collection_observer(collection).map(Observer::Collection)
            }
            scalar => self.value_observer(scalar).map(Observer::Value),
        }
    }

    /// Observer for a value that must be of the given kind.
    pub fn get_observer_as(&self, value: &Value, kind: &ValueKind) -> Result<Observer, Error> {
        if !value.matches(kind) {
            return Err(ArgumentError::UnexpectedObserver {
                expected: kind.to_string(),
                actual: value.kind_label(),
            }
            .into_error(ErrorOrigin::Cache));
        }

        self.get_observer(value)
    }

    /// Existing observer for a value, without creating one.
    #[must_use]
    pub fn find_observer(&self, value: &Value) -> Option<Observer> {
        let state = self.state.read();

        match value {
            Value::Null => Some(Observer::Null),
            Value::Object(instance) => state
                .objects
                .get(&instance.address())
                .filter(|observer| observer.is_bound_to(instance))
                .map(|observer| Observer::Object(Arc::clone(observer))),
            Value::Collection(collection) => state
                .collections
                .get(&collection.address())
                .filter(|observer| observer.is_bound_to(collection))
                .map(|observer| Observer::Collection(Arc::clone(observer))),
            scalar => state
                .values
                .get(scalar)
                .map(|observer| Observer::Value(Arc::clone(observer))),
        }
    }

    pub fn object_observer(&self, instance: &ObjectRef) -> Result<Arc<ObjectObserver>, Error> {
        let address = instance.address();
        if let Some(existing) = self.state.read().objects.get(&address)
            && existing.is_bound_to(instance)
        {
            return Ok(Arc::clone(existing));
        }

        let template = self.templates.class_template(instance.type_key())?;
        template.finalise();

        let mut state = self.state.write();
        if let Some(existing) = state.objects.get(&address)
            && existing.is_bound_to(instance)
        {
            return Ok(Arc::clone(existing));
        }

        let observer = Arc::new(ObjectObserver::new(
            Arc::clone(&template),
            instance,
            self.lazy_load_persistent,
        ));
        observer.establish_baseline()?;

        let mut anomaly = None;
        if let Some(domain_key) = observer.domain_key() {
            let key = (template.type_key(), domain_key);
            if let Some(existing) = state.conflicting_observer(&key, instance) {
                let detected = IdentityAnomaly {
                    type_name: template.name().to_string(),
                    domain_key: key.1.to_string(),
                    existing,
                    incoming: observer.id(),
                    sequence: Sequence::next(),
                };
                if self.reject_duplicates {
                    drop(state);
                    self.report_anomaly(template.type_key(), detected.clone());
                    return Err(Error::new(
                        ErrorClass::IdentityAnomaly,
                        ErrorOrigin::Cache,
                        format!(
                            "{} {} is already observed through another instance",
                            detected.type_name, detected.domain_key
                        ),
                    ));
                }
                anomaly = Some(detected);
            }
            state.by_domain_key.insert(key, observer.id());
        }

        if let Some(stale) = state.objects.insert(address, Arc::clone(&observer)) {
            state.by_id.remove(&stale.id());
        }
        state
            .by_id
            .insert(observer.id(), Observer::Object(Arc::clone(&observer)));
        drop(state);

        if let Some(anomaly) = anomaly {
            self.report_anomaly(template.type_key(), anomaly);
        }
        tracing::debug!(
            observer = %observer.id(),
            class = %template.name(),
            "object observer created"
        );
        sink::record(MetricsEvent::ObserverCreated {
            kind: ObserverKind::Object,
            type_path: template.type_key().path(),
        });

        Ok(observer)
    }

    pub fn collection_observer(
        &self,
        collection: &CollectionRef,
    ) -> Result<Arc<CollectionObserver>, Error> {
        let address = collection.address();
        if let Some(existing) = self.state.read().collections.get(&address)
            && existing.is_bound_to(collection)
        {
            return Ok(Arc::clone(existing));
        }

        let template = self.templates.collection_template(collection.element_type())?;
        template.element().finalise();

        let mut state = self.state.write();
        if let Some(existing) = state.collections.get(&address)
            && existing.is_bound_to(collection)
        {
            return Ok(Arc::clone(existing));
        }

        let observer = Arc::new(CollectionObserver::new(Arc::clone(&template), collection));
        observer.establish_baseline()?;
        if let Some(stale) = state.collections.insert(address, Arc::clone(&observer)) {
            state.by_id.remove(&stale.id());
        }
        state
            .by_id
            .insert(observer.id(), Observer::Collection(Arc::clone(&observer)));
        drop(state);

        tracing::debug!(
            observer = %observer.id(),
            collection = %template.name(),
            "collection observer created"
        );
        sink::record(MetricsEvent::ObserverCreated {
            kind: ObserverKind::Collection,
            type_path: collection.element_type().path(),
        });

        Ok(observer)
    }

    pub fn value_observer(&self, value: &Value) -> Result<Arc<ValueObserver>, Error> {
        let Some(kind) = value.scalar_kind() else {
            return Err(ArgumentError::UnexpectedObserver {
                expected: "scalar".to_string(),
                actual: value.kind_label(),
            }
            .into_error(ErrorOrigin::Cache));
        };
        if let Some(existing) = self.state.read().values.get(value) {
            return Ok(Arc::clone(existing));
        }

        let template = self.templates.value_template(kind);
        let mut state = self.state.write();
        let observer = Arc::clone(
            state
                .values
                .entry(value.clone())
                .or_insert_with(|| Arc::new(ValueObserver::new(template, value.clone()))),
        );
        state
            .by_id
            .entry(observer.id())
            .or_insert_with(|| Observer::Value(Arc::clone(&observer)));

        Ok(observer)
    }

    #[must_use]
    pub fn get_observer_by_id(&self, id: ObserverId) -> Option<Observer> {
        self.state.read().by_id.get(&id).cloned()
    }

    /// Most recently observed instance for a domain key.
    #[must_use]
    pub fn get_observer_by_domain_key(
        &self,
        type_key: TypeKey,
        key: &Value,
    ) -> Option<Arc<ObjectObserver>> {
        let state = self.state.read();
        let id = state.by_domain_key.get(&(type_key, key.clone()))?;

        match state.by_id.get(id)? {
            Observer::Object(observer) if observer.is_alive() => Some(Arc::clone(observer)),
            _ => None,
        }
    }

    /// Object and collection observers whose instance is still alive, in
    /// creation order.
    #[must_use]
    pub fn live_observers(&self) -> Vec<Observer> {
        let state = self.state.read();
        let mut live: Vec<(u64, Observer)> = state
            .objects
            .values()
            .filter(|observer| observer.is_alive())
            .map(|observer| (observer.created_at(), Observer::Object(Arc::clone(observer))))
            .chain(
                state
                    .collections
                    .values()
                    .filter(|observer| observer.is_alive())
                    .map(|observer| {
                        (
                            observer.created_at(),
                            Observer::Collection(Arc::clone(observer)),
                        )
                    }),
            )
            .collect();
        live.sort_by_key(|(created_at, _)| *created_at);

        live.into_iter().map(|(_, observer)| observer).collect()
    }

    /// Rebind an observer to a different instance and move its cache key.
    pub fn rebind_object(
        &self,
        observer: &Arc<ObjectObserver>,
        instance: &ObjectRef,
    ) -> Result<(), Error> {
        let previous = observer.real_object().ok();
        let was_dirty = observer.tracker().is_dirty();
        observer.set_real_object(instance)?;
        if was_dirty {
            DirtyObjectNotifier::object_is_no_longer_dirty(&Observer::Object(Arc::clone(observer)));
        }

        let mut state = self.state.write();
        if let Some(previous) = previous
            && state
                .objects
                .get(&previous.address())
                .is_some_and(|entry| Arc::ptr_eq(entry, observer))
        {
            state.objects.remove(&previous.address());
        }
        if let Some(displaced) = state.objects.insert(instance.address(), Arc::clone(observer))
            && !Arc::ptr_eq(&displaced, observer)
        {
            state.by_id.remove(&displaced.id());
        }
        if let Some(domain_key) = observer.domain_key() {
            state
                .by_domain_key
                .insert((observer.template().type_key(), domain_key), observer.id());
        }

        Ok(())
    }

    /// Drop observers whose instance is gone. Returns how many were removed.
    pub fn purge(&self) -> usize {
        let mut state = self.state.write();
        let before = state.objects.len() + state.collections.len();

        state.objects.retain(|_, observer| observer.is_alive());
        state.collections.retain(|_, observer| observer.is_alive());

        let CacheState {
            objects,
            collections,
            by_id,
            by_domain_key,
            ..
        } = &mut *state;
        by_id.retain(|_, observer| match observer {
            Observer::Object(o) => objects.values().any(|live| Arc::ptr_eq(live, o)),
            Observer::Collection(c) => collections.values().any(|live| Arc::ptr_eq(live, c)),
            Observer::Value(_) | Observer::Null => true,
        });
        by_domain_key.retain(|_, id| by_id.contains_key(id));

        let removed = before - (objects.len() + collections.len());
        if removed > 0 {
            tracing::debug!(removed, "stale observers purged");
        }

        removed
    }

    /// Drop every observer.
    pub fn clear(&self) {
        *self.state.write() = CacheState::default();
        self.anomalies.lock().clear();
    }

    /// Number of cached object, collection and value observers.
    #[must_use]
    pub fn len(&self) -> usize {
        let state = self.state.read();
        state.objects.len() + state.collections.len() + state.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn anomalies(&self) -> Vec<IdentityAnomaly> {
        self.anomalies.lock().iter().cloned().collect()
    }

    fn report_anomaly(&self, type_key: TypeKey, anomaly: IdentityAnomaly) {
        tracing::warn!(
            class = %anomaly.type_name,
            key = %anomaly.domain_key,
            existing = %anomaly.existing,
            incoming = %anomaly.incoming,
            "identity anomaly: two live instances share one domain key"
        );
        sink::record(MetricsEvent::IdentityAnomaly {
            type_path: type_key.path(),
        });

        let mut log = self.anomalies.lock();
        log.push_back(anomaly);
        while log.len() > self.anomaly_log_limit {
            log.pop_front();
        }
    }
}

impl fmt::Debug for ObserverCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        f.debug_struct("ObserverCache")
            .field("objects", &state.objects.len())
            .field("collections", &state.collections.len())
            .field("values", &state.values.len())
            .field("anomalies", &self.anomalies.lock().len())
            .finish_non_exhaustive()
    }
}
