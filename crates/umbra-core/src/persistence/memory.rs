use crate::{
    error::Error,
    persistence::PersistenceService,
    traits::Declare,
    types::{ObjectRef, TypeKey},
    value::Value,
};
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::{
    collections::{HashMap, HashSet},
    sync::atomic::{AtomicUsize, Ordering},
};

///
/// MemoryPersistence
///
/// In-process store keyed by instance identity. Instances are held strongly
/// once saved, so they stay alive for as long as the store does.
///

#[derive(Debug, Default)]
pub struct MemoryPersistence {
    recognised: RwLock<HashSet<TypeKey>>,
    stored: RwLock<IndexMap<usize, ObjectRef>>,
    keys: RwLock<HashMap<TypeKey, HashSet<Value>>>,
    save_calls: AtomicUsize,
    failure: RwLock<Option<String>>,
}

impl MemoryPersistence {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn register<T: Declare>(self) -> Self {
        self.recognise(TypeKey::of::<T>());
        self
    }

    pub fn recognise(&self, type_key: TypeKey) {
        self.recognised.write().insert(type_key);
    }

    /// Seed an instance as if it had been saved earlier.
    pub fn insert_persisted(&self, instance: &ObjectRef, key: Option<Value>) {
        self.stored
            .write()
            .insert(instance.address(), instance.clone());
        if let Some(key) = key {
            self.keys
                .write()
                .entry(instance.type_key())
                .or_default()
                .insert(key);
        }
    }

    /// Make every following save fail with a persistence error.
    pub fn fail_saves(&self, message: impl Into<String>) {
        *self.failure.write() = Some(message.into());
    }

    pub fn accept_saves(&self) {
        *self.failure.write() = None;
    }

    #[must_use]
    pub fn save_calls(&self) -> usize {
        self.save_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn contains(&self, instance: &ObjectRef) -> bool {
        self.stored.read().contains_key(&instance.address())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.stored.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stored.read().is_empty()
    }
}

impl PersistenceService for MemoryPersistence {
    fn is_type_recognised(&self, type_key: &TypeKey) -> bool {
        self.recognised.read().contains(type_key)
    }

    fn is_persistent(&self, key: Option<&Value>, instance: &ObjectRef) -> bool {
        if self.contains(instance) {
            return true;
        }

        key.is_some_and(|key| {
            self.keys
                .read()
                .get(&instance.type_key())
                .is_some_and(|keys| keys.contains(key))
        })
    }

    fn save_changes(&self, instances: &[ObjectRef]) -> Result<usize, Error> {
        self.save_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = self.failure.read().clone() {
            return Err(Error::persistence(message));
        }

        let mut stored = self.stored.write();
        for instance in instances {
            stored.insert(instance.address(), instance.clone());
        }

        Ok(instances.len())
    }

    fn get_objects(&self, type_key: &TypeKey) -> Result<Vec<ObjectRef>, Error> {
        Ok(self
            .stored
            .read()
            .values()
            .filter(|instance| instance.type_key() == *type_key)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{Customer, Order};

    #[test]
    fn registered_types_are_recognised() {
        let store = MemoryPersistence::new().register::<Customer>();

        assert!(store.is_type_recognised(&TypeKey::of::<Customer>()));
        assert!(!store.is_type_recognised(&TypeKey::of::<Order>()));
    }

    #[test]
    fn persistence_is_known_by_identity_or_key() {
        let store = MemoryPersistence::new().register::<Customer>();
        let seeded = ObjectRef::new(Customer::new("Ada"));
        let other = ObjectRef::new(Customer::new("Grace"));
        let key = Value::text("customer-1");

        store.insert_persisted(&seeded, Some(key.clone()));

        assert!(store.is_persistent(None, &seeded));
        assert!(store.is_persistent(Some(&key), &other));
        assert!(!store.is_persistent(None, &other));
    }

    #[test]
    fn failed_saves_store_nothing() {
        let store = MemoryPersistence::new();
        let order = ObjectRef::new(Order::new("A-1"));
        store.fail_saves("disk full");

        let err = store
            .save_changes(std::slice::from_ref(&order))
            .expect_err("save should fail");

        assert_eq!(err.message, "disk full");
        assert_eq!(store.save_calls(), 1);
        assert!(store.is_empty());
    }
}
