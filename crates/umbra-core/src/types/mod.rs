//! Shared handle types for domain instances and observers.
//!
//! Domain objects live behind [`ObjectRef`], a shared handle whose identity
//! is its allocation. Collections of domain objects live behind
//! [`CollectionRef`]. Both hand out weak counterparts so the observer cache
//! never keeps an instance alive.

#[cfg(test)]
mod tests;

use crate::{
    model::ClassDeclaration,
    traits::{Declare, DomainObject, MemberError},
    value::Value,
};
use derive_more::Display;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use serde::{Deserialize, Serialize};
use std::{
    any::{Any, TypeId},
    fmt,
    hash::{Hash, Hasher},
    sync::{Arc, Weak},
};
use ulid::Ulid;

///
/// TypeKey
///
/// Runtime identity of a declared domain type.
/// Carries the declaration entry point so templates can be built lazily.
///

#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    path: &'static str,
    declare: fn() -> ClassDeclaration,
}

impl TypeKey {
    #[must_use]
    pub fn of<T: Declare>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            path: std::any::type_name::<T>(),
            declare: T::declaration,
        }
    }

    #[must_use]
    pub const fn type_id(&self) -> TypeId {
        self.id
    }

    /// Fully qualified Rust path of the type.
    #[must_use]
    pub const fn path(&self) -> &'static str {
        self.path
    }

    #[must_use]
    pub fn short_name(&self) -> &'static str {
        self.path.rsplit("::").next().unwrap_or(self.path)
    }

    #[must_use]
    pub fn declaration(&self) -> ClassDeclaration {
        (self.declare)()
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeKey({})", self.path)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path)
    }
}

///
/// ObserverId
///
/// Stable identity assigned to an observer, independent of any domain key.
///

#[derive(
    Clone, Copy, Debug, Deserialize, Display, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
pub struct ObserverId(Ulid);

impl ObserverId {
    #[must_use]
    pub fn generate() -> Self {
        Self(Ulid::new())
    }

    #[must_use]
    pub const fn ulid(&self) -> Ulid {
        self.0
    }
}

///
/// ObjectRef
///
/// Shared handle to a live domain instance.
/// Equality and hashing follow allocation identity, never domain state.
///

#[derive(Clone)]
pub struct ObjectRef(Arc<ObjectCell>);

struct ObjectCell {
    type_key: TypeKey,
    inner: RwLock<Box<dyn DomainObject>>,
}

impl ObjectRef {
    pub fn new<T: Declare>(value: T) -> Self {
        Self(Arc::new(ObjectCell {
            type_key: TypeKey::of::<T>(),
            inner: RwLock::new(Box::new(value)),
        }))
    }

    #[must_use]
    pub fn type_key(&self) -> TypeKey {
        self.0.type_key
    }

    /// Allocation address, used as the identity-map key.
    #[must_use]
    pub fn address(&self) -> usize {
        Arc::as_ptr(&self.0).addr()
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    #[must_use]
    pub fn downgrade(&self) -> WeakObjectRef {
        WeakObjectRef(Arc::downgrade(&self.0))
    }

    pub fn get(&self, name: &str) -> Result<Value, MemberError> {
        self.0.inner.read().get(name)
    }

    pub fn set(&self, name: &str, value: Value) -> Result<(), MemberError> {
        self.0.inner.write().set(name, value)
    }

    pub fn invoke(&self, name: &str, args: &[Value]) -> Result<Value, MemberError> {
        self.0.inner.write().invoke(name, args)
    }

    pub fn check_consistency(&self) -> Result<(), Vec<String>> {
        self.0.inner.read().check_consistency()
    }

    #[must_use]
    pub fn read(&self) -> RwLockReadGuard<'_, Box<dyn DomainObject>> {
        self.0.inner.read()
    }

    #[must_use]
    pub fn write(&self) -> RwLockWriteGuard<'_, Box<dyn DomainObject>> {
        self.0.inner.write()
    }

    /// Borrow the instance as its concrete type.
    pub fn with<T: DomainObject, R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        let guard = self.0.inner.read();
        let any: &dyn Any = &**guard;

        any.downcast_ref::<T>().map(f)
    }

    /// Mutably borrow the instance as its concrete type, bypassing interception.
    pub fn with_mut<T: DomainObject, R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        let mut guard = self.0.inner.write();
        let any: &mut dyn Any = &mut **guard;

        any.downcast_mut::<T>().map(f)
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for ObjectRef {}

impl Hash for ObjectRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.address().hash(state);
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{:#x}",
            self.0.type_key.short_name(),
            self.address()
        )
    }
}

///
/// WeakObjectRef
///

#[derive(Clone, Default)]
pub struct WeakObjectRef(Weak<ObjectCell>);

impl WeakObjectRef {
    #[must_use]
    pub fn upgrade(&self) -> Option<ObjectRef> {
        self.0.upgrade().map(ObjectRef)
    }

    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.0.strong_count() > 0
    }

    /// True if this weak handle points at the given live instance.
    #[must_use]
    pub fn refers_to(&self, instance: &ObjectRef) -> bool {
        std::ptr::eq(self.0.as_ptr(), Arc::as_ptr(&instance.0))
    }
}

impl fmt::Debug for WeakObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upgrade() {
            Some(obj) => write!(f, "Weak({obj:?})"),
            None => write!(f, "Weak(<dropped>)"),
        }
    }
}

///
/// CollectionRef
///
/// Shared handle to an ordered collection of domain objects.
/// Items are compared by reference identity.
///

#[derive(Clone)]
pub struct CollectionRef(Arc<CollectionCell>);

struct CollectionCell {
    element: TypeKey,
    items: RwLock<Vec<ObjectRef>>,
}

impl CollectionRef {
    #[must_use]
    pub fn new<T: Declare>() -> Self {
        Self::of(TypeKey::of::<T>())
    }

    #[must_use]
    pub fn of(element: TypeKey) -> Self {
        Self(Arc::new(CollectionCell {
            element,
            items: RwLock::new(Vec::new()),
        }))
    }

    #[must_use]
    pub fn element_type(&self) -> TypeKey {
        self.0.element
    }

    #[must_use]
    pub fn address(&self) -> usize {
        Arc::as_ptr(&self.0).addr()
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    #[must_use]
    pub fn downgrade(&self) -> WeakCollectionRef {
        WeakCollectionRef(Arc::downgrade(&self.0))
    }

    pub fn push(&self, item: ObjectRef) {
        self.0.items.write().push(item);
    }

    /// Remove the first occurrence of `item`; returns whether anything was removed.
    pub fn remove(&self, item: &ObjectRef) -> bool {
        let mut items = self.0.items.write();
        match items.iter().position(|candidate| candidate.ptr_eq(item)) {
            Some(index) => {
                items.remove(index);
                true
            }
            None => false,
        }
    }

    /// Replace the whole contents in one step.
    pub fn replace(&self, items: Vec<ObjectRef>) {
        *self.0.items.write() = items;
    }

    /// Copy of the current contents.
    #[must_use]
    pub fn items(&self) -> Vec<ObjectRef> {
        self.0.items.read().clone()
    }

    #[must_use]
    pub fn contains(&self, item: &ObjectRef) -> bool {
        self.0.items.read().iter().any(|candidate| candidate.ptr_eq(item))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.items.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.items.read().is_empty()
    }
}

impl PartialEq for CollectionRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for CollectionRef {}

impl Hash for CollectionRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.address().hash(state);
    }
}

impl fmt::Debug for CollectionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Collection<{}>@{:#x}",
            self.0.element.short_name(),
            self.address()
        )
    }
}

///
/// WeakCollectionRef
///

#[derive(Clone, Default)]
pub struct WeakCollectionRef(Weak<CollectionCell>);

impl WeakCollectionRef {
    #[must_use]
    pub fn upgrade(&self) -> Option<CollectionRef> {
        self.0.upgrade().map(CollectionRef)
    }

    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.0.strong_count() > 0
    }

    #[must_use]
    pub fn refers_to(&self, collection: &CollectionRef) -> bool {
        std::ptr::eq(self.0.as_ptr(), Arc::as_ptr(&collection.0))
    }
}

impl fmt::Debug for WeakCollectionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upgrade() {
            Some(coll) => write!(f, "Weak({coll:?})"),
            None => write!(f, "Weak(<dropped>)"),
        }
    }
}
