//! Observers and the identity-preserving observer cache.
//!
//! Every live domain instance reachable from a session gets exactly one
//! observer. Observers hold their instance weakly and own its tracker.

pub(crate) mod cache;
pub(crate) mod collection;
pub(crate) mod method;
pub(crate) mod object;
pub(crate) mod property;
pub(crate) mod retriever;
pub(crate) mod sync;
pub(crate) mod value;


use crate::{tracking::ObjectTracker, types::ObserverId};
use std::sync::Arc;

// re-exports
pub use cache::{IdentityAnomaly, ObserverCache};
pub use collection::CollectionObserver;
pub use method::MethodObserver;
pub use object::ObjectObserver;
pub use property::PropertyObserver;
pub use retriever::ObserverRetriever;
pub use sync::{ObserverCacheSynchroniser, SyncReport};
pub use value::ValueObserver;

///
/// Observer
///
/// Any observer handed out by the cache. `Null` is the shared observer for
/// absent values.
///

#[derive(Clone, Debug)]
pub enum Observer {
    Null,
    Value(Arc<ValueObserver>),
    Object(Arc<ObjectObserver>),
    Collection(Arc<CollectionObserver>),
}

impl Observer {
    #[must_use]
    pub fn id(&self) -> Option<ObserverId> {
        match self {
            Self::Null => None,
            Self::Value(observer) => Some(observer.id()),
            Self::Object(observer) => Some(observer.id()),
            Self::Collection(observer) => Some(observer.id()),
        }
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub const fn as_object(&self) -> Option<&Arc<ObjectObserver>> {
        match self {
            Self::Object(observer) => Some(observer),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_collection(&self) -> Option<&Arc<CollectionObserver>> {
        match self {
            Self::Collection(observer) => Some(observer),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_value(&self) -> Option<&Arc<ValueObserver>> {
        match self {
            Self::Value(observer) => Some(observer),
            _ => None,
        }
    }

    /// Same observer instance, not merely equal state.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Value(a), Self::Value(b)) => Arc::ptr_eq(a, b),
            (Self::Object(a), Self::Object(b)) => Arc::ptr_eq(a, b),
            (Self::Collection(a), Self::Collection(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Object tracker of an object or collection observer.
    #[must_use]
    pub fn base_tracker(&self) -> Option<&ObjectTracker> {
        match self {
            Self::Object(observer) => Some(observer.tracker()),
            Self::Collection(observer) => Some(observer.tracker().base()),
            Self::Value(_) | Self::Null => None,
        }
    }

    /// Observers that directly hold this one.
    #[must_use]
    pub fn outer_observers(&self) -> Vec<Self> {
        match self {
            Self::Object(observer) => observer.outer_observers(),
            Self::Collection(observer) => observer.outer_observers(),
            Self::Value(_) | Self::Null => Vec::new(),
        }
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        match self {
            Self::Object(observer) => observer.tracker().is_dirty(),
            Self::Collection(observer) => observer.tracker().is_dirty(),
            Self::Value(_) | Self::Null => false,
        }
    }

    #[must_use]
    pub fn has_dirty_object_graph(&self) -> bool {
        self.base_tracker()
            .is_some_and(ObjectTracker::has_dirty_object_graph)
    }
}
