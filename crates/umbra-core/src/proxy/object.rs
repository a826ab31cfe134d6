use crate::{
    error::Error,
    observer::{CollectionObserver, ObjectObserver, Observer},
    proxy::{
        ProxyContext,
        chain::{Call, InterceptorChain, Invocation, ProxyTarget},
    },
    types::{CollectionRef, ObjectRef, TypeKey},
    value::Value,
};
use std::{
    fmt,
    hash::{Hash, Hasher},
    sync::Arc,
};

struct ProxyShared {
    context: ProxyContext,
    object_chain: InterceptorChain,
    collection_chain: InterceptorChain,
}

///
/// ProxyBuilder
///
/// Wraps observed instances in proxies that share one context and one pair
/// of interceptor chains. A proxy compares and hashes by the identity of the
/// handle it wraps, so it always equals its instance.
///

#[derive(Clone)]
pub struct ProxyBuilder {
    shared: Arc<ProxyShared>,
}

impl ProxyBuilder {
    #[must_use]
    pub fn new(context: ProxyContext) -> Self {
        Self::with_chains(
            context,
            InterceptorChain::object_default(),
            InterceptorChain::collection_default(),
        )
    }

    #[must_use]
    pub fn with_chains(
        context: ProxyContext,
        object_chain: InterceptorChain,
        collection_chain: InterceptorChain,
    ) -> Self {
        Self {
            shared: Arc::new(ProxyShared {
                context,
                object_chain,
                collection_chain,
            }),
        }
    }

    #[must_use]
    pub fn context(&self) -> &ProxyContext {
        &self.shared.context
    }

    pub fn object_proxy(&self, observer: &Arc<ObjectObserver>) -> Result<ObjectProxy, Error> {
        Ok(ObjectProxy {
            target: observer.real_object()?,
            observer: Arc::clone(observer),
            shared: Arc::clone(&self.shared),
        })
    }

    pub fn collection_proxy(
        &self,
        observer: &Arc<CollectionObserver>,
    ) -> Result<CollectionProxy, Error> {
        Ok(CollectionProxy {
            target: observer.real_collection()?,
            observer: Arc::clone(observer),
            shared: Arc::clone(&self.shared),
        })
    }

    fn proxy_for(&self, value: &Value) -> Result<Option<Proxy>, Error> {
        match self.shared.context.retriever().get_observer(value)? {
            Observer::Object(observer) => {
                self.object_proxy(&observer).map(|p| Some(Proxy::Object(p)))
            }
            Observer::Collection(observer) => self
                .collection_proxy(&observer)
                .map(|p| Some(Proxy::Collection(p))),
            Observer::Value(_) | Observer::Null => Ok(None),
        }
    }
}

impl fmt::Debug for ProxyBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyBuilder")
            .field("object_chain", &self.shared.object_chain)
            .field("collection_chain", &self.shared.collection_chain)
            .finish_non_exhaustive()
    }
}

enum Proxy {
    Object(ObjectProxy),
    Collection(CollectionProxy),
}

///
/// ObjectProxy
///
/// Stand-in for one observed instance. Reads, writes and method calls pass
/// through the object interceptor chain. Compares and hashes as the wrapped
/// instance.
///

#[derive(Clone)]
pub struct ObjectProxy {
    target: ObjectRef,
    observer: Arc<ObjectObserver>,
    shared: Arc<ProxyShared>,
}

impl ObjectProxy {
    #[must_use]
    pub const fn target(&self) -> &ObjectRef {
        &self.target
    }

    #[must_use]
    pub const fn observer(&self) -> &Arc<ObjectObserver> {
        &self.observer
    }

    #[must_use]
    pub fn type_key(&self) -> TypeKey {
        self.target.type_key()
    }

    pub fn get(&self, property: &str) -> Result<Value, Error> {
        self.dispatch(Call::Get {
            property: property.to_string(),
        })
    }

    pub fn set(&self, property: &str, value: impl Into<Value>) -> Result<(), Error> {
        self.dispatch(Call::Set {
            property: property.to_string(),
            value: value.into(),
        })?;

        Ok(())
    }

    pub fn invoke(&self, method: &str, args: &[Value]) -> Result<Value, Error> {
        self.dispatch(Call::Invoke {
            method: method.to_string(),
            args: args.to_vec(),
        })
    }

    /// Proxy over an object-valued property, or `None` when it is null.
    pub fn get_object(&self, property: &str) -> Result<Option<Self>, Error> {
        let value = self.get(property)?;
        match self.builder().proxy_for(&value)? {
            Some(Proxy::Object(proxy)) => Ok(Some(proxy)),
            Some(Proxy::Collection(_)) | None => Ok(None),
        }
    }

    /// Proxy over a collection-valued property, or `None` when it is null.
    pub fn get_collection(&self, property: &str) -> Result<Option<CollectionProxy>, Error> {
        let value = self.get(property)?;
        match self.builder().proxy_for(&value)? {
            Some(Proxy::Collection(proxy)) => Ok(Some(proxy)),
            Some(Proxy::Object(_)) | None => Ok(None),
        }
    }

    fn builder(&self) -> ProxyBuilder {
        ProxyBuilder {
            shared: Arc::clone(&self.shared),
        }
    }

    fn dispatch(&self, call: Call) -> Result<Value, Error> {
        let mut invocation = Invocation {
            call,
            target: ProxyTarget::Object(self.target.clone()),
            observer: Observer::Object(Arc::clone(&self.observer)),
            context: &self.shared.context,
        };

        self.shared.object_chain.dispatch(&mut invocation)
    }
}

impl PartialEq for ObjectProxy {
    fn eq(&self, other: &Self) -> bool {
        self.target.ptr_eq(&other.target)
    }
}

impl Eq for ObjectProxy {}

impl PartialEq<ObjectRef> for ObjectProxy {
    fn eq(&self, other: &ObjectRef) -> bool {
        self.target.ptr_eq(other)
    }
}

impl Hash for ObjectProxy {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.target.address().hash(state);
    }
}

impl fmt::Debug for ObjectProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectProxy")
            .field("type", &self.observer.template().name())
            .field("observer", &self.observer.id())
            .finish_non_exhaustive()
    }
}

///
/// CollectionProxy
///

#[derive(Clone)]
pub struct CollectionProxy {
    target: CollectionRef,
    observer: Arc<CollectionObserver>,
    shared: Arc<ProxyShared>,
}

impl CollectionProxy {
    #[must_use]
    pub const fn target(&self) -> &CollectionRef {
        &self.target
    }

    #[must_use]
    pub const fn observer(&self) -> &Arc<CollectionObserver> {
        &self.observer
    }

    /// Returns whether the item was added. An item already present is left as is.
    pub fn add(&self, item: &ObjectRef) -> Result<bool, Error> {
        let added = self.dispatch(Call::Add { item: item.clone() })?;

        Ok(matches!(added, Value::Bool(true)))
    }

    /// Returns whether the item was present.
    pub fn remove(&self, item: &ObjectRef) -> Result<bool, Error> {
        let removed = self.dispatch(Call::Remove { item: item.clone() })?;

        Ok(matches!(removed, Value::Bool(true)))
    }

    #[must_use]
    pub fn items(&self) -> Vec<ObjectRef> {
        self.target.items()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.target.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.target.is_empty()
    }

    /// Proxy over the element at `index`.
    pub fn get(&self, index: usize) -> Result<Option<ObjectProxy>, Error> {
        let Some(item) = self.target.items().into_iter().nth(index) else {
            return Ok(None);
        };
        let builder = ProxyBuilder {
            shared: Arc::clone(&self.shared),
        };
        let observer = builder.context().retriever().object_observer(&item)?;

        builder.object_proxy(&observer).map(Some)
    }

    fn dispatch(&self, call: Call) -> Result<Value, Error> {
        let mut invocation = Invocation {
            call,
            target: ProxyTarget::Collection(self.target.clone()),
            observer: Observer::Collection(Arc::clone(&self.observer)),
            context: &self.shared.context,
        };

        self.shared.collection_chain.dispatch(&mut invocation)
    }
}

impl PartialEq for CollectionProxy {
    fn eq(&self, other: &Self) -> bool {
        self.target.ptr_eq(&other.target)
    }
}

impl Eq for CollectionProxy {}

impl PartialEq<CollectionRef> for CollectionProxy {
    fn eq(&self, other: &CollectionRef) -> bool {
        self.target.ptr_eq(other)
    }
}

impl Hash for CollectionProxy {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.target.address().hash(state);
    }
}

impl fmt::Debug for CollectionProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionProxy")
            .field("type", &self.observer.template().name())
            .field("len", &self.target.len())
            .finish_non_exhaustive()
    }
}
