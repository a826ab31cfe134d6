use crate::{
    error::{Error, ErrorClass, ErrorOrigin},
    observer::{CollectionObserver, ObjectObserver, Observer},
    proxy::{
        ProxyContext,
        interceptors::{
            CollectionAddInterceptor, CollectionRemoveInterceptor, MetaInterceptor,
            MethodInvokeInterceptor, NotifyCollectionChangedInterceptor,
            NotifyPropertyChangedInterceptor, PropertyGetInterceptor, PropertySetInterceptor,
        },
    },
    types::{CollectionRef, ObjectRef},
    value::Value,
};
use std::{fmt, sync::Arc};

///
/// Call
/// One intercepted operation on a proxied instance.
///

#[derive(Clone, Debug)]
pub enum Call {
    Get { property: String },
    Set { property: String, value: Value },
    Invoke { method: String, args: Vec<Value> },
    Add { item: ObjectRef },
    Remove { item: ObjectRef },
}

impl Call {
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Get { .. } => "get",
            Self::Set { .. } => "set",
            Self::Invoke { .. } => "invoke",
            Self::Add { .. } => "add",
            Self::Remove { .. } => "remove",
        }
    }

    /// Property or method name, for member calls.
    #[must_use]
    pub fn member(&self) -> Option<&str> {
        match self {
            Self::Get { property } | Self::Set { property, .. } => Some(property),
            Self::Invoke { method, .. } => Some(method),
            Self::Add { .. } | Self::Remove { .. } => None,
        }
    }
}

///
/// ProxyTarget
///

#[derive(Clone, Debug)]
pub enum ProxyTarget {
    Object(ObjectRef),
    Collection(CollectionRef),
}

///
/// Invocation
///
/// State passed down the interceptor chain. Interceptors may inspect or
/// rewrite the call before handing it on.
///

pub struct Invocation<'a> {
    pub call: Call,
    pub target: ProxyTarget,
    pub observer: Observer,
    pub context: &'a ProxyContext,
}

impl Invocation<'_> {
    pub fn object_observer(&self) -> Result<Arc<ObjectObserver>, Error> {
        self.observer.as_object().cloned().ok_or_else(|| {
            Error::new(
                ErrorClass::InvariantViolation,
                ErrorOrigin::Proxy,
                format!("{} requires an object observer", self.call.label()),
            )
        })
    }

    pub fn collection_observer(&self) -> Result<Arc<CollectionObserver>, Error> {
        self.observer.as_collection().cloned().ok_or_else(|| {
            Error::new(
                ErrorClass::InvariantViolation,
                ErrorOrigin::Proxy,
                format!("{} requires a collection observer", self.call.label()),
            )
        })
    }
}

///
/// Interceptor
///
/// One link of the chain. Implementations call `next.proceed` to continue
/// towards the wrapped instance, or return early to short-circuit.
///

pub trait Interceptor: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether this interceptor runs for the given call.
    fn applies_to(&self, call: &Call) -> bool {
        let _ = call;
        true
    }

    fn intercept(&self, invocation: &mut Invocation<'_>, next: Next<'_>) -> Result<Value, Error>;
}

///
/// Next
/// The remainder of the chain, ending in delegation to the wrapped instance.
///

pub struct Next<'a> {
    remaining: &'a [Arc<dyn Interceptor>],
}

impl Next<'_> {
    pub fn proceed(self, invocation: &mut Invocation<'_>) -> Result<Value, Error> {
        let mut remaining = self.remaining;

        while let Some((head, rest)) = remaining.split_first() {
            if head.applies_to(&invocation.call) {
                return head.intercept(invocation, Next { remaining: rest });
            }
            remaining = rest;
        }

        delegate(invocation)
    }
}

// Final link: perform the call on the wrapped instance.
fn delegate(invocation: &Invocation<'_>) -> Result<Value, Error> {
    match (&invocation.call, &invocation.target) {
        (Call::Get { property }, ProxyTarget::Object(object)) => Ok(object.get(property)?),
        (Call::Set { property, value }, ProxyTarget::Object(object)) => {
            object.set(property, value.clone())?;
            Ok(Value::Null)
        }
        (Call::Invoke { method, args }, ProxyTarget::Object(object)) => {
            Ok(object.invoke(method, args)?)
        }
        (Call::Add { item }, ProxyTarget::Collection(collection)) => {
            if collection.contains(item) {
                return Ok(Value::Bool(false));
            }
            collection.push(item.clone());
            Ok(Value::Bool(true))
        }
        (Call::Remove { item }, ProxyTarget::Collection(collection)) => {
            Ok(Value::Bool(collection.remove(item)))
        }
        (call, target) => Err(Error::new(
            ErrorClass::InvariantViolation,
            ErrorOrigin::Proxy,
            format!("{} cannot be applied to {target:?}", call.label()),
        )),
    }
}

///
/// InterceptorChain
///

#[derive(Clone, Default)]
pub struct InterceptorChain {
    interceptors: Vec<Arc<dyn Interceptor>>,
}

impl InterceptorChain {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Built-in chain for object proxies.
    #[must_use]
    pub fn object_default() -> Self {
        Self::new()
            .with(MetaInterceptor)
            .with(PropertyGetInterceptor)
            .with(PropertySetInterceptor)
            .with(MethodInvokeInterceptor)
            .with(NotifyPropertyChangedInterceptor)
    }

    /// Built-in chain for collection proxies.
    #[must_use]
    pub fn collection_default() -> Self {
        Self::new()
            .with(MetaInterceptor)
            .with(CollectionAddInterceptor)
            .with(CollectionRemoveInterceptor)
            .with(NotifyCollectionChangedInterceptor)
    }

    #[must_use]
    pub fn with(mut self, interceptor: impl Interceptor + 'static) -> Self {
        self.interceptors.push(Arc::new(interceptor));
        self
    }

    /// Append an interceptor; it runs after every built-in one.
    pub fn push(&mut self, interceptor: Arc<dyn Interceptor>) {
        self.interceptors.push(interceptor);
    }

    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.interceptors.iter().map(|i| i.name()).collect()
    }

    pub fn dispatch(&self, invocation: &mut Invocation<'_>) -> Result<Value, Error> {
        Next {
            remaining: &self.interceptors,
        }
        .proceed(invocation)
    }
}

impl fmt::Debug for InterceptorChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
