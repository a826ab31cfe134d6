//! Interceptor-chain proxies over observed instances.
//!
//! Every proxied call becomes a [`Call`] routed through an
//! [`InterceptorChain`]; the last link delegates to the wrapped instance.

pub(crate) mod chain;
pub(crate) mod interceptors;
pub(crate) mod notify;
pub(crate) mod object;


use crate::observer::{ObserverCacheSynchroniser, ObserverRetriever};
use std::sync::Arc;

// re-exports
pub use chain::{Call, Interceptor, InterceptorChain, Invocation, Next, ProxyTarget};
pub use interceptors::{
    CollectionAddInterceptor, CollectionRemoveInterceptor, MetaInterceptor,
    MethodInvokeInterceptor, NotifyCollectionChangedInterceptor, NotifyPropertyChangedInterceptor,
    PropertyGetInterceptor, PropertySetInterceptor,
};
pub use notify::{ChangeNotification, ChangeNotifier, CollectionAction, SubscriptionId};
pub use object::{CollectionProxy, ObjectProxy, ProxyBuilder};

///
/// ProxyContext
/// Engine services visible to interceptors.
///

#[derive(Clone, Debug)]
pub struct ProxyContext {
    synchroniser: ObserverCacheSynchroniser,
    notifier: Arc<ChangeNotifier>,
}

impl ProxyContext {
    #[must_use]
    pub const fn new(
        synchroniser: ObserverCacheSynchroniser,
        notifier: Arc<ChangeNotifier>,
    ) -> Self {
        Self {
            synchroniser,
            notifier,
        }
    }

    #[must_use]
    pub const fn retriever(&self) -> &ObserverRetriever {
        self.synchroniser.retriever()
    }

    #[must_use]
    pub const fn synchroniser(&self) -> &ObserverCacheSynchroniser {
        &self.synchroniser
    }

    #[must_use]
    pub const fn notifier(&self) -> &Arc<ChangeNotifier> {
        &self.notifier
    }
}
