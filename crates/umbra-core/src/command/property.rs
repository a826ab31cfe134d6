use crate::{
    command::{ActionResult, Tracked, track},
    observer::ObjectObserver,
    proxy::ProxyBuilder,
    value::Value,
};
use std::sync::Arc;

///
/// GetPropertyCommand
/// Reads a property through the proxy chain; reading a reference loads it.
///

pub struct GetPropertyCommand<'a> {
    proxies: &'a ProxyBuilder,
}

impl<'a> GetPropertyCommand<'a> {
    #[must_use]
    pub const fn new(proxies: &'a ProxyBuilder) -> Self {
        Self { proxies }
    }

    pub fn invoke(
        &self,
        observer: &Arc<ObjectObserver>,
        property: &str,
    ) -> ActionResult<Tracked<Value>> {
        track(self.proxies, || {
            self.proxies.object_proxy(observer)?.get(property)
        })
    }
}

///
/// SetPropertyCommand
///

pub struct SetPropertyCommand<'a> {
    proxies: &'a ProxyBuilder,
}

impl<'a> SetPropertyCommand<'a> {
    #[must_use]
    pub const fn new(proxies: &'a ProxyBuilder) -> Self {
        Self { proxies }
    }

    pub fn invoke(
        &self,
        observer: &Arc<ObjectObserver>,
        property: &str,
        value: Value,
    ) -> ActionResult<Tracked<()>> {
        track(self.proxies, || {
            self.proxies.object_proxy(observer)?.set(property, value)
        })
    }
}
