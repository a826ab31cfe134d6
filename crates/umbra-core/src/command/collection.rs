use crate::{
    command::{ActionResult, Tracked, track},
    observer::CollectionObserver,
    proxy::ProxyBuilder,
    types::ObjectRef,
};
use std::sync::Arc;

///
/// AddToCollectionCommand
///

pub struct AddToCollectionCommand<'a> {
    proxies: &'a ProxyBuilder,
}

impl<'a> AddToCollectionCommand<'a> {
    #[must_use]
    pub const fn new(proxies: &'a ProxyBuilder) -> Self {
        Self { proxies }
    }

    /// The tracked value reports whether the item was added.
    pub fn invoke(
        &self,
        collection: &Arc<CollectionObserver>,
        item: &ObjectRef,
    ) -> ActionResult<Tracked<bool>> {
        track(self.proxies, || {
            self.proxies.collection_proxy(collection)?.add(item)
        })
    }
}

///
/// RemoveFromCollectionCommand
/// The tracked value reports whether the item was present.
///

pub struct RemoveFromCollectionCommand<'a> {
    proxies: &'a ProxyBuilder,
}

impl<'a> RemoveFromCollectionCommand<'a> {
    #[must_use]
    pub const fn new(proxies: &'a ProxyBuilder) -> Self {
        Self { proxies }
    }

    pub fn invoke(
        &self,
        collection: &Arc<CollectionObserver>,
        item: &ObjectRef,
    ) -> ActionResult<Tracked<bool>> {
        track(self.proxies, || {
            self.proxies.collection_proxy(collection)?.remove(item)
        })
    }
}
