use crate::{
    command::{
        ActionResult, AddToCollectionCommand, CreateObjectCommand, GetPropertyCommand,
        InvokeMethodCommand, RemoveFromCollectionCommand, SaveObjectCommand, SetPropertyCommand,
        Tracked, track,
    },
    config::EngineConfig,
    error::{Error, ErrorOrigin},
    model::{ClassConfiguration, ClassConfigurations, TemplateCache},
    observer::{
        CollectionObserver, IdentityAnomaly, MethodObserver, ObjectObserver, Observer,
        ObserverCache, ObserverCacheSynchroniser, ObserverRetriever, SyncReport,
    },
    persistence::{NullPersistence, PersistenceService},
    proxy::{
        ChangeNotification, ChangeNotifier, CollectionProxy, Interceptor, InterceptorChain,
        ObjectProxy, ProxyBuilder, ProxyContext, SubscriptionId,
    },
    tracking::{Modifications, Sequence},
    traits::Declare,
    types::{CollectionRef, ObjectRef, TypeKey},
    value::Value,
};
use std::sync::Arc;

///
/// EngineBuilder
///

#[derive(Default)]
pub struct EngineBuilder {
    config: EngineConfig,
    configurations: ClassConfigurations,
    persistence: Option<Arc<dyn PersistenceService>>,
    object_interceptors: Vec<Arc<dyn Interceptor>>,
    collection_interceptors: Vec<Arc<dyn Interceptor>>,
}

impl EngineBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Register a per-type configuration. Registering a type twice fails.
    pub fn configure(mut self, configuration: ClassConfiguration) -> Result<Self, Error> {
        self.configurations
            .register(configuration)
            .map_err(|err| err.into_error(ErrorOrigin::Config))?;

        Ok(self)
    }

    #[must_use]
    pub fn persistence(mut self, persistence: Arc<dyn PersistenceService>) -> Self {
        self.persistence = Some(persistence);
        self
    }

    /// Extra interceptor for object proxies, run after the built-in ones.
    #[must_use]
    pub fn object_interceptor(mut self, interceptor: impl Interceptor + 'static) -> Self {
        self.object_interceptors.push(Arc::new(interceptor));
        self
    }

    /// Extra interceptor for collection proxies, run after the built-in ones.
    #[must_use]
    pub fn collection_interceptor(mut self, interceptor: impl Interceptor + 'static) -> Self {
        self.collection_interceptors.push(Arc::new(interceptor));
        self
    }

    pub fn build(self) -> Result<Engine, Error> {
        self.config.validate()?;

        let templates = Arc::new(TemplateCache::new(
            self.config.introspection.clone(),
            self.configurations,
        ));
        let cache = Arc::new(ObserverCache::new(
            Arc::clone(&templates),
            &self.config.tracking,
            &self.config.identity,
        ));
        let persistence = self
            .persistence
            .unwrap_or_else(|| Arc::new(NullPersistence));
        let retriever = ObserverRetriever::new(Arc::clone(&cache), persistence);
        let notifier = Arc::new(ChangeNotifier::new());
        let context = ProxyContext::new(
            ObserverCacheSynchroniser::new(retriever),
            Arc::clone(&notifier),
        );

        let mut object_chain = InterceptorChain::object_default();
        for interceptor in self.object_interceptors {
            object_chain.push(interceptor);
        }
        let mut collection_chain = InterceptorChain::collection_default();
        for interceptor in self.collection_interceptors {
            collection_chain.push(interceptor);
        }

        tracing::debug!(
            object_chain = ?object_chain,
            collection_chain = ?collection_chain,
            "engine built"
        );

        Ok(Engine {
            config: self.config,
            templates,
            cache,
            notifier,
            proxies: ProxyBuilder::with_chains(context, object_chain, collection_chain),
        })
    }
}

///
/// Engine
///
/// Application-scoped owner of the template cache, the observer cache and
/// the proxy layer. One engine serves one session; `end_session` drops every
/// observer while keeping the templates.
///

#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    templates: Arc<TemplateCache>,
    cache: Arc<ObserverCache>,
    notifier: Arc<ChangeNotifier>,
    proxies: ProxyBuilder,
}

impl Engine {
    #[must_use]
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    /// Engine with default configuration and no persistence.
    pub fn new() -> Result<Self, Error> {
        EngineBuilder::new().build()
    }

    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub const fn templates(&self) -> &Arc<TemplateCache> {
        &self.templates
    }

    #[must_use]
    pub const fn cache(&self) -> &Arc<ObserverCache> {
        &self.cache
    }

    #[must_use]
    pub const fn proxies(&self) -> &ProxyBuilder {
        &self.proxies
    }

    #[must_use]
    pub fn retriever(&self) -> &ObserverRetriever {
        self.proxies.context().retriever()
    }

    #[must_use]
    pub fn synchroniser(&self) -> &ObserverCacheSynchroniser {
        self.proxies.context().synchroniser()
    }

    #[must_use]
    pub fn persistence(&self) -> &dyn PersistenceService {
        self.retriever().persistence()
    }

    //
    // observation
    //

    /// Observe an instance and everything currently reachable from it.
    pub fn observe(&self, instance: &ObjectRef) -> Result<Arc<ObjectObserver>, Error> {
        let observer = self.retriever().object_observer(instance)?;
        self.synchroniser()
            .sync_from(&Observer::Object(Arc::clone(&observer)))?;

        Ok(observer)
    }

    pub fn observe_collection(
        &self,
        collection: &CollectionRef,
    ) -> Result<Arc<CollectionObserver>, Error> {
        let observer = self.cache.collection_observer(collection)?;
        self.synchroniser()
            .sync_from(&Observer::Collection(Arc::clone(&observer)))?;

        Ok(observer)
    }

    pub fn observe_value(&self, value: &Value) -> Result<Observer, Error> {
        self.retriever().get_observer(value)
    }

    /// Observe an instance and wrap it in a proxy.
    pub fn proxy(&self, instance: &ObjectRef) -> Result<ObjectProxy, Error> {
        let observer = self.observe(instance)?;
        self.proxies.object_proxy(&observer)
    }

    pub fn collection_proxy(&self, collection: &CollectionRef) -> Result<CollectionProxy, Error> {
        let observer = self.observe_collection(collection)?;
        self.proxies.collection_proxy(&observer)
    }

    /// Point an existing observer at a different instance of its type.
    pub fn rebind(
        &self,
        observer: &Arc<ObjectObserver>,
        instance: &ObjectRef,
    ) -> Result<(), Error> {
        self.cache.rebind_object(observer, instance)
    }

    //
    // change tracking
    //

    /// Current position of the change sequence.
    #[must_use]
    pub fn checkpoint(&self) -> u64 {
        Sequence::current()
    }

    /// Everything recorded after `checkpoint`. Reading has no side effects.
    #[must_use]
    pub fn modifications_since(&self, checkpoint: u64) -> Modifications {
        Modifications::collect(&self.cache.live_observers(), checkpoint)
    }

    /// Re-validate every live observer against its instance.
    pub fn scan_for_changes(&self) -> Result<SyncReport, Error> {
        self.synchroniser().sync_all()
    }

    /// Run `f`, rescan, and report what changed while it ran.
    pub fn track<T>(&self, f: impl FnOnce() -> Result<T, Error>) -> ActionResult<Tracked<T>> {
        track(&self.proxies, || {
            let value = f()?;
            self.scan_for_changes()?;

            Ok(value)
        })
    }

    //
    // commands
    //

    pub fn invoke_method(
        &self,
        method: &MethodObserver,
        target: &Arc<ObjectObserver>,
    ) -> ActionResult<Observer> {
        InvokeMethodCommand::new(&self.proxies).invoke(method, target)
    }

    pub fn save(&self, observer: &Arc<ObjectObserver>) -> ActionResult<Vec<Observer>> {
        SaveObjectCommand::new(self.synchroniser()).invoke(observer)
    }

    pub fn create(&self, type_key: TypeKey) -> ActionResult<Tracked<ObjectProxy>> {
        CreateObjectCommand::new(&self.proxies).invoke(type_key)
    }

    pub fn create_of<T: Declare>(&self) -> ActionResult<Tracked<ObjectProxy>> {
        self.create(TypeKey::of::<T>())
    }

    pub fn get_property(
        &self,
        observer: &Arc<ObjectObserver>,
        property: &str,
    ) -> ActionResult<Tracked<Value>> {
        GetPropertyCommand::new(&self.proxies).invoke(observer, property)
    }

    pub fn set_property(
        &self,
        observer: &Arc<ObjectObserver>,
        property: &str,
        value: impl Into<Value>,
    ) -> ActionResult<Tracked<()>> {
        SetPropertyCommand::new(&self.proxies).invoke(observer, property, value.into())
    }

    pub fn add_to_collection(
        &self,
        collection: &Arc<CollectionObserver>,
        item: &ObjectRef,
    ) -> ActionResult<Tracked<bool>> {
        AddToCollectionCommand::new(&self.proxies).invoke(collection, item)
    }

    pub fn remove_from_collection(
        &self,
        collection: &Arc<CollectionObserver>,
        item: &ObjectRef,
    ) -> ActionResult<Tracked<bool>> {
        RemoveFromCollectionCommand::new(&self.proxies).invoke(collection, item)
    }

    //
    // session
    //

    pub fn subscribe(
        &self,
        listener: impl Fn(&ChangeNotification) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.notifier.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.notifier.unsubscribe(id)
    }

    #[must_use]
    pub fn anomalies(&self) -> Vec<IdentityAnomaly> {
        self.cache.anomalies()
    }

    /// Drop every observer. Templates survive.
    pub fn end_session(&self) {
        let dropped = self.cache.len();
        self.cache.clear();
        tracing::debug!(dropped, "session ended");
    }
}
