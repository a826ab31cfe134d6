use crate::{
    error::Error,
    observer::{ObjectObserver, Observer, ObserverCache},
    persistence::PersistenceService,
    types::ObjectRef,
    value::Value,
};
use std::{fmt, sync::Arc};

///
/// ObserverRetriever
///
/// Cache lookup that also settles persistence status. A transient observer
/// of a recognised type is asked about once more on every retrieval, so an
/// instance loaded from the store is flagged persistent on first sight.
///

#[derive(Clone)]
pub struct ObserverRetriever {
    cache: Arc<ObserverCache>,
    persistence: Arc<dyn PersistenceService>,
}

impl ObserverRetriever {
    #[must_use]
    pub fn new(cache: Arc<ObserverCache>, persistence: Arc<dyn PersistenceService>) -> Self {
        Self { cache, persistence }
    }

    #[must_use]
    pub const fn cache(&self) -> &Arc<ObserverCache> {
        &self.cache
    }

    #[must_use]
    pub fn persistence(&self) -> &dyn PersistenceService {
        self.persistence.as_ref()
    }

    pub fn get_observer(&self, value: &Value) -> Result<Observer, Error> {
        let observer = self.cache.get_observer(value)?;
        if let Observer::Object(object) = &observer {
            self.update_persistence_status(object)?;
        }

        Ok(observer)
    }

    pub fn object_observer(&self, instance: &ObjectRef) -> Result<Arc<ObjectObserver>, Error> {
        let observer = self.cache.object_observer(instance)?;
        self.update_persistence_status(&observer)?;

        Ok(observer)
    }

    fn update_persistence_status(&self, observer: &ObjectObserver) -> Result<(), Error> {
        if observer.tracker().is_persistent() {
            return Ok(());
        }
        let type_key = observer.template().type_key();
        if !self.persistence.is_type_recognised(&type_key) {
            return Ok(());
        }

        let instance = observer.real_object()?;
        let key = observer.domain_key();
        if self.persistence.is_persistent(key.as_ref(), &instance) {
            observer.mark_as_persistent();
            tracing::trace!(observer = %observer.id(), "observer marked persistent");
        }

        Ok(())
    }
}

impl fmt::Debug for ObserverRetriever {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverRetriever")
            .field("observers", &self.cache.len())
            .finish_non_exhaustive()
    }
}
