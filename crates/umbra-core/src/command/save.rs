use crate::{
    command::{ActionResult, ConsistencyCheckCommand},
    error::Error,
    obs::sink::{self, MetricsEvent},
    observer::{ObjectObserver, Observer, ObserverCacheSynchroniser},
    tracking::DirtyObjectNotifier,
    types::ObjectRef,
};
use std::sync::Arc;

///
/// SaveObjectCommand
///
/// Persists an object together with every dirty observer in its graph.
/// The whole set is checked for consistency first; nothing is handed to the
/// store and no flag is cleared unless every check passes.
///

pub struct SaveObjectCommand<'a> {
    synchroniser: &'a ObserverCacheSynchroniser,
}

impl<'a> SaveObjectCommand<'a> {
    #[must_use]
    pub const fn new(synchroniser: &'a ObserverCacheSynchroniser) -> Self {
        Self { synchroniser }
    }

    /// Returns the observers that were saved.
    pub fn invoke(&self, observer: &Arc<ObjectObserver>) -> ActionResult<Vec<Observer>> {
        match self.execute(observer) {
            Ok(saved) => {
                let message = format!("saved {} object(s)", saved.len());
                ActionResult::passed_with(saved, vec![message])
            }
            Err(err) => ActionResult::failed(err),
        }
    }

    fn execute(&self, observer: &Arc<ObjectObserver>) -> Result<Vec<Observer>, Error> {
        self.synchroniser.sync_all()?;

        let save_set = self.save_set(observer);
        if let Err(err) = ConsistencyCheckCommand::check(&save_set) {
            let failures = err.consistency_failures().len();
            tracing::warn!(
                observer = %observer.id(),
                failures,
                "save rejected by consistency check"
            );
            sink::record(MetricsEvent::SaveRejected {
                failures: failures as u64,
            });

            return Err(err);
        }

        let instances = Self::persistable_instances(&save_set)?;
        let saved = if instances.is_empty() {
            0
        } else {
            self.synchroniser
                .retriever()
                .persistence()
                .save_changes(&instances)?
        };

        for member in &save_set {
            Self::mark_saved(member);
        }

        tracing::info!(
            observer = %observer.id(),
            saved,
            observers = save_set.len(),
            "save completed"
        );
        sink::record(MetricsEvent::SaveCompleted {
            objects: saved as u64,
        });

        Ok(save_set)
    }

    // The target when it needs saving, plus every dirty observer beneath it.
    fn save_set(&self, root: &Arc<ObjectObserver>) -> Vec<Observer> {
        let cache = self.synchroniser.retriever().cache();
        let tracker = root.tracker();
        let mut set = Vec::new();

        if tracker.is_dirty() || tracker.is_transient() || tracker.has_dirty_object_graph() {
            set.push(Observer::Object(Arc::clone(root)));
        }
        for id in tracker.dirty_objects() {
            if let Some(observer) = cache.get_observer_by_id(id)
                && !set.iter().any(|member: &Observer| member.id() == Some(id))
            {
                set.push(observer);
            }
        }

        set
    }

    fn persistable_instances(save_set: &[Observer]) -> Result<Vec<ObjectRef>, Error> {
        save_set
            .iter()
            .filter_map(Observer::as_object)
            .filter(|object| object.template().is_persistable())
            .map(|object| object.real_object())
            .collect()
    }

    fn mark_saved(member: &Observer) {
        match member {
            Observer::Object(object) => {
                object.tracker().reset_dirty_flags(None);
                if object.template().is_persistable() {
                    object.mark_as_persistent();
                }
            }
            Observer::Collection(collection) => collection.tracker().reset_dirty_flags(),
            Observer::Value(_) | Observer::Null => return,
        }

        DirtyObjectNotifier::object_is_no_longer_dirty(member);
    }
}
