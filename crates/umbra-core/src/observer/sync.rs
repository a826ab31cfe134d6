use crate::{
    error::Error,
    obs::sink::{self, MetricsEvent},
    observer::{CollectionObserver, ObjectObserver, Observer, ObserverRetriever},
    tracking::DirtyObjectNotifier,
    types::ObserverId,
};
use serde::Serialize;
use std::{
    collections::{HashSet, VecDeque},
    sync::Arc,
};

///
/// SyncReport
/// What one synchronisation pass found.
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub struct SyncReport {
    pub visited: usize,
    pub property_changes: usize,
    pub additions: usize,
    pub removals: usize,
    pub retractions: usize,
}

impl SyncReport {
    #[must_use]
    pub const fn has_changes(&self) -> bool {
        self.property_changes + self.additions + self.removals + self.retractions > 0
    }
}

///
/// ObserverCacheSynchroniser
///
/// Re-validates observers against their live instances. Starting from one
/// or more roots it diffs every reachable object and collection, binds the
/// outer links used for dirty propagation, and observes anything new.
///

#[derive(Clone, Debug)]
pub struct ObserverCacheSynchroniser {
    retriever: ObserverRetriever,
}

impl ObserverCacheSynchroniser {
    #[must_use]
    pub const fn new(retriever: ObserverRetriever) -> Self {
        Self { retriever }
    }

    #[must_use]
    pub const fn retriever(&self) -> &ObserverRetriever {
        &self.retriever
    }

    /// Scan every live observer in the cache.
    pub fn sync_all(&self) -> Result<SyncReport, Error> {
        self.sync(self.retriever.cache().live_observers())
    }

    /// Scan everything reachable from one observer.
    pub fn sync_from(&self, root: &Observer) -> Result<SyncReport, Error> {
        self.sync(vec![root.clone()])
    }

    fn sync(&self, roots: Vec<Observer>) -> Result<SyncReport, Error> {
        let mut report = SyncReport::default();
        let mut visited: HashSet<ObserverId> = HashSet::new();
        let mut queue: VecDeque<Observer> = roots.into();

        while let Some(observer) = queue.pop_front() {
            let Some(id) = observer.id() else {
                continue;
            };
            if !visited.insert(id) {
                continue;
            }
            report.visited += 1;

            match &observer {
                Observer::Object(object) => self.sync_object(object, &mut queue, &mut report)?,
                Observer::Collection(collection) => {
                    self.sync_collection(collection, &mut queue, &mut report)?;
                }
                Observer::Value(_) | Observer::Null => {}
            }
        }

        if report.has_changes() {
            tracing::debug!(
                visited = report.visited,
                property_changes = report.property_changes,
                additions = report.additions,
                removals = report.removals,
                retractions = report.retractions,
                "changes detected"
            );
            sink::record(MetricsEvent::ChangesDetected {
                property_changes: report.property_changes as u64,
                additions: report.additions as u64,
                removals: report.removals as u64,
            });
        }

        Ok(report)
    }

    fn sync_object(
        &self,
        object: &Arc<ObjectObserver>,
        queue: &mut VecDeque<Observer>,
        report: &mut SyncReport,
    ) -> Result<(), Error> {
        let Ok(instance) = object.real_object() else {
            tracing::warn!(observer = %object.id(), "skipping observer whose instance was dropped");
            return Ok(());
        };

        let changes = object.detect_changes()?;
        report.property_changes += changes.len();
        for change in &changes {
            match self.retriever.cache().find_observer(&change.old) {
                Some(Observer::Object(previous)) => {
                    previous.unbind_outer_property(object.id(), &change.property);
                }
                Some(Observer::Collection(previous)) => {
                    previous.unbind_outer_property(object.id(), &change.property);
                }
                _ => {}
            }
        }
        if !changes.is_empty() {
            DirtyObjectNotifier::object_is_dirty(&Observer::Object(Arc::clone(object)));
        }

        for property in object.properties().values() {
            let template = property.template();
            if template.is_non_reference() || property.is_lazy_load_pending() {
                continue;
            }
            let value = match instance.get(template.name()) {
                Ok(value) => value,
                Err(err) => {
                    tracing::trace!(
                        property = %template.full_name(),
                        error = %err,
                        "property skipped during sync"
                    );
                    continue;
                }
            };

            let child = self.retriever.get_observer(&value)?;
            match &child {
                Observer::Object(inner) => {
                    inner.bind_outer_property(object, template);
                    if changes.iter().any(|change| change.property == template.name()) {
                        Self::mark_attached(inner);
                    }
                }
                Observer::Collection(inner) => inner.bind_outer_property(object, template),
                Observer::Value(_) | Observer::Null => {}
            }
            Self::propagate_existing(&child);

            property.set_resolved((!child.is_null()).then(|| child.clone()));
            queue.push_back(child);
        }

        Ok(())
    }

    fn sync_collection(
        &self,
        collection: &Arc<CollectionObserver>,
        queue: &mut VecDeque<Observer>,
        report: &mut SyncReport,
    ) -> Result<(), Error> {
        let Ok(live) = collection.real_collection() else {
            tracing::warn!(
                observer = %collection.id(),
                "skipping collection observer whose collection was dropped"
            );
            return Ok(());
        };

        let changes = collection.detect_changes(|item| self.retriever.object_observer(item))?;
        report.additions += changes.added.len();
        report.removals += changes.removed.len();
        report.retractions += changes.retracted.len();

        for add in &changes.added {
            Self::attach_element(collection, &add.element);
        }
        for remove in &changes.removed {
            remove.element.unbind_outer_collection(collection.id());
        }
        for element in &changes.retracted {
            Self::retract_element(collection, element);
        }
        if !changes.added.is_empty() || !changes.removed.is_empty() {
            DirtyObjectNotifier::object_is_dirty(&Observer::Collection(Arc::clone(collection)));
        }
        if !changes.retracted.is_empty() && !collection.tracker().is_dirty() {
            DirtyObjectNotifier::object_is_no_longer_dirty(&Observer::Collection(Arc::clone(
                collection,
            )));
        }

        for item in live.items() {
            let element = self.retriever.object_observer(&item)?;
            element.bind_outer_collection(collection);

            let element = Observer::Object(element);
            Self::propagate_existing(&element);
            queue.push_back(element);
        }

        Ok(())
    }

    /// Link a newly added element to its collection and flag it for saving.
    pub(crate) fn attach_element(
        collection: &Arc<CollectionObserver>,
        element: &Arc<ObjectObserver>,
    ) {
        element.bind_outer_collection(collection);
        Self::mark_attached(element);
        Self::propagate_existing(&Observer::Object(Arc::clone(element)));
    }

    /// Undo the dirty propagation of an element whose addition was withdrawn.
    pub(crate) fn retract_element(
        collection: &Arc<CollectionObserver>,
        element: &Arc<ObjectObserver>,
    ) {
        DirtyObjectNotifier::object_is_no_longer_dirty(&Observer::Object(Arc::clone(element)));
        element.unbind_outer_collection(collection.id());
    }

    // A never-saved persistable object reached through a change must be saved
    // with its new owner.
    fn mark_attached(element: &ObjectObserver) {
        let tracker = element.tracker();
        if tracker.is_transient() && element.template().is_persistable() && !tracker.is_dirty() {
            tracker.mark_dirty();
        }
    }

    // Re-announce dirty state below a freshly bound child to its new owners.
    fn propagate_existing(child: &Observer) {
        let Some(tracker) = child.base_tracker() else {
            return;
        };
        if child.is_dirty() {
            DirtyObjectNotifier::object_is_dirty(child);
        }
        for id in tracker.dirty_objects() {
            DirtyObjectNotifier::propagate(child, id);
        }
    }
}
