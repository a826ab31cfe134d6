use crate::{
    observer::{ObjectObserver, Observer},
    tracking::{CollectionAdd, CollectionRemove, PropertyChange},
};
use std::sync::Arc;

///
/// Modifications
///
/// Every delta recorded after a checkpoint, across all live observers,
/// ordered by sequence.
///

#[derive(Debug, Default)]
pub struct Modifications {
    pub since: u64,
    pub new_objects: Vec<Arc<ObjectObserver>>,
    pub property_changes: Vec<PropertyChange>,
    pub collection_additions: Vec<CollectionAdd>,
    pub collection_removals: Vec<CollectionRemove>,
}

impl Modifications {
    /// Gather records with `sequence > since`. Reading is side-effect free,
    /// so repeating a query returns the same records.
    #[must_use]
    pub fn collect(observers: &[Observer], since: u64) -> Self {
        let mut modifications = Self {
            since,
            ..Self::default()
        };

        for observer in observers {
            match observer {
                Observer::Object(object) => {
                    if object.created_at() > since {
                        modifications.new_objects.push(Arc::clone(object));
                    }
                    modifications
                        .property_changes
                        .extend(object.tracker().property_changes_since(since));
                }
                Observer::Collection(collection) => {
                    let tracker = collection.tracker();
                    modifications
                        .collection_additions
                        .extend(tracker.additions_since(since));
                    modifications
                        .collection_removals
                        .extend(tracker.removals_since(since));
                }
                Observer::Value(_) | Observer::Null => {}
            }
        }

        modifications.new_objects.sort_by_key(|object| object.created_at());
        modifications.property_changes.sort_by_key(|change| change.sequence);
        modifications.collection_additions.sort_by_key(|add| add.sequence);
        modifications.collection_removals.sort_by_key(|remove| remove.sequence);

        modifications
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.new_objects.is_empty()
            && self.property_changes.is_empty()
            && self.collection_additions.is_empty()
            && self.collection_removals.is_empty()
    }

    /// Total number of individual records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.new_objects.len()
            + self.property_changes.len()
            + self.collection_additions.len()
            + self.collection_removals.len()
    }
}
