//! Change tracking: snapshots, trackers, change records and dirty-graph
//! propagation.
//!
//! Every record draws its number from one process-wide [`Sequence`], which
//! makes "everything since checkpoint N" an exact filter.

pub(crate) mod collection;
pub(crate) mod modifications;
pub(crate) mod notifier;
pub(crate) mod object;
pub(crate) mod record;
pub(crate) mod sequence;
pub(crate) mod snapshot;


// re-exports
pub use collection::{CollectionChanges, CollectionItemsTracker, CollectionTracker, RemovalOutcome};
pub use modifications::Modifications;
pub use notifier::DirtyObjectNotifier;
pub use object::ObjectTracker;
pub use record::{CollectionAdd, CollectionRemove, PropertyChange};
pub use sequence::Sequence;
pub use snapshot::Snapshot;
