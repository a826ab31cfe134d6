use crate::{observer::ObjectObserver, types::ObserverId, value::Value};
use std::{fmt, sync::Arc};

///
/// PropertyChange
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PropertyChange {
    pub sequence: u64,
    pub object: ObserverId,
    pub property: String,
    pub old: Value,
    pub new: Value,
}

///
/// CollectionAdd
///

#[derive(Clone)]
pub struct CollectionAdd {
    pub sequence: u64,
    pub collection: ObserverId,
    pub element: Arc<ObjectObserver>,
}

impl fmt::Debug for CollectionAdd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionAdd")
            .field("sequence", &self.sequence)
            .field("collection", &self.collection)
            .field("element", &self.element.id())
            .finish()
    }
}

///
/// CollectionRemove
///

#[derive(Clone)]
pub struct CollectionRemove {
    pub sequence: u64,
    pub collection: ObserverId,
    pub element: Arc<ObjectObserver>,
}

impl fmt::Debug for CollectionRemove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionRemove")
            .field("sequence", &self.sequence)
            .field("collection", &self.collection)
            .field("element", &self.element.id())
            .finish()
    }
}
