//! Persistence collaborator boundary.
//!
//! The engine never assumes a storage technology. It asks a
//! [`PersistenceService`] whether instances already exist and hands it the
//! save set; everything else belongs to the implementation.

mod memory;

// re-exports
pub use memory::MemoryPersistence;

use crate::{
    error::Error,
    types::{ObjectRef, TypeKey},
    value::Value,
};

///
/// PersistenceService
///

pub trait PersistenceService: Send + Sync {
    /// Whether instances of this type are managed by the store at all.
    fn is_type_recognised(&self, type_key: &TypeKey) -> bool;

    /// Whether this instance (or its domain key) already exists in the store.
    fn is_persistent(&self, key: Option<&Value>, instance: &ObjectRef) -> bool;

    /// Persist every instance in one unit of work. Returns the saved count.
    fn save_changes(&self, instances: &[ObjectRef]) -> Result<usize, Error>;

    fn get_objects(&self, type_key: &TypeKey) -> Result<Vec<ObjectRef>, Error>;
}

///
/// NullPersistence
/// Recognises no types; saves are accepted and discarded.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct NullPersistence;

impl PersistenceService for NullPersistence {
    fn is_type_recognised(&self, _: &TypeKey) -> bool {
        false
    }

    fn is_persistent(&self, _: Option<&Value>, _: &ObjectRef) -> bool {
        false
    }

    fn save_changes(&self, instances: &[ObjectRef]) -> Result<usize, Error> {
        Ok(instances.len())
    }

    fn get_objects(&self, _: &TypeKey) -> Result<Vec<ObjectRef>, Error> {
        Ok(Vec::new())
    }
}
