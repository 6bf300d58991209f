mod eval;
mod memory;

#[cfg(test)]
mod tests;

use crate::{
    db::{key::NativeKey, query::NativeQuery, record::NativeRecord},
    error::InternalError,
};
use std::sync::Arc;

// re-exports
pub use memory::MemoryStore;

///
/// Datastore
///
/// Seam to the underlying kind-keyed store. Every call is one blocking
/// round-trip; implementations report their own failures as
/// `ErrorClass::Store`.
///
/// `put` assigns an integer id when the record has no key and returns the
/// key the record was written under. `run_query` honours the query's
/// shape: keys-only rows carry no properties, projection rows carry only
/// the projected columns.
///

pub trait Datastore {
    fn put(&self, record: NativeRecord) -> Result<NativeKey, InternalError>;

    /// Write several records; stops at the first failure.
    fn put_batch(&self, records: Vec<NativeRecord>) -> Result<Vec<NativeKey>, InternalError> {
        records.into_iter().map(|record| self.put(record)).collect()
    }

    fn get(&self, key: &NativeKey) -> Result<Option<NativeRecord>, InternalError>;

    /// Remove a record; deleting an absent key is not an error.
    fn delete(&self, key: &NativeKey) -> Result<(), InternalError>;

    fn run_query(&self, query: &NativeQuery) -> Result<Vec<NativeRecord>, InternalError>;
}

impl<T: Datastore + ?Sized> Datastore for Arc<T> {
    fn put(&self, record: NativeRecord) -> Result<NativeKey, InternalError> {
        (**self).put(record)
    }

    fn put_batch(&self, records: Vec<NativeRecord>) -> Result<Vec<NativeKey>, InternalError> {
        (**self).put_batch(records)
    }

    fn get(&self, key: &NativeKey) -> Result<Option<NativeRecord>, InternalError> {
        (**self).get(key)
    }

    fn delete(&self, key: &NativeKey) -> Result<(), InternalError> {
        (**self).delete(key)
    }

    fn run_query(&self, query: &NativeQuery) -> Result<Vec<NativeRecord>, InternalError> {
        (**self).run_query(query)
    }
}
