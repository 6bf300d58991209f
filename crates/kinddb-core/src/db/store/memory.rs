use crate::{
    db::{
        key::{KeyId, NativeKey},
        query::NativeQuery,
        record::NativeRecord,
        store::{
            Datastore,
            eval::{compare_records, matches, property_of},
        },
    },
    error::InternalError,
};
use std::{
    collections::BTreeMap,
    sync::{Mutex, RwLock},
};
use tracing::trace;

///
/// MemoryStore
///
/// In-process store with the record semantics of the remote datastore:
/// integer ids allocated per kind, list properties matched per element,
/// records lacking a sort property left out of sorted results.
///

#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<BTreeMap<NativeKey, NativeRecord>>,
    next_ids: Mutex<BTreeMap<String, i64>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records across all kinds.
    pub fn len(&self) -> Result<usize, InternalError> {
        Ok(self.read()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, InternalError> {
        Ok(self.read()?.is_empty())
    }

    /// Every record of one kind, in key order.
    pub fn records_of_kind(&self, kind: &str) -> Result<Vec<NativeRecord>, InternalError> {
        Ok(self
            .read()?
            .values()
            .filter(|r| r.kind == kind)
            .cloned()
            .collect())
    }

    fn read(
        &self,
    ) -> Result<std::sync::RwLockReadGuard<'_, BTreeMap<NativeKey, NativeRecord>>, InternalError>
    {
        self.records
            .read()
            .map_err(|_| InternalError::store("memory store lock poisoned"))
    }

    fn write(
        &self,
    ) -> Result<std::sync::RwLockWriteGuard<'_, BTreeMap<NativeKey, NativeRecord>>, InternalError>
    {
        self.records
            .write()
            .map_err(|_| InternalError::store("memory store lock poisoned"))
    }

    // Allocate the next id for `kind`, skipping ids a caller already used.
    fn allocate(&self, kind: &str, taken: &BTreeMap<NativeKey, NativeRecord>) -> Result<i64, InternalError> {
        let mut next_ids = self
            .next_ids
            .lock()
            .map_err(|_| InternalError::store("memory store id lock poisoned"))?;
        let next = next_ids.entry(kind.to_string()).or_insert(1);

        while taken.contains_key(&NativeKey::new(kind, *next)) {
            *next += 1;
        }
        let id = *next;
        *next += 1;

        Ok(id)
    }
}

impl Datastore for MemoryStore {
    fn put(&self, mut record: NativeRecord) -> Result<NativeKey, InternalError> {
        let mut records = self.write()?;

        let key = match record.key.take() {
            Some(key) if key.kind != record.kind => {
                return Err(InternalError::store(format!(
                    "key {key} does not belong to kind {}",
                    record.kind
                )));
            }
            Some(key) => key,
            None => NativeKey::new(&record.kind, KeyId::Id(self.allocate(&record.kind, &records)?)),
        };

        trace!(%key, "memory store put");
        record.key = Some(key.clone());
        records.insert(key.clone(), record);

        Ok(key)
    }

    fn get(&self, key: &NativeKey) -> Result<Option<NativeRecord>, InternalError> {
        Ok(self.read()?.get(key).cloned())
    }

    fn delete(&self, key: &NativeKey) -> Result<(), InternalError> {
        trace!(%key, "memory store delete");
        self.write()?.remove(key);

        Ok(())
    }

    fn run_query(&self, query: &NativeQuery) -> Result<Vec<NativeRecord>, InternalError> {
        let records = self.read()?;

        let mut rows: Vec<NativeRecord> = records
            .values()
            .filter(|r| r.kind == query.kind)
            .filter(|r| query.filter.as_ref().is_none_or(|f| matches(f, r)))
            .filter(|r| {
                query
                    .sorts
                    .iter()
                    .all(|s| property_of(r, &s.property).is_some())
            })
            .filter(|r| query.projections.iter().all(|p| r.get(p).is_some()))
            .cloned()
            .collect();
        drop(records);

        rows.sort_by(|a, b| compare_records(a, b, &query.sorts));
        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }

        for row in &mut rows {
            if query.keys_only {
                row.properties.clear();
            } else if !query.projections.is_empty() {
                row.properties.retain(|column, _| query.projections.contains(column));
            }
        }

        Ok(rows)
    }
}
