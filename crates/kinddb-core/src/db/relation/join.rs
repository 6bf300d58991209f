use crate::{
    db::{
        key::NativeKey,
        query::NativeQuery,
        record::{NativeRecord, NativeValue},
        relation::key_for,
        store::Datastore,
    },
    error::InternalError,
    model::{JoinSide, JoinTableModel},
    value::Value,
};
use tracing::{debug, warn};

///
/// BrokenReference
///
/// Join record whose far side no longer exists.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BrokenReference {
    pub join_key: NativeKey,
    pub missing: NativeKey,
}

///
/// Association
///
/// Result of reading one side of a many-to-many join kind.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Association {
    pub keys: Vec<NativeKey>,
    pub broken: Vec<BrokenReference>,
}

impl Association {
    /// Raw identifiers of the live targets.
    #[must_use]
    pub fn ids(&self) -> Vec<Value> {
        self.keys.iter().map(|k| k.id.to_value()).collect()
    }
}

///
/// persist_join_records
///
/// Write one join record per (owner, child) pair, each under a
/// store-generated id. Writes go out in chunks of `batch_size`
/// (0 = a single batch); a failing chunk stops the run and earlier
/// chunks stay written.
///

pub fn persist_join_records<S>(
    store: &S,
    join: &JoinTableModel,
    owner_id: &Value,
    child_ids: &[Value],
    batch_size: usize,
) -> Result<Vec<NativeKey>, InternalError>
where
    S: Datastore + ?Sized,
{
    let owner = key_for(&join.owner_kind, join.owner_id, owner_id)?;
    let records = child_ids
        .iter()
        .map(|child_id| {
            let child = key_for(&join.child_kind, join.child_id, child_id)?;

            Ok(NativeRecord::new(&join.join_kind)
                .with_property(&join.owner_column, NativeValue::Key(owner.clone()))
                .with_property(&join.child_column, NativeValue::Key(child)))
        })
        .collect::<Result<Vec<_>, InternalError>>()?;

    let chunk = if batch_size == 0 {
        records.len().max(1)
    } else {
        batch_size
    };

    let mut keys = Vec::with_capacity(records.len());
    for batch in records.chunks(chunk) {
        match store.put_batch(batch.to_vec()) {
            Ok(written) => keys.extend(written),
            Err(err) => {
                warn!(
                    join_kind = %join.join_kind,
                    %owner,
                    written = keys.len(),
                    "join record write failed; earlier records remain"
                );
                return Err(err);
            }
        }
    }

    debug!(join_kind = %join.join_kind, %owner, count = keys.len(), "persisted join records");

    Ok(keys)
}

///
/// read_association
///
/// Read the other side of every join record whose `side` column holds
/// `id`. With `verify` set, targets that no longer exist are left out of
/// `keys` and reported in `broken`; nothing is repaired.
///

pub fn read_association<S>(
    store: &S,
    join: &JoinTableModel,
    side: JoinSide,
    id: &Value,
    verify: bool,
) -> Result<Association, InternalError>
where
    S: Datastore + ?Sized,
{
    let known = key_for(join.kind_of(side), join.id_kind_of(side), id)?;
    let (known_column, other_column, _) = join.columns_for(side);

    let query = NativeQuery::project_where(
        &join.join_kind,
        known_column,
        NativeValue::Key(known.clone()),
        other_column,
    );

    let mut association = Association::default();
    for row in store.run_query(&query)? {
        let Some(NativeValue::Key(target)) = row.get(other_column).cloned() else {
            continue;
        };

        if verify && store.get(&target)?.is_none() {
            if let Some(join_key) = row.key {
                warn!(%join_key, missing = %target, "join record points at a missing target");
                association.broken.push(BrokenReference {
                    join_key,
                    missing: target,
                });
            }
            continue;
        }

        association.keys.push(target);
    }

    Ok(association)
}
