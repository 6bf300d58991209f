mod join;


use crate::{
    db::{
        codec::RelationMap,
        key::NativeKey,
        query::NativeQuery,
        record::{NativeRecord, NativeValue},
        store::Datastore,
    },
    error::{ErrorClass, ErrorOrigin, InternalError},
    model::{Cardinality, EntityModel, IdKind, ModelRegistry, RelationModel},
    value::Value,
};
use tracing::warn;

// re-exports
pub use join::{Association, BrokenReference, persist_join_records, read_association};

///
/// InverseResolution
///
/// Keys found on the owning side of an inverse relation.
/// Zero matches for a one-to-one is `One(None)`, not an error.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum InverseResolution {
    One(Option<NativeKey>),
    Many(Vec<NativeKey>),
}

impl InverseResolution {
    #[must_use]
    pub fn keys(&self) -> Vec<NativeKey> {
        match self {
            Self::One(key) => key.iter().cloned().collect(),
            Self::Many(keys) => keys.clone(),
        }
    }
}

/// Wrap a target business id into the key stored under an owning relation column.
pub fn encode_relation(
    value: &Value,
    relation: &RelationModel,
    registry: &ModelRegistry,
) -> Result<NativeValue, InternalError> {
    if !relation.stores_key() {
        return Err(InternalError::relation_configuration(format!(
            "relation [{}] is {} and is not stored on the record",
            relation.name, relation.cardinality
        )));
    }
    if value.is_null() {
        return Ok(NativeValue::Null);
    }

    let target = registry.descriptor_for(&relation.target)?;

    NativeKey::from_value(&target.kind, value, target.identifier.kind)
        .map(NativeValue::Key)
        .ok_or_else(|| {
            InternalError::new(
                ErrorClass::Mapping,
                ErrorOrigin::Relation,
                format!(
                    "relation [{}] expects a {} identifier of {}, found {}",
                    relation.name,
                    target.identifier.kind.scalar(),
                    target.name,
                    value.label()
                ),
            )
        })
}

/// Raw target identifiers of every owning relation present on `record`, keyed by column.
pub fn decode_relations(
    record: &NativeRecord,
    model: &EntityModel,
) -> Result<RelationMap, InternalError> {
    let mut map = RelationMap::new();

    for relation in model.stored_relations() {
        match record.get(&relation.column) {
            None | Some(NativeValue::Null) => {}
            Some(NativeValue::Key(key)) => {
                map.insert(relation.column.clone(), key.id.to_value());
            }
            Some(other) => {
                return Err(InternalError::new(
                    ErrorClass::Mapping,
                    ErrorOrigin::Relation,
                    format!(
                        "relation column [{}] of entity {} holds {}, not a key",
                        relation.column,
                        model.name,
                        other.label()
                    ),
                ));
            }
        }
    }

    Ok(map)
}

///
/// resolve_inverse
///
/// Find the owning records that point at `key` through the relation the
/// inverse side is mapped by. Keys-only; the far side is not loaded.
///

pub fn resolve_inverse<S>(
    store: &S,
    registry: &ModelRegistry,
    key: &NativeKey,
    relation: &RelationModel,
) -> Result<InverseResolution, InternalError>
where
    S: Datastore + ?Sized,
{
    if !relation.is_inverse() {
        return Err(InternalError::relation_configuration(format!(
            "relation [{}] is not an inverse relation",
            relation.name
        )));
    }

    let (owner, owning) = registry.owning_side(relation)?;
    let query = NativeQuery::keys_where(&owner.kind, &owning.column, NativeValue::Key(key.clone()));
    let keys: Vec<NativeKey> = store
        .run_query(&query)?
        .into_iter()
        .filter_map(|row| row.key)
        .collect();

    match relation.cardinality {
        Cardinality::OneToOne => {
            if keys.len() > 1 {
                warn!(
                    relation = %relation.name,
                    %key,
                    matches = keys.len(),
                    "one-to-one inverse matched several records; using the first"
                );
            }
            Ok(InverseResolution::One(keys.into_iter().next()))
        }
        _ => Ok(InverseResolution::Many(keys)),
    }
}

// Key for a caller-supplied identifier of a kind with `id_kind` identifiers.
pub(crate) fn key_for(kind: &str, id_kind: IdKind, value: &Value) -> Result<NativeKey, InternalError> {
    NativeKey::from_value(kind, value, id_kind).ok_or_else(|| {
        InternalError::new(
            ErrorClass::Mapping,
            ErrorOrigin::Relation,
            format!(
                "identifier for kind {kind} must be a non-zero {}, found {}",
                id_kind.scalar(),
                value.label()
            ),
        )
    })
}
