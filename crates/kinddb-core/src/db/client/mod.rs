mod types;

#[cfg(test)]
mod tests;

use crate::{
    config::ClientConfig,
    db::{
        codec::{decode_attribute, decode_with_limit, encode, encode_attribute, lift_scalar},
        key::NativeKey,
        query::{NativeQuery, QueryBuilder, ResultShape},
        record::{NativeRecord, NativeValue},
        relation::{self, Association, InverseResolution, encode_relation, key_for},
        store::Datastore,
    },
    error::{ErrorClass, ErrorOrigin, InternalError},
    model::{EntityModel, IdKind, JoinSide, JoinTableModel, ModelRegistry, RelationModel},
    traits::EntityKind,
    value::Value,
};
use std::{collections::BTreeMap, sync::Arc};
use tracing::{debug, trace, warn};
use ulid::Ulid;

// re-exports
pub use types::{
    Found, JoinTableData, ProjectedRow, QueryOutput, RelationHolder, RelationTarget,
};

///
/// DatastoreClient
///
/// Operation facade over one store handle. Each call resolves the
/// entity's descriptor, runs the codec and resolver, and performs its
/// store round-trips in order. Multi-record operations stop at the first
/// failure and leave earlier writes in place.
///

#[derive(Debug)]
pub struct DatastoreClient<S> {
    registry: Arc<ModelRegistry>,
    config: ClientConfig,
    store: S,
}

impl<S: Datastore> DatastoreClient<S> {
    /// Client with default configuration.
    pub fn new(registry: Arc<ModelRegistry>, store: S) -> Result<Self, InternalError> {
        Self::with_config(registry, ClientConfig::default(), store)
    }

    /// Validates the config and cross-checks the registry's relations.
    pub fn with_config(
        registry: Arc<ModelRegistry>,
        config: ClientConfig,
        store: S,
    ) -> Result<Self, InternalError> {
        config.validate()?;
        registry.validate()?;

        Ok(Self {
            registry,
            config,
            store,
        })
    }

    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    #[must_use]
    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    ///
    /// CREATE
    ///

    /// Write `entity` with its relation values and return the key it was
    /// stored under. The identifier is written back into the entity.
    pub fn persist<E: EntityKind>(
        &self,
        entity: &mut E,
        relations: &[RelationHolder],
    ) -> Result<NativeKey, InternalError> {
        let model = self.registry.model(E::ENTITY_NAME)?;
        let id = &model.identifier;

        self.assign_text_id(entity, model)?;
        let mut record = encode(entity, model)?;

        let mut join_rows: Vec<(&JoinTableModel, &[Value])> = Vec::new();
        for holder in relations {
            let relation = find_relation(model, &holder.relation)?;

            match (&holder.target, relation.join_table.as_ref()) {
                (RelationTarget::One(value), None) if relation.stores_key() => {
                    let native = encode_relation(value, relation, &self.registry)?;
                    if native != NativeValue::Null {
                        record.set(&relation.column, native);
                    }
                }
                (RelationTarget::Many(ids), Some(join)) => join_rows.push((join, ids.as_slice())),
                _ => {
                    return Err(InternalError::relation_configuration(format!(
                        "relation [{}] of {} is {} and cannot be persisted from this holder",
                        relation.name, model.name, relation.cardinality
                    )));
                }
            }
        }

        let key = self.store.put(record)?;
        debug!(kind = %model.kind, %key, "persisted entity");

        entity
            .set_value(&id.name, key.id.to_value())
            .map_err(|err| err.into_internal(&model.name))?;

        let owner = key.id.to_value();
        for (join, ids) in join_rows {
            relation::persist_join_records(&self.store, join, &owner, ids, self.config.batch_size)?;
        }

        Ok(key)
    }

    // Text identifiers left empty get a fresh ULID before encoding.
    fn assign_text_id<E: EntityKind>(
        &self,
        entity: &mut E,
        model: &EntityModel,
    ) -> Result<(), InternalError> {
        let id = &model.identifier;
        if id.kind != IdKind::Text {
            return Ok(());
        }

        let assigned = match entity.get_value(&id.name) {
            Some(Value::Text(text)) => !text.is_empty(),
            Some(Value::Null) | None => false,
            Some(_) => true,
        };
        if assigned {
            return Ok(());
        }

        if !self.config.generate_text_ids {
            return Err(InternalError::configuration(
                ErrorOrigin::Client,
                format!(
                    "entity {} has no identifier and text id generation is disabled",
                    model.name
                ),
            ));
        }

        let generated = Ulid::new().to_string();
        trace!(kind = %model.kind, id = %generated, "generated identifier");

        entity
            .set_value(&id.name, Value::Text(generated))
            .map_err(|err| err.into_internal(&model.name))
    }

    ///
    /// READ BY KEY
    ///

    /// Fetch one entity; an absent record is `Ok(None)`.
    pub fn find<E: EntityKind>(
        &self,
        id: impl Into<Value>,
    ) -> Result<Option<Found<E>>, InternalError> {
        let model = self.registry.model(E::ENTITY_NAME)?;
        let key = entity_key(model, &id.into())?;

        let Some(record) = self.store.get(&key)? else {
            debug!(%key, "record not found");
            return Ok(None);
        };
        if !belongs_to(model, &record) {
            debug!(%key, entity = %model.name, "record belongs to another subtype");
            return Ok(None);
        }

        self.decode_found(model, &record).map(Some)
    }

    /// Fetch several entities, skipping absent ids.
    pub fn find_all<E: EntityKind>(&self, ids: &[Value]) -> Result<Vec<Found<E>>, InternalError> {
        let mut found = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(entity) = self.find::<E>(id.clone())? {
                found.push(entity);
            }
        }

        Ok(found)
    }

    /// Entities whose owning relation `relation` (name or column) points at `target_id`.
    pub fn find_by_relation<E: EntityKind>(
        &self,
        relation: &str,
        target_id: impl Into<Value>,
    ) -> Result<Vec<Found<E>>, InternalError> {
        let model = self.registry.model(E::ENTITY_NAME)?;
        let stored = model
            .relation(relation)
            .or_else(|| model.relation_by_column(relation))
            .filter(|r| r.stores_key())
            .ok_or_else(|| {
                InternalError::relation_configuration(format!(
                    "{} has no owning relation [{relation}]",
                    model.name
                ))
            })?;

        let query = self
            .query::<E>()?
            .filter(&stored.name, "=", target_id)
            .build()?;

        match self.execute::<E>(&query)? {
            QueryOutput::Entities(rows) => Ok(rows),
            _ => Ok(Vec::new()),
        }
    }

    ///
    /// READ BY QUERY
    ///

    /// Start a query against `E`'s descriptor.
    pub fn query<E: EntityKind>(&self) -> Result<QueryBuilder<'_>, InternalError> {
        Ok(QueryBuilder::new(
            self.registry.model(E::ENTITY_NAME)?,
            &self.registry,
        ))
    }

    /// Run a built query and decode rows according to its result shape.
    pub fn execute<E: EntityKind>(
        &self,
        query: &NativeQuery,
    ) -> Result<QueryOutput<E>, InternalError> {
        let model = self.registry.model(E::ENTITY_NAME)?;
        check_kind(model, query)?;

        trace!(?query, "executing query");
        let rows = self.store.run_query(query)?;
        debug!(kind = %query.kind, rows = rows.len(), shape = ?query.shape, "query returned");

        match query.shape {
            ResultShape::Entity => rows
                .iter()
                .filter(|row| belongs_to(model, row))
                .map(|row| self.decode_found(model, row))
                .collect::<Result<_, _>>()
                .map(QueryOutput::Entities),
            ResultShape::Projection => rows
                .iter()
                .map(|row| self.project(model, row))
                .collect::<Result<_, _>>()
                .map(QueryOutput::Projections),
            ResultShape::KeysOnly => Ok(QueryOutput::Keys(
                rows.into_iter().filter_map(|row| row.key).collect(),
            )),
        }
    }

    ///
    /// UPDATE / DELETE
    ///

    /// Set `updates` on every `E` whose `attribute` equals `value`.
    pub fn update_by_column<E: EntityKind>(
        &self,
        attribute: &str,
        value: impl Into<Value>,
        updates: &[(&str, Value)],
    ) -> Result<usize, InternalError> {
        let query = self
            .query::<E>()?
            .filter(attribute, "=", value)
            .keys_only()
            .build()?;

        self.execute_update::<E>(&query, updates)
    }

    /// Apply attribute updates to every record a query matches; returns the count.
    /// A null value removes the property. The query must be over `E`'s kind.
    pub fn execute_update<E: EntityKind>(
        &self,
        query: &NativeQuery,
        updates: &[(&str, Value)],
    ) -> Result<usize, InternalError> {
        let model = self.registry.model(E::ENTITY_NAME)?;
        check_kind(model, query)?;
        let changes = self.encode_updates(model, updates)?;

        let mut updated = 0;
        for key in self.matching_keys(query)? {
            let Some(mut record) = self.store.get(&key)? else {
                continue;
            };
            if !belongs_to(model, &record) {
                continue;
            }
            for (column, native) in &changes {
                match native {
                    Some(native) => record.set(column, native.clone()),
                    None => {
                        record.properties.remove(column);
                    }
                }
            }

            if let Err(err) = self.store.put(record) {
                warn!(%key, updated, "update failed; earlier records remain updated");
                return Err(err);
            }
            updated += 1;
        }

        debug!(kind = %query.kind, updated, "updated records");

        Ok(updated)
    }

    /// Delete every record of `kind` whose `column` equals `value`.
    /// `kind` may be an entity kind, shared or not, or a join kind.
    pub fn delete_by_column(
        &self,
        kind: &str,
        column: &str,
        value: impl Into<Value>,
    ) -> Result<usize, InternalError> {
        let mut deleted = 0;
        for query in self.column_queries(kind, column, &value.into())? {
            deleted += self.execute_delete(&query)?;
        }

        Ok(deleted)
    }

    /// Delete every record a query matches; returns the count.
    pub fn execute_delete(&self, query: &NativeQuery) -> Result<usize, InternalError> {
        let mut deleted = 0;
        for key in self.matching_keys(query)? {
            if let Err(err) = self.store.delete(&key) {
                warn!(%key, deleted, "delete failed; earlier deletes remain");
                return Err(err);
            }
            deleted += 1;
        }

        debug!(kind = %query.kind, deleted, "deleted records");

        Ok(deleted)
    }

    pub fn delete<E: EntityKind>(&self, id: impl Into<Value>) -> Result<(), InternalError> {
        let model = self.registry.model(E::ENTITY_NAME)?;
        let key = entity_key(model, &id.into())?;

        self.store.delete(&key)?;
        debug!(%key, "deleted entity");

        Ok(())
    }

    ///
    /// RELATIONS
    ///

    /// Write one join record per child for `owner_id`.
    pub fn persist_join_records(
        &self,
        join_kind: &str,
        owner_id: impl Into<Value>,
        child_ids: &[Value],
    ) -> Result<Vec<NativeKey>, InternalError> {
        let join = self.join(join_kind)?;

        relation::persist_join_records(
            &self.store,
            join,
            &owner_id.into(),
            child_ids,
            self.config.batch_size,
        )
    }

    /// Write join records for several owners; returns the number written.
    pub fn persist_join_table(&self, data: &JoinTableData) -> Result<usize, InternalError> {
        let mut written = 0;
        for (owner, children) in &data.rows {
            written += self
                .persist_join_records(&data.join_kind, owner.clone(), children)?
                .len();
        }

        Ok(written)
    }

    /// Values of `column` on join records whose `key_column` holds `key_value`.
    pub fn get_columns_by_id(
        &self,
        join_kind: &str,
        key_column: &str,
        column: &str,
        key_value: impl Into<Value>,
    ) -> Result<Vec<Value>, InternalError> {
        self.join_lookup(join_kind, key_column, column, &key_value.into())
    }

    /// Values of `key_column` on join records whose `column` holds `value`.
    pub fn find_ids_by_column(
        &self,
        join_kind: &str,
        key_column: &str,
        column: &str,
        value: impl Into<Value>,
    ) -> Result<Vec<Value>, InternalError> {
        self.join_lookup(join_kind, column, key_column, &value.into())
    }

    /// Targets of a many-to-many relation of `E`, with any broken references.
    pub fn read_association<E: EntityKind>(
        &self,
        relation: &str,
        id: impl Into<Value>,
    ) -> Result<Association, InternalError> {
        let model = self.registry.model(E::ENTITY_NAME)?;
        let relation = find_relation(model, relation)?;
        let join = relation.join_table.as_ref().ok_or_else(|| {
            InternalError::relation_configuration(format!(
                "relation [{}] of {} is not many-to-many",
                relation.name, model.name
            ))
        })?;

        relation::read_association(
            &self.store,
            join,
            JoinSide::Owner,
            &id.into(),
            self.config.verify_association_targets,
        )
    }

    /// Owning-side keys of an inverse relation of `E`.
    pub fn resolve_inverse<E: EntityKind>(
        &self,
        relation: &str,
        id: impl Into<Value>,
    ) -> Result<InverseResolution, InternalError> {
        let model = self.registry.model(E::ENTITY_NAME)?;
        let key = entity_key(model, &id.into())?;
        let relation = find_relation(model, relation)?;

        relation::resolve_inverse(&self.store, &self.registry, &key, relation)
    }

    ///
    /// HELPERS
    ///

    fn decode_found<E: EntityKind>(
        &self,
        model: &EntityModel,
        record: &NativeRecord,
    ) -> Result<Found<E>, InternalError> {
        let (entity, relations) = decode_with_limit(record, model, self.config.max_blob_bytes)?;
        let key = record.key.clone().ok_or_else(|| missing_key(model))?;

        Ok(Found {
            entity,
            key,
            relations,
        })
    }

    // Decode projected columns back to attribute names.
    fn project(&self, model: &EntityModel, record: &NativeRecord) -> Result<ProjectedRow, InternalError> {
        let key = record.key.clone().ok_or_else(|| missing_key(model))?;
        let mut values = BTreeMap::new();

        for (column, native) in &record.properties {
            if let Some(field) = model.attributes.iter().find(|a| &a.column == column) {
                let value = decode_attribute(&model.name, field, native, self.config.max_blob_bytes)?;
                values.insert(field.name.clone(), value);
            } else if let Some(relation) = model.relation_by_column(column) {
                values.insert(relation.name.clone(), lift_scalar(native).unwrap_or(Value::Null));
            }
        }

        Ok(ProjectedRow { key, values })
    }

    // Resolve attribute updates to (column, native value or removal).
    fn encode_updates(
        &self,
        model: &EntityModel,
        updates: &[(&str, Value)],
    ) -> Result<Vec<(String, Option<NativeValue>)>, InternalError> {
        updates
            .iter()
            .map(|(name, value)| {
                if model.is_identifier(name) {
                    return Err(InternalError::configuration(
                        ErrorOrigin::Client,
                        format!("identifier [{name}] of {} cannot be updated", model.name),
                    ));
                }

                if let Some(field) = model.attribute(name) {
                    let native = if value.is_null() {
                        None
                    } else {
                        Some(encode_attribute(&model.name, field, value)?)
                    };
                    return Ok((field.column.clone(), native));
                }

                if let Some(relation) = model.relation(name).filter(|r| r.stores_key()) {
                    let native = encode_relation(value, relation, &self.registry)?;
                    let native = (native != NativeValue::Null).then_some(native);
                    return Ok((relation.column.clone(), native));
                }

                Err(InternalError::configuration(
                    ErrorOrigin::Client,
                    format!("{} has no updatable attribute [{name}]", model.name),
                ))
            })
            .collect()
    }

    // Keys matched by `query`, fetched without properties.
    fn matching_keys(&self, query: &NativeQuery) -> Result<Vec<NativeKey>, InternalError> {
        let keys_query = NativeQuery {
            projections: Vec::new(),
            keys_only: true,
            shape: ResultShape::KeysOnly,
            ..query.clone()
        };
        trace!(query = ?keys_query, "resolving matching keys");

        Ok(self
            .store
            .run_query(&keys_query)?
            .into_iter()
            .filter_map(|row| row.key)
            .collect())
    }

    // Single-equality keys-only queries over a join kind, or one per
    // entity stored under `kind` that maps `column`.
    fn column_queries(
        &self,
        kind: &str,
        column: &str,
        value: &Value,
    ) -> Result<Vec<NativeQuery>, InternalError> {
        if let Some(join) = self.registry.join_table(kind) {
            let side = join.side_of(column).ok_or_else(|| {
                InternalError::relation_configuration(format!(
                    "join kind {kind} has no column [{column}]"
                ))
            })?;
            let key = key_for(join.kind_of(side), join.id_kind_of(side), value)?;

            return Ok(vec![NativeQuery::keys_where(kind, column, NativeValue::Key(key))]);
        }

        let mut queries = Vec::new();
        let mut unresolved = None;
        for model in self.registry.models_of_kind(kind) {
            let built = QueryBuilder::new(model, &self.registry)
                .filter(column, "=", value.clone())
                .keys_only()
                .build();

            match built {
                Ok(query) => queries.push(query),
                Err(err) if err.is_configuration() => {
                    unresolved.get_or_insert(err);
                }
                Err(err) => return Err(err),
            }
        }

        if queries.is_empty() {
            return Err(unresolved.unwrap_or_else(|| {
                InternalError::configuration(ErrorOrigin::Client, format!("unknown kind {kind}"))
            }));
        }

        Ok(queries)
    }

    fn join(&self, join_kind: &str) -> Result<&JoinTableModel, InternalError> {
        self.registry.join_table(join_kind).ok_or_else(|| {
            InternalError::relation_configuration(format!("unknown join kind {join_kind}"))
        })
    }

    fn join_lookup(
        &self,
        join_kind: &str,
        known_column: &str,
        wanted_column: &str,
        value: &Value,
    ) -> Result<Vec<Value>, InternalError> {
        let join = self.join(join_kind)?;
        let side = if known_column == join.owner_column && wanted_column == join.child_column {
            JoinSide::Owner
        } else if known_column == join.child_column && wanted_column == join.owner_column {
            JoinSide::Child
        } else {
            return Err(InternalError::relation_configuration(format!(
                "join kind {join_kind} does not pair [{known_column}] with [{wanted_column}]"
            )));
        };

        let association = relation::read_association(
            &self.store,
            join,
            side,
            value,
            self.config.verify_association_targets,
        )?;

        Ok(association.ids())
    }
}

fn find_relation<'a>(model: &'a EntityModel, name: &str) -> Result<&'a RelationModel, InternalError> {
    model.relation(name).ok_or_else(|| {
        InternalError::relation_configuration(format!("{} has no relation [{name}]", model.name))
    })
}

fn check_kind(model: &EntityModel, query: &NativeQuery) -> Result<(), InternalError> {
    if query.kind == model.kind {
        return Ok(());
    }

    Err(InternalError::configuration(
        ErrorOrigin::Client,
        format!("query over kind {} does not target {}", query.kind, model.name),
    ))
}

// Records of a shared kind belong to the subtype whose discriminator they carry.
fn belongs_to(model: &EntityModel, record: &NativeRecord) -> bool {
    model.discriminator.as_ref().is_none_or(|disc| {
        matches!(record.get(&disc.column), Some(NativeValue::Text(value)) if *value == disc.value)
    })
}

fn entity_key(model: &EntityModel, id: &Value) -> Result<NativeKey, InternalError> {
    NativeKey::from_value(&model.kind, id, model.identifier.kind).ok_or_else(|| {
        InternalError::new(
            ErrorClass::Mapping,
            ErrorOrigin::Client,
            format!(
                "{} is not a valid {} identifier for {}",
                id.label(),
                model.identifier.kind.scalar(),
                model.name
            ),
        )
    })
}

fn missing_key(model: &EntityModel) -> InternalError {
    InternalError::new(
        ErrorClass::Internal,
        ErrorOrigin::Client,
        format!("store returned a {} record without a key", model.name),
    )
}
