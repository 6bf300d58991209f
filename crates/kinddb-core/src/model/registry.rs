use crate::{
    error::{ErrorOrigin, InternalError},
    model::{
        entity::EntityModel,
        relation::{JoinSide, JoinTableModel, RelationModel},
    },
};
use std::{collections::BTreeMap, sync::Arc};

///
/// ModelRegistry
///
/// Name-keyed descriptor lookup shared read-only by the client.
///

#[derive(Clone, Debug, Default)]
pub struct ModelRegistry {
    entities: BTreeMap<String, Arc<EntityModel>>,
}

impl ModelRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one descriptor. Names are unique. A kind is shared only by
    /// subtypes that declare distinct values under one discriminator column.
    pub fn register(&mut self, model: EntityModel) -> Result<(), InternalError> {
        if self.entities.contains_key(&model.name) {
            return Err(InternalError::configuration(
                ErrorOrigin::Model,
                format!("entity {} registered twice", model.name),
            ));
        }
        for other in self.models_of_kind(&model.kind) {
            check_shared_kind(other, &model)?;
        }

        self.entities.insert(model.name.clone(), Arc::new(model));

        Ok(())
    }

    /// Chaining form of `register`.
    pub fn with(mut self, model: EntityModel) -> Result<Self, InternalError> {
        self.register(model)?;
        Ok(self)
    }

    /// Descriptor for `name`; an unregistered name is a configuration error.
    pub fn descriptor_for(&self, name: &str) -> Result<Arc<EntityModel>, InternalError> {
        self.entities
            .get(name)
            .cloned()
            .ok_or_else(|| unregistered(name))
    }

    /// Borrowed form of `descriptor_for`.
    pub fn model(&self, name: &str) -> Result<&EntityModel, InternalError> {
        self.entities
            .get(name)
            .map(AsRef::as_ref)
            .ok_or_else(|| unregistered(name))
    }

    /// First entity stored under `kind`, in name order.
    #[must_use]
    pub fn by_kind(&self, kind: &str) -> Option<&Arc<EntityModel>> {
        self.models_of_kind(kind).next()
    }

    /// Every entity stored under `kind`.
    pub fn models_of_kind<'a, 'k>(
        &'a self,
        kind: &'k str,
    ) -> impl Iterator<Item = &'a Arc<EntityModel>> + use<'a, 'k> {
        self.entities.values().filter(move |m| m.kind == kind)
    }

    /// Join table declared under `join_kind` by any many-to-many relation.
    #[must_use]
    pub fn join_table(&self, join_kind: &str) -> Option<&JoinTableModel> {
        self.entities
            .values()
            .flat_map(|m| m.relations.iter())
            .filter_map(|r| r.join_table.as_ref())
            .find(|j| j.join_kind == join_kind)
    }

    /// The owning relation an inverse relation is mapped by, with its entity.
    pub fn owning_side(
        &self,
        relation: &RelationModel,
    ) -> Result<(Arc<EntityModel>, RelationModel), InternalError> {
        let target = self.descriptor_for(&relation.target)?;
        let mapped_by = relation.mapped_by.as_deref().unwrap_or_default();

        let owning = target
            .relation(mapped_by)
            .filter(|r| r.stores_key())
            .cloned()
            .ok_or_else(|| {
                InternalError::relation_configuration(format!(
                    "relation [{}] is mapped by [{mapped_by}], which is not an owning relation of {}",
                    relation.name, target.name
                ))
            })?;

        Ok((target, owning))
    }

    /// Cross-check relation targets and inverse mappings across entities.
    pub fn validate(&self) -> Result<(), InternalError> {
        for model in self.entities.values() {
            for relation in &model.relations {
                self.descriptor_for(&relation.target).map_err(|_| {
                    InternalError::relation_configuration(format!(
                        "relation [{}] of {} targets unregistered entity {}",
                        relation.name, model.name, relation.target
                    ))
                })?;

                if relation.is_inverse() {
                    self.owning_side(relation)?;
                }
                if let Some(join) = &relation.join_table {
                    self.validate_join(join)?;
                }
            }
        }

        Ok(())
    }

    // Declared identifier types must match the registered side kinds.
    fn validate_join(&self, join: &JoinTableModel) -> Result<(), InternalError> {
        for side in [JoinSide::Owner, JoinSide::Child] {
            let kind = join.kind_of(side);
            let declared = join.id_kind_of(side);

            if let Some(model) = self.by_kind(kind)
                && model.identifier.kind != declared
            {
                return Err(InternalError::relation_configuration(format!(
                    "join kind {} declares {} identifiers for {kind}, but {} uses {}",
                    join.join_kind,
                    declared.scalar(),
                    model.name,
                    model.identifier.kind.scalar()
                )));
            }
        }

        Ok(())
    }

    pub fn entities(&self) -> impl Iterator<Item = &Arc<EntityModel>> {
        self.entities.values()
    }
}

fn check_shared_kind(existing: &EntityModel, added: &EntityModel) -> Result<(), InternalError> {
    let conflict = |reason: String| {
        InternalError::configuration(
            ErrorOrigin::Model,
            format!(
                "entities {} and {} share kind {}: {reason}",
                existing.name, added.name, added.kind
            ),
        )
    };

    let (Some(left), Some(right)) = (&existing.discriminator, &added.discriminator) else {
        return Err(conflict("both need a discriminator".to_string()));
    };
    if left.column != right.column {
        return Err(conflict(format!(
            "discriminator columns [{}] and [{}] differ",
            left.column, right.column
        )));
    }
    if left.value == right.value {
        return Err(conflict(format!("discriminator value {} is taken", left.value)));
    }
    if existing.identifier.kind != added.identifier.kind {
        return Err(conflict("identifier types differ".to_string()));
    }

    Ok(())
}

fn unregistered(name: &str) -> InternalError {
    InternalError::configuration(
        ErrorOrigin::Model,
        format!("no descriptor registered for entity {name}"),
    )
}
