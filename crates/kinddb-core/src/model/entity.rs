use crate::{
    error::{ErrorOrigin, InternalError},
    model::{
        field::{AttributeKind, FieldModel, ScalarType},
        relation::{Cardinality, RelationModel},
    },
};
use std::collections::BTreeSet;

///
/// IdKind
///
/// Identifier types the store can address a record by.
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum IdKind {
    Text,
    Int,
}

impl IdKind {
    #[must_use]
    pub const fn scalar(self) -> ScalarType {
        match self {
            Self::Text => ScalarType::Text,
            Self::Int => ScalarType::Int,
        }
    }
}

impl TryFrom<ScalarType> for IdKind {
    type Error = ScalarType;

    fn try_from(ty: ScalarType) -> Result<Self, Self::Error> {
        match ty {
            ScalarType::Text => Ok(Self::Text),
            ScalarType::Int => Ok(Self::Int),
            other => Err(other),
        }
    }
}

///
/// IdentifierModel
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct IdentifierModel {
    pub name: String,
    pub column: String,
    pub kind: IdKind,
}

///
/// Discriminator
///
/// Fixed (column, value) pair stamped on every record of a kind that
/// shares storage with sibling types.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Discriminator {
    pub column: String,
    pub value: String,
}

///
/// EntityModel
///
/// Immutable per-type metadata. Built once through `EntityModelBuilder`
/// and shared read-only by the registry.
///

#[derive(Clone, Debug, PartialEq)]
pub struct EntityModel {
    /// Entity name used for registry lookup and diagnostics.
    pub name: String,
    /// Store kind records of this entity are written under.
    pub kind: String,
    pub identifier: IdentifierModel,
    /// Ordered non-identifier attributes.
    pub attributes: Vec<FieldModel>,
    pub relations: Vec<RelationModel>,
    pub discriminator: Option<Discriminator>,
}

impl EntityModel {
    pub fn builder(name: impl Into<String>) -> EntityModelBuilder {
        EntityModelBuilder::new(name)
    }

    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&FieldModel> {
        self.attributes.iter().find(|a| a.name == name)
    }

    #[must_use]
    pub fn relation(&self, name: &str) -> Option<&RelationModel> {
        self.relations.iter().find(|r| r.name == name)
    }

    #[must_use]
    pub fn relation_by_column(&self, column: &str) -> Option<&RelationModel> {
        self.relations.iter().find(|r| r.column == column)
    }

    #[must_use]
    pub fn is_identifier(&self, name: &str) -> bool {
        self.identifier.name == name
    }

    /// Relations that write a key property on this entity's records.
    pub fn stored_relations(&self) -> impl Iterator<Item = &RelationModel> {
        self.relations.iter().filter(|r| r.stores_key())
    }
}

///
/// EntityModelBuilder
///

#[derive(Debug)]
pub struct EntityModelBuilder {
    name: String,
    kind: Option<String>,
    identifier: Option<(String, Option<String>, ScalarType)>,
    attributes: Vec<FieldModel>,
    relations: Vec<RelationModel>,
    discriminator: Option<Discriminator>,
}

impl EntityModelBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: None,
            identifier: None,
            attributes: Vec::new(),
            relations: Vec::new(),
            discriminator: None,
        }
    }

    /// Store kind; defaults to the entity name.
    #[must_use]
    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// Declare the identifier attribute and its type.
    /// Only `Text` and `Int` are accepted by `build`.
    #[must_use]
    pub fn identifier(mut self, name: impl Into<String>, ty: ScalarType) -> Self {
        self.identifier = Some((name.into(), None, ty));
        self
    }

    #[must_use]
    pub fn identifier_column(mut self, column: impl Into<String>) -> Self {
        if let Some((_, col, _)) = self.identifier.as_mut() {
            *col = Some(column.into());
        }
        self
    }

    #[must_use]
    pub fn attribute(mut self, field: FieldModel) -> Self {
        self.attributes.push(field);
        self
    }

    #[must_use]
    pub fn relation(mut self, relation: RelationModel) -> Self {
        self.relations.push(relation);
        self
    }

    #[must_use]
    pub fn discriminator(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.discriminator = Some(Discriminator {
            column: column.into(),
            value: value.into(),
        });
        self
    }

    /// Validate and freeze the descriptor.
    pub fn build(self) -> Result<EntityModel, InternalError> {
        let entity = self.name;
        let err = |msg: String| {
            InternalError::configuration(ErrorOrigin::Model, format!("entity {entity}: {msg}"))
        };

        let Some((id_name, id_column, id_type)) = self.identifier else {
            return Err(err("no identifier declared".to_string()));
        };
        let id_kind = IdKind::try_from(id_type).map_err(|found| {
            err(format!(
                "identifier [{id_name}] must be text or int, found {found}"
            ))
        })?;

        let mut names = BTreeSet::from([id_name.clone()]);
        let mut columns = BTreeSet::new();

        for field in &self.attributes {
            if !names.insert(field.name.clone()) {
                return Err(err(format!("duplicate attribute [{}]", field.name)));
            }
            if !columns.insert(field.column.clone()) {
                return Err(err(format!("duplicate column [{}]", field.column)));
            }
            validate_attribute(field, false).map_err(&err)?;
        }

        for relation in &self.relations {
            if !names.insert(relation.name.clone()) {
                return Err(err(format!("duplicate attribute [{}]", relation.name)));
            }
            if relation.stores_key() && !columns.insert(relation.column.clone()) {
                return Err(err(format!("duplicate column [{}]", relation.column)));
            }
            validate_relation(relation).map_err(&err)?;
        }

        if let Some(disc) = &self.discriminator
            && columns.contains(&disc.column)
        {
            return Err(err(format!(
                "discriminator column [{}] clashes with an attribute",
                disc.column
            )));
        }

        Ok(EntityModel {
            kind: self.kind.unwrap_or_else(|| entity.clone()),
            identifier: IdentifierModel {
                column: id_column.unwrap_or_else(|| id_name.clone()),
                name: id_name,
                kind: id_kind,
            },
            name: entity,
            attributes: self.attributes,
            relations: self.relations,
            discriminator: self.discriminator,
        })
    }
}

// Check one attribute; `nested` is true inside an embeddable.
fn validate_attribute(field: &FieldModel, nested: bool) -> Result<(), String> {
    match &field.kind {
        AttributeKind::Enum { variants } if variants.is_empty() => {
            Err(format!("enum attribute [{}] has no variants", field.name))
        }
        AttributeKind::Embedded(_) if nested => Err(format!(
            "embedded attribute [{}] cannot nest another embeddable",
            field.name
        )),
        AttributeKind::Embedded(model) => {
            let mut columns = BTreeSet::new();
            for inner in &model.attributes {
                if !columns.insert(inner.column.as_str()) {
                    return Err(format!(
                        "embeddable {} has duplicate column [{}]",
                        model.name, inner.column
                    ));
                }
                validate_attribute(inner, true)?;
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

fn validate_relation(relation: &RelationModel) -> Result<(), String> {
    let name = &relation.name;

    match relation.cardinality {
        Cardinality::ManyToMany if relation.join_table.is_none() => Err(format!(
            "many-to-many relation [{name}] has no join table"
        )),
        Cardinality::ManyToMany => Ok(()),
        _ if relation.join_table.is_some() => Err(format!(
            "relation [{name}] is {} and cannot use a join table",
            relation.cardinality
        )),
        Cardinality::OneToMany if relation.owning => Err(format!(
            "one-to-many relation [{name}] must be the inverse side"
        )),
        _ if !relation.owning && relation.mapped_by.is_none() => Err(format!(
            "inverse relation [{name}] does not name its owning side"
        )),
        _ => Ok(()),
    }
}
