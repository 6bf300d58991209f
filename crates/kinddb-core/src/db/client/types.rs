use crate::{
    db::{codec::RelationMap, key::NativeKey},
    value::Value,
};
use std::collections::BTreeMap;

///
/// Found
///
/// One decoded entity with the key it was read from and the raw
/// identifiers of its owning relations.
///

#[derive(Clone, Debug, PartialEq)]
pub struct Found<E> {
    pub entity: E,
    pub key: NativeKey,
    pub relations: RelationMap,
}

///
/// ProjectedRow
///
/// Projection result keyed by attribute name.
///

#[derive(Clone, Debug, PartialEq)]
pub struct ProjectedRow {
    pub key: NativeKey,
    pub values: BTreeMap<String, Value>,
}

///
/// QueryOutput
///

#[derive(Clone, Debug, PartialEq)]
pub enum QueryOutput<E> {
    Entities(Vec<Found<E>>),
    Projections(Vec<ProjectedRow>),
    Keys(Vec<NativeKey>),
}

impl<E> QueryOutput<E> {
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Entities(rows) => rows.len(),
            Self::Projections(rows) => rows.len(),
            Self::Keys(keys) => keys.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Decoded entities, or nothing for other shapes.
    #[must_use]
    pub fn into_entities(self) -> Vec<E> {
        match self {
            Self::Entities(rows) => rows.into_iter().map(|f| f.entity).collect(),
            _ => Vec::new(),
        }
    }
}

///
/// RelationHolder
///
/// Relation value supplied alongside an entity on persist.
///

#[derive(Clone, Debug, PartialEq)]
pub struct RelationHolder {
    pub relation: String,
    pub target: RelationTarget,
}

#[derive(Clone, Debug, PartialEq)]
pub enum RelationTarget {
    One(Value),
    Many(Vec<Value>),
}

impl RelationHolder {
    /// Target id of an owning one-to-one or many-to-one relation.
    pub fn one(relation: impl Into<String>, id: impl Into<Value>) -> Self {
        Self {
            relation: relation.into(),
            target: RelationTarget::One(id.into()),
        }
    }

    /// Child ids of a many-to-many relation.
    pub fn many<I, V>(relation: impl Into<String>, ids: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self {
            relation: relation.into(),
            target: RelationTarget::Many(ids.into_iter().map(Into::into).collect()),
        }
    }
}

///
/// JoinTableData
///
/// Pending join rows for several owners of one join kind.
///

#[derive(Clone, Debug, PartialEq)]
pub struct JoinTableData {
    pub join_kind: String,
    pub rows: Vec<(Value, Vec<Value>)>,
}

impl JoinTableData {
    pub fn new(join_kind: impl Into<String>) -> Self {
        Self {
            join_kind: join_kind.into(),
            rows: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_owner<I, V>(mut self, owner: impl Into<Value>, children: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.rows
            .push((owner.into(), children.into_iter().map(Into::into).collect()));
        self
    }
}
