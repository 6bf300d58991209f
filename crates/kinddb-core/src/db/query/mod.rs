mod builder;
mod filter;


// re-exports
pub use builder::QueryBuilder;
pub use filter::{
    Combinator, FilterClause, FilterOperator, FilterToken, KEY_RESERVED_PROPERTY, NativeFilter,
    parse_in_list,
};

use crate::db::record::NativeValue;

///
/// SortDirection
///

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

///
/// OrderingClause
///
/// Caller-side ordering on an alias-qualified path such as `e.salary`.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OrderingClause {
    pub path: String,
    pub direction: SortDirection,
}

impl OrderingClause {
    pub fn new(path: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            path: path.into(),
            direction,
        }
    }

    pub fn asc(path: impl Into<String>) -> Self {
        Self::new(path, SortDirection::Ascending)
    }

    pub fn desc(path: impl Into<String>) -> Self {
        Self::new(path, SortDirection::Descending)
    }
}

///
/// SortKey
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SortKey {
    pub property: String,
    pub direction: SortDirection,
}

///
/// ResultShape
///
/// How rows of a built query are decoded.
///
/// Entity     → full records decoded into entities
/// Projection → selected columns only, returned as value rows
/// KeysOnly   → keys only, no properties fetched
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ResultShape {
    Entity,
    Projection,
    KeysOnly,
}

///
/// NativeQuery
///
/// Store-side query produced by `QueryBuilder::build`.
///

#[derive(Clone, Debug, PartialEq)]
pub struct NativeQuery {
    pub kind: String,
    /// Projected property names, in request order.
    pub projections: Vec<String>,
    pub filter: Option<NativeFilter>,
    pub sorts: Vec<SortKey>,
    pub limit: Option<usize>,
    pub keys_only: bool,
    pub shape: ResultShape,
}

impl NativeQuery {
    /// Unfiltered full-record query over one kind.
    pub fn kind(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            projections: Vec::new(),
            filter: None,
            sorts: Vec::new(),
            limit: None,
            keys_only: false,
            shape: ResultShape::Entity,
        }
    }

    /// Keys-only query with a single equality filter.
    pub fn keys_where(kind: impl Into<String>, property: impl Into<String>, value: NativeValue) -> Self {
        Self {
            filter: Some(NativeFilter::property(property, FilterOperator::Equal, value)),
            keys_only: true,
            shape: ResultShape::KeysOnly,
            ..Self::kind(kind)
        }
    }

    /// Equality-filtered query projecting one property.
    pub fn project_where(
        kind: impl Into<String>,
        property: impl Into<String>,
        value: NativeValue,
        projection: impl Into<String>,
    ) -> Self {
        Self {
            filter: Some(NativeFilter::property(property, FilterOperator::Equal, value)),
            projections: vec![projection.into()],
            shape: ResultShape::Projection,
            ..Self::kind(kind)
        }
    }

    #[must_use]
    pub fn with_filter(mut self, filter: NativeFilter) -> Self {
        self.filter = Some(filter);
        self
    }
}
