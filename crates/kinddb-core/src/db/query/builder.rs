use crate::{
    db::{
        codec::lower_literal,
        key::{KeyId, NativeKey},
        query::{
            NativeQuery, OrderingClause, ResultShape, SortKey,
            filter::{
                Combinator, FilterClause, FilterOperator, FilterToken, KEY_RESERVED_PROPERTY,
                NativeFilter, parse_in_list,
            },
        },
        record::NativeValue,
    },
    error::InternalError,
    model::{AttributeKind, EntityModel, IdKind, ModelRegistry},
    value::Value,
};

///
/// QueryBuilder
///
/// Fluent translation of a caller query (projection, filter queue,
/// ordering, limit) into one `NativeQuery`. Attribute names resolve
/// through the entity descriptor; mapped column names are accepted too.
/// A subtype with a discriminator only matches records stamped with it.
/// `build` borrows the builder, so building twice yields equal queries.
///

#[derive(Clone, Debug)]
pub struct QueryBuilder<'a> {
    model: &'a EntityModel,
    registry: &'a ModelRegistry,
    projections: Vec<String>,
    tokens: Vec<FilterToken>,
    orderings: Vec<OrderingClause>,
    limit: Option<usize>,
    keys_only: bool,
}

impl<'a> QueryBuilder<'a> {
    #[must_use]
    pub const fn new(model: &'a EntityModel, registry: &'a ModelRegistry) -> Self {
        Self {
            model,
            registry,
            projections: Vec::new(),
            tokens: Vec::new(),
            orderings: Vec::new(),
            limit: None,
            keys_only: false,
        }
    }

    ///
    /// PROJECTION
    ///

    #[must_use]
    pub fn select<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.projections.extend(names.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn keys_only(mut self) -> Self {
        self.keys_only = true;
        self
    }

    ///
    /// FILTER QUEUE
    ///

    /// Append a clause to the filter queue.
    #[must_use]
    pub fn filter(mut self, attribute: impl Into<String>, operator: &str, value: impl Into<Value>) -> Self {
        self.tokens
            .push(FilterClause::new(attribute, operator, value).into());
        self
    }

    #[must_use]
    pub fn and(self) -> Self {
        self.combinator("AND")
    }

    #[must_use]
    pub fn or(self) -> Self {
        self.combinator("OR")
    }

    /// Append a raw combinator token; validated at build time.
    #[must_use]
    pub fn combinator(mut self, token: impl Into<String>) -> Self {
        self.tokens.push(FilterToken::Combinator(token.into()));
        self
    }

    /// Append a pre-assembled token queue.
    #[must_use]
    pub fn tokens<I>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = FilterToken>,
    {
        self.tokens.extend(tokens);
        self
    }

    ///
    /// ORDERING / LIMIT
    ///

    #[must_use]
    pub fn order_by(mut self, ordering: OrderingClause) -> Self {
        self.orderings.push(ordering);
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    ///
    /// BUILD
    ///

    pub fn build(&self) -> Result<NativeQuery, InternalError> {
        let (projections, id_projected) = self.resolve_projections()?;

        let shape = if self.keys_only || (id_projected && projections.is_empty()) {
            ResultShape::KeysOnly
        } else if projections.is_empty() {
            ResultShape::Entity
        } else {
            ResultShape::Projection
        };

        let query = NativeQuery {
            kind: self.model.kind.clone(),
            projections: match shape {
                ResultShape::Projection => projections,
                _ => Vec::new(),
            },
            filter: self.scope_to_subtype(self.compose_filter()?),
            sorts: self.resolve_orderings()?,
            limit: self.limit,
            keys_only: shape == ResultShape::KeysOnly,
            shape,
        };

        Ok(query)
    }

    // Map projected names to columns; the identifier rides on the key.
    fn resolve_projections(&self) -> Result<(Vec<String>, bool), InternalError> {
        let mut columns = Vec::new();
        let mut id_projected = false;

        for name in &self.projections {
            match self.resolve(name) {
                Some(Resolved::Identifier) => id_projected = true,
                Some(Resolved::Attribute(column, _) | Resolved::Relation(column, _)) => {
                    if !columns.contains(&column) {
                        columns.push(column);
                    }
                }
                None => {
                    return Err(InternalError::query_configuration(format!(
                        "cannot determine type for projected attribute [{name}] of entity {}",
                        self.model.name
                    )));
                }
            }
        }

        Ok((columns, id_projected))
    }

    // Fold the queue left to right: [A, AND, B, OR, C] => OR(AND(A, B), C).
    fn compose_filter(&self) -> Result<Option<NativeFilter>, InternalError> {
        let mut tokens = self.tokens.iter();

        let Some(first) = tokens.next() else {
            return Ok(None);
        };
        let FilterToken::Clause(first) = first else {
            return Err(InternalError::query_translation(
                "filter queue starts with a combinator",
            ));
        };

        let mut acc = self.translate_clause(first)?;

        while let Some(token) = tokens.next() {
            let FilterToken::Combinator(raw) = token else {
                return Err(InternalError::query_translation(
                    "filter queue has two adjacent clauses",
                ));
            };
            let combinator = Combinator::parse(raw)?;

            let clause = match tokens.next() {
                Some(FilterToken::Clause(clause)) => clause,
                Some(FilterToken::Combinator(_)) => {
                    return Err(InternalError::query_translation(
                        "filter queue has two adjacent combinators",
                    ));
                }
                None => {
                    return Err(InternalError::query_translation(
                        "filter queue ends with a combinator",
                    ));
                }
            };

            acc = acc.compose(combinator, self.translate_clause(clause)?);
        }

        Ok(Some(acc))
    }

    fn scope_to_subtype(&self, filter: Option<NativeFilter>) -> Option<NativeFilter> {
        let Some(disc) = &self.model.discriminator else {
            return filter;
        };
        let stamp = NativeFilter::property(
            &disc.column,
            FilterOperator::Equal,
            NativeValue::Text(disc.value.clone()),
        );

        Some(match filter {
            Some(filter) => filter.compose(Combinator::And, stamp),
            None => stamp,
        })
    }

    fn translate_clause(&self, clause: &FilterClause) -> Result<NativeFilter, InternalError> {
        let operator = FilterOperator::parse(&clause.operator)?;
        let resolved = self.resolve(&clause.attribute).ok_or_else(|| {
            InternalError::query_configuration(format!(
                "cannot resolve filter attribute [{}] of entity {}",
                clause.attribute, self.model.name
            ))
        })?;

        match resolved {
            Resolved::Identifier => {
                let id = &self.model.identifier;
                let value = key_literal(&self.model.kind, id.kind, operator, &clause.value)?;

                Ok(NativeFilter::property(KEY_RESERVED_PROPERTY, operator, value))
            }
            Resolved::Relation(column, target) => {
                let target = self.registry.descriptor_for(&target)?;
                let value =
                    key_literal(&target.kind, target.identifier.kind, operator, &clause.value)?;

                Ok(NativeFilter::property(column, operator, value))
            }
            Resolved::Attribute(column, kind) => {
                let value = if operator == FilterOperator::In {
                    in_values(&clause.value, &kind)?
                } else {
                    lower_literal(&clause.value).ok_or_else(|| {
                        InternalError::query_translation(format!(
                            "filter literal for [{}] has no native form",
                            clause.attribute
                        ))
                    })?
                };

                Ok(NativeFilter::property(column, operator, value))
            }
        }
    }

    fn resolve_orderings(&self) -> Result<Vec<SortKey>, InternalError> {
        self.orderings
            .iter()
            .map(|ordering| {
                let segments: Vec<&str> = ordering.path.split('.').collect();
                let attribute = match segments.as_slice() {
                    [alias, attr] if !alias.is_empty() && !attr.is_empty() => *attr,
                    [_, _, _, ..] => {
                        return Err(InternalError::query_translation(format!(
                            "ordering path [{}] reaches into a nested attribute",
                            ordering.path
                        )));
                    }
                    _ => {
                        return Err(InternalError::query_translation(format!(
                            "ordering path [{}] is not alias-qualified",
                            ordering.path
                        )));
                    }
                };

                let property = match self.resolve(attribute) {
                    Some(Resolved::Identifier) => KEY_RESERVED_PROPERTY.to_string(),
                    Some(Resolved::Attribute(column, _) | Resolved::Relation(column, _)) => column,
                    None => {
                        return Err(InternalError::query_configuration(format!(
                            "attribute [{}] not found in entity {}",
                            ordering.path, self.model.name
                        )));
                    }
                };

                Ok(SortKey {
                    property,
                    direction: ordering.direction,
                })
            })
            .collect()
    }

    // Attribute name first, then mapped column name.
    fn resolve(&self, name: &str) -> Option<Resolved> {
        let model = self.model;

        if model.is_identifier(name) || model.identifier.column == name {
            return Some(Resolved::Identifier);
        }

        let attribute = model
            .attribute(name)
            .or_else(|| model.attributes.iter().find(|a| a.column == name));
        if let Some(field) = attribute {
            return Some(Resolved::Attribute(field.column.clone(), field.kind.clone()));
        }

        model
            .relation(name)
            .or_else(|| model.relation_by_column(name))
            .filter(|r| r.stores_key())
            .map(|r| Resolved::Relation(r.column.clone(), r.target.clone()))
    }
}

///
/// Resolved
///

enum Resolved {
    Identifier,
    Attribute(String, AttributeKind),
    Relation(String, String),
}

// Wrap a literal (or each IN element) into a key of `kind`.
fn key_literal(
    kind: &str,
    id_kind: IdKind,
    operator: FilterOperator,
    value: &Value,
) -> Result<NativeValue, InternalError> {
    let to_key = |v: &Value| {
        key_id(v, id_kind).map(|id| NativeValue::Key(NativeKey::new(kind, id))).ok_or_else(|| {
            InternalError::query_translation(format!(
                "literal {} is not a {} identifier of kind {kind}",
                v.label(),
                id_kind.scalar()
            ))
        })
    };

    if operator != FilterOperator::In {
        return to_key(value);
    }

    let elements = match value {
        Value::Text(raw) => parse_in_list(raw)?.into_iter().map(Value::Text).collect(),
        Value::List(items) => items.clone(),
        other => return Err(in_shape_error(other)),
    };

    elements
        .iter()
        .map(to_key)
        .collect::<Result<_, _>>()
        .map(NativeValue::List)
}

// IN operand for a plain attribute: parsed text list or pass-through list.
fn in_values(value: &Value, kind: &AttributeKind) -> Result<NativeValue, InternalError> {
    match value {
        Value::Text(raw) => {
            let elements = parse_in_list(raw)?;
            let coerce_to = kind.filter_scalar().filter(|ty| ty.is_numeric_or_bool());

            elements
                .into_iter()
                .map(|element| match coerce_to {
                    Some(ty) => ty
                        .parse_literal(&element)
                        .as_ref()
                        .and_then(lower_literal)
                        .ok_or_else(|| {
                            InternalError::query_translation(format!(
                                "IN element [{element}] is not a valid {ty}"
                            ))
                        }),
                    None => Ok(NativeValue::Text(element)),
                })
                .collect::<Result<_, _>>()
                .map(NativeValue::List)
        }
        Value::List(_) => lower_literal(value)
            .ok_or_else(|| InternalError::query_translation("IN list has no native form")),
        other => Err(in_shape_error(other)),
    }
}

fn in_shape_error(value: &Value) -> InternalError {
    InternalError::query_translation(format!(
        "IN requires a list literal, found {}",
        value.label()
    ))
}

// Text identifiers take text; int identifiers take ints or numeric text.
fn key_id(value: &Value, kind: IdKind) -> Option<KeyId> {
    match (kind, value) {
        (IdKind::Text, Value::Text(name)) => Some(KeyId::Name(name.clone())),
        (IdKind::Int, Value::Int(id)) => Some(KeyId::Id(*id)),
        (IdKind::Int, Value::Text(raw)) => raw.trim().parse().ok().map(KeyId::Id),
        _ => None,
    }
}
