use crate::{db::record::NativeValue, error::InternalError, value::Value};
use std::fmt;

/// Reserved pseudo-property addressing a record's key in filters and sorts.
pub const KEY_RESERVED_PROPERTY: &str = "__key__";

///
/// FilterOperator
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum FilterOperator {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    In,
}

impl FilterOperator {
    /// Parse a condition token. `IN` is case-insensitive; anything outside
    /// the table is a configuration error.
    pub fn parse(condition: &str) -> Result<Self, InternalError> {
        let op = match condition.trim() {
            "=" => Self::Equal,
            "!=" => Self::NotEqual,
            ">" => Self::GreaterThan,
            ">=" => Self::GreaterThanOrEqual,
            "<" => Self::LessThan,
            "<=" => Self::LessThanOrEqual,
            other if other.eq_ignore_ascii_case("IN") => Self::In,
            other => {
                return Err(InternalError::query_configuration(format!(
                    "condition [{other}] is unsupported by this store"
                )));
            }
        };

        Ok(op)
    }

    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Equal => "=",
            Self::NotEqual => "!=",
            Self::GreaterThan => ">",
            Self::GreaterThanOrEqual => ">=",
            Self::LessThan => "<",
            Self::LessThanOrEqual => "<=",
            Self::In => "IN",
        }
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

///
/// Combinator
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Combinator {
    And,
    Or,
}

impl Combinator {
    pub fn parse(token: &str) -> Result<Self, InternalError> {
        let token = token.trim();

        if token.eq_ignore_ascii_case("AND") {
            Ok(Self::And)
        } else if token.eq_ignore_ascii_case("OR") {
            Ok(Self::Or)
        } else {
            Err(InternalError::query_configuration(format!(
                "composition with [{token}] is unsupported by this store"
            )))
        }
    }
}

///
/// FilterClause
///
/// One `attribute operator value` triple as received from the caller.
/// The operator stays raw until the builder translates it.
///

#[derive(Clone, Debug, PartialEq)]
pub struct FilterClause {
    pub attribute: String,
    pub operator: String,
    pub value: Value,
}

impl FilterClause {
    pub fn new(attribute: impl Into<String>, operator: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            attribute: attribute.into(),
            operator: operator.into(),
            value: value.into(),
        }
    }
}

///
/// FilterToken
///
/// Element of the flat filter queue: clauses alternate with combinators.
///

#[derive(Clone, Debug, PartialEq)]
pub enum FilterToken {
    Clause(FilterClause),
    Combinator(String),
}

impl From<FilterClause> for FilterToken {
    fn from(clause: FilterClause) -> Self {
        Self::Clause(clause)
    }
}

///
/// NativeFilter
///
/// Binary predicate tree in store terms. Composites always have exactly
/// two children; a longer chain nests on the left.
///

#[derive(Clone, Debug, PartialEq)]
pub enum NativeFilter {
    Property {
        property: String,
        operator: FilterOperator,
        value: NativeValue,
    },
    Composite {
        combinator: Combinator,
        left: Box<Self>,
        right: Box<Self>,
    },
}

impl NativeFilter {
    pub fn property(property: impl Into<String>, operator: FilterOperator, value: NativeValue) -> Self {
        Self::Property {
            property: property.into(),
            operator,
            value,
        }
    }

    #[must_use]
    pub fn compose(self, combinator: Combinator, right: Self) -> Self {
        Self::Composite {
            combinator,
            left: Box::new(self),
            right: Box::new(right),
        }
    }
}

/// Split a text IN literal shaped `('a','b')` into elements. Commas only
/// separate outside quotes; quoted elements keep their text verbatim and
/// bare ones are trimmed.
pub fn parse_in_list(raw: &str) -> Result<Vec<String>, InternalError> {
    let malformed = |detail: &str| {
        InternalError::query_translation(format!("{detail} in IN list literal [{raw}]"))
    };

    let inner = raw
        .trim()
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .ok_or_else(|| malformed("missing parentheses"))?;

    if inner.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut elements = Vec::new();
    let mut current = String::new();
    let mut open_quote = None;
    let mut quoted = false;

    for c in inner.chars() {
        if let Some(quote) = open_quote {
            if c == quote {
                open_quote = None;
                quoted = true;
            } else {
                current.push(c);
            }
            continue;
        }

        match c {
            ',' => {
                let element = take_element(&mut current, quoted)
                    .ok_or_else(|| malformed("empty element"))?;
                elements.push(element);
                quoted = false;
            }
            '\'' | '"' if !quoted && current.trim().is_empty() => {
                current.clear();
                open_quote = Some(c);
            }
            _ if quoted => {
                if !c.is_whitespace() {
                    return Err(malformed("text after a closing quote"));
                }
            }
            _ => current.push(c),
        }
    }

    if open_quote.is_some() {
        return Err(malformed("unterminated quote"));
    }
    let last = take_element(&mut current, quoted).ok_or_else(|| malformed("empty element"))?;
    elements.push(last);

    Ok(elements)
}

// Bare elements must not be blank; a quoted empty string is kept.
fn take_element(current: &mut String, quoted: bool) -> Option<String> {
    let element = std::mem::take(current);
    if quoted {
        return Some(element);
    }

    let trimmed = element.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
