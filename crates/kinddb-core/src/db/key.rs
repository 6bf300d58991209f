use crate::{model::IdKind, value::Value};
use derive_more::{Display, From};

///
/// KeyId
///
/// Identifier half of a native key: a caller-chosen name or a numeric id.
///

#[derive(Clone, Debug, Display, Eq, From, Hash, Ord, PartialEq, PartialOrd)]
pub enum KeyId {
    #[display("{_0:?}")]
    Name(String),

    #[display("{_0}")]
    Id(i64),
}

impl KeyId {
    /// Entity-side identifier value.
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::Name(name) => Value::Text(name.clone()),
            Self::Id(id) => Value::Int(*id),
        }
    }

    /// Identifier from an entity-side value of the declared kind.
    /// `None` when the value does not fit.
    #[must_use]
    pub fn from_value(value: &Value, kind: IdKind) -> Option<Self> {
        match (kind, value) {
            (IdKind::Text, Value::Text(name)) if !name.is_empty() => Some(Self::Name(name.clone())),
            (IdKind::Int, Value::Int(id)) if *id != 0 => Some(Self::Id(*id)),
            _ => None,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> IdKind {
        match self {
            Self::Name(_) => IdKind::Text,
            Self::Id(_) => IdKind::Int,
        }
    }
}

impl From<&str> for KeyId {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

///
/// NativeKey
///
/// Store address of one record. Immutable once assigned.
///

#[derive(Clone, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[display("{kind}({id})")]
pub struct NativeKey {
    pub kind: String,
    pub id: KeyId,
}

impl NativeKey {
    pub fn new(kind: impl Into<String>, id: impl Into<KeyId>) -> Self {
        Self {
            kind: kind.into(),
            id: id.into(),
        }
    }

    /// Key for an entity-side identifier value, if it has the declared kind.
    #[must_use]
    pub fn from_value(kind: &str, value: &Value, id_kind: IdKind) -> Option<Self> {
        KeyId::from_value(value, id_kind).map(|id| Self::new(kind, id))
    }
}
