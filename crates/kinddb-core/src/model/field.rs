use crate::value::{Value, ValueShape};
use std::fmt;

///
/// ScalarType
///
/// Primitive property types the store holds natively.
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ScalarType {
    Blob,
    Bool,
    Float,
    Int,
    Text,
}

impl ScalarType {
    /// Whether `value` is a valid payload for this type.
    /// `Null` is accepted everywhere; absence is handled by the codec.
    #[must_use]
    pub const fn accepts(self, value: &Value) -> bool {
        matches!(
            (self, value),
            (_, Value::Null)
                | (Self::Blob, Value::Blob(_))
                | (Self::Bool, Value::Bool(_))
                | (Self::Float, Value::Float(_) | Value::Int(_))
                | (Self::Int, Value::Int(_))
                | (Self::Text, Value::Text(_))
        )
    }

    /// Parse an unquoted literal into a value of this type.
    /// Text and blob literals pass through as text.
    #[must_use]
    pub fn parse_literal(self, raw: &str) -> Option<Value> {
        match self {
            Self::Int => raw.parse::<i64>().ok().map(Value::Int),
            Self::Float => raw.parse::<f64>().ok().map(Value::Float),
            Self::Bool => match raw.to_ascii_lowercase().as_str() {
                "true" => Some(Value::Bool(true)),
                "false" => Some(Value::Bool(false)),
                _ => None,
            },
            Self::Text | Self::Blob => Some(Value::Text(raw.to_string())),
        }
    }

    #[must_use]
    pub const fn is_numeric_or_bool(self) -> bool {
        matches!(self, Self::Bool | Self::Float | Self::Int)
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Blob => "blob",
            Self::Bool => "bool",
            Self::Float => "float",
            Self::Int => "int",
            Self::Text => "text",
        };
        f.write_str(label)
    }
}

///
/// AttributeKind
///
/// Storage strategy for one attribute, fixed when the descriptor is built.
///
/// Scalar      → copied 1:1 into a native property
/// Enum        → symbolic variant name, validated on decode
/// Embedded    → nested property group keyed by the embeddable's columns
/// Collection  → native multi-valued property of one scalar type
/// Serialized  → framed CBOR blob for shapes the store cannot hold
///

#[derive(Clone, Debug, PartialEq)]
pub enum AttributeKind {
    Scalar(ScalarType),
    Enum { variants: Vec<String> },
    Embedded(EmbeddableModel),
    Collection(ScalarType),
    Serialized(ValueShape),
}

impl AttributeKind {
    /// Build an enum kind from its variant names.
    pub fn enumeration<I, S>(variants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Enum {
            variants: variants.into_iter().map(Into::into).collect(),
        }
    }

    /// Scalar type a filter literal on this attribute is coerced to, if any.
    #[must_use]
    pub const fn filter_scalar(&self) -> Option<ScalarType> {
        match self {
            Self::Scalar(ty) | Self::Collection(ty) => Some(*ty),
            _ => None,
        }
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Scalar(_) => "scalar",
            Self::Enum { .. } => "enum",
            Self::Embedded(_) => "embedded",
            Self::Collection(_) => "collection",
            Self::Serialized(_) => "serialized",
        }
    }
}

///
/// FieldModel
///

#[derive(Clone, Debug, PartialEq)]
pub struct FieldModel {
    pub name: String,
    pub column: String,
    pub kind: AttributeKind,
}

impl FieldModel {
    /// New attribute whose column defaults to its name.
    pub fn new(name: impl Into<String>, kind: AttributeKind) -> Self {
        let name = name.into();

        Self {
            column: name.clone(),
            name,
            kind,
        }
    }

    pub fn scalar(name: impl Into<String>, ty: ScalarType) -> Self {
        Self::new(name, AttributeKind::Scalar(ty))
    }

    pub fn collection(name: impl Into<String>, ty: ScalarType) -> Self {
        Self::new(name, AttributeKind::Collection(ty))
    }

    pub fn serialized(name: impl Into<String>, shape: ValueShape) -> Self {
        Self::new(name, AttributeKind::Serialized(shape))
    }

    pub fn embedded(name: impl Into<String>, model: EmbeddableModel) -> Self {
        Self::new(name, AttributeKind::Embedded(model))
    }

    pub fn enumeration<I, S>(name: impl Into<String>, variants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(name, AttributeKind::enumeration(variants))
    }

    /// Override the native column name.
    #[must_use]
    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = column.into();
        self
    }
}

///
/// EmbeddableModel
///
/// Value object stored inline in its owner's record. One nesting level:
/// no identifier, no relations, no embedded attributes of its own.
///

#[derive(Clone, Debug, PartialEq)]
pub struct EmbeddableModel {
    pub name: String,
    pub attributes: Vec<FieldModel>,
}

impl EmbeddableModel {
    pub fn new(name: impl Into<String>, attributes: Vec<FieldModel>) -> Self {
        Self {
            name: name.into(),
            attributes,
        }
    }

    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&FieldModel> {
        self.attributes.iter().find(|a| a.name == name)
    }
}
