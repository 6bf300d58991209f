use crate::db::key::NativeKey;
use std::collections::BTreeMap;

///
/// NativeValue
///
/// Property value as the store holds it.
///

#[derive(Clone, Debug, PartialEq)]
pub enum NativeValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Blob(Vec<u8>),
    Key(NativeKey),
    Embedded(EmbeddedRecord),
    List(Vec<Self>),
}

impl NativeValue {
    #[must_use]
    pub const fn as_key(&self) -> Option<&NativeKey> {
        match self {
            Self::Key(key) => Some(key),
            _ => None,
        }
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
            Self::Blob(_) => "blob",
            Self::Key(_) => "key",
            Self::Embedded(_) => "embedded",
            Self::List(_) => "list",
        }
    }
}

impl From<NativeKey> for NativeValue {
    fn from(key: NativeKey) -> Self {
        Self::Key(key)
    }
}

///
/// EmbeddedRecord
///
/// Property group stored inline under one column of its owner.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct EmbeddedRecord {
    pub properties: BTreeMap<String, NativeValue>,
}

///
/// NativeRecord
///
/// Flat property bag of one kind. `key` stays `None` until the record has
/// been written or its identifier has been resolved.
///

#[derive(Clone, Debug, PartialEq)]
pub struct NativeRecord {
    pub kind: String,
    pub key: Option<NativeKey>,
    pub properties: BTreeMap<String, NativeValue>,
}

impl NativeRecord {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            key: None,
            properties: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_key(mut self, key: NativeKey) -> Self {
        self.key = Some(key);
        self
    }

    #[must_use]
    pub fn with_property(mut self, column: impl Into<String>, value: NativeValue) -> Self {
        self.set(column, value);
        self
    }

    pub fn set(&mut self, column: impl Into<String>, value: NativeValue) {
        self.properties.insert(column.into(), value);
    }

    #[must_use]
    pub fn get(&self, column: &str) -> Option<&NativeValue> {
        self.properties.get(column)
    }
}
