mod decode;
mod encode;


use crate::{db::record::NativeValue, value::Value};
use std::collections::BTreeMap;

// re-exports
pub use decode::{decode, decode_with_limit};
pub use encode::encode;
pub(crate) use {decode::decode_attribute, encode::encode_attribute};

///
/// Key/Record codec
///
/// Moves attribute values between an entity's accessor table and a
/// `NativeRecord` according to each attribute's declared `AttributeKind`.
/// Relation columns are handled by `db::relation`; the codec only calls
/// into it on decode to fill the side map.
///

/// Relation column → raw target identifier, produced alongside a decoded entity.
pub type RelationMap = BTreeMap<String, Value>;

/// Default bound on one fallback blob payload.
pub const DEFAULT_MAX_BLOB_BYTES: usize = 1024 * 1024;

/// Lower a scalar or list literal into its native form.
/// Enum symbols lower to text. Maps and records have no native form.
#[must_use]
pub fn lower_literal(value: &Value) -> Option<NativeValue> {
    let native = match value {
        Value::Null => NativeValue::Null,
        Value::Bool(v) => NativeValue::Bool(*v),
        Value::Int(v) => NativeValue::Int(*v),
        Value::Float(v) => NativeValue::Float(*v),
        Value::Text(v) | Value::Enum(v) => NativeValue::Text(v.clone()),
        Value::Blob(v) => NativeValue::Blob(v.clone()),
        Value::List(items) => {
            NativeValue::List(items.iter().map(lower_literal).collect::<Option<_>>()?)
        }
        Value::Map(_) | Value::Record(_) => return None,
    };

    Some(native)
}

/// Lift a native scalar back to a `Value`; keys lift to their raw identifier.
#[must_use]
pub fn lift_scalar(native: &NativeValue) -> Option<Value> {
    let value = match native {
        NativeValue::Null => Value::Null,
        NativeValue::Bool(v) => Value::Bool(*v),
        NativeValue::Int(v) => Value::Int(*v),
        NativeValue::Float(v) => Value::Float(*v),
        NativeValue::Text(v) => Value::Text(v.clone()),
        NativeValue::Blob(v) => Value::Blob(v.clone()),
        NativeValue::Key(key) => key.id.to_value(),
        NativeValue::List(items) => {
            Value::List(items.iter().map(lift_scalar).collect::<Option<_>>()?)
        }
        NativeValue::Embedded(_) => return None,
    };

    Some(value)
}
