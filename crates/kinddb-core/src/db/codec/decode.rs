use crate::{
    db::{
        codec::{DEFAULT_MAX_BLOB_BYTES, RelationMap},
        record::{NativeRecord, NativeValue},
        relation::decode_relations,
    },
    error::InternalError,
    model::{AttributeKind, EntityModel, FieldModel, ScalarType},
    serialize::decode_blob,
    traits::FieldValues,
    value::Value,
};
use std::collections::BTreeMap;

/// Decode a record with the default fallback blob bound.
pub fn decode<E>(record: &NativeRecord, model: &EntityModel) -> Result<(E, RelationMap), InternalError>
where
    E: FieldValues + Default,
{
    decode_with_limit(record, model, DEFAULT_MAX_BLOB_BYTES)
}

///
/// decode_with_limit
///
/// Rebuild an entity from a keyed record. Missing properties leave the
/// attribute at its default; relation columns go to the side map.
///

pub fn decode_with_limit<E>(
    record: &NativeRecord,
    model: &EntityModel,
    max_blob_bytes: usize,
) -> Result<(E, RelationMap), InternalError>
where
    E: FieldValues + Default,
{
    let id = &model.identifier;
    let key = record.key.as_ref().ok_or_else(|| {
        InternalError::codec_mapping(&model.name, &id.name, "record has no key")
    })?;
    if key.id.kind() != id.kind {
        return Err(InternalError::codec_mapping(
            &model.name,
            &id.name,
            format!("key {key} does not match identifier type {}", id.kind.scalar()),
        ));
    }

    let mut entity = E::default();
    entity
        .set_value(&id.name, key.id.to_value())
        .map_err(|err| err.into_internal(&model.name))?;

    for field in &model.attributes {
        let Some(native) = record.get(&field.column) else {
            continue;
        };
        let value = decode_attribute(&model.name, field, native, max_blob_bytes)?;
        if value.is_null() {
            continue;
        }

        entity
            .set_value(&field.name, value)
            .map_err(|err| err.into_internal(&model.name))?;
    }

    let relations = decode_relations(record, model)?;

    Ok((entity, relations))
}

pub(crate) fn decode_attribute(
    entity: &str,
    field: &FieldModel,
    native: &NativeValue,
    max_blob_bytes: usize,
) -> Result<Value, InternalError> {
    if matches!(native, NativeValue::Null) {
        return Ok(Value::Null);
    }

    let mismatch = || {
        InternalError::codec_mapping(
            entity,
            &field.name,
            format!("declared {}, stored {}", field.kind.label(), native.label()),
        )
    };

    match &field.kind {
        AttributeKind::Scalar(ty) => decode_scalar(*ty, native).ok_or_else(mismatch),

        AttributeKind::Enum { variants } => {
            let NativeValue::Text(symbol) = native else {
                return Err(mismatch());
            };
            if !variants.iter().any(|v| v == symbol) {
                return Err(InternalError::codec_mapping(
                    entity,
                    &field.name,
                    format!("unknown enum symbol {symbol}"),
                ));
            }

            Ok(Value::Enum(symbol.clone()))
        }

        AttributeKind::Collection(ty) => {
            let NativeValue::List(items) = native else {
                return Err(mismatch());
            };

            items
                .iter()
                .map(|item| decode_scalar(*ty, item).ok_or_else(mismatch))
                .collect::<Result<_, _>>()
                .map(Value::List)
        }

        AttributeKind::Embedded(embeddable) => {
            let NativeValue::Embedded(inner) = native else {
                return Err(mismatch());
            };

            let mut fields = BTreeMap::new();
            for attr in &embeddable.attributes {
                if let Some(prop) = inner.properties.get(&attr.column) {
                    let value = decode_attribute(entity, attr, prop, max_blob_bytes)?;
                    if !value.is_null() {
                        fields.insert(attr.name.clone(), value);
                    }
                }
            }

            Ok(Value::Record(fields))
        }

        AttributeKind::Serialized(shape) => {
            let NativeValue::Blob(bytes) = native else {
                return Err(mismatch());
            };

            decode_blob(bytes, *shape, max_blob_bytes)
                .map_err(|err| InternalError::serialization(entity, &field.name, err))
        }
    }
}

#[expect(clippy::cast_precision_loss)]
fn decode_scalar(ty: ScalarType, native: &NativeValue) -> Option<Value> {
    let value = match (ty, native) {
        (_, NativeValue::Null) => Value::Null,
        (ScalarType::Blob, NativeValue::Blob(v)) => Value::Blob(v.clone()),
        (ScalarType::Bool, NativeValue::Bool(v)) => Value::Bool(*v),
        (ScalarType::Float, NativeValue::Float(v)) => Value::Float(*v),
        (ScalarType::Float, NativeValue::Int(v)) => Value::Float(*v as f64),
        (ScalarType::Int, NativeValue::Int(v)) => Value::Int(*v),
        (ScalarType::Text, NativeValue::Text(v)) => Value::Text(v.clone()),
        _ => return None,
    };

    Some(value)
}
