use crate::{
    db::{
        key::{KeyId, NativeKey},
        record::{EmbeddedRecord, NativeRecord, NativeValue},
    },
    error::InternalError,
    model::{AttributeKind, EntityModel, FieldModel, ScalarType},
    serialize::encode_blob,
    traits::FieldValues,
    value::Value,
};

///
/// encode
///
/// Lower an entity into a native record. The identifier travels in the
/// key (left unset when the entity has none yet), null attributes are
/// omitted and the discriminator is stamped when declared.
///

pub fn encode<E>(entity: &E, model: &EntityModel) -> Result<NativeRecord, InternalError>
where
    E: FieldValues + ?Sized,
{
    let mut record = NativeRecord::new(&model.kind);
    record.key = encode_key(entity, model)?;

    for field in &model.attributes {
        let value = entity.get_value(&field.name).ok_or_else(|| {
            InternalError::codec_mapping(&model.name, &field.name, "accessor table has no such attribute")
        })?;

        if value.is_null() {
            continue;
        }

        let native = encode_attribute(&model.name, field, &value)?;
        record.set(&field.column, native);
    }

    if let Some(disc) = &model.discriminator {
        record.set(&disc.column, NativeValue::Text(disc.value.clone()));
    }

    Ok(record)
}

// Read the identifier attribute; empty text and zero ints count as unassigned.
fn encode_key<E>(entity: &E, model: &EntityModel) -> Result<Option<NativeKey>, InternalError>
where
    E: FieldValues + ?Sized,
{
    let id = &model.identifier;
    let value = entity.get_value(&id.name).unwrap_or(Value::Null);

    match value {
        Value::Null => Ok(None),
        Value::Text(ref s) if s.is_empty() => Ok(None),
        Value::Int(0) => Ok(None),
        other => KeyId::from_value(&other, id.kind)
            .map(|key_id| Some(NativeKey::new(&model.kind, key_id)))
            .ok_or_else(|| {
                InternalError::codec_mapping(
                    &model.name,
                    &id.name,
                    format!("identifier must be {}, found {}", id.kind.scalar(), other.label()),
                )
            }),
    }
}

pub(crate) fn encode_attribute(
    entity: &str,
    field: &FieldModel,
    value: &Value,
) -> Result<NativeValue, InternalError> {
    let mismatch = || {
        InternalError::codec_mapping(
            entity,
            &field.name,
            format!("declared {}, found {}", field.kind.label(), value.label()),
        )
    };

    match &field.kind {
        AttributeKind::Scalar(ty) => encode_scalar(*ty, value).ok_or_else(mismatch),

        AttributeKind::Enum { variants } => {
            let symbol = match value {
                Value::Enum(s) | Value::Text(s) => s,
                _ => return Err(mismatch()),
            };
            if !variants.iter().any(|v| v == symbol) {
                return Err(InternalError::codec_mapping(
                    entity,
                    &field.name,
                    format!("unknown enum symbol {symbol}"),
                ));
            }

            Ok(NativeValue::Text(symbol.clone()))
        }

        AttributeKind::Collection(ty) => {
            let Value::List(items) = value else {
                return Err(mismatch());
            };

            items
                .iter()
                .map(|item| encode_scalar(*ty, item).ok_or_else(mismatch))
                .collect::<Result<_, _>>()
                .map(NativeValue::List)
        }

        AttributeKind::Embedded(embeddable) => {
            let Value::Record(fields) = value else {
                return Err(mismatch());
            };

            if let Some(unknown) = fields.keys().find(|k| embeddable.attribute(k).is_none()) {
                return Err(InternalError::codec_mapping(
                    entity,
                    &field.name,
                    format!("embeddable {} has no attribute [{unknown}]", embeddable.name),
                ));
            }

            let mut inner = EmbeddedRecord::default();
            for attr in &embeddable.attributes {
                match fields.get(&attr.name) {
                    None | Some(Value::Null) => {}
                    Some(v) => {
                        inner
                            .properties
                            .insert(attr.column.clone(), encode_attribute(entity, attr, v)?);
                    }
                }
            }

            Ok(NativeValue::Embedded(inner))
        }

        AttributeKind::Serialized(shape) => encode_blob(value, *shape)
            .map(NativeValue::Blob)
            .map_err(|err| InternalError::serialization(entity, &field.name, err)),
    }
}

// Scalars copy 1:1; an int written to a float attribute widens.
#[expect(clippy::cast_precision_loss)]
fn encode_scalar(ty: ScalarType, value: &Value) -> Option<NativeValue> {
    let native = match (ty, value) {
        (_, Value::Null) => NativeValue::Null,
        (ScalarType::Blob, Value::Blob(v)) => NativeValue::Blob(v.clone()),
        (ScalarType::Bool, Value::Bool(v)) => NativeValue::Bool(*v),
        (ScalarType::Float, Value::Float(v)) => NativeValue::Float(*v),
        (ScalarType::Float, Value::Int(v)) => NativeValue::Float(*v as f64),
        (ScalarType::Int, Value::Int(v)) => NativeValue::Int(*v),
        (ScalarType::Text, Value::Text(v)) => NativeValue::Text(v.clone()),
        _ => return None,
    };

    Some(native)
}
