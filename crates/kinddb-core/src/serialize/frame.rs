use crate::{
    serialize::{SerializeError, deserialize_bounded, serialize},
    value::{Value, ValueShape},
};

/// First byte of every fallback blob.
pub const BLOB_MAGIC: u8 = 0xCB;

/// magic (1) + shape tag (1) + big-endian payload length (4)
pub const BLOB_HEADER_LEN: usize = 6;

///
/// encode_blob
///
/// Frame a value as `[magic][shape tag][u32 BE length][CBOR payload]`.
/// The tag records the value's actual shape; `declared` must accept it.
///

pub fn encode_blob(value: &Value, declared: ValueShape) -> Result<Vec<u8>, SerializeError> {
    let found = value.shape();
    if !declared.accepts(found) {
        return Err(SerializeError::ShapeMismatch { declared, found });
    }

    let payload = serialize(value)?;
    let len = u32::try_from(payload.len()).map_err(|_| SerializeError::SizeLimitExceeded {
        len: payload.len(),
        max_bytes: u32::MAX as usize,
    })?;

    let mut bytes = Vec::with_capacity(BLOB_HEADER_LEN + payload.len());
    bytes.push(BLOB_MAGIC);
    bytes.push(found.tag());
    bytes.extend_from_slice(&len.to_be_bytes());
    bytes.extend_from_slice(&payload);

    Ok(bytes)
}

///
/// decode_blob
///
/// Verify the header of a fallback blob and decode its payload.
/// Checks run in layout order: length, magic, tag, declared length, then
/// the CBOR payload bounded by `max_bytes`.
///

pub fn decode_blob(
    bytes: &[u8],
    declared: ValueShape,
    max_bytes: usize,
) -> Result<Value, SerializeError> {
    if bytes.len() < BLOB_HEADER_LEN {
        return Err(SerializeError::Truncated { len: bytes.len() });
    }
    if bytes[0] != BLOB_MAGIC {
        return Err(SerializeError::BadMagic { found: bytes[0] });
    }

    let tag = bytes[1];
    let found = ValueShape::from_tag(tag).ok_or(SerializeError::UnknownShape { tag })?;
    if !declared.accepts(found) {
        return Err(SerializeError::ShapeMismatch { declared, found });
    }

    let len_bytes = [bytes[2], bytes[3], bytes[4], bytes[5]];
    let declared_len = u32::from_be_bytes(len_bytes) as usize;
    let payload = &bytes[BLOB_HEADER_LEN..];
    if payload.len() != declared_len {
        return Err(SerializeError::LengthMismatch {
            declared: declared_len,
            actual: payload.len(),
        });
    }

    let value: Value = deserialize_bounded(payload, max_bytes)?;
    if value.shape() != found {
        return Err(SerializeError::ShapeMismatch {
            declared: found,
            found: value.shape(),
        });
    }

    Ok(value)
}
