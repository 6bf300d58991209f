mod cbor;
mod frame;


use crate::value::ValueShape;
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error as ThisError;

// re-exports
pub use frame::{BLOB_HEADER_LEN, BLOB_MAGIC, decode_blob, encode_blob};

///
/// Binary fallback serialization.
///
/// `cbor` is the format layer, `frame` adds the persisted blob header.
/// Size limits are caller policy and are always passed in explicitly.
///

///
/// SerializeError
///

#[derive(Debug, Eq, PartialEq, ThisError)]
pub enum SerializeError {
    #[error("serialize error: {0}")]
    Serialize(String),

    #[error("deserialize error: {0}")]
    Deserialize(String),

    #[error("payload size limit exceeded: {len} bytes (limit {max_bytes})")]
    SizeLimitExceeded { len: usize, max_bytes: usize },

    #[error("blob too short: {len} bytes")]
    Truncated { len: usize },

    #[error("bad blob magic 0x{found:02X}")]
    BadMagic { found: u8 },

    #[error("unknown shape tag {tag}")]
    UnknownShape { tag: u8 },

    #[error("shape mismatch: declared {declared}, found {found}")]
    ShapeMismatch {
        declared: ValueShape,
        found: ValueShape,
    },

    #[error("length mismatch: header says {declared} bytes, payload has {actual}")]
    LengthMismatch { declared: usize, actual: usize },
}

/// Serialize a value into CBOR.
pub fn serialize<T>(ty: &T) -> Result<Vec<u8>, SerializeError>
where
    T: Serialize,
{
    cbor::serialize(ty)
}

/// Deserialize a value produced by [`serialize`], with an explicit size limit.
pub fn deserialize_bounded<T>(bytes: &[u8], max_bytes: usize) -> Result<T, SerializeError>
where
    T: DeserializeOwned,
{
    cbor::deserialize_bounded(bytes, max_bytes)
}
