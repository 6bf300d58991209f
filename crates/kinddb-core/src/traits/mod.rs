mod field_value;


use crate::{
    error::{ErrorClass, ErrorOrigin, InternalError},
    value::Value,
};
use thiserror::Error as ThisError;

// re-exports
pub use field_value::Blob;

///
/// FieldError
///
/// Raised by an accessor table when an attribute name or value does not
/// fit the entity type.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum FieldError {
    #[error("unknown attribute [{attribute}]")]
    UnknownAttribute { attribute: String },

    #[error("attribute [{attribute}] expects {expected}, found {found}")]
    TypeMismatch {
        attribute: String,
        expected: &'static str,
        found: &'static str,
    },
}

impl FieldError {
    #[must_use]
    pub fn unknown(attribute: &str) -> Self {
        Self::UnknownAttribute {
            attribute: attribute.to_string(),
        }
    }

    #[must_use]
    pub fn mismatch<T>(attribute: &str, found: &Value) -> Self {
        Self::TypeMismatch {
            attribute: attribute.to_string(),
            expected: std::any::type_name::<T>(),
            found: found.label(),
        }
    }

    /// Attach the owning entity name and lift into the runtime error type.
    #[must_use]
    pub fn into_internal(self, entity: &str) -> InternalError {
        InternalError::new(
            ErrorClass::Mapping,
            ErrorOrigin::Codec,
            format!("entity {entity}: {self}"),
        )
    }
}

///
/// FieldValue
///
/// Conversion boundary between one Rust attribute type and `Value`.
///

pub trait FieldValue {
    fn to_value(&self) -> Value;

    #[must_use]
    fn from_value(value: &Value) -> Option<Self>
    where
        Self: Sized;
}

///
/// FieldValues
///
/// Accessor table keyed by attribute name. Implemented by hand or through
/// `#[derive(FieldValues)]`; it is the only way the codec touches an entity.
///

pub trait FieldValues {
    /// Read one attribute; `None` when the name is unknown.
    fn get_value(&self, attribute: &str) -> Option<Value>;

    /// Overwrite one attribute from a decoded value.
    fn set_value(&mut self, attribute: &str, value: Value) -> Result<(), FieldError>;
}

///
/// EntityKind
///
/// Binds a Rust entity type to the name it is registered under in the
/// `ModelRegistry`. `Default` provides the zero-valued instance decode
/// starts from.
///

pub trait EntityKind: FieldValues + Default {
    const ENTITY_NAME: &'static str;
}

/// Set one attribute through `FieldValue`, reporting a typed mismatch.
pub fn assign<T: FieldValue>(slot: &mut T, attribute: &str, value: &Value) -> Result<(), FieldError> {
    match T::from_value(value) {
        Some(converted) => {
            *slot = converted;
            Ok(())
        }
        None => Err(FieldError::mismatch::<T>(attribute, value)),
    }
}
