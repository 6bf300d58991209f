//! Derives for kinddb accessor tables and value conversions.
//!
//! Generated code refers to `::kinddb`, so the deriving crate must depend
//! on the `kinddb` facade (or be `kinddb-core` itself).

use proc_macro::TokenStream;

mod embedded;
mod enum_value;
mod field_values;
mod util;

/// Accessor table keyed by field name.
#[proc_macro_derive(FieldValues)]
pub fn derive_field_values(input: TokenStream) -> TokenStream {
    field_values::derive_field_values(input.into()).into()
}

/// `FieldValue` for an embeddable struct, as a `Value::Record` of its fields.
#[proc_macro_derive(EmbeddedValue)]
pub fn derive_embedded_value(input: TokenStream) -> TokenStream {
    embedded::derive_embedded_value(input.into()).into()
}

/// `FieldValue` for a unit-only enum, as a `Value::Enum` of the variant name.
#[proc_macro_derive(EnumValue)]
pub fn derive_enum_value(input: TokenStream) -> TokenStream {
    enum_value::derive_enum_value(input.into()).into()
}
