use proc_macro2::TokenStream;
use syn::{Data, DeriveInput, Error, Field, Fields, punctuated::Punctuated, token::Comma};

// Named fields of a struct, or a spanned error naming the derive.
pub fn named_fields<'a>(
    input: &'a DeriveInput,
    derive: &str,
) -> Result<&'a Punctuated<Field, Comma>, TokenStream> {
    let message = format!("{derive} can only be derived for structs with named fields");

    match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => Ok(&named.named),
            other => Err(Error::new_spanned(other, message).to_compile_error()),
        },
        _ => Err(Error::new_spanned(&input.ident, message).to_compile_error()),
    }
}
