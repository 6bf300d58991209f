use crate::util::named_fields;
use proc_macro2::TokenStream;
use quote::quote;
use syn::DeriveInput;

///
/// derive_embedded_value
///
/// Null fields are left out of the record. On the way back, absent keys
/// keep the `Default` value and unknown keys are ignored; a present key
/// that does not convert fails the whole value.
///

pub fn derive_embedded_value(input: TokenStream) -> TokenStream {
    let input: DeriveInput = match syn::parse2(input) {
        Ok(input) => input,
        Err(err) => return err.to_compile_error(),
    };

    let ident = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match named_fields(&input, "EmbeddedValue") {
        Ok(fields) => fields,
        Err(err) => return err,
    };

    let inserts = fields.iter().map(|field| {
        let field_ident = field.ident.as_ref().expect("named field");
        let field_name = field_ident.to_string();

        quote! {
            let value = FieldValue::to_value(&self.#field_ident);
            if !value.is_null() {
                fields.insert(#field_name.to_string(), value);
            }
        }
    });

    let reads = fields.iter().map(|field| {
        let field_ident = field.ident.as_ref().expect("named field");
        let field_name = field_ident.to_string();

        quote! {
            if let Some(value) = fields.get(#field_name) {
                out.#field_ident = FieldValue::from_value(value)?;
            }
        }
    });

    quote! {
        impl #impl_generics ::kinddb::traits::FieldValue for #ident #ty_generics #where_clause {
            fn to_value(&self) -> ::kinddb::value::Value {
                use ::kinddb::traits::FieldValue;

                let mut fields = ::std::collections::BTreeMap::new();
                #(#inserts)*

                ::kinddb::value::Value::Record(fields)
            }

            fn from_value(value: &::kinddb::value::Value) -> Option<Self> {
                use ::kinddb::traits::FieldValue;

                let fields = value.as_record()?;
                let mut out = <Self as ::std::default::Default>::default();
                #(#reads)*

                Some(out)
            }
        }
    }
}
