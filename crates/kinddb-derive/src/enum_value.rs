use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Error, Fields};

// derive_enum_value
// Variants map to their identifier verbatim; text is accepted on the way back.
pub fn derive_enum_value(input: TokenStream) -> TokenStream {
    let input: DeriveInput = match syn::parse2(input) {
        Ok(input) => input,
        Err(err) => return err.to_compile_error(),
    };

    let ident = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let Data::Enum(data) = &input.data else {
        return Error::new_spanned(ident, "EnumValue can only be derived for enums")
            .to_compile_error();
    };
    if data.variants.is_empty() {
        return Error::new_spanned(ident, "EnumValue needs at least one variant")
            .to_compile_error();
    }
    if let Some(variant) = data.variants.iter().find(|v| !matches!(v.fields, Fields::Unit)) {
        return Error::new_spanned(variant, "EnumValue variants cannot carry data")
            .to_compile_error();
    }

    let idents: Vec<_> = data.variants.iter().map(|v| &v.ident).collect();
    let names: Vec<String> = idents.iter().map(ToString::to_string).collect();

    quote! {
        impl #impl_generics #ident #ty_generics #where_clause {
            /// Symbols in declaration order.
            pub const VARIANTS: &'static [&'static str] = &[#(#names),*];
        }

        impl #impl_generics ::kinddb::traits::FieldValue for #ident #ty_generics #where_clause {
            fn to_value(&self) -> ::kinddb::value::Value {
                let symbol = match self {
                    #(Self::#idents => #names,)*
                };

                ::kinddb::value::Value::Enum(symbol.to_string())
            }

            fn from_value(value: &::kinddb::value::Value) -> Option<Self> {
                match value {
                    ::kinddb::value::Value::Enum(symbol) | ::kinddb::value::Value::Text(symbol) => {
                        match symbol.as_str() {
                            #(#names => Some(Self::#idents),)*
                            _ => None,
                        }
                    }
                    _ => None,
                }
            }
        }
    }
}
