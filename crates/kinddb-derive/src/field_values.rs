use crate::util::named_fields;
use proc_macro2::TokenStream;
use quote::quote;
use syn::DeriveInput;

// derive_field_values
pub fn derive_field_values(input: TokenStream) -> TokenStream {
    let input: DeriveInput = match syn::parse2(input) {
        Ok(input) => input,
        Err(err) => return err.to_compile_error(),
    };

    let ident = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match named_fields(&input, "FieldValues") {
        Ok(fields) => fields,
        Err(err) => return err,
    };

    let get_arms = fields.iter().map(|field| {
        let field_ident = field.ident.as_ref().expect("named field");
        let field_name = field_ident.to_string();

        quote! {
            #field_name => Some(FieldValue::to_value(&self.#field_ident)),
        }
    });

    let set_arms = fields.iter().map(|field| {
        let field_ident = field.ident.as_ref().expect("named field");
        let field_name = field_ident.to_string();

        quote! {
            #field_name => ::kinddb::traits::assign(&mut self.#field_ident, attribute, &value),
        }
    });

    quote! {
        impl #impl_generics ::kinddb::traits::FieldValues for #ident #ty_generics #where_clause {
            fn get_value(&self, attribute: &str) -> Option<::kinddb::value::Value> {
                use ::kinddb::traits::FieldValue;

                match attribute {
                    #(#get_arms)*
                    _ => None,
                }
            }

            #[allow(unused_variables)]
            fn set_value(
                &mut self,
                attribute: &str,
                value: ::kinddb::value::Value,
            ) -> Result<(), ::kinddb::traits::FieldError> {
                match attribute {
                    #(#set_arms)*
                    _ => Err(::kinddb::traits::FieldError::unknown(attribute)),
                }
            }
        }
    }
}
