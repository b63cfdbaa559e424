//! Record derive macro implementation

use proc_macro2::TokenStream;
use quote::quote;
use syn::{DeriveInput, Result};

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let Some(table) = crate::attr::string_value(&input.attrs, "table")? else {
        return Err(syn::Error::new_spanned(
            &input,
            "Record requires #[orm(table = \"table_name\")] attribute",
        ));
    };
    if table.trim().is_empty() {
        return Err(syn::Error::new_spanned(
            &input,
            "#[orm(table = ...)] must not be empty",
        ));
    }

    Ok(quote! {
        impl #impl_generics steplix::Record for #name #ty_generics #where_clause {
            const TABLE: &'static str = #table;
        }
    })
}
