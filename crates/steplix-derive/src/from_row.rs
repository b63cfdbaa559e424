//! FromRow derive macro implementation

use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields, Result};

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input,
                    "FromRow can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input,
                "FromRow can only be derived for structs",
            ));
        }
    };

    let mut field_extracts = Vec::with_capacity(fields.len());
    for field in fields {
        let Some(field_name) = field.ident.as_ref() else {
            continue;
        };
        let column_name = column_name(field)?.unwrap_or_else(|| field_name.to_string());
        field_extracts.push(quote! {
            #field_name: row.try_get_column(#column_name)?
        });
    }

    Ok(quote! {
        impl #impl_generics steplix::FromRow for #name #ty_generics #where_clause {
            fn from_row(row: &steplix::tokio_postgres::Row) -> steplix::OrmResult<Self> {
                use steplix::RowExt;
                Ok(Self {
                    #(#field_extracts),*
                })
            }
        }
    })
}

/// `#[orm(column = "...")]` on a field.
fn column_name(field: &syn::Field) -> Result<Option<String>> {
    crate::attr::string_value(&field.attrs, "column")
}
