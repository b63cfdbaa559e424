//! `#[orm(key = "value")]` attribute lookup shared by the derives.

use syn::{Attribute, Expr, ExprLit, Lit, MetaNameValue, Result};

/// The string value of `key` in the first `#[orm(key = "...")]` attribute
/// that names it.
///
/// A matching key with a non-string value is an error.
pub fn string_value(attrs: &[Attribute], key: &str) -> Result<Option<String>> {
    for attr in attrs {
        if !attr.path().is_ident("orm") {
            continue;
        }
        let Ok(nested) = attr.parse_args::<MetaNameValue>() else {
            continue;
        };
        if !nested.path.is_ident(key) {
            continue;
        }
        return match &nested.value {
            Expr::Lit(ExprLit {
                lit: Lit::Str(lit), ..
            }) => Ok(Some(lit.value())),
            other => Err(syn::Error::new_spanned(
                other,
                format!("#[orm({key} = ...)] expects a string literal"),
            )),
        };
    }
    Ok(None)
}
