//! Derive macros for steplix
//!
//! Provides `#[derive(FromRow)]` and `#[derive(Record)]`.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod attr;
mod from_row;
mod record;

/// Derive `FromRow` trait for a struct.
///
/// # Example
///
/// ```ignore
/// use steplix::FromRow;
///
/// #[derive(FromRow)]
/// struct User {
///     id: i64,
///     username: String,
///     #[orm(column = "email_address")]
///     email: Option<String>,
/// }
/// ```
///
/// # Attributes
///
/// - `#[orm(column = "name")]` - Map field to a different column name
#[proc_macro_derive(FromRow, attributes(orm))]
pub fn derive_from_row(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    from_row::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

/// Derive `Record` for a struct, binding it to a table.
///
/// The struct must also implement `FromRow`. The default `populate` hook is
/// used; implement `Record` by hand to load related data.
///
/// # Example
///
/// ```ignore
/// use steplix::{FromRow, Record};
///
/// #[derive(FromRow, Record)]
/// #[orm(table = "users")]
/// struct User {
///     id: i64,
///     username: String,
/// }
/// ```
///
/// # Attributes
///
/// - `#[orm(table = "name")]` - Table name (required)
#[proc_macro_derive(Record, attributes(orm))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    record::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
