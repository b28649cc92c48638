mod bind;
mod field;
mod record;

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

/// Derives `satori_xhtml::bind::Bind` and `FromValue` for a struct.
///
/// Field options:
///
/// - `#[attr(name = "..")]` looks the field up under this key first
/// - `#[attr(omitempty)]` makes the field optional
/// - `#[attr(skip)]` leaves the field at its default
/// - `#[serde(rename = "..")]`, `#[serde(default)]` and `#[serde(skip)]`
///   are honoured the same way, after `#[attr]`
///
/// The struct and its optional and skipped fields must implement `Default`;
/// a null nested record converts to the default.
#[proc_macro_derive(Bind, attributes(attr, serde))]
pub fn derive_bind(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    bind::expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

/// Derives `satori_xhtml::Record` and `ToValue`, exposing fields to
/// template expressions by name and by `#[attr(name)]` or
/// `#[serde(rename)]` alias.
#[proc_macro_derive(Record, attributes(attr, serde))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    record::expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
