//! Code generation for the view derive macros.

mod enum_def;
mod utils;
mod view;

use crate::field_kind::FieldKind;
use crate::parse::{ViewEnumInput, ViewTypeInput};
use darling::FromDeriveInput;
use proc_macro2::TokenStream;
use syn::DeriveInput;

/// Entry point for `#[derive(ViewType)]`.
pub fn expand_view(input: &DeriveInput) -> syn::Result<TokenStream> {
    let parsed = ViewTypeInput::from_derive_input(input)
        .map_err(|e| syn::Error::new_spanned(input, e.to_string()))?;

    for field in parsed.fields() {
        if let Some(replacement) = FieldKind::from_type(&field.ty).unsupported() {
            if !field.skip {
                return Err(syn::Error::new_spanned(
                    &field.ty,
                    format!("unsupported collection type in a view field; use {replacement}"),
                ));
            }
        }

        if field.embedded && field.key.is_some() {
            return Err(syn::Error::new_spanned(
                field.ident(),
                "#[mapview(embedded)] and #[mapview(key)] cannot be used together. \
                 Embedded attributes store their entries under their own keys.",
            ));
        }

        if field.embedded && field.skip {
            return Err(syn::Error::new_spanned(
                field.ident(),
                "#[mapview(embedded)] has no effect on a skipped field.",
            ));
        }

        if field.embedded && !FieldKind::from_type(&field.ty).is_nested() {
            return Err(syn::Error::new_spanned(
                &field.ty,
                "#[mapview(embedded)] only supports view struct fields (non-Option/Vec/Map). \
                 The field must be a type that derives ViewType.",
            ));
        }
    }

    view::generate(&parsed)
}

/// Entry point for `#[derive(ViewEnum)]`.
pub fn expand_enum(input: &DeriveInput) -> syn::Result<TokenStream> {
    let parsed = ViewEnumInput::from_derive_input(input)
        .map_err(|e| syn::Error::new_spanned(input, e.to_string()))?;

    enum_def::generate(&parsed)
}
