//! Shared utility functions for code generation.

use crate::field_kind::extract_single_generic_arg;
use proc_macro2::TokenStream;
use quote::quote;
use syn::Lit;

/// Extract the element type from `Vec<T>` or a set type.
pub fn extract_inner_type(ty: &syn::Type) -> syn::Type {
    if let syn::Type::Path(type_path) = ty {
        if let Some(segment) = type_path.path.segments.last() {
            if let Some(inner) = extract_single_generic_arg(&segment.arguments) {
                return inner.clone();
            }
        }
    }
    ty.clone()
}

/// Render a property literal as a `mapview::Value` expression.
pub fn literal_value(lit: &Lit) -> syn::Result<TokenStream> {
    Ok(match lit {
        Lit::Int(int) => quote! { ::mapview::Value::Int(#int as i64) },
        Lit::Float(float) => quote! { ::mapview::Value::Float(#float as f64) },
        Lit::Str(s) => quote! { ::mapview::Value::from(#s) },
        Lit::Bool(b) => quote! { ::mapview::Value::Bool(#b) },
        other => {
            return Err(syn::Error::new_spanned(
                other,
                "property values must be integer, float, string or bool literals",
            ))
        }
    })
}
