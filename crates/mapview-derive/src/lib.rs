//! Derive macros for mapview typed views.
//!
//! - `#[derive(ViewType)]` on a named struct declares a view interface and
//!   generates `{Name}View` (typed accessors) and `{Name}ViewBuilder`
//!   (copy-on-write snapshot builder). The struct itself becomes the plain data
//!   object the bean adapter converts to and from.
//! - `#[derive(ViewEnum)]` on a unit-only enum declares an enum attribute type
//!   with named properties used by enum mapping methods.
//!
//! # Usage
//!
//! ```ignore
//! use mapview::{ViewEnum, ViewType};
//!
//! #[derive(ViewEnum, Debug, Clone, Copy, PartialEq, Eq, Hash)]
//! enum Country {
//!     #[mapview(property(name = "ordinal", value = 1))]
//!     HU,
//!     #[mapview(property(name = "ordinal", value = 3))]
//!     AT,
//! }
//!
//! #[derive(ViewType)]
//! #[mapview(name = "User")]
//! struct User {
//!     #[mapview(key = "__id")]
//!     id: String,
//!     login_name: Option<String>,
//!     country: Country,
//! }
//! ```

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

mod codegen;
mod field_kind;
mod parse;

/// Derive `ViewType` for a struct.
///
/// # Attributes
///
/// ## Struct Attributes
///
/// - `#[mapview(name = "TypeName")]`: Registered type name (defaults to the struct name)
/// - `#[mapview(extends(Parent, Other))]`: Interfaces this one extends
///
/// ## Field Attributes
///
/// - `#[mapview(key = "map_key")]`: Store the attribute under a different map key
/// - `#[mapview(embedded)]`: Keep the nested view's entries in this view's map
/// - `#[mapview(skip)]`: Not an attribute (field must implement `Default`)
#[proc_macro_derive(ViewType, attributes(mapview))]
pub fn derive_view_type(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match codegen::expand_view(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

/// Derive `ViewEnum` for a unit-only enum.
///
/// Each variant may carry `#[mapview(property(name = "...", value = <literal>))]`
/// entries; an enum mapping method named after a property maps stored values
/// to constants through it.
#[proc_macro_derive(ViewEnum, attributes(mapview))]
pub fn derive_view_enum(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match codegen::expand_enum(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}
