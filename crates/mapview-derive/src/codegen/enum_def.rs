//! `ViewEnum` code generation.

use super::utils::literal_value;
use crate::parse::ViewEnumInput;
use proc_macro2::TokenStream;
use quote::quote;

pub fn generate(input: &ViewEnumInput) -> syn::Result<TokenStream> {
    let enum_name = &input.ident;
    let type_name = input.type_name();
    let variants = input.variants();

    let mut constants = TokenStream::new();
    let mut name_arms = TokenStream::new();
    let mut lookup_arms = TokenStream::new();

    for variant in &variants {
        let ident = &variant.ident;
        let constant = ident.to_string();

        let mut properties = TokenStream::new();
        for property in &variant.property {
            let name = &property.name;
            let value = literal_value(&property.value)?;
            properties.extend(quote! { .property(#name, #value) });
        }

        constants.extend(quote! {
            .constant(::mapview::EnumConstant::new(#constant) #properties)
        });
        name_arms.extend(quote! { #enum_name::#ident => #constant, });
        lookup_arms.extend(quote! { #constant => ::std::option::Option::Some(#enum_name::#ident), });
    }

    Ok(quote! {
        impl ::mapview::ViewEnum for #enum_name {
            const NAME: &'static str = #type_name;

            fn definition() -> ::mapview::EnumDef {
                ::mapview::EnumDef::new(#type_name) #constants
            }

            fn constant_name(&self) -> &'static str {
                match self {
                    #name_arms
                }
            }

            fn from_constant(name: &str) -> ::std::option::Option<Self> {
                match name {
                    #lookup_arms
                    _ => ::std::option::Option::None,
                }
            }
        }

        impl ::mapview::FieldType for #enum_name {
            type Output = #enum_name;

            fn type_ref() -> ::mapview::TypeRef {
                ::mapview::TypeRef::enumeration(#type_name)
            }

            fn register(registry: &::mapview::TypeRegistry) {
                registry.register_enum(<Self as ::mapview::ViewEnum>::definition());
            }
        }

        impl ::mapview::FromValue for #enum_name {
            fn from_value(value: &::mapview::Value) -> ::mapview::MapViewResult<Self> {
                ::mapview::field::enum_from_value::<Self>(value)
            }
        }

        impl ::mapview::IntoValue for #enum_name {
            fn into_value(self) -> ::mapview::Value {
                ::mapview::field::enum_into_value(&self)
            }
        }
    })
}
