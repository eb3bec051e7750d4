//! `ViewType` code generation.
//!
//! Generates the typed view wrapper, its snapshot builder, the interface
//! definition and the bean conversions for a struct.

use super::utils::extract_inner_type;
use crate::field_kind::FieldKind;
use crate::parse::{FieldInput, ViewTypeInput};
use proc_macro2::TokenStream;
use quote::{format_ident, quote};

pub fn generate(input: &ViewTypeInput) -> syn::Result<TokenStream> {
    let struct_name = &input.ident;
    let view_name = format_ident!("{}View", struct_name);
    let builder_name = format_ident!("{}ViewBuilder", struct_name);
    let vis = &input.vis;
    let type_name = input.type_name();

    let all_fields = input.fields();
    let fields: Vec<_> = all_fields
        .iter()
        .copied()
        .filter(|f| f.is_included())
        .collect();

    let accessors = generate_accessors(&fields);
    let builder_methods = generate_builder_methods(&fields);
    let definition = generate_definition(input, &fields);
    let registrations = generate_registrations(input, &fields);
    let bean_impls = generate_bean_impls(struct_name, &all_fields);

    Ok(quote! {
        /// Typed view over a backing map.
        #[derive(Clone, Debug, PartialEq, Eq, Hash)]
        #vis struct #view_name {
            view: ::mapview::View,
        }

        impl #view_name {
            #accessors
        }

        impl ::std::ops::Deref for #view_name {
            type Target = ::mapview::View;

            fn deref(&self) -> &::mapview::View {
                &self.view
            }
        }

        impl ::std::fmt::Display for #view_name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                ::std::fmt::Display::fmt(&self.view, f)
            }
        }

        impl ::mapview::TypedView for #view_name {
            fn from_view(view: ::mapview::View) -> Self {
                Self { view }
            }

            fn as_view(&self) -> &::mapview::View {
                &self.view
            }

            fn into_view(self) -> ::mapview::View {
                self.view
            }
        }

        impl ::mapview::FromValue for #view_name {
            fn from_value(value: &::mapview::Value) -> ::mapview::MapViewResult<Self> {
                ::mapview::field::view_from_value(value, #type_name)
            }
        }

        impl ::mapview::IntoValue for #view_name {
            fn into_value(self) -> ::mapview::Value {
                ::mapview::Value::View(self.view)
            }
        }

        impl ::std::convert::From<#view_name> for ::mapview::Value {
            fn from(view: #view_name) -> Self {
                ::mapview::Value::View(view.view)
            }
        }

        /// Copy-on-write builder for the typed view.
        #[derive(Clone, Debug)]
        #vis struct #builder_name {
            inner: ::mapview::SnapshotBuilder,
        }

        impl #builder_name {
            /// Start an empty snapshot.
            pub fn new(ctx: &::mapview::ViewContext) -> ::mapview::MapViewResult<Self> {
                Ok(Self { inner: ctx.snapshot::<#struct_name>()? })
            }

            /// Start from a copy of an existing view.
            pub fn from_view(view: &#view_name) -> ::mapview::MapViewResult<Self> {
                Ok(Self { inner: ::mapview::SnapshotBuilder::from_existing(&view.view)? })
            }

            /// Configuration of the built view.
            pub fn with_config(&self, config: ::mapview::Config) -> ::mapview::MapViewResult<Self> {
                Ok(Self { inner: self.inner.with_config(config)? })
            }

            #builder_methods

            pub fn build(&self) -> ::mapview::MapViewResult<#view_name> {
                self.inner.build_as::<#struct_name>()
            }

            pub fn snapshot(&self) -> &::mapview::SnapshotBuilder {
                &self.inner
            }
        }

        impl ::mapview::ViewType for #struct_name {
            type View = #view_name;

            const NAME: &'static str = #type_name;

            fn definition() -> ::mapview::InterfaceDef {
                #definition
            }
        }

        impl ::mapview::FieldType for #struct_name {
            type Output = #view_name;

            fn type_ref() -> ::mapview::TypeRef {
                ::mapview::TypeRef::interface(#type_name)
            }

            fn register(registry: &::mapview::TypeRegistry) {
                if registry.register_interface(<Self as ::mapview::ViewType>::definition()) {
                    #registrations
                }
            }
        }

        #bean_impls
    })
}

fn generate_accessors(fields: &[&FieldInput]) -> TokenStream {
    let mut methods = TokenStream::new();

    for field in fields {
        let field_name = field.ident();
        let field_ty = &field.ty;
        let attribute = field.attribute_name();
        let kind = FieldKind::from_type(field_ty);
        let set_name = format_ident!("set_{}", field_name);

        if field.embedded {
            methods.extend(quote! {
                /// View over the embedded attribute's entries in this map.
                pub fn #field_name(&self) -> ::mapview::MapViewResult<<#field_ty as ::mapview::ViewType>::View> {
                    ::mapview::field::read_embedded_view::<#field_ty>(&self.view, #attribute)
                }
            });
        } else {
            methods.extend(quote! {
                /// Read the attribute; `None` when null.
                pub fn #field_name(&self) -> ::mapview::MapViewResult<::std::option::Option<<#field_ty as ::mapview::FieldType>::Output>> {
                    ::mapview::field::read_typed::<#field_ty>(&self.view, #attribute)
                }
            });
        }

        if kind.is_bool() {
            let is_name = format_ident!("is_{}", field_name);
            methods.extend(quote! {
                /// Read the flag; null reads as `false`.
                pub fn #is_name(&self) -> ::mapview::MapViewResult<bool> {
                    self.view.is(#attribute)
                }
            });
        }

        methods.extend(quote! {
            /// Write the attribute.
            pub fn #set_name(&mut self, value: <#field_ty as ::mapview::FieldType>::Output) -> ::mapview::MapViewResult<()> {
                self.view.set(#attribute, ::mapview::IntoValue::into_value(value))
            }
        });

        if kind.is_collection() {
            let elem_ty = extract_inner_type(field_ty);
            let add_name = format_ident!("add_to_{}", field_name);
            let remove_name = format_ident!("remove_from_{}", field_name);
            methods.extend(quote! {
                /// Append elements, creating the collection if absent.
                pub fn #add_name<I>(&mut self, items: I) -> ::mapview::MapViewResult<()>
                where
                    I: ::std::iter::IntoIterator<Item = <#elem_ty as ::mapview::FieldType>::Output>,
                {
                    self.view.add_to(#attribute, items.into_iter().map(::mapview::IntoValue::into_value))
                }

                /// Remove the first equal element for each item.
                pub fn #remove_name<I>(&mut self, items: I) -> ::mapview::MapViewResult<()>
                where
                    I: ::std::iter::IntoIterator<Item = <#elem_ty as ::mapview::FieldType>::Output>,
                {
                    self.view.remove_from(#attribute, items.into_iter().map(::mapview::IntoValue::into_value))
                }
            });
        }
    }

    methods
}

fn generate_builder_methods(fields: &[&FieldInput]) -> TokenStream {
    let mut methods = TokenStream::new();

    for field in fields {
        let field_name = field.ident();
        let field_ty = &field.ty;
        let attribute = field.attribute_name();

        methods.extend(quote! {
            pub fn #field_name(&self, value: <#field_ty as ::mapview::FieldType>::Output) -> ::mapview::MapViewResult<Self> {
                Ok(Self { inner: self.inner.set(#attribute, ::mapview::IntoValue::into_value(value))? })
            }
        });

        if FieldKind::from_type(field_ty).is_collection() {
            let elem_ty = extract_inner_type(field_ty);
            let add_name = format_ident!("add_to_{}", field_name);
            methods.extend(quote! {
                pub fn #add_name<I>(&self, items: I) -> ::mapview::MapViewResult<Self>
                where
                    I: ::std::iter::IntoIterator<Item = <#elem_ty as ::mapview::FieldType>::Output>,
                {
                    Ok(Self {
                        inner: self
                            .inner
                            .add_to(#attribute, items.into_iter().map(::mapview::IntoValue::into_value))?,
                    })
                }
            });
        }
    }

    methods
}

fn generate_definition(input: &ViewTypeInput, fields: &[&FieldInput]) -> TokenStream {
    let type_name = input.type_name();
    let extends = input.extends.iter().map(|parent| {
        quote! { .extends(<#parent as ::mapview::ViewType>::NAME) }
    });
    let attributes = fields.iter().map(|field| {
        let field_ty = &field.ty;
        let attribute = field.attribute_name();
        let key = field.key.as_ref().map(|key| quote! { .key(#key) });
        let embedded = field.embedded.then(|| quote! { .embedded() });
        quote! {
            .attribute(
                ::mapview::AttributeDef::new(#attribute, <#field_ty as ::mapview::FieldType>::type_ref())
                    #key
                    #embedded
            )
        }
    });

    quote! {
        ::mapview::InterfaceDef::new(#type_name)
            #(#extends)*
            #(#attributes)*
    }
}

fn generate_registrations(input: &ViewTypeInput, fields: &[&FieldInput]) -> TokenStream {
    let parents = input.extends.iter().map(|parent| {
        quote! { <#parent as ::mapview::FieldType>::register(registry); }
    });
    let field_types = fields.iter().map(|field| {
        let field_ty = &field.ty;
        quote! { <#field_ty as ::mapview::FieldType>::register(registry); }
    });

    quote! {
        #(#parents)*
        #(#field_types)*
    }
}

/// Bean conversions: the struct read from a view (or attribute-keyed map) and
/// written as an attribute-keyed map.
fn generate_bean_impls(struct_name: &syn::Ident, fields: &[&FieldInput]) -> TokenStream {
    let reads = fields.iter().map(|field| {
        let field_name = field.ident();
        let field_ty = &field.ty;
        if field.is_included() {
            let attribute = field.attribute_name();
            quote! { #field_name: ::mapview::bean::read_attribute::<#field_ty>(value, #attribute)? }
        } else {
            quote! { #field_name: ::std::default::Default::default() }
        }
    });
    let writes = fields.iter().filter(|f| f.is_included()).map(|field| {
        let field_name = field.ident();
        let attribute = field.attribute_name();
        quote! {
            map.insert(
                ::mapview::Value::from(#attribute),
                ::mapview::IntoValue::into_value(self.#field_name),
            );
        }
    });

    quote! {
        impl ::mapview::FromValue for #struct_name {
            fn from_value(value: &::mapview::Value) -> ::mapview::MapViewResult<Self> {
                Ok(Self {
                    #(#reads,)*
                })
            }
        }

        impl ::mapview::IntoValue for #struct_name {
            #[allow(unused_mut)]
            fn into_value(self) -> ::mapview::Value {
                let mut map = ::mapview::ValueMap::new();
                #(#writes)*
                ::mapview::Value::Map(map)
            }
        }
    }
}
