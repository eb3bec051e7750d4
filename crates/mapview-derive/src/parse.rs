//! Parsing logic for the view derive macros.

use darling::{ast, util::PathList, FromDeriveInput, FromField, FromMeta, FromVariant};
use syn::{Ident, Lit, Type, Visibility};

/// Parsed struct-level options.
#[derive(Debug, FromDeriveInput)]
#[darling(attributes(mapview), supports(struct_named))]
pub struct ViewTypeInput {
    pub ident: Ident,

    pub vis: Visibility,

    pub data: ast::Data<(), FieldInput>,

    /// Registered type name; defaults to the struct name.
    #[darling(default)]
    pub name: Option<String>,

    /// Interfaces this one extends.
    #[darling(default)]
    pub extends: PathList,
}

impl ViewTypeInput {
    pub fn fields(&self) -> Vec<&FieldInput> {
        self.data
            .as_ref()
            .take_struct()
            .map(|s| s.fields.to_vec())
            .unwrap_or_default()
    }

    pub fn type_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| self.ident.to_string())
    }
}

/// Parsed field-level options.
#[derive(Debug, FromField)]
#[darling(attributes(mapview))]
pub struct FieldInput {
    pub ident: Option<Ident>,

    pub ty: Type,

    /// Backing map key, when it differs from the attribute name.
    #[darling(default)]
    pub key: Option<String>,

    /// Contents live in the enclosing view's map.
    #[darling(default)]
    pub embedded: bool,

    /// Not an attribute.
    #[darling(default)]
    pub skip: bool,
}

impl FieldInput {
    pub fn ident(&self) -> &Ident {
        self.ident.as_ref().expect("named field required")
    }

    /// camelCase attribute name (`login_name` -> `loginName`).
    pub fn attribute_name(&self) -> String {
        let raw = self.ident().to_string();
        let raw = raw.strip_prefix("r#").unwrap_or(&raw);
        let mut out = String::with_capacity(raw.len());
        let mut upper = false;
        for c in raw.chars() {
            if c == '_' {
                upper = !out.is_empty();
            } else if upper {
                out.extend(c.to_uppercase());
                upper = false;
            } else {
                out.push(c);
            }
        }
        out
    }

    pub fn is_included(&self) -> bool {
        !self.skip
    }
}

/// Parsed enum-level options.
#[derive(Debug, FromDeriveInput)]
#[darling(attributes(mapview), supports(enum_unit))]
pub struct ViewEnumInput {
    pub ident: Ident,

    pub data: ast::Data<VariantInput, ()>,

    #[darling(default)]
    pub name: Option<String>,
}

impl ViewEnumInput {
    pub fn variants(&self) -> Vec<&VariantInput> {
        self.data
            .as_ref()
            .take_enum()
            .unwrap_or_default()
    }

    pub fn type_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| self.ident.to_string())
    }
}

#[derive(Debug, FromVariant)]
#[darling(attributes(mapview))]
pub struct VariantInput {
    pub ident: Ident,

    #[darling(multiple)]
    pub property: Vec<PropertyInput>,
}

/// `property(name = "ordinal", value = 1)`
#[derive(Debug, FromMeta)]
pub struct PropertyInput {
    pub name: String,
    pub value: Lit,
}
