//! Field type analysis for code generation.

use syn::{GenericArgument, PathArguments, Type, TypePath};

/// The shape of a field type, determining which accessors are generated.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// `bool`; gets an `is_x` accessor.
    Bool,

    /// A scalar such as `String`, `i64` or `Value`.
    Primitive,

    /// An `Option<T>` type
    Option(Box<FieldKind>),

    /// A `Vec<T>` type
    Vec(Box<FieldKind>),

    /// An `IndexSet<T>` type
    Set(Box<FieldKind>),

    /// An `IndexMap<K, V>` type
    Map {
        key: Box<FieldKind>,
        value: Box<FieldKind>,
    },

    /// A std collection views cannot hold; carries the supported replacement.
    Unsupported(&'static str),

    /// Any other named type: a view struct or an enum.
    Nested,
}

impl FieldKind {
    pub fn from_type(ty: &Type) -> Self {
        match ty {
            Type::Path(type_path) => Self::from_type_path(type_path),
            _ => FieldKind::Primitive,
        }
    }

    fn from_type_path(type_path: &TypePath) -> Self {
        let Some(segment) = type_path.path.segments.last() else {
            return FieldKind::Primitive;
        };
        let single = || extract_single_generic_arg(&segment.arguments).map(Self::from_type);

        match segment.ident.to_string().as_str() {
            "Option" => single()
                .map(|inner| FieldKind::Option(Box::new(inner)))
                .unwrap_or(FieldKind::Primitive),
            "Vec" => single()
                .map(|inner| FieldKind::Vec(Box::new(inner)))
                .unwrap_or(FieldKind::Primitive),
            "IndexSet" => single()
                .map(|inner| FieldKind::Set(Box::new(inner)))
                .unwrap_or(FieldKind::Primitive),
            "HashSet" | "BTreeSet" => FieldKind::Unsupported("indexmap::IndexSet"),
            "HashMap" | "BTreeMap" => FieldKind::Unsupported("indexmap::IndexMap"),
            "IndexMap" => {
                match extract_two_generic_args(&segment.arguments) {
                    Some((key, value)) => FieldKind::Map {
                        key: Box::new(Self::from_type(key)),
                        value: Box::new(Self::from_type(value)),
                    },
                    None => FieldKind::Primitive,
                }
            }
            "bool" => FieldKind::Bool,
            "String" | "i32" | "i64" | "f64" | "Value" => FieldKind::Primitive,
            _ => FieldKind::Nested,
        }
    }

    /// List or set.
    pub fn is_collection(&self) -> bool {
        matches!(self, FieldKind::Vec(_) | FieldKind::Set(_))
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, FieldKind::Bool)
    }

    pub fn is_nested(&self) -> bool {
        matches!(self, FieldKind::Nested)
    }

    /// The supported replacement for the first unsupported type inside this one.
    pub fn unsupported(&self) -> Option<&'static str> {
        match self {
            FieldKind::Unsupported(replacement) => Some(replacement),
            FieldKind::Option(inner) | FieldKind::Vec(inner) | FieldKind::Set(inner) => {
                inner.unsupported()
            }
            FieldKind::Map { key, value } => key.unsupported().or_else(|| value.unsupported()),
            _ => None,
        }
    }
}

/// Extract a single generic type argument from path arguments.
pub fn extract_single_generic_arg(args: &PathArguments) -> Option<&Type> {
    match args {
        PathArguments::AngleBracketed(ab) if ab.args.len() == 1 => match ab.args.first()? {
            GenericArgument::Type(ty) => Some(ty),
            _ => None,
        },
        _ => None,
    }
}

/// Extract two generic type arguments from path arguments (for map types).
fn extract_two_generic_args(args: &PathArguments) -> Option<(&Type, &Type)> {
    match args {
        PathArguments::AngleBracketed(ab) if ab.args.len() == 2 => {
            let mut iter = ab.args.iter();
            match (iter.next(), iter.next()) {
                (Some(GenericArgument::Type(key)), Some(GenericArgument::Type(value))) => {
                    Some((key, value))
                }
                _ => None,
            }
        }
        _ => None,
    }
}
