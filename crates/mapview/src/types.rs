//! Type definitions: declared attribute types, interfaces, enums and scalars.

use crate::value::{Value, ValueKind};
use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Name of a registered type.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeName(Arc<str>);

impl TypeName {
    pub fn new(name: &str) -> Self {
        TypeName(Arc::from(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for TypeName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for TypeName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TypeName {
    fn from(name: &str) -> Self {
        TypeName::new(name)
    }
}

impl From<String> for TypeName {
    fn from(name: String) -> Self {
        TypeName(Arc::from(name))
    }
}

impl From<&TypeName> for TypeName {
    fn from(name: &TypeName) -> Self {
        name.clone()
    }
}

/// The declared type of an attribute.
///
/// A `None` generic parameter means the container was declared raw, without
/// type parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    Any,
    Bool,
    Int,
    Float,
    Str,
    List(Option<Box<TypeRef>>),
    Set(Option<Box<TypeRef>>),
    Map(Option<Box<(TypeRef, TypeRef)>>),
    Optional(Option<Box<TypeRef>>),
    Interface(TypeName),
    Enum(TypeName),
    Scalar(TypeName),
}

fn generic(param: TypeRef) -> Option<Box<TypeRef>> {
    match param {
        TypeRef::Any => None,
        other => Some(Box::new(other)),
    }
}

impl TypeRef {
    pub fn list(element: TypeRef) -> Self {
        TypeRef::List(generic(element))
    }

    pub fn set(element: TypeRef) -> Self {
        TypeRef::Set(generic(element))
    }

    pub fn optional(inner: TypeRef) -> Self {
        TypeRef::Optional(generic(inner))
    }

    pub fn map(key: TypeRef, value: TypeRef) -> Self {
        match (key, value) {
            (TypeRef::Any, TypeRef::Any) => TypeRef::Map(None),
            (key, value) => TypeRef::Map(Some(Box::new((key, value)))),
        }
    }

    pub fn interface(name: impl Into<TypeName>) -> Self {
        TypeRef::Interface(name.into())
    }

    pub fn enumeration(name: impl Into<TypeName>) -> Self {
        TypeRef::Enum(name.into())
    }

    pub fn scalar(name: impl Into<TypeName>) -> Self {
        TypeRef::Scalar(name.into())
    }

    /// True for `List` and `Set`.
    pub fn is_collection(&self) -> bool {
        matches!(self, TypeRef::List(_) | TypeRef::Set(_))
    }

    pub fn is_map(&self) -> bool {
        matches!(self, TypeRef::Map(_))
    }

    pub fn is_optional(&self) -> bool {
        matches!(self, TypeRef::Optional(_))
    }

    /// True when a container type declares its type parameters.
    pub fn is_generic(&self) -> bool {
        match self {
            TypeRef::List(p) | TypeRef::Set(p) | TypeRef::Optional(p) => p.is_some(),
            TypeRef::Map(p) => p.is_some(),
            _ => false,
        }
    }

    /// Element type of a collection, or inner type of an optional.
    pub fn element_type(&self) -> Option<&TypeRef> {
        match self {
            TypeRef::List(p) | TypeRef::Set(p) | TypeRef::Optional(p) => p.as_deref(),
            _ => None,
        }
    }

    /// Key and value types of a typed map.
    pub fn key_value_types(&self) -> Option<(&TypeRef, &TypeRef)> {
        match self {
            TypeRef::Map(Some(kv)) => Some((&kv.0, &kv.1)),
            _ => None,
        }
    }

    pub fn as_interface(&self) -> Option<&TypeName> {
        match self {
            TypeRef::Interface(name) => Some(name),
            _ => None,
        }
    }

    /// Values of interface and enum types are converted element-wise inside
    /// containers; everything else passes through.
    pub fn converts_elements(&self) -> bool {
        matches!(self, TypeRef::Interface(_) | TypeRef::Enum(_))
    }

    /// Name of the scalar definition consulted by the coercion protocol.
    pub fn scalar_name(&self) -> Option<&str> {
        match self {
            TypeRef::Bool => Some(crate::registry::BOOLEAN),
            TypeRef::Int => Some(crate::registry::INTEGER),
            TypeRef::Float => Some(crate::registry::DOUBLE),
            TypeRef::Str => Some(crate::registry::STRING),
            TypeRef::Scalar(name) => Some(name.as_str()),
            _ => None,
        }
    }
}

fn write_param(
    f: &mut fmt::Formatter<'_>,
    name: &str,
    param: &Option<Box<TypeRef>>,
) -> fmt::Result {
    match param {
        Some(p) => write!(f, "{name}<{p}>"),
        None => f.write_str(name),
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Any => f.write_str("any"),
            TypeRef::Bool => f.write_str("bool"),
            TypeRef::Int => f.write_str("int"),
            TypeRef::Float => f.write_str("float"),
            TypeRef::Str => f.write_str("string"),
            TypeRef::List(p) => write_param(f, "List", p),
            TypeRef::Set(p) => write_param(f, "Set", p),
            TypeRef::Optional(p) => write_param(f, "Optional", p),
            TypeRef::Map(Some(kv)) => write!(f, "Map<{}, {}>", kv.0, kv.1),
            TypeRef::Map(None) => f.write_str("Map"),
            TypeRef::Interface(name) | TypeRef::Enum(name) | TypeRef::Scalar(name) => {
                f.write_str(name.as_str())
            }
        }
    }
}

/// One declared attribute of an interface.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeDef {
    /// camelCase attribute name.
    pub name: String,
    /// Key rename; the backing map key when set.
    pub key: Option<String>,
    pub declared: TypeRef,
    /// Contents live in the enclosing view's backing map.
    pub embedded: bool,
}

impl AttributeDef {
    pub fn new(name: impl Into<String>, declared: TypeRef) -> Self {
        Self {
            name: name.into(),
            key: None,
            declared,
            embedded: false,
        }
    }

    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn embedded(mut self) -> Self {
        self.embedded = true;
        self
    }
}

/// A view interface: its own attributes plus the interfaces it extends.
#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceDef {
    pub name: TypeName,
    pub extends: Vec<TypeName>,
    pub attributes: Vec<AttributeDef>,
}

impl InterfaceDef {
    pub fn new(name: impl Into<TypeName>) -> Self {
        Self {
            name: name.into(),
            extends: Vec::new(),
            attributes: Vec::new(),
        }
    }

    pub fn extends(mut self, name: impl Into<TypeName>) -> Self {
        self.extends.push(name.into());
        self
    }

    pub fn attribute(mut self, attribute: AttributeDef) -> Self {
        self.attributes.push(attribute);
        self
    }
}

/// An enum constant and the values its mapping methods return.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumConstant {
    pub name: String,
    pub properties: BTreeMap<String, Value>,
}

impl EnumConstant {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: BTreeMap::new(),
        }
    }

    pub fn property(mut self, method: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(method.into(), value.into());
        self
    }

    /// The value `method` maps this constant to. `"name"` always maps to the
    /// constant name.
    pub fn mapped_value(&self, method: &str) -> Option<Value> {
        if method == crate::config::DEFAULT_ENUM_MAPPING_METHOD {
            Some(Value::Str(self.name.clone()))
        } else {
            self.properties.get(method).cloned()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumDef {
    pub name: TypeName,
    pub constants: Vec<EnumConstant>,
}

impl EnumDef {
    pub fn new(name: impl Into<TypeName>) -> Self {
        Self {
            name: name.into(),
            constants: Vec::new(),
        }
    }

    pub fn constant(mut self, constant: EnumConstant) -> Self {
        self.constants.push(constant);
        self
    }

    pub fn find(&self, name: &str) -> Option<&EnumConstant> {
        self.constants.iter().find(|c| c.name == name)
    }
}

type ConvertFn = Arc<dyn Fn(&Value) -> Result<Value, String> + Send + Sync>;

/// A single-argument constructor or `parse` function of a scalar type.
#[derive(Clone)]
pub struct Converter {
    /// The argument kind this converter is declared for.
    pub accepts: ValueKind,
    convert: ConvertFn,
}

impl Converter {
    pub fn new<F>(accepts: ValueKind, convert: F) -> Self
    where
        F: Fn(&Value) -> Result<Value, String> + Send + Sync + 'static,
    {
        Self {
            accepts,
            convert: Arc::new(convert),
        }
    }

    pub fn apply(&self, value: &Value) -> Result<Value, String> {
        (self.convert)(value)
    }
}

impl fmt::Debug for Converter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Converter")
            .field("accepts", &self.accepts)
            .finish_non_exhaustive()
    }
}

/// A scalar type reachable through the coercion protocol.
///
/// Converters return the scalar's inner representation.
#[derive(Debug, Clone)]
pub struct ScalarDef {
    pub name: TypeName,
    pub constructors: Vec<Converter>,
    pub parsers: Vec<Converter>,
}

impl ScalarDef {
    pub fn new(name: impl Into<TypeName>) -> Self {
        Self {
            name: name.into(),
            constructors: Vec::new(),
            parsers: Vec::new(),
        }
    }

    pub fn constructor<F>(mut self, accepts: ValueKind, convert: F) -> Self
    where
        F: Fn(&Value) -> Result<Value, String> + Send + Sync + 'static,
    {
        self.constructors.push(Converter::new(accepts, convert));
        self
    }

    pub fn parser<F>(mut self, accepts: ValueKind, convert: F) -> Self
    where
        F: Fn(&Value) -> Result<Value, String> + Send + Sync + 'static,
    {
        self.parsers.push(Converter::new(accepts, convert));
        self
    }
}
