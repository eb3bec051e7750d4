//! Registry of type definitions.
//!
//! Stands in for runtime introspection: every interface, enum and scalar a
//! view may touch is registered here once, usually through the derive macros.

use crate::error::{MapViewError, MapViewResult};
use crate::types::{EnumDef, InterfaceDef, ScalarDef, TypeName};
use crate::value::{Value, ValueKind};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use tracing::warn;

/// Marker interface implemented by every view.
pub const MAP_HOLDER: &str = "MapHolder";

/// Pseudo type name accepted by `adapt_to` to request the exported map.
pub const MAP_TYPE: &str = "Map";

pub const BOOLEAN: &str = "Boolean";
pub const INTEGER: &str = "Integer";
pub const DOUBLE: &str = "Double";
pub const STRING: &str = "String";

/// A registered type definition.
#[derive(Debug, Clone)]
pub enum TypeDef {
    Interface(Arc<InterfaceDef>),
    Enum(Arc<EnumDef>),
    Scalar(Arc<ScalarDef>),
}

impl TypeDef {
    fn kind(&self) -> &'static str {
        match self {
            TypeDef::Interface(_) => "interface",
            TypeDef::Enum(_) => "enum",
            TypeDef::Scalar(_) => "scalar",
        }
    }

    /// Whether two definitions describe the same type. Scalars compare by the
    /// argument kinds of their converters.
    pub fn same_definition(&self, other: &TypeDef) -> bool {
        match (self, other) {
            (TypeDef::Interface(a), TypeDef::Interface(b)) => a == b,
            (TypeDef::Enum(a), TypeDef::Enum(b)) => a == b,
            (TypeDef::Scalar(a), TypeDef::Scalar(b)) => {
                let kinds = |cs: &[crate::types::Converter]| {
                    cs.iter().map(|c| c.accepts).collect::<Vec<_>>()
                };
                kinds(&a.constructors) == kinds(&b.constructors)
                    && kinds(&a.parsers) == kinds(&b.parsers)
            }
            _ => false,
        }
    }
}

/// Concurrent table of type definitions.
///
/// Registration is idempotent: the first definition of a name wins.
#[derive(Debug)]
pub struct TypeRegistry {
    types: RwLock<HashMap<TypeName, TypeDef>>,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistry {
    /// Create a registry holding the built-in scalars and the map holder marker.
    pub fn new() -> Self {
        let registry = Self {
            types: RwLock::new(HashMap::new()),
        };
        registry.register_interface(InterfaceDef::new(MAP_HOLDER));
        for scalar in builtin_scalars() {
            registry.register_scalar(scalar);
        }
        registry
    }

    fn insert(&self, name: TypeName, def: TypeDef) -> bool {
        let mut types = self.types.write();
        if let Some(existing) = types.get(&name) {
            if !existing.same_definition(&def) {
                warn!(
                    type_name = %name,
                    kind = def.kind(),
                    "type already registered with a different definition; keeping the first"
                );
            }
            return false;
        }
        types.insert(name, def);
        true
    }

    /// Register an interface. Returns `false` if the name was already taken.
    pub fn register_interface(&self, def: InterfaceDef) -> bool {
        self.insert(def.name.clone(), TypeDef::Interface(Arc::new(def)))
    }

    /// Register an enum. Returns `false` if the name was already taken.
    pub fn register_enum(&self, def: EnumDef) -> bool {
        self.insert(def.name.clone(), TypeDef::Enum(Arc::new(def)))
    }

    /// Register a scalar. Returns `false` if the name was already taken.
    pub fn register_scalar(&self, def: ScalarDef) -> bool {
        self.insert(def.name.clone(), TypeDef::Scalar(Arc::new(def)))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.read().contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<TypeDef> {
        self.types.read().get(name).cloned()
    }

    pub fn interface(&self, name: &str) -> MapViewResult<Arc<InterfaceDef>> {
        match self.get(name) {
            Some(TypeDef::Interface(def)) => Ok(def),
            _ => Err(MapViewError::unknown_type(name)),
        }
    }

    pub fn enumeration(&self, name: &str) -> MapViewResult<Arc<EnumDef>> {
        match self.get(name) {
            Some(TypeDef::Enum(def)) => Ok(def),
            _ => Err(MapViewError::unknown_type(name)),
        }
    }

    pub fn scalar(&self, name: &str) -> MapViewResult<Arc<ScalarDef>> {
        match self.get(name) {
            Some(TypeDef::Scalar(def)) => Ok(def),
            _ => Err(MapViewError::unknown_type(name)),
        }
    }

    pub fn is_interface(&self, name: &str) -> bool {
        matches!(self.get(name), Some(TypeDef::Interface(_)))
    }

    /// Reflexive, transitive subtype check over `extends`.
    pub fn is_subtype(&self, sub: &str, sup: &str) -> bool {
        if sub == sup {
            return true;
        }
        let types = self.types.read();
        let mut visited: HashSet<&str> = HashSet::new();
        let mut pending = vec![sub];
        while let Some(current) = pending.pop() {
            if !visited.insert(current) {
                continue;
            }
            if let Some(TypeDef::Interface(def)) = types.get(current) {
                for parent in &def.extends {
                    if parent.as_str() == sup {
                        return true;
                    }
                    pending.push(parent.as_str());
                }
            }
        }
        false
    }

    /// All transitive supertypes of `name`, breadth-first, nearest first.
    pub fn supertypes(&self, name: &str) -> Vec<TypeName> {
        let types = self.types.read();
        let mut seen: HashSet<TypeName> = HashSet::new();
        let mut result = Vec::new();
        let mut queue: VecDeque<TypeName> = VecDeque::new();
        queue.push_back(TypeName::new(name));
        seen.insert(TypeName::new(name));
        while let Some(current) = queue.pop_front() {
            if let Some(TypeDef::Interface(def)) = types.get(current.as_str()) {
                for parent in &def.extends {
                    if seen.insert(parent.clone()) {
                        result.push(parent.clone());
                        queue.push_back(parent.clone());
                    }
                }
            }
        }
        result
    }

    /// The interfaces a view of `name` implements: the type itself, its
    /// supertypes and the map holder marker.
    pub fn interfaces_of(&self, name: &str) -> Vec<TypeName> {
        let mut interfaces = vec![TypeName::new(name)];
        interfaces.extend(self.supertypes(name));
        if !interfaces.iter().any(|i| i.as_str() == MAP_HOLDER) {
            interfaces.push(TypeName::new(MAP_HOLDER));
        }
        interfaces
    }
}

fn parse_bool(value: &Value) -> Result<Value, String> {
    let s = value.as_str().ok_or("expected string")?;
    Ok(Value::Bool(s.eq_ignore_ascii_case("true")))
}

fn parse_int(value: &Value) -> Result<Value, String> {
    let s = value.as_str().ok_or("expected string")?;
    s.trim()
        .parse::<i64>()
        .map(Value::Int)
        .map_err(|e| e.to_string())
}

fn parse_float(value: &Value) -> Result<Value, String> {
    let s = value.as_str().ok_or("expected string")?;
    s.trim()
        .parse::<f64>()
        .map(Value::Float)
        .map_err(|e| e.to_string())
}

fn builtin_scalars() -> Vec<ScalarDef> {
    vec![
        ScalarDef::new(BOOLEAN)
            .constructor(ValueKind::Str, parse_bool)
            .parser(ValueKind::Str, parse_bool),
        ScalarDef::new(INTEGER)
            .constructor(ValueKind::Str, parse_int)
            .parser(ValueKind::Str, parse_int),
        ScalarDef::new(DOUBLE)
            .constructor(ValueKind::Str, parse_float)
            .constructor(ValueKind::Number, |value| {
                value.as_f64().map(Value::Float).ok_or_else(|| "expected number".to_string())
            })
            .parser(ValueKind::Str, parse_float),
        ScalarDef::new(STRING).constructor(ValueKind::Str, |value| Ok(value.clone())),
    ]
}
