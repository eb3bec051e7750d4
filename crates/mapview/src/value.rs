//! Dynamic values stored in a view's backing map.
//!
//! `Value` is the runtime representation of everything a view can hold:
//! scalars, collections, typed maps, resolved enum constants, coerced custom
//! scalars and nested views. Its `Display` implementation is the canonical
//! string form used by `toString`, default equality and hashing.

use crate::types::TypeName;
use crate::view::View;
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

/// The string-keyed store behind every view.
pub type BackingMap = BTreeMap<String, Value>;

/// A map whose keys may be arbitrary values (typed `Map<K, V>` attributes).
pub type ValueMap = IndexMap<Value, Value>;

/// A resolved enum constant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumValue {
    /// The enum type the constant belongs to.
    pub enum_type: TypeName,
    /// The constant's declared name.
    pub constant: String,
}

impl EnumValue {
    /// Create a new enum value.
    pub fn new(enum_type: impl Into<TypeName>, constant: impl Into<String>) -> Self {
        Self {
            enum_type: enum_type.into(),
            constant: constant.into(),
        }
    }
}

/// Runtime kind of a [`Value`].
///
/// `Number` never describes a value directly; it is the normalized kind of
/// `Int` and `Float`, used by the coercion protocol's second and fourth step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    Bool,
    Int,
    Float,
    Number,
    Str,
    List,
    Set,
    Map,
    Optional,
    Enum,
    Scalar,
    View,
}

impl ValueKind {
    /// Human-readable kind name.
    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Null => "null",
            ValueKind::Bool => "bool",
            ValueKind::Int => "int",
            ValueKind::Float => "float",
            ValueKind::Number => "number",
            ValueKind::Str => "string",
            ValueKind::List => "list",
            ValueKind::Set => "set",
            ValueKind::Map => "map",
            ValueKind::Optional => "optional",
            ValueKind::Enum => "enum",
            ValueKind::Scalar => "scalar",
            ValueKind::View => "view",
        }
    }

    /// The normalized kind, if this kind has one.
    pub fn normalized(self) -> Option<ValueKind> {
        match self {
            ValueKind::Int | ValueKind::Float => Some(ValueKind::Number),
            _ => None,
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A dynamic value.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Set(IndexSet<Value>),
    Map(ValueMap),
    /// An explicit optional wrapper; `None` is "absent".
    Optional(Option<Box<Value>>),
    Enum(EnumValue),
    /// A value produced by the coercion protocol for a registered scalar type.
    Scalar {
        type_name: TypeName,
        inner: Box<Value>,
    },
    View(View),
}

impl Value {
    /// Runtime kind of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::Float(_) => ValueKind::Float,
            Value::Str(_) => ValueKind::Str,
            Value::List(_) => ValueKind::List,
            Value::Set(_) => ValueKind::Set,
            Value::Map(_) => ValueKind::Map,
            Value::Optional(_) => ValueKind::Optional,
            Value::Enum(_) => ValueKind::Enum,
            Value::Scalar { .. } => ValueKind::Scalar,
            Value::View(_) => ValueKind::View,
        }
    }

    /// Type label used in error messages; names the concrete type where known.
    pub fn type_label(&self) -> String {
        match self {
            Value::Enum(e) => e.enum_type.to_string(),
            Value::Scalar { type_name, .. } => type_name.to_string(),
            Value::View(view) => view.type_name().to_string(),
            other => other.kind().name().to_string(),
        }
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(x) => Some(*x),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&ValueMap> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_view(&self) -> Option<&View> {
        match self {
            Value::View(view) => Some(view),
            _ => None,
        }
    }

    /// Elements of a list or set, in iteration order.
    pub fn elements(&self) -> Option<Vec<&Value>> {
        match self {
            Value::List(items) => Some(items.iter().collect()),
            Value::Set(items) => Some(items.iter().collect()),
            _ => None,
        }
    }

    /// Look up a string key in a map value.
    pub fn get_key(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Map(map) => map.get(&Value::Str(key.to_string())),
            _ => None,
        }
    }

    /// Unwrap an explicit optional wrapper; absent becomes `Null`.
    pub fn unwrap_optional(self) -> Value {
        match self {
            Value::Optional(Some(inner)) => *inner,
            Value::Optional(None) => Value::Null,
            other => other,
        }
    }

    /// Build a map value from a string-keyed map.
    pub fn from_backing(map: BackingMap) -> Value {
        Value::Map(
            map.into_iter()
                .map(|(k, v)| (Value::Str(k), v))
                .collect(),
        )
    }

    /// Convert a map value with string keys into a backing map.
    ///
    /// Returns `None` if this is not a map or any key is not a string.
    pub fn into_backing(self) -> Option<BackingMap> {
        match self {
            Value::Map(map) => map
                .into_iter()
                .map(|(k, v)| match k {
                    Value::Str(k) => Some((k, v)),
                    _ => None,
                })
                .collect(),
            _ => None,
        }
    }

    /// Render as JSON. Views are exported, enums render by constant name.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Float(x) => serde_json::Number::from_f64(*x)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Str(s) => serde_json::Value::String(s.clone()),
            Value::List(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Set(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Map(map) => serde_json::Value::Object(
                map.iter()
                    .map(|(k, v)| (k.to_string(), v.to_json()))
                    .collect(),
            ),
            Value::Optional(inner) => inner
                .as_ref()
                .map(|v| v.to_json())
                .unwrap_or(serde_json::Value::Null),
            Value::Enum(e) => serde_json::Value::String(e.constant.clone()),
            Value::Scalar { inner, .. } => inner.to_json(),
            Value::View(view) => serde_json::Value::Object(
                view.backing()
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

fn unordered_hash<T: Hash>(items: impl Iterator<Item = T>) -> u64 {
    items
        .map(|item| {
            let mut hasher = DefaultHasher::new();
            item.hash(&mut hasher);
            hasher.finish()
        })
        .fold(0u64, u64::wrapping_add)
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Set(a), Value::Set(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Optional(a), Value::Optional(b)) => a == b,
            (Value::Enum(a), Value::Enum(b)) => a == b,
            (
                Value::Scalar {
                    type_name: ta,
                    inner: a,
                },
                Value::Scalar {
                    type_name: tb,
                    inner: b,
                },
            ) => ta == tb && a == b,
            (Value::View(a), Value::View(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Null => {}
            Value::Bool(b) => b.hash(state),
            Value::Int(i) => i.hash(state),
            Value::Float(x) => x.to_bits().hash(state),
            Value::Str(s) => s.hash(state),
            Value::List(items) => items.hash(state),
            Value::Set(items) => {
                state.write_usize(items.len());
                state.write_u64(unordered_hash(items.iter()));
            }
            Value::Map(map) => {
                state.write_usize(map.len());
                state.write_u64(unordered_hash(map.iter()));
            }
            Value::Optional(inner) => inner.hash(state),
            Value::Enum(e) => e.hash(state),
            Value::Scalar { type_name, inner } => {
                type_name.hash(state);
                inner.hash(state);
            }
            Value::View(view) => view.hash(state),
        }
    }
}

fn write_seq<'a>(
    f: &mut fmt::Formatter<'_>,
    items: impl Iterator<Item = &'a Value>,
) -> fmt::Result {
    f.write_str("[")?;
    for (i, item) in items.enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    f.write_str("]")
}

/// Write `{k=v, ...}` sorted by rendered key.
pub(crate) fn write_entries<'a, K: fmt::Display + 'a>(
    f: &mut fmt::Formatter<'_>,
    entries: impl Iterator<Item = (K, &'a Value)>,
) -> fmt::Result {
    let mut rendered: Vec<(String, &Value)> =
        entries.map(|(k, v)| (k.to_string(), v)).collect();
    rendered.sort_by(|a, b| a.0.cmp(&b.0));
    f.write_str("{")?;
    for (i, (k, v)) in rendered.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{k}={v}")?;
    }
    f.write_str("}")
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x:?}"),
            Value::Str(s) => f.write_str(s),
            Value::List(items) => write_seq(f, items.iter()),
            Value::Set(items) => {
                // sets have no meaningful order; sort for a stable rendering
                let mut sorted: Vec<&Value> = items.iter().collect();
                sorted.sort_by_cached_key(|v| v.to_string());
                write_seq(f, sorted.into_iter())
            }
            Value::Map(map) => write_entries(f, map.iter()),
            Value::Optional(Some(inner)) => write!(f, "Optional[{inner}]"),
            Value::Optional(None) => f.write_str("Optional.empty"),
            Value::Enum(e) => f.write_str(&e.constant),
            Value::Scalar { inner, .. } => write!(f, "{inner}"),
            Value::View(view) => write!(f, "{view}"),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::Str(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => Value::Map(
                map.into_iter()
                    .map(|(k, v)| (Value::Str(k), Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Value::from)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<ValueMap> for Value {
    fn from(map: ValueMap) -> Self {
        Value::Map(map)
    }
}

impl From<EnumValue> for Value {
    fn from(e: EnumValue) -> Self {
        Value::Enum(e)
    }
}

impl From<View> for Value {
    fn from(view: View) -> Self {
        Value::View(view)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map(Into::into).unwrap_or(Value::Null)
    }
}
