//! Typed layer: Rust types as view attribute types.
//!
//! [`FieldType`] ties a Rust type to its declared [`TypeRef`] and to the Rust
//! type its getter returns. `#[derive(ViewType)]` and `#[derive(ViewEnum)]`
//! implement these traits for user types; this module covers the primitives
//! and containers.

use crate::error::{MapViewError, MapViewResult};
use crate::registry::TypeRegistry;
use crate::types::{EnumDef, InterfaceDef, TypeRef};
use crate::value::{EnumValue, Value, ValueMap};
use crate::view::View;
use indexmap::{IndexMap, IndexSet};
use std::hash::Hash;

/// Conversion from a [`Value`].
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> MapViewResult<Self>;

    /// The value an absent or null attribute reads as, if this type has one.
    fn from_null() -> Option<Self> {
        None
    }
}

/// Conversion into a [`Value`].
pub trait IntoValue {
    fn into_value(self) -> Value;
}

/// A Rust type usable as a view attribute type.
pub trait FieldType {
    /// What the generated getter returns.
    type Output: FromValue + IntoValue;

    fn type_ref() -> TypeRef;

    /// Register this type and everything it references.
    fn register(_registry: &TypeRegistry) {}
}

/// A Rust struct declared as a view interface.
pub trait ViewType: FieldType {
    /// The generated typed view.
    type View: TypedView;

    const NAME: &'static str;

    fn definition() -> InterfaceDef;
}

/// A typed wrapper around a [`View`].
pub trait TypedView: Clone {
    fn from_view(view: View) -> Self;

    fn as_view(&self) -> &View;

    fn into_view(self) -> View;
}

/// A Rust enum usable as a view attribute type.
pub trait ViewEnum: FieldType + Sized {
    const NAME: &'static str;

    fn definition() -> EnumDef;

    fn constant_name(&self) -> &'static str;

    fn from_constant(name: &str) -> Option<Self>;
}

fn mismatch(expected: &str, value: &Value) -> MapViewError {
    MapViewError::type_mismatch("value", expected, value.type_label())
}

impl FromValue for bool {
    fn from_value(value: &Value) -> MapViewResult<Self> {
        value.as_bool().ok_or_else(|| mismatch("bool", value))
    }

    /// Null reads as `false`, like `is` accessors.
    fn from_null() -> Option<Self> {
        Some(false)
    }
}

impl IntoValue for bool {
    fn into_value(self) -> Value {
        Value::Bool(self)
    }
}

impl FieldType for bool {
    type Output = bool;

    fn type_ref() -> TypeRef {
        TypeRef::Bool
    }
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> MapViewResult<Self> {
        value.as_i64().ok_or_else(|| mismatch("int", value))
    }
}

impl IntoValue for i64 {
    fn into_value(self) -> Value {
        Value::Int(self)
    }
}

impl FieldType for i64 {
    type Output = i64;

    fn type_ref() -> TypeRef {
        TypeRef::Int
    }
}

impl FromValue for i32 {
    fn from_value(value: &Value) -> MapViewResult<Self> {
        value
            .as_i64()
            .and_then(|i| i32::try_from(i).ok())
            .ok_or_else(|| mismatch("int", value))
    }
}

impl IntoValue for i32 {
    fn into_value(self) -> Value {
        Value::Int(i64::from(self))
    }
}

impl FieldType for i32 {
    type Output = i32;

    fn type_ref() -> TypeRef {
        TypeRef::Int
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> MapViewResult<Self> {
        value.as_f64().ok_or_else(|| mismatch("float", value))
    }
}

impl IntoValue for f64 {
    fn into_value(self) -> Value {
        Value::Float(self)
    }
}

impl FieldType for f64 {
    type Output = f64;

    fn type_ref() -> TypeRef {
        TypeRef::Float
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> MapViewResult<Self> {
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| mismatch("string", value))
    }
}

impl IntoValue for String {
    fn into_value(self) -> Value {
        Value::Str(self)
    }
}

impl FieldType for String {
    type Output = String;

    fn type_ref() -> TypeRef {
        TypeRef::Str
    }
}

impl FromValue for Value {
    fn from_value(value: &Value) -> MapViewResult<Self> {
        Ok(value.clone())
    }

    fn from_null() -> Option<Self> {
        Some(Value::Null)
    }
}

impl IntoValue for Value {
    fn into_value(self) -> Value {
        self
    }
}

impl FieldType for Value {
    type Output = Value;

    fn type_ref() -> TypeRef {
        TypeRef::Any
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: &Value) -> MapViewResult<Self> {
        value
            .elements()
            .ok_or_else(|| mismatch("list", value))?
            .into_iter()
            .map(T::from_value)
            .collect()
    }

    fn from_null() -> Option<Self> {
        Some(Vec::new())
    }
}

impl<T: IntoValue> IntoValue for Vec<T> {
    fn into_value(self) -> Value {
        Value::List(self.into_iter().map(IntoValue::into_value).collect())
    }
}

impl<T: FieldType> FieldType for Vec<T> {
    type Output = Vec<T::Output>;

    fn type_ref() -> TypeRef {
        TypeRef::list(T::type_ref())
    }

    fn register(registry: &TypeRegistry) {
        T::register(registry);
    }
}

impl<T: FromValue + Hash + Eq> FromValue for IndexSet<T> {
    fn from_value(value: &Value) -> MapViewResult<Self> {
        value
            .elements()
            .ok_or_else(|| mismatch("set", value))?
            .into_iter()
            .map(T::from_value)
            .collect()
    }

    fn from_null() -> Option<Self> {
        Some(IndexSet::new())
    }
}

impl<T: IntoValue> IntoValue for IndexSet<T> {
    fn into_value(self) -> Value {
        Value::Set(self.into_iter().map(IntoValue::into_value).collect())
    }
}

impl<T: FieldType> FieldType for IndexSet<T>
where
    T::Output: Hash + Eq,
{
    type Output = IndexSet<T::Output>;

    fn type_ref() -> TypeRef {
        TypeRef::set(T::type_ref())
    }

    fn register(registry: &TypeRegistry) {
        T::register(registry);
    }
}

impl<K: FromValue + Hash + Eq, V: FromValue> FromValue for IndexMap<K, V> {
    fn from_value(value: &Value) -> MapViewResult<Self> {
        value
            .as_map()
            .ok_or_else(|| mismatch("map", value))?
            .iter()
            .map(|(k, v)| Ok((K::from_value(k)?, V::from_value(v)?)))
            .collect()
    }

    fn from_null() -> Option<Self> {
        Some(IndexMap::new())
    }
}

impl<K: IntoValue, V: IntoValue> IntoValue for IndexMap<K, V> {
    fn into_value(self) -> Value {
        Value::Map(
            self.into_iter()
                .map(|(k, v)| (k.into_value(), v.into_value()))
                .collect::<ValueMap>(),
        )
    }
}

impl<K: FieldType, V: FieldType> FieldType for IndexMap<K, V>
where
    K::Output: Hash + Eq,
{
    type Output = IndexMap<K::Output, V::Output>;

    fn type_ref() -> TypeRef {
        TypeRef::map(K::type_ref(), V::type_ref())
    }

    fn register(registry: &TypeRegistry) {
        K::register(registry);
        V::register(registry);
    }
}

/// `Optional(Some)` reads as `Some`, an absent optional or null as `None`.
impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> MapViewResult<Self> {
        match value {
            Value::Null | Value::Optional(None) => Ok(None),
            Value::Optional(Some(inner)) => T::from_value(inner).map(Some),
            other => T::from_value(other).map(Some),
        }
    }

    fn from_null() -> Option<Self> {
        Some(None)
    }
}

impl<T: IntoValue> IntoValue for Option<T> {
    fn into_value(self) -> Value {
        Value::Optional(self.map(|v| Box::new(v.into_value())))
    }
}

impl<T: FieldType> FieldType for Option<T> {
    type Output = Option<T::Output>;

    fn type_ref() -> TypeRef {
        TypeRef::optional(T::type_ref())
    }

    fn register(registry: &TypeRegistry) {
        T::register(registry);
    }
}

/// Read `attribute` of `view` as `T`'s getter type.
///
/// `Ok(None)` when the stored value is null and `T` has no null reading.
pub fn read_typed<T: FieldType>(view: &View, attribute: &str) -> MapViewResult<Option<T::Output>> {
    match view.get(attribute)? {
        Value::Null => Ok(None),
        value => T::Output::from_value(&value).map(Some),
    }
}

/// Read an embedded attribute of `view` as a typed view.
pub fn read_embedded_view<T: ViewType>(view: &View, attribute: &str) -> MapViewResult<T::View> {
    match view.get(attribute)? {
        Value::View(inner) => Ok(T::View::from_view(inner)),
        other => Err(MapViewError::type_mismatch(
            format!("{}.{attribute}", view.type_name()),
            T::NAME,
            other.type_label(),
        )),
    }
}

/// Unwrap a nested view of `type_name` from `value`.
pub fn view_from_value<T: TypedView>(value: &Value, type_name: &str) -> MapViewResult<T> {
    match value {
        Value::View(view) if view.conforms_to(type_name) => Ok(T::from_view(view.clone())),
        other => Err(MapViewError::type_mismatch(
            "value",
            type_name,
            other.type_label(),
        )),
    }
}

/// Resolve an enum constant stored as a constant or as its name.
pub fn enum_from_value<E: ViewEnum>(value: &Value) -> MapViewResult<E> {
    let name = match value {
        Value::Enum(e) if e.enum_type.as_str() == E::NAME => e.constant.as_str(),
        Value::Str(s) => s.as_str(),
        other => {
            return Err(MapViewError::type_mismatch(
                "value",
                E::NAME,
                other.type_label(),
            ))
        }
    };
    E::from_constant(name)
        .ok_or_else(|| MapViewError::enum_resolution(E::NAME, name, "name"))
}

pub fn enum_into_value<E: ViewEnum>(value: &E) -> Value {
    Value::Enum(EnumValue::new(E::NAME, value.constant_name()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_reads_optional_wrapper() {
        let present = Value::Optional(Some(Box::new(Value::from("x"))));
        assert_eq!(
            Option::<String>::from_value(&present).unwrap(),
            Some("x".to_string())
        );
        assert_eq!(Option::<String>::from_value(&Value::Optional(None)).unwrap(), None);
        assert_eq!(Option::<String>::from_null(), Some(None));
    }

    #[test]
    fn test_collections_accept_lists_and_sets() {
        let list = Value::List(vec![Value::from(1), Value::from(2)]);
        assert_eq!(Vec::<i64>::from_value(&list).unwrap(), vec![1, 2]);
        let set = IndexSet::<i64>::from_value(&list).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(Vec::<i64>::from_null(), Some(Vec::new()));
        assert!(Vec::<i64>::from_value(&Value::from("x")).is_err());
    }

    #[test]
    fn test_type_refs() {
        assert_eq!(<Vec<String>>::type_ref(), TypeRef::list(TypeRef::Str));
        assert_eq!(
            <IndexMap<String, Option<i64>>>::type_ref(),
            TypeRef::map(TypeRef::Str, TypeRef::optional(TypeRef::Int))
        );
        assert_eq!(<Vec<Value>>::type_ref(), TypeRef::List(None));
    }

    #[test]
    fn test_numeric_conversions() {
        assert_eq!(f64::from_value(&Value::Int(2)).unwrap(), 2.0);
        assert!(i32::from_value(&Value::Int(i64::MAX)).is_err());
        assert_eq!(i32::from_value(&Value::Int(7)).unwrap(), 7);
    }
}
