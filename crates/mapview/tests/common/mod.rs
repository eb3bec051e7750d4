//! Shared view types for integration tests.
#![allow(dead_code)]

use indexmap::{IndexMap, IndexSet};
use mapview::{
    FieldType, FromValue, IntoValue, MapViewError, MapViewResult, ScalarDef, TypeName, TypeRef,
    TypeRegistry, Value, ValueKind, ViewEnum, ViewType,
};

// ============================================================================
// Scalars
// ============================================================================

/// Milliseconds since the epoch, built from a stored integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Timestamp(pub i64);

impl FieldType for Timestamp {
    type Output = Timestamp;

    fn type_ref() -> TypeRef {
        TypeRef::scalar("Timestamp")
    }

    fn register(registry: &TypeRegistry) {
        registry.register_scalar(
            ScalarDef::new("Timestamp").constructor(ValueKind::Int, |v| Ok(v.clone())),
        );
    }
}

impl FromValue for Timestamp {
    fn from_value(value: &Value) -> MapViewResult<Self> {
        match value {
            Value::Scalar { inner, .. } => Self::from_value(inner),
            other => other
                .as_i64()
                .map(Timestamp)
                .ok_or_else(|| {
                    MapViewError::type_mismatch("value", "Timestamp", other.type_label())
                }),
        }
    }
}

impl IntoValue for Timestamp {
    fn into_value(self) -> Value {
        Value::Scalar {
            type_name: TypeName::new("Timestamp"),
            inner: Box::new(Value::Int(self.0)),
        }
    }
}

/// Text normalized to upper case by its `parse` function.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UpperCaseString(pub String);

impl FieldType for UpperCaseString {
    type Output = UpperCaseString;

    fn type_ref() -> TypeRef {
        TypeRef::scalar("UpperCaseString")
    }

    fn register(registry: &TypeRegistry) {
        registry.register_scalar(ScalarDef::new("UpperCaseString").parser(ValueKind::Str, |v| {
            v.as_str()
                .map(|s| Value::from(s.to_uppercase()))
                .ok_or_else(|| "expected string".to_string())
        }));
    }
}

impl FromValue for UpperCaseString {
    fn from_value(value: &Value) -> MapViewResult<Self> {
        match value {
            Value::Scalar { inner, .. } => Self::from_value(inner),
            Value::Str(s) => Ok(UpperCaseString(s.to_uppercase())),
            other => Err(MapViewError::type_mismatch(
                "value",
                "UpperCaseString",
                other.type_label(),
            )),
        }
    }
}

impl IntoValue for UpperCaseString {
    fn into_value(self) -> Value {
        Value::Scalar {
            type_name: TypeName::new("UpperCaseString"),
            inner: Box::new(Value::Str(self.0)),
        }
    }
}

// ============================================================================
// Enums
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ViewEnum)]
pub enum Country {
    #[mapview(
        property(name = "ordinal", value = 1),
        property(name = "label", value = "Hungary")
    )]
    HU,
    #[mapview(
        property(name = "ordinal", value = 3),
        property(name = "label", value = "Austria")
    )]
    AT,
}

// ============================================================================
// Interfaces
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash, ViewType)]
pub struct UserDetail {
    #[mapview(key = "__id")]
    pub id: String,
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, ViewType)]
pub struct Audit {
    pub audit_create_user: Option<String>,
    pub audit_create_time: Option<Timestamp>,
}

#[derive(Debug, Clone, PartialEq, ViewType)]
pub struct User {
    pub id: String,
    pub login_name: Option<String>,
    pub active: bool,
    pub email: Option<String>,
    pub country: Option<Country>,
    pub user_details: Vec<UserDetail>,
    pub tags: IndexSet<String>,
    pub map_with_value_type_and_key_type: IndexMap<UserDetail, UserDetail>,
    #[mapview(embedded)]
    pub audit: Audit,
}

/// A bean declaring a subset of `User`.
#[derive(Debug, Clone, PartialEq, ViewType)]
pub struct UserSummary {
    pub id: String,
    pub login_name: Option<String>,
    pub user_details: Vec<UserDetail>,
    #[mapview(skip)]
    pub cached_label: String,
}

/// A bean whose `userDetails` is declared without an element type.
#[derive(Debug, Clone, PartialEq, ViewType)]
pub struct RawUser {
    pub id: String,
    pub user_details: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, ViewType)]
pub struct Event {
    pub title: String,
    pub date: Timestamp,
    pub private: bool,
    pub room: Option<UpperCaseString>,
    pub notes: Vec<String>,
    pub country: Option<Country>,
}

pub fn ctx() -> mapview::ViewContext {
    let ctx = mapview::ViewContext::new();
    ctx.register::<User>().register::<Event>();
    ctx
}

/// A stored `UserDetail` map.
pub fn detail(id: &str) -> Value {
    Value::from(serde_json::json!({ "__id": id }))
}
