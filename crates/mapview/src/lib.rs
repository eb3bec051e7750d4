//! Typed views over string-keyed maps.
//!
//! A view gives a map the shape of a declared interface: attribute getters and
//! setters, nested views for relationships, typed collections and maps, enum
//! constants resolved through a configurable mapping, embedded attributes that
//! share the enclosing map, and key renames.
//!
//! # Example
//!
//! ```ignore
//! use mapview::{ViewContext, ViewType};
//!
//! #[derive(ViewType)]
//! struct User {
//!     #[mapview(key = "__id")]
//!     id: String,
//!     login_name: Option<String>,
//! }
//!
//! let ctx = ViewContext::new();
//! let user = ctx
//!     .builder::<User>()
//!     .with_json(serde_json::json!({"__id": "1", "loginName": "teszt"}))?
//!     .build_as::<User>()?;
//! assert_eq!(user.login_name()?, Some(Some("teszt".to_string())));
//! ```

extern crate self as mapview;

pub mod bean;
mod builder;
mod coerce;
mod config;
mod context;
mod descriptor;
mod dispatch;
mod error;
pub mod field;
pub mod lattice;
pub mod member;
mod registry;
mod types;
mod value;
mod view;

pub use builder::{SnapshotBuilder, ViewBuilder, DEFAULT_BUILDER_PREFIX};
pub use coerce::MAX_NESTING_DEPTH;
pub use config::{
    CacheSettings, Config, CACHE_TTL_ENV, DEFAULT_CACHE_TTL_SECS, DEFAULT_ENUM_MAPPING_METHOD,
};
pub use context::ViewContext;
pub use descriptor::{introspect, AttributeDescriptor, DescriptorCache, TypeDescriptors};
pub use dispatch::Method;
pub use error::{MapViewError, MapViewResult};
pub use field::{FieldType, FromValue, IntoValue, TypedView, ViewEnum, ViewType};
pub use registry::{TypeDef, TypeRegistry, MAP_HOLDER, MAP_TYPE};
pub use types::{
    AttributeDef, Converter, EnumConstant, EnumDef, InterfaceDef, ScalarDef, TypeName, TypeRef,
};
pub use value::{BackingMap, EnumValue, Value, ValueKind, ValueMap};
pub use view::View;

#[cfg(feature = "derive")]
pub use mapview_derive::{ViewEnum, ViewType};
