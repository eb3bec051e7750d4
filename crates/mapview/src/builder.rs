//! Builders: one-shot view construction and copy-on-write snapshots.

use crate::bean::proxy_map_from_value;
use crate::config::Config;
use crate::context::ViewContext;
use crate::error::{MapViewError, MapViewResult};
use crate::field::{IntoValue, TypedView, ViewType};
use crate::member::{self, ADD_TO};
use crate::types::TypeName;
use crate::value::{BackingMap, Value, ValueMap};
use crate::view::View;
use std::sync::Arc;

/// Builder prefix recognized by [`SnapshotBuilder::invoke`] unless changed.
pub const DEFAULT_BUILDER_PREFIX: &str = "with";

#[derive(Debug, Clone)]
enum Source {
    Empty,
    Map(Arc<BackingMap>),
    Bean { type_name: TypeName, value: Value },
}

/// Builds one view of a type from a map, JSON object or bean.
#[derive(Debug, Clone)]
pub struct ViewBuilder {
    ctx: ViewContext,
    type_name: TypeName,
    config: Config,
    source: Source,
}

impl ViewBuilder {
    pub fn new(ctx: ViewContext, type_name: impl Into<TypeName>) -> Self {
        Self {
            ctx,
            type_name: type_name.into(),
            config: Config::default(),
            source: Source::Empty,
        }
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn immutable(mut self, immutable: bool) -> Self {
        self.config.immutable = immutable;
        self
    }

    pub fn null_safe_collection(mut self, enabled: bool) -> Self {
        self.config.null_safe_collection = enabled;
        self
    }

    pub fn identifier_field(mut self, field: impl Into<String>) -> Self {
        self.config.identifier_field = Some(field.into());
        self
    }

    pub fn enum_mapping_method(mut self, method: impl Into<String>) -> Self {
        self.config.enum_mapping_method = method.into();
        self
    }

    pub fn map_null_to_optional_absent(mut self, enabled: bool) -> Self {
        self.config.map_null_to_optional_absent = enabled;
        self
    }

    pub fn with_map(self, map: BackingMap) -> Self {
        self.with_shared_map(Arc::new(map))
    }

    /// Use `map` as the original map; the view keeps this exact allocation.
    pub fn with_shared_map(mut self, map: Arc<BackingMap>) -> Self {
        self.source = Source::Map(map);
        self
    }

    pub fn with_value_map(self, map: ValueMap) -> MapViewResult<Self> {
        let backing = Value::Map(map).into_backing().ok_or_else(|| {
            MapViewError::type_mismatch(self.type_name.as_str(), "string-keyed map", "map")
        })?;
        Ok(self.with_map(backing))
    }

    /// Use a JSON object as the original map.
    pub fn with_json(self, json: serde_json::Value) -> MapViewResult<Self> {
        match Value::from(json) {
            Value::Map(map) => self.with_value_map(map),
            other => Err(MapViewError::type_mismatch(
                self.type_name.as_str(),
                "object",
                other.type_label(),
            )),
        }
    }

    /// Use a bean's fields, re-keyed to the view's map keys.
    pub fn with_bean<B: ViewType + IntoValue>(mut self, bean: B) -> Self {
        self.ctx.register::<B>();
        self.source = Source::Bean {
            type_name: TypeName::new(B::NAME),
            value: bean.into_value(),
        };
        self
    }

    pub fn build(self) -> MapViewResult<View> {
        let original = match self.source {
            Source::Empty => Arc::new(BackingMap::new()),
            Source::Map(map) => map,
            Source::Bean { type_name, value } => Arc::new(proxy_map_from_value(
                &self.ctx,
                self.type_name.as_str(),
                type_name.as_str(),
                value,
            )?),
        };
        View::construct(self.ctx, self.type_name, self.config, original, 0)
    }

    /// Build and wrap in `T`'s typed view.
    pub fn build_as<T: ViewType>(self) -> MapViewResult<T::View> {
        self.ctx.register::<T>();
        let view = self.build()?;
        if !view.conforms_to(T::NAME) {
            return Err(MapViewError::type_mismatch(
                T::NAME,
                T::NAME,
                view.type_name().as_str(),
            ));
        }
        Ok(T::View::from_view(view))
    }
}

/// Copy-on-write snapshot builder.
///
/// Every `set` and `add_to` returns a new builder and leaves the receiver
/// unchanged. The working view is always mutable; `build` produces a fresh
/// view carrying the builder's configuration.
#[derive(Debug, Clone)]
pub struct SnapshotBuilder {
    target: View,
    config: Config,
    prefix: Option<String>,
}

impl SnapshotBuilder {
    pub fn new(ctx: &ViewContext, type_name: &str, config: Config) -> MapViewResult<Self> {
        let target = View::construct(
            ctx.clone(),
            TypeName::new(type_name),
            config.clone().with_immutable(false),
            Arc::new(BackingMap::new()),
            0,
        )?;
        Ok(Self {
            target,
            config,
            prefix: Some(DEFAULT_BUILDER_PREFIX.to_string()),
        })
    }

    /// Start from an existing view, recovering its most specific interface.
    pub fn from_existing(view: &View) -> MapViewResult<Self> {
        let type_name = view.real_interface()?;
        let config = view.config().clone();
        let target = View::construct(
            view.context().clone(),
            type_name,
            config.clone().with_immutable(false),
            Arc::new(view.to_map()?),
            0,
        )?;
        Ok(Self {
            target,
            config,
            prefix: Some(DEFAULT_BUILDER_PREFIX.to_string()),
        })
    }

    /// Set the method prefix `invoke` strips; `None` accepts bare names only.
    pub fn with_prefix(mut self, prefix: Option<&str>) -> Self {
        self.prefix = prefix.map(str::to_string);
        self
    }

    /// Replace the configuration of built views.
    pub fn with_config(&self, config: Config) -> MapViewResult<Self> {
        let target = View::construct(
            self.target.context().clone(),
            self.target.type_name().clone(),
            config.clone().with_immutable(false),
            Arc::new(self.target.to_map()?),
            0,
        )?;
        Ok(Self {
            target,
            config,
            prefix: self.prefix.clone(),
        })
    }

    pub fn type_name(&self) -> &TypeName {
        self.target.type_name()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The working view.
    pub fn current(&self) -> &View {
        &self.target
    }

    pub fn set(&self, attribute: &str, value: impl Into<Value>) -> MapViewResult<Self> {
        let mut next = self.clone();
        next.target.set(attribute, value)?;
        Ok(next)
    }

    pub fn add_to<I>(&self, attribute: &str, items: I) -> MapViewResult<Self>
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        let mut next = self.clone();
        next.target.add_to(attribute, items)?;
        Ok(next)
    }

    /// Apply a builder method by name: `<prefix>X` and bare `x` set, `addToX`
    /// appends.
    pub fn invoke(&self, method: &str, args: Vec<Value>) -> MapViewResult<Self> {
        if let Some(attribute) = self
            .prefix
            .as_deref()
            .and_then(|prefix| member::attribute_name(method, prefix))
        {
            return self.set(&attribute, args.into_iter().next().unwrap_or_default());
        }
        if let Some(attribute) = member::attribute_name(method, ADD_TO) {
            return self.add_to(&attribute, args);
        }
        self.set(method, args.into_iter().next().unwrap_or_default())
    }

    pub fn build(&self) -> MapViewResult<View> {
        View::construct(
            self.target.context().clone(),
            self.target.type_name().clone(),
            self.config.clone(),
            Arc::new(self.target.to_map()?),
            0,
        )
    }

    pub fn build_as<T: ViewType>(&self) -> MapViewResult<T::View> {
        let view = self.build()?;
        if !view.conforms_to(T::NAME) {
            return Err(MapViewError::type_mismatch(
                T::NAME,
                T::NAME,
                view.type_name().as_str(),
            ));
        }
        Ok(T::View::from_view(view))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AttributeDef, InterfaceDef, TypeRef};
    use serde_json::json;

    fn ctx() -> ViewContext {
        let ctx = ViewContext::new();
        ctx.registry().register_interface(
            InterfaceDef::new("Note")
                .attribute(AttributeDef::new("text", TypeRef::Str))
                .attribute(AttributeDef::new("tags", TypeRef::list(TypeRef::Str))),
        );
        ctx
    }

    #[test]
    fn test_with_json_requires_object() {
        let ctx = ctx();
        let err = ctx.builder_for("Note").with_json(json!([1])).unwrap_err();
        assert!(matches!(err, MapViewError::TypeMismatch { .. }));
    }

    #[test]
    fn test_shared_map_identity_is_kept() {
        let ctx = ctx();
        let mut map = BackingMap::new();
        map.insert("text".into(), Value::from("hi"));
        let shared = Arc::new(map);
        let view = ctx
            .builder_for("Note")
            .with_shared_map(shared.clone())
            .build()
            .unwrap();
        assert!(Arc::ptr_eq(view.original_map(), &shared));
    }

    #[test]
    fn test_unknown_type_fails_to_build() {
        let ctx = ctx();
        assert_eq!(
            ctx.builder_for("Missing").build().unwrap_err(),
            MapViewError::unknown_type("Missing")
        );
    }

    #[test]
    fn test_snapshot_steps_do_not_touch_receiver() {
        let ctx = ctx();
        let empty =
            SnapshotBuilder::new(&ctx, "Note", Config::default().with_immutable(true)).unwrap();
        let with_text = empty.set("text", "a").unwrap();
        let tagged = with_text.add_to("tags", ["x"]).unwrap();

        assert_eq!(empty.current().get("text").unwrap(), Value::Null);
        assert_eq!(with_text.current().get("tags").unwrap(), Value::Null);

        let built = tagged.build().unwrap();
        assert!(built.is_immutable());
        assert_eq!(built.to_string(), "PROXY{tags=[x], text=a}");
    }

    #[test]
    fn test_invoke_prefix_and_bare_names() {
        let ctx = ctx();
        let builder = SnapshotBuilder::new(&ctx, "Note", Config::default())
            .unwrap()
            .invoke("withText", vec![Value::from("a")])
            .unwrap()
            .invoke("addToTags", vec![Value::from("t1"), Value::from("t2")])
            .unwrap();
        assert_eq!(builder.build().unwrap().to_string(), "PROXY{tags=[t1, t2], text=a}");

        let bare = builder.with_prefix(None).invoke("text", vec![Value::from("b")]).unwrap();
        assert_eq!(bare.current().get("text").unwrap(), Value::from("b"));
    }

    #[test]
    fn test_from_existing_copies_view() {
        let ctx = ctx();
        let view = ctx
            .builder_for("Note")
            .immutable(true)
            .with_json(json!({"text": "keep"}))
            .unwrap()
            .build()
            .unwrap();
        let edited = SnapshotBuilder::from_existing(&view)
            .unwrap()
            .set("text", "changed")
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(view.get("text").unwrap(), Value::from("keep"));
        assert_eq!(edited.get("text").unwrap(), Value::from("changed"));
        assert!(edited.is_immutable());
    }
}
