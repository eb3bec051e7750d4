//! Value coercion between the backing map and view attributes.
//!
//! The read direction turns raw stored values into what an attribute
//! declares: nested views, re-collected collections, typed maps, resolved enum
//! constants and protocol-converted scalars. The export direction turns view
//! values back into plain map data.

use crate::config::Config;
use crate::context::ViewContext;
use crate::descriptor::AttributeDescriptor;
use crate::error::{MapViewError, MapViewResult};
use crate::types::{TypeName, TypeRef};
use crate::value::{BackingMap, EnumValue, Value, ValueMap};
use crate::view::View;
use std::sync::Arc;
use tracing::debug;

/// Deepest allowed chain of nested view constructions.
pub const MAX_NESTING_DEPTH: usize = 64;

/// Coerces values for views created at one nesting depth.
#[derive(Clone, Copy)]
pub(crate) struct Coercer<'a> {
    ctx: &'a ViewContext,
    config: &'a Config,
    depth: usize,
}

impl<'a> Coercer<'a> {
    pub(crate) fn new(ctx: &'a ViewContext, config: &'a Config, depth: usize) -> Self {
        Self { ctx, config, depth }
    }

    /// Coerce a raw stored value for `attr` of `owner`.
    pub(crate) fn attribute(
        &self,
        value: Value,
        attr: &AttributeDescriptor,
        owner: &TypeName,
    ) -> MapViewResult<Value> {
        let location = format!("{owner}.{}", attr.attribute_name);
        match &attr.declared_type {
            TypeRef::Optional(Some(inner)) => {
                let value = value.unwrap_optional();
                match (&value, inner.as_ref()) {
                    (Value::Map(_), TypeRef::Interface(_)) | (Value::Map(_), TypeRef::Map(_)) => {}
                    (Value::Map(_), _) => {
                        return Err(MapViewError::composite(
                            owner.as_str(),
                            attr.attribute_name.as_str(),
                            format!("optional inner type {inner} is not a view interface"),
                        ))
                    }
                    _ => {}
                }
                self.coerce(value, inner, &location)
            }
            declared => self.coerce(value, declared, &location),
        }
    }

    /// Coerce `value` to `declared`.
    pub(crate) fn coerce(
        &self,
        value: Value,
        declared: &TypeRef,
        location: &str,
    ) -> MapViewResult<Value> {
        let value = value.unwrap_optional();
        if value.is_null() {
            return Ok(Value::Null);
        }

        match declared {
            TypeRef::Any => Ok(value),
            TypeRef::List(element) | TypeRef::Set(element) => {
                let items: Vec<Value> = match value {
                    Value::List(items) => items,
                    Value::Set(items) => items.into_iter().collect(),
                    other => {
                        return Err(MapViewError::type_mismatch(
                            location,
                            declared.to_string(),
                            other.type_label(),
                        ))
                    }
                };
                let items = match element.as_deref() {
                    Some(element) if element.converts_elements() => items
                        .into_iter()
                        .map(|item| self.coerce(item, element, location))
                        .collect::<MapViewResult<Vec<_>>>()?,
                    _ => items,
                };
                Ok(match declared {
                    TypeRef::Set(_) => Value::Set(items.into_iter().collect()),
                    _ => Value::List(items),
                })
            }
            TypeRef::Optional(inner) => match inner.as_deref() {
                Some(inner) => self.coerce(value, inner, location),
                None => Ok(value),
            },
            TypeRef::Map(params) => {
                let map = match value {
                    Value::Map(map) => map,
                    other => {
                        return Err(MapViewError::type_mismatch(
                            location,
                            declared.to_string(),
                            other.type_label(),
                        ))
                    }
                };
                let Some(params) = params.as_deref() else {
                    return Ok(Value::Map(map));
                };
                let (key_type, value_type) = (&params.0, &params.1);
                let mut converted = ValueMap::with_capacity(map.len());
                for (k, v) in map {
                    let k = if key_type.converts_elements() {
                        self.coerce(k, key_type, location)?
                    } else {
                        k
                    };
                    let v = if value_type.converts_elements() {
                        self.coerce(v, value_type, location)?
                    } else {
                        v
                    };
                    converted.insert(k, v);
                }
                Ok(Value::Map(converted))
            }
            TypeRef::Interface(name) => match value {
                Value::Map(map) => {
                    let backing = string_keyed(map, location)?;
                    self.nested_view(name, backing).map(Value::View)
                }
                Value::View(view) if view.conforms_to(name.as_str()) => {
                    if view.config() == self.config {
                        Ok(Value::View(view))
                    } else {
                        // carry the enclosing view's configuration into the nested one
                        let backing = view.backing().clone();
                        self.nested_view(view.type_name(), backing).map(Value::View)
                    }
                }
                Value::View(view) => {
                    // a view of an unrelated type is rebuilt from its exported data
                    let backing = view.to_map()?;
                    self.nested_view(name, backing).map(Value::View)
                }
                other => Err(MapViewError::type_mismatch(
                    location,
                    name.as_str(),
                    other.type_label(),
                )),
            },
            TypeRef::Enum(name) => self.resolve_enum(value, name),
            _ if conforms(&value, declared) => Ok(value),
            _ => self.convert(value, declared, location),
        }
    }

    fn nested_view(&self, name: &TypeName, backing: BackingMap) -> MapViewResult<View> {
        View::construct(
            self.ctx.clone(),
            name.clone(),
            self.config.clone(),
            Arc::new(backing),
            self.depth + 1,
        )
    }

    /// Build the view of an embedded attribute over `source`.
    pub(crate) fn embedded_view(
        &self,
        attr: &AttributeDescriptor,
        owner: &TypeName,
        source: Arc<BackingMap>,
    ) -> MapViewResult<View> {
        let Some(name) = attr.declared_type.as_interface() else {
            return Err(MapViewError::composite(
                owner.as_str(),
                attr.attribute_name.as_str(),
                format!(
                    "embedded attribute type {} is not a view interface",
                    attr.declared_type
                ),
            ));
        };
        View::construct(
            self.ctx.clone(),
            name.clone(),
            self.config.clone(),
            source,
            self.depth + 1,
        )
    }

    fn resolve_enum(&self, value: Value, name: &TypeName) -> MapViewResult<Value> {
        if let Value::Enum(e) = &value {
            if e.enum_type == *name {
                return Ok(value);
            }
        }
        let def = self.ctx.registry().enumeration(name.as_str())?;
        let method = self.config.enum_mapping_method.as_str();
        def.constants
            .iter()
            .find(|c| c.mapped_value(method).as_ref() == Some(&value))
            .map(|c| Value::Enum(EnumValue::new(name, c.name.clone())))
            .ok_or_else(|| MapViewError::enum_resolution(name.as_str(), value.to_string(), method))
    }

    /// Constructor and `parse` fallbacks, exact kind before normalized kind.
    fn convert(&self, value: Value, declared: &TypeRef, location: &str) -> MapViewResult<Value> {
        let mismatch =
            || MapViewError::type_mismatch(location, declared.to_string(), value.type_label());
        let Some(scalar) = declared
            .scalar_name()
            .and_then(|name| self.ctx.registry().scalar(name).ok())
        else {
            return Err(mismatch());
        };

        let kind = value.kind();
        let attempts = [
            ("constructor", &scalar.constructors, Some(kind)),
            ("constructor", &scalar.constructors, kind.normalized()),
            ("parse", &scalar.parsers, Some(kind)),
            ("parse", &scalar.parsers, kind.normalized()),
        ];
        for (step, converters, accepts) in attempts {
            let Some(accepts) = accepts else {
                continue;
            };
            let Some(converter) = converters.iter().find(|c| c.accepts == accepts) else {
                debug!(target_type = %declared, source = %accepts, step, "no converter found");
                continue;
            };
            match converter.apply(&value) {
                Ok(converted) => {
                    return Ok(match declared {
                        TypeRef::Scalar(type_name) => Value::Scalar {
                            type_name: type_name.clone(),
                            inner: Box::new(converted),
                        },
                        _ => converted,
                    })
                }
                Err(reason) => {
                    debug!(
                        target_type = %declared,
                        source = %accepts,
                        step,
                        %reason,
                        "conversion failed"
                    );
                }
            }
        }
        Err(mismatch())
    }
}

fn string_keyed(map: ValueMap, location: &str) -> MapViewResult<BackingMap> {
    map.into_iter()
        .map(|(k, v)| match k {
            Value::Str(k) => Ok((k, v)),
            other => Err(MapViewError::type_mismatch(
                location,
                "string map key",
                other.type_label(),
            )),
        })
        .collect()
}

/// Whether `value` already has the runtime type `declared` describes.
pub(crate) fn conforms(value: &Value, declared: &TypeRef) -> bool {
    match (declared, value) {
        (TypeRef::Any, _) | (_, Value::Null) => true,
        (TypeRef::Bool, Value::Bool(_))
        | (TypeRef::Int, Value::Int(_))
        | (TypeRef::Float, Value::Float(_))
        | (TypeRef::Str, Value::Str(_))
        | (TypeRef::List(_), Value::List(_))
        | (TypeRef::Set(_), Value::Set(_))
        | (TypeRef::Map(_), Value::Map(_))
        | (TypeRef::Optional(_), Value::Optional(_)) => true,
        (TypeRef::Interface(name), Value::View(view)) => view.conforms_to(name.as_str()),
        (TypeRef::Enum(name), Value::Enum(e)) => e.enum_type == *name,
        (TypeRef::Scalar(name), Value::Scalar { type_name, .. }) => type_name == name,
        _ => false,
    }
}

/// Export a view value to plain map data.
///
/// Nested views become maps, containers are walked recursively and enum
/// constants map through the configured mapping method.
pub(crate) fn export(ctx: &ViewContext, config: &Config, value: &Value) -> MapViewResult<Value> {
    Ok(match value {
        Value::View(view) => Value::from_backing(view.to_map()?),
        Value::List(items) => Value::List(
            items
                .iter()
                .map(|item| export(ctx, config, item))
                .collect::<MapViewResult<_>>()?,
        ),
        Value::Set(items) => Value::Set(
            items
                .iter()
                .map(|item| export(ctx, config, item))
                .collect::<MapViewResult<_>>()?,
        ),
        Value::Map(map) => {
            let mut exported = ValueMap::with_capacity(map.len());
            for (k, v) in map {
                exported.insert(export(ctx, config, k)?, export(ctx, config, v)?);
            }
            Value::Map(exported)
        }
        Value::Enum(e) => export_enum(ctx, config, e)?,
        Value::Optional(Some(inner)) => export(ctx, config, inner)?,
        Value::Optional(None) => Value::Null,
        other => other.clone(),
    })
}

fn export_enum(ctx: &ViewContext, config: &Config, value: &EnumValue) -> MapViewResult<Value> {
    let method = config.enum_mapping_method.as_str();
    if method == crate::config::DEFAULT_ENUM_MAPPING_METHOD {
        return Ok(Value::Str(value.constant.clone()));
    }
    let def = ctx.registry().enumeration(value.enum_type.as_str())?;
    def.find(&value.constant)
        .and_then(|c| c.mapped_value(method))
        .ok_or_else(|| {
            MapViewError::enum_resolution(value.enum_type.as_str(), value.constant.as_str(), method)
        })
}
