//! Bean adapter: plain Rust data structs to and from views.
//!
//! A bean is a struct deriving `ViewType`; its derived `FromValue` and
//! `IntoValue` impls read and write fields by attribute name. Before any value
//! moves, the attribute tables of the view type and the bean type are checked
//! for matching container shapes.

use crate::coerce::MAX_NESTING_DEPTH;
use crate::context::ViewContext;
use crate::descriptor::TypeDescriptors;
use crate::error::{MapViewError, MapViewResult};
use crate::field::{FromValue, IntoValue, ViewType};
use crate::types::{TypeName, TypeRef};
use crate::value::{BackingMap, Value};
use crate::view::View;
use std::collections::HashSet;
use std::sync::Arc;

/// Verify that attributes shared by `view_type` and `bean_type` agree on
/// collection-ness, map-ness and declared type parameters, recursing into
/// nested interfaces.
pub fn check_genericity(ctx: &ViewContext, view_type: &str, bean_type: &str) -> MapViewResult<()> {
    let mut visited = HashSet::new();
    check_pair(ctx, view_type, bean_type, &mut visited)
}

fn check_pair(
    ctx: &ViewContext,
    view_type: &str,
    bean_type: &str,
    visited: &mut HashSet<(String, String)>,
) -> MapViewResult<()> {
    if view_type == bean_type || !visited.insert((view_type.to_string(), bean_type.to_string())) {
        return Ok(());
    }
    let view_attrs = ctx.descriptors(view_type)?;
    let bean_attrs = ctx.descriptors(bean_type)?;

    for bean_attr in bean_attrs.iter() {
        let Some(view_attr) = view_attrs.get(&bean_attr.attribute_name) else {
            continue;
        };
        let location = format!("{bean_type}.{}", bean_attr.attribute_name);
        let view_ty = strip_optional(&view_attr.declared_type);
        let bean_ty = strip_optional(&bean_attr.declared_type);

        let shape_mismatch = view_ty.is_collection() != bean_ty.is_collection()
            || view_ty.is_map() != bean_ty.is_map()
            || ((view_ty.is_collection() || view_ty.is_map())
                && view_ty.is_generic() != bean_ty.is_generic());
        if shape_mismatch {
            return Err(MapViewError::type_mismatch(
                location,
                view_ty.to_string(),
                bean_ty.to_string(),
            ));
        }

        if let (Some(view_leaf), Some(bean_leaf)) =
            (leaf_interface(view_ty), leaf_interface(bean_ty))
        {
            check_pair(ctx, view_leaf.as_str(), bean_leaf.as_str(), visited)?;
        }
    }
    Ok(())
}

fn strip_optional(ty: &TypeRef) -> &TypeRef {
    match ty {
        TypeRef::Optional(Some(inner)) => strip_optional(inner),
        other => other,
    }
}

fn leaf_interface(ty: &TypeRef) -> Option<&TypeName> {
    match ty {
        TypeRef::Interface(name) => Some(name),
        TypeRef::List(Some(element)) | TypeRef::Set(Some(element)) => {
            leaf_interface(strip_optional(element))
        }
        TypeRef::Map(Some(kv)) => leaf_interface(strip_optional(&kv.1)),
        _ => None,
    }
}

/// Convert `view` into the bean `B`.
pub fn to_bean<B: ViewType + FromValue>(view: &View) -> MapViewResult<B> {
    let ctx = view.context();
    ctx.register::<B>();
    check_genericity(ctx, view.type_name().as_str(), B::NAME)?;
    B::from_value(&Value::View(view.clone()))
}

/// Convert a bean into the backing map of a `target` view.
pub fn to_proxy_map<B: ViewType + IntoValue>(
    ctx: &ViewContext,
    target: &str,
    bean: B,
) -> MapViewResult<BackingMap> {
    ctx.register::<B>();
    proxy_map_from_value(ctx, target, B::NAME, bean.into_value())
}

/// Re-key an attribute-keyed bean value into the backing map of `target`.
pub(crate) fn proxy_map_from_value(
    ctx: &ViewContext,
    target: &str,
    bean_type: &str,
    value: Value,
) -> MapViewResult<BackingMap> {
    check_genericity(ctx, target, bean_type)?;
    match value {
        Value::View(view) => view.to_map(),
        Value::Map(_) => {
            let fields = value.into_backing().ok_or_else(|| {
                MapViewError::type_mismatch(bean_type, "attribute-keyed map", "map")
            })?;
            rekey(ctx, target, fields, 0)
        }
        other => Err(MapViewError::type_mismatch(
            bean_type,
            "bean",
            other.type_label(),
        )),
    }
}

fn rekey(
    ctx: &ViewContext,
    type_name: &str,
    mut fields: BackingMap,
    depth: usize,
) -> MapViewResult<BackingMap> {
    if depth > MAX_NESTING_DEPTH {
        return Err(MapViewError::cyclic(type_name, MAX_NESTING_DEPTH));
    }
    let descriptors: Arc<TypeDescriptors> = ctx.descriptors(type_name)?;
    let mut out = BackingMap::new();
    let mut embedded = Vec::new();

    for attr in descriptors.iter() {
        let Some(value) = fields.remove(&attr.attribute_name) else {
            continue;
        };
        if attr.composite {
            if let (Some(name), Some(inner)) =
                (attr.declared_type.as_interface(), value.into_backing())
            {
                embedded.push(rekey(ctx, name.as_str(), inner, depth + 1)?);
            }
            continue;
        }
        let value = rekey_value(ctx, &attr.declared_type, value, depth + 1)?;
        out.insert(attr.map_key.clone(), value);
    }
    for entries in embedded {
        for (key, value) in entries {
            out.entry(key).or_insert(value);
        }
    }
    Ok(out)
}

fn rekey_value(
    ctx: &ViewContext,
    declared: &TypeRef,
    value: Value,
    depth: usize,
) -> MapViewResult<Value> {
    let value = value.unwrap_optional();
    Ok(match (declared, value) {
        (TypeRef::Optional(Some(inner)), value) => rekey_value(ctx, inner, value, depth)?,
        (TypeRef::Interface(name), value @ Value::Map(_)) => match value.into_backing() {
            Some(fields) => Value::from_backing(rekey(ctx, name.as_str(), fields, depth)?),
            None => {
                return Err(MapViewError::type_mismatch(
                    name.as_str(),
                    "attribute-keyed map",
                    "map",
                ))
            }
        },
        (TypeRef::List(Some(element)), Value::List(items)) => Value::List(
            items
                .into_iter()
                .map(|item| rekey_value(ctx, element, item, depth))
                .collect::<MapViewResult<_>>()?,
        ),
        (TypeRef::Set(Some(element)), Value::Set(items)) => Value::Set(
            items
                .into_iter()
                .map(|item| rekey_value(ctx, element, item, depth))
                .collect::<MapViewResult<_>>()?,
        ),
        (TypeRef::Map(Some(kv)), Value::Map(map)) => Value::Map(
            map.into_iter()
                .map(|(k, v)| {
                    Ok((
                        rekey_value(ctx, &kv.0, k, depth)?,
                        rekey_value(ctx, &kv.1, v, depth)?,
                    ))
                })
                .collect::<MapViewResult<_>>()?,
        ),
        (_, value) => value,
    })
}

/// Read a bean field from a view or an attribute-keyed map.
///
/// Attributes the source does not declare read as null; null reads through
/// [`FromValue::from_null`].
pub fn read_attribute<T: FromValue>(source: &Value, attribute: &str) -> MapViewResult<T> {
    let value = match source {
        Value::View(view) => match view.get(attribute) {
            Ok(value) => value,
            Err(MapViewError::NoSuchMember { .. }) => Value::Null,
            Err(err) => return Err(err),
        },
        Value::Map(_) => source.get_key(attribute).cloned().unwrap_or_default(),
        other => {
            return Err(MapViewError::type_mismatch(
                attribute,
                "view or map",
                other.type_label(),
            ))
        }
    };
    from_nullable(value, attribute)
}

fn from_nullable<T: FromValue>(value: Value, location: &str) -> MapViewResult<T> {
    match value {
        Value::Null => T::from_null().ok_or_else(|| {
            MapViewError::construction(location, "attribute is absent and has no default")
        }),
        value => T::from_value(&value),
    }
}
