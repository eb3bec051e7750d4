//! Accessor resolution: maps attribute names to getter, setter, adder and
//! remover members of a type.

use crate::descriptor::{AttributeDescriptor, TypeDescriptors};
use crate::error::{MapViewError, MapViewResult};

pub const GET: &str = "get";
pub const IS: &str = "is";
pub const SET: &str = "set";
pub const ADD_TO: &str = "addTo";
pub const REMOVE_FROM: &str = "removeFrom";

/// Accessor method name for `attribute` (`get` + `loginName` -> `getLoginName`).
pub fn accessor_name(prefix: &str, attribute: &str) -> String {
    let mut chars = attribute.chars();
    match chars.next() {
        Some(first) => format!("{prefix}{}{}", first.to_uppercase(), chars.as_str()),
        None => prefix.to_string(),
    }
}

/// Attribute named by `method` after `prefix` (`getLoginName` -> `loginName`).
///
/// `None` unless the remainder is non-empty and starts with an uppercase letter.
pub fn attribute_name(method: &str, prefix: &str) -> Option<String> {
    let rest = method.strip_prefix(prefix)?;
    let mut chars = rest.chars();
    let first = chars.next()?;
    if !first.is_uppercase() {
        return None;
    }
    Some(format!("{}{}", first.to_lowercase(), chars.as_str()))
}

fn find<'a>(
    descriptors: &'a TypeDescriptors,
    prefix: &str,
    attribute: &str,
) -> MapViewResult<&'a AttributeDescriptor> {
    descriptors.get(attribute).ok_or_else(|| {
        MapViewError::no_such_member(
            descriptors.type_name().as_str(),
            accessor_name(prefix, attribute),
        )
    })
}

pub fn find_getter<'a>(
    descriptors: &'a TypeDescriptors,
    attribute: &str,
) -> MapViewResult<&'a AttributeDescriptor> {
    find(descriptors, GET, attribute)
}

pub fn find_setter<'a>(
    descriptors: &'a TypeDescriptors,
    attribute: &str,
) -> MapViewResult<&'a AttributeDescriptor> {
    find(descriptors, SET, attribute)
}

/// Adders exist only for collection attributes.
pub fn find_adder<'a>(
    descriptors: &'a TypeDescriptors,
    attribute: &str,
) -> MapViewResult<&'a AttributeDescriptor> {
    find_collection(descriptors, ADD_TO, attribute)
}

pub fn find_remover<'a>(
    descriptors: &'a TypeDescriptors,
    attribute: &str,
) -> MapViewResult<&'a AttributeDescriptor> {
    find_collection(descriptors, REMOVE_FROM, attribute)
}

fn find_collection<'a>(
    descriptors: &'a TypeDescriptors,
    prefix: &str,
    attribute: &str,
) -> MapViewResult<&'a AttributeDescriptor> {
    match find(descriptors, prefix, attribute)? {
        attr if attr.is_collection() => Ok(attr),
        _ => Err(MapViewError::no_such_member(
            descriptors.type_name().as_str(),
            accessor_name(prefix, attribute),
        )),
    }
}
