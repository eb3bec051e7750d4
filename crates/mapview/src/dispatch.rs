//! Name-based dispatch of view operations.
//!
//! [`View::invoke`] resolves a method name the way a dynamic proxy would:
//! object protocol methods first, then accessor prefixes.

use crate::error::{MapViewError, MapViewResult};
use crate::member::{self, ADD_TO, GET, IS, REMOVE_FROM, SET};
use crate::value::Value;
use crate::view::View;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use tracing::trace;

/// A resolved view method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    Equals,
    HashCode,
    ToMap,
    GetOriginalMap,
    ToString,
    AdaptTo,
    Get(String),
    Is(String),
    Set(String),
    AddTo(String),
    RemoveFrom(String),
    /// No handler; invoking it yields no value.
    Unhandled(String),
}

impl Method {
    pub fn parse(name: &str) -> Method {
        match name {
            "equals" => return Method::Equals,
            "hashCode" => return Method::HashCode,
            "toMap" => return Method::ToMap,
            "getOriginalMap" => return Method::GetOriginalMap,
            "toString" => return Method::ToString,
            "adaptTo" => return Method::AdaptTo,
            _ => {}
        }
        let prefixed: [(&str, fn(String) -> Method); 5] = [
            (ADD_TO, Method::AddTo),
            (REMOVE_FROM, Method::RemoveFrom),
            (SET, Method::Set),
            (GET, Method::Get),
            (IS, Method::Is),
        ];
        prefixed
            .iter()
            .find_map(|(prefix, make)| member::attribute_name(name, prefix).map(*make))
            .unwrap_or_else(|| Method::Unhandled(name.to_string()))
    }
}

fn first_arg(method: &str, args: &mut Vec<Value>) -> MapViewResult<Value> {
    if args.is_empty() {
        return Err(MapViewError::type_mismatch(method, "one argument", "none"));
    }
    Ok(args.swap_remove(0))
}

impl View {
    /// Invoke a view method by name.
    ///
    /// Returns `Ok(None)` for methods without a result (setters, adders,
    /// removers) and for names no handler recognizes.
    pub fn invoke(&mut self, method: &str, mut args: Vec<Value>) -> MapViewResult<Option<Value>> {
        match Method::parse(method) {
            Method::Equals => {
                let other = first_arg(method, &mut args)?;
                Ok(Some(Value::Bool(matches!(&other, Value::View(v) if v == &*self))))
            }
            Method::HashCode => {
                let mut hasher = DefaultHasher::new();
                self.hash(&mut hasher);
                Ok(Some(Value::Int(hasher.finish() as i64)))
            }
            Method::ToMap => Ok(Some(Value::from_backing(self.to_map()?))),
            Method::GetOriginalMap => Ok(Some(Value::from_backing(
                self.original_map().as_ref().clone(),
            ))),
            Method::ToString => Ok(Some(Value::Str(self.to_string()))),
            Method::AdaptTo => match first_arg(method, &mut args)? {
                Value::Str(target) => self.adapt_to(&target).map(Some),
                other => Err(MapViewError::type_mismatch(
                    method,
                    "type name",
                    other.type_label(),
                )),
            },
            Method::Get(attribute) => self.get(&attribute).map(Some),
            Method::Is(attribute) => self.is(&attribute).map(|b| Some(Value::Bool(b))),
            Method::Set(attribute) => {
                let value = args.into_iter().next().unwrap_or(Value::Null);
                self.set(&attribute, value).map(|_| None)
            }
            Method::AddTo(attribute) => self.add_to(&attribute, args).map(|_| None),
            Method::RemoveFrom(attribute) => self.remove_from(&attribute, args).map(|_| None),
            Method::Unhandled(name) => {
                trace!(type_name = %self.type_name(), method = %name, "unhandled view method");
                Ok(None)
            }
        }
    }
}
