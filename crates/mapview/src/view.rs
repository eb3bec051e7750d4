//! View instances.
//!
//! A [`View`] is a typed handle over a backing map. Construction coerces every
//! declared attribute once; reads return the coerced values, writes coerce the
//! incoming value and store it under the attribute's map key.
//!
//! Views are values: cloning is cheap and a write only copies the backing map
//! when the state is shared with another clone.

use crate::coerce::{export, Coercer, MAX_NESTING_DEPTH};
use crate::config::Config;
use crate::context::ViewContext;
use crate::descriptor::{AttributeDescriptor, TypeDescriptors};
use crate::error::{MapViewError, MapViewResult};
use crate::field::{FromValue, TypedView, ViewType};
use crate::lattice;
use crate::member;
use crate::registry::{MAP_HOLDER, MAP_TYPE};
use crate::types::{TypeName, TypeRef};
use crate::value::{write_entries, BackingMap, Value};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

#[derive(Clone)]
struct ViewState {
    ctx: ViewContext,
    type_name: TypeName,
    descriptors: Arc<TypeDescriptors>,
    config: Config,
    backing: BackingMap,
    original: Arc<BackingMap>,
}

/// A typed view over a backing map.
#[derive(Clone)]
pub struct View {
    state: Arc<ViewState>,
}

impl View {
    /// Build a view of `type_name` over `original`.
    pub(crate) fn construct(
        ctx: ViewContext,
        type_name: TypeName,
        config: Config,
        original: Arc<BackingMap>,
        depth: usize,
    ) -> MapViewResult<View> {
        if depth > MAX_NESTING_DEPTH {
            return Err(MapViewError::cyclic(type_name.as_str(), MAX_NESTING_DEPTH));
        }
        let descriptors = ctx.descriptors(type_name.as_str())?;

        let mut backing = BackingMap::new();
        {
            let coercer = Coercer::new(&ctx, &config, depth);
            let mut embedded = Vec::new();
            for attr in descriptors.iter() {
                if attr.composite {
                    let view = coercer.embedded_view(attr, &type_name, original.clone())?;
                    embedded.push(view);
                } else if let Some(raw) = original.get(&attr.map_key) {
                    let value = coercer.attribute(raw.clone(), attr, &type_name)?;
                    backing.insert(attr.map_key.clone(), value);
                }
            }
            for view in embedded {
                for (key, value) in view.backing() {
                    backing.entry(key.clone()).or_insert_with(|| value.clone());
                }
            }
        }

        Ok(View {
            state: Arc::new(ViewState {
                ctx,
                type_name,
                descriptors,
                config,
                backing,
                original,
            }),
        })
    }

    pub fn type_name(&self) -> &TypeName {
        &self.state.type_name
    }

    pub fn config(&self) -> &Config {
        &self.state.config
    }

    pub fn context(&self) -> &ViewContext {
        &self.state.ctx
    }

    pub fn descriptors(&self) -> &Arc<TypeDescriptors> {
        &self.state.descriptors
    }

    /// The coerced backing map.
    pub fn backing(&self) -> &BackingMap {
        &self.state.backing
    }

    /// The map supplied at construction, untouched by later writes.
    pub fn original_map(&self) -> &Arc<BackingMap> {
        &self.state.original
    }

    pub fn is_immutable(&self) -> bool {
        self.state.config.immutable
    }

    /// Whether this view's type is `type_name` or one of its subtypes.
    pub fn conforms_to(&self, type_name: &str) -> bool {
        self.state
            .ctx
            .registry()
            .is_subtype(self.state.type_name.as_str(), type_name)
    }

    /// Whether the backing map holds a key for `attribute`.
    pub fn contains(&self, attribute: &str) -> bool {
        let key = self.state.descriptors.map_key(attribute);
        self.state.backing.contains_key(key)
    }

    /// Every interface this view implements, including the map holder marker.
    pub fn interfaces(&self) -> Vec<TypeName> {
        self.state
            .ctx
            .registry()
            .interfaces_of(self.state.type_name.as_str())
    }

    /// The single most specific user interface this view implements.
    pub fn real_interface(&self) -> MapViewResult<TypeName> {
        lattice::reduce(
            self.state.ctx.registry(),
            &self.interfaces(),
            &[TypeName::new(MAP_HOLDER)],
        )
    }

    fn coercer(&self) -> Coercer<'_> {
        Coercer::new(&self.state.ctx, &self.state.config, 0)
    }

    fn ensure_mutable(&self, attribute: &str, operation: &'static str) -> MapViewResult<()> {
        if self.state.config.immutable {
            return Err(MapViewError::immutable(
                self.state.type_name.as_str(),
                attribute,
                operation,
            ));
        }
        Ok(())
    }

    fn location(&self, attr: &AttributeDescriptor) -> String {
        format!("{}.{}", self.state.type_name, attr.attribute_name)
    }

    /// Read an attribute.
    ///
    /// Embedded attributes read as a view over this view's map. Optional
    /// attributes read as `Value::Optional` when the key is present (or
    /// `map_null_to_optional_absent` is set) and as `Null` otherwise.
    pub fn get(&self, attribute: &str) -> MapViewResult<Value> {
        let attr = member::find_getter(&self.state.descriptors, attribute)?;
        if attr.composite {
            let source = Arc::new(self.state.backing.clone());
            return self
                .coercer()
                .embedded_view(attr, &self.state.type_name, source)
                .map(Value::View);
        }

        let stored = self.state.backing.get(&attr.map_key);
        match &attr.declared_type {
            TypeRef::Optional(_) => {
                if stored.is_some() || self.state.config.map_null_to_optional_absent {
                    Ok(Value::Optional(
                        stored.filter(|v| !v.is_null()).cloned().map(Box::new),
                    ))
                } else {
                    Ok(Value::Null)
                }
            }
            declared
                if declared.is_collection()
                    && self.state.config.null_safe_collection
                    && stored.map_or(true, Value::is_null) =>
            {
                Ok(match declared {
                    TypeRef::Set(_) => Value::Set(Default::default()),
                    _ => Value::List(Vec::new()),
                })
            }
            _ => Ok(stored.cloned().unwrap_or(Value::Null)),
        }
    }

    /// Read a boolean attribute; null reads as `false`.
    pub fn is(&self, attribute: &str) -> MapViewResult<bool> {
        let attr = member::find_getter(&self.state.descriptors, attribute)?;
        match self.state.backing.get(&attr.map_key) {
            None | Some(Value::Null) => Ok(false),
            Some(Value::Bool(b)) => Ok(*b),
            Some(other) => Err(MapViewError::type_mismatch(
                self.location(attr),
                "bool",
                other.type_label(),
            )),
        }
    }

    /// Write an attribute.
    ///
    /// The value is coerced like a constructor input. Writing an embedded
    /// attribute merges the given view's (or map's) entries into this view's
    /// map; the merge is computed in full before the map is touched.
    pub fn set(&mut self, attribute: &str, value: impl Into<Value>) -> MapViewResult<()> {
        self.ensure_mutable(attribute, "set")?;
        let descriptors = self.state.descriptors.clone();
        let attr = member::find_setter(&descriptors, attribute)?;
        let value = value.into();

        if attr.composite {
            let source = match value {
                Value::View(view) => view.to_map()?,
                map @ Value::Map(_) => map.into_backing().ok_or_else(|| {
                    MapViewError::type_mismatch(
                        self.location(attr),
                        "string-keyed map",
                        "map",
                    )
                })?,
                other => {
                    return Err(MapViewError::type_mismatch(
                        self.location(attr),
                        attr.declared_type.to_string(),
                        other.type_label(),
                    ))
                }
            };
            let embedded =
                self.coercer()
                    .embedded_view(attr, &self.state.type_name, Arc::new(source))?;
            let entries = embedded.backing().clone();
            Arc::make_mut(&mut self.state).backing.extend(entries);
            return Ok(());
        }

        let value = self.coercer().attribute(value, attr, &self.state.type_name)?;
        Arc::make_mut(&mut self.state)
            .backing
            .insert(attr.map_key.clone(), value);
        Ok(())
    }

    fn coerce_elements<I>(&self, attr: &AttributeDescriptor, items: I) -> MapViewResult<Vec<Value>>
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        let location = self.location(attr);
        let coercer = self.coercer();
        items
            .into_iter()
            .map(|item| match &attr.element_type {
                Some(element) if element.converts_elements() => {
                    coercer.coerce(item.into(), element, &location)
                }
                _ => Ok(item.into()),
            })
            .collect()
    }

    /// Append elements to a collection attribute, creating it if absent.
    ///
    /// Duplicates are kept unless the attribute is declared as a set.
    pub fn add_to<I>(&mut self, attribute: &str, items: I) -> MapViewResult<()>
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        self.ensure_mutable(attribute, "addTo")?;
        let descriptors = self.state.descriptors.clone();
        let attr = member::find_adder(&descriptors, attribute)?;
        let items = self.coerce_elements(attr, items)?;

        let state = Arc::make_mut(&mut self.state);
        let slot = state
            .backing
            .entry(attr.map_key.clone())
            .or_insert(Value::Null);
        match slot {
            Value::List(list) => list.extend(items),
            Value::Set(set) => set.extend(items),
            other => {
                *other = match attr.declared_type {
                    TypeRef::Set(_) => Value::Set(items.into_iter().collect()),
                    _ => Value::List(items),
                }
            }
        }
        Ok(())
    }

    /// Remove elements from a collection attribute.
    ///
    /// Each argument removes the first element equal to it.
    pub fn remove_from<I>(&mut self, attribute: &str, items: I) -> MapViewResult<()>
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        self.ensure_mutable(attribute, "removeFrom")?;
        let descriptors = self.state.descriptors.clone();
        let attr = member::find_remover(&descriptors, attribute)?;
        let items = self.coerce_elements(attr, items)?;
        if !self.state.backing.contains_key(&attr.map_key) {
            return Ok(());
        }

        let state = Arc::make_mut(&mut self.state);
        match state.backing.get_mut(&attr.map_key) {
            Some(Value::List(list)) => {
                for item in &items {
                    if let Some(pos) = list.iter().position(|e| e == item) {
                        list.remove(pos);
                    }
                }
            }
            Some(Value::Set(set)) => {
                for item in &items {
                    set.shift_remove(item);
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Export to a plain map: nested views become maps, enums map through the
    /// configured mapping method.
    pub fn to_map(&self) -> MapViewResult<BackingMap> {
        self.state
            .backing
            .iter()
            .map(|(key, value)| {
                Ok((
                    key.clone(),
                    export(&self.state.ctx, &self.state.config, value)?,
                ))
            })
            .collect()
    }

    pub fn to_json(&self) -> MapViewResult<serde_json::Value> {
        Ok(Value::from_backing(self.to_map()?).to_json())
    }

    /// The backing map rendered as `{key=value, ...}`, sorted by key.
    pub fn canonical_string(&self) -> String {
        Canonical(&self.state.backing).to_string()
    }

    /// The identifier value, if an identifier field is configured and set.
    pub fn identifier(&self) -> Option<&Value> {
        let field = self.state.config.identifier_field.as_deref()?;
        self.identifier_value(field)
    }

    fn identifier_value(&self, field: &str) -> Option<&Value> {
        let key = self.state.descriptors.map_key(field);
        self.state.backing.get(key).filter(|v| !v.is_null())
    }

    /// Convert to another representation.
    ///
    /// `"Map"` yields the exported map; a registered interface yields a new
    /// view of that interface over the exported map.
    pub fn adapt_to(&self, target: &str) -> MapViewResult<Value> {
        if target == MAP_TYPE {
            return Ok(Value::from_backing(self.to_map()?));
        }
        if !self.state.ctx.registry().is_interface(target) {
            return Err(MapViewError::unknown_type(target));
        }
        View::construct(
            self.state.ctx.clone(),
            TypeName::new(target),
            self.state.config.clone(),
            Arc::new(self.to_map()?),
            0,
        )
        .map(Value::View)
    }

    /// Typed form of [`adapt_to`](Self::adapt_to).
    pub fn adapt<T: ViewType>(&self) -> MapViewResult<T::View> {
        self.state.ctx.register::<T>();
        match self.adapt_to(T::NAME)? {
            Value::View(view) => Ok(T::View::from_view(view)),
            other => Err(MapViewError::type_mismatch(
                T::NAME,
                T::NAME,
                other.type_label(),
            )),
        }
    }

    /// Convert to a plain data object.
    pub fn to_bean<B: ViewType + FromValue>(&self) -> MapViewResult<B> {
        crate::bean::to_bean(self)
    }
}

struct Canonical<'a>(&'a BackingMap);

impl fmt::Display for Canonical<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_entries(f, self.0.iter())
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PROXY{}", Canonical(&self.state.backing))
    }
}

impl fmt::Debug for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("View")
            .field("type_name", &self.state.type_name)
            .field("backing", &self.state.backing)
            .field("config", &self.state.config)
            .finish()
    }
}

impl PartialEq for View {
    /// Views of related types are equal when their identifiers match (if both
    /// configure the same identifier field) or their canonical forms match
    /// (if neither configures one). A view without an identifier value equals
    /// only itself, and views with different identifier fields never match.
    fn eq(&self, other: &Self) -> bool {
        if Arc::ptr_eq(&self.state, &other.state) {
            return true;
        }
        let registry = self.state.ctx.registry();
        let (a, b) = (self.type_name().as_str(), other.type_name().as_str());
        if !registry.is_subtype(a, b) && !registry.is_subtype(b, a) {
            return false;
        }
        match (
            self.state.config.identifier_field.as_deref(),
            other.state.config.identifier_field.as_deref(),
        ) {
            (Some(mine), Some(theirs)) if mine == theirs => {
                match (self.identifier_value(mine), other.identifier_value(theirs)) {
                    (Some(mine), Some(theirs)) => mine == theirs,
                    _ => false,
                }
            }
            (None, None) => self.canonical_string() == other.canonical_string(),
            _ => false,
        }
    }
}

impl Eq for View {}

impl Hash for View {
    /// Hashes the identifier when one is configured and set, otherwise the
    /// canonical form.
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self.identifier() {
            Some(id) => id.hash(state),
            None => self.canonical_string().hash(state),
        }
    }
}
