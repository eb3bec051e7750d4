//! Application-owned handle to the type registry and descriptor cache.

use crate::builder::{SnapshotBuilder, ViewBuilder};
use crate::config::{CacheSettings, Config};
use crate::descriptor::{introspect, DescriptorCache, TypeDescriptors};
use crate::error::MapViewResult;
use crate::field::{FieldType, ViewType};
use crate::registry::TypeRegistry;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

struct ContextInner {
    registry: TypeRegistry,
    cache: DescriptorCache,
}

/// Shared context every view is created in.
///
/// Cloning is cheap; all clones share one registry and one descriptor cache.
#[derive(Clone)]
pub struct ViewContext {
    inner: Arc<ContextInner>,
}

impl Default for ViewContext {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewContext {
    /// Create a context with the default cache expiry.
    pub fn new() -> Self {
        Self::with_settings(CacheSettings::default())
    }

    /// Create a context whose cache expiry comes from the environment.
    pub fn from_env() -> Self {
        Self::with_settings(CacheSettings::from_env())
    }

    pub fn with_settings(settings: CacheSettings) -> Self {
        Self::with_cache_ttl(settings.ttl())
    }

    pub fn with_cache_ttl(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(ContextInner {
                registry: TypeRegistry::new(),
                cache: DescriptorCache::new(ttl),
            }),
        }
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.inner.registry
    }

    pub fn cache(&self) -> &DescriptorCache {
        &self.inner.cache
    }

    /// Register `T` and every type it references.
    pub fn register<T: FieldType>(&self) -> &Self {
        T::register(self.registry());
        self
    }

    /// Attribute table of `type_name`, served from the cache.
    pub fn descriptors(&self, type_name: &str) -> MapViewResult<Arc<TypeDescriptors>> {
        self.cache()
            .get_or_compute(type_name, || introspect(self.registry(), type_name))
    }

    /// Start building a view of `T`.
    pub fn builder<T: ViewType>(&self) -> ViewBuilder {
        self.register::<T>();
        ViewBuilder::new(self.clone(), T::NAME)
    }

    /// Start building a view of a type registered by name.
    pub fn builder_for(&self, type_name: &str) -> ViewBuilder {
        ViewBuilder::new(self.clone(), type_name)
    }

    /// Start a copy-on-write snapshot builder for `T`.
    pub fn snapshot<T: ViewType>(&self) -> MapViewResult<SnapshotBuilder> {
        self.register::<T>();
        SnapshotBuilder::new(self, T::NAME, Config::default())
    }

    pub fn same_context(&self, other: &ViewContext) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for ViewContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewContext")
            .field("cache", &self.inner.cache)
            .finish_non_exhaustive()
    }
}
