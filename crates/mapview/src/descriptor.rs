//! Per-type attribute metadata and its access-expiring cache.

use crate::error::{MapViewError, MapViewResult};
use crate::registry::TypeRegistry;
use crate::types::{TypeName, TypeRef};
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Metadata of one attribute of one type.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeDescriptor {
    pub attribute_name: String,
    /// Key in the backing map; the attribute name unless renamed.
    pub map_key: String,
    pub declared_type: TypeRef,
    /// Element type of a collection, or inner type of an optional.
    pub element_type: Option<TypeRef>,
    pub key_type: Option<TypeRef>,
    pub value_type: Option<TypeRef>,
    pub composite: bool,
    /// The interface that declared the attribute.
    pub declared_in: TypeName,
}

impl AttributeDescriptor {
    pub fn is_collection(&self) -> bool {
        self.declared_type.is_collection()
    }

    pub fn is_optional(&self) -> bool {
        self.declared_type.is_optional()
    }
}

/// The attribute table of one type, own and inherited attributes merged.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDescriptors {
    type_name: TypeName,
    attributes: IndexMap<String, AttributeDescriptor>,
    keys: HashMap<String, String>,
}

impl TypeDescriptors {
    pub fn type_name(&self) -> &TypeName {
        &self.type_name
    }

    pub fn get(&self, attribute: &str) -> Option<&AttributeDescriptor> {
        self.attributes.get(attribute)
    }

    /// Find the attribute stored under `map_key`.
    pub fn by_map_key(&self, map_key: &str) -> Option<&AttributeDescriptor> {
        self.keys.get(map_key).and_then(|name| self.attributes.get(name))
    }

    /// Map key for `attribute`, or the attribute name itself if undeclared.
    pub fn map_key<'a>(&'a self, attribute: &'a str) -> &'a str {
        self.get(attribute)
            .map(|d| d.map_key.as_str())
            .unwrap_or(attribute)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AttributeDescriptor> {
        self.attributes.values()
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

/// Build the attribute table of `type_name`.
///
/// Walks the type and its supertypes breadth-first; when an attribute name is
/// declared more than once the nearest declaration wins.
pub fn introspect(registry: &TypeRegistry, type_name: &str) -> MapViewResult<TypeDescriptors> {
    let mut attributes = IndexMap::new();
    let mut keys = HashMap::new();
    let mut visited = HashSet::new();
    let mut queue = VecDeque::from([TypeName::new(type_name)]);

    while let Some(current) = queue.pop_front() {
        if !visited.insert(current.clone()) {
            continue;
        }
        let def = registry.interface(current.as_str())?;
        for attr in &def.attributes {
            if attributes.contains_key(&attr.name) {
                continue;
            }
            let map_key = attr.key.clone().unwrap_or_else(|| attr.name.clone());
            let (key_type, value_type) = match attr.declared.key_value_types() {
                Some((k, v)) => (Some(k.clone()), Some(v.clone())),
                None => (None, None),
            };
            if let Some(previous) = keys.insert(map_key.clone(), attr.name.clone()) {
                return Err(MapViewError::composite(
                    type_name,
                    attr.name.clone(),
                    format!("map key '{map_key}' is already used by '{previous}'"),
                ));
            }
            attributes.insert(
                attr.name.clone(),
                AttributeDescriptor {
                    attribute_name: attr.name.clone(),
                    map_key,
                    declared_type: attr.declared.clone(),
                    element_type: attr.declared.element_type().cloned(),
                    key_type,
                    value_type,
                    composite: attr.embedded,
                    declared_in: current.clone(),
                },
            );
        }
        queue.extend(def.extends.iter().cloned());
    }

    Ok(TypeDescriptors {
        type_name: TypeName::new(type_name),
        attributes,
        keys,
    })
}

struct CacheEntry {
    descriptors: Arc<TypeDescriptors>,
    last_access: AtomicU64,
}

/// Read-through cache of [`TypeDescriptors`] with access-based expiry.
///
/// Hits take only a read lock. Expired entries are swept whenever a miss
/// takes the write lock, or explicitly via [`purge_expired`](Self::purge_expired).
pub struct DescriptorCache {
    ttl: Duration,
    epoch: Instant,
    entries: RwLock<HashMap<TypeName, Arc<CacheEntry>>>,
}

impl DescriptorCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            epoch: Instant::now(),
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn now(&self) -> u64 {
        u64::try_from(self.epoch.elapsed().as_nanos()).unwrap_or(u64::MAX)
    }

    fn is_expired(&self, entry: &CacheEntry, now: u64) -> bool {
        let idle = now.saturating_sub(entry.last_access.load(Ordering::Relaxed));
        Duration::from_nanos(idle) >= self.ttl
    }

    /// Return the cached descriptors of `type_name`, computing them on a miss.
    ///
    /// Concurrent misses may both compute; the first inserted result is kept.
    pub fn get_or_compute<F>(
        &self,
        type_name: &str,
        compute: F,
    ) -> MapViewResult<Arc<TypeDescriptors>>
    where
        F: FnOnce() -> MapViewResult<TypeDescriptors>,
    {
        let now = self.now();
        if let Some(entry) = self.entries.read().get(type_name) {
            if !self.is_expired(entry, now) {
                entry.last_access.store(now, Ordering::Relaxed);
                return Ok(entry.descriptors.clone());
            }
        }

        debug!(type_name, "descriptor cache miss");
        let descriptors = Arc::new(compute()?);

        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, entry| !self.is_expired(entry, now));
        let evicted = before - entries.len();
        if evicted > 0 {
            debug!(evicted, "evicted expired descriptors");
        }
        let entry = entries
            .entry(TypeName::new(type_name))
            .or_insert_with(|| {
                Arc::new(CacheEntry {
                    descriptors,
                    last_access: AtomicU64::new(now),
                })
            });
        entry.last_access.store(now, Ordering::Relaxed);
        Ok(entry.descriptors.clone())
    }

    /// Drop every expired entry. Returns the number removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.now();
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, entry| !self.is_expired(entry, now));
        before - entries.len()
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.entries.read().contains_key(type_name)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

impl std::fmt::Debug for DescriptorCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DescriptorCache")
            .field("ttl", &self.ttl)
            .field("entries", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AttributeDef, InterfaceDef};
    use std::sync::atomic::AtomicUsize;
    use std::sync::Barrier;
    use std::thread;

    fn registry() -> TypeRegistry {
        let registry = TypeRegistry::new();
        registry.register_interface(
            InterfaceDef::new("Entity")
                .attribute(AttributeDef::new("id", TypeRef::Str).key("__id"))
                .attribute(AttributeDef::new("note", TypeRef::Int)),
        );
        registry.register_interface(
            InterfaceDef::new("Note")
                .extends("Entity")
                .attribute(AttributeDef::new("note", TypeRef::Str))
                .attribute(AttributeDef::new("tags", TypeRef::list(TypeRef::Str))),
        );
        registry
    }

    #[test]
    fn test_introspect_merges_supertypes() {
        let registry = registry();
        let descriptors = introspect(&registry, "Note").unwrap();

        assert_eq!(descriptors.len(), 3);
        assert_eq!(descriptors.get("id").unwrap().map_key, "__id");
        assert_eq!(descriptors.by_map_key("__id").unwrap().attribute_name, "id");
        assert_eq!(descriptors.get("id").unwrap().declared_in.as_str(), "Entity");
        // nearest declaration wins
        assert_eq!(descriptors.get("note").unwrap().declared_type, TypeRef::Str);
        assert_eq!(
            descriptors.get("tags").unwrap().element_type,
            Some(TypeRef::Str)
        );
        assert_eq!(descriptors.map_key("missing"), "missing");
    }

    #[test]
    fn test_introspect_unknown_supertype() {
        let registry = TypeRegistry::new();
        registry.register_interface(InterfaceDef::new("Orphan").extends("Missing"));
        assert_eq!(
            introspect(&registry, "Orphan").unwrap_err(),
            MapViewError::unknown_type("Missing")
        );
    }

    #[test]
    fn test_cache_hit_does_not_recompute() {
        let registry = registry();
        let cache = DescriptorCache::new(Duration::from_secs(60));
        let calls = AtomicUsize::new(0);
        let compute = || {
            calls.fetch_add(1, Ordering::SeqCst);
            introspect(&registry, "Note")
        };

        let first = cache.get_or_compute("Note", compute).unwrap();
        let second = cache
            .get_or_compute("Note", || {
                calls.fetch_add(1, Ordering::SeqCst);
                introspect(&registry, "Note")
            })
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert!(cache.contains("Note"));
    }

    #[test]
    fn test_zero_ttl_expires_immediately() {
        let registry = registry();
        let cache = DescriptorCache::new(Duration::ZERO);
        let calls = AtomicUsize::new(0);
        for _ in 0..3 {
            cache
                .get_or_compute("Note", || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    introspect(&registry, "Note")
                })
                .unwrap();
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(cache.purge_expired(), 1);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_failed_compute_is_not_cached() {
        let registry = TypeRegistry::new();
        let cache = DescriptorCache::new(Duration::from_secs(60));
        assert!(cache
            .get_or_compute("Missing", || introspect(&registry, "Missing"))
            .is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_hits_extend_entry_lifetime() {
        let registry = registry();
        let cache = DescriptorCache::new(Duration::from_millis(400));
        let calls = AtomicUsize::new(0);
        let lookup = || {
            cache
                .get_or_compute("Note", || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    introspect(&registry, "Note")
                })
                .unwrap()
        };

        lookup();
        for _ in 0..4 {
            thread::sleep(Duration::from_millis(150));
            lookup();
        }
        // 600ms have passed since the first insert, but never 400ms idle
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        thread::sleep(Duration::from_millis(500));
        lookup();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_concurrent_misses_converge() {
        let registry = registry();
        let cache = DescriptorCache::new(Duration::from_secs(60));
        let barrier = Barrier::new(8);

        let results: Vec<Arc<TypeDescriptors>> = thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    scope.spawn(|| {
                        barrier.wait();
                        cache
                            .get_or_compute("Note", || introspect(&registry, "Note"))
                            .unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let expected = introspect(&registry, "Note").unwrap();
        for descriptors in &results {
            assert_eq!(**descriptors, expected);
            assert!(Arc::ptr_eq(descriptors, &results[0]));
        }
        assert_eq!(cache.len(), 1);
    }
}
