//! Interface lattice reduction.
//!
//! Given every interface a view implements, find the most specific one: the
//! members that no other member specializes.

use crate::error::{MapViewError, MapViewResult};
use crate::registry::TypeRegistry;
use crate::types::TypeName;

/// Interfaces in `interfaces` not specialized by any other member, with
/// `excluded` removed first. Input order is preserved.
pub fn maximal_interfaces(
    registry: &TypeRegistry,
    interfaces: &[TypeName],
    excluded: &[TypeName],
) -> Vec<TypeName> {
    let mut remaining: Vec<TypeName> = Vec::with_capacity(interfaces.len());
    for name in interfaces {
        if !excluded.contains(name) && !remaining.contains(name) {
            remaining.push(name.clone());
        }
    }

    loop {
        let before = remaining.len();
        let snapshot = remaining.clone();
        remaining.retain(|candidate| {
            !snapshot.iter().any(|other| {
                other != candidate && registry.is_subtype(other.as_str(), candidate.as_str())
            })
        });
        if remaining.len() == before {
            return remaining;
        }
    }
}

/// The single most specific interface, or [`MapViewError::AmbiguousInterface`]
/// when zero or several remain.
pub fn reduce(
    registry: &TypeRegistry,
    interfaces: &[TypeName],
    excluded: &[TypeName],
) -> MapViewResult<TypeName> {
    let mut maximal = maximal_interfaces(registry, interfaces, excluded);
    if maximal.len() == 1 {
        return Ok(maximal.remove(0));
    }
    Err(MapViewError::ambiguous(
        maximal.iter().map(|name| name.to_string()).collect(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::InterfaceDef;

    fn registry() -> TypeRegistry {
        let registry = TypeRegistry::new();
        registry.register_interface(InterfaceDef::new("A"));
        registry.register_interface(InterfaceDef::new("B").extends("A"));
        registry.register_interface(InterfaceDef::new("C").extends("A"));
        registry.register_interface(InterfaceDef::new("D").extends("B").extends("C"));
        registry.register_interface(InterfaceDef::new("E"));
        registry.register_interface(InterfaceDef::new("F").extends("B").extends("E"));
        registry.register_interface(InterfaceDef::new("G"));
        registry.register_interface(InterfaceDef::new("H").extends("G"));
        registry
    }

    fn names(names: &[&str]) -> Vec<TypeName> {
        names.iter().map(|n| TypeName::new(n)).collect()
    }

    #[test]
    fn test_diamond_reduces_to_bottom() {
        let registry = registry();
        let result = reduce(&registry, &names(&["C", "B", "D", "A"]), &[]).unwrap();
        assert_eq!(result.as_str(), "D");
    }

    #[test]
    fn test_multiple_parents_reduce_to_child() {
        let registry = registry();
        let result = reduce(&registry, &names(&["F", "B", "E", "A"]), &[]).unwrap();
        assert_eq!(result.as_str(), "F");
    }

    #[test]
    fn test_disjoint_branches_are_ambiguous() {
        let registry = registry();
        let err = reduce(&registry, &names(&["A", "F", "B", "E", "H", "G"]), &[]).unwrap_err();
        assert_eq!(err, MapViewError::ambiguous(vec!["F".into(), "H".into()]));
    }

    #[test]
    fn test_excluded_interfaces_are_ignored() {
        let registry = registry();
        let result = reduce(
            &registry,
            &names(&["F", "B", "E", "A", "G"]),
            &names(&["G"]),
        )
        .unwrap();
        assert_eq!(result.as_str(), "F");
    }

    #[test]
    fn test_empty_input_is_ambiguous() {
        let registry = registry();
        assert_eq!(
            reduce(&registry, &[], &[]).unwrap_err(),
            MapViewError::ambiguous(Vec::new())
        );
    }
}
