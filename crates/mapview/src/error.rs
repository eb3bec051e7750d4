//! Error types for mapview operations.

use thiserror::Error;

/// Result type alias for mapview operations.
pub type MapViewResult<T> = Result<T, MapViewError>;

/// Errors that can occur while building, reading or writing a view.
///
/// Every variant is a configuration or usage error surfaced synchronously at
/// the offending call; nothing is retried.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MapViewError {
    /// A mutator was invoked on an immutable view.
    #[error("cannot {operation} '{attribute}' on immutable view of {type_name}")]
    ImmutabilityViolation {
        /// The view's declared type.
        type_name: String,
        /// The attribute the caller tried to change.
        attribute: String,
        /// The rejected operation (`set`, `addTo`, `removeFrom`).
        operation: &'static str,
    },

    /// A value does not have, and cannot be coerced to, the declared type.
    #[error("type mismatch at {location}: expected {expected}, found {found}")]
    TypeMismatch {
        /// Where the mismatch occurred (`Type.attribute`).
        location: String,
        /// The declared type.
        expected: String,
        /// The type actually found.
        found: String,
    },

    /// No enum constant maps to the stored value.
    #[error("no constant of enum {enum_type} maps to '{value}' via '{method}'")]
    EnumResolution {
        /// The enum type name.
        enum_type: String,
        /// The stored value, rendered.
        value: String,
        /// The mapping method used for resolution.
        method: String,
    },

    /// An embedded attribute or an optional's inner type is not a view interface.
    #[error("attribute '{attribute}' of {type_name}: {reason}")]
    CompositeType {
        /// The enclosing type.
        type_name: String,
        /// The offending attribute.
        attribute: String,
        /// What is wrong with its declaration.
        reason: String,
    },

    /// Interface lattice reduction left more (or fewer) than one interface.
    #[error("expected exactly one interface, found {candidates:?}")]
    AmbiguousInterface {
        /// The remaining maximal interfaces.
        candidates: Vec<String>,
    },

    /// A target object could not be constructed.
    #[error("cannot construct {type_name}: {reason}")]
    Construction {
        /// The target type.
        type_name: String,
        /// What prevented construction.
        reason: String,
    },

    /// Nested view construction went deeper than the nesting limit.
    #[error("cyclic structure at {location}: nesting exceeds {depth} levels")]
    CyclicStructure {
        /// Where the limit was hit.
        location: String,
        /// The nesting limit.
        depth: usize,
    },

    /// The type is not registered in the context.
    #[error("unknown type: {0}")]
    UnknownType(String),

    /// The type declares no such accessor.
    #[error("{type_name} has no member '{member}'")]
    NoSuchMember {
        /// The type that was searched.
        type_name: String,
        /// The requested member.
        member: String,
    },
}

impl MapViewError {
    /// Create an immutability violation error.
    #[inline]
    pub fn immutable(
        type_name: impl Into<String>,
        attribute: impl Into<String>,
        operation: &'static str,
    ) -> Self {
        MapViewError::ImmutabilityViolation {
            type_name: type_name.into(),
            attribute: attribute.into(),
            operation,
        }
    }

    /// Create a type mismatch error.
    #[inline]
    pub fn type_mismatch(
        location: impl Into<String>,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        MapViewError::TypeMismatch {
            location: location.into(),
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Create an enum resolution error.
    #[inline]
    pub fn enum_resolution(
        enum_type: impl Into<String>,
        value: impl Into<String>,
        method: impl Into<String>,
    ) -> Self {
        MapViewError::EnumResolution {
            enum_type: enum_type.into(),
            value: value.into(),
            method: method.into(),
        }
    }

    /// Create a composite type error.
    #[inline]
    pub fn composite(
        type_name: impl Into<String>,
        attribute: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        MapViewError::CompositeType {
            type_name: type_name.into(),
            attribute: attribute.into(),
            reason: reason.into(),
        }
    }

    /// Create an ambiguous interface error.
    #[inline]
    pub fn ambiguous(candidates: Vec<String>) -> Self {
        MapViewError::AmbiguousInterface { candidates }
    }

    /// Create a construction error.
    #[inline]
    pub fn construction(type_name: impl Into<String>, reason: impl Into<String>) -> Self {
        MapViewError::Construction {
            type_name: type_name.into(),
            reason: reason.into(),
        }
    }

    /// Create a cyclic structure error.
    #[inline]
    pub fn cyclic(location: impl Into<String>, depth: usize) -> Self {
        MapViewError::CyclicStructure {
            location: location.into(),
            depth,
        }
    }

    /// Create an unknown type error.
    #[inline]
    pub fn unknown_type(name: impl Into<String>) -> Self {
        MapViewError::UnknownType(name.into())
    }

    /// Create a no such member error.
    #[inline]
    pub fn no_such_member(type_name: impl Into<String>, member: impl Into<String>) -> Self {
        MapViewError::NoSuchMember {
            type_name: type_name.into(),
            member: member.into(),
        }
    }
}
