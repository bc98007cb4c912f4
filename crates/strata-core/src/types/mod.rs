//! # Core Type Definitions
//!
//! This module contains the shared vocabulary of the Strata engine:
//! - Graph and metamodel identifiers (`NodeId`, `TypeId`, `FeatureId`)
//! - Namespace and resource addressing (`NamespaceUri`, `ResourcePath`, `ModelUri`)
//! - Attribute values (`AttrValue`)
//! - Error types (`StrataError`)
//!
//! ## Determinism Guarantees
//!
//! All identifier types in this module:
//! - Are plain `u64` newtypes allocated from saturating counters
//! - Implement `Ord` for deterministic ordering in `BTreeMap`/`BTreeSet`

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// GRAPH & METAMODEL IDENTIFIERS
// =============================================================================

/// Unique identifier for a node in the object graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u64);

/// Unique identifier for a node type declared in a [`Metamodel`].
///
/// [`Metamodel`]: crate::metamodel::Metamodel
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TypeId(pub u64);

/// Unique identifier for a feature (attribute, containment, or reference)
/// declared in a [`Metamodel`].
///
/// [`Metamodel`]: crate::metamodel::Metamodel
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FeatureId(pub u64);

// =============================================================================
// NAMESPACES & ADDRESSES
// =============================================================================

/// Identifier of the namespace (extension) owning a family of node types.
///
/// One refiner instance is registered per namespace; equivalence resolution
/// delegates across namespaces through the [`RefinerRegistry`].
///
/// [`RefinerRegistry`]: crate::registry::RefinerRegistry
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NamespaceUri(pub String);

impl NamespaceUri {
    /// Create a namespace identifier from a string.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the namespace identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NamespaceUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Location of a resource (a model unit) within the store.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResourcePath(pub String);

impl ResourcePath {
    /// Create a resource path from a string.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the resource path as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A global address: resource location plus an optional in-resource fragment.
///
/// The fragment is the node's stable identifier when one is set, otherwise a
/// structural path (`/`, `/1`, `//@events.0/@guards.2`). A `ModelUri`
/// identifies a node without requiring it to be loaded; unresolved reference
/// placeholders carry one.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ModelUri {
    resource: ResourcePath,
    fragment: Option<String>,
}

impl ModelUri {
    /// Address of a whole resource (no fragment).
    #[must_use]
    pub fn resource(path: ResourcePath) -> Self {
        Self {
            resource: path,
            fragment: None,
        }
    }

    /// Address of a node within a resource.
    #[must_use]
    pub fn in_resource(path: ResourcePath, fragment: impl Into<String>) -> Self {
        Self {
            resource: path,
            fragment: Some(fragment.into()),
        }
    }

    /// The resource part of the address.
    #[must_use]
    pub fn resource_path(&self) -> &ResourcePath {
        &self.resource
    }

    /// The fragment part of the address, if any.
    #[must_use]
    pub fn fragment(&self) -> Option<&str> {
        self.fragment.as_deref()
    }

    /// Return this address with its fragment replaced.
    ///
    /// Used when rebasing a fragment onto another resource location, e.g.
    /// anchoring a rewritten stable identifier to the concrete resource.
    #[must_use]
    pub fn with_fragment(&self, fragment: impl Into<String>) -> Self {
        Self {
            resource: self.resource.clone(),
            fragment: Some(fragment.into()),
        }
    }

    /// Whether two addresses point into the same resource.
    #[must_use]
    pub fn same_resource(&self, other: &Self) -> bool {
        self.resource == other.resource
    }
}

impl fmt::Display for ModelUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.fragment {
            Some(frag) => write!(f, "{}#{}", self.resource, frag),
            None => f.write_str(self.resource.as_str()),
        }
    }
}

// =============================================================================
// ATTRIBUTE VALUES
// =============================================================================

/// Value of a node attribute.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AttrValue {
    /// Textual value (names, predicates, comments).
    Text(String),
    /// Integer value.
    Int(i64),
    /// Boolean value.
    Bool(bool),
}

impl AttrValue {
    /// Create a textual attribute value.
    #[must_use]
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    /// Get the value as a string slice, if textual.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

// =============================================================================
// ERRORS
// =============================================================================

/// Errors produced by the Strata engine.
///
/// Resolution misses are never errors (refinement treats under-resolution
/// as a normal outcome); these variants cover malformed store operations
/// and detached inputs only.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StrataError {
    /// The requested node does not exist in the store.
    #[error("Node not found: {0:?}")]
    NodeNotFound(NodeId),

    /// The requested type is not declared in the metamodel.
    #[error("Type not found: {0:?}")]
    TypeNotFound(TypeId),

    /// The requested feature is not declared in the metamodel.
    #[error("Feature not found: {0:?}")]
    FeatureNotFound(FeatureId),

    /// The requested resource does not exist in the store.
    #[error("Resource not found: {0}")]
    ResourceNotFound(ResourcePath),

    /// A resource with this path already exists in the store.
    #[error("Resource already exists: {0}")]
    ResourceExists(ResourcePath),

    /// The element is not contained in any resource, so no global address
    /// can be computed for it.
    #[error("Element is not contained in a resource: {0:?}")]
    NotInResource(NodeId),

    /// The feature exists but is not of the kind the operation requires.
    #[error("Feature {feature:?} is not a {expected} feature")]
    FeatureKindMismatch {
        /// The offending feature.
        feature: FeatureId,
        /// The kind the operation expected ("attribute", "containment",
        /// "reference").
        expected: &'static str,
    },

    /// The feature does not apply to nodes of the given type.
    #[error("Feature {feature:?} does not apply to nodes of type {node_type:?}")]
    FeatureNotApplicable {
        /// The offending feature.
        feature: FeatureId,
        /// The type of the node the feature was used on.
        node_type: TypeId,
    },

    /// Single-valued operation on a many feature, or vice versa.
    #[error("Cardinality mismatch on feature {feature:?}")]
    CardinalityMismatch {
        /// The offending feature.
        feature: FeatureId,
    },
}

// =============================================================================
// TESTS
// =============================================================================
