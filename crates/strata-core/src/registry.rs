//! # Refiner Registry
//!
//! Maps each namespace to the refiner instance responsible for its node
//! types. The registry is an explicit, injected collaborator: equivalence
//! resolution receives it as a parameter and delegates through it when an
//! equivalence chain crosses namespace boundaries.
//!
//! A missing entry means "no equivalence possible for that namespace",
//! never an error. Populating the registry is the embedder's concern.

use crate::refiner::Refiner;
use crate::NamespaceUri;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Registry of refiner instances, keyed by the namespace owning their
/// node types.
#[derive(Debug, Clone, Default)]
pub struct RefinerRegistry {
    refiners: BTreeMap<NamespaceUri, Arc<Refiner>>,
}

impl RefinerRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the refiner for a namespace, replacing any previous one.
    pub fn register(&mut self, namespace: NamespaceUri, refiner: Arc<Refiner>) {
        self.refiners.insert(namespace, refiner);
    }

    /// The refiner responsible for a namespace, if one is registered.
    #[must_use]
    pub fn lookup(&self, namespace: &NamespaceUri) -> Option<&Arc<Refiner>> {
        self.refiners.get(namespace)
    }

    /// Number of registered refiners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.refiners.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.refiners.is_empty()
    }
}

// =============================================================================
// TESTS
// =============================================================================
