//! # Reference Policies
//!
//! Each extension declares, once, how every reference type it owns must be
//! replayed into a refinement. Unmapped reference types default to
//! [`RefHandling::Drop`].

use crate::FeatureId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How one reference type is replayed into the refined model.
///
/// Modes are mutually exclusive and applied per edge instance:
/// - `Chain`: the refined reference targets the abstract source element
///   itself (encodes "this refines that" at the element level).
/// - `Equiv`: the refined reference targets the refined counterpart of the
///   abstract target when one exists in the same model unit; otherwise it
///   acts like `Copy`.
/// - `Copy`: the refined reference targets the exact node the abstract
///   reference did.
/// - `Drop`: the refined reference is left unset (the default when no
///   entry is given for a reference feature).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RefHandling {
    /// Target the exact same node the abstract edge targeted.
    Copy,
    /// Target the abstract source element itself.
    Chain,
    /// Target the concrete counterpart of the abstract target, falling
    /// back to `Copy` semantics across model units.
    Equiv,
    /// Leave the edge unset.
    Drop,
}

/// The per-extension mapping from reference feature to handling mode.
///
/// Populated once by [`ElementRefiner::populate_reference_policies`] and
/// cached for the refiner's lifetime.
///
/// [`ElementRefiner`]: crate::refiner::ElementRefiner
#[derive(Debug, Clone, Default)]
pub struct PolicyTable {
    entries: BTreeMap<FeatureId, RefHandling>,
}

impl PolicyTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Map a reference feature to a handling mode, replacing any previous
    /// entry for it.
    pub fn insert(&mut self, feature: FeatureId, handling: RefHandling) {
        self.entries.insert(feature, handling);
    }

    /// The handling for a reference feature; [`RefHandling::Drop`] when
    /// unmapped.
    #[must_use]
    pub fn handling(&self, feature: FeatureId) -> RefHandling {
        self.entries
            .get(&feature)
            .copied()
            .unwrap_or(RefHandling::Drop)
    }

    /// Iterate the mapped entries in feature order.
    pub fn iter(&self) -> impl Iterator<Item = (FeatureId, RefHandling)> + '_ {
        self.entries.iter().map(|(f, h)| (*f, *h))
    }

    /// Number of mapped entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// =============================================================================
// TESTS
// =============================================================================
