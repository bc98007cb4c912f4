//! # Equivalence Resolver
//!
//! Finds, within a concrete container, the node that corresponds to a
//! given abstract node: same type and same name under a recursively
//! equivalent parent, or failing that, same type with a `refines`
//! back-reference to the abstract node.
//!
//! Equivalence chains may cross namespace boundaries (the parent of an
//! abstract node can belong to another extension), so the resolver
//! delegates through the injected [`RefinerRegistry`] to whichever refiner
//! owns the parent's namespace. An unregistered namespace silently ends
//! the chain.

use crate::model::ModelStore;
use crate::registry::RefinerRegistry;
use crate::{FeatureId, NodeId};

/// Bound on registry-mediated recursion while matching ancestor chains.
///
/// The recursion climbs containment parents, so its depth is bounded by
/// tree height in well-formed models; the explicit bound terminates the
/// walk if a malformed model introduces a cycle.
pub const MAX_EQUIVALENCE_DEPTH: usize = 64;

/// Shared read-only context for one equivalence resolution.
#[derive(Clone, Copy)]
pub struct EquivContext<'a> {
    /// The store holding both the abstract and the concrete elements.
    pub store: &'a ModelStore,
    /// The registry used for cross-namespace delegation.
    pub registry: &'a RefinerRegistry,
    depth: usize,
}

impl<'a> EquivContext<'a> {
    /// Create a context at recursion depth zero.
    #[must_use]
    pub fn new(store: &'a ModelStore, registry: &'a RefinerRegistry) -> Self {
        Self {
            store,
            registry,
            depth: 0,
        }
    }

    /// One level deeper, or `None` once the bound is reached.
    fn deeper(self) -> Option<Self> {
        if self.depth >= MAX_EQUIVALENCE_DEPTH {
            return None;
        }
        Some(Self {
            depth: self.depth.saturating_add(1),
            ..self
        })
    }
}

/// Default equivalence algorithm.
///
/// Candidates are the container itself plus either the contents of
/// `scope` (one containment feature of the container) or, when no scope is
/// given, every descendant of the container. The first qualifying
/// candidate in content order wins; `None` when nothing qualifies.
#[must_use]
pub fn find_equivalent(
    cx: EquivContext<'_>,
    concrete_container: NodeId,
    scope: Option<FeatureId>,
    abstract_node: NodeId,
) -> Option<NodeId> {
    let store = cx.store;
    let mm = store.metamodel();
    let abstract_type = store.type_of(abstract_node)?;
    let container_type = store.type_of(concrete_container)?;

    // A component is its own equivalent: refining a component produces the
    // container we are searching in.
    if mm.type_decl(abstract_type)?.is_component && container_type == abstract_type {
        return Some(concrete_container);
    }

    let mut candidates = vec![concrete_container];
    match scope {
        Some(feature) => {
            candidates.extend_from_slice(store.children(concrete_container, feature));
        }
        None => candidates.extend(store.descendants(concrete_container)),
    }

    let name_feature = mm.feature_named(abstract_type, "name").map(|decl| decl.id);
    let name = name_feature.and_then(|f| store.attribute(abstract_node, f)).cloned();
    let refines_feature = mm
        .feature_named(abstract_type, "refines")
        .filter(|decl| decl.is_reference() && !decl.many)
        .map(|decl| decl.id);

    // The equivalent parent is candidate-independent; computed lazily, once.
    let mut equivalent_parent: Option<Option<Option<NodeId>>> = None;

    for candidate in candidates {
        if store.type_of(candidate) != Some(abstract_type) {
            continue;
        }

        // Same name, under a recursively equivalent parent.
        if let (Some(feature), Some(name)) = (name_feature, name.as_ref()) {
            if store.attribute(candidate, feature) == Some(name) {
                let resolved = match &equivalent_parent {
                    Some(resolved) => *resolved,
                    None => {
                        let resolved =
                            equivalent_container(cx, concrete_container, abstract_node);
                        equivalent_parent = Some(resolved);
                        resolved
                    }
                };
                // None = delegation impossible (no parent, no refiner for its
                // namespace, depth exceeded): the name match is skipped, the
                // refines fallback below still applies.
                if let Some(parent) = resolved {
                    if store.parent(candidate).map(|(p, _)| p) == parent {
                        return Some(candidate);
                    }
                }
            }
        }

        // Same type, refines the abstract node directly.
        if let Some(feature) = refines_feature {
            if let Some(value) = store.single_reference(candidate, feature) {
                if store.resolve(value) == Some(abstract_node) {
                    return Some(candidate);
                }
            }
        }
    }
    None
}

/// Delegate equivalence of the abstract node's parent to the refiner owning
/// the parent's namespace.
///
/// Outer `None` means the delegation could not run; `Some(result)` is the
/// delegated refiner's verdict (which may itself be `None`, matching only
/// parentless candidates).
fn equivalent_container(
    cx: EquivContext<'_>,
    concrete_container: NodeId,
    abstract_node: NodeId,
) -> Option<Option<NodeId>> {
    let store = cx.store;
    let (abstract_parent, _) = store.parent(abstract_node)?;
    let parent_type = store.type_of(abstract_parent)?;
    let namespace = store.metamodel().namespace_of(parent_type)?;
    let refiner = cx.registry.lookup(namespace)?;
    let deeper = cx.deeper()?;
    Some(refiner.find_equivalent_in(deeper, concrete_container, None, abstract_parent))
}

// =============================================================================
// TESTS
// =============================================================================
