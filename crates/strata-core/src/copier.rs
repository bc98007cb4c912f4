//! # Copy Engine
//!
//! Deep structural copy of a node subtree: type, stable identifier,
//! attributes, and the full containment hierarchy. Reference edges are
//! deliberately left unset; the reference rewriter replays them
//! afterwards, per policy.
//!
//! The copy produces an explicit two-way mapping between abstract and
//! concrete nodes, filled during the single copy pass, so the reverse
//! direction never requires scanning a map by value.

use crate::model::ModelStore;
use crate::{NodeId, StrataError};
use std::collections::BTreeMap;

/// The bijective abstract-to-concrete node mapping built by one deep copy.
///
/// Scoped to one refine operation and discarded after.
#[derive(Debug, Clone, Default)]
pub struct Copier {
    forward: BTreeMap<NodeId, NodeId>,
    reverse: BTreeMap<NodeId, NodeId>,
}

impl Copier {
    /// Deep-copy the subtree rooted at `abstract_root`.
    ///
    /// Returns the (detached, resource-less) concrete root together with
    /// the mapping covering every node visited.
    pub fn copy(
        store: &mut ModelStore,
        abstract_root: NodeId,
    ) -> Result<(NodeId, Self), StrataError> {
        let mut copier = Self::default();
        let concrete_root = copier.copy_node(store, abstract_root)?;
        Ok((concrete_root, copier))
    }

    fn copy_node(&mut self, store: &mut ModelStore, node: NodeId) -> Result<NodeId, StrataError> {
        let type_id = store
            .type_of(node)
            .ok_or(StrataError::NodeNotFound(node))?;
        let stable_id = store.stable_id(node).map(str::to_owned);
        let attrs: Vec<_> = store
            .attributes(node)
            .map(|(feature, value)| (feature, value.clone()))
            .collect();
        let slots = store.containments(node);

        let copy = store.create_node(type_id)?;
        if let Some(id) = stable_id {
            store.set_stable_id(copy, id)?;
        }
        for (feature, value) in attrs {
            store.set_attribute(copy, feature, value)?;
        }
        for (feature, children) in slots {
            let many = store
                .feature(feature)
                .map(|decl| decl.many)
                .ok_or(StrataError::FeatureNotFound(feature))?;
            for child in children {
                let child_copy = self.copy_node(store, child)?;
                if many {
                    store.add_child(copy, feature, child_copy)?;
                } else {
                    store.set_child(copy, feature, child_copy)?;
                }
            }
        }

        self.forward.insert(node, copy);
        self.reverse.insert(copy, node);
        Ok(copy)
    }

    /// The concrete copy of an abstract node.
    #[must_use]
    pub fn concrete(&self, abstract_node: NodeId) -> Option<NodeId> {
        self.forward.get(&abstract_node).copied()
    }

    /// The abstract source of a concrete node (reverse lookup).
    #[must_use]
    pub fn abstract_source(&self, concrete_node: NodeId) -> Option<NodeId> {
        self.reverse.get(&concrete_node).copied()
    }

    /// Whether an abstract node was covered by this copy.
    #[must_use]
    pub fn contains_abstract(&self, abstract_node: NodeId) -> bool {
        self.forward.contains_key(&abstract_node)
    }

    /// Number of copied nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.forward.len()
    }

    /// Whether the mapping is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    /// Iterate (abstract, concrete) pairs in abstract node order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
        self.forward.iter().map(|(a, c)| (*a, *c))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metamodel::Metamodel;
    use crate::model::RefValue;
    use crate::{AttrValue, FeatureId, NamespaceUri, TypeId};

    struct Fixture {
        store: ModelStore,
        machine: TypeId,
        event: TypeId,
        name: FeatureId,
        events: FeatureId,
        refines: FeatureId,
    }

    fn fixture() -> Fixture {
        let ns = NamespaceUri::new("http://example.org/test");
        let mut mm = Metamodel::new();
        let machine = mm.add_component_type("Machine", ns.clone(), &[]);
        let event = mm.add_type("Event", ns, &[]);
        let name = mm.add_attribute(machine, "name");
        mm.add_attribute(event, "name");
        let events = mm.add_containment(machine, "events", event, true);
        let refines = mm.add_reference(event, "refines", event, false);
        Fixture {
            store: ModelStore::new(mm),
            machine,
            event,
            name,
            events,
            refines,
        }
    }

    #[test]
    fn copy_preserves_shape_and_attributes() {
        let mut f = fixture();
        let m = f.store.create_node(f.machine).expect("create");
        f.store
            .set_attribute(m, f.name, AttrValue::text("m0"))
            .expect("set");
        let e1 = f.store.create_node(f.event).expect("create");
        let e2 = f.store.create_node(f.event).expect("create");
        f.store.add_child(m, f.events, e1).expect("add");
        f.store.add_child(m, f.events, e2).expect("add");
        f.store.set_stable_id(e1, "sm::m0.e1").expect("id");

        let (copy, copier) = Copier::copy(&mut f.store, m).expect("copy");

        assert_ne!(copy, m);
        assert_eq!(f.store.type_of(copy), Some(f.machine));
        assert_eq!(f.store.attribute(copy, f.name), Some(&AttrValue::text("m0")));
        assert_eq!(f.store.children(copy, f.events).len(), 2);
        let copied_e1 = copier.concrete(e1).expect("mapped");
        assert_eq!(f.store.stable_id(copied_e1), Some("sm::m0.e1"));
        assert_eq!(copier.len(), 3);
    }

    #[test]
    fn copy_does_not_copy_references() {
        let mut f = fixture();
        let m = f.store.create_node(f.machine).expect("create");
        let e1 = f.store.create_node(f.event).expect("create");
        let e2 = f.store.create_node(f.event).expect("create");
        f.store.add_child(m, f.events, e1).expect("add");
        f.store.add_child(m, f.events, e2).expect("add");
        f.store
            .set_reference(e1, f.refines, RefValue::Resolved(e2))
            .expect("ref");

        let (_, copier) = Copier::copy(&mut f.store, m).expect("copy");
        let copied_e1 = copier.concrete(e1).expect("mapped");

        assert!(f.store.single_reference(copied_e1, f.refines).is_none());
    }

    #[test]
    fn mapping_is_bijective() {
        let mut f = fixture();
        let m = f.store.create_node(f.machine).expect("create");
        let e = f.store.create_node(f.event).expect("create");
        f.store.add_child(m, f.events, e).expect("add");

        let (copy, copier) = Copier::copy(&mut f.store, m).expect("copy");

        assert!(!copier.is_empty());
        for (abstract_node, concrete_node) in copier.iter() {
            assert_eq!(copier.abstract_source(concrete_node), Some(abstract_node));
            assert_eq!(copier.concrete(abstract_node), Some(concrete_node));
        }
        assert_eq!(copier.abstract_source(copy), Some(m));
        assert!(copier.contains_abstract(e));
        assert!(!copier.contains_abstract(copy));
    }

    #[test]
    fn copied_root_is_detached() {
        let mut f = fixture();
        let m = f.store.create_node(f.machine).expect("create");
        let (copy, _) = Copier::copy(&mut f.store, m).expect("copy");
        assert_eq!(f.store.parent(copy), None);
        assert_eq!(f.store.resource_of(copy), None);
    }
}
