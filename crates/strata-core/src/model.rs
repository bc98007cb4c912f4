//! # Object-Graph Store
//!
//! The mutable typed object graph the refinement engine operates on: an
//! arena of nodes with parent/child containment, named attributes, and
//! typed cross-references that may be live links or unresolved
//! placeholders.
//!
//! All storage uses `BTreeMap` for deterministic ordering. The store owns
//! the [`Metamodel`] so every mutation is checked against the declared
//! feature shapes.

use crate::metamodel::{FeatureDecl, FeatureKind, Metamodel};
use crate::{AttrValue, FeatureId, ModelUri, NodeId, ResourcePath, StrataError, TypeId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// REFERENCE VALUES
// =============================================================================

/// One target of a cross-reference edge.
///
/// A live link and an unresolved placeholder are never stored
/// interchangeably: a placeholder carries only the target's declared type
/// and global address, and is resolved against the store as an explicit
/// step ([`ModelStore::resolve`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RefValue {
    /// A live link to a node in the store.
    Resolved(NodeId),
    /// An unresolved placeholder for a possibly-unloaded node.
    Proxy {
        /// The target's declared type.
        type_id: TypeId,
        /// The target's global address.
        uri: ModelUri,
    },
}

impl RefValue {
    /// Construct a placeholder from a type and an address.
    #[must_use]
    pub fn proxy(type_id: TypeId, uri: ModelUri) -> Self {
        Self::Proxy { type_id, uri }
    }

    /// The placeholder's address, if this value is unresolved.
    #[must_use]
    pub fn proxy_uri(&self) -> Option<&ModelUri> {
        match self {
            Self::Proxy { uri, .. } => Some(uri),
            Self::Resolved(_) => None,
        }
    }

    /// The placeholder's declared type, if this value is unresolved.
    #[must_use]
    pub fn proxy_type(&self) -> Option<TypeId> {
        match self {
            Self::Proxy { type_id, .. } => Some(*type_id),
            Self::Resolved(_) => None,
        }
    }
}

// =============================================================================
// NODE STORAGE
// =============================================================================

#[derive(Debug, Clone)]
enum ChildSlot {
    Single(NodeId),
    Many(Vec<NodeId>),
}

#[derive(Debug, Clone)]
enum RefSlot {
    Single(RefValue),
    Many(Vec<RefValue>),
}

#[derive(Debug, Clone)]
struct NodeData {
    type_id: TypeId,
    stable_id: Option<String>,
    parent: Option<(NodeId, FeatureId)>,
    attrs: BTreeMap<FeatureId, AttrValue>,
    children: BTreeMap<FeatureId, ChildSlot>,
    refs: BTreeMap<FeatureId, RefSlot>,
}

impl NodeData {
    fn new(type_id: TypeId) -> Self {
        Self {
            type_id,
            stable_id: None,
            parent: None,
            attrs: BTreeMap::new(),
            children: BTreeMap::new(),
            refs: BTreeMap::new(),
        }
    }
}

// =============================================================================
// MODEL STORE
// =============================================================================

/// The object-graph store: nodes, resources, and the owned metamodel.
#[derive(Debug, Clone)]
pub struct ModelStore {
    metamodel: Metamodel,
    nodes: BTreeMap<NodeId, NodeData>,
    /// Resource path -> ordered root nodes.
    resources: BTreeMap<ResourcePath, Vec<NodeId>>,
    /// Reverse lookup: root node -> owning resource.
    root_resource: BTreeMap<NodeId, ResourcePath>,
    next_node_id: u64,
}

impl ModelStore {
    /// Create an empty store over the given metamodel.
    #[must_use]
    pub fn new(metamodel: Metamodel) -> Self {
        Self {
            metamodel,
            nodes: BTreeMap::new(),
            resources: BTreeMap::new(),
            root_resource: BTreeMap::new(),
            next_node_id: 0,
        }
    }

    /// The metamodel this store is typed against.
    #[must_use]
    pub fn metamodel(&self) -> &Metamodel {
        &self.metamodel
    }

    // -------------------------------------------------------------------------
    // Node lifecycle
    // -------------------------------------------------------------------------

    /// Create a detached node of the given type.
    pub fn create_node(&mut self, type_id: TypeId) -> Result<NodeId, StrataError> {
        if self.metamodel.type_decl(type_id).is_none() {
            return Err(StrataError::TypeNotFound(type_id));
        }
        let id = NodeId(self.next_node_id);
        self.next_node_id = self.next_node_id.saturating_add(1);
        self.nodes.insert(id, NodeData::new(type_id));
        Ok(id)
    }

    /// Whether the store contains a node.
    #[must_use]
    pub fn contains_node(&self, node: NodeId) -> bool {
        self.nodes.contains_key(&node)
    }

    /// The type of a node.
    #[must_use]
    pub fn type_of(&self, node: NodeId) -> Option<TypeId> {
        self.nodes.get(&node).map(|data| data.type_id)
    }

    /// A node's stable identifier, if one is set.
    #[must_use]
    pub fn stable_id(&self, node: NodeId) -> Option<&str> {
        self.nodes.get(&node).and_then(|data| data.stable_id.as_deref())
    }

    /// Set a node's stable identifier.
    pub fn set_stable_id(
        &mut self,
        node: NodeId,
        id: impl Into<String>,
    ) -> Result<(), StrataError> {
        let data = self.nodes.get_mut(&node).ok_or(StrataError::NodeNotFound(node))?;
        data.stable_id = Some(id.into());
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Attributes
    // -------------------------------------------------------------------------

    /// Read an attribute value.
    #[must_use]
    pub fn attribute(&self, node: NodeId, feature: FeatureId) -> Option<&AttrValue> {
        self.nodes.get(&node).and_then(|data| data.attrs.get(&feature))
    }

    /// Iterate a node's set attributes in feature order.
    pub fn attributes(
        &self,
        node: NodeId,
    ) -> impl Iterator<Item = (FeatureId, &AttrValue)> + '_ {
        self.nodes
            .get(&node)
            .into_iter()
            .flat_map(|data| data.attrs.iter().map(|(f, v)| (*f, v)))
    }

    /// Set an attribute value.
    pub fn set_attribute(
        &mut self,
        node: NodeId,
        feature: FeatureId,
        value: AttrValue,
    ) -> Result<(), StrataError> {
        self.check_feature(node, feature, "attribute")?;
        if let Some(data) = self.nodes.get_mut(&node) {
            data.attrs.insert(feature, value);
        }
        Ok(())
    }

    /// A node's `name` attribute, if its type declares one and it is set.
    #[must_use]
    pub fn name_of(&self, node: NodeId) -> Option<&str> {
        let ty = self.type_of(node)?;
        let feature = self.metamodel.feature_named(ty, "name")?.id;
        self.attribute(node, feature)?.as_text()
    }

    // -------------------------------------------------------------------------
    // Containment
    // -------------------------------------------------------------------------

    /// A node's containment parent and the feature holding it.
    #[must_use]
    pub fn parent(&self, node: NodeId) -> Option<(NodeId, FeatureId)> {
        self.nodes.get(&node).and_then(|data| data.parent)
    }

    /// Children held by one containment feature, in insertion order.
    #[must_use]
    pub fn children(&self, node: NodeId, feature: FeatureId) -> &[NodeId] {
        match self.nodes.get(&node).and_then(|data| data.children.get(&feature)) {
            Some(ChildSlot::Single(child)) => std::slice::from_ref(child),
            Some(ChildSlot::Many(children)) => children,
            None => &[],
        }
    }

    /// All containment slots of a node, in feature order.
    #[must_use]
    pub fn containments(&self, node: NodeId) -> Vec<(FeatureId, Vec<NodeId>)> {
        let Some(data) = self.nodes.get(&node) else {
            return Vec::new();
        };
        data.children
            .iter()
            .map(|(f, slot)| {
                let kids = match slot {
                    ChildSlot::Single(child) => vec![*child],
                    ChildSlot::Many(children) => children.clone(),
                };
                (*f, kids)
            })
            .collect()
    }

    /// Append a child to a multi-valued containment feature.
    ///
    /// A child that already has a parent is moved (detached first).
    pub fn add_child(
        &mut self,
        parent: NodeId,
        feature: FeatureId,
        child: NodeId,
    ) -> Result<(), StrataError> {
        let many = self.check_feature(parent, feature, "containment")?;
        if !many {
            return Err(StrataError::CardinalityMismatch { feature });
        }
        if !self.contains_node(child) {
            return Err(StrataError::NodeNotFound(child));
        }
        self.detach(child)?;
        if let Some(data) = self.nodes.get_mut(&parent) {
            match data.children.entry(feature).or_insert_with(|| ChildSlot::Many(Vec::new())) {
                ChildSlot::Many(children) => children.push(child),
                ChildSlot::Single(_) => return Err(StrataError::CardinalityMismatch { feature }),
            }
        }
        if let Some(data) = self.nodes.get_mut(&child) {
            data.parent = Some((parent, feature));
        }
        Ok(())
    }

    /// Set the child of a single-valued containment feature, replacing and
    /// detaching any previous occupant.
    pub fn set_child(
        &mut self,
        parent: NodeId,
        feature: FeatureId,
        child: NodeId,
    ) -> Result<(), StrataError> {
        let many = self.check_feature(parent, feature, "containment")?;
        if many {
            return Err(StrataError::CardinalityMismatch { feature });
        }
        if !self.contains_node(child) {
            return Err(StrataError::NodeNotFound(child));
        }
        let previous = match self.nodes.get(&parent).and_then(|d| d.children.get(&feature)) {
            Some(ChildSlot::Single(old)) => Some(*old),
            _ => None,
        };
        if let Some(old) = previous {
            self.detach(old)?;
        }
        self.detach(child)?;
        if let Some(data) = self.nodes.get_mut(&parent) {
            data.children.insert(feature, ChildSlot::Single(child));
        }
        if let Some(data) = self.nodes.get_mut(&child) {
            data.parent = Some((parent, feature));
        }
        Ok(())
    }

    /// Remove a node from its containing slot, matching cardinality: a
    /// multi-valued slot shrinks, a single-valued slot is unset.
    ///
    /// A node with no parent (a root, or already detached) is left alone.
    pub fn detach(&mut self, node: NodeId) -> Result<(), StrataError> {
        if !self.contains_node(node) {
            return Err(StrataError::NodeNotFound(node));
        }
        let Some((parent, feature)) = self.parent(node) else {
            return Ok(());
        };
        if let Some(data) = self.nodes.get_mut(&parent) {
            match data.children.get_mut(&feature) {
                Some(ChildSlot::Many(children)) => {
                    if let Some(pos) = children.iter().position(|c| *c == node) {
                        children.remove(pos);
                    }
                }
                Some(ChildSlot::Single(_)) => {
                    data.children.remove(&feature);
                }
                None => {}
            }
        }
        if let Some(data) = self.nodes.get_mut(&node) {
            data.parent = None;
        }
        Ok(())
    }

    /// All descendants of a node, pre-order, excluding the node itself.
    #[must_use]
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = self.all_children(node);
        stack.reverse();
        while let Some(current) = stack.pop() {
            out.push(current);
            let mut kids = self.all_children(current);
            kids.reverse();
            stack.append(&mut kids);
        }
        out
    }

    fn all_children(&self, node: NodeId) -> Vec<NodeId> {
        let Some(data) = self.nodes.get(&node) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        for slot in data.children.values() {
            match slot {
                ChildSlot::Single(child) => out.push(*child),
                ChildSlot::Many(children) => out.extend_from_slice(children),
            }
        }
        out
    }

    /// The nearest component-typed element, starting at the node itself.
    #[must_use]
    pub fn containing_component(&self, node: NodeId) -> Option<NodeId> {
        let mut current = node;
        loop {
            let ty = self.type_of(current)?;
            if self.metamodel.type_decl(ty)?.is_component {
                return Some(current);
            }
            current = self.parent(current)?.0;
        }
    }

    // -------------------------------------------------------------------------
    // References
    // -------------------------------------------------------------------------

    /// The value of a single-valued reference feature, if set.
    #[must_use]
    pub fn single_reference(&self, node: NodeId, feature: FeatureId) -> Option<&RefValue> {
        match self.nodes.get(&node)?.refs.get(&feature)? {
            RefSlot::Single(value) => Some(value),
            RefSlot::Many(_) => None,
        }
    }

    /// The values of a multi-valued reference feature, in insertion order.
    /// Empty when unset.
    #[must_use]
    pub fn reference_list(&self, node: NodeId, feature: FeatureId) -> &[RefValue] {
        match self.nodes.get(&node).and_then(|data| data.refs.get(&feature)) {
            Some(RefSlot::Single(value)) => std::slice::from_ref(value),
            Some(RefSlot::Many(values)) => values,
            None => &[],
        }
    }

    /// Set a single-valued reference.
    pub fn set_reference(
        &mut self,
        node: NodeId,
        feature: FeatureId,
        value: RefValue,
    ) -> Result<(), StrataError> {
        let many = self.check_feature(node, feature, "reference")?;
        if many {
            return Err(StrataError::CardinalityMismatch { feature });
        }
        if let Some(data) = self.nodes.get_mut(&node) {
            data.refs.insert(feature, RefSlot::Single(value));
        }
        Ok(())
    }

    /// Append to a multi-valued reference, preserving existing entries.
    pub fn push_reference(
        &mut self,
        node: NodeId,
        feature: FeatureId,
        value: RefValue,
    ) -> Result<(), StrataError> {
        let many = self.check_feature(node, feature, "reference")?;
        if !many {
            return Err(StrataError::CardinalityMismatch { feature });
        }
        if let Some(data) = self.nodes.get_mut(&node) {
            match data.refs.entry(feature).or_insert_with(|| RefSlot::Many(Vec::new())) {
                RefSlot::Many(values) => values.push(value),
                RefSlot::Single(_) => return Err(StrataError::CardinalityMismatch { feature }),
            }
        }
        Ok(())
    }

    /// Resolve a reference value to a live node, if possible.
    ///
    /// A live link resolves to itself (when the node still exists); a
    /// placeholder is resolved through [`ModelStore::resolve_uri`]. `None`
    /// means the target is not loaded, which is a normal outcome, not an
    /// error.
    #[must_use]
    pub fn resolve(&self, value: &RefValue) -> Option<NodeId> {
        match value {
            RefValue::Resolved(id) => self.contains_node(*id).then_some(*id),
            RefValue::Proxy { uri, .. } => self.resolve_uri(uri),
        }
    }

    // -------------------------------------------------------------------------
    // Resources & addresses
    // -------------------------------------------------------------------------

    /// Create an empty resource.
    pub fn create_resource(&mut self, path: ResourcePath) -> Result<(), StrataError> {
        if self.resources.contains_key(&path) {
            return Err(StrataError::ResourceExists(path));
        }
        self.resources.insert(path, Vec::new());
        Ok(())
    }

    /// Append a parentless node to a resource's root list.
    pub fn add_root(&mut self, path: &ResourcePath, node: NodeId) -> Result<(), StrataError> {
        if !self.contains_node(node) {
            return Err(StrataError::NodeNotFound(node));
        }
        let roots = self
            .resources
            .get_mut(path)
            .ok_or_else(|| StrataError::ResourceNotFound(path.clone()))?;
        roots.push(node);
        self.root_resource.insert(node, path.clone());
        Ok(())
    }

    /// The resource containing a node, walking containment to the root.
    #[must_use]
    pub fn resource_of(&self, node: NodeId) -> Option<&ResourcePath> {
        let mut current = node;
        while let Some((parent, _)) = self.parent(current) {
            current = parent;
        }
        self.root_resource.get(&current)
    }

    /// The global address of a node.
    ///
    /// The fragment is the stable identifier when set, otherwise a
    /// structural path from the resource root.
    pub fn uri_of(&self, node: NodeId) -> Result<ModelUri, StrataError> {
        if !self.contains_node(node) {
            return Err(StrataError::NodeNotFound(node));
        }
        let resource = self
            .resource_of(node)
            .cloned()
            .ok_or(StrataError::NotInResource(node))?;
        let fragment = self
            .fragment_of(node)
            .ok_or(StrataError::NotInResource(node))?;
        Ok(ModelUri::in_resource(resource, fragment))
    }

    fn fragment_of(&self, node: NodeId) -> Option<String> {
        if let Some(id) = self.stable_id(node) {
            return Some(id.to_owned());
        }
        let mut segments = Vec::new();
        let mut current = node;
        while let Some((parent, feature)) = self.parent(current) {
            let decl = self.metamodel.feature_decl(feature)?;
            if decl.many {
                let index = self
                    .children(parent, feature)
                    .iter()
                    .position(|c| *c == current)?;
                segments.push(format!("@{}.{}", decl.name, index));
            } else {
                segments.push(format!("@{}", decl.name));
            }
            current = parent;
        }
        let resource = self.root_resource.get(&current)?;
        let roots = self.resources.get(resource)?;
        let root_index = roots.iter().position(|r| *r == current)?;
        let mut fragment = String::from("/");
        if root_index > 0 {
            fragment.push_str(&root_index.to_string());
        }
        for segment in segments.iter().rev() {
            fragment.push('/');
            fragment.push_str(segment);
        }
        Some(fragment)
    }

    /// Resolve a global address back to a live node.
    ///
    /// Structural fragments are walked; any other fragment is matched
    /// against stable identifiers within the resource.
    #[must_use]
    pub fn resolve_uri(&self, uri: &ModelUri) -> Option<NodeId> {
        let roots = self.resources.get(uri.resource_path())?;
        let fragment = uri.fragment()?;
        if fragment.starts_with('/') {
            return self.resolve_structural(roots, fragment);
        }
        roots.iter().find_map(|root| {
            std::iter::once(*root)
                .chain(self.descendants(*root))
                .find(|n| self.stable_id(*n) == Some(fragment))
        })
    }

    fn resolve_structural(&self, roots: &[NodeId], fragment: &str) -> Option<NodeId> {
        let rest = fragment.strip_prefix('/')?;
        if rest.is_empty() {
            return roots.first().copied();
        }
        let mut parts = rest.split('/');
        let head = parts.next()?;
        let mut current = if head.is_empty() {
            *roots.first()?
        } else {
            *roots.get(head.parse::<usize>().ok()?)?
        };
        for part in parts {
            let segment = part.strip_prefix('@')?;
            let (feature_name, index) = match segment.split_once('.') {
                Some((name, idx)) => (name, Some(idx.parse::<usize>().ok()?)),
                None => (segment, None),
            };
            let ty = self.type_of(current)?;
            let decl = self.metamodel.feature_named(ty, feature_name)?;
            let kids = self.children(current, decl.id);
            current = match index {
                Some(i) => *kids.get(i)?,
                None => *kids.first()?,
            };
        }
        Some(current)
    }

    // -------------------------------------------------------------------------
    // Feature checking
    // -------------------------------------------------------------------------

    /// Validate that `feature` exists, is of the expected kind, and applies
    /// to `node`'s type. Returns the feature's cardinality.
    fn check_feature(
        &self,
        node: NodeId,
        feature: FeatureId,
        expected: &'static str,
    ) -> Result<bool, StrataError> {
        let node_type = self
            .type_of(node)
            .ok_or(StrataError::NodeNotFound(node))?;
        let decl = self
            .metamodel
            .feature_decl(feature)
            .ok_or(StrataError::FeatureNotFound(feature))?;
        let kind_matches = match decl.kind {
            FeatureKind::Attribute => expected == "attribute",
            FeatureKind::Containment { .. } => expected == "containment",
            FeatureKind::Reference { .. } => expected == "reference",
        };
        if !kind_matches {
            return Err(StrataError::FeatureKindMismatch { feature, expected });
        }
        if !self.metamodel.is_subtype_of(node_type, decl.owner) {
            return Err(StrataError::FeatureNotApplicable { feature, node_type });
        }
        Ok(decl.many)
    }

    /// Look up a feature declaration through the owned metamodel.
    #[must_use]
    pub fn feature(&self, feature: FeatureId) -> Option<&FeatureDecl> {
        self.metamodel.feature_decl(feature)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NamespaceUri;

    struct Fixture {
        store: ModelStore,
        machine: TypeId,
        event: TypeId,
        name: FeatureId,
        events: FeatureId,
        body: FeatureId,
        refines: FeatureId,
    }

    fn fixture() -> Fixture {
        let ns = NamespaceUri::new("http://example.org/test");
        let mut mm = Metamodel::new();
        let machine = mm.add_component_type("Machine", ns.clone(), &[]);
        let event = mm.add_type("Event", ns, &[]);
        let name = mm.add_attribute(machine, "name");
        let events = mm.add_containment(machine, "events", event, true);
        let body = mm.add_containment(event, "body", event, false);
        let refines = mm.add_reference(event, "refines", event, false);
        Fixture {
            store: ModelStore::new(mm),
            machine,
            event,
            name,
            events,
            body,
            refines,
        }
    }

    #[test]
    fn attribute_set_and_read() {
        let mut f = fixture();
        let m = f.store.create_node(f.machine).expect("create");
        f.store
            .set_attribute(m, f.name, AttrValue::text("m0"))
            .expect("set");
        assert_eq!(f.store.attribute(m, f.name), Some(&AttrValue::text("m0")));
        assert_eq!(f.store.name_of(m), Some("m0"));
    }

    #[test]
    fn attribute_feature_rejects_wrong_kind() {
        let mut f = fixture();
        let m = f.store.create_node(f.machine).expect("create");
        let result = f.store.set_attribute(m, f.events, AttrValue::Int(1));
        assert!(matches!(
            result,
            Err(StrataError::FeatureKindMismatch { .. })
        ));
    }

    #[test]
    fn containment_records_parent() {
        let mut f = fixture();
        let m = f.store.create_node(f.machine).expect("create");
        let e = f.store.create_node(f.event).expect("create");
        f.store.add_child(m, f.events, e).expect("add");
        assert_eq!(f.store.parent(e), Some((m, f.events)));
        assert_eq!(f.store.children(m, f.events), &[e]);
    }

    #[test]
    fn add_child_moves_between_parents() {
        let mut f = fixture();
        let m1 = f.store.create_node(f.machine).expect("create");
        let m2 = f.store.create_node(f.machine).expect("create");
        let e = f.store.create_node(f.event).expect("create");
        f.store.add_child(m1, f.events, e).expect("add");
        f.store.add_child(m2, f.events, e).expect("move");
        assert!(f.store.children(m1, f.events).is_empty());
        assert_eq!(f.store.children(m2, f.events), &[e]);
    }

    #[test]
    fn detach_matches_cardinality() {
        let mut f = fixture();
        let m = f.store.create_node(f.machine).expect("create");
        let e1 = f.store.create_node(f.event).expect("create");
        let e2 = f.store.create_node(f.event).expect("create");
        let inner = f.store.create_node(f.event).expect("create");
        f.store.add_child(m, f.events, e1).expect("add");
        f.store.add_child(m, f.events, e2).expect("add");
        f.store.set_child(e1, f.body, inner).expect("set");

        f.store.detach(e2).expect("detach");
        assert_eq!(f.store.children(m, f.events), &[e1]);

        f.store.detach(inner).expect("detach");
        assert!(f.store.children(e1, f.body).is_empty());
        assert_eq!(f.store.parent(inner), None);
    }

    #[test]
    fn descendants_pre_order() {
        let mut f = fixture();
        let m = f.store.create_node(f.machine).expect("create");
        let e1 = f.store.create_node(f.event).expect("create");
        let e2 = f.store.create_node(f.event).expect("create");
        let inner = f.store.create_node(f.event).expect("create");
        f.store.add_child(m, f.events, e1).expect("add");
        f.store.add_child(m, f.events, e2).expect("add");
        f.store.set_child(e1, f.body, inner).expect("set");

        assert_eq!(f.store.descendants(m), vec![e1, inner, e2]);
    }

    #[test]
    fn uri_roundtrip_with_stable_id() {
        let mut f = fixture();
        let path = ResourcePath::new("models/m0.sm");
        f.store.create_resource(path.clone()).expect("resource");
        let m = f.store.create_node(f.machine).expect("create");
        let e = f.store.create_node(f.event).expect("create");
        f.store.add_child(m, f.events, e).expect("add");
        f.store.add_root(&path, m).expect("root");
        f.store.set_stable_id(e, "sm::m0.e0").expect("id");

        let uri = f.store.uri_of(e).expect("uri");
        assert_eq!(uri.fragment(), Some("sm::m0.e0"));
        assert_eq!(f.store.resolve_uri(&uri), Some(e));
    }

    #[test]
    fn uri_roundtrip_structural() {
        let mut f = fixture();
        let path = ResourcePath::new("models/m0.sm");
        f.store.create_resource(path.clone()).expect("resource");
        let m = f.store.create_node(f.machine).expect("create");
        let e1 = f.store.create_node(f.event).expect("create");
        let e2 = f.store.create_node(f.event).expect("create");
        let inner = f.store.create_node(f.event).expect("create");
        f.store.add_child(m, f.events, e1).expect("add");
        f.store.add_child(m, f.events, e2).expect("add");
        f.store.set_child(e2, f.body, inner).expect("set");
        f.store.add_root(&path, m).expect("root");

        let root_uri = f.store.uri_of(m).expect("uri");
        assert_eq!(root_uri.fragment(), Some("/"));
        assert_eq!(f.store.resolve_uri(&root_uri), Some(m));

        let inner_uri = f.store.uri_of(inner).expect("uri");
        assert_eq!(inner_uri.fragment(), Some("//@events.1/@body"));
        assert_eq!(f.store.resolve_uri(&inner_uri), Some(inner));
    }

    #[test]
    fn uri_of_detached_node_fails() {
        let mut f = fixture();
        let e = f.store.create_node(f.event).expect("create");
        assert!(matches!(
            f.store.uri_of(e),
            Err(StrataError::NotInResource(_))
        ));
    }

    #[test]
    fn proxy_resolution_through_store() {
        let mut f = fixture();
        let path = ResourcePath::new("models/m0.sm");
        f.store.create_resource(path.clone()).expect("resource");
        let m = f.store.create_node(f.machine).expect("create");
        let e = f.store.create_node(f.event).expect("create");
        f.store.add_child(m, f.events, e).expect("add");
        f.store.add_root(&path, m).expect("root");
        f.store.set_stable_id(e, "sm::m0.e0").expect("id");

        let proxy = RefValue::proxy(f.event, ModelUri::in_resource(path, "sm::m0.e0"));
        assert_eq!(f.store.resolve(&proxy), Some(e));

        let dangling = RefValue::proxy(
            f.event,
            ModelUri::in_resource(ResourcePath::new("missing.sm"), "x"),
        );
        assert_eq!(f.store.resolve(&dangling), None);
    }

    #[test]
    fn reference_slots_respect_cardinality() {
        let mut f = fixture();
        let e1 = f.store.create_node(f.event).expect("create");
        let e2 = f.store.create_node(f.event).expect("create");

        f.store
            .set_reference(e1, f.refines, RefValue::Resolved(e2))
            .expect("set");
        assert_eq!(
            f.store.single_reference(e1, f.refines),
            Some(&RefValue::Resolved(e2))
        );
        assert!(matches!(
            f.store.push_reference(e1, f.refines, RefValue::Resolved(e2)),
            Err(StrataError::CardinalityMismatch { .. })
        ));
    }

    #[test]
    fn containing_component_starts_at_self() {
        let mut f = fixture();
        let m = f.store.create_node(f.machine).expect("create");
        let e = f.store.create_node(f.event).expect("create");
        f.store.add_child(m, f.events, e).expect("add");

        assert_eq!(f.store.containing_component(m), Some(m));
        assert_eq!(f.store.containing_component(e), Some(m));
    }
}
