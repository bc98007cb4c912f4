//! Shared two-namespace fixture for the refinement integration tests.
//!
//! The widget namespace owns the component type (`Widget`) and the
//! filtered type (`Marker`); the circuit namespace owns the contained
//! types (`Part`, `Pin`), so equivalence chains that climb containment
//! parents must delegate across namespaces through the registry.

#![allow(dead_code)]

use std::sync::Arc;
use strata_core::{
    AttrValue, ElementRefiner, FeatureId, Metamodel, ModelStore, NamespaceUri, NodeId,
    PolicyTable, RefHandling, Refiner, RefinerRegistry, ResourcePath, TypeId,
};

pub const WIDGET_NS: &str = "http://strata-lang.org/test/widget";
pub const CIRCUIT_NS: &str = "http://strata-lang.org/test/circuit";

/// Type and feature handles for the test metamodel.
pub struct Schema {
    pub element: TypeId,
    pub widget: TypeId,
    pub part: TypeId,
    pub pin: TypeId,
    pub marker: TypeId,
    pub name: FeatureId,
    /// Widget -> Part, many containment.
    pub parts: FeatureId,
    /// Widget -> Marker, many containment.
    pub markers: FeatureId,
    /// Widget -> Marker, single containment.
    pub badge: FeatureId,
    /// Part -> Pin, many containment.
    pub pins: FeatureId,
    /// Part -> Part, many containment (nested assemblies).
    pub subparts: FeatureId,
    /// Part -> Part, single reference.
    pub mirror: FeatureId,
    /// Part -> Pin, many reference.
    pub wires: FeatureId,
    /// Part -> Part, single reference.
    pub origin: FeatureId,
    /// Part -> Part, single reference named "refines".
    pub refines: FeatureId,
}

pub fn build_schema(mm: &mut Metamodel) -> Schema {
    let widget_ns = NamespaceUri::new(WIDGET_NS);
    let circuit_ns = NamespaceUri::new(CIRCUIT_NS);
    let element = mm.add_type("Element", widget_ns.clone(), &[]);
    let name = mm.add_attribute(element, "name");
    let widget = mm.add_component_type("Widget", widget_ns.clone(), &[element]);
    let part = mm.add_type("Part", circuit_ns.clone(), &[element]);
    let pin = mm.add_type("Pin", circuit_ns, &[element]);
    let marker = mm.add_type("Marker", widget_ns, &[element]);
    let parts = mm.add_containment(widget, "parts", part, true);
    let markers = mm.add_containment(widget, "markers", marker, true);
    let badge = mm.add_containment(widget, "badge", marker, false);
    let pins = mm.add_containment(part, "pins", pin, true);
    let subparts = mm.add_containment(part, "subparts", part, true);
    let mirror = mm.add_reference(part, "mirror", part, false);
    let wires = mm.add_reference(part, "wires", pin, true);
    let origin = mm.add_reference(part, "origin", part, false);
    let refines = mm.add_reference(part, "refines", part, false);
    Schema {
        element,
        widget,
        part,
        pin,
        marker,
        name,
        parts,
        markers,
        badge,
        pins,
        subparts,
        mirror,
        wires,
        origin,
        refines,
    }
}

/// Extension rules driven by plain tables, for per-test policy setups.
#[derive(Default)]
pub struct TableRules {
    pub policies: Vec<(FeatureId, RefHandling)>,
    pub filter: Vec<TypeId>,
}

impl ElementRefiner for TableRules {
    fn populate_filter_types(&self, filter: &mut Vec<TypeId>) {
        filter.extend_from_slice(&self.filter);
    }

    fn populate_reference_policies(&self, policies: &mut PolicyTable) {
        for (feature, handling) in &self.policies {
            policies.insert(*feature, *handling);
        }
    }
}

/// Build a registry with a widget-namespace refiner using the given
/// tables, plus a default refiner for the circuit namespace.
pub fn build_registry(
    policies: &[(FeatureId, RefHandling)],
    filter: &[TypeId],
) -> (RefinerRegistry, Arc<Refiner>) {
    let rules = TableRules {
        policies: policies.to_vec(),
        filter: filter.to_vec(),
    };
    let refiner = Arc::new(Refiner::new(Box::new(rules)));
    let mut registry = RefinerRegistry::new();
    registry.register(NamespaceUri::new(WIDGET_NS), Arc::clone(&refiner));
    registry.register(
        NamespaceUri::new(CIRCUIT_NS),
        Arc::new(Refiner::new(Box::new(TableRules::default()))),
    );
    (registry, refiner)
}

pub struct Fixture {
    pub store: ModelStore,
    pub schema: Schema,
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}

impl Fixture {
    pub fn new() -> Self {
        let mut mm = Metamodel::new();
        let schema = build_schema(&mut mm);
        Self {
            store: ModelStore::new(mm),
            schema,
        }
    }

    /// Create a node with its `name` attribute set.
    pub fn named(&mut self, ty: TypeId, name: &str) -> NodeId {
        let node = self.store.create_node(ty).expect("create node");
        self.store
            .set_attribute(node, self.schema.name, AttrValue::text(name))
            .expect("set name");
        node
    }

    /// Create an empty resource.
    pub fn resource(&mut self, path: &str) -> ResourcePath {
        let path = ResourcePath::new(path);
        self.store.create_resource(path.clone()).expect("resource");
        path
    }
}

/// Rewrite the component segment of stable identifiers across a subtree,
/// standing in for the external identifier formatter that runs after a
/// refined tree is attached.
pub fn rename_ids(store: &mut ModelStore, root: NodeId, from: &str, to: &str) {
    let mut nodes = vec![root];
    nodes.extend(store.descendants(root));
    for node in nodes {
        if let Some(id) = store.stable_id(node).map(str::to_owned) {
            store
                .set_stable_id(node, id.replace(from, to))
                .expect("set id");
        }
    }
}
