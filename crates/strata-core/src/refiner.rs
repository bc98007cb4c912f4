//! # Element Refiner
//!
//! The refinement pipeline: deep-copy an abstract element, replay its
//! reference edges through the extension's policy table, then strip
//! filtered types from the copy.
//!
//! One refiner exists per extension namespace. Extensions implement
//! [`ElementRefiner`] to contribute their filter list and policy table
//! (populated once, at construction) and may override the default
//! equivalence algorithm.
//!
//! Every replayed edge is installed as an unresolved placeholder, never a
//! live link, so targets in other resources (or targets that do not exist
//! yet) stay addressable. Failure to produce an address is not an error:
//! the edge is simply left unset.

use crate::copier::Copier;
use crate::equivalence::{self, EquivContext};
use crate::model::{ModelStore, RefValue};
use crate::policy::{PolicyTable, RefHandling};
use crate::registry::RefinerRegistry;
use crate::{FeatureId, ModelUri, NodeId, StrataError, TypeId};
use std::fmt;

// =============================================================================
// EXTENSION CONTRACT
// =============================================================================

/// Per-namespace refinement rules.
///
/// Extenders provide the list of types that must not survive into a
/// refinement and the handling mode for each reference feature of their
/// metamodel. Reference features without an entry are dropped.
pub trait ElementRefiner: Send + Sync {
    /// Populate the list of types whose instances are removed from a
    /// refinement after copying.
    fn populate_filter_types(&self, filter: &mut Vec<TypeId>);

    /// Populate the reference policy table for this extension's features.
    fn populate_reference_policies(&self, policies: &mut PolicyTable);

    /// Find the node within `concrete_container` equivalent to
    /// `abstract_node`.
    ///
    /// The default is the shared algorithm in [`equivalence`]: same type
    /// and same name under a recursively equivalent parent, else a
    /// `refines` back-reference. Extenders may override to add other
    /// equivalences.
    fn find_equivalent(
        &self,
        cx: EquivContext<'_>,
        concrete_container: NodeId,
        scope: Option<FeatureId>,
        abstract_node: NodeId,
    ) -> Option<NodeId> {
        equivalence::find_equivalent(cx, concrete_container, scope, abstract_node)
    }
}

// =============================================================================
// REFINER
// =============================================================================

/// The refiner for one extension namespace.
///
/// Caches the extension's filter list and policy table at construction
/// and exposes the refinement operations.
pub struct Refiner {
    rules: Box<dyn ElementRefiner>,
    filter: Vec<TypeId>,
    policies: PolicyTable,
}

impl fmt::Debug for Refiner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Refiner")
            .field("filter", &self.filter)
            .field("policies", &self.policies)
            .finish()
    }
}

impl Refiner {
    /// Build a refiner from extension rules, populating and caching the
    /// filter list and the reference policy table.
    #[must_use]
    pub fn new(rules: Box<dyn ElementRefiner>) -> Self {
        let mut filter = Vec::new();
        rules.populate_filter_types(&mut filter);
        let mut policies = PolicyTable::new();
        rules.populate_reference_policies(&mut policies);
        Self {
            rules,
            filter,
            policies,
        }
    }

    /// The cached reference policy table.
    #[must_use]
    pub fn policies(&self) -> &PolicyTable {
        &self.policies
    }

    /// The cached filter list.
    #[must_use]
    pub fn filter_types(&self) -> &[TypeId] {
        &self.filter
    }

    // -------------------------------------------------------------------------
    // Public operations
    // -------------------------------------------------------------------------

    /// Create a refined component element from the given abstract one.
    ///
    /// The abstract component must be contained in a resource. The
    /// concrete resource location and component name are used to
    /// synthesize addresses for intra-component `EQUIV` references; the
    /// returned element itself is detached, and attaching it to a resource
    /// is the caller's job.
    pub fn refine_component(
        &self,
        store: &mut ModelStore,
        registry: &RefinerRegistry,
        abstract_root: NodeId,
        concrete_resource: ModelUri,
        concrete_component_name: impl Into<String>,
    ) -> Result<NodeId, StrataError> {
        self.refine_inner(
            store,
            registry,
            None,
            abstract_root,
            None,
            Some(concrete_resource),
            Some(concrete_component_name.into()),
        )
    }

    /// Create a refined element from the given abstract one and a separate
    /// abstract address.
    ///
    /// The abstract element need not be contained in the abstract
    /// component: references back at it (e.g. `refines`) use the given
    /// address instead of a computed one.
    pub fn refine_with_source(
        &self,
        store: &mut ModelStore,
        registry: &RefinerRegistry,
        abstract_uri: ModelUri,
        abstract_node: NodeId,
        concrete_container: NodeId,
    ) -> Result<NodeId, StrataError> {
        self.refine_inner(
            store,
            registry,
            Some(abstract_uri),
            abstract_node,
            Some(concrete_container),
            None,
            None,
        )
    }

    /// Create a refined element from the given abstract one.
    ///
    /// The containing concrete component is used to find equivalent
    /// reference targets lying outside the newly created elements; it must
    /// be contained in a resource.
    pub fn refine_into(
        &self,
        store: &mut ModelStore,
        registry: &RefinerRegistry,
        abstract_node: NodeId,
        concrete_container: NodeId,
    ) -> Result<NodeId, StrataError> {
        self.refine_inner(
            store,
            registry,
            None,
            abstract_node,
            Some(concrete_container),
            None,
            None,
        )
    }

    /// Find the node within `concrete_container` equivalent to
    /// `abstract_node`, per this extension's equivalence rules.
    #[must_use]
    pub fn equivalent(
        &self,
        store: &ModelStore,
        registry: &RefinerRegistry,
        concrete_container: NodeId,
        abstract_node: NodeId,
    ) -> Option<NodeId> {
        self.rules.find_equivalent(
            EquivContext::new(store, registry),
            concrete_container,
            None,
            abstract_node,
        )
    }

    /// Like [`Refiner::equivalent`], with the candidate search restricted
    /// to the contents of one containment feature of the container.
    #[must_use]
    pub fn equivalent_in_scope(
        &self,
        store: &ModelStore,
        registry: &RefinerRegistry,
        concrete_container: NodeId,
        scope: FeatureId,
        abstract_node: NodeId,
    ) -> Option<NodeId> {
        self.rules.find_equivalent(
            EquivContext::new(store, registry),
            concrete_container,
            Some(scope),
            abstract_node,
        )
    }

    /// Dispatch an equivalence query through this refiner's rules at an
    /// existing recursion depth.
    pub(crate) fn find_equivalent_in(
        &self,
        cx: EquivContext<'_>,
        concrete_container: NodeId,
        scope: Option<FeatureId>,
        abstract_node: NodeId,
    ) -> Option<NodeId> {
        self.rules
            .find_equivalent(cx, concrete_container, scope, abstract_node)
    }

    // -------------------------------------------------------------------------
    // Pipeline
    // -------------------------------------------------------------------------

    fn refine_inner(
        &self,
        store: &mut ModelStore,
        registry: &RefinerRegistry,
        abstract_uri: Option<ModelUri>,
        abstract_node: NodeId,
        concrete_container: Option<NodeId>,
        concrete_resource: Option<ModelUri>,
        concrete_name: Option<String>,
    ) -> Result<NodeId, StrataError> {
        let abstract_uri = match abstract_uri {
            Some(uri) => uri,
            None => store.uri_of(abstract_node)?,
        };
        let concrete_name = match (concrete_name, concrete_container) {
            (Some(name), _) => Some(name),
            (None, Some(container)) => store.name_of(container).map(str::to_owned),
            (None, None) => None,
        };
        let concrete_resource = match (concrete_resource, concrete_container) {
            (Some(uri), _) => Some(uri),
            (None, Some(container)) => Some(store.uri_of(container)?),
            (None, None) => None,
        };

        // Deep copy of attributes and containment; references stay unset
        // and are replayed below.
        let (concrete_root, copier) = Copier::copy(store, abstract_node)?;
        self.copy_references(
            store,
            registry,
            &abstract_uri,
            concrete_root,
            &copier,
            concrete_resource.as_ref(),
            concrete_container,
            concrete_name.as_deref(),
        )?;
        // Filtering runs last so reference resolution can still see
        // soon-to-be-removed elements.
        self.filter_elements(store, concrete_root)?;
        Ok(concrete_root)
    }

    /// Replay reference edges into the refined tree according to the
    /// policy table.
    ///
    /// The concrete elements cannot be used to compute addresses (their
    /// parentage is not complete until the caller attaches the result), so
    /// every address is synthesized from the abstract side.
    fn copy_references(
        &self,
        store: &mut ModelStore,
        registry: &RefinerRegistry,
        abstract_root_uri: &ModelUri,
        concrete_root: NodeId,
        copier: &Copier,
        concrete_resource: Option<&ModelUri>,
        concrete_container: Option<NodeId>,
        concrete_name: Option<&str>,
    ) -> Result<(), StrataError> {
        let mut contents = vec![concrete_root];
        contents.extend(store.descendants(concrete_root));
        for concrete in contents {
            let concrete_type = store
                .type_of(concrete)
                .ok_or(StrataError::NodeNotFound(concrete))?;
            let Some(abstract_source) = copier.abstract_source(concrete) else {
                continue;
            };
            for (feature, handling) in self.policies.iter() {
                let Some((owner, many, is_reference)) = store
                    .feature(feature)
                    .map(|decl| (decl.owner, decl.many, decl.is_reference()))
                else {
                    continue;
                };
                if !store.metamodel().is_subtype_of(concrete_type, owner) {
                    continue;
                }
                if many {
                    let targets: Vec<RefValue> =
                        store.reference_list(abstract_source, feature).to_vec();
                    for value in targets {
                        let replacement = self.new_reference_value(
                            store,
                            registry,
                            abstract_root_uri,
                            abstract_source,
                            Some(&value),
                            concrete_resource,
                            concrete_container,
                            concrete_name,
                            handling,
                            copier,
                        );
                        if let Some(replacement) = replacement {
                            store.push_reference(concrete, feature, replacement)?;
                        }
                    }
                } else {
                    // policy entries whose feature is not reference-typed
                    // are skipped
                    if !is_reference {
                        continue;
                    }
                    let value = store.single_reference(abstract_source, feature).cloned();
                    let replacement = self.new_reference_value(
                        store,
                        registry,
                        abstract_root_uri,
                        abstract_source,
                        value.as_ref(),
                        concrete_resource,
                        concrete_container,
                        concrete_name,
                        handling,
                        copier,
                    );
                    if let Some(replacement) = replacement {
                        store.set_reference(concrete, feature, replacement)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Compute the replacement value for one edge, per policy.
    ///
    /// `None` means "leave this edge slot empty".
    fn new_reference_value(
        &self,
        store: &ModelStore,
        registry: &RefinerRegistry,
        abstract_root_uri: &ModelUri,
        abstract_source: NodeId,
        abstract_target: Option<&RefValue>,
        concrete_resource: Option<&ModelUri>,
        concrete_container: Option<NodeId>,
        concrete_name: Option<&str>,
        handling: RefHandling,
        copier: &Copier,
    ) -> Option<RefValue> {
        // Resolve placeholders eagerly; an unresolvable one keeps its
        // stored type and address.
        let target = abstract_target.and_then(|value| resolve_target(store, value));
        match handling {
            RefHandling::Chain => {
                // Always points back at the refined element's abstract
                // source address, whatever the abstract edge held (or
                // whether it held anything at all).
                let type_id = store.type_of(abstract_source)?;
                Some(RefValue::proxy(type_id, abstract_root_uri.clone()))
            }
            RefHandling::Equiv => {
                let target = target?;
                let same_resource = match (target.uri.as_ref(), store.resource_of(abstract_source))
                {
                    (Some(uri), Some(resource)) => uri.resource_path() == resource,
                    _ => false,
                };
                if !same_resource {
                    // equiv only works for intra-unit references; default
                    // to copy otherwise
                    return copy_value(store, &target);
                }
                let abstract_component_name = target
                    .node
                    .and_then(|node| store.containing_component(node))
                    .and_then(|component| store.name_of(component).map(str::to_owned))
                    .or_else(|| fallback_component_name(abstract_root_uri));
                if let Some(node) = target.node {
                    if copier.contains_abstract(node) {
                        // freshly copied target: synthesize its concrete
                        // address by renaming the component segment of the
                        // stable identifier
                        let resource = concrete_resource?;
                        let id = store.stable_id(node)?;
                        let id = match (abstract_component_name.as_deref(), concrete_name) {
                            (Some(abstract_name), Some(concrete_name)) => id.replace(
                                &format!("::{abstract_name}."),
                                &format!("::{concrete_name}."),
                            ),
                            _ => id.to_owned(),
                        };
                        return Some(RefValue::proxy(
                            target.type_id,
                            resource.with_fragment(id),
                        ));
                    }
                    if let Some(container) = concrete_container {
                        let cx = EquivContext::new(store, registry);
                        if let Some(found) = self.rules.find_equivalent(cx, container, None, node)
                        {
                            let uri = store.uri_of(found).ok()?;
                            let type_id = store.type_of(found)?;
                            return Some(RefValue::proxy(type_id, uri));
                        }
                    }
                }
                // same model unit, no counterpart: leave the edge unset
                None
            }
            RefHandling::Copy => target.as_ref().and_then(|t| copy_value(store, t)),
            RefHandling::Drop => None,
        }
    }

    /// Remove every copied element whose type is in the filter list,
    /// matching cardinality: multi-valued slots shrink, single-valued
    /// slots are unset. Dangling references at removed elements are not
    /// this pass's concern.
    fn filter_elements(
        &self,
        store: &mut ModelStore,
        concrete_root: NodeId,
    ) -> Result<(), StrataError> {
        if self.filter.is_empty() {
            return Ok(());
        }
        let mut remove = Vec::new();
        let mut contents = vec![concrete_root];
        contents.extend(store.descendants(concrete_root));
        for node in contents {
            let Some(ty) = store.type_of(node) else {
                continue;
            };
            if self
                .filter
                .iter()
                .any(|filtered| store.metamodel().is_subtype_of(ty, *filtered))
            {
                remove.push(node);
            }
        }
        for node in remove {
            store.detach(node)?;
        }
        Ok(())
    }
}

// =============================================================================
// TARGET RESOLUTION
// =============================================================================

/// An eagerly resolved abstract reference target.
struct Target {
    /// The live node, when loaded.
    node: Option<NodeId>,
    type_id: TypeId,
    /// The target's global address, when computable.
    uri: Option<ModelUri>,
}

fn resolve_target(store: &ModelStore, value: &RefValue) -> Option<Target> {
    match value {
        RefValue::Resolved(id) => live_target(store, *id),
        RefValue::Proxy { type_id, uri } => match store.resolve_uri(uri) {
            Some(id) => live_target(store, id),
            None => Some(Target {
                node: None,
                type_id: *type_id,
                uri: Some(uri.clone()),
            }),
        },
    }
}

fn live_target(store: &ModelStore, node: NodeId) -> Option<Target> {
    let type_id = store.type_of(node)?;
    Some(Target {
        node: Some(node),
        type_id,
        uri: store.uri_of(node).ok(),
    })
}

/// COPY semantics: the target's own address, fragment forced to its stable
/// identifier when one exists.
fn copy_value(store: &ModelStore, target: &Target) -> Option<RefValue> {
    let uri = target.uri.clone()?;
    let uri = match target.node.and_then(|node| store.stable_id(node)) {
        Some(id) => uri.with_fragment(id),
        None => uri,
    };
    Some(RefValue::proxy(target.type_id, uri))
}

// =============================================================================
// COMPONENT NAME FALLBACK
// =============================================================================

/// Parse the owning component name out of the abstract element's own
/// address: the text after the last `::` of the fragment, up to the first
/// following `.`.
///
/// This is a brittle last resort for targets with no component-typed
/// ancestor; it assumes the fragment is a stable identifier of the
/// `...::component.element` form. Fragments without both markers yield
/// `None` (and a warning), which skips the component-segment substitution.
fn fallback_component_name(abstract_root_uri: &ModelUri) -> Option<String> {
    let fragment = abstract_root_uri.fragment()?;
    let Some(sep) = fragment.rfind("::") else {
        warn_unparsed_fragment(fragment);
        return None;
    };
    let after = fragment.get(sep + 2..)?;
    let Some(dot) = after.find('.') else {
        warn_unparsed_fragment(fragment);
        return None;
    };
    after.get(..dot).map(str::to_owned)
}

/// Structured stderr logging; the engine carries no logging dependency.
fn warn_unparsed_fragment(fragment: &str) {
    eprintln!(
        "{{\"level\":\"warn\",\"target\":\"strata_core::refiner\",\"message\":\"cannot extract a component name from fragment '{}'\"}}",
        fragment
    );
}

// =============================================================================
// TESTS
// =============================================================================
