//! # Metamodel Registry
//!
//! Runtime type and feature introspection for the object graph, without
//! reflection: every node type and feature is declared up front and looked
//! up through dispatch-free tables.
//!
//! A [`TypeDecl`] carries the owning namespace, the supertype list, and the
//! component flag (components are the top-level named model units that
//! refinement operates on). A [`FeatureDecl`] declares an attribute, a
//! containment, or a cross-reference, with its cardinality.

use crate::{FeatureId, NamespaceUri, TypeId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// DECLARATIONS
// =============================================================================

/// Declaration of a node type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDecl {
    /// The type's identifier.
    pub id: TypeId,
    /// The type's name within its namespace.
    pub name: String,
    /// The namespace (extension) owning this type.
    pub namespace: NamespaceUri,
    /// Direct supertypes; conformance is transitive.
    pub supertypes: Vec<TypeId>,
    /// Whether instances are top-level named components.
    pub is_component: bool,
}

/// What kind of feature a [`FeatureDecl`] declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeatureKind {
    /// A named attribute slot holding an [`AttrValue`].
    ///
    /// [`AttrValue`]: crate::AttrValue
    Attribute,
    /// A containment slot; children belong to exactly one parent.
    Containment {
        /// Declared type of contained children.
        element: TypeId,
    },
    /// A cross-reference slot; targets may be live nodes or placeholders.
    Reference {
        /// Declared type of referenced targets.
        element: TypeId,
    },
}

/// Declaration of a feature on a node type.
///
/// A feature applies to its owner type and every subtype of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureDecl {
    /// The feature's identifier.
    pub id: FeatureId,
    /// The feature's name, unique among the owner's features.
    pub name: String,
    /// The type declaring this feature.
    pub owner: TypeId,
    /// Attribute, containment, or reference.
    pub kind: FeatureKind,
    /// Multi-valued (ordered list) vs single-valued.
    pub many: bool,
}

impl FeatureDecl {
    /// Whether this feature is a cross-reference.
    #[must_use]
    pub fn is_reference(&self) -> bool {
        matches!(self.kind, FeatureKind::Reference { .. })
    }

    /// Whether this feature is a containment.
    #[must_use]
    pub fn is_containment(&self) -> bool {
        matches!(self.kind, FeatureKind::Containment { .. })
    }
}

// =============================================================================
// METAMODEL
// =============================================================================

/// The metamodel: all declared types and features.
///
/// Uses `BTreeMap` exclusively for deterministic ordering.
#[derive(Debug, Clone, Default)]
pub struct Metamodel {
    types: BTreeMap<TypeId, TypeDecl>,
    features: BTreeMap<FeatureId, FeatureDecl>,
    next_type_id: u64,
    next_feature_id: u64,
}

impl Metamodel {
    /// Create an empty metamodel.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a node type. Returns the allocated [`TypeId`].
    pub fn add_type(
        &mut self,
        name: impl Into<String>,
        namespace: NamespaceUri,
        supertypes: &[TypeId],
    ) -> TypeId {
        self.add_type_decl(name, namespace, supertypes, false)
    }

    /// Declare a component type (a top-level named model unit).
    pub fn add_component_type(
        &mut self,
        name: impl Into<String>,
        namespace: NamespaceUri,
        supertypes: &[TypeId],
    ) -> TypeId {
        self.add_type_decl(name, namespace, supertypes, true)
    }

    fn add_type_decl(
        &mut self,
        name: impl Into<String>,
        namespace: NamespaceUri,
        supertypes: &[TypeId],
        is_component: bool,
    ) -> TypeId {
        let id = TypeId(self.next_type_id);
        self.next_type_id = self.next_type_id.saturating_add(1);
        self.types.insert(
            id,
            TypeDecl {
                id,
                name: name.into(),
                namespace,
                supertypes: supertypes.to_vec(),
                is_component,
            },
        );
        id
    }

    /// Declare a single-valued attribute on `owner`.
    pub fn add_attribute(&mut self, owner: TypeId, name: impl Into<String>) -> FeatureId {
        self.add_feature(owner, name, FeatureKind::Attribute, false)
    }

    /// Declare a containment feature on `owner`.
    pub fn add_containment(
        &mut self,
        owner: TypeId,
        name: impl Into<String>,
        element: TypeId,
        many: bool,
    ) -> FeatureId {
        self.add_feature(owner, name, FeatureKind::Containment { element }, many)
    }

    /// Declare a cross-reference feature on `owner`.
    pub fn add_reference(
        &mut self,
        owner: TypeId,
        name: impl Into<String>,
        element: TypeId,
        many: bool,
    ) -> FeatureId {
        self.add_feature(owner, name, FeatureKind::Reference { element }, many)
    }

    fn add_feature(
        &mut self,
        owner: TypeId,
        name: impl Into<String>,
        kind: FeatureKind,
        many: bool,
    ) -> FeatureId {
        let id = FeatureId(self.next_feature_id);
        self.next_feature_id = self.next_feature_id.saturating_add(1);
        self.features.insert(
            id,
            FeatureDecl {
                id,
                name: name.into(),
                owner,
                kind,
                many,
            },
        );
        id
    }

    /// Look up a type declaration.
    #[must_use]
    pub fn type_decl(&self, id: TypeId) -> Option<&TypeDecl> {
        self.types.get(&id)
    }

    /// Look up a feature declaration.
    #[must_use]
    pub fn feature_decl(&self, id: FeatureId) -> Option<&FeatureDecl> {
        self.features.get(&id)
    }

    /// The namespace owning a type.
    #[must_use]
    pub fn namespace_of(&self, ty: TypeId) -> Option<&NamespaceUri> {
        self.types.get(&ty).map(|decl| &decl.namespace)
    }

    /// Whether `sub` conforms to `sup` (reflexive, transitive).
    ///
    /// Walks the supertype graph with a visited set; malformed supertype
    /// cycles terminate rather than loop.
    #[must_use]
    pub fn is_subtype_of(&self, sub: TypeId, sup: TypeId) -> bool {
        if sub == sup {
            return true;
        }
        let mut visited = BTreeSet::new();
        let mut stack = vec![sub];
        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            let Some(decl) = self.types.get(&current) else {
                continue;
            };
            for &parent in &decl.supertypes {
                if parent == sup {
                    return true;
                }
                stack.push(parent);
            }
        }
        false
    }

    /// Find a feature by name on `ty`, searching inherited features too.
    ///
    /// Own declarations shadow supertype declarations of the same name.
    #[must_use]
    pub fn feature_named(&self, ty: TypeId, name: &str) -> Option<&FeatureDecl> {
        let mut visited = BTreeSet::new();
        let mut queue = vec![ty];
        while let Some(current) = queue.pop() {
            if !visited.insert(current) {
                continue;
            }
            if let Some(found) = self
                .features
                .values()
                .find(|decl| decl.owner == current && decl.name == name)
            {
                return Some(found);
            }
            if let Some(decl) = self.types.get(&current) {
                queue.extend(decl.supertypes.iter().copied());
            }
        }
        None
    }
}

// =============================================================================
// TESTS
// =============================================================================
