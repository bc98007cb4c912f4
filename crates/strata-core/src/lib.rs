//! # strata-core
//!
//! The refinement engine for Strata - THE ENGINE.
//!
//! Strata performs stepwise refinement of hierarchical typed models: given
//! an abstract element (a typed, attributed node in a containment tree
//! with typed cross-references), it produces a structurally copied
//! concrete element and replays every reference edge through one of four
//! declarative policies:
//!
//! - `COPY` - target the exact node the abstract edge targeted
//! - `CHAIN` - point back at the abstract source element itself
//! - `EQUIV` - target the concrete counterpart of the abstract target,
//!   falling back to `COPY` across model units
//! - `DROP` - leave the edge unset (the default)
//!
//! ## Pipeline
//!
//! ```text
//! refine ──► Copier (deep copy + bijective mapping)
//!        ──► reference rewriter (policy table, per edge)
//!        │       └─► equivalence resolver ◄──► RefinerRegistry
//!        └─► type filter (strip filtered types, last)
//! ```
//!
//! ## Architectural Constraints
//!
//! The engine:
//! - Is pure Rust: no async, no network dependencies, no I/O
//! - Is deterministic: `BTreeMap` only, no floats, no randomness
//! - Treats under-resolution as a normal outcome, never an error
//! - Never links the refined tree directly to other nodes: every replayed
//!   edge is an unresolved placeholder carrying a type and an address

// =============================================================================
// MODULES
// =============================================================================

pub mod copier;
pub mod equivalence;
pub mod metamodel;
pub mod model;
pub mod policy;
pub mod refiner;
pub mod registry;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    AttrValue, FeatureId, ModelUri, NamespaceUri, NodeId, ResourcePath, StrataError, TypeId,
};

// =============================================================================
// RE-EXPORTS: Engine
// =============================================================================

pub use copier::Copier;
pub use equivalence::{EquivContext, MAX_EQUIVALENCE_DEPTH, find_equivalent};
pub use metamodel::{FeatureDecl, FeatureKind, Metamodel, TypeDecl};
pub use model::{ModelStore, RefValue};
pub use policy::{PolicyTable, RefHandling};
pub use refiner::{ElementRefiner, Refiner};
pub use registry::RefinerRegistry;
