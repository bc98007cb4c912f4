//! # strata-machine
//!
//! A concrete extension namespace for the Strata refinement engine: a
//! guarded state-machine metamodel and its refiner.
//!
//! A `Machine` is a component holding variables, invariants, and events;
//! events hold parameters, guards, actions, and witnesses. Refining a
//! machine copies its structure and replays references per the
//! [`MachineRefiner`] policy table:
//!
//! - `machine.refines`, `event.refines` → `CHAIN` (back-references to the
//!   abstract source)
//! - `machine.sees` → `COPY` (contexts are shared across refinement
//!   levels)
//! - `guard.constrains`, `action.acts_on` → `EQUIV` (rewritten to the
//!   refined variables)
//! - `Witness` elements are filtered out of refinements
//!
//! The metamodel is installed into a [`Metamodel`] once per store; the
//! returned [`MachineSchema`] carries every type and feature handle.
//!
//! [`Metamodel`]: strata_core::Metamodel

// =============================================================================
// MODULES
// =============================================================================

pub mod refiner;
pub mod schema;

// =============================================================================
// RE-EXPORTS
// =============================================================================

pub use refiner::{MachineRefiner, register};
pub use schema::{MACHINE_NS, MachineSchema, namespace};
