//! # Machine Refiner
//!
//! The refinement rules for the machine namespace: which element types
//! are stripped from a refinement and how each reference feature is
//! replayed.

use crate::schema::{MachineSchema, namespace};
use std::sync::Arc;
use strata_core::{
    ElementRefiner, PolicyTable, RefHandling, Refiner, RefinerRegistry, TypeId,
};

/// Refinement rules for machine-namespace elements.
///
/// Witnesses document how a refinement step replaces abstract parameters
/// and variables; they are meaningful only at the level where they were
/// written, so they never survive into the next refinement.
pub struct MachineRefiner {
    schema: MachineSchema,
}

impl MachineRefiner {
    /// Create the rules over an installed schema.
    #[must_use]
    pub fn new(schema: MachineSchema) -> Self {
        Self { schema }
    }
}

impl ElementRefiner for MachineRefiner {
    fn populate_filter_types(&self, filter: &mut Vec<TypeId>) {
        filter.push(self.schema.witness);
    }

    fn populate_reference_policies(&self, policies: &mut PolicyTable) {
        policies.insert(self.schema.machine_refines, RefHandling::Chain);
        policies.insert(self.schema.event_refines, RefHandling::Chain);
        policies.insert(self.schema.machine_sees, RefHandling::Copy);
        policies.insert(self.schema.guard_constrains, RefHandling::Equiv);
        policies.insert(self.schema.action_acts_on, RefHandling::Equiv);
    }
}

/// Build the machine refiner and register it under the machine namespace.
///
/// Returns the refiner for direct use; the registry keeps a shared handle
/// for cross-namespace equivalence delegation.
pub fn register(registry: &mut RefinerRegistry, schema: MachineSchema) -> Arc<Refiner> {
    let refiner = Arc::new(Refiner::new(Box::new(MachineRefiner::new(schema))));
    registry.register(namespace(), Arc::clone(&refiner));
    refiner
}

// =============================================================================
// TESTS
// =============================================================================
