//! # Machine Metamodel
//!
//! Type and feature declarations for the machine namespace. Installed
//! once into a [`Metamodel`]; the returned [`MachineSchema`] is the handle
//! set used everywhere else (building models, the refiner's tables,
//! tests).

use serde::{Deserialize, Serialize};
use strata_core::{FeatureId, Metamodel, NamespaceUri, TypeId};

/// Namespace identifier owning the machine metamodel.
pub const MACHINE_NS: &str = "http://strata-lang.org/models/machine";

/// The machine namespace as a [`NamespaceUri`].
#[must_use]
pub fn namespace() -> NamespaceUri {
    NamespaceUri::new(MACHINE_NS)
}

/// Every type and feature of the machine metamodel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineSchema {
    // types
    pub element: TypeId,
    pub machine: TypeId,
    pub variable: TypeId,
    pub invariant: TypeId,
    pub event: TypeId,
    pub parameter: TypeId,
    pub guard: TypeId,
    pub action: TypeId,
    pub witness: TypeId,
    pub context: TypeId,
    pub constant: TypeId,

    // shared attributes (declared on the element base type)
    pub name: FeatureId,
    pub comment: FeatureId,

    // machine features
    pub machine_refines: FeatureId,
    pub machine_sees: FeatureId,
    pub machine_variables: FeatureId,
    pub machine_invariants: FeatureId,
    pub machine_events: FeatureId,

    // invariant features
    pub invariant_predicate: FeatureId,

    // event features
    pub event_refines: FeatureId,
    pub event_parameters: FeatureId,
    pub event_guards: FeatureId,
    pub event_actions: FeatureId,
    pub event_witnesses: FeatureId,

    // guard features
    pub guard_predicate: FeatureId,
    pub guard_constrains: FeatureId,

    // action features
    pub action_assigns: FeatureId,
    pub action_acts_on: FeatureId,

    // context features
    pub context_constants: FeatureId,
}

impl MachineSchema {
    /// Declare the machine metamodel into `mm`.
    pub fn install(mm: &mut Metamodel) -> Self {
        let ns = namespace();

        let element = mm.add_type("Element", ns.clone(), &[]);
        let name = mm.add_attribute(element, "name");
        let comment = mm.add_attribute(element, "comment");

        let machine = mm.add_component_type("Machine", ns.clone(), &[element]);
        let variable = mm.add_type("Variable", ns.clone(), &[element]);
        let invariant = mm.add_type("Invariant", ns.clone(), &[element]);
        let event = mm.add_type("Event", ns.clone(), &[element]);
        let parameter = mm.add_type("Parameter", ns.clone(), &[element]);
        let guard = mm.add_type("Guard", ns.clone(), &[element]);
        let action = mm.add_type("Action", ns.clone(), &[element]);
        let witness = mm.add_type("Witness", ns.clone(), &[element]);
        let context = mm.add_component_type("Context", ns.clone(), &[element]);
        let constant = mm.add_type("Constant", ns, &[element]);

        let machine_refines = mm.add_reference(machine, "refines", machine, false);
        let machine_sees = mm.add_reference(machine, "sees", context, true);
        let machine_variables = mm.add_containment(machine, "variables", variable, true);
        let machine_invariants = mm.add_containment(machine, "invariants", invariant, true);
        let machine_events = mm.add_containment(machine, "events", event, true);

        let invariant_predicate = mm.add_attribute(invariant, "predicate");

        let event_refines = mm.add_reference(event, "refines", event, false);
        let event_parameters = mm.add_containment(event, "parameters", parameter, true);
        let event_guards = mm.add_containment(event, "guards", guard, true);
        let event_actions = mm.add_containment(event, "actions", action, true);
        let event_witnesses = mm.add_containment(event, "witnesses", witness, true);

        let guard_predicate = mm.add_attribute(guard, "predicate");
        let guard_constrains = mm.add_reference(guard, "constrains", variable, false);

        let action_assigns = mm.add_attribute(action, "assigns");
        let action_acts_on = mm.add_reference(action, "acts_on", variable, true);

        let context_constants = mm.add_containment(context, "constants", constant, true);

        Self {
            element,
            machine,
            variable,
            invariant,
            event,
            parameter,
            guard,
            action,
            witness,
            context,
            constant,
            name,
            comment,
            machine_refines,
            machine_sees,
            machine_variables,
            machine_invariants,
            machine_events,
            invariant_predicate,
            event_refines,
            event_parameters,
            event_guards,
            event_actions,
            event_witnesses,
            guard_predicate,
            guard_constrains,
            action_assigns,
            action_acts_on,
            context_constants,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
