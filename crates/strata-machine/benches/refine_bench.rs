//! # Refinement Benchmarks
//!
//! Performance benchmarks for the refine pipeline over machine models.
//!
//! Run with: `cargo bench -p strata-machine`

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use strata_core::{
    AttrValue, Metamodel, ModelStore, ModelUri, NodeId, RefValue, RefinerRegistry, ResourcePath,
};
use strata_machine::{MachineSchema, register};

/// Create a machine with one shared variable and `size` events, each
/// carrying a guard that constrains the variable (an EQUIV-heavy shape).
fn create_machine(size: usize) -> (ModelStore, MachineSchema, NodeId) {
    let mut mm = Metamodel::new();
    let schema = MachineSchema::install(&mut mm);
    let mut store = ModelStore::new(mm);

    let path = ResourcePath::new("models/m0.stm");
    store.create_resource(path.clone()).expect("resource");

    let machine = store.create_node(schema.machine).expect("create");
    store
        .set_attribute(machine, schema.name, AttrValue::text("m0"))
        .expect("name");
    store.set_stable_id(machine, "machine::m0").expect("id");

    let variable = store.create_node(schema.variable).expect("create");
    store
        .set_attribute(variable, schema.name, AttrValue::text("x"))
        .expect("name");
    store.set_stable_id(variable, "machine::m0.x").expect("id");
    store
        .add_child(machine, schema.machine_variables, variable)
        .expect("add");

    for i in 0..size {
        let event = store.create_node(schema.event).expect("create");
        store
            .set_attribute(event, schema.name, AttrValue::text(format!("e{i}")))
            .expect("name");
        store
            .set_stable_id(event, format!("machine::m0.e{i}"))
            .expect("id");
        store
            .add_child(machine, schema.machine_events, event)
            .expect("add");

        let guard = store.create_node(schema.guard).expect("create");
        store
            .set_attribute(guard, schema.name, AttrValue::text(format!("g{i}")))
            .expect("name");
        store
            .set_stable_id(guard, format!("machine::m0.e{i}.g"))
            .expect("id");
        store.add_child(event, schema.event_guards, guard).expect("add");
        store
            .set_reference(guard, schema.guard_constrains, RefValue::Resolved(variable))
            .expect("ref");
    }

    store.add_root(&path, machine).expect("root");
    (store, schema, machine)
}

// =============================================================================
// BENCHMARKS
// =============================================================================

fn bench_refine_component(c: &mut Criterion) {
    let mut group = c.benchmark_group("refine_component");

    for size in [10, 100, 500].iter() {
        let (store, schema, machine) = create_machine(*size);
        let mut registry = RefinerRegistry::new();
        let refiner = register(&mut registry, schema);

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                let mut store = store.clone();
                let concrete = refiner
                    .refine_component(
                        &mut store,
                        &registry,
                        machine,
                        ModelUri::resource(ResourcePath::new("models/m1.stm")),
                        "m1",
                    )
                    .expect("refine");
                black_box(concrete)
            });
        });
    }

    group.finish();
}

fn bench_equivalent_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("equivalent_lookup");

    for size in [10, 100, 500].iter() {
        let (mut store, schema, machine) = create_machine(*size);
        let mut registry = RefinerRegistry::new();
        let refiner = register(&mut registry, schema);

        let concrete = refiner
            .refine_component(
                &mut store,
                &registry,
                machine,
                ModelUri::resource(ResourcePath::new("models/m1.stm")),
                "m1",
            )
            .expect("refine");
        let m1_path = ResourcePath::new("models/m1.stm");
        store.create_resource(m1_path.clone()).expect("resource");
        store.add_root(&m1_path, concrete).expect("root");

        // look up the last abstract event's counterpart
        let last_event = *store
            .children(machine, schema.machine_events)
            .last()
            .expect("event");

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| black_box(refiner.equivalent(&store, &registry, concrete, last_event)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_refine_component, bench_equivalent_lookup);
criterion_main!(benches);
