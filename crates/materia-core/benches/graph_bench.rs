//! # Graph Benchmarks
//!
//! Performance benchmarks for materia-core kernel operations.
//!
//! Run with: `cargo bench -p materia-core`

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use materia_core::{EntityId, Graph, GraphStore, Kind, Payload, QueryEngine};
use std::hint::black_box;

/// Create a hub entity with `size` holders attached, alternating relation kinds.
fn create_star_graph(size: usize) -> (Graph, EntityId) {
    let mut graph = Graph::new();
    let hub = graph.insert_entity(Kind::new("Gas")).expect("insert");
    let part = Kind::new("hasPart");
    let property = Kind::new("hasProperty");

    for i in 0..size {
        let spoke = graph
            .insert_holder(Kind::new("Scalar"), Payload::Real(i as f64))
            .expect("insert");
        let kind = if i % 2 == 0 { &part } else { &property };
        graph.create_relation_to(kind, hub, spoke).expect("link");
    }

    (graph, hub)
}

// =============================================================================
// BENCHMARKS
// =============================================================================

fn bench_linking(c: &mut Criterion) {
    let mut group = c.benchmark_group("linking");

    for size in [10, 100, 1000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter(|| black_box(create_star_graph(size)));
        });
    }

    group.finish();
}

fn bench_relations_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("relations_query");
    let kind = Kind::new("hasPart");

    for size in [10, 100, 1000].iter() {
        let (graph, hub) = create_star_graph(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| black_box(QueryEngine::relations(&graph, hub, &kind)));
        });
    }

    group.finish();
}

fn bench_scalar_unwrap(c: &mut Criterion) {
    let mut group = c.benchmark_group("scalar_unwrap");
    let kind = Kind::new("Scalar");

    for size in [10, 100, 1000].iter() {
        let (graph, hub) = create_star_graph(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| black_box(QueryEngine::related_scalars(&graph, hub, &kind)));
        });
    }

    group.finish();
}

fn bench_removal(c: &mut Criterion) {
    let mut group = c.benchmark_group("removal");

    for size in [10, 100, 1000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter_batched(
                || create_star_graph(size),
                |(mut graph, hub)| {
                    let incident = graph.incident_relations(hub).expect("hub").to_vec();
                    for r in incident.into_iter().rev() {
                        let _ = graph.remove_relation(hub, r);
                    }
                    black_box(graph)
                },
                criterion::BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_linking,
    bench_relations_query,
    bench_scalar_unwrap,
    bench_removal
);
criterion_main!(benches);
