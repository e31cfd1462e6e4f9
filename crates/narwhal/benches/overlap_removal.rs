use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};
use narwhal::geom::{point, size};
use narwhal::{Graph, Node, OverlapRemovalSettings, ProximityOverlapRemoval};
use std::hint::black_box;
use std::time::Duration;

/// Nodes on a jittered grid whose pitch is smaller than the node size, so every node overlaps
/// its neighbours.
fn crowded_grid(side: usize) -> Graph {
    let mut state = 0x9E37_79B9_7F4A_7C15_u64;
    let mut next = move || {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (state >> 11) as f64 / (1u64 << 53) as f64
    };

    let mut graph = Graph::default();
    for row in 0..side {
        for col in 0..side {
            let center = point(col as f64 * 6.0 + next(), row as f64 * 6.0 + next());
            let node_size = size(8.0 + 4.0 * next(), 6.0 + 4.0 * next());
            graph
                .nodes
                .push(Node::new(format!("n{row}_{col}"), center, node_size));
        }
    }
    graph
}

fn bench_overlap_removal(c: &mut Criterion) {
    let mut group = c.benchmark_group("overlap_removal");
    group.measurement_time(Duration::from_secs(10));

    let settings = OverlapRemovalSettings {
        node_separation: 2.0,
        stop_on_max_iterations: true,
        ..OverlapRemovalSettings::default()
    };

    for (name, side) in [("grid_8x8", 8usize), ("grid_16x16", 16usize)] {
        let graph = crowded_grid(side);
        group.bench_with_input(BenchmarkId::new("prism", name), &graph, |b, graph| {
            b.iter_batched(
                || graph.clone(),
                |mut g| {
                    let report = ProximityOverlapRemoval::new(settings.clone())
                        .remove_overlaps(black_box(&mut g))
                        .expect("valid input");
                    black_box(report.iterations);
                },
                BatchSize::LargeInput,
            )
        });
    }

    group.finish();
}

criterion_group!(benches, bench_overlap_removal);
criterion_main!(benches);
