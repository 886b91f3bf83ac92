use criterion::{criterion_group, criterion_main, Criterion};

use rand::rngs::SmallRng;
use rand::SeedableRng;

use arcset_search::graph::Graph;
use arcset_search::heuristic::CandidateSearch;
use arcset_shm::Edge;

const NUM_VERTICES: u16 = 32;

fn candidate_generation(c: &mut Criterion) {
    let edges: Vec<Edge> = (0..NUM_VERTICES)
        .map(|i| Edge {
            from: i,
            to: (i + 1) % NUM_VERTICES,
        })
        .collect();
    let graph = Graph::new(edges);
    let mut search = CandidateSearch::new(graph, SmallRng::seed_from_u64(42));

    c.bench_function("candidate_for_32_cycle", |b| {
        b.iter(|| search.next_candidate())
    });
}

criterion_group!(benches, candidate_generation);
criterion_main!(benches);
