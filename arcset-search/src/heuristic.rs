//! The randomized arc set heuristic.
//!
//! Each iteration draws a uniformly random permutation of the vertex set
//! and removes every edge that runs "forward" along it: an edge is selected
//! when its tail precedes its head in the permuted order. The surviving
//! edges all point backward along the permutation, so the remaining graph
//! is acyclic and the selected edges form a feedback arc set.
use std::collections::HashMap;

use rand::Rng;

use arcset_shm::Solution;

use crate::graph::Graph;

/// Draws candidate arc sets for one graph from a stream of random vertex
/// permutations.
pub struct CandidateSearch<R> {
    graph: Graph,
    order: Vec<u16>,
    rng: R,
}

impl<R: Rng> CandidateSearch<R> {
    pub fn new(graph: Graph, rng: R) -> Self {
        let order = graph.vertices().to_vec();
        Self { graph, order, rng }
    }

    /// Runs one shuffle-and-select iteration.
    ///
    /// Returns `None` when the candidate exceeds the fixed solution
    /// capacity; the caller simply tries again with a fresh permutation.
    pub fn next_candidate(&mut self) -> Option<Solution> {
        self.shuffle();
        arc_set_for_order(&self.graph, &self.order)
    }

    // Fisher–Yates: for each i pick a uniform j in [i, n) and swap.
    fn shuffle(&mut self) {
        let n = self.order.len();
        for i in 0..n.saturating_sub(1) {
            let j = self.rng.gen_range(i..n);
            self.order.swap(i, j);
        }
    }
}

/// Selects every edge whose tail precedes its head in `order`.
///
/// Returns `None` when the selection does not fit a [`Solution`].
pub fn arc_set_for_order(graph: &Graph, order: &[u16]) -> Option<Solution> {
    let position: HashMap<u16, usize> = order
        .iter()
        .enumerate()
        .map(|(index, &vertex)| (vertex, index))
        .collect();
    // Every edge endpoint is in the vertex set by construction.
    Solution::from_edges(
        graph
            .edges()
            .iter()
            .copied()
            .filter(|edge| position[&edge.from] < position[&edge.to]),
    )
}

#[cfg(test)]
mod tests {
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    use arcset_shm::Edge;

    use super::*;

    fn two_cycle() -> Graph {
        Graph::new(vec![Edge { from: 1, to: 2 }, Edge { from: 2, to: 1 }])
    }

    #[test]
    fn two_cycle_always_loses_exactly_one_edge() {
        // Both permutations of {1, 2} must break the cycle by removing
        // exactly one of its two edges.
        let graph = two_cycle();
        for order in [[1, 2], [2, 1]] {
            let solution = arc_set_for_order(&graph, &order).unwrap();
            assert_eq!(solution.len(), 1, "order {order:?}");
        }
    }

    #[test]
    fn forward_edges_are_selected() {
        let graph = Graph::new(vec![
            Edge { from: 1, to: 2 },
            Edge { from: 2, to: 3 },
            Edge { from: 3, to: 1 },
        ]);
        let solution = arc_set_for_order(&graph, &[1, 2, 3]).unwrap();
        assert_eq!(
            solution.edges(),
            &[Edge { from: 1, to: 2 }, Edge { from: 2, to: 3 }]
        );
    }

    #[test]
    fn oversized_candidates_are_discarded() {
        // A straight line ordered forward selects every edge; eleven edges
        // cannot be represented.
        let edges: Vec<Edge> = (0..11).map(|i| Edge { from: i, to: i + 1 }).collect();
        let order: Vec<u16> = (0..12).collect();
        let graph = Graph::new(edges);
        assert!(arc_set_for_order(&graph, &order).is_none());
    }

    #[test]
    fn shuffle_produces_a_permutation() {
        let graph = Graph::new(vec![
            Edge { from: 0, to: 1 },
            Edge { from: 1, to: 2 },
            Edge { from: 2, to: 3 },
            Edge { from: 3, to: 4 },
        ]);
        let mut search = CandidateSearch::new(graph, SmallRng::seed_from_u64(11));
        for _ in 0..64 {
            search.next_candidate();
            let mut seen = search.order.clone();
            seen.sort_unstable();
            assert_eq!(seen, vec![0, 1, 2, 3, 4]);
        }
    }

    #[test]
    fn search_eventually_yields_both_two_cycle_solutions() {
        let mut search = CandidateSearch::new(two_cycle(), SmallRng::seed_from_u64(3));
        let mut seen = std::collections::HashSet::new();
        for _ in 0..64 {
            let solution = search.next_candidate().unwrap();
            assert_eq!(solution.len(), 1);
            seen.insert(solution.edges()[0]);
        }
        assert_eq!(seen.len(), 2, "both orientations should appear");
    }
}
