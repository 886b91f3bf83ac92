//! The producer side of the search: propose candidates until told to stop.
use rand::Rng;

use arcset_shm::{RingBuffer, RingError};

use crate::heuristic::CandidateSearch;

/// Publishes candidate arc sets until the ring's interrupt flag is set.
///
/// Oversized candidates are discarded and retried with a fresh
/// permutation. Returns the number of solutions published.
pub fn run<R: Rng, const C: usize>(
    ring: &RingBuffer<C>,
    mut search: CandidateSearch<R>,
) -> Result<u64, RingError> {
    let mut published = 0;
    while !ring.is_shutdown() {
        let Some(candidate) = search.next_candidate() else {
            continue;
        };
        tracing::debug!(candidate = %candidate, "proposing candidate");
        if !ring.publish(&candidate)? {
            break;
        }
        published += 1;
    }
    Ok(published)
}
