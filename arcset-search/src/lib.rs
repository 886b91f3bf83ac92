//! Randomized search for a small feedback arc set of a directed graph.
//!
//! Many independent generator processes propose candidate arc sets derived
//! from random vertex orderings and publish them through the shared ring of
//! [`arcset_shm`]; a single supervisor process drains the ring, keeps the
//! best candidate seen, and coordinates shutdown.
pub mod generator;
pub mod graph;
pub mod heuristic;
pub mod report;
pub mod signal;
pub mod supervisor;

mod error;

pub use error::SearchError;

use tracing_subscriber::EnvFilter;

/// Installs the process-wide stderr logger. `RUST_LOG` selects the level,
/// defaulting to `info`.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
}
