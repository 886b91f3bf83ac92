use std::process::ExitCode;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::Parser;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use tracing::{debug, error};

use arcset_search::graph::Graph;
use arcset_search::heuristic::CandidateSearch;
use arcset_search::{generator, init_tracing, SearchError};
use arcset_shm::{ArcSetRing, Edge, RingConfig};

/// Proposes randomized feedback arc sets for the given graph and feeds
/// them to a running supervisor.
///
/// Attaches to the shared ring the supervisor created; run the
/// supervisor first. Any number of generators may run concurrently.
#[derive(Debug, Parser)]
#[command(version)]
struct Args {
    /// Directed edges of the graph, e.g. `0-1 1-2 2-0`.
    #[arg(required = true, value_name = "EDGE")]
    edges: Vec<Edge>,
}

fn main() -> ExitCode {
    init_tracing();
    let args = Args::parse();
    match try_main(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn try_main(args: Args) -> Result<(), SearchError> {
    let graph = Graph::new(args.edges);
    let ring = ArcSetRing::attach(RingConfig::default())?;
    let search = CandidateSearch::new(graph, SmallRng::seed_from_u64(seed()));
    let published = generator::run(&ring, search)?;
    debug!(published, "stopped by supervisor");
    Ok(())
}

/// Mixes wall-clock time with the process id so sibling generators
/// started in the same instant still diverge.
fn seed() -> u64 {
    let micros = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_micros() as u64)
        .unwrap_or_default();
    micros ^ u64::from(std::process::id()).rotate_left(32)
}
