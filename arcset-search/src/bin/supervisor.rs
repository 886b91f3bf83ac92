use std::io;
use std::process::ExitCode;

use clap::Parser;
use tracing::error;

use arcset_search::supervisor::{self, Outcome};
use arcset_search::{init_tracing, signal, SearchError};
use arcset_shm::{ArcSetRing, RingConfig};

/// Collects candidate feedback arc sets from generator processes and
/// reports every improvement on the best solution seen.
///
/// Creates the shared ring and its semaphores, so it must be started
/// before any generator. Stops on SIGINT/SIGTERM or as soon as a
/// generator proves the graph acyclic, telling all generators to stop
/// and removing every shared object on the way out.
#[derive(Debug, Parser)]
#[command(version)]
struct Args {}

fn main() -> ExitCode {
    init_tracing();
    let Args {} = Args::parse();
    match try_main() {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn try_main() -> Result<Outcome, SearchError> {
    let shutdown = signal::install()?;
    let ring = ArcSetRing::create(RingConfig::default())?;
    supervisor::run(&ring, &shutdown, &mut io::stdout())
}
