use std::io;

use nix::errno::Errno;
use thiserror::Error;

use arcset_shm::RingError;

/// Fatal failure of a supervisor or generator process.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error(transparent)]
    Ring(#[from] RingError),

    #[error("installing signal handlers failed: {0}")]
    Signal(#[from] Errno),

    #[error("writing report failed: {0}")]
    Report(#[from] io::Error),
}
