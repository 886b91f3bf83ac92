use nix::errno::Errno;
use thiserror::Error;

/// Failure of an operation on the shared ring or its semaphores.
#[derive(Debug, Error)]
pub enum RingError {
    /// A named object could not be created. Includes the case where the
    /// object already exists, which indicates unclean state left behind by
    /// a crashed prior run.
    #[error("creating {name} failed: {source}")]
    Create { name: String, source: Errno },

    /// A pre-existing named object could not be opened. For producers this
    /// means there is no active consumer to publish to.
    #[error("attaching to {name} failed: {source}")]
    Attach { name: String, source: Errno },

    /// A semaphore operation failed after setup.
    #[error("semaphore {name}: {source}")]
    Sem { name: String, source: Errno },

    /// A blocking consumer wait was interrupted by a signal before a
    /// solution became available.
    #[error("wait interrupted by signal")]
    Interrupted,
}

impl RingError {
    pub(crate) fn sem(name: &str, source: Errno) -> Self {
        Self::Sem {
            name: name.to_string(),
            source,
        }
    }
}
