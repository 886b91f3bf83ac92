//! The consumer side of the search: drain the ring, report improvements,
//! and run the termination protocol.
use std::io::Write;

use arcset_shm::{RingBuffer, RingError};

use crate::report::{BestTracker, Verdict};
use crate::signal::ShutdownToken;
use crate::SearchError;

/// Why the supervisor stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// A generator proved the graph acyclic.
    Acyclic,
    /// A termination signal requested shutdown.
    Interrupted,
}

enum State {
    Running,
    Draining,
    Done,
}

/// Drains the ring until the graph turns out to be acyclic or a signal
/// trips `shutdown`, then tells every generator to stop.
///
/// Progress goes to `out`: the baseline solution is recorded silently,
/// every strictly smaller solution is printed, ties and regressions are
/// dropped. The caller keeps ownership of the ring; dropping it after
/// this returns releases every named object.
pub fn run<W: Write, const C: usize>(
    ring: &RingBuffer<C>,
    shutdown: &ShutdownToken,
    out: &mut W,
) -> Result<Outcome, SearchError> {
    let mut tracker = BestTracker::new();
    let mut outcome = Outcome::Interrupted;
    let mut state = State::Running;

    loop {
        match state {
            State::Running => {
                if shutdown.is_set() {
                    state = State::Draining;
                    continue;
                }
                match ring.take() {
                    Ok(solution) => match tracker.observe(&solution) {
                        Verdict::Acyclic => {
                            writeln!(out, "The graph is acyclic!")?;
                            outcome = Outcome::Acyclic;
                            state = State::Draining;
                        }
                        Verdict::Improved => {
                            writeln!(
                                out,
                                "Solution with {} edges: {}",
                                solution.len(),
                                solution
                            )?;
                        }
                        Verdict::Baseline | Verdict::Ignored => {}
                    },
                    // A signal arrived while blocked; loop back to the
                    // shutdown check.
                    Err(RingError::Interrupted) => {}
                    Err(err) => return Err(err.into()),
                }
            }
            State::Draining => {
                ring.shutdown();
                state = State::Done;
            }
            State::Done => return Ok(outcome),
        }
    }
}
