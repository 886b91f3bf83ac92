//! Bounded-buffer coordination between processes over POSIX shared memory.
//!
//! A single consumer creates a fixed-capacity ring of candidate solutions in
//! a named shared-memory segment, guarded by three named semaphores: a count
//! of free slots, a count of used slots, and a mutex serializing concurrent
//! producers. Any number of producer processes attach to the segment by name
//! and publish solutions; the consumer drains them in slot order and owns the
//! lifecycle of every named object.
pub mod ring;
pub mod sem;
pub mod solution;

mod error;

pub use error::RingError;
pub use ring::{ArcSetRing, RingBuffer, RingConfig, MAX_DATA};
pub use solution::{Edge, ParseEdgeError, Solution, MAX_EDGES};
