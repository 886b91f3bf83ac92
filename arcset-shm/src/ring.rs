//! The shared solution ring and its bounded-buffer protocol.
//!
//! The ring is a `#[repr(C)]` struct mapped verbatim into every
//! participating process. Producers claim slots under a semaphore mutex;
//! the single consumer reads without one. Backpressure comes from the
//! free-slot semaphore alone: a producer facing a full ring blocks until
//! the consumer frees a slot.
use std::cell::UnsafeCell;
use std::mem;
use std::num::NonZeroUsize;
use std::os::fd::OwnedFd;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use nix::errno::Errno;
use nix::fcntl::OFlag;
use nix::sys::mman::{self, MapFlags, ProtFlags};
use nix::sys::stat::Mode;
use nix::unistd::ftruncate;
use tracing::warn;

use crate::error::RingError;
use crate::sem::NamedSemaphore;
use crate::solution::Solution;

/// Capacity of the production ring.
pub const MAX_DATA: usize = 20;

/// How often a producer blocked on a full ring re-checks the interrupt flag.
const SHUTDOWN_POLL: Duration = Duration::from_millis(50);

/// The ring sized for production use.
pub type ArcSetRing = RingBuffer<MAX_DATA>;

/// Names of the shared segment and its three semaphores.
///
/// Every process participating in one search run must use the same set of
/// names. The defaults are the production names; tests derive unique ones
/// via [`with_prefix`](RingConfig::with_prefix) so concurrent runs cannot
/// collide.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RingConfig {
    pub segment: String,
    pub mutex: String,
    pub free: String,
    pub used: String,
}

impl RingConfig {
    /// Derives the four object names from a common prefix.
    pub fn with_prefix(prefix: &str) -> Self {
        Self {
            segment: format!("/{prefix}_ring"),
            mutex: format!("/{prefix}_mutex"),
            free: format!("/{prefix}_free"),
            used: format!("/{prefix}_used"),
        }
    }
}

impl Default for RingConfig {
    fn default() -> Self {
        Self::with_prefix("arcset")
    }
}

/// The shared-memory layout, mapped verbatim by every process.
///
/// All-zero bytes are a valid initial state: empty slots, both cursors at
/// zero, interrupt clear. The segment is created zero-filled by
/// `ftruncate`, so a freshly created ring needs no further initialization.
#[repr(C)]
struct RingLayout<const C: usize> {
    /// Next slot a producer will fill. Guarded by the mutex semaphore.
    write_pos: AtomicU32,
    /// Next slot the consumer will read. Touched only by the consumer.
    read_pos: AtomicU32,
    /// Set once by the consumer to tell every producer to stop; never reset.
    interrupt: AtomicBool,
    slots: [UnsafeCell<Solution>; C],
}

/// A handle to the shared ring, either owned (consumer side) or attached
/// (producer side).
///
/// The owner created the named objects and unlinks them when dropped;
/// attached handles only close their own descriptors. All handles may
/// call [`publish`](Self::publish); [`take`](Self::take) must only ever
/// have a single caller, the owner.
///
/// # Examples
///
/// ```
/// use arcset_shm::{Edge, RingBuffer, RingConfig, Solution};
///
/// let config = RingConfig::with_prefix(&format!("doc_{}", std::process::id()));
/// let ring: RingBuffer<4> = RingBuffer::create(config.clone())?;
///
/// let producer: RingBuffer<4> = RingBuffer::attach(config)?;
/// let solution = Solution::from_edges([Edge { from: 1, to: 2 }]).unwrap();
/// assert!(producer.publish(&solution)?);
///
/// assert_eq!(ring.take()?, solution);
/// # Ok::<(), arcset_shm::RingError>(())
/// ```
pub struct RingBuffer<const C: usize> {
    layout: NonNull<RingLayout<C>>,
    _fd: OwnedFd,
    mutex: NamedSemaphore,
    free: NamedSemaphore,
    used: NamedSemaphore,
    config: RingConfig,
    owner: bool,
}

// SAFETY: the slot array is synchronized by the semaphore protocol (free
// and used counts plus the producer mutex); cursors and the interrupt flag
// are atomics. The raw mapping itself is valid for the handle's lifetime.
unsafe impl<const C: usize> Send for RingBuffer<C> {}
unsafe impl<const C: usize> Sync for RingBuffer<C> {}

impl<const C: usize> RingBuffer<C> {
    /// Creates the segment and semaphores, failing if any of the names
    /// already exists.
    ///
    /// On failure partway through, every object created so far is
    /// unlinked again so a clean retry is possible.
    pub fn create(config: RingConfig) -> Result<Self, RingError> {
        let create_err = |name: &str| {
            let name = name.to_string();
            move |source: Errno| RingError::Create { name, source }
        };

        let fd = mman::shm_open(
            config.segment.as_str(),
            OFlag::O_CREAT | OFlag::O_EXCL | OFlag::O_RDWR,
            Mode::S_IRUSR | Mode::S_IWUSR,
        )
        .map_err(create_err(&config.segment))?;

        let mut cleanup = Cleanup::new(&config);
        cleanup.segment = true;

        ftruncate(&fd, mem::size_of::<RingLayout<C>>() as libc::off_t)
            .map_err(create_err(&config.segment))?;
        let layout = Self::map(&fd).map_err(create_err(&config.segment))?;

        let mutex =
            NamedSemaphore::create(&config.mutex, 1).map_err(create_err(&config.mutex))?;
        cleanup.mutex = true;
        let free = NamedSemaphore::create(&config.free, C as u32)
            .map_err(create_err(&config.free))?;
        cleanup.free = true;
        let used = NamedSemaphore::create(&config.used, 0).map_err(create_err(&config.used))?;

        cleanup.disarm();
        drop(cleanup);
        Ok(Self {
            layout,
            _fd: fd,
            mutex,
            free,
            used,
            config,
            owner: true,
        })
    }

    /// Attaches to a ring created by another process.
    ///
    /// Fails if the segment or any semaphore does not exist, which means
    /// there is no active consumer to publish to.
    pub fn attach(config: RingConfig) -> Result<Self, RingError> {
        let attach_err = |name: &str| {
            let name = name.to_string();
            move |source: Errno| RingError::Attach { name, source }
        };

        let fd = mman::shm_open(config.segment.as_str(), OFlag::O_RDWR, Mode::empty())
            .map_err(attach_err(&config.segment))?;
        let layout = Self::map(&fd).map_err(attach_err(&config.segment))?;

        let mutex = NamedSemaphore::open(&config.mutex).map_err(attach_err(&config.mutex))?;
        let free = NamedSemaphore::open(&config.free).map_err(attach_err(&config.free))?;
        let used = NamedSemaphore::open(&config.used).map_err(attach_err(&config.used))?;

        Ok(Self {
            layout,
            _fd: fd,
            mutex,
            free,
            used,
            config,
            owner: false,
        })
    }

    fn map(fd: &OwnedFd) -> nix::Result<NonNull<RingLayout<C>>> {
        let length = NonZeroUsize::new(mem::size_of::<RingLayout<C>>()).unwrap();
        // SAFETY: a fresh MAP_SHARED mapping of `length` bytes; the segment
        // was sized to exactly this layout by the creator.
        let addr = unsafe {
            mman::mmap(
                None,
                length,
                ProtFlags::PROT_READ | ProtFlags::PROT_WRITE,
                MapFlags::MAP_SHARED,
                fd,
                0,
            )?
        };
        Ok(addr.cast())
    }

    fn layout(&self) -> &RingLayout<C> {
        // SAFETY: the mapping stays valid until drop. Concurrent access
        // from other processes goes through atomics or is synchronized by
        // the semaphore protocol.
        unsafe { self.layout.as_ref() }
    }

    pub const fn capacity(&self) -> usize {
        C
    }

    /// Publishes one solution, blocking while the ring is full.
    ///
    /// Returns `Ok(false)` without publishing if shutdown is observed
    /// while waiting for a free slot, so a producer cannot be stranded on
    /// a ring nobody drains anymore.
    pub fn publish(&self, solution: &Solution) -> Result<bool, RingError> {
        loop {
            if self.is_shutdown() {
                return Ok(false);
            }
            match self.free.wait_timeout(SHUTDOWN_POLL) {
                Ok(true) => break,
                Ok(false) => continue,
                Err(errno) => return Err(RingError::sem(&self.config.free, errno)),
            }
        }

        self.mutex
            .wait_uninterrupted()
            .map_err(|errno| RingError::sem(&self.config.mutex, errno))?;
        let layout = self.layout();
        let pos = layout.write_pos.load(Ordering::Relaxed) as usize;
        // SAFETY: the mutex serializes claim-and-advance among producers,
        // and the free-slot wait above guarantees the consumer is done
        // with this slot.
        unsafe { *layout.slots[pos].get() = *solution };
        layout
            .write_pos
            .store(((pos + 1) % C) as u32, Ordering::Release);
        self.mutex
            .post()
            .map_err(|errno| RingError::sem(&self.config.mutex, errno))?;

        self.used
            .post()
            .map_err(|errno| RingError::sem(&self.config.used, errno))?;
        Ok(true)
    }

    /// Takes the oldest unread solution, blocking while the ring is empty.
    ///
    /// Must only ever be called from the single consumer process. Returns
    /// [`RingError::Interrupted`] if a signal arrives while blocked, so
    /// the caller can run its shutdown check.
    pub fn take(&self) -> Result<Solution, RingError> {
        match self.used.wait() {
            Ok(()) => {}
            Err(Errno::EINTR) => return Err(RingError::Interrupted),
            Err(errno) => return Err(RingError::sem(&self.config.used, errno)),
        }

        let layout = self.layout();
        let pos = layout.read_pos.load(Ordering::Relaxed) as usize;
        // SAFETY: the used-slot wait above guarantees this slot holds a
        // fully published solution, and no producer may reuse it before
        // the free-slot post below.
        let solution = unsafe { *layout.slots[pos].get() };
        self.free
            .post()
            .map_err(|errno| RingError::sem(&self.config.free, errno))?;
        layout
            .read_pos
            .store(((pos + 1) % C) as u32, Ordering::Release);
        Ok(solution)
    }

    /// Tells every producer to stop. Sticky: once set it is never reset.
    pub fn shutdown(&self) {
        self.layout().interrupt.store(true, Ordering::SeqCst);
    }

    pub fn is_shutdown(&self) -> bool {
        self.layout().interrupt.load(Ordering::SeqCst)
    }
}

impl<const C: usize> Drop for RingBuffer<C> {
    fn drop(&mut self) {
        // Every release step runs even if an earlier one fails; failures
        // are logged individually.
        // SAFETY: the mapping was created by `map` with this exact length
        // and is not used past this point.
        if let Err(errno) =
            unsafe { mman::munmap(self.layout.cast(), mem::size_of::<RingLayout<C>>()) }
        {
            warn!(segment = %self.config.segment, %errno, "unmapping shared segment failed");
        }
        if self.owner {
            if let Err(errno) = mman::shm_unlink(self.config.segment.as_str()) {
                warn!(segment = %self.config.segment, %errno, "unlinking shared segment failed");
            }
            for name in [&self.config.mutex, &self.config.free, &self.config.used] {
                if let Err(errno) = NamedSemaphore::unlink(name) {
                    warn!(%name, %errno, "unlinking semaphore failed");
                }
            }
        }
    }
}

/// Unlinks the named objects created so far if setup fails before a
/// `RingBuffer` takes ownership of them.
struct Cleanup<'a> {
    config: &'a RingConfig,
    segment: bool,
    mutex: bool,
    free: bool,
    armed: bool,
}

impl<'a> Cleanup<'a> {
    fn new(config: &'a RingConfig) -> Self {
        Self {
            config,
            segment: false,
            mutex: false,
            free: false,
            armed: true,
        }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for Cleanup<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if self.segment {
            let _ = mman::shm_unlink(self.config.segment.as_str());
        }
        if self.mutex {
            let _ = NamedSemaphore::unlink(&self.config.mutex);
        }
        if self.free {
            let _ = NamedSemaphore::unlink(&self.config.free);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_names_share_the_prefix() {
        let config = RingConfig::with_prefix("run7");
        assert_eq!(config.segment, "/run7_ring");
        assert_eq!(config.mutex, "/run7_mutex");
        assert_eq!(config.free, "/run7_free");
        assert_eq!(config.used, "/run7_used");
    }

    #[test]
    fn default_config_uses_production_names() {
        assert_eq!(RingConfig::default(), RingConfig::with_prefix("arcset"));
    }
}
