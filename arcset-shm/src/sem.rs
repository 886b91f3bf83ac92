//! Named POSIX semaphores.
//!
//! `nix` does not wrap the `sem_open` family, so this module goes through
//! `libc` directly. Semaphores are kernel objects identified by a
//! slash-prefixed name; they outlive the processes that open them until
//! explicitly unlinked.
use std::ffi::CString;
use std::time::Duration;

use nix::errno::Errno;
use tracing::warn;

const NANOS_PER_SEC: i64 = 1_000_000_000;

/// A handle to a named counting semaphore.
///
/// Dropping the handle closes it; the name persists until [`unlink`]ed by
/// the owning process.
///
/// [`unlink`]: NamedSemaphore::unlink
pub struct NamedSemaphore {
    sem: *mut libc::sem_t,
    name: String,
}

// SAFETY: sem_wait/sem_post/sem_close are thread-safe by POSIX; the raw
// pointer is only ever passed to them.
unsafe impl Send for NamedSemaphore {}
unsafe impl Sync for NamedSemaphore {}

impl NamedSemaphore {
    /// Creates a semaphore with the given initial value, failing if the
    /// name already exists.
    pub fn create(name: &str, initial: u32) -> nix::Result<Self> {
        let cname = cstring(name)?;
        let sem = unsafe {
            libc::sem_open(
                cname.as_ptr(),
                libc::O_CREAT | libc::O_EXCL,
                0o600 as libc::c_uint,
                initial as libc::c_uint,
            )
        };
        if sem == libc::SEM_FAILED {
            return Err(Errno::last());
        }
        Ok(Self {
            sem,
            name: name.to_string(),
        })
    }

    /// Opens an existing semaphore by name.
    pub fn open(name: &str) -> nix::Result<Self> {
        let cname = cstring(name)?;
        let sem = unsafe { libc::sem_open(cname.as_ptr(), 0) };
        if sem == libc::SEM_FAILED {
            return Err(Errno::last());
        }
        Ok(Self {
            sem,
            name: name.to_string(),
        })
    }

    /// Decrements the semaphore, blocking while its value is zero.
    ///
    /// Returns `Err(Errno::EINTR)` if a signal arrives while blocked; the
    /// caller decides whether that is a shutdown request or noise.
    pub fn wait(&self) -> nix::Result<()> {
        Errno::result(unsafe { libc::sem_wait(self.sem) }).map(drop)
    }

    /// Like [`wait`](Self::wait), but retries waits interrupted by signals.
    pub fn wait_uninterrupted(&self) -> nix::Result<()> {
        loop {
            match self.wait() {
                Err(Errno::EINTR) => continue,
                other => return other,
            }
        }
    }

    /// Decrements the semaphore, giving up after `timeout`.
    ///
    /// Returns `Ok(true)` once decremented and `Ok(false)` on timeout.
    /// Interrupted waits are retried against the original deadline.
    pub fn wait_timeout(&self, timeout: Duration) -> nix::Result<bool> {
        let deadline = deadline(timeout)?;
        loop {
            match Errno::result(unsafe { libc::sem_timedwait(self.sem, &deadline) }) {
                Ok(_) => return Ok(true),
                Err(Errno::ETIMEDOUT) => return Ok(false),
                Err(Errno::EINTR) => continue,
                Err(errno) => return Err(errno),
            }
        }
    }

    /// Increments the semaphore, waking one blocked waiter if any.
    pub fn post(&self) -> nix::Result<()> {
        Errno::result(unsafe { libc::sem_post(self.sem) }).map(drop)
    }

    /// Removes a semaphore name from the system. Open handles stay usable
    /// until closed.
    pub fn unlink(name: &str) -> nix::Result<()> {
        let cname = cstring(name)?;
        Errno::result(unsafe { libc::sem_unlink(cname.as_ptr()) }).map(drop)
    }
}

impl Drop for NamedSemaphore {
    fn drop(&mut self) {
        if let Err(errno) = Errno::result(unsafe { libc::sem_close(self.sem) }) {
            warn!(name = %self.name, %errno, "closing semaphore failed");
        }
    }
}

fn cstring(name: &str) -> nix::Result<CString> {
    CString::new(name).map_err(|_| Errno::EINVAL)
}

/// Absolute `CLOCK_REALTIME` deadline `timeout` from now, as required by
/// `sem_timedwait`.
fn deadline(timeout: Duration) -> nix::Result<libc::timespec> {
    let mut now = libc::timespec {
        tv_sec: 0,
        tv_nsec: 0,
    };
    Errno::result(unsafe { libc::clock_gettime(libc::CLOCK_REALTIME, &mut now) })?;
    let nanos = now.tv_nsec + timeout.subsec_nanos() as i64;
    Ok(libc::timespec {
        tv_sec: now.tv_sec + timeout.as_secs() as i64 + nanos / NANOS_PER_SEC,
        tv_nsec: nanos % NANOS_PER_SEC,
    })
}
