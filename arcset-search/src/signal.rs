//! Cooperative shutdown on SIGINT/SIGTERM.
//!
//! The handlers do nothing but set a flag; all cleanup runs on the normal
//! exit path of the main loop, never in handler context. They are
//! installed without `SA_RESTART` so a semaphore wait blocked in the main
//! loop returns with `EINTR` and the loop gets to observe the flag.
use std::sync::atomic::{AtomicBool, Ordering};

use nix::errno::Errno;
use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};

static SHUTDOWN: AtomicBool = AtomicBool::new(false);

/// A read-only view of the shutdown flag.
#[derive(Clone, Copy, Debug)]
pub struct ShutdownToken {
    flag: &'static AtomicBool,
}

impl ShutdownToken {
    pub const fn new(flag: &'static AtomicBool) -> Self {
        Self { flag }
    }

    pub fn is_set(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

extern "C" fn request_shutdown(_signal: libc::c_int) {
    SHUTDOWN.store(true, Ordering::SeqCst);
}

/// Installs the termination handlers and returns the token they trip.
pub fn install() -> Result<ShutdownToken, Errno> {
    let action = SigAction::new(
        SigHandler::Handler(request_shutdown),
        SaFlags::empty(),
        SigSet::empty(),
    );
    // SAFETY: the handler only performs an atomic store, which is
    // async-signal-safe.
    unsafe {
        sigaction(Signal::SIGINT, &action)?;
        sigaction(Signal::SIGTERM, &action)?;
    }
    Ok(ShutdownToken::new(&SHUTDOWN))
}
