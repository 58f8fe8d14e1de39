//! Scoped SIGPIPE interception around channel writes.
//!
//! A peer that exits tears its channel ends down; the next write from
//! this side would raise SIGPIPE and, under the default disposition,
//! terminate the process with it.  Writes instead run under a guard
//! that records the signal and lets the write return `EPIPE` through
//! the normal failure path.
//!
//! The disposition is process-global state.  Guards nest correctly on
//! one thread, but concurrent installation from several threads would
//! race on the save/restore; one thread of control per process is a
//! requirement of this crate.

use crate::error::Error;
use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};
use std::sync::atomic::{AtomicBool, Ordering};

static RECEIVED: AtomicBool = AtomicBool::new(false);

extern "C" fn on_sigpipe(_: libc::c_int) {
    // Stores to an atomic are async-signal-safe.
    RECEIVED.store(true, Ordering::SeqCst);
}

/// Replaces the SIGPIPE disposition for the lifetime of the guard and
/// restores the saved one on every exit path.
pub(crate) struct SigPipeGuard {
    saved: SigAction,
}

impl SigPipeGuard {
    pub(crate) fn install() -> Result<Self, Error> {
        let recorder = SigAction::new(
            SigHandler::Handler(on_sigpipe),
            SaFlags::empty(),
            SigSet::empty(),
        );
        let saved = unsafe { sigaction(Signal::SIGPIPE, &recorder) }?;

        Ok(Self { saved })
    }

    /// Whether a SIGPIPE arrived since the guard was installed.
    #[cfg(test)]
    pub(crate) fn pending() -> bool {
        RECEIVED.load(Ordering::SeqCst)
    }
}

impl Drop for SigPipeGuard {
    fn drop(&mut self) {
        let _ = unsafe { sigaction(Signal::SIGPIPE, &self.saved) };
        RECEIVED.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_records_and_restores() {
        let guard = SigPipeGuard::install().unwrap();

        // Deliver SIGPIPE to this thread; the recorder turns it into a
        // flag instead of a terminated test run.
        unsafe { libc::raise(libc::SIGPIPE) };
        assert!(SigPipeGuard::pending());

        drop(guard);
        assert!(!SigPipeGuard::pending());
    }
}
