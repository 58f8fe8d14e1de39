//! Trust-boundary primitives for a privilege-separated certificate client.
//!
//! A certificate-issuance client is split into cooperating processes
//! that each hold one capability: network access, a private key,
//! filesystem write access, root.  No single process ever holds all of
//! them.  This crate is the layer those processes trust each other
//! through:
//!
//! - [`Channel`]: typed frames over anonymous duplex pipes - fixed-width
//!   operation frames and length-prefixed buffer frames, blocking and
//!   strictly ordered per channel.
//! - a signal-safe writer: a peer that exits cannot take the writing
//!   process down with it; the write fails with `EPIPE` instead.
//! - [`process::await_child`]: the one place where a worker's fate is
//!   judged.  Channel closure says nothing; only a clean zero exit does.
//! - [`process::confine_filesystem`] and [`process::drop_identity`]:
//!   the privilege-separation bootstrap.  Both verify that the change
//!   actually took effect before a worker reads attacker-influenced
//!   input.
//!
//! What this crate deliberately is not: the issuance protocol itself,
//! the process topology, or any channel encryption - the two ends of a
//! kernel socketpair inherit their integrity from the OS process model.
//! Channels carry no multiplexing and no timeouts; every operation
//! blocks until the peer acts or the channel goes away.
//!
//! One thread of control per process is assumed throughout.  The
//! SIGPIPE disposition toggled around writes is process-global state
//! and its save/restore would race between threads.
//!
//! # Examples
//!
//! ```
//! use certsep::{Channel, Comm};
//!
//! # fn main() -> Result<(), certsep::Error> {
//! let (parent, child) = Channel::pair()?;
//!
//! parent.write_str(Comm::Token, "mCUY-L2IA")?;
//! assert_eq!(child.read_str(Comm::Token)?, "mCUY-L2IA");
//! # Ok(())
//! # }
//! ```

pub mod channel;
pub mod comm;
mod error;
pub mod process;
mod sigpipe;

pub use {
    channel::Channel,
    comm::{Comm, Comp},
    error::Error,
    process::{await_child, confine_filesystem, drop_identity},
};
