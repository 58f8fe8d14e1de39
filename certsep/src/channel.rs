//! Channel codec: typed frames over anonymous duplex pipes.
//!
//! Two frame shapes travel on a channel.  An *operation frame* is a
//! single native `c_long`, written raw with no prefix; it carries the
//! small signaling values of the issuance protocol.  A *buffer frame*
//! is a native `usize` length immediately followed by exactly that
//! many bytes.  Byte order is native on both ends: the two processes
//! are forked from one parent and always share an architecture.
//!
//! Reads and writes block, frames are FIFO per channel, and a frame
//! either completes or the call fails; no partial result ever reaches
//! the caller.  A failed buffer write after a transmitted length
//! prefix leaves the peer mid-frame with no way to resynchronize;
//! the caller's only sound move is to tear the channel down.
//!
//! Every frame is read with a single read(2), so a frame must fit the
//! kernel's socket buffer to arrive in one piece; a buffer frame
//! larger than that is reported as a short read even when the peer's
//! blocking write eventually delivers all of it.  The issuance
//! protocol's payloads are small; callers moving bulk data have to
//! chunk it into frames themselves.

use crate::{
    comm::Comm,
    error::{fail, Error},
    sigpipe::SigPipeGuard,
};
use libc::c_long;
use nix::{
    sys::socket::{socketpair, AddressFamily, SockFlag, SockType},
    unistd::{close, dup, read, write},
};
use std::{
    mem,
    os::unix::io::{AsRawFd, IntoRawFd, RawFd},
};

const OP_WIDTH: usize = mem::size_of::<c_long>();
const LEN_WIDTH: usize = mem::size_of::<usize>();

/// Owned descriptor, closed on drop.
#[derive(Debug)]
struct Fd(RawFd);

impl Drop for Fd {
    fn drop(&mut self) {
        let _ = close(self.0);
    }
}

/// One end of a duplex byte channel between two privilege-separated
/// processes.
///
/// Each end is owned by exactly one process; after a fork, each side
/// drops the end it does not keep.  Dropping the channel closes it,
/// which a peer blocked in [`read_op`](Channel::read_op) observes as
/// end-of-channel.
#[derive(Debug)]
pub struct Channel {
    fd: Fd,
}

impl Channel {
    /// Create a connected channel pair, typically split across a fork.
    pub fn pair() -> Result<(Self, Self), Error> {
        let (a, b) = socketpair(
            AddressFamily::Unix,
            SockType::Stream,
            None,
            SockFlag::empty(),
        )?;

        Ok((Self { fd: Fd(a) }, Self { fd: Fd(b) }))
    }

    /// Adopt a descriptor inherited from the parent topology.
    pub fn from_raw_fd<T: IntoRawFd>(fd: T) -> Self {
        Self {
            fd: Fd(fd.into_raw_fd()),
        }
    }

    /// Duplicate the underlying descriptor into an independent end.
    pub fn try_clone(&self) -> Result<Self, Error> {
        let fd = dup(self.fd.0)?;

        Ok(Self { fd: Fd(fd) })
    }

    /// Read one operation frame.
    ///
    /// `Ok(None)` means the peer closed the channel before sending
    /// another frame; that is the regular end of a conversation, not a
    /// failure.  A frame cut off mid-value is a short read.
    pub fn read_op(&self, comm: Comm) -> Result<Option<c_long>, Error> {
        let mut frame = [0; OP_WIDTH];

        match read(self.fd.0, &mut frame) {
            Ok(0) => Ok(None),
            Ok(n) if n == OP_WIDTH => Ok(Some(c_long::from_ne_bytes(frame))),
            Ok(_) => fail(Error::ShortRead(comm)),
            Err(err) => fail(Error::Read(comm, err)),
        }
    }

    /// Write one operation frame.  All-or-nothing: anything but a full
    /// write of the value is a failure.
    pub fn write_op(&self, comm: Comm, op: c_long) -> Result<(), Error> {
        let _guard = SigPipeGuard::install()?;

        match write(self.fd.0, &op.to_ne_bytes()) {
            Ok(n) if n == OP_WIDTH => Ok(()),
            Ok(_) => fail(Error::ShortWrite(comm)),
            Err(err) => fail(Error::Write(comm, err)),
        }
    }

    /// Read one buffer frame and hand the bytes to the caller.
    ///
    /// Unlike operation frames, end-of-channel on the length prefix is
    /// an error here: a buffer frame is never optional once expected.
    /// The payload is read with a single read(2); a frame exceeding the
    /// socket buffer fails as a short read (see the module docs).
    pub fn read_buf(&self, comm: Comm) -> Result<Vec<u8>, Error> {
        let mut prefix = [0; LEN_WIDTH];
        let len = match read(self.fd.0, &mut prefix) {
            Ok(0) => return fail(Error::UnexpectedEof(comm)),
            Ok(n) if n == LEN_WIDTH => usize::from_ne_bytes(prefix),
            Ok(_) => return fail(Error::ShortReadLength(comm)),
            Err(err) => return fail(Error::ReadLength(comm, err)),
        };

        // The length is bounded by the peer's protocol, not here.
        let mut buf = Vec::new();
        if let Err(err) = buf.try_reserve_exact(len) {
            return fail(Error::Alloc(comm, err));
        }
        buf.resize(len, 0);

        match read(self.fd.0, &mut buf) {
            Ok(n) if n == len => Ok(buf),
            Ok(_) => fail(Error::ShortRead(comm)),
            Err(err) => fail(Error::Read(comm, err)),
        }
    }

    /// Read a buffer frame as UTF-8 text.
    pub fn read_str(&self, comm: Comm) -> Result<String, Error> {
        let buf = self.read_buf(comm)?;

        String::from_utf8(buf).or_else(|err| fail(Error::InvalidText(comm, err)))
    }

    /// Write one buffer frame: the length prefix, then the payload.
    ///
    /// The two writes fail as a unit.  When the prefix was already
    /// transmitted the peer is stuck mid-frame; there is no resync
    /// protocol, so the caller must close the channel.
    pub fn write_buf(&self, comm: Comm, buf: &[u8]) -> Result<(), Error> {
        let _guard = SigPipeGuard::install()?;

        match write(self.fd.0, &buf.len().to_ne_bytes()) {
            Ok(n) if n == LEN_WIDTH => {}
            Ok(_) => return fail(Error::ShortWriteLength(comm)),
            Err(err) => return fail(Error::WriteLength(comm, err)),
        }

        match write(self.fd.0, buf) {
            Ok(n) if n == buf.len() => Ok(()),
            Ok(_) => fail(Error::ShortWrite(comm)),
            Err(err) => fail(Error::Write(comm, err)),
        }
    }

    /// Write a buffer frame from text; the length is measured, the
    /// terminator stays out of the wire format.
    pub fn write_str(&self, comm: Comm, text: &str) -> Result<(), Error> {
        self.write_buf(comm, text.as_bytes())
    }

    /// Close this end.  Equivalent to dropping the channel; provided so
    /// call sites can make the shutdown explicit.
    pub fn close(self) {}
}

impl AsRawFd for Channel {
    fn as_raw_fd(&self) -> RawFd {
        self.fd.0
    }
}

impl IntoRawFd for Channel {
    fn into_raw_fd(self) -> RawFd {
        let fd = self.fd.0;
        mem::forget(self);
        fd
    }
}
