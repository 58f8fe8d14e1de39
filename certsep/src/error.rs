use crate::comm::{Comm, Comp};
use derive_more::Display;
use log::warn;
use nix::unistd::Pid;
use std::{collections::TryReserveError, string::FromUtf8Error};

/// Failures at the trust boundary between privilege-separated processes.
#[derive(Debug, Display)]
pub enum Error {
    #[display(fmt = "{}", "_0")]
    Unix(nix::Error),
    #[display(fmt = "read: {}: {}", "_0", "_1")]
    Read(Comm, nix::Error),
    #[display(fmt = "short read: {}", "_0")]
    ShortRead(Comm),
    #[display(fmt = "read: {} length: {}", "_0", "_1")]
    ReadLength(Comm, nix::Error),
    #[display(fmt = "short read: {} length", "_0")]
    ShortReadLength(Comm),
    #[display(fmt = "end of channel: {} length", "_0")]
    UnexpectedEof(Comm),
    #[display(fmt = "allocate: {}: {}", "_0", "_1")]
    Alloc(Comm, TryReserveError),
    #[display(fmt = "invalid text: {}: {}", "_0", "_1")]
    InvalidText(Comm, FromUtf8Error),
    #[display(fmt = "write: {}: {}", "_0", "_1")]
    Write(Comm, nix::Error),
    #[display(fmt = "short write: {}", "_0")]
    ShortWrite(Comm),
    #[display(fmt = "write: {} length: {}", "_0", "_1")]
    WriteLength(Comm, nix::Error),
    #[display(fmt = "short write: {} length", "_0")]
    ShortWriteLength(Comm),
    #[display(fmt = "waitpid: {}", "_0")]
    Wait(nix::Error),
    #[display(fmt = "bad exit: {}({}) ({})", "_0", "_1", "_2")]
    AbnormalExit(Comp, Pid, &'static str),
    #[display(fmt = "bad exit code: {}({}): {}", "_0", "_1", "_2")]
    ExitCode(Comp, Pid, i32),
    #[display(fmt = "failed to drop privileges ({}): {}", "_0", "_1")]
    Privdrop(&'static str, nix::Error),
    #[display(fmt = "failed to drop {}", "_0")]
    PrivdropVerify(&'static str),
}

impl std::error::Error for Error {}

impl From<nix::Error> for Error {
    fn from(err: nix::Error) -> Self {
        Error::Unix(err)
    }
}

/// Report a failure where it is detected, then hand it to the caller.
pub(crate) fn fail<T>(err: Error) -> Result<T, Error> {
    warn!("{}", err);
    Err(err)
}
