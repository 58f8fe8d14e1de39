//! Child supervision and the privilege-separation bootstrap.
//!
//! [`confine_filesystem`] and [`drop_identity`] are independent
//! primitives on purpose: a role that needs a confined filesystem but
//! keeps its user identity (or the other way around) calls only the
//! one it needs, in the order its threat model demands.  On any
//! failure the process is in an unconfirmed privilege state and must
//! be terminated, never continued.

use crate::{
    comm::Comp,
    error::{fail, Error},
};
use cfg_if::cfg_if;
use nix::{
    sys::wait::{waitpid, WaitStatus},
    unistd::{self, chdir, chroot, Gid, Pid, Uid},
};
use std::path::Path;

/// Block until `pid` has terminated and judge the result.
///
/// Channel closure alone says nothing about a worker's fate; a clean
/// worker and a crashed one both leave their channels closed.  Only a
/// normal exit with status zero counts as success.
pub fn await_child(pid: Pid, comp: Comp) -> Result<(), Error> {
    match waitpid(pid, None) {
        Err(err) => fail(Error::Wait(err)),
        Ok(WaitStatus::Exited(_, 0)) => Ok(()),
        Ok(WaitStatus::Exited(_, code)) => fail(Error::ExitCode(comp, pid, code)),
        Ok(WaitStatus::Signaled(_, signal, _)) => {
            fail(Error::AbnormalExit(comp, pid, signal.as_str()))
        }
        Ok(_) => fail(Error::AbnormalExit(comp, pid, "not-a-signal")),
    }
}

/// Confine the filesystem view to `root` and move into it.
///
/// A failure of the chdir after a successful chroot still fails the
/// call; the process state is inconsistent and the caller must not
/// proceed with it.
pub fn confine_filesystem<P: AsRef<Path>>(root: P) -> Result<(), Error> {
    chroot(root.as_ref()).or_else(|err| fail(Error::Privdrop("chroot", err)))?;
    chdir("/").or_else(|err| fail(Error::Privdrop("chdir", err)))?;

    Ok(())
}

/// Irreversibly drop to the unprivileged `uid`/`gid`.
///
/// Group identity changes first: once the user identity is gone the
/// process may no longer touch its groups.  The closing check against
/// the live identity is the actual safety property of this call - a
/// syscall reporting success is not, on its own, proof that anything
/// changed.
pub fn drop_identity(uid: Uid, gid: Gid) -> Result<(), Error> {
    #[cfg(not(any(target_os = "ios", target_os = "macos", target_os = "redox")))]
    unistd::setgroups(&[gid]).or_else(|err| fail(Error::Privdrop("setgroups", err)))?;

    set_group_identity(gid)?;
    set_user_identity(uid)?;

    if unistd::getgid() != gid || unistd::getegid() != gid {
        return fail(Error::PrivdropVerify("gid"));
    }
    if unistd::getuid() != uid || unistd::geteuid() != uid {
        return fail(Error::PrivdropVerify("uid"));
    }

    Ok(())
}

cfg_if! {
    if #[cfg(any(
        target_os = "android",
        target_os = "freebsd",
        target_os = "linux",
        target_os = "openbsd"
    ))] {
        fn set_group_identity(gid: Gid) -> Result<(), Error> {
            unistd::setresgid(gid, gid, gid).or_else(|err| fail(Error::Privdrop("setresgid", err)))
        }

        fn set_user_identity(uid: Uid) -> Result<(), Error> {
            unistd::setresuid(uid, uid, uid).or_else(|err| fail(Error::Privdrop("setresuid", err)))
        }
    } else {
        fn set_group_identity(gid: Gid) -> Result<(), Error> {
            unistd::setegid(gid).or_else(|err| fail(Error::Privdrop("setegid", err)))?;
            unistd::setgid(gid).or_else(|err| fail(Error::Privdrop("setgid", err)))
        }

        fn set_user_identity(uid: Uid) -> Result<(), Error> {
            // seteuid before setuid fails on macOS
            #[cfg(not(any(target_os = "ios", target_os = "macos")))]
            unistd::seteuid(uid).or_else(|err| fail(Error::Privdrop("seteuid", err)))?;
            unistd::setuid(uid).or_else(|err| fail(Error::Privdrop("setuid", err)))
        }
    }
}
