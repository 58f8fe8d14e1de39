use certsep::{process, Comp, Error};
use nix::{
    sys::signal::{kill, Signal},
    unistd::{fork, getuid, ForkResult, Gid, Pid, Uid},
};
use std::sync::Once;

/// Route the crate's diagnostics to stderr for the whole test binary.
fn init_log() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        if let Ok(guard) = certsep_log::sync_logger("certsep-test", true) {
            std::mem::forget(guard);
        }
    });
}

fn spawn<F: FnOnce() -> i32>(body: F) -> Pid {
    match unsafe { fork() }.expect("fork") {
        ForkResult::Parent { child, .. } => child,
        ForkResult::Child => {
            let code = body();
            unsafe { libc::_exit(code) }
        }
    }
}

#[test]
fn clean_exit_is_success() {
    let pid = spawn(|| 0);

    assert!(process::await_child(pid, Comp::Net).is_ok());
}

#[test]
fn nonzero_exit_is_reported() {
    init_log();
    let pid = spawn(|| 1);

    match process::await_child(pid, Comp::Key) {
        Err(Error::ExitCode(Comp::Key, reported, 1)) => assert_eq!(reported, pid),
        other => panic!("expected exit-code failure, got {:?}", other),
    }
}

#[test]
fn signaled_child_is_reported_by_name() {
    let pid = spawn(|| loop {
        unsafe { libc::pause() };
    });

    kill(pid, Signal::SIGKILL).unwrap();
    match process::await_child(pid, Comp::Challenge) {
        Err(Error::AbnormalExit(Comp::Challenge, _, name)) => assert_eq!(name, "SIGKILL"),
        other => panic!("expected abnormal-exit failure, got {:?}", other),
    }
}

#[test]
fn wait_failure_is_reported() {
    // Reap the child once; the second wait has nobody left to wait for.
    let pid = spawn(|| 0);
    process::await_child(pid, Comp::Dns).unwrap();

    match process::await_child(pid, Comp::Dns) {
        Err(Error::Wait(_)) => {}
        other => panic!("expected wait failure, got {:?}", other),
    }
}

#[test]
fn confinement_failure_is_reported() {
    init_log();
    match process::confine_filesystem("/nonexistent-certsep-root") {
        Err(Error::Privdrop("chroot", _)) => {}
        other => panic!("expected chroot failure, got {:?}", other),
    }
}

#[test]
fn drop_identity_fails_without_privilege() {
    if getuid().is_root() {
        return;
    }

    // Even re-asserting the current identity needs the setgroups step,
    // which an unprivileged process is not allowed to perform.
    assert!(process::drop_identity(getuid(), nix::unistd::getgid()).is_err());
}

// The real bootstrap needs root.  The assertions run in a forked child
// so the test process itself keeps its privileges and can be reused.
#[test]
fn bootstrap_confines_and_drops() {
    if !getuid().is_root() {
        eprintln!("skipping bootstrap test: not running as root");
        return;
    }

    let target_uid = Uid::from_raw(65534);
    let target_gid = Gid::from_raw(65534);

    let pid = spawn(move || {
        if process::confine_filesystem("/tmp").is_err() {
            return 2;
        }
        match std::env::current_dir() {
            Ok(dir) if dir == std::path::Path::new("/") => {}
            _ => return 3,
        }
        if process::drop_identity(target_uid, target_gid).is_err() {
            return 4;
        }
        if nix::unistd::getuid() != target_uid || nix::unistd::geteuid() != target_uid {
            return 5;
        }
        if nix::unistd::getgid() != target_gid || nix::unistd::getegid() != target_gid {
            return 6;
        }
        // Once dropped, the way back up must be gone.
        if nix::unistd::seteuid(Uid::from_raw(0)).is_ok() {
            return 7;
        }
        0
    });

    assert!(process::await_child(pid, Comp::File).is_ok());
}
