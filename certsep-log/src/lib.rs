//! Synchronous logging crate inspired by OpenBSD's `log.c`.
//!
//! A privilege-separated process logs to stderr while it runs in the
//! foreground and to syslog once it has been daemonized.  The caller
//! keeps the returned guard alive for the lifetime of the process;
//! dropping it tears the global logger down again.
//!
//! All logging here is strictly synchronous: the trust-boundary layer
//! this crate serves is single-threaded and blocking, and a diagnostic
//! must be on the wire before the failing call returns to its caller.

mod envlogger;

use derive_more::{Display, From};
use libc::openlog;
use serde_derive::{Deserialize, Serialize};
use slog::{Drain, Level, OwnedKVList, Record, KV};
use slog_scope::GlobalLoggerGuard;
use std::{
    ffi::CString,
    fmt,
    io::{self, Write},
    pin::Pin,
    sync::{Mutex, Once},
};

/// Re-export the scoped logging macros.
pub use slog_scope::{debug, error, info, trace, warn};

static LOG_BRIDGE: Once = Once::new();

/// Configuration for the logging crate.
#[derive(Debug, Default, Deserialize, Serialize, From)]
pub struct Config {
    /// Log to the foreground or to syslog (default: syslog).
    #[from(forward)]
    foreground: bool,
}

/// Logging errors.
#[derive(Debug, Display, From)]
pub enum Error {
    #[display(fmt = "{}", "_0")]
    NulError(std::ffi::NulError),
    #[display(fmt = "{}", "_0")]
    IoError(io::Error),
}

impl std::error::Error for Error {}

/// Set up the global sync logger and return its guard.
pub fn sync_logger<C: Into<Config>>(name: &str, config: C) -> Result<GlobalLoggerGuard, Error> {
    let config = config.into();

    let guard = if config.foreground {
        init(Box::new(Stderr::new(name).fuse()), config)
    } else {
        init(Box::new(Syslog::new(name)?.fuse()), config)
    };

    Ok(guard)
}

fn init(
    drain: Box<dyn Drain<Err = slog::Never, Ok = ()> + Send>,
    _config: Config,
) -> GlobalLoggerGuard {
    let kv = slog::o!();

    let drain = envlogger::Logger::new(drain);

    // This is required to make the drain `UnwindSafe`.
    let drain = Mutex::new(drain.fuse());

    let logger = slog::Logger::root(drain.fuse(), kv).into_erased();

    let guard = slog_scope::set_global_logger(logger);
    LOG_BRIDGE.call_once(|| {
        let _ = slog_stdlog::init();
    });

    guard
}

/// Foreground logger that writes to stderr.
pub struct Stderr {
    name: String,
}

impl Stderr {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

impl Drain for Stderr {
    type Ok = ();
    type Err = Error;

    fn log(&self, record: &Record<'_>, values: &OwnedKVList) -> Result<Self::Ok, Self::Err> {
        let message = format!("{}: {}\n", self.name, format_log(record, values));
        io::stderr()
            .write_all(message.as_bytes())
            .map_err(Into::into)
    }
}

/// Background logger for daemonized processes.
pub struct Syslog {
    /// openlog(3) keeps a reference to the ident string.
    _name: Pin<CString>,
}

impl Syslog {
    fn new(name: &str) -> Result<Self, Error> {
        let ident = CString::new(name)?;

        unsafe {
            openlog(
                ident.as_ptr(),
                libc::LOG_PID | libc::LOG_NDELAY,
                libc::LOG_DAEMON,
            )
        };

        Ok(Self {
            _name: Pin::new(ident),
        })
    }
}

impl Drain for Syslog {
    type Ok = ();
    type Err = Error;

    fn log(&self, record: &Record<'_>, values: &OwnedKVList) -> Result<Self::Ok, Self::Err> {
        let message = CString::new(format_log(record, values))?;
        let level = match record.level() {
            Level::Critical => libc::LOG_CRIT,
            Level::Error => libc::LOG_ERR,
            Level::Warning => libc::LOG_WARNING,
            Level::Info => libc::LOG_INFO,
            Level::Debug | Level::Trace => libc::LOG_DEBUG,
        };

        unsafe {
            libc::syslog(
                level,
                "%s\0".as_ptr() as *const libc::c_char,
                message.as_ptr(),
            );
        }

        Ok(())
    }
}

impl Drop for Syslog {
    /// Close syslog on shutdown.
    fn drop(&mut self) {
        unsafe {
            libc::closelog();
        }
    }
}

/// Format the log message to a string.
#[inline]
fn format_log(record: &Record<'_>, values: &OwnedKVList) -> String {
    let mut formatter = Formatter::new(record);
    let _ = record.kv().serialize(record, &mut formatter);
    let _ = values.serialize(record, &mut formatter);
    formatter.buf
}

/// Formatter to create a log message from a record.
struct Formatter {
    buf: String,
}

impl Formatter {
    fn new(record: &Record<'_>) -> Self {
        let mut buf = format!("{}", record.msg());

        if record.level() >= Level::Debug {
            buf.push_str(&format!(
                ", source: {}:{}, module: {}",
                record.file(),
                record.line(),
                record.module()
            ));
        };

        Self { buf }
    }
}

/// Serializer for key-value fields.
impl slog::Serializer for Formatter {
    fn emit_arguments(&mut self, key: &str, val: &fmt::Arguments<'_>) -> slog::Result {
        self.buf.push_str(&format!(", {}: {}", key, val));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::{info, sync_logger, warn};

    #[test]
    fn test_log_stderr() {
        let _guard = sync_logger("test", true).unwrap();

        for i in 1..=10 {
            info!("Hello, World! {}", i);
            warn!("short read: {}", "req");
        }
    }
}
