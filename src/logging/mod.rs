// SPDX-License-Identifier: MPL-2.0
//! Bounded diagnostic log.
//!
//! This module provides:
//! - [`LogEntry`]: the unit written to the log, serialized as a self-delimiting fragment
//! - [`LogStore`]: append with oldest-first trimming under a maximum size
//! - [`LogTrimmer`]: fragment parsing and cut planning
//! - [`StreamTap`]: capture of stdout/stderr into `System` entries
//! - [`DiagnosticsLogger`]: the coordinator owning all of the above
//!
//! # Example
//!
//! ```no_run
//! use diagnostics_journal::logging::{DiagnosticsLogger, LoggerOptions};
//! use diagnostics_journal::journal_log;
//!
//! let mut logger = DiagnosticsLogger::new(LoggerOptions::new("/tmp/journal"));
//! logger.setup().expect("log directory should be writable");
//! journal_log!(logger, "Loaded {} items", 3);
//! ```

mod crash;
pub mod entry;
mod interceptor;
mod logger;
pub mod store;
pub mod trimmer;

use std::io;

use thiserror::Error;

pub use crash::CrashMonitor;
pub use entry::{describe_error, Category, LogEntry, LogEntryKind, Origin};
#[cfg(unix)]
pub use interceptor::PipeTap;
pub use interceptor::{default_tap, DisabledTap, LineDecoder, StreamTap};
pub use logger::{DiagnosticsLogger, LogHandle, LoggerOptions};
pub use store::LogStore;
pub use trimmer::{parse_fragments, Fragment, LogTrimmer, TrimPlan};

/// Errors surfaced by request/response logger operations.
///
/// Writes never fail from the caller's point of view.
#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("diagnostics logger is not set up")]
    NotSetUp,
    #[error("log file I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("log writer thread is gone")]
    WorkerGone,
    #[error("output capture failed: {0}")]
    Interceptor(String),
}

/// Origin of the macro call site.
#[macro_export]
macro_rules! origin {
    () => {
        $crate::logging::Origin::new(file!(), module_path!(), line!())
    };
}

/// Logs a formatted debug message with the call site as origin.
///
/// Works with a [`DiagnosticsLogger`](crate::logging::DiagnosticsLogger) or a
/// [`LogHandle`](crate::logging::LogHandle).
#[macro_export]
macro_rules! journal_log {
    ($logger:expr, $($arg:tt)+) => {
        $logger.log_message(format!($($arg)+), $crate::origin!())
    };
}

/// Logs an error, with an optional description, with the call site as origin.
#[macro_export]
macro_rules! journal_error {
    ($logger:expr, $error:expr) => {
        $logger.log_error($error, None, $crate::origin!())
    };
    ($logger:expr, $error:expr, $description:expr) => {
        $logger.log_error($error, Some($description), $crate::origin!())
    };
}
