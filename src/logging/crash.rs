// SPDX-License-Identifier: MPL-2.0
//! Panic capture.
//!
//! A chained panic hook records each panic as an `Error` entry, waits briefly
//! for the writer to persist it, then hands over to the previous hook.

use std::panic::{self, PanicHookInfo};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use super::entry::{LogEntry, Origin};
use super::logger::LogHandle;

/// How long a panicking thread waits for its entry to reach the file.
const PANIC_FLUSH_TIMEOUT: Duration = Duration::from_secs(1);

type PanicHook = dyn Fn(&PanicHookInfo<'_>) + Sync + Send + 'static;

/// Installed panic hook; restores the previous hook on [`uninstall`](Self::uninstall).
pub struct CrashMonitor {
    previous: Arc<PanicHook>,
}

impl CrashMonitor {
    #[must_use]
    pub fn install(handle: LogHandle) -> Self {
        let previous: Arc<PanicHook> = Arc::from(panic::take_hook());
        let chained = Arc::clone(&previous);
        panic::set_hook(Box::new(move |info| {
            record_panic(&handle, info);
            chained(info);
        }));
        Self { previous }
    }

    pub fn uninstall(self) {
        let previous = self.previous;
        panic::set_hook(Box::new(move |info| previous(info)));
    }
}

fn record_panic(handle: &LogHandle, info: &PanicHookInfo<'_>) {
    if !handle.is_ready() {
        return;
    }
    let entry = panic_entry(info);
    if handle.try_submit(entry) {
        let _ = handle.flush_timeout(PANIC_FLUSH_TIMEOUT);
    }
}

fn panic_entry(info: &PanicHookInfo<'_>) -> LogEntry {
    let payload = info
        .payload()
        .downcast_ref::<&str>()
        .map(|message| (*message).to_string())
        .or_else(|| info.payload().downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "Box<dyn Any>".to_string());

    let current = thread::current();
    let thread_name = current.name().unwrap_or("<unnamed>");

    let origin = info.location().map_or_else(
        || Origin::new("<unknown>", format!("thread '{thread_name}'"), 0),
        |location| {
            Origin::new(
                location.file(),
                format!("thread '{thread_name}'"),
                location.line(),
            )
        },
    );

    LogEntry::error_text(format!("panicked: {payload}"), origin)
}
