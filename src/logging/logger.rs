// SPDX-License-Identifier: MPL-2.0
//! Process-wide logging coordinator.
//!
//! [`DiagnosticsLogger`] owns the [`LogStore`] through a single writer thread.
//! Every mutation and every read is a command on one FIFO channel, so appends,
//! trims and reads never interleave. Producers log through cheap, cloneable
//! [`LogHandle`]s and never block on file I/O.
//!
//! Construct one logger per process and pass its handle to whoever logs.

use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};

use super::crash::CrashMonitor;
use super::entry::{LogEntry, Origin};
use super::interceptor::{default_tap, DisabledTap, StreamTap};
use super::store::LogStore;
use super::LoggerError;
use crate::config::{self, Config};
use crate::domain::diagnostics::{MaxLogSize, TrimBatch};

const UNKNOWN_APP_VERSION: &str = "unknown";

/// Commands handled by the writer thread.
pub(crate) enum Command {
    Write(LogEntry),
    Prepare(Sender<io::Result<()>>),
    Read(Sender<io::Result<Vec<u8>>>),
    Trim(usize, Sender<io::Result<usize>>),
    Delete(Sender<io::Result<()>>),
    Flush(Sender<()>),
    Shutdown,
}

/// Settings of one logger instance.
#[derive(Debug, Clone)]
pub struct LoggerOptions {
    pub log_path: PathBuf,
    pub max_size: MaxLogSize,
    pub trim_batch: TrimBatch,
    /// Test-harness mode: no stream interception, `setup()` may re-run.
    pub harness_mode: bool,
    /// Record panics as error entries.
    pub capture_panics: bool,
    /// Host application version shown in the session marker.
    pub app_version: String,
}

impl LoggerOptions {
    /// Options for a log file inside `log_directory`, other values default.
    #[must_use]
    pub fn new(log_directory: impl Into<PathBuf>) -> Self {
        let harness_mode = config::is_test_harness();
        Self {
            log_path: log_directory.into().join(config::LOG_FILE_NAME),
            max_size: MaxLogSize::default(),
            trim_batch: TrimBatch::default(),
            harness_mode,
            capture_panics: !harness_mode,
            app_version: UNKNOWN_APP_VERSION.to_string(),
        }
    }

    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_size: config.max_log_size(),
            trim_batch: config.trim_batch(),
            ..Self::new(config.log_directory())
        }
    }

    #[must_use]
    pub fn with_max_size(mut self, max_size: MaxLogSize) -> Self {
        self.max_size = max_size;
        self
    }

    #[must_use]
    pub fn with_trim_batch(mut self, trim_batch: TrimBatch) -> Self {
        self.trim_batch = trim_batch;
        self
    }

    #[must_use]
    pub fn with_harness_mode(mut self, harness_mode: bool) -> Self {
        self.harness_mode = harness_mode;
        self
    }

    #[must_use]
    pub fn with_capture_panics(mut self, capture_panics: bool) -> Self {
        self.capture_panics = capture_panics;
        self
    }

    /// Sets the host application version. Defaults to `unknown`.
    #[must_use]
    pub fn with_app_version(mut self, app_version: impl Into<String>) -> Self {
        self.app_version = app_version.into();
        self
    }
}

/// Handle for sending entries to the logger.
///
/// This handle is cheap to clone and can be shared across threads.
/// Writes are queued on an unbounded channel and never block.
#[derive(Clone, Debug)]
pub struct LogHandle {
    command_tx: Sender<Command>,
    ready: Arc<AtomicBool>,
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Write(_) => "Write",
            Self::Prepare(_) => "Prepare",
            Self::Read(_) => "Read",
            Self::Trim(..) => "Trim",
            Self::Delete(_) => "Delete",
            Self::Flush(_) => "Flush",
            Self::Shutdown => "Shutdown",
        };
        f.write_str(name)
    }
}

impl LogHandle {
    /// Returns true once the owning logger finished `setup()`.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    /// Logs a debug message.
    pub fn log_message(&self, message: impl Into<String>, origin: Origin) {
        self.submit(LogEntry::debug(message, origin));
    }

    /// Logs an error with its cause chain and an optional description.
    pub fn log_error(
        &self,
        error: &dyn std::error::Error,
        description: Option<&str>,
        origin: Origin,
    ) {
        self.submit(LogEntry::error(error, description, origin));
    }

    /// Logs a line of process output.
    pub fn log_system(&self, line: impl Into<String>) {
        self.submit(LogEntry::system(line));
    }

    /// Queues an entry.
    ///
    /// Logging before setup is a caller bug: it asserts in debug builds and
    /// drops the entry otherwise.
    pub fn submit(&self, entry: LogEntry) {
        if !self.try_submit(entry) {
            debug_assert!(false, "diagnostics logger used before setup");
            tracing::error!("Diagnostics logger used before setup, entry dropped");
        }
    }

    /// Queues an entry if the logger is ready. Returns whether it was queued.
    pub(crate) fn try_submit(&self, entry: LogEntry) -> bool {
        if !self.is_ready() {
            return false;
        }
        self.command_tx.send(Command::Write(entry)).is_ok()
    }

    /// Reads the whole log after every previously queued write.
    ///
    /// # Errors
    ///
    /// Returns `LoggerError::NotSetUp` before setup, `LoggerError::Io` if the
    /// file cannot be read.
    pub fn read_log(&self) -> Result<Vec<u8>, LoggerError> {
        self.ensure_ready()?;
        Ok(self.request(Command::Read)??)
    }

    /// Removes the `count` oldest entries. Returns how many were removed.
    pub fn trim(&self, count: usize) -> Result<usize, LoggerError> {
        self.ensure_ready()?;
        Ok(self.request(|reply| Command::Trim(count, reply))??)
    }

    /// Deletes the log file. Intended for tests and explicit resets.
    pub fn delete_logs(&self) -> Result<(), LoggerError> {
        self.ensure_ready()?;
        Ok(self.request(Command::Delete)??)
    }

    /// Waits until every previously queued write reached the file.
    pub fn flush(&self) -> Result<(), LoggerError> {
        self.ensure_ready()?;
        self.request(Command::Flush)
    }

    /// Like [`flush`](Self::flush) but gives up after `timeout`.
    ///
    /// Returns true if the queue drained in time.
    pub fn flush_timeout(&self, timeout: Duration) -> bool {
        if !self.is_ready() {
            return false;
        }
        let (reply_tx, reply_rx) = bounded(1);
        if self.command_tx.send(Command::Flush(reply_tx)).is_err() {
            return false;
        }
        reply_rx.recv_timeout(timeout).is_ok()
    }

    fn ensure_ready(&self) -> Result<(), LoggerError> {
        if self.is_ready() {
            Ok(())
        } else {
            Err(LoggerError::NotSetUp)
        }
    }

    fn request<T>(&self, command: impl FnOnce(Sender<T>) -> Command) -> Result<T, LoggerError> {
        let (reply_tx, reply_rx) = bounded(1);
        self.command_tx
            .send(command(reply_tx))
            .map_err(|_| LoggerError::WorkerGone)?;
        reply_rx.recv().map_err(|_| LoggerError::WorkerGone)
    }
}

/// Coordinator owning the log store, the stream tap and the crash monitor.
///
/// Lifecycle: [`new`](Self::new) → [`setup`](Self::setup) → logging →
/// [`shutdown`](Self::shutdown) (also run on drop).
pub struct DiagnosticsLogger {
    options: LoggerOptions,
    handle: LogHandle,
    command_rx: Option<Receiver<Command>>,
    worker: Option<JoinHandle<()>>,
    tap: Box<dyn StreamTap>,
    crash_monitor: Option<CrashMonitor>,
    shut_down: bool,
}

impl DiagnosticsLogger {
    /// Creates a logger using the platform stream tap.
    #[must_use]
    pub fn new(options: LoggerOptions) -> Self {
        let tap = if options.harness_mode {
            Box::new(DisabledTap) as Box<dyn StreamTap>
        } else {
            default_tap()
        };
        Self::with_tap(options, tap)
    }

    /// Creates a logger with a caller-supplied stream tap.
    #[must_use]
    pub fn with_tap(options: LoggerOptions, tap: Box<dyn StreamTap>) -> Self {
        let (command_tx, command_rx) = unbounded();
        Self {
            options,
            handle: LogHandle {
                command_tx,
                ready: Arc::new(AtomicBool::new(false)),
            },
            command_rx: Some(command_rx),
            worker: None,
            tap,
            crash_monitor: None,
            shut_down: false,
        }
    }

    #[must_use]
    pub fn options(&self) -> &LoggerOptions {
        &self.options
    }

    /// Cloneable handle for producers on other threads.
    #[must_use]
    pub fn handle(&self) -> LogHandle {
        self.handle.clone()
    }

    #[must_use]
    pub fn is_set_up(&self) -> bool {
        self.handle.is_ready()
    }

    /// Prepares the log file, starts capture and writes a session marker.
    ///
    /// Calling it again once set up is a no-op, except in harness mode where
    /// the file is re-prepared and a new session marker is written.
    ///
    /// # Errors
    ///
    /// Returns `LoggerError::Io` if the log file cannot be created and
    /// `LoggerError::WorkerGone` after [`shutdown`](Self::shutdown).
    pub fn setup(&mut self) -> Result<(), LoggerError> {
        if self.shut_down {
            return Err(LoggerError::WorkerGone);
        }
        if self.is_set_up() && !self.options.harness_mode {
            tracing::debug!("Diagnostics logger already set up");
            return Ok(());
        }

        if self.worker.is_none() {
            let command_rx = self.command_rx.take().ok_or(LoggerError::WorkerGone)?;
            let store = LogStore::new(
                self.options.log_path.clone(),
                self.options.max_size,
                self.options.trim_batch,
            );
            let worker = thread::Builder::new()
                .name("diagnostics-journal-writer".to_string())
                .spawn(move || run_worker(store, &command_rx))?;
            self.worker = Some(worker);
        }

        self.handle.request(Command::Prepare)??;
        self.handle.ready.store(true, Ordering::SeqCst);

        if !self.options.harness_mode && !self.tap.is_installed() {
            if let Err(err) = self.tap.install(self.handle()) {
                tracing::warn!(%err, "Output capture unavailable");
            }
        }

        if self.options.capture_panics && self.crash_monitor.is_none() {
            self.crash_monitor = Some(CrashMonitor::install(self.handle()));
        }

        self.handle
            .submit(LogEntry::session_for_host(&self.options.app_version));
        tracing::info!(path = ?self.options.log_path, "Diagnostics logger ready");
        Ok(())
    }

    /// Logs a debug message. See [`journal_log!`](crate::journal_log).
    pub fn log_message(&self, message: impl Into<String>, origin: Origin) {
        self.handle.log_message(message, origin);
    }

    /// Logs an error. See [`journal_error!`](crate::journal_error).
    pub fn log_error(
        &self,
        error: &dyn std::error::Error,
        description: Option<&str>,
        origin: Origin,
    ) {
        self.handle.log_error(error, description, origin);
    }

    pub fn log_system(&self, line: impl Into<String>) {
        self.handle.log_system(line);
    }

    /// Current log content. See [`LogHandle::read_log`].
    pub fn read_log(&self) -> Result<Vec<u8>, LoggerError> {
        self.handle.read_log()
    }

    pub fn delete_logs(&self) -> Result<(), LoggerError> {
        self.handle.delete_logs()
    }

    pub fn flush(&self) -> Result<(), LoggerError> {
        self.handle.flush()
    }

    /// Stops capture, drains queued writes and joins the writer thread.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;

        self.tap.uninstall();
        if let Some(monitor) = self.crash_monitor.take() {
            monitor.uninstall();
        }
        self.handle.ready.store(false, Ordering::SeqCst);

        if let Some(worker) = self.worker.take() {
            let _ = self.handle.command_tx.send(Command::Shutdown);
            if worker.join().is_err() {
                tracing::error!("Log writer thread panicked");
            }
        }
    }
}

impl Drop for DiagnosticsLogger {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Writer loop: the only code that touches the log file.
fn run_worker(mut store: LogStore, commands: &Receiver<Command>) {
    for command in commands {
        match command {
            Command::Write(entry) => {
                // The store reports failures itself, once per failing streak.
                let _ = store.append(&entry);
            }
            Command::Prepare(reply) => {
                let _ = reply.send(store.ensure_exists());
            }
            Command::Read(reply) => {
                let _ = reply.send(store.read());
            }
            Command::Trim(count, reply) => {
                let _ = reply.send(store.trim(count));
            }
            Command::Delete(reply) => {
                let _ = reply.send(store.delete());
            }
            Command::Flush(reply) => {
                let _ = reply.send(());
            }
            Command::Shutdown => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::interceptor::MockTap;
    use crate::logging::trimmer::parse_fragments;
    use std::sync::atomic::AtomicUsize;
    use tempfile::tempdir;

    fn options(dir: &std::path::Path) -> LoggerOptions {
        LoggerOptions::new(dir)
            .with_harness_mode(true)
            .with_capture_panics(false)
    }

    fn classes(data: &[u8]) -> Vec<String> {
        parse_fragments(data)
            .iter()
            .map(|fragment| fragment.class.to_string())
            .collect()
    }

    #[test]
    fn setup_creates_file_and_writes_session_marker() {
        let dir = tempdir().expect("failed to create temp dir");
        let mut logger = DiagnosticsLogger::new(options(dir.path()));
        logger.setup().expect("setup should succeed");
        assert!(logger.is_set_up());

        let data = logger.read_log().expect("read should succeed");
        assert_eq!(classes(&data), ["session"]);
        assert!(dir.path().join(config::LOG_FILE_NAME).exists());
    }

    #[test]
    fn session_marker_shows_host_app_version() {
        let dir = tempdir().expect("failed to create temp dir");
        let mut logger = DiagnosticsLogger::new(options(dir.path()));
        logger.setup().expect("setup should succeed");
        let text = String::from_utf8(logger.read_log().expect("read")).expect("utf-8");
        assert!(text.contains("App version: unknown"));

        let dir = tempdir().expect("failed to create temp dir");
        let mut logger =
            DiagnosticsLogger::new(options(dir.path()).with_app_version("9.9.1"));
        logger.setup().expect("setup should succeed");
        let text = String::from_utf8(logger.read_log().expect("read")).expect("utf-8");
        assert!(text.contains("App version: 9.9.1"));
    }

    #[test]
    fn read_before_setup_is_rejected() {
        let dir = tempdir().expect("failed to create temp dir");
        let logger = DiagnosticsLogger::new(options(dir.path()));
        assert!(matches!(logger.read_log(), Err(LoggerError::NotSetUp)));
        assert!(matches!(logger.flush(), Err(LoggerError::NotSetUp)));
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "used before setup")]
    fn logging_before_setup_asserts_in_debug_builds() {
        let dir = tempdir().expect("failed to create temp dir");
        let logger = DiagnosticsLogger::new(options(dir.path()));
        logger.log_message("too early", crate::origin!());
    }

    #[test]
    fn messages_are_written_in_fifo_order() {
        let dir = tempdir().expect("failed to create temp dir");
        let mut logger = DiagnosticsLogger::new(options(dir.path()));
        logger.setup().expect("setup should succeed");

        let handle = logger.handle();
        for index in 0..20 {
            handle.log_message(format!("entry {index}"), crate::origin!());
        }
        let text = String::from_utf8(logger.read_log().expect("read")).expect("utf-8");
        let positions: Vec<usize> = (0..20)
            .map(|index| {
                text.find(&format!("entry {index}<"))
                    .expect("every entry should be present")
            })
            .collect();
        assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn setup_is_idempotent_outside_harness() {
        let dir = tempdir().expect("failed to create temp dir");
        let tap = MockTap::default();
        let installs = tap.installs();
        let mut logger = DiagnosticsLogger::with_tap(
            options(dir.path()).with_harness_mode(false),
            Box::new(tap),
        );
        logger.setup().expect("first setup");
        logger.setup().expect("second setup");

        assert_eq!(installs.load(Ordering::SeqCst), 1);
        let data = logger.read_log().expect("read");
        assert_eq!(classes(&data), ["session"]);
    }

    #[test]
    fn harness_mode_skips_tap_and_reruns_setup() {
        let dir = tempdir().expect("failed to create temp dir");
        let tap = MockTap::default();
        let installs: Arc<AtomicUsize> = tap.installs();
        let mut logger = DiagnosticsLogger::with_tap(options(dir.path()), Box::new(tap));
        logger.setup().expect("first setup");
        logger.delete_logs().expect("delete");
        logger.setup().expect("second setup");

        assert_eq!(installs.load(Ordering::SeqCst), 0);
        let data = logger.read_log().expect("read after re-setup");
        assert_eq!(classes(&data), ["session"]);
    }

    #[test]
    fn error_entries_carry_description() {
        let dir = tempdir().expect("failed to create temp dir");
        let mut logger = DiagnosticsLogger::new(options(dir.path()));
        logger.setup().expect("setup");

        let err = io::Error::other("socket closed");
        crate::journal_error!(logger, &err, "while syncing");
        let text = String::from_utf8(logger.read_log().expect("read")).expect("utf-8");
        assert!(text.contains("<p class=\"error\">"));
        assert!(text.contains("socket closed | while syncing"));
    }

    #[test]
    fn read_after_delete_is_not_found() {
        let dir = tempdir().expect("failed to create temp dir");
        let mut logger = DiagnosticsLogger::new(options(dir.path()));
        logger.setup().expect("setup");
        logger.delete_logs().expect("delete");
        match logger.read_log() {
            Err(LoggerError::Io(err)) => assert_eq!(err.kind(), io::ErrorKind::NotFound),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn shutdown_drains_queue_and_rejects_setup() {
        let dir = tempdir().expect("failed to create temp dir");
        let mut logger = DiagnosticsLogger::new(options(dir.path()));
        logger.setup().expect("setup");
        crate::journal_log!(logger, "last words {}", 42);
        logger.shutdown();

        assert!(!logger.is_set_up());
        assert!(matches!(logger.setup(), Err(LoggerError::WorkerGone)));
        let text = std::fs::read_to_string(dir.path().join(config::LOG_FILE_NAME))
            .expect("log file should remain");
        assert!(text.contains("last words 42"));
    }

    #[test]
    fn trim_through_handle_removes_oldest() {
        let dir = tempdir().expect("failed to create temp dir");
        let mut logger = DiagnosticsLogger::new(options(dir.path()));
        logger.setup().expect("setup");
        crate::journal_log!(logger, "one");
        crate::journal_log!(logger, "two");
        assert_eq!(logger.handle().trim(2).expect("trim"), 2);
        let data = logger.read_log().expect("read");
        assert_eq!(classes(&data), ["debug"]);
    }
}
