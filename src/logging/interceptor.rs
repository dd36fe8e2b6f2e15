// SPDX-License-Identifier: MPL-2.0
//! Capture of the process's standard output and standard error.
//!
//! On Unix, [`PipeTap`] points file descriptors 1 and 2 at pipes. A reader
//! thread per stream echoes every chunk to the original descriptor and turns
//! complete lines into `System` entries. Other platforms get [`DisabledTap`].

use super::logger::LogHandle;
use super::LoggerError;

/// Longest partial line buffered before it is forwarded without a newline.
pub const MAX_PENDING_LINE_BYTES: usize = 8 * 1024;

/// A process-wide output tap that can be swapped out in tests.
pub trait StreamTap: Send {
    /// Starts forwarding captured lines to `handle`.
    fn install(&mut self, handle: LogHandle) -> Result<(), LoggerError>;
    /// Restores the original streams. Safe to call when not installed.
    fn uninstall(&mut self);
    fn is_installed(&self) -> bool;
}

/// Tap that captures nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledTap;

impl StreamTap for DisabledTap {
    fn install(&mut self, _handle: LogHandle) -> Result<(), LoggerError> {
        Ok(())
    }

    fn uninstall(&mut self) {}

    fn is_installed(&self) -> bool {
        false
    }
}

/// Platform tap used by [`DiagnosticsLogger::new`](super::DiagnosticsLogger::new).
#[must_use]
pub fn default_tap() -> Box<dyn StreamTap> {
    #[cfg(unix)]
    {
        Box::new(PipeTap::new())
    }
    #[cfg(not(unix))]
    {
        Box::new(DisabledTap)
    }
}

/// Splits a byte stream into lines.
///
/// Invalid UTF-8 is replaced, `\r` before `\n` is dropped and blank lines
/// are skipped. Multi-byte sequences split across chunks are kept intact
/// because decoding only happens on complete lines.
#[derive(Debug, Default)]
pub struct LineDecoder {
    pending: Vec<u8>,
}

impl LineDecoder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds a chunk and returns every line it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);

        let mut lines = Vec::new();
        let mut start = 0;
        while let Some(offset) = self.pending[start..].iter().position(|&byte| byte == b'\n') {
            let end = start + offset;
            if let Some(line) = decode_line(&self.pending[start..end]) {
                lines.push(line);
            }
            start = end + 1;
        }
        self.pending.drain(..start);

        if self.pending.len() > MAX_PENDING_LINE_BYTES {
            let overflow = std::mem::take(&mut self.pending);
            if let Some(line) = decode_line(&overflow) {
                lines.push(line);
            }
        }
        lines
    }

    /// Returns the unterminated remainder, if any.
    pub fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.pending);
        decode_line(&rest)
    }
}

fn decode_line(bytes: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(bytes);
    let text = text.trim_end_matches('\r');
    if text.trim().is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

#[cfg(unix)]
pub use unix::PipeTap;

#[cfg(unix)]
mod unix {
    use std::fs::File;
    use std::io::{self, Read, Write};
    use std::os::fd::{AsFd, AsRawFd, OwnedFd, RawFd};
    use std::thread::{self, JoinHandle};

    use nix::unistd::{dup2, pipe};

    use super::{LineDecoder, LogHandle, LoggerError, StreamTap};
    use crate::logging::entry::LogEntry;

    const STDOUT_FD: RawFd = 1;
    const STDERR_FD: RawFd = 2;

    struct CapturedStream {
        target: RawFd,
        original: OwnedFd,
        reader: Option<JoinHandle<()>>,
    }

    /// Pipe-based tap of stdout and stderr.
    #[derive(Default)]
    pub struct PipeTap {
        streams: Vec<CapturedStream>,
    }

    impl PipeTap {
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        fn capture(target: RawFd, name: &str, handle: LogHandle) -> Result<CapturedStream, LoggerError> {
            flush_std_streams();

            let original = match target {
                STDOUT_FD => io::stdout().as_fd().try_clone_to_owned()?,
                _ => io::stderr().as_fd().try_clone_to_owned()?,
            };
            let echo = File::from(original.try_clone()?);
            let (read_end, write_end) =
                pipe().map_err(|err| LoggerError::Interceptor(err.to_string()))?;

            dup2(write_end.as_raw_fd(), target)
                .map_err(|err| LoggerError::Interceptor(err.to_string()))?;
            drop(write_end);

            let reader = thread::Builder::new()
                .name(format!("diagnostics-journal-{name}"))
                .spawn(move || forward(File::from(read_end), echo, &handle));

            match reader {
                Ok(reader) => Ok(CapturedStream {
                    target,
                    original,
                    reader: Some(reader),
                }),
                Err(err) => {
                    let _ = dup2(original.as_raw_fd(), target);
                    Err(err.into())
                }
            }
        }

        fn restore(stream: &mut CapturedStream) {
            if let Err(err) = dup2(stream.original.as_raw_fd(), stream.target) {
                tracing::error!(fd = stream.target, %err, "Failed to restore output stream");
                return;
            }
            if let Some(reader) = stream.reader.take() {
                if reader.join().is_err() {
                    tracing::error!(fd = stream.target, "Output capture thread panicked");
                }
            }
        }
    }

    impl StreamTap for PipeTap {
        fn install(&mut self, handle: LogHandle) -> Result<(), LoggerError> {
            if self.is_installed() {
                return Ok(());
            }
            for (target, name) in [(STDOUT_FD, "stdout"), (STDERR_FD, "stderr")] {
                match Self::capture(target, name, handle.clone()) {
                    Ok(stream) => self.streams.push(stream),
                    Err(err) => {
                        self.uninstall();
                        return Err(err);
                    }
                }
            }
            Ok(())
        }

        fn uninstall(&mut self) {
            flush_std_streams();
            for mut stream in self.streams.drain(..) {
                Self::restore(&mut stream);
            }
        }

        fn is_installed(&self) -> bool {
            !self.streams.is_empty()
        }
    }

    impl Drop for PipeTap {
        fn drop(&mut self) {
            self.uninstall();
        }
    }

    fn flush_std_streams() {
        let _ = io::stdout().flush();
        let _ = io::stderr().flush();
    }

    /// Reader loop: echo to the original stream, log complete lines.
    fn forward(mut pipe: File, mut echo: File, handle: &LogHandle) {
        let mut decoder = LineDecoder::new();
        let mut buffer = [0u8; 4096];
        loop {
            match pipe.read(&mut buffer) {
                Ok(0) => break,
                Ok(read) => {
                    let _ = echo.write_all(&buffer[..read]);
                    for line in decoder.push(&buffer[..read]) {
                        handle.try_submit(LogEntry::system(line));
                    }
                }
                Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
                Err(_) => break,
            }
        }
        if let Some(line) = decoder.finish() {
            handle.try_submit(LogEntry::system(line));
        }
    }
}

/// Tap that only counts installs, for logger tests.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct MockTap {
    installed: bool,
    installs: std::sync::Arc<std::sync::atomic::AtomicUsize>,
}

#[cfg(test)]
impl MockTap {
    pub(crate) fn installs(&self) -> std::sync::Arc<std::sync::atomic::AtomicUsize> {
        std::sync::Arc::clone(&self.installs)
    }
}

#[cfg(test)]
impl StreamTap for MockTap {
    fn install(&mut self, _handle: LogHandle) -> Result<(), LoggerError> {
        self.installed = true;
        self.installs
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok(())
    }

    fn uninstall(&mut self) {
        self.installed = false;
    }

    fn is_installed(&self) -> bool {
        self.installed
    }
}
