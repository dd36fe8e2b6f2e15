// SPDX-License-Identifier: MPL-2.0
//! Durable, size-bounded log file.
//!
//! The store is not internally synchronized: it is owned by the logger's
//! writer thread, which serializes appends, trims, reads and deletes.
//!
//! The append path reports through `tracing` only when it starts or stops
//! failing. With stream capture installed, each report comes back as a new
//! entry, so an event per append would never settle.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use super::entry::LogEntry;
use super::trimmer::LogTrimmer;
use crate::domain::diagnostics::{MaxLogSize, TrimBatch};
use crate::report::export::write_atomic;

/// Append-only log file with oldest-first trimming.
#[derive(Debug)]
pub struct LogStore {
    path: PathBuf,
    max_size: MaxLogSize,
    trim_batch: TrimBatch,
    failing: bool,
}

impl LogStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, max_size: MaxLogSize, trim_batch: TrimBatch) -> Self {
        Self {
            path: path.into(),
            max_size,
            trim_batch,
            failing: false,
        }
    }

    /// Returns true from a failed append or trim until the next clean append.
    #[must_use]
    pub fn is_failing(&self) -> bool {
        self.failing
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn max_size(&self) -> MaxLogSize {
        self.max_size
    }

    /// Creates the parent directory and an empty log file if missing.
    pub fn ensure_exists(&self) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        Ok(())
    }

    /// Appends one entry and trims if the file grew past the maximum.
    ///
    /// An entry whose fragment alone exceeds the maximum is written in
    /// compact form. Trim failures are reported, not returned: only the
    /// write itself can fail this call.
    ///
    /// Returns the file size after the append and any trim.
    pub fn append(&mut self, entry: &LogEntry) -> io::Result<u64> {
        let size = match self.write_fragment(entry) {
            Ok(size) => size,
            Err(err) => {
                self.report_failure("write", &err);
                return Err(err);
            }
        };

        if size <= self.max_size.value() {
            self.mark_recovered();
            return Ok(size);
        }

        match self.trim_to_fit() {
            Ok(size) => {
                self.mark_recovered();
                Ok(size)
            }
            Err(err) => {
                self.report_failure("trim", &err);
                Ok(size)
            }
        }
    }

    fn write_fragment(&self, entry: &LogEntry) -> io::Result<u64> {
        let mut fragment = entry.to_fragment();
        if !self.max_size.fits(fragment.len()) {
            fragment = entry.to_compact_fragment(self.max_size.as_usize());
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(fragment.as_bytes())?;
        Ok(file.metadata()?.len())
    }

    fn report_failure(&mut self, operation: &'static str, err: &io::Error) {
        if !self.failing {
            tracing::error!(
                path = ?self.path,
                operation,
                %err,
                "Log append failed, further failures are muted until one succeeds"
            );
        }
        self.failing = true;
    }

    fn mark_recovered(&mut self) {
        if self.failing {
            self.failing = false;
            tracing::info!(path = ?self.path, "Log appends recovered");
        }
    }

    /// Removes the `count` oldest entries and rewrites the file atomically.
    ///
    /// Empty or unparsable content is left untouched. Returns the number of
    /// entries removed.
    pub fn trim(&mut self, count: usize) -> io::Result<usize> {
        let data = fs::read(&self.path)?;
        let Some(plan) = LogTrimmer::plan_trim(&data, count) else {
            tracing::warn!(path = ?self.path, bytes = data.len(), "Log holds no parsable entries, skipping trim");
            return Ok(0);
        };
        if plan.removed > 0 {
            write_atomic(&self.path, &data[plan.cut..])?;
        }
        Ok(plan.removed)
    }

    /// Trims in batches until the file fits, then rewrites it once.
    ///
    /// Emits no event on success: it runs on the append path.
    fn trim_to_fit(&mut self) -> io::Result<u64> {
        let data = fs::read(&self.path)?;
        let plan = LogTrimmer::plan_fit(&data, self.max_size, self.trim_batch).ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidData, "log holds no parsable entries")
        })?;

        let rest = &data[plan.cut..];
        write_atomic(&self.path, rest)?;
        Ok(rest.len() as u64)
    }

    /// Full current content. Fails with `NotFound` if the file is missing.
    pub fn read(&self) -> io::Result<Vec<u8>> {
        fs::read(&self.path)
    }

    /// Removes the log file. A missing file is not an error.
    pub fn delete(&mut self) -> io::Result<()> {
        match fs::remove_file(&self.path) {
            Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::entry::Origin;
    use crate::logging::trimmer::parse_fragments;
    use tempfile::tempdir;

    fn debug(message: &str) -> LogEntry {
        LogEntry::debug(message, Origin::new("store.rs", "tests", 1))
    }

    fn store_in(dir: &Path, max: u64, batch: usize) -> LogStore {
        LogStore::new(
            dir.join("logs").join("diagnostics_log.txt"),
            MaxLogSize::new(max),
            TrimBatch::new(batch),
        )
    }

    #[test]
    fn ensure_exists_creates_parent_and_empty_file() {
        let dir = tempdir().expect("failed to create temp dir");
        let store = store_in(dir.path(), 4096, 10);
        store.ensure_exists().expect("ensure_exists should succeed");
        assert_eq!(store.read().expect("read should succeed"), Vec::<u8>::new());
    }

    #[test]
    fn append_preserves_order() {
        let dir = tempdir().expect("failed to create temp dir");
        let mut store = store_in(dir.path(), 1024 * 1024, 10);
        store.ensure_exists().expect("ensure_exists should succeed");
        for message in ["one", "two", "three"] {
            store.append(&debug(message)).expect("append should succeed");
        }
        let data = store.read().expect("read should succeed");
        let bodies: Vec<String> = parse_fragments(&data)
            .iter()
            .map(|fragment| String::from_utf8_lossy(fragment.body).into_owned())
            .collect();
        assert!(bodies[0].contains("one"));
        assert!(bodies[1].contains("two"));
        assert!(bodies[2].contains("three"));
    }

    #[test]
    fn append_over_limit_trims_and_keeps_newest() {
        let dir = tempdir().expect("failed to create temp dir");
        let mut store = store_in(dir.path(), 1000, 10);
        store.ensure_exists().expect("ensure_exists should succeed");
        for index in 0..50 {
            let size = store
                .append(&debug(&format!("message number {index}")))
                .expect("append should succeed");
            assert!(size <= 1000, "size {size} exceeds limit after append {index}");
        }
        let data = store.read().expect("read should succeed");
        assert!(data.len() <= 1000);
        let last = parse_fragments(&data).pop().expect("at least one fragment");
        assert!(String::from_utf8_lossy(last.body).contains("message number 49"));
    }

    #[test]
    fn oversized_entry_is_compacted() {
        let dir = tempdir().expect("failed to create temp dir");
        let mut store = store_in(dir.path(), 100, 10);
        store.ensure_exists().expect("ensure_exists should succeed");
        store.append(&debug("short")).expect("append should succeed");
        let size = store
            .append(&debug(&"y".repeat(500)))
            .expect("append should succeed");
        assert!(size <= 100);
        let text = String::from_utf8(store.read().expect("read")).expect("utf-8");
        assert!(text.starts_with("<p class=\"debug\">yyy"));
    }

    #[test]
    fn trim_removes_requested_count() {
        let dir = tempdir().expect("failed to create temp dir");
        let mut store = store_in(dir.path(), 1024 * 1024, 10);
        store.ensure_exists().expect("ensure_exists should succeed");
        for message in ["a", "b", "c"] {
            store.append(&debug(message)).expect("append should succeed");
        }
        assert_eq!(store.trim(2).expect("trim should succeed"), 2);
        let data = store.read().expect("read should succeed");
        assert_eq!(parse_fragments(&data).len(), 1);
    }

    #[test]
    fn trim_of_corrupt_file_is_noop() {
        let dir = tempdir().expect("failed to create temp dir");
        let mut store = store_in(dir.path(), 1024, 10);
        store.ensure_exists().expect("ensure_exists should succeed");
        fs::write(store.path(), b"\xff\xfe corrupted").expect("write should succeed");
        assert_eq!(store.trim(10).expect("trim should not fail"), 0);
        assert_eq!(store.read().expect("read").len(), 12);
    }

    #[test]
    fn failing_streak_is_set_on_error_and_cleared_on_success() {
        let dir = tempdir().expect("failed to create temp dir");
        let mut store = store_in(dir.path(), 4096, 10);
        store.ensure_exists().expect("ensure_exists should succeed");
        fs::remove_dir_all(dir.path().join("logs")).expect("remove log directory");

        assert!(store.append(&debug("lost")).is_err());
        assert!(store.is_failing());
        assert!(store.append(&debug("lost again")).is_err());
        assert!(store.is_failing());

        store.ensure_exists().expect("recreate log directory");
        store.append(&debug("back")).expect("append should succeed");
        assert!(!store.is_failing());
    }

    #[test]
    fn read_of_missing_file_is_not_found() {
        let dir = tempdir().expect("failed to create temp dir");
        let store = store_in(dir.path(), 1024, 10);
        let err = store.read().expect_err("read should fail");
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn delete_is_idempotent() {
        let dir = tempdir().expect("failed to create temp dir");
        let mut store = store_in(dir.path(), 1024, 10);
        store.ensure_exists().expect("ensure_exists should succeed");
        store.delete().expect("first delete should succeed");
        store.delete().expect("second delete should succeed");
        assert!(!store.path().exists());
    }
}
