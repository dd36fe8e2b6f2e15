// SPDX-License-Identifier: MPL-2.0
//! The compiled report artifact and atomic file writes.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// MIME type of every compiled report.
pub const REPORT_MIME_TYPE: &str = "text/html";

/// Errors that can occur while saving a report.
#[derive(Debug, Error)]
pub enum ExportError {
    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// The report filename is empty or contains a path separator.
    #[error("invalid report filename: {0:?}")]
    InvalidFilename(String),
}

/// Terminal output of one compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub filename: String,
    pub mime_type: &'static str,
    pub data: Vec<u8>,
}

impl Report {
    #[must_use]
    pub fn new(filename: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            mime_type: REPORT_MIME_TYPE,
            data,
        }
    }

    /// Report body as text.
    #[must_use]
    pub fn as_text(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.data)
    }

    /// Writes the report into `directory` under its filename.
    ///
    /// The file is written atomically to prevent corruption.
    ///
    /// # Errors
    ///
    /// Returns `ExportError::InvalidFilename` if the filename would escape `directory`.
    /// Returns `ExportError::Io` if file operations fail.
    pub fn save_to(&self, directory: &Path) -> Result<PathBuf, ExportError> {
        let name = Path::new(&self.filename);
        if self.filename.is_empty() || name.file_name() != Some(name.as_os_str()) {
            return Err(ExportError::InvalidFilename(self.filename.clone()));
        }

        fs::create_dir_all(directory)?;
        let path = directory.join(name);
        write_atomic(&path, &self.data)?;
        Ok(path)
    }
}

/// Writes content to a file atomically using a temp file + rename.
///
/// This prevents partial writes if the process is interrupted.
pub fn write_atomic(path: &Path, content: &[u8]) -> io::Result<()> {
    let mut temp_name = path.file_name().unwrap_or_default().to_os_string();
    temp_name.push(".tmp");
    let temp_path = path.with_file_name(temp_name);

    fs::write(&temp_path, content)?;

    if let Err(e) = fs::rename(&temp_path, path) {
        // Clean up temp file on failure
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }

    Ok(())
}

/// Returns the default directory for saving reports.
///
/// Uses the user's Documents folder if available, otherwise falls back
/// to the current directory.
#[must_use]
pub fn default_export_directory() -> PathBuf {
    dirs::document_dir().unwrap_or_else(|| std::env::current_dir().unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn export_error_io_displays_correctly() {
        let err = ExportError::Io(io::Error::new(io::ErrorKind::NotFound, "file not found"));
        assert_eq!(err.to_string(), "I/O error: file not found");
    }

    #[test]
    fn report_uses_html_mime_type() {
        let report = Report::new("r.html", b"<html></html>".to_vec());
        assert_eq!(report.mime_type, "text/html");
        assert_eq!(report.as_text(), "<html></html>");
    }

    #[test]
    fn save_to_writes_file_without_leftover_temp() {
        let dir = tempdir().expect("failed to create temp dir");
        let report = Report::new("Diagnostics-Report.html", b"body".to_vec());
        let path = report
            .save_to(&dir.path().join("out"))
            .expect("save should succeed");
        assert_eq!(fs::read(&path).expect("read"), b"body");
        assert!(!dir
            .path()
            .join("out")
            .join("Diagnostics-Report.html.tmp")
            .exists());
    }

    #[test]
    fn save_to_rejects_nested_filename() {
        let dir = tempdir().expect("failed to create temp dir");
        let report = Report::new("../escape.html", Vec::new());
        assert!(matches!(
            report.save_to(dir.path()),
            Err(ExportError::InvalidFilename(_))
        ));
    }

    #[test]
    fn write_atomic_overwrites_existing_content() {
        let dir = tempdir().expect("failed to create temp dir");
        let path = dir.path().join("log.txt");
        fs::write(&path, b"old").expect("write");
        write_atomic(&path, b"new").expect("atomic write");
        assert_eq!(fs::read(&path).expect("read"), b"new");
    }

    #[test]
    fn default_export_directory_returns_valid_path() {
        let dir = default_export_directory();
        let _ = dir.to_string_lossy();
    }
}
