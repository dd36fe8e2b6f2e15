// SPDX-License-Identifier: MPL-2.0
//! Log entry model and its on-disk fragment format.
//!
//! Every entry is materialized as one self-delimiting HTML paragraph:
//!
//! ```text
//! <p class="debug"><span class="log-date">2026-01-01 12:00:00.000</span><span class="log-prefix">src/app.rs:L12 app::run</span><span class="log-message">Started</span></p>
//! ```
//!
//! The message is HTML-escaped and line breaks become `<br>`, so a fragment
//! never contains a literal `</p>` or a raw newline before its terminator.

use std::fmt;

use chrono::{DateTime, Local};

use crate::report::html;
use crate::system_info::SystemInfo;

/// Timestamp format used in fragments.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Category tag of an entry, used as the fragment's CSS class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Captured standard output/error line.
    System,
    /// Message logged by application code.
    Debug,
    /// Error logged by application code or a panic.
    Error,
    /// Per-process session marker.
    Session,
}

impl Category {
    /// CSS class name of the category.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Debug => "debug",
            Self::Error => "error",
            Self::Session => "session",
        }
    }

    /// Parses a CSS class name back into a category.
    #[must_use]
    pub fn from_class(class: &str) -> Option<Self> {
        match class {
            "system" => Some(Self::System),
            "debug" => Some(Self::Debug),
            "error" => Some(Self::Error),
            "session" => Some(Self::Session),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source location a log call originated from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    pub file: String,
    pub function: String,
    pub line: u32,
}

impl Origin {
    #[must_use]
    pub fn new(file: impl Into<String>, function: impl Into<String>, line: u32) -> Self {
        Self {
            file: file.into(),
            function: function.into(),
            line,
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:L{} {}", self.file, self.line, self.function)
    }
}

/// What an entry carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEntryKind {
    System { line: String },
    Debug { message: String, origin: Origin },
    Error { description: String, origin: Origin },
    Session { metadata: Vec<(String, String)> },
}

/// One immutable log entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub timestamp: DateTime<Local>,
    pub kind: LogEntryKind,
}

impl LogEntry {
    fn new(kind: LogEntryKind) -> Self {
        Self {
            timestamp: Local::now(),
            kind,
        }
    }

    /// Entry for a captured line of process output.
    #[must_use]
    pub fn system(line: impl Into<String>) -> Self {
        Self::new(LogEntryKind::System { line: line.into() })
    }

    #[must_use]
    pub fn debug(message: impl Into<String>, origin: Origin) -> Self {
        Self::new(LogEntryKind::Debug {
            message: message.into(),
            origin,
        })
    }

    /// Entry for an error, including its `source()` chain.
    #[must_use]
    pub fn error(
        error: &dyn std::error::Error,
        description: Option<&str>,
        origin: Origin,
    ) -> Self {
        Self::new(LogEntryKind::Error {
            description: describe_error(error, description),
            origin,
        })
    }

    /// Error entry from already-rendered text, e.g. a panic message.
    #[must_use]
    pub fn error_text(description: impl Into<String>, origin: Origin) -> Self {
        Self::new(LogEntryKind::Error {
            description: description.into(),
            origin,
        })
    }

    /// Session marker carrying device and system metadata.
    #[must_use]
    pub fn session(metadata: Vec<(String, String)>) -> Self {
        Self::new(LogEntryKind::Session { metadata })
    }

    /// Session marker for the current host.
    #[must_use]
    pub fn session_for_host(app_version: &str) -> Self {
        Self::session(SystemInfo::collect().session_pairs(app_version))
    }

    #[must_use]
    pub fn category(&self) -> Category {
        match self.kind {
            LogEntryKind::System { .. } => Category::System,
            LogEntryKind::Debug { .. } => Category::Debug,
            LogEntryKind::Error { .. } => Category::Error,
            LogEntryKind::Session { .. } => Category::Session,
        }
    }

    /// Text shown in the prefix span.
    #[must_use]
    pub fn prefix(&self) -> String {
        match &self.kind {
            LogEntryKind::System { .. } => "SYSTEM".to_string(),
            LogEntryKind::Debug { origin, .. } => origin.to_string(),
            LogEntryKind::Error { origin, .. } => format!("ERROR {origin}"),
            LogEntryKind::Session { .. } => "SESSION".to_string(),
        }
    }

    /// Unescaped message text.
    #[must_use]
    pub fn message(&self) -> String {
        match &self.kind {
            LogEntryKind::System { line } => line.clone(),
            LogEntryKind::Debug { message, .. } => message.clone(),
            LogEntryKind::Error { description, .. } => description.clone(),
            LogEntryKind::Session { metadata } => metadata
                .iter()
                .map(|(key, value)| format!("{key}: {value}"))
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }

    /// Full on-disk fragment, terminated by a newline.
    #[must_use]
    pub fn to_fragment(&self) -> String {
        format!(
            "<p class=\"{}\"><span class=\"log-date\">{}</span><span class=\"log-prefix\">{}</span><span class=\"log-message\">{}</span></p>\n",
            self.category(),
            self.timestamp.format(TIMESTAMP_FORMAT),
            html::escape(&self.prefix()),
            html::escape_multiline(&self.message()),
        )
    }

    /// Minimal fragment holding as much of the message as fits in `max_len` bytes.
    ///
    /// Used when the full fragment alone exceeds the log's maximum size.
    /// Truncation happens on whole escaped characters, never inside an
    /// entity or a multi-byte sequence.
    #[must_use]
    pub fn to_compact_fragment(&self, max_len: usize) -> String {
        let open = format!("<p class=\"{}\">", self.category());
        let close = "</p>\n";
        let budget = max_len.saturating_sub(open.len() + close.len());

        let mut body = String::new();
        let mut piece = String::new();
        for ch in self.message().chars() {
            piece.clear();
            html::push_escaped_multiline(&mut piece, ch);
            if body.len() + piece.len() > budget {
                break;
            }
            body.push_str(&piece);
        }

        format!("{open}{body}{close}")
    }
}

/// Renders an error with its cause chain and an optional description.
#[must_use]
pub fn describe_error(error: &dyn std::error::Error, description: Option<&str>) -> String {
    let mut text = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        text.push_str(" | caused by: ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    if let Some(description) = description {
        text.push_str(" | ");
        text.push_str(description);
    }
    text
}
