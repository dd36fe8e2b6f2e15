// SPDX-License-Identifier: MPL-2.0
//! Diagnostics report compilation.
//!
//! A report is an ordered list of [`Chapter`]s produced by [`Reporter`]s,
//! passed through [`ReportFilter`]s, with a "Smart Insights" chapter
//! evaluated last and inserted at the position it was listed. The
//! [`ReportCompiler`] serializes everything into one self-contained HTML
//! [`Report`].
//!
//! # Example
//!
//! ```no_run
//! use diagnostics_journal::report::{
//!     GeneralInfoReporter, InsightsReporter, PathRedactionFilter, ReportCompiler, Section,
//!     SystemMetadataReporter,
//! };
//!
//! # async fn run() {
//! let report = ReportCompiler::new()
//!     .with_filter(PathRedactionFilter::new())
//!     .compile(vec![
//!         Section::reporter(GeneralInfoReporter::default()),
//!         Section::insights(InsightsReporter::new()),
//!         Section::reporter(SystemMetadataReporter::new("Photo Viewer", "2.4.0")),
//!     ])
//!     .await;
//! assert_eq!(report.mime_type, "text/html");
//! # }
//! ```

pub mod chapter;
pub mod compiler;
pub mod directory_tree;
pub mod document;
pub mod export;
pub mod filter;
pub mod html;
pub mod insight;
pub mod insights_reporter;
pub mod logs_reporter;
pub mod reporter;

use std::io;

use thiserror::Error;

use crate::logging::LoggerError;

pub use chapter::{Chapter, ChapterContent};
pub use compiler::ReportCompiler;
pub use directory_tree::{DirectoryTreeReporter, TreeNode, TreeOptions};
pub use export::{default_export_directory, ExportError, Report, REPORT_MIME_TYPE};
pub use filter::{IdentityRedactionFilter, PathRedactionFilter, ReportFilter};
pub use insight::{
    DeviceStorageInsight, ErrorPattern, ErrorPatternProvider, Insight, InsightResult,
    InsightsProvider, StaticInsight,
};
pub use insights_reporter::InsightsReporter;
pub use logs_reporter::LogsReporter;
pub use reporter::{GeneralInfoReporter, Reporter, Section, SystemMetadataReporter};

/// Failure of one reporter. The chapter is omitted, the report still builds.
#[derive(Debug, Error)]
pub enum ReporterError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("log unavailable: {0}")]
    Logger(#[from] LoggerError),
    #[error("data source unavailable: {0}")]
    Unavailable(String),
}

/// Failure of one filter on one chapter.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct FilterError(pub String);
