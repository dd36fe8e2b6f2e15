// SPDX-License-Identifier: MPL-2.0
//! `diagnostics_journal` keeps a size-bounded diagnostic log for a running
//! application and compiles it, together with other data sources, into a
//! single self-contained HTML report.
//!
//! - [`logging`]: the log store, stdout/stderr capture, crash capture and the
//!   [`DiagnosticsLogger`](logging::DiagnosticsLogger) coordinator
//! - [`report`]: reporters, filters, insights and the
//!   [`ReportCompiler`](report::ReportCompiler)
//! - [`config`]: persisted settings and their defaults

#![doc(html_root_url = "https://docs.rs/diagnostics_journal/0.3.0")]

pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod report;
pub mod system_info;

pub use error::{Error, Result};
