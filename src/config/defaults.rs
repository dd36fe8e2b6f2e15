// SPDX-License-Identifier: MPL-2.0
//! Centralized default values for all configuration constants.
//!
//! This module serves as the single source of truth for default values
//! used across the crate. Constants are organized by category.
//!
//! # Categories
//!
//! - **Log Store**: Maximum on-disk size and trim batch size
//! - **Insights**: Evaluation timeout for advisory insights
//! - **Report**: Default filename and chapter titles
//! - **Runtime**: Environment switches

// ==========================================================================
// Log Store Defaults
// ==========================================================================

/// Default maximum size of the log file (2 MiB).
pub const DEFAULT_MAX_LOG_SIZE_BYTES: u64 = 2 * 1024 * 1024;

/// Smallest accepted maximum log size.
///
/// Anything smaller cannot hold even a compacted entry fragment.
pub const MIN_MAX_LOG_SIZE_BYTES: u64 = 64;

/// Largest accepted maximum log size (64 MiB).
pub const MAX_MAX_LOG_SIZE_BYTES: u64 = 64 * 1024 * 1024;

/// Default number of oldest entries removed per trim pass.
pub const DEFAULT_TRIM_BATCH: usize = 10;

/// Minimum trim batch.
pub const MIN_TRIM_BATCH: usize = 1;

/// Maximum trim batch.
pub const MAX_TRIM_BATCH: usize = 1000;

/// File name of the log inside the log directory.
pub const LOG_FILE_NAME: &str = "diagnostics_log.txt";

// ==========================================================================
// Insight Defaults
// ==========================================================================

/// Default time an insight may take before it counts as "no result".
pub const DEFAULT_INSIGHT_TIMEOUT_MS: u64 = 5_000;

/// Minimum insight timeout.
pub const MIN_INSIGHT_TIMEOUT_MS: u64 = 10;

/// Maximum insight timeout.
pub const MAX_INSIGHT_TIMEOUT_MS: u64 = 60_000;

/// Free disk space under which the storage insight warns (1 GB, decimal).
pub const LOW_STORAGE_THRESHOLD_BYTES: u64 = 1_000_000_000;

// ==========================================================================
// Report Defaults
// ==========================================================================

/// Default file name of a compiled report.
pub const DEFAULT_REPORT_FILENAME: &str = "Diagnostics-Report.html";

/// Title of the chapter produced by the insights reporter.
pub const INSIGHTS_CHAPTER_TITLE: &str = "Smart Insights";

/// Title of the chapter produced by the logs reporter.
pub const LOGS_CHAPTER_TITLE: &str = "Logs";

/// Default max depth for directory tree chapters.
pub const DEFAULT_DIRECTORY_TREE_DEPTH: usize = 8;

/// Default max number of children rendered per directory.
pub const DEFAULT_DIRECTORY_TREE_LENGTH: usize = 10;

// ==========================================================================
// Runtime Switches
// ==========================================================================

/// Environment variable marking a test/harness execution context.
///
/// When set to a non-empty value other than `0`, stream interception is
/// disabled and `setup()` may run more than once.
pub const TEST_HARNESS_ENV: &str = "DIAGNOSTICS_JOURNAL_TEST_HARNESS";

// ==========================================================================
// Compile-time Validation
// ==========================================================================

const _: () = {
    assert!(MIN_MAX_LOG_SIZE_BYTES > 0);
    assert!(MAX_MAX_LOG_SIZE_BYTES >= MIN_MAX_LOG_SIZE_BYTES);
    assert!(DEFAULT_MAX_LOG_SIZE_BYTES >= MIN_MAX_LOG_SIZE_BYTES);
    assert!(DEFAULT_MAX_LOG_SIZE_BYTES <= MAX_MAX_LOG_SIZE_BYTES);

    assert!(MIN_TRIM_BATCH > 0);
    assert!(DEFAULT_TRIM_BATCH >= MIN_TRIM_BATCH);
    assert!(DEFAULT_TRIM_BATCH <= MAX_TRIM_BATCH);

    assert!(MIN_INSIGHT_TIMEOUT_MS > 0);
    assert!(DEFAULT_INSIGHT_TIMEOUT_MS >= MIN_INSIGHT_TIMEOUT_MS);
    assert!(DEFAULT_INSIGHT_TIMEOUT_MS <= MAX_INSIGHT_TIMEOUT_MS);
};
