// SPDX-License-Identifier: MPL-2.0
//! Diagnostics newtypes.
//!
//! This module provides type-safe wrappers for log store and insight values,
//! ensuring they are always within valid ranges.

use crate::config;
use std::time::Duration;

// =============================================================================
// Bounds
// =============================================================================

/// Maximum log size bounds (64 bytes to 64 MiB).
pub mod max_log_size_bounds {
    use crate::config;

    /// Minimum accepted maximum size.
    pub const MIN: u64 = config::MIN_MAX_LOG_SIZE_BYTES;
    /// Maximum accepted maximum size.
    pub const MAX: u64 = config::MAX_MAX_LOG_SIZE_BYTES;
    /// Default maximum size.
    pub const DEFAULT: u64 = config::DEFAULT_MAX_LOG_SIZE_BYTES;
}

/// Trim batch bounds (1 to 1000 entries).
pub mod trim_batch_bounds {
    use crate::config;

    pub const MIN: usize = config::MIN_TRIM_BATCH;
    pub const MAX: usize = config::MAX_TRIM_BATCH;
    pub const DEFAULT: usize = config::DEFAULT_TRIM_BATCH;
}

// =============================================================================
// MaxLogSize
// =============================================================================

/// Upper bound on the on-disk size of the log file, in bytes.
///
/// This newtype enforces validity at the type level, ensuring the value
/// is always within the valid range (64 bytes to 64 MiB).
///
/// # Example
///
/// ```
/// use diagnostics_journal::domain::diagnostics::MaxLogSize;
///
/// let size = MaxLogSize::new(4096);
/// assert_eq!(size.value(), 4096);
///
/// // Values outside range are clamped
/// let too_small = MaxLogSize::new(1);
/// assert_eq!(too_small.value(), 64);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MaxLogSize(u64);

impl MaxLogSize {
    /// Creates a new maximum size, clamping to valid range.
    #[must_use]
    pub fn new(value: u64) -> Self {
        Self(value.clamp(max_log_size_bounds::MIN, max_log_size_bounds::MAX))
    }

    /// Returns the value in bytes.
    #[must_use]
    pub fn value(self) -> u64 {
        self.0
    }

    /// Returns the value as `usize`, saturating on narrow targets.
    #[must_use]
    pub fn as_usize(self) -> usize {
        usize::try_from(self.0).unwrap_or(usize::MAX)
    }

    /// Returns true when `len` bytes fit under this bound.
    #[must_use]
    pub fn fits(self, len: usize) -> bool {
        len <= self.as_usize()
    }

    /// Returns true if this is the minimum value.
    #[must_use]
    pub fn is_min(self) -> bool {
        self.0 <= max_log_size_bounds::MIN
    }

    /// Returns true if this is the maximum value.
    #[must_use]
    pub fn is_max(self) -> bool {
        self.0 >= max_log_size_bounds::MAX
    }
}

impl Default for MaxLogSize {
    fn default() -> Self {
        Self(max_log_size_bounds::DEFAULT)
    }
}

// =============================================================================
// TrimBatch
// =============================================================================

/// Number of oldest entries removed per trim pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrimBatch(usize);

impl TrimBatch {
    /// Creates a new trim batch, clamping to valid range.
    #[must_use]
    pub fn new(value: usize) -> Self {
        Self(value.clamp(trim_batch_bounds::MIN, trim_batch_bounds::MAX))
    }

    #[must_use]
    pub fn value(self) -> usize {
        self.0
    }
}

impl Default for TrimBatch {
    fn default() -> Self {
        Self(trim_batch_bounds::DEFAULT)
    }
}

// =============================================================================
// InsightTimeout
// =============================================================================

/// Time an insight may take before it is treated as "no result".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsightTimeout(u64);

impl InsightTimeout {
    /// Creates a new timeout from milliseconds, clamping to valid range.
    #[must_use]
    pub fn new(millis: u64) -> Self {
        Self(millis.clamp(
            config::MIN_INSIGHT_TIMEOUT_MS,
            config::MAX_INSIGHT_TIMEOUT_MS,
        ))
    }

    /// Returns the timeout in milliseconds.
    #[must_use]
    pub fn millis(self) -> u64 {
        self.0
    }

    #[must_use]
    pub fn as_duration(self) -> Duration {
        Duration::from_millis(self.0)
    }
}

impl Default for InsightTimeout {
    fn default() -> Self {
        Self(config::DEFAULT_INSIGHT_TIMEOUT_MS)
    }
}

// =============================================================================
// Tests
// =============================================================================
