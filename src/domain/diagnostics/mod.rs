// SPDX-License-Identifier: MPL-2.0
//! Diagnostics domain types.
//!
//! This module provides pure domain types for diagnostics:
//! - [`MaxLogSize`]: Upper bound on the log file size
//! - [`TrimBatch`]: Number of entries removed per trim pass
//! - [`InsightTimeout`]: Time budget of a single insight evaluation

mod newtypes;

pub use newtypes::{
    max_log_size_bounds, trim_batch_bounds, InsightTimeout, MaxLogSize, TrimBatch,
};
