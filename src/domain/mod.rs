// SPDX-License-Identifier: MPL-2.0
//! Domain layer - value objects with no I/O.
//!
//! # Modules
//!
//! - [`diagnostics`]: bounded settings ([`MaxLogSize`](diagnostics::MaxLogSize),
//!   [`TrimBatch`](diagnostics::TrimBatch), [`InsightTimeout`](diagnostics::InsightTimeout))

pub mod diagnostics;
