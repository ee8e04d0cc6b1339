// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanning pipeline — page boundary detection, perspective rectification,
// and readability enhancement.

pub mod detect;
pub mod enhance;
mod filters;
pub mod pipeline;
pub mod rectify;

pub use detect::detect_boundary;
pub use enhance::enhance;
pub use pipeline::{DocumentScanner, PipelineResult, scan_document};
pub use rectify::{rectify, rectify_quad};
