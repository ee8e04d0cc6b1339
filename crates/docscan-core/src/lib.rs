// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// docscan — Core geometry, configuration, and error definitions shared across
// all crates.

pub mod config;
pub mod error;
pub mod geometry;
pub mod human_errors;

pub use config::{DetectorConfig, EnhancementConfig, ExportConfig, ScanConfig};
pub use error::{Result, ScanError};
pub use geometry::{Point, Quadrilateral, order_quadrilateral};
