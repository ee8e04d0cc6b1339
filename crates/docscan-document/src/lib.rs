// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// docscan-document — Image pipeline for photographed documents.
//
// Provides page boundary detection (Canny edges + contour approximation),
// perspective rectification, readability enhancement (CLAHE + unsharp masking
// or adaptive binarization), and single-page PDF export of the result.

pub mod geometry;
pub mod image;
pub mod pdf;
pub mod scan;

// Re-export the primary entry points so callers can use `docscan_document::scan_document` etc.
pub use crate::image::Raster;
pub use pdf::{PageSink, PdfPageSink};
pub use scan::{
    DocumentScanner, PipelineResult, detect_boundary, enhance, rectify, rectify_quad,
    scan_document,
};
