// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scan pipeline — detect the page, rectify it, enhance it, and optionally hand
// the result to a page sink.

use docscan_core::config::{EnhancementConfig, ScanConfig};
use docscan_core::error::{Result, ScanError};
use docscan_core::geometry::Quadrilateral;
use image::GrayImage;
use tracing::{debug, info, instrument, warn};

use crate::image::Raster;
use crate::pdf::writer::{PageSink, PdfPageSink};
use crate::scan::detect::detect_boundary;
use crate::scan::enhance::{enhance, enhance_owned};
use crate::scan::rectify::rectify_quad;

/// Output of one scan.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineResult {
    /// Enhanced single-channel page.
    pub image: GrayImage,
    /// Whether auto-crop found (and applied) a page boundary. `false` means
    /// `image` is the enhanced, uncropped original.
    pub boundary_found: bool,
    /// The boundary used for cropping, in original-image coordinates.
    pub boundary: Option<Quadrilateral>,
}

/// Scan `image` with the default detector settings.
///
/// Shorthand for [`DocumentScanner::scan`] with `auto_crop` and the given
/// enhancement mode.
pub fn scan_document(
    image: &Raster,
    auto_crop: bool,
    config: &EnhancementConfig,
) -> Result<PipelineResult> {
    DocumentScanner::new(ScanConfig {
        auto_crop,
        enhancement: *config,
        ..ScanConfig::default()
    })
    .scan(image)
}

/// Runs detection → rectification → enhancement for one image at a time.
///
/// Holds only immutable configuration, so a single scanner can be shared
/// across threads and reused for any number of independent images.
#[derive(Debug, Clone, Default)]
pub struct DocumentScanner {
    config: ScanConfig,
}

impl DocumentScanner {
    pub fn new(config: ScanConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Run the full pipeline:
    ///
    /// 1. If auto-crop is enabled, detect the page boundary and rectify it.
    ///    A miss keeps the original frame and reports `boundary_found = false`.
    /// 2. Enhance the (possibly rectified) page.
    ///
    /// Invalid input or configuration aborts the scan with an error; a
    /// detection miss never does.
    #[instrument(skip(self, image), fields(width = image.width(), height = image.height(), auto_crop = self.config.auto_crop))]
    pub fn scan(&self, image: &Raster) -> Result<PipelineResult> {
        image.ensure_non_empty()?;
        let config = self.config.validate()?;

        let cropped = if config.auto_crop {
            self.auto_crop(image, &config)?
        } else {
            debug!("Auto-crop disabled; using original frame");
            None
        };

        let (page, boundary) = match cropped {
            Some((page, quad)) => (enhance_owned(page, &config.enhancement)?, Some(quad)),
            None => (enhance(image, &config.enhancement)?, None),
        };

        info!(
            out_w = page.width(),
            out_h = page.height(),
            boundary_found = boundary.is_some(),
            "Scan complete"
        );
        Ok(PipelineResult {
            image: page,
            boundary_found: boundary.is_some(),
            boundary,
        })
    }

    /// Scan and write the result as a single-page PDF.
    #[instrument(skip(self, image))]
    pub fn scan_to_pdf(&self, image: &Raster) -> Result<(PipelineResult, Vec<u8>)> {
        let result = self.scan(image)?;
        let mut sink = PdfPageSink::new();
        if let Some(title) = &self.config.export.title {
            sink.set_title(title.clone());
        }
        let pdf = sink.write_page(&result.image, self.config.export.dpi)?;
        debug!(pdf_bytes = pdf.len(), "Scan-to-PDF complete");
        Ok((result, pdf))
    }

    /// Detect and rectify. `None` means the original frame should be used.
    fn auto_crop(
        &self,
        image: &Raster,
        config: &ScanConfig,
    ) -> Result<Option<(Raster, Quadrilateral)>> {
        let Some(quad) = detect_boundary(image, &config.detector)? else {
            return Ok(None);
        };

        match rectify_quad(image, &quad) {
            Ok(page) => Ok(Some((page, quad))),
            Err(ScanError::InvalidInput(reason)) => {
                warn!(%reason, "Detected boundary is degenerate; using original frame");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }
}
