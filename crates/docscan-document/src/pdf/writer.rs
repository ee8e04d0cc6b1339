// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page sinks — turn a finished grayscale scan into a single-page document.
//
// printpdf 0.8 uses a data-oriented API: documents are built by constructing
// `PdfPage` structs containing `Vec<Op>` operation lists, then serialised via
// `PdfDocument::save()`.

use std::path::Path;

use docscan_core::error::{Result, ScanError};
use image::GrayImage;
use printpdf::{
    Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Pt, RawImage, RawImageData,
    RawImageFormat, XObjectTransform,
};
use tracing::{debug, info, instrument};

/// Accepts one finished 8-bit grayscale page and emits an encoded document.
///
/// `dpi` is a resolution hint: how many raster pixels make up one inch of the
/// emitted page.
pub trait PageSink {
    fn write_page(&self, page: &GrayImage, dpi: f32) -> Result<Vec<u8>>;
}

/// Writes a scan as a single-page PDF whose page is exactly the size of the
/// raster at the requested resolution.
#[derive(Debug, Clone, Default)]
pub struct PdfPageSink {
    /// Title metadata embedded in the PDF /Info dictionary.
    title: Option<String>,
}

impl PdfPageSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a title for the PDF metadata.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
    }

    /// Write the page PDF directly to a file.
    pub fn write_page_to_file(
        &self,
        page: &GrayImage,
        dpi: f32,
        path: impl AsRef<Path>,
    ) -> Result<()> {
        let bytes = self.write_page(page, dpi)?;
        std::fs::write(path.as_ref(), &bytes)?;
        info!("Wrote scan PDF to {}", path.as_ref().display());
        Ok(())
    }
}

impl PageSink for PdfPageSink {
    #[instrument(skip(self, page), fields(width = page.width(), height = page.height()))]
    fn write_page(&self, page: &GrayImage, dpi: f32) -> Result<Vec<u8>> {
        if !(dpi.is_finite() && dpi > 0.0) {
            return Err(ScanError::InvalidInput(format!(
                "page resolution must be finite and positive, got {dpi}"
            )));
        }
        let (width, height) = page.dimensions();
        if width == 0 || height == 0 {
            return Err(ScanError::InvalidInput(format!(
                "cannot export an empty page ({width}x{height})"
            )));
        }

        let title = self.title.as_deref().unwrap_or("Scanned Document");
        let page_w = Mm(width as f32 / dpi * 25.4);
        let page_h = Mm(height as f32 / dpi * 25.4);
        info!(title, dpi, page_w_mm = page_w.0, page_h_mm = page_h.0, "Creating scan PDF");

        let raw = RawImage {
            pixels: RawImageData::U8(page.as_raw().clone()),
            width: width as usize,
            height: height as usize,
            data_format: RawImageFormat::R8,
            tag: Vec::new(),
        };

        let mut doc = PdfDocument::new(title);
        let xobject_id = doc.add_image(&raw);

        // At its own DPI the raster covers the page exactly.
        let ops = vec![Op::UseXobject {
            id: xobject_id,
            transform: XObjectTransform {
                translate_x: Some(Pt(0.0)),
                translate_y: Some(Pt(0.0)),
                scale_x: Some(1.0),
                scale_y: Some(1.0),
                dpi: Some(dpi),
                rotate: None,
            },
        }];

        doc.with_pages(vec![PdfPage::new(page_w, page_h, ops)]);

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let output = doc.save(&PdfSaveOptions::default(), &mut warnings);
        if output.is_empty() {
            return Err(ScanError::PdfError("PDF writer produced no output".into()));
        }

        debug!(pdf_bytes = output.len(), warnings = warnings.len(), "Scan PDF serialised");
        Ok(output)
    }
}
