// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Raster — an 8-bit image whose channel count is part of its type. Wraps the
// `image` crate's buffers and adapts its decoders/encoders.

use docscan_core::error::{Result, ScanError};
use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, ImageFormat, RgbImage};
use tracing::{debug, info, instrument};

/// An 8-bit raster image, either single-channel or three-channel.
///
/// Pipeline stages borrow a `Raster` and return a new one; nothing is
/// modified in place.
#[derive(Debug, Clone, PartialEq)]
pub enum Raster {
    /// One luma channel.
    Gray(GrayImage),
    /// Three colour channels.
    Rgb(RgbImage),
}

impl Raster {
    // -- Construction ---------------------------------------------------------

    /// Wrap an already-decoded `DynamicImage`.
    ///
    /// Single-channel sources (with or without alpha) become `Gray`; all other
    /// layouts are converted to 8-bit RGB. Alpha is discarded.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        match image {
            DynamicImage::ImageLuma8(gray) => Self::Gray(gray),
            DynamicImage::ImageRgb8(rgb) => Self::Rgb(rgb),
            other if !other.color().has_color() => Self::Gray(other.to_luma8()),
            other => Self::Rgb(other.to_rgb8()),
        }
    }

    /// Decode raw encoded bytes (JPEG, PNG, TIFF, etc.).
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let img = image::load_from_memory(data).map_err(|err| {
            ScanError::ImageError(format!("failed to decode image: {}", err))
        })?;
        debug!(
            width = img.width(),
            height = img.height(),
            "Image decoded from bytes"
        );
        Ok(Self::from_dynamic(img))
    }

    /// Load an image from a file path.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let img = image::open(path.as_ref()).map_err(|err| {
            ScanError::ImageError(format!(
                "failed to open {}: {}",
                path.as_ref().display(),
                err
            ))
        })?;
        info!(width = img.width(), height = img.height(), "Image loaded");
        Ok(Self::from_dynamic(img))
    }

    // -- Accessors ------------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.dimensions().0
    }

    pub fn height(&self) -> u32 {
        self.dimensions().1
    }

    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            Self::Gray(img) => img.dimensions(),
            Self::Rgb(img) => img.dimensions(),
        }
    }

    /// Number of samples per pixel: 1 or 3.
    pub fn channels(&self) -> u8 {
        match self {
            Self::Gray(_) => 1,
            Self::Rgb(_) => 3,
        }
    }

    /// Fail with `InvalidInput` if either dimension is zero.
    pub fn ensure_non_empty(&self) -> Result<()> {
        let (width, height) = self.dimensions();
        if width == 0 || height == 0 {
            return Err(ScanError::InvalidInput(format!(
                "image has a zero dimension ({width}x{height})"
            )));
        }
        Ok(())
    }

    // -- Conversions ----------------------------------------------------------

    /// Single-channel copy of the image. Gray input is returned as-is.
    pub fn to_gray(&self) -> GrayImage {
        match self {
            Self::Gray(img) => img.clone(),
            Self::Rgb(img) => imageops::grayscale(img),
        }
    }

    /// Consume the raster and return its single-channel form without copying
    /// gray input.
    pub fn into_gray(self) -> GrayImage {
        match self {
            Self::Gray(img) => img,
            Self::Rgb(img) => imageops::grayscale(&img),
        }
    }

    pub fn into_dynamic(self) -> DynamicImage {
        match self {
            Self::Gray(img) => DynamicImage::ImageLuma8(img),
            Self::Rgb(img) => DynamicImage::ImageRgb8(img),
        }
    }

    /// Aspect-preserving resize to exactly `height` rows. Width is rounded and
    /// never drops below one pixel.
    #[instrument(skip(self))]
    pub fn resize_to_height(&self, height: u32) -> Self {
        let (src_w, src_h) = self.dimensions();
        if src_h == height || src_h == 0 {
            return self.clone();
        }
        let width = ((src_w as f64 * height as f64 / src_h as f64).round() as u32).max(1);
        debug!(from_w = src_w, from_h = src_h, width, height, "Resizing image");
        match self {
            Self::Gray(img) => Self::Gray(imageops::resize(img, width, height, FilterType::Triangle)),
            Self::Rgb(img) => Self::Rgb(imageops::resize(img, width, height, FilterType::Triangle)),
        }
    }

    // -- Output ---------------------------------------------------------------

    /// Encode the image as PNG bytes.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut buffer);
        self.clone()
            .into_dynamic()
            .write_to(&mut cursor, ImageFormat::Png)
            .map_err(|err| ScanError::ImageError(format!("image encoding failed: {}", err)))?;
        Ok(buffer)
    }
}

impl From<GrayImage> for Raster {
    fn from(img: GrayImage) -> Self {
        Self::Gray(img)
    }
}

impl From<RgbImage> for Raster {
    fn from(img: RgbImage) -> Self {
        Self::Rgb(img)
    }
}
