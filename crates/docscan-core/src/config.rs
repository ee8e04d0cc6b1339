// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scan configuration — detector tuning, enhancement mode, and export settings.
//
// Validation policy: window sizes that must be odd (binarization block, blur
// kernel) are normalised by rounding up to the next odd value ≥ 3. Every other
// out-of-range value is rejected with `ScanError::ConfigInvalid`.

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScanError};

/// Enhancement strategy applied to the (possibly rectified) page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum EnhancementConfig {
    /// Tile-local histogram equalisation followed by unsharp masking.
    AdaptiveContrast {
        /// Contrast limit per tile, relative to a flat histogram.
        clip_limit: f32,
        /// Unsharp-mask weight: `out = e·(1+a) − blur·a`.
        sharpen_amount: f32,
    },
    /// Black-and-white output using a local-mean threshold.
    Binarization {
        /// Side of the square averaging window. Normalised to odd, ≥ 3.
        block_size: u32,
        /// Subtracted from the local mean before comparing.
        c_constant: f32,
        /// Run a 3×3 median filter over the binary result.
        #[serde(default)]
        despeckle: bool,
    },
}

impl EnhancementConfig {
    pub const DEFAULT_CLIP_LIMIT: f32 = 2.0;
    pub const DEFAULT_SHARPEN_AMOUNT: f32 = 1.0;
    pub const DEFAULT_BLOCK_SIZE: u32 = 11;
    pub const DEFAULT_C_CONSTANT: f32 = 2.0;

    /// Adaptive-contrast mode with default parameters.
    pub fn adaptive_contrast() -> Self {
        Self::AdaptiveContrast {
            clip_limit: Self::DEFAULT_CLIP_LIMIT,
            sharpen_amount: Self::DEFAULT_SHARPEN_AMOUNT,
        }
    }

    /// Binarization mode with default parameters.
    pub fn binarization() -> Self {
        Self::Binarization {
            block_size: Self::DEFAULT_BLOCK_SIZE,
            c_constant: Self::DEFAULT_C_CONSTANT,
            despeckle: false,
        }
    }

    /// Check parameters and return the normalised configuration.
    pub fn validate(&self) -> Result<Self> {
        match *self {
            Self::AdaptiveContrast {
                clip_limit,
                sharpen_amount,
            } => {
                require_positive("clip_limit", clip_limit)?;
                require_positive("sharpen_amount", sharpen_amount)?;
                Ok(*self)
            }
            Self::Binarization {
                block_size,
                c_constant,
                despeckle,
            } => {
                if !c_constant.is_finite() {
                    return Err(ScanError::ConfigInvalid(format!(
                        "c_constant must be finite, got {c_constant}"
                    )));
                }
                Ok(Self::Binarization {
                    block_size: normalize_odd_window(block_size),
                    c_constant,
                    despeckle,
                })
            }
        }
    }
}

impl Default for EnhancementConfig {
    fn default() -> Self {
        Self::adaptive_contrast()
    }
}

/// Tuning for automatic page boundary detection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Height in pixels the frame is resized to before edge detection.
    pub working_height: u32,
    /// Gaussian kernel side for pre-smoothing. Normalised to odd, ≥ 3.
    pub blur_kernel: u32,
    /// Canny hysteresis thresholds on gradient magnitude.
    pub canny_low: f32,
    pub canny_high: f32,
    /// How many of the largest contours are tried, by area.
    pub max_candidates: usize,
    /// Polygon approximation tolerance as a fraction of contour perimeter.
    pub approx_epsilon_ratio: f32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            working_height: 500,
            blur_kernel: 5,
            canny_low: 75.0,
            canny_high: 200.0,
            max_candidates: 5,
            approx_epsilon_ratio: 0.02,
        }
    }
}

impl DetectorConfig {
    /// Check parameters and return the normalised configuration.
    pub fn validate(&self) -> Result<Self> {
        if self.working_height == 0 {
            return Err(ScanError::ConfigInvalid(
                "working_height must be at least 1".into(),
            ));
        }
        if self.max_candidates == 0 {
            return Err(ScanError::ConfigInvalid(
                "max_candidates must be at least 1".into(),
            ));
        }
        if !(self.canny_low.is_finite()
            && self.canny_high.is_finite()
            && self.canny_low >= 0.0
            && self.canny_low <= self.canny_high)
        {
            return Err(ScanError::ConfigInvalid(format!(
                "Canny thresholds must satisfy 0 <= low <= high, got {}/{}",
                self.canny_low, self.canny_high
            )));
        }
        require_positive("approx_epsilon_ratio", self.approx_epsilon_ratio)?;
        Ok(Self {
            blur_kernel: normalize_odd_window(self.blur_kernel),
            ..*self
        })
    }
}

/// Settings handed to the page sink when exporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Resolution hint: raster pixels per inch on the emitted page.
    pub dpi: f32,
    /// Title embedded in document metadata.
    pub title: Option<String>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            dpi: 100.0,
            title: None,
        }
    }
}

impl ExportConfig {
    pub fn validate(&self) -> Result<()> {
        require_positive("dpi", self.dpi)
    }
}

/// Full per-invocation configuration for a scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Detect the page boundary and rectify before enhancing.
    pub auto_crop: bool,
    pub detector: DetectorConfig,
    pub enhancement: EnhancementConfig,
    pub export: ExportConfig,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            auto_crop: true,
            detector: DetectorConfig::default(),
            enhancement: EnhancementConfig::default(),
            export: ExportConfig::default(),
        }
    }
}

impl ScanConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Validate every section, returning the normalised configuration.
    pub fn validate(&self) -> Result<Self> {
        self.export.validate()?;
        Ok(Self {
            auto_crop: self.auto_crop,
            detector: self.detector.validate()?,
            enhancement: self.enhancement.validate()?,
            export: self.export.clone(),
        })
    }
}

/// Round a window size up to the nearest odd value, with a floor of 3.
pub fn normalize_odd_window(size: u32) -> u32 {
    let size = size.max(3);
    if size % 2 == 0 { size + 1 } else { size }
}

fn require_positive(name: &str, value: f32) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ScanError::ConfigInvalid(format!(
            "{name} must be finite and positive, got {value}"
        )))
    }
}
