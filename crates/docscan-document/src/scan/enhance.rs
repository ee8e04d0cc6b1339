// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Readability enhancement for scanned pages — tile-local contrast limiting
// with unsharp masking, or adaptive local-mean binarization.

use docscan_core::config::EnhancementConfig;
use docscan_core::error::Result;
use image::{GrayImage, Luma};
use imageproc::filter::{gaussian_blur_f32, median_filter};
use tracing::{debug, info, instrument};

use crate::image::Raster;
use crate::scan::filters::gaussian_blur_kernel;

/// Tiles per axis for contrast-limited equalisation.
pub const CLAHE_TILE_GRID: u32 = 8;

/// Blur applied before taking the unsharp difference.
pub const UNSHARP_SIGMA: f32 = 3.0;

/// Smoothing window applied before binarization.
pub const BINARIZE_BLUR_KERNEL: u32 = 5;

/// Enhance a page for readability.
///
/// The image is reduced to a single channel first (gray input is used as-is),
/// then processed according to `config`. Output dimensions always equal the
/// input's.
///
/// Fails with `InvalidInput` for an empty image and `ConfigInvalid` for
/// out-of-range parameters; an even block size is rounded up to the next odd
/// value.
#[instrument(skip(image), fields(width = image.width(), height = image.height()))]
pub fn enhance(image: &Raster, config: &EnhancementConfig) -> Result<GrayImage> {
    image.ensure_non_empty()?;
    let config = config.validate()?;
    Ok(apply(image.to_gray(), &config))
}

/// Like [`enhance`], consuming the raster so gray input is not copied.
pub fn enhance_owned(image: Raster, config: &EnhancementConfig) -> Result<GrayImage> {
    image.ensure_non_empty()?;
    let config = config.validate()?;
    Ok(apply(image.into_gray(), &config))
}

fn apply(gray: GrayImage, config: &EnhancementConfig) -> GrayImage {
    match *config {
        EnhancementConfig::AdaptiveContrast {
            clip_limit,
            sharpen_amount,
        } => {
            info!(clip_limit, sharpen_amount, "Applying adaptive contrast");
            let equalized = clahe(&gray, clip_limit, CLAHE_TILE_GRID);
            unsharp_mask(&equalized, UNSHARP_SIGMA, sharpen_amount)
        }
        EnhancementConfig::Binarization {
            block_size,
            c_constant,
            despeckle,
        } => {
            info!(block_size, c_constant, despeckle, "Applying adaptive binarization");
            let smoothed = gaussian_blur_kernel(&gray, BINARIZE_BLUR_KERNEL);
            let binary = binarize(&smoothed, block_size, c_constant);
            if despeckle {
                median_filter(&binary, 1, 1)
            } else {
                binary
            }
        }
    }
}

// -- Contrast-limited adaptive histogram equalisation -------------------------

/// Contrast-limited adaptive histogram equalisation.
///
/// The image is split into a `grid × grid` array of tiles (fewer if the image
/// is smaller than the grid). Each tile's histogram is clipped at
/// `clip_limit · tile_area / 256` counts (at least one), the clipped excess is
/// spread evenly over all bins, and the tile's cumulative distribution becomes
/// its lookup table. Each output pixel blends the lookup tables of the four
/// nearest tile centres bilinearly, so tile seams do not show.
pub fn clahe(gray: &GrayImage, clip_limit: f32, grid: u32) -> GrayImage {
    let (width, height) = gray.dimensions();
    if width == 0 || height == 0 {
        return gray.clone();
    }
    let grid_x = grid.clamp(1, width);
    let grid_y = grid.clamp(1, height);

    let x_bounds = tile_bounds(width, grid_x);
    let y_bounds = tile_bounds(height, grid_y);

    let mut luts: Vec<[u8; 256]> = Vec::with_capacity((grid_x * grid_y) as usize);
    for ty in 0..grid_y as usize {
        for tx in 0..grid_x as usize {
            let mut histogram = [0u32; 256];
            for y in y_bounds[ty]..y_bounds[ty + 1] {
                for x in x_bounds[tx]..x_bounds[tx + 1] {
                    histogram[gray.get_pixel(x, y).0[0] as usize] += 1;
                }
            }
            let area = (x_bounds[tx + 1] - x_bounds[tx]) * (y_bounds[ty + 1] - y_bounds[ty]);
            luts.push(tile_lut(&mut histogram, area, clip_limit));
        }
    }
    debug!(grid_x, grid_y, "Tile lookup tables built");

    let tile_w = width as f32 / grid_x as f32;
    let tile_h = height as f32 / grid_y as f32;
    let lut = |tx: usize, ty: usize| &luts[ty * grid_x as usize + tx];

    GrayImage::from_fn(width, height, |x, y| {
        let (tx0, tx1, wx) = neighbour_tiles(x, tile_w, grid_x);
        let (ty0, ty1, wy) = neighbour_tiles(y, tile_h, grid_y);
        let v = gray.get_pixel(x, y).0[0] as usize;

        let top = (1.0 - wx) * lut(tx0, ty0)[v] as f32 + wx * lut(tx1, ty0)[v] as f32;
        let bottom = (1.0 - wx) * lut(tx0, ty1)[v] as f32 + wx * lut(tx1, ty1)[v] as f32;
        let value = (1.0 - wy) * top + wy * bottom;
        Luma([value.round().clamp(0.0, 255.0) as u8])
    })
}

/// Split `length` pixels into `tiles` contiguous spans; returns `tiles + 1`
/// boundaries.
fn tile_bounds(length: u32, tiles: u32) -> Vec<u32> {
    (0..=tiles)
        .map(|k| (k as u64 * length as u64 / tiles as u64) as u32)
        .collect()
}

/// The two tiles whose centres bracket pixel `pos` along one axis, and the
/// blend weight of the second.
fn neighbour_tiles(pos: u32, tile_len: f32, tiles: u32) -> (usize, usize, f32) {
    let f = (pos as f32 + 0.5) / tile_len - 0.5;
    let lower = f.floor();
    let weight = f - lower;
    let last = tiles as i64 - 1;
    let first_tile = (lower as i64).clamp(0, last) as usize;
    let second_tile = (lower as i64 + 1).clamp(0, last) as usize;
    (first_tile, second_tile, weight)
}

/// Clip a tile histogram, redistribute the excess, and turn it into a lookup
/// table via the cumulative distribution.
fn tile_lut(histogram: &mut [u32; 256], area: u32, clip_limit: f32) -> [u8; 256] {
    let mut lut = [0u8; 256];
    if area == 0 {
        return lut;
    }

    let clip = ((clip_limit * area as f32 / 256.0) as u32).max(1);
    let mut excess = 0u32;
    for count in histogram.iter_mut() {
        if *count > clip {
            excess += *count - clip;
            *count = clip;
        }
    }

    let per_bin = excess / 256;
    let mut residual = excess % 256;
    for count in histogram.iter_mut() {
        *count += per_bin;
    }
    if residual > 0 {
        let step = (256 / residual).max(1) as usize;
        for count in histogram.iter_mut().step_by(step) {
            if residual == 0 {
                break;
            }
            *count += 1;
            residual -= 1;
        }
    }

    let scale = 255.0 / area as f32;
    let mut cumulative = 0u32;
    for (value, count) in histogram.iter().enumerate() {
        cumulative += count;
        lut[value] = (cumulative as f32 * scale).round().clamp(0.0, 255.0) as u8;
    }
    lut
}

// -- Unsharp masking ----------------------------------------------------------

/// Sharpen by subtracting a blurred copy: `out = e·(1+a) − blur(e)·a`,
/// clamped to 0..=255.
pub fn unsharp_mask(gray: &GrayImage, sigma: f32, amount: f32) -> GrayImage {
    let blurred = gaussian_blur_f32(gray, sigma);
    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        let e = gray.get_pixel(x, y).0[0] as f32;
        let b = blurred.get_pixel(x, y).0[0] as f32;
        let value = e * (1.0 + amount) - b * amount;
        Luma([value.round().clamp(0.0, 255.0) as u8])
    })
}

// -- Binarization -------------------------------------------------------------

/// Adaptive local-mean threshold.
///
/// For each pixel the mean over a `block_size × block_size` window (clipped
/// at the image border) is computed from an integral image. The pixel becomes
/// white when it is brighter than `mean − c`, black otherwise.
pub fn binarize(gray: &GrayImage, block_size: u32, c: f32) -> GrayImage {
    let (width, height) = gray.dimensions();
    let radius = block_size / 2;
    let integral = compute_integral_image(gray);
    let c = c as f64;

    let output = GrayImage::from_fn(width, height, |x, y| {
        let local_mean = region_mean(&integral, width, height, x, y, radius);
        let pixel_val = gray.get_pixel(x, y).0[0] as f64;
        Luma([if pixel_val > local_mean - c { 255u8 } else { 0u8 }])
    });

    debug!(radius, "Binarization complete");
    output
}

// -- Integral image helpers ---------------------------------------------------

/// Compute the integral (summed-area table) of a grayscale image.
///
/// `integral[y * (width+1) + x]` contains the sum of all pixel values in the
/// rectangle [0, 0) to (x, y) (exclusive on both axes). The table has
/// dimensions `(width+1) x (height+1)` with a zero-padded border.
fn compute_integral_image(gray: &GrayImage) -> Vec<u64> {
    let (w, h) = gray.dimensions();
    let stride = (w + 1) as usize;
    let mut table = vec![0u64; stride * (h + 1) as usize];

    for y in 0..h {
        let mut row_sum: u64 = 0;
        for x in 0..w {
            row_sum += gray.get_pixel(x, y).0[0] as u64;
            let idx = (y + 1) as usize * stride + (x + 1) as usize;
            let above = y as usize * stride + (x + 1) as usize;
            table[idx] = row_sum + table[above];
        }
    }

    table
}

/// Mean pixel value within a square region centred on (cx, cy) with the given
/// radius, clamped to the image, using the precomputed integral image.
fn region_mean(
    integral: &[u64],
    img_width: u32,
    img_height: u32,
    cx: u32,
    cy: u32,
    radius: u32,
) -> f64 {
    let stride = (img_width + 1) as usize;

    let x1 = cx.saturating_sub(radius) as usize;
    let y1 = cy.saturating_sub(radius) as usize;
    let x2 = (cx as usize + radius as usize + 1).min(img_width as usize);
    let y2 = (cy as usize + radius as usize + 1).min(img_height as usize);

    let area = ((x2 - x1) * (y2 - y1)) as f64;

    // Summed-area table lookup: S = I[y2][x2] - I[y1][x2] - I[y2][x1] + I[y1][x1]
    let sum = integral[y2 * stride + x2] as f64 - integral[y1 * stride + x2] as f64
        - integral[y2 * stride + x1] as f64
        + integral[y1 * stride + x1] as f64;

    sum / area
}

// -- Tests --------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use docscan_core::error::ScanError;
    use image::{Rgb, RgbImage};
    use imageproc::drawing::draw_filled_rect_mut;
    use imageproc::rect::Rect;

    /// A light page with dark "text" strokes and a lighting gradient.
    fn document_like(width: u32, height: u32) -> GrayImage {
        let mut img = GrayImage::from_fn(width, height, |x, _| Luma([(150 + x * 60 / width) as u8]));
        for row in 0..(height / 20) {
            let y = row as i32 * 20 + 6;
            draw_filled_rect_mut(&mut img, Rect::at(10, y).of_size(width / 2, 4), Luma([40u8]));
        }
        img
    }

    fn distinct_values(img: &GrayImage) -> Vec<u8> {
        let mut seen = [false; 256];
        img.pixels().for_each(|p| seen[p.0[0] as usize] = true);
        (0..=255u8).filter(|&v| seen[v as usize]).collect()
    }

    #[test]
    fn binarization_is_two_valued() {
        let raster = Raster::Gray(document_like(160, 120));
        let out = enhance(&raster, &EnhancementConfig::binarization()).unwrap();
        assert_eq!(out.dimensions(), (160, 120));
        assert!(distinct_values(&out).iter().all(|&v| v == 0 || v == 255));
    }

    #[test]
    fn binarization_separates_text_from_page() {
        let raster = Raster::Gray(document_like(160, 120));
        let out = enhance(&raster, &EnhancementConfig::binarization()).unwrap();
        // Middle of the first stroke is dark; clear page far to the right is white.
        assert_eq!(out.get_pixel(40, 8).0[0], 0);
        assert_eq!(out.get_pixel(150, 60).0[0], 255);
    }

    #[test]
    fn uniform_gray_binarizes_to_white() {
        let raster = Raster::Gray(GrayImage::from_pixel(200, 150, Luma([128u8])));
        let cfg = EnhancementConfig::Binarization {
            block_size: 91,
            c_constant: 15.0,
            despeckle: false,
        };
        let out = enhance(&raster, &cfg).unwrap();
        assert!(out.pixels().all(|p| p.0[0] == 255));
    }

    #[test]
    fn negative_constant_turns_uniform_black() {
        let raster = Raster::Gray(GrayImage::from_pixel(40, 40, Luma([128u8])));
        let cfg = EnhancementConfig::Binarization {
            block_size: 11,
            c_constant: -5.0,
            despeckle: false,
        };
        let out = enhance(&raster, &cfg).unwrap();
        assert!(out.pixels().all(|p| p.0[0] == 0));
    }

    #[test]
    fn despeckle_removes_isolated_pixels() {
        let mut img = GrayImage::from_pixel(30, 30, Luma([200u8]));
        img.put_pixel(15, 15, Luma([0u8]));
        let binary = binarize(&img, 11, 2.0);
        assert_eq!(binary.get_pixel(15, 15).0[0], 0);
        let cleaned = median_filter(&binary, 1, 1);
        assert_eq!(cleaned.get_pixel(15, 15).0[0], 255);
    }

    #[test]
    fn even_block_size_is_accepted() {
        let raster = Raster::Gray(document_like(64, 64));
        let cfg = EnhancementConfig::Binarization {
            block_size: 10,
            c_constant: 2.0,
            despeckle: true,
        };
        let out = enhance(&raster, &cfg).unwrap();
        assert!(distinct_values(&out).iter().all(|&v| v == 0 || v == 255));
    }

    #[test]
    fn adaptive_contrast_preserves_dimensions() {
        for (w, h) in [(37u32, 53u32), (3, 2), (1, 1), (256, 100)] {
            let raster = Raster::Gray(GrayImage::from_fn(w, h, |x, y| Luma([((x * 7 + y * 3) % 256) as u8])));
            let out = enhance(&raster, &EnhancementConfig::adaptive_contrast()).unwrap();
            assert_eq!(out.dimensions(), (w, h));
        }
    }

    #[test]
    fn colour_input_becomes_single_channel() {
        let raster = Raster::Rgb(RgbImage::from_pixel(20, 10, Rgb([200, 100, 50])));
        let out = enhance(&raster, &EnhancementConfig::adaptive_contrast()).unwrap();
        assert_eq!(out.dimensions(), (20, 10));
    }

    #[test]
    fn clahe_stretches_low_contrast() {
        let img = GrayImage::from_fn(128, 128, |x, _| Luma([(100 + x * 40 / 128) as u8]));
        let out = clahe(&img, 2.0, CLAHE_TILE_GRID);
        let range = |im: &GrayImage| {
            let values = distinct_values(im);
            values[values.len() - 1] as i32 - values[0] as i32
        };
        assert!(range(&out) > range(&img), "{} vs {}", range(&out), range(&img));
    }

    #[test]
    fn unsharp_mask_keeps_flat_regions() {
        let img = GrayImage::from_pixel(32, 32, Luma([90u8]));
        let out = unsharp_mask(&img, UNSHARP_SIGMA, 1.5);
        assert!(out.pixels().all(|p| (p.0[0] as i32 - 90).abs() <= 2));
    }

    #[test]
    fn unsharp_mask_increases_edge_contrast() {
        let img = GrayImage::from_fn(40, 10, |x, _| Luma([if x < 20 { 80 } else { 170 }]));
        let out = unsharp_mask(&img, UNSHARP_SIGMA, 1.0);
        assert!(out.get_pixel(19, 5).0[0] < 80);
        assert!(out.get_pixel(20, 5).0[0] > 170);
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        let raster = Raster::Gray(GrayImage::from_pixel(8, 8, Luma([10u8])));
        let cfg = EnhancementConfig::AdaptiveContrast {
            clip_limit: -1.0,
            sharpen_amount: 1.0,
        };
        assert!(matches!(
            enhance(&raster, &cfg),
            Err(ScanError::ConfigInvalid(_))
        ));
    }

    #[test]
    fn empty_image_is_invalid_input() {
        let raster = Raster::Gray(GrayImage::new(5, 0));
        assert!(matches!(
            enhance(&raster, &EnhancementConfig::binarization()),
            Err(ScanError::InvalidInput(_))
        ));
    }

    #[test]
    fn region_mean_full_image() {
        // 2x2 image with values [10, 20; 30, 40], mean = 25.
        let mut img = GrayImage::new(2, 2);
        img.put_pixel(0, 0, Luma([10]));
        img.put_pixel(1, 0, Luma([20]));
        img.put_pixel(0, 1, Luma([30]));
        img.put_pixel(1, 1, Luma([40]));
        let integral = compute_integral_image(&img);
        let mean = region_mean(&integral, 2, 2, 0, 0, 5);
        assert!((mean - 25.0).abs() < 1e-9);
    }
}
