// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Perspective rectification — map four page corners onto an axis-aligned
// rectangle and resample the page into it.

use docscan_core::error::{Result, ScanError};
use docscan_core::geometry::{Point, Quadrilateral, order_quadrilateral};
use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};
use tracing::{debug, info, instrument};

use crate::image::Raster;

/// Largest rectified output, in samples (pixels × channels), that will be
/// allocated. 2^30 samples is a 1 GiB buffer.
pub const MAX_OUTPUT_SAMPLES: u64 = 1 << 30;

/// Rectify the region bounded by `corners` (any order) into a flat,
/// top-down view.
///
/// The corners are ordered first, so exactly four distinct finite points are
/// required. See [`rectify_quad`] for sizing and sampling.
#[instrument(skip(image), fields(width = image.width(), height = image.height()))]
pub fn rectify(image: &Raster, corners: &[Point]) -> Result<Raster> {
    let quad = order_quadrilateral(corners)?;
    rectify_quad(image, &quad)
}

/// Rectify an already-ordered quadrilateral.
///
/// Output width is the longer of the top and bottom edges and output height
/// the longer of the left and right edges, floored and at least one pixel.
/// The four corners map exactly onto the output's corner pixel centres via a
/// projective transform; samples are taken with bilinear interpolation and
/// anything that falls outside the source is white. Channel count is kept.
#[instrument(skip(image, quad), fields(width = image.width(), height = image.height()))]
pub fn rectify_quad(image: &Raster, quad: &Quadrilateral) -> Result<Raster> {
    image.ensure_non_empty()?;

    let (out_w, out_h) = quad.target_size();
    check_output_size(out_w, out_h, image.channels())?;

    // A one-pixel-wide target would collapse the destination rectangle; keep
    // a unit span so the transform stays solvable.
    let right = (out_w - 1).max(1) as f32;
    let bottom = (out_h - 1).max(1) as f32;
    let dest: [(f32, f32); 4] = [
        (0.0, 0.0),      // top-left
        (right, 0.0),    // top-right
        (right, bottom), // bottom-right
        (0.0, bottom),   // bottom-left
    ];
    if has_collinear_triple(&quad.corners()) {
        return Err(ScanError::InvalidInput(format!(
            "corners {:?} are degenerate; three of them are collinear",
            quad.corners()
        )));
    }
    let src: [(f32, f32); 4] = quad.corners().map(<(f32, f32)>::from);

    debug!(
        top_left = ?src[0],
        top_right = ?src[1],
        bottom_right = ?src[2],
        bottom_left = ?src[3],
        out_w,
        out_h,
        "Computing projective transform"
    );

    let projection = Projection::from_control_points(src, dest).ok_or_else(|| {
        ScanError::InvalidInput(format!(
            "corners {:?} are degenerate; no projective transform exists",
            quad.corners()
        ))
    })?;

    let rectified = match image {
        Raster::Gray(gray) => {
            let mut output = GrayImage::new(out_w, out_h);
            warp_into(gray, &projection, Interpolation::Bilinear, Luma([255u8]), &mut output);
            Raster::Gray(output)
        }
        Raster::Rgb(rgb) => {
            let mut output = RgbImage::new(out_w, out_h);
            warp_into(
                rgb,
                &projection,
                Interpolation::Bilinear,
                Rgb([255u8, 255, 255]),
                &mut output,
            );
            Raster::Rgb(output)
        }
    };

    info!(out_w, out_h, "Perspective correction applied");
    Ok(rectified)
}

/// Refuse targets whose buffer would overflow or exceed
/// [`MAX_OUTPUT_SAMPLES`].
fn check_output_size(width: u32, height: u32, channels: u8) -> Result<()> {
    let samples = u64::from(width)
        .checked_mul(u64::from(height))
        .and_then(|n| n.checked_mul(u64::from(channels)))
        .filter(|&n| n <= MAX_OUTPUT_SAMPLES && usize::try_from(n).is_ok());
    match samples {
        Some(_) => Ok(()),
        None => Err(ScanError::InvalidInput(format!(
            "rectified page of {width}x{height} with {channels} channel(s) exceeds \
             the {MAX_OUTPUT_SAMPLES}-sample limit"
        ))),
    }
}

/// A projective transform onto a rectangle exists only if no three of the four
/// source corners lie on one line.
fn has_collinear_triple(corners: &[Point; 4]) -> bool {
    const TRIPLES: [[usize; 3]; 4] = [[0, 1, 2], [0, 1, 3], [0, 2, 3], [1, 2, 3]];
    TRIPLES.iter().any(|&[a, b, c]| {
        let (pa, pb, pc) = (corners[a], corners[b], corners[c]);
        let (abx, aby) = ((pb.x - pa.x) as f64, (pb.y - pa.y) as f64);
        let (acx, acy) = ((pc.x - pa.x) as f64, (pc.y - pa.y) as f64);
        let cross = abx * acy - aby * acx;
        cross.abs() <= 1e-9 * abx.hypot(aby) * acx.hypot(acy)
    })
}
