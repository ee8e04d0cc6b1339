// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page boundary detection — find the quadrilateral outline of a photographed
// document using edge detection and contour approximation.

use docscan_core::config::DetectorConfig;
use docscan_core::error::Result;
use docscan_core::geometry::{Point, Quadrilateral, order_quadrilateral};
use image::GrayImage;
use imageproc::contours::find_contours;
use imageproc::edges::canny;
use imageproc::geometry::arc_length;
use imageproc::point::Point as PixelPoint;
use tracing::{debug, info, instrument, warn};

use crate::geometry::{closed_polygon_vertices, contour_area, refine_corners};
use crate::image::Raster;
use crate::scan::filters::gaussian_blur_kernel;

/// A traced contour ranked by enclosed area.
#[derive(Debug, Clone)]
struct Candidate {
    points: Vec<PixelPoint<i32>>,
    area: f32,
}

/// Locate the document outline in `image`.
///
/// ## Pipeline
///
/// 1. Resize to `working_height` rows (aspect-preserving), remembering the
///    ratio back to the original
/// 2. Convert to grayscale
/// 3. Gaussian blur (`blur_kernel` × `blur_kernel`)
/// 4. Canny edge detection
/// 5. Trace every contour in the edge map, outer borders and holes alike
/// 6. Rank contours by enclosed area, largest first, keeping discovery order
///    among equal areas; keep the top `max_candidates`
/// 7. Approximate each candidate as a polygon at `approx_epsilon_ratio` of its
///    perimeter; the first one with exactly four vertices wins
/// 8. Refine its corners to sub-pixel accuracy by intersecting lines fitted
///    to each side's samples
///
/// The refined corners are ordered and scaled back to original coordinates.
/// `Ok(None)` means no candidate qualified: the caller should keep the
/// original frame. No convexity or minimum-area check is applied, so a
/// degenerate four-vertex outline is returned as found.
#[instrument(skip(image, config), fields(width = image.width(), height = image.height()))]
pub fn detect_boundary(image: &Raster, config: &DetectorConfig) -> Result<Option<Quadrilateral>> {
    image.ensure_non_empty()?;
    let config = config.validate()?;

    let ratio = image.height() as f32 / config.working_height as f32;
    let working = image.resize_to_height(config.working_height).into_gray();
    debug!(
        ratio,
        working_w = working.width(),
        working_h = working.height(),
        "Working image prepared"
    );

    let blurred = gaussian_blur_kernel(&working, config.blur_kernel);
    let edges = canny(&blurred, config.canny_low, config.canny_high);

    let candidates = rank_candidates(&edges, config.max_candidates);
    debug!(candidates = candidates.len(), "Contours ranked by area");

    for (rank, candidate) in candidates.iter().enumerate() {
        let perimeter = arc_length(&candidate.points, true);
        let epsilon = config.approx_epsilon_ratio as f64 * perimeter;
        if epsilon <= 0.0 {
            continue;
        }
        let vertices = closed_polygon_vertices(&candidate.points, epsilon);
        debug!(
            rank,
            area = candidate.area,
            perimeter,
            vertices = vertices.len(),
            "Candidate approximated"
        );
        if vertices.len() != 4 {
            continue;
        }

        let corners: Vec<Point> = refine_corners(&candidate.points, &vertices, epsilon);
        let quad = match order_quadrilateral(&corners) {
            Ok(quad) => quad,
            Err(err) => {
                // Only reachable when the trace doubles back on itself.
                debug!(rank, %err, "Four-vertex candidate could not be ordered");
                continue;
            }
        };
        let quad = quad.scaled(ratio)?;

        info!(
            rank,
            top_left = ?quad.top_left(),
            top_right = ?quad.top_right(),
            bottom_right = ?quad.bottom_right(),
            bottom_left = ?quad.bottom_left(),
            "Document boundary detected"
        );
        return Ok(Some(quad));
    }

    warn!("No four-cornered contour found; document boundary not detected");
    Ok(None)
}

/// Trace contours in a binary edge map and return the `limit` largest by area.
///
/// The sort is stable, so equal areas keep the order in which tracing found
/// them.
fn rank_candidates(edges: &GrayImage, limit: usize) -> Vec<Candidate> {
    let mut candidates: Vec<Candidate> = find_contours::<i32>(edges)
        .into_iter()
        .filter(|c| c.points.len() >= 3)
        .map(|c| Candidate {
            area: contour_area(&c.points),
            points: c.points,
        })
        .collect();

    candidates.sort_by(|a, b| b.area.total_cmp(&a.area));
    candidates.truncate(limit);
    candidates
}
