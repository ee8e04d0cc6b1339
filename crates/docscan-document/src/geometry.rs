// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Contour geometry on integer pixel coordinates — area, closed-curve
// polygon simplification and sub-pixel corner refinement.

use docscan_core::geometry::{Point, polygon_area};
use imageproc::point::Point as PixelPoint;

/// Convert a pixel-grid point to image-plane coordinates.
pub fn to_plane(p: PixelPoint<i32>) -> Point {
    Point::new(p.x as f32, p.y as f32)
}

/// Area enclosed by a closed contour (shoelace, absolute).
pub fn contour_area(contour: &[PixelPoint<i32>]) -> f32 {
    let vertices: Vec<Point> = contour.iter().copied().map(to_plane).collect();
    polygon_area(&vertices)
}

/// Douglas–Peucker simplification of a closed curve.
///
/// The returned polygon is implicitly closed and never repeats its first
/// vertex. See [`closed_polygon_vertices`].
pub fn approximate_closed_polygon(
    curve: &[PixelPoint<i32>],
    epsilon: f64,
) -> Vec<PixelPoint<i32>> {
    closed_polygon_vertices(curve, epsilon)
        .into_iter()
        .map(|i| curve[i])
        .collect()
}

/// Indices into `curve` of the vertices kept by Douglas–Peucker
/// simplification of the closed curve, in traversal order.
///
/// The curve is split at two mutually distant points (the point furthest from
/// the first sample, then the point furthest from that one) and each half is
/// simplified as an open chain. Both split points are vertices of the convex
/// hull, so the result does not depend on where contour tracing happened to
/// start.
pub fn closed_polygon_vertices(curve: &[PixelPoint<i32>], epsilon: f64) -> Vec<usize> {
    let n = curve.len();
    if n < 3 {
        return (0..n).collect();
    }

    let a = furthest_from(curve, curve[0]);
    let b = furthest_from(curve, curve[a]);
    let (start, end) = (a.min(b), a.max(b));
    if start == end {
        // Every sample coincides.
        return vec![start];
    }

    let first_half = &curve[start..=end];
    let second_half: Vec<PixelPoint<i32>> = curve[end..]
        .iter()
        .chain(curve[..=start].iter())
        .copied()
        .collect();

    let mut vertices: Vec<usize> = simplify_open_chain(first_half, epsilon)
        .into_iter()
        .map(|i| start + i)
        .collect();
    // `end` opens the second half; `start` already opened the first.
    vertices.pop();
    let mut tail: Vec<usize> = simplify_open_chain(&second_half, epsilon)
        .into_iter()
        .map(|i| (end + i) % n)
        .collect();
    tail.pop();
    vertices.extend(tail);
    vertices
}

/// Douglas–Peucker on an open chain, keeping both endpoints. Returns the
/// indices of the kept samples.
fn simplify_open_chain(chain: &[PixelPoint<i32>], epsilon: f64) -> Vec<usize> {
    let n = chain.len();
    if n <= 2 {
        return (0..n).collect();
    }

    let mut keep = vec![false; n];
    keep[0] = true;
    keep[n - 1] = true;

    let mut stack = vec![(0usize, n - 1)];
    while let Some((first, last)) = stack.pop() {
        if last <= first + 1 {
            continue;
        }
        let mut max_dist = 0.0f64;
        let mut split = first;
        for (i, p) in chain.iter().enumerate().take(last).skip(first + 1) {
            let d = distance_to_segment_line(*p, chain[first], chain[last]);
            if d > max_dist {
                max_dist = d;
                split = i;
            }
        }
        if max_dist > epsilon {
            keep[split] = true;
            stack.push((first, split));
            stack.push((split, last));
        }
    }

    keep.into_iter()
        .enumerate()
        .filter_map(|(i, k)| k.then_some(i))
        .collect()
}

// -- Corner refinement --------------------------------------------------------

/// Share of each side's samples dropped at both ends before line fitting.
/// Edge detection rounds corners off, so samples near a vertex belong to
/// neither side cleanly.
const SIDE_TRIM_DIVISOR: usize = 8;

/// A line in normal form: `x·nx + y·ny = offset`, with `(nx, ny)` a unit
/// vector.
#[derive(Debug, Clone, Copy, PartialEq)]
struct EdgeLine {
    nx: f64,
    ny: f64,
    offset: f64,
}

/// Sub-pixel polygon corners from a traced contour and its simplified
/// vertices.
///
/// Each side (the samples between two consecutive vertices) gets a
/// total-least-squares line fitted to its middle portion; every corner is
/// the intersection of the two sides that meet there. A corner whose sides
/// cannot be fitted or are near-parallel, or whose intersection lands more
/// than `max_shift` away from the simplified vertex, keeps the vertex itself.
pub fn refine_corners(
    curve: &[PixelPoint<i32>],
    vertices: &[usize],
    max_shift: f64,
) -> Vec<Point> {
    let k = vertices.len();
    if k < 3 {
        return vertices.iter().map(|&i| to_plane(curve[i])).collect();
    }

    let lines: Vec<Option<EdgeLine>> = (0..k)
        .map(|side| fit_edge_line(&side_samples(curve, vertices[side], vertices[(side + 1) % k])))
        .collect();

    (0..k)
        .map(|corner| {
            let vertex = curve[vertices[corner]];
            let incoming = lines[(corner + k - 1) % k];
            let outgoing = lines[corner];
            incoming
                .zip(outgoing)
                .and_then(|(a, b)| intersect_lines(&a, &b))
                .filter(|&(x, y)| {
                    (x - vertex.x as f64).hypot(y - vertex.y as f64) <= max_shift
                })
                .map(|(x, y)| Point::new(x as f32, y as f32))
                .unwrap_or_else(|| to_plane(vertex))
        })
        .collect()
}

/// Samples from `from` to `to` along the closed curve, both inclusive, with
/// the trimmed ends removed.
fn side_samples(curve: &[PixelPoint<i32>], from: usize, to: usize) -> Vec<PixelPoint<i32>> {
    let n = curve.len();
    let len = (to + n - from) % n + 1;
    let trim = len / SIDE_TRIM_DIVISOR;
    (trim..len - trim).map(|step| curve[(from + step) % n]).collect()
}

/// Total-least-squares line through `points`: the principal axis of their
/// scatter, passing through the centroid.
fn fit_edge_line(points: &[PixelPoint<i32>]) -> Option<EdgeLine> {
    if points.len() < 2 {
        return None;
    }
    let n = points.len() as f64;
    let mean_x = points.iter().map(|p| p.x as f64).sum::<f64>() / n;
    let mean_y = points.iter().map(|p| p.y as f64).sum::<f64>() / n;

    let (mut sxx, mut syy, mut sxy) = (0.0f64, 0.0f64, 0.0f64);
    for p in points {
        let dx = p.x as f64 - mean_x;
        let dy = p.y as f64 - mean_y;
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }
    if sxx + syy <= f64::EPSILON {
        return None;
    }

    let theta = 0.5 * (2.0 * sxy).atan2(sxx - syy);
    let (nx, ny) = (-theta.sin(), theta.cos());
    Some(EdgeLine {
        nx,
        ny,
        offset: nx * mean_x + ny * mean_y,
    })
}

/// Intersection of two lines, or `None` when they are (nearly) parallel.
fn intersect_lines(a: &EdgeLine, b: &EdgeLine) -> Option<(f64, f64)> {
    let det = a.nx * b.ny - a.ny * b.nx;
    if det.abs() < 1e-3 {
        return None;
    }
    let x = (a.offset * b.ny - b.offset * a.ny) / det;
    let y = (a.nx * b.offset - b.nx * a.offset) / det;
    Some((x, y))
}

/// Perpendicular distance from `p` to the line through `a` and `b`, or the
/// plain distance to `a` when the two coincide.
fn distance_to_segment_line(
    p: PixelPoint<i32>,
    a: PixelPoint<i32>,
    b: PixelPoint<i32>,
) -> f64 {
    let (px, py) = (p.x as f64, p.y as f64);
    let (ax, ay) = (a.x as f64, a.y as f64);
    let (dx, dy) = (b.x as f64 - ax, b.y as f64 - ay);
    let len = dx.hypot(dy);
    if len == 0.0 {
        return (px - ax).hypot(py - ay);
    }
    ((px - ax) * dy - (py - ay) * dx).abs() / len
}

fn furthest_from(curve: &[PixelPoint<i32>], origin: PixelPoint<i32>) -> usize {
    let mut best = 0;
    let mut best_dist = -1i64;
    for (i, p) in curve.iter().enumerate() {
        let dx = (p.x - origin.x) as i64;
        let dy = (p.y - origin.y) as i64;
        let d = dx * dx + dy * dy;
        if d > best_dist {
            best_dist = d;
            best = i;
        }
    }
    best
}
