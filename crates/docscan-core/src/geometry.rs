// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Plane geometry for document corners — points, ordered quadrilaterals,
// distances, and polygon area. No imaging dependencies.

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScanError};

/// A point in image-plane coordinates (x to the right, y downwards).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f32, f32)> for Point {
    fn from((x, y): (f32, f32)) -> Self {
        Self { x, y }
    }
}

impl From<Point> for (f32, f32) {
    fn from(p: Point) -> Self {
        (p.x, p.y)
    }
}

/// Four document corners in canonical order.
///
/// The only way to build one is [`order_quadrilateral`], so every value is
/// already normalised to top-left, top-right, bottom-right, bottom-left. No
/// convexity is implied: a self-intersecting set of corners orders just as
/// well as a clean rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Quadrilateral {
    top_left: Point,
    top_right: Point,
    bottom_right: Point,
    bottom_left: Point,
}

impl Quadrilateral {
    pub fn top_left(&self) -> Point {
        self.top_left
    }

    pub fn top_right(&self) -> Point {
        self.top_right
    }

    pub fn bottom_right(&self) -> Point {
        self.bottom_right
    }

    pub fn bottom_left(&self) -> Point {
        self.bottom_left
    }

    /// Corners as `[TL, TR, BR, BL]`.
    pub fn corners(&self) -> [Point; 4] {
        [
            self.top_left,
            self.top_right,
            self.bottom_right,
            self.bottom_left,
        ]
    }

    /// Uniformly scale every corner about the origin.
    ///
    /// A positive factor keeps the corner order intact, which is what maps
    /// geometry found on a downsampled image back to full resolution.
    pub fn scaled(&self, factor: f32) -> Result<Self> {
        if !(factor.is_finite() && factor > 0.0) {
            return Err(ScanError::InvalidInput(format!(
                "scale factor must be finite and positive, got {factor}"
            )));
        }
        let scale = |p: Point| Point::new(p.x * factor, p.y * factor);
        Ok(Self {
            top_left: scale(self.top_left),
            top_right: scale(self.top_right),
            bottom_right: scale(self.bottom_right),
            bottom_left: scale(self.bottom_left),
        })
    }

    /// Output size of a rectification of this quadrilateral: the longer of each
    /// pair of opposite edges, floored, never below one pixel.
    pub fn target_size(&self) -> (u32, u32) {
        let width = distance(self.bottom_right, self.bottom_left)
            .max(distance(self.top_right, self.top_left));
        let height = distance(self.top_right, self.bottom_right)
            .max(distance(self.top_left, self.bottom_left));
        (floor_dimension(width), floor_dimension(height))
    }

    /// Enclosed area via the shoelace formula (zero for degenerate corners).
    pub fn area(&self) -> f32 {
        polygon_area(&self.corners())
    }
}

fn floor_dimension(length: f32) -> u32 {
    if length.is_finite() && length >= 1.0 {
        length.floor() as u32
    } else {
        1
    }
}

/// Sort four unordered corner points into `{TL, TR, BR, BL}`.
///
/// TL minimises `x + y` and BR maximises it among the rest. Of the two points
/// left over, TR lies furthest toward the top-right (smallest `y - x`) and BL
/// takes the other. Ties go to the earliest point in `points`.
///
/// Fails unless exactly four finite, pairwise distinct points are supplied.
pub fn order_quadrilateral(points: &[Point]) -> Result<Quadrilateral> {
    if points.len() != 4 {
        return Err(ScanError::InvalidInput(format!(
            "a quadrilateral needs exactly 4 corner points, got {}",
            points.len()
        )));
    }
    if let Some(bad) = points.iter().find(|p| !p.is_finite()) {
        return Err(ScanError::InvalidInput(format!(
            "corner point has non-finite coordinates: {bad:?}"
        )));
    }
    for i in 0..points.len() {
        for j in (i + 1)..points.len() {
            if points[i] == points[j] {
                return Err(ScanError::InvalidInput(format!(
                    "corner points must be distinct, {:?} appears twice",
                    points[i]
                )));
            }
        }
    }

    let mut remaining: Vec<usize> = (0..4).collect();

    let tl = take_extreme(&mut remaining, points, |p| p.x + p.y, Extreme::Min);
    let br = take_extreme(&mut remaining, points, |p| p.x + p.y, Extreme::Max);
    let tr = take_extreme(&mut remaining, points, |p| p.y - p.x, Extreme::Min);
    let bl = remaining[0];

    Ok(Quadrilateral {
        top_left: points[tl],
        top_right: points[tr],
        bottom_right: points[br],
        bottom_left: points[bl],
    })
}

#[derive(Clone, Copy)]
enum Extreme {
    Min,
    Max,
}

/// Remove and return the index in `candidates` whose key is extreme. Strict
/// comparison keeps the first occurrence on ties.
fn take_extreme(
    candidates: &mut Vec<usize>,
    points: &[Point],
    key: impl Fn(&Point) -> f32,
    extreme: Extreme,
) -> usize {
    let mut best_pos = 0;
    for pos in 1..candidates.len() {
        let current = key(&points[candidates[pos]]);
        let best = key(&points[candidates[best_pos]]);
        let better = match extreme {
            Extreme::Min => current < best,
            Extreme::Max => current > best,
        };
        if better {
            best_pos = pos;
        }
    }
    candidates.remove(best_pos)
}

/// Euclidean distance between two points.
pub fn distance(a: Point, b: Point) -> f32 {
    (a.x - b.x).hypot(a.y - b.y)
}

/// Absolute area of a simple polygon given by its vertices in order (CW or
/// CCW), using the shoelace formula. Fewer than three vertices → 0.
pub fn polygon_area(vertices: &[Point]) -> f32 {
    let n = vertices.len();
    if n < 3 {
        return 0.0;
    }
    let mut twice_area = 0.0f64;
    for i in 0..n {
        let j = (i + 1) % n;
        twice_area += vertices[i].x as f64 * vertices[j].y as f64;
        twice_area -= vertices[j].x as f64 * vertices[i].y as f64;
    }
    (twice_area.abs() / 2.0) as f32
}

// -- Tests --------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn corners() -> [Point; 4] {
        [
            Point::new(12.0, 8.0),
            Point::new(205.0, 20.0),
            Point::new(190.0, 310.0),
            Point::new(4.0, 290.0),
        ]
    }

    /// Visit every permutation of four indices.
    fn permutations() -> Vec<[usize; 4]> {
        let mut out = Vec::new();
        for a in 0..4 {
            for b in 0..4 {
                for c in 0..4 {
                    for d in 0..4 {
                        let idx = [a, b, c, d];
                        let mut seen = [false; 4];
                        idx.iter().for_each(|&i| seen[i] = true);
                        if seen.iter().all(|&s| s) {
                            out.push(idx);
                        }
                    }
                }
            }
        }
        out
    }

    #[test]
    fn orders_skewed_corners() {
        let [a, b, c, d] = corners();
        let quad = order_quadrilateral(&[c, a, d, b]).unwrap();
        assert_eq!(quad.top_left(), a);
        assert_eq!(quad.top_right(), b);
        assert_eq!(quad.bottom_right(), c);
        assert_eq!(quad.bottom_left(), d);
    }

    #[test]
    fn ordering_is_permutation_invariant() {
        let pts = corners();
        let reference = order_quadrilateral(&pts).unwrap();
        let perms = permutations();
        assert_eq!(perms.len(), 24);
        for perm in perms {
            let shuffled: Vec<Point> = perm.iter().map(|&i| pts[i]).collect();
            let ordered = order_quadrilateral(&shuffled).unwrap();
            assert_eq!(ordered, reference, "permutation {perm:?}");
            // Re-ordering an ordered quad is a no-op.
            assert_eq!(order_quadrilateral(&ordered.corners()).unwrap(), ordered);
        }
    }

    #[test]
    fn sum_ties_go_to_the_earlier_point() {
        let (a, b) = (Point::new(0.0, 10.0), Point::new(10.0, 0.0));
        let (br, other) = (Point::new(20.0, 20.0), Point::new(5.0, 30.0));

        let quad = order_quadrilateral(&[a, b, br, other]).unwrap();
        assert_eq!(quad.top_left(), a);
        assert_eq!(quad.top_right(), b);

        let quad = order_quadrilateral(&[b, a, br, other]).unwrap();
        assert_eq!(quad.top_left(), b);
        assert_eq!(quad.top_right(), a);
        assert_eq!(quad.bottom_right(), br);
        assert_eq!(quad.bottom_left(), other);
    }

    #[test]
    fn difference_ties_go_to_the_earlier_point() {
        // (2,5) and (6,9) share y - x = 3.
        let (tl, br) = (Point::new(0.0, 0.0), Point::new(10.0, 10.0));
        let (p, q) = (Point::new(2.0, 5.0), Point::new(6.0, 9.0));

        let quad = order_quadrilateral(&[tl, p, br, q]).unwrap();
        assert_eq!(quad.top_right(), p);
        assert_eq!(quad.bottom_left(), q);

        let quad = order_quadrilateral(&[tl, q, br, p]).unwrap();
        assert_eq!(quad.top_right(), q);
        assert_eq!(quad.bottom_left(), p);
    }

    #[test]
    fn rejects_wrong_point_count() {
        let pts = corners();
        assert!(matches!(
            order_quadrilateral(&pts[..3]),
            Err(ScanError::InvalidInput(_))
        ));
        let mut five = pts.to_vec();
        five.push(Point::new(1.0, 1.0));
        assert!(order_quadrilateral(&five).is_err());
    }

    #[test]
    fn rejects_duplicate_points() {
        let [a, b, c, _] = corners();
        let err = order_quadrilateral(&[a, b, c, a]).unwrap_err();
        assert!(err.to_string().contains("distinct"), "{err}");
    }

    #[test]
    fn rejects_non_finite_points() {
        let [a, b, c, _] = corners();
        assert!(order_quadrilateral(&[a, b, c, Point::new(f32::NAN, 3.0)]).is_err());
    }

    #[test]
    fn target_size_uses_longest_opposite_edges() {
        let quad = order_quadrilateral(&[
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
            Point::new(110.5, 50.0),
            Point::new(0.0, 50.0),
        ])
        .unwrap();
        let (w, h) = quad.target_size();
        assert_eq!(w, 110);
        // Right edge: sqrt(10.5^2 + 50^2) ≈ 51.09.
        assert_eq!(h, 51);
    }

    #[test]
    fn target_size_is_at_least_one_pixel() {
        let quad = order_quadrilateral(&[
            Point::new(0.0, 0.0),
            Point::new(0.3, 0.0),
            Point::new(0.3, 0.2),
            Point::new(0.0, 0.2),
        ])
        .unwrap();
        assert_eq!(quad.target_size(), (1, 1));
    }

    #[test]
    fn scaling_keeps_order() {
        let quad = order_quadrilateral(&corners()).unwrap();
        let scaled = quad.scaled(2.5).unwrap();
        assert_eq!(scaled.top_left(), Point::new(30.0, 20.0));
        assert_eq!(order_quadrilateral(&scaled.corners()).unwrap(), scaled);
        assert!(quad.scaled(0.0).is_err());
    }

    #[test]
    fn polygon_area_rectangle() {
        let rect = [
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 5.0),
            Point::new(0.0, 5.0),
        ];
        assert!((polygon_area(&rect) - 50.0).abs() < 1e-3);
        assert_eq!(polygon_area(&rect[..2]), 0.0);
    }

    #[test]
    fn distance_is_euclidean() {
        assert!((distance(Point::new(0.0, 0.0), Point::new(3.0, 4.0)) - 5.0).abs() < 1e-6);
    }
}
