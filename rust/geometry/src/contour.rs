// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! 2D contours in the working plane
//!
//! After projection with [`crate::Transformation::to_xy_plane`] every loop is a
//! plain 2D contour. Outer boundaries are kept counter-clockwise and holes
//! clockwise, which is what the non-zero fill rule of the overlay expects.

use nalgebra::{Point2, Point3};

/// A closed 2D loop without a repeated closing point
pub type Contour = Vec<Point2<f64>>;

/// Outer contour plus holes in the working plane
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Shape2D {
    /// Outer boundary (counter-clockwise)
    pub outer: Contour,
    /// Holes (clockwise)
    pub holes: Vec<Contour>,
}

impl Shape2D {
    pub fn new(outer: Contour) -> Self {
        Self {
            outer,
            holes: Vec::new(),
        }
    }

    pub fn with_holes(outer: Contour, holes: Vec<Contour>) -> Self {
        Self { outer, holes }
    }

    /// Outer area minus hole areas
    pub fn net_area(&self) -> f64 {
        compute_signed_area(&self.outer).abs()
            - self
                .holes
                .iter()
                .map(|h| compute_signed_area(h).abs())
                .sum::<f64>()
    }

    /// Outer counter-clockwise, holes clockwise
    pub fn normalized(&self) -> Self {
        Self {
            outer: ensure_ccw(&self.outer),
            holes: self.holes.iter().map(|h| ensure_cw(h)).collect(),
        }
    }

    /// Point inside the outer contour and outside every hole
    pub fn contains_point(&self, p: &Point2<f64>) -> bool {
        point_in_contour(p, &self.outer) && !self.holes.iter().any(|h| point_in_contour(p, h))
    }
}

/// Drop the Z coordinate of a point already in the working plane
#[inline]
pub fn to_2d(p: &Point3<f64>) -> Point2<f64> {
    Point2::new(p.x, p.y)
}

/// Lift a working-plane point back to Z=0
#[inline]
pub fn to_3d(p: &Point2<f64>) -> Point3<f64> {
    Point3::new(p.x, p.y, 0.0)
}

/// Compute the signed area of a 2D contour
/// Positive = counter-clockwise, Negative = clockwise
pub fn compute_signed_area(contour: &[Point2<f64>]) -> f64 {
    if contour.len() < 3 {
        return 0.0;
    }

    let mut area = 0.0;
    let n = contour.len();

    for i in 0..n {
        let j = (i + 1) % n;
        area += contour[i].x * contour[j].y;
        area -= contour[j].x * contour[i].y;
    }

    area * 0.5
}

/// Sum of edge lengths, closing edge included
pub fn contour_perimeter(contour: &[Point2<f64>]) -> f64 {
    let n = contour.len();
    if n < 2 {
        return 0.0;
    }
    (0..n)
        .map(|i| (contour[(i + 1) % n] - contour[i]).norm())
        .sum()
}

/// Width of the thinnest strip with the same area and perimeter.
/// Slivers left over from floating-point overlays have a width near zero.
pub fn effective_width(contour: &[Point2<f64>]) -> f64 {
    let perimeter = contour_perimeter(contour);
    if perimeter == 0.0 {
        return 0.0;
    }
    2.0 * compute_signed_area(contour).abs() / perimeter
}

/// Ensure contour has counter-clockwise winding (positive area)
pub fn ensure_ccw(contour: &[Point2<f64>]) -> Contour {
    let area = compute_signed_area(contour);
    if area < 0.0 {
        contour.iter().rev().cloned().collect()
    } else {
        contour.to_vec()
    }
}

/// Ensure contour has clockwise winding (for holes)
pub fn ensure_cw(contour: &[Point2<f64>]) -> Contour {
    let area = compute_signed_area(contour);
    if area > 0.0 {
        contour.iter().rev().cloned().collect()
    } else {
        contour.to_vec()
    }
}

/// Check if a point is inside a contour using ray casting
pub fn point_in_contour(point: &Point2<f64>, contour: &[Point2<f64>]) -> bool {
    if contour.len() < 3 {
        return false;
    }

    let mut inside = false;
    let n = contour.len();

    let mut j = n - 1;
    for i in 0..n {
        let pi = &contour[i];
        let pj = &contour[j];

        if ((pi.y > point.y) != (pj.y > point.y))
            && (point.x < (pj.x - pi.x) * (point.y - pi.y) / (pj.y - pi.y) + pi.x)
        {
            inside = !inside;
        }
        j = i;
    }

    inside
}

/// Distance from `p` to the segment `a`-`b` and the clamped parameter along it
pub fn segment_distance(p: &Point2<f64>, a: &Point2<f64>, b: &Point2<f64>) -> (f64, f64) {
    let ab = b - a;
    let len_sq = ab.norm_squared();
    if len_sq == 0.0 {
        return ((p - a).norm(), 0.0);
    }
    let t = ((p - a).dot(&ab) / len_sq).clamp(0.0, 1.0);
    ((p - (a + ab * t)).norm(), t)
}

/// Distance from `p` to the infinite line through `a` and `b`
pub fn line_distance(p: &Point2<f64>, a: &Point2<f64>, b: &Point2<f64>) -> f64 {
    let ab = b - a;
    let len = ab.norm();
    if len == 0.0 {
        return (p - a).norm();
    }
    ((p.x - a.x) * ab.y - (p.y - a.y) * ab.x).abs() / len
}

/// True if `p` lies within `tolerance` of any edge of the contour
pub fn point_on_contour(p: &Point2<f64>, contour: &[Point2<f64>], tolerance: f64) -> bool {
    let n = contour.len();
    (0..n).any(|i| segment_distance(p, &contour[i], &contour[(i + 1) % n]).0 <= tolerance)
}

/// Point inside the shape or on its boundary within `tolerance`
pub fn point_in_shape(p: &Point2<f64>, shape: &Shape2D, tolerance: f64) -> bool {
    if point_on_contour(p, &shape.outer, tolerance)
        || shape.holes.iter().any(|h| point_on_contour(p, h, tolerance))
    {
        return true;
    }
    shape.contains_point(p)
}

/// Compute bounding box of a contour
pub fn contour_bounds(contour: &[Point2<f64>]) -> Option<(Point2<f64>, Point2<f64>)> {
    if contour.is_empty() {
        return None;
    }

    let mut min = contour[0];
    let mut max = contour[0];

    for p in contour.iter().skip(1) {
        min.x = min.x.min(p.x);
        min.y = min.y.min(p.y);
        max.x = max.x.max(p.x);
        max.y = max.y.max(p.y);
    }

    Some((min, max))
}

/// Rotate a contour so it starts at its lowest-left vertex
pub fn canonical_start(contour: &[Point2<f64>]) -> Contour {
    let Some(start) = contour
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.y.total_cmp(&b.y).then(a.x.total_cmp(&b.x)))
        .map(|(i, _)| i)
    else {
        return Vec::new();
    };

    let mut rotated = contour.to_vec();
    rotated.rotate_left(start);
    rotated
}
