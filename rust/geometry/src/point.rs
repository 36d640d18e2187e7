// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Point and vertex-loop primitives
//!
//! Points are plain `nalgebra::Point3<f64>` values. Everything here compares
//! them with an explicit tolerance; exact float equality is never used.

use nalgebra::{Point3, Vector3};

/// Default tolerance in model units (metres) for joining and matching
pub const DEFAULT_TOLERANCE: f64 = 0.01;

/// Euclidean distance between two points
#[inline]
pub fn distance(a: &Point3<f64>, b: &Point3<f64>) -> f64 {
    (b - a).norm()
}

/// Tolerance-based point equality
#[inline]
pub fn points_equal(a: &Point3<f64>, b: &Point3<f64>, tolerance: f64) -> bool {
    distance(a, b) <= tolerance
}

/// Normalize a vector, returning `None` for an undefined (zero-length) direction
#[inline]
pub fn try_normalize(v: &Vector3<f64>) -> Option<Vector3<f64>> {
    v.try_normalize(1e-12)
}

/// Distance from `p` to the segment `a`-`b`
pub fn point_segment_distance(p: &Point3<f64>, a: &Point3<f64>, b: &Point3<f64>) -> f64 {
    let ab = b - a;
    let len_sq = ab.norm_squared();
    if len_sq == 0.0 {
        return distance(p, a);
    }
    let t = ((p - a).dot(&ab) / len_sq).clamp(0.0, 1.0);
    distance(p, &(a + ab * t))
}

/// Distance from `p` to the infinite line through `a` and `b`
pub fn point_line_distance(p: &Point3<f64>, a: &Point3<f64>, b: &Point3<f64>) -> f64 {
    let ab = b - a;
    let len = ab.norm();
    if len == 0.0 {
        return distance(p, a);
    }
    (p - a).cross(&ab).norm() / len
}

/// Remove consecutive near-duplicate vertices, including the closing vertex
/// when a caller repeated the first point at the end.
pub fn dedupe_loop(points: &[Point3<f64>], tolerance: f64) -> Vec<Point3<f64>> {
    let mut result: Vec<Point3<f64>> = Vec::with_capacity(points.len());
    for p in points {
        if result.last().map_or(true, |last| !points_equal(last, p, tolerance)) {
            result.push(*p);
        }
    }
    while result.len() > 1 && points_equal(&result[0], &result[result.len() - 1], tolerance) {
        result.pop();
    }
    result
}

/// Reverse the winding of a loop
pub fn reverse_loop(points: &[Point3<f64>]) -> Vec<Point3<f64>> {
    points.iter().rev().cloned().collect()
}

/// True if `b` is `a` with a possibly different starting vertex
pub fn circular_equal(a: &[Point3<f64>], b: &[Point3<f64>], tolerance: f64) -> bool {
    if a.len() != b.len() {
        return false;
    }
    if a.is_empty() {
        return true;
    }

    let n = a.len();
    (0..n)
        .filter(|&offset| points_equal(&a[0], &b[offset], tolerance))
        .any(|offset| (0..n).all(|i| points_equal(&a[i], &b[(i + offset) % n], tolerance)))
}

/// Number of distinct vertices once near-duplicates are collapsed
pub fn effective_vertex_count(points: &[Point3<f64>], tolerance: f64) -> usize {
    dedupe_loop(points, tolerance).len()
}

/// Replace every point that lies within `tolerance` of a reference point by
/// that reference point. Used to restore exact input coordinates after a
/// round trip through the boolean engine.
pub fn snap_to_reference(
    points: &[Point3<f64>],
    references: &[Point3<f64>],
    tolerance: f64,
) -> Vec<Point3<f64>> {
    points
        .iter()
        .map(|p| {
            references
                .iter()
                .map(|r| (distance(p, r), r))
                .filter(|(d, _)| *d <= tolerance)
                .min_by(|x, y| x.0.total_cmp(&y.0))
                .map(|(_, r)| *r)
                .unwrap_or(*p)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square() -> Vec<Point3<f64>> {
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ]
    }

    #[test]
    fn test_points_equal_uses_tolerance() {
        let a = Point3::new(1.0, 2.0, 3.0);
        let b = Point3::new(1.0005, 2.0, 3.0);
        assert!(points_equal(&a, &b, 0.001));
        assert!(!points_equal(&a, &b, 0.0001));
    }

    #[test]
    fn test_zero_vector_has_no_direction() {
        assert!(try_normalize(&Vector3::zeros()).is_none());
        let n = try_normalize(&Vector3::new(0.0, 3.0, 4.0)).unwrap();
        assert_relative_eq!(n.norm(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_dedupe_loop_removes_closing_point() {
        let mut pts = square();
        pts.insert(1, Point3::new(0.0001, 0.0, 0.0));
        pts.push(Point3::new(0.0, 0.0, 0.0));
        let deduped = dedupe_loop(&pts, 0.001);
        assert_eq!(deduped.len(), 4);
    }

    #[test]
    fn test_circular_equal_any_start() {
        let a = square();
        let mut b = a.clone();
        b.rotate_left(2);
        assert!(circular_equal(&a, &b, 1e-9));
        assert!(!circular_equal(&a, &reverse_loop(&a), 1e-9));
        assert!(circular_equal(&a, &reverse_loop(&reverse_loop(&a)), 1e-9));
    }

    #[test]
    fn test_segment_and_line_distance() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(10.0, 0.0, 0.0);
        let p = Point3::new(12.0, 3.0, 0.0);
        assert_relative_eq!(point_line_distance(&p, &a, &b), 3.0, epsilon = 1e-12);
        assert_relative_eq!(point_segment_distance(&p, &a, &b), 13.0_f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_snap_to_reference() {
        let refs = square();
        let noisy = vec![Point3::new(1.000_000_01, 0.999_999_99, 0.0), Point3::new(5.0, 5.0, 0.0)];
        let snapped = snap_to_reference(&noisy, &refs, 1e-6);
        assert_eq!(snapped[0], Point3::new(1.0, 1.0, 0.0));
        assert_eq!(snapped[1], Point3::new(5.0, 5.0, 0.0));
    }
}
