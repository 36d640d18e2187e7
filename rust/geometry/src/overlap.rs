// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Collinear segment overlap, used to measure how much of a floor's edge
//! lies on the building footprint boundary

use nalgebra::Point3;

use crate::point::{distance, point_line_distance};
use crate::polygon::Polygon3d;

/// Part of `line` shared with `edge` when both are collinear within
/// `tolerance`. The returned segment lies on `line` and runs in its
/// direction; overlaps no longer than `tolerance` are ignored.
pub fn segment_overlap(
    line: &[Point3<f64>; 2],
    edge: &[Point3<f64>; 2],
    tolerance: f64,
) -> Option<[Point3<f64>; 2]> {
    let d = line[1] - line[0];
    let len = d.norm();
    if len <= tolerance {
        return None;
    }

    if point_line_distance(&edge[0], &line[0], &line[1]) > tolerance
        || point_line_distance(&edge[1], &line[0], &line[1]) > tolerance
    {
        return None;
    }

    let dir = d / len;
    let t0 = (edge[0] - line[0]).dot(&dir);
    let t1 = (edge[1] - line[0]).dot(&dir);
    let lo = t0.min(t1).max(0.0);
    let hi = t0.max(t1).min(len);
    if hi - lo <= tolerance {
        return None;
    }

    Some([line[0] + dir * lo, line[0] + dir * hi])
}

/// Total length of the edges of `points` that run along `footprint`'s outer loop
pub fn exposed_length(points: &[Point3<f64>], footprint: &Polygon3d, tolerance: f64) -> f64 {
    let n = points.len();
    if n < 2 {
        return 0.0;
    }

    (0..n)
        .flat_map(|i| footprint.overlap(&[points[i], points[(i + 1) % n]], tolerance))
        .map(|[a, b]| distance(&a, &b))
        .sum()
}
