// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Spike and collinear vertex removal
//!
//! Overlay output frequently carries zero-width spikes (an edge that runs
//! out and straight back), near-duplicate vertices and vertices sitting on
//! a straight edge. All three are removed here, iterating until the loop
//! is stable, since removing one vertex can expose the next.

use nalgebra::Point2;
use tracing::{debug, warn};

use crate::boolean::union_2d;
use crate::contour::{contour_perimeter, effective_width, line_distance, Contour, Shape2D};
use crate::polygon::Polygon3d;
use crate::transform::Transformation;

/// Remove near-duplicate, collinear and spike vertices from a closed contour.
///
/// A vertex only goes when it, and every vertex already merged into its two
/// edges, stays within the tolerance of the new edge, so a dense run of
/// vertices cannot drift away from the original boundary. The winding is
/// preserved. May return fewer than 3 points when the contour collapses
/// entirely.
pub fn simplify_contour(contour: &[Point2<f64>], tolerance: f64) -> Contour {
    let mut points = dedupe_contour(contour, tolerance);
    // Vertices removed from the edge starting at the same index
    let mut absorbed: Vec<Vec<Point2<f64>>> = vec![Vec::new(); points.len()];

    let mut changed = true;
    while changed && points.len() >= 3 {
        changed = false;
        let mut i = 0;
        while points.len() >= 3 && i < points.len() {
            let n = points.len();
            let p = (i + n - 1) % n;
            let prev = points[p];
            let curr = points[i];
            let next = points[(i + 1) % n];

            if (next - prev).norm() <= tolerance {
                // Zero-width spike: the tip and everything along it goes
                points.remove(i);
                absorbed.remove(i);
                let p = if p > i { p - 1 } else { p };
                absorbed[p].clear();
                changed = true;
                continue;
            }

            let on_edge = |q: &Point2<f64>| line_distance(q, &prev, &next) <= tolerance;
            if on_edge(&curr) && absorbed[p].iter().chain(&absorbed[i]).all(on_edge) {
                points.remove(i);
                let mut tail = absorbed.remove(i);
                let p = if p > i { p - 1 } else { p };
                absorbed[p].push(curr);
                absorbed[p].append(&mut tail);
                changed = true;
            } else {
                i += 1;
            }
        }
    }
    points
}

fn dedupe_contour(points: &[Point2<f64>], tolerance: f64) -> Contour {
    let mut result: Contour = Vec::with_capacity(points.len());
    for p in points {
        if result.last().map_or(true, |q| (p - q).norm() > tolerance) {
            result.push(*p);
        }
    }
    while result.len() > 1 && (result[0] - result[result.len() - 1]).norm() <= tolerance {
        result.pop();
    }
    result
}

/// Remove spikes from a working-plane shape and re-resolve it.
///
/// Returns `None` when the outer contour collapses, when the cleaned shape
/// falls apart into several pieces, or when the cleanup changed the area by
/// more than the tolerance allows.
pub fn remove_spikes_2d(shape: &Shape2D, tolerance: f64) -> Option<Shape2D> {
    let outer = simplify_contour(&shape.outer, tolerance);
    if outer.len() < 3 || effective_width(&outer) < tolerance {
        debug!("outer contour collapsed during spike removal");
        return None;
    }

    let holes: Vec<Contour> = shape
        .holes
        .iter()
        .map(|h| simplify_contour(h, tolerance))
        .filter(|h| h.len() >= 3 && effective_width(h) >= tolerance)
        .collect();

    let candidate = Shape2D::with_holes(outer, holes).normalized();
    let mut resolved = union_2d(std::slice::from_ref(&candidate), tolerance);
    if resolved.len() != 1 {
        warn!(pieces = resolved.len(), "spike removal split the shape, rejecting");
        return None;
    }
    let result = resolved.remove(0);

    let boundary = contour_perimeter(&shape.outer)
        + shape.holes.iter().map(|h| contour_perimeter(h)).sum::<f64>();
    let change = (result.net_area() - shape.net_area()).abs();
    if change > tolerance * boundary {
        warn!(change, "spike removal changed the area, rejecting");
        return None;
    }

    Some(result)
}

/// Remove spikes from a planar 3D polygon.
///
/// The result keeps the input's orientation and its exact vertex
/// coordinates; `None` when the polygon is degenerate or could not be
/// cleaned without changing its area.
pub fn remove_spikes(polygon: &Polygon3d, tolerance: f64) -> Option<Polygon3d> {
    let frame = Transformation::to_xy_plane(polygon.outer())?;
    let shape = polygon.to_shape(&frame, tolerance)?;
    let cleaned = remove_spikes_2d(&shape, tolerance)?;

    let references: Vec<_> = polygon.vertices().cloned().collect();
    Some(crate::boolean::lift_shape(&cleaned, &frame.inverse(), &references, tolerance))
}
