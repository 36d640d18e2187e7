// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Planar polygons with holes in 3D

use std::ops::Mul;

use nalgebra::{Point2, Point3, Vector3};

use crate::bbox::BoundingBox;
use crate::contour::{
    compute_signed_area, effective_width, ensure_ccw, ensure_cw, point_in_shape, to_2d, to_3d,
    Contour, Shape2D,
};
use crate::error::{Error, Result};
use crate::overlap::segment_overlap;
use crate::plane::{newell_vector, outward_normal, Plane};
use crate::point::{dedupe_loop, distance, snap_to_reference};
use crate::spikes::simplify_contour;
use crate::transform::Transformation;

/// Winding of a loop as seen from above (looking down the -Z axis)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Winding {
    Clockwise,
    CounterClockwise,
}

/// An outer vertex loop plus zero or more hole loops, all coplanar.
///
/// Loops never repeat their first vertex at the end; edge `i` joins vertex
/// `i` to vertex `(i + 1) % n`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Polygon3d {
    outer: Vec<Point3<f64>>,
    holes: Vec<Vec<Point3<f64>>>,
}

impl Polygon3d {
    pub fn new(outer: Vec<Point3<f64>>) -> Self {
        Self {
            outer,
            holes: Vec::new(),
        }
    }

    pub fn with_holes(outer: Vec<Point3<f64>>, holes: Vec<Vec<Point3<f64>>>) -> Self {
        Self { outer, holes }
    }

    /// Adds a point to the outer loop
    pub fn add_point(&mut self, point: Point3<f64>) {
        self.outer.push(point);
    }

    pub fn set_outer(&mut self, outer: Vec<Point3<f64>>) {
        self.outer = outer;
    }

    pub fn add_hole(&mut self, hole: Vec<Point3<f64>>) {
        self.holes.push(hole);
    }

    pub fn outer(&self) -> &[Point3<f64>] {
        &self.outer
    }

    pub fn holes(&self) -> &[Vec<Point3<f64>>] {
        &self.holes
    }

    pub fn into_parts(self) -> (Vec<Point3<f64>>, Vec<Vec<Point3<f64>>>) {
        (self.outer, self.holes)
    }

    /// Every vertex, outer loop first
    pub fn vertices(&self) -> impl Iterator<Item = &Point3<f64>> + '_ {
        self.outer.iter().chain(self.holes.iter().flatten())
    }

    pub fn newell_vector(&self) -> Option<Vector3<f64>> {
        newell_vector(&self.outer)
    }

    pub fn outward_normal(&self) -> Option<Vector3<f64>> {
        outward_normal(&self.outer)
    }

    pub fn plane(&self) -> Option<Plane> {
        Plane::from_points(&self.outer)
    }

    /// Area enclosed by the outer loop (0 for degenerate loops)
    pub fn gross_area(&self) -> f64 {
        self.newell_vector().map_or(0.0, |v| v.norm() / 2.0)
    }

    /// Gross area minus hole areas
    pub fn net_area(&self) -> f64 {
        let holes: f64 = self
            .holes
            .iter()
            .filter_map(|h| newell_vector(h))
            .map(|v| v.norm() / 2.0)
            .sum();
        self.gross_area() - holes
    }

    /// Length of the outer loop, closing edge included
    pub fn perimeter(&self) -> f64 {
        loop_length(&self.outer)
    }

    /// Outer loop plus every hole boundary
    pub fn total_boundary_length(&self) -> f64 {
        self.perimeter() + self.holes.iter().map(|h| loop_length(h)).sum::<f64>()
    }

    /// Winding seen from above; `None` for vertical or degenerate polygons
    pub fn winding(&self) -> Option<Winding> {
        let n = self.outward_normal()?;
        if n.z.abs() < 1e-9 {
            None
        } else if n.z > 0.0 {
            Some(Winding::CounterClockwise)
        } else {
            Some(Winding::Clockwise)
        }
    }

    /// Area centroid (holes subtracted)
    pub fn centroid(&self) -> Option<Point3<f64>> {
        let frame = Transformation::to_xy_plane(&self.outer)?;
        let project = |l: &[Point3<f64>]| -> Contour { l.iter().map(|p| to_2d(&frame.apply(p))).collect() };

        let (outer_area, outer_c) = contour_centroid(&project(&self.outer))?;
        let mut area = outer_area;
        let mut moment = outer_c.coords * outer_area;
        for hole in &self.holes {
            if let Some((a, c)) = contour_centroid(&project(hole)) {
                area -= a;
                moment -= c.coords * a;
            }
        }
        if area <= 0.0 {
            return None;
        }

        let c = Point2::from(moment / area);
        Some(frame.inverse().apply(&to_3d(&c)))
    }

    pub fn bounding_box(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(self.vertices())
    }

    /// Same region with every loop's winding reversed (mirror face)
    pub fn reversed(&self) -> Self {
        Self {
            outer: self.outer.iter().rev().cloned().collect(),
            holes: self
                .holes
                .iter()
                .map(|h| h.iter().rev().cloned().collect())
                .collect(),
        }
    }

    pub fn transformed(&self, t: &Transformation) -> Self {
        Self {
            outer: t.apply_loop(&self.outer),
            holes: self.holes.iter().map(|h| t.apply_loop(h)).collect(),
        }
    }

    /// True if every vertex lies within `tolerance` of the outer loop's plane
    pub fn is_planar(&self, tolerance: f64) -> bool {
        self.plane()
            .map_or(false, |plane| self.vertices().all(|p| plane.contains(p, tolerance)))
    }

    /// Check the structural invariants: at least 3 distinct outer vertices,
    /// non-zero area and coplanar loops.
    pub fn validate(&self, tolerance: f64) -> Result<()> {
        let distinct = dedupe_loop(&self.outer, tolerance).len();
        if distinct < 3 {
            return Err(Error::DegenerateLoop(distinct));
        }
        let plane = self.plane().ok_or(Error::DegenerateLoop(distinct))?;
        for (index, p) in self.vertices().enumerate() {
            let d = plane.signed_distance(p).abs();
            if d > tolerance {
                return Err(Error::NonCoplanar { index, distance: d });
            }
        }
        Ok(())
    }

    /// Remove near-duplicate vertices, collinear vertices and zero-width
    /// spikes; drop degenerate holes.
    ///
    /// Returns `None` when the outer loop itself is degenerate. Surviving
    /// vertices keep their exact input coordinates and the winding is kept.
    pub fn cleaned(&self, tolerance: f64) -> Option<Self> {
        let frame = Transformation::to_xy_plane(&self.outer)?;
        let inverse = frame.inverse();
        let references: Vec<Point3<f64>> = self.vertices().cloned().collect();

        let clean = |l: &[Point3<f64>]| -> Option<Vec<Point3<f64>>> {
            let flat: Contour = l.iter().map(|p| to_2d(&frame.apply(p))).collect();
            let simplified = simplify_contour(&flat, tolerance);
            if simplified.len() < 3 || effective_width(&simplified) < tolerance {
                return None;
            }
            let lifted: Vec<Point3<f64>> = simplified.iter().map(|p| inverse.apply(&to_3d(p))).collect();
            Some(snap_to_reference(&lifted, &references, tolerance))
        };

        let outer = clean(&self.outer)?;
        let holes = self.holes.iter().filter_map(|h| clean(h)).collect();
        Some(Self { outer, holes })
    }

    /// Project onto the working plane of `frame`.
    ///
    /// Returns a normalized shape (outer counter-clockwise, holes clockwise)
    /// or `None` when any vertex is further than `tolerance` from Z=0.
    pub fn to_shape(&self, frame: &Transformation, tolerance: f64) -> Option<Shape2D> {
        let project = |l: &[Point3<f64>]| -> Option<Contour> {
            l.iter()
                .map(|p| {
                    let q = frame.apply(p);
                    (q.z.abs() <= tolerance).then(|| to_2d(&q))
                })
                .collect()
        };

        let outer = project(&self.outer)?;
        let holes = self
            .holes
            .iter()
            .map(|h| project(h))
            .collect::<Option<Vec<_>>>()?;

        Some(Shape2D {
            outer: ensure_ccw(&outer),
            holes: holes.iter().map(|h| ensure_cw(h)).collect(),
        })
    }

    /// True if every point of `points` lies inside this polygon or on its
    /// boundary (within `tolerance`), on the same plane.
    pub fn contains_loop(&self, points: &[Point3<f64>], tolerance: f64) -> bool {
        let Some(frame) = Transformation::to_xy_plane(&self.outer) else {
            return false;
        };
        let Some(shape) = self.to_shape(&frame, tolerance) else {
            return false;
        };
        points.iter().all(|p| {
            let q = frame.apply(p);
            q.z.abs() <= tolerance && point_in_shape(&to_2d(&q), &shape, tolerance)
        })
    }

    /// Portions of `line` that run along edges of the outer loop, one
    /// segment per touched edge
    pub fn overlap(&self, line: &[Point3<f64>; 2], tolerance: f64) -> Vec<[Point3<f64>; 2]> {
        let n = self.outer.len();
        (0..n)
            .filter_map(|i| {
                let edge = [self.outer[i], self.outer[(i + 1) % n]];
                segment_overlap(line, &edge, tolerance)
            })
            .collect()
    }
}

impl Mul<&Polygon3d> for Transformation {
    type Output = Polygon3d;

    fn mul(self, rhs: &Polygon3d) -> Polygon3d {
        rhs.transformed(&self)
    }
}

fn loop_length(points: &[Point3<f64>]) -> f64 {
    let n = points.len();
    if n < 2 {
        return 0.0;
    }
    (0..n).map(|i| distance(&points[i], &points[(i + 1) % n])).sum()
}

/// Unsigned area and centroid of a simple 2D contour
fn contour_centroid(contour: &[Point2<f64>]) -> Option<(f64, Point2<f64>)> {
    let signed = compute_signed_area(contour);
    if signed.abs() < 1e-15 {
        return None;
    }

    let n = contour.len();
    let (mut cx, mut cy) = (0.0, 0.0);
    for i in 0..n {
        let p = contour[i];
        let q = contour[(i + 1) % n];
        let cross = p.x * q.y - q.x * p.y;
        cx += (p.x + q.x) * cross;
        cy += (p.y + q.y) * cross;
    }

    Some((signed.abs(), Point2::new(cx / (6.0 * signed), cy / (6.0 * signed))))
}
