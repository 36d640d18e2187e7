// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Tolerance-aware boolean operations on coplanar polygons
//!
//! Polygons are projected into a shared working plane, snapped against each
//! other (see [`crate::snap`]) and handed to i_overlay with the non-zero
//! fill rule. Results are cleaned of slivers and spikes, lifted back to 3D
//! and snapped onto the input vertices so unchanged corners come out with
//! their exact input coordinates.

use i_overlay::core::fill_rule::FillRule;
use i_overlay::core::overlay_rule::OverlayRule;
use i_overlay::float::single::SingleFloatOverlay;
use std::cmp::Ordering;

use nalgebra::{Point2, Point3, Vector3};
use tracing::{debug, warn};

use crate::contour::{
    canonical_start, compute_signed_area, effective_width, ensure_ccw, ensure_cw, to_3d, Contour,
    Shape2D,
};
use crate::error::{check_tolerance, Result};
use crate::plane::{Plane, NORMAL_TOLERANCE};
use crate::polygon::Polygon3d;
use crate::snap::snap_contours;
use crate::spikes::{remove_spikes_2d, simplify_contour};
use crate::transform::Transformation;

/// Minimum area threshold - contours smaller than this are considered degenerate
const MIN_AREA_THRESHOLD: f64 = 1e-12;

type Path = Vec<[f64; 2]>;

// ============================================================================
// Working-plane operations
// ============================================================================

/// Pieces of two overlapping shapes: the common part and both leftovers
#[derive(Debug, Clone, Default)]
pub struct Split2D {
    pub overlap: Vec<Shape2D>,
    pub only_a: Vec<Shape2D>,
    pub only_b: Vec<Shape2D>,
}

/// Union of any number of shapes. Shapes closer than `tolerance` merge.
pub fn union_2d(shapes: &[Shape2D], tolerance: f64) -> Vec<Shape2D> {
    let (subject, _) = prepare(shapes, &[], tolerance);
    shapes_from_overlay(run_overlay(subject, Vec::new(), OverlayRule::Subject), tolerance)
}

pub fn intersect_2d(a: &Shape2D, b: &Shape2D, tolerance: f64) -> Vec<Shape2D> {
    let (subject, clip) = prepare(std::slice::from_ref(a), std::slice::from_ref(b), tolerance);
    shapes_from_overlay(run_overlay(subject, clip, OverlayRule::Intersect), tolerance)
}

/// `a` minus every shape in `others`
pub fn subtract_2d(a: &Shape2D, others: &[Shape2D], tolerance: f64) -> Vec<Shape2D> {
    let (subject, clip) = prepare(std::slice::from_ref(a), others, tolerance);
    shapes_from_overlay(run_overlay(subject, clip, OverlayRule::Difference), tolerance)
}

/// Overlap and both differences of `a` and `b`, computed from a single
/// snapping pass so the three results share their boundaries exactly.
pub fn split_2d(a: &Shape2D, b: &Shape2D, tolerance: f64) -> Split2D {
    let (subject, clip) = prepare(std::slice::from_ref(a), std::slice::from_ref(b), tolerance);

    let overlap = run_overlay(subject.clone(), clip.clone(), OverlayRule::Intersect);
    let only_a = run_overlay(subject.clone(), clip.clone(), OverlayRule::Difference);
    let only_b = run_overlay(clip, subject, OverlayRule::Difference);

    Split2D {
        overlap: shapes_from_overlay(overlap, tolerance),
        only_a: shapes_from_overlay(only_a, tolerance),
        only_b: shapes_from_overlay(only_b, tolerance),
    }
}

/// Snap subject and clip contours together and convert them to overlay paths
fn prepare(subject: &[Shape2D], clip: &[Shape2D], tolerance: f64) -> (Vec<Path>, Vec<Path>) {
    let mut contours: Vec<Contour> = Vec::new();
    // (belongs to clip, is a hole)
    let mut roles: Vec<(bool, bool)> = Vec::new();

    for (is_clip, shapes) in [(false, subject), (true, clip)] {
        for shape in shapes {
            contours.push(shape.outer.clone());
            roles.push((is_clip, false));
            for hole in &shape.holes {
                contours.push(hole.clone());
                roles.push((is_clip, true));
            }
        }
    }

    snap_contours(&mut contours, tolerance);

    let mut subject_paths = Vec::new();
    let mut clip_paths = Vec::new();
    for (contour, (is_clip, is_hole)) in contours.iter().zip(roles) {
        if contour.len() < 3 || compute_signed_area(contour).abs() < MIN_AREA_THRESHOLD {
            continue;
        }
        let oriented = if is_hole {
            ensure_cw(contour)
        } else {
            ensure_ccw(contour)
        };
        let path = contour_to_path(&oriented);
        if is_clip {
            clip_paths.push(path);
        } else {
            subject_paths.push(path);
        }
    }

    (subject_paths, clip_paths)
}

fn run_overlay(subject: Vec<Path>, clip: Vec<Path>, rule: OverlayRule) -> Vec<Vec<Path>> {
    if subject.is_empty() && clip.is_empty() {
        return Vec::new();
    }
    subject.overlay(&clip, rule, FillRule::NonZero)
}

/// Convert i_overlay result shapes back to cleaned working-plane shapes
///
/// i_overlay returns Vec<Vec<Vec<[f64; 2]>>> where:
/// - Outer Vec: list of shapes
/// - Middle Vec: list of contours per shape (first is outer, rest are holes)
/// - Inner Vec: list of points per contour
fn shapes_from_overlay(result: Vec<Vec<Path>>, tolerance: f64) -> Vec<Shape2D> {
    let mut shapes = Vec::with_capacity(result.len());

    for shape in result {
        let mut contours = shape.iter().map(|path| path_to_contour(path));
        let Some(outer) = contours.next() else {
            continue;
        };

        let outer = simplify_contour(&outer, tolerance);
        if outer.len() < 3 || effective_width(&outer) < tolerance {
            debug!(
                area = compute_signed_area(&outer).abs(),
                "dropping sliver from overlay result"
            );
            continue;
        }

        let holes: Vec<Contour> = contours
            .map(|h| simplify_contour(&h, tolerance))
            .filter(|h| h.len() >= 3 && effective_width(h) >= tolerance)
            .map(|h| canonical_start(&ensure_cw(&h)))
            .collect();

        shapes.push(Shape2D::with_holes(canonical_start(&ensure_ccw(&outer)), holes));
    }

    // Overlay output order is not part of the contract; make it deterministic
    shapes.sort_by(|a, b| {
        let (pa, pb) = (a.outer[0], b.outer[0]);
        pa.y.total_cmp(&pb.y).then(pa.x.total_cmp(&pb.x))
    });
    shapes
}

/// Convert a Point2 contour to i_overlay path format
fn contour_to_path(contour: &[Point2<f64>]) -> Path {
    contour.iter().map(|p| [p.x, p.y]).collect()
}

fn path_to_contour(path: &[[f64; 2]]) -> Contour {
    path.iter().map(|p| Point2::new(p[0], p[1])).collect()
}

// ============================================================================
// 3D operations
// ============================================================================

/// Result of intersecting two coplanar, oppositely facing polygons
#[derive(Debug, Clone, Default)]
pub struct Intersection {
    /// Common region, wound like the first polygon
    pub overlap_a: Vec<Polygon3d>,
    /// The same region wound like the second polygon
    pub overlap_b: Vec<Polygon3d>,
    /// First polygon minus the overlap
    pub remainder_a: Vec<Polygon3d>,
    /// Second polygon minus the overlap
    pub remainder_b: Vec<Polygon3d>,
}

impl Intersection {
    pub fn overlap_area(&self) -> f64 {
        self.overlap_a.iter().map(|p| p.net_area()).sum()
    }

    /// True when neither polygon needs to be split
    pub fn is_trivial(&self) -> bool {
        self.overlap_a.len() == 1 && self.remainder_a.is_empty() && self.remainder_b.is_empty()
    }
}

/// Lift a working-plane shape back to 3D, snapping onto `references`
pub(crate) fn lift_shape(
    shape: &Shape2D,
    to_world: &Transformation,
    references: &[Point3<f64>],
    tolerance: f64,
) -> Polygon3d {
    let lift = |contour: &Contour| -> Vec<Point3<f64>> {
        let points: Vec<Point3<f64>> = canonical_start(contour)
            .iter()
            .map(|p| to_world.apply(&to_3d(p)))
            .collect();
        crate::point::snap_to_reference(&points, references, tolerance)
    };

    Polygon3d::with_holes(lift(&shape.outer), shape.holes.iter().map(lift).collect())
}

/// Intersect two polygons that lie on the same plane and face each other.
///
/// Returns `Ok(None)` when the polygons are not coplanar with opposite
/// normals, do not overlap, or when the split would not conserve area.
pub fn intersect(a: &Polygon3d, b: &Polygon3d, tolerance: f64) -> Result<Option<Intersection>> {
    check_tolerance(tolerance)?;

    let (Some(normal_a), Some(normal_b)) = (a.outward_normal(), b.outward_normal()) else {
        warn!("cannot intersect degenerate polygon");
        return Ok(None);
    };
    if normal_a.dot(&normal_b) > -1.0 + NORMAL_TOLERANCE {
        return Ok(None);
    }
    let (Some(plane_a), Some(plane_b)) = (a.plane(), b.plane()) else {
        return Ok(None);
    };
    if !plane_a.reverse_equal(&plane_b, tolerance) {
        return Ok(None);
    }
    let (Some(box_a), Some(box_b)) = (a.bounding_box(), b.bounding_box()) else {
        return Ok(None);
    };
    if !box_a.intersects(&box_b, tolerance) {
        return Ok(None);
    }

    let Some(frame) = Transformation::to_xy_plane(a.outer()) else {
        return Ok(None);
    };
    let (Some(shape_a), Some(shape_b)) = (a.to_shape(&frame, tolerance), b.to_shape(&frame, tolerance))
    else {
        warn!("polygons are not coplanar within tolerance");
        return Ok(None);
    };

    let split = split_2d(&shape_a, &shape_b, tolerance);
    if split.overlap.is_empty() {
        return Ok(None);
    }

    let to_world = frame.inverse();
    let references: Vec<Point3<f64>> = a.vertices().chain(b.vertices()).cloned().collect();
    let lift = |s: &Shape2D| lift_shape(s, &to_world, &references, tolerance);

    let result = Intersection {
        overlap_a: split.overlap.iter().map(lift).collect(),
        overlap_b: split.overlap.iter().map(|s| lift(s).reversed()).collect(),
        remainder_a: split.only_a.iter().map(lift).collect(),
        remainder_b: split.only_b.iter().map(|s| lift(s).reversed()).collect(),
    };

    let before = a.net_area() + b.net_area();
    let after = 2.0 * result.overlap_area()
        + result.remainder_a.iter().map(|p| p.net_area()).sum::<f64>()
        + result.remainder_b.iter().map(|p| p.net_area()).sum::<f64>();
    let slack = tolerance * (a.total_boundary_length() + b.total_boundary_length());
    if (before - after).abs() > slack {
        warn!(before, after, "intersection does not conserve area, skipping");
        return Ok(None);
    }

    Ok(Some(result))
}

/// Union of coplanar polygons.
///
/// The union plane is the plane of the largest polygon. Results face the
/// way most of the input area faces; on a tie they face up (or north, or
/// east for planes containing those axes). Polygons that are degenerate or
/// off the union plane are skipped with a warning. The result is
/// independent of input order.
pub fn join_all(polygons: &[Polygon3d], tolerance: f64) -> Result<Vec<Polygon3d>> {
    check_tolerance(tolerance)?;

    let mut valid: Vec<(usize, &Polygon3d, Vector3<f64>, Plane)> = Vec::with_capacity(polygons.len());
    for (index, polygon) in polygons.iter().enumerate() {
        match (polygon.newell_vector(), polygon.plane()) {
            (Some(newell), Some(plane)) => valid.push((index, polygon, newell, plane)),
            _ => warn!(index, "skipping degenerate polygon in union"),
        }
    }

    let Some(reference) = valid
        .iter()
        .max_by(|a, b| {
            a.2.norm()
                .total_cmp(&b.2.norm())
                .then_with(|| lexicographic_cmp(&lowest_vertex(b.1), &lowest_vertex(a.1)))
        })
        .map(|v| v.3)
    else {
        return Ok(Vec::new());
    };

    let members: Vec<&(usize, &Polygon3d, Vector3<f64>, Plane)> = valid
        .iter()
        .filter(|(index, _, _, plane)| {
            let on_plane = plane.equal(&reference, tolerance) || plane.reverse_equal(&reference, tolerance);
            if !on_plane {
                warn!(index, "skipping polygon off the union plane");
            }
            on_plane
        })
        .collect();

    let axis = if upper_hemisphere(&reference.normal) {
        reference.normal
    } else {
        -reference.normal
    };
    let mut facing: Vec<f64> = members.iter().map(|m| m.2.dot(&axis)).collect();
    facing.sort_by(f64::total_cmp);
    let balance: f64 = facing.iter().sum();
    let scale: f64 = members.iter().map(|m| m.2.norm()).sum();
    let normal = if balance < -1e-9 * scale { -axis } else { axis };

    let on_plane = Point3::from(-reference.normal * reference.offset);
    let Some(frame) = Transformation::plane_frame(&normal, &on_plane) else {
        return Ok(Vec::new());
    };

    let mut shapes = Vec::with_capacity(members.len());
    for (index, polygon, _, _) in members {
        match polygon.to_shape(&frame, tolerance) {
            Some(shape) => shapes.push(shape),
            None => warn!(index, "skipping polygon off the union plane"),
        }
    }

    let to_world = frame.inverse();
    let references: Vec<Point3<f64>> = polygons.iter().flat_map(|p| p.vertices()).cloned().collect();

    Ok(union_2d(&shapes, tolerance)
        .into_iter()
        .map(|shape| {
            let cleaned = remove_spikes_2d(&shape, tolerance).unwrap_or(shape);
            lift_shape(&cleaned, &to_world, &references, tolerance)
        })
        .collect())
}

/// Canonical side of a unit normal: +Z, then +Y, then +X decide
fn upper_hemisphere(normal: &Vector3<f64>) -> bool {
    const EPS: f64 = 1e-9;
    if normal.z.abs() > EPS {
        normal.z > 0.0
    } else if normal.y.abs() > EPS {
        normal.y > 0.0
    } else {
        normal.x > 0.0
    }
}

/// Lexicographically smallest outer vertex, for tie breaks
fn lowest_vertex(polygon: &Polygon3d) -> [f64; 3] {
    polygon
        .outer()
        .iter()
        .map(|p| [p.x, p.y, p.z])
        .min_by(lexicographic_cmp)
        .unwrap_or([0.0; 3])
}

fn lexicographic_cmp(a: &[f64; 3], b: &[f64; 3]) -> Ordering {
    a[0].total_cmp(&b[0])
        .then(a[1].total_cmp(&b[1]))
        .then(a[2].total_cmp(&b[2]))
}

/// Union of two coplanar polygons, `None` unless they form a single piece
pub fn join(a: &Polygon3d, b: &Polygon3d, tolerance: f64) -> Result<Option<Polygon3d>> {
    let mut joined = join_all(&[a.clone(), b.clone()], tolerance)?;
    if joined.len() == 1 {
        Ok(joined.pop())
    } else {
        Ok(None)
    }
}

/// `a` minus every coplanar polygon in `others`; pieces are wound like `a`
pub fn subtract(a: &Polygon3d, others: &[Polygon3d], tolerance: f64) -> Result<Vec<Polygon3d>> {
    check_tolerance(tolerance)?;

    let Some(frame) = Transformation::to_xy_plane(a.outer()) else {
        warn!("cannot subtract from degenerate polygon");
        return Ok(Vec::new());
    };
    let Some(shape) = a.to_shape(&frame, tolerance) else {
        return Ok(Vec::new());
    };

    let clips: Vec<Shape2D> = others
        .iter()
        .filter_map(|other| {
            let clip = other.to_shape(&frame, tolerance);
            if clip.is_none() {
                debug!("ignoring polygon off the subtraction plane");
            }
            clip
        })
        .collect();

    let to_world = frame.inverse();
    let references: Vec<Point3<f64>> = a
        .vertices()
        .chain(others.iter().flat_map(|p| p.vertices()))
        .cloned()
        .collect();

    Ok(subtract_2d(&shape, &clips, tolerance)
        .iter()
        .map(|s| lift_shape(s, &to_world, &references, tolerance))
        .collect())
}
