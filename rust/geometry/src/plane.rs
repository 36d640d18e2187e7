// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Plane derivation for vertex loops
//!
//! Normals use Newell's method, which sums over every edge and stays stable
//! for concave loops and runs of nearly collinear vertices where a three-point
//! cross product would not.

use nalgebra::{Point3, Vector3};

use crate::point::try_normalize;

/// Cosine slack used when comparing plane orientations
pub const NORMAL_TOLERANCE: f64 = 1e-4;

/// Newell vector of a loop. Its length is twice the enclosed area and its
/// direction follows the right-hand rule over the stored winding.
///
/// Returns `None` for loops with fewer than 3 vertices or zero area.
pub fn newell_vector(points: &[Point3<f64>]) -> Option<Vector3<f64>> {
    if points.len() < 3 {
        return None;
    }

    let mut normal = Vector3::new(0.0, 0.0, 0.0);
    let n = points.len();

    for i in 0..n {
        let curr = &points[i];
        let next = &points[(i + 1) % n];

        normal.x += (curr.y - next.y) * (curr.z + next.z);
        normal.y += (curr.z - next.z) * (curr.x + next.x);
        normal.z += (curr.x - next.x) * (curr.y + next.y);
    }

    if normal.norm() < 1e-12 {
        return None; // degenerate loop
    }

    Some(normal)
}

/// Unit outward normal of a loop, following its stored winding
pub fn outward_normal(points: &[Point3<f64>]) -> Option<Vector3<f64>> {
    newell_vector(points).and_then(|v| try_normalize(&v))
}

/// Infinite plane `normal · p + offset = 0`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub normal: Vector3<f64>,
    pub offset: f64,
}

impl Plane {
    /// Build a plane from a unit normal and a point on it
    pub fn new(normal: Vector3<f64>, point: &Point3<f64>) -> Option<Self> {
        let normal = try_normalize(&normal)?;
        Some(Self {
            normal,
            offset: -normal.dot(&point.coords),
        })
    }

    /// Best-fit plane through a loop (Newell normal, mean vertex offset)
    pub fn from_points(points: &[Point3<f64>]) -> Option<Self> {
        let normal = outward_normal(points)?;
        let mean = points.iter().map(|p| normal.dot(&p.coords)).sum::<f64>() / points.len() as f64;
        Some(Self {
            normal,
            offset: -mean,
        })
    }

    pub fn signed_distance(&self, p: &Point3<f64>) -> f64 {
        self.normal.dot(&p.coords) + self.offset
    }

    pub fn contains(&self, p: &Point3<f64>, tolerance: f64) -> bool {
        self.signed_distance(p).abs() <= tolerance
    }

    /// All points within `tolerance` of the plane
    pub fn contains_all(&self, points: &[Point3<f64>], tolerance: f64) -> bool {
        points.iter().all(|p| self.contains(p, tolerance))
    }

    /// Same orientation, same position
    pub fn equal(&self, other: &Plane, tolerance: f64) -> bool {
        self.normal.dot(&other.normal) >= 1.0 - NORMAL_TOLERANCE
            && (self.offset - other.offset).abs() <= tolerance
    }

    /// Same position, opposite orientation: the mirror faces of two spaces
    /// sharing a wall lie on planes like this.
    pub fn reverse_equal(&self, other: &Plane, tolerance: f64) -> bool {
        self.normal.dot(&other.normal) <= -1.0 + NORMAL_TOLERANCE
            && (self.offset + other.offset).abs() <= tolerance
    }

    pub fn reversed(&self) -> Self {
        Self {
            normal: -self.normal,
            offset: -self.offset,
        }
    }

    /// Orthogonal projection of a point onto the plane
    pub fn project(&self, p: &Point3<f64>) -> Point3<f64> {
        p - self.normal * self.signed_distance(p)
    }
}
