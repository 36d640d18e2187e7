// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Rigid transformations between space-local, global and plane frames
//!
//! A `Transformation` is a rotation followed by a translation. The plane
//! frame built by [`Transformation::to_xy_plane`] is what lets the boolean
//! engine treat coplanar 3D loops as 2D contours and map results back.

use std::ops::Mul;

use nalgebra::{
    Isometry3, Matrix3, Matrix4, Point3, Rotation3, Translation3, Unit, UnitQuaternion, Vector3,
};

use crate::plane::outward_normal;

/// Rigid rotation + translation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transformation {
    isometry: Isometry3<f64>,
}

impl Default for Transformation {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transformation {
    pub fn identity() -> Self {
        Self {
            isometry: Isometry3::identity(),
        }
    }

    pub fn translation(offset: &Vector3<f64>) -> Self {
        Self {
            isometry: Isometry3::from_parts(Translation3::from(*offset), UnitQuaternion::identity()),
        }
    }

    /// Rotation by `angle` radians about `axis` through the origin.
    ///
    /// Returns `None` for a zero-length axis.
    pub fn rotation(axis: &Vector3<f64>, angle: f64) -> Option<Self> {
        let unit_axis = Unit::try_new(*axis, 1e-15)?;
        Some(Self {
            isometry: Isometry3::from_parts(
                Translation3::identity(),
                UnitQuaternion::from_axis_angle(&unit_axis, angle),
            ),
        })
    }

    /// Rotation about an axis passing through `origin`
    pub fn rotation_about(origin: &Point3<f64>, axis: &Vector3<f64>, angle: f64) -> Option<Self> {
        let rotation = Self::rotation(axis, angle)?;
        Some(Self::translation(&origin.coords) * rotation * Self::translation(&-origin.coords))
    }

    /// Build the transformation that maps a loop into the Z=0 plane.
    ///
    /// The loop's outward normal maps to +Z, so the projected loop is
    /// counter-clockwise. For tilted or vertical planes the local X axis is
    /// horizontal; for horizontal planes it is the world X axis. The origin
    /// is the point of the plane closest to the world origin, so every loop
    /// on the same plane with the same orientation gets the same frame.
    ///
    /// Returns `None` for degenerate loops.
    pub fn to_xy_plane(points: &[Point3<f64>]) -> Option<Self> {
        let normal = outward_normal(points)?;
        Self::plane_frame(&normal, points.first()?)
    }

    /// Frame for the plane through `point` with the given normal, built the
    /// same way as [`Transformation::to_xy_plane`]. The normal maps to +Z.
    pub fn plane_frame(normal: &Vector3<f64>, point: &Point3<f64>) -> Option<Self> {
        let normal = normal.try_normalize(1e-12)?;

        let x_axis = if normal.z.abs() > 1.0 - 1e-9 {
            Vector3::x()
        } else {
            Vector3::z().cross(&normal).normalize()
        };
        let y_axis = normal.cross(&x_axis).normalize();

        let rotation = Rotation3::from_matrix_unchecked(Matrix3::from_columns(&[
            x_axis, y_axis, normal,
        ]));
        let origin = normal * normal.dot(&point.coords);

        let plane_to_world = Isometry3::from_parts(
            Translation3::from(origin),
            UnitQuaternion::from_rotation_matrix(&rotation),
        );

        Some(Self {
            isometry: plane_to_world.inverse(),
        })
    }

    pub fn inverse(&self) -> Self {
        Self {
            isometry: self.isometry.inverse(),
        }
    }

    pub fn apply(&self, p: &Point3<f64>) -> Point3<f64> {
        self.isometry.transform_point(p)
    }

    pub fn apply_vector(&self, v: &Vector3<f64>) -> Vector3<f64> {
        self.isometry.transform_vector(v)
    }

    pub fn apply_loop(&self, points: &[Point3<f64>]) -> Vec<Point3<f64>> {
        points.iter().map(|p| self.apply(p)).collect()
    }

    /// Homogeneous 4x4 matrix (columns are the local axes, last column the origin)
    pub fn matrix(&self) -> Matrix4<f64> {
        self.isometry.to_homogeneous()
    }

    pub fn translation_vector(&self) -> Vector3<f64> {
        self.isometry.translation.vector
    }

    pub fn rotation_matrix(&self) -> Matrix3<f64> {
        self.isometry.rotation.to_rotation_matrix().into_inner()
    }

    /// Element-wise comparison of the homogeneous matrices
    pub fn approx_eq(&self, other: &Transformation, tolerance: f64) -> bool {
        (self.matrix() - other.matrix()).abs().max() <= tolerance
    }
}

/// Composition: `(a * b).apply(p) == a.apply(&b.apply(p))`
impl Mul for Transformation {
    type Output = Transformation;

    fn mul(self, rhs: Transformation) -> Transformation {
        Transformation {
            isometry: self.isometry * rhs.isometry,
        }
    }
}

impl Mul<Point3<f64>> for Transformation {
    type Output = Point3<f64>;

    fn mul(self, rhs: Point3<f64>) -> Point3<f64> {
        self.apply(&rhs)
    }
}
