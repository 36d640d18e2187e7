// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Snapshot model of spaces, surfaces and sub-surfaces
//!
//! Geometry is stored in space-local coordinates; the space's transformation
//! maps it to the global frame in which intersection and matching happen.

use std::fmt;

use nalgebra::{Point3, Vector3};
use plangeo_geometry::{BoundingBox, Polygon3d, Transformation};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Vertices of a floor this close to elevation 0 make it a ground floor
const GROUND_ELEVATION_TOLERANCE: f64 = 1e-6;

macro_rules! define_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

define_id!(SurfaceId);
define_id!(SubSurfaceId);

/// Surface classification derived from the outward normal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceType {
    Floor,
    Wall,
    RoofCeiling,
}

impl SurfaceType {
    /// Classify by tilt (angle between the outward normal and +Z):
    /// below 60° roof/ceiling, below 179° wall, otherwise floor.
    pub fn from_normal(normal: &Vector3<f64>) -> Self {
        let tilt = normal.z.clamp(-1.0, 1.0).acos().to_degrees();
        if tilt < 60.0 {
            SurfaceType::RoofCeiling
        } else if tilt < 179.0 {
            SurfaceType::Wall
        } else {
            SurfaceType::Floor
        }
    }
}

impl fmt::Display for SurfaceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SurfaceType::Floor => "Floor",
            SurfaceType::Wall => "Wall",
            SurfaceType::RoofCeiling => "RoofCeiling",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ExteriorCondition {
    #[default]
    Outdoors,
    Ground,
    Adiabatic,
}

/// What lies on the other side of a surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryCondition {
    Exterior(ExteriorCondition),
    /// Linked to a mirror surface of another space. `previous` is restored
    /// when the link is removed.
    Adjacent {
        surface: SurfaceId,
        previous: ExteriorCondition,
    },
}

impl Default for BoundaryCondition {
    fn default() -> Self {
        BoundaryCondition::Exterior(ExteriorCondition::default())
    }
}

impl BoundaryCondition {
    pub fn is_adjacent(&self) -> bool {
        matches!(self, BoundaryCondition::Adjacent { .. })
    }

    pub fn adjacent_surface(&self) -> Option<SurfaceId> {
        match self {
            BoundaryCondition::Adjacent { surface, .. } => Some(*surface),
            BoundaryCondition::Exterior(_) => None,
        }
    }

    /// The exterior condition in effect now or before the surface was linked
    pub fn exterior_condition(&self) -> ExteriorCondition {
        match self {
            BoundaryCondition::Exterior(condition) => *condition,
            BoundaryCondition::Adjacent { previous, .. } => *previous,
        }
    }
}

/// An opening (window, door) hosted by a surface
#[derive(Debug, Clone, PartialEq)]
pub struct SubSurface {
    pub id: SubSurfaceId,
    pub name: String,
    /// Outer loop in space-local coordinates
    pub vertices: Vec<Point3<f64>>,
    pub adjacent: Option<SubSurfaceId>,
}

impl SubSurface {
    pub fn new(name: impl Into<String>, vertices: Vec<Point3<f64>>) -> Self {
        Self {
            id: SubSurfaceId::new(),
            name: name.into(),
            vertices,
            adjacent: None,
        }
    }

    pub fn is_matched(&self) -> bool {
        self.adjacent.is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    pub id: SurfaceId,
    pub name: String,
    pub surface_type: SurfaceType,
    /// Space-local geometry
    pub polygon: Polygon3d,
    pub boundary_condition: BoundaryCondition,
    pub sub_surfaces: Vec<SubSurface>,
}

impl Surface {
    /// Build a surface, classifying it from its outward normal.
    ///
    /// Fails for loops without a defined plane.
    pub fn new(name: impl Into<String>, polygon: Polygon3d) -> Result<Self> {
        let name = name.into();
        let Some(normal) = polygon.outward_normal() else {
            return Err(Error::DegenerateSurface(name));
        };

        Ok(Self {
            id: SurfaceId::new(),
            name,
            surface_type: SurfaceType::from_normal(&normal),
            polygon,
            boundary_condition: BoundaryCondition::default(),
            sub_surfaces: Vec::new(),
        })
    }

    pub fn with_boundary_condition(mut self, condition: BoundaryCondition) -> Self {
        self.boundary_condition = condition;
        self
    }

    pub fn add_sub_surface(&mut self, sub_surface: SubSurface) -> SubSurfaceId {
        let id = sub_surface.id;
        self.sub_surfaces.push(sub_surface);
        id
    }

    pub fn vertices(&self) -> &[Point3<f64>] {
        self.polygon.outer()
    }

    pub fn is_matched(&self) -> bool {
        self.boundary_condition.is_adjacent()
    }

    pub fn adjacent_surface(&self) -> Option<SurfaceId> {
        self.boundary_condition.adjacent_surface()
    }

    pub fn gross_area(&self) -> f64 {
        self.polygon.gross_area()
    }

    pub fn net_area(&self) -> f64 {
        self.polygon.net_area()
    }
}

/// A room: named collection of surfaces in a local frame
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Space {
    pub name: String,
    /// Local-to-global transformation
    pub transformation: Transformation,
    pub surfaces: Vec<Surface>,
}

impl Space {
    pub fn new(name: impl Into<String>, transformation: Transformation) -> Self {
        Self {
            name: name.into(),
            transformation,
            surfaces: Vec::new(),
        }
    }

    /// Add a surface. Floors sitting at global elevation 0 default to a
    /// ground boundary condition.
    pub fn add_surface(&mut self, mut surface: Surface) -> SurfaceId {
        if surface.surface_type == SurfaceType::Floor
            && surface.boundary_condition == BoundaryCondition::default()
        {
            let on_ground = surface
                .polygon
                .vertices()
                .all(|p| self.transformation.apply(p).z.abs() <= GROUND_ELEVATION_TOLERANCE);
            if on_ground {
                surface.boundary_condition = BoundaryCondition::Exterior(ExteriorCondition::Ground);
            }
        }

        let id = surface.id;
        self.surfaces.push(surface);
        id
    }

    pub fn surface(&self, id: SurfaceId) -> Option<&Surface> {
        self.surfaces.iter().find(|s| s.id == id)
    }

    pub fn surface_mut(&mut self, id: SurfaceId) -> Option<&mut Surface> {
        self.surfaces.iter_mut().find(|s| s.id == id)
    }

    pub fn surface_by_name(&self, name: &str) -> Option<&Surface> {
        self.surfaces.iter().find(|s| s.name == name)
    }

    /// Surface geometry in the global frame
    pub fn global_polygon(&self, surface: &Surface) -> Polygon3d {
        surface.polygon.transformed(&self.transformation)
    }

    pub fn global_polygons(&self) -> Vec<Polygon3d> {
        self.surfaces.iter().map(|s| self.global_polygon(s)).collect()
    }

    /// Global bounding box of every surface, `None` for an empty space
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        self.surfaces
            .iter()
            .filter_map(|s| self.global_polygon(s).bounding_box())
            .reduce(|mut acc, b| {
                acc.add_box(&b);
                acc
            })
    }

    pub fn matched_count(&self) -> usize {
        self.surfaces.iter().filter(|s| s.is_matched()).count()
    }

    /// Surfaces whose global outward normal lies within the given bounds,
    /// in degrees.
    ///
    /// Azimuth runs clockwise from north (+Y) and the range may wrap past
    /// 360, so `(350, 10)` selects normals within 10° of north. Tilt is the
    /// angle from +Z: 0 faces up, 180 faces down. Missing bounds are open.
    /// Horizontal surfaces have no azimuth and never pass an azimuth bound.
    pub fn find_surfaces(
        &self,
        min_azimuth: Option<f64>,
        max_azimuth: Option<f64>,
        min_tilt: Option<f64>,
        max_tilt: Option<f64>,
        tolerance_deg: f64,
    ) -> Vec<&Surface> {
        self.surfaces
            .iter()
            .filter(|surface| {
                let Some(local) = surface.polygon.outward_normal() else {
                    return false;
                };
                let normal = self.transformation.apply_vector(&local);
                let tilt = normal.z.clamp(-1.0, 1.0).acos().to_degrees();
                if min_tilt.map_or(false, |min| tilt < min - tolerance_deg)
                    || max_tilt.map_or(false, |max| tilt > max + tolerance_deg)
                {
                    return false;
                }

                if min_azimuth.is_none() && max_azimuth.is_none() {
                    return true;
                }
                if normal.x.hypot(normal.y) < 1e-9 {
                    return false;
                }
                let azimuth = normal.x.atan2(normal.y).to_degrees().rem_euclid(360.0);
                let start = min_azimuth.unwrap_or(0.0);
                let span = match max_azimuth {
                    Some(max) => (max - start).rem_euclid(360.0),
                    None => 360.0,
                };
                let offset = (azimuth - start).rem_euclid(360.0);
                offset <= span + tolerance_deg || offset >= 360.0 - tolerance_deg
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square(z: f64, facing_up: bool) -> Polygon3d {
        let poly = Polygon3d::new(vec![
            Point3::new(0.0, 0.0, z),
            Point3::new(2.0, 0.0, z),
            Point3::new(2.0, 2.0, z),
            Point3::new(0.0, 2.0, z),
        ]);
        if facing_up {
            poly
        } else {
            poly.reversed()
        }
    }

    #[test]
    fn test_surface_type_from_tilt() {
        assert_eq!(SurfaceType::from_normal(&Vector3::z()), SurfaceType::RoofCeiling);
        assert_eq!(SurfaceType::from_normal(&Vector3::x()), SurfaceType::Wall);
        assert_eq!(SurfaceType::from_normal(&-Vector3::z()), SurfaceType::Floor);
        // 45° pitched roof
        let pitched = Vector3::new(1.0, 0.0, 1.0).normalize();
        assert_eq!(SurfaceType::from_normal(&pitched), SurfaceType::RoofCeiling);
    }

    #[test]
    fn test_degenerate_surface_rejected() {
        let line = Polygon3d::new(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
        ]);
        assert!(matches!(
            Surface::new("bad", line),
            Err(Error::DegenerateSurface(name)) if name == "bad"
        ));
    }

    #[test]
    fn test_ground_floor_default() {
        let mut space = Space::new("Room", Transformation::identity());
        let floor = space.add_surface(Surface::new("Floor", square(0.0, false)).unwrap());
        let roof = space.add_surface(Surface::new("Roof", square(3.0, true)).unwrap());

        assert_eq!(
            space.surface(floor).unwrap().boundary_condition,
            BoundaryCondition::Exterior(ExteriorCondition::Ground)
        );
        assert_eq!(
            space.surface(roof).unwrap().boundary_condition,
            BoundaryCondition::Exterior(ExteriorCondition::Outdoors)
        );

        // Raised by the space transformation: not on the ground
        let mut upper = Space::new("Upper", Transformation::translation(&Vector3::new(0.0, 0.0, 3.0)));
        let floor = upper.add_surface(Surface::new("Floor", square(0.0, false)).unwrap());
        assert_eq!(
            upper.surface(floor).unwrap().boundary_condition.exterior_condition(),
            ExteriorCondition::Outdoors
        );
    }

    #[test]
    fn test_global_bounding_box() {
        let mut space = Space::new("Room", Transformation::translation(&Vector3::new(10.0, 0.0, 0.0)));
        space.add_surface(Surface::new("Floor", square(0.0, false)).unwrap());
        space.add_surface(Surface::new("Roof", square(3.0, true)).unwrap());

        let bbox = space.bounding_box().unwrap();
        assert_relative_eq!(bbox.min.x, 10.0, epsilon = 1e-12);
        assert_relative_eq!(bbox.max.x, 12.0, epsilon = 1e-12);
        assert_relative_eq!(bbox.max.z, 3.0, epsilon = 1e-12);
        assert!(Space::default().bounding_box().is_none());
    }

    #[test]
    fn test_boundary_condition_accessors() {
        let id = SurfaceId::new();
        let linked = BoundaryCondition::Adjacent {
            surface: id,
            previous: ExteriorCondition::Ground,
        };
        assert!(linked.is_adjacent());
        assert_eq!(linked.adjacent_surface(), Some(id));
        assert_eq!(linked.exterior_condition(), ExteriorCondition::Ground);
        assert!(!BoundaryCondition::default().is_adjacent());
    }

    /// Closed 10 x 10 x 3 box, every face pointing out
    fn box_space(north_deg: f64) -> Space {
        let rotation = Transformation::rotation(&Vector3::z(), -north_deg.to_radians()).unwrap();
        let mut space = Space::new("Box", Transformation::translation(&Vector3::new(10.0, -10.0, 0.0)) * rotation);
        let faces: [(&str, [[f64; 3]; 4]); 6] = [
            ("Floor", [[0.0, 0.0, 0.0], [0.0, 10.0, 0.0], [10.0, 10.0, 0.0], [10.0, 0.0, 0.0]]),
            ("Roof", [[0.0, 0.0, 3.0], [10.0, 0.0, 3.0], [10.0, 10.0, 3.0], [0.0, 10.0, 3.0]]),
            ("South", [[0.0, 0.0, 0.0], [10.0, 0.0, 0.0], [10.0, 0.0, 3.0], [0.0, 0.0, 3.0]]),
            ("North", [[10.0, 10.0, 0.0], [0.0, 10.0, 0.0], [0.0, 10.0, 3.0], [10.0, 10.0, 3.0]]),
            ("East", [[10.0, 0.0, 0.0], [10.0, 10.0, 0.0], [10.0, 10.0, 3.0], [10.0, 0.0, 3.0]]),
            ("West", [[0.0, 10.0, 0.0], [0.0, 0.0, 0.0], [0.0, 0.0, 3.0], [0.0, 10.0, 3.0]]),
        ];
        for (name, loop_) in faces {
            let polygon = Polygon3d::new(loop_.iter().map(|v| Point3::new(v[0], v[1], v[2])).collect());
            space.add_surface(Surface::new(name, polygon).unwrap());
        }
        space
    }

    fn names(found: Vec<&Surface>) -> Vec<&str> {
        found.iter().map(|s| s.name.as_str()).collect()
    }

    #[test]
    fn test_find_surfaces_by_orientation() {
        let space = box_space(0.0);
        let walls = |min: f64, max: f64| names(space.find_surfaces(Some(min), Some(max), Some(90.0), Some(90.0), 1.0));

        assert_eq!(walls(0.0, 0.0), ["North"]);
        assert_eq!(walls(359.0, 1.0), ["North"]);
        assert_eq!(walls(90.0, 90.0), ["East"]);
        assert_eq!(walls(180.0, 180.0), ["South"]);
        assert_eq!(walls(270.0, 270.0), ["West"]);
        assert_eq!(walls(45.0, 225.0), ["South", "East"]);

        assert_eq!(names(space.find_surfaces(None, None, Some(180.0), Some(180.0), 1.0)), ["Floor"]);
        assert_eq!(names(space.find_surfaces(None, None, Some(0.0), Some(0.0), 1.0)), ["Roof"]);
        assert_eq!(space.find_surfaces(None, None, None, None, 1.0).len(), 6);
        // Horizontal faces have no azimuth
        assert!(space.find_surfaces(Some(0.0), Some(359.0), Some(0.0), Some(0.0), 1.0).is_empty());
    }

    #[test]
    fn test_find_surfaces_uses_global_north() {
        let space = box_space(20.0);
        let walls = |azimuth: f64| names(space.find_surfaces(Some(azimuth), Some(azimuth), Some(90.0), Some(90.0), 1.0));

        assert_eq!(walls(20.0), ["North"]);
        assert_eq!(walls(110.0), ["East"]);
        assert_eq!(walls(200.0), ["South"]);
        assert_eq!(walls(290.0), ["West"]);
        assert!(walls(0.0).is_empty());
        assert_eq!(names(space.find_surfaces(None, None, Some(180.0), Some(180.0), 1.0)), ["Floor"]);
    }
}
