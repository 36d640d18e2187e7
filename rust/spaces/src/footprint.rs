// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Floor print, perimeter and exposed perimeter queries

use plangeo_geometry::error::check_tolerance;
use plangeo_geometry::{exposed_length, join_all, Polygon3d};

use crate::error::Result;
use crate::model::{Space, SurfaceType};

/// Global polygons of `space` facing down with every vertex at `elevation`
fn ground_polygons(space: &Space, elevation: f64, tolerance: f64) -> Vec<Polygon3d> {
    space
        .surfaces
        .iter()
        .map(|s| space.global_polygon(s))
        .filter(|p| {
            p.outward_normal().map_or(false, |n| n.z < 0.0)
                && p.vertices().all(|v| (v.z - elevation).abs() <= tolerance)
        })
        .collect()
}

/// Union of every downward-facing surface at `elevation` across `spaces`.
///
/// Usually a single polygon; disjoint buildings give several.
pub fn floor_print(spaces: &[Space], elevation: f64, tolerance: f64) -> Result<Vec<Polygon3d>> {
    check_tolerance(tolerance)?;
    let polygons: Vec<Polygon3d> = spaces
        .iter()
        .flat_map(|space| ground_polygons(space, elevation, tolerance))
        .collect();
    Ok(join_all(&polygons, tolerance)?)
}

/// Summed outer perimeter of the union of `polygons`
pub fn perimeter(polygons: &[Polygon3d], tolerance: f64) -> Result<f64> {
    Ok(join_all(polygons, tolerance)?
        .iter()
        .map(|p| p.perimeter())
        .sum())
}

impl Space {
    /// Union of this space's floors, in the space's local frame
    pub fn floor_print(&self, tolerance: f64) -> Result<Vec<Polygon3d>> {
        let floors: Vec<Polygon3d> = self
            .surfaces
            .iter()
            .filter(|s| s.surface_type == SurfaceType::Floor)
            .map(|s| s.polygon.clone())
            .collect();
        Ok(join_all(&floors, tolerance)?)
    }

    /// Net area of all floor surfaces
    pub fn floor_area(&self) -> f64 {
        self.surfaces
            .iter()
            .filter(|s| s.surface_type == SurfaceType::Floor)
            .map(|s| s.net_area())
            .sum()
    }

    /// Length of this space's ground-level floor edges that lie on the
    /// footprint's outer boundary
    pub fn exposed_perimeter(&self, footprint: &Polygon3d, elevation: f64, tolerance: f64) -> Result<f64> {
        check_tolerance(tolerance)?;
        Ok(ground_polygons(self, elevation, tolerance)
            .iter()
            .map(|p| exposed_length(p.outer(), footprint, tolerance))
            .sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Surface;
    use approx::assert_relative_eq;
    use nalgebra::{Point3, Vector3};
    use plangeo_geometry::Transformation;

    /// Downward-facing rectangle at z = 0 in local coordinates
    fn floor(x0: f64, y0: f64, x1: f64, y1: f64) -> Polygon3d {
        Polygon3d::new(vec![
            Point3::new(x1, y1, 0.0),
            Point3::new(x1, y0, 0.0),
            Point3::new(x0, y0, 0.0),
            Point3::new(x0, y1, 0.0),
        ])
    }

    fn room(name: &str, offset: Vector3<f64>, floors: Vec<Polygon3d>) -> Space {
        let mut space = Space::new(name, Transformation::translation(&offset));
        for (k, f) in floors.into_iter().enumerate() {
            space.add_surface(Surface::new(format!("{name} floor {k}"), f).unwrap());
        }
        space
    }

    #[test]
    fn test_space_floor_print_grows() {
        let space = room(
            "Room",
            Vector3::zeros(),
            vec![floor(0.0, 0.0, 1.0, 1.0), floor(0.0, 1.0, 1.0, 2.0), floor(1.0, 1.0, 2.0, 2.0)],
        );
        let print = space.floor_print(0.01).unwrap();
        assert_eq!(print.len(), 1);
        // L-shape
        assert_eq!(print[0].outer().len(), 6);
        assert_relative_eq!(print[0].net_area(), 3.0, epsilon = 1e-9);
        assert_relative_eq!(space.floor_area(), 3.0, epsilon = 1e-9);
        assert!(print[0].outward_normal().unwrap().z < 0.0);
    }

    #[test]
    fn test_empty_space_has_no_floor_print() {
        let space = Space::new("Empty", Transformation::identity());
        assert!(space.floor_print(0.01).unwrap().is_empty());
        assert_relative_eq!(space.floor_area(), 0.0);
    }

    #[test]
    fn test_floor_print_across_spaces() {
        let spaces = vec![
            room("West", Vector3::zeros(), vec![floor(0.0, 0.0, 5.0, 10.0)]),
            room("East", Vector3::new(5.0, 0.0, 0.0), vec![floor(0.0, 0.0, 5.0, 10.0)]),
            // Upper storey is ignored
            room("Upper", Vector3::new(0.0, 0.0, 3.0), vec![floor(0.0, 0.0, 10.0, 10.0)]),
        ];
        let print = floor_print(&spaces, 0.0, 0.01).unwrap();
        assert_eq!(print.len(), 1);
        assert_eq!(print[0].outer().len(), 4);
        assert_relative_eq!(print[0].net_area(), 100.0, epsilon = 1e-9);
        assert_relative_eq!(perimeter(&print, 0.01).unwrap(), 40.0, epsilon = 0.01);

        let upper = floor_print(&spaces, 3.0, 0.01).unwrap();
        assert_eq!(upper.len(), 1);
        assert_relative_eq!(upper[0].net_area(), 100.0, epsilon = 1e-9);
    }

    #[test]
    fn test_exposed_perimeter_per_space() {
        let spaces = vec![
            room("West", Vector3::zeros(), vec![floor(0.0, 0.0, 5.0, 10.0)]),
            room("East", Vector3::new(5.0, 0.0, 0.0), vec![floor(0.0, 0.0, 5.0, 10.0)]),
        ];
        let print = floor_print(&spaces, 0.0, 0.01).unwrap();
        let footprint = &print[0];

        // Each half touches the footprint on three sides: 5 + 10 + 5
        for space in &spaces {
            assert_relative_eq!(
                space.exposed_perimeter(footprint, 0.0, 0.01).unwrap(),
                20.0,
                epsilon = 1e-9
            );
        }
    }
}
