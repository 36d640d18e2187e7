// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Floor print, perimeter and exposed perimeter over a small building.

use approx::assert_relative_eq;
use nalgebra::{Point3, Vector3};
use plangeo_geometry::{exposed_length, join_all, Polygon3d, Transformation};
use plangeo_spaces::{floor_print, perimeter, Space, Surface, SurfaceType};

const TOLERANCE: f64 = 0.01;

/// Downward-facing floor of a `width` x `depth` room at the local origin
fn floor(width: f64, depth: f64) -> Polygon3d {
    Polygon3d::new(vec![
        Point3::new(width, depth, 0.0),
        Point3::new(width, 0.0, 0.0),
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(0.0, depth, 0.0),
    ])
}

/// 10x10 m building cut into four 2.5x10 m strip rooms
fn strip_building() -> Vec<Space> {
    (0..4)
        .map(|i| {
            let offset = Vector3::new(i as f64 * 2.5, 0.0, 0.0);
            let mut space = Space::new(format!("Strip {i}"), Transformation::translation(&offset));
            space.add_surface(Surface::new("Floor", floor(2.5, 10.0)).unwrap());
            space
        })
        .collect()
}

#[test]
fn strips_union_to_square_footprint() {
    let mut spaces = strip_building();
    // Processing order must not matter
    for _ in 0..4 {
        spaces.rotate_left(1);
        let print = floor_print(&spaces, 0.0, TOLERANCE).unwrap();
        assert_eq!(print.len(), 1);
        assert_eq!(print[0].outer().len(), 4);
        assert_relative_eq!(print[0].net_area(), 100.0, epsilon = TOLERANCE);
        assert_relative_eq!(print[0].perimeter(), 40.0, epsilon = TOLERANCE);
    }
}

#[test]
fn perimeter_of_joined_floors() {
    let polygons: Vec<Polygon3d> = strip_building()
        .iter()
        .flat_map(|s| s.global_polygons())
        .collect();
    assert_relative_eq!(perimeter(&polygons, TOLERANCE).unwrap(), 40.0, epsilon = TOLERANCE);

    // Separate buildings add up
    let mut apart = polygons.clone();
    apart.push(floor(1.0, 1.0).transformed(&Transformation::translation(&Vector3::new(50.0, 0.0, 0.0))));
    assert_eq!(join_all(&apart, TOLERANCE).unwrap().len(), 2);
    assert_relative_eq!(perimeter(&apart, TOLERANCE).unwrap(), 44.0, epsilon = TOLERANCE);
}

#[test]
fn exposed_perimeter_of_strip_rooms() {
    let spaces = strip_building();
    let print = floor_print(&spaces, 0.0, TOLERANCE).unwrap();
    let footprint = &print[0];

    let exposed: Vec<f64> = spaces
        .iter()
        .map(|s| s.exposed_perimeter(footprint, 0.0, TOLERANCE).unwrap())
        .collect();

    // End strips touch three sides, middle strips only front and back
    assert_relative_eq!(exposed[0], 15.0, epsilon = 1e-9);
    assert_relative_eq!(exposed[1], 5.0, epsilon = 1e-9);
    assert_relative_eq!(exposed[2], 5.0, epsilon = 1e-9);
    assert_relative_eq!(exposed[3], 15.0, epsilon = 1e-9);
    assert_relative_eq!(exposed.iter().sum::<f64>(), footprint.perimeter(), epsilon = 1e-9);
}

#[test]
fn full_length_ground_wall_is_fully_exposed() {
    let print = floor_print(&strip_building(), 0.0, TOLERANCE).unwrap();
    let wall = Polygon3d::new(vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(10.0, 0.0, 0.0),
        Point3::new(10.0, 0.0, 3.0),
        Point3::new(0.0, 0.0, 3.0),
    ]);
    assert_relative_eq!(exposed_length(wall.outer(), &print[0], TOLERANCE), 10.0, epsilon = 1e-9);
}

#[test]
fn floors_only_count_at_the_requested_elevation() {
    let mut spaces = strip_building();
    let mut upper = Space::new("Upper", Transformation::translation(&Vector3::new(0.0, 0.0, 3.0)));
    upper.add_surface(Surface::new("Floor", floor(4.0, 4.0)).unwrap());
    assert_eq!(upper.surfaces[0].surface_type, SurfaceType::Floor);
    spaces.push(upper);

    let ground = floor_print(&spaces, 0.0, TOLERANCE).unwrap();
    assert_relative_eq!(ground[0].net_area(), 100.0, epsilon = TOLERANCE);

    let first = floor_print(&spaces, 3.0, TOLERANCE).unwrap();
    assert_eq!(first.len(), 1);
    assert_relative_eq!(first[0].net_area(), 16.0, epsilon = TOLERANCE);
}
