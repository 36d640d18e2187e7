// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Subcommand implementations over in-memory documents.

use anyhow::Result;
use plangeo_geometry::join_all;
use plangeo_spaces::{intersect_all, match_all, unmatch_space};
use serde::Serialize;
use tracing::info;

use crate::document::{ModelDocument, PolygonDocument};

#[derive(Debug, Serialize)]
pub struct PerimeterReport {
    pub polygons: usize,
    pub perimeter: f64,
}

#[derive(Debug, Serialize)]
pub struct ExposedSpace {
    pub name: String,
    pub exposed_perimeter: f64,
}

#[derive(Debug, Serialize)]
pub struct ExposedReport {
    pub elevation: f64,
    pub footprint_perimeter: f64,
    pub spaces: Vec<ExposedSpace>,
}

/// Split surfaces of every space pair along their shared regions
pub fn intersect(doc: &ModelDocument, tolerance: f64) -> Result<ModelDocument> {
    let mut spaces = doc.to_spaces()?;
    let splits = intersect_all(&mut spaces, tolerance)?;
    info!(splits, "intersect finished");
    Ok(ModelDocument::from_spaces(&spaces, doc))
}

/// Link mirror surfaces, optionally intersecting first
pub fn match_spaces(doc: &ModelDocument, tolerance: f64, intersect_first: bool) -> Result<ModelDocument> {
    let mut spaces = doc.to_spaces()?;
    if intersect_first {
        intersect_all(&mut spaces, tolerance)?;
    }
    let linked = match_all(&mut spaces, tolerance)?;
    info!(linked, "match finished");
    Ok(ModelDocument::from_spaces(&spaces, doc))
}

/// Remove every link held by the named space
pub fn unmatch(doc: &ModelDocument, space: &str) -> Result<ModelDocument> {
    let index = doc.space_index(space)?;
    let mut spaces = doc.to_spaces()?;
    unmatch_space(&mut spaces, index)?;
    Ok(ModelDocument::from_spaces(&spaces, doc))
}

pub fn union(doc: &PolygonDocument, tolerance: f64) -> Result<PolygonDocument> {
    let joined = join_all(&doc.to_polygons(), tolerance)?;
    Ok(PolygonDocument::from_polygons(&joined))
}

pub fn floor_print(doc: &ModelDocument, elevation: f64, tolerance: f64) -> Result<PolygonDocument> {
    let spaces = doc.to_spaces()?;
    let print = plangeo_spaces::floor_print(&spaces, elevation, tolerance)?;
    Ok(PolygonDocument::from_polygons(&print))
}

pub fn perimeter(doc: &PolygonDocument, tolerance: f64) -> Result<PerimeterReport> {
    let polygons = doc.to_polygons();
    let joined = join_all(&polygons, tolerance)?;
    Ok(PerimeterReport {
        polygons: joined.len(),
        perimeter: joined.iter().map(|p| p.perimeter()).sum(),
    })
}

/// Exposed floor perimeter of each space against the floor print at
/// `elevation`
pub fn exposed_perimeter(doc: &ModelDocument, elevation: f64, tolerance: f64) -> Result<ExposedReport> {
    let spaces = doc.to_spaces()?;
    let print = plangeo_spaces::floor_print(&spaces, elevation, tolerance)?;

    let mut report = ExposedReport {
        elevation,
        footprint_perimeter: print.iter().map(|p| p.perimeter()).sum(),
        spaces: Vec::with_capacity(spaces.len()),
    };
    for space in &spaces {
        let mut exposed = 0.0;
        for footprint in &print {
            exposed += space.exposed_perimeter(footprint, elevation, tolerance)?;
        }
        report.spaces.push(ExposedSpace {
            name: space.name.clone(),
            exposed_perimeter: exposed,
        });
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{BoundaryDoc, ExteriorDoc, SpaceDoc, SurfaceDoc};
    use approx::assert_relative_eq;

    const TOLERANCE: f64 = 0.01;

    fn surface(name: &str, vertices: Vec<[f64; 3]>) -> SurfaceDoc {
        SurfaceDoc {
            name: name.into(),
            vertices,
            holes: Vec::new(),
            surface_type: None,
            boundary: None,
            sub_surfaces: Vec::new(),
        }
    }

    /// Two 5x10 rooms side by side sharing the wall x = 5
    fn two_rooms() -> ModelDocument {
        let room = |name: &str, x: f64, wall: Vec<[f64; 3]>| SpaceDoc {
            name: name.into(),
            origin: [x, 0.0, 0.0],
            north_deg: 0.0,
            surfaces: vec![
                surface(
                    &format!("{name} floor"),
                    vec![[5.0, 10.0, 0.0], [5.0, 0.0, 0.0], [0.0, 0.0, 0.0], [0.0, 10.0, 0.0]],
                ),
                surface(&format!("{name} wall"), wall),
            ],
        };
        ModelDocument {
            spaces: vec![
                // East-facing wall on the west room's right side
                room(
                    "West",
                    0.0,
                    vec![[5.0, 0.0, 0.0], [5.0, 10.0, 0.0], [5.0, 10.0, 3.0], [5.0, 0.0, 3.0]],
                ),
                // West-facing wall, lower half only
                room(
                    "East",
                    5.0,
                    vec![[0.0, 0.0, 0.0], [0.0, 0.0, 1.5], [0.0, 10.0, 1.5], [0.0, 10.0, 0.0]],
                ),
            ],
        }
    }

    #[test]
    fn test_match_after_intersect() {
        let doc = match_spaces(&two_rooms(), TOLERANCE, true).unwrap();

        // West wall split into the shared lower half and the free upper half
        let west = &doc.spaces[0];
        assert_eq!(west.surfaces.len(), 3);
        let linked: Vec<&SurfaceDoc> = west
            .surfaces
            .iter()
            .filter(|s| matches!(s.boundary, Some(BoundaryDoc::Adjacent { .. })))
            .collect();
        assert_eq!(linked.len(), 1);
        assert_eq!(
            linked[0].boundary,
            Some(BoundaryDoc::Adjacent {
                space: "East".into(),
                surface: "East wall".into(),
                previous: ExteriorDoc::Outdoors,
            })
        );

        let unmatched = unmatch(&doc, "East").unwrap();
        for space in &unmatched.spaces {
            for s in &space.surfaces {
                assert!(matches!(s.boundary, Some(BoundaryDoc::Exterior { .. })), "{}", s.name);
            }
        }
        assert!(unmatch(&doc, "North").is_err());
    }

    #[test]
    fn test_match_without_intersect_links_nothing() {
        let doc = match_spaces(&two_rooms(), TOLERANCE, false).unwrap();
        assert!(doc
            .spaces
            .iter()
            .flat_map(|s| &s.surfaces)
            .all(|s| !matches!(s.boundary, Some(BoundaryDoc::Adjacent { .. }))));
    }

    #[test]
    fn test_floor_print_and_exposed_perimeter() {
        let print = floor_print(&two_rooms(), 0.0, TOLERANCE).unwrap();
        assert_eq!(print.polygons.len(), 1);
        assert_eq!(print.polygons[0].outer.len(), 4);

        let report = exposed_perimeter(&two_rooms(), 0.0, TOLERANCE).unwrap();
        assert_relative_eq!(report.footprint_perimeter, 40.0, epsilon = TOLERANCE);
        for space in &report.spaces {
            assert_relative_eq!(space.exposed_perimeter, 20.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_union_and_perimeter() {
        let print = floor_print(&two_rooms(), 0.0, TOLERANCE).unwrap();
        let mut pieces = PolygonDocument::default();
        for space in two_rooms().to_spaces().unwrap() {
            let floors = space.floor_print(TOLERANCE).unwrap();
            let global: Vec<_> = floors.iter().map(|p| p.transformed(&space.transformation)).collect();
            pieces.polygons.extend(PolygonDocument::from_polygons(&global).polygons);
        }
        assert_eq!(pieces.polygons.len(), 2);

        let joined = union(&pieces, TOLERANCE).unwrap().to_polygons();
        assert_eq!(joined.len(), 1);
        assert_eq!(joined[0].outer().len(), print.polygons[0].outer.len());
        assert_relative_eq!(joined[0].net_area(), 100.0, epsilon = TOLERANCE);

        let report = perimeter(&pieces, TOLERANCE).unwrap();
        assert_eq!(report.polygons, 1);
        assert_relative_eq!(report.perimeter, 40.0, epsilon = TOLERANCE);
    }

    #[test]
    fn test_bad_tolerance_is_an_error() {
        assert!(intersect(&two_rooms(), 0.0).is_err());
        assert!(union(&PolygonDocument::default(), -1.0).is_err());
    }
}
