// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! JSON documents read and written by the CLI.
//!
//! Model documents hold named spaces with surfaces in local coordinates.
//! Links between surfaces are written by name (`space` + `surface`) and
//! resolved to handles when the document is loaded.

use nalgebra::{Point3, Vector3};
use plangeo_geometry::{Polygon3d, Transformation};
use plangeo_spaces::{
    BoundaryCondition, ExteriorCondition, Space, SubSurface, SubSurfaceId, Surface, SurfaceId,
};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// Errors raised while converting documents to and from the model.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Unknown space: {0}")]
    UnknownSpace(String),

    #[error("Unknown surface {surface} in space {space}")]
    UnknownSurface { space: String, surface: String },

    #[error("Unknown sub-surface {sub_surface} on {space}/{surface}")]
    UnknownSubSurface {
        space: String,
        surface: String,
        sub_surface: String,
    },

    #[error("Duplicate space name: {0}")]
    DuplicateSpace(String),

    #[error("Duplicate surface name {surface} in space {space}")]
    DuplicateSurface { space: String, surface: String },
}

pub type Vertex = [f64; 3];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelDocument {
    pub spaces: Vec<SpaceDoc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpaceDoc {
    pub name: String,
    #[serde(default)]
    pub origin: Vertex,
    /// Rotation of the space about +Z, clockwise from north, in degrees
    #[serde(default)]
    pub north_deg: f64,
    #[serde(default)]
    pub surfaces: Vec<SurfaceDoc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceDoc {
    pub name: String,
    pub vertices: Vec<Vertex>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub holes: Vec<Vec<Vertex>>,
    /// Derived from the normal; ignored on input
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surface_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boundary: Option<BoundaryDoc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sub_surfaces: Vec<SubSurfaceDoc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubSurfaceDoc {
    pub name: String,
    pub vertices: Vec<Vertex>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adjacent: Option<SubSurfaceRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubSurfaceRef {
    pub space: String,
    pub surface: String,
    pub sub_surface: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExteriorDoc {
    #[default]
    Outdoors,
    Ground,
    Adiabatic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BoundaryDoc {
    Exterior {
        condition: ExteriorDoc,
    },
    Adjacent {
        space: String,
        surface: String,
        #[serde(default)]
        previous: ExteriorDoc,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolygonDocument {
    pub polygons: Vec<PolygonDoc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolygonDoc {
    pub outer: Vec<Vertex>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub holes: Vec<Vec<Vertex>>,
}

impl From<ExteriorDoc> for ExteriorCondition {
    fn from(doc: ExteriorDoc) -> Self {
        match doc {
            ExteriorDoc::Outdoors => ExteriorCondition::Outdoors,
            ExteriorDoc::Ground => ExteriorCondition::Ground,
            ExteriorDoc::Adiabatic => ExteriorCondition::Adiabatic,
        }
    }
}

impl From<ExteriorCondition> for ExteriorDoc {
    fn from(condition: ExteriorCondition) -> Self {
        match condition {
            ExteriorCondition::Outdoors => ExteriorDoc::Outdoors,
            ExteriorCondition::Ground => ExteriorDoc::Ground,
            ExteriorCondition::Adiabatic => ExteriorDoc::Adiabatic,
        }
    }
}

fn to_points(vertices: &[Vertex]) -> Vec<Point3<f64>> {
    vertices.iter().map(|v| Point3::new(v[0], v[1], v[2])).collect()
}

fn to_vertices(points: &[Point3<f64>]) -> Vec<Vertex> {
    points.iter().map(|p| [p.x, p.y, p.z]).collect()
}

impl From<&PolygonDoc> for Polygon3d {
    fn from(doc: &PolygonDoc) -> Self {
        Polygon3d::with_holes(
            to_points(&doc.outer),
            doc.holes.iter().map(|h| to_points(h)).collect(),
        )
    }
}

impl From<&Polygon3d> for PolygonDoc {
    fn from(polygon: &Polygon3d) -> Self {
        PolygonDoc {
            outer: to_vertices(polygon.outer()),
            holes: polygon.holes().iter().map(|h| to_vertices(h)).collect(),
        }
    }
}

impl PolygonDocument {
    pub fn to_polygons(&self) -> Vec<Polygon3d> {
        self.polygons.iter().map(Polygon3d::from).collect()
    }

    pub fn from_polygons(polygons: &[Polygon3d]) -> Self {
        PolygonDocument {
            polygons: polygons.iter().map(PolygonDoc::from).collect(),
        }
    }
}

/// Local-to-global transformation: rotate about +Z by `-north_deg`, then
/// move to `origin`
fn space_transformation(doc: &SpaceDoc) -> Transformation {
    let [x, y, z] = doc.origin;
    let rotation =
        Transformation::rotation(&Vector3::z(), -doc.north_deg.to_radians()).unwrap_or_default();
    Transformation::translation(&Vector3::new(x, y, z)) * rotation
}

fn surface_ref<'a>(
    ids: &FxHashMap<(&'a str, &'a str), SurfaceId>,
    space: &'a str,
    surface: &'a str,
) -> Result<SurfaceId, DocumentError> {
    ids.get(&(space, surface))
        .copied()
        .ok_or_else(|| DocumentError::UnknownSurface {
            space: space.to_string(),
            surface: surface.to_string(),
        })
}

impl ModelDocument {
    /// Build the space model. Named links are resolved once every surface
    /// has a handle.
    ///
    /// Degenerate surfaces are skipped with a warning, as are links that
    /// point at them. Unknown names and duplicate names are errors.
    pub fn to_spaces(&self) -> Result<Vec<Space>, DocumentError> {
        let mut spaces = Vec::with_capacity(self.spaces.len());
        let mut seen: FxHashSet<&str> = FxHashSet::default();
        let mut surface_ids: FxHashMap<(&str, &str), SurfaceId> = FxHashMap::default();
        let mut sub_ids: FxHashMap<(&str, &str, &str), SubSurfaceId> = FxHashMap::default();
        let mut skipped: FxHashSet<(&str, &str)> = FxHashSet::default();
        // Documents of the surfaces that made it into each space, in order
        let mut kept: Vec<Vec<&SurfaceDoc>> = Vec::with_capacity(self.spaces.len());

        for space_doc in &self.spaces {
            if !seen.insert(space_doc.name.as_str()) {
                return Err(DocumentError::DuplicateSpace(space_doc.name.clone()));
            }
            let mut space = Space::new(space_doc.name.clone(), space_transformation(space_doc));
            let mut space_kept = Vec::with_capacity(space_doc.surfaces.len());

            for surface_doc in &space_doc.surfaces {
                let key = (space_doc.name.as_str(), surface_doc.name.as_str());
                if surface_ids.contains_key(&key) || skipped.contains(&key) {
                    return Err(DocumentError::DuplicateSurface {
                        space: space_doc.name.clone(),
                        surface: surface_doc.name.clone(),
                    });
                }

                let polygon = Polygon3d::with_holes(
                    to_points(&surface_doc.vertices),
                    surface_doc.holes.iter().map(|h| to_points(h)).collect(),
                );
                let mut surface = match Surface::new(surface_doc.name.clone(), polygon) {
                    Ok(surface) => surface,
                    Err(e) => {
                        warn!(space = %space_doc.name, error = %e, "skipping surface");
                        skipped.insert(key);
                        continue;
                    }
                };
                for sub_doc in &surface_doc.sub_surfaces {
                    let id = surface.add_sub_surface(SubSurface::new(
                        sub_doc.name.clone(),
                        to_points(&sub_doc.vertices),
                    ));
                    sub_ids.insert((key.0, key.1, sub_doc.name.as_str()), id);
                }
                surface_ids.insert(key, space.add_surface(surface));
                space_kept.push(surface_doc);
            }
            spaces.push(space);
            kept.push(space_kept);
        }

        for (space, surface_docs) in spaces.iter_mut().zip(&kept) {
            for (surface, surface_doc) in space.surfaces.iter_mut().zip(surface_docs) {
                match &surface_doc.boundary {
                    None => {}
                    Some(BoundaryDoc::Exterior { condition }) => {
                        surface.boundary_condition = BoundaryCondition::Exterior((*condition).into());
                    }
                    Some(BoundaryDoc::Adjacent {
                        space,
                        surface: name,
                        previous,
                    }) => {
                        if skipped.contains(&(space.as_str(), name.as_str())) {
                            warn!(surface = %surface_doc.name, target = %name, "dropping link to skipped surface");
                        } else {
                            surface.boundary_condition = BoundaryCondition::Adjacent {
                                surface: surface_ref(&surface_ids, space, name)?,
                                previous: (*previous).into(),
                            };
                        }
                    }
                }

                for (sub, sub_doc) in surface.sub_surfaces.iter_mut().zip(&surface_doc.sub_surfaces) {
                    let Some(target) = &sub_doc.adjacent else {
                        continue;
                    };
                    if skipped.contains(&(target.space.as_str(), target.surface.as_str())) {
                        warn!(sub_surface = %sub_doc.name, target = %target.surface, "dropping link to skipped surface");
                        continue;
                    }
                    let key = (
                        target.space.as_str(),
                        target.surface.as_str(),
                        target.sub_surface.as_str(),
                    );
                    let id = sub_ids
                        .get(&key)
                        .copied()
                        .ok_or_else(|| DocumentError::UnknownSubSurface {
                            space: target.space.clone(),
                            surface: target.surface.clone(),
                            sub_surface: target.sub_surface.clone(),
                        })?;
                    sub.adjacent = Some(id);
                }
            }
        }

        Ok(spaces)
    }

    /// Write `spaces` back out, keeping the placement of `template` spaces
    /// with the same name
    pub fn from_spaces(spaces: &[Space], template: &ModelDocument) -> Self {
        let mut surface_names: FxHashMap<SurfaceId, (&str, &str)> = FxHashMap::default();
        let mut sub_names: FxHashMap<SubSurfaceId, (&str, &str, &str)> = FxHashMap::default();
        for space in spaces {
            for surface in &space.surfaces {
                surface_names.insert(surface.id, (space.name.as_str(), surface.name.as_str()));
                for sub in &surface.sub_surfaces {
                    sub_names.insert(
                        sub.id,
                        (space.name.as_str(), surface.name.as_str(), sub.name.as_str()),
                    );
                }
            }
        }

        let placements: FxHashMap<&str, &SpaceDoc> =
            template.spaces.iter().map(|s| (s.name.as_str(), s)).collect();

        let spaces = spaces
            .iter()
            .map(|space| {
                let (origin, north_deg) = placements
                    .get(space.name.as_str())
                    .map_or(([0.0; 3], 0.0), |doc| (doc.origin, doc.north_deg));

                let surfaces = space
                    .surfaces
                    .iter()
                    .map(|surface| {
                        let boundary = match surface.boundary_condition {
                            BoundaryCondition::Exterior(condition) => BoundaryDoc::Exterior {
                                condition: condition.into(),
                            },
                            BoundaryCondition::Adjacent { surface, previous } => {
                                match surface_names.get(&surface) {
                                    Some((space, name)) => BoundaryDoc::Adjacent {
                                        space: space.to_string(),
                                        surface: name.to_string(),
                                        previous: previous.into(),
                                    },
                                    // Partner not part of this document
                                    None => BoundaryDoc::Exterior {
                                        condition: previous.into(),
                                    },
                                }
                            }
                        };

                        let sub_surfaces = surface
                            .sub_surfaces
                            .iter()
                            .map(|sub| SubSurfaceDoc {
                                name: sub.name.clone(),
                                vertices: to_vertices(&sub.vertices),
                                adjacent: sub.adjacent.and_then(|id| sub_names.get(&id)).map(
                                    |(space, surface, sub_surface)| SubSurfaceRef {
                                        space: space.to_string(),
                                        surface: surface.to_string(),
                                        sub_surface: sub_surface.to_string(),
                                    },
                                ),
                            })
                            .collect();

                        SurfaceDoc {
                            name: surface.name.clone(),
                            vertices: to_vertices(surface.polygon.outer()),
                            holes: surface.polygon.holes().iter().map(|h| to_vertices(h)).collect(),
                            surface_type: Some(surface.surface_type.to_string()),
                            boundary: Some(boundary),
                            sub_surfaces,
                        }
                    })
                    .collect();

                SpaceDoc {
                    name: space.name.clone(),
                    origin,
                    north_deg,
                    surfaces,
                }
            })
            .collect();

        ModelDocument { spaces }
    }

    pub fn space_index(&self, name: &str) -> Result<usize, DocumentError> {
        self.spaces
            .iter()
            .position(|s| s.name == name)
            .ok_or_else(|| DocumentError::UnknownSpace(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn model_json() -> &'static str {
        r#"{
            "spaces": [
                {
                    "name": "West",
                    "surfaces": [
                        {
                            "name": "West wall",
                            "vertices": [[1,0,0],[1,1,0],[1,1,1],[1,0,1]],
                            "boundary": {"type": "adjacent", "space": "East", "surface": "East wall"}
                        },
                        {
                            "name": "West floor",
                            "vertices": [[1,1,0],[1,0,0],[0,0,0],[0,1,0]]
                        }
                    ]
                },
                {
                    "name": "East",
                    "origin": [1, 0, 0],
                    "north_deg": 90,
                    "surfaces": [
                        {
                            "name": "East wall",
                            "vertices": [[0,0,0],[0,0,1],[0,1,1],[0,1,0]],
                            "boundary": {"type": "adjacent", "space": "West", "surface": "West wall"}
                        }
                    ]
                }
            ]
        }"#
    }

    #[test]
    fn test_links_resolve_by_name() {
        let doc: ModelDocument = serde_json::from_str(model_json()).unwrap();
        let spaces = doc.to_spaces().unwrap();

        let west_wall = &spaces[0].surfaces[0];
        let east_wall = &spaces[1].surfaces[0];
        assert_eq!(west_wall.adjacent_surface(), Some(east_wall.id));
        assert_eq!(east_wall.adjacent_surface(), Some(west_wall.id));
        assert_eq!(
            spaces[0].surfaces[1].boundary_condition,
            BoundaryCondition::Exterior(ExteriorCondition::Ground)
        );
    }

    #[test]
    fn test_space_placement() {
        let doc: ModelDocument = serde_json::from_str(model_json()).unwrap();
        let spaces = doc.to_spaces().unwrap();
        // North 90 deg turns local +X into global -Y
        let p = spaces[1].transformation.apply(&Point3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(p, Point3::new(1.0, -1.0, 0.0), epsilon = 1e-9);
    }

    #[test]
    fn test_written_links_use_names() {
        let doc: ModelDocument = serde_json::from_str(model_json()).unwrap();
        let spaces = doc.to_spaces().unwrap();
        let out = ModelDocument::from_spaces(&spaces, &doc);

        assert_eq!(out.spaces[1].origin, [1.0, 0.0, 0.0]);
        assert_eq!(out.spaces[0].surfaces[0].surface_type.as_deref(), Some("Wall"));
        assert_eq!(
            out.spaces[0].surfaces[0].boundary,
            Some(BoundaryDoc::Adjacent {
                space: "East".into(),
                surface: "East wall".into(),
                previous: ExteriorDoc::Outdoors,
            })
        );
        assert_eq!(
            out.spaces[0].surfaces[1].boundary,
            Some(BoundaryDoc::Exterior {
                condition: ExteriorDoc::Ground
            })
        );

        // Written documents load again
        let again = out.to_spaces().unwrap();
        assert_eq!(again[0].surfaces[0].adjacent_surface(), Some(again[1].surfaces[0].id));
    }

    #[test]
    fn test_unknown_names_are_errors() {
        let mut doc: ModelDocument = serde_json::from_str(model_json()).unwrap();
        doc.spaces[0].surfaces[0].boundary = Some(BoundaryDoc::Adjacent {
            space: "East".into(),
            surface: "Missing".into(),
            previous: ExteriorDoc::Outdoors,
        });
        assert!(matches!(
            doc.to_spaces(),
            Err(DocumentError::UnknownSurface { .. })
        ));
        assert!(matches!(
            doc.space_index("Nowhere"),
            Err(DocumentError::UnknownSpace(_))
        ));

        doc.spaces[1].name = "West".into();
        assert!(matches!(doc.to_spaces(), Err(DocumentError::DuplicateSpace(_))));
    }

    #[test]
    fn test_degenerate_surface_is_skipped() {
        let mut doc: ModelDocument = serde_json::from_str(model_json()).unwrap();
        doc.spaces[1].surfaces[0].vertices = vec![[0.0, 0.0, 0.0], [0.0, 0.5, 0.0], [0.0, 1.0, 0.0]];

        let spaces = doc.to_spaces().unwrap();
        assert_eq!(spaces.len(), 2);
        assert_eq!(spaces[0].surfaces.len(), 2);
        assert!(spaces[1].surfaces.is_empty());
        // The link to the dropped wall goes with it; the floor keeps its own
        assert_eq!(spaces[0].surfaces[0].adjacent_surface(), None);
        assert_eq!(spaces[0].surfaces[1].name, "West floor");
        assert_eq!(
            spaces[0].surfaces[1].boundary_condition,
            BoundaryCondition::Exterior(ExteriorCondition::Ground)
        );
    }

    #[test]
    fn test_links_stay_aligned_after_skip() {
        let mut doc: ModelDocument = serde_json::from_str(model_json()).unwrap();
        let line = SurfaceDoc {
            name: "Line".into(),
            vertices: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0]],
            holes: Vec::new(),
            surface_type: None,
            boundary: Some(BoundaryDoc::Exterior {
                condition: ExteriorDoc::Adiabatic,
            }),
            sub_surfaces: Vec::new(),
        };
        doc.spaces[0].surfaces.insert(0, line);

        let spaces = doc.to_spaces().unwrap();
        assert_eq!(spaces[0].surfaces.len(), 2);
        assert_eq!(spaces[0].surfaces[0].name, "West wall");
        assert_eq!(spaces[0].surfaces[0].adjacent_surface(), Some(spaces[1].surfaces[0].id));
    }

    #[test]
    fn test_duplicate_surface_name_is_an_error() {
        let mut doc: ModelDocument = serde_json::from_str(model_json()).unwrap();
        doc.spaces[0].surfaces[1].name = "West wall".into();
        assert!(matches!(
            doc.to_spaces(),
            Err(DocumentError::DuplicateSurface { .. })
        ));

        // The same name in another space is fine
        let mut doc: ModelDocument = serde_json::from_str(model_json()).unwrap();
        doc.spaces[1].surfaces[0].name = "West wall".into();
        doc.spaces[0].surfaces[0].boundary = Some(BoundaryDoc::Adjacent {
            space: "East".into(),
            surface: "West wall".into(),
            previous: ExteriorDoc::Outdoors,
        });
        assert!(doc.to_spaces().is_ok());
    }

    #[test]
    fn test_polygon_document() {
        let doc: PolygonDocument = serde_json::from_str(
            r#"{"polygons":[{"outer":[[0,0,0],[4,0,0],[4,4,0],[0,4,0]],"holes":[[[1,1,0],[1,2,0],[2,2,0],[2,1,0]]]}]}"#,
        )
        .unwrap();
        let polygons = doc.to_polygons();
        assert_relative_eq!(polygons[0].net_area(), 15.0, epsilon = 1e-9);
        assert_eq!(PolygonDocument::from_polygons(&polygons), doc);
    }
}
