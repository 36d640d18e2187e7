// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Split the surfaces of two spaces along their shared regions
//!
//! Every unmatched surface of one space is intersected with every unmatched
//! surface of the other. When a pair overlaps partially, both surfaces are
//! replaced by their pieces so the shared region becomes a surface of its
//! own on each side, ready for matching. The loop restarts after each split
//! until no pair splits any more.

use plangeo_geometry::{intersect, Polygon3d, Transformation};
use rustc_hash::FxHashSet;
use tracing::{debug, warn};

use crate::error::Result;
use crate::model::{Space, Surface, SurfaceId};

/// Upper bound on splits for one pair of spaces
const MAX_SPLITS: usize = 10_000;

/// Intersect the surfaces of two spaces in place. Returns the number of
/// surface pairs that were split.
pub fn intersect_surfaces(a: &mut Space, b: &mut Space, tolerance: f64) -> Result<usize> {
    let mut splits = 0;

    while splits < MAX_SPLITS {
        if !split_first_pair(a, b, tolerance)? {
            return Ok(splits);
        }
        splits += 1;
    }

    warn!(space_a = %a.name, space_b = %b.name, "giving up after {MAX_SPLITS} splits");
    Ok(splits)
}

/// Find the first surface pair that needs splitting and split it
fn split_first_pair(a: &mut Space, b: &mut Space, tolerance: f64) -> Result<bool> {
    for i in 0..a.surfaces.len() {
        if a.surfaces[i].is_matched() {
            continue;
        }
        let polygon_a = a.global_polygon(&a.surfaces[i]);

        for j in 0..b.surfaces.len() {
            if b.surfaces[j].is_matched() {
                continue;
            }
            let polygon_b = b.global_polygon(&b.surfaces[j]);

            let Some(result) = intersect(&polygon_a, &polygon_b, tolerance)? else {
                continue;
            };
            if result.is_trivial() {
                continue;
            }

            let pieces_a = split_surface(
                &a.surfaces[i],
                &a.surfaces,
                &a.transformation,
                &result.overlap_a,
                &result.remainder_a,
                tolerance,
            );
            let pieces_b = split_surface(
                &b.surfaces[j],
                &b.surfaces,
                &b.transformation,
                &result.overlap_b,
                &result.remainder_b,
                tolerance,
            );

            let (Some(pieces_a), Some(pieces_b)) = (pieces_a, pieces_b) else {
                warn!(
                    surface_a = %a.surfaces[i].name,
                    surface_b = %b.surfaces[j].name,
                    "split would cut a sub-surface, skipping pair"
                );
                continue;
            };

            debug!(
                surface_a = %a.surfaces[i].name,
                surface_b = %b.surfaces[j].name,
                pieces_a = pieces_a.len(),
                pieces_b = pieces_b.len(),
                "split surface pair"
            );
            a.surfaces.splice(i..=i, pieces_a);
            b.surfaces.splice(j..=j, pieces_b);
            return Ok(true);
        }
    }

    Ok(false)
}

/// Replace `surface` by the given global pieces, overlap pieces first.
///
/// A surface with a single overlap piece and no remainder is returned
/// unchanged. The first piece keeps the surface's id and name; the others
/// get numbered names unused among `siblings`. Every sub-surface moves to
/// the piece containing it. Returns `None` when a sub-surface fits in no
/// piece.
fn split_surface(
    surface: &Surface,
    siblings: &[Surface],
    to_global: &Transformation,
    overlaps: &[Polygon3d],
    remainders: &[Polygon3d],
    tolerance: f64,
) -> Option<Vec<Surface>> {
    if overlaps.len() == 1 && remainders.is_empty() {
        return Some(vec![surface.clone()]);
    }

    let to_local = to_global.inverse();
    let polygons: Vec<Polygon3d> = overlaps
        .iter()
        .chain(remainders)
        .map(|p| p.transformed(&to_local))
        .collect();

    let taken: FxHashSet<&str> = siblings.iter().map(|s| s.name.as_str()).collect();
    let mut suffix = 0;
    let mut pieces: Vec<Surface> = Vec::with_capacity(polygons.len());
    for (k, polygon) in polygons.into_iter().enumerate() {
        let (id, name) = if k == 0 {
            (surface.id, surface.name.clone())
        } else {
            let name = loop {
                suffix += 1;
                let candidate = format!("{} {}", surface.name, suffix);
                if !taken.contains(candidate.as_str()) {
                    break candidate;
                }
            };
            (SurfaceId::new(), name)
        };
        pieces.push(Surface {
            id,
            name,
            surface_type: surface.surface_type,
            polygon,
            boundary_condition: surface.boundary_condition,
            sub_surfaces: Vec::new(),
        });
    }

    for sub in &surface.sub_surfaces {
        let host = pieces
            .iter_mut()
            .find(|piece| piece.polygon.contains_loop(&sub.vertices, tolerance))?;
        host.sub_surfaces.push(sub.clone());
    }

    Some(pieces)
}
