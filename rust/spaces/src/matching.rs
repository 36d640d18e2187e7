// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Link mirror surfaces of adjacent spaces
//!
//! Two surfaces match when their cleaned global outer loops describe the
//! same region with opposite winding. Matched surfaces switch to an
//! adjacent boundary condition that remembers the exterior condition it
//! replaced, so unmatching restores the state exactly.

use nalgebra::Point3;
use plangeo_geometry::error::check_tolerance;
use plangeo_geometry::{circular_equal, reverse_loop, Polygon3d};
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::error::Result;
use crate::model::{BoundaryCondition, Space, SubSurface, Surface, SurfaceId};

/// Link every unmatched surface of `a` with its mirror in `b`, sub-surfaces
/// included. Returns the number of surface pairs linked.
pub fn match_surfaces(a: &mut Space, b: &mut Space, tolerance: f64) -> Result<usize> {
    check_tolerance(tolerance)?;

    let loops_a = cleaned_loops(a, tolerance);
    let loops_b = cleaned_loops(b, tolerance);
    let mut linked = 0;

    for (i, loop_a) in loops_a.iter().enumerate() {
        let Some(loop_a) = loop_a else { continue };
        if a.surfaces[i].is_matched() {
            continue;
        }

        for (j, loop_b) in loops_b.iter().enumerate() {
            let Some(loop_b) = loop_b else { continue };
            if b.surfaces[j].is_matched() {
                continue;
            }
            if !circular_equal(loop_a, &reverse_loop(loop_b), tolerance) {
                continue;
            }

            debug!(
                surface_a = %a.surfaces[i].name,
                surface_b = %b.surfaces[j].name,
                "matched surfaces"
            );
            link_surfaces(&mut a.surfaces[i], &mut b.surfaces[j]);

            let subs_a = global_sub_loops(a, i, tolerance);
            let subs_b = global_sub_loops(b, j, tolerance);
            match_sub_surfaces(
                &mut a.surfaces[i].sub_surfaces,
                &subs_a,
                &mut b.surfaces[j].sub_surfaces,
                &subs_b,
                tolerance,
            );

            linked += 1;
            break;
        }
    }

    Ok(linked)
}

/// Remove every link held by `space`, along with the partner end found in
/// `others`, restoring the previous exterior conditions. Returns the number
/// of surfaces of `space` that were unlinked.
pub fn unmatch_surfaces<'a>(
    space: &mut Space,
    others: impl IntoIterator<Item = &'a mut Space>,
) -> usize {
    let mut partners: FxHashMap<SurfaceId, SurfaceId> = FxHashMap::default();
    for surface in &mut space.surfaces {
        if let Some(partner) = surface.adjacent_surface() {
            partners.insert(partner, surface.id);
            unlink_surface(surface);
        }
    }

    for other in others {
        for surface in &mut other.surfaces {
            let Some(&ours) = partners.get(&surface.id) else {
                continue;
            };
            if surface.adjacent_surface() == Some(ours) {
                unlink_surface(surface);
            }
        }
    }

    partners.len()
}

fn cleaned_loops(space: &Space, tolerance: f64) -> Vec<Option<Vec<Point3<f64>>>> {
    space
        .surfaces
        .iter()
        .map(|s| {
            space
                .global_polygon(s)
                .cleaned(tolerance)
                .map(|p| p.into_parts().0)
        })
        .collect()
}

fn global_sub_loops(
    space: &Space,
    surface: usize,
    tolerance: f64,
) -> Vec<Option<Vec<Point3<f64>>>> {
    space.surfaces[surface]
        .sub_surfaces
        .iter()
        .map(|sub| {
            Polygon3d::new(space.transformation.apply_loop(&sub.vertices))
                .cleaned(tolerance)
                .map(|p| p.into_parts().0)
        })
        .collect()
}

fn match_sub_surfaces(
    subs_a: &mut [SubSurface],
    loops_a: &[Option<Vec<Point3<f64>>>],
    subs_b: &mut [SubSurface],
    loops_b: &[Option<Vec<Point3<f64>>>],
    tolerance: f64,
) {
    for (i, loop_a) in loops_a.iter().enumerate() {
        let Some(loop_a) = loop_a else { continue };
        if subs_a[i].is_matched() {
            continue;
        }
        for (j, loop_b) in loops_b.iter().enumerate() {
            let Some(loop_b) = loop_b else { continue };
            if subs_b[j].is_matched() {
                continue;
            }
            if circular_equal(loop_a, &reverse_loop(loop_b), tolerance) {
                subs_a[i].adjacent = Some(subs_b[j].id);
                subs_b[j].adjacent = Some(subs_a[i].id);
                break;
            }
        }
    }
}

fn link_surfaces(a: &mut Surface, b: &mut Surface) {
    a.boundary_condition = BoundaryCondition::Adjacent {
        surface: b.id,
        previous: a.boundary_condition.exterior_condition(),
    };
    b.boundary_condition = BoundaryCondition::Adjacent {
        surface: a.id,
        previous: b.boundary_condition.exterior_condition(),
    };
}

fn unlink_surface(surface: &mut Surface) {
    surface.boundary_condition =
        BoundaryCondition::Exterior(surface.boundary_condition.exterior_condition());
    for sub in &mut surface.sub_surfaces {
        sub.adjacent = None;
    }
}
