// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Pairwise operations over a whole set of spaces
//!
//! Space bounding boxes are computed in parallel and used to skip pairs
//! that cannot touch. The pairwise work itself mutates both spaces of a
//! pair and runs sequentially.

use plangeo_geometry::error::check_tolerance;
use plangeo_geometry::BoundingBox;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::intersect::intersect_surfaces;
use crate::matching::{match_surfaces, unmatch_surfaces};
use crate::model::Space;

/// Index pairs `(i, j)`, `i < j`, whose bounding boxes touch within tolerance
fn candidate_pairs(spaces: &[Space], tolerance: f64) -> Vec<(usize, usize)> {
    let boxes: Vec<Option<BoundingBox>> = spaces.par_iter().map(|s| s.bounding_box()).collect();

    let mut pairs = Vec::new();
    for i in 0..boxes.len() {
        for j in (i + 1)..boxes.len() {
            match (&boxes[i], &boxes[j]) {
                (Some(a), Some(b)) if a.intersects(b, tolerance) => pairs.push((i, j)),
                _ => debug!(a = %spaces[i].name, b = %spaces[j].name, "pruned space pair"),
            }
        }
    }
    pairs
}

/// Mutable access to two distinct spaces
fn pair_mut(spaces: &mut [Space], i: usize, j: usize) -> Result<(&mut Space, &mut Space)> {
    let len = spaces.len();
    for index in [i, j] {
        if index >= len {
            return Err(Error::SpaceIndex { index, len });
        }
    }
    if i == j {
        return Err(Error::SameSpace(i));
    }

    if i < j {
        let (left, right) = spaces.split_at_mut(j);
        Ok((&mut left[i], &mut right[0]))
    } else {
        let (left, right) = spaces.split_at_mut(i);
        Ok((&mut right[0], &mut left[j]))
    }
}

/// Intersect the surfaces of spaces `i` and `j`
pub fn intersect_pair(spaces: &mut [Space], i: usize, j: usize, tolerance: f64) -> Result<usize> {
    let (a, b) = pair_mut(spaces, i, j)?;
    intersect_surfaces(a, b, tolerance)
}

/// Match the surfaces of spaces `i` and `j`
pub fn match_pair(spaces: &mut [Space], i: usize, j: usize, tolerance: f64) -> Result<usize> {
    let (a, b) = pair_mut(spaces, i, j)?;
    match_surfaces(a, b, tolerance)
}

/// Intersect every pair of spaces. Returns the total number of splits.
pub fn intersect_all(spaces: &mut [Space], tolerance: f64) -> Result<usize> {
    check_tolerance(tolerance)?;

    let pairs = candidate_pairs(spaces, tolerance);
    let mut splits = 0;
    for (i, j) in &pairs {
        splits += intersect_pair(spaces, *i, *j, tolerance)?;
    }

    info!(spaces = spaces.len(), pairs = pairs.len(), splits, "intersected spaces");
    Ok(splits)
}

/// Match every pair of spaces. Returns the number of linked surface pairs.
pub fn match_all(spaces: &mut [Space], tolerance: f64) -> Result<usize> {
    check_tolerance(tolerance)?;

    let pairs = candidate_pairs(spaces, tolerance);
    let mut linked = 0;
    for (i, j) in &pairs {
        linked += match_pair(spaces, *i, *j, tolerance)?;
    }

    info!(spaces = spaces.len(), pairs = pairs.len(), linked, "matched spaces");
    Ok(linked)
}

/// Unmatch space `index` against every other space
pub fn unmatch_space(spaces: &mut [Space], index: usize) -> Result<usize> {
    let len = spaces.len();
    if index >= len {
        return Err(Error::SpaceIndex { index, len });
    }

    let (before, rest) = spaces.split_at_mut(index);
    let Some((space, after)) = rest.split_first_mut() else {
        return Err(Error::SpaceIndex { index, len });
    };
    let unlinked = unmatch_surfaces(space, before.iter_mut().chain(after.iter_mut()));

    info!(space = %space.name, unlinked, "unmatched space");
    Ok(unlinked)
}
