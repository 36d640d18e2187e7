// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Plangeo Spaces
//!
//! Adjacency reasoning over building spaces. Each space holds surfaces in
//! its own frame; operations here bring them into the global frame, split
//! surfaces along shared regions, link mirror surfaces across spaces and
//! answer floor-print and exposed-perimeter queries.
//!
//! Every value is a snapshot owned by the caller. Nothing is cached between
//! calls, so independent space pairs can be processed on separate threads.

pub mod batch;
pub mod error;
pub mod footprint;
pub mod intersect;
pub mod matching;
pub mod model;

pub use batch::{intersect_all, intersect_pair, match_all, match_pair, unmatch_space};
pub use error::{Error, Result};
pub use footprint::{floor_print, perimeter};
pub use intersect::intersect_surfaces;
pub use matching::{match_surfaces, unmatch_surfaces};
pub use model::{
    BoundaryCondition, ExteriorCondition, Space, SubSurface, SubSurfaceId, Surface, SurfaceId,
    SurfaceType,
};
