// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Plangeo Geometry
//!
//! Planar polygon engine for building floor plans: Newell normals and plane
//! frames, polygons with holes, tolerance-aware boolean operations on top of
//! i_overlay, spike removal and footprint edge overlap.

pub mod bbox;
pub mod boolean;
pub mod contour;
pub mod error;
pub mod overlap;
pub mod plane;
pub mod point;
pub mod polygon;
pub mod snap;
pub mod spikes;
pub mod transform;

// Re-export nalgebra types for convenience
pub use nalgebra::{Point2, Point3, Vector2, Vector3};

pub use bbox::BoundingBox;
pub use boolean::{intersect, join, join_all, subtract, Intersection};
pub use contour::{Contour, Shape2D};
pub use error::{Error, Result};
pub use overlap::{exposed_length, segment_overlap};
pub use plane::{newell_vector, outward_normal, Plane, NORMAL_TOLERANCE};
pub use point::{circular_equal, reverse_loop, DEFAULT_TOLERANCE};
pub use polygon::{Polygon3d, Winding};
pub use spikes::remove_spikes;
pub use transform::Transformation;
