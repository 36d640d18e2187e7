// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for space-level operations.

/// Result type alias for space operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while intersecting or matching spaces.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An underlying geometry call rejected its input.
    #[error(transparent)]
    Geometry(#[from] plangeo_geometry::Error),

    /// A surface was built from a loop without a defined plane.
    #[error("surface '{0}' has no outward normal (fewer than 3 distinct vertices or zero area)")]
    DegenerateSurface(String),

    /// A space index is out of range.
    #[error("space index {index} out of range for {len} spaces")]
    SpaceIndex { index: usize, len: usize },

    /// A pairwise operation was asked to pair a space with itself.
    #[error("cannot pair space {0} with itself")]
    SameSpace(usize),
}
