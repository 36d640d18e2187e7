// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Result type for geometry operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during geometry processing
///
/// Most degenerate inputs are expected in large batches and are reported as
/// `None` plus a warning instead. These variants cover caller mistakes and
/// explicit validation requests.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Invalid tolerance: {0} (must be finite and positive)")]
    InvalidTolerance(f64),

    #[error("Degenerate loop: {0} effective vertices after de-duplication")]
    DegenerateLoop(usize),

    #[error("Loop is not planar: vertex {index} is {distance} from the plane")]
    NonCoplanar { index: usize, distance: f64 },
}

/// Reject tolerances that would make every comparison meaningless
pub fn check_tolerance(tolerance: f64) -> Result<()> {
    if tolerance.is_finite() && tolerance > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidTolerance(tolerance))
    }
}
