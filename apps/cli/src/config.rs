// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Run configuration loaded from environment variables.

/// CLI configuration. Command-line flags override these values.
#[derive(Debug, Clone)]
pub struct Config {
    /// Length tolerance in model units.
    pub tolerance: f64,
    /// Elevation of the ground floor for floor-print queries.
    pub floor_elevation: f64,
    /// Number of worker threads for parallel processing.
    pub worker_threads: usize,
    /// Default tracing filter when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            tolerance: std::env::var("PLANGEO_TOLERANCE")
                .unwrap_or_else(|_| "0.01".into())
                .parse()
                .unwrap_or(0.01),
            floor_elevation: std::env::var("PLANGEO_FLOOR_ELEVATION")
                .unwrap_or_else(|_| "0".into())
                .parse()
                .unwrap_or(0.0),
            worker_threads: std::env::var("WORKER_THREADS")
                .unwrap_or_else(|_| num_cpus::get().to_string())
                .parse()
                .unwrap_or_else(|_| num_cpus::get()),
            log_filter: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        }
    }

    /// Apply command-line overrides
    pub fn with_overrides(
        mut self,
        tolerance: Option<f64>,
        floor_elevation: Option<f64>,
        worker_threads: Option<usize>,
    ) -> Self {
        if let Some(tolerance) = tolerance {
            self.tolerance = tolerance;
        }
        if let Some(elevation) = floor_elevation {
            self.floor_elevation = elevation;
        }
        if let Some(threads) = worker_threads {
            self.worker_threads = threads.max(1);
        }
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
