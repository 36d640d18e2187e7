// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! plangeo - floor-plan geometry from the command line.
//!
//! Reads a JSON document from `--input` (or stdin), runs one operation and
//! writes JSON to `--output` (or stdout). Logs go to stderr.
//!
//! # Commands
//!
//! - `intersect` - split surfaces of adjacent spaces along shared regions
//! - `match` - link mirror surfaces (`--intersect` splits first)
//! - `unmatch --space NAME` - remove the links held by one space
//! - `union` - join a polygon document
//! - `floor-print` - union of ground floors across spaces
//! - `exposed-perimeter` - per-space floor edges on the floor print boundary
//! - `perimeter` - outer perimeter of a joined polygon document

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;
use serde::Serialize;

mod commands;
mod config;
mod document;

use config::Config;
use document::{ModelDocument, PolygonDocument};

#[derive(Parser)]
#[command(name = "plangeo")]
#[command(about = "Planar polygon geometry for building floor plans")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Input JSON document (default: stdin)
    #[arg(short, long, global = true)]
    input: Option<PathBuf>,

    /// Output JSON file (default: stdout)
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Length tolerance (overrides PLANGEO_TOLERANCE)
    #[arg(short, long, global = true)]
    tolerance: Option<f64>,

    /// Ground floor elevation (overrides PLANGEO_FLOOR_ELEVATION)
    #[arg(short, long, global = true)]
    elevation: Option<f64>,

    /// Worker threads (overrides WORKER_THREADS)
    #[arg(long, global = true)]
    threads: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Split surfaces of adjacent spaces along their shared regions
    Intersect,
    /// Link mirror surfaces across spaces
    Match {
        /// Intersect surfaces before matching
        #[arg(long)]
        intersect: bool,
    },
    /// Remove every link held by one space
    Unmatch {
        /// Name of the space to unlink
        #[arg(short, long)]
        space: String,
    },
    /// Join the polygons of a polygon document
    Union,
    /// Union of downward-facing floors at the ground elevation
    FloorPrint,
    /// Floor edges of each space lying on the floor print boundary
    ExposedPerimeter,
    /// Outer perimeter of the joined polygons
    Perimeter,
}

fn read_document<T: DeserializeOwned>(input: Option<&Path>) -> Result<T> {
    match input {
        Some(path) => {
            let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
            serde_json::from_reader(BufReader::new(file))
                .with_context(|| format!("Failed to parse {}", path.display()))
        }
        None => {
            let mut text = String::new();
            io::stdin().read_to_string(&mut text).context("Failed to read stdin")?;
            serde_json::from_str(&text).context("Failed to parse stdin")
        }
    }
}

fn write_document<T: Serialize>(output: Option<&Path>, value: &T) -> Result<()> {
    match output {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, value)?;
            writer.flush()?;
        }
        None => {
            let mut stdout = io::stdout().lock();
            serde_json::to_writer_pretty(&mut stdout, value)?;
            writeln!(stdout)?;
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env().with_overrides(cli.tolerance, cli.elevation, cli.threads);

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(config.log_filter.as_str())
        .with_writer(io::stderr)
        .init();

    tracing::debug!(
        tolerance = config.tolerance,
        floor_elevation = config.floor_elevation,
        worker_threads = config.worker_threads,
        "Starting plangeo"
    );

    // Initialize rayon thread pool
    rayon::ThreadPoolBuilder::new()
        .num_threads(config.worker_threads)
        .build_global()
        .context("Failed to initialize rayon thread pool")?;

    let input = cli.input.as_deref();
    let output = cli.output.as_deref();
    let tolerance = config.tolerance;
    let elevation = config.floor_elevation;

    match cli.command {
        Commands::Intersect => {
            let doc: ModelDocument = read_document(input)?;
            write_document(output, &commands::intersect(&doc, tolerance)?)
        }
        Commands::Match { intersect } => {
            let doc: ModelDocument = read_document(input)?;
            write_document(output, &commands::match_spaces(&doc, tolerance, intersect)?)
        }
        Commands::Unmatch { space } => {
            let doc: ModelDocument = read_document(input)?;
            write_document(output, &commands::unmatch(&doc, &space)?)
        }
        Commands::Union => {
            let doc: PolygonDocument = read_document(input)?;
            write_document(output, &commands::union(&doc, tolerance)?)
        }
        Commands::FloorPrint => {
            let doc: ModelDocument = read_document(input)?;
            write_document(output, &commands::floor_print(&doc, elevation, tolerance)?)
        }
        Commands::ExposedPerimeter => {
            let doc: ModelDocument = read_document(input)?;
            write_document(output, &commands::exposed_perimeter(&doc, elevation, tolerance)?)
        }
        Commands::Perimeter => {
            let doc: PolygonDocument = read_document(input)?;
            write_document(output, &commands::perimeter(&doc, tolerance)?)
        }
    }
}
