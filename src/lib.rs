//! # BoardKit
//!
//! A hull geometry and CNC toolpath engine for parametric surfboard
//! designs: board specs in, render meshes and outline-cut G-code out.
//!
//! ## Architecture
//!
//! BoardKit is organized as a workspace with multiple crates:
//!
//! 1. **boardkit-core** - Board specs, validation, units, error types
//! 2. **boardkit-geometry** - Curve interpolation, hull lofting, mesh assembly
//! 3. **boardkit-camtools** - Outline toolpath planning, G-code emission
//! 4. **boardkit-export** - Export pipeline, artifact cache, worker pool
//! 5. **boardkit** - Command-line binary that integrates all crates
//!
//! ## Features
//!
//! - **C¹ Profiles**: cubic Hermite outline and rocker interpolation
//! - **Watertight Lofting**: elliptical cross-sections, welded tip fans
//! - **Cutter Compensation**: radius offset with under-cut detection
//! - **Deterministic G-code**: byte-identical output for identical input

use std::fs;
use std::path::Path;

pub use boardkit_camtools::{
    export_filename, FlagReason, FlaggedRegion, GcodeEmitter, MoveType, PlannerConfig,
    ToolpathPlan, ToolpathPlanner, Waypoint,
};
pub use boardkit_core::{
    BoardDimensions, BoardSpec, CutterParams, Error, GeometryError, Result, ToolpathError,
    Units, ValidationError,
};
pub use boardkit_export::{
    export_outline_gcode, render_mesh, ExportCache, GcodeExport, Stage, WorkerPool,
};
pub use boardkit_geometry::{
    HullLoftingEngine, LoftConfig, MeshAssembler, OutlineCurve, RockerProfile, SurfaceMesh,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

const USAGE: &str = "\
Usage:
  boardkit mesh <board.json> [out.json]
  boardkit gcode <board.json> <cutter_diameter_mm> <feed_rate> [out.cnc]";

/// Initialize logging with the default configuration
///
/// Sets up structured logging with:
/// - Console output to stderr
/// - RUST_LOG environment variable support
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    Ok(())
}

/// Runs one CLI invocation. `args` excludes the program name.
pub fn run(args: &[String]) -> anyhow::Result<()> {
    match args.first().map(String::as_str) {
        Some("mesh") => run_mesh(&args[1..]),
        Some("gcode") => run_gcode(&args[1..]),
        Some(other) => anyhow::bail!("unknown command '{}'\n{}", other, USAGE),
        None => anyhow::bail!("{}", USAGE),
    }
}

fn run_mesh(args: &[String]) -> anyhow::Result<()> {
    let [spec_path, rest @ ..] = args else {
        anyhow::bail!("mesh: missing <board.json>\n{}", USAGE);
    };
    let spec = load_spec(spec_path)?;
    let mesh = boardkit_export::render_mesh(&spec, &LoftConfig::default())?;
    let json = serde_json::to_string_pretty(&mesh)?;

    match rest.first() {
        Some(out_path) => {
            fs::write(out_path, json)?;
            tracing::info!(
                board = %spec.name,
                vertices = mesh.vertices.len(),
                triangles = mesh.triangles.len(),
                out = %out_path,
                "wrote mesh"
            );
        }
        None => println!("{}", json),
    }
    Ok(())
}

fn run_gcode(args: &[String]) -> anyhow::Result<()> {
    let [spec_path, diameter, feed, rest @ ..] = args else {
        anyhow::bail!(
            "gcode: expected <board.json> <cutter_diameter_mm> <feed_rate>\n{}",
            USAGE
        );
    };
    let spec = load_spec(spec_path)?;
    let cutter = CutterParams {
        cutter_diameter: diameter
            .parse()
            .map_err(|e| anyhow::anyhow!("bad cutter diameter '{}': {}", diameter, e))?,
        feed_rate: feed
            .parse()
            .map_err(|e| anyhow::anyhow!("bad feed rate '{}': {}", feed, e))?,
    };

    let export = boardkit_export::export_outline_gcode(&spec, &cutter, &PlannerConfig::default())?;
    for region in &export.flagged {
        tracing::warn!(
            board = %spec.name,
            station_start = region.station_start,
            station_end = region.station_end,
            "under-cut region left uncut"
        );
    }

    let out_path = rest
        .first()
        .cloned()
        .unwrap_or_else(|| export.filename.clone());
    fs::write(&out_path, &export.content)?;
    tracing::info!(board = %spec.name, out = %out_path, "wrote outline program");
    Ok(())
}

fn load_spec(path: impl AsRef<Path>) -> anyhow::Result<BoardSpec> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("cannot read {}: {}", path.display(), e))?;
    let spec: BoardSpec = serde_json::from_str(&text)
        .map_err(|e| anyhow::anyhow!("{} is not a valid board spec: {}", path.display(), e))?;
    Ok(spec)
}
