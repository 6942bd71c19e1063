//! Export pipeline
//!
//! Pure functions over an immutable `BoardSpec` snapshot. Each export runs
//! the full stage sequence on every call; stage transitions are logged but
//! carry no state between calls, so a failed export leaves nothing behind.

use boardkit_camtools::{
    export_filename, FlaggedRegion, GcodeEmitter, PlannerConfig, ToolpathPlanner,
};
use boardkit_core::{BoardSpec, CutterParams, Result};
use boardkit_geometry::{HullLoftingEngine, LoftConfig, MeshAssembler, SurfaceMesh};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

/// Where an export request is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Request received, nothing computed.
    Idle,
    /// Input validation in progress.
    Validating,
    /// Cross-sections built and stitched into a triangle soup.
    Lofted,
    /// Cutter-center contour computed.
    OffsetComputed,
    /// Render buffers assembled from the soup.
    Assembled,
    /// Waypoints ordered into a machine-ready plan.
    Ordered,
    /// Program text produced.
    Emitted,
    /// Terminal: the request was rejected.
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Validating => "validating",
            Self::Lofted => "lofted",
            Self::OffsetComputed => "offset_computed",
            Self::Assembled => "assembled",
            Self::Ordered => "ordered",
            Self::Emitted => "emitted",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// A finished G-code export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GcodeExport {
    /// Suggested download filename (`<board-name>_outline.cnc`).
    pub filename: String,
    /// Complete program text.
    pub content: String,
    /// Under-cut regions the planner flagged, if any.
    pub flagged: Vec<FlaggedRegion>,
}

/// Lofts a board spec into render buffers.
pub fn render_mesh(spec: &BoardSpec, config: &LoftConfig) -> Result<SurfaceMesh> {
    let mut stage = Stage::Idle;
    let result = (|| {
        enter(&mut stage, Stage::Validating, spec);
        spec.validate()?;

        let soup = HullLoftingEngine::new(*config).loft(spec)?;
        enter(&mut stage, Stage::Lofted, spec);

        let mesh = MeshAssembler::default().assemble(&soup)?;
        enter(&mut stage, Stage::Assembled, spec);
        Ok(mesh)
    })();

    match result {
        Ok(mesh) => {
            enter(&mut stage, Stage::Emitted, spec);
            Ok(mesh)
        }
        Err(e) => fail(stage, spec, e),
    }
}

/// Plans and serializes an outline cut for a board spec.
pub fn export_outline_gcode(
    spec: &BoardSpec,
    cutter: &CutterParams,
    config: &PlannerConfig,
) -> Result<GcodeExport> {
    let mut stage = Stage::Idle;
    let result = (|| {
        enter(&mut stage, Stage::Validating, spec);
        spec.validate()?;
        cutter.validate()?;

        let planner = ToolpathPlanner::new(*config);
        let contour = planner.offset_contour(spec, cutter.cutter_diameter / 2.0)?;
        enter(&mut stage, Stage::OffsetComputed, spec);

        let plan = planner.order(contour, cutter);
        enter(&mut stage, Stage::Ordered, spec);

        let content = GcodeEmitter::default().emit(&plan, &spec.name)?;
        Ok(GcodeExport {
            filename: export_filename(&spec.name),
            content,
            flagged: plan.flagged,
        })
    })();

    match result {
        Ok(export) => {
            enter(&mut stage, Stage::Emitted, spec);
            Ok(export)
        }
        Err(e) => fail(stage, spec, e),
    }
}

fn enter(stage: &mut Stage, next: Stage, spec: &BoardSpec) {
    debug!(board = %spec.name, from = %stage, to = %next, "export stage");
    *stage = next;
}

fn fail<T>(
    reached: Stage,
    spec: &BoardSpec,
    error: boardkit_core::Error,
) -> Result<T> {
    warn!(
        board = %spec.name,
        reached = %reached,
        stage = %Stage::Failed,
        error = %error,
        "export failed"
    );
    Err(error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use boardkit_core::BoardDimensions;

    fn spec() -> BoardSpec {
        BoardSpec::new(
            "pipeline-test",
            BoardDimensions {
                length: 2000.0,
                width: 360.0,
                thickness: 60.0,
            },
            vec![
                (0.0, 0.0),
                (500.0, 150.0),
                (1000.0, 180.0),
                (1500.0, 150.0),
                (2000.0, 0.0),
            ],
            None,
        )
    }

    #[test]
    fn test_render_mesh_produces_buffers() {
        let mesh = render_mesh(&spec(), &LoftConfig::default()).unwrap();
        mesh.check().unwrap();
        assert!(!mesh.triangles.is_empty());
    }

    #[test]
    fn test_gcode_export_names_the_file_after_the_board() {
        let export = export_outline_gcode(
            &spec(),
            &CutterParams {
                cutter_diameter: 12.7,
                feed_rate: 1200.0,
            },
            &PlannerConfig::default(),
        )
        .unwrap();
        assert_eq!(export.filename, "pipeline-test_outline.cnc");
        assert!(export.content.ends_with("M30\n"));
        assert!(export.flagged.is_empty());
    }

    #[test]
    fn test_invalid_spec_fails_before_any_geometry() {
        let mut bad = spec();
        bad.dimensions.length = -1.0;
        let err = render_mesh(&bad, &LoftConfig::default()).unwrap_err();
        assert!(err.is_validation_error());

        let err = export_outline_gcode(
            &bad,
            &CutterParams {
                cutter_diameter: 12.7,
                feed_rate: 1200.0,
            },
            &PlannerConfig::default(),
        )
        .unwrap_err();
        assert!(err.is_validation_error());
    }

    #[test]
    fn test_stage_serialization() {
        assert_eq!(
            serde_json::to_string(&Stage::OffsetComputed).unwrap(),
            "\"offset_computed\""
        );
    }
}
