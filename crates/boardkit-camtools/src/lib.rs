//! # BoardKit CAM Tools
//!
//! Machine-side pipeline: board spec in, outline-cut G-code out.
//!
//! - **`planner`** — cutter-radius offset of the planform, under-cut
//!   detection, waypoint ordering (`ToolpathPlanner`)
//! - **`gcode`** — deterministic program serialization (`GcodeEmitter`)
//!
//! The split mirrors the geometry crate: planning is pure computation
//! over validated inputs, emission is pure formatting over a plan.

pub mod gcode;
pub mod planner;

pub use gcode::{export_filename, GcodeEmitter};
pub use planner::{
    FlagReason, FlaggedRegion, MoveType, OffsetContour, PlannerConfig, ToolpathPlan,
    ToolpathPlanner, Waypoint,
};
