//! # BoardKit Export
//!
//! Session-level plumbing around the geometry and CAM pipelines:
//!
//! - **`pipeline`** — staged, pure export functions (`render_mesh`,
//!   `export_outline_gcode`)
//! - **`cache`** — content-hash memoization of finished artifacts
//!   (`ExportCache`)
//! - **`pool`** — bounded worker threads with per-job result handles
//!   (`WorkerPool`)
//!
//! Nothing here touches disk or network; callers own persistence and
//! transport.

pub mod cache;
pub mod pipeline;
pub mod pool;

pub use cache::{ArtifactCache, ExportCache};
pub use pipeline::{export_outline_gcode, render_mesh, GcodeExport, Stage};
pub use pool::{JobHandle, WorkerPool};
