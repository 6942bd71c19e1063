//! # BoardKit Core
//!
//! Core types shared by every BoardKit crate:
//!
//! - **Board model**: `BoardSpec`, `BoardDimensions`, `CutterParams` — the
//!   immutable inputs both engine pipelines derive their artifacts from
//! - **Units**: metric/imperial selection for the G-code boundary
//! - **Errors**: the `ValidationError` / `GeometryError` / `ToolpathError`
//!   taxonomy and the unified `Error` / `Result` pair

pub mod board;
pub mod error;
pub mod units;

pub use board::{BoardDimensions, BoardSpec, CutterParams, TIP_TOLERANCE};
pub use error::{Error, GeometryError, Result, ToolpathError, ValidationError};
pub use units::{inch_to_mm, mm_to_inch, Units};
