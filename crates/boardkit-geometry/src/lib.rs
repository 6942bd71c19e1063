//! # BoardKit Geometry
//!
//! The display-side pipeline: parametric board spec in, render buffers out.
//!
//! - **`curve`** — C¹ profile interpolation (`OutlineCurve`,
//!   `RockerProfile`)
//! - **`loft`** — cross-section ring construction and stitching
//!   (`HullLoftingEngine`)
//! - **`mesh`** — vertex welding, normals, render buffers
//!   (`MeshAssembler`, `SurfaceMesh`)
//!
//! The pipeline is a pure function of its `BoardSpec` input: no module
//! state, no side effects, safe to run concurrently per request.

pub mod curve;
pub mod loft;
pub mod mesh;

pub use curve::{OutlineCurve, ProfileCurve, RockerProfile};
pub use loft::{triangle_area, CrossSectionRing, HullLoftingEngine, LoftConfig, LoftTriangle};
pub use mesh::{MeshAssembler, SurfaceMesh};
