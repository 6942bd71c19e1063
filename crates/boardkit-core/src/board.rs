//! Parametric board model
//!
//! `BoardSpec` is the immutable input snapshot both pipelines consume: the
//! engine never mutates it and only ever computes derived artifacts from
//! it. Point sequences serialize as `[[station, value], ...]` pair arrays
//! to match the board document format.

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use uuid::Uuid;

/// Tolerance for "closed" outline tips: the first and last half-width must
/// be within this of zero (millimeters).
pub const TIP_TOLERANCE: f64 = 1.0;

/// Overall board dimensions, all in the same unit system (millimeters by
/// convention), all strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoardDimensions {
    /// Nose-to-tail length.
    pub length: f64,
    /// Full width at the wide point.
    pub width: f64,
    /// Peak thickness.
    pub thickness: f64,
}

/// A parametric surfboard description.
///
/// `outline_points` are `(station, half_width)` pairs, station increasing
/// from nose (0) to tail (length); the actual planform mirrors the
/// half-width across the centerline. `rocker_points` are `(station,
/// z_offset)` pairs covering at least the outline's station domain.
///
/// `rocker_points: None` means a flat rocker: the bottom rides at z = 0
/// over the full outline domain. This is an explicit default, not a
/// fallback for malformed input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardSpec {
    /// Unique board identifier.
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    /// Human-readable board name, used for export filenames.
    pub name: String,
    /// Overall dimensions.
    pub dimensions: BoardDimensions,
    /// Planform control points as `(station, half_width)`.
    pub outline_points: Vec<(f64, f64)>,
    /// Rocker control points as `(station, z_offset)`; `None` = flat.
    #[serde(default)]
    pub rocker_points: Option<Vec<(f64, f64)>>,
}

impl BoardSpec {
    /// Minimum control points for cubic interpolation.
    pub const MIN_CURVE_POINTS: usize = 4;

    /// Creates a spec with a fresh id.
    pub fn new(
        name: impl Into<String>,
        dimensions: BoardDimensions,
        outline_points: Vec<(f64, f64)>,
        rocker_points: Option<Vec<(f64, f64)>>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            dimensions,
            outline_points,
            rocker_points,
        }
    }

    /// Validates the spec, failing fast before any geometry work.
    ///
    /// Checks, in order: positive dimensions, outline point count and
    /// monotonicity, non-negative half-widths, closed tips, and (when a
    /// rocker is supplied) rocker monotonicity and domain coverage.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (name, value) in [
            ("length", self.dimensions.length),
            ("width", self.dimensions.width),
            ("thickness", self.dimensions.thickness),
        ] {
            if !(value > 0.0) || !value.is_finite() {
                return Err(ValidationError::NonPositiveDimension { name, value });
            }
        }

        check_stations("outline", &self.outline_points)?;

        for &(station, half_width) in &self.outline_points {
            if half_width < 0.0 {
                return Err(ValidationError::NegativeHalfWidth {
                    station,
                    half_width,
                });
            }
        }
        for &(station, half_width) in [
            self.outline_points.first(),
            self.outline_points.last(),
        ]
        .into_iter()
        .flatten()
        {
            if half_width.abs() > TIP_TOLERANCE {
                return Err(ValidationError::OpenTip {
                    station,
                    half_width,
                });
            }
        }

        if let Some(rocker) = &self.rocker_points {
            check_stations("rocker", rocker)?;

            let (o_min, o_max) = (
                self.outline_points[0].0,
                self.outline_points[self.outline_points.len() - 1].0,
            );
            let (r_min, r_max) = (rocker[0].0, rocker[rocker.len() - 1].0);
            if r_min > o_min || r_max < o_max {
                return Err(ValidationError::RockerDomainTooSmall {
                    rocker_min: r_min,
                    rocker_max: r_max,
                    outline_min: o_min,
                    outline_max: o_max,
                });
            }
        }

        Ok(())
    }

    /// Content hash of the spec's geometry, the memoization key for mesh
    /// artifacts.
    ///
    /// Covers dimensions, outline, and rocker. The `id` is identity, not
    /// content, and the name does not shape the mesh: two boards with the
    /// same curves share derived geometry regardless of when they were
    /// created or what they are called.
    pub fn content_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        for value in [
            self.dimensions.length,
            self.dimensions.width,
            self.dimensions.thickness,
        ] {
            value.to_bits().hash(&mut hasher);
        }
        hash_points(&mut hasher, &self.outline_points);
        match &self.rocker_points {
            Some(points) => {
                1u8.hash(&mut hasher);
                hash_points(&mut hasher, points);
            }
            None => 0u8.hash(&mut hasher),
        }
        hasher.finish()
    }
}

fn hash_points<H: Hasher>(hasher: &mut H, points: &[(f64, f64)]) {
    points.len().hash(hasher);
    for &(station, value) in points {
        station.to_bits().hash(hasher);
        value.to_bits().hash(hasher);
    }
}

fn check_stations(curve: &'static str, points: &[(f64, f64)]) -> Result<(), ValidationError> {
    if points.len() < BoardSpec::MIN_CURVE_POINTS {
        return Err(ValidationError::TooFewPoints {
            curve,
            required: BoardSpec::MIN_CURVE_POINTS,
            actual: points.len(),
        });
    }
    for (index, window) in points.windows(2).enumerate() {
        if window[1].0 <= window[0].0 {
            return Err(ValidationError::NonMonotonicStations {
                curve,
                index: index + 1,
                station: window[1].0,
            });
        }
    }
    Ok(())
}

/// Cutter parameters for an outline-cut export request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CutterParams {
    /// Cutter diameter in millimeters.
    pub cutter_diameter: f64,
    /// Feed rate in millimeters per minute.
    pub feed_rate: f64,
}

impl CutterParams {
    /// Validates the cutter parameters.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(self.cutter_diameter > 0.0) || !self.cutter_diameter.is_finite() {
            return Err(ValidationError::InvalidCutterParameter {
                name: "cutter_diameter",
                value: self.cutter_diameter,
                reason: "must be positive",
            });
        }
        if !(self.feed_rate > 0.0) || !self.feed_rate.is_finite() {
            return Err(ValidationError::InvalidCutterParameter {
                name: "feed_rate",
                value: self.feed_rate,
                reason: "must be positive",
            });
        }
        Ok(())
    }

    /// Content hash of a toolpath request: the board geometry, the board
    /// name, and these cutter parameters.
    ///
    /// The export filename comes from the board name, so a rename is new
    /// program content even when the geometry is unchanged.
    pub fn content_hash_with(&self, spec: &BoardSpec) -> u64 {
        let mut hasher = DefaultHasher::new();
        spec.content_hash().hash(&mut hasher);
        spec.name.hash(&mut hasher);
        self.cutter_diameter.to_bits().hash(&mut hasher);
        self.feed_rate.to_bits().hash(&mut hasher);
        hasher.finish()
    }
}
