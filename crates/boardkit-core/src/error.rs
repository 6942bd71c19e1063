//! Error handling for BoardKit
//!
//! Provides structured error types for all layers of the engine:
//! - Validation errors (malformed board specs and cutter parameters)
//! - Geometry errors (lofting invariant violations — engine bugs)
//! - Toolpath errors (cutter/outline incompatibilities — recoverable)
//!
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Validation error type
///
/// Represents malformed input: a bad `BoardSpec`, bad cutter parameters,
/// or a curve sampled outside its station domain. Validation fails fast,
/// before any geometry work, and is surfaced verbatim to the caller.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// A dimension is zero or negative
    #[error("Dimension '{name}' must be positive, got {value}")]
    NonPositiveDimension {
        /// The dimension field name.
        name: &'static str,
        /// The offending value.
        value: f64,
    },

    /// Too few control points to interpolate
    #[error("Curve '{curve}' needs at least {required} control points, got {actual}")]
    TooFewPoints {
        /// Which curve is underspecified.
        curve: &'static str,
        /// Minimum number of control points.
        required: usize,
        /// Number of points supplied.
        actual: usize,
    },

    /// Stations must strictly increase from nose to tail
    #[error("Curve '{curve}' stations must be strictly increasing (point {index}: {station})")]
    NonMonotonicStations {
        /// Which curve is malformed.
        curve: &'static str,
        /// Index of the offending control point.
        index: usize,
        /// The station that failed to increase.
        station: f64,
    },

    /// Half-widths cannot be negative
    #[error("Outline half-width at station {station} is negative: {half_width}")]
    NegativeHalfWidth {
        /// Station of the offending point.
        station: f64,
        /// The negative half-width.
        half_width: f64,
    },

    /// The outline must close at the nose and tail
    #[error("Outline tip at station {station} must have half-width ~0, got {half_width}")]
    OpenTip {
        /// Station of the offending tip.
        station: f64,
        /// The half-width found at the tip.
        half_width: f64,
    },

    /// The rocker curve must cover the whole outline domain
    #[error(
        "Rocker domain [{rocker_min}, {rocker_max}] does not cover outline domain [{outline_min}, {outline_max}]"
    )]
    RockerDomainTooSmall {
        /// Rocker domain start.
        rocker_min: f64,
        /// Rocker domain end.
        rocker_max: f64,
        /// Outline domain start.
        outline_min: f64,
        /// Outline domain end.
        outline_max: f64,
    },

    /// A curve was sampled outside its domain (extrapolation is an error)
    #[error("Station {station} outside curve domain [{min}, {max}]")]
    StationOutOfDomain {
        /// The requested station.
        station: f64,
        /// Domain start.
        min: f64,
        /// Domain end.
        max: f64,
    },

    /// A cutter parameter is invalid
    #[error("Invalid cutter parameter '{name}': {value} ({reason})")]
    InvalidCutterParameter {
        /// The parameter name.
        name: &'static str,
        /// The offending value.
        value: f64,
        /// Why the value is rejected.
        reason: &'static str,
    },
}

/// Geometry error type
///
/// Represents an internal invariant violation during lofting or mesh
/// assembly. These indicate an engine bug, not a user input issue: they
/// are fatal, logged with full input context, and never caught-and-ignored.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// Two adjacent cross-section rings disagree on point count
    #[error(
        "Ring point count mismatch at stations {station_a} ({points_a} points) and {station_b} ({points_b} points)"
    )]
    RingPointCountMismatch {
        /// Station of the first ring.
        station_a: f64,
        /// Point count of the first ring.
        points_a: usize,
        /// Station of the second ring.
        station_b: f64,
        /// Point count of the second ring.
        points_b: usize,
    },

    /// Ring stations regressed during lofting
    #[error("Ring ordering inverted: station {previous} followed by {current}")]
    InvertedRingOrder {
        /// Station of the earlier ring.
        previous: f64,
        /// Station that failed to advance.
        current: f64,
    },

    /// A triangle index escaped the vertex buffer
    #[error("Triangle index {index} out of bounds for {vertex_count} vertices")]
    IndexOutOfBounds {
        /// The offending index.
        index: u32,
        /// Size of the vertex buffer.
        vertex_count: usize,
    },

    /// Lofting produced no usable geometry
    #[error("Lofting produced an empty mesh: {reason}")]
    EmptyMesh {
        /// Why no triangles survived.
        reason: String,
    },
}

/// Toolpath error type
///
/// Represents cutter/outline incompatibilities. Recoverable at the request
/// level: the caller receives a descriptive rejection and may retry with a
/// smaller cutter.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ToolpathError {
    /// Offset trimming would remove too much of the cut path
    #[error(
        "Cutter diameter {cutter_diameter}mm too large for outline: trimming under-cut regions \
         would remove {removed_fraction:.1}% of the path (limit {limit_fraction:.1}%)"
    )]
    CutterTooLarge {
        /// The rejected cutter diameter.
        cutter_diameter: f64,
        /// Path fraction trimming would remove, in percent.
        removed_fraction: f64,
        /// Configured rejection threshold, in percent.
        limit_fraction: f64,
    },

    /// The planform polygon collapsed before offsetting
    #[error("Outline too small to offset: {reason}")]
    DegenerateOutline {
        /// Why the planform could not be offset.
        reason: String,
    },

    /// The plan has no waypoints to serialize
    #[error("Toolpath plan is empty")]
    EmptyPlan,
}

/// Main error type for BoardKit
///
/// A unified error type that can represent any error from all engine
/// layers. This is the primary error type used in public APIs.
#[derive(Error, Debug)]
pub enum Error {
    /// Validation error
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Geometry error
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    /// Toolpath error
    #[error(transparent)]
    Toolpath(#[from] ToolpathError),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this is a validation error
    pub fn is_validation_error(&self) -> bool {
        matches!(self, Error::Validation(_))
    }

    /// Check if this is a geometry error (fatal engine bug)
    pub fn is_geometry_error(&self) -> bool {
        matches!(self, Error::Geometry(_))
    }

    /// Check if this is a toolpath error
    pub fn is_toolpath_error(&self) -> bool {
        matches!(self, Error::Toolpath(_))
    }

    /// Check if the caller can recover by fixing its request.
    ///
    /// Validation and toolpath errors are request-level problems; geometry
    /// errors indicate an engine bug and must not be retried.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::Validation(_) | Error::Toolpath(_))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::TooFewPoints {
            curve: "outline",
            required: 4,
            actual: 2,
        };
        assert_eq!(
            err.to_string(),
            "Curve 'outline' needs at least 4 control points, got 2"
        );

        let err = ValidationError::StationOutOfDomain {
            station: 250.0,
            min: 0.0,
            max: 200.0,
        };
        assert_eq!(err.to_string(), "Station 250 outside curve domain [0, 200]");
    }

    #[test]
    fn test_geometry_error_display() {
        let err = GeometryError::RingPointCountMismatch {
            station_a: 10.0,
            points_a: 32,
            station_b: 20.0,
            points_b: 1,
        };
        assert_eq!(
            err.to_string(),
            "Ring point count mismatch at stations 10 (32 points) and 20 (1 points)"
        );
    }

    #[test]
    fn test_toolpath_error_display() {
        let err = ToolpathError::CutterTooLarge {
            cutter_diameter: 50.0,
            removed_fraction: 42.0,
            limit_fraction: 25.0,
        };
        assert!(err.to_string().contains("50mm too large"));
        assert!(err.to_string().contains("42.0%"));
    }

    #[test]
    fn test_error_conversion() {
        let err: Error = ValidationError::NegativeHalfWidth {
            station: 10.0,
            half_width: -1.0,
        }
        .into();
        assert!(matches!(err, Error::Validation(_)));
        assert!(err.is_validation_error());

        let err: Error = ToolpathError::EmptyPlan.into();
        assert!(err.is_toolpath_error());
    }

    #[test]
    fn test_recoverability() {
        let validation: Error = ValidationError::NonPositiveDimension {
            name: "length",
            value: -1.0,
        }
        .into();
        let geometry: Error = GeometryError::InvertedRingOrder {
            previous: 20.0,
            current: 10.0,
        }
        .into();
        let toolpath: Error = ToolpathError::EmptyPlan.into();

        assert!(validation.is_recoverable());
        assert!(toolpath.is_recoverable());
        assert!(!geometry.is_recoverable());
    }
}
