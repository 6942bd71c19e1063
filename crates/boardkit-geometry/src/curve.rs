//! Profile curve interpolation
//!
//! Piecewise cubic Hermite interpolation through `(station, value)` control
//! points with Catmull-Rom (central-difference) tangents. The result is
//! C¹-continuous, which keeps the lofted surface free of visible faceting
//! and the toolpath free of velocity discontinuities. Extrapolation outside
//! the control-point domain is an error, never a guess.

use boardkit_core::{BoardSpec, ValidationError};

/// Slack allowed at the domain boundary before a sample counts as
/// extrapolation. Absorbs accumulated float error in station loops.
const DOMAIN_EPSILON: f64 = 1e-9;

/// A C¹ piecewise-cubic curve through `(station, value)` control points.
#[derive(Debug, Clone)]
pub struct ProfileCurve {
    points: Vec<(f64, f64)>,
    /// Per-point dvalue/dstation, Catmull-Rom style.
    tangents: Vec<f64>,
}

impl ProfileCurve {
    /// Builds a curve through the given control points.
    ///
    /// Requires at least four points with strictly increasing stations;
    /// `curve` names the curve in validation errors.
    pub fn new(curve: &'static str, points: Vec<(f64, f64)>) -> Result<Self, ValidationError> {
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

        let n = points.len();
        let mut tangents = Vec::with_capacity(n);
        for i in 0..n {
            let m = if i == 0 {
                (points[1].1 - points[0].1) / (points[1].0 - points[0].0)
            } else if i == n - 1 {
                (points[n - 1].1 - points[n - 2].1) / (points[n - 1].0 - points[n - 2].0)
            } else {
                (points[i + 1].1 - points[i - 1].1) / (points[i + 1].0 - points[i - 1].0)
            };
            tangents.push(m);
        }

        Ok(Self { points, tangents })
    }

    /// The station domain `(first, last)` covered by this curve.
    pub fn domain(&self) -> (f64, f64) {
        (self.points[0].0, self.points[self.points.len() - 1].0)
    }

    /// Evaluates the curve at `station`.
    ///
    /// Stations outside the domain return
    /// `ValidationError::StationOutOfDomain`.
    pub fn sample(&self, station: f64) -> Result<f64, ValidationError> {
        let (min, max) = self.domain();
        if station < min - DOMAIN_EPSILON || station > max + DOMAIN_EPSILON {
            return Err(ValidationError::StationOutOfDomain { station, min, max });
        }
        let s = station.clamp(min, max);

        // Index of the segment containing s.
        let seg = self
            .points
            .partition_point(|&(x, _)| x <= s)
            .saturating_sub(1)
            .min(self.points.len() - 2);

        let (x0, y0) = self.points[seg];
        let (x1, y1) = self.points[seg + 1];
        let (m0, m1) = (self.tangents[seg], self.tangents[seg + 1]);

        let h = x1 - x0;
        let t = (s - x0) / h;
        let t2 = t * t;
        let t3 = t2 * t;

        // Cubic Hermite basis.
        let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
        let h10 = t3 - 2.0 * t2 + t;
        let h01 = -2.0 * t3 + 3.0 * t2;
        let h11 = t3 - t2;

        Ok(h00 * y0 + h10 * h * m0 + h01 * y1 + h11 * h * m1)
    }
}

/// The 2D planform curve: half-width vs. station.
///
/// Samples are clamped to be non-negative; a cubic can overshoot slightly
/// below zero near closed tips, and a negative half-width has no physical
/// meaning.
#[derive(Debug, Clone)]
pub struct OutlineCurve {
    curve: ProfileCurve,
}

impl OutlineCurve {
    /// Builds the outline curve from a validated board spec.
    pub fn from_spec(spec: &BoardSpec) -> Result<Self, ValidationError> {
        for &(station, half_width) in &spec.outline_points {
            if half_width < 0.0 {
                return Err(ValidationError::NegativeHalfWidth {
                    station,
                    half_width,
                });
            }
        }
        let curve = ProfileCurve::new("outline", spec.outline_points.clone())?;
        Ok(Self { curve })
    }

    /// The station domain covered by the outline.
    pub fn domain(&self) -> (f64, f64) {
        self.curve.domain()
    }

    /// Half-width at `station`, clamped to be non-negative.
    pub fn sample(&self, station: f64) -> Result<f64, ValidationError> {
        Ok(self.curve.sample(station)?.max(0.0))
    }
}

/// The longitudinal rocker curve: bottom z-offset vs. station.
#[derive(Debug, Clone)]
pub struct RockerProfile {
    curve: ProfileCurve,
}

impl RockerProfile {
    /// Builds the rocker profile from a validated board spec.
    ///
    /// A spec without rocker points gets the documented default: a flat
    /// rocker (zero offset) over the outline's station domain.
    pub fn from_spec(spec: &BoardSpec) -> Result<Self, ValidationError> {
        match &spec.rocker_points {
            Some(points) => {
                let curve = ProfileCurve::new("rocker", points.clone())?;
                Ok(Self { curve })
            }
            None => {
                let (min, max) = (
                    spec.outline_points[0].0,
                    spec.outline_points[spec.outline_points.len() - 1].0,
                );
                Ok(Self::flat(min, max))
            }
        }
    }

    /// A flat (zero-offset) rocker over `[min, max]`.
    pub fn flat(min: f64, max: f64) -> Self {
        let step = (max - min) / 3.0;
        let points = (0..4).map(|i| (min + step * i as f64, 0.0)).collect();
        Self {
            curve: ProfileCurve::new("rocker", points)
                .expect("flat rocker control points are always valid"),
        }
    }

    /// Bottom z-offset at `station`.
    pub fn sample(&self, station: f64) -> Result<f64, ValidationError> {
        self.curve.sample(station)
    }
}
