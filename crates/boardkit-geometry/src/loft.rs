//! Hull lofting
//!
//! Turns a board spec into ordered 3D cross-section rings and stitches them
//! into a closed triangulated surface.
//!
//! Coordinate frame: nose at x = 0, +x toward the tail, +y starboard,
//! +z up. Each station's cross-section is an ellipse whose bottom rides the
//! rocker line; the thickness distribution along the length is a sine foil,
//! `t(s) = thickness * sin(pi * s / length)`, so peak thickness at
//! mid-length equals the scalar dimension.
//!
//! Where the outline closes (half-width below `tip_epsilon`) the ring
//! degenerates to a single point and stitching falls back to a fan with the
//! tip as apex, so the nose and tail are sealed without zero-area quads.

use crate::curve::{OutlineCurve, RockerProfile};
use boardkit_core::{BoardSpec, GeometryError, Result};
use nalgebra::Point3;
use std::f64::consts::{PI, TAU};
use tracing::debug;

/// A lofted triangle: three vertices in consistent outward winding.
pub type LoftTriangle = [Point3<f64>; 3];

/// Tuning for the lofting pass.
#[derive(Debug, Clone, Copy)]
pub struct LoftConfig {
    /// Target distance between adjacent stations (mm).
    pub station_spacing: f64,
    /// Points per full cross-section ring. Rounded up to an even count so
    /// the ring is symmetric about the centerline.
    pub ring_points: usize,
    /// Half-widths below this collapse the ring to a tip point (mm).
    pub tip_epsilon: f64,
    /// Triangles with less area than this are skipped, not emitted.
    pub min_triangle_area: f64,
}

impl Default for LoftConfig {
    fn default() -> Self {
        Self {
            station_spacing: 10.0,
            ring_points: 32,
            tip_epsilon: 0.5,
            min_triangle_area: 1e-6,
        }
    }
}

/// One closed cross-section loop at a station.
///
/// A full ring has `ring_points` ordered points; a tip ring has exactly
/// one. Owned transiently during lofting.
#[derive(Debug, Clone)]
pub struct CrossSectionRing {
    /// Station along the length axis.
    pub station: f64,
    /// Ordered loop points (deck and bottom together).
    pub points: Vec<Point3<f64>>,
}

impl CrossSectionRing {
    /// Whether this ring collapsed to a single tip point.
    pub fn is_tip(&self) -> bool {
        self.points.len() == 1
    }
}

/// Lofts board specs into triangle soup.
#[derive(Debug, Clone)]
pub struct HullLoftingEngine {
    config: LoftConfig,
}

impl Default for HullLoftingEngine {
    fn default() -> Self {
        Self::new(LoftConfig::default())
    }
}

impl HullLoftingEngine {
    /// Creates an engine, normalizing the ring point count to an even
    /// value of at least 8.
    pub fn new(mut config: LoftConfig) -> Self {
        config.ring_points = config.ring_points.max(8);
        if config.ring_points % 2 != 0 {
            config.ring_points += 1;
        }
        Self { config }
    }

    /// The active configuration.
    pub fn config(&self) -> &LoftConfig {
        &self.config
    }

    /// Lofts a validated spec into a closed triangle soup.
    pub fn loft(&self, spec: &BoardSpec) -> Result<Vec<LoftTriangle>> {
        spec.validate()?;
        let rings = self.build_rings(spec)?;
        let triangles = self.stitch(&rings)?;
        debug!(
            rings = rings.len(),
            triangles = triangles.len(),
            board = %spec.name,
            "lofted hull"
        );
        Ok(triangles)
    }

    /// Builds the ordered station rings for a spec.
    pub fn build_rings(&self, spec: &BoardSpec) -> Result<Vec<CrossSectionRing>> {
        let outline = OutlineCurve::from_spec(spec)?;
        let rocker = RockerProfile::from_spec(spec)?;
        let (nose, tail) = outline.domain();
        let length = tail - nose;

        let spans = (length / self.config.station_spacing).ceil().max(2.0) as usize;
        let mut rings = Vec::with_capacity(spans + 1);
        for i in 0..=spans {
            let s = nose + length * (i as f64) / (spans as f64);
            rings.push(self.build_ring(spec, &outline, &rocker, s)?);
        }
        Ok(rings)
    }

    fn build_ring(
        &self,
        spec: &BoardSpec,
        outline: &OutlineCurve,
        rocker: &RockerProfile,
        station: f64,
    ) -> Result<CrossSectionRing> {
        let half_width = outline.sample(station)?;
        let bottom_z = rocker.sample(station)?;

        let (nose, tail) = outline.domain();
        let u = (station - nose) / (tail - nose);
        let thickness = (spec.dimensions.thickness * (PI * u).sin()).max(0.0);

        if half_width < self.config.tip_epsilon {
            return Ok(CrossSectionRing {
                station,
                points: vec![Point3::new(station, 0.0, bottom_z)],
            });
        }

        let m = self.config.ring_points;
        let half_thickness = thickness / 2.0;
        let center_z = bottom_z + half_thickness;
        let points = (0..m)
            .map(|j| {
                let theta = TAU * (j as f64) / (m as f64);
                Point3::new(
                    station,
                    half_width * theta.cos(),
                    center_z + half_thickness * theta.sin(),
                )
            })
            .collect();

        Ok(CrossSectionRing { station, points })
    }

    /// Stitches ordered rings into triangle soup.
    ///
    /// Adjacent full rings become a quad strip; a tip/full pair becomes a
    /// fan with the tip as apex; two adjacent tips contribute nothing.
    pub fn stitch(&self, rings: &[CrossSectionRing]) -> Result<Vec<LoftTriangle>> {
        let mut triangles = Vec::new();

        for pair in rings.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            if b.station <= a.station {
                return Err(GeometryError::InvertedRingOrder {
                    previous: a.station,
                    current: b.station,
                }
                .into());
            }
            match (a.is_tip(), b.is_tip()) {
                (true, true) => {}
                (true, false) => self.fan(a.points[0], &b.points, true, &mut triangles),
                (false, true) => self.fan(b.points[0], &a.points, false, &mut triangles),
                (false, false) => {
                    if a.points.len() != b.points.len() {
                        return Err(GeometryError::RingPointCountMismatch {
                            station_a: a.station,
                            points_a: a.points.len(),
                            station_b: b.station,
                            points_b: b.points.len(),
                        }
                        .into());
                    }
                    self.strip(&a.points, &b.points, &mut triangles);
                }
            }
        }

        if triangles.is_empty() {
            return Err(GeometryError::EmptyMesh {
                reason: "every station ring degenerated to a tip point".to_string(),
            }
            .into());
        }
        Ok(triangles)
    }

    /// Quad strip between two full rings at increasing stations.
    fn strip(&self, a: &[Point3<f64>], b: &[Point3<f64>], out: &mut Vec<LoftTriangle>) {
        let m = a.len();
        for j in 0..m {
            let k = (j + 1) % m;
            self.push(out, [a[j], a[k], b[j]]);
            self.push(out, [a[k], b[k], b[j]]);
        }
    }

    /// Fan between a tip point and a full ring.
    ///
    /// `apex_before` is true when the tip sits at the lower station (nose),
    /// which flips the winding so normals stay outward on both ends.
    fn fan(
        &self,
        apex: Point3<f64>,
        ring: &[Point3<f64>],
        apex_before: bool,
        out: &mut Vec<LoftTriangle>,
    ) {
        let m = ring.len();
        for j in 0..m {
            let k = (j + 1) % m;
            if apex_before {
                self.push(out, [apex, ring[k], ring[j]]);
            } else {
                self.push(out, [ring[j], ring[k], apex]);
            }
        }
    }

    fn push(&self, out: &mut Vec<LoftTriangle>, tri: LoftTriangle) {
        if triangle_area(&tri) >= self.config.min_triangle_area {
            out.push(tri);
        }
    }
}

/// Area of a 3D triangle.
pub fn triangle_area(tri: &LoftTriangle) -> f64 {
    let e1 = tri[1] - tri[0];
    let e2 = tri[2] - tri[0];
    e1.cross(&e2).norm() / 2.0
}
