//! Outline toolpath planning
//!
//! Computes the cutter-center contour for a 2.5D outline cut: the full
//! mirrored planform polygon, offset outward by the cutter radius so the
//! tool's edge (not its center) traces the outline, then linearized into
//! 3D waypoints.
//!
//! Offsetting is where the numerical trouble lives. Where consecutive
//! offset segments diverge (convex corners, the nose and tail) the gap is
//! bridged with an arc of the cutter radius centered on the original
//! vertex. Where the outline turns concave with a local curvature radius
//! tighter than the cutter, the naive offset self-intersects; a windowed
//! segment-intersection pass trims each crossing back to its intersection
//! point and records the removed span as an under-cut region. Flagged
//! regions ride along in the plan — the limit of the chosen cutter size is
//! reported, never swallowed. If trimming would remove more than a
//! configured fraction of the path the whole request is rejected with
//! `ToolpathError::CutterTooLarge` so the caller can retry with a smaller
//! cutter.

use boardkit_core::{BoardSpec, CutterParams, Result, ToolpathError};
use boardkit_geometry::OutlineCurve;
use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;
use tracing::{debug, warn};

/// Waypoint motion class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveType {
    /// Positioning move above the stock.
    Rapid,
    /// Feed move through material.
    Cut,
}

/// One 3D waypoint of the cut path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub move_type: MoveType,
}

/// Why a station range was flagged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagReason {
    /// Concave curvature tighter than the cutter radius: material remains.
    UnderCut,
}

impl fmt::Display for FlagReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnderCut => write!(f, "cutter radius exceeds local concave curvature"),
        }
    }
}

/// A station range the planner could not cut faithfully.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlaggedRegion {
    /// Start of the affected station range.
    pub station_start: f64,
    /// End of the affected station range.
    pub station_end: f64,
    /// Why the range is flagged.
    pub reason: FlagReason,
}

/// The cutter-center contour at constant radial offset from the planform.
#[derive(Debug, Clone)]
pub struct OffsetContour {
    /// Closed loop of cutter-center positions, nose→tail→nose.
    pub points: Vec<Point2<f64>>,
    /// Under-cut regions trimmed out of the loop.
    pub flagged: Vec<FlaggedRegion>,
}

impl OffsetContour {
    /// Total loop length including the closing segment.
    pub fn length(&self) -> f64 {
        polyline_length(&self.points, true)
    }
}

/// An ordered, machine-ready cut plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolpathPlan {
    /// Ordered waypoints: rapid approach, plunge, cut loop, retract.
    pub waypoints: Vec<Waypoint>,
    /// Feed rate for cut moves (mm/min).
    pub feed_rate: f64,
    /// Z height for rapid moves.
    pub safe_height: f64,
    /// Cutter diameter the plan was computed for.
    pub cutter_diameter: f64,
    /// Under-cut regions, if any.
    pub flagged: Vec<FlaggedRegion>,
}

/// Tuning for the planning pass.
#[derive(Debug, Clone, Copy)]
pub struct PlannerConfig {
    /// Cut depth below stock top (positive, mm).
    pub cut_depth: f64,
    /// Safe Z for rapid moves (mm).
    pub safe_height: f64,
    /// Outline sampling distance along the station axis (mm).
    pub sample_spacing: f64,
    /// Angular step for arc joins at diverging corners (degrees).
    pub arc_step_deg: f64,
    /// Reject the request when trimming removes more than this fraction
    /// of the offset loop.
    pub max_undercut_fraction: f64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            cut_depth: 5.0,
            safe_height: 50.0,
            sample_spacing: 2.0,
            arc_step_deg: 10.0,
            max_undercut_fraction: 0.25,
        }
    }
}

/// Plans outline cuts from board specs.
#[derive(Debug, Clone, Default)]
pub struct ToolpathPlanner {
    config: PlannerConfig,
}

impl ToolpathPlanner {
    pub fn new(config: PlannerConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Plans a single-pass 2.5D outline cut.
    pub fn plan(&self, spec: &BoardSpec, cutter: &CutterParams) -> Result<ToolpathPlan> {
        spec.validate()?;
        cutter.validate()?;

        let contour = self.offset_contour(spec, cutter.cutter_diameter / 2.0)?;
        if !contour.flagged.is_empty() {
            warn!(
                board = %spec.name,
                regions = contour.flagged.len(),
                "outline has under-cut regions for cutter diameter {}",
                cutter.cutter_diameter
            );
        }
        Ok(self.order(contour, cutter))
    }

    /// Orders a computed contour into machine-ready waypoints: rapid
    /// approach, plunge, cut loop, closing segment, retract.
    pub fn order(&self, contour: OffsetContour, cutter: &CutterParams) -> ToolpathPlan {
        let Some(&start) = contour.points.first() else {
            return ToolpathPlan {
                waypoints: Vec::new(),
                feed_rate: cutter.feed_rate,
                safe_height: self.config.safe_height,
                cutter_diameter: cutter.cutter_diameter,
                flagged: contour.flagged,
            };
        };
        let mut waypoints = Vec::with_capacity(contour.points.len() + 4);
        waypoints.push(Waypoint {
            x: start.x,
            y: start.y,
            z: self.config.safe_height,
            move_type: MoveType::Rapid,
        });
        waypoints.push(Waypoint {
            x: start.x,
            y: start.y,
            z: -self.config.cut_depth,
            move_type: MoveType::Cut,
        });
        for p in contour.points.iter().skip(1) {
            waypoints.push(Waypoint {
                x: p.x,
                y: p.y,
                z: -self.config.cut_depth,
                move_type: MoveType::Cut,
            });
        }
        // Close the loop back to the entry point.
        waypoints.push(Waypoint {
            x: start.x,
            y: start.y,
            z: -self.config.cut_depth,
            move_type: MoveType::Cut,
        });
        waypoints.push(Waypoint {
            x: start.x,
            y: start.y,
            z: self.config.safe_height,
            move_type: MoveType::Rapid,
        });

        ToolpathPlan {
            waypoints,
            feed_rate: cutter.feed_rate,
            safe_height: self.config.safe_height,
            cutter_diameter: cutter.cutter_diameter,
            flagged: contour.flagged,
        }
    }

    /// Computes the cutter-center contour for a given radius.
    pub fn offset_contour(&self, spec: &BoardSpec, radius: f64) -> Result<OffsetContour> {
        let polygon = self.planform_polygon(spec)?;
        let raw = self.offset_polygon(&polygon, radius);
        let raw_length = polyline_length(&raw, true);
        if raw.len() < 3 || raw_length <= 0.0 {
            return Err(ToolpathError::DegenerateOutline {
                reason: format!("offset loop collapsed to {} points", raw.len()),
            }
            .into());
        }

        let (points, flagged, removed_length) = self.trim_self_intersections(raw, radius);
        let removed_fraction = removed_length / raw_length;
        if removed_fraction > self.config.max_undercut_fraction {
            return Err(ToolpathError::CutterTooLarge {
                cutter_diameter: radius * 2.0,
                removed_fraction: removed_fraction * 100.0,
                limit_fraction: self.config.max_undercut_fraction * 100.0,
            }
            .into());
        }
        if points.len() < 3 {
            return Err(ToolpathError::DegenerateOutline {
                reason: "trimming left fewer than 3 contour points".to_string(),
            }
            .into());
        }

        debug!(
            points = points.len(),
            flagged = flagged.len(),
            removed_mm = removed_length,
            "computed offset contour"
        );
        Ok(OffsetContour { points, flagged })
    }

    /// Samples the outline into the full mirrored planform polygon,
    /// nose→tail along +Y, tail→nose along −Y, tips emitted once.
    fn planform_polygon(&self, spec: &BoardSpec) -> Result<Vec<Point2<f64>>> {
        let outline = OutlineCurve::from_spec(spec)?;
        let (nose, tail) = outline.domain();
        let length = tail - nose;
        let n = ((length / self.config.sample_spacing).ceil() as usize).max(8);

        let stations: Vec<f64> = (0..=n)
            .map(|i| nose + length * (i as f64) / (n as f64))
            .collect();
        let widths: Vec<f64> = stations
            .iter()
            .map(|&s| outline.sample(s))
            .collect::<std::result::Result<_, _>>()?;

        let mut polygon: Vec<Point2<f64>> = Vec::with_capacity(2 * n);
        for (s, w) in stations.iter().zip(widths.iter()) {
            push_deduped(&mut polygon, Point2::new(*s, *w));
        }
        for (s, w) in stations.iter().zip(widths.iter()).rev().skip(1).take(n - 1) {
            push_deduped(&mut polygon, Point2::new(*s, -*w));
        }
        // The loop closes implicitly; drop a last point that landed on the
        // first.
        if polygon.len() > 1 && (polygon[0] - polygon[polygon.len() - 1]).norm() < 1e-9 {
            polygon.pop();
        }

        if polygon.len() < 3 {
            return Err(ToolpathError::DegenerateOutline {
                reason: "planform polygon has fewer than 3 distinct points".to_string(),
            }
            .into());
        }
        Ok(polygon)
    }

    /// Offsets a simple closed polygon outward by `radius`.
    ///
    /// Diverging corners get an arc join centered on the original vertex;
    /// converging corners take the intersection of the two offset lines.
    fn offset_polygon(&self, polygon: &[Point2<f64>], radius: f64) -> Vec<Point2<f64>> {
        let n = polygon.len();
        let orient = if signed_area(polygon) >= 0.0 { 1.0 } else { -1.0 };
        let outward = |d: Vector2<f64>| -> Vector2<f64> {
            if orient > 0.0 {
                Vector2::new(d.y, -d.x)
            } else {
                Vector2::new(-d.y, d.x)
            }
        };
        let arc_step = self.config.arc_step_deg.to_radians();

        let mut out: Vec<Point2<f64>> = Vec::with_capacity(n * 2);
        for i in 0..n {
            let prev = polygon[(i + n - 1) % n];
            let cur = polygon[i];
            let next = polygon[(i + 1) % n];

            let d1 = (cur - prev).normalize();
            let d2 = (next - cur).normalize();
            let n1 = outward(d1);
            let n2 = outward(d2);
            let turn = (d1.x * d2.y - d1.y * d2.x) * orient;

            if turn > 1e-12 {
                // Diverging corner: bridge the normals with an arc around
                // the original vertex.
                let a1 = n1.y.atan2(n1.x);
                let mut sweep = wrap_angle(n2.y.atan2(n2.x) - a1);
                // The gap between outward normals at a diverging corner is
                // always the short way around.
                let steps = ((sweep.abs() / arc_step).ceil() as usize).max(1);
                // An even step count puts a sample on the corner bisector,
                // so the arc's extreme point (the tip apex at the nose and
                // tail) lies on the contour exactly.
                let steps = steps + steps % 2;
                sweep /= steps as f64;
                for k in 0..=steps {
                    let a = a1 + sweep * (k as f64);
                    out.push(cur + Vector2::new(a.cos(), a.sin()) * radius);
                }
            } else if turn < -1e-12 {
                // Converging corner: the offset lines cross; keep the
                // intersection.
                match line_intersection(cur + n1 * radius, d1, cur + n2 * radius, d2) {
                    Some(p) => out.push(p),
                    None => out.push(cur + n1 * radius),
                }
            } else {
                // Straight-through vertex.
                out.push(cur + n1 * radius);
            }
        }
        out
    }

    /// Removes local self-intersection loops from the offset contour.
    ///
    /// Each crossing is trimmed back to its intersection point and the
    /// removed span reported as a flagged under-cut region. Returns the
    /// surviving loop, the merged flag list, and the removed length.
    fn trim_self_intersections(
        &self,
        mut points: Vec<Point2<f64>>,
        radius: f64,
    ) -> (Vec<Point2<f64>>, Vec<FlaggedRegion>, f64) {
        // An under-cut loop is local, but its miter spikes can run several
        // cutter circumferences along the path before re-crossing it.
        let window_length = (16.0 * PI * radius).max(64.0 * self.config.sample_spacing);
        let mut flagged: Vec<(f64, f64)> = Vec::new();
        let mut removed_length = 0.0;

        'scan: loop {
            let n = points.len();
            if n < 4 {
                break;
            }
            for i in 0..n {
                let a1 = points[i];
                let a2 = points[(i + 1) % n];
                let mut span = 0.0;
                let mut j = (i + 2) % n;
                while span < window_length && j != i && (j + 1) % n != i {
                    let b1 = points[j];
                    let b2 = points[(j + 1) % n];
                    if let Some(x) = segment_intersection(a1, a2, b1, b2) {
                        // Trim the loop between the two segments.
                        let removed: Vec<Point2<f64>> = if i < j {
                            points.drain(i + 1..=j).collect()
                        } else {
                            // The loop wraps the seam; rotate so it does not.
                            points.rotate_left(i + 1);
                            let count = (j + n - i) % n;
                            points.drain(0..count).collect()
                        };
                        removed_length += polyline_length(&removed, false);

                        let (mut lo, mut hi) = (f64::MAX, f64::MIN);
                        for p in &removed {
                            lo = lo.min(p.x);
                            hi = hi.max(p.x);
                        }
                        flagged.push((lo, hi));

                        // Re-insert the intersection where the span was cut
                        // out.
                        let insert_at = if i < j { i + 1 } else { 0 };
                        points.insert(insert_at, x);
                        continue 'scan;
                    }
                    span += (b2 - b1).norm();
                    j = (j + 1) % n;
                }
            }
            break;
        }

        let flagged = merge_regions(flagged);
        (points, flagged, removed_length)
    }
}

fn push_deduped(points: &mut Vec<Point2<f64>>, p: Point2<f64>) {
    if points
        .last()
        .map(|last| (p - last).norm() > 1e-9)
        .unwrap_or(true)
    {
        points.push(p);
    }
}

fn signed_area(polygon: &[Point2<f64>]) -> f64 {
    let n = polygon.len();
    let mut sum = 0.0;
    for i in 0..n {
        let a = polygon[i];
        let b = polygon[(i + 1) % n];
        sum += a.x * b.y - b.x * a.y;
    }
    sum / 2.0
}

fn polyline_length(points: &[Point2<f64>], closed: bool) -> f64 {
    let mut len: f64 = points.windows(2).map(|w| (w[1] - w[0]).norm()).sum();
    if closed && points.len() > 1 {
        len += (points[0] - points[points.len() - 1]).norm();
    }
    len
}

fn wrap_angle(a: f64) -> f64 {
    let mut a = a % (2.0 * PI);
    if a > PI {
        a -= 2.0 * PI;
    } else if a <= -PI {
        a += 2.0 * PI;
    }
    a
}

/// Intersection of two infinite lines given as point + direction.
fn line_intersection(
    p1: Point2<f64>,
    d1: Vector2<f64>,
    p2: Point2<f64>,
    d2: Vector2<f64>,
) -> Option<Point2<f64>> {
    let denom = d1.x * d2.y - d1.y * d2.x;
    if denom.abs() < 1e-12 {
        return None;
    }
    let delta = p2 - p1;
    let t = (delta.x * d2.y - delta.y * d2.x) / denom;
    Some(p1 + d1 * t)
}

/// Proper intersection of two segments, excluding shared endpoints.
fn segment_intersection(
    a1: Point2<f64>,
    a2: Point2<f64>,
    b1: Point2<f64>,
    b2: Point2<f64>,
) -> Option<Point2<f64>> {
    let da = a2 - a1;
    let db = b2 - b1;
    let denom = da.x * db.y - da.y * db.x;
    if denom.abs() < 1e-12 {
        return None;
    }
    let delta = b1 - a1;
    let t = (delta.x * db.y - delta.y * db.x) / denom;
    let u = (delta.x * da.y - delta.y * da.x) / denom;
    const EPS: f64 = 1e-9;
    if t > EPS && t < 1.0 - EPS && u > EPS && u < 1.0 - EPS {
        Some(a1 + da * t)
    } else {
        None
    }
}

fn merge_regions(mut ranges: Vec<(f64, f64)>) -> Vec<FlaggedRegion> {
    ranges.sort_by(|a, b| a.0.total_cmp(&b.0));
    let mut merged: Vec<(f64, f64)> = Vec::new();
    for (lo, hi) in ranges {
        match merged.last_mut() {
            Some(last) if lo <= last.1 => last.1 = last.1.max(hi),
            _ => merged.push((lo, hi)),
        }
    }
    merged
        .into_iter()
        .map(|(station_start, station_end)| FlaggedRegion {
            station_start,
            station_end,
            reason: FlagReason::UnderCut,
        })
        .collect()
}
