//! G-code emission
//!
//! Pure serialization of a `ToolpathPlan` into machine instructions. All
//! geometry decisions are already made by the planner; this module only
//! formats, deterministically: fixed 3-decimal coordinates, feed rate
//! emitted once on the first cut move, so identical input produces
//! byte-identical output.

use crate::planner::{MoveType, ToolpathPlan};
use boardkit_core::{Result, ToolpathError, Units};
use tracing::debug;

/// Serializes toolpath plans into G-code programs.
#[derive(Debug, Clone, Copy, Default)]
pub struct GcodeEmitter {
    /// Unit system declared at the top of each program.
    pub units: Units,
}

impl GcodeEmitter {
    pub fn new(units: Units) -> Self {
        Self { units }
    }

    /// Emits a complete outline-cut program for a plan.
    pub fn emit(&self, plan: &ToolpathPlan, board_name: &str) -> Result<String> {
        if plan.waypoints.is_empty() {
            return Err(ToolpathError::EmptyPlan.into());
        }

        let mut gcode = String::new();
        self.header(&mut gcode, plan, board_name);

        let mut feed_emitted = false;
        let mut current_z = f64::NAN;
        for wp in &plan.waypoints {
            match wp.move_type {
                MoveType::Rapid => {
                    gcode.push_str(&format!(
                        "G00 X{:.3} Y{:.3} Z{:.3}\n",
                        wp.x, wp.y, wp.z
                    ));
                }
                MoveType::Cut => {
                    let z_changed = (wp.z - current_z).abs() > 1e-9 || current_z.is_nan();
                    let feed = if feed_emitted {
                        String::new()
                    } else {
                        feed_emitted = true;
                        format!(" F{:.0}", plan.feed_rate)
                    };
                    if z_changed {
                        gcode.push_str(&format!(
                            "G01 X{:.3} Y{:.3} Z{:.3}{}\n",
                            wp.x, wp.y, wp.z, feed
                        ));
                    } else {
                        gcode.push_str(&format!("G01 X{:.3} Y{:.3}{}\n", wp.x, wp.y, feed));
                    }
                }
            }
            current_z = wp.z;
        }

        gcode.push_str("M30\n");
        debug!(
            lines = gcode.lines().count(),
            board = board_name,
            "emitted outline program"
        );
        Ok(gcode)
    }

    fn header(&self, gcode: &mut String, plan: &ToolpathPlan, board_name: &str) {
        gcode.push_str(&format!("; Outline cut: {}\n", board_name));
        gcode.push_str(&format!(
            "; Tool diameter: {:.3}{}\n",
            plan.cutter_diameter,
            self.units.suffix()
        ));
        gcode.push_str(&format!(
            "; Feed rate: {:.0} {}/min\n",
            plan.feed_rate,
            self.units.suffix()
        ));
        for flag in &plan.flagged {
            gcode.push_str(&format!(
                "; Under-cut region: stations {:.3}..{:.3} ({})\n",
                flag.station_start, flag.station_end, flag.reason
            ));
        }
        gcode.push('\n');

        gcode.push_str("G90 ; Absolute positioning\n");
        let units_comment = match self.units {
            Units::Metric => "Millimeter units",
            Units::Imperial => "Inch units",
        };
        gcode.push_str(&format!("{} ; {}\n", self.units.gcode_mode(), units_comment));
        gcode.push_str("G17 ; XY plane\n");
        gcode.push('\n');
    }
}

/// Export filename for a board's outline program:
/// `<board-name>_outline.cnc`, lowercased with non-alphanumeric runs
/// collapsed to `-`.
pub fn export_filename(board_name: &str) -> String {
    let mut slug = String::with_capacity(board_name.len());
    let mut pending_dash = false;
    for c in board_name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    if slug.is_empty() {
        slug.push_str("board");
    }
    format!("{}_outline.cnc", slug)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::Waypoint;

    fn plan() -> ToolpathPlan {
        ToolpathPlan {
            waypoints: vec![
                Waypoint {
                    x: -6.35,
                    y: 0.0,
                    z: 50.0,
                    move_type: MoveType::Rapid,
                },
                Waypoint {
                    x: -6.35,
                    y: 0.0,
                    z: -5.0,
                    move_type: MoveType::Cut,
                },
                Waypoint {
                    x: 100.0,
                    y: 42.5,
                    z: -5.0,
                    move_type: MoveType::Cut,
                },
                Waypoint {
                    x: -6.35,
                    y: 0.0,
                    z: 50.0,
                    move_type: MoveType::Rapid,
                },
            ],
            feed_rate: 1200.0,
            safe_height: 50.0,
            cutter_diameter: 12.7,
            flagged: Vec::new(),
        }
    }

    #[test]
    fn test_program_structure() {
        let gcode = GcodeEmitter::default().emit(&plan(), "Test Board").unwrap();

        assert!(gcode.starts_with("; Outline cut: Test Board\n"));
        assert!(gcode.contains("G90 ; Absolute positioning\n"));
        assert!(gcode.contains("G21 ; Millimeter units\n"));
        assert!(gcode.contains("G00 X-6.350 Y0.000 Z50.000\n"));
        assert!(gcode.contains("G01 X-6.350 Y0.000 Z-5.000 F1200\n"));
        assert!(gcode.ends_with("M30\n"));
    }

    #[test]
    fn test_feed_rate_emitted_once() {
        let gcode = GcodeEmitter::default().emit(&plan(), "Test Board").unwrap();
        assert_eq!(gcode.matches(" F1200").count(), 1);
    }

    #[test]
    fn test_output_is_deterministic() {
        let emitter = GcodeEmitter::default();
        let a = emitter.emit(&plan(), "Test Board").unwrap();
        let b = emitter.emit(&plan(), "Test Board").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_xy_only_when_depth_unchanged() {
        let gcode = GcodeEmitter::default().emit(&plan(), "Test Board").unwrap();
        assert!(gcode.contains("G01 X100.000 Y42.500\n"));
    }

    #[test]
    fn test_imperial_mode_word() {
        let gcode = GcodeEmitter::new(Units::Imperial)
            .emit(&plan(), "Test Board")
            .unwrap();
        assert!(gcode.contains("G20 ; Inch units\n"));
    }

    #[test]
    fn test_empty_plan_is_an_error() {
        let mut empty = plan();
        empty.waypoints.clear();
        assert!(GcodeEmitter::default().emit(&empty, "x").is_err());
    }

    #[test]
    fn test_flags_documented_in_header() {
        use crate::planner::{FlagReason, FlaggedRegion};
        let mut flagged = plan();
        flagged.flagged.push(FlaggedRegion {
            station_start: 995.0,
            station_end: 1005.0,
            reason: FlagReason::UnderCut,
        });
        let gcode = GcodeEmitter::default().emit(&flagged, "Notched").unwrap();
        assert!(gcode.contains("; Under-cut region: stations 995.000..1005.000"));
    }

    #[test]
    fn test_export_filename() {
        assert_eq!(export_filename("New Board"), "new-board_outline.cnc");
        assert_eq!(
            export_filename("Shortboard Classic 6'2\""),
            "shortboard-classic-6-2_outline.cnc"
        );
        assert_eq!(export_filename("___"), "board_outline.cnc");
    }
}
