//! Unit system selection
//!
//! The engine math is unit-agnostic; units only matter at the G-code
//! boundary, where the program declares its unit system once (G20/G21).
//! Board documents are millimeters by convention.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Millimeters per inch.
pub const MM_PER_INCH: f64 = 25.4;

/// Measurement system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    /// Metric system (mm)
    Metric,
    /// Imperial system (inches)
    Imperial,
}

impl Default for Units {
    fn default() -> Self {
        Self::Metric
    }
}

impl Units {
    /// The modal G-code word declaring this unit system.
    pub fn gcode_mode(&self) -> &'static str {
        match self {
            Self::Metric => "G21",
            Self::Imperial => "G20",
        }
    }

    /// Human-readable unit suffix for comments and reports.
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Metric => "mm",
            Self::Imperial => "in",
        }
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Metric => write!(f, "Metric"),
            Self::Imperial => write!(f, "Imperial"),
        }
    }
}

impl FromStr for Units {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "metric" | "mm" => Ok(Self::Metric),
            "imperial" | "inch" | "in" => Ok(Self::Imperial),
            _ => Err(format!("Unknown unit system: {}", s)),
        }
    }
}

/// Convert millimeters to inches
pub fn mm_to_inch(mm: f64) -> f64 {
    mm / MM_PER_INCH
}

/// Convert inches to millimeters
pub fn inch_to_mm(inch: f64) -> f64 {
    inch * MM_PER_INCH
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_gcode_mode() {
        assert_eq!(Units::Metric.gcode_mode(), "G21");
        assert_eq!(Units::Imperial.gcode_mode(), "G20");
    }

    #[test]
    fn test_parse() {
        assert_eq!("mm".parse::<Units>().unwrap(), Units::Metric);
        assert_eq!("Imperial".parse::<Units>().unwrap(), Units::Imperial);
        assert!("furlong".parse::<Units>().is_err());
    }

    #[test]
    fn test_conversion_round_trip() {
        assert_relative_eq!(inch_to_mm(mm_to_inch(187.3)), 187.3);
        assert_relative_eq!(mm_to_inch(25.4), 1.0);
    }
}
