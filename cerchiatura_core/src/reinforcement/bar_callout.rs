//! Reinforcement bar callouts.
//!
//! Drawings describe bars as `"<count>φ<diameter>"` (e.g. `"3φ16"`) and
//! stirrups as `"φ<diameter>/<spacing cm>"` (e.g. `"φ8/20"`). `Ø` and the
//! ASCII spellings `fi`/`phi` are accepted too.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::errors::{CalcError, CalcResult};

static BARS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(\d+)\s*(?:φ|Φ|ø|Ø|phi|fi)\s*(\d+(?:[.,]\d+)?)\s*$").expect("bar pattern is valid")
});

static STIRRUPS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(?:\d+\s*)?(?:φ|Φ|ø|Ø|phi|fi)\s*(\d+(?:[.,]\d+)?)\s*/\s*(\d+(?:[.,]\d+)?)\s*$")
        .expect("stirrup pattern is valid")
});

fn parse_number(s: &str) -> Option<f64> {
    s.replace(',', ".").parse().ok()
}

/// Area of one bar (mm²)
pub fn bar_area(diameter_mm: f64) -> f64 {
    PI * diameter_mm * diameter_mm / 4.0
}

/// A group of identical longitudinal bars.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BarCallout {
    pub count: u32,
    pub diameter_mm: f64,
    /// Total area (mm²)
    pub area_mm2: f64,
}

impl BarCallout {
    pub fn new(count: u32, diameter_mm: f64) -> Self {
        BarCallout {
            count,
            diameter_mm,
            area_mm2: count as f64 * bar_area(diameter_mm),
        }
    }

    pub fn parse(callout: &str) -> CalcResult<Self> {
        let caps = BARS_RE
            .captures(callout)
            .ok_or_else(|| CalcError::parse_error("bar callout", callout))?;

        let count: u32 = caps[1]
            .parse()
            .map_err(|_| CalcError::parse_error("bar count", callout))?;
        let diameter = parse_number(&caps[2]).ok_or_else(|| CalcError::parse_error("bar diameter", callout))?;

        if count == 0 || diameter <= 0.0 {
            return Err(CalcError::invalid_input(
                "bar callout",
                callout,
                "count and diameter must be positive",
            ));
        }
        Ok(BarCallout::new(count, diameter))
    }

    /// Parse `callout`, substituting `fallback` when it does not parse.
    ///
    /// The substitution is reported through the returned warning so that
    /// callers can surface it next to the result.
    pub fn parse_or(callout: &str, fallback: BarCallout, role: &str) -> (BarCallout, Option<String>) {
        match BarCallout::parse(callout) {
            Ok(bars) => (bars, None),
            Err(e) => {
                let warning = format!("{} reinforcement: {}; assuming {}", role, e, fallback);
                log::warn!("{}", warning);
                (fallback, Some(warning))
            }
        }
    }

    /// Area in m²
    pub fn area_m2(&self) -> f64 {
        self.area_mm2 * 1e-6
    }
}

impl std::fmt::Display for BarCallout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}φ{}", self.count, self.diameter_mm)
    }
}

/// Stirrup diameter and spacing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stirrups {
    pub diameter_mm: f64,
    pub spacing_cm: f64,
}

impl Stirrups {
    pub fn parse(callout: &str) -> CalcResult<Self> {
        let caps = STIRRUPS_RE
            .captures(callout)
            .ok_or_else(|| CalcError::parse_error("stirrup callout", callout))?;

        let diameter_mm = parse_number(&caps[1]).ok_or_else(|| CalcError::parse_error("stirrup diameter", callout))?;
        let spacing_cm = parse_number(&caps[2]).ok_or_else(|| CalcError::parse_error("stirrup spacing", callout))?;
        Ok(Stirrups { diameter_mm, spacing_cm })
    }
}

/// Stirrup spacing (cm) from a callout like `"φ8/20"`.
pub fn parse_stirrup_spacing(callout: &str) -> CalcResult<f64> {
    Stirrups::parse(callout).map(|s| s.spacing_cm)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_variants() {
        for s in ["3φ16", "3Ø16", "3 fi 16", "3phi16", " 3 φ 16 "] {
            let bars = BarCallout::parse(s).unwrap();
            assert_eq!(bars.count, 3);
            assert_eq!(bars.diameter_mm, 16.0);
        }
        assert!((BarCallout::parse("3φ16").unwrap().area_mm2 - 603.19).abs() < 0.01);
        assert!((BarCallout::parse("4φ20").unwrap().area_mm2 - 1256.64).abs() < 0.01);
    }

    #[test]
    fn test_parse_failures() {
        for s in ["", "16", "three φ 16", "3x16", "0φ16"] {
            assert!(BarCallout::parse(s).is_err(), "{} should not parse", s);
        }
        assert_eq!(BarCallout::parse("3x16").unwrap_err().error_code(), "PARSE_ERROR");
    }

    #[test]
    fn test_fallback_is_announced() {
        let (bars, warning) = BarCallout::parse_or("tbd", BarCallout::new(3, 16.0), "Bottom");
        assert_eq!(bars, BarCallout::new(3, 16.0));
        let warning = warning.unwrap();
        assert!(warning.contains("Bottom"));
        assert!(warning.contains("3φ16"));

        let (_, none) = BarCallout::parse_or("2φ12", BarCallout::new(3, 16.0), "Top");
        assert!(none.is_none());
    }

    #[test]
    fn test_stirrups() {
        let s = Stirrups::parse("φ8/20").unwrap();
        assert_eq!(s.diameter_mm, 8.0);
        assert_eq!(s.spacing_cm, 20.0);
        assert_eq!(parse_stirrup_spacing("2Ø10/15").unwrap(), 15.0);
        assert!(parse_stirrup_spacing("φ8").is_err());
    }
}
