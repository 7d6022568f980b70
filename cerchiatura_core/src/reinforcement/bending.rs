//! # Arch Geometry and Profile Bending
//!
//! Radius and developed length of arched openings, and the feasibility of
//! bending ("calandratura") a steel profile to follow the intrados.
//!
//! Bending feasibility is judged on the radius-to-depth ratio r/h and on the
//! residual stress `σ = E·h/(2R)` compared with the yield strength.
//!
//! All lengths are in centimeters unless a name says otherwise.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::constants::{
    steel_fyk, RH_CRITICAL, RH_MIN_COLD, RH_MIN_HOT, RH_MIN_PREHEAT, STEEL_E, STRESS_RATIO_CRITICAL,
    STRESS_RATIO_HIGH, STRESS_RATIO_MODERATE,
};
use crate::geometry::{ArchGeometry, ArchType, Opening, OpeningType};

use super::profiles;

/// Profile depth assumed when the designation is unknown (mm)
pub const DEFAULT_PROFILE_DEPTH_MM: f64 = 200.0;
/// Longest straight segment when an arch is discretised (cm)
pub const MAX_SEGMENT_LENGTH_CM: f64 = 100.0;
/// Cutting allowance on developed length
pub const WASTE_FACTOR: f64 = 1.05;
/// Linear mass used when the profile is unknown (kg/m)
pub const DEFAULT_MASS_PER_M: f64 = 40.0;
/// kg/m per cm² of section (steel density 7850 kg/m³)
const STEEL_KG_PER_M_PER_CM2: f64 = 0.785;

// ============================================================================
// Arch geometry
// ============================================================================

/// Radius of curvature of the arch (cm).
pub fn arch_radius(kind: ArchType, width: f64, rise: f64) -> f64 {
    match kind {
        ArchType::FullCentre => width / 2.0,
        ArchType::Segmental => {
            if rise <= 0.0 {
                return 0.0;
            }
            (rise * rise + (width / 2.0).powi(2)) / (2.0 * rise)
        }
        ArchType::Pointed => 0.75 * width,
        // Mean radius of the basket-handle curves
        ArchType::Polycentric => (width / 2.0 + rise) / 2.0,
    }
}

/// Developed length of the arch (cm).
pub fn arch_length(kind: ArchType, width: f64, rise: f64) -> f64 {
    match kind {
        ArchType::FullCentre => PI * width / 2.0,
        ArchType::Segmental => {
            let r = arch_radius(kind, width, rise);
            if r <= 0.0 {
                return 0.0;
            }
            r * 2.0 * (width / (2.0 * r)).clamp(-1.0, 1.0).asin()
        }
        ArchType::Pointed => {
            let r = arch_radius(kind, width, rise);
            2.0 * r * (width / (2.0 * r)).acos()
        }
        ArchType::Polycentric => {
            // Half of Ramanujan's ellipse perimeter
            let a = width / 2.0;
            let b = rise;
            if a + b <= 0.0 {
                return 0.0;
            }
            let h = (a - b).powi(2) / (a + b).powi(2);
            PI * (a + b) * (1.0 + 3.0 * h / (10.0 + (4.0 - 3.0 * h).sqrt())) / 2.0
        }
    }
}

/// Arch data of an opening, if it is an arched one.
pub fn opening_arch(opening: &Opening) -> Option<ArchGeometry> {
    match (opening.kind, opening.arch) {
        (OpeningType::Arched, Some(arch)) => Some(arch),
        _ => None,
    }
}

/// Radius of an arched opening, zero otherwise.
pub fn opening_arch_radius(opening: &Opening) -> f64 {
    opening_arch(opening)
        .map(|a| arch_radius(a.kind, opening.width, a.rise))
        .unwrap_or(0.0)
}

/// Developed length of an arched opening, zero otherwise.
pub fn opening_arch_length(opening: &Opening) -> f64 {
    opening_arch(opening)
        .map(|a| arch_length(a.kind, opening.width, a.rise))
        .unwrap_or(0.0)
}

/// Circle through the springings and crown: `R = (L² + 4f²) / (8f)`.
pub fn radius_from_span_and_rise(span: f64, rise: f64) -> f64 {
    if rise <= 0.0 {
        return 0.0;
    }
    (span * span + 4.0 * rise * rise) / (8.0 * rise)
}

/// Number of segments for a discretised arch: at least three, always odd.
pub fn bending_segments(arc_length: f64, max_segment_length: f64) -> usize {
    let n = if max_segment_length > 0.0 {
        (arc_length / max_segment_length).ceil().max(0.0) as usize
    } else {
        0
    };
    let n = n.max(3);
    if n % 2 == 0 {
        n + 1
    } else {
        n
    }
}

// ============================================================================
// Bendability
// ============================================================================

/// Recommended way to bend a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BendingRecommendation {
    /// Radius too tight, the profile would fail
    NotBendable,
    HotRequired,
    HotRecommended,
    ColdPossible,
    ColdStandard,
}

impl BendingRecommendation {
    pub fn description(&self) -> &'static str {
        match self {
            BendingRecommendation::NotBendable => "Not bendable: radius too tight",
            BendingRecommendation::HotRequired => "Hot bending required",
            BendingRecommendation::HotRecommended => "Hot bending recommended",
            BendingRecommendation::ColdPossible => "Cold bending possible",
            BendingRecommendation::ColdStandard => "Standard cold bending",
        }
    }

    /// Classification by r/h
    pub fn from_ratio(r_h: f64) -> Self {
        if r_h < RH_CRITICAL {
            BendingRecommendation::NotBendable
        } else if r_h < RH_MIN_HOT {
            BendingRecommendation::HotRequired
        } else if r_h < RH_MIN_PREHEAT {
            BendingRecommendation::HotRecommended
        } else if r_h < RH_MIN_COLD {
            BendingRecommendation::ColdPossible
        } else {
            BendingRecommendation::ColdStandard
        }
    }
}

/// Outcome of a bendability check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BendabilityResult {
    pub bendable: bool,
    pub method: BendingRecommendation,
    pub r_h_ratio: f64,
    /// MPa
    pub residual_stress: f64,
    pub stress_ratio: f64,
    pub warnings: Vec<String>,
}

/// Can `profile` be bent to `radius_cm` in the given steel grade?
pub fn check_bendability(profile: &str, radius_cm: f64, steel_grade: &str) -> BendabilityResult {
    let mut warnings = Vec::new();

    let h_mm = match profiles::lookup(profile) {
        Ok(p) => p.h,
        Err(_) => {
            warnings.push(format!(
                "Cannot determine depth of profile '{}', assuming {} mm",
                profile, DEFAULT_PROFILE_DEPTH_MM
            ));
            DEFAULT_PROFILE_DEPTH_MM
        }
    };

    let r_h = radius_cm / (h_mm / 10.0);
    let method = BendingRecommendation::from_ratio(r_h);
    let mut bendable = method != BendingRecommendation::NotBendable;

    match method {
        BendingRecommendation::NotBendable => {
            warnings.push(format!("r/h = {:.1} < {} - risk of failure", r_h, RH_CRITICAL));
        }
        BendingRecommendation::HotRequired => {
            warnings.push(format!("r/h = {:.1} < {} - hot bending only", r_h, RH_MIN_HOT));
            warnings.push("Check availability at a specialised workshop".to_string());
        }
        BendingRecommendation::HotRecommended => {
            warnings.push(format!("r/h = {:.1} < {} - hot bending preferable", r_h, RH_MIN_PREHEAT));
            warnings.push("Cold bending possible with preheating".to_string());
        }
        BendingRecommendation::ColdPossible => {
            warnings.push("Check the capacity of the bending machine".to_string());
        }
        BendingRecommendation::ColdStandard => {}
    }

    let radius_m = radius_cm / 100.0;
    let residual_stress = if radius_m > 0.0 {
        STEEL_E * (h_mm / 1000.0) / (2.0 * radius_m)
    } else {
        f64::INFINITY
    };
    let stress_ratio = residual_stress / steel_fyk(steel_grade);

    if stress_ratio > STRESS_RATIO_CRITICAL {
        warnings.push(format!("Very high residual stresses ({:.0}% fy)", stress_ratio * 100.0));
        warnings.push("Risk of failure during bending".to_string());
        bendable = false;
    } else if stress_ratio > STRESS_RATIO_HIGH {
        warnings.push(format!("High residual stresses ({:.0}% fy)", stress_ratio * 100.0));
        warnings.push("Post-bending heat treatment required".to_string());
    } else if stress_ratio > STRESS_RATIO_MODERATE {
        warnings.push(format!("Moderate residual stresses ({:.0}% fy)", stress_ratio * 100.0));
        warnings.push("Check the effect on fatigue strength".to_string());
    }

    BendabilityResult {
        bendable,
        method,
        r_h_ratio: r_h,
        residual_stress,
        stress_ratio,
        warnings,
    }
}

// ============================================================================
// Material take-off
// ============================================================================

/// Steel needed for a bent reinforcement.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MaterialQuantity {
    pub steel_length_m: f64,
    pub weight_kg: f64,
    pub welding_length_m: f64,
}

/// Developed length with cutting allowance, weight, and batten welds
/// (one batten every 60 cm, four 8 cm fillets each) when profiles are coupled.
pub fn material_quantity(opening: &Opening, profile: &str, n_profiles: u32) -> MaterialQuantity {
    let arc_length = opening_arch_length(opening);
    let steel_length_m = arc_length * WASTE_FACTOR / 100.0 * n_profiles as f64;
    let kg_per_m = profiles::lookup(profile)
        .map(|p| p.a * STEEL_KG_PER_M_PER_CM2)
        .unwrap_or(DEFAULT_MASS_PER_M);

    let welding_length_m = if n_profiles > 1 {
        (arc_length / 60.0).floor() * 4.0 * 0.08
    } else {
        0.0
    };

    MaterialQuantity {
        steel_length_m,
        weight_kg: steel_length_m * kg_per_m,
        welding_length_m,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn arched(kind: ArchType, width: f64, rise: f64) -> Opening {
        let mut o = Opening::rectangular(0.0, 0.0, width, 250.0);
        o.kind = OpeningType::Arched;
        o.arch = Some(ArchGeometry { kind, rise });
        o
    }

    #[test]
    fn test_arch_radius_by_type() {
        assert_eq!(arch_radius(ArchType::FullCentre, 120.0, 60.0), 60.0);
        assert_relative_eq!(arch_radius(ArchType::Segmental, 120.0, 30.0), 75.0, epsilon = 1e-9);
        assert_eq!(arch_radius(ArchType::Pointed, 120.0, 0.0), 90.0);
        assert_eq!(arch_radius(ArchType::Polycentric, 120.0, 40.0), 50.0);
        assert_eq!(arch_radius(ArchType::Segmental, 120.0, 0.0), 0.0);
    }

    #[test]
    fn test_arch_length_by_type() {
        assert_relative_eq!(arch_length(ArchType::FullCentre, 120.0, 60.0), PI * 60.0, epsilon = 1e-9);

        // Segmental with rise = half span is a semicircle
        assert_relative_eq!(arch_length(ArchType::Segmental, 120.0, 60.0), PI * 60.0, max_relative = 1e-9);

        let pointed = arch_length(ArchType::Pointed, 120.0, 0.0);
        assert_relative_eq!(pointed, 2.0 * 90.0 * (120.0f64 / 180.0).acos(), epsilon = 1e-9);

        // Circle case of the ellipse formula: a = b = 60
        assert_relative_eq!(arch_length(ArchType::Polycentric, 120.0, 60.0), PI * 60.0, max_relative = 1e-9);
    }

    #[test]
    fn test_opening_helpers_ignore_rectangular() {
        let rect = Opening::rectangular(0.0, 0.0, 120.0, 210.0);
        assert_eq!(opening_arch_radius(&rect), 0.0);
        assert_eq!(opening_arch_length(&rect), 0.0);

        let arch = arched(ArchType::FullCentre, 120.0, 60.0);
        assert_eq!(opening_arch_radius(&arch), 60.0);
    }

    #[test]
    fn test_radius_from_span_and_rise() {
        assert_relative_eq!(radius_from_span_and_rise(120.0, 60.0), 60.0, epsilon = 1e-9);
        assert_relative_eq!(radius_from_span_and_rise(120.0, 30.0), 75.0, epsilon = 1e-9);
        assert_eq!(radius_from_span_and_rise(120.0, 0.0), 0.0);
    }

    #[test]
    fn test_bending_segments_odd_and_at_least_three() {
        assert_eq!(bending_segments(50.0, 100.0), 3);
        assert_eq!(bending_segments(350.0, 100.0), 5);
        assert_eq!(bending_segments(401.0, 100.0), 5);
        assert_eq!(bending_segments(650.0, 100.0), 7);
    }

    #[test]
    fn test_bendability_thresholds() {
        // HEA 160: h = 152 mm
        let tight = check_bendability("HEA 160", 100.0, "S235");
        assert!(!tight.bendable);
        assert_eq!(tight.method, BendingRecommendation::NotBendable);

        let wide = check_bendability("HEA 160", 1000.0, "S235");
        assert_eq!(wide.method, BendingRecommendation::ColdStandard);
        assert_relative_eq!(wide.r_h_ratio, 1000.0 / 15.2, epsilon = 1e-9);
        // σ = 210000 · 0.152 / 20 = 1596 MPa, far beyond fy
        assert!(!wide.bendable);
        assert!(wide.stress_ratio > 0.8);
    }

    #[test]
    fn test_bendability_residual_stress() {
        // IPE 100 (h = 100 mm) on R = 60 m: σ = 175 MPa, ratio 0.745 on S235
        let r = check_bendability("IPE 100", 6000.0, "S235");
        assert_relative_eq!(r.residual_stress, 175.0, epsilon = 1e-9);
        assert!(r.bendable);
        assert!(r.warnings.iter().any(|w| w.contains("heat treatment")));

        // Same radius in S355 drops below 0.5
        let r = check_bendability("IPE 100", 6000.0, "S355");
        assert!(r.warnings.iter().any(|w| w.contains("Moderate")));
    }

    #[test]
    fn test_unknown_profile_uses_default_depth() {
        let r = check_bendability("XYZ 1", 2000.0, "S235");
        assert_relative_eq!(r.r_h_ratio, 100.0, epsilon = 1e-9);
        assert!(r.warnings[0].contains("200 mm"));
    }

    #[test]
    fn test_material_quantity() {
        let arch = arched(ArchType::FullCentre, 120.0, 60.0);
        let q = material_quantity(&arch, "HEA 160", 2);
        let expected_len = PI * 60.0 * 1.05 / 100.0 * 2.0;
        assert_relative_eq!(q.steel_length_m, expected_len, epsilon = 1e-9);
        assert_relative_eq!(q.weight_kg, expected_len * 38.8 * 0.785, epsilon = 1e-9);
        assert_relative_eq!(q.welding_length_m, 3.0 * 4.0 * 0.08, epsilon = 1e-9);

        let single = material_quantity(&arch, "unknown", 1);
        assert_eq!(single.welding_length_m, 0.0);
        assert_relative_eq!(single.weight_kg, single.steel_length_m * 40.0, epsilon = 1e-9);
    }
}
