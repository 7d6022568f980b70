//! # Masonry Shear Resistance
//!
//! The three in-plane failure mechanisms of an unreinforced masonry pier
//! (NTC 2018 §8.7.1, Circolare §C8.7.1.3):
//!
//! - `V_t1`: diagonal cracking (Turnšek–Čačovič), capped at `0.065·fcm·A`
//! - `V_t2`: diagonal cracking corrected by the shape factor `b`
//! - `V_t3`: flexure / rocking at the toe
//!
//! Degenerate inputs return zeros instead of errors; the validation module
//! is responsible for reporting them.
//!
//! ## Example
//!
//! ```rust
//! use cerchiatura_core::masonry::resistance::{calculate_resistance, PartialFactors, PierSection, ShearStrength};
//!
//! let section = PierSection::new(2.0, 2.7, 0.3);
//! let strength = ShearStrength { fcm: 2.4, tau0: 0.074 };
//! let factors = PartialFactors { gamma_m: 2.0, fc: 1.35 };
//!
//! let result = calculate_resistance(&section, 150.0, 0.0, &strength, &factors);
//! assert!((result.sigma_0 - 0.25).abs() < 1e-9);
//! assert!(result.v_min > 0.0);
//! ```

use serde::{Deserialize, Serialize};

use crate::constants::{LONG_DURATION_COEFF, VT1_LIMIT_COEFF};
use crate::geometry::{area, aspect_ratio, section_modulus};

/// Pier cross-section in meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PierSection {
    pub length: f64,
    pub height: f64,
    pub thickness: f64,
}

impl PierSection {
    pub fn new(length: f64, height: f64, thickness: f64) -> Self {
        PierSection { length, height, thickness }
    }

    pub fn area(&self) -> f64 {
        area(self.length, self.thickness)
    }
}

/// Masonry strengths (MPa)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShearStrength {
    pub fcm: f64,
    pub tau0: f64,
}

/// Material partial factor and confidence factor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PartialFactors {
    pub gamma_m: f64,
    pub fc: f64,
}

impl PartialFactors {
    /// `γ_m · FC`
    pub fn gamma_tot(&self) -> f64 {
        self.gamma_m * self.fc
    }
}

/// Shear capacities (kN) and the intermediate values used to derive them.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ResistanceResult {
    #[serde(rename = "V_t1")]
    pub v_t1: f64,
    #[serde(rename = "V_t2")]
    pub v_t2: f64,
    #[serde(rename = "V_t3")]
    pub v_t3: f64,
    #[serde(rename = "V_min")]
    pub v_min: f64,
    /// Mean compressive stress (MPa)
    pub sigma_0: f64,
    /// Edge compressive stress including eccentricity (MPa)
    pub sigma_max: f64,
    pub b_factor: f64,
    #[serde(rename = "h_L_ratio")]
    pub h_l_ratio: f64,
}

/// Mean vertical stress `N/(A·1000)` (MPa), zero for a degenerate area
pub fn sigma_0(n: f64, area: f64) -> f64 {
    if area <= 0.0 {
        0.0
    } else {
        n / (area * 1000.0)
    }
}

/// Edge stress `σ0 + |N·e|/(W·1000)` (MPa), never negative
pub fn sigma_max(n: f64, e: f64, area: f64, length: f64) -> f64 {
    let s0 = sigma_0(n, area);
    let w = section_modulus(area, length);
    let bending = if w > 0.0 { (n * e).abs() / (w * 1000.0) } else { 0.0 };
    (s0 + bending).max(0.0)
}

/// Shape factor `b = 1.5 − (h/L)/3`, clamped to `[1.0, 1.5]`; 1.0 when `h/L ≥ 1.5`.
pub fn b_factor(height: f64, length: f64) -> f64 {
    if length <= 0.0 {
        return 1.0;
    }
    let ratio = height / length;
    if ratio >= 1.5 {
        1.0
    } else {
        (1.5 - ratio / 3.0).clamp(1.0, 1.5)
    }
}

/// Diagonal cracking capacity (kN).
pub fn v_t1(area: f64, tau0: f64, fcm: f64, sigma_0: f64, gamma_tot: f64) -> f64 {
    if area <= 0.0 || tau0 <= 0.0 || gamma_tot <= 0.0 {
        return 0.0;
    }
    let base = area * tau0 * (1.0 + sigma_0 / tau0).sqrt() * 1000.0;
    let limit = area * VT1_LIMIT_COEFF * fcm * 1000.0;
    base.min(limit) / gamma_tot
}

/// Flexure/rocking capacity (kN). Zero when the edge stress reaches `0.85·fcm`.
pub fn v_t3(area: f64, fcm: f64, sigma_max: f64, gamma_tot: f64) -> f64 {
    if area <= 0.0 || fcm <= 0.0 || gamma_tot <= 0.0 {
        return 0.0;
    }
    let fcm_reduced = LONG_DURATION_COEFF * fcm;
    if sigma_max >= fcm_reduced {
        return 0.0;
    }
    let mu = 1.0 - sigma_max / fcm_reduced;
    area * fcm * mu * 1000.0 / gamma_tot
}

/// Governing capacity. A zero `V_t3` means the rocking mechanism is not
/// activated and is left out of the minimum.
pub fn governing(v_t1: f64, v_t2: f64, v_t3: f64) -> f64 {
    if v_t3 > 0.0 {
        v_t1.min(v_t2).min(v_t3)
    } else {
        v_t1.min(v_t2)
    }
}

/// Compute all three mechanisms for one pier.
///
/// * `n` - vertical load (kN)
/// * `e` - eccentricity (m)
pub fn calculate_resistance(
    section: &PierSection,
    n: f64,
    e: f64,
    strength: &ShearStrength,
    factors: &PartialFactors,
) -> ResistanceResult {
    let a = section.area();
    let gamma_tot = factors.gamma_tot();

    let s0 = sigma_0(n, a);
    let smax = sigma_max(n, e, a, section.length);
    let b = b_factor(section.height, section.length);

    let vt1 = v_t1(a, strength.tau0, strength.fcm, s0, gamma_tot);
    let vt2 = vt1 * b;
    let vt3 = v_t3(a, strength.fcm, smax, gamma_tot);

    let h_l_ratio = aspect_ratio(section.height, section.length);

    ResistanceResult {
        v_t1: vt1,
        v_t2: vt2,
        v_t3: vt3,
        v_min: governing(vt1, vt2, vt3),
        sigma_0: s0,
        sigma_max: smax,
        b_factor: b,
        h_l_ratio: if h_l_ratio.is_finite() { h_l_ratio } else { 0.0 },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn strength() -> ShearStrength {
        ShearStrength { fcm: 2.4, tau0: 0.074 }
    }

    fn factors() -> PartialFactors {
        PartialFactors { gamma_m: 2.0, fc: 1.35 }
    }

    #[test]
    fn test_reference_pier() {
        let section = PierSection::new(2.0, 2.7, 0.3);
        let r = calculate_resistance(&section, 150.0, 0.0, &strength(), &factors());

        assert_relative_eq!(r.sigma_0, 0.25, epsilon = 1e-12);
        assert_relative_eq!(r.b_factor, 1.05, epsilon = 1e-12);
        // base = 0.6·0.074·√(1 + 0.25/0.074)·1000 = 92.90, limit = 93.6
        assert!((r.v_t1 - 92.90 / 2.7).abs() < 0.05);
        assert_relative_eq!(r.v_t2, r.v_t1 * 1.05, epsilon = 1e-9);
        assert!((r.v_t3 - 467.97).abs() < 0.1);
        assert_relative_eq!(r.v_min, r.v_t1, epsilon = 1e-12);
        assert!(r.v_t1 > 0.0 && r.v_t2 > 0.0 && r.v_t3 > 0.0);
    }

    #[test]
    fn test_zero_vertical_load() {
        let section = PierSection::new(2.0, 2.7, 0.3);
        let r = calculate_resistance(&section, 0.0, 0.0, &strength(), &factors());
        assert_eq!(r.sigma_0, 0.0);
        assert_eq!(r.sigma_max, 0.0);
        // Pure cohesion: 0.6·0.074·1000 / 2.7
        assert_relative_eq!(r.v_t1, 44.4 / 2.7, epsilon = 1e-9);
        assert_relative_eq!(r.v_t3, 0.6 * 2.4 * 1000.0 / 2.7, epsilon = 1e-9);
    }

    #[test]
    fn test_vt1_capped_by_fcm_limit() {
        // High compression pushes the base formula above 0.065·fcm·A
        let a = 0.6;
        let capped = v_t1(a, 0.074, 2.4, 1.5, 1.0);
        assert_relative_eq!(capped, a * 0.065 * 2.4 * 1000.0, epsilon = 1e-9);
    }

    #[test]
    fn test_fully_compressed_section_excludes_vt3() {
        // σmax = 700/300 = 2.33 MPa ≥ 0.85·2.4 = 2.04 MPa
        let section = PierSection::new(1.0, 2.7, 0.3);
        let n = 700.0;
        let r = calculate_resistance(&section, n, 0.0, &strength(), &factors());
        assert_eq!(r.v_t3, 0.0);
        assert_relative_eq!(r.v_min, r.v_t1.min(r.v_t2), epsilon = 1e-12);
        assert!(r.v_min > 0.0);
    }

    #[test]
    fn test_eccentricity_raises_edge_stress() {
        let section = PierSection::new(2.0, 2.7, 0.3);
        let centred = calculate_resistance(&section, 150.0, 0.0, &strength(), &factors());
        let eccentric = calculate_resistance(&section, 150.0, 0.05, &strength(), &factors());
        // W = 0.2 m³: Δσ = 150·0.05/200 = 0.0375 MPa
        assert_relative_eq!(eccentric.sigma_max - centred.sigma_max, 0.0375, epsilon = 1e-12);
        assert!(eccentric.v_t3 < centred.v_t3);
    }

    #[test]
    fn test_b_factor_bounds() {
        for &(h, l) in &[(0.1, 10.0), (1.0, 1.0), (2.7, 2.0), (3.0, 2.0), (10.0, 0.5), (0.0, 1.0)] {
            let b = b_factor(h, l);
            assert!((1.0..=1.5).contains(&b));
            if h / l >= 1.5 {
                assert_eq!(b, 1.0);
            }
        }
        assert_eq!(b_factor(2.7, 0.0), 1.0);
    }

    #[test]
    fn test_vt2_never_below_vt1() {
        for &l in &[0.5, 1.0, 2.0, 4.0] {
            let r = calculate_resistance(&PierSection::new(l, 2.7, 0.3), 80.0, 0.0, &strength(), &factors());
            assert!(r.v_t2 >= r.v_t1);
        }
    }

    #[test]
    fn test_degenerate_inputs_return_zero() {
        let r = calculate_resistance(&PierSection::new(0.0, 2.7, 0.3), 150.0, 0.0, &strength(), &factors());
        assert_eq!(r.v_t1, 0.0);
        assert_eq!(r.v_t3, 0.0);
        assert_eq!(r.v_min, 0.0);
        assert_eq!(v_t1(0.6, 0.0, 2.4, 0.25, 2.7), 0.0);
        assert_eq!(v_t1(0.6, 0.074, 2.4, 0.25, 0.0), 0.0);
        assert_eq!(sigma_0(150.0, 0.0), 0.0);
    }
}
