//! # Local Intervention Verification (NTC 2018 §8.4.1)
//!
//! An intervention is "local" when the wall's lateral stiffness changes by
//! no more than 15 % and its resistance drops by no more than 20 %.
//! Resistance increases are always accepted.
//!
//! ## Example
//!
//! ```rust
//! use cerchiatura_core::verifier::verify_local_intervention;
//!
//! let v = verify_local_intervention(10_000.0, 11_500.0, 200.0, 180.0);
//! assert!(v.stiffness_ok);
//! assert!(v.resistance_ok);
//! assert!(v.is_local);
//! assert!((v.resistance_variation + 10.0).abs() < 1e-9);
//! ```

use serde::{Deserialize, Serialize};

use crate::constants::{DELTA_K_MAX, DELTA_V_MAX, OPENING_RATIO_MAX, PIER_MIN_WIDTH_M};
use crate::geometry::{identify_piers, Opening, Wall};

/// Outcome of the stiffness/resistance comparison. Variations in %.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub is_local: bool,
    /// |ΔK|/K, always non-negative
    pub stiffness_variation: f64,
    pub stiffness_variation_limit: f64,
    /// Signed ΔV/V: positive for an increase
    pub resistance_variation: f64,
    /// Reduction only, zero for an increase
    pub resistance_variation_for_check: f64,
    /// Negative: the allowed reduction
    pub resistance_variation_limit: f64,
    pub stiffness_ok: bool,
    pub resistance_ok: bool,
    pub stiffness_ratio: f64,
    pub resistance_ratio: f64,
    pub message: String,
}

/// Compare the original and modified states of a wall.
///
/// A non-positive original value makes the corresponding variation zero.
pub fn verify_local_intervention(k_before: f64, k_after: f64, v_before: f64, v_after: f64) -> VerificationResult {
    let delta_k = if k_before > 0.0 {
        (k_after - k_before).abs() / k_before
    } else {
        0.0
    };

    let (delta_v_signed, delta_v_check) = if v_before > 0.0 {
        let signed = (v_after - v_before) / v_before;
        (signed, ((v_before - v_after) / v_before).max(0.0))
    } else {
        (0.0, 0.0)
    };

    let stiffness_ok = delta_k <= DELTA_K_MAX;
    let resistance_ok = delta_v_check <= DELTA_V_MAX.abs();
    let is_local = stiffness_ok && resistance_ok;

    let message = if is_local {
        "Local intervention (NTC 2018 §8.4.1)".to_string()
    } else {
        let mut reasons = Vec::new();
        if !stiffness_ok {
            reasons.push(format!("stiffness variation {:.1}% > {:.0}%", delta_k * 100.0, DELTA_K_MAX * 100.0));
        }
        if !resistance_ok {
            reasons.push(format!(
                "resistance reduction {:.1}% > {:.0}%",
                delta_v_check * 100.0,
                DELTA_V_MAX.abs() * 100.0
            ));
        }
        format!("Not a local intervention: {}", reasons.join(", "))
    };

    log::info!(
        "Verification: ΔK = {:.2}%, ΔV = {:+.2}% -> {}",
        delta_k * 100.0,
        delta_v_signed * 100.0,
        if is_local { "local" } else { "not local" }
    );

    VerificationResult {
        is_local,
        stiffness_variation: delta_k * 100.0,
        stiffness_variation_limit: DELTA_K_MAX * 100.0,
        resistance_variation: delta_v_signed * 100.0,
        resistance_variation_for_check: delta_v_check * 100.0,
        resistance_variation_limit: DELTA_V_MAX * 100.0,
        stiffness_ok,
        resistance_ok,
        stiffness_ratio: if k_before > 0.0 { k_after / k_before } else { 1.0 },
        resistance_ratio: if v_before > 0.0 { v_after / v_before } else { 1.0 },
        message,
    }
}

// ============================================================================
// Opening geometry
// ============================================================================

/// Opening area ratio and pier widths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpeningLimits {
    /// Opening area over wall elevation area (%)
    pub opening_ratio: f64,
    pub opening_ratio_ok: bool,
    pub min_pier_ok: bool,
    /// Required pier width (cm)
    pub min_pier_width: f64,
    /// Narrowest pier found (cm)
    pub narrowest_pier: Option<f64>,
    /// Indices of piers below the minimum width
    pub narrow_piers: Vec<usize>,
}

/// Check total opening area against 40 % of the wall elevation and every
/// pier against the minimum width.
pub fn verify_opening_limits(wall: &Wall, openings: &[Opening]) -> OpeningLimits {
    let wall_area = wall.elevation_area_m2();
    let opening_area: f64 = openings.iter().map(Opening::area_m2).sum();
    let ratio = if wall_area > 0.0 { opening_area / wall_area } else { 0.0 };

    let min_width_cm = PIER_MIN_WIDTH_M * 100.0;
    let piers = identify_piers(wall, openings);
    let narrow_piers: Vec<usize> = piers
        .iter()
        .filter(|p| p.length < min_width_cm)
        .map(|p| p.index)
        .collect();

    OpeningLimits {
        opening_ratio: ratio * 100.0,
        opening_ratio_ok: ratio <= OPENING_RATIO_MAX,
        min_pier_ok: narrow_piers.is_empty(),
        min_pier_width: min_width_cm,
        narrowest_pier: piers.min_length(),
        narrow_piers,
    }
}

// ============================================================================
// Safety factors
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SafetyFactors {
    pub resistance: f64,
    pub stiffness: f64,
    pub global: f64,
    pub is_safe: bool,
}

/// Capacity over demand for resistance and stiffness; infinite when the
/// demand is not positive.
pub fn calculate_safety_factors(v_design: f64, v_demand: f64, k_provided: f64, k_required: f64) -> SafetyFactors {
    let resistance = if v_demand > 0.0 { v_design / v_demand } else { f64::INFINITY };
    let stiffness = if k_required > 0.0 { k_provided / k_required } else { f64::INFINITY };
    SafetyFactors {
        resistance,
        stiffness,
        global: resistance.min(stiffness),
        is_safe: resistance >= 1.0 && stiffness >= 1.0,
    }
}

// ============================================================================
// Summary text
// ============================================================================

/// Human-readable report of a verification, with recommendations when the
/// intervention is not local.
pub fn verification_summary(result: &VerificationResult) -> String {
    let mut lines = Vec::new();

    if result.is_local {
        lines.push("[OK] The intervention qualifies as LOCAL under NTC 2018 §8.4.1".to_string());
    } else {
        lines.push("[FAIL] The intervention does NOT qualify as local".to_string());
    }
    lines.push(String::new());

    lines.push("STIFFNESS:".to_string());
    if result.stiffness_ok {
        lines.push(format!(
            "[OK] Stiffness variation: {:.1}% (limit ±{:.0}%)",
            result.stiffness_variation, result.stiffness_variation_limit
        ));
    } else {
        lines.push(format!(
            "[FAIL] Stiffness variation: {:.1}% EXCEEDS the ±{:.0}% limit",
            result.stiffness_variation, result.stiffness_variation_limit
        ));
    }
    lines.push(String::new());

    lines.push("RESISTANCE:".to_string());
    let variation = result.resistance_variation;
    if variation >= 0.0 {
        lines.push(format!("[OK] Resistance increase: +{:.1}%", variation));
    } else {
        lines.push(format!("Resistance reduction: {:.1}%", variation));
    }
    if result.resistance_ok {
        if variation < 0.0 {
            lines.push(format!(
                "[OK] Reduction acceptable (limit {:.0}%)",
                result.resistance_variation_limit
            ));
        } else {
            lines.push("[OK] An increase is always acceptable for local interventions".to_string());
        }
    } else {
        lines.push(format!(
            "[FAIL] Resistance reduction EXCEEDS the {:.0}% limit",
            result.resistance_variation_limit
        ));
    }

    if !result.is_local {
        lines.push(String::new());
        lines.push("RECOMMENDATIONS:".to_string());
        if !result.stiffness_ok {
            lines.push("- Stiffen the frames (larger profiles or sections)".to_string());
            lines.push("- Reduce the number or size of the openings".to_string());
        }
        if !result.resistance_ok {
            lines.push("- Limit the openings to secondary piers".to_string());
            lines.push("- Add further strengthening (FRP, reinforced plaster)".to_string());
        }
        lines.push(String::new());
        lines.push(
            "Otherwise classify the work as an improvement or seismic upgrade with global verifications."
                .to_string(),
        );
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stiffness_boundary_is_inclusive() {
        let at_limit = verify_local_intervention(100.0, 115.0, 100.0, 100.0);
        assert!((at_limit.stiffness_variation - 15.0).abs() < 1e-9);
        assert!(at_limit.stiffness_ok);
        assert!(at_limit.is_local);

        let over = verify_local_intervention(100.0, 115.0001, 100.0, 100.0);
        assert!(!over.stiffness_ok);
        assert!(!over.is_local);

        let softer = verify_local_intervention(100.0, 85.0, 100.0, 100.0);
        assert!(softer.stiffness_ok);
    }

    #[test]
    fn test_resistance_increase_always_accepted() {
        let v = verify_local_intervention(100.0, 100.0, 100.0, 180.0);
        assert!((v.resistance_variation - 80.0).abs() < 1e-9);
        assert_eq!(v.resistance_variation_for_check, 0.0);
        assert!(v.resistance_ok);
    }

    #[test]
    fn test_resistance_reduction_limit() {
        let ok = verify_local_intervention(100.0, 100.0, 100.0, 80.0);
        assert!((ok.resistance_variation + 20.0).abs() < 1e-9);
        assert!(ok.resistance_ok);

        let bad = verify_local_intervention(100.0, 100.0, 100.0, 79.0);
        assert!(!bad.resistance_ok);
        assert!(!bad.is_local);
        assert!(bad.message.contains("resistance reduction"));
    }

    #[test]
    fn test_degenerate_baseline() {
        let v = verify_local_intervention(0.0, 500.0, 0.0, 50.0);
        assert_eq!(v.stiffness_variation, 0.0);
        assert_eq!(v.resistance_variation, 0.0);
        assert_eq!(v.stiffness_ratio, 1.0);
        assert!(v.is_local);
    }

    #[test]
    fn test_opening_limits() {
        let wall = Wall::new(500.0, 300.0, 30.0);
        let openings = vec![
            Opening::rectangular(100.0, 0.0, 100.0, 210.0),
            Opening::rectangular(250.0, 0.0, 100.0, 210.0),
        ];
        let r = verify_opening_limits(&wall, &openings);
        // 2 × 2.1 m² over 15 m²
        assert!((r.opening_ratio - 28.0).abs() < 1e-9);
        assert!(r.opening_ratio_ok);
        // Piers: 100, 50, 150 cm
        assert!(!r.min_pier_ok);
        assert_eq!(r.narrow_piers, vec![1]);
        assert_eq!(r.narrowest_pier, Some(50.0));
    }

    #[test]
    fn test_opening_ratio_cap() {
        let wall = Wall::new(400.0, 250.0, 30.0);
        let openings = vec![Opening::rectangular(100.0, 0.0, 200.0, 210.0)];
        let r = verify_opening_limits(&wall, &openings);
        assert!(r.opening_ratio > 40.0);
        assert!(!r.opening_ratio_ok);
        assert!(r.min_pier_ok);
    }

    #[test]
    fn test_safety_factors() {
        let s = calculate_safety_factors(150.0, 100.0, 800.0, 1000.0);
        assert!((s.resistance - 1.5).abs() < 1e-12);
        assert!((s.stiffness - 0.8).abs() < 1e-12);
        assert!((s.global - 0.8).abs() < 1e-12);
        assert!(!s.is_safe);

        let free = calculate_safety_factors(150.0, 0.0, 800.0, -1.0);
        assert!(free.resistance.is_infinite() && free.stiffness.is_infinite());
        assert!(free.is_safe);
    }

    #[test]
    fn test_summary_text() {
        let ok = verification_summary(&verify_local_intervention(100.0, 105.0, 100.0, 120.0));
        assert!(ok.starts_with("[OK]"));
        assert!(ok.contains("+20.0%"));
        assert!(!ok.contains("RECOMMENDATIONS"));

        let bad = verification_summary(&verify_local_intervention(100.0, 150.0, 100.0, 50.0));
        assert!(bad.starts_with("[FAIL]"));
        assert!(bad.contains("Stiffen the frames"));
        assert!(bad.contains("secondary piers"));
    }
}
