//! # Input Validation
//!
//! Plausibility checks on wall geometry, masonry parameters and loads.
//! Non-positive dimensions, missing values and loads outside the section are
//! hard errors; everything else that looks unusual is a warning and the
//! calculation proceeds.

use serde::{Deserialize, Serialize};

use crate::constants::{ECCENTRICITY_LIMIT_RATIO, SLENDERNESS_MAX};
use crate::geometry::Wall;
use crate::masonry::{Loads, MasonryProperties};

/// Length band (cm)
pub const LENGTH_RANGE: (f64, f64) = (10.0, 2000.0);
/// Height band (cm)
pub const HEIGHT_RANGE: (f64, f64) = (50.0, 1000.0);
/// Thickness band (cm)
pub const THICKNESS_RANGE: (f64, f64) = (10.0, 200.0);
/// Mean compressive strength band (MPa)
pub const FCM_RANGE: (f64, f64) = (0.5, 20.0);
/// Shear strength band (MPa)
pub const TAU0_RANGE: (f64, f64) = (0.01, 0.5);
/// Elastic modulus band (MPa)
pub const E_RANGE: (f64, f64) = (100.0, 10000.0);
/// Expected fcm/tau0 ratio
pub const FCM_TAU0_RATIO_RANGE: (f64, f64) = (10.0, 100.0);

/// Outcome of a validation pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl Default for ValidationResult {
    fn default() -> Self {
        ValidationResult {
            is_valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

impl ValidationResult {
    pub fn add_error(&mut self, message: impl Into<String>) {
        self.is_valid = false;
        self.errors.push(message.into());
    }

    pub fn add_warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// Fold another result into this one
    pub fn merge(&mut self, other: ValidationResult) {
        self.is_valid &= other.is_valid;
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }
}

fn check_dimension(result: &mut ValidationResult, name: &str, value: f64, range: (f64, f64), unit: &str) {
    if !value.is_finite() {
        result.add_error(format!("Missing or invalid {}", name));
    } else if value <= 0.0 {
        result.add_error(format!("{} must be positive (got {} {})", name, value, unit));
    } else if value < range.0 || value > range.1 {
        result.add_warning(format!(
            "{} = {} {} outside the usual range [{}, {}] {}",
            name, value, unit, range.0, range.1, unit
        ));
    }
}

/// Validate wall geometry (cm).
pub fn validate_wall(wall: &Wall) -> ValidationResult {
    let mut result = ValidationResult::default();

    check_dimension(&mut result, "length", wall.length, LENGTH_RANGE, "cm");
    check_dimension(&mut result, "height", wall.height, HEIGHT_RANGE, "cm");
    check_dimension(&mut result, "thickness", wall.thickness, THICKNESS_RANGE, "cm");

    // Slenderness is only meaningful once the dimensions are usable
    if result.is_valid {
        let slenderness = wall.height / wall.thickness;
        if slenderness > SLENDERNESS_MAX {
            result.add_warning(format!(
                "Slenderness h/t = {:.1} exceeds the limit of {:.0}",
                slenderness, SLENDERNESS_MAX
            ));
        }
    }

    result
}

/// Validate masonry mechanical parameters (MPa).
pub fn validate_masonry(masonry: &MasonryProperties) -> ValidationResult {
    let mut result = ValidationResult::default();

    check_dimension(&mut result, "fcm", masonry.fcm, FCM_RANGE, "MPa");
    check_dimension(&mut result, "tau0", masonry.tau0, TAU0_RANGE, "MPa");

    if let Some(e) = masonry.e {
        if !e.is_finite() || e <= 0.0 {
            result.add_error(format!("E must be positive (got {} MPa)", e));
        } else if e < E_RANGE.0 || e > E_RANGE.1 {
            result.add_warning(format!(
                "E = {} MPa outside the usual range [{}, {}] MPa",
                e, E_RANGE.0, E_RANGE.1
            ));
        }
    }

    if masonry.fcm > 0.0 && masonry.tau0 > 0.0 {
        let ratio = masonry.fcm / masonry.tau0;
        if ratio < FCM_TAU0_RATIO_RANGE.0 || ratio > FCM_TAU0_RATIO_RANGE.1 {
            result.add_warning(format!(
                "Unusual fcm/tau0 ratio {:.1} (expected {}-{})",
                ratio, FCM_TAU0_RATIO_RANGE.0, FCM_TAU0_RATIO_RANGE.1
            ));
        }
    }

    result
}

/// Validate loads against the wall thickness (cm).
pub fn validate_loads(loads: &Loads, thickness_cm: f64) -> ValidationResult {
    let mut result = ValidationResult::default();

    if !loads.vertical.is_finite() {
        result.add_error("Missing or invalid vertical load");
        return result;
    }
    if loads.vertical < 0.0 {
        result.add_warning(format!(
            "Vertical load N = {} kN is a tension force",
            loads.vertical
        ));
    }

    if thickness_cm > 0.0 {
        let e = loads.eccentricity.abs();
        let core_limit = thickness_cm * ECCENTRICITY_LIMIT_RATIO;
        let section_limit = thickness_cm / 2.0;
        if e > section_limit {
            result.add_error(format!(
                "Eccentricity {:.1} cm falls outside the section (t/2 = {:.1} cm)",
                e, section_limit
            ));
        } else if e > core_limit {
            result.add_warning(format!(
                "Eccentricity {:.1} cm exceeds t/6 = {:.1} cm: partially cracked section",
                e, core_limit
            ));
        }
    }

    result
}

/// Run every check and merge the results.
pub fn validate_all(wall: &Wall, masonry: &MasonryProperties, loads: Option<&Loads>) -> ValidationResult {
    let mut result = validate_wall(wall);
    result.merge(validate_masonry(masonry));
    if let Some(loads) = loads {
        result.merge(validate_loads(loads, wall.thickness));
    }
    for error in &result.errors {
        log::debug!("Validation error: {}", error);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn masonry() -> MasonryProperties {
        MasonryProperties::new(2.4, 0.074, 1410.0)
    }

    #[test]
    fn test_valid_wall() {
        let result = validate_wall(&Wall::new(200.0, 270.0, 30.0));
        assert!(result.is_valid);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_non_positive_dimension_is_error() {
        let result = validate_wall(&Wall::new(200.0, 0.0, 30.0));
        assert!(!result.is_valid);
        assert_eq!(result.errors.len(), 1);
    }

    #[test]
    fn test_out_of_band_is_warning() {
        let result = validate_wall(&Wall::new(2500.0, 270.0, 30.0));
        assert!(result.is_valid);
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_slenderness_warning() {
        let result = validate_wall(&Wall::new(200.0, 500.0, 20.0));
        assert!(result.is_valid);
        assert!(result.warnings.iter().any(|w| w.contains("Slenderness")));
    }

    #[test]
    fn test_masonry_ratio_warning() {
        let mut m = masonry();
        m.tau0 = 0.02;
        // 2.4 / 0.02 = 120
        let result = validate_masonry(&m);
        assert!(result.is_valid);
        assert!(result.warnings.iter().any(|w| w.contains("fcm/tau0")));
    }

    #[test]
    fn test_masonry_negative_tau0_is_error() {
        let mut m = masonry();
        m.tau0 = -0.1;
        assert!(!validate_masonry(&m).is_valid);
    }

    #[test]
    fn test_eccentricity_limits() {
        let core = validate_loads(&Loads::new(100.0, 6.0), 30.0);
        assert!(core.is_valid);
        assert!(core.warnings.iter().any(|w| w.contains("partially cracked")));

        let outside = validate_loads(&Loads::new(100.0, 16.0), 30.0);
        assert!(!outside.is_valid);

        let fine = validate_loads(&Loads::new(100.0, 4.0), 30.0);
        assert!(fine.is_valid && fine.warnings.is_empty());
    }

    #[test]
    fn test_tension_warning() {
        let result = validate_loads(&Loads::new(-20.0, 0.0), 30.0);
        assert!(result.is_valid);
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_validate_all_merges() {
        let result = validate_all(
            &Wall::new(-1.0, 270.0, 30.0),
            &masonry(),
            Some(&Loads::new(100.0, 20.0)),
        );
        assert!(!result.is_valid);
        assert_eq!(result.errors.len(), 2);
    }
}
