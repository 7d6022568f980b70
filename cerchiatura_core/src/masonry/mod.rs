//! # Masonry Calculator
//!
//! Drives validation, pier segmentation, resistance and stiffness for one
//! masonry wall. The calculator owns the safety factors (`γ_m`, `FC`) and the
//! project context (loads and boundary conditions) for a calculation run.
//!
//! ## Example
//!
//! ```rust
//! use cerchiatura_core::geometry::Wall;
//! use cerchiatura_core::masonry::{Loads, MasonryCalculator, MasonryProperties, ProjectContext};
//!
//! let mut calc = MasonryCalculator::new();
//! calc.set_project_data(ProjectContext {
//!     fc: 1.35,
//!     loads: Loads::new(150.0, 0.0),
//!     ..Default::default()
//! });
//!
//! let wall = Wall::new(200.0, 270.0, 30.0);
//! let masonry = MasonryProperties::new(2.4, 0.074, 1410.0);
//!
//! let v = calc.calculate_resistance(&wall, &masonry, None);
//! assert!(v.v_t1 > 0.0 && v.v_t2 > v.v_t1);
//! assert!(calc.calculate_stiffness(&wall, &masonry, None) > 0.0);
//! ```

pub mod resistance;
pub mod stiffness;

use serde::{Deserialize, Serialize};

use crate::constants::{GAMMA_M_MASONRY, MASONRY_UNIT_WEIGHT};
use crate::geometry::{identify_piers, distribute_load, moment_of_inertia, slenderness, Opening, PierSet, Wall};
use crate::units::{Centimeters, Meters};
use crate::validation::{validate_all, ValidationResult};

use resistance::{governing, PartialFactors, PierSection, ResistanceResult, ShearStrength};
use stiffness::{Moduli, StiffnessResult};

pub const CALCULATOR_VERSION: &str = "2.0.0";

/// Default elastic modulus when none is given (MPa)
pub const DEFAULT_E: f64 = 1410.0;

// ============================================================================
// Input Types
// ============================================================================

/// Mechanical parameters of the masonry (MPa, kN/m³).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MasonryProperties {
    #[serde(default = "default_fcm")]
    pub fcm: f64,
    #[serde(default = "default_tau0")]
    pub tau0: f64,
    #[serde(rename = "E", alias = "e", default = "default_e")]
    pub e: Option<f64>,
    #[serde(rename = "G", alias = "g", default)]
    pub g: Option<f64>,
    /// Unit weight (kN/m³)
    #[serde(alias = "gamma", default)]
    pub w: Option<f64>,
    /// Key into the materials database, if the values came from one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,
}

fn default_fcm() -> f64 {
    2.0
}

fn default_tau0() -> f64 {
    0.074
}

fn default_e() -> Option<f64> {
    Some(DEFAULT_E)
}

impl Default for MasonryProperties {
    fn default() -> Self {
        MasonryProperties {
            fcm: default_fcm(),
            tau0: default_tau0(),
            e: default_e(),
            g: None,
            w: None,
            material: None,
        }
    }
}

impl MasonryProperties {
    pub fn new(fcm: f64, tau0: f64, e: f64) -> Self {
        MasonryProperties {
            fcm,
            tau0,
            e: Some(e),
            ..Default::default()
        }
    }

    pub fn with_shear_modulus(mut self, g: f64) -> Self {
        self.g = Some(g);
        self
    }

    pub fn e_or_default(&self) -> f64 {
        self.e.unwrap_or(DEFAULT_E)
    }

    pub fn unit_weight(&self) -> f64 {
        self.w.unwrap_or(MASONRY_UNIT_WEIGHT)
    }

    pub fn moduli(&self) -> Moduli {
        Moduli::new(self.e_or_default(), self.g)
    }

    pub fn strength(&self) -> ShearStrength {
        ShearStrength {
            fcm: self.fcm,
            tau0: self.tau0,
        }
    }
}

/// Vertical load (kN) and its eccentricity (cm).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Loads {
    #[serde(alias = "N", default)]
    pub vertical: f64,
    #[serde(alias = "e", default)]
    pub eccentricity: f64,
}

impl Loads {
    pub fn new(vertical: f64, eccentricity: f64) -> Self {
        Loads { vertical, eccentricity }
    }

    pub fn eccentricity_m(&self) -> f64 {
        Meters::from(Centimeters(self.eccentricity)).0
    }
}

/// Boundary-condition labels at the base and top of the wall.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraints {
    #[serde(default = "default_bottom")]
    pub bottom: String,
    #[serde(default = "default_top")]
    pub top: String,
}

fn default_bottom() -> String {
    "Incastro".to_string()
}

fn default_top() -> String {
    "Incastro (Grinter)".to_string()
}

impl Default for Constraints {
    fn default() -> Self {
        Constraints {
            bottom: default_bottom(),
            top: default_top(),
        }
    }
}

impl Constraints {
    pub fn new(bottom: impl Into<String>, top: impl Into<String>) -> Self {
        Constraints {
            bottom: bottom.into(),
            top: top.into(),
        }
    }
}

/// Per-run project data: confidence factor, loads and constraints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectContext {
    #[serde(rename = "FC", alias = "fc")]
    pub fc: f64,
    #[serde(default)]
    pub loads: Loads,
    #[serde(default)]
    pub constraints: Constraints,
}

impl Default for ProjectContext {
    fn default() -> Self {
        ProjectContext {
            fc: 1.0,
            loads: Loads::default(),
            constraints: Constraints::default(),
        }
    }
}

// ============================================================================
// Output Types
// ============================================================================

/// Aggregated shear capacities of a wall (kN).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WallResistance {
    #[serde(rename = "V_t1")]
    pub v_t1: f64,
    #[serde(rename = "V_t2")]
    pub v_t2: f64,
    #[serde(rename = "V_t3")]
    pub v_t3: f64,
}

impl WallResistance {
    /// Governing value; a zero `V_t3` is left out
    pub fn governing(&self) -> f64 {
        governing(self.v_t1, self.v_t2, self.v_t3)
    }

    pub fn as_tuple(&self) -> (f64, f64, f64) {
        (self.v_t1, self.v_t2, self.v_t3)
    }
}

/// Resistance of one pier with the load share it carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PierResistance {
    pub index: usize,
    /// Pier length (cm)
    pub length: f64,
    /// Vertical load share (kN)
    pub n: f64,
    pub result: ResistanceResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometrySummary {
    #[serde(rename = "L")]
    pub l: f64,
    pub h: f64,
    pub t: f64,
    #[serde(rename = "A")]
    pub a: f64,
    #[serde(rename = "I")]
    pub i: f64,
    pub slenderness: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialSummary {
    pub fcm: f64,
    pub tau0: f64,
    #[serde(rename = "E")]
    pub e: f64,
    #[serde(rename = "G")]
    pub g: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadSummary {
    #[serde(rename = "N")]
    pub n: f64,
    /// Eccentricity (m)
    pub e: f64,
    pub sigma_0: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetySummary {
    pub gamma_m: f64,
    #[serde(rename = "FC")]
    pub fc: f64,
    pub gamma_tot: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResistanceSummary {
    #[serde(rename = "V_t1")]
    pub v_t1: f64,
    #[serde(rename = "V_t2")]
    pub v_t2: f64,
    #[serde(rename = "V_t3")]
    pub v_t3: f64,
    #[serde(rename = "V_min")]
    pub v_min: f64,
    pub b_factor: f64,
    #[serde(rename = "h_L_ratio")]
    pub h_l_ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PierSummary {
    pub count: usize,
    pub opening_ratio: f64,
    /// Pier lengths (cm)
    pub lengths: Vec<f64>,
}

/// Report-ready bundle of the figures behind one masonry calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailedResults {
    pub version: String,
    pub geometry: GeometrySummary,
    pub materials: MaterialSummary,
    pub loads: LoadSummary,
    pub safety: SafetySummary,
    pub resistance: ResistanceSummary,
    pub stiffness: StiffnessResult,
    #[serde(rename = "maschi")]
    pub piers: PierSummary,
}

// ============================================================================
// Calculator
// ============================================================================

/// Masonry wall calculator.
#[derive(Debug, Clone, PartialEq)]
pub struct MasonryCalculator {
    pub gamma_m: f64,
    pub fc: f64,
    pub loads: Loads,
    pub constraints: Constraints,
}

impl Default for MasonryCalculator {
    fn default() -> Self {
        Self::new()
    }
}

impl MasonryCalculator {
    /// Existing-masonry `γ_m` and `FC = 1.0` until a project sets it.
    pub fn new() -> Self {
        MasonryCalculator {
            gamma_m: GAMMA_M_MASONRY,
            fc: 1.0,
            loads: Loads::default(),
            constraints: Constraints::default(),
        }
    }

    pub fn with_gamma_m(mut self, gamma_m: f64) -> Self {
        self.gamma_m = gamma_m;
        self
    }

    pub fn set_project_data(&mut self, context: ProjectContext) {
        self.fc = context.fc;
        self.loads = context.loads;
        self.constraints = context.constraints;

        log::info!(
            "Project data: FC={}, N={} kN, e={} cm, constraints {} - {}",
            self.fc,
            self.loads.vertical,
            self.loads.eccentricity,
            self.constraints.bottom,
            self.constraints.top
        );
    }

    pub fn factors(&self) -> PartialFactors {
        PartialFactors {
            gamma_m: self.gamma_m,
            fc: self.fc,
        }
    }

    pub fn validate_input(&self, wall: &Wall, masonry: &MasonryProperties) -> ValidationResult {
        validate_all(wall, masonry, Some(&self.loads))
    }

    /// Piers for a non-empty opening list, `None` for a solid wall
    fn piers_for(wall: &Wall, openings: Option<&[Opening]>) -> Option<PierSet> {
        match openings {
            Some(list) if !list.is_empty() => Some(identify_piers(wall, list)),
            _ => None,
        }
    }

    /// Resistance of each pier with its share of the vertical load.
    ///
    /// A solid wall is reported as a single pier spanning its full length.
    pub fn pier_resistances(
        &self,
        wall: &Wall,
        masonry: &MasonryProperties,
        openings: Option<&[Opening]>,
    ) -> Vec<PierResistance> {
        let h = wall.height_m();
        let t = wall.thickness_m();
        let e = self.loads.eccentricity_m();
        let strength = masonry.strength();
        let factors = self.factors();

        let Some(piers) = Self::piers_for(wall, openings) else {
            let section = PierSection::new(wall.length_m(), h, t);
            return vec![PierResistance {
                index: 0,
                length: wall.length,
                n: self.loads.vertical,
                result: resistance::calculate_resistance(&section, self.loads.vertical, e, &strength, &factors),
            }];
        };

        let shares = distribute_load(self.loads.vertical, &piers, wall.length);
        piers
            .iter()
            .zip(shares)
            .filter(|(pier, _)| pier.length > 0.0)
            .map(|(pier, n)| {
                let section = PierSection::new(pier.length_m(), h, t);
                let result = resistance::calculate_resistance(&section, n, e, &strength, &factors);
                log::debug!(
                    "Pier {}: L={:.0} cm, N={:.1} kN, V_t1={:.1} kN",
                    pier.index + 1,
                    pier.length,
                    n,
                    result.v_t1
                );
                PierResistance {
                    index: pier.index,
                    length: pier.length,
                    n,
                    result,
                }
            })
            .collect()
    }

    /// Wall shear capacities: the solid-wall values or the sum over piers.
    ///
    /// Returns zeros when the input fails validation.
    pub fn calculate_resistance(
        &self,
        wall: &Wall,
        masonry: &MasonryProperties,
        openings: Option<&[Opening]>,
    ) -> WallResistance {
        let validation = self.validate_input(wall, masonry);
        if !validation.is_valid {
            log::error!("Validation failed: {}", validation.errors.join("; "));
            return WallResistance::default();
        }

        let total = self
            .pier_resistances(wall, masonry, openings)
            .iter()
            .fold(WallResistance::default(), |acc, p| WallResistance {
                v_t1: acc.v_t1 + p.result.v_t1,
                v_t2: acc.v_t2 + p.result.v_t2,
                v_t3: acc.v_t3 + p.result.v_t3,
            });

        log::info!(
            "Masonry resistance: V_t1={:.1}, V_t2={:.1}, V_t3={:.1} kN",
            total.v_t1,
            total.v_t2,
            total.v_t3
        );
        total
    }

    pub fn calculate_stiffness_detailed(
        &self,
        wall: &Wall,
        masonry: &MasonryProperties,
        openings: Option<&[Opening]>,
    ) -> StiffnessResult {
        let h = wall.height_m();
        let t = wall.thickness_m();
        let moduli = masonry.moduli();
        let (bottom, top) = (&self.constraints.bottom, &self.constraints.top);

        let result = match Self::piers_for(wall, openings) {
            Some(piers) => {
                stiffness::calculate_wall_with_openings_stiffness(&piers.lengths_m(), h, t, moduli, bottom, top)
            }
            None => stiffness::calculate_wall_stiffness(wall.length_m(), h, t, moduli, bottom, top),
        };

        log::info!(
            "Masonry stiffness: K={:.1} kN/m ({} - {}, k={})",
            result.k_total,
            bottom,
            top,
            result.k_constraint
        );
        result
    }

    /// Lateral stiffness (kN/m).
    pub fn calculate_stiffness(&self, wall: &Wall, masonry: &MasonryProperties, openings: Option<&[Opening]>) -> f64 {
        self.calculate_stiffness_detailed(wall, masonry, openings).k_total
    }

    /// Collect geometry, material, load, safety, resistance, stiffness and
    /// pier figures into one structure.
    pub fn get_detailed_results(
        &self,
        wall: &Wall,
        masonry: &MasonryProperties,
        openings: Option<&[Opening]>,
    ) -> DetailedResults {
        let v = self.calculate_resistance(wall, masonry, openings);
        let stiffness = self.calculate_stiffness_detailed(wall, masonry, openings);

        let l = wall.length_m();
        let h = wall.height_m();
        let t = wall.thickness_m();
        let moduli = masonry.moduli();
        let factors = self.factors();

        let piers = Self::piers_for(wall, openings).map_or(
            PierSummary {
                count: 0,
                opening_ratio: 0.0,
                lengths: Vec::new(),
            },
            |set| PierSummary {
                count: set.len(),
                opening_ratio: set.opening_ratio(),
                lengths: set.iter().map(|p| p.length).collect(),
            },
        );

        let slender = slenderness(h, t);
        let h_l = if l > 0.0 { h / l } else { 0.0 };

        DetailedResults {
            version: CALCULATOR_VERSION.to_string(),
            geometry: GeometrySummary {
                l,
                h,
                t,
                a: l * t,
                i: moment_of_inertia(l, t),
                slenderness: if slender.is_finite() { slender } else { 0.0 },
            },
            materials: MaterialSummary {
                fcm: masonry.fcm,
                tau0: masonry.tau0,
                e: moduli.e,
                g: moduli.g,
            },
            loads: LoadSummary {
                n: self.loads.vertical,
                e: self.loads.eccentricity_m(),
                sigma_0: resistance::sigma_0(self.loads.vertical, l * t),
            },
            safety: SafetySummary {
                gamma_m: factors.gamma_m,
                fc: factors.fc,
                gamma_tot: factors.gamma_tot(),
            },
            resistance: ResistanceSummary {
                v_t1: v.v_t1,
                v_t2: v.v_t2,
                v_t3: v.v_t3,
                v_min: v.governing(),
                b_factor: resistance::b_factor(h, l),
                h_l_ratio: h_l,
            },
            stiffness,
            piers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn calculator(n: f64) -> MasonryCalculator {
        let mut calc = MasonryCalculator::new();
        calc.set_project_data(ProjectContext {
            fc: 1.35,
            loads: Loads::new(n, 0.0),
            constraints: Constraints::default(),
        });
        calc
    }

    fn masonry() -> MasonryProperties {
        MasonryProperties::new(2.4, 0.074, 1410.0)
    }

    fn two_openings() -> Vec<Opening> {
        vec![
            Opening::rectangular(50.0, 0.0, 100.0, 210.0),
            Opening::rectangular(250.0, 0.0, 100.0, 210.0),
        ]
    }

    #[test]
    fn test_reference_wall() {
        let calc = calculator(150.0);
        let details = calc.get_detailed_results(&Wall::new(200.0, 270.0, 30.0), &masonry(), None);

        assert_relative_eq!(details.loads.sigma_0, 0.25, epsilon = 1e-12);
        assert_relative_eq!(details.resistance.b_factor, 1.05, epsilon = 1e-12);
        assert!(details.resistance.v_t1 > 0.0);
        assert!(details.resistance.v_t2 > 0.0);
        assert!(details.resistance.v_t3 > 0.0);
        assert_relative_eq!(details.safety.gamma_tot, 2.7, epsilon = 1e-12);
        assert_eq!(details.piers.count, 0);
    }

    #[test]
    fn test_zero_vertical_load_keeps_cohesion() {
        let calc = calculator(0.0);
        let v = calc.calculate_resistance(&Wall::new(200.0, 270.0, 30.0), &masonry(), None);
        assert!(v.v_t1 > 0.0);
        assert_relative_eq!(v.v_t3, 0.6 * 2.4 * 1000.0 / 2.7, epsilon = 1e-9);
    }

    #[test]
    fn test_empty_openings_match_solid_wall() {
        let calc = calculator(150.0);
        let wall = Wall::new(200.0, 270.0, 30.0);

        let solid = calc.calculate_resistance(&wall, &masonry(), None);
        let empty = calc.calculate_resistance(&wall, &masonry(), Some(&[]));
        assert_eq!(solid, empty);

        let direct = resistance::calculate_resistance(
            &PierSection::new(2.0, 2.7, 0.3),
            150.0,
            0.0,
            &masonry().strength(),
            &calc.factors(),
        );
        assert_eq!(solid.v_t1, direct.v_t1);
        assert_eq!(solid.v_t3, direct.v_t3);

        let k_direct = stiffness::calculate_wall_stiffness(2.0, 2.7, 0.3, masonry().moduli(), "Incastro", "Incastro (Grinter)");
        assert_eq!(calc.calculate_stiffness(&wall, &masonry(), Some(&[])), k_direct.k_total);
    }

    #[test]
    fn test_openings_sum_over_piers() {
        let calc = calculator(150.0);
        let wall = Wall::new(500.0, 270.0, 30.0);
        let openings = two_openings();

        let piers = calc.pier_resistances(&wall, &masonry(), Some(&openings));
        assert_eq!(piers.len(), 3);
        // 50 + 100 + 150 cm of piers on a 500 cm wall
        assert_relative_eq!(piers[0].n, 15.0, epsilon = 1e-9);
        assert_relative_eq!(piers[1].n, 30.0, epsilon = 1e-9);
        assert_relative_eq!(piers[2].n, 45.0, epsilon = 1e-9);
        assert_relative_eq!(piers.iter().map(|p| p.n).sum::<f64>(), 90.0, epsilon = 1e-9);

        let v = calc.calculate_resistance(&wall, &masonry(), Some(&openings));
        let expected: f64 = piers.iter().map(|p| p.result.v_t1).sum();
        assert_relative_eq!(v.v_t1, expected, epsilon = 1e-9);
    }

    #[test]
    fn test_openings_stiffness_is_parallel_sum() {
        let calc = calculator(150.0);
        let wall = Wall::new(500.0, 270.0, 30.0);
        let result = calc.calculate_stiffness_detailed(&wall, &masonry(), Some(&two_openings()));

        let expected: f64 = [0.5, 1.0, 1.5]
            .iter()
            .map(|&l| stiffness::calculate_wall_stiffness(l, 2.7, 0.3, masonry().moduli(), "Incastro", "Incastro (Grinter)").k_total)
            .sum();
        assert_eq!(result.k_piers.len(), 3);
        assert_relative_eq!(result.k_total, expected, max_relative = 1e-9);

        let solid = calc.calculate_stiffness(&wall, &masonry(), None);
        assert!(result.k_total < solid);
    }

    #[test]
    fn test_invalid_input_returns_zeros() {
        let calc = calculator(150.0);
        let v = calc.calculate_resistance(&Wall::new(200.0, 0.0, 30.0), &masonry(), None);
        assert_eq!(v, WallResistance::default());

        let mut eccentric = calculator(150.0);
        eccentric.loads.eccentricity = 20.0;
        let v = eccentric.calculate_resistance(&Wall::new(200.0, 270.0, 30.0), &masonry(), None);
        assert_eq!(v.as_tuple(), (0.0, 0.0, 0.0));
    }

    #[test]
    fn test_governing_excludes_inactive_rocking() {
        // σmax above 0.85·fcm on a 1 m wall
        let calc = calculator(700.0);
        let v = calc.calculate_resistance(&Wall::new(100.0, 270.0, 30.0), &masonry(), None);
        assert_eq!(v.v_t3, 0.0);
        assert_eq!(v.governing(), v.v_t1.min(v.v_t2));
        assert!(v.governing() > 0.0);
    }

    #[test]
    fn test_detailed_results_pier_summary() {
        let calc = calculator(150.0);
        let details = calc.get_detailed_results(&Wall::new(500.0, 270.0, 30.0), &masonry(), Some(&two_openings()));
        assert_eq!(details.piers.count, 3);
        assert_eq!(details.piers.lengths, vec![50.0, 100.0, 150.0]);
        assert_relative_eq!(details.piers.opening_ratio, 0.4, epsilon = 1e-12);
        assert_relative_eq!(details.materials.g, 587.5, epsilon = 1e-9);

        let json = serde_json::to_value(&details).unwrap();
        assert!(json["resistance"]["V_t1"].is_number());
        assert_eq!(json["maschi"]["count"], 3);
    }

    #[test]
    fn test_masonry_properties_from_json() {
        let m: MasonryProperties = serde_json::from_str(r#"{"fcm": 3.2, "tau0": 0.065, "E": 1500, "G": 500}"#).unwrap();
        assert_eq!(m.e_or_default(), 1500.0);
        assert_eq!(m.moduli().g, 500.0);
        assert_eq!(m.unit_weight(), MASONRY_UNIT_WEIGHT);

        let defaults: MasonryProperties = serde_json::from_str("{}").unwrap();
        assert_eq!(defaults.fcm, 2.0);
        assert_eq!(defaults.e, Some(DEFAULT_E));

        let loads: Loads = serde_json::from_str(r#"{"N": 120, "e": 3}"#).unwrap();
        assert_eq!(loads, Loads::new(120.0, 3.0));
    }
}
