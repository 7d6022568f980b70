//! # NTC 2018 Code Tables
//!
//! Normative constants consumed by every calculator: partial safety factors,
//! confidence factors, local-intervention limits, masonry coefficients, the
//! constraint-factor lookup and the steel / rebar / concrete property tables.
//!
//! Values follow NTC 2018 (D.M. 17/01/2018) and Circolare 2019 n. 7.
//!
//! ## Example
//!
//! ```rust
//! use cerchiatura_core::constants::{constraint_factor, ConcreteClass, KnowledgeLevel, SteelGrade};
//!
//! assert_eq!(constraint_factor("Incastro", "Incastro (Grinter)"), 12.0);
//! assert_eq!(KnowledgeLevel::Lc2.confidence_factor(), 1.20);
//! assert_eq!(SteelGrade::S275.properties().fyk, 275.0);
//! assert_eq!(ConcreteClass::C25_30.properties().ecm, 31000.0);
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};

// ============================================================================
// Partial safety factors (§4.1.2.1, §4.2.4.1, §4.5.6.1)
// ============================================================================

/// Masonry partial factor γM for existing buildings
pub const GAMMA_M_MASONRY: f64 = 2.0;
/// Steel cross-section resistance, classes 1-4
pub const GAMMA_M0: f64 = 1.05;
/// Steel member instability
pub const GAMMA_M1: f64 = 1.05;
/// Steel net-section fracture
pub const GAMMA_M2: f64 = 1.25;
/// Concrete
pub const GAMMA_C: f64 = 1.5;
/// Reinforcing steel
pub const GAMMA_S: f64 = 1.15;
/// Long-term effects on concrete strength
pub const ALPHA_CC: f64 = 0.85;

// ============================================================================
// Local intervention limits (§8.4.1)
// ============================================================================

/// Maximum stiffness variation |ΔK|/K
pub const DELTA_K_MAX: f64 = 0.15;
/// Maximum resistance variation ΔV/V (negative: a reduction)
pub const DELTA_V_MAX: f64 = -0.20;
/// Maximum opening area over wall area
pub const OPENING_RATIO_MAX: f64 = 0.40;
/// Minimum pier width (m)
pub const PIER_MIN_WIDTH_M: f64 = 0.80;
/// Frame/masonry collaboration factor applied to the frame contribution
pub const GAMMA_COLLABORATION: f64 = 1.5;

// ============================================================================
// Masonry coefficients (§C8.7.1)
// ============================================================================

/// Poisson ratio
pub const MASONRY_NU: f64 = 0.20;
/// Shear shape factor χ for rectangular sections
pub const MASONRY_CHI: f64 = 1.2;
/// V_t1 upper limit coefficient (fraction of fcm)
pub const VT1_LIMIT_COEFF: f64 = 0.065;
/// Long-duration reduction of fcm for the rocking mechanism
pub const LONG_DURATION_COEFF: f64 = 0.85;
/// Maximum slenderness h/t
pub const SLENDERNESS_MAX: f64 = 20.0;
/// Eccentricity limit as a fraction of thickness (core of the section)
pub const ECCENTRICITY_LIMIT_RATIO: f64 = 1.0 / 6.0;
/// Unit weight used for the masonry above an opening (kN/m³)
pub const MASONRY_UNIT_WEIGHT: f64 = 18.0;

// ============================================================================
// Structural steel (§11.3.4)
// ============================================================================

/// Elastic modulus (MPa)
pub const STEEL_E: f64 = 210_000.0;
/// Shear modulus (MPa)
pub const STEEL_G: f64 = 80_769.0;
/// Poisson ratio
pub const STEEL_NU: f64 = 0.30;
/// Unit weight (kN/m³)
pub const STEEL_RHO: f64 = 78.5;

// ============================================================================
// Reinforced concrete
// ============================================================================

/// Cracked-section inertia reduction (I_cr ≈ 0.5 I_g)
pub const CRACKED_INERTIA_FACTOR: f64 = 0.50;
/// Neutral-axis limit x/d between failure domains 2 and 3
pub const NEUTRAL_AXIS_LIMIT: f64 = 0.259;
/// Minimum longitudinal reinforcement as a fraction of A_c
pub const MIN_REINFORCEMENT_RATIO: f64 = 0.001;

// ============================================================================
// Profile bending (calandratura) limits
// ============================================================================

/// Minimum r/h for cold bending
pub const RH_MIN_COLD: f64 = 50.0;
/// Minimum r/h for cold bending with preheating
pub const RH_MIN_PREHEAT: f64 = 30.0;
/// Minimum r/h for hot bending
pub const RH_MIN_HOT: f64 = 15.0;
/// Below this r/h the profile is expected to fail during bending
pub const RH_CRITICAL: f64 = 10.0;
/// Residual stress ratios σ_res/fy
pub const STRESS_RATIO_CRITICAL: f64 = 0.80;
pub const STRESS_RATIO_HIGH: f64 = 0.50;
pub const STRESS_RATIO_MODERATE: f64 = 0.30;

// ============================================================================
// Confidence factor (§C8.5.4)
// ============================================================================

/// Knowledge level of the existing structure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum KnowledgeLevel {
    /// Limited knowledge
    #[default]
    #[serde(rename = "LC1")]
    Lc1,
    /// Adequate knowledge
    #[serde(rename = "LC2")]
    Lc2,
    /// Accurate knowledge
    #[serde(rename = "LC3")]
    Lc3,
}

impl KnowledgeLevel {
    pub const ALL: [KnowledgeLevel; 3] = [KnowledgeLevel::Lc1, KnowledgeLevel::Lc2, KnowledgeLevel::Lc3];

    /// Confidence factor FC for this level
    pub fn confidence_factor(&self) -> f64 {
        match self {
            KnowledgeLevel::Lc1 => 1.35,
            KnowledgeLevel::Lc2 => 1.20,
            KnowledgeLevel::Lc3 => 1.00,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            KnowledgeLevel::Lc1 => "LC1",
            KnowledgeLevel::Lc2 => "LC2",
            KnowledgeLevel::Lc3 => "LC3",
        }
    }

    /// Parse "LC1", "lc 2", "3"... Unknown strings fall back to LC1.
    pub fn from_str_lenient(s: &str) -> Self {
        match s.to_uppercase().replace([' ', '_', '-'], "").as_str() {
            "LC2" | "2" => KnowledgeLevel::Lc2,
            "LC3" | "3" => KnowledgeLevel::Lc3,
            _ => KnowledgeLevel::Lc1,
        }
    }
}

// ============================================================================
// Constraint factor
// ============================================================================

/// Constraint factor k for the flexural stiffness term `k·E·I/h³`.
///
/// - fixed base, fixed top: 12 (double-fixed, shear-type)
/// - fixed base, free top: 3 (cantilever)
/// - anything else: 6
pub fn constraint_factor(bottom: &str, top: &str) -> f64 {
    if bottom == "Incastro" && top.contains("Incastro") {
        12.0
    } else if bottom == "Incastro" && top.contains("Libero") {
        3.0
    } else {
        6.0
    }
}

// ============================================================================
// Structural steel grades
// ============================================================================

/// Structural steel grade (EN 10025)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SteelGrade {
    #[default]
    S235,
    S275,
    S355,
    S450,
}

/// Characteristic properties of a structural steel grade
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SteelGradeProperties {
    /// Yield strength (MPa)
    pub fyk: f64,
    /// Ultimate strength (MPa)
    pub ftk: f64,
    /// Elastic modulus (MPa)
    pub e: f64,
    /// Shear modulus (MPa)
    pub g: f64,
}

impl SteelGrade {
    pub const ALL: [SteelGrade; 4] = [SteelGrade::S235, SteelGrade::S275, SteelGrade::S355, SteelGrade::S450];

    pub fn properties(&self) -> SteelGradeProperties {
        let (fyk, ftk) = match self {
            SteelGrade::S235 => (235.0, 360.0),
            SteelGrade::S275 => (275.0, 430.0),
            SteelGrade::S355 => (355.0, 510.0),
            SteelGrade::S450 => (450.0, 550.0),
        };
        SteelGradeProperties {
            fyk,
            ftk,
            e: STEEL_E,
            g: STEEL_G,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            SteelGrade::S235 => "S235",
            SteelGrade::S275 => "S275",
            SteelGrade::S355 => "S355",
            SteelGrade::S450 => "S450",
        }
    }

    /// Parse a grade designation, accepting suffixes like "S275JR".
    pub fn from_str_flexible(s: &str) -> CalcResult<Self> {
        let upper = s.trim().to_uppercase();
        SteelGrade::ALL
            .iter()
            .copied()
            .find(|g| upper.starts_with(g.code()))
            .ok_or_else(|| CalcError::material_not_found(s))
    }
}

/// Yield strength for a grade string, 235 MPa when the grade is unknown.
pub fn steel_fyk(grade: &str) -> f64 {
    SteelGrade::from_str_flexible(grade)
        .map(|g| g.properties().fyk)
        .unwrap_or(235.0)
}

// ============================================================================
// Reinforcing steel
// ============================================================================

/// Reinforcing bar steel type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum RebarType {
    #[default]
    B450C,
    B450A,
}

/// Characteristic properties of reinforcing steel
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RebarProperties {
    /// Yield strength (MPa)
    pub fyk: f64,
    /// Ultimate strength (MPa)
    pub ftk: f64,
    /// Elastic modulus (MPa)
    pub es: f64,
    /// Elongation at maximum load (%)
    pub agt: f64,
}

impl RebarType {
    pub fn properties(&self) -> RebarProperties {
        match self {
            RebarType::B450C => RebarProperties { fyk: 450.0, ftk: 540.0, es: 200_000.0, agt: 7.5 },
            RebarType::B450A => RebarProperties { fyk: 450.0, ftk: 540.0, es: 200_000.0, agt: 2.5 },
        }
    }

    pub fn from_str_flexible(s: &str) -> CalcResult<Self> {
        match s.trim().to_uppercase().as_str() {
            "B450C" => Ok(RebarType::B450C),
            "B450A" => Ok(RebarType::B450A),
            _ => Err(CalcError::material_not_found(s)),
        }
    }
}

// ============================================================================
// Concrete classes
// ============================================================================

/// Concrete strength class (cylinder/cube)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ConcreteClass {
    #[serde(rename = "C20/25")]
    C20_25,
    #[default]
    #[serde(rename = "C25/30")]
    C25_30,
    #[serde(rename = "C28/35")]
    C28_35,
    #[serde(rename = "C30/37")]
    C30_37,
    #[serde(rename = "C32/40")]
    C32_40,
    #[serde(rename = "C35/45")]
    C35_45,
    #[serde(rename = "C40/50")]
    C40_50,
    #[serde(rename = "C45/55")]
    C45_55,
    #[serde(rename = "C50/60")]
    C50_60,
}

/// Mechanical properties of a concrete class (MPa)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConcreteProperties {
    pub fck: f64,
    pub fcm: f64,
    pub fctm: f64,
    pub ecm: f64,
}

impl ConcreteClass {
    pub const ALL: [ConcreteClass; 9] = [
        ConcreteClass::C20_25,
        ConcreteClass::C25_30,
        ConcreteClass::C28_35,
        ConcreteClass::C30_37,
        ConcreteClass::C32_40,
        ConcreteClass::C35_45,
        ConcreteClass::C40_50,
        ConcreteClass::C45_55,
        ConcreteClass::C50_60,
    ];

    pub fn properties(&self) -> ConcreteProperties {
        let (fck, fcm, fctm, ecm) = match self {
            ConcreteClass::C20_25 => (20.0, 28.0, 2.2, 30000.0),
            ConcreteClass::C25_30 => (25.0, 33.0, 2.6, 31000.0),
            ConcreteClass::C28_35 => (28.0, 36.0, 2.8, 32000.0),
            ConcreteClass::C30_37 => (30.0, 38.0, 2.9, 33000.0),
            ConcreteClass::C32_40 => (32.0, 40.0, 3.0, 33000.0),
            ConcreteClass::C35_45 => (35.0, 43.0, 3.2, 34000.0),
            ConcreteClass::C40_50 => (40.0, 48.0, 3.5, 35000.0),
            ConcreteClass::C45_55 => (45.0, 53.0, 3.8, 36000.0),
            ConcreteClass::C50_60 => (50.0, 58.0, 4.1, 37000.0),
        };
        ConcreteProperties { fck, fcm, fctm, ecm }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ConcreteClass::C20_25 => "C20/25",
            ConcreteClass::C25_30 => "C25/30",
            ConcreteClass::C28_35 => "C28/35",
            ConcreteClass::C30_37 => "C30/37",
            ConcreteClass::C32_40 => "C32/40",
            ConcreteClass::C35_45 => "C35/45",
            ConcreteClass::C40_50 => "C40/50",
            ConcreteClass::C45_55 => "C45/55",
            ConcreteClass::C50_60 => "C50/60",
        }
    }

    pub fn from_str_flexible(s: &str) -> CalcResult<Self> {
        let normalized = s.trim().to_uppercase().replace([' ', '_'], "/");
        ConcreteClass::ALL
            .iter()
            .copied()
            .find(|c| c.code() == normalized)
            .ok_or_else(|| CalcError::material_not_found(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constraint_factor_lookup() {
        assert_eq!(constraint_factor("Incastro", "Incastro (Grinter)"), 12.0);
        assert_eq!(constraint_factor("Incastro", "Incastro"), 12.0);
        assert_eq!(constraint_factor("Incastro", "Libero"), 3.0);
        assert_eq!(constraint_factor("Cerniera", "Incastro"), 6.0);
        assert_eq!(constraint_factor("Incastro", "Cerniera"), 6.0);
    }

    #[test]
    fn test_knowledge_levels() {
        assert_eq!(KnowledgeLevel::default(), KnowledgeLevel::Lc1);
        assert_eq!(KnowledgeLevel::from_str_lenient("lc3").confidence_factor(), 1.0);
        assert_eq!(KnowledgeLevel::from_str_lenient("LC-2"), KnowledgeLevel::Lc2);
        assert_eq!(KnowledgeLevel::from_str_lenient("??"), KnowledgeLevel::Lc1);
        let json = serde_json::to_string(&KnowledgeLevel::Lc2).unwrap();
        assert_eq!(json, "\"LC2\"");
    }

    #[test]
    fn test_steel_grade_parsing() {
        assert_eq!(SteelGrade::from_str_flexible("s355jr").unwrap(), SteelGrade::S355);
        assert!(SteelGrade::from_str_flexible("A992").is_err());
        assert_eq!(steel_fyk("S450"), 450.0);
        assert_eq!(steel_fyk("unknown"), 235.0);
    }

    #[test]
    fn test_concrete_class_table() {
        let c30 = ConcreteClass::from_str_flexible("c30/37").unwrap();
        assert_eq!(c30.properties().fck, 30.0);
        assert_eq!(c30.properties().ecm, 33000.0);
        let json = serde_json::to_string(&ConcreteClass::C25_30).unwrap();
        assert_eq!(json, "\"C25/30\"");
        assert!(ConcreteClass::from_str_flexible("C99/99").is_err());
    }

    #[test]
    fn test_rebar_properties() {
        let b450c = RebarType::from_str_flexible("b450c").unwrap().properties();
        assert_eq!(b450c.fyk, 450.0);
        assert_eq!(b450c.es, 200_000.0);
        assert_eq!(RebarType::B450A.properties().agt, 2.5);
    }
}
