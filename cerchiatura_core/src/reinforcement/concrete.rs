//! # Reinforced Concrete Frames
//!
//! Cast-in-place frames: portal (lintel + jambs) or lintel only. Stiffness
//! uses the gross section with a cracked-inertia reduction; capacities use
//! simplified NTC 2018 / EC2 checks:
//!
//! - bending: rectangular stress block, capped at the x/d = 0.259 limit
//! - shear: members without shear reinforcement, `0.18·k·(100·ρ·fck)^(1/3)·b·d`
//! - jambs: `N_Rd = 0.8·b·h·fcd + As·fyd`
//!
//! Serviceability is covered by a minimum-reinforcement check and a crack
//! width estimate.

use serde::{Deserialize, Serialize};

use crate::constants::{
    ConcreteClass, ConcreteProperties, RebarProperties, RebarType, ALPHA_CC, CRACKED_INERTIA_FACTOR, GAMMA_C, GAMMA_S,
    MIN_REINFORCEMENT_RATIO, NEUTRAL_AXIS_LIMIT,
};
use crate::errors::{CalcError, CalcResult};
use crate::units::{KnPerM, Mpa};
use crate::validation::ValidationResult;

use super::bar_callout::{BarCallout, Stirrups};
use super::frame_result::{CalculationInput, FrameResult};
use super::interface::{Capability, ReinforcementCalculator};
use super::{FrameType, MemberSpec, ReinforcementMaterial, ReinforcementSpec};

pub const CALCULATOR_VERSION: &str = "2.0.0";

/// Default lintel section (cm)
pub const DEFAULT_LINTEL: (f64, f64) = (30.0, 40.0);
/// Default jamb section (cm)
pub const DEFAULT_JAMB: (f64, f64) = (30.0, 30.0);
/// Default concrete cover (mm)
pub const DEFAULT_COVER_MM: f64 = 30.0;
/// Stirrup diameter assumed for the effective depth (mm)
pub const STIRRUP_ALLOWANCE_MM: f64 = 8.0;
/// Stirrup spacing assumed when the callout cannot be read (cm)
pub const DEFAULT_STIRRUP_SPACING_CM: f64 = 20.0;
/// Upper bound on stirrup spacing (cm)
pub const MAX_STIRRUP_SPACING_CM: f64 = 30.0;

/// Lintel bars assumed when a callout cannot be read
pub fn default_lintel_bars() -> BarCallout {
    BarCallout::new(3, 16.0)
}

/// Jamb bars assumed when none are given
pub fn default_jamb_bars() -> BarCallout {
    BarCallout::new(4, 16.0)
}

/// Maximum stirrup spacing for a section depth (cm): `min(0.8·(h − 5), 30)`
pub fn max_stirrup_spacing(depth_cm: f64) -> f64 {
    (0.8 * (depth_cm - 5.0)).min(MAX_STIRRUP_SPACING_CM)
}

// ============================================================================
// Sections and materials
// ============================================================================

/// Rectangular section (cm).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RcSection {
    pub width: f64,
    pub depth: f64,
}

impl RcSection {
    fn of(member: Option<&MemberSpec>, default: (f64, f64)) -> Self {
        RcSection {
            width: member.and_then(|m| m.width_cm).unwrap_or(default.0),
            depth: member.and_then(MemberSpec::section_depth).unwrap_or(default.1),
        }
    }

    /// Gross area (cm²)
    pub fn area_cm2(&self) -> f64 {
        self.width * self.depth
    }

    /// `b·h³/12` about the axis parallel to the width (m⁴)
    pub fn inertia_m4(&self) -> f64 {
        let b = self.width / 100.0;
        let h = self.depth / 100.0;
        b * h.powi(3) / 12.0
    }

    /// `h·b³/12`: a jamb bends about its width in the wall plane (m⁴)
    pub fn inertia_weak_m4(&self) -> f64 {
        let b = self.width / 100.0;
        let h = self.depth / 100.0;
        h * b.powi(3) / 12.0
    }
}

/// Design strengths (MPa)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DesignStrengths {
    pub fcd: f64,
    pub fyd: f64,
}

impl DesignStrengths {
    pub fn new(concrete: &ConcreteProperties, rebar: &RebarProperties) -> Self {
        DesignStrengths {
            fcd: ALPHA_CC * concrete.fck / GAMMA_C,
            fyd: rebar.fyk / GAMMA_S,
        }
    }
}

/// Outcome of the minimum-reinforcement check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinReinforcementCheck {
    pub all_ok: bool,
    /// Required longitudinal area per face (mm²)
    pub as_min: f64,
    pub max_spacing: f64,
    pub messages: Vec<String>,
}

// ============================================================================
// Section checks (SI: m, MPa; results in kNm / kN)
// ============================================================================

/// Bending capacity of a singly reinforced rectangular section.
///
/// `as_m2` tension steel, `b` width, `d` effective depth.
pub fn flexural_capacity(as_m2: f64, b: f64, d: f64, strengths: &DesignStrengths) -> f64 {
    if b <= 0.0 || d <= 0.0 || strengths.fcd <= 0.0 {
        return 0.0;
    }
    let x = as_m2 * strengths.fyd / (0.8 * b * strengths.fcd);
    if x < NEUTRAL_AXIS_LIMIT * d {
        as_m2 * strengths.fyd * (d - 0.4 * x) * 1e3
    } else {
        NEUTRAL_AXIS_LIMIT * b * d * d * strengths.fcd * 1e3
    }
}

/// Shear capacity without shear reinforcement.
pub fn shear_capacity(as_m2: f64, b: f64, d: f64, fck: f64) -> f64 {
    if b <= 0.0 || d <= 0.0 {
        return 0.0;
    }
    let k = (1.0 + (200.0 / (d * 1000.0)).sqrt()).min(2.0);
    let rho = as_m2 / (b * d);
    0.18 * k * (100.0 * rho * fck).cbrt() * b * d * 1000.0
}

/// Squash load of a jamb.
pub fn axial_capacity(b: f64, h: f64, as_m2: f64, strengths: &DesignStrengths) -> f64 {
    (0.8 * b * h * strengths.fcd + as_m2 * strengths.fyd) * 1e3
}

/// Characteristic crack width (mm) under the service moment `m_ed` (kNm).
///
/// `b`, `h`, `cover` in mm; `bars` are the tension bars.
pub fn crack_width(m_ed: f64, b: f64, h: f64, cover: f64, bars: &BarCallout, es: f64) -> f64 {
    let phi = bars.diameter_mm;
    let area = bars.area_mm2;
    let d = h - cover - phi / 2.0;
    if area <= 0.0 || d <= 0.0 || b <= 0.0 || cover <= 0.0 {
        return 0.0;
    }

    let z = 0.9 * d;
    let sigma_s = m_ed.abs() * 1e6 / (area * z);

    // Bond and strain-distribution coefficients for ribbed bars in bending
    let (k1, k2) = (0.8, 0.5);
    let rho_eff = area / (2.5 * cover * b);
    let sr_max = 3.4 * cover + 0.425 * k1 * k2 * phi / rho_eff;

    let kt = 0.4;
    let strain = (sigma_s / es * (1.0 - kt * (sigma_s / 250.0).powi(2))).max(0.6 * sigma_s / es);
    sr_max * strain
}

// ============================================================================
// Calculator
// ============================================================================

/// Calculator for reinforced-concrete frames.
#[derive(Debug, Clone, Default)]
pub struct ConcreteFrameCalculator;

impl ConcreteFrameCalculator {
    pub fn new() -> Self {
        ConcreteFrameCalculator
    }

    fn concrete(spec: &ReinforcementSpec, result: &mut FrameResult) -> ConcreteClass {
        match spec.concrete_class.as_deref() {
            None => ConcreteClass::default(),
            Some(code) => ConcreteClass::from_str_flexible(code).unwrap_or_else(|e| {
                result.add_warning(format!("{}; using C25/30", e));
                ConcreteClass::default()
            }),
        }
    }

    fn rebar(spec: &ReinforcementSpec, result: &mut FrameResult) -> RebarType {
        match spec.rebar_type.as_deref() {
            None => RebarType::default(),
            Some(code) => RebarType::from_str_flexible(code).unwrap_or_else(|e| {
                result.add_warning(format!("{}; using B450C", e));
                RebarType::default()
            }),
        }
    }

    fn cover_m(spec: &ReinforcementSpec) -> f64 {
        spec.cover_mm.unwrap_or(DEFAULT_COVER_MM) / 1000.0
    }

    /// Parse a bar callout, announcing any substitution in `result`.
    fn bars(callout: Option<&str>, fallback: BarCallout, role: &str, result: &mut FrameResult) -> BarCallout {
        match callout {
            None => fallback,
            Some(text) => {
                let (bars, warning) = BarCallout::parse_or(text, fallback, role);
                if let Some(w) = warning {
                    result.warnings.push(w);
                }
                bars
            }
        }
    }

    fn beam_stiffness(ecm: f64, lintel: &RcSection, l: f64) -> f64 {
        if l <= 0.0 {
            return 0.0;
        }
        let k = 48.0 * Mpa(ecm).to_pa() * lintel.inertia_m4() / l.powi(3);
        KnPerM::from_n_per_m(k * CRACKED_INERTIA_FACTOR).value()
    }

    fn portal_stiffness(ecm: f64, lintel: &RcSection, jamb: &RcSection, h: f64, l: f64) -> f64 {
        if h <= 0.0 || l <= 0.0 {
            return 0.0;
        }
        let e_pa = Mpa(ecm).to_pa();
        let k1 = 12.0 * e_pa * jamb.inertia_weak_m4() / h.powi(3);
        let k2 = 12.0 * e_pa * lintel.inertia_m4() / l.powi(3);
        if k1 <= 0.0 || k2 <= 0.0 {
            return 0.0;
        }
        let k = 2.0 / (1.0 / k1 + 1.0 / k2);
        KnPerM::from_n_per_m(k * CRACKED_INERTIA_FACTOR).value()
    }

    /// Top/bottom bars against 0.1 % of the gross lintel section and stirrup
    /// spacing against `min(0.8·(h − 5), 30)` cm.
    pub fn verify_minimum_reinforcement(&self, spec: &ReinforcementSpec) -> MinReinforcementCheck {
        let lintel = spec.lintel.as_ref();
        let section = RcSection::of(lintel, DEFAULT_LINTEL);
        let as_min = MIN_REINFORCEMENT_RATIO * section.area_cm2() * 100.0;
        let max_spacing = max_stirrup_spacing(section.depth);

        let mut check = MinReinforcementCheck {
            all_ok: true,
            as_min,
            max_spacing,
            messages: Vec::new(),
        };

        let faces = [
            ("Top", lintel.and_then(|m| m.top_bars.as_deref())),
            ("Bottom", lintel.and_then(|m| m.bottom_bars.as_deref())),
        ];
        for (face, callout) in faces {
            let bars = match callout.map(BarCallout::parse) {
                None => default_lintel_bars(),
                Some(Ok(bars)) => bars,
                Some(Err(e)) => {
                    check.messages.push(format!("{} reinforcement: {}; assuming {}", face, e, default_lintel_bars()));
                    default_lintel_bars()
                }
            };
            if bars.area_mm2 < as_min {
                check.all_ok = false;
                check.messages.push(format!(
                    "{} reinforcement insufficient: {:.0} mm² < {:.0} mm²",
                    face, bars.area_mm2, as_min
                ));
            }
        }

        let spacing = match lintel.and_then(|m| m.stirrups.as_deref()).map(Stirrups::parse) {
            None => DEFAULT_STIRRUP_SPACING_CM,
            Some(Ok(s)) => s.spacing_cm,
            Some(Err(e)) => {
                check.messages.push(format!("{}; assuming {} cm spacing", e, DEFAULT_STIRRUP_SPACING_CM));
                DEFAULT_STIRRUP_SPACING_CM
            }
        };
        if spacing > max_spacing {
            check.all_ok = false;
            check.messages.push(format!(
                "Stirrup spacing too large: {} cm > {:.0} cm",
                spacing, max_spacing
            ));
        }

        if check.all_ok {
            check.messages.push("All reinforcement meets the code minimums".to_string());
        }
        check
    }

    /// Crack width (mm) of the lintel under the service moment `m_ed` (kNm).
    pub fn calculate_crack_width(&self, m_ed: f64, spec: &ReinforcementSpec) -> CalcResult<f64> {
        if spec.material_kind() != Some(ReinforcementMaterial::Concrete) {
            return Err(CalcError::invalid_input(
                "material",
                &spec.material,
                "crack width applies to concrete frames only",
            ));
        }
        let lintel = spec.lintel.as_ref();
        let section = RcSection::of(lintel, DEFAULT_LINTEL);
        let bars = match lintel.and_then(|m| m.bottom_bars.as_deref()) {
            Some(text) => BarCallout::parse(text)?,
            None => default_lintel_bars(),
        };
        let rebar = match spec.rebar_type.as_deref() {
            Some(code) => RebarType::from_str_flexible(code)?,
            None => RebarType::default(),
        };

        Ok(crack_width(
            m_ed,
            section.width * 10.0,
            section.depth * 10.0,
            spec.cover_mm.unwrap_or(DEFAULT_COVER_MM),
            &bars,
            rebar.properties().es,
        ))
    }
}

impl ReinforcementCalculator for ConcreteFrameCalculator {
    fn capability(&self) -> Capability {
        Capability {
            name: "Concrete frames".to_string(),
            version: CALCULATOR_VERSION.to_string(),
            description: "Cast-in-place reinforced concrete frames".to_string(),
            materials: vec![ReinforcementMaterial::Concrete],
            frame_types: vec![FrameType::PortalFrame, FrameType::BeamOnly],
            supports_arches: false,
        }
    }

    fn validate_input(&self, input: &CalculationInput) -> ValidationResult {
        let mut result = input.validate();
        let spec = &input.reinforcement;

        if spec.material_kind() != Some(ReinforcementMaterial::Concrete) {
            result.add_error("This calculator only handles reinforced concrete");
        }
        if let Some(t @ (FrameType::Arch | FrameType::BentArch)) = spec.frame_kind() {
            result.add_error(format!("{} is not available in reinforced concrete", t));
        }

        match &spec.lintel {
            None => result.add_error("Lintel section not specified (width, depth)"),
            Some(lintel) => {
                if lintel.width_cm.is_none() || lintel.section_depth().is_none() {
                    result.add_error("Lintel section not specified (width, depth)");
                }
                if lintel.top_bars.is_none() {
                    result.add_error("Lintel top reinforcement not specified");
                }
                if lintel.bottom_bars.is_none() {
                    result.add_error("Lintel bottom reinforcement not specified");
                }
            }
        }

        for (name, member) in [("Lintel", &spec.lintel), ("Jambs", &spec.jambs)] {
            if member.as_ref().is_some_and(MemberSpec::has_depth_conflict) {
                result.add_error(format!(
                    "{}: give either depth (altezza) or thickness (spessore), not both",
                    name
                ));
            }
        }
        result
    }

    fn calculate_stiffness(&self, input: &CalculationInput) -> FrameResult {
        let spec = &input.reinforcement;
        let frame_type = spec.frame_kind();
        let mut result = FrameResult::new(
            ReinforcementMaterial::Concrete,
            frame_type.unwrap_or(FrameType::PortalFrame),
            input.span_m(),
            input.height_m(),
        );

        let concrete = Self::concrete(spec, &mut result);
        let rebar = Self::rebar(spec, &mut result);
        let ecm = concrete.properties().ecm;
        let lintel = RcSection::of(spec.lintel.as_ref(), DEFAULT_LINTEL);

        let k_frame = match (frame_type, spec.jambs.as_ref()) {
            (Some(FrameType::PortalFrame), Some(jambs)) => {
                let jamb = RcSection::of(Some(jambs), DEFAULT_JAMB);
                result.insert_extra("jamb_width_cm", jamb.width);
                result.insert_extra("jamb_depth_cm", jamb.depth);
                result.insert_extra("jamb_bars", jambs.bars.clone().unwrap_or_else(|| default_jamb_bars().to_string()));
                Self::portal_stiffness(ecm, &lintel, &jamb, result.h, result.l)
            }
            (Some(FrameType::PortalFrame), None) | (Some(FrameType::BeamOnly), _) => {
                Self::beam_stiffness(ecm, &lintel, result.l)
            }
            (Some(t), _) => {
                result.add_warning(format!("{} is not available in reinforced concrete", t));
                0.0
            }
            (None, _) => {
                result.frame_type = None;
                result.add_warning(format!("Unrecognised concrete reinforcement type: '{}'", spec.frame_type));
                0.0
            }
        };
        result.k_frame = k_frame;

        let lintel_spec = spec.lintel.clone().unwrap_or_default();
        result.insert_extra("concrete_class", concrete.code());
        result.insert_extra("rebar_type", format!("{:?}", rebar));
        result.insert_extra("cover_mm", spec.cover_mm.unwrap_or(DEFAULT_COVER_MM));
        result.insert_extra("lintel_width_cm", lintel.width);
        result.insert_extra("lintel_depth_cm", lintel.depth);
        result.insert_extra("top_bars", lintel_spec.top_bars.unwrap_or_default());
        result.insert_extra("bottom_bars", lintel_spec.bottom_bars.unwrap_or_default());
        result.insert_extra("stirrups", lintel_spec.stirrups.unwrap_or_default());

        log::debug!("Concrete frame stiffness: {:.1} kN/m", result.k_frame);
        result
    }

    fn calculate_capacity(&self, input: &CalculationInput) -> FrameResult {
        let spec = &input.reinforcement;
        let mut result = FrameResult::new(
            ReinforcementMaterial::Concrete,
            spec.frame_kind().unwrap_or(FrameType::PortalFrame),
            input.span_m(),
            input.height_m(),
        );

        let concrete = Self::concrete(spec, &mut result).properties();
        let rebar = Self::rebar(spec, &mut result).properties();
        let strengths = DesignStrengths::new(&concrete, &rebar);
        let cover = Self::cover_m(spec);
        let stirrup = STIRRUP_ALLOWANCE_MM / 1000.0;

        result.insert_extra("fcd", strengths.fcd);
        result.insert_extra("fyd", strengths.fyd);

        if let Some(lintel_spec) = spec.lintel.as_ref() {
            let lintel = RcSection::of(Some(lintel_spec), DEFAULT_LINTEL);
            let b = lintel.width / 100.0;
            let d = lintel.depth / 100.0 - cover - stirrup;
            let bottom = Self::bars(lintel_spec.bottom_bars.as_deref(), default_lintel_bars(), "Bottom", &mut result);
            let as_m2 = bottom.area_m2();

            result.m_max = flexural_capacity(as_m2, b, d, &strengths);
            result.v_max = shear_capacity(as_m2, b, d, concrete.fck);
            result.insert_extra("d_beam_m", d);
            result.insert_extra("As_beam_mm2", bottom.area_mm2);
        }

        let mut m_rd_column = 0.0;
        if let Some(jamb_spec) = spec.jambs.as_ref() {
            let jamb = RcSection::of(Some(jamb_spec), DEFAULT_JAMB);
            let b = jamb.width / 100.0;
            let h = jamb.depth / 100.0;
            let bars = Self::bars(jamb_spec.bars.as_deref(), default_jamb_bars(), "Jamb", &mut result);
            let as_m2 = bars.area_m2();

            result.n_max = axial_capacity(b, h, as_m2, &strengths);
            let d_col = h - cover - stirrup;
            m_rd_column = as_m2 * strengths.fyd * d_col * 0.9 * 1e3;
            result.insert_extra("As_column_mm2", bars.area_mm2);
        }

        result.insert_extra("M_Rd_beam", result.m_max);
        result.insert_extra("V_Rd_beam", result.v_max);
        result.insert_extra("M_Rd_column", m_rd_column);
        result.insert_extra("N_Rd_column", result.n_max);

        let check = self.verify_minimum_reinforcement(spec);
        if !check.all_ok {
            for message in &check.messages {
                result.add_warning(message.clone());
            }
        }
        result.insert_extra("min_reinforcement_ok", check.all_ok);
        result
    }
}
