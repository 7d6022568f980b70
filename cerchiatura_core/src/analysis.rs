//! # Intervention Analysis
//!
//! Runs a complete verification for one [`CalculationRequest`]:
//!
//! 1. original state: masonry with the existing openings only
//! 2. modified state: masonry with every opening
//! 3. frame contributions: each new reinforced opening through the
//!    [`CalculatorRegistry`], reduced by the collaboration factor
//! 4. NTC 2018 §8.4.1 comparison plus the opening-geometry limits
//!
//! ## Example
//!
//! ```rust
//! use cerchiatura_core::analysis::CalculationService;
//! use cerchiatura_core::geometry::{Opening, Wall};
//! use cerchiatura_core::masonry::Loads;
//! use cerchiatura_core::materials::MaterialsDb;
//! use cerchiatura_core::project::CalculationRequest;
//! use cerchiatura_core::reinforcement::{CalculatorRegistry, ReinforcementSpec};
//!
//! let registry = CalculatorRegistry::with_defaults();
//! let materials = MaterialsDb::builtin();
//! let service = CalculationService::new(&registry, &materials);
//!
//! let mut request = CalculationRequest::new("Ing. Rossi", "24-017", "Verdi", Wall::new(500.0, 300.0, 40.0))
//!     .with_opening(
//!         Opening::rectangular(200.0, 0.0, 100.0, 210.0)
//!             .with_reinforcement(ReinforcementSpec::steel_portal("HEB 200", "HEB 200")),
//!     );
//! request.loads = Some(Loads::new(200.0, 0.0));
//!
//! let result = service.analyze(&request)?;
//! assert_eq!(result.frames.len(), 1);
//! assert!(result.k_frames > 0.0);
//! # Ok::<(), cerchiatura_core::errors::CalcError>(())
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{DELTA_K_MAX, DELTA_V_MAX};
use crate::errors::CalcResult;
use crate::geometry::{Opening, Wall};
use crate::masonry::{MasonryCalculator, MasonryProperties, WallResistance};
use crate::materials::MaterialsDb;
use crate::project::CalculationRequest;
use crate::reinforcement::{
    CalculationInput, CalculationOutput, CalculatorRegistry, ConcreteFrameCalculator, FrameType,
    ReinforcementMaterial,
};
use crate::verifier::{
    calculate_safety_factors, verification_summary, verify_local_intervention, OpeningLimits, SafetyFactors,
    VerificationResult,
};

pub const SERVICE_VERSION: &str = "1.0.0";

// ============================================================================
// Result types
// ============================================================================

/// Masonry-only figures for one state of the wall.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MasonryState {
    /// Lateral stiffness (kN/m)
    #[serde(rename = "K")]
    pub k: f64,
    pub resistance: WallResistance,
    /// Governing shear capacity (kN)
    #[serde(rename = "V_min")]
    pub v_min: f64,
    pub openings: usize,
}

/// Actions on a lintel from the masonry above the opening, simply supported.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FrameForces {
    /// Line load (kN/m)
    pub q: f64,
    /// Midspan moment (kNm)
    #[serde(rename = "M_Ed")]
    pub m_ed: f64,
    /// Support shear (kN)
    #[serde(rename = "V_Ed")]
    pub v_ed: f64,
    /// Jamb axial force (kN)
    #[serde(rename = "N_Ed")]
    pub n_ed: f64,
}

/// One reinforced opening's share of the modified state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameContribution {
    pub opening_id: Uuid,
    pub label: String,
    pub material: Option<ReinforcementMaterial>,
    pub frame_type: Option<FrameType>,
    /// Frame stiffness before the collaboration factor (kN/m)
    #[serde(rename = "K_frame")]
    pub k_frame: f64,
    /// Sway-mechanism shear resistance before the collaboration factor (kN)
    #[serde(rename = "V_frame")]
    pub v_frame: f64,
    pub forces: FrameForces,
    /// Characteristic crack width under `M_Ed` (mm), concrete frames only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crack_width_mm: Option<f64>,
    pub output: CalculationOutput,
}

impl FrameContribution {
    pub fn success(&self) -> bool {
        self.output.success
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub version: String,
    pub job_id: String,
    pub computed_at: DateTime<Utc>,
    #[serde(rename = "FC")]
    pub fc: f64,
    pub gamma_m: f64,
    pub gamma_collaboration: f64,
    pub original: MasonryState,
    /// Masonry only, with every opening
    pub modified: MasonryState,
    pub frames: Vec<FrameContribution>,
    /// Sum of frame stiffnesses divided by the collaboration factor (kN/m)
    #[serde(rename = "K_frames")]
    pub k_frames: f64,
    /// Sum of frame shear resistances divided by the collaboration factor (kN)
    #[serde(rename = "V_frames")]
    pub v_frames: f64,
    pub verification: VerificationResult,
    pub opening_limits: OpeningLimits,
    pub safety: SafetyFactors,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl AnalysisResult {
    /// Modified masonry plus reduced frame stiffness
    pub fn k_total_modified(&self) -> f64 {
        self.modified.k + self.k_frames
    }

    /// Modified masonry plus reduced frame resistance
    pub fn v_total_modified(&self) -> f64 {
        self.modified.v_min + self.v_frames
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Report text with `[OK]`/`[FAIL]` markers.
    pub fn summary(&self) -> String {
        let mark = |ok: bool| if ok { "[OK]" } else { "[FAIL]" };
        let mut lines = vec![
            format!("Job {}  (FC = {:.2}, γm = {:.2})", self.job_id, self.fc, self.gamma_m),
            String::new(),
            format!(
                "Original state:  K = {:.1} kN/m, V = {:.1} kN ({} openings)",
                self.original.k, self.original.v_min, self.original.openings
            ),
            format!(
                "Modified masonry: K = {:.1} kN/m, V = {:.1} kN ({} openings)",
                self.modified.k, self.modified.v_min, self.modified.openings
            ),
        ];

        for frame in &self.frames {
            let kind = frame.frame_type.map_or("unknown type", |t| t.display_name());
            if frame.success() {
                lines.push(format!(
                    "{} Frame {} ({}): K = {:.1} kN/m, V = {:.1} kN",
                    mark(true),
                    frame.label,
                    kind,
                    frame.k_frame,
                    frame.v_frame
                ));
            } else {
                lines.push(format!("{} Frame {}: {}", mark(false), frame.label, frame.output.errors.join("; ")));
            }
        }

        lines.push(format!(
            "Frames (/ γ = {:.2}): K = {:.1} kN/m, V = {:.1} kN",
            self.gamma_collaboration, self.k_frames, self.v_frames
        ));
        lines.push(format!(
            "Modified total:  K = {:.1} kN/m, V = {:.1} kN",
            self.k_total_modified(),
            self.v_total_modified()
        ));
        lines.push(String::new());

        lines.push(format!(
            "{} Opening ratio {:.1}% (max 40%)",
            mark(self.opening_limits.opening_ratio_ok),
            self.opening_limits.opening_ratio
        ));
        lines.push(format!(
            "{} Piers at least {:.0} cm wide",
            mark(self.opening_limits.min_pier_ok),
            self.opening_limits.min_pier_width
        ));
        lines.push(String::new());
        lines.push(verification_summary(&self.verification));

        for error in &self.errors {
            lines.push(format!("{} {}", mark(false), error));
        }
        if !self.warnings.is_empty() {
            lines.push(String::new());
            lines.push("Warnings:".to_string());
            lines.extend(self.warnings.iter().map(|w| format!("  - {}", w)));
        }
        lines.join("\n")
    }
}

// ============================================================================
// Frame actions
// ============================================================================

/// Lintel actions from the masonry between the opening head and the wall top.
pub fn estimate_frame_forces(opening: &Opening, wall: &Wall, unit_weight: f64) -> FrameForces {
    let span = opening.width / 100.0;
    let h_above = ((wall.height - (opening.y + opening.height)) / 100.0).max(0.0);
    let q = unit_weight * wall.thickness_m() * h_above;

    if span <= 0.0 {
        return FrameForces { q, ..Default::default() };
    }

    FrameForces {
        q,
        m_ed: q * span * span / 8.0,
        v_ed: q * span / 2.0,
        n_ed: q * span / 2.0,
    }
}

/// Shear at which both beam ends yield in a sway mechanism: `2·M_Rd/h`.
pub fn portal_shear_resistance(m_rd: f64, height_m: f64) -> f64 {
    if height_m > 0.0 && m_rd > 0.0 {
        2.0 * m_rd / height_m
    } else {
        0.0
    }
}

// ============================================================================
// Service
// ============================================================================

/// Borrows the registry and materials database owned by the caller.
#[derive(Debug, Clone, Copy)]
pub struct CalculationService<'a> {
    registry: &'a CalculatorRegistry,
    materials: &'a MaterialsDb,
}

impl<'a> CalculationService<'a> {
    pub fn new(registry: &'a CalculatorRegistry, materials: &'a MaterialsDb) -> Self {
        CalculationService { registry, materials }
    }

    /// Full verification of a request.
    ///
    /// Fails only when the masonry cannot be resolved (unknown material
    /// key). Invalid geometry is reported in `errors`; a frame that cannot be
    /// computed is kept in `frames` with its own errors and contributes zero.
    pub fn analyze(&self, request: &CalculationRequest) -> CalcResult<AnalysisResult> {
        log::info!("=== Analysis {} ===", request.meta.job_id);

        let masonry = request.resolve_masonry(self.materials)?;
        let calculator = request.masonry_calculator();
        let wall = &request.wall;

        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        let validation = calculator.validate_input(wall, &masonry);
        errors.extend(validation.errors);
        warnings.extend(validation.warnings);

        let existing = request.existing_openings();
        let original = Self::masonry_state(&calculator, wall, &masonry, &existing, "original");
        let modified = Self::masonry_state(&calculator, wall, &masonry, &request.openings, "modified");

        let frames: Vec<FrameContribution> = request
            .new_openings()
            .filter(|o| o.reinforcement.is_some())
            .filter_map(|o| self.frame_contribution(o, wall, &masonry, request))
            .collect();

        for frame in &frames {
            warnings.extend(frame.output.warnings.iter().map(|w| format!("{}: {}", frame.label, w)));
            warnings.extend(
                frame
                    .output
                    .errors
                    .iter()
                    .map(|e| format!("{}: frame not computed ({})", frame.label, e)),
            );
        }

        let gamma = if request.settings.gamma_collaboration > 0.0 {
            request.settings.gamma_collaboration
        } else {
            warnings.push("Collaboration factor not positive, using 1.0".to_string());
            1.0
        };
        let k_frames = frames.iter().map(|f| f.k_frame).sum::<f64>() / gamma;
        let v_frames = frames.iter().map(|f| f.v_frame).sum::<f64>() / gamma;

        log::info!("Frames: K = {:.1} kN/m, V = {:.1} kN (γ = {})", k_frames, v_frames, gamma);

        let k_after = modified.k + k_frames;
        let v_after = modified.v_min + v_frames;
        let verification = verify_local_intervention(original.k, k_after, original.v_min, v_after);

        let opening_limits = crate::verifier::verify_opening_limits(wall, &request.openings);
        if !opening_limits.opening_ratio_ok {
            warnings.push(format!(
                "Openings cover {:.1}% of the wall, above the 40% limit",
                opening_limits.opening_ratio
            ));
        }
        if !opening_limits.min_pier_ok {
            warnings.push(format!(
                "{} pier(s) narrower than {:.0} cm",
                opening_limits.narrow_piers.len(),
                opening_limits.min_pier_width
            ));
        }

        let safety = calculate_safety_factors(
            v_after,
            original.v_min * (1.0 + DELTA_V_MAX),
            k_after,
            original.k * (1.0 - DELTA_K_MAX),
        );

        Ok(AnalysisResult {
            version: SERVICE_VERSION.to_string(),
            job_id: request.meta.job_id.clone(),
            computed_at: Utc::now(),
            fc: calculator.fc,
            gamma_m: calculator.gamma_m,
            gamma_collaboration: gamma,
            original,
            modified,
            frames,
            k_frames,
            v_frames,
            verification,
            opening_limits,
            safety,
            errors,
            warnings,
        })
    }

    fn masonry_state(
        calculator: &MasonryCalculator,
        wall: &Wall,
        masonry: &MasonryProperties,
        openings: &[Opening],
        name: &str,
    ) -> MasonryState {
        let openings_opt = if openings.is_empty() { None } else { Some(openings) };
        let resistance = calculator.calculate_resistance(wall, masonry, openings_opt);
        let k = calculator.calculate_stiffness(wall, masonry, openings_opt);
        let state = MasonryState {
            k,
            resistance,
            v_min: resistance.governing(),
            openings: openings.len(),
        };
        log::info!("State {}: K = {:.1} kN/m, V_min = {:.1} kN", name, state.k, state.v_min);
        state
    }

    fn frame_contribution(
        &self,
        opening: &Opening,
        wall: &Wall,
        masonry: &MasonryProperties,
        request: &CalculationRequest,
    ) -> Option<FrameContribution> {
        let input = CalculationInput::for_opening(opening, Some(wall), request.loads.as_ref())?;
        let spec = &input.reinforcement;
        let label = opening.display_label();

        let output = self.registry.calculate(&input);
        let forces = estimate_frame_forces(opening, wall, masonry.unit_weight());
        let frame_type = spec.frame_kind();

        let (k_frame, v_frame) = if output.success {
            let v = match frame_type {
                Some(t) if t.has_jambs() => portal_shear_resistance(output.m_capacity, input.height_m()),
                _ => 0.0,
            };
            (output.k_frame, v)
        } else {
            (0.0, 0.0)
        };

        let crack_width_mm = if output.success && spec.material_kind() == Some(ReinforcementMaterial::Concrete) {
            match ConcreteFrameCalculator::new().calculate_crack_width(forces.m_ed, spec) {
                Ok(w) => Some(w),
                Err(e) => {
                    log::warn!("{}: crack width not computed: {}", label, e);
                    None
                }
            }
        } else {
            None
        };

        log::info!("Frame {}: K = {:.1} kN/m, V = {:.1} kN", label, k_frame, v_frame);

        Some(FrameContribution {
            opening_id: opening.id,
            label,
            material: spec.material_kind(),
            frame_type,
            k_frame,
            v_frame,
            forces,
            crack_width_mm,
            output,
        })
    }
}
