//! Result and input contracts shared by every reinforcement calculator.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::geometry::{Opening, Wall};
use crate::masonry::Loads;
use crate::validation::ValidationResult;

use super::{FrameType, ReinforcementMaterial, ReinforcementSpec};

// ============================================================================
// FrameResult
// ============================================================================

/// Stiffness and capacity of one frame. Units: kN/m, kNm, kN, m.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FrameResult {
    #[serde(rename = "K_frame")]
    pub k_frame: f64,
    #[serde(rename = "M_max")]
    pub m_max: f64,
    #[serde(rename = "V_max")]
    pub v_max: f64,
    #[serde(rename = "N_max")]
    pub n_max: f64,
    /// Span (m)
    #[serde(rename = "L")]
    pub l: f64,
    /// Height (m)
    #[serde(rename = "h")]
    pub h: f64,
    pub frame_type: Option<FrameType>,
    pub material: Option<ReinforcementMaterial>,
    /// Material-specific figures (inertia, bar areas, crack width...)
    #[serde(default)]
    pub extra_data: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl FrameResult {
    pub fn new(material: ReinforcementMaterial, frame_type: FrameType, l: f64, h: f64) -> Self {
        FrameResult {
            l,
            h,
            frame_type: Some(frame_type),
            material: Some(material),
            ..Default::default()
        }
    }

    /// A result carrying only an error
    pub fn failed(message: impl Into<String>) -> Self {
        let mut result = FrameResult::default();
        result.set_error(message);
        result
    }

    pub fn add_warning(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::warn!("{}", message);
        self.warnings.push(message);
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::error!("{}", message);
        self.error = Some(message);
    }

    pub fn insert_extra(&mut self, key: &str, value: impl Into<Value>) {
        self.extra_data.insert(key.to_string(), value.into());
    }

    pub fn is_valid(&self) -> bool {
        self.error.is_none() && self.k_frame >= 0.0
    }

    /// One-line description for reports
    pub fn summary(&self) -> String {
        if let Some(error) = &self.error {
            return format!("ERROR: {}", error);
        }
        let material = self.material.map(|m| m.display_name()).unwrap_or("?");
        let frame = self.frame_type.map(|t| t.display_name()).unwrap_or("?");
        format!(
            "{} {}: K = {:.1} kN/m, M = {:.1} kNm, V = {:.1} kN, N = {:.1} kN",
            material, frame, self.k_frame, self.m_max, self.v_max, self.n_max
        )
    }
}

// ============================================================================
// Calculation input / output
// ============================================================================

/// Everything a calculator needs for one reinforced opening.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationInput {
    pub opening: Opening,
    pub reinforcement: ReinforcementSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wall: Option<Wall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loads: Option<Loads>,
}

impl CalculationInput {
    pub fn new(opening: Opening, reinforcement: ReinforcementSpec) -> Self {
        CalculationInput {
            opening,
            reinforcement,
            wall: None,
            loads: None,
        }
    }

    /// Build the input for an opening that carries its own reinforcement.
    pub fn for_opening(opening: &Opening, wall: Option<&Wall>, loads: Option<&Loads>) -> Option<Self> {
        let reinforcement = opening.reinforcement.clone()?;
        Some(CalculationInput {
            opening: opening.clone(),
            reinforcement,
            wall: wall.copied(),
            loads: loads.copied(),
        })
    }

    /// Span (m)
    pub fn span_m(&self) -> f64 {
        self.opening.width / 100.0
    }

    /// Height (m)
    pub fn height_m(&self) -> f64 {
        self.opening.height / 100.0
    }

    /// Checks common to every material.
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        if !(self.opening.width > 0.0) {
            result.add_error("Opening width missing or not positive");
        }
        if !(self.opening.height > 0.0) {
            result.add_error("Opening height missing or not positive");
        }
        if self.reinforcement.material.trim().is_empty() {
            result.add_error("Reinforcement material not specified");
        }
        result
    }
}

/// Outcome of a full stiffness + capacity run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CalculationOutput {
    #[serde(rename = "K_frame")]
    pub k_frame: f64,
    #[serde(rename = "V_capacity")]
    pub v_capacity: f64,
    #[serde(rename = "M_capacity")]
    pub m_capacity: f64,
    #[serde(rename = "N_capacity")]
    pub n_capacity: f64,
    pub success: bool,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default)]
    pub details: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_result: Option<FrameResult>,
}

impl CalculationOutput {
    pub fn failed(errors: Vec<String>) -> Self {
        CalculationOutput {
            success: false,
            errors,
            ..Default::default()
        }
    }

    /// Wrap a single frame result.
    pub fn from_frame(result: FrameResult) -> Self {
        let mut output = CalculationOutput {
            k_frame: result.k_frame,
            v_capacity: result.v_max,
            m_capacity: result.m_max,
            n_capacity: result.n_max,
            success: result.is_valid(),
            warnings: result.warnings.clone(),
            details: result.extra_data.clone(),
            ..Default::default()
        };
        if let Some(error) = &result.error {
            output.errors.push(error.clone());
        }
        output.frame_result = Some(result);
        output
    }

    /// Stiffness from the first run, capacities from the second.
    pub fn combine(stiffness: FrameResult, capacity: FrameResult) -> Self {
        let mut output = CalculationOutput::from_frame(stiffness);
        output.v_capacity = capacity.v_max;
        output.m_capacity = capacity.m_max;
        output.n_capacity = capacity.n_max;
        output.success &= capacity.is_valid();
        if let Some(error) = capacity.error {
            output.errors.push(error);
        }
        output.warnings.extend(capacity.warnings);
        output.details.extend(capacity.extra_data);
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn steel_input() -> CalculationInput {
        CalculationInput::new(
            Opening::rectangular(100.0, 0.0, 120.0, 210.0),
            ReinforcementSpec::steel_portal("HEA 160", "HEA 160"),
        )
    }

    #[test]
    fn test_frame_result_validity() {
        let mut r = FrameResult::new(ReinforcementMaterial::Steel, FrameType::PortalFrame, 1.2, 2.1);
        assert!(r.is_valid());
        r.k_frame = 5000.0;
        assert!(r.summary().contains("5000.0"));
        r.set_error("broken");
        assert!(!r.is_valid());
        assert_eq!(r.summary(), "ERROR: broken");
    }

    #[test]
    fn test_input_validation() {
        assert!(steel_input().validate().is_valid);

        let mut input = steel_input();
        input.opening.width = 0.0;
        input.reinforcement.material.clear();
        let v = input.validate();
        assert!(!v.is_valid);
        assert_eq!(v.errors.len(), 2);
    }

    #[test]
    fn test_span_and_height_in_meters() {
        let input = steel_input();
        assert!((input.span_m() - 1.2).abs() < 1e-12);
        assert!((input.height_m() - 2.1).abs() < 1e-12);
    }

    #[test]
    fn test_for_opening_requires_reinforcement() {
        let bare = Opening::rectangular(0.0, 0.0, 100.0, 200.0);
        assert!(CalculationInput::for_opening(&bare, None, None).is_none());
        let framed = bare.with_reinforcement(ReinforcementSpec::steel_beam("IPE 200"));
        assert!(CalculationInput::for_opening(&framed, None, None).is_some());
    }

    #[test]
    fn test_combine_merges_both_runs() {
        let mut k = FrameResult::new(ReinforcementMaterial::Steel, FrameType::PortalFrame, 1.2, 2.1);
        k.k_frame = 8000.0;
        k.add_warning("stiffness note");
        k.insert_extra("I_beam_cm4", 3690.0);

        let mut c = FrameResult::new(ReinforcementMaterial::Steel, FrameType::PortalFrame, 1.2, 2.1);
        c.m_max = 50.0;
        c.v_max = 120.0;
        c.add_warning("capacity note");

        let out = CalculationOutput::combine(k, c);
        assert!(out.success);
        assert_eq!(out.k_frame, 8000.0);
        assert_eq!(out.m_capacity, 50.0);
        assert_eq!(out.v_capacity, 120.0);
        assert_eq!(out.warnings.len(), 2);
        assert!(out.details.contains_key("I_beam_cm4"));
        assert_eq!(out.frame_result.unwrap().k_frame, 8000.0);
    }

    #[test]
    fn test_combine_propagates_capacity_error() {
        let k = FrameResult::new(ReinforcementMaterial::Concrete, FrameType::BeamOnly, 1.0, 2.0);
        let c = FrameResult::failed("capacity blew up");
        let out = CalculationOutput::combine(k, c);
        assert!(!out.success);
        assert_eq!(out.errors, vec!["capacity blew up".to_string()]);
    }
}
