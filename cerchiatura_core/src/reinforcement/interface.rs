//! The contract every reinforcement calculator implements.

use serde::{Deserialize, Serialize};

use crate::validation::ValidationResult;

use super::frame_result::{CalculationInput, CalculationOutput, FrameResult};
use super::{FrameType, ReinforcementMaterial, ReinforcementSpec};

/// What a calculator declares it can do.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Capability {
    pub name: String,
    pub version: String,
    pub description: String,
    pub materials: Vec<ReinforcementMaterial>,
    pub frame_types: Vec<FrameType>,
    pub supports_arches: bool,
}

impl Capability {
    pub fn supports(&self, material: ReinforcementMaterial) -> bool {
        self.materials.contains(&material)
    }
}

/// A stiffness and capacity model for one reinforcement material.
///
/// Implementors provide [`capability`](Self::capability),
/// [`calculate_stiffness`](Self::calculate_stiffness) and
/// [`calculate_capacity`](Self::calculate_capacity); [`calculate`](Self::calculate)
/// runs both after validation.
pub trait ReinforcementCalculator: Send + Sync {
    fn capability(&self) -> Capability;

    fn name(&self) -> String {
        self.capability().name
    }

    /// Whether the descriptor's material tag is one this calculator handles.
    fn can_handle(&self, reinforcement: &ReinforcementSpec) -> bool {
        reinforcement
            .material_kind()
            .map(|m| self.capability().supports(m))
            .unwrap_or(false)
    }

    /// Common input checks plus whatever the implementor adds.
    fn validate_input(&self, input: &CalculationInput) -> ValidationResult {
        let mut result = input.validate();
        if !self.can_handle(&input.reinforcement) {
            result.add_error(format!(
                "{} cannot handle material '{}'",
                self.name(),
                input.reinforcement.material
            ));
        }
        result
    }

    fn calculate_stiffness(&self, input: &CalculationInput) -> FrameResult;

    fn calculate_capacity(&self, input: &CalculationInput) -> FrameResult;

    /// Validate, then stiffness, then capacity.
    ///
    /// Invalid input or a failed stiffness run stops the sequence.
    fn calculate(&self, input: &CalculationInput) -> CalculationOutput {
        let validation = self.validate_input(input);
        if !validation.is_valid {
            let mut output = CalculationOutput::failed(validation.errors);
            output.warnings = validation.warnings;
            return output;
        }

        let stiffness = self.calculate_stiffness(input);
        if !stiffness.is_valid() {
            let mut output = CalculationOutput::from_frame(stiffness);
            output.warnings.splice(0..0, validation.warnings);
            return output;
        }

        let capacity = self.calculate_capacity(input);
        let mut output = CalculationOutput::combine(stiffness, capacity);
        output.warnings.splice(0..0, validation.warnings);
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Opening;

    struct Fixed {
        k: f64,
        fail_stiffness: bool,
    }

    impl ReinforcementCalculator for Fixed {
        fn capability(&self) -> Capability {
            Capability {
                name: "Fixed".to_string(),
                version: "0.1".to_string(),
                description: "test double".to_string(),
                materials: vec![ReinforcementMaterial::Steel],
                frame_types: vec![FrameType::PortalFrame],
                supports_arches: false,
            }
        }

        fn calculate_stiffness(&self, _input: &CalculationInput) -> FrameResult {
            if self.fail_stiffness {
                return FrameResult::failed("no stiffness");
            }
            FrameResult {
                k_frame: self.k,
                ..Default::default()
            }
        }

        fn calculate_capacity(&self, _input: &CalculationInput) -> FrameResult {
            FrameResult {
                m_max: 10.0,
                v_max: 20.0,
                n_max: 30.0,
                ..Default::default()
            }
        }
    }

    fn input(material: &str) -> CalculationInput {
        let mut spec = ReinforcementSpec::steel_portal("HEA 160", "HEA 160");
        spec.material = material.to_string();
        CalculationInput::new(Opening::rectangular(0.0, 0.0, 100.0, 200.0), spec)
    }

    #[test]
    fn test_can_handle_by_material() {
        let calc = Fixed { k: 1.0, fail_stiffness: false };
        assert!(calc.can_handle(&input("acciaio").reinforcement));
        assert!(calc.can_handle(&input("Steel").reinforcement));
        assert!(!calc.can_handle(&input("ca").reinforcement));
        assert!(!calc.can_handle(&input("legno").reinforcement));
    }

    #[test]
    fn test_template_merges_stiffness_and_capacity() {
        let out = Fixed { k: 1234.0, fail_stiffness: false }.calculate(&input("acciaio"));
        assert!(out.success);
        assert_eq!(out.k_frame, 1234.0);
        assert_eq!((out.m_capacity, out.v_capacity, out.n_capacity), (10.0, 20.0, 30.0));
    }

    #[test]
    fn test_template_stops_on_invalid_input() {
        let out = Fixed { k: 1.0, fail_stiffness: false }.calculate(&input("ca"));
        assert!(!out.success);
        assert!(out.errors[0].contains("cannot handle"));
        assert!(out.frame_result.is_none());
    }

    #[test]
    fn test_template_stops_on_failed_stiffness() {
        let out = Fixed { k: 1.0, fail_stiffness: true }.calculate(&input("acciaio"));
        assert!(!out.success);
        assert_eq!(out.errors, vec!["no stiffness".to_string()]);
        assert_eq!(out.m_capacity, 0.0);
    }
}
