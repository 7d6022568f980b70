//! # Calculator Registry
//!
//! Dispatch table from reinforcement descriptors to calculators. A registry
//! is an ordinary value: build one at startup (usually with
//! [`CalculatorRegistry::with_defaults`]) and pass it by reference to the
//! analysis.

use crate::errors::{CalcError, CalcResult};

use super::concrete::ConcreteFrameCalculator;
use super::frame_result::{CalculationInput, CalculationOutput};
use super::interface::{Capability, ReinforcementCalculator};
use super::steel::SteelFrameCalculator;
use super::{FrameType, ReinforcementMaterial, ReinforcementSpec};

/// Registered calculators in registration order.
///
/// Lookup by material returns the first calculator that accepts the
/// descriptor, so earlier registrations take precedence.
#[derive(Default)]
pub struct CalculatorRegistry {
    calculators: Vec<(String, Box<dyn ReinforcementCalculator>)>,
}

/// Registry key: lowercase name with spaces as underscores
fn make_key(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "_")
}

impl CalculatorRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the steel and concrete calculators
    pub fn with_defaults() -> Self {
        RegistryBuilder::new()
            .with(SteelFrameCalculator::new())
            .with(ConcreteFrameCalculator::new())
            .build()
    }

    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Add a calculator, replacing one registered under the same name.
    pub fn register(&mut self, calculator: Box<dyn ReinforcementCalculator>) {
        let capability = calculator.capability();
        let key = make_key(&capability.name);

        if let Some(slot) = self.calculators.iter_mut().find(|(k, _)| *k == key) {
            log::warn!("Calculator '{}' already registered, replacing it", capability.name);
            slot.1 = calculator;
        } else {
            self.calculators.push((key, calculator));
        }
        log::info!("Registered calculator: {} v{}", capability.name, capability.version);
    }

    /// Remove a calculator by name. Returns whether one was removed.
    pub fn unregister(&mut self, name: &str) -> bool {
        let key = make_key(name);
        let before = self.calculators.len();
        self.calculators.retain(|(k, _)| *k != key);
        let removed = self.calculators.len() != before;
        if removed {
            log::info!("Removed calculator: {}", name);
        }
        removed
    }

    pub fn get_calculator(&self, name: &str) -> Option<&dyn ReinforcementCalculator> {
        let key = make_key(name);
        self.calculators
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, c)| c.as_ref())
    }

    /// First calculator whose `can_handle` accepts the descriptor.
    pub fn get_calculator_for(&self, reinforcement: &ReinforcementSpec) -> Option<&dyn ReinforcementCalculator> {
        self.calculators
            .iter()
            .map(|(_, c)| c.as_ref())
            .find(|c| c.can_handle(reinforcement))
    }

    /// Like [`get_calculator_for`](Self::get_calculator_for) but with an error
    /// naming the unmatched material.
    pub fn calculator_for(&self, reinforcement: &ReinforcementSpec) -> CalcResult<&dyn ReinforcementCalculator> {
        self.get_calculator_for(reinforcement)
            .ok_or_else(|| CalcError::calculator_not_found(&reinforcement.material))
    }

    /// Run the matching calculator. A missing match yields a failed output.
    pub fn calculate(&self, input: &CalculationInput) -> CalculationOutput {
        match self.calculator_for(&input.reinforcement) {
            Ok(calculator) => calculator.calculate(input),
            Err(e) => {
                log::error!("{}", e);
                CalculationOutput::failed(vec![format!(
                    "No calculator for material: {}",
                    input.reinforcement.material
                )])
            }
        }
    }

    pub fn len(&self) -> usize {
        self.calculators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calculators.is_empty()
    }

    pub fn capabilities(&self) -> Vec<Capability> {
        self.calculators.iter().map(|(_, c)| c.capability()).collect()
    }

    /// Materials covered by at least one calculator, deduplicated and sorted
    pub fn available_materials(&self) -> Vec<ReinforcementMaterial> {
        let mut materials: Vec<_> = self.capabilities().into_iter().flat_map(|c| c.materials).collect();
        materials.sort();
        materials.dedup();
        materials
    }

    /// Frame types covered by at least one calculator, deduplicated and sorted
    pub fn available_types(&self) -> Vec<FrameType> {
        let mut types: Vec<_> = self.capabilities().into_iter().flat_map(|c| c.frame_types).collect();
        types.sort();
        types.dedup();
        types
    }

    /// Human-readable summary of the registered calculators
    pub fn info(&self) -> String {
        let mut lines = vec![format!("Reinforcement calculators: {}", self.len())];
        for cap in self.capabilities() {
            let materials: Vec<_> = cap.materials.iter().map(|m| m.code()).collect();
            lines.push(format!("  - {} v{}", cap.name, cap.version));
            lines.push(format!("    Materials: {}", materials.join(", ")));
            lines.push(format!("    Arches: {}", if cap.supports_arches { "yes" } else { "no" }));
        }
        lines.join("\n")
    }
}

impl std::fmt::Debug for CalculatorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CalculatorRegistry")
            .field("calculators", &self.calculators.iter().map(|(k, _)| k).collect::<Vec<_>>())
            .finish()
    }
}

/// Fluent construction of a [`CalculatorRegistry`].
#[derive(Default)]
pub struct RegistryBuilder {
    registry: CalculatorRegistry,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<C: ReinforcementCalculator + 'static>(mut self, calculator: C) -> Self {
        self.registry.register(Box::new(calculator));
        self
    }

    pub fn build(self) -> CalculatorRegistry {
        self.registry
    }
}
