//! # Masonry Lateral Stiffness
//!
//! Lateral stiffness of a pier with flexural and shear deformability acting
//! in series:
//!
//! ```text
//! K_flex  = k·E·I / h³         (k = 3, 6 or 12 from the boundary conditions)
//! K_shear = χ·G·A / h          (χ = 1.2)
//! K       = 1 / (1/K_flex + 1/K_shear)
//! ```
//!
//! Piers between openings undergo the same top displacement, so a pierced
//! wall is the parallel sum of its piers. Results are in kN/m.

use serde::{Deserialize, Serialize};

use crate::constants::{constraint_factor, MASONRY_CHI, MASONRY_NU};
use crate::geometry::{area, moment_of_inertia};
use crate::units::{KnPerM, Mpa};

/// Stiffness of a wall or a set of piers (kN/m).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StiffnessResult {
    #[serde(rename = "K_total")]
    pub k_total: f64,
    #[serde(rename = "K_flex")]
    pub k_flex: f64,
    #[serde(rename = "K_shear")]
    pub k_shear: f64,
    pub k_constraint: f64,
    /// Per-pier stiffness, empty for a solid wall
    #[serde(rename = "K_maschi")]
    pub k_piers: Vec<f64>,
}

/// `G = E / (2·(1+ν))`
pub fn shear_modulus(e: f64) -> f64 {
    shear_modulus_with_nu(e, MASONRY_NU)
}

pub fn shear_modulus_with_nu(e: f64, nu: f64) -> f64 {
    e / (2.0 * (1.0 + nu))
}

/// Flexural stiffness (N/m with E in Pa), zero for a non-positive height
pub fn flexural_stiffness(k: f64, e_pa: f64, inertia: f64, height: f64) -> f64 {
    if height <= 0.0 {
        return 0.0;
    }
    k * e_pa * inertia / height.powi(3)
}

/// Shear stiffness (N/m with G in Pa), zero for a non-positive height
pub fn shear_stiffness(g_pa: f64, area: f64, height: f64) -> f64 {
    if height <= 0.0 {
        return 0.0;
    }
    MASONRY_CHI * g_pa * area / height
}

/// Springs in series; zero if either component is not positive.
pub fn combine_stiffness(k_flex: f64, k_shear: f64) -> f64 {
    if k_flex <= 0.0 || k_shear <= 0.0 {
        return 0.0;
    }
    1.0 / (1.0 / k_flex + 1.0 / k_shear)
}

/// Elastic moduli of the masonry (MPa)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Moduli {
    pub e: f64,
    pub g: f64,
}

impl Moduli {
    /// Derive G from E with the default Poisson ratio
    pub fn from_e(e: f64) -> Self {
        Moduli { e, g: shear_modulus(e) }
    }

    /// Use an explicit G when one is given
    pub fn new(e: f64, g: Option<f64>) -> Self {
        match g {
            Some(g) if g > 0.0 => Moduli { e, g },
            _ => Moduli::from_e(e),
        }
    }
}

/// Components (K, K_flex, K_shear) of one pier in kN/m
fn pier_components(length: f64, height: f64, thickness: f64, moduli: Moduli, k: f64) -> (f64, f64, f64) {
    let e_pa = Mpa(moduli.e).to_pa();
    let g_pa = Mpa(moduli.g).to_pa();

    let k_flex = flexural_stiffness(k, e_pa, moment_of_inertia(length, thickness), height);
    let k_shear = shear_stiffness(g_pa, area(length, thickness), height);
    let k_total = combine_stiffness(k_flex, k_shear);

    (
        KnPerM::from_n_per_m(k_total).value(),
        KnPerM::from_n_per_m(k_flex).value(),
        KnPerM::from_n_per_m(k_shear).value(),
    )
}

/// Solid wall stiffness. Dimensions in meters.
pub fn calculate_wall_stiffness(
    length: f64,
    height: f64,
    thickness: f64,
    moduli: Moduli,
    bottom: &str,
    top: &str,
) -> StiffnessResult {
    let k = constraint_factor(bottom, top);
    let (k_total, k_flex, k_shear) = pier_components(length, height, thickness, moduli, k);

    StiffnessResult {
        k_total,
        k_flex,
        k_shear,
        k_constraint: k,
        k_piers: Vec::new(),
    }
}

/// Parallel sum of pier stiffnesses. Pier lengths in meters.
pub fn calculate_wall_with_openings_stiffness(
    pier_lengths: &[f64],
    height: f64,
    thickness: f64,
    moduli: Moduli,
    bottom: &str,
    top: &str,
) -> StiffnessResult {
    let k = constraint_factor(bottom, top);
    let mut result = StiffnessResult {
        k_constraint: k,
        ..Default::default()
    };

    for &length in pier_lengths {
        if length <= 0.0 {
            result.k_piers.push(0.0);
            continue;
        }
        let (k_total, k_flex, k_shear) = pier_components(length, height, thickness, moduli, k);
        result.k_total += k_total;
        result.k_flex += k_flex;
        result.k_shear += k_shear;
        result.k_piers.push(k_total);
    }

    result
}
