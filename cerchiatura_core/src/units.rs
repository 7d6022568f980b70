//! # Unit Types
//!
//! Lightweight newtype wrappers for the SI units used by the engine. Inputs
//! arrive in centimeters (wall and opening geometry) and millimeters (bar
//! diameters, covers); the formulas work in meters, MPa, kN and kN/m.
//!
//! ## Conventions
//!
//! - Length: centimeters at the boundary, meters internally
//! - Stress / strength: MPa (N/mm²)
//! - Force: kN
//! - Moment: kN·m
//! - Lateral stiffness: kN/m
//!
//! ## Example
//!
//! ```rust
//! use cerchiatura_core::units::{Centimeters, Meters};
//!
//! let length = Centimeters(250.0);
//! let meters: Meters = length.into();
//! assert_eq!(meters.0, 2.5);
//! ```

use serde::{Deserialize, Serialize};
use std::ops::{Add, Div, Mul, Sub};

// ============================================================================
// Length Units
// ============================================================================

/// Length in centimeters
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Centimeters(pub f64);

/// Length in meters
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Meters(pub f64);

/// Length in millimeters
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Millimeters(pub f64);

impl From<Centimeters> for Meters {
    fn from(cm: Centimeters) -> Self {
        Meters(cm.0 / 100.0)
    }
}

impl From<Meters> for Centimeters {
    fn from(m: Meters) -> Self {
        Centimeters(m.0 * 100.0)
    }
}

impl From<Millimeters> for Meters {
    fn from(mm: Millimeters) -> Self {
        Meters(mm.0 / 1000.0)
    }
}

impl From<Meters> for Millimeters {
    fn from(m: Meters) -> Self {
        Millimeters(m.0 * 1000.0)
    }
}

// ============================================================================
// Force, Stress, Stiffness
// ============================================================================

/// Force in kilonewtons
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KiloNewtons(pub f64);

/// Stress in MPa (N/mm²)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Mpa(pub f64);

/// Lateral stiffness in kN/m
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KnPerM(pub f64);

impl Mpa {
    /// Convert to Pa (N/m²)
    pub fn to_pa(self) -> f64 {
        self.0 * 1e6
    }
}

impl KnPerM {
    /// Build from a stiffness expressed in N/m
    pub fn from_n_per_m(value: f64) -> Self {
        KnPerM(value / 1000.0)
    }
}

// ============================================================================
// Section property conversions (profile tables use cm-based units)
// ============================================================================

/// cm² → m²
pub fn cm2_to_m2(value: f64) -> f64 {
    value * 1e-4
}

/// cm³ → m³
pub fn cm3_to_m3(value: f64) -> f64 {
    value * 1e-6
}

/// cm⁴ → m⁴
pub fn cm4_to_m4(value: f64) -> f64 {
    value * 1e-8
}

// ============================================================================
// Arithmetic Operations
// ============================================================================

macro_rules! impl_arithmetic {
    ($type:ty) => {
        impl Add for $type {
            type Output = Self;
            fn add(self, rhs: Self) -> Self::Output {
                Self(self.0 + rhs.0)
            }
        }

        impl Sub for $type {
            type Output = Self;
            fn sub(self, rhs: Self) -> Self::Output {
                Self(self.0 - rhs.0)
            }
        }

        impl Mul<f64> for $type {
            type Output = Self;
            fn mul(self, rhs: f64) -> Self::Output {
                Self(self.0 * rhs)
            }
        }

        impl Div<f64> for $type {
            type Output = Self;
            fn div(self, rhs: f64) -> Self::Output {
                Self(self.0 / rhs)
            }
        }

        impl $type {
            /// Get the raw f64 value
            pub fn value(self) -> f64 {
                self.0
            }
        }
    };
}

impl_arithmetic!(Centimeters);
impl_arithmetic!(Meters);
impl_arithmetic!(Millimeters);
impl_arithmetic!(KiloNewtons);
impl_arithmetic!(Mpa);
impl_arithmetic!(KnPerM);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_conversions() {
        let m: Meters = Centimeters(30.0).into();
        assert!((m.0 - 0.30).abs() < 1e-12);
        let mm: Millimeters = Meters(0.016).into();
        assert!((mm.0 - 16.0).abs() < 1e-9);
        let cm: Centimeters = Meters(2.7).into();
        assert!((cm.0 - 270.0).abs() < 1e-9);
    }

    #[test]
    fn test_section_conversions() {
        assert!((cm4_to_m4(1673.0) - 1.673e-5).abs() < 1e-12);
        assert!((cm3_to_m3(220.1) - 2.201e-4).abs() < 1e-12);
        assert!((cm2_to_m2(38.8) - 3.88e-3).abs() < 1e-12);
    }

    #[test]
    fn test_arithmetic_and_stiffness() {
        let total = KnPerM(1000.0) + KnPerM(500.0);
        assert_eq!(total.value(), 1500.0);
        assert_eq!(KnPerM::from_n_per_m(2.5e6).value(), 2500.0);
        assert_eq!(Mpa(1410.0).to_pa(), 1.41e9);
        assert_eq!((KiloNewtons(150.0) / 3.0).value(), 50.0);
    }

    #[test]
    fn test_transparent_serialization() {
        let json = serde_json::to_string(&Centimeters(250.0)).unwrap();
        assert_eq!(json, "250.0");
    }
}
