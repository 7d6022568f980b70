//! # cerchiatura_core - Local Intervention Verification Engine
//!
//! Checks whether opening a new door or window in a load-bearing masonry wall,
//! and framing it with a steel or reinforced-concrete "cerchiatura", is a
//! local intervention under NTC 2018 §8.4.1: lateral stiffness within ±15 %
//! of the original wall and resistance reduced by no more than 20 %.
//!
//! ## Design Philosophy
//!
//! - **Stateless**: every run builds its results from the request it is given
//! - **JSON-First**: inputs and outputs implement Serialize/Deserialize
//! - **Diagnostics as data**: warnings and errors travel in the results,
//!   logging through the `log` facade is secondary
//!
//! ## Quick Start
//!
//! ```rust
//! use cerchiatura_core::geometry::Wall;
//! use cerchiatura_core::masonry::{MasonryCalculator, MasonryProperties};
//! use cerchiatura_core::verifier::verify_local_intervention;
//!
//! let calc = MasonryCalculator::new();
//! let masonry = MasonryProperties::new(2.4, 0.06, 1500.0);
//! let k = calc.calculate_stiffness(&Wall::new(400.0, 300.0, 40.0), &masonry, None);
//!
//! let check = verify_local_intervention(k, k * 0.9, 100.0, 95.0);
//! assert!(check.is_local);
//! ```
//!
//! ## Modules
//!
//! - [`constants`] - NTC 2018 factors, limits and material tables
//! - [`geometry`] - walls, openings, piers and load distribution
//! - [`validation`] - plausibility checks on geometry and masonry
//! - [`masonry`] - shear resistance and lateral stiffness of masonry walls
//! - [`reinforcement`] - steel / RC frame calculators and their registry
//! - [`verifier`] - local-intervention and opening-geometry checks
//! - [`materials`] - masonry materials database with custom entries
//! - [`project`] - calculation request and engine settings
//! - [`analysis`] - original vs. modified state comparison
//! - [`file_io`] - atomic JSON saves and file locking
//! - [`units`], [`errors`]

pub mod analysis;
pub mod constants;
pub mod errors;
pub mod file_io;
pub mod geometry;
pub mod masonry;
pub mod materials;
pub mod project;
pub mod reinforcement;
pub mod units;
pub mod validation;
pub mod verifier;

pub use analysis::{AnalysisResult, CalculationService};
pub use errors::{CalcError, CalcResult};
pub use geometry::{Opening, Wall};
pub use masonry::{MasonryCalculator, MasonryProperties};
pub use materials::MaterialsDb;
pub use project::{load_request, CalculationRequest, EngineSettings};
pub use reinforcement::{CalculatorRegistry, ReinforcementSpec};
pub use verifier::{verify_local_intervention, VerificationResult};
