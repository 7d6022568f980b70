//! # Wall Geometry and Pier Segmentation
//!
//! Walls and openings are described in centimeters, the way they are entered
//! on site drawings. A wall pierced by openings is split into masonry piers
//! ("maschi murari"): the solid segments between two openings or between an
//! opening and a wall edge. Piers are recomputed from scratch for every
//! opening list.
//!
//! ## Example
//!
//! ```rust
//! use cerchiatura_core::geometry::{identify_piers, Opening, Wall};
//!
//! let wall = Wall::new(500.0, 270.0, 30.0);
//! let openings = vec![
//!     Opening::rectangular(50.0, 0.0, 100.0, 210.0),
//!     Opening::rectangular(250.0, 0.0, 100.0, 210.0),
//! ];
//!
//! let piers = identify_piers(&wall, &openings);
//! assert_eq!(piers.len(), 3);
//! assert!((piers.opening_ratio() - 0.40).abs() < 1e-9);
//! ```

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::reinforcement::ReinforcementSpec;
use crate::units::{Centimeters, Meters};

// ============================================================================
// Wall
// ============================================================================

/// Wall geometry in centimeters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Wall {
    /// Length along the wall axis (cm)
    pub length: f64,
    /// Height (cm)
    pub height: f64,
    /// Thickness (cm)
    pub thickness: f64,
}

impl Wall {
    pub fn new(length: f64, height: f64, thickness: f64) -> Self {
        Wall { length, height, thickness }
    }

    pub fn length_m(&self) -> f64 {
        Meters::from(Centimeters(self.length)).0
    }

    pub fn height_m(&self) -> f64 {
        Meters::from(Centimeters(self.height)).0
    }

    pub fn thickness_m(&self) -> f64 {
        Meters::from(Centimeters(self.thickness)).0
    }

    /// Horizontal cross-section area `length × thickness` (m²)
    pub fn area_m2(&self) -> f64 {
        area(self.length_m(), self.thickness_m())
    }

    /// Elevation area `length × height` (m²), used for the opening ratio check
    pub fn elevation_area_m2(&self) -> f64 {
        self.length_m() * self.height_m()
    }
}

// ============================================================================
// Openings
// ============================================================================

/// Shape of an opening.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OpeningType {
    #[default]
    #[serde(alias = "Rettangolare")]
    Rectangular,
    #[serde(alias = "Ad arco")]
    Arched,
    #[serde(alias = "Circolare")]
    Circular,
    #[serde(alias = "Ovale")]
    Oval,
    #[serde(alias = "Ellittica")]
    Elliptical,
    /// Recess that does not cross the full thickness
    #[serde(alias = "Nicchia")]
    Niche,
    /// Infill (closing) of an existing opening
    #[serde(alias = "Tamponamento")]
    Infill,
}

/// Arch profile of an arched opening.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ArchType {
    /// Semicircular (tutto sesto)
    #[default]
    #[serde(alias = "Tutto sesto")]
    FullCentre,
    /// Segmental (ribassato)
    #[serde(alias = "Ribassato")]
    Segmental,
    /// Pointed / ogival (rialzato)
    #[serde(alias = "Rialzato (ogivale)")]
    Pointed,
    /// Basket-handle (policentrico)
    #[serde(alias = "Policentrico")]
    Polycentric,
}

/// Geometry of the arched head of an opening.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArchGeometry {
    #[serde(default, alias = "arch_type")]
    pub kind: ArchType,
    /// Rise of the arch (cm)
    #[serde(default = "default_arch_rise", alias = "arch_rise")]
    pub rise: f64,
}

fn default_arch_rise() -> f64 {
    60.0
}

/// An opening in the wall, positioned from the wall's left edge and base (cm).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Opening {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    /// Optional user label (e.g. "A1", "Porta cucina")
    #[serde(default)]
    pub label: Option<String>,
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(rename = "type", default)]
    pub kind: OpeningType,
    /// `true` when the opening exists before the intervention
    #[serde(default)]
    pub existing: bool,
    #[serde(default, alias = "arch_data")]
    pub arch: Option<ArchGeometry>,
    /// Frame inserted around a new opening
    #[serde(default, alias = "rinforzo")]
    pub reinforcement: Option<ReinforcementSpec>,
}

impl Opening {
    /// New (post-intervention) rectangular opening without reinforcement.
    pub fn rectangular(x: f64, y: f64, width: f64, height: f64) -> Self {
        Opening {
            id: Uuid::new_v4(),
            label: None,
            x,
            y,
            width,
            height,
            kind: OpeningType::Rectangular,
            existing: false,
            arch: None,
            reinforcement: None,
        }
    }

    /// Mark as pre-existing
    pub fn existing(mut self) -> Self {
        self.existing = true;
        self
    }

    pub fn with_reinforcement(mut self, reinforcement: ReinforcementSpec) -> Self {
        self.reinforcement = Some(reinforcement);
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Right edge (cm)
    pub fn end(&self) -> f64 {
        self.x + self.width
    }

    /// Elevation area (m²)
    pub fn area_m2(&self) -> f64 {
        (self.width / 100.0) * (self.height / 100.0)
    }

    /// Label if set, otherwise the first block of the UUID
    pub fn display_label(&self) -> String {
        match &self.label {
            Some(label) => label.clone(),
            None => self.id.to_string().chars().take(8).collect(),
        }
    }
}

// ============================================================================
// Piers
// ============================================================================

/// A solid masonry segment (cm).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pier {
    pub start: f64,
    pub end: f64,
    pub length: f64,
    pub index: usize,
}

impl Pier {
    fn new(start: f64, end: f64, index: usize) -> Self {
        Pier {
            start,
            end,
            length: end - start,
            index,
        }
    }

    pub fn length_m(&self) -> f64 {
        self.length / 100.0
    }

    pub fn center(&self) -> f64 {
        (self.start + self.end) / 2.0
    }
}

/// All piers of a wall plus the totals used for the opening ratio.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PierSet {
    pub piers: Vec<Pier>,
    /// Wall length (cm)
    pub wall_length: f64,
    /// Sum of pier lengths (cm)
    pub total_length: f64,
    /// Wall length not occupied by piers (cm)
    pub opening_length: f64,
}

impl PierSet {
    pub fn len(&self) -> usize {
        self.piers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.piers.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Pier> {
        self.piers.iter()
    }

    /// `1 − Σ pier.length / wall.length`
    pub fn opening_ratio(&self) -> f64 {
        if self.wall_length > 0.0 {
            self.opening_length / self.wall_length
        } else {
            0.0
        }
    }

    /// `Σ pier.length / wall.length`
    pub fn pier_ratio(&self) -> f64 {
        if self.wall_length > 0.0 {
            self.total_length / self.wall_length
        } else {
            0.0
        }
    }

    /// Pier lengths in meters
    pub fn lengths_m(&self) -> Vec<f64> {
        self.piers.iter().map(Pier::length_m).collect()
    }

    /// Narrowest pier (cm), `None` for an empty set
    pub fn min_length(&self) -> Option<f64> {
        self.piers.iter().map(|p| p.length).reduce(f64::min)
    }
}

/// Split a wall into piers around its openings.
///
/// Openings are sorted by `x`. A leading pier covers `[0, first.x)`, an
/// intermediate pier is created wherever the gap between consecutive
/// openings is positive, and a trailing pier covers `[last end, length)`.
/// With no openings the whole wall is a single pier.
pub fn identify_piers(wall: &Wall, openings: &[Opening]) -> PierSet {
    let mut piers = Vec::new();

    if openings.is_empty() {
        if wall.length > 0.0 {
            piers.push(Pier::new(0.0, wall.length, 0));
        }
    } else {
        let mut sorted: Vec<&Opening> = openings.iter().collect();
        sorted.sort_by(|a, b| a.x.total_cmp(&b.x));

        let first_x = sorted[0].x;
        if first_x > 0.0 {
            piers.push(Pier::new(0.0, first_x.min(wall.length), piers.len()));
        }

        // Running right edge so that nested or overlapping openings never
        // produce a pier inside another opening
        let mut covered_to = sorted[0].end();
        for next in sorted.iter().skip(1) {
            if next.x > covered_to {
                piers.push(Pier::new(covered_to, next.x, piers.len()));
            }
            covered_to = covered_to.max(next.end());
        }

        if covered_to < wall.length {
            piers.push(Pier::new(covered_to, wall.length, piers.len()));
        }
    }

    let total_length: f64 = piers.iter().map(|p| p.length).sum();
    log::debug!(
        "Identified {} piers: total {:.1} cm over wall {:.1} cm",
        piers.len(),
        total_length,
        wall.length
    );

    PierSet {
        piers,
        wall_length: wall.length,
        total_length,
        opening_length: wall.length - total_length,
    }
}

/// Vertical load (kN) on each pier: `n · pier.length / wall_length`.
///
/// `n` is the load on the whole wall, so each pier takes the share of its own
/// footprint. The shares add up to `n · total_length / wall_length`, which is
/// `n` only for a solid wall. Returns an empty vector for a degenerate wall.
pub fn distribute_load(n: f64, piers: &PierSet, wall_length: f64) -> Vec<f64> {
    if wall_length <= 0.0 {
        return Vec::new();
    }
    piers.iter().map(|p| n * p.length / wall_length).collect()
}

// ============================================================================
// Section helpers (meters)
// ============================================================================

/// Cross-section area `L·t` (m²)
pub fn area(length: f64, thickness: f64) -> f64 {
    length * thickness
}

/// Strong-axis moment of inertia `t·L³/12` (m⁴)
pub fn moment_of_inertia(length: f64, thickness: f64) -> f64 {
    thickness * length.powi(3) / 12.0
}

/// Elastic section modulus `A·L/6` (m³)
pub fn section_modulus(area: f64, length: f64) -> f64 {
    area * length / 6.0
}

/// Slenderness `h/t`, infinite for a non-positive thickness
pub fn slenderness(height: f64, thickness: f64) -> f64 {
    if thickness <= 0.0 {
        f64::INFINITY
    } else {
        height / thickness
    }
}

/// Aspect ratio `h/L`, infinite for a non-positive length
pub fn aspect_ratio(height: f64, length: f64) -> f64 {
    if length <= 0.0 {
        f64::INFINITY
    } else {
        height / length
    }
}

/// Effective height for lateral stiffness: the clear wall height
pub fn effective_height(height: f64) -> f64 {
    height
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wall_5m() -> Wall {
        Wall::new(500.0, 270.0, 30.0)
    }

    #[test]
    fn test_no_openings_single_pier() {
        let piers = identify_piers(&wall_5m(), &[]);
        assert_eq!(piers.len(), 1);
        assert_eq!(piers.piers[0].length, 500.0);
        assert_eq!(piers.opening_ratio(), 0.0);
    }

    #[test]
    fn test_three_piers() {
        // Adjacent openings (given out of order) leave no pier between them
        let openings = vec![
            Opening::rectangular(150.0, 0.0, 100.0, 210.0),
            Opening::rectangular(50.0, 0.0, 100.0, 210.0),
        ];
        let piers = identify_piers(&wall_5m(), &openings);
        let lengths: Vec<f64> = piers.iter().map(|p| p.length).collect();
        assert_eq!(lengths, vec![50.0, 250.0]);

        // 0.5 m / 1.0 m / 1.5 m piers around two 1.0 m openings
        let openings = vec![
            Opening::rectangular(50.0, 0.0, 100.0, 210.0),
            Opening::rectangular(250.0, 0.0, 100.0, 210.0),
        ];
        let piers = identify_piers(&wall_5m(), &openings);
        let lengths: Vec<f64> = piers.iter().map(|p| p.length).collect();
        assert_eq!(lengths, vec![50.0, 100.0, 150.0]);
        assert_eq!(piers.piers[2].index, 2);
    }

    #[test]
    fn test_segmentation_completeness() {
        let wall = wall_5m();
        let openings = vec![
            Opening::rectangular(0.0, 0.0, 80.0, 210.0),
            Opening::rectangular(120.0, 0.0, 90.0, 210.0),
            Opening::rectangular(400.0, 0.0, 100.0, 210.0),
        ];
        let piers = identify_piers(&wall, &openings);
        let openings_width: f64 = openings.iter().map(|o| o.width).sum();
        assert!((piers.total_length + openings_width - wall.length).abs() < 1e-9);
        // Openings touching both edges leave no edge piers
        assert_eq!(piers.len(), 2);
    }

    #[test]
    fn test_overlapping_openings_produce_no_inner_pier() {
        let openings = vec![
            Opening::rectangular(100.0, 0.0, 200.0, 210.0),
            Opening::rectangular(150.0, 0.0, 50.0, 100.0),
        ];
        let piers = identify_piers(&wall_5m(), &openings);
        let lengths: Vec<f64> = piers.iter().map(|p| p.length).collect();
        assert_eq!(lengths, vec![100.0, 200.0]);
    }

    #[test]
    fn test_load_distribution_solid_wall_conserves() {
        let wall = wall_5m();
        let piers = identify_piers(&wall, &[]);
        for n in [0.0, 1.0, 150.0, 1234.5] {
            let total: f64 = distribute_load(n, &piers, wall.length).iter().sum();
            assert!((total - n).abs() < 1e-9);
        }
    }

    #[test]
    fn test_load_distribution_uses_wall_length() {
        let wall = Wall::new(400.0, 280.0, 35.0);
        let piers = identify_piers(&wall, &[Opening::rectangular(150.0, 0.0, 100.0, 210.0)]);
        let shares = distribute_load(100.0, &piers, wall.length);
        assert_eq!(shares.len(), 2);
        assert!((shares[0] - 37.5).abs() < 1e-9);
        assert!((shares[1] - 37.5).abs() < 1e-9);
    }

    #[test]
    fn test_load_distribution_total_scales_with_pier_length() {
        let wall = wall_5m();
        let openings = vec![
            Opening::rectangular(50.0, 0.0, 100.0, 210.0),
            Opening::rectangular(250.0, 0.0, 100.0, 210.0),
        ];
        let piers = identify_piers(&wall, &openings);
        for n in [0.0, 1.0, 150.0, 1234.5] {
            let total: f64 = distribute_load(n, &piers, wall.length).iter().sum();
            assert!((total - n * piers.total_length / wall.length).abs() < 1e-9);
        }
        let shares = distribute_load(300.0, &piers, wall.length);
        assert!((shares[0] - 30.0).abs() < 1e-9);
        assert!((shares[2] - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_load_distribution_degenerate_wall() {
        let piers = identify_piers(&Wall::new(0.0, 270.0, 30.0), &[]);
        assert!(distribute_load(100.0, &piers, 0.0).is_empty());
    }

    #[test]
    fn test_section_helpers() {
        assert!((area(2.0, 0.3) - 0.6).abs() < 1e-12);
        assert!((moment_of_inertia(2.0, 0.3) - 0.2).abs() < 1e-12);
        assert!((section_modulus(0.6, 2.0) - 0.2).abs() < 1e-12);
        assert!((slenderness(2.7, 0.3) - 9.0).abs() < 1e-12);
        assert!(slenderness(2.7, 0.0).is_infinite());
        assert!(aspect_ratio(2.7, 0.0).is_infinite());
        assert_eq!(effective_height(2.7), 2.7);
    }

    #[test]
    fn test_opening_deserialization_with_italian_keys() {
        let json = r#"{
            "x": 100, "y": 0, "width": 120, "height": 220,
            "type": "Ad arco",
            "existing": true,
            "arch_data": { "arch_type": "Ribassato", "arch_rise": 40 }
        }"#;
        let opening: Opening = serde_json::from_str(json).unwrap();
        assert_eq!(opening.kind, OpeningType::Arched);
        assert!(opening.existing);
        let arch = opening.arch.unwrap();
        assert_eq!(arch.kind, ArchType::Segmental);
        assert_eq!(arch.rise, 40.0);
        assert!(opening.reinforcement.is_none());
    }
}
