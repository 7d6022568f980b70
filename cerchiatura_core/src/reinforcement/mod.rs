//! # Reinforcement Frames
//!
//! Steel and reinforced-concrete frames ("cerchiature") inserted around new
//! openings. Each material has its own calculator behind the
//! [`ReinforcementCalculator`] trait; a [`CalculatorRegistry`] picks the
//! calculator for a reinforcement from its material tag.
//!
//! Reinforcement descriptors accept both English keys and the Italian keys
//! used on project sheets (`materiale`, `tipo`, `architrave`, `piedritti`, ...).
//!
//! ## Example
//!
//! ```rust
//! use cerchiatura_core::geometry::Opening;
//! use cerchiatura_core::reinforcement::{CalculationInput, CalculatorRegistry, ReinforcementSpec};
//!
//! let registry = CalculatorRegistry::with_defaults();
//! let input = CalculationInput::new(
//!     Opening::rectangular(100.0, 0.0, 120.0, 210.0),
//!     ReinforcementSpec::steel_portal("HEA 160", "HEA 160"),
//! );
//!
//! let output = registry.calculate(&input);
//! assert!(output.success);
//! assert!(output.k_frame > 0.0);
//! ```

pub mod bar_callout;
pub mod bending;
pub mod concrete;
pub mod frame_result;
pub mod interface;
pub mod profiles;
pub mod registry;
pub mod steel;

pub use bar_callout::{BarCallout, Stirrups};
pub use concrete::ConcreteFrameCalculator;
pub use frame_result::{CalculationInput, CalculationOutput, FrameResult};
pub use interface::{Capability, ReinforcementCalculator};
pub use profiles::{ProfileFamily, SteelProfile};
pub use registry::CalculatorRegistry;
pub use steel::SteelFrameCalculator;

use serde::{Deserialize, Serialize};

// ============================================================================
// Material and frame type tags
// ============================================================================

/// Reinforcement material
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ReinforcementMaterial {
    #[serde(rename = "acciaio", alias = "steel")]
    Steel,
    #[serde(rename = "ca", alias = "concrete")]
    Concrete,
}

impl ReinforcementMaterial {
    pub const ALL: [ReinforcementMaterial; 2] = [ReinforcementMaterial::Steel, ReinforcementMaterial::Concrete];

    /// Canonical tag as written in project files
    pub fn code(&self) -> &'static str {
        match self {
            ReinforcementMaterial::Steel => "acciaio",
            ReinforcementMaterial::Concrete => "ca",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ReinforcementMaterial::Steel => "Steel",
            ReinforcementMaterial::Concrete => "Reinforced concrete",
        }
    }

    /// Recognise the material tags found in project files.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_lowercase().as_str() {
            "acciaio" | "steel" | "metallo" => Some(ReinforcementMaterial::Steel),
            "ca" | "c.a." | "calcestruzzo" | "concrete" | "cemento armato" | "rc" => Some(ReinforcementMaterial::Concrete),
            _ => None,
        }
    }
}

impl std::fmt::Display for ReinforcementMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Frame arrangement around the opening
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameType {
    /// Lintel and two jambs
    PortalFrame,
    /// Lintel only
    BeamOnly,
    /// Arched lintel on jambs
    Arch,
    /// Profile bent to follow the arch intrados
    BentArch,
}

impl FrameType {
    pub const ALL: [FrameType; 4] = [FrameType::PortalFrame, FrameType::BeamOnly, FrameType::Arch, FrameType::BentArch];

    pub fn tag(&self) -> &'static str {
        match self {
            FrameType::PortalFrame => "telaio_completo",
            FrameType::BeamOnly => "solo_architrave",
            FrameType::Arch => "arco",
            FrameType::BentArch => "arco_calandrato",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            FrameType::PortalFrame => "Portal frame",
            FrameType::BeamOnly => "Lintel only",
            FrameType::Arch => "Arch",
            FrameType::BentArch => "Bent arch",
        }
    }

    /// Classify a free-text type label such as "Telaio completo in acciaio".
    ///
    /// Checked in order: bent arch, portal frame, lintel only, arch.
    pub fn from_label(label: &str) -> Option<Self> {
        let l = label.trim().to_lowercase();
        if l.is_empty() {
            return None;
        }
        if l.contains("calandr") || l.contains("bent") {
            Some(FrameType::BentArch)
        } else if l.contains("telaio") || l.contains("portal") {
            Some(FrameType::PortalFrame)
        } else if l.contains("architrave") || l.contains("beam") || l.contains("lintel") {
            Some(FrameType::BeamOnly)
        } else if l.contains("arco") || l.contains("arch") {
            Some(FrameType::Arch)
        } else {
            None
        }
    }

    pub fn has_jambs(&self) -> bool {
        matches!(self, FrameType::PortalFrame | FrameType::Arch)
    }
}

impl std::fmt::Display for FrameType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// How a bent profile is formed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BendingMethod {
    #[serde(alias = "freddo", alias = "a freddo")]
    Cold,
    #[serde(alias = "caldo", alias = "a caldo")]
    Hot,
    #[serde(alias = "preformato")]
    Preformed,
}

impl BendingMethod {
    /// Stiffness reduction for residual stresses left by bending
    pub fn factor(&self) -> f64 {
        match self {
            BendingMethod::Cold => 0.85,
            BendingMethod::Hot => 0.95,
            BendingMethod::Preformed => 1.0,
        }
    }
}

// ============================================================================
// Descriptor
// ============================================================================

/// One member of a frame (lintel or jambs).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MemberSpec {
    /// Steel profile designation ("HEA 160")
    #[serde(alias = "profilo", default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    /// Two coupled profiles
    #[serde(alias = "doppio", default)]
    pub doubled: bool,
    /// Profile turned by 90°
    #[serde(alias = "ruotato", default)]
    pub rotated: bool,
    /// Number of profiles side by side
    #[serde(alias = "n_profili", default = "default_count")]
    pub count: u32,

    /// Concrete section width (cm)
    #[serde(alias = "base", default, skip_serializing_if = "Option::is_none")]
    pub width_cm: Option<f64>,
    /// Concrete section depth (cm), the lintel's "altezza"
    #[serde(alias = "altezza", default, skip_serializing_if = "Option::is_none")]
    pub depth_cm: Option<f64>,
    /// Jamb thickness in the wall plane (cm), the "spessore" of a column
    #[serde(alias = "spessore", default, skip_serializing_if = "Option::is_none")]
    pub thickness_cm: Option<f64>,
    #[serde(alias = "armatura_sup", default, skip_serializing_if = "Option::is_none")]
    pub top_bars: Option<String>,
    #[serde(alias = "armatura_inf", default, skip_serializing_if = "Option::is_none")]
    pub bottom_bars: Option<String>,
    /// Column bars
    #[serde(alias = "armatura", default, skip_serializing_if = "Option::is_none")]
    pub bars: Option<String>,
    #[serde(alias = "staffe", default, skip_serializing_if = "Option::is_none")]
    pub stirrups: Option<String>,
}

fn default_count() -> u32 {
    1
}

impl MemberSpec {
    pub fn profile(designation: impl Into<String>) -> Self {
        MemberSpec {
            profile: Some(designation.into()),
            count: 1,
            ..Default::default()
        }
    }

    pub fn section(width_cm: f64, depth_cm: f64) -> Self {
        MemberSpec {
            width_cm: Some(width_cm),
            depth_cm: Some(depth_cm),
            count: 1,
            ..Default::default()
        }
    }

    /// Section depth in the bending plane: `depth_cm`, else `thickness_cm`
    pub fn section_depth(&self) -> Option<f64> {
        self.depth_cm.or(self.thickness_cm)
    }

    /// Depth and thickness both given with different values
    pub fn has_depth_conflict(&self) -> bool {
        matches!((self.depth_cm, self.thickness_cm), (Some(d), Some(t)) if (d - t).abs() > 1e-9)
    }

    /// Multiplier on A, I and W: profile count, doubled by `doubled`.
    pub fn multiplier(&self) -> f64 {
        let n = self.count.max(1) as f64;
        if self.doubled {
            2.0 * n
        } else {
            n
        }
    }
}

/// Base and beam-column joint restraints of a portal frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connections {
    #[serde(default = "default_base")]
    pub base: String,
    #[serde(alias = "nodo", default = "default_node")]
    pub node: String,
}

fn default_base() -> String {
    "Incastro".to_string()
}

fn default_node() -> String {
    "Incastro (continuità)".to_string()
}

impl Default for Connections {
    fn default() -> Self {
        Connections {
            base: default_base(),
            node: default_node(),
        }
    }
}

/// Curvature data of a bent-arch reinforcement (cm).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ArchSpec {
    #[serde(alias = "raggio", default, skip_serializing_if = "Option::is_none")]
    pub radius_cm: Option<f64>,
    #[serde(alias = "freccia", default, skip_serializing_if = "Option::is_none")]
    pub rise_cm: Option<f64>,
    #[serde(alias = "metodo", default, skip_serializing_if = "Option::is_none")]
    pub method: Option<BendingMethod>,
}

/// Reinforcement attached to a new opening.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReinforcementSpec {
    /// Material tag (`"acciaio"`, `"ca"`, ...)
    #[serde(alias = "materiale", default)]
    pub material: String,
    /// Frame type label
    #[serde(rename = "type", alias = "tipo", alias = "frame_type", default)]
    pub frame_type: String,
    #[serde(alias = "architrave", default, skip_serializing_if = "Option::is_none")]
    pub lintel: Option<MemberSpec>,
    #[serde(alias = "piedritti", default, skip_serializing_if = "Option::is_none")]
    pub jambs: Option<MemberSpec>,
    #[serde(alias = "classe_acciaio", default, skip_serializing_if = "Option::is_none")]
    pub steel_grade: Option<String>,
    #[serde(alias = "classe_cls", default, skip_serializing_if = "Option::is_none")]
    pub concrete_class: Option<String>,
    #[serde(alias = "tipo_acciaio", default, skip_serializing_if = "Option::is_none")]
    pub rebar_type: Option<String>,
    /// Concrete cover (mm)
    #[serde(alias = "copriferro", default, skip_serializing_if = "Option::is_none")]
    pub cover_mm: Option<f64>,
    #[serde(alias = "vincoli", default)]
    pub connections: Connections,
    #[serde(alias = "arco", default, skip_serializing_if = "Option::is_none")]
    pub arch: Option<ArchSpec>,
}

impl ReinforcementSpec {
    pub fn material_kind(&self) -> Option<ReinforcementMaterial> {
        ReinforcementMaterial::from_tag(&self.material)
    }

    pub fn frame_kind(&self) -> Option<FrameType> {
        FrameType::from_label(&self.frame_type)
    }

    /// Steel portal frame with the given lintel and jamb profiles
    pub fn steel_portal(lintel: &str, jambs: &str) -> Self {
        ReinforcementSpec {
            material: ReinforcementMaterial::Steel.code().to_string(),
            frame_type: "Telaio completo in acciaio".to_string(),
            lintel: Some(MemberSpec::profile(lintel)),
            jambs: Some(MemberSpec::profile(jambs)),
            steel_grade: Some("S235".to_string()),
            ..Default::default()
        }
    }

    /// Steel lintel without jambs
    pub fn steel_beam(lintel: &str) -> Self {
        ReinforcementSpec {
            material: ReinforcementMaterial::Steel.code().to_string(),
            frame_type: "Solo architrave in acciaio".to_string(),
            lintel: Some(MemberSpec::profile(lintel)),
            steel_grade: Some("S235".to_string()),
            ..Default::default()
        }
    }

    /// Cast-in-place concrete portal: 30×40 lintel with 3φ16 top and
    /// bottom, 30×30 jambs with 4φ16, C25/30 and B450C.
    pub fn concrete_portal() -> Self {
        let lintel = MemberSpec {
            top_bars: Some("3φ16".to_string()),
            bottom_bars: Some("3φ16".to_string()),
            stirrups: Some("φ8/20".to_string()),
            ..MemberSpec::section(30.0, 40.0)
        };
        let jambs = MemberSpec {
            bars: Some("4φ16".to_string()),
            ..MemberSpec::section(30.0, 30.0)
        };
        ReinforcementSpec {
            material: ReinforcementMaterial::Concrete.code().to_string(),
            frame_type: "Telaio in C.A.".to_string(),
            lintel: Some(lintel),
            jambs: Some(jambs),
            concrete_class: Some("C25/30".to_string()),
            rebar_type: Some("B450C".to_string()),
            cover_mm: Some(30.0),
            ..Default::default()
        }
    }

    pub fn with_frame_type(mut self, label: impl Into<String>) -> Self {
        self.frame_type = label.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_material_tags() {
        assert_eq!(ReinforcementMaterial::from_tag("Acciaio"), Some(ReinforcementMaterial::Steel));
        assert_eq!(ReinforcementMaterial::from_tag("c.a."), Some(ReinforcementMaterial::Concrete));
        assert_eq!(ReinforcementMaterial::from_tag("legno"), None);
    }

    #[test]
    fn test_frame_type_labels() {
        assert_eq!(FrameType::from_label("Telaio completo in acciaio"), Some(FrameType::PortalFrame));
        assert_eq!(FrameType::from_label("Telaio in C.A."), Some(FrameType::PortalFrame));
        assert_eq!(FrameType::from_label("Solo architrave in acciaio"), Some(FrameType::BeamOnly));
        assert_eq!(
            FrameType::from_label("Telaio completo in acciaio con architrave calandrato"),
            Some(FrameType::BentArch)
        );
        assert_eq!(FrameType::from_label("Rinforzo ad arco in acciaio"), Some(FrameType::Arch));
        assert_eq!(FrameType::from_label("arco_calandrato"), Some(FrameType::BentArch));
        assert_eq!(FrameType::from_label("Nessun rinforzo"), None);
        assert_eq!(FrameType::from_label(""), None);
        for t in FrameType::ALL {
            assert_eq!(FrameType::from_label(t.tag()), Some(t));
        }
    }

    #[test]
    fn test_member_multiplier() {
        let mut m = MemberSpec::profile("HEA 160");
        assert_eq!(m.multiplier(), 1.0);
        m.doubled = true;
        m.count = 2;
        assert_eq!(m.multiplier(), 4.0);
    }

    #[test]
    fn test_italian_keys() {
        let json = r#"{
            "materiale": "acciaio",
            "tipo": "Telaio completo in acciaio",
            "classe_acciaio": "S275",
            "architrave": {"profilo": "HEB 180", "doppio": true},
            "piedritti": {"profilo": "HEA 160", "ruotato": true, "n_profili": 2},
            "vincoli": {"base": "Cerniera", "nodo": "Incastro"},
            "arco": {"raggio": 120, "metodo": "freddo"}
        }"#;
        let spec: ReinforcementSpec = serde_json::from_str(json).unwrap();
        assert_eq!(spec.material_kind(), Some(ReinforcementMaterial::Steel));
        assert_eq!(spec.frame_kind(), Some(FrameType::PortalFrame));
        assert_eq!(spec.steel_grade.as_deref(), Some("S275"));

        let lintel = spec.lintel.unwrap();
        assert!(lintel.doubled);
        assert_eq!(lintel.count, 1);
        let jambs = spec.jambs.unwrap();
        assert!(jambs.rotated);
        assert_eq!(jambs.count, 2);

        assert_eq!(spec.connections.base, "Cerniera");
        let arch = spec.arch.unwrap();
        assert_eq!(arch.radius_cm, Some(120.0));
        assert_eq!(arch.method, Some(BendingMethod::Cold));
    }

    #[test]
    fn test_concrete_keys() {
        let json = r#"{
            "materiale": "ca",
            "tipo": "Telaio in C.A.",
            "copriferro": 25,
            "architrave": {"base": 30, "altezza": 45, "armatura_sup": "2φ14", "armatura_inf": "3φ16", "staffe": "φ8/15"},
            "piedritti": {"base": 30, "spessore": 25, "armatura": "4φ14"}
        }"#;
        let spec: ReinforcementSpec = serde_json::from_str(json).unwrap();
        assert_eq!(spec.material_kind(), Some(ReinforcementMaterial::Concrete));
        assert_eq!(spec.cover_mm, Some(25.0));
        let lintel = spec.lintel.unwrap();
        assert_eq!(lintel.depth_cm, Some(45.0));
        assert_eq!(lintel.stirrups.as_deref(), Some("φ8/15"));
        let jambs = spec.jambs.unwrap();
        assert_eq!(jambs.depth_cm, None);
        assert_eq!(jambs.thickness_cm, Some(25.0));
        assert_eq!(jambs.section_depth(), Some(25.0));
        assert_eq!(spec.connections, Connections::default());
    }

    #[test]
    fn test_depth_and_thickness_together() {
        let same: MemberSpec = serde_json::from_str(r#"{"base": 30, "altezza": 40, "spessore": 40}"#).unwrap();
        assert_eq!(same.section_depth(), Some(40.0));
        assert!(!same.has_depth_conflict());

        let clash: MemberSpec = serde_json::from_str(r#"{"base": 30, "altezza": 45, "spessore": 30}"#).unwrap();
        assert_eq!(clash.section_depth(), Some(45.0));
        assert!(clash.has_depth_conflict());
    }
}
