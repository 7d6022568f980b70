//! # Calculation Request
//!
//! Root container for one verification run: metadata, engine settings, the
//! wall, its masonry, the openings (existing and new) and the project loads.
//! Requests are read from human-editable JSON files.
//!
//! ## Structure
//!
//! ```text
//! CalculationRequest
//! ├── meta: RequestMeta (version, engineer, job info, timestamps)
//! ├── settings: EngineSettings (γ_m, knowledge level / FC, γ collaboration)
//! ├── wall, masonry
//! ├── openings: Vec<Opening>
//! └── loads?, constraints?
//! ```
//!
//! ## Example
//!
//! ```rust
//! use cerchiatura_core::project::CalculationRequest;
//! use cerchiatura_core::geometry::Wall;
//!
//! let request = CalculationRequest::new("Ing. Rossi", "24-017", "Condominio Verdi", Wall::new(500.0, 300.0, 40.0));
//! assert_eq!(request.settings.resolve_fc(), 1.35);
//! ```

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{KnowledgeLevel, GAMMA_COLLABORATION, GAMMA_M_MASONRY};
use crate::errors::CalcResult;
use crate::file_io::{load_json, save_json, validate_version};
use crate::geometry::{Opening, Wall};
use crate::masonry::{Constraints, Loads, MasonryCalculator, MasonryProperties, ProjectContext};
use crate::materials::MaterialsDb;

/// Current schema version for request files
pub const SCHEMA_VERSION: &str = "0.1.0";

// ============================================================================
// Settings
// ============================================================================

/// Engine-wide factors for a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSettings {
    #[serde(default = "default_gamma_m")]
    pub gamma_m: f64,
    #[serde(default)]
    pub knowledge_level: KnowledgeLevel,
    /// Explicit confidence factor, overrides the knowledge level
    #[serde(rename = "FC", alias = "fc", default, skip_serializing_if = "Option::is_none")]
    pub fc: Option<f64>,
    /// Divides the frame stiffness and shear before they join the masonry
    #[serde(default = "default_gamma_collaboration")]
    pub gamma_collaboration: f64,
    /// Boundary conditions when the request does not give its own
    #[serde(default)]
    pub constraints: Constraints,
}

fn default_gamma_m() -> f64 {
    GAMMA_M_MASONRY
}

fn default_gamma_collaboration() -> f64 {
    GAMMA_COLLABORATION
}

impl Default for EngineSettings {
    fn default() -> Self {
        EngineSettings {
            gamma_m: default_gamma_m(),
            knowledge_level: KnowledgeLevel::default(),
            fc: None,
            gamma_collaboration: default_gamma_collaboration(),
            constraints: Constraints::default(),
        }
    }
}

impl EngineSettings {
    /// Explicit FC if positive, else the knowledge-level value
    pub fn resolve_fc(&self) -> f64 {
        match self.fc {
            Some(fc) if fc > 0.0 => fc,
            Some(fc) => {
                log::warn!("Ignoring non-positive FC {}, using {}", fc, self.knowledge_level.code());
                self.knowledge_level.confidence_factor()
            }
            None => self.knowledge_level.confidence_factor(),
        }
    }
}

// ============================================================================
// Request
// ============================================================================

/// Request metadata stored in the file header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestMeta {
    #[serde(default = "current_version")]
    pub version: String,
    #[serde(default)]
    pub engineer: String,
    #[serde(default)]
    pub job_id: String,
    #[serde(default)]
    pub client: String,
    #[serde(default = "Utc::now")]
    pub created: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub modified: DateTime<Utc>,
}

fn current_version() -> String {
    SCHEMA_VERSION.to_string()
}

impl Default for RequestMeta {
    fn default() -> Self {
        let now = Utc::now();
        RequestMeta {
            version: current_version(),
            engineer: String::new(),
            job_id: String::new(),
            client: String::new(),
            created: now,
            modified: now,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculationRequest {
    #[serde(default)]
    pub meta: RequestMeta,
    #[serde(default)]
    pub settings: EngineSettings,
    pub wall: Wall,
    /// Explicit values, or a `material` key into the materials database
    #[serde(default)]
    pub masonry: MasonryProperties,
    #[serde(default)]
    pub openings: Vec<Opening>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loads: Option<Loads>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<Constraints>,
}

impl CalculationRequest {
    pub fn new(engineer: impl Into<String>, job_id: impl Into<String>, client: impl Into<String>, wall: Wall) -> Self {
        CalculationRequest {
            meta: RequestMeta {
                engineer: engineer.into(),
                job_id: job_id.into(),
                client: client.into(),
                ..Default::default()
            },
            settings: EngineSettings::default(),
            wall,
            masonry: MasonryProperties::default(),
            openings: Vec::new(),
            loads: None,
            constraints: None,
        }
    }

    pub fn with_opening(mut self, opening: Opening) -> Self {
        self.openings.push(opening);
        self.touch();
        self
    }

    pub fn touch(&mut self) {
        self.meta.modified = Utc::now();
    }

    /// Masonry values for the run.
    ///
    /// With a `material` key the database values replace the explicit ones;
    /// an unknown key is an error.
    pub fn resolve_masonry(&self, db: &MaterialsDb) -> CalcResult<MasonryProperties> {
        match self.masonry.material.as_deref() {
            Some(key) => {
                let material = db.require(key)?;
                log::info!("Masonry '{}' ({}) from the materials database", material.name, key);
                Ok(material.to_properties(key))
            }
            None => Ok(self.masonry.clone()),
        }
    }

    pub fn project_context(&self) -> ProjectContext {
        ProjectContext {
            fc: self.settings.resolve_fc(),
            loads: self.loads.unwrap_or_default(),
            constraints: self
                .constraints
                .clone()
                .unwrap_or_else(|| self.settings.constraints.clone()),
        }
    }

    /// Masonry calculator configured with this request's factors and context
    pub fn masonry_calculator(&self) -> MasonryCalculator {
        let mut calculator = MasonryCalculator::new().with_gamma_m(self.settings.gamma_m);
        calculator.set_project_data(self.project_context());
        calculator
    }

    pub fn existing_openings(&self) -> Vec<Opening> {
        self.openings.iter().filter(|o| o.existing).cloned().collect()
    }

    pub fn new_openings(&self) -> impl Iterator<Item = &Opening> {
        self.openings.iter().filter(|o| !o.existing)
    }
}

/// Load a request file and check its schema version.
pub fn load_request(path: &Path) -> CalcResult<CalculationRequest> {
    let request: CalculationRequest = load_json(path)?;
    validate_version(&request.meta.version, SCHEMA_VERSION)?;
    log::info!(
        "Loaded request {} ({} openings) from {}",
        request.meta.job_id,
        request.openings.len(),
        path.display()
    );
    Ok(request)
}

/// Save a request with an atomic write.
pub fn save_request(request: &CalculationRequest, path: &Path) -> CalcResult<()> {
    save_json(request, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reinforcement::ReinforcementSpec;
    use std::env::temp_dir;

    fn request() -> CalculationRequest {
        CalculationRequest::new("Ing. Rossi", "24-017", "Condominio Verdi", Wall::new(500.0, 300.0, 40.0))
            .with_opening(Opening::rectangular(50.0, 0.0, 100.0, 210.0).existing())
            .with_opening(
                Opening::rectangular(250.0, 0.0, 120.0, 210.0)
                    .with_reinforcement(ReinforcementSpec::steel_portal("HEA 160", "HEA 160")),
            )
    }

    #[test]
    fn test_fc_resolution() {
        let mut settings = EngineSettings::default();
        assert_eq!(settings.resolve_fc(), 1.35);
        settings.knowledge_level = KnowledgeLevel::Lc3;
        assert_eq!(settings.resolve_fc(), 1.0);
        settings.fc = Some(1.2);
        assert_eq!(settings.resolve_fc(), 1.2);
        settings.fc = Some(0.0);
        assert_eq!(settings.resolve_fc(), 1.0);
    }

    #[test]
    fn test_context_defaults() {
        let mut r = request();
        let ctx = r.project_context();
        assert_eq!(ctx.fc, 1.35);
        assert_eq!(ctx.loads, Loads::default());
        assert_eq!(ctx.constraints, Constraints::default());

        r.constraints = Some(Constraints::new("Incastro", "Libero"));
        r.loads = Some(Loads::new(120.0, 5.0));
        let calc = r.masonry_calculator();
        assert_eq!(calc.constraints.top, "Libero");
        assert_eq!(calc.loads.vertical, 120.0);
        assert_eq!(calc.gamma_m, 2.0);
    }

    #[test]
    fn test_opening_partition() {
        let r = request();
        assert_eq!(r.existing_openings().len(), 1);
        assert_eq!(r.new_openings().count(), 1);
    }

    #[test]
    fn test_masonry_from_database() {
        let db = MaterialsDb::builtin();
        let mut r = request();
        assert_eq!(r.resolve_masonry(&db).unwrap().fcm, r.masonry.fcm);

        r.masonry.material = Some("blocchi_tufo".to_string());
        let m = r.resolve_masonry(&db).unwrap();
        assert_eq!(m.fcm, 2.0);
        assert_eq!(m.e, Some(1410.0));

        r.masonry.material = Some("granito".to_string());
        assert_eq!(r.resolve_masonry(&db).unwrap_err().error_code(), "MATERIAL_NOT_FOUND");
    }

    #[test]
    fn test_minimal_json_request() {
        let json = r#"{
            "wall": {"length": 400, "height": 280, "thickness": 35},
            "masonry": {"material": "mattoni_pieni_calce"},
            "settings": {"knowledge_level": "LC2"},
            "loads": {"N": 100, "e": 0},
            "openings": [
                {"x": 150, "width": 100, "height": 210,
                 "rinforzo": {"materiale": "acciaio", "tipo": "Telaio completo in acciaio",
                              "architrave": {"profilo": "HEA 160"}, "piedritti": {"profilo": "HEA 160"}}}
            ]
        }"#;
        let r: CalculationRequest = serde_json::from_str(json).unwrap();
        assert_eq!(r.meta.version, SCHEMA_VERSION);
        assert_eq!(r.settings.resolve_fc(), 1.2);
        assert_eq!(r.loads.unwrap().vertical, 100.0);
        assert!(r.openings[0].reinforcement.is_some());
    }

    #[test]
    fn test_save_and_load_request() {
        let path = temp_dir().join(format!("cerchiatura_request_{}.json", std::process::id()));
        let r = request();
        save_request(&r, &path).unwrap();

        let loaded = load_request(&path).unwrap();
        assert_eq!(loaded.meta.job_id, "24-017");
        assert_eq!(loaded.openings.len(), 2);
        assert_eq!(loaded.openings[1].id, r.openings[1].id);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_future_schema_rejected() {
        let path = temp_dir().join(format!("cerchiatura_request_future_{}.json", std::process::id()));
        let mut r = request();
        r.meta.version = "0.5.0".to_string();
        save_request(&r, &path).unwrap();
        assert_eq!(load_request(&path).unwrap_err().error_code(), "VERSION_MISMATCH");
        let _ = std::fs::remove_file(&path);
    }
}
