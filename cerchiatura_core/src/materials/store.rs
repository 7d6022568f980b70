//! On-disk store for custom masonry materials.
//!
//! The file is `custom_materials.json` in the user's data directory:
//! `$CERCHIATURA_HOME` when set, otherwise `~/.cerchiatura`.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::CalcResult;
use crate::file_io::{load_json, save_json, validate_version, FileLock};

use super::MasonryMaterial;

/// Schema version written into the store file
pub const STORE_SCHEMA_VERSION: &str = "0.1.0";

pub const STORE_FILE_NAME: &str = "custom_materials.json";

const HOME_ENV: &str = "CERCHIATURA_HOME";
const DATA_DIR: &str = ".cerchiatura";

#[derive(Debug, Serialize, Deserialize)]
struct StoreFile {
    version: String,
    #[serde(default)]
    materials: BTreeMap<String, MasonryMaterial>,
}

/// Handle to the custom-materials JSON file.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialStore {
    path: PathBuf,
    user_id: String,
}

impl MaterialStore {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        MaterialStore {
            path: path.into(),
            user_id: current_user(),
        }
    }

    /// Store at the default user location, if a home directory is known.
    pub fn default_location() -> Option<Self> {
        let home = std::env::var_os("HOME").or_else(|| std::env::var_os("USERPROFILE"));
        store_path(std::env::var_os(HOME_ENV), home).map(Self::at)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Custom materials in the file; an absent file is an empty map.
    pub fn load(&self) -> CalcResult<BTreeMap<String, MasonryMaterial>> {
        if !self.path.exists() {
            log::debug!("No custom materials file at {}", self.path.display());
            return Ok(BTreeMap::new());
        }

        let file: StoreFile = load_json(&self.path)?;
        validate_version(&file.version, STORE_SCHEMA_VERSION)?;
        Ok(file.materials)
    }

    /// Write all custom materials atomically while holding the file lock.
    pub fn save(&self, materials: &BTreeMap<String, MasonryMaterial>) -> CalcResult<()> {
        let _lock = FileLock::acquire(&self.path, self.user_id.clone())?;
        let file = StoreFile {
            version: STORE_SCHEMA_VERSION.to_string(),
            materials: materials.clone(),
        };
        save_json(&file, &self.path)?;
        log::info!("Saved {} custom materials to {}", materials.len(), self.path.display());
        Ok(())
    }
}

fn store_path(cerchiatura_home: Option<OsString>, home: Option<OsString>) -> Option<PathBuf> {
    if let Some(dir) = cerchiatura_home.filter(|d| !d.is_empty()) {
        return Some(PathBuf::from(dir).join(STORE_FILE_NAME));
    }
    home.filter(|h| !h.is_empty())
        .map(|h| PathBuf::from(h).join(DATA_DIR).join(STORE_FILE_NAME))
}

fn current_user() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string())
}
