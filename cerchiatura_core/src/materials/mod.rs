//! # Masonry Materials Database
//!
//! Reference masonry types of NTC 2018 Table C8.5.I plus user-defined
//! custom entries. Custom entries live in a JSON [`MaterialStore`] that is
//! read when the database is opened and rewritten on every edit; the
//! normative table is never written.
//!
//! ## Example
//!
//! ```rust
//! use cerchiatura_core::materials::MaterialsDb;
//!
//! let db = MaterialsDb::builtin();
//! let tufo = db.get("blocchi_tufo").unwrap();
//! assert_eq!(tufo.fcm, 2.0);
//!
//! let reduced = tufo.reduced(1.35);
//! assert!((reduced.fcm_d - 2.0 / 1.35).abs() < 1e-12);
//! ```

pub mod store;

pub use store::{MaterialStore, STORE_SCHEMA_VERSION};

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};
use crate::masonry::MasonryProperties;

/// Suffix appended to custom entries in the display list
pub const CUSTOM_SUFFIX: &str = " [Personalizzato]";

const DEFAULT_REFERENCE: &str = "NTC 2018 - Tab. C8.5.I";

// ============================================================================
// Material record
// ============================================================================

/// One masonry type. Strengths and moduli in MPa, unit weight in kN/m³.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MasonryMaterial {
    pub name: String,
    #[serde(default = "default_category")]
    pub category: String,
    /// Mean compressive strength
    pub fcm: f64,
    /// Mean shear strength
    pub tau0: f64,
    #[serde(rename = "E")]
    pub e: f64,
    #[serde(rename = "G")]
    pub g: f64,
    /// Unit weight
    pub w: f64,
    #[serde(default)]
    pub normative: bool,
    #[serde(default)]
    pub custom: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

fn default_category() -> String {
    "Altro".to_string()
}

/// Design values after the confidence factor. Moduli are not reduced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReducedValues {
    pub fcm_d: f64,
    pub tau0_d: f64,
    #[serde(rename = "E_d")]
    pub e_d: f64,
    #[serde(rename = "G_d")]
    pub g_d: f64,
    pub fc: f64,
}

impl MasonryMaterial {
    /// A user-defined material (not normative).
    pub fn custom(name: impl Into<String>, category: impl Into<String>, fcm: f64, tau0: f64, e: f64, g: f64, w: f64) -> Self {
        MasonryMaterial {
            name: name.into(),
            category: category.into(),
            fcm,
            tau0,
            e,
            g,
            w,
            normative: false,
            custom: true,
            reference: None,
            notes: None,
        }
    }

    /// Strengths divided by `fc`; a non-positive `fc` is treated as 1.
    pub fn reduced(&self, fc: f64) -> ReducedValues {
        let fc = if fc > 0.0 { fc } else { 1.0 };
        ReducedValues {
            fcm_d: self.fcm / fc,
            tau0_d: self.tau0 / fc,
            e_d: self.e,
            g_d: self.g,
            fc,
        }
    }

    /// Mean values as calculator input. The masonry calculator applies FC
    /// itself through `γ_m·FC`.
    pub fn to_properties(&self, key: &str) -> MasonryProperties {
        MasonryProperties {
            fcm: self.fcm,
            tau0: self.tau0,
            e: Some(self.e),
            g: Some(self.g),
            w: Some(self.w),
            material: Some(key.to_string()),
        }
    }

    /// Name as shown in selection lists
    pub fn display_name(&self) -> String {
        if self.normative {
            self.name.clone()
        } else {
            format!("{}{}", self.name, CUSTOM_SUFFIX)
        }
    }

    fn validate(&self, key: &str) -> CalcResult<()> {
        if key.trim().is_empty() {
            return Err(CalcError::invalid_input("key", key, "Material key must not be empty"));
        }
        if self.name.trim().is_empty() {
            return Err(CalcError::missing_field("name"));
        }
        for (field, value) in [("fcm", self.fcm), ("tau0", self.tau0), ("E", self.e), ("G", self.g), ("w", self.w)] {
            if !(value > 0.0) {
                return Err(CalcError::invalid_input(field, value.to_string(), "Must be positive"));
            }
        }
        Ok(())
    }
}

// ============================================================================
// Normative table (NTC 2018 Tab. C8.5.I)
// ============================================================================

struct Row {
    key: &'static str,
    name: &'static str,
    category: &'static str,
    fcm: f64,
    tau0: f64,
    e: f64,
    g: f64,
    w: f64,
    reference: Option<&'static str>,
    notes: Option<&'static str>,
}

const fn row(
    key: &'static str,
    name: &'static str,
    category: &'static str,
    [fcm, tau0, e, g, w]: [f64; 5],
) -> Row {
    Row {
        key,
        name,
        category,
        fcm,
        tau0,
        e,
        g,
        w,
        reference: None,
        notes: None,
    }
}

#[rustfmt::skip]
const NORMATIVE_ROWS: [Row; 10] = [
    Row {
        notes: Some("Muratura a conci di pietra tenera (tufo, calcarenite, ecc.)"),
        ..row("pietrame_disordinata", "Muratura in pietrame disordinata", "Pietrame", [1.0, 0.020, 870.0, 290.0, 19.0])
    },
    row("pietrame_sbozzati", "Muratura a conci sbozzati", "Pietrame", [2.0, 0.035, 1050.0, 350.0, 20.0]),
    row("pietrame_spacco", "Muratura in pietre a spacco", "Pietrame", [2.6, 0.056, 1260.0, 420.0, 21.0]),
    row("blocchi_lapidei", "Muratura a blocchi lapidei squadrati", "Pietrame", [5.8, 0.090, 2400.0, 800.0, 22.0]),
    row("mattoni_pieni_calce", "Muratura in mattoni pieni e malta di calce", "Mattoni", [2.4, 0.060, 1500.0, 500.0, 18.0]),
    row("mattoni_semipieni", "Muratura in mattoni semipieni", "Mattoni", [3.8, 0.080, 2400.0, 800.0, 15.0]),
    Row {
        reference: Some("Valori medi da letteratura"),
        ..row("blocchi_tufo", "Muratura in blocchi di tufo", "Blocchi", [2.0, 0.074, 1410.0, 470.0, 14.5])
    },
    row("blocchi_calcarenite", "Muratura in blocchi di calcarenite", "Blocchi", [2.2, 0.074, 1500.0, 500.0, 16.0]),
    row("blocchi_laterizio", "Muratura in blocchi laterizi semipieni", "Blocchi", [5.0, 0.100, 3500.0, 875.0, 12.0]),
    Row {
        reference: Some("Valori indicativi"),
        ..row("muratura_mista", "Muratura mista", "Mista", [1.8, 0.025, 1200.0, 400.0, 18.0])
    },
];

static NORMATIVE: Lazy<Vec<(String, MasonryMaterial)>> = Lazy::new(|| {
    NORMATIVE_ROWS
        .iter()
        .map(|r| {
            (
                r.key.to_string(),
                MasonryMaterial {
                    name: r.name.to_string(),
                    category: r.category.to_string(),
                    fcm: r.fcm,
                    tau0: r.tau0,
                    e: r.e,
                    g: r.g,
                    w: r.w,
                    normative: true,
                    custom: false,
                    reference: Some(r.reference.unwrap_or(DEFAULT_REFERENCE).to_string()),
                    notes: r.notes.map(str::to_string),
                },
            )
        })
        .collect()
});

// ============================================================================
// Database
// ============================================================================

/// Normative table plus custom entries, optionally backed by a store.
#[derive(Debug, Clone)]
pub struct MaterialsDb {
    custom: BTreeMap<String, MasonryMaterial>,
    store: Option<MaterialStore>,
}

impl MaterialsDb {
    /// Normative materials only, nothing persisted
    pub fn builtin() -> Self {
        MaterialsDb {
            custom: BTreeMap::new(),
            store: None,
        }
    }

    /// Open with the custom entries of `store`. A missing store file is an
    /// empty set of custom materials.
    pub fn open(store: MaterialStore) -> CalcResult<Self> {
        let custom = store.load()?;
        log::info!("Loaded {} custom materials from {}", custom.len(), store.path().display());
        Ok(MaterialsDb {
            custom,
            store: Some(store),
        })
    }

    /// Open the store at its default user location. Without a home
    /// directory the database runs with normative materials only.
    pub fn open_default() -> CalcResult<Self> {
        match MaterialStore::default_location() {
            Some(store) => Self::open(store),
            None => {
                log::warn!("No home directory found, custom materials are disabled");
                Ok(Self::builtin())
            }
        }
    }

    pub fn store(&self) -> Option<&MaterialStore> {
        self.store.as_ref()
    }

    /// Normative entries in table order, then custom entries by key
    pub fn iter(&self) -> impl Iterator<Item = (&str, &MasonryMaterial)> {
        NORMATIVE
            .iter()
            .map(|(k, m)| (k.as_str(), m))
            .chain(self.custom.iter().map(|(k, m)| (k.as_str(), m)))
    }

    pub fn len(&self) -> usize {
        NORMATIVE.len() + self.custom.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, key: &str) -> Option<&MasonryMaterial> {
        self.custom
            .get(key)
            .or_else(|| NORMATIVE.iter().find(|(k, _)| k == key).map(|(_, m)| m))
    }

    /// Like [`get`](Self::get) with a `MaterialNotFound` error
    pub fn require(&self, key: &str) -> CalcResult<&MasonryMaterial> {
        self.get(key).ok_or_else(|| CalcError::material_not_found(key))
    }

    /// Lookup by display name; the custom suffix is ignored.
    pub fn get_by_name(&self, name: &str) -> Option<&MasonryMaterial> {
        let name = name.trim();
        let name = name.strip_suffix(CUSTOM_SUFFIX.trim_start()).map_or(name, str::trim_end);
        self.iter().map(|(_, m)| m).find(|m| m.name == name)
    }

    /// Distinct categories, sorted
    pub fn categories(&self) -> Vec<String> {
        let mut categories: Vec<String> = self.iter().map(|(_, m)| m.category.clone()).collect();
        categories.sort();
        categories.dedup();
        categories
    }

    pub fn by_category<'a>(&'a self, category: &'a str) -> impl Iterator<Item = (&'a str, &'a MasonryMaterial)> {
        self.iter().filter(move |(_, m)| m.category == category)
    }

    /// Names grouped by category; within a category normative entries come
    /// before custom ones, which carry the `[Personalizzato]` suffix.
    pub fn display_list(&self) -> Vec<String> {
        let mut list = Vec::with_capacity(self.len());
        for category in self.categories() {
            let (normative, custom): (Vec<_>, Vec<_>) =
                self.by_category(&category).map(|(_, m)| m).partition(|m| m.normative);
            list.extend(normative.iter().chain(custom.iter()).map(|m| m.display_name()));
        }
        list
    }

    pub fn is_custom(&self, key: &str) -> bool {
        self.custom.contains_key(key)
    }

    /// Add a custom material and save the store.
    ///
    /// Rejects a key already used by a normative or custom entry.
    pub fn add_custom(&mut self, key: &str, mut material: MasonryMaterial) -> CalcResult<()> {
        material.validate(key)?;
        if self.get(key).is_some() {
            return Err(CalcError::invalid_input("key", key, "A material with this key already exists"));
        }

        material.normative = false;
        material.custom = true;
        self.custom.insert(key.to_string(), material);

        if let Err(e) = self.persist() {
            self.custom.remove(key);
            return Err(e);
        }
        log::info!("Added custom material '{}'", key);
        Ok(())
    }

    /// Replace a custom material and save the store. Normative entries
    /// cannot be updated.
    pub fn update_custom(&mut self, key: &str, mut material: MasonryMaterial) -> CalcResult<()> {
        material.validate(key)?;
        material.normative = false;
        material.custom = true;

        let slot = self.custom.get_mut(key).ok_or_else(|| CalcError::material_not_found(key))?;
        let previous = std::mem::replace(slot, material);

        if let Err(e) = self.persist() {
            self.custom.insert(key.to_string(), previous);
            return Err(e);
        }
        log::info!("Updated custom material '{}'", key);
        Ok(())
    }

    /// Remove a custom material and save the store.
    pub fn delete_custom(&mut self, key: &str) -> CalcResult<MasonryMaterial> {
        let removed = self.custom.remove(key).ok_or_else(|| CalcError::material_not_found(key))?;

        if let Err(e) = self.persist() {
            self.custom.insert(key.to_string(), removed);
            return Err(e);
        }
        log::info!("Deleted custom material '{}'", key);
        Ok(removed)
    }

    fn persist(&self) -> CalcResult<()> {
        match &self.store {
            Some(store) => store.save(&self.custom),
            None => Ok(()),
        }
    }
}

impl Default for MaterialsDb {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample() -> MasonryMaterial {
        MasonryMaterial::custom("Tufo giallo locale", "Blocchi", 1.6, 0.05, 1100.0, 370.0, 14.0)
    }

    #[test]
    fn test_normative_table() {
        let db = MaterialsDb::builtin();
        assert_eq!(db.len(), 10);
        assert!(db.iter().all(|(_, m)| m.normative && !m.custom));

        let tufo = db.get("blocchi_tufo").unwrap();
        assert_eq!(tufo.reference.as_deref(), Some("Valori medi da letteratura"));
        assert_relative_eq!(tufo.w, 14.5);

        let stone = db.get("pietrame_disordinata").unwrap();
        assert_eq!(stone.reference.as_deref(), Some(DEFAULT_REFERENCE));
        assert!(stone.notes.is_some());

        assert_eq!(db.require("nope").unwrap_err().error_code(), "MATERIAL_NOT_FOUND");
    }

    #[test]
    fn test_categories_sorted() {
        let db = MaterialsDb::builtin();
        assert_eq!(db.categories(), vec!["Blocchi", "Mattoni", "Mista", "Pietrame"]);
        assert_eq!(db.by_category("Mattoni").count(), 2);
    }

    #[test]
    fn test_reduced_values() {
        let db = MaterialsDb::builtin();
        let m = db.get("mattoni_pieni_calce").unwrap();
        let r = m.reduced(1.2);
        assert_relative_eq!(r.fcm_d, 2.0, epsilon = 1e-12);
        assert_relative_eq!(r.tau0_d, 0.05, epsilon = 1e-12);
        assert_eq!(r.e_d, 1500.0);
        assert_eq!(m.reduced(0.0).fcm_d, m.fcm);

        let props = m.to_properties("mattoni_pieni_calce");
        assert_eq!(props.fcm, 2.4);
        assert_eq!(props.g, Some(500.0));
        assert_eq!(props.material.as_deref(), Some("mattoni_pieni_calce"));
    }

    #[test]
    fn test_custom_lifecycle_in_memory() {
        let mut db = MaterialsDb::builtin();
        db.add_custom("tufo_locale", sample()).unwrap();
        assert!(db.is_custom("tufo_locale"));
        assert!(db.get("tufo_locale").unwrap().custom);

        let dup = db.add_custom("tufo_locale", sample()).unwrap_err();
        assert_eq!(dup.error_code(), "INVALID_INPUT");
        assert!(db.add_custom("blocchi_tufo", sample()).is_err());

        let found = db.get_by_name("Tufo giallo locale [Personalizzato]").unwrap();
        assert_eq!(found.fcm, 1.6);

        let mut changed = sample();
        changed.fcm = 1.8;
        db.update_custom("tufo_locale", changed).unwrap();
        assert_eq!(db.get("tufo_locale").unwrap().fcm, 1.8);

        assert!(db.update_custom("blocchi_tufo", sample()).is_err());
        assert!(db.delete_custom("blocchi_tufo").is_err());
        assert_eq!(db.delete_custom("tufo_locale").unwrap().fcm, 1.8);
        assert!(db.get("tufo_locale").is_none());
    }

    #[test]
    fn test_custom_validation() {
        let mut db = MaterialsDb::builtin();
        let mut bad = sample();
        bad.tau0 = 0.0;
        assert_eq!(db.add_custom("x", bad).unwrap_err().error_code(), "INVALID_INPUT");

        let mut unnamed = sample();
        unnamed.name = " ".to_string();
        assert_eq!(db.add_custom("y", unnamed).unwrap_err().error_code(), "MISSING_FIELD");
        assert!(db.add_custom("", sample()).is_err());
    }

    #[test]
    fn test_display_list_groups_custom_last() {
        let mut db = MaterialsDb::builtin();
        db.add_custom("tufo_locale", sample()).unwrap();

        let list = db.display_list();
        assert_eq!(list.len(), 11);
        assert_eq!(list[0], "Muratura in blocchi di tufo");
        let custom_pos = list.iter().position(|n| n == "Tufo giallo locale [Personalizzato]").unwrap();
        let mattoni_pos = list.iter().position(|n| n == "Muratura in mattoni pieni e malta di calce").unwrap();
        assert!(custom_pos < mattoni_pos);
        assert_eq!(custom_pos, 3);
    }

    #[test]
    fn test_json_uses_uppercase_moduli() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["E"], 1100.0);
        assert_eq!(json["G"], 370.0);
        assert_eq!(json["custom"], true);
    }
}
