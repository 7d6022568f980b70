//! # Errors
//!
//! Numeric guards inside the masonry and frame formulas do not fail: they
//! return zeroes plus a diagnostic message. `CalcError` covers what happens
//! around them, grouped as
//!
//! - request input (bad or missing values, unparsable bar callouts)
//! - lookups (masonry materials, steel profiles, reinforcement calculators)
//! - persistence (request files and the custom-materials store)
//!
//! Every variant serializes as `{"type": ..., "details": {...}}` so the CLI
//! can print it as JSON next to the readable message.
//!
//! ```rust
//! use cerchiatura_core::errors::CalcError;
//!
//! let err = CalcError::profile_not_found("HEB 999");
//! assert_eq!(err.error_code(), "PROFILE_NOT_FOUND");
//! assert_eq!(err.to_string(), "Unknown steel profile 'HEB 999'");
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type CalcResult<T> = Result<T, CalcError>;

#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum CalcError {
    // ========================================================================
    // Request input
    // ========================================================================
    #[error("Invalid {field} = {value}: {reason}")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Request is missing '{field}'")]
    MissingField { field: String },

    /// Bar callout ("3φ16") or stirrup spacing ("φ8/20") that does not parse
    #[error("Cannot parse {what} from '{input}'")]
    ParseError { what: String, input: String },

    // ========================================================================
    // Lookups
    // ========================================================================
    #[error("Unknown masonry material '{key}'")]
    MaterialNotFound { key: String },

    #[error("Unknown steel profile '{designation}'")]
    ProfileNotFound { designation: String },

    #[error("No calculator available for material '{material}'")]
    CalculatorNotFound { material: String },

    // ========================================================================
    // Persistence
    // ========================================================================
    #[error("Cannot {action} '{path}': {reason}")]
    Io {
        action: String,
        path: String,
        reason: String,
    },

    #[error("'{path}' is in use by {holder} since {since}")]
    FileLocked {
        path: String,
        holder: String,
        since: String,
    },

    #[error("Malformed JSON: {reason}")]
    Json { reason: String },

    #[error("Unsupported schema version {found} (this build reads {supported})")]
    VersionMismatch { found: String, supported: String },
}

impl CalcError {
    pub fn invalid_input(field: impl Into<String>, value: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::InvalidInput {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    pub fn missing_field(field: impl Into<String>) -> Self {
        CalcError::MissingField { field: field.into() }
    }

    pub fn parse_error(what: impl Into<String>, input: impl Into<String>) -> Self {
        CalcError::ParseError {
            what: what.into(),
            input: input.into(),
        }
    }

    pub fn material_not_found(key: impl Into<String>) -> Self {
        CalcError::MaterialNotFound { key: key.into() }
    }

    pub fn profile_not_found(designation: impl Into<String>) -> Self {
        CalcError::ProfileNotFound {
            designation: designation.into(),
        }
    }

    pub fn calculator_not_found(material: impl Into<String>) -> Self {
        CalcError::CalculatorNotFound {
            material: material.into(),
        }
    }

    /// `action` reads as a verb phrase: "read", "create directory for", ...
    pub fn file_error(action: impl Into<String>, path: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::Io {
            action: action.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn file_locked(path: impl Into<String>, holder: impl Into<String>, since: impl Into<String>) -> Self {
        CalcError::FileLocked {
            path: path.into(),
            holder: holder.into(),
            since: since.into(),
        }
    }

    pub fn serialization(reason: impl std::fmt::Display) -> Self {
        CalcError::Json {
            reason: reason.to_string(),
        }
    }

    pub fn version_mismatch(found: impl Into<String>, supported: impl Into<String>) -> Self {
        CalcError::VersionMismatch {
            found: found.into(),
            supported: supported.into(),
        }
    }

    /// A locked store may free up; everything else needs a change of input.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, CalcError::FileLocked { .. })
    }

    /// Stable code for scripts consuming the JSON error output
    pub fn error_code(&self) -> &'static str {
        match self {
            CalcError::InvalidInput { .. } => "INVALID_INPUT",
            CalcError::MissingField { .. } => "MISSING_FIELD",
            CalcError::ParseError { .. } => "PARSE_ERROR",
            CalcError::MaterialNotFound { .. } => "MATERIAL_NOT_FOUND",
            CalcError::ProfileNotFound { .. } => "PROFILE_NOT_FOUND",
            CalcError::CalculatorNotFound { .. } => "CALCULATOR_NOT_FOUND",
            CalcError::Io { .. } => "FILE_ERROR",
            CalcError::FileLocked { .. } => "FILE_LOCKED",
            CalcError::Json { .. } => "SERIALIZATION_ERROR",
            CalcError::VersionMismatch { .. } => "VERSION_MISMATCH",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_shape() {
        let json = serde_json::to_value(CalcError::material_not_found("tufo_rosso")).unwrap();
        assert_eq!(json["type"], "MaterialNotFound");
        assert_eq!(json["details"]["key"], "tufo_rosso");

        let back: CalcError = serde_json::from_value(json).unwrap();
        assert_eq!(back, CalcError::material_not_found("tufo_rosso"));
    }

    #[test]
    fn test_codes_by_group() {
        assert_eq!(CalcError::parse_error("bar callout", "tre ferri").error_code(), "PARSE_ERROR");
        assert_eq!(CalcError::calculator_not_found("frp").error_code(), "CALCULATOR_NOT_FOUND");
        assert_eq!(CalcError::file_error("read", "a.json", "denied").error_code(), "FILE_ERROR");
        assert_eq!(CalcError::version_mismatch("1.0.0", "0.1.0").error_code(), "VERSION_MISMATCH");
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            CalcError::invalid_input("thickness", "-5", "must be positive").to_string(),
            "Invalid thickness = -5: must be positive"
        );
        assert_eq!(
            CalcError::file_error("read", "req.json", "not found").to_string(),
            "Cannot read 'req.json': not found"
        );
        assert!(CalcError::file_locked("store.json", "anna@pc", "10:00").is_recoverable());
        assert!(!CalcError::missing_field("wall").is_recoverable());
    }
}
