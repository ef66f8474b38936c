//! Model manifest parsing and validation.
//!
//! The manifest is the sentinel file identifying a directory as a packaged
//! model; it names the payload, its digest, and the input schema.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("failed to read manifest: {0}")]
    Read(#[from] std::io::Error),

    #[error("invalid manifest JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid manifest: {0}")]
    Invalid(String),
}

/// Model payload format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelFlavor {
    /// Intercept plus per-feature coefficients, stored as JSON.
    Linear,
}

/// Model metadata from the manifest file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelManifest {
    /// Registered model identifier (e.g. "california_housing_model").
    pub model_id: String,
    /// Version string, as registered.
    pub version: String,
    /// Payload format.
    pub flavor: ModelFlavor,
    /// Payload file name, relative to the manifest's directory.
    pub payload: String,
    /// SHA-256 hash of the payload file.
    pub sha256: String,
    /// Ordered feature names the model expects.
    pub input_schema: Vec<String>,
}

impl ModelManifest {
    /// Load a manifest from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ManifestError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse a manifest from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ManifestError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Validate manifest fields for correctness.
    pub fn validate(&self) -> Result<(), ManifestError> {
        if self.model_id.is_empty() {
            return Err(ManifestError::Invalid("model_id cannot be empty".into()));
        }
        if self.sha256.len() != 64 {
            return Err(ManifestError::Invalid(
                "sha256 must be 64 hex characters".into(),
            ));
        }
        if self.payload.is_empty() || self.payload.contains('/') {
            return Err(ManifestError::Invalid(
                "payload must be a plain file name".into(),
            ));
        }
        if self.input_schema.is_empty() {
            return Err(ManifestError::Invalid(
                "input_schema cannot be empty".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest_json() -> String {
        serde_json::json!({
            "model_id": "california_housing_model",
            "version": "3",
            "flavor": "linear",
            "payload": "model.json",
            "sha256": "a".repeat(64),
            "input_schema": ["MedInc", "HouseAge"],
        })
        .to_string()
    }

    #[test]
    fn test_parse_valid_manifest() {
        let manifest = ModelManifest::from_json(&manifest_json()).unwrap();
        assert_eq!(manifest.model_id, "california_housing_model");
        assert_eq!(manifest.flavor, ModelFlavor::Linear);
        assert_eq!(manifest.input_schema.len(), 2);
        assert!(manifest.validate().is_ok());
    }

    #[test]
    fn test_empty_model_id_rejected() {
        let mut manifest = ModelManifest::from_json(&manifest_json()).unwrap();
        manifest.model_id.clear();
        assert!(matches!(
            manifest.validate(),
            Err(ManifestError::Invalid(_))
        ));
    }

    #[test]
    fn test_short_sha256_rejected() {
        let mut manifest = ModelManifest::from_json(&manifest_json()).unwrap();
        manifest.sha256 = "abc".into();
        assert!(manifest.validate().is_err());
    }

    #[test]
    fn test_payload_with_path_separator_rejected() {
        let mut manifest = ModelManifest::from_json(&manifest_json()).unwrap();
        manifest.payload = "../model.json".into();
        assert!(manifest.validate().is_err());
    }

    #[test]
    fn test_empty_schema_rejected() {
        let mut manifest = ModelManifest::from_json(&manifest_json()).unwrap();
        manifest.input_schema.clear();
        assert!(manifest.validate().is_err());
    }

    #[test]
    fn test_unknown_flavor_fails_parse() {
        let json = manifest_json().replace("linear", "sklearn");
        assert!(matches!(
            ModelManifest::from_json(&json),
            Err(ManifestError::Parse(_))
        ));
    }
}
