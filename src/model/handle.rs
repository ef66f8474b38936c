//! The loaded model handle.
//!
//! A handle only exists once its artifact resolved and loaded completely;
//! a partially-loaded handle is never observable. Handles are immutable and
//! shared read-only across request tasks.

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

use crate::resolve::ResolvedArtifact;

use super::manifest::ModelManifest;
use super::predictor::Predictor;

#[derive(Error, Debug)]
pub enum PredictError {
    /// Caller-supplied features do not match the model's schema.
    #[error("Input validation failed: {0}")]
    InputValidation(String),

    /// No model is loaded; distinct from a bad request so monitoring can
    /// tell "service not ready" from "client error".
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),
}

/// A fully resolved and loaded model, ready to predict.
pub struct ModelHandle {
    artifact: ResolvedArtifact,
    manifest: ModelManifest,
    predictor: Box<dyn Predictor>,
}

impl fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelHandle")
            .field("model_id", &self.manifest.model_id)
            .field("version", &self.manifest.version)
            .field("origin", &self.artifact.origin)
            .finish_non_exhaustive()
    }
}

impl ModelHandle {
    pub(super) fn new(
        artifact: ResolvedArtifact,
        manifest: ModelManifest,
        predictor: Box<dyn Predictor>,
    ) -> Self {
        Self {
            artifact,
            manifest,
            predictor,
        }
    }

    pub fn artifact(&self) -> &ResolvedArtifact {
        &self.artifact
    }

    pub fn manifest(&self) -> &ModelManifest {
        &self.manifest
    }

    /// Validate `features` against the schema and run the predictor.
    ///
    /// The feature set must match the schema exactly; on any mismatch the
    /// predictor is not invoked.
    pub fn predict(&self, features: &HashMap<String, f64>) -> Result<f64, PredictError> {
        let schema = &self.manifest.input_schema;

        let missing: Vec<&str> = schema
            .iter()
            .filter(|field| !features.contains_key(*field))
            .map(|f| f.as_str())
            .collect();
        if !missing.is_empty() {
            return Err(PredictError::InputValidation(format!(
                "missing fields: {}",
                missing.join(", ")
            )));
        }

        let mut unexpected: Vec<&str> = features
            .keys()
            .filter(|k| !schema.iter().any(|field| field == *k))
            .map(|k| k.as_str())
            .collect();
        if !unexpected.is_empty() {
            unexpected.sort_unstable();
            return Err(PredictError::InputValidation(format!(
                "unexpected fields: {}",
                unexpected.join(", ")
            )));
        }

        let ordered: Vec<f64> = schema.iter().map(|field| features[field]).collect();
        Ok(self.predictor.predict(&ordered))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::manifest::{ModelFlavor, ModelManifest};
    use crate::resolve::{ArtifactLocation, ArtifactOrigin, ResolvedArtifact};
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingPredictor {
        calls: Arc<AtomicUsize>,
    }

    impl Predictor for CountingPredictor {
        fn predict(&self, features: &[f64]) -> f64 {
            self.calls.fetch_add(1, Ordering::SeqCst);
            features.iter().sum()
        }
    }

    fn handle_with_counter() -> (ModelHandle, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let manifest = ModelManifest {
            model_id: "m".into(),
            version: "1".into(),
            flavor: ModelFlavor::Linear,
            payload: "model.json".into(),
            sha256: "a".repeat(64),
            input_schema: vec!["MedInc".into(), "HouseAge".into()],
        };
        let artifact = ResolvedArtifact {
            location: ArtifactLocation::Local(PathBuf::from("/tmp/model")),
            origin: ArtifactOrigin::Local,
            discovered_at: chrono::Utc::now(),
        };
        let handle = ModelHandle::new(
            artifact,
            manifest,
            Box::new(CountingPredictor {
                calls: calls.clone(),
            }),
        );
        (handle, calls)
    }

    #[test]
    fn test_predict_with_exact_features() {
        let (handle, calls) = handle_with_counter();
        let features = HashMap::from([("MedInc".to_string(), 2.0), ("HouseAge".to_string(), 3.0)]);
        let prediction = handle.predict(&features).unwrap();
        assert!(prediction.is_finite());
        assert!((prediction - 5.0).abs() < 1e-9);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_missing_field_skips_predictor() {
        let (handle, calls) = handle_with_counter();
        let features = HashMap::from([("MedInc".to_string(), 2.0)]);
        let err = handle.predict(&features).unwrap_err();
        assert!(matches!(err, PredictError::InputValidation(ref m) if m.contains("HouseAge")));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_unexpected_field_skips_predictor() {
        let (handle, calls) = handle_with_counter();
        let features = HashMap::from([
            ("MedInc".to_string(), 2.0),
            ("HouseAge".to_string(), 3.0),
            ("Basement".to_string(), 1.0),
        ]);
        let err = handle.predict(&features).unwrap_err();
        assert!(matches!(err, PredictError::InputValidation(ref m) if m.contains("Basement")));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
