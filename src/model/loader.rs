//! Turning a resolved artifact into a loaded model handle.
//!
//! Registry artifacts are downloaded into a scratch directory first; local
//! artifacts load in place. Everything the handle needs is read into memory
//! here, so the scratch directory does not outlive the load.

use std::path::PathBuf;
use std::sync::Arc;

use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::info;

use crate::registry::{ArtifactStore, StoreError};
use crate::resolve::{ArtifactLocation, ManifestScanner, ResolvedArtifact};

use super::handle::ModelHandle;
use super::manifest::{ManifestError, ModelFlavor, ModelManifest};
use super::predictor::{LinearModel, LinearPayload, PredictorError};

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("no manifest in downloaded artifact at {0}")]
    ManifestNotFound(PathBuf),

    #[error("payload file not found: {0}")]
    PayloadMissing(PathBuf),

    #[error("payload hash mismatch: expected {expected}, got {actual}")]
    HashMismatch { expected: String, actual: String },

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    Predictor(#[from] PredictorError),

    #[error("artifact download failed: {0}")]
    Download(#[from] StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Loads resolved artifacts into ready model handles.
pub struct ModelLoader {
    store: Arc<dyn ArtifactStore>,
    manifest_name: String,
}

impl ModelLoader {
    pub fn new(store: Arc<dyn ArtifactStore>, manifest_name: &str) -> Self {
        Self {
            store,
            manifest_name: manifest_name.to_string(),
        }
    }

    /// Load `artifact` into a handle.
    ///
    /// The handle is fully constructed before it is returned; on any error
    /// nothing observable has changed.
    pub async fn load(&self, artifact: &ResolvedArtifact) -> Result<ModelHandle, LoadError> {
        match &artifact.location {
            ArtifactLocation::Local(dir) => self.load_dir(artifact, dir.clone()),
            ArtifactLocation::Registry(uri) => {
                let scratch = tempfile::tempdir()?;
                let downloaded = self
                    .store
                    .download_artifacts(uri, scratch.path())
                    .await?;
                info!(uri, dest = %downloaded.display(), "registry artifact downloaded");
                // Scratch contents are read fully before the dir is dropped.
                self.load_dir(artifact, downloaded)
            }
        }
    }

    fn load_dir(&self, artifact: &ResolvedArtifact, dir: PathBuf) -> Result<ModelHandle, LoadError> {
        // The packaged model may sit one wrapping directory down, exactly as
        // in local scanning.
        let model_dir = ManifestScanner::new(&self.manifest_name)
            .scan(&[dir.clone()])
            .ok_or(LoadError::ManifestNotFound(dir))?;

        let manifest = ModelManifest::from_file(&model_dir.join(&self.manifest_name))?;
        manifest.validate()?;

        let payload_path = model_dir.join(&manifest.payload);
        if !payload_path.is_file() {
            return Err(LoadError::PayloadMissing(payload_path));
        }
        let bytes = std::fs::read(&payload_path)?;

        let actual = hex::encode(Sha256::digest(&bytes));
        if !actual.eq_ignore_ascii_case(&manifest.sha256) {
            return Err(LoadError::HashMismatch {
                expected: manifest.sha256.clone(),
                actual,
            });
        }

        let predictor = match manifest.flavor {
            ModelFlavor::Linear => {
                let payload = LinearPayload::from_slice(&bytes)?;
                Box::new(LinearModel::from_payload(&payload, &manifest.input_schema)?)
            }
        };

        info!(
            model_id = %manifest.model_id,
            version = %manifest.version,
            origin = %artifact.origin,
            "model loaded"
        );
        Ok(ModelHandle::new(artifact.clone(), manifest, predictor))
    }
}
