//! Artifact store client surface.
//!
//! The store is an external collaborator; this trait is the seam the
//! resolver and loader consume, so tests can substitute in-memory stubs.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Alias not found: {name}@{alias}")]
    AliasNotFound { name: String, alias: String },

    #[error("Registry returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Malformed registry response: {0}")]
    MalformedResponse(String),

    #[error("Unsupported artifact URI: {0}")]
    UnsupportedUri(String),

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A registered model version, as returned by the alias lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelVersion {
    /// Version number, as the registry reports it.
    pub version: String,
    /// Identifier of the run that produced the artifact.
    pub run_id: String,
    /// Registered artifact source path.
    pub source: String,
}

/// One entry in a run's artifact listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactEntry {
    /// Run-root-relative path.
    pub path: String,
    /// Whether the entry is a directory.
    #[serde(default)]
    pub is_dir: bool,
    /// Size in bytes for files.
    #[serde(default)]
    pub file_size: Option<u64>,
}

impl ArtifactEntry {
    /// Final path segment (the entry's own name).
    pub fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

/// Derive the run-root-relative path from a registered source string.
///
/// Registered sources come in two conventions:
/// `runs:/<run_id>/<path>` and `<scheme-or-dir>/artifacts/<path>`.
/// Returns `None` when the source follows neither.
pub fn run_relative_source(source: &str) -> Option<String> {
    if let Some(rest) = source.strip_prefix("runs:/") {
        let (_run_id, rel) = rest.split_once('/')?;
        return Some(rel.trim_matches('/').to_string());
    }
    if let Some(idx) = source.rfind("/artifacts/") {
        let rel = &source[idx + "/artifacts/".len()..];
        if rel.is_empty() {
            return None;
        }
        return Some(rel.trim_matches('/').to_string());
    }
    None
}

/// Read access to the artifact store.
///
/// All operations are reads; resolution must never mutate the registry.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Resolve `(name, alias)` to the registered model version.
    async fn version_by_alias(&self, name: &str, alias: &str) -> Result<ModelVersion, StoreError>;

    /// List artifacts under `path` (run-root-relative, empty for the root).
    async fn list_artifacts(
        &self,
        run_id: &str,
        path: &str,
    ) -> Result<Vec<ArtifactEntry>, StoreError>;

    /// Download the artifact tree at `uri` into `dest`, returning the local
    /// directory holding the downloaded files.
    async fn download_artifacts(&self, uri: &str, dest: &Path) -> Result<PathBuf, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_relative_from_runs_uri() {
        assert_eq!(
            run_relative_source("runs:/abc123/sklearn-model"),
            Some("sklearn-model".to_string())
        );
    }

    #[test]
    fn test_run_relative_from_artifact_store_path() {
        assert_eq!(
            run_relative_source("mlflow-artifacts:/1/abc123/artifacts/sklearn-model"),
            Some("sklearn-model".to_string())
        );
        assert_eq!(
            run_relative_source("file:///mlruns/1/abc123/artifacts/sklearn-model"),
            Some("sklearn-model".to_string())
        );
    }

    #[test]
    fn test_run_relative_rejects_unknown_convention() {
        assert_eq!(run_relative_source("s3://bucket/some/model"), None);
        assert_eq!(run_relative_source("runs:/abc123"), None);
        assert_eq!(run_relative_source("/srv/store/artifacts/"), None);
    }

    #[test]
    fn test_entry_name_is_last_segment() {
        let entry = ArtifactEntry {
            path: "sklearn-model/MLmodel".to_string(),
            is_dir: false,
            file_size: Some(412),
        };
        assert_eq!(entry.name(), "MLmodel");
    }
}
