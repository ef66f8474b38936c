//! REST client for an MLflow-compatible artifact store.
//!
//! Consumes three endpoints: registered-model alias lookup, run artifact
//! listing, and raw artifact download.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::client::{
    run_relative_source, ArtifactEntry, ArtifactStore, ModelVersion, StoreError,
};

#[derive(Debug, Deserialize)]
struct AliasResponse {
    model_version: ModelVersion,
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    files: Vec<ArtifactEntry>,
}

/// Artifact store client over the registry's REST API.
pub struct RestArtifactStore {
    base_url: String,
    http: reqwest::Client,
}

impl RestArtifactStore {
    /// Create a client against `base_url` with a per-request timeout.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, StoreError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    fn api_url(&self, endpoint: &str) -> String {
        format!("{}/api/2.0/mlflow/{}", self.base_url, endpoint)
    }

    async fn fetch_file(&self, run_id: &str, path: &str, dest: &Path) -> Result<(), StoreError> {
        let url = format!("{}/get-artifact", self.base_url);
        let resp = self
            .http
            .get(&url)
            .query(&[("run_id", run_id), ("path", path)])
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(StoreError::Status {
                status: resp.status().as_u16(),
                message: format!("artifact fetch failed for {path}"),
            });
        }

        let bytes = resp.bytes().await?;
        std::fs::write(dest, &bytes)?;
        debug!(path, bytes = bytes.len(), "fetched artifact file");
        Ok(())
    }

    /// Download the files under one run-relative directory, descending one
    /// level into subdirectories (the same nesting depth resolution allows).
    async fn fetch_tree(
        &self,
        run_id: &str,
        rel: &str,
        dest: &Path,
    ) -> Result<(), StoreError> {
        std::fs::create_dir_all(dest)?;
        for entry in self.list_artifacts(run_id, rel).await? {
            let target = dest.join(entry.name());
            if entry.is_dir {
                std::fs::create_dir_all(&target)?;
                for inner in self.list_artifacts(run_id, &entry.path).await? {
                    if !inner.is_dir {
                        self.fetch_file(run_id, &inner.path, &target.join(inner.name()))
                            .await?;
                    }
                }
            } else {
                self.fetch_file(run_id, &entry.path, &target).await?;
            }
        }
        Ok(())
    }

    /// Resolve an artifact URI to `(run_id, run_relative_path)`.
    async fn locate(&self, uri: &str) -> Result<(String, String), StoreError> {
        if let Some(rest) = uri.strip_prefix("runs:/") {
            let (run_id, rel) = rest
                .split_once('/')
                .map(|(r, p)| (r.to_string(), p.trim_matches('/').to_string()))
                .unwrap_or_else(|| (rest.to_string(), String::new()));
            return Ok((run_id, rel));
        }

        if let Some(rest) = uri.strip_prefix("models:/") {
            let (name, alias) = rest
                .split_once('@')
                .ok_or_else(|| StoreError::UnsupportedUri(uri.to_string()))?;
            let version = self.version_by_alias(name, alias).await?;
            let rel = run_relative_source(&version.source)
                .ok_or_else(|| StoreError::UnsupportedUri(version.source.clone()))?;
            return Ok((version.run_id, rel));
        }

        Err(StoreError::UnsupportedUri(uri.to_string()))
    }
}

#[async_trait]
impl ArtifactStore for RestArtifactStore {
    async fn version_by_alias(&self, name: &str, alias: &str) -> Result<ModelVersion, StoreError> {
        let url = self.api_url("registered-models/alias");
        let resp = self
            .http
            .get(&url)
            .query(&[("name", name), ("alias", alias)])
            .send()
            .await?;

        match resp.status().as_u16() {
            200 => {
                let body: AliasResponse = resp
                    .json()
                    .await
                    .map_err(|e| StoreError::MalformedResponse(e.to_string()))?;
                Ok(body.model_version)
            }
            404 => Err(StoreError::AliasNotFound {
                name: name.to_string(),
                alias: alias.to_string(),
            }),
            status => Err(StoreError::Status {
                status,
                message: resp.text().await.unwrap_or_default(),
            }),
        }
    }

    async fn list_artifacts(
        &self,
        run_id: &str,
        path: &str,
    ) -> Result<Vec<ArtifactEntry>, StoreError> {
        let url = self.api_url("artifacts/list");
        let resp = self
            .http
            .get(&url)
            .query(&[("run_id", run_id), ("path", path)])
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(StoreError::Status {
                status: resp.status().as_u16(),
                message: format!("artifact listing failed for run {run_id}"),
            });
        }

        let body: ListResponse = resp
            .json()
            .await
            .map_err(|e| StoreError::MalformedResponse(e.to_string()))?;
        Ok(body.files)
    }

    async fn download_artifacts(&self, uri: &str, dest: &Path) -> Result<PathBuf, StoreError> {
        let (run_id, rel) = self.locate(uri).await?;
        self.fetch_tree(&run_id, &rel, dest).await?;
        Ok(dest.to_path_buf())
    }
}
