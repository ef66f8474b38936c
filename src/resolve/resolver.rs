//! Strategy chain resolving a logical model reference to an artifact.
//!
//! Order is fixed: local scan, registry alias, registry run listing. A
//! strategy failure advances the chain; only exhaustion is an error.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use metrics::counter;
use thiserror::Error;
use tracing::{info, warn};

use crate::registry::{run_relative_source, ArtifactStore, ModelVersion, StoreError};

use super::scanner::ManifestScanner;

/// Logical identity of the model to serve. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelReference {
    pub name: String,
    pub alias: String,
}

impl ModelReference {
    pub fn new(name: &str, alias: &str) -> Self {
        Self {
            name: name.to_string(),
            alias: alias.to_string(),
        }
    }
}

impl fmt::Display for ModelReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.alias)
    }
}

/// Which strategy produced the artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactOrigin {
    Local,
    RegistryAlias,
    RegistryRun,
}

impl fmt::Display for ArtifactOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::RegistryAlias => write!(f, "registry-alias"),
            Self::RegistryRun => write!(f, "registry-run"),
        }
    }
}

/// Where the artifact lives: a directory on disk or a registry URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactLocation {
    Local(PathBuf),
    Registry(String),
}

impl fmt::Display for ArtifactLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(path) => write!(f, "{}", path.display()),
            Self::Registry(uri) => write!(f, "{uri}"),
        }
    }
}

/// Outcome of one successful resolution attempt.
///
/// Two resolutions against unchanged external state are equivalent when
/// origin and location agree; `discovered_at` is informational.
#[derive(Debug, Clone)]
pub struct ResolvedArtifact {
    pub location: ArtifactLocation,
    pub origin: ArtifactOrigin,
    pub discovered_at: DateTime<Utc>,
}

impl ResolvedArtifact {
    fn new(location: ArtifactLocation, origin: ArtifactOrigin) -> Self {
        Self {
            location,
            origin,
            discovered_at: Utc::now(),
        }
    }
}

/// Why a single strategy could not produce an artifact.
#[derive(Error, Debug)]
pub enum StrategyError {
    #[error("no manifest under the configured scan roots")]
    NoLocalMatch,

    #[error("registered source '{0}' does not follow the run-relative convention")]
    UnconventionalSource(String),

    #[error("manifest '{manifest}' not present at {path}")]
    ManifestMissing { manifest: String, path: String },

    #[error("strategy timed out after {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// One recorded strategy failure, kept for the exhaustion report.
#[derive(Debug, Clone)]
pub struct StrategyFailure {
    pub strategy: String,
    pub reason: String,
}

impl fmt::Display for StrategyFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.strategy, self.reason)
    }
}

/// Every strategy failed; fatal for the load or reload attempt that asked.
#[derive(Error, Debug)]
#[error("all resolution strategies failed for {reference}")]
pub struct ResolveError {
    pub reference: String,
    pub failures: Vec<StrategyFailure>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Strategy {
    Local,
    RegistryAlias,
    RegistryRun,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::RegistryAlias => write!(f, "registry-alias"),
            Self::RegistryRun => write!(f, "registry-run"),
        }
    }
}

const STRATEGY_ORDER: [Strategy; 3] =
    [Strategy::Local, Strategy::RegistryAlias, Strategy::RegistryRun];

/// Resolves model references through the fixed strategy chain.
pub struct Resolver {
    store: Arc<dyn ArtifactStore>,
    scanner: ManifestScanner,
    scan_roots: Vec<PathBuf>,
    manifest_name: String,
    strategy_timeout: Duration,
}

impl Resolver {
    pub fn new(
        store: Arc<dyn ArtifactStore>,
        scan_roots: Vec<PathBuf>,
        manifest_name: &str,
        strategy_timeout: Duration,
    ) -> Self {
        Self {
            store,
            scanner: ManifestScanner::new(manifest_name),
            scan_roots,
            manifest_name: manifest_name.to_string(),
            strategy_timeout,
        }
    }

    /// Resolve `reference` to exactly one artifact, or fail after every
    /// strategy has been tried.
    ///
    /// Resolution only reads: repeated calls against unchanged filesystem
    /// and registry state return the same origin and location.
    pub async fn resolve(
        &self,
        reference: &ModelReference,
    ) -> Result<ResolvedArtifact, ResolveError> {
        let mut failures = Vec::new();
        // The alias lookup feeds both registry strategies; resolve it once
        // per call so the run fallback can reuse a successful lookup.
        let mut alias_version: Option<ModelVersion> = None;

        for strategy in STRATEGY_ORDER {
            match self.attempt(strategy, reference, &mut alias_version).await {
                Ok(artifact) => {
                    info!(
                        reference = %reference,
                        origin = %artifact.origin,
                        location = %artifact.location,
                        "model resolved"
                    );
                    counter!("inferd_resolutions_total", "origin" => artifact.origin.to_string())
                        .increment(1);
                    return Ok(artifact);
                }
                Err(err) => {
                    warn!(
                        reference = %reference,
                        strategy = %strategy,
                        error = %err,
                        "resolution strategy failed, advancing"
                    );
                    failures.push(StrategyFailure {
                        strategy: strategy.to_string(),
                        reason: err.to_string(),
                    });
                }
            }
        }

        counter!("inferd_resolution_exhausted_total").increment(1);
        Err(ResolveError {
            reference: reference.to_string(),
            failures,
        })
    }

    async fn attempt(
        &self,
        strategy: Strategy,
        reference: &ModelReference,
        alias_version: &mut Option<ModelVersion>,
    ) -> Result<ResolvedArtifact, StrategyError> {
        match strategy {
            Strategy::Local => self.try_local(),
            Strategy::RegistryAlias => {
                tokio::time::timeout(
                    self.strategy_timeout,
                    self.try_registry_alias(reference, alias_version),
                )
                .await
                .map_err(|_| StrategyError::Timeout(self.strategy_timeout))?
            }
            Strategy::RegistryRun => {
                tokio::time::timeout(
                    self.strategy_timeout,
                    self.try_registry_run(reference, alias_version),
                )
                .await
                .map_err(|_| StrategyError::Timeout(self.strategy_timeout))?
            }
        }
    }

    /// Strategy 1: self-contained deployments carry the model on disk and
    /// never touch the registry.
    fn try_local(&self) -> Result<ResolvedArtifact, StrategyError> {
        match self.scanner.scan(&self.scan_roots) {
            Some(dir) => Ok(ResolvedArtifact::new(
                ArtifactLocation::Local(dir),
                ArtifactOrigin::Local,
            )),
            None => Err(StrategyError::NoLocalMatch),
        }
    }

    /// Strategy 2: alias lookup, then a read-only probe that the registered
    /// source actually carries the manifest where convention says it is.
    async fn try_registry_alias(
        &self,
        reference: &ModelReference,
        alias_version: &mut Option<ModelVersion>,
    ) -> Result<ResolvedArtifact, StrategyError> {
        let version = self.alias_version(reference, alias_version).await?;

        let rel = run_relative_source(&version.source)
            .ok_or_else(|| StrategyError::UnconventionalSource(version.source.clone()))?;

        let listing = self.store.list_artifacts(&version.run_id, &rel).await?;
        if !self.listing_has_manifest(&listing) {
            return Err(StrategyError::ManifestMissing {
                manifest: self.manifest_name.clone(),
                path: format!("runs:/{}/{}", version.run_id, rel),
            });
        }

        Ok(ResolvedArtifact::new(
            ArtifactLocation::Registry(format!("models:/{}@{}", reference.name, reference.alias)),
            ArtifactOrigin::RegistryAlias,
        ))
    }

    /// Strategy 3: walk the run's top-level artifact listing (one level of
    /// subdirectory nesting) for the manifest and address it run-relative.
    async fn try_registry_run(
        &self,
        reference: &ModelReference,
        alias_version: &mut Option<ModelVersion>,
    ) -> Result<ResolvedArtifact, StrategyError> {
        let version = self.alias_version(reference, alias_version).await?;
        let run_id = version.run_id;

        let root = self.store.list_artifacts(&run_id, "").await?;
        if self.listing_has_manifest(&root) {
            return Ok(ResolvedArtifact::new(
                ArtifactLocation::Registry(format!("runs:/{run_id}")),
                ArtifactOrigin::RegistryRun,
            ));
        }

        let mut dirs: Vec<String> = root
            .iter()
            .filter(|e| e.is_dir)
            .map(|e| e.path.clone())
            .collect();
        dirs.sort();

        for dir in dirs {
            let listing = self.store.list_artifacts(&run_id, &dir).await?;
            if self.listing_has_manifest(&listing) {
                return Ok(ResolvedArtifact::new(
                    ArtifactLocation::Registry(format!("runs:/{run_id}/{dir}")),
                    ArtifactOrigin::RegistryRun,
                ));
            }
        }

        Err(StrategyError::ManifestMissing {
            manifest: self.manifest_name.clone(),
            path: format!("runs:/{run_id}"),
        })
    }

    async fn alias_version(
        &self,
        reference: &ModelReference,
        cache: &mut Option<ModelVersion>,
    ) -> Result<ModelVersion, StoreError> {
        if let Some(version) = cache {
            return Ok(version.clone());
        }
        let version = self
            .store
            .version_by_alias(&reference.name, &reference.alias)
            .await?;
        *cache = Some(version.clone());
        Ok(version)
    }

    fn listing_has_manifest(&self, listing: &[crate::registry::ArtifactEntry]) -> bool {
        listing
            .iter()
            .any(|e| !e.is_dir && e.name() == self.manifest_name)
    }
}
