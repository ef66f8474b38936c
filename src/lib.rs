//! inferd - model resolution and prediction serving
//!
//! A small serving daemon for registry-managed regression models. Given a
//! logical model reference (name + alias), it resolves a concrete packaged
//! artifact through a fixed strategy chain, loads it into an immutable
//! handle, and serves predictions over HTTP.
//!
//! # Resolution order
//!
//! 1. **Local scan** - packaged model on disk under the configured roots;
//!    the registry is never contacted on a hit
//! 2. **Registry alias** - the version the alias points at, verified to
//!    carry its manifest at the registered source path
//! 3. **Registry run** - the originating run's artifact listing, searched
//!    one subdirectory level deep for the manifest
//!
//! A strategy failure falls through to the next; only exhaustion of all
//! three fails the load. Reloads are explicit, serialized, and never take
//! down a handle that is already serving.

pub mod config;
pub mod model;
pub mod registry;
pub mod resolve;
pub mod serve;
pub mod telemetry;

use std::sync::Arc;

use config::ServiceConfig;
use model::{ModelLifecycle, ModelLoader, ModelSlot};
use registry::{ArtifactStore, RestArtifactStore, StoreError};
use resolve::{ModelReference, Resolver};
use serve::AppState;

/// The assembled service: one slot, one lifecycle, one store client.
pub struct Service {
    pub config: ServiceConfig,
    pub lifecycle: Arc<ModelLifecycle>,
    pub slot: Arc<ModelSlot>,
}

impl Service {
    /// Assemble against the REST artifact store from `config`.
    pub fn new(config: ServiceConfig) -> Result<Self, StoreError> {
        let store: Arc<dyn ArtifactStore> = Arc::new(RestArtifactStore::new(
            &config.tracking_uri,
            config.registry_timeout,
        )?);
        Ok(Self::with_store(config, store))
    }

    /// Assemble with a caller-supplied store (tests substitute stubs here).
    pub fn with_store(config: ServiceConfig, store: Arc<dyn ArtifactStore>) -> Self {
        let reference = ModelReference::new(&config.model_name, &config.model_alias);
        let resolver = Resolver::new(
            store.clone(),
            config.scan_roots.clone(),
            &config.manifest_name,
            config.registry_timeout,
        );
        let loader = ModelLoader::new(store, &config.manifest_name);
        let slot = Arc::new(ModelSlot::new());
        let lifecycle = Arc::new(ModelLifecycle::new(reference, resolver, loader, slot.clone()));

        Self {
            config,
            lifecycle,
            slot,
        }
    }

    /// Shared state for the HTTP router.
    pub fn app_state(&self) -> Arc<AppState> {
        Arc::new(AppState {
            lifecycle: self.lifecycle.clone(),
            slot: self.slot.clone(),
        })
    }
}
