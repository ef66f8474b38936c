//! Load and reload orchestration over the resolver, loader and slot.
//!
//! Reloads are serialized; while one is in flight the previously installed
//! handle keeps serving, and it survives both reload failure and
//! caller-side abandonment. Nothing here retries on its own.

use std::sync::Arc;

use metrics::counter;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::resolve::{ModelReference, ResolveError, Resolver};

use super::handle::ModelHandle;
use super::loader::{LoadError, ModelLoader};
use super::slot::{ModelSlot, SlotState};

#[derive(Error, Debug)]
pub enum ReloadError {
    #[error("Reload already in progress")]
    ReloadInProgress,

    #[error("Reload abandoned by caller")]
    Cancelled,

    #[error(transparent)]
    Resolution(#[from] ResolveError),

    #[error(transparent)]
    Load(#[from] LoadError),
}

/// Owns the resolve-load-swap sequence for the slot.
pub struct ModelLifecycle {
    reference: ModelReference,
    resolver: Resolver,
    loader: ModelLoader,
    slot: Arc<ModelSlot>,
    reload_gate: Mutex<()>,
}

impl ModelLifecycle {
    pub fn new(
        reference: ModelReference,
        resolver: Resolver,
        loader: ModelLoader,
        slot: Arc<ModelSlot>,
    ) -> Self {
        Self {
            reference,
            resolver,
            loader,
            slot,
            reload_gate: Mutex::new(()),
        }
    }

    pub fn slot(&self) -> Arc<ModelSlot> {
        self.slot.clone()
    }

    pub fn reference(&self) -> &ModelReference {
        &self.reference
    }

    /// Startup load. Identical to a reload, starting from an empty slot.
    pub async fn load_initial(&self) -> Result<Arc<ModelHandle>, ReloadError> {
        self.reload(CancellationToken::new()).await
    }

    /// Resolve and load the model, then atomically swap it into the slot.
    ///
    /// 1. Acquire the reload gate (a second reload is rejected, not queued)
    /// 2. Resolve and build the new handle with no lock held
    /// 3. Swap under the write lock, unless `cancel` fired first
    ///
    /// On failure or cancellation the prior handle, if any, is untouched;
    /// `Failed` is only entered when there was nothing good to keep.
    pub async fn reload(
        &self,
        cancel: CancellationToken,
    ) -> Result<Arc<ModelHandle>, ReloadError> {
        let _gate = self
            .reload_gate
            .try_lock()
            .map_err(|_| ReloadError::ReloadInProgress)?;

        let previous = self.slot.snapshot();
        let had_handle = matches!(previous, SlotState::Loaded(_));
        if !had_handle {
            self.slot.set(SlotState::Resolving);
        }

        let outcome = self.build().await;

        match outcome {
            Ok(handle) => {
                if cancel.is_cancelled() {
                    warn!(reference = %self.reference, "reload abandoned, keeping previous state");
                    if !had_handle {
                        self.slot.set(previous);
                    }
                    counter!("inferd_reloads_total", "outcome" => "cancelled").increment(1);
                    return Err(ReloadError::Cancelled);
                }

                let handle = Arc::new(handle);
                self.slot.set(SlotState::Loaded(handle.clone()));
                info!(
                    reference = %self.reference,
                    origin = %handle.artifact().origin,
                    location = %handle.artifact().location,
                    "model handle installed"
                );
                counter!("inferd_reloads_total", "outcome" => "ok").increment(1);
                Ok(handle)
            }
            Err(err) => {
                if had_handle {
                    warn!(
                        reference = %self.reference,
                        error = %err,
                        "reload failed, previous handle keeps serving"
                    );
                } else {
                    error!(reference = %self.reference, error = %err, "model load failed");
                    self.slot.set(SlotState::Failed(err.to_string()));
                }
                counter!("inferd_reloads_total", "outcome" => "failed").increment(1);
                Err(err)
            }
        }
    }

    async fn build(&self) -> Result<ModelHandle, ReloadError> {
        let artifact = self.resolver.resolve(&self.reference).await?;
        let handle = self.loader.load(&artifact).await?;
        Ok(handle)
    }
}
