//! The process-wide model slot.
//!
//! One slot per process holds the current handle behind a read-write lock:
//! many concurrent predictions read, a single load or reload writes. The
//! critical sections never await, so a reload in flight cannot stall
//! predictions against the handle already installed.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::handle::{ModelHandle, PredictError};

/// Lifecycle state of the slot.
#[derive(Clone, Default)]
pub enum SlotState {
    /// No handle yet; predictions fail fast.
    #[default]
    Unloaded,
    /// A load is in flight and there is no previous handle to serve.
    Resolving,
    /// A handle is installed and serving.
    Loaded(Arc<ModelHandle>),
    /// The last load exhausted every strategy; reachable again only through
    /// an explicit reload.
    Failed(String),
}

impl SlotState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Unloaded => "unloaded",
            Self::Resolving => "resolving",
            Self::Loaded(_) => "loaded",
            Self::Failed(_) => "failed",
        }
    }
}

/// Guarded holder of the current model handle.
pub struct ModelSlot {
    state: RwLock<SlotState>,
}

impl ModelSlot {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(SlotState::Unloaded),
        }
    }

    /// Clone of the current state (handles are shared via `Arc`).
    pub fn snapshot(&self) -> SlotState {
        self.state.read().clone()
    }

    /// Atomically replace the state. Readers see either the old or the new
    /// state, never anything in between.
    pub(super) fn set(&self, state: SlotState) {
        *self.state.write() = state;
    }

    pub fn is_loaded(&self) -> bool {
        matches!(*self.state.read(), SlotState::Loaded(_))
    }

    /// The serving handle, or the distinct model-unavailable error.
    pub fn current(&self) -> Result<Arc<ModelHandle>, PredictError> {
        match &*self.state.read() {
            SlotState::Loaded(handle) => Ok(handle.clone()),
            other => Err(PredictError::ModelUnavailable(other.name().to_string())),
        }
    }

    /// Predict against the current handle.
    pub fn predict(&self, features: &HashMap<String, f64>) -> Result<f64, PredictError> {
        self.current()?.predict(features)
    }
}

impl Default for ModelSlot {
    fn default() -> Self {
        Self::new()
    }
}
