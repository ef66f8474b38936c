//! Model management: manifest parsing, predictor construction, the loader
//! turning resolved artifacts into handles, and the guarded slot that holds
//! the live handle for the service.

mod handle;
mod lifecycle;
mod loader;
pub mod manifest;
mod predictor;
mod slot;

pub use handle::{ModelHandle, PredictError};
pub use lifecycle::{ModelLifecycle, ReloadError};
pub use loader::{LoadError, ModelLoader};
pub use manifest::{ManifestError, ModelFlavor, ModelManifest};
pub use predictor::{LinearModel, LinearPayload, Predictor, PredictorError};
pub use slot::{ModelSlot, SlotState};
