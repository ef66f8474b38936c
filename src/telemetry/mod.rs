//! Telemetry for the inference service: structured logging setup.

mod logging;

pub use logging::{init_logging, LogConfig, LogError, LogFormat};
