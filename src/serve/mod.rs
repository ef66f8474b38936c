//! HTTP surface of the inference service.

mod routes;

pub use routes::{
    health, predict, reload, router, ApiError, AppState, HealthResponse, PredictRequest,
    PredictResponse, ReloadResponse,
};
