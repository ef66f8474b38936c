//! Route handlers: health, predict, reload.
//!
//! Error mapping is part of the contract: input validation is a client
//! error (422), a missing model is service-unavailable (503), so monitoring
//! can tell "bad request" from "not ready".

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use metrics::{counter, histogram};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::model::{ModelLifecycle, ModelSlot, PredictError, ReloadError};

/// Shared state handed to every handler.
pub struct AppState {
    pub lifecycle: Arc<ModelLifecycle>,
    pub slot: Arc<ModelSlot>,
}

#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    pub features: HashMap<String, f64>,
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub prediction: f64,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub model_loaded: bool,
}

#[derive(Debug, Serialize)]
pub struct ReloadResponse {
    pub status: String,
    pub origin: String,
    pub location: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

/// An error with its HTTP status, ready to serialize.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<PredictError> for ApiError {
    fn from(err: PredictError) -> Self {
        let status = match err {
            PredictError::InputValidation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            PredictError::ModelUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl From<ReloadError> for ApiError {
    fn from(err: ReloadError) -> Self {
        let status = match err {
            ReloadError::ReloadInProgress => StatusCode::CONFLICT,
            ReloadError::Cancelled => StatusCode::CONFLICT,
            ReloadError::Resolution(_) | ReloadError::Load(_) => StatusCode::BAD_GATEWAY,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

/// Build the service router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/predict", post(predict))
        .route("/reload", post(reload))
        .with_state(state)
}

/// Reports whether a model handle is installed; unhealthy (503) until then.
pub async fn health(State(state): State<Arc<AppState>>) -> Response {
    let loaded = state.slot.is_loaded();
    let body = HealthResponse {
        status: if loaded { "ok" } else { "unavailable" }.to_string(),
        model_loaded: loaded,
    };
    let status = if loaded {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(body)).into_response()
}

pub async fn predict(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PredictRequest>,
) -> Result<Json<PredictResponse>, ApiError> {
    let started = Instant::now();
    match state.slot.predict(&request.features) {
        Ok(prediction) => {
            counter!("inferd_predictions_total", "outcome" => "ok").increment(1);
            histogram!("inferd_predict_duration_seconds").record(started.elapsed().as_secs_f64());
            Ok(Json(PredictResponse { prediction }))
        }
        Err(err) => {
            let outcome = match err {
                PredictError::InputValidation(_) => "invalid_input",
                PredictError::ModelUnavailable(_) => "unavailable",
            };
            counter!("inferd_predictions_total", "outcome" => outcome).increment(1);
            Err(err.into())
        }
    }
}

/// Explicit reload trigger; the only path out of a failed slot.
pub async fn reload(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ReloadResponse>, ApiError> {
    let handle = state.lifecycle.reload(CancellationToken::new()).await?;
    let artifact = handle.artifact();
    Ok(Json(ReloadResponse {
        status: "reloaded".to_string(),
        origin: artifact.origin.to_string(),
        location: artifact.location.to_string(),
    }))
}
