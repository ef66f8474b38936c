//! Prediction backends.
//!
//! One backend per manifest flavor, behind a single trait so the handle and
//! the HTTP layer never care which flavor is loaded.

use std::collections::HashMap;

use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PredictorError {
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    #[error("no coefficient for schema field '{0}'")]
    MissingCoefficient(String),
}

/// A ready-to-use regression model.
///
/// `features` arrives in the manifest's schema order; validation happens
/// before this is called, so implementations are pure functions.
pub trait Predictor: Send + Sync {
    fn predict(&self, features: &[f64]) -> f64;
}

/// On-disk payload for the linear flavor.
#[derive(Debug, Clone, Deserialize)]
pub struct LinearPayload {
    pub intercept: f64,
    pub coefficients: HashMap<String, f64>,
}

impl LinearPayload {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, PredictorError> {
        serde_json::from_slice(bytes).map_err(|e| PredictorError::MalformedPayload(e.to_string()))
    }
}

/// Linear regression: intercept plus a weight per schema field.
#[derive(Debug)]
pub struct LinearModel {
    intercept: f64,
    weights: Vec<f64>,
}

impl LinearModel {
    /// Build from a payload, ordering weights by `schema`.
    ///
    /// Every schema field must have a coefficient; extra coefficients in the
    /// payload are ignored.
    pub fn from_payload(payload: &LinearPayload, schema: &[String]) -> Result<Self, PredictorError> {
        let weights = schema
            .iter()
            .map(|field| {
                payload
                    .coefficients
                    .get(field)
                    .copied()
                    .ok_or_else(|| PredictorError::MissingCoefficient(field.clone()))
            })
            .collect::<Result<Vec<f64>, PredictorError>>()?;

        Ok(Self {
            intercept: payload.intercept,
            weights,
        })
    }
}

impl Predictor for LinearModel {
    fn predict(&self, features: &[f64]) -> f64 {
        self.intercept
            + self
                .weights
                .iter()
                .zip(features)
                .map(|(w, x)| w * x)
                .sum::<f64>()
    }
}
