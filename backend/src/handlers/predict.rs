//! HTTP handlers for prediction endpoints

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use shared::{LocationPrediction, PredictionRecord};

use crate::error::{AppError, AppResult};
use crate::AppState;

/// Request body for a raw feature-vector prediction
#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    pub features: Vec<f64>,
    pub model_type: Option<String>,
}

/// Predict from a raw feature vector
pub async fn predict(
    State(state): State<AppState>,
    Json(input): Json<PredictRequest>,
) -> AppResult<Json<PredictionRecord>> {
    shared::validate_features(&input.features)
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let record = state
        .prediction
        .predict(&input.features, input.model_type.as_deref())?;
    Ok(Json(record))
}

/// Query parameters for a location prediction
#[derive(Debug, Deserialize)]
pub struct LocationQuery {
    pub lat: f64,
    pub lon: f64,
    pub model: Option<String>,
}

/// Predict for a location, resolving weather through the cache and falling
/// back to an offline best-effort prediction on upstream failure
pub async fn predict_location(
    State(state): State<AppState>,
    Query(query): Query<LocationQuery>,
) -> AppResult<Json<LocationPrediction>> {
    shared::validate_coordinates(query.lat, query.lon)
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let response = state
        .prediction
        .predict_for_location(query.lat, query.lon, query.model.as_deref())
        .await?;
    Ok(Json(response))
}
