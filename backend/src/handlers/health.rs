//! Service banner and health check handlers

use std::path::Path;

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct BannerResponse {
    pub status: String,
    pub message: String,
    pub models: Vec<String>,
}

/// Root endpoint: service banner with the loaded model types
pub async fn root(State(state): State<AppState>) -> Json<BannerResponse> {
    Json(BannerResponse {
        status: "ok".to_string(),
        message: "Flood Prediction API is running".to_string(),
        models: state.registry.model_types(),
    })
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub models_loaded: usize,
    pub grid_artifact: String,
}

/// Health check endpoint handler
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let grid_artifact = if Path::new(&state.config.data.latest_grid_file).exists() {
        "present".to_string()
    } else {
        "missing".to_string()
    };

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        models_loaded: state.registry.len(),
        grid_artifact,
    })
}
