//! Route definitions for the Flood Prediction Service

use axum::{
    routing::{get, post},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Service banner and health (public)
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        // Prediction endpoints
        .route("/predict", post(handlers::predict))
        .route("/predict-location", get(handlers::predict_location))
        // Grid snapshot endpoints
        .route("/grid/latest", get(handlers::latest_grid))
        .route("/grid/refresh", post(handlers::refresh_grid))
}
