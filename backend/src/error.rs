//! Error handling for the Flood Prediction Service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Model errors
    #[error("No model available for type '{0}'")]
    ModelUnavailable(String),

    #[error("Feature vector length {actual} does not match trained feature count {expected}")]
    FeatureShapeMismatch { expected: usize, actual: usize },

    #[error("Artifact error: {0}")]
    Artifact(String),

    // External service errors
    #[error("Upstream weather failure: {0}")]
    UpstreamWeather(String),

    // Grid artifact errors
    #[error("Grid artifact not found: {0}")]
    GridArtifactMissing(String),

    #[error("Pipeline invocation failed: {0}")]
    PipelineInvocation(String),

    // Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Internal errors
    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_detail) = match &self {
            AppError::ModelUnavailable(model_type) => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorDetail {
                    code: "MODEL_UNAVAILABLE".to_string(),
                    message: format!("No model available for type '{}'", model_type),
                },
            ),
            AppError::FeatureShapeMismatch { expected, actual } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "FEATURE_SHAPE_MISMATCH".to_string(),
                    message: format!(
                        "Feature vector length {} does not match trained feature count {}",
                        actual, expected
                    ),
                },
            ),
            AppError::Artifact(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "ARTIFACT_ERROR".to_string(),
                    message: msg.clone(),
                },
            ),
            AppError::UpstreamWeather(msg) => (
                StatusCode::BAD_GATEWAY,
                ErrorDetail {
                    code: "UPSTREAM_WEATHER_FAILURE".to_string(),
                    message: format!("Upstream weather failure: {}", msg),
                },
            ),
            AppError::GridArtifactMissing(path) => (
                StatusCode::NOT_FOUND,
                ErrorDetail {
                    code: "GRID_ARTIFACT_MISSING".to_string(),
                    message: format!("Grid artifact not found: {}", path),
                },
            ),
            AppError::PipelineInvocation(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "PIPELINE_INVOCATION_FAILURE".to_string(),
                    message: msg.clone(),
                },
            ),
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "VALIDATION_ERROR".to_string(),
                    message: msg.clone(),
                },
            ),
            AppError::Configuration(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "CONFIGURATION_ERROR".to_string(),
                    message: format!("Configuration error: {}", msg),
                },
            ),
            AppError::Io(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "IO_ERROR".to_string(),
                    message: "An IO error occurred".to_string(),
                },
            ),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "INTERNAL_ERROR".to_string(),
                    message: "An internal server error occurred".to_string(),
                },
            ),
        };

        // Log the error for debugging
        tracing::error!("Error: {:?}", self);

        (status, Json(ErrorResponse { error: error_detail })).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;
