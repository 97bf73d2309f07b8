//! HTTP handlers for grid snapshot endpoints

use std::path::Path;

use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::GridRecord;

use crate::error::AppResult;
use crate::services::grid_store;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct GridQuery {
    pub model: Option<String>,
}

#[derive(Serialize)]
pub struct GridSnapshotResponse {
    pub status: String,
    pub count: usize,
    pub generated_at_utc: DateTime<Utc>,
    pub data: Vec<GridRecord>,
    pub model_applied: String,
}

/// Return the persisted grid snapshot, re-scored in place through the batch
/// scorer when a loaded model type is requested.
///
/// The response always carries cache-preventing headers so map clients see
/// each refresh immediately.
pub async fn latest_grid(
    State(state): State<AppState>,
    Query(query): Query<GridQuery>,
) -> AppResult<impl IntoResponse> {
    let path = Path::new(&state.config.data.latest_grid_file);
    let mut records = grid_store::load_latest_grid(path)?;

    let mut model_applied = "cached".to_string();
    if let Some(model) = &query.model {
        if state.registry.get(model).is_some() {
            match state.prediction.score_grid(&mut records, model) {
                Ok(updated) => {
                    model_applied = model.to_lowercase();
                    tracing::debug!(updated, model = %model_applied, "re-scored grid snapshot");
                }
                Err(e) => {
                    // Serve the cached values rather than failing the request
                    tracing::error!(error = %e, "batch re-score failed, serving cached values");
                }
            }
        }
    }

    let body = GridSnapshotResponse {
        status: "success".to_string(),
        count: records.len(),
        generated_at_utc: Utc::now(),
        data: records,
        model_applied,
    };

    Ok((
        [(header::CACHE_CONTROL, "no-cache, no-store, must-revalidate")],
        Json(body),
    ))
}

#[derive(Debug, Deserialize)]
pub struct RefreshQuery {
    pub model: Option<String>,
}

#[derive(Serialize)]
pub struct RefreshResponse {
    pub status: String,
    pub message: String,
    pub stdout: String,
}

/// Trigger the grid-refresh pipeline as a supervised child process
pub async fn refresh_grid(
    State(state): State<AppState>,
    Query(query): Query<RefreshQuery>,
) -> AppResult<Json<RefreshResponse>> {
    let model = query
        .model
        .as_deref()
        .unwrap_or(&state.config.models.default_type)
        .to_lowercase();

    let report = state.refresh.run(&model).await?;

    Ok(Json(RefreshResponse {
        status: "success".to_string(),
        message: format!("Grid refreshed using {}", model),
        stdout: report.stdout_tail,
    }))
}
