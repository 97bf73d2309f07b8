//! Grid-refresh pipeline
//!
//! Sequential batch job, run out-of-process from the serving layer (see the
//! `grid-refresh` binary). Walks the persisted grid mesh, filters to the
//! serviced landmass, fetches current weather per point under a fixed
//! inter-request delay, predicts with degraded zero-lag features, and
//! persists both the append-only history and the latest-grid snapshot.
//! One bad point never aborts the run.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use shared::{GridPoint, GridRecord};

use crate::config::Config;
use crate::error::AppResult;
use crate::external::weather::WeatherClient;
use crate::services::features;
use crate::services::grid_store;
use crate::services::prediction::PredictionService;
use crate::services::spatial;

/// Location-name fragments marking water bodies the mesh still covers
pub const WATER_KEYWORDS: [&str; 5] = ["sea", "ocean", "mediterranean", "bay", "gulf"];

/// Outcome counters for one pipeline run
#[derive(Debug, Default, Clone, Copy)]
pub struct RunSummary {
    /// Points predicted and persisted
    pub processed: usize,
    /// Points outside the serviced landmass or resolving to water bodies
    pub skipped: usize,
    /// Points that failed fetch or prediction and were dropped
    pub failed: usize,
}

/// The grid-refresh batch pipeline
pub struct GridRefreshPipeline {
    config: Arc<Config>,
    client: WeatherClient,
    service: PredictionService,
    model_type: String,
}

enum PointOutcome {
    Predicted(Box<GridRecord>),
    WaterBody,
}

impl GridRefreshPipeline {
    pub fn new(
        config: Arc<Config>,
        client: WeatherClient,
        service: PredictionService,
        model_type: String,
    ) -> Self {
        Self {
            config,
            client,
            service,
            model_type,
        }
    }

    /// Walk the whole grid once and persist the results
    pub async fn run(&self) -> AppResult<RunSummary> {
        let points = grid_store::load_grid_points(Path::new(&self.config.data.grid_points_file))?;
        let run_timestamp = Utc::now();

        tracing::info!(
            total = points.len(),
            model_type = %self.model_type,
            "starting grid refresh"
        );

        let mut summary = RunSummary::default();
        let mut records = Vec::new();

        for point in &points {
            if !spatial::in_bounds(point.lat, point.lon) {
                summary.skipped += 1;
                continue;
            }

            match self.process_point(point, run_timestamp).await {
                Ok(PointOutcome::Predicted(record)) => {
                    records.push(*record);
                    summary.processed += 1;
                    if summary.processed % 10 == 0 {
                        tracing::info!(processed = summary.processed, "pipeline progress");
                    }
                }
                Ok(PointOutcome::WaterBody) => summary.skipped += 1,
                Err(e) => {
                    summary.failed += 1;
                    tracing::warn!(
                        lat = point.lat,
                        lon = point.lon,
                        error = %e,
                        "point failed, skipping"
                    );
                }
            }
        }

        grid_store::write_latest_grid(Path::new(&self.config.data.latest_grid_file), &records)?;

        tracing::info!(
            processed = summary.processed,
            skipped = summary.skipped,
            failed = summary.failed,
            "grid refresh complete"
        );
        Ok(summary)
    }

    async fn process_point(
        &self,
        point: &GridPoint,
        run_timestamp: DateTime<Utc>,
    ) -> AppResult<PointOutcome> {
        let current = self.client.get_current(point.lat, point.lon).await?;
        // Fixed inter-request delay to respect the upstream quota
        tokio::time::sleep(Duration::from_millis(self.config.pipeline.rate_limit_ms)).await;

        let name_lower = current.location_name.to_lowercase();
        if WATER_KEYWORDS.iter().any(|w| name_lower.contains(w)) {
            return Ok(PointOutcome::WaterBody);
        }

        // The pipeline has no historical context for the point, so it runs
        // in the degraded zero-lag feature mode
        let feature_vec = features::zero_lag(current.temp_c);
        let prediction = self.service.predict(&feature_vec, Some(self.model_type.as_str()))?;

        grid_store::append_history(
            Path::new(&self.config.data.history_file),
            run_timestamp,
            point,
            &prediction,
        )?;

        let location_name = if current.location_name.is_empty() {
            format!("Loc ({:.2}, {:.2})", point.lat, point.lon)
        } else {
            current.location_name.clone()
        };
        let weather_summary = if current.description.is_empty() {
            "N/A".to_string()
        } else {
            current.description.clone()
        };

        Ok(PointOutcome::Predicted(Box::new(GridRecord {
            lat: point.lat,
            lon: point.lon,
            location_name,
            weather_summary,
            temp_c: current.temp_c,
            flood_risk: prediction.flood_risk,
            flood_probability: prediction.flood_probability,
            predicted_rainfall_mm: prediction.predicted_rainfall_mm,
            prediction,
            timestamp: run_timestamp,
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_water_keywords_match_substrings() {
        let is_water =
            |name: &str| WATER_KEYWORDS.iter().any(|w| name.to_lowercase().contains(w));
        assert!(is_water("Mediterranean Sea"));
        assert!(is_water("Famagusta Bay"));
        assert!(!is_water("Kyrenia"));
        assert!(!is_water("Lefkosa"));
    }
}
