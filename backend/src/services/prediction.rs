//! Prediction orchestration: single-point, multi-horizon and batch scoring

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::anyhow;
use ndarray::{Array1, Array2};
use shared::{
    DailyDigest, ForecastDigest, GridRecord, HorizonPrediction, HourlyDigest, LocationPrediction,
    PredictionRecord, ResolvedLocation,
};

use crate::error::{AppError, AppResult};
use crate::external::weather::ForecastEntry;
use crate::services::features;
use crate::services::registry::{ModelBundle, ModelRegistry};
use crate::services::risk;
use crate::services::weather_cache::{WeatherCache, WeatherSnapshot};

/// Fixed future offsets and their indices into the 3-hour forecast list
const HORIZONS: [(&str, usize); 3] = [("24h", 8), ("48h", 16), ("72h", 24)];

/// Number of forecast entries in the hourly digest (24 steps of 3 h = 72 h)
const HOURLY_DIGEST_STEPS: usize = 24;

/// Maximum days in the daily digest
const DAILY_DIGEST_DAYS: usize = 7;

/// Orchestrates predictions through the registry, feature reconstruction,
/// weather cache and risk policy
#[derive(Clone)]
pub struct PredictionService {
    registry: Arc<ModelRegistry>,
    cache: Arc<WeatherCache>,
}

impl PredictionService {
    pub fn new(registry: Arc<ModelRegistry>, cache: Arc<WeatherCache>) -> Self {
        Self { registry, cache }
    }

    /// Predict from a raw feature vector, resolving the requested model
    /// type with fallback to the default
    pub fn predict(
        &self,
        features: &[f64],
        model_type: Option<&str>,
    ) -> AppResult<PredictionRecord> {
        let bundle = self.registry.resolve(model_type)?;
        self.predict_with_bundle(&bundle, features)
    }

    fn predict_with_bundle(
        &self,
        bundle: &ModelBundle,
        features: &[f64],
    ) -> AppResult<PredictionRecord> {
        bundle.check_features(features.len())?;
        let x = Array2::from_shape_vec((1, features.len()), features.to_vec())
            .map_err(|e| AppError::Internal(anyhow!(e)))?;
        let (rainfall, probability) = score_matrix(bundle, x);
        Ok(build_record(bundle, rainfall[0], probability[0]))
    }

    /// Resolve weather for a location and predict for the current hour plus
    /// the fixed future horizons. Falls back to an offline best-effort
    /// prediction when the upstream fetch fails.
    pub async fn predict_for_location(
        &self,
        lat: f64,
        lon: f64,
        model_type: Option<&str>,
    ) -> AppResult<LocationPrediction> {
        let bundle = self.registry.resolve(model_type)?;

        match self.cache.get_or_fetch(lat, lon).await {
            Ok(snapshot) => self.live_prediction(&bundle, lat, lon, &snapshot),
            Err(AppError::UpstreamWeather(reason)) => {
                tracing::warn!(lat, lon, %reason, "weather fetch failed, serving offline prediction");
                self.offline_prediction(&bundle, lat, lon)
            }
            Err(e) => Err(e),
        }
    }

    fn live_prediction(
        &self,
        bundle: &ModelBundle,
        lat: f64,
        lon: f64,
        snapshot: &WeatherSnapshot,
    ) -> AppResult<LocationPrediction> {
        let current = &snapshot.current;
        let (feature_vec, bias) = features::reconstruct(lat, lon, current.temp_c);
        let mut record = self.predict_with_bundle(bundle, &feature_vec)?;
        record.topo_bias = Some(bias);
        record.future_horizons =
            Some(self.horizon_predictions(bundle, lat, lon, &snapshot.forecast)?);

        let name = if current.location_name.is_empty() {
            "Unknown".to_string()
        } else {
            current.location_name.clone()
        };

        Ok(LocationPrediction {
            location: ResolvedLocation { lat, lon, name },
            weather_summary: current.description.clone(),
            temp_c: current.temp_c.round() as i32,
            humidity: current.humidity_percent,
            wind_kph: kph(current.wind_speed_ms),
            precipitation_prob: snapshot
                .forecast
                .first()
                .map(|f| (f.pop * 100.0).round() as i32)
                .unwrap_or(0),
            forecast: build_digest(&snapshot.forecast),
            prediction: record,
            degraded: false,
        })
    }

    /// Best-effort prediction from the synthetic fallback snapshot, tagged
    /// so the caller can present it as degraded
    fn offline_prediction(
        &self,
        bundle: &ModelBundle,
        lat: f64,
        lon: f64,
    ) -> AppResult<LocationPrediction> {
        let (feature_vec, bias) = features::reconstruct(lat, lon, features::DEFAULT_TEMP_C);
        let mut record = self.predict_with_bundle(bundle, &feature_vec)?;
        record.topo_bias = Some(bias);

        Ok(LocationPrediction {
            location: ResolvedLocation {
                lat,
                lon,
                name: "Unknown (offline)".to_string(),
            },
            weather_summary: "N/A".to_string(),
            temp_c: features::DEFAULT_TEMP_C.round() as i32,
            humidity: 50,
            wind_kph: 0,
            precipitation_prob: 0,
            forecast: ForecastDigest::default(),
            prediction: record,
            degraded: true,
        })
    }

    fn horizon_predictions(
        &self,
        bundle: &ModelBundle,
        lat: f64,
        lon: f64,
        forecast: &[ForecastEntry],
    ) -> AppResult<BTreeMap<String, HorizonPrediction>> {
        let mut horizons = BTreeMap::new();
        if forecast.is_empty() {
            return Ok(horizons);
        }

        for (label, idx) in HORIZONS {
            // Nearest index into the 3-hour list, clamped to its end
            let entry = &forecast[idx.min(forecast.len() - 1)];
            let (feature_vec, _) = features::reconstruct(lat, lon, entry.temp_c);
            let record = self.predict_with_bundle(bundle, &feature_vec)?;

            horizons.insert(
                label.to_string(),
                HorizonPrediction {
                    time: entry.timestamp.format("%a %H:%M").to_string(),
                    temp: entry.temp_c.round() as i32,
                    rainfall_mm: round_to(record.predicted_rainfall_mm, 2),
                    probability: round_to(record.flood_probability, 3),
                    risk: record.flood_risk,
                },
            );
        }
        Ok(horizons)
    }

    /// Re-score a grid snapshot in place with one vectorized pass.
    ///
    /// Builds a single feature matrix over every record with usable
    /// coordinates (temperature defaulted when missing), scales it once and
    /// predicts once for the whole matrix. Output is numerically identical
    /// to calling `predict` per point, at O(1) model invocations. Returns
    /// the number of records updated.
    pub fn score_grid(&self, records: &mut [GridRecord], model_type: &str) -> AppResult<usize> {
        let bundle = self.registry.resolve(Some(model_type))?;

        let mut rows: Vec<f64> = Vec::with_capacity(records.len() * bundle.feature_count);
        let mut valid: Vec<usize> = Vec::with_capacity(records.len());

        for (i, record) in records.iter().enumerate() {
            if !record.lat.is_finite() || !record.lon.is_finite() {
                continue;
            }
            let temp_c = if record.temp_c.is_finite() && record.temp_c != 0.0 {
                record.temp_c
            } else {
                features::DEFAULT_TEMP_C
            };
            let (feature_vec, _) = features::reconstruct(record.lat, record.lon, temp_c);
            if feature_vec.len() != bundle.feature_count {
                // A row that cannot be shaped is skipped, never fatal
                continue;
            }
            rows.extend_from_slice(&feature_vec);
            valid.push(i);
        }

        if valid.is_empty() {
            return Ok(0);
        }

        let x = Array2::from_shape_vec((valid.len(), bundle.feature_count), rows)
            .map_err(|e| AppError::Internal(anyhow!(e)))?;
        let (rainfall, probability) = score_matrix(&bundle, x);

        for (j, &i) in valid.iter().enumerate() {
            let updated = build_record(&bundle, rainfall[j], probability[j]);
            let record = &mut records[i];
            record.flood_risk = updated.flood_risk;
            record.flood_probability = updated.flood_probability;
            record.predicted_rainfall_mm = updated.predicted_rainfall_mm;
            record.prediction = updated;
        }

        Ok(valid.len())
    }
}

/// Scale a feature matrix and run both models over it in one pass
fn score_matrix(bundle: &ModelBundle, mut x: Array2<f64>) -> (Array1<f64>, Array1<f64>) {
    bundle.scale(&mut x);
    let rainfall = bundle.regressor.predict_batch(&x);
    let probability = match &bundle.classifier {
        Some(classifier) => classifier.predict_proba_batch(&x),
        // No trained classifier: the rainfall-only proxy stands in
        None => rainfall.mapv(|mm| risk::classify_by_rainfall(mm).0),
    };
    (rainfall, probability)
}

fn build_record(bundle: &ModelBundle, rainfall_mm: f64, probability: f64) -> PredictionRecord {
    let (tier, action) = if bundle.classifier.is_some() {
        risk::classify(probability)
    } else {
        let (_, tier) = risk::classify_by_rainfall(rainfall_mm);
        (tier, risk::action_for(tier))
    };

    PredictionRecord {
        predicted_rainfall_mm: rainfall_mm,
        flood_probability: probability,
        flood_risk: tier,
        recommended_action: action.to_string(),
        model_name: bundle.metadata.name.clone(),
        topo_bias: None,
        future_horizons: None,
    }
}

/// Hourly and daily digests for display, derived from the forecast list
fn build_digest(forecast: &[ForecastEntry]) -> ForecastDigest {
    let hourly = forecast
        .iter()
        .take(HOURLY_DIGEST_STEPS)
        .map(|entry| HourlyDigest {
            time: entry.timestamp.format("%H:%M").to_string(),
            temp: entry.temp_c.round() as i32,
            precip: (entry.pop * 100.0).round() as i32,
            wind: kph(entry.wind_speed_ms),
            description: entry.description.clone(),
        })
        .collect();

    let mut daily = Vec::new();
    let mut seen_days = std::collections::HashSet::new();
    for entry in forecast {
        let day = entry.timestamp.format("%a").to_string();
        if seen_days.insert(day.clone()) {
            daily.push(DailyDigest {
                day,
                high: entry.temp_max_c.round() as i32,
                low: entry.temp_min_c.round() as i32,
                icon: entry.condition.clone(),
            });
            if daily.len() >= DAILY_DIGEST_DAYS {
                break;
            }
        }
    }

    ForecastDigest { hourly, daily }
}

fn kph(wind_speed_ms: f64) -> i32 {
    (wind_speed_ms * 3.6).round() as i32
}

fn round_to(value: f64, digits: u32) -> f64 {
    let factor = 10f64.powi(digits as i32);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn entry(hours: i64, temp_c: f64) -> ForecastEntry {
        ForecastEntry {
            timestamp: Utc.timestamp_opt(1_700_000_000 + hours * 3600, 0).unwrap(),
            temp_c,
            temp_min_c: temp_c - 2.0,
            temp_max_c: temp_c + 2.0,
            pop: 0.4,
            wind_speed_ms: 5.0,
            condition: "Clouds".to_string(),
            description: "scattered clouds".to_string(),
        }
    }

    #[test]
    fn test_digest_limits() {
        let forecast: Vec<ForecastEntry> = (0..40).map(|i| entry(i * 3, 20.0)).collect();
        let digest = build_digest(&forecast);
        assert_eq!(digest.hourly.len(), HOURLY_DIGEST_STEPS);
        assert!(digest.daily.len() <= DAILY_DIGEST_DAYS);
        // One digest row per distinct weekday
        let mut days: Vec<&str> = digest.daily.iter().map(|d| d.day.as_str()).collect();
        days.dedup();
        assert_eq!(days.len(), digest.daily.len());
    }

    #[test]
    fn test_digest_of_empty_forecast_is_empty() {
        let digest = build_digest(&[]);
        assert!(digest.hourly.is_empty());
        assert!(digest.daily.is_empty());
    }

    #[test]
    fn test_wind_conversion_rounds() {
        assert_eq!(kph(5.0), 18);
        assert_eq!(kph(0.0), 0);
        assert_eq!(kph(4.17), 15);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(1.23456, 2), 1.23);
        assert_eq!(round_to(1.23556, 3), 1.236);
    }
}
