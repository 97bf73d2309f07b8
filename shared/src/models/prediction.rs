//! Prediction output models

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::weather::ForecastDigest;
use crate::types::RiskTier;

/// A single model prediction for one feature vector
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub predicted_rainfall_mm: f64,
    pub flood_probability: f64,
    pub flood_risk: RiskTier,
    pub recommended_action: String,
    pub model_name: String,
    /// Location-derived bias surfaced as an explainability signal
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topo_bias: Option<f64>,
    /// Secondary predictions at fixed future offsets, keyed "24h"/"48h"/"72h"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub future_horizons: Option<BTreeMap<String, HorizonPrediction>>,
}

/// A prediction computed from forecast data at a fixed future offset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HorizonPrediction {
    /// Forecast valid-time label, e.g. "Tue 14:00"
    pub time: String,
    pub temp: i32,
    pub rainfall_mm: f64,
    pub probability: f64,
    pub risk: RiskTier,
}

/// Resolved location echoed back with a location prediction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedLocation {
    pub lat: f64,
    pub lon: f64,
    pub name: String,
}

/// Full response payload for a location prediction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationPrediction {
    pub location: ResolvedLocation,
    pub weather_summary: String,
    pub temp_c: i32,
    pub humidity: i32,
    pub wind_kph: i32,
    pub precipitation_prob: i32,
    pub forecast: ForecastDigest,
    pub prediction: PredictionRecord,
    /// True when upstream weather was unavailable and the prediction was
    /// computed from the synthetic fallback snapshot
    pub degraded: bool,
}

/// One row of the persisted "latest grid" snapshot.
///
/// Risk fields are duplicated at the top level alongside the nested
/// prediction because downstream display collaborators read them flat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridRecord {
    pub lat: f64,
    pub lon: f64,
    pub location_name: String,
    pub weather_summary: String,
    pub temp_c: f64,
    pub prediction: PredictionRecord,
    pub flood_risk: RiskTier,
    pub flood_probability: f64,
    pub predicted_rainfall_mm: f64,
    pub timestamp: DateTime<Utc>,
}
