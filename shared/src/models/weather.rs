//! Display-facing weather digest models

use serde::{Deserialize, Serialize};

/// One 3-hour step of the hourly forecast digest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HourlyDigest {
    /// Local wall-clock label, e.g. "14:00"
    pub time: String,
    /// Temperature in whole degrees Celsius
    pub temp: i32,
    /// Precipitation probability as a percentage
    pub precip: i32,
    /// Wind speed in km/h
    pub wind: i32,
    pub description: String,
}

/// One day of the daily forecast digest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyDigest {
    /// Weekday label, e.g. "Mon"
    pub day: String,
    pub high: i32,
    pub low: i32,
    /// Coarse condition group, e.g. "Rain", "Clouds"
    pub icon: String,
}

/// Hourly and daily digests bundled for display
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ForecastDigest {
    pub hourly: Vec<HourlyDigest>,
    pub daily: Vec<DailyDigest>,
}
