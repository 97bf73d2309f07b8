//! Weather API client for fetching weather data
//!
//! Integrates with OpenWeatherMap for current conditions and the
//! 3-hour-stepped forecast. Every call carries a hard timeout independent
//! of client cancellation.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Weather API client
#[derive(Clone)]
pub struct WeatherClient {
    client: Client,
    api_key: String,
    base_url: String,
}

/// Current weather conditions at a location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub observed_at: DateTime<Utc>,
    pub temp_c: f64,
    pub humidity_percent: i32,
    pub wind_speed_ms: f64,
    /// Coarse condition group, e.g. "Rain", "Clouds"
    pub condition: String,
    pub description: String,
    /// Resolved location name; empty when the upstream knows none
    pub location_name: String,
}

/// One 3-hour step of the forecast list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastEntry {
    pub timestamp: DateTime<Utc>,
    pub temp_c: f64,
    pub temp_min_c: f64,
    pub temp_max_c: f64,
    /// Probability of precipitation (0-1)
    pub pop: f64,
    pub wind_speed_ms: f64,
    pub condition: String,
    pub description: String,
}

/// OpenWeatherMap API response for current weather
#[derive(Debug, Deserialize)]
struct OwmCurrentResponse {
    weather: Vec<OwmWeather>,
    main: OwmMain,
    wind: OwmWind,
    dt: i64,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct OwmWeather {
    main: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwmMain {
    temp: f64,
    #[serde(default)]
    temp_min: f64,
    #[serde(default)]
    temp_max: f64,
    #[serde(default)]
    humidity: i32,
}

#[derive(Debug, Deserialize)]
struct OwmWind {
    speed: f64,
}

/// OpenWeatherMap API response for the 3-hourly forecast
#[derive(Debug, Deserialize)]
struct OwmForecastResponse {
    list: Vec<OwmForecastItem>,
}

#[derive(Debug, Deserialize)]
struct OwmForecastItem {
    dt: i64,
    main: OwmMain,
    weather: Vec<OwmWeather>,
    wind: OwmWind,
    #[serde(default)]
    pop: f64,
}

impl WeatherClient {
    /// Create a new WeatherClient
    pub fn new(api_key: String, base_url: String, timeout: Duration) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Configuration(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            base_url,
        })
    }

    /// Fetch current weather conditions by GPS coordinates
    pub async fn get_current(&self, lat: f64, lon: f64) -> AppResult<CurrentConditions> {
        let url = format!(
            "{}/weather?lat={}&lon={}&appid={}&units=metric",
            self.base_url, lat, lon, self.api_key
        );

        let data: OwmCurrentResponse = self.fetch_json(&url).await?;
        Ok(convert_current_response(data))
    }

    /// Fetch the 3-hourly forecast list by GPS coordinates
    pub async fn get_forecast(&self, lat: f64, lon: f64) -> AppResult<Vec<ForecastEntry>> {
        let url = format!(
            "{}/forecast?lat={}&lon={}&appid={}&units=metric",
            self.base_url, lat, lon, self.api_key
        );

        let data: OwmForecastResponse = self.fetch_json(&url).await?;
        Ok(convert_forecast_response(data))
    }

    async fn fetch_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> AppResult<T> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::UpstreamWeather(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::UpstreamWeather(format!(
                "status {}: {}",
                status, body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::UpstreamWeather(format!("malformed body: {}", e)))
    }
}

/// Convert an OpenWeatherMap current response to our format
fn convert_current_response(data: OwmCurrentResponse) -> CurrentConditions {
    let weather = data.weather.first();

    CurrentConditions {
        observed_at: DateTime::from_timestamp(data.dt, 0).unwrap_or_else(Utc::now),
        temp_c: data.main.temp,
        humidity_percent: data.main.humidity,
        wind_speed_ms: data.wind.speed,
        condition: weather.map(|w| w.main.clone()).unwrap_or_default(),
        description: weather.map(|w| w.description.clone()).unwrap_or_default(),
        location_name: data.name,
    }
}

/// Convert an OpenWeatherMap forecast response to our format
fn convert_forecast_response(data: OwmForecastResponse) -> Vec<ForecastEntry> {
    data.list
        .into_iter()
        .map(|item| {
            let weather = item.weather.first();
            ForecastEntry {
                timestamp: DateTime::from_timestamp(item.dt, 0).unwrap_or_else(Utc::now),
                temp_c: item.main.temp,
                temp_min_c: item.main.temp_min,
                temp_max_c: item.main.temp_max,
                pop: item.pop,
                wind_speed_ms: item.wind.speed,
                condition: weather.map(|w| w.main.clone()).unwrap_or_default(),
                description: weather.map(|w| w.description.clone()).unwrap_or_default(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_response_conversion() {
        let raw = r#"{
            "weather": [{"main": "Rain", "description": "light rain"}],
            "main": {"temp": 18.4, "temp_min": 17.0, "temp_max": 19.2, "humidity": 82},
            "wind": {"speed": 4.1},
            "dt": 1700000000,
            "name": "Kyrenia"
        }"#;
        let parsed: OwmCurrentResponse = serde_json::from_str(raw).unwrap();
        let current = convert_current_response(parsed);

        assert_eq!(current.temp_c, 18.4);
        assert_eq!(current.humidity_percent, 82);
        assert_eq!(current.condition, "Rain");
        assert_eq!(current.location_name, "Kyrenia");
    }

    #[test]
    fn test_forecast_missing_pop_defaults_to_zero() {
        let raw = r#"{
            "list": [{
                "dt": 1700000000,
                "main": {"temp": 20.0, "temp_min": 18.0, "temp_max": 22.0},
                "weather": [{"main": "Clouds", "description": "few clouds"}],
                "wind": {"speed": 2.0}
            }]
        }"#;
        let parsed: OwmForecastResponse = serde_json::from_str(raw).unwrap();
        let entries = convert_forecast_response(parsed);

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].pop, 0.0);
        assert_eq!(entries[0].temp_max_c, 22.0);
    }

    #[test]
    fn test_missing_location_name_is_empty() {
        let raw = r#"{
            "weather": [],
            "main": {"temp": 25.0},
            "wind": {"speed": 0.0},
            "dt": 1700000000
        }"#;
        let parsed: OwmCurrentResponse = serde_json::from_str(raw).unwrap();
        let current = convert_current_response(parsed);

        assert!(current.location_name.is_empty());
        assert!(current.condition.is_empty());
    }
}
