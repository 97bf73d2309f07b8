//! Configuration management for the Flood Prediction Service
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with FLOOD_ prefix

use config::{ConfigError, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Model artifact store configuration
    pub models: ModelsConfig,

    /// Upstream weather API configuration
    pub weather: WeatherConfig,

    /// Persisted grid artifact paths
    pub data: DataConfig,

    /// Grid-refresh pipeline configuration
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ModelsConfig {
    /// Directory holding model bundle artifacts
    pub dir: String,

    /// Model-type identifiers to load at startup
    pub types: Vec<String>,

    /// Model type used when a request names none (or an unknown one)
    pub default_type: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WeatherConfig {
    /// Weather API endpoint
    pub api_endpoint: String,

    /// Weather API key
    pub api_key: String,

    /// Hard per-call timeout for upstream requests, in seconds
    pub timeout_secs: u64,

    /// Snapshot expiry, in seconds
    pub cache_ttl_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DataConfig {
    /// Grid-point mesh produced by the external generator
    pub grid_points_file: String,

    /// Latest grid snapshot, overwritten by each pipeline run
    pub latest_grid_file: String,

    /// Append-only CSV history of point predictions
    pub history_file: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PipelineConfig {
    /// Fixed inter-request delay between upstream fetches, in milliseconds
    pub rate_limit_ms: u64,

    /// Override for the grid-refresh executable; defaults to the
    /// `grid-refresh` binary next to the server executable
    pub command: Option<String>,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("FLOOD_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 8000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("models.dir", "models")?
            .set_default("models.types", vec!["rf", "xgb", "hybrid"])?
            .set_default("models.default_type", "rf")?
            .set_default(
                "weather.api_endpoint",
                "https://api.openweathermap.org/data/2.5",
            )?
            .set_default("weather.api_key", "")?
            .set_default("weather.timeout_secs", 10)?
            .set_default("weather.cache_ttl_secs", 600)?
            .set_default("data.grid_points_file", "data/cyprus_grid_points.json")?
            .set_default("data.latest_grid_file", "data/latest_grid_predictions.json")?
            .set_default("data.history_file", "data/hourly_predictions.csv")?
            .set_default("pipeline.rate_limit_ms", 200)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (FLOOD_ prefix)
            .add_source(
                Environment::with_prefix("FLOOD")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            host: "0.0.0.0".to_string(),
        }
    }
}
