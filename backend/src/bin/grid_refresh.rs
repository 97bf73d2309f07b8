//! Grid-refresh pipeline entry point
//!
//! Runs as its own process, launched by `POST /grid/refresh` or a scheduler.
//! Walks the persisted grid mesh once and rewrites the latest-grid snapshot.
//! The model type comes from the `FLOOD_ML_MODEL` environment variable set
//! by the serving layer, falling back to the configured default.

use std::{path::Path, sync::Arc, time::Duration};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fps_backend::external::WeatherClient;
use fps_backend::services::{
    jobs, GridRefreshPipeline, ModelRegistry, PredictionService, WeatherCache,
};
use fps_backend::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "grid_refresh=info,fps_backend=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();
    let config = Arc::new(Config::load()?);

    let model_type = std::env::var(jobs::MODEL_ENV_VAR)
        .unwrap_or_else(|_| config.models.default_type.clone())
        .to_lowercase();

    let registry = Arc::new(ModelRegistry::load(
        Path::new(&config.models.dir),
        &config.models.types,
        &config.models.default_type,
    ));
    if registry.is_empty() {
        anyhow::bail!("no models loaded; cannot refresh the grid");
    }

    let client = WeatherClient::new(
        config.weather.api_key.clone(),
        config.weather.api_endpoint.clone(),
        Duration::from_secs(config.weather.timeout_secs),
    )?;
    let cache = Arc::new(WeatherCache::new(
        client.clone(),
        Duration::from_secs(config.weather.cache_ttl_secs),
    ));
    let service = PredictionService::new(Arc::clone(&registry), cache);

    let pipeline = GridRefreshPipeline::new(Arc::clone(&config), client, service, model_type);
    let summary = pipeline.run().await?;

    // Captured by the serving layer and surfaced in the refresh response
    println!(
        "Grid refresh complete: {} processed, {} skipped, {} failed",
        summary.processed, summary.skipped, summary.failed
    );

    Ok(())
}
