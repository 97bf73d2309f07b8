//! Flood Prediction Service - Backend Server
//!
//! Serves point flood-risk predictions and the pre-computed spatial grid,
//! backed by the model registry and the time-bounded weather cache.

use std::{net::SocketAddr, path::Path, path::PathBuf, sync::Arc, time::Duration};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fps_backend::external::WeatherClient;
use fps_backend::services::{ModelRegistry, PredictionService, RefreshRunner, WeatherCache};
use fps_backend::{create_app, AppState, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fps_server=debug,fps_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::load()?;

    tracing::info!("Starting Flood Prediction Server");
    tracing::info!("Environment: {}", config.environment);

    // Load model bundles; an empty registry still serves, failing each
    // prediction request instead of the whole process
    let registry = Arc::new(ModelRegistry::load(
        Path::new(&config.models.dir),
        &config.models.types,
        &config.models.default_type,
    ));
    tracing::info!("Loaded {} model pair(s)", registry.len());

    let client = WeatherClient::new(
        config.weather.api_key.clone(),
        config.weather.api_endpoint.clone(),
        Duration::from_secs(config.weather.timeout_secs),
    )?;
    let cache = Arc::new(WeatherCache::new(
        client,
        Duration::from_secs(config.weather.cache_ttl_secs),
    ));

    let prediction = PredictionService::new(Arc::clone(&registry), cache);
    let refresh = Arc::new(RefreshRunner::new(
        config.pipeline.command.clone().map(PathBuf::from),
    ));

    // Create application state
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let state = AppState {
        config: Arc::new(config),
        registry,
        prediction,
        refresh,
    };

    // Build application and start server
    let app = create_app(state);
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
