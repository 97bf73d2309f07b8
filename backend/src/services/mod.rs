//! Business logic services for the Flood Prediction Service

pub mod features;
pub mod grid_store;
pub mod jobs;
pub mod pipeline;
pub mod prediction;
pub mod registry;
pub mod risk;
pub mod spatial;
pub mod weather_cache;

pub use jobs::RefreshRunner;
pub use pipeline::GridRefreshPipeline;
pub use prediction::PredictionService;
pub use registry::ModelRegistry;
pub use weather_cache::WeatherCache;
