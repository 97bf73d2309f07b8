//! Domain models for the Flood Prediction Service

pub mod grid;
pub mod prediction;
pub mod weather;

pub use grid::*;
pub use prediction::*;
pub use weather::*;
