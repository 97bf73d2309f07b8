//! HTTP request handlers

pub mod grid;
pub mod health;
pub mod predict;

pub use grid::*;
pub use health::*;
pub use predict::*;
