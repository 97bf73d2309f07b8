//! Grid mesh models

use serde::{Deserialize, Serialize};

/// One fixed cell in the serviced region's prediction mesh.
///
/// The grid file is produced by an external generator and is read-only to
/// the serving layer: points are only ever filtered, never mutated.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GridPoint {
    pub lat: f64,
    pub lon: f64,
}
