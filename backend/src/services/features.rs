//! Feature reconstruction for locations without historical rainfall context
//!
//! The trained schema is 10 features: seven rainfall lags, two rolling sums
//! and the 7-day mean temperature. Live requests have none of the historical
//! values, so the lag slots are filled from a deterministic location-derived
//! proxy and the observed temperature takes the final slot. The same
//! function serves the per-point and batch paths; divergence between them is
//! a correctness bug.

/// Trained feature count
pub const FEATURE_COUNT: usize = 10;

/// Number of lag/rolling slots preceding the temperature feature
pub const LAG_SLOTS: usize = FEATURE_COUNT - 1;

/// Temperature used when no observation is available
pub const DEFAULT_TEMP_C: f64 = 25.0;

/// Deterministic location-derived bias standing in for historical rainfall
/// context. Two sinusoids in orthogonal directions, scaled to the rough
/// magnitude of a daily rainfall lag.
pub fn topo_bias(lat: f64, lon: f64) -> f64 {
    (lat * 60.0).sin() * (lon * 40.0).cos() * 3.0
}

/// Reconstruct the feature vector for a location and observed temperature.
///
/// Returns the vector plus the raw bias value, which surfaces to clients as
/// an explainability signal and is not used downstream.
pub fn reconstruct(lat: f64, lon: f64, temp_c: f64) -> (Vec<f64>, f64) {
    let bias = topo_bias(lat, lon);
    let moisture = (0.4 + bias).max(0.0);

    let mut features = vec![moisture; LAG_SLOTS];
    features.push(temp_c);
    (features, bias)
}

/// Degraded feature mode: constant zero lags plus the observed temperature.
///
/// Used by the grid-refresh pipeline, which carries no location context
/// beyond the point itself. Kept separate from [`reconstruct`] so tests can
/// tell live-data predictions from degraded ones.
pub fn zero_lag(temp_c: f64) -> Vec<f64> {
    let mut features = vec![0.0; LAG_SLOTS];
    features.push(temp_c);
    features
}
