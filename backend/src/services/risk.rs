//! Flood risk classification policy
//!
//! The probability thresholds here are the single source of truth; every
//! prediction path goes through [`classify`] so the tiers can never drift
//! between the live, batch and fallback paths.

use shared::RiskTier;

/// Map a flood probability to a risk tier and recommended action.
///
/// Low (< 0.10), Moderate (0.10 to 0.30 inclusive), High (> 0.30).
pub fn classify(probability: f64) -> (RiskTier, &'static str) {
    let tier = if probability < 0.10 {
        RiskTier::Low
    } else if probability <= 0.30 {
        RiskTier::Moderate
    } else {
        RiskTier::High
    };
    (tier, action_for(tier))
}

/// Recommended action for a risk tier
pub fn action_for(tier: RiskTier) -> &'static str {
    match tier {
        RiskTier::Low => "Monitor",
        RiskTier::Moderate => "Prepare",
        RiskTier::High => "Evacuate / Alert",
    }
}

/// Rainfall-only classification for bundles without a trained classifier.
///
/// Produces a probability proxy (`mm / 40`, clamped to [0, 1]) and a tier
/// from rainfall thresholds: 25 mm and up is High, 10 mm and up Moderate.
pub fn classify_by_rainfall(rainfall_mm: f64) -> (f64, RiskTier) {
    let probability = (rainfall_mm / 40.0).clamp(0.0, 1.0);
    let tier = if rainfall_mm >= 25.0 {
        RiskTier::High
    } else if rainfall_mm >= 10.0 {
        RiskTier::Moderate
    } else {
        RiskTier::Low
    };
    (probability, tier)
}
