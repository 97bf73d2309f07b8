//! Validation utilities for the Flood Prediction Service

/// Validate a latitude in decimal degrees
pub fn validate_latitude(lat: f64) -> Result<(), &'static str> {
    if !lat.is_finite() {
        return Err("Latitude must be a finite number");
    }
    if !(-90.0..=90.0).contains(&lat) {
        return Err("Latitude out of valid range (-90 to 90)");
    }
    Ok(())
}

/// Validate a longitude in decimal degrees
pub fn validate_longitude(lon: f64) -> Result<(), &'static str> {
    if !lon.is_finite() {
        return Err("Longitude must be a finite number");
    }
    if !(-180.0..=180.0).contains(&lon) {
        return Err("Longitude out of valid range (-180 to 180)");
    }
    Ok(())
}

/// Validate a coordinate pair
pub fn validate_coordinates(lat: f64, lon: f64) -> Result<(), &'static str> {
    validate_latitude(lat)?;
    validate_longitude(lon)
}

/// Validate that a raw feature vector contains only finite values
pub fn validate_features(features: &[f64]) -> Result<(), &'static str> {
    if features.is_empty() {
        return Err("Feature vector must not be empty");
    }
    if features.iter().any(|v| !v.is_finite()) {
        return Err("Feature vector contains non-finite values");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latitude_bounds() {
        assert!(validate_latitude(35.33).is_ok());
        assert!(validate_latitude(-90.0).is_ok());
        assert!(validate_latitude(90.0).is_ok());
        assert!(validate_latitude(90.1).is_err());
        assert!(validate_latitude(f64::NAN).is_err());
    }

    #[test]
    fn test_longitude_bounds() {
        assert!(validate_longitude(33.35).is_ok());
        assert!(validate_longitude(-180.0).is_ok());
        assert!(validate_longitude(180.0).is_ok());
        assert!(validate_longitude(180.5).is_err());
        assert!(validate_longitude(f64::INFINITY).is_err());
    }

    #[test]
    fn test_feature_vector_contents() {
        assert!(validate_features(&[0.0, 1.5, 25.0]).is_ok());
        assert!(validate_features(&[]).is_err());
        assert!(validate_features(&[0.0, f64::NAN]).is_err());
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_in_range_coordinates_validate(
            lat in -90.0f64..=90.0,
            lon in -180.0f64..=180.0,
        ) {
            prop_assert!(validate_coordinates(lat, lon).is_ok());
        }

        #[test]
        fn prop_out_of_range_latitude_rejected(offset in 0.0001f64..=1000.0) {
            prop_assert!(validate_latitude(90.0 + offset).is_err());
            prop_assert!(validate_latitude(-90.0 - offset).is_err());
        }

        #[test]
        fn prop_finite_vectors_validate(values in proptest::collection::vec(-1e6f64..=1e6, 1..64)) {
            prop_assert!(validate_features(&values).is_ok());
        }
    }
}
