//! Persisted grid artifacts
//!
//! Three flat files: the read-only grid-point mesh from the external
//! generator, the latest-grid snapshot overwritten by each pipeline run,
//! and the append-only CSV history. The snapshot is replaced atomically
//! (temp file + rename) so concurrent readers never see a partial file.

use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;
use shared::{GridPoint, GridRecord, PredictionRecord};

use crate::error::{AppError, AppResult};

/// Load the grid-point mesh
pub fn load_grid_points(path: &Path) -> AppResult<Vec<GridPoint>> {
    if !path.exists() {
        return Err(AppError::GridArtifactMissing(path.display().to_string()));
    }
    let file = File::open(path)?;
    serde_json::from_reader(BufReader::new(file))
        .map_err(|e| AppError::Artifact(format!("{}: {}", path.display(), e)))
}

/// Load the latest grid snapshot
pub fn load_latest_grid(path: &Path) -> AppResult<Vec<GridRecord>> {
    if !path.exists() {
        return Err(AppError::GridArtifactMissing(path.display().to_string()));
    }
    let file = File::open(path)?;
    serde_json::from_reader(BufReader::new(file))
        .map_err(|e| AppError::Artifact(format!("{}: {}", path.display(), e)))
}

/// Replace the latest grid snapshot atomically
pub fn write_latest_grid(path: &Path, records: &[GridRecord]) -> AppResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    // Temp file in the same directory so the rename stays on one filesystem
    let tmp_path = path.with_extension("json.tmp");
    {
        let file = File::create(&tmp_path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, records)
            .map_err(|e| AppError::Artifact(format!("{}: {}", tmp_path.display(), e)))?;
        writer.flush()?;
    }
    fs::rename(&tmp_path, path)?;
    Ok(())
}

#[derive(Serialize)]
struct HistoryRow<'a> {
    timestamp: DateTime<Utc>,
    lat: f64,
    lon: f64,
    predicted_rainfall_mm: f64,
    flood_probability: f64,
    flood_risk: &'a str,
}

/// Append one prediction to the CSV history, writing the header when the
/// file is first created
pub fn append_history(
    path: &Path,
    timestamp: DateTime<Utc>,
    point: &GridPoint,
    prediction: &PredictionRecord,
) -> AppResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let write_header = !path.exists();
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(write_header)
        .from_writer(file);

    writer
        .serialize(HistoryRow {
            timestamp,
            lat: point.lat,
            lon: point.lon,
            predicted_rainfall_mm: prediction.predicted_rainfall_mm,
            flood_probability: prediction.flood_probability,
            flood_risk: prediction.flood_risk.as_str(),
        })
        .map_err(|e| AppError::Artifact(format!("{}: {}", path.display(), e)))?;
    writer
        .flush()
        .map_err(|e| AppError::Artifact(format!("{}: {}", path.display(), e)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::RiskTier;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("fps-grid-store-{}-{}", std::process::id(), name))
    }

    fn sample_prediction() -> PredictionRecord {
        PredictionRecord {
            predicted_rainfall_mm: 3.2,
            flood_probability: 0.07,
            flood_risk: RiskTier::Low,
            recommended_action: "Monitor".to_string(),
            model_name: "RF".to_string(),
            topo_bias: None,
            future_horizons: None,
        }
    }

    #[test]
    fn test_missing_grid_points_is_a_404() {
        let err = load_grid_points(Path::new("/nonexistent/grid.json")).unwrap_err();
        assert!(matches!(err, AppError::GridArtifactMissing(_)));
    }

    #[test]
    fn test_snapshot_roundtrip_via_rename() {
        let path = temp_path("snapshot.json");
        let record = GridRecord {
            lat: 35.25,
            lon: 33.30,
            location_name: "Kyrenia".to_string(),
            weather_summary: "clear sky".to_string(),
            temp_c: 22.0,
            prediction: sample_prediction(),
            flood_risk: RiskTier::Low,
            flood_probability: 0.07,
            predicted_rainfall_mm: 3.2,
            timestamp: Utc::now(),
        };

        write_latest_grid(&path, &[record]).unwrap();
        // No temp file is left behind after the rename
        assert!(!path.with_extension("json.tmp").exists());

        let loaded = load_latest_grid(&path).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].location_name, "Kyrenia");
        assert_eq!(loaded[0].flood_risk, RiskTier::Low);

        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_history_header_written_once() {
        let path = temp_path("history.csv");
        fs::remove_file(&path).ok();

        let point = GridPoint {
            lat: 35.25,
            lon: 33.30,
        };
        let prediction = sample_prediction();
        append_history(&path, Utc::now(), &point, &prediction).unwrap();
        append_history(&path, Utc::now(), &point, &prediction).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("timestamp,lat,lon"));
        assert!(lines[1].contains("Low"));

        fs::remove_file(&path).ok();
    }
}
