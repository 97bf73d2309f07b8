//! Model registry integration tests
//!
//! Exercises artifact loading from disk: complete pairs load, partial or
//! malformed pairs are dropped without failing startup, and an empty
//! registry still constructs.

use std::fs;
use std::path::PathBuf;

use serde_json::{json, Value};

use fps_backend::services::ModelRegistry;

const FEATURE_NAMES: [&str; 10] = [
    "tp_lag1",
    "tp_lag2",
    "tp_lag3",
    "tp_lag4",
    "tp_lag5",
    "tp_lag6",
    "tp_lag7",
    "tp_3d_sum",
    "tp_7d_sum",
    "t2m_7d_mean",
];

fn temp_models_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("fps-registry-{}-{}", std::process::id(), name));
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn linear_artifact(name: &str, task: &str, feature_count: usize) -> Value {
    json!({
        "metadata": {"name": name, "task": task, "version": "2024.1"},
        "features": &FEATURE_NAMES[..feature_count],
        "scaler": {
            "mean": vec![0.5; feature_count],
            "scale": vec![1.5; feature_count]
        },
        "model": {
            "kind": "linear",
            "coefficients": vec![0.2; feature_count],
            "intercept": 0.1
        }
    })
}

fn tree_artifact(name: &str, task: &str) -> Value {
    json!({
        "metadata": {"name": name, "task": task, "version": "2024.1"},
        "features": FEATURE_NAMES,
        "model": {
            "kind": "tree_ensemble",
            "aggregation": "sum",
            "base_score": -1.0,
            "trees": [{
                "nodes": [
                    {"feature": 9, "threshold": 20.0, "left": 1, "right": 2},
                    {"value": -0.5},
                    {"value": 0.8}
                ]
            }]
        }
    })
}

fn write(dir: &PathBuf, file: &str, artifact: &Value) {
    fs::write(dir.join(file), serde_json::to_string_pretty(artifact).unwrap()).unwrap();
}

#[test]
fn test_complete_pairs_load() {
    let dir = temp_models_dir("complete");
    write(&dir, "rf_regressor.json", &linear_artifact("RF", "regression", 10));
    write(&dir, "rf_classifier.json", &linear_artifact("RF", "classification", 10));
    write(&dir, "xgb_regressor.json", &tree_artifact("XGB", "regression"));
    write(&dir, "xgb_classifier.json", &tree_artifact("XGB", "classification"));

    let registry = ModelRegistry::load(
        &dir,
        &["rf".to_string(), "xgb".to_string(), "hybrid".to_string()],
        "rf",
    );

    assert_eq!(registry.len(), 2);
    assert_eq!(registry.model_types(), vec!["rf", "xgb"]);

    let bundle = registry.get("rf").unwrap();
    assert_eq!(bundle.feature_count, 10);
    assert_eq!(bundle.metadata.name, "RF");
    assert!(bundle.classifier.is_some());
    assert!(bundle.scaler.is_some());

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_partial_pair_is_dropped() {
    let dir = temp_models_dir("partial");
    // Regressor without its classifier: the pair must be dropped, not loaded
    write(&dir, "xgb_regressor.json", &tree_artifact("XGB", "regression"));
    write(&dir, "rf_regressor.json", &linear_artifact("RF", "regression", 10));
    write(&dir, "rf_classifier.json", &linear_artifact("RF", "classification", 10));

    let registry = ModelRegistry::load(&dir, &["rf".to_string(), "xgb".to_string()], "rf");

    assert_eq!(registry.len(), 1);
    assert!(registry.get("xgb").is_none());
    assert!(registry.get("rf").is_some());

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_mismatched_schemas_are_dropped() {
    let dir = temp_models_dir("mismatch");
    write(&dir, "rf_regressor.json", &linear_artifact("RF", "regression", 10));
    // Classifier trained on a different feature count
    write(&dir, "rf_classifier.json", &linear_artifact("RF", "classification", 6));

    let registry = ModelRegistry::load(&dir, &["rf".to_string()], "rf");
    assert!(registry.is_empty());

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_malformed_json_is_dropped() {
    let dir = temp_models_dir("malformed");
    fs::write(dir.join("rf_regressor.json"), "{not json").unwrap();
    write(&dir, "rf_classifier.json", &linear_artifact("RF", "classification", 10));

    let registry = ModelRegistry::load(&dir, &["rf".to_string()], "rf");
    assert!(registry.is_empty());

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_empty_directory_yields_empty_registry() {
    let dir = temp_models_dir("empty");
    let registry = ModelRegistry::load(&dir, &["rf".to_string(), "xgb".to_string()], "rf");

    assert!(registry.is_empty());
    assert!(registry.resolve(None).is_err());

    fs::remove_dir_all(&dir).ok();
}
