//! Model registry: named model bundles loaded once at startup
//!
//! A model type is available only if both its regressor and classifier
//! artifacts exist and load; partial pairs are dropped with a warning. The
//! registry is read-only after startup and needs no synchronization.
//!
//! Artifacts are JSON files carrying the same logical fields the trainer
//! exports for each bundle: metadata, trained feature names, optional
//! scaler parameters, and the model payload itself (a linear model or a
//! node-array tree ensemble).

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use ndarray::{Array1, Array2, ArrayView1};
use serde::Deserialize;

use crate::error::{AppError, AppResult};

/// Bundle metadata written by the trainer
#[derive(Debug, Clone, Deserialize)]
pub struct ModelMetadata {
    pub name: String,
    #[serde(default)]
    pub task: String,
    #[serde(default)]
    pub version: String,
}

/// Standardization parameters (column means and scales)
#[derive(Debug, Clone, Deserialize)]
pub struct ScalerParams {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl ScalerParams {
    /// Standardize a feature matrix in place, column by column
    pub fn transform(&self, x: &mut Array2<f64>) {
        for mut row in x.rows_mut() {
            for (j, v) in row.iter_mut().enumerate() {
                *v = (*v - self.mean[j]) / self.scale[j];
            }
        }
    }
}

/// How a tree ensemble combines its member outputs
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    /// Bagged ensemble: the mean of member outputs is the prediction, and
    /// member leaves hold class fractions on the classification side
    Average,
    /// Boosted ensemble: member outputs are margins summed onto a base
    /// score; classification passes the sum through a sigmoid
    Sum,
}

/// One node of a decision tree in array form
#[derive(Debug, Clone, Deserialize)]
pub struct TreeNode {
    /// Split feature index; absent on leaves
    pub feature: Option<usize>,
    #[serde(default)]
    pub threshold: f64,
    #[serde(default)]
    pub left: usize,
    #[serde(default)]
    pub right: usize,
    #[serde(default)]
    pub value: f64,
}

/// A decision tree as a flat node array rooted at index 0
#[derive(Debug, Clone, Deserialize)]
pub struct Tree {
    pub nodes: Vec<TreeNode>,
}

impl Tree {
    fn eval(&self, row: ArrayView1<f64>) -> f64 {
        let mut idx = 0;
        loop {
            let node = &self.nodes[idx];
            match node.feature {
                None => return node.value,
                Some(f) => {
                    idx = if row[f] <= node.threshold {
                        node.left
                    } else {
                        node.right
                    };
                }
            }
        }
    }
}

/// Model payload of an artifact
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelSpec {
    Linear {
        coefficients: Vec<f64>,
        intercept: f64,
    },
    TreeEnsemble {
        trees: Vec<Tree>,
        aggregation: Aggregation,
        #[serde(default)]
        base_score: f64,
    },
}

impl ModelSpec {
    fn raw(&self, row: ArrayView1<f64>) -> f64 {
        match self {
            ModelSpec::Linear {
                coefficients,
                intercept,
            } => {
                coefficients
                    .iter()
                    .zip(row.iter())
                    .map(|(c, v)| c * v)
                    .sum::<f64>()
                    + intercept
            }
            ModelSpec::TreeEnsemble {
                trees,
                aggregation,
                base_score,
            } => {
                let sum: f64 = trees.iter().map(|t| t.eval(row.view())).sum();
                match aggregation {
                    Aggregation::Average => sum / trees.len() as f64,
                    Aggregation::Sum => base_score + sum,
                }
            }
        }
    }

    /// Regression prediction for every row of a (scaled) matrix
    pub fn predict_batch(&self, x: &Array2<f64>) -> Array1<f64> {
        let mut out = Array1::zeros(x.nrows());
        for (i, row) in x.rows().into_iter().enumerate() {
            out[i] = self.raw(row);
        }
        out
    }

    /// Positive-class probability for every row of a (scaled) matrix
    pub fn predict_proba_batch(&self, x: &Array2<f64>) -> Array1<f64> {
        let mut out = Array1::zeros(x.nrows());
        for (i, row) in x.rows().into_iter().enumerate() {
            let raw = self.raw(row);
            out[i] = match self {
                ModelSpec::Linear { .. } => sigmoid(raw),
                ModelSpec::TreeEnsemble { aggregation, .. } => match aggregation {
                    Aggregation::Average => raw.clamp(0.0, 1.0),
                    Aggregation::Sum => sigmoid(raw),
                },
            };
        }
        out
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

/// One artifact file as written by the trainer
#[derive(Debug, Deserialize)]
pub struct ModelArtifact {
    pub metadata: ModelMetadata,
    pub features: Vec<String>,
    #[serde(default)]
    pub scaler: Option<ScalerParams>,
    pub model: ModelSpec,
}

/// A regressor/classifier pair with its shared scaler. Immutable after load.
#[derive(Debug, Clone)]
pub struct ModelBundle {
    pub regressor: ModelSpec,
    pub classifier: Option<ModelSpec>,
    pub scaler: Option<ScalerParams>,
    pub feature_count: usize,
    pub metadata: ModelMetadata,
}

impl ModelBundle {
    /// Hard error on any feature-length mismatch; vectors are never
    /// truncated or padded
    pub fn check_features(&self, actual: usize) -> AppResult<()> {
        if actual != self.feature_count {
            return Err(AppError::FeatureShapeMismatch {
                expected: self.feature_count,
                actual,
            });
        }
        Ok(())
    }

    /// Standardize a matrix in place when a scaler is attached
    pub fn scale(&self, x: &mut Array2<f64>) {
        if let Some(scaler) = &self.scaler {
            scaler.transform(x);
        }
    }
}

/// Registry of loaded model bundles, keyed by model-type identifier
pub struct ModelRegistry {
    bundles: HashMap<String, Arc<ModelBundle>>,
    default_type: String,
}

impl ModelRegistry {
    /// Load every configured model pair from the artifact directory.
    ///
    /// Missing or unloadable pairs are skipped with a warning; an empty
    /// registry still constructs and fails each prediction request instead
    /// of the whole process.
    pub fn load(dir: &Path, types: &[String], default_type: &str) -> Self {
        let mut bundles = HashMap::new();

        for model_type in types {
            let reg_path = dir.join(format!("{}_regressor.json", model_type));
            let clf_path = dir.join(format!("{}_classifier.json", model_type));

            if !reg_path.exists() || !clf_path.exists() {
                tracing::warn!(%model_type, "model artifact pair not found, skipping");
                continue;
            }

            match load_pair(&reg_path, &clf_path) {
                Ok(bundle) => {
                    tracing::info!(%model_type, model = %bundle.metadata.name, "loaded model pair");
                    bundles.insert(model_type.to_lowercase(), Arc::new(bundle));
                }
                Err(e) => {
                    tracing::warn!(%model_type, error = %e, "failed to load model pair, skipping");
                }
            }
        }

        if bundles.is_empty() {
            tracing::error!("no models loaded; every prediction request will fail");
        }

        Self {
            bundles,
            default_type: default_type.to_lowercase(),
        }
    }

    /// Build a registry from pre-constructed bundles
    pub fn with_bundles(pairs: Vec<(String, ModelBundle)>, default_type: &str) -> Self {
        let bundles = pairs
            .into_iter()
            .map(|(t, b)| (t.to_lowercase(), Arc::new(b)))
            .collect();
        Self {
            bundles,
            default_type: default_type.to_lowercase(),
        }
    }

    pub fn get(&self, model_type: &str) -> Option<Arc<ModelBundle>> {
        self.bundles.get(&model_type.to_lowercase()).cloned()
    }

    /// Resolve a requested model type, falling back to the default type.
    /// Fails loudly when not even the default is loaded.
    pub fn resolve(&self, requested: Option<&str>) -> AppResult<Arc<ModelBundle>> {
        if let Some(model_type) = requested {
            if let Some(bundle) = self.get(model_type) {
                return Ok(bundle);
            }
        }
        self.get(&self.default_type).ok_or_else(|| {
            AppError::ModelUnavailable(
                requested.unwrap_or(self.default_type.as_str()).to_string(),
            )
        })
    }

    pub fn is_empty(&self) -> bool {
        self.bundles.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bundles.len()
    }

    /// Loaded model-type identifiers, sorted for stable output
    pub fn model_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.bundles.keys().cloned().collect();
        types.sort();
        types
    }
}

fn load_pair(reg_path: &Path, clf_path: &Path) -> AppResult<ModelBundle> {
    let regressor = read_artifact(reg_path)?;
    let classifier = read_artifact(clf_path)?;

    let feature_count = regressor.features.len();
    if feature_count == 0 {
        return Err(AppError::Artifact(format!(
            "{}: empty feature schema",
            reg_path.display()
        )));
    }
    if classifier.features.len() != feature_count {
        return Err(AppError::Artifact(format!(
            "regressor and classifier feature schemas differ ({} vs {})",
            feature_count,
            classifier.features.len()
        )));
    }

    if let Some(scaler) = &regressor.scaler {
        validate_scaler(scaler, feature_count, reg_path)?;
    }
    validate_model(&regressor.model, feature_count, reg_path)?;
    validate_model(&classifier.model, feature_count, clf_path)?;

    // The trainer writes the shared scaler and bundle metadata into the
    // regressor artifact
    Ok(ModelBundle {
        regressor: regressor.model,
        classifier: Some(classifier.model),
        scaler: regressor.scaler,
        feature_count,
        metadata: regressor.metadata,
    })
}

fn read_artifact(path: &Path) -> AppResult<ModelArtifact> {
    let file = File::open(path)?;
    serde_json::from_reader(BufReader::new(file))
        .map_err(|e| AppError::Artifact(format!("{}: {}", path.display(), e)))
}

fn validate_scaler(scaler: &ScalerParams, feature_count: usize, path: &Path) -> AppResult<()> {
    if scaler.mean.len() != feature_count || scaler.scale.len() != feature_count {
        return Err(AppError::Artifact(format!(
            "{}: scaler shape does not match feature schema",
            path.display()
        )));
    }
    if scaler.scale.iter().any(|s| !s.is_finite() || *s == 0.0) {
        return Err(AppError::Artifact(format!(
            "{}: scaler contains zero or non-finite scale entries",
            path.display()
        )));
    }
    Ok(())
}

/// Structural validation so evaluation cannot index out of bounds or loop:
/// child links must point forward, and split features must exist in the
/// trained schema.
fn validate_model(model: &ModelSpec, feature_count: usize, path: &Path) -> AppResult<()> {
    match model {
        ModelSpec::Linear { coefficients, .. } => {
            if coefficients.len() != feature_count {
                return Err(AppError::Artifact(format!(
                    "{}: coefficient count does not match feature schema",
                    path.display()
                )));
            }
        }
        ModelSpec::TreeEnsemble { trees, .. } => {
            if trees.is_empty() {
                return Err(AppError::Artifact(format!(
                    "{}: ensemble has no trees",
                    path.display()
                )));
            }
            for tree in trees {
                if tree.nodes.is_empty() {
                    return Err(AppError::Artifact(format!(
                        "{}: tree has no nodes",
                        path.display()
                    )));
                }
                for (idx, node) in tree.nodes.iter().enumerate() {
                    if let Some(feature) = node.feature {
                        if feature >= feature_count {
                            return Err(AppError::Artifact(format!(
                                "{}: split on unknown feature index {}",
                                path.display(),
                                feature
                            )));
                        }
                        if node.left <= idx
                            || node.right <= idx
                            || node.left >= tree.nodes.len()
                            || node.right >= tree.nodes.len()
                        {
                            return Err(AppError::Artifact(format!(
                                "{}: malformed tree links at node {}",
                                path.display(),
                                idx
                            )));
                        }
                    }
                }
            }
        }
    }
    Ok(())
}
