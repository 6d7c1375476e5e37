//! The frozen regression artifact and the inference engine around it

use crate::error::{ForecastError, Result};
use crate::future::{FeatureValue, FutureRow};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::info;

/// Canonical feature columns, in the exact order the artifact was fitted on
pub const FEATURE_COLUMNS: [&str; 20] = [
    "store",
    "year",
    "month",
    "day",
    "day_of_week",
    "week_of_year",
    "is_weekend",
    "promo",
    "competition_distance",
    "promo2",
    "store_type",
    "assortment",
    "state_holiday",
    "sales_lag_1",
    "sales_lag_2",
    "sales_lag_3",
    "sales_lag_4",
    "sales_lag_5",
    "sales_lag_6",
    "sales_lag_7",
];

/// Encoded value for a categorical level the artifact has never seen
pub const UNKNOWN_CATEGORY_LEVEL: f64 = -1.0;

/// A fitted regression pipeline produced by the offline training run:
/// ordered feature columns, linear weights, and the level encodings of the
/// categorical features
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionArtifact {
    /// Model name recorded by the training run
    pub model: String,
    /// Feature columns, in the order the model was fitted on
    pub feature_names: Vec<String>,
    /// Intercept term
    pub intercept: f64,
    /// One weight per feature column
    pub weights: Vec<f64>,
    /// Per-categorical-feature level encodings
    #[serde(default)]
    pub categories: HashMap<String, HashMap<String, f64>>,
}

/// Wraps the frozen artifact and produces per-row predictions
#[derive(Debug, Clone)]
pub struct ForecastEngine {
    artifact: RegressionArtifact,
}

impl ForecastEngine {
    /// Load the artifact from a JSON file, once per process lifetime
    pub fn from_artifact_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let artifact: RegressionArtifact = serde_json::from_reader(BufReader::new(file))?;

        info!(
            model = %artifact.model,
            features = artifact.feature_names.len(),
            "loaded regression artifact"
        );

        Self::from_artifact(artifact)
    }

    /// Wrap an already-deserialized artifact, validating its schema
    pub fn from_artifact(artifact: RegressionArtifact) -> Result<Self> {
        validate_schema(&artifact)?;
        Ok(Self { artifact })
    }

    /// The wrapped artifact
    pub fn artifact(&self) -> &RegressionArtifact {
        &self.artifact
    }

    /// Predict one value per input row, order-preserving.
    ///
    /// Predictions are not clamped; negative values are passed through for
    /// callers to handle downstream.
    pub fn predict(&self, rows: &[FutureRow]) -> Result<Vec<f64>> {
        rows.iter().map(|row| self.predict_row(row)).collect()
    }

    /// Predict and assign `predicted_sales` on every row
    pub fn fill_predictions(&self, rows: &mut [FutureRow]) -> Result<()> {
        let predictions = self.predict(rows)?;
        for (row, value) in rows.iter_mut().zip(predictions) {
            row.predicted_sales = Some(value);
        }
        Ok(())
    }

    fn predict_row(&self, row: &FutureRow) -> Result<f64> {
        let mut prediction = self.artifact.intercept;
        for (name, weight) in self.artifact.feature_names.iter().zip(&self.artifact.weights) {
            let value = row.feature(name).ok_or_else(|| {
                ForecastError::SchemaMismatchError(format!(
                    "feature frame has no column '{}'",
                    name
                ))
            })?;
            prediction += weight * self.encode(name, value);
        }
        Ok(prediction)
    }

    fn encode(&self, name: &str, value: FeatureValue) -> f64 {
        match value {
            FeatureValue::Number(v) => v,
            FeatureValue::Category(level) => self
                .artifact
                .categories
                .get(name)
                .and_then(|levels| levels.get(&level))
                .copied()
                .unwrap_or(UNKNOWN_CATEGORY_LEVEL),
        }
    }
}

/// Check the artifact's feature columns against the canonical schema,
/// set and order, failing fast at load time
fn validate_schema(artifact: &RegressionArtifact) -> Result<()> {
    for column in FEATURE_COLUMNS {
        if !artifact.feature_names.iter().any(|name| name == column) {
            return Err(ForecastError::SchemaMismatchError(format!(
                "artifact is missing feature column '{}'",
                column
            )));
        }
    }

    if artifact.feature_names.len() != FEATURE_COLUMNS.len() {
        return Err(ForecastError::SchemaMismatchError(format!(
            "artifact lists {} feature columns, expected {}",
            artifact.feature_names.len(),
            FEATURE_COLUMNS.len()
        )));
    }

    for (position, (got, want)) in artifact
        .feature_names
        .iter()
        .zip(FEATURE_COLUMNS)
        .enumerate()
    {
        if got != want {
            return Err(ForecastError::SchemaMismatchError(format!(
                "feature column {} is '{}', expected '{}'",
                position, got, want
            )));
        }
    }

    if artifact.weights.len() != artifact.feature_names.len() {
        return Err(ForecastError::SchemaMismatchError(format!(
            "artifact has {} weights for {} feature columns",
            artifact.weights.len(),
            artifact.feature_names.len()
        )));
    }

    Ok(())
}
