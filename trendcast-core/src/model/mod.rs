//! Regression models behind the forecaster.
//!
//! `Regressor` is the seam: the forecaster trains whatever `ModelConfig::build`
//! hands it, evaluates it on the held-out tail, and throws it away when the
//! call returns. Nothing here persists across calls.

pub mod forest;
pub mod ridge;
pub mod tree;

pub use forest::{ForestConfig, RandomForestRegressor};
pub use ridge::{RidgeConfig, RidgeRegressor};
pub use tree::{DecisionTreeRegressor, TreeConfig};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("cannot fit on an empty training set")]
    EmptyTrainingSet,

    #[error("feature matrix has {rows} rows but {targets} targets")]
    TargetMismatch { rows: usize, targets: usize },

    #[error("row {row} has {got} features, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        got: usize,
    },

    #[error("model has not been fitted")]
    NotFitted,

    #[error("normal equations are singular; increase ridge alpha")]
    Singular,

    #[error("invalid model parameter: {0}")]
    InvalidParameter(String),
}

/// A trainable single-output regression model.
pub trait Regressor: Send + Sync {
    /// Short model identifier for logs.
    fn name(&self) -> &str;

    /// Fit on row-major features `x` and targets `y`.
    fn fit(&mut self, x: &[Vec<f64>], y: &[f64]) -> Result<(), ModelError>;

    /// Predict a single feature row.
    fn predict_one(&self, row: &[f64]) -> Result<f64, ModelError>;

    /// Predict many rows.
    fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>, ModelError> {
        rows.iter().map(|r| self.predict_one(r)).collect()
    }
}

/// Which model the forecaster trains, with its hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelConfig {
    RandomForest(ForestConfig),
    Ridge(RidgeConfig),
}

impl Default for ModelConfig {
    fn default() -> Self {
        ModelConfig::RandomForest(ForestConfig::default())
    }
}

impl ModelConfig {
    pub fn validate(&self) -> Result<(), ModelError> {
        match self {
            ModelConfig::RandomForest(cfg) => cfg.validate(),
            ModelConfig::Ridge(cfg) => cfg.validate(),
        }
    }

    /// A fresh, unfitted model.
    pub fn build(&self) -> Box<dyn Regressor> {
        match self {
            ModelConfig::RandomForest(cfg) => Box::new(RandomForestRegressor::new(cfg.clone())),
            ModelConfig::Ridge(cfg) => Box::new(RidgeRegressor::new(cfg.clone())),
        }
    }
}

/// Validate a training set and return its feature width.
pub(crate) fn check_training_shape(x: &[Vec<f64>], y: &[f64]) -> Result<usize, ModelError> {
    if x.is_empty() {
        return Err(ModelError::EmptyTrainingSet);
    }
    if x.len() != y.len() {
        return Err(ModelError::TargetMismatch {
            rows: x.len(),
            targets: y.len(),
        });
    }
    let width = x[0].len();
    for (row, values) in x.iter().enumerate() {
        if values.len() != width {
            return Err(ModelError::RaggedRow {
                row,
                expected: width,
                got: values.len(),
            });
        }
    }
    Ok(width)
}

pub(crate) fn check_row_width(row: &[f64], expected: usize) -> Result<(), ModelError> {
    if row.len() != expected {
        return Err(ModelError::RaggedRow {
            row: 0,
            expected,
            got: row.len(),
        });
    }
    Ok(())
}
