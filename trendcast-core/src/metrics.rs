//! Held-out evaluation metrics.
//!
//! All functions take `(actual, predicted)` slices of equal length and are
//! pure. Empty input yields 0 for every error metric.

use serde::{Deserialize, Serialize};

/// Metrics computed on the chronological test split.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationMetrics {
    /// Mean squared error
    pub mse: f64,
    /// Mean absolute error
    pub mae: f64,
    /// Root mean squared error
    pub rmse: f64,
    /// Coefficient of determination
    pub r2: f64,
    /// Population standard deviation of `actual - predicted`
    pub residual_std: f64,
    /// Percent of consecutive test steps whose direction was called right
    pub direction_accuracy: f64,
    /// `clamp(r2 * 100, 0, 100)`
    pub confidence: f64,
    pub train_rows: usize,
    pub test_rows: usize,
}

impl EvaluationMetrics {
    pub fn calculate(actual: &[f64], predicted: &[f64], train_rows: usize) -> Self {
        let r2 = r2(actual, predicted);
        Self {
            mse: mse(actual, predicted),
            mae: mae(actual, predicted),
            rmse: rmse(actual, predicted),
            r2,
            residual_std: residual_std(actual, predicted),
            direction_accuracy: direction_accuracy(actual, predicted),
            confidence: confidence_from_r2(r2),
            train_rows,
            test_rows: actual.len(),
        }
    }
}

pub fn mse(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum::<f64>()
        / actual.len() as f64
}

pub fn mae(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).abs())
        .sum::<f64>()
        / actual.len() as f64
}

pub fn rmse(actual: &[f64], predicted: &[f64]) -> f64 {
    mse(actual, predicted).sqrt()
}

/// R² = 1 - SS_res / SS_tot.
///
/// Constant targets have SS_tot = 0: the score is 1 for a perfect fit and 0
/// otherwise.
pub fn r2(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    let mean = actual.iter().sum::<f64>() / actual.len() as f64;
    let ss_tot: f64 = actual.iter().map(|a| (a - mean).powi(2)).sum();
    let ss_res: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum();

    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

pub fn confidence_from_r2(r2: f64) -> f64 {
    (r2 * 100.0).clamp(0.0, 100.0)
}

/// Population standard deviation of the residuals.
pub fn residual_std(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    let residuals: Vec<f64> = actual.iter().zip(predicted).map(|(a, p)| a - p).collect();
    let n = residuals.len() as f64;
    let mean = residuals.iter().sum::<f64>() / n;
    (residuals.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n).sqrt()
}

/// Percent of the `n - 1` consecutive steps where the predicted change has
/// the same sign as the actual change. A flat step only agrees with a flat
/// step. Fewer than two points gives 0.
pub fn direction_accuracy(actual: &[f64], predicted: &[f64]) -> f64 {
    let n = actual.len().min(predicted.len());
    if n < 2 {
        return 0.0;
    }
    let hits = (1..n)
        .filter(|&i| {
            sign(actual[i] - actual[i - 1]) == sign(predicted[i] - predicted[i - 1])
        })
        .count();
    hits as f64 / (n - 1) as f64 * 100.0
}

fn sign(v: f64) -> i8 {
    if v > 0.0 {
        1
    } else if v < 0.0 {
        -1
    } else {
        0
    }
}
