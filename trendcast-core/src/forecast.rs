//! Forecast Engine: train, evaluate, walk forward.
//!
//! `predict_trend` turns an indicator series into a supervised matrix,
//! splits it chronologically (the newest rows are held out, nothing is
//! shuffled), fits a fresh model, scores it on the held-out tail, and then
//! rolls the newest trainable row forward one day at a time, feeding each
//! prediction back in as the next close.
//!
//! The fitted model lives only for the duration of one call.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::domain::series::validate_dates;
use crate::domain::Bar;
use crate::error::{EngineError, Stage};
use crate::features::{build_features, FeatureMatrix, FeatureRow};
use crate::indicators::{compute_indicators, IndicatorRow};
use crate::metrics::EvaluationMetrics;
use crate::model::{ModelError, Regressor};

/// One projected day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub predicted_close: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
}

impl ForecastPoint {
    pub fn band_width(&self) -> f64 {
        self.upper_bound - self.lower_bound
    }
}

/// Everything one `predict_trend` call produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastReport {
    pub forecast: Vec<ForecastPoint>,
    /// Percent, 0..=100
    pub direction_accuracy: f64,
    /// Percent, 0..=100
    pub confidence: f64,
    pub metrics: EvaluationMetrics,
    /// Name of the regressor that produced the forecast
    pub model: String,
}

impl ForecastReport {
    /// Percent change from `last_close` to the final forecast point.
    pub fn projected_change_pct(&self, last_close: f64) -> Option<f64> {
        let last = self.forecast.last()?;
        if last_close == 0.0 || !last_close.is_finite() {
            return None;
        }
        Some((last.predicted_close - last_close) / last_close * 100.0)
    }
}

/// Coarse reading of a projected percent change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outlook {
    StronglyBullish,
    ModeratelyBullish,
    ModeratelyBearish,
    StronglyBearish,
}

impl Outlook {
    /// Above +5% strongly bullish, above 0 moderately bullish, above -5%
    /// moderately bearish, otherwise strongly bearish.
    pub fn from_change_pct(pct: f64) -> Self {
        if pct > 5.0 {
            Outlook::StronglyBullish
        } else if pct > 0.0 {
            Outlook::ModeratelyBullish
        } else if pct > -5.0 {
            Outlook::ModeratelyBearish
        } else {
            Outlook::StronglyBearish
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Outlook::StronglyBullish => "strongly bullish",
            Outlook::ModeratelyBullish => "moderately bullish",
            Outlook::ModeratelyBearish => "moderately bearish",
            Outlook::StronglyBearish => "strongly bearish",
        }
    }
}

/// A trained regressor with its held-out statistics. Dropped at the end of
/// the call that created it.
struct FittedModel {
    model: Box<dyn Regressor>,
    metrics: EvaluationMetrics,
}

/// Band half-width at 1-indexed forecast `step`.
pub fn band_half_width(z_score: f64, residual_std: f64, step: usize, divisor: f64) -> f64 {
    z_score * residual_std * (step as f64 / divisor).sqrt()
}

/// Forecast `horizon_days` closes past the end of `rows`.
///
/// `rows` must be in strictly increasing date order and carry indicator
/// columns (see `compute_indicators`). Fails with `InsufficientData` when
/// fewer than `config.forecast.min_trainable_rows` rows survive feature
/// construction.
pub fn predict_trend(
    rows: &[IndicatorRow],
    horizon_days: usize,
    config: &EngineConfig,
) -> Result<ForecastReport, EngineError> {
    if horizon_days == 0 {
        return Err(EngineError::InvalidInput(
            "forecast horizon must be at least 1 day".into(),
        ));
    }
    config
        .validate()
        .map_err(|e| EngineError::InvalidInput(e.to_string()))?;
    validate_dates(rows.iter().map(|r| r.bar.date))?;

    let matrix = build_features(rows);
    let needed = config.forecast.min_trainable_rows;
    debug!(
        input_rows = rows.len(),
        trainable = matrix.len(),
        "feature matrix built"
    );
    if matrix.len() < needed {
        return Err(EngineError::InsufficientData {
            stage: Stage::Features,
            needed,
            available: matrix.len(),
        });
    }

    let fitted = fit_and_evaluate(&matrix, config)?;
    let Some(start) = matrix.last() else {
        return Err(EngineError::InsufficientData {
            stage: Stage::Features,
            needed,
            available: 0,
        });
    };
    let Some(last_date) = rows.last().map(|r| r.bar.date) else {
        return Err(EngineError::InsufficientData {
            stage: Stage::Features,
            needed,
            available: 0,
        });
    };

    let predictions = walk_forward(fitted.model.as_ref(), start, horizon_days)?;

    let fc = &config.forecast;
    let residual_std = fitted.metrics.residual_std;
    let forecast: Vec<ForecastPoint> = predictions
        .into_iter()
        .enumerate()
        .map(|(i, predicted_close)| {
            let step = i + 1;
            let half = band_half_width(fc.z_score, residual_std, step, fc.band_divisor);
            ForecastPoint {
                date: last_date + Duration::days(step as i64),
                predicted_close,
                lower_bound: predicted_close - half,
                upper_bound: predicted_close + half,
            }
        })
        .collect();

    info!(
        model = fitted.model.name(),
        horizon = horizon_days,
        direction_accuracy = fitted.metrics.direction_accuracy,
        confidence = fitted.metrics.confidence,
        residual_std,
        "forecast complete"
    );

    Ok(ForecastReport {
        forecast,
        direction_accuracy: fitted.metrics.direction_accuracy,
        confidence: fitted.metrics.confidence,
        model: fitted.model.name().to_string(),
        metrics: fitted.metrics,
    })
}

/// Compute indicators for raw bars, then forecast.
pub fn predict_trend_from_bars(
    bars: &[Bar],
    horizon_days: usize,
    config: &EngineConfig,
) -> Result<ForecastReport, EngineError> {
    let rows = compute_indicators(bars)?;
    predict_trend(&rows, horizon_days, config)
}

/// Roll `start` forward `horizon` steps, returning each step's prediction.
///
/// Step i predicts from the current row, then `FeatureRow::advance` builds
/// the row for step i+1 out of that prediction.
pub fn walk_forward(
    model: &dyn Regressor,
    start: &FeatureRow,
    horizon: usize,
) -> Result<Vec<f64>, ModelError> {
    let mut predictions = Vec::with_capacity(horizon);
    let mut current = start.clone();
    for _ in 0..horizon {
        let next = model.predict_one(&current.to_vector())?;
        predictions.push(next);
        current = current.advance(next);
    }
    Ok(predictions)
}

fn fit_and_evaluate(matrix: &FeatureMatrix, config: &EngineConfig) -> Result<FittedModel, EngineError> {
    let n = matrix.len();
    let test_size = config.forecast.test_size(n);
    let train_size = n - test_size;
    if test_size < 2 {
        warn!(
            test_size,
            "test split shorter than 2 rows; direction accuracy reported as 0"
        );
    }

    let mut model = config.model.build();
    model.fit(&matrix.vectors(0..train_size), &matrix.targets[..train_size])?;

    let actual = &matrix.targets[train_size..];
    let predicted = model.predict(&matrix.vectors(train_size..n))?;
    let metrics = EvaluationMetrics::calculate(actual, &predicted, train_size);

    debug!(
        model = model.name(),
        train_size,
        test_size,
        mse = metrics.mse,
        mae = metrics.mae,
        r2 = metrics.r2,
        "model evaluated on held-out tail"
    );

    Ok(FittedModel { model, metrics })
}
