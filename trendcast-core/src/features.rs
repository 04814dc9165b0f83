//! Supervised feature construction for the forecaster.
//!
//! Each retained indicator row becomes a 23-wide feature vector:
//! 13 raw/indicator fields, close lagged by 1, 2, 3, 5 and 10 rows, and the
//! relative change of close against each lag. The target is the row's close.
//! Rows missing any lag (the first 10) or carrying a non-finite value are
//! dropped.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::indicators::IndicatorRow;

/// Lag offsets in rows, ascending.
pub const LAGS: [usize; 5] = [1, 2, 3, 5, 10];

/// Width of the feature vector.
pub const FEATURE_COUNT: usize = 13 + 2 * LAGS.len();

/// Feature names in vector order.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "Open",
    "High",
    "Low",
    "Close",
    "Volume",
    "MA20",
    "MA50",
    "RSI",
    "MACD",
    "Signal_Line",
    "Upper_Band",
    "Lower_Band",
    "ATR",
    "lag_1",
    "lag_2",
    "lag_3",
    "lag_5",
    "lag_10",
    "return_1",
    "return_2",
    "return_3",
    "return_5",
    "return_10",
];

/// One row of the supervised matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub ma20: f64,
    pub ma50: f64,
    pub rsi: f64,
    pub macd: f64,
    pub signal_line: f64,
    pub upper_band: f64,
    pub lower_band: f64,
    pub atr: f64,
    /// Close shifted back by each entry of `LAGS`.
    pub lags: [f64; 5],
    /// `close / lag - 1` for each entry of `LAGS`.
    pub returns: [f64; 5],
}

impl FeatureRow {
    /// Build the row for `rows[index]`, or `None` when a lag reaches before
    /// the start of the series.
    pub fn at(rows: &[IndicatorRow], index: usize) -> Option<Self> {
        let max_lag = LAGS[LAGS.len() - 1];
        if index < max_lag || index >= rows.len() {
            return None;
        }

        let row = &rows[index];
        let close = row.bar.close;
        let lags = LAGS.map(|k| rows[index - k].bar.close);
        let returns = lags.map(|lag| close / lag - 1.0);

        Some(Self {
            date: row.bar.date,
            open: row.bar.open,
            high: row.bar.high,
            low: row.bar.low,
            close,
            volume: row.bar.volume,
            ma20: row.ma20,
            ma50: row.ma50,
            rsi: row.rsi,
            macd: row.macd,
            signal_line: row.signal_line,
            upper_band: row.upper_band,
            lower_band: row.lower_band,
            atr: row.atr,
            lags,
            returns,
        })
    }

    /// Flatten into model input order (see `FEATURE_NAMES`).
    pub fn to_vector(&self) -> Vec<f64> {
        let mut v = Vec::with_capacity(FEATURE_COUNT);
        v.extend_from_slice(&[
            self.open,
            self.high,
            self.low,
            self.close,
            self.volume,
            self.ma20,
            self.ma50,
            self.rsi,
            self.macd,
            self.signal_line,
            self.upper_band,
            self.lower_band,
            self.atr,
        ]);
        v.extend_from_slice(&self.lags);
        v.extend_from_slice(&self.returns);
        v
    }

    /// True when every feature is finite (usable for training).
    pub fn is_complete(&self) -> bool {
        self.to_vector().iter().all(|v| v.is_finite())
    }

    /// One walk-forward step: feed `predicted` back in as the newest close.
    ///
    /// Lags shift down the ordered set (lag_10 ← lag_5, lag_5 ← lag_3,
    /// lag_3 ← lag_2, lag_2 ← lag_1, lag_1 ← predicted), close becomes the
    /// prediction, and each return is recomputed against its new lag unless
    /// that lag is zero, in which case the previous return is kept.
    ///
    /// Open/High/Low/Volume and every indicator stay frozen at the last known
    /// row; only close-derived features evolve across steps.
    pub fn advance(&self, predicted: f64) -> FeatureRow {
        let mut lags = self.lags;
        for j in (1..lags.len()).rev() {
            lags[j] = lags[j - 1];
        }
        lags[0] = predicted;

        let mut returns = self.returns;
        for (ret, &lag) in returns.iter_mut().zip(&lags) {
            if lag != 0.0 {
                *ret = predicted / lag - 1.0;
            }
        }

        FeatureRow {
            date: self.date + Duration::days(1),
            close: predicted,
            lags,
            returns,
            ..self.clone()
        }
    }
}

/// Trainable rows and their targets, in chronological order.
#[derive(Debug, Clone, Default)]
pub struct FeatureMatrix {
    pub rows: Vec<FeatureRow>,
    pub targets: Vec<f64>,
}

impl FeatureMatrix {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Feature vectors for `rows[range]`.
    pub fn vectors(&self, range: std::ops::Range<usize>) -> Vec<Vec<f64>> {
        self.rows[range].iter().map(FeatureRow::to_vector).collect()
    }

    pub fn last(&self) -> Option<&FeatureRow> {
        self.rows.last()
    }
}

/// Build the trainable matrix from indicator rows.
pub fn build_features(rows: &[IndicatorRow]) -> FeatureMatrix {
    let mut matrix = FeatureMatrix::default();
    for index in 0..rows.len() {
        if let Some(feature) = FeatureRow::at(rows, index) {
            if feature.is_complete() {
                matrix.targets.push(feature.close);
                matrix.rows.push(feature);
            }
        }
    }
    matrix
}
