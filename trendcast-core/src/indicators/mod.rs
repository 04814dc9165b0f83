//! Indicator Engine.
//!
//! Every indicator implements the `Indicator` trait: a pure function from bar
//! history to a numeric series of the same length, `f64::NAN` where the value
//! is undefined. `compute_indicators` runs the fixed dashboard set
//! (MA20, MA50, RSI14, MACD 12/26/9, Bollinger 20×2σ, ATR14), back-fills each
//! column's warm-up once all columns exist, and zips the result into rows.
//!
//! # Look-ahead contamination guard
//! No indicator value at bar t may depend on price data from bar t+1 or later.
//! Every indicator must pass the truncated-vs-full series test.

pub mod atr;
pub mod backfill;
pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;

pub use atr::Atr;
pub use backfill::backfill_leading;
pub use bollinger::{Bollinger, BollingerBand};
pub use ema::Ema;
pub use macd::{Macd, MacdLine};
pub use rsi::Rsi;
pub use sma::Sma;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::{validate_bars, Bar};
use crate::error::{EngineError, Stage};

pub const MA_SHORT: usize = 20;
pub const MA_LONG: usize = 50;
pub const RSI_PERIOD: usize = 14;
pub const MACD_FAST: usize = 12;
pub const MACD_SLOW: usize = 26;
pub const MACD_SIGNAL: usize = 9;
pub const BOLLINGER_PERIOD: usize = 20;
pub const BOLLINGER_MULT: f64 = 2.0;
pub const ATR_PERIOD: usize = 14;

/// Trait for indicators.
///
/// Indicators take a full bar series and produce a numeric output series of
/// the same length. The first `lookback()` values are `f64::NAN` (warmup).
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "ma20", "atr14").
    fn name(&self) -> &str;

    /// Number of bars needed before the indicator produces valid output.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire bar series.
    fn compute(&self, bars: &[Bar]) -> Vec<f64>;
}

/// A bar plus every derived indicator column. `NaN` marks an undefined cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorRow {
    #[serde(flatten)]
    pub bar: Bar,
    pub ma20: f64,
    pub ma50: f64,
    pub rsi: f64,
    pub macd: f64,
    pub signal_line: f64,
    pub ma20_std: f64,
    pub upper_band: f64,
    pub lower_band: f64,
    pub atr: f64,
}

impl IndicatorRow {
    /// A row with every indicator undefined.
    pub fn undefined(bar: Bar) -> Self {
        Self {
            bar,
            ma20: f64::NAN,
            ma50: f64::NAN,
            rsi: f64::NAN,
            macd: f64::NAN,
            signal_line: f64::NAN,
            ma20_std: f64::NAN,
            upper_band: f64::NAN,
            lower_band: f64::NAN,
            atr: f64::NAN,
        }
    }

    pub fn get(&self, column: IndicatorColumn) -> f64 {
        match column {
            IndicatorColumn::Ma20 => self.ma20,
            IndicatorColumn::Ma50 => self.ma50,
            IndicatorColumn::Rsi => self.rsi,
            IndicatorColumn::Macd => self.macd,
            IndicatorColumn::SignalLine => self.signal_line,
            IndicatorColumn::Ma20Std => self.ma20_std,
            IndicatorColumn::UpperBand => self.upper_band,
            IndicatorColumn::LowerBand => self.lower_band,
            IndicatorColumn::Atr => self.atr,
        }
    }

    fn slot(&mut self, column: IndicatorColumn) -> &mut f64 {
        match column {
            IndicatorColumn::Ma20 => &mut self.ma20,
            IndicatorColumn::Ma50 => &mut self.ma50,
            IndicatorColumn::Rsi => &mut self.rsi,
            IndicatorColumn::Macd => &mut self.macd,
            IndicatorColumn::SignalLine => &mut self.signal_line,
            IndicatorColumn::Ma20Std => &mut self.ma20_std,
            IndicatorColumn::UpperBand => &mut self.upper_band,
            IndicatorColumn::LowerBand => &mut self.lower_band,
            IndicatorColumn::Atr => &mut self.atr,
        }
    }
}

/// The derived columns of an `IndicatorRow`, in output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorColumn {
    Ma20,
    Ma50,
    Rsi,
    Macd,
    SignalLine,
    Ma20Std,
    UpperBand,
    LowerBand,
    Atr,
}

impl IndicatorColumn {
    pub const ALL: [IndicatorColumn; 9] = [
        IndicatorColumn::Ma20,
        IndicatorColumn::Ma50,
        IndicatorColumn::Rsi,
        IndicatorColumn::Macd,
        IndicatorColumn::SignalLine,
        IndicatorColumn::Ma20Std,
        IndicatorColumn::UpperBand,
        IndicatorColumn::LowerBand,
        IndicatorColumn::Atr,
    ];

    /// Column header used by exports.
    pub fn label(self) -> &'static str {
        match self {
            IndicatorColumn::Ma20 => "MA20",
            IndicatorColumn::Ma50 => "MA50",
            IndicatorColumn::Rsi => "RSI",
            IndicatorColumn::Macd => "MACD",
            IndicatorColumn::SignalLine => "Signal_Line",
            IndicatorColumn::Ma20Std => "MA20_std",
            IndicatorColumn::UpperBand => "Upper_Band",
            IndicatorColumn::LowerBand => "Lower_Band",
            IndicatorColumn::Atr => "ATR",
        }
    }

    /// The indicator that produces this column.
    pub fn indicator(self) -> Box<dyn Indicator> {
        match self {
            IndicatorColumn::Ma20 => Box::new(Sma::new(MA_SHORT)),
            IndicatorColumn::Ma50 => Box::new(Sma::new(MA_LONG)),
            IndicatorColumn::Rsi => Box::new(Rsi::new(RSI_PERIOD)),
            IndicatorColumn::Macd => Box::new(Macd::line(MACD_FAST, MACD_SLOW, MACD_SIGNAL)),
            IndicatorColumn::SignalLine => {
                Box::new(Macd::signal(MACD_FAST, MACD_SLOW, MACD_SIGNAL))
            }
            IndicatorColumn::Ma20Std => Box::new(Bollinger::std_dev(BOLLINGER_PERIOD)),
            IndicatorColumn::UpperBand => {
                Box::new(Bollinger::upper(BOLLINGER_PERIOD, BOLLINGER_MULT))
            }
            IndicatorColumn::LowerBand => {
                Box::new(Bollinger::lower(BOLLINGER_PERIOD, BOLLINGER_MULT))
            }
            IndicatorColumn::Atr => Box::new(Atr::new(ATR_PERIOD)),
        }
    }
}

/// Compute the full indicator set for a bar series.
///
/// Output has the same length and order as the input. Fails only on an empty
/// series or structurally malformed dates; short or NaN-laden series simply
/// produce undefined (NaN) cells.
pub fn compute_indicators(bars: &[Bar]) -> Result<Vec<IndicatorRow>, EngineError> {
    if bars.is_empty() {
        return Err(EngineError::InsufficientData {
            stage: Stage::Indicators,
            needed: 1,
            available: 0,
        });
    }
    validate_bars(bars)?;

    let columns: Vec<(IndicatorColumn, usize, Vec<f64>)> = IndicatorColumn::ALL
        .iter()
        .map(|&column| {
            let indicator = column.indicator();
            (column, indicator.lookback(), indicator.compute(bars))
        })
        .collect();

    let mut rows: Vec<IndicatorRow> = bars.iter().cloned().map(IndicatorRow::undefined).collect();
    for (column, warmup, mut values) in columns {
        if bars.len() <= warmup {
            warn!(
                column = column.label(),
                warmup,
                bars = bars.len(),
                "series shorter than indicator warm-up; column stays undefined"
            );
        }
        let filled = backfill_leading(&mut values);
        debug!(column = column.label(), warmup, filled, "indicator column computed");
        for (row, value) in rows.iter_mut().zip(values) {
            *row.slot(column) = value;
        }
    }

    Ok(rows)
}

/// Re-apply the leading back-fill to rows that already carry indicators.
///
/// `compute_indicators` output is already filled; this exists for rows that
/// arrive from elsewhere with warm-up gaps.
pub fn backfill_rows(rows: &mut [IndicatorRow]) {
    for column in IndicatorColumn::ALL {
        let mut values: Vec<f64> = rows.iter().map(|r| r.get(column)).collect();
        backfill_leading(&mut values);
        for (row, value) in rows.iter_mut().zip(values) {
            *row.slot(column) = value;
        }
    }
}

/// Create synthetic bars from close prices for testing.
///
/// Generates plausible OHLV: open = prev_close (or close for first bar),
/// high = max(open,close) + 1.0, low = min(open,close) - 1.0, volume = 1000.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<Bar> {
    let base_date = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar {
                date: base_date + chrono::Duration::days(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000.0,
            }
        })
        .collect()
}

/// Create bars from explicit (open, high, low, close) tuples for testing.
#[cfg(test)]
pub fn make_ohlc_bars(data: &[(f64, f64, f64, f64)]) -> Vec<Bar> {
    let base_date = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    data.iter()
        .enumerate()
        .map(|(i, &(open, high, low, close))| Bar {
            date: base_date + chrono::Duration::days(i as i64),
            open,
            high,
            low,
            close,
            volume: 1000.0,
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(n: usize) -> Vec<Bar> {
        let closes: Vec<f64> = (0..n).map(|i| 100.0 + i as f64).collect();
        make_bars(&closes)
    }

    #[test]
    fn empty_series_is_insufficient() {
        let err = compute_indicators(&[]).unwrap_err();
        assert!(err.is_insufficient_data());
    }

    #[test]
    fn output_matches_input_length_and_order() {
        let bars = ramp(60);
        let rows = compute_indicators(&bars).unwrap();
        assert_eq!(rows.len(), bars.len());
        for (row, bar) in rows.iter().zip(&bars) {
            assert_eq!(&row.bar, bar);
        }
    }

    #[test]
    fn warmup_is_backfilled_from_first_defined_value() {
        let rows = compute_indicators(&ramp(60)).unwrap();
        // MA20 first defined at 19: mean(100..=119) = 109.5
        assert_approx(rows[0].ma20, 109.5, DEFAULT_EPSILON);
        assert_approx(rows[19].ma20, 109.5, DEFAULT_EPSILON);
        assert_approx(rows[20].ma20, 110.5, DEFAULT_EPSILON);
        // MA50 first defined at 49: mean(100..=149) = 124.5
        assert_approx(rows[0].ma50, 124.5, DEFAULT_EPSILON);
        // Rising closes → RSI saturated from the first window
        assert_eq!(rows[0].rsi, 100.0);
    }

    #[test]
    fn short_series_leaves_long_window_undefined() {
        let rows = compute_indicators(&ramp(30)).unwrap();
        assert!(rows.iter().all(|r| r.ma50.is_nan()));
        assert!(rows.iter().all(|r| r.ma20.is_finite()));
    }

    #[test]
    fn non_monotonic_dates_rejected() {
        let mut bars = ramp(5);
        bars.swap(1, 2);
        assert!(compute_indicators(&bars).unwrap_err().is_invalid_input());
    }

    #[test]
    fn backfill_rows_is_noop_on_engine_output() {
        let rows = compute_indicators(&ramp(60)).unwrap();
        let mut again = rows.clone();
        backfill_rows(&mut again);
        assert_eq!(rows, again);
    }

    #[test]
    fn lookback_is_first_defined_index() {
        let bars = ramp(60);
        for column in IndicatorColumn::ALL {
            let indicator = column.indicator();
            let raw = indicator.compute(&bars);
            let first = raw.iter().position(|v| v.is_finite()).unwrap();
            assert_eq!(first, indicator.lookback(), "{}", column.label());
        }
    }

    #[test]
    fn column_labels_are_unique() {
        let mut labels: Vec<&str> = IndicatorColumn::ALL.iter().map(|c| c.label()).collect();
        labels.sort();
        labels.dedup();
        assert_eq!(labels.len(), IndicatorColumn::ALL.len());
    }
}
