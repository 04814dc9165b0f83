//! Relative Strength Index (RSI).
//!
//! Simple trailing averages of gains and losses over `period` close deltas.
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss)
//! Lookback: period (the first bar has no delta).
//! Edge case: avg_loss == 0 → RS is infinite → RSI = 100, including the
//! flat 0/0 window.

use crate::domain::Bar;
use crate::indicators::Indicator;

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    name: String,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self {
            period,
            name: format!("rsi{period}"),
        }
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let n = bars.len();
        let mut result = vec![f64::NAN; n];

        if n < self.period + 1 {
            return result;
        }

        // changes[i] = close[i] - close[i-1]; changes[0] has no predecessor
        let mut changes = vec![f64::NAN; n];
        for i in 1..n {
            changes[i] = bars[i].close - bars[i - 1].close;
        }

        for i in self.period..n {
            let window = &changes[(i + 1 - self.period)..=i];
            if window.iter().any(|c| c.is_nan()) {
                continue;
            }
            let gain: f64 = window.iter().filter(|c| **c > 0.0).sum();
            let loss: f64 = window.iter().filter(|c| **c < 0.0).map(|c| -c).sum();
            let p = self.period as f64;
            result[i] = compute_rsi(gain / p, loss / p);
        }

        result
    }
}

fn compute_rsi(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        100.0
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}
