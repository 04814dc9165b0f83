//! Bollinger Bands: moving average +/- standard deviation multiplier.
//!
//! Three output series (separate Indicator instances):
//! - StdDev: sample stddev(close, period)
//! - Upper: SMA(close, period) + mult * stddev
//! - Lower: SMA(close, period) - mult * stddev
//!
//! Uses sample stddev (divide by N-1).
//! Lookback: period - 1.

use crate::domain::Bar;
use crate::indicators::Indicator;

/// Which Bollinger series to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BollingerBand {
    Upper,
    Lower,
    StdDev,
}

#[derive(Debug, Clone)]
pub struct Bollinger {
    period: usize,
    multiplier: f64,
    band: BollingerBand,
    name: String,
}

impl Bollinger {
    pub fn upper(period: usize, multiplier: f64) -> Self {
        Self::build(period, multiplier, BollingerBand::Upper)
    }

    pub fn lower(period: usize, multiplier: f64) -> Self {
        Self::build(period, multiplier, BollingerBand::Lower)
    }

    pub fn std_dev(period: usize) -> Self {
        Self::build(period, 0.0, BollingerBand::StdDev)
    }

    fn build(period: usize, multiplier: f64, band: BollingerBand) -> Self {
        assert!(period >= 2, "Bollinger period must be >= 2 for sample stddev");
        let name = match band {
            BollingerBand::Upper => format!("bollinger_upper_{period}_{multiplier}"),
            BollingerBand::Lower => format!("bollinger_lower_{period}_{multiplier}"),
            BollingerBand::StdDev => format!("ma{period}_std"),
        };
        Self {
            period,
            multiplier,
            band,
            name,
        }
    }
}

impl Indicator for Bollinger {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let n = bars.len();
        let mut result = vec![f64::NAN; n];

        if n < self.period {
            return result;
        }

        for i in (self.period - 1)..n {
            let window = &bars[(i + 1 - self.period)..=i];
            if window.iter().any(|b| b.close.is_nan()) {
                continue;
            }

            let mean = window.iter().map(|b| b.close).sum::<f64>() / self.period as f64;
            let variance = window
                .iter()
                .map(|b| {
                    let diff = b.close - mean;
                    diff * diff
                })
                .sum::<f64>()
                / (self.period - 1) as f64;
            let stddev = variance.sqrt();

            result[i] = match self.band {
                BollingerBand::Upper => mean + self.multiplier * stddev,
                BollingerBand::Lower => mean - self.multiplier * stddev,
                BollingerBand::StdDev => stddev,
            };
        }

        result
    }
}
