//! Exponential Moving Average (EMA).
//!
//! Recursive: EMA[t] = alpha * close[t] + (1 - alpha) * EMA[t-1], alpha = 2/(span+1).
//! Seed: EMA at the first observation equals that observation, so the series
//! is defined from bar 0 onward. A NaN input carries the previous EMA forward
//! while its weight keeps decaying.
//! Lookback: 0.

use crate::domain::Bar;
use crate::indicators::Indicator;

#[derive(Debug, Clone)]
pub struct Ema {
    span: usize,
    name: String,
}

impl Ema {
    pub fn new(span: usize) -> Self {
        assert!(span >= 1, "EMA span must be >= 1");
        Self {
            span,
            name: format!("ema{span}"),
        }
    }
}

impl Indicator for Ema {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        0
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        ema_of_series(&closes, self.span)
    }
}

/// EMA of an arbitrary series, seeded at its first non-NaN value.
/// Used directly by MACD for the signal line.
///
/// A missing observation reports the previous EMA and decays its weight by
/// another (1 - alpha). The next observation blends `w * prev + alpha * v`,
/// normalised by `w + alpha`, where `w` is the accumulated decay.
pub fn ema_of_series(values: &[f64], span: usize) -> Vec<f64> {
    let mut result = vec![f64::NAN; values.len()];
    if span == 0 {
        return result;
    }

    let alpha = 2.0 / (span as f64 + 1.0);
    let mut prev: Option<f64> = None;
    // Decay accumulated over consecutive missing observations.
    let mut gap_decay = 1.0;

    for (i, &v) in values.iter().enumerate() {
        let Some(p) = prev else {
            if !v.is_nan() {
                result[i] = v;
                prev = Some(v);
            }
            continue;
        };

        if v.is_nan() {
            gap_decay *= 1.0 - alpha;
            result[i] = p;
            continue;
        }

        let next = if gap_decay == 1.0 {
            alpha * v + (1.0 - alpha) * p
        } else {
            let w = gap_decay * (1.0 - alpha);
            (w * p + alpha * v) / (w + alpha)
        };
        gap_decay = 1.0;
        result[i] = next;
        prev = Some(next);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    #[test]
    fn ema_span_1_equals_close() {
        let bars = make_bars(&[100.0, 200.0, 300.0]);
        let result = Ema::new(1).compute(&bars);
        assert_approx(result[0], 100.0, DEFAULT_EPSILON);
        assert_approx(result[1], 200.0, DEFAULT_EPSILON);
        assert_approx(result[2], 300.0, DEFAULT_EPSILON);
    }

    #[test]
    fn ema_3_seeded_at_first_observation() {
        // alpha = 0.5
        // EMA[0] = 10
        // EMA[1] = 0.5*12 + 0.5*10 = 11
        // EMA[2] = 0.5*14 + 0.5*11 = 12.5
        let bars = make_bars(&[10.0, 12.0, 14.0]);
        let result = Ema::new(3).compute(&bars);
        assert_approx(result[0], 10.0, DEFAULT_EPSILON);
        assert_approx(result[1], 11.0, DEFAULT_EPSILON);
        assert_approx(result[2], 12.5, DEFAULT_EPSILON);
    }

    #[test]
    fn ema_leading_nan_delays_seed() {
        let result = ema_of_series(&[f64::NAN, 20.0, 30.0], 3);
        assert!(result[0].is_nan());
        assert_approx(result[1], 20.0, DEFAULT_EPSILON);
        assert_approx(result[2], 25.0, DEFAULT_EPSILON);
    }

    #[test]
    fn ema_interior_nan_decays_old_weight() {
        // alpha = 0.5; after one gap the old value weighs 0.25 against 0.5
        // EMA[2] = (0.25*10 + 0.5*14) / 0.75
        let result = ema_of_series(&[10.0, f64::NAN, 14.0], 3);
        assert_approx(result[1], 10.0, DEFAULT_EPSILON);
        assert_approx(result[2], 38.0 / 3.0, DEFAULT_EPSILON);
    }

    #[test]
    fn ema_resumes_plain_recursion_after_gap() {
        // EMA[2] = 38/3; EMA[3] = 0.5*20 + 0.5*38/3
        let result = ema_of_series(&[10.0, f64::NAN, 14.0, 20.0], 3);
        assert_approx(result[3], 10.0 + 19.0 / 3.0, DEFAULT_EPSILON);
    }

    #[test]
    fn ema_two_step_gap() {
        // old weight 0.125 after two missing observations
        let result = ema_of_series(&[8.0, f64::NAN, f64::NAN, 16.0], 3);
        assert_approx(result[2], 8.0, DEFAULT_EPSILON);
        assert_approx(result[3], (0.125 * 8.0 + 0.5 * 16.0) / 0.625, DEFAULT_EPSILON);
    }

    #[test]
    fn ema_all_nan_stays_nan() {
        let result = ema_of_series(&[f64::NAN; 4], 12);
        assert!(result.iter().all(|v| v.is_nan()));
    }
}
