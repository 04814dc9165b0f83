//! Leading back-fill for indicator columns.
//!
//! Warm-up cells before a column's first defined value take that value.
//! Only the leading run is touched: a NaN after the first defined value came
//! from a NaN input and stays undefined. Applying the fill twice is a no-op.

/// Replace leading NaNs in `column` with its first non-NaN value.
/// Returns the number of cells filled.
pub fn backfill_leading(column: &mut [f64]) -> usize {
    let Some(first) = column.iter().position(|v| !v.is_nan()) else {
        return 0;
    };
    let value = column[first];
    for cell in &mut column[..first] {
        *cell = value;
    }
    first
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_only_leading_run() {
        let mut col = vec![f64::NAN, f64::NAN, 3.0, f64::NAN, 5.0];
        assert_eq!(backfill_leading(&mut col), 2);
        assert_eq!(col[0], 3.0);
        assert_eq!(col[1], 3.0);
        assert!(col[3].is_nan());
        assert_eq!(col[4], 5.0);
    }

    #[test]
    fn all_nan_column_untouched() {
        let mut col = vec![f64::NAN; 3];
        assert_eq!(backfill_leading(&mut col), 0);
        assert!(col.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn idempotent() {
        let mut once = vec![f64::NAN, 2.0, f64::NAN, 4.0];
        backfill_leading(&mut once);
        let mut twice = once.clone();
        backfill_leading(&mut twice);
        assert_eq!(format!("{once:?}"), format!("{twice:?}"));
    }
}
