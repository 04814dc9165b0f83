//! Structural checks on a bar series.
//!
//! The engine only accepts already-ordered in-memory series. Anything that is
//! structurally malformed fails fast with `EngineError::InvalidInput`.

use chrono::NaiveDate;

use crate::domain::Bar;
use crate::error::EngineError;

/// Verify that dates are strictly increasing (which also rules out duplicates).
pub fn validate_bars(bars: &[Bar]) -> Result<(), EngineError> {
    validate_dates(bars.iter().map(|b| b.date))
}

pub(crate) fn validate_dates(dates: impl Iterator<Item = NaiveDate>) -> Result<(), EngineError> {
    let mut prev: Option<NaiveDate> = None;
    for (i, date) in dates.enumerate() {
        if let Some(p) = prev {
            if date <= p {
                return Err(EngineError::InvalidInput(format!(
                    "dates must be strictly increasing: row {i} ({date}) follows {p}"
                )));
            }
        }
        prev = Some(date);
    }
    Ok(())
}

/// Assemble bars from column vectors, as handed over by columnar collaborators.
///
/// All columns must have the same length as `dates`.
pub fn bars_from_columns(
    dates: &[NaiveDate],
    open: &[f64],
    high: &[f64],
    low: &[f64],
    close: &[f64],
    volume: &[f64],
) -> Result<Vec<Bar>, EngineError> {
    let n = dates.len();
    let columns = [
        ("open", open.len()),
        ("high", high.len()),
        ("low", low.len()),
        ("close", close.len()),
        ("volume", volume.len()),
    ];
    for (name, len) in columns {
        if len != n {
            return Err(EngineError::InvalidInput(format!(
                "column '{name}' has {len} values but there are {n} dates"
            )));
        }
    }

    let bars: Vec<Bar> = (0..n)
        .map(|i| Bar::new(dates[i], open[i], high[i], low[i], close[i], volume[i]))
        .collect();
    validate_bars(&bars)?;
    Ok(bars)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    #[test]
    fn gaps_are_allowed() {
        let bars = vec![
            Bar::new(d(1), 1.0, 1.0, 1.0, 1.0, 1.0),
            Bar::new(d(4), 1.0, 1.0, 1.0, 1.0, 1.0),
            Bar::new(d(5), 1.0, 1.0, 1.0, 1.0, 1.0),
        ];
        assert!(validate_bars(&bars).is_ok());
    }

    #[test]
    fn duplicate_date_rejected() {
        let bars = vec![
            Bar::new(d(1), 1.0, 1.0, 1.0, 1.0, 1.0),
            Bar::new(d(1), 1.0, 1.0, 1.0, 1.0, 1.0),
        ];
        assert!(validate_bars(&bars).unwrap_err().is_invalid_input());
    }

    #[test]
    fn descending_dates_rejected() {
        let bars = vec![
            Bar::new(d(2), 1.0, 1.0, 1.0, 1.0, 1.0),
            Bar::new(d(1), 1.0, 1.0, 1.0, 1.0, 1.0),
        ];
        assert!(validate_bars(&bars).is_err());
    }

    #[test]
    fn columns_assemble_in_order() {
        let bars = bars_from_columns(
            &[d(1), d(2)],
            &[1.0, 2.0],
            &[1.5, 2.5],
            &[0.5, 1.5],
            &[1.2, 2.2],
            &[10.0, 20.0],
        )
        .unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[1].close, 2.2);
        assert_eq!(bars[1].volume, 20.0);
    }

    #[test]
    fn mismatched_columns_rejected() {
        let err = bars_from_columns(&[d(1), d(2)], &[1.0, 2.0], &[1.0], &[1.0, 2.0], &[1.0, 2.0], &[1.0, 2.0])
            .unwrap_err();
        assert!(err.is_invalid_input());
        assert!(err.to_string().contains("'high'"));
    }
}
