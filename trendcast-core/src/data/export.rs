//! CSV rendering for export collaborators.
//!
//! Undefined (NaN) cells are written as empty fields.

use crate::data::DataError;
use crate::forecast::ForecastPoint;
use crate::indicators::{IndicatorColumn, IndicatorRow};

fn cell(value: f64) -> String {
    if value.is_finite() {
        value.to_string()
    } else {
        String::new()
    }
}

fn finish(wtr: csv::Writer<Vec<u8>>) -> Result<String, DataError> {
    let data = wtr
        .into_inner()
        .map_err(|e| DataError::Export(format!("failed to flush CSV writer: {e}")))?;
    String::from_utf8(data).map_err(|e| DataError::Export(format!("CSV output is not valid UTF-8: {e}")))
}

/// Indicator series as CSV.
///
/// Columns: Date, Open, High, Low, Close, Volume, MA20, MA50, RSI, MACD,
/// Signal_Line, MA20_std, Upper_Band, Lower_Band, ATR
pub fn indicators_to_csv(rows: &[IndicatorRow]) -> Result<String, DataError> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    let mut header = vec!["Date", "Open", "High", "Low", "Close", "Volume"];
    header.extend(IndicatorColumn::ALL.iter().map(|c| c.label()));
    wtr.write_record(&header)?;

    for row in rows {
        let b = &row.bar;
        let mut record = vec![
            b.date.to_string(),
            cell(b.open),
            cell(b.high),
            cell(b.low),
            cell(b.close),
            cell(b.volume),
        ];
        record.extend(IndicatorColumn::ALL.iter().map(|&c| cell(row.get(c))));
        wtr.write_record(&record)?;
    }

    finish(wtr)
}

/// Forecast as CSV with columns Date, Predicted, Lower_Bound, Upper_Bound.
pub fn forecast_to_csv(points: &[ForecastPoint]) -> Result<String, DataError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["Date", "Predicted", "Lower_Bound", "Upper_Bound"])?;
    for p in points {
        wtr.write_record([
            &p.date.to_string(),
            &format!("{:.4}", p.predicted_close),
            &format!("{:.4}", p.lower_bound),
            &format!("{:.4}", p.upper_bound),
        ])?;
    }
    finish(wtr)
}
