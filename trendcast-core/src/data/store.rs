//! Prediction history.
//!
//! Records are plain values keyed by `(symbol, target_date)`. Saving a
//! forecast is an explicit upsert: a newer prediction for the same target
//! day replaces the older one.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::data::DataError;
use crate::forecast::ForecastReport;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub symbol: String,
    /// Day the forecast was made
    pub prediction_date: NaiveDate,
    /// Day the price applies to
    pub target_date: NaiveDate,
    pub predicted_price: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
    /// Direction accuracy (%) of the model that produced this record
    pub accuracy: Option<f64>,
    /// Confidence (%) of the model that produced this record
    pub confidence: Option<f64>,
}

impl PredictionRecord {
    /// One record per forecast point.
    pub fn from_report(
        symbol: &str,
        prediction_date: NaiveDate,
        report: &ForecastReport,
    ) -> Vec<PredictionRecord> {
        report
            .forecast
            .iter()
            .map(|p| PredictionRecord {
                symbol: symbol.to_string(),
                prediction_date,
                target_date: p.date,
                predicted_price: p.predicted_close,
                lower_bound: p.lower_bound,
                upper_bound: p.upper_bound,
                accuracy: Some(report.direction_accuracy),
                confidence: Some(report.confidence),
            })
            .collect()
    }
}

pub trait PredictionStore: Send + Sync {
    /// Insert or replace the record for `(record.symbol, record.target_date)`.
    fn upsert(&mut self, record: PredictionRecord) -> Result<(), DataError>;

    fn get(&self, symbol: &str, target_date: NaiveDate) -> Result<Option<PredictionRecord>, DataError>;

    /// Up to `limit` records for `symbol`, newest `prediction_date` first.
    fn recent(&self, symbol: &str, limit: usize) -> Result<Vec<PredictionRecord>, DataError>;

    fn upsert_all(&mut self, records: Vec<PredictionRecord>) -> Result<usize, DataError> {
        let n = records.len();
        for record in records {
            self.upsert(record)?;
        }
        Ok(n)
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryPredictionStore {
    records: BTreeMap<(String, NaiveDate), PredictionRecord>,
}

impl InMemoryPredictionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl PredictionStore for InMemoryPredictionStore {
    fn upsert(&mut self, record: PredictionRecord) -> Result<(), DataError> {
        self.records
            .insert((record.symbol.clone(), record.target_date), record);
        Ok(())
    }

    fn get(&self, symbol: &str, target_date: NaiveDate) -> Result<Option<PredictionRecord>, DataError> {
        Ok(self
            .records
            .get(&(symbol.to_string(), target_date))
            .cloned())
    }

    fn recent(&self, symbol: &str, limit: usize) -> Result<Vec<PredictionRecord>, DataError> {
        let mut out: Vec<PredictionRecord> = self
            .records
            .values()
            .filter(|r| r.symbol == symbol)
            .cloned()
            .collect();
        // Stable sort keeps target_date order within one prediction_date
        out.sort_by(|a, b| b.prediction_date.cmp(&a.prediction_date));
        out.truncate(limit);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, month, day).unwrap()
    }

    fn record(symbol: &str, made: NaiveDate, target: NaiveDate, price: f64) -> PredictionRecord {
        PredictionRecord {
            symbol: symbol.to_string(),
            prediction_date: made,
            target_date: target,
            predicted_price: price,
            lower_bound: price - 1.0,
            upper_bound: price + 1.0,
            accuracy: Some(60.0),
            confidence: Some(80.0),
        }
    }

    #[test]
    fn upsert_replaces_same_target_day() {
        let mut store = InMemoryPredictionStore::new();
        store.upsert(record("AAPL", d(1, 1), d(1, 10), 100.0)).unwrap();
        store.upsert(record("AAPL", d(1, 5), d(1, 10), 105.0)).unwrap();
        assert_eq!(store.len(), 1);
        let got = store.get("AAPL", d(1, 10)).unwrap().unwrap();
        assert_eq!(got.predicted_price, 105.0);
        assert_eq!(got.prediction_date, d(1, 5));
    }

    #[test]
    fn symbols_are_separate_keys() {
        let mut store = InMemoryPredictionStore::new();
        store.upsert(record("AAPL", d(1, 1), d(1, 10), 100.0)).unwrap();
        store.upsert(record("MSFT", d(1, 1), d(1, 10), 300.0)).unwrap();
        assert_eq!(store.len(), 2);
        assert!(store.get("GOOG", d(1, 10)).unwrap().is_none());
    }

    #[test]
    fn recent_is_newest_first_and_limited() {
        let mut store = InMemoryPredictionStore::new();
        store
            .upsert_all(vec![
                record("AAPL", d(1, 1), d(1, 2), 1.0),
                record("AAPL", d(2, 1), d(2, 2), 2.0),
                record("AAPL", d(3, 1), d(3, 2), 3.0),
                record("MSFT", d(4, 1), d(4, 2), 4.0),
            ])
            .unwrap();
        let recent = store.recent("AAPL", 2).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].predicted_price, 3.0);
        assert_eq!(recent[1].predicted_price, 2.0);
    }
}
