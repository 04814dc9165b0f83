//! Price sources.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::data::DataError;
use crate::domain::{validate_bars, Bar};

/// Trait for price sources (CSV directory, in-memory fixtures, ...).
///
/// Implementations return bars for `symbol` with `start <= date <= end`, in
/// strictly increasing date order. An empty vector is a valid answer; the
/// engine decides whether it is enough.
pub trait PriceSource: Send + Sync {
    /// Human-readable name of this source.
    fn name(&self) -> &str;

    /// Fetch daily OHLCV bars for a symbol over an inclusive date range.
    fn fetch(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<Bar>, DataError>;
}

/// One CSV line. Empty numeric cells read as missing.
#[derive(Debug, Deserialize)]
struct CsvBar {
    #[serde(alias = "Date")]
    date: NaiveDate,
    #[serde(alias = "Open")]
    open: Option<f64>,
    #[serde(alias = "High")]
    high: Option<f64>,
    #[serde(alias = "Low")]
    low: Option<f64>,
    #[serde(alias = "Close")]
    close: Option<f64>,
    #[serde(alias = "Volume")]
    volume: Option<f64>,
}

impl From<CsvBar> for Bar {
    fn from(r: CsvBar) -> Self {
        let nan = f64::NAN;
        Bar::new(
            r.date,
            r.open.unwrap_or(nan),
            r.high.unwrap_or(nan),
            r.low.unwrap_or(nan),
            r.close.unwrap_or(nan),
            r.volume.unwrap_or(nan),
        )
    }
}

/// Reads `{dir}/{SYMBOL}.csv` with header `date,open,high,low,close,volume`.
#[derive(Debug, Clone)]
pub struct CsvPriceSource {
    dir: PathBuf,
}

impl CsvPriceSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{symbol}.csv"))
    }

    /// Parse a whole price file, sorted by date.
    pub fn read_file(path: &Path) -> Result<Vec<Bar>, DataError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)?;

        let mut bars = Vec::new();
        for record in reader.deserialize::<CsvBar>() {
            bars.push(Bar::from(record?));
        }
        bars.sort_by_key(|b| b.date);
        let inconsistent = bars.iter().filter(|b| !b.is_void() && !b.is_sane()).count();
        if inconsistent > 0 {
            warn!(path = %path.display(), inconsistent, "bars with high/low outside open/close");
        }
        validate_bars(&bars).map_err(|e| DataError::Malformed {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Ok(bars)
    }
}

impl PriceSource for CsvPriceSource {
    fn name(&self) -> &str {
        "csv"
    }

    fn fetch(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<Bar>, DataError> {
        let path = self.path_for(symbol);
        if !path.is_file() {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }
        let bars: Vec<Bar> = Self::read_file(&path)?
            .into_iter()
            .filter(|b| b.date >= start && b.date <= end)
            .collect();
        debug!(symbol, path = %path.display(), bars = bars.len(), "loaded price file");
        Ok(bars)
    }
}

/// Symbol → bars map, for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPriceSource {
    series: HashMap<String, Vec<Bar>>,
}

impl InMemoryPriceSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a series. Bars must already be in strictly increasing order.
    pub fn insert(&mut self, symbol: impl Into<String>, bars: Vec<Bar>) -> Result<(), DataError> {
        validate_bars(&bars)?;
        self.series.insert(symbol.into(), bars);
        Ok(())
    }
}

impl PriceSource for InMemoryPriceSource {
    fn name(&self) -> &str {
        "memory"
    }

    fn fetch(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<Bar>, DataError> {
        let bars = self
            .series
            .get(symbol)
            .ok_or_else(|| DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            })?;
        Ok(bars
            .iter()
            .filter(|b| b.date >= start && b.date <= end)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, day).unwrap()
    }

    #[test]
    fn in_memory_filters_inclusive_range() {
        let bars: Vec<Bar> = (1..=10)
            .map(|day| Bar::new(d(day), 1.0, 1.0, 1.0, day as f64, 1.0))
            .collect();
        let mut source = InMemoryPriceSource::new();
        source.insert("AAPL", bars).unwrap();

        let got = source.fetch("AAPL", d(3), d(5)).unwrap();
        assert_eq!(got.len(), 3);
        assert_eq!(got[0].date, d(3));
        assert_eq!(got[2].date, d(5));
    }

    #[test]
    fn in_memory_unknown_symbol() {
        let source = InMemoryPriceSource::new();
        assert!(matches!(
            source.fetch("MSFT", d(1), d(2)),
            Err(DataError::SymbolNotFound { .. })
        ));
    }

    #[test]
    fn in_memory_rejects_unordered_series() {
        let mut source = InMemoryPriceSource::new();
        let bars = vec![
            Bar::new(d(2), 1.0, 1.0, 1.0, 1.0, 1.0),
            Bar::new(d(1), 1.0, 1.0, 1.0, 1.0, 1.0),
        ];
        assert!(matches!(
            source.insert("X", bars),
            Err(DataError::Engine(_))
        ));
    }
}
