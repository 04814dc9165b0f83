//! Collaborator interfaces: where bars come from and where results go.
//!
//! The engine itself never does I/O. These are the seams the CLI (or any
//! embedding application) plugs into: a `PriceSource` that hands over an
//! ordered bar series, a `PredictionStore` that receives forecast records
//! as value objects, and CSV renderers for export.

pub mod export;
pub mod provider;
pub mod store;

pub use export::{forecast_to_csv, indicators_to_csv};
pub use provider::{CsvPriceSource, InMemoryPriceSource, PriceSource};
pub use store::{InMemoryPredictionStore, PredictionRecord, PredictionStore};

use thiserror::Error;

use crate::error::EngineError;

#[derive(Debug, Error)]
pub enum DataError {
    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("malformed price file {path}: {message}")]
    Malformed { path: String, message: String },

    #[error("export error: {0}")]
    Export(String),

    #[error(transparent)]
    Engine(#[from] EngineError),
}
