//! Trendcast Core: technical indicators and walk-forward price forecasting.
//!
//! This crate contains the whole engine:
//! - Domain types (daily OHLCV bars) and structural validation
//! - Indicator Engine: MA20/MA50, RSI14, MACD 12/26/9, Bollinger 20×2σ, ATR14
//! - Supervised feature construction with lag and return features
//! - Regression models (random forest, ridge) behind the `Regressor` trait
//! - Forecast Engine: chronological split, evaluation, autoregressive
//!   multi-day projection with a widening confidence band
//! - Collaborator interfaces for price sources, prediction history and export
//!
//! The engine holds no global state; every call trains its own model.

pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod features;
pub mod forecast;
pub mod indicators;
pub mod metrics;
pub mod model;
pub mod rng;

pub use config::{ConfigError, EngineConfig, ForecastConfig};
pub use domain::{bars_from_columns, validate_bars, Bar};
pub use error::{EngineError, Stage};
pub use forecast::{predict_trend, predict_trend_from_bars, ForecastPoint, ForecastReport, Outlook};
pub use indicators::{compute_indicators, IndicatorColumn, IndicatorRow};
pub use metrics::EvaluationMetrics;
pub use model::{ModelConfig, ModelError, Regressor};
