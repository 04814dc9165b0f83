//! Engine configuration, loadable from TOML.
//!
//! ```toml
//! [forecast]
//! test_fraction = 0.2
//! min_trainable_rows = 15
//! z_score = 1.96
//! band_divisor = 10.0
//!
//! [model]
//! kind = "random_forest"
//! n_estimators = 100
//! seed = 42
//! ```
//!
//! Every key is optional; missing keys take the defaults shown above.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{ModelConfig, ModelError};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("parse config TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

impl From<ModelError> for ConfigError {
    fn from(err: ModelError) -> Self {
        ConfigError::Invalid(err.to_string())
    }
}

/// Forecast Engine settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// Share of trainable rows held out (chronologically last) for testing
    pub test_fraction: f64,
    /// Fewer trainable rows than this is an insufficient-data error
    pub min_trainable_rows: usize,
    /// Normal quantile for the confidence band
    pub z_score: f64,
    /// Band half-width at step i is `z · σ · sqrt(i / band_divisor)`
    pub band_divisor: f64,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            test_fraction: 0.2,
            min_trainable_rows: 15,
            z_score: 1.96,
            band_divisor: 10.0,
        }
    }
}

impl ForecastConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(ConfigError::Invalid(format!(
                "forecast.test_fraction must be in (0, 1), got {}",
                self.test_fraction
            )));
        }
        if self.min_trainable_rows < 2 {
            return Err(ConfigError::Invalid(format!(
                "forecast.min_trainable_rows must be >= 2, got {}",
                self.min_trainable_rows
            )));
        }
        if !(self.z_score.is_finite() && self.z_score > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "forecast.z_score must be > 0, got {}",
                self.z_score
            )));
        }
        if !(self.band_divisor.is_finite() && self.band_divisor > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "forecast.band_divisor must be > 0, got {}",
                self.band_divisor
            )));
        }
        Ok(())
    }

    /// Rows held out for testing out of `n` trainable rows: `ceil(n · fraction)`,
    /// at least 1 and leaving at least 1 training row.
    pub fn test_size(&self, n: usize) -> usize {
        let raw = (n as f64 * self.test_fraction).ceil() as usize;
        raw.clamp(1, n.saturating_sub(1).max(1))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub forecast: ForecastConfig,
    pub model: ModelConfig,
}

impl EngineConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.forecast.validate()?;
        self.model.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RidgeConfig;

    #[test]
    fn empty_toml_is_default() {
        let cfg = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(cfg, EngineConfig::default());
        assert_eq!(cfg.forecast.min_trainable_rows, 15);
    }

    #[test]
    fn partial_tables_fill_defaults() {
        let cfg = EngineConfig::from_toml_str(
            r#"
            [forecast]
            z_score = 2.58

            [model]
            kind = "ridge"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.forecast.z_score, 2.58);
        assert_eq!(cfg.forecast.band_divisor, 10.0);
        assert_eq!(cfg.model, ModelConfig::Ridge(RidgeConfig::default()));
    }

    #[test]
    fn out_of_range_values_rejected() {
        let err = EngineConfig::from_toml_str("[forecast]\ntest_fraction = 1.5\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = EngineConfig::from_toml_str("[model]\nkind = \"ridge\"\nalpha = -2.0\n")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn unknown_model_kind_is_a_parse_error() {
        let err = EngineConfig::from_toml_str("[model]\nkind = \"svm\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn test_size_rounds_up() {
        let cfg = ForecastConfig::default();
        assert_eq!(cfg.test_size(15), 3);
        assert_eq!(cfg.test_size(16), 4);
        assert_eq!(cfg.test_size(100), 20);
        assert_eq!(cfg.test_size(2), 1);
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.toml");
        std::fs::write(&path, "[model]\nkind = \"random_forest\"\nn_estimators = 5\n").unwrap();
        let cfg = EngineConfig::load(&path).unwrap();
        match cfg.model {
            ModelConfig::RandomForest(f) => assert_eq!(f.n_estimators, 5),
            other => panic!("unexpected model: {other:?}"),
        }

        let missing = EngineConfig::load(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(missing, ConfigError::Io { .. }));
    }
}
