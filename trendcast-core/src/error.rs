//! Engine-level error type.
//!
//! Numeric degeneracy (flat RSI windows, zero lag prices) is handled by
//! saturation/skip rules at the call site and never surfaces here.

use thiserror::Error;

use crate::model::ModelError;

/// Pipeline stage that ran out of usable rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Indicators,
    Features,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Indicators => f.write_str("indicators"),
            Stage::Features => f.write_str("features"),
        }
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("insufficient data at {stage} stage: need at least {needed} rows, got {available}")]
    InsufficientData {
        stage: Stage,
        needed: usize,
        available: usize,
    },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Model(#[from] ModelError),
}

impl EngineError {
    pub fn is_insufficient_data(&self) -> bool {
        matches!(self, EngineError::InsufficientData { .. })
    }

    pub fn is_invalid_input(&self) -> bool {
        matches!(self, EngineError::InvalidInput(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_data_message_names_stage() {
        let err = EngineError::InsufficientData {
            stage: Stage::Features,
            needed: 15,
            available: 3,
        };
        assert_eq!(
            err.to_string(),
            "insufficient data at features stage: need at least 15 rows, got 3"
        );
        assert!(err.is_insufficient_data());
        assert!(!err.is_invalid_input());
    }
}
