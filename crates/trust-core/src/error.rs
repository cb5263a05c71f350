//! Error types for evaluation and configuration

use thiserror::Error;

/// Failure of a single evaluation cycle. None of these produce a score.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("no column matched any of the metric candidates {candidates:?}")]
    MetricNotFound { candidates: Vec<String> },

    #[error("column '{column}' contains no numeric values")]
    NoNumericData { column: String },

    #[error("cannot compute statistics over an empty population")]
    InsufficientData,
}

impl EngineError {
    /// Stable label used for metrics and the error display state
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::MetricNotFound { .. } => "metric_not_found",
            EngineError::NoNumericData { .. } => "no_numeric_data",
            EngineError::InsufficientData => "insufficient_data",
        }
    }
}

/// Rejected engine configuration or live adjustment
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("ensemble weights must sum to 1.0, got {0:.4}")]
    WeightsSum(f64),

    #[error("ensemble weight for {0} must be non-negative")]
    NegativeWeight(String),

    #[error("lock threshold {lock} must be below warn threshold {warn}")]
    VerdictThresholds { lock: f64, warn: f64 },

    #[error("z-score threshold {value} outside allowed range [{min}, {max}]")]
    ZThresholdOutOfRange { value: f64, min: f64, max: f64 },

    #[error("{name} band is inverted: {low} > {high}")]
    InvertedBand {
        name: &'static str,
        low: f64,
        high: f64,
    },

    #[error("minimum bound {min} exceeds maximum bound {max}")]
    InvertedBounds { min: f64, max: f64 },

    #[error("{0} must be greater than zero")]
    NotPositive(&'static str),

    #[error("required occurrences {required} exceed persistence window {window}")]
    PersistenceRequirement { required: usize, window: usize },

    #[error("demo value injection is disabled for this monitor")]
    DemoOverrideDisabled,
}
