//! Engine configuration
//!
//! Every threshold the detector bank, ensemble scorer and verdict state
//! machine consult lives in [`EngineConfig`]. The value is passed to the
//! engine at construction; only the z-score threshold can change afterwards.

use crate::error::ConfigError;
use crate::history::DEFAULT_HISTORY_SIZE;
use crate::models::Category;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default evaluation poll interval
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Tolerance when checking that ensemble weights sum to 1.0
const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Ratio band `[low, high]` relative to the population mean
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatioBand {
    pub low: f64,
    pub high: f64,
}

impl RatioBand {
    pub const fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    /// `low <= ratio <= high`
    pub fn contains(&self, ratio: f64) -> bool {
        ratio >= self.low && ratio <= self.high
    }

    /// `low < ratio <= high`
    pub fn contains_upper(&self, ratio: f64) -> bool {
        ratio > self.low && ratio <= self.high
    }
}

/// Category weights for ensemble voting
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnsembleWeights {
    pub statistical: f64,
    pub business: f64,
    pub temporal: f64,
}

impl EnsembleWeights {
    pub fn weight(&self, category: Category) -> f64 {
        match category {
            Category::Statistical => self.statistical,
            Category::Business => self.business,
            Category::Temporal => self.temporal,
        }
    }

    pub fn sum(&self) -> f64 {
        self.statistical + self.business + self.temporal
    }
}

impl Default for EnsembleWeights {
    fn default() -> Self {
        Self {
            statistical: 0.40,
            business: 0.35,
            temporal: 0.25,
        }
    }
}

/// Configuration for one monitored metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Column name candidates, highest priority first
    pub metric_candidates: Vec<String>,
    /// Absolute lower business bound
    pub min_value: Option<f64>,
    /// Absolute upper business bound
    pub max_value: Option<f64>,
    /// Z-score above which a value is anomalous
    pub z_threshold: f64,
    /// Lowest z-threshold accepted by live adjustment
    pub z_threshold_min: f64,
    /// Highest z-threshold accepted by live adjustment
    pub z_threshold_max: f64,
    /// Fraction of the previous value beyond which a change is anomalous
    pub rate_of_change_threshold: f64,
    /// Change fraction above which a rate-of-change signal is critical
    pub rate_of_change_critical: f64,
    /// Mean multiplier beyond which a decimal shift is assumed
    pub decimal_shift_multiplier: f64,
    pub duplicate_inflation_band: RatioBand,
    pub currency_flip_band: RatioBand,
    /// Duplicate row ratio that fires a signal
    pub duplicate_ratio_threshold: f64,
    /// Duplicate row ratio that makes the signal critical
    pub duplicate_ratio_critical: f64,
    pub persistence_window: usize,
    pub persistence_required: usize,
    /// Extra penalty applied while an anomaly is sustained
    pub persistence_penalty: f64,
    pub weights: EnsembleWeights,
    /// Scores strictly below this lock the content
    pub lock_threshold: f64,
    /// Scores at or above this are fully safe
    pub warn_threshold: f64,
    /// Number of evaluated values kept for display
    pub history_size: usize,
    pub poll_interval_secs: u64,
    /// Gate for value injection; never enable outside demos and tests
    pub allow_demo_override: bool,
    /// Substitute for the true latest reading
    pub demo_override: Option<f64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            metric_candidates: vec![
                "gross margin".to_string(),
                "margin".to_string(),
                "profit ratio".to_string(),
                "profit".to_string(),
            ],
            min_value: None,
            max_value: None,
            z_threshold: 2.5,
            z_threshold_min: 1.0,
            z_threshold_max: 5.0,
            rate_of_change_threshold: 0.20,
            rate_of_change_critical: 0.30,
            decimal_shift_multiplier: 50.0,
            duplicate_inflation_band: RatioBand::new(1.08, 1.15),
            currency_flip_band: RatioBand::new(1.15, 1.25),
            duplicate_ratio_threshold: 0.01,
            duplicate_ratio_critical: 0.05,
            persistence_window: 3,
            persistence_required: 2,
            persistence_penalty: 15.0,
            weights: EnsembleWeights::default(),
            lock_threshold: 65.0,
            warn_threshold: 90.0,
            history_size: DEFAULT_HISTORY_SIZE,
            poll_interval_secs: DEFAULT_POLL_INTERVAL.as_secs(),
            allow_demo_override: false,
            demo_override: None,
        }
    }
}

impl EngineConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Reject configurations the engine cannot score with consistently
    pub fn validate(&self) -> Result<(), ConfigError> {
        for category in Category::ALL {
            if self.weights.weight(category) < 0.0 {
                return Err(ConfigError::NegativeWeight(category.to_string()));
            }
        }
        let sum = self.weights.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ConfigError::WeightsSum(sum));
        }

        if self.lock_threshold >= self.warn_threshold {
            return Err(ConfigError::VerdictThresholds {
                lock: self.lock_threshold,
                warn: self.warn_threshold,
            });
        }

        self.check_z_threshold(self.z_threshold)?;

        for (name, band) in [
            ("duplicate inflation", self.duplicate_inflation_band),
            ("currency flip", self.currency_flip_band),
        ] {
            if band.low > band.high {
                return Err(ConfigError::InvertedBand {
                    name,
                    low: band.low,
                    high: band.high,
                });
            }
        }

        if let (Some(min), Some(max)) = (self.min_value, self.max_value) {
            if min > max {
                return Err(ConfigError::InvertedBounds { min, max });
            }
        }

        if self.persistence_window == 0 {
            return Err(ConfigError::NotPositive("persistence window"));
        }
        if self.persistence_required == 0 {
            return Err(ConfigError::NotPositive("persistence required occurrences"));
        }
        if self.persistence_required > self.persistence_window {
            return Err(ConfigError::PersistenceRequirement {
                required: self.persistence_required,
                window: self.persistence_window,
            });
        }
        if self.history_size == 0 {
            return Err(ConfigError::NotPositive("history size"));
        }
        if self.poll_interval_secs == 0 {
            return Err(ConfigError::NotPositive("poll interval"));
        }

        Ok(())
    }

    /// Check a z-threshold against the allowed live-adjustment range
    pub fn check_z_threshold(&self, value: f64) -> Result<(), ConfigError> {
        if !(self.z_threshold_min..=self.z_threshold_max).contains(&value) {
            return Err(ConfigError::ZThresholdOutOfRange {
                value,
                min: self.z_threshold_min,
                max: self.z_threshold_max,
            });
        }
        Ok(())
    }
}
