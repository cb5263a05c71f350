//! Population statistics
//!
//! Mean and population standard deviation over the baseline values
//! backing an evaluation.

use crate::error::EngineError;
use crate::models::Statistics;

/// Compute mean and population standard deviation
///
/// Uses the two-pass algorithm for numerical stability. Variance divides by
/// `n`, not `n - 1`.
///
/// # Errors
/// * `EngineError::InsufficientData` if `values` is empty
pub fn compute_statistics(values: &[f64]) -> Result<Statistics, EngineError> {
    if values.is_empty() {
        return Err(EngineError::InsufficientData);
    }

    let count = values.len();
    let mean = values.iter().sum::<f64>() / count as f64;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count as f64;

    Ok(Statistics {
        mean,
        std_deviation: variance.sqrt(),
        count,
    })
}

impl Statistics {
    /// Standard deviation used as the z-score denominator
    ///
    /// A spread below one (including zero variance) is treated as one, so
    /// any deviation from a flat history reads as large instead of dividing
    /// by zero.
    pub fn z_denominator(&self) -> f64 {
        self.std_deviation.max(1.0)
    }

    /// Absolute z-score of `value` against this population
    pub fn z_score(&self, value: f64) -> f64 {
        (value - self.mean).abs() / self.z_denominator()
    }

    /// `value / mean`, or `None` when the mean is not positive
    pub fn ratio_to_mean(&self, value: f64) -> Option<f64> {
        if self.mean > 0.0 {
            Some(value / self.mean)
        } else {
            None
        }
    }
}
