//! Signal detector bank
//!
//! Nine stateless detectors inspect the latest value, the previous value,
//! the population statistics and row duplication. Each may fire
//! independently; the business rule fires once per violated bound.

use crate::config::EngineConfig;
use crate::models::{DuplicateInfo, Severity, Signal, SignalType, Statistics};

/// Fraction of the z-threshold above which an elevated z-score is reported
const ELEVATED_Z_FRACTION: f64 = 0.7;

/// Multiple of the z-threshold above which a z-score signal is critical
const CRITICAL_Z_MULTIPLE: f64 = 1.5;

/// Everything a detector may look at
#[derive(Debug, Clone, Copy)]
pub struct DetectionInput<'a> {
    pub latest: f64,
    pub previous: Option<f64>,
    pub statistics: &'a Statistics,
    pub duplicates: &'a DuplicateInfo,
}

/// Runs every detector against one evaluation's input
pub struct DetectorBank<'a> {
    config: &'a EngineConfig,
}

impl<'a> DetectorBank<'a> {
    pub fn new(config: &'a EngineConfig) -> Self {
        Self { config }
    }

    /// Run all detectors, returning fired signals in detection order
    pub fn detect(&self, input: &DetectionInput<'_>) -> Vec<Signal> {
        let mut signals = Vec::new();

        signals.extend(self.z_score(input));
        signals.extend(self.high_z_score(input));
        signals.extend(self.business_rule(input));
        signals.extend(self.negative_value(input));
        signals.extend(self.decimal_shift(input));
        signals.extend(self.rate_of_change(input));
        signals.extend(self.duplicate_inflation(input));
        signals.extend(self.currency_flip(input));
        signals.extend(self.duplicate_rows(input));

        signals
    }

    fn z_score(&self, input: &DetectionInput<'_>) -> Option<Signal> {
        let threshold = self.config.z_threshold;
        let z = input.statistics.z_score(input.latest);
        if z <= threshold {
            return None;
        }

        let severity = if z > threshold * CRITICAL_Z_MULTIPLE {
            Severity::Critical
        } else {
            Severity::High
        };
        Some(signal(
            SignalType::ZScore,
            severity,
            z,
            format!(
                "Z-score {:.2} exceeds threshold {:.2} (mean {:.2}, std {:.2})",
                z, threshold, input.statistics.mean, input.statistics.std_deviation
            ),
        ))
    }

    fn high_z_score(&self, input: &DetectionInput<'_>) -> Option<Signal> {
        let threshold = self.config.z_threshold;
        let z = input.statistics.z_score(input.latest);
        if z <= threshold * ELEVATED_Z_FRACTION || z > threshold {
            return None;
        }

        Some(signal(
            SignalType::HighZscore,
            Severity::Low,
            z,
            format!(
                "Z-score {:.2} is approaching threshold {:.2}",
                z, threshold
            ),
        ))
    }

    fn business_rule(&self, input: &DetectionInput<'_>) -> Vec<Signal> {
        let mut signals = Vec::new();

        if let Some(min) = self.config.min_value {
            if input.latest < min {
                signals.push(signal(
                    SignalType::BusinessRule,
                    Severity::Critical,
                    input.latest,
                    format!("Value {:.2} is below the minimum bound {:.2}", input.latest, min),
                ));
            }
        }
        if let Some(max) = self.config.max_value {
            if input.latest > max {
                signals.push(signal(
                    SignalType::BusinessRule,
                    Severity::Critical,
                    input.latest,
                    format!("Value {:.2} is above the maximum bound {:.2}", input.latest, max),
                ));
            }
        }

        signals
    }

    fn negative_value(&self, input: &DetectionInput<'_>) -> Option<Signal> {
        if input.latest >= 0.0 {
            return None;
        }

        Some(signal(
            SignalType::NegativeValue,
            Severity::Critical,
            input.latest,
            format!("Value {:.2} is negative", input.latest),
        ))
    }

    fn decimal_shift(&self, input: &DetectionInput<'_>) -> Option<Signal> {
        let ratio = input.statistics.ratio_to_mean(input.latest)?;
        if ratio <= self.config.decimal_shift_multiplier {
            return None;
        }

        Some(signal(
            SignalType::DecimalShift,
            Severity::Critical,
            ratio,
            format!(
                "Value is {:.1}x the historical mean, likely a misplaced decimal",
                ratio
            ),
        ))
    }

    fn rate_of_change(&self, input: &DetectionInput<'_>) -> Option<Signal> {
        let previous = input.previous.filter(|p| *p != 0.0)?;
        let change = (input.latest - previous).abs() / previous.abs();
        if change <= self.config.rate_of_change_threshold {
            return None;
        }

        let severity = if change > self.config.rate_of_change_critical {
            Severity::Critical
        } else {
            Severity::High
        };
        Some(signal(
            SignalType::RateOfChange,
            severity,
            change,
            format!(
                "Value moved {:.1}% from the previous reading {:.2}",
                change * 100.0,
                previous
            ),
        ))
    }

    fn duplicate_inflation(&self, input: &DetectionInput<'_>) -> Option<Signal> {
        let ratio = input.statistics.ratio_to_mean(input.latest)?;
        if !self.config.duplicate_inflation_band.contains(ratio) {
            return None;
        }

        Some(signal(
            SignalType::DuplicateInflation,
            Severity::Medium,
            ratio,
            format!(
                "Value is inflated {:.1}% over the mean, consistent with double-counted rows",
                (ratio - 1.0) * 100.0
            ),
        ))
    }

    fn currency_flip(&self, input: &DetectionInput<'_>) -> Option<Signal> {
        let ratio = input.statistics.ratio_to_mean(input.latest)?;
        if !self.config.currency_flip_band.contains_upper(ratio) {
            return None;
        }

        Some(signal(
            SignalType::CurrencyFlip,
            Severity::Medium,
            ratio,
            format!(
                "Value is {:.2}x the mean, consistent with a currency conversion change",
                ratio
            ),
        ))
    }

    fn duplicate_rows(&self, input: &DetectionInput<'_>) -> Option<Signal> {
        let ratio = input.duplicates.duplicate_ratio;
        if ratio <= self.config.duplicate_ratio_threshold {
            return None;
        }

        let severity = if ratio > self.config.duplicate_ratio_critical {
            Severity::Critical
        } else {
            Severity::Medium
        };
        Some(signal(
            SignalType::DuplicateRows,
            severity,
            ratio,
            format!(
                "{} of {} rows are exact duplicates ({:.1}%)",
                input.duplicates.duplicate_count,
                input.duplicates.total_rows,
                ratio * 100.0
            ),
        ))
    }
}

fn signal(signal_type: SignalType, severity: Severity, value: f64, message: String) -> Signal {
    Signal {
        signal_type,
        category: signal_type.category(),
        severity,
        value,
        message,
    }
}
