//! Static detector registry
//!
//! Penalties each detector contributes to its category when it fires.

use crate::models::{Category, SignalType};

/// Penalty configuration for one detector kind
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectorSpec {
    pub category: Category,
    /// Penalty for LOW, MEDIUM and HIGH signals
    pub base_penalty: f64,
    /// Penalty for CRITICAL signals
    pub critical_penalty: f64,
}

impl SignalType {
    /// Registry entry for this detector
    pub const fn spec(&self) -> DetectorSpec {
        let (category, base_penalty, critical_penalty) = match self {
            SignalType::ZScore => (Category::Statistical, 60.0, 100.0),
            SignalType::HighZscore => (Category::Statistical, 20.0, 20.0),
            SignalType::BusinessRule => (Category::Business, 80.0, 100.0),
            SignalType::NegativeValue => (Category::Business, 100.0, 100.0),
            SignalType::DecimalShift => (Category::Business, 90.0, 100.0),
            SignalType::RateOfChange => (Category::Temporal, 40.0, 70.0),
            SignalType::DuplicateInflation => (Category::Temporal, 35.0, 60.0),
            SignalType::CurrencyFlip => (Category::Temporal, 45.0, 70.0),
            SignalType::DuplicateRows => (Category::Temporal, 40.0, 80.0),
        };
        DetectorSpec {
            category,
            base_penalty,
            critical_penalty,
        }
    }

    pub const fn category(&self) -> Category {
        self.spec().category
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories_match_detector_bank() {
        let statistical = [SignalType::ZScore, SignalType::HighZscore];
        let business = [
            SignalType::BusinessRule,
            SignalType::NegativeValue,
            SignalType::DecimalShift,
        ];

        for t in SignalType::ALL {
            let expected = if statistical.contains(&t) {
                Category::Statistical
            } else if business.contains(&t) {
                Category::Business
            } else {
                Category::Temporal
            };
            assert_eq!(t.category(), expected, "{}", t);
        }
    }

    #[test]
    fn test_penalties_are_bounded() {
        for t in SignalType::ALL {
            let spec = t.spec();
            assert!(spec.base_penalty > 0.0 && spec.base_penalty <= 100.0);
            assert!(spec.critical_penalty >= spec.base_penalty);
            assert!(spec.critical_penalty <= 100.0);
        }
    }
}
