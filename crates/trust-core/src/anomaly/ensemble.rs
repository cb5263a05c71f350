//! Ensemble trust scoring
//!
//! Signals are folded into per-category penalties, each clamped to 100,
//! then combined with the category weights into a 0-100 trust score.

use crate::config::EngineConfig;
use crate::models::{Category, CategoryBreakdown, CategoryScore, Severity, Signal};
use std::collections::BTreeMap;

/// Highest penalty a single category can accumulate
const MAX_CATEGORY_PENALTY: f64 = 100.0;

/// Outcome of ensemble scoring
#[derive(Debug, Clone, PartialEq)]
pub struct EnsembleScore {
    pub trust_score: f64,
    pub category_breakdown: CategoryBreakdown,
    /// Whether the persistence penalty was subtracted
    pub persistence_applied: bool,
}

/// Score fired signals
///
/// Non-critical signals carry the detector's full base penalty; critical
/// ones carry its critical penalty. The persistence penalty is subtracted
/// after weighting, only when a sustained anomaly is reported and this
/// evaluation fired at least one signal.
pub fn score_signals(signals: &[Signal], config: &EngineConfig, persistent: bool) -> EnsembleScore {
    let mut penalties: BTreeMap<Category, f64> =
        Category::ALL.iter().map(|c| (*c, 0.0)).collect();

    for signal in signals {
        let spec = signal.signal_type.spec();
        let penalty = if signal.severity == Severity::Critical {
            spec.critical_penalty
        } else {
            spec.base_penalty
        };
        *penalties.entry(signal.category).or_insert(0.0) += penalty;
    }

    let mut category_breakdown = CategoryBreakdown::new();
    let mut weighted_penalty = 0.0;

    for (category, penalty) in penalties {
        let clamped = penalty.min(MAX_CATEGORY_PENALTY);
        let weight = config.weights.weight(category);
        weighted_penalty += clamped * weight;
        category_breakdown.insert(
            category,
            CategoryScore {
                score: MAX_CATEGORY_PENALTY - clamped,
                weight,
            },
        );
    }

    let mut trust_score = (100.0 - weighted_penalty).clamp(0.0, 100.0);

    let persistence_applied = persistent && !signals.is_empty();
    if persistence_applied {
        trust_score = (trust_score - config.persistence_penalty).max(0.0);
    }

    EnsembleScore {
        trust_score,
        category_breakdown,
        persistence_applied,
    }
}
