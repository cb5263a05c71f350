//! Anomaly fingerprinting
//!
//! Picks the primary signal, attaches a fixed root cause and recommended
//! action, and summarises how the detectors voted.

use crate::models::{Fingerprint, Severity, Signal, SignalType, VotingSummary};

/// Root cause and recommended action for a detector kind
pub fn explanation(signal_type: SignalType) -> (&'static str, &'static str) {
    match signal_type {
        SignalType::ZScore => (
            "Statistical outlier far outside historical variation",
            "Verify the upstream extract and recent data loads before sharing",
        ),
        SignalType::HighZscore => (
            "Value drifting toward the edge of normal variation",
            "Monitor the next refreshes; no action needed yet",
        ),
        SignalType::BusinessRule => (
            "Value violates configured business bounds",
            "Check calculation logic and filters against the business definition",
        ),
        SignalType::NegativeValue => (
            "Impossible negative value for this metric",
            "Inspect sign handling in joins, returns and adjustments",
        ),
        SignalType::DecimalShift => (
            "Decimal place error or unit mismatch",
            "Check percentage vs ratio formatting and unit conversions",
        ),
        SignalType::RateOfChange => (
            "Abrupt change from the previous reading",
            "Compare the latest load with the previous one for missing or partial data",
        ),
        SignalType::DuplicateInflation => (
            "Rows counted more than once by a join or reload",
            "Look for fan-out joins and re-run deduplication",
        ),
        SignalType::CurrencyFlip => (
            "Currency conversion applied, dropped or switched",
            "Confirm the currency and exchange-rate table used by the source",
        ),
        SignalType::DuplicateRows => (
            "Exact duplicate rows in the source data",
            "Deduplicate the source extract and check incremental load keys",
        ),
    }
}

/// Primary signal: first CRITICAL, else first HIGH, else the first fired
pub fn primary_signal(signals: &[Signal]) -> Option<&Signal> {
    signals
        .iter()
        .find(|s| s.severity == Severity::Critical)
        .or_else(|| signals.iter().find(|s| s.severity == Severity::High))
        .or_else(|| signals.first())
}

fn voting_summary(signals: &[Signal]) -> VotingSummary {
    let mut summary = VotingSummary {
        total: signals.len(),
        ..Default::default()
    };
    for signal in signals {
        *summary.by_severity.entry(signal.severity).or_insert(0) += 1;
        *summary.by_category.entry(signal.category).or_insert(0) += 1;
    }
    summary
}

/// Build a fingerprint, or `None` when nothing fired
pub fn generate_fingerprint(signals: &[Signal]) -> Option<Fingerprint> {
    let primary = primary_signal(signals)?;
    let (root_cause, recommended_action) = explanation(primary.signal_type);

    Some(Fingerprint {
        pattern: primary.signal_type,
        description: primary.message.clone(),
        root_cause: root_cause.to_string(),
        recommended_action: recommended_action.to_string(),
        category: primary.category,
        voting_summary: voting_summary(signals),
        all_signals: signals.iter().map(|s| s.signal_type).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;

    fn sig(signal_type: SignalType, severity: Severity) -> Signal {
        Signal {
            signal_type,
            category: signal_type.category(),
            severity,
            value: 1.0,
            message: format!("{} fired", signal_type),
        }
    }

    #[test]
    fn test_no_signals_no_fingerprint() {
        assert!(generate_fingerprint(&[]).is_none());
    }

    #[test]
    fn test_critical_wins_over_earlier_high() {
        let signals = [
            sig(SignalType::ZScore, Severity::High),
            sig(SignalType::RateOfChange, Severity::Medium),
            sig(SignalType::DuplicateRows, Severity::Critical),
        ];
        let fp = generate_fingerprint(&signals).unwrap();
        assert_eq!(fp.pattern, SignalType::DuplicateRows);
        assert_eq!(fp.category, Category::Temporal);
        assert_eq!(fp.description, "DUPLICATE_ROWS fired");
    }

    #[test]
    fn test_high_wins_when_no_critical() {
        let signals = [
            sig(SignalType::HighZscore, Severity::Low),
            sig(SignalType::RateOfChange, Severity::High),
        ];
        assert_eq!(
            primary_signal(&signals).map(|s| s.signal_type),
            Some(SignalType::RateOfChange)
        );
    }

    #[test]
    fn test_falls_back_to_detection_order() {
        let signals = [
            sig(SignalType::CurrencyFlip, Severity::Medium),
            sig(SignalType::HighZscore, Severity::Low),
        ];
        let fp = generate_fingerprint(&signals).unwrap();
        assert_eq!(fp.pattern, SignalType::CurrencyFlip);
        assert_eq!(
            fp.root_cause,
            explanation(SignalType::CurrencyFlip).0.to_string()
        );
    }

    #[test]
    fn test_voting_summary_counts() {
        let signals = [
            sig(SignalType::ZScore, Severity::Critical),
            sig(SignalType::DecimalShift, Severity::Critical),
            sig(SignalType::RateOfChange, Severity::Critical),
            sig(SignalType::DuplicateInflation, Severity::Medium),
        ];
        let fp = generate_fingerprint(&signals).unwrap();
        let summary = &fp.voting_summary;
        assert_eq!(summary.total, 4);
        assert_eq!(summary.by_severity[&Severity::Critical], 3);
        assert_eq!(summary.by_severity[&Severity::Medium], 1);
        assert!(!summary.by_severity.contains_key(&Severity::High));
        assert_eq!(summary.by_category[&Category::Temporal], 2);
        assert_eq!(fp.all_signals.len(), 4);
    }
}
