//! Verdict state machine
//!
//! Maps a trust score onto SAFE / WARNING / LOCKED. Only `is_safe` leaves the
//! engine towards the host; the status is for display.

use crate::config::EngineConfig;
use crate::models::VerdictStatus;

/// Verdict derived from a trust score
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    pub status: VerdictStatus,
    pub is_safe: bool,
}

/// Classify a trust score. The lock boundary itself does not lock.
pub fn classify(trust_score: f64, config: &EngineConfig) -> Verdict {
    let status = if trust_score < config.lock_threshold {
        VerdictStatus::Locked
    } else if trust_score < config.warn_threshold {
        VerdictStatus::Warning
    } else {
        VerdictStatus::Safe
    };

    Verdict {
        status,
        is_safe: status != VerdictStatus::Locked,
    }
}

/// One-line explanation for display and the audit log
pub fn summary_message(
    metric: &str,
    value: f64,
    status: VerdictStatus,
    trust_score: f64,
    primary_cause: Option<&str>,
) -> String {
    match status {
        VerdictStatus::Safe => format!(
            "Verified: {} is {:.2}, within normal range (trust {:.0})",
            metric, value, trust_score
        ),
        VerdictStatus::Warning => format!(
            "Warning: {} is {:.2}, slightly unusual (trust {:.0}){}",
            metric,
            value,
            trust_score,
            primary_cause
                .map(|cause| format!(": {}", cause))
                .unwrap_or_default()
        ),
        VerdictStatus::Locked => format!(
            "Locked: {} is {:.2} (trust {:.0}){}",
            metric,
            value,
            trust_score,
            primary_cause
                .map(|cause| format!(": {}", cause))
                .unwrap_or_default()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_boundary_is_inclusive_of_warning() {
        let config = EngineConfig::default();
        assert_eq!(classify(65.0, &config).status, VerdictStatus::Warning);
        assert!(classify(65.0, &config).is_safe);

        let locked = classify(64.999, &config);
        assert_eq!(locked.status, VerdictStatus::Locked);
        assert!(!locked.is_safe);
    }

    #[test]
    fn test_warn_boundary() {
        let config = EngineConfig::default();
        assert_eq!(classify(89.9, &config).status, VerdictStatus::Warning);
        assert_eq!(classify(90.0, &config).status, VerdictStatus::Safe);
        assert_eq!(classify(100.0, &config).status, VerdictStatus::Safe);
        assert_eq!(classify(0.0, &config).status, VerdictStatus::Locked);
    }

    #[test]
    fn test_summary_message_names_cause() {
        let message = summary_message(
            "Gross Margin",
            2400.0,
            VerdictStatus::Locked,
            7.5,
            Some("Decimal place error"),
        );
        assert!(message.starts_with("Locked: Gross Margin is 2400.00"));
        assert!(message.ends_with("Decimal place error"));
    }
}
