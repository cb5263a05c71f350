//! Multi-metric dashboard status
//!
//! Folds the state of every monitor into one answer for the host: can the
//! dashboard be shown at all. A monitor in error counts against safety.

use crate::audit::AuditEntry;
use crate::models::VerdictStatus;
use crate::monitor::MonitorState;
use serde::{Deserialize, Serialize};

/// Per-metric state as shown on the dashboard, ordered by severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DisplayState {
    Unknown,
    Safe,
    Warning,
    Pending,
    Error,
    Locked,
}

impl DisplayState {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisplayState::Unknown => "UNKNOWN",
            DisplayState::Safe => "SAFE",
            DisplayState::Warning => "WARNING",
            DisplayState::Pending => "PENDING",
            DisplayState::Error => "ERROR",
            DisplayState::Locked => "LOCKED",
        }
    }

    pub fn is_safe(&self) -> bool {
        matches!(self, DisplayState::Safe | DisplayState::Warning)
    }
}

impl std::fmt::Display for DisplayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<VerdictStatus> for DisplayState {
    fn from(status: VerdictStatus) -> Self {
        match status {
            VerdictStatus::Safe => DisplayState::Safe,
            VerdictStatus::Warning => DisplayState::Warning,
            VerdictStatus::Locked => DisplayState::Locked,
        }
    }
}

/// One row of the dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSummary {
    pub metric: String,
    pub state: DisplayState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trust_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    pub message: String,
}

impl MetricSummary {
    pub fn from_state(metric: &str, state: &MonitorState) -> Self {
        match state {
            MonitorState::Pending => Self {
                metric: metric.to_string(),
                state: DisplayState::Pending,
                trust_score: None,
                current_value: None,
                pattern: None,
                message: "Awaiting first evaluation".to_string(),
            },
            MonitorState::Scored { result } => Self {
                metric: metric.to_string(),
                state: result.status.into(),
                trust_score: Some(result.trust_score),
                current_value: Some(result.current_value),
                pattern: result.fingerprint.as_ref().map(|f| f.pattern.to_string()),
                message: result.message.clone(),
            },
            MonitorState::Error { kind, reason, .. } => Self {
                metric: metric.to_string(),
                state: DisplayState::Error,
                trust_score: None,
                current_value: None,
                pattern: None,
                message: format!("{}: {}", kind, reason),
            },
        }
    }
}

/// Aggregate status over all monitors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardStatus {
    pub is_safe: bool,
    pub status: DisplayState,
    pub message: String,
    pub metrics_checked: usize,
    pub anomalies_detected: usize,
    pub errors: usize,
    /// Mean trust score of scored monitors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence_score: Option<f64>,
    pub details: Vec<MetricSummary>,
    /// Most recent audit entry across monitors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_audit: Option<AuditEntry>,
}

/// Combine per-metric summaries into the dashboard answer
pub fn aggregate(mut details: Vec<MetricSummary>, last_audit: Option<AuditEntry>) -> DashboardStatus {
    details.sort_by(|a, b| a.metric.cmp(&b.metric));

    let status = details
        .iter()
        .map(|d| d.state)
        .max()
        .unwrap_or(DisplayState::Unknown);
    let is_safe = details.iter().all(|d| d.state.is_safe());
    let anomalies_detected = details
        .iter()
        .filter(|d| d.state == DisplayState::Locked)
        .count();
    let errors = details
        .iter()
        .filter(|d| d.state == DisplayState::Error)
        .count();

    let scores: Vec<f64> = details.iter().filter_map(|d| d.trust_score).collect();
    let confidence_score = if scores.is_empty() {
        None
    } else {
        Some(scores.iter().sum::<f64>() / scores.len() as f64)
    };

    let message = match status {
        DisplayState::Unknown => "No metrics are being monitored".to_string(),
        DisplayState::Safe => format!("All {} metrics verified", details.len()),
        DisplayState::Warning => "Data verified with warnings".to_string(),
        DisplayState::Pending => "Waiting for first evaluation".to_string(),
        DisplayState::Error => format!("{} metric(s) could not be evaluated", errors),
        DisplayState::Locked => format!("{} metric(s) locked for anomalies", anomalies_detected),
    };

    DashboardStatus {
        is_safe,
        status,
        message,
        metrics_checked: details.len(),
        anomalies_detected,
        errors,
        confidence_score,
        details,
        last_audit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::engine::TrustEngine;

    fn summary(metric: &str, state: DisplayState, score: Option<f64>) -> MetricSummary {
        MetricSummary {
            metric: metric.to_string(),
            state,
            trust_score: score,
            current_value: None,
            pattern: None,
            message: String::new(),
        }
    }

    #[test]
    fn test_empty_dashboard_is_unknown_but_safe() {
        let status = aggregate(Vec::new(), None);
        assert!(status.is_safe);
        assert_eq!(status.status, DisplayState::Unknown);
        assert_eq!(status.metrics_checked, 0);
        assert!(status.confidence_score.is_none());
    }

    #[test]
    fn test_all_safe() {
        let status = aggregate(
            vec![
                summary("margin", DisplayState::Safe, Some(100.0)),
                summary("profit", DisplayState::Warning, Some(80.0)),
            ],
            None,
        );
        assert!(status.is_safe);
        assert_eq!(status.status, DisplayState::Warning);
        assert_eq!(status.confidence_score, Some(90.0));
    }

    #[test]
    fn test_any_lock_blocks_dashboard() {
        let status = aggregate(
            vec![
                summary("margin", DisplayState::Safe, Some(100.0)),
                summary("profit", DisplayState::Locked, Some(7.5)),
            ],
            None,
        );
        assert!(!status.is_safe);
        assert_eq!(status.status, DisplayState::Locked);
        assert_eq!(status.anomalies_detected, 1);
    }

    #[test]
    fn test_error_fails_closed() {
        let status = aggregate(
            vec![
                summary("margin", DisplayState::Safe, Some(100.0)),
                summary("profit", DisplayState::Error, None),
            ],
            None,
        );
        assert!(!status.is_safe);
        assert_eq!(status.status, DisplayState::Error);
        assert_eq!(status.errors, 1);
        assert_eq!(status.anomalies_detected, 0);
        assert_eq!(status.confidence_score, Some(100.0));
    }

    #[test]
    fn test_pending_is_not_safe() {
        let status = aggregate(vec![summary("margin", DisplayState::Pending, None)], None);
        assert!(!status.is_safe);
        assert_eq!(status.status, DisplayState::Pending);
    }

    #[test]
    fn test_details_sorted_by_metric() {
        let status = aggregate(
            vec![
                summary("b", DisplayState::Safe, None),
                summary("a", DisplayState::Safe, None),
            ],
            None,
        );
        assert_eq!(status.details[0].metric, "a");
    }

    #[test]
    fn test_error_state_summary() {
        let state = MonitorState::Error {
            kind: "metric_not_found".to_string(),
            reason: "no margin column".to_string(),
            at: chrono::Utc::now(),
        };
        let summary = MetricSummary::from_state("margin", &state);
        assert_eq!(summary.state, DisplayState::Error);
        assert!(summary.message.starts_with("metric_not_found"));
    }

    #[test]
    fn test_scored_summary_names_primary_pattern() {
        let mut engine = TrustEngine::new(EngineConfig::default()).unwrap();
        let result = engine
            .evaluate_values(&[20.0, 22.0, 21.0, 23.0, 22.0, 2400.0])
            .unwrap();
        let expected = result.fingerprint.as_ref().unwrap().pattern.to_string();

        let state = MonitorState::Scored {
            result: Box::new(result),
        };
        let summary = MetricSummary::from_state("margin", &state);
        assert_eq!(summary.state, DisplayState::Locked);
        assert_eq!(summary.pattern, Some(expected));
        assert!(summary.trust_score.unwrap() < 65.0);
    }
}
