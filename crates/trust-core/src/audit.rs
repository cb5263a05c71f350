//! In-memory audit log
//!
//! One entry per evaluation attempt, scored or failed. Bounded FIFO; the
//! oldest entries are dropped first and nothing survives a restart.

use crate::models::{EvaluationResult, VerdictStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::RwLock;

/// Default number of retained entries per monitor
pub const DEFAULT_AUDIT_CAPACITY: usize = 500;

/// A single audit record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub metric: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub baseline_mean: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub baseline_std: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub z_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trust_score: Option<f64>,
    /// Verdict status, or `ERROR` when the evaluation produced no score
    pub status: String,
    pub message: String,
    pub checked_at: DateTime<Utc>,
}

impl AuditEntry {
    pub fn scored(metric: &str, result: &EvaluationResult) -> Self {
        Self {
            metric: metric.to_string(),
            current_value: Some(result.current_value),
            baseline_mean: Some(result.statistics.mean),
            baseline_std: Some(result.statistics.std_deviation),
            z_score: Some(result.z_score),
            trust_score: Some(result.trust_score),
            status: result.status.to_string(),
            message: result.message.clone(),
            checked_at: result.evaluated_at,
        }
    }

    pub fn failed(metric: &str, reason: &str) -> Self {
        Self {
            metric: metric.to_string(),
            current_value: None,
            baseline_mean: None,
            baseline_std: None,
            z_score: None,
            trust_score: None,
            status: "ERROR".to_string(),
            message: reason.to_string(),
            checked_at: Utc::now(),
        }
    }

    pub fn is_locked(&self) -> bool {
        self.status == VerdictStatus::Locked.to_string()
    }
}

/// Bounded, thread-safe audit log
#[derive(Debug)]
pub struct AuditLog {
    entries: RwLock<VecDeque<AuditEntry>>,
    capacity: usize,
}

impl AuditLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(VecDeque::with_capacity(capacity.min(1024))),
            capacity: capacity.max(1),
        }
    }

    pub fn record(&self, entry: AuditEntry) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.push_back(entry);
        while entries.len() > self.capacity {
            entries.pop_front();
        }
    }

    /// Newest entries first, at most `limit`
    pub fn recent(&self, limit: usize) -> Vec<AuditEntry> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.iter().rev().take(limit).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new(DEFAULT_AUDIT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_drops_oldest() {
        let log = AuditLog::new(2);
        log.record(AuditEntry::failed("margin", "first"));
        log.record(AuditEntry::failed("margin", "second"));
        log.record(AuditEntry::failed("margin", "third"));

        assert_eq!(log.len(), 2);
        let recent = log.recent(10);
        assert_eq!(recent[0].message, "third");
        assert_eq!(recent[1].message, "second");
    }

    #[test]
    fn test_recent_respects_limit() {
        let log = AuditLog::default();
        for i in 0..5 {
            log.record(AuditEntry::failed("margin", &format!("entry {}", i)));
        }
        let recent = log.recent(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].message, "entry 4");
    }

    #[test]
    fn test_failed_entry_has_error_status() {
        let entry = AuditEntry::failed("margin", "column missing");
        assert_eq!(entry.status, "ERROR");
        assert!(entry.trust_score.is_none());
        assert!(!entry.is_locked());
    }
}
