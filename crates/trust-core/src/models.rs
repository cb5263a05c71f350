//! Core data models for the trust engine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single observed value of the monitored metric
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl MetricSample {
    pub fn new(value: f64) -> Self {
        Self {
            value,
            timestamp: None,
        }
    }

    pub fn at(value: f64, timestamp: i64) -> Self {
        Self {
            value,
            timestamp: Some(timestamp),
        }
    }
}

/// Population statistics over the values backing one evaluation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub mean: f64,
    pub std_deviation: f64,
    pub count: usize,
}

/// Detector category used for ensemble voting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    Statistical,
    Business,
    Temporal,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Statistical, Category::Business, Category::Temporal];
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::Statistical => write!(f, "STATISTICAL"),
            Category::Business => write!(f, "BUSINESS"),
            Category::Temporal => write!(f, "TEMPORAL"),
        }
    }
}

/// Signal severity, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Low => write!(f, "LOW"),
            Severity::Medium => write!(f, "MEDIUM"),
            Severity::High => write!(f, "HIGH"),
            Severity::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// The nine detector kinds of the signal bank
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalType {
    ZScore,
    HighZscore,
    BusinessRule,
    NegativeValue,
    DecimalShift,
    RateOfChange,
    DuplicateInflation,
    CurrencyFlip,
    DuplicateRows,
}

impl SignalType {
    pub const ALL: [SignalType; 9] = [
        SignalType::ZScore,
        SignalType::HighZscore,
        SignalType::BusinessRule,
        SignalType::NegativeValue,
        SignalType::DecimalShift,
        SignalType::RateOfChange,
        SignalType::DuplicateInflation,
        SignalType::CurrencyFlip,
        SignalType::DuplicateRows,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SignalType::ZScore => "Z_SCORE",
            SignalType::HighZscore => "HIGH_ZSCORE",
            SignalType::BusinessRule => "BUSINESS_RULE",
            SignalType::NegativeValue => "NEGATIVE_VALUE",
            SignalType::DecimalShift => "DECIMAL_SHIFT",
            SignalType::RateOfChange => "RATE_OF_CHANGE",
            SignalType::DuplicateInflation => "DUPLICATE_INFLATION",
            SignalType::CurrencyFlip => "CURRENCY_FLIP",
            SignalType::DuplicateRows => "DUPLICATE_ROWS",
        }
    }
}

impl std::fmt::Display for SignalType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One detector's positive finding for the current evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    #[serde(rename = "type")]
    pub signal_type: SignalType,
    pub category: Category,
    pub severity: Severity,
    /// Quantity that triggered the detector (z-score, ratio, raw value)
    pub value: f64,
    pub message: String,
}

/// Exact-match row duplication summary
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DuplicateInfo {
    pub has_duplicates: bool,
    pub duplicate_count: usize,
    pub duplicate_ratio: f64,
    pub total_rows: usize,
    pub unique_rows: usize,
}

/// Three-state verdict of the scoring state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerdictStatus {
    Safe,
    Warning,
    Locked,
}

impl std::fmt::Display for VerdictStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VerdictStatus::Safe => write!(f, "SAFE"),
            VerdictStatus::Warning => write!(f, "WARNING"),
            VerdictStatus::Locked => write!(f, "LOCKED"),
        }
    }
}

/// Score of a single category after clamping, with the weight it carried
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub score: f64,
    pub weight: f64,
}

pub type CategoryBreakdown = BTreeMap<Category, CategoryScore>;

/// Counts backing a fingerprint's voting summary
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VotingSummary {
    pub total: usize,
    pub by_severity: BTreeMap<Severity, usize>,
    pub by_category: BTreeMap<Category, usize>,
}

/// Explanation of the dominant anomaly pattern
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fingerprint {
    pub pattern: SignalType,
    pub description: String,
    pub root_cause: String,
    pub recommended_action: String,
    pub category: Category,
    pub voting_summary: VotingSummary,
    pub all_signals: Vec<SignalType>,
}

/// Full output record of one evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub status: VerdictStatus,
    pub is_safe: bool,
    pub trust_score: f64,
    pub signals: Vec<SignalType>,
    pub signal_details: Vec<Signal>,
    pub category_breakdown: CategoryBreakdown,
    pub duplicate_info: DuplicateInfo,
    pub fingerprint: Option<Fingerprint>,
    pub persistent_anomaly: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric_column: Option<String>,
    pub current_value: f64,
    pub statistics: Statistics,
    pub z_score: f64,
    pub message: String,
    pub evaluated_at: DateTime<Utc>,
}
