//! Trust evaluation engine
//!
//! [`evaluate`] is the pure pipeline: statistics, duplicate analysis, the
//! detector bank, persistence, ensemble scoring, verdict and fingerprint.
//! [`TrustEngine`] wraps it with the state carried between evaluations of one
//! metric: the recent value window, the persistence tracker and the demo
//! override.

use crate::anomaly::{
    analyze_duplicates, classify, compute_statistics, generate_fingerprint, score_signals,
    summary_message, DetectionInput, DetectorBank, PersistenceTracker,
};
use crate::config::EngineConfig;
use crate::error::{ConfigError, EngineError};
use crate::history::HistoryWindow;
use crate::models::EvaluationResult;
use crate::table::{extract_metric, Cell, DataTable};
use chrono::Utc;
use tracing::debug;

/// Label used in messages when the metric column is unknown
const DEFAULT_METRIC_LABEL: &str = "metric";

/// Input of a single evaluation
#[derive(Debug, Clone, Copy)]
pub struct EvaluationInput<'a> {
    /// Matched metric column, if the input came from a table
    pub metric: Option<&'a str>,
    pub latest: f64,
    pub previous: Option<f64>,
    /// Baseline the statistics are computed over, without `latest`
    pub population: &'a [f64],
    /// Raw rows for duplicate analysis; empty skips it
    pub rows: &'a [Vec<Cell>],
}

/// Run the full scoring pipeline once
///
/// The persistence tracker is only touched once statistics succeed, so a
/// failed evaluation leaves it unchanged.
pub fn evaluate(
    input: &EvaluationInput<'_>,
    config: &EngineConfig,
    persistence: &mut PersistenceTracker,
) -> Result<EvaluationResult, EngineError> {
    let statistics = compute_statistics(input.population)?;
    let duplicate_info = analyze_duplicates(input.rows);

    let detection = DetectionInput {
        latest: input.latest,
        previous: input.previous,
        statistics: &statistics,
        duplicates: &duplicate_info,
    };
    let signal_details = DetectorBank::new(config).detect(&detection);

    let persistent_anomaly = persistence.record_and_check(signal_details.len());
    let score = score_signals(&signal_details, config, persistent_anomaly);
    let verdict = classify(score.trust_score, config);
    let fingerprint = generate_fingerprint(&signal_details);

    let message = summary_message(
        input.metric.unwrap_or(DEFAULT_METRIC_LABEL),
        input.latest,
        verdict.status,
        score.trust_score,
        fingerprint.as_ref().map(|f| f.root_cause.as_str()),
    );

    debug!(
        signals = signal_details.len(),
        trust_score = score.trust_score,
        persistent = persistent_anomaly,
        status = %verdict.status,
        "Evaluation scored"
    );

    Ok(EvaluationResult {
        status: verdict.status,
        is_safe: verdict.is_safe,
        trust_score: score.trust_score,
        signals: signal_details.iter().map(|s| s.signal_type).collect(),
        signal_details,
        category_breakdown: score.category_breakdown,
        duplicate_info,
        fingerprint,
        persistent_anomaly,
        metric_column: input.metric.map(str::to_string),
        current_value: input.latest,
        z_score: statistics.z_score(input.latest),
        statistics,
        message,
        evaluated_at: Utc::now(),
    })
}

/// Stateful engine for one monitored metric
#[derive(Debug, Clone)]
pub struct TrustEngine {
    config: EngineConfig,
    history: HistoryWindow,
    persistence: PersistenceTracker,
    demo_override: Option<f64>,
}

impl TrustEngine {
    /// Build an engine from a validated configuration
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        if config.demo_override.is_some() && !config.allow_demo_override {
            return Err(ConfigError::DemoOverrideDisabled);
        }

        Ok(Self {
            history: HistoryWindow::new(config.history_size),
            persistence: PersistenceTracker::new(
                config.persistence_window,
                config.persistence_required,
            ),
            demo_override: config.demo_override,
            config,
        })
    }

    /// Evaluate a host table
    pub fn evaluate_table(&mut self, table: &DataTable) -> Result<EvaluationResult, EngineError> {
        let metric = extract_metric(table, &self.config.metric_candidates)?;
        self.evaluate_population(Some(&metric.name), &metric.values, &table.rows)
    }

    /// Evaluate a plain value series, oldest first
    ///
    /// The last value is the reading under test.
    pub fn evaluate_values(&mut self, population: &[f64]) -> Result<EvaluationResult, EngineError> {
        self.evaluate_population(None, population, &[])
    }

    fn evaluate_population(
        &mut self,
        metric: Option<&str>,
        population: &[f64],
        rows: &[Vec<Cell>],
    ) -> Result<EvaluationResult, EngineError> {
        let (&last, earlier) = population
            .split_last()
            .ok_or(EngineError::InsufficientData)?;
        // The reading under test is scored against the rows before it. A
        // single reading is its own baseline.
        let baseline = if earlier.is_empty() { population } else { earlier };

        let input = EvaluationInput {
            metric,
            latest: self.demo_override.unwrap_or(last),
            previous: earlier.last().copied(),
            population: baseline,
            rows,
        };

        let result = evaluate(&input, &self.config, &mut self.persistence)?;
        self.history.push(result.current_value);
        Ok(result)
    }

    /// Clear the demo override and the persistence history
    pub fn reset_to_normal(&mut self) {
        self.demo_override = None;
        self.persistence.reset();
    }

    /// Adjust the z-score threshold within its allowed range
    pub fn set_z_threshold(&mut self, value: f64) -> Result<(), ConfigError> {
        self.config.check_z_threshold(value)?;
        self.config.z_threshold = value;
        Ok(())
    }

    /// Substitute a fixed value for the latest reading
    pub fn set_demo_override(&mut self, value: Option<f64>) -> Result<(), ConfigError> {
        if value.is_some() && !self.config.allow_demo_override {
            return Err(ConfigError::DemoOverrideDisabled);
        }
        self.demo_override = value;
        Ok(())
    }

    pub fn demo_override(&self) -> Option<f64> {
        self.demo_override
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Values scored so far, oldest first
    pub fn recent_values(&self) -> Vec<f64> {
        self.history.values()
    }

    pub fn persistence_history(&self) -> Vec<usize> {
        self.persistence.history()
    }
}
