//! Observability infrastructure for the trust engine
//!
//! Provides:
//! - Prometheus metrics (evaluation latency, trust scores, signals, errors)
//! - Structured JSON logging with tracing

use crate::models::{EvaluationResult, Severity, Signal, VerdictStatus};
use prometheus::{
    register_gauge_vec, register_histogram, register_int_counter, register_int_counter_vec,
    register_int_gauge, GaugeVec, Histogram, IntCounter, IntCounterVec, IntGauge,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Histogram buckets for evaluation latency (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.00005, 0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.5, 1.0,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<EngineMetricsInner> = OnceLock::new();

struct EngineMetricsInner {
    evaluation_latency_seconds: Histogram,
    trust_score: GaugeVec,
    evaluations_total: IntCounterVec,
    signals_total: IntCounterVec,
    evaluation_errors_total: IntCounterVec,
    verdict_publish_failures: IntCounter,
    monitors_configured: IntGauge,
}

impl EngineMetricsInner {
    fn new() -> Self {
        Self {
            evaluation_latency_seconds: register_histogram!(
                "trust_engine_evaluation_latency_seconds",
                "Time spent fetching and scoring one evaluation",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register evaluation_latency_seconds"),

            trust_score: register_gauge_vec!(
                "trust_engine_trust_score",
                "Latest trust score per monitored metric",
                &["metric"]
            )
            .expect("Failed to register trust_score"),

            evaluations_total: register_int_counter_vec!(
                "trust_engine_evaluations_total",
                "Completed evaluations by verdict status",
                &["metric", "status"]
            )
            .expect("Failed to register evaluations_total"),

            signals_total: register_int_counter_vec!(
                "trust_engine_signals_total",
                "Fired detector signals by type and severity",
                &["type", "severity"]
            )
            .expect("Failed to register signals_total"),

            evaluation_errors_total: register_int_counter_vec!(
                "trust_engine_evaluation_errors_total",
                "Evaluations that produced no score, by error kind",
                &["metric", "kind"]
            )
            .expect("Failed to register evaluation_errors_total"),

            verdict_publish_failures: register_int_counter!(
                "trust_engine_verdict_publish_failures_total",
                "Failed writes of the trust flag to the host"
            )
            .expect("Failed to register verdict_publish_failures"),

            monitors_configured: register_int_gauge!(
                "trust_engine_monitors_configured",
                "Number of metrics under monitoring"
            )
            .expect("Failed to register monitors_configured"),
        }
    }
}

/// Handle to the global engine metrics
///
/// Clones share the same underlying Prometheus collectors.
#[derive(Clone)]
pub struct EngineMetrics {
    _private: (),
}

impl Default for EngineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(EngineMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &EngineMetricsInner {
        GLOBAL_METRICS.get_or_init(EngineMetricsInner::new)
    }

    pub fn observe_evaluation_latency(&self, duration_secs: f64) {
        self.inner().evaluation_latency_seconds.observe(duration_secs);
    }

    /// Record a scored evaluation and the signals it fired
    pub fn record_evaluation(&self, metric: &str, result: &EvaluationResult) {
        let inner = self.inner();
        inner
            .trust_score
            .with_label_values(&[metric])
            .set(result.trust_score);
        inner
            .evaluations_total
            .with_label_values(&[metric, &result.status.to_string()])
            .inc();
        for signal in &result.signal_details {
            inner
                .signals_total
                .with_label_values(&[signal.signal_type.as_str(), &signal.severity.to_string()])
                .inc();
        }
    }

    pub fn inc_evaluation_errors(&self, metric: &str, kind: &str) {
        self.inner()
            .evaluation_errors_total
            .with_label_values(&[metric, kind])
            .inc();
    }

    pub fn inc_verdict_publish_failures(&self) {
        self.inner().verdict_publish_failures.inc();
    }

    pub fn set_monitors_configured(&self, count: i64) {
        self.inner().monitors_configured.set(count);
    }
}

/// Structured logger for engine events
#[derive(Clone)]
pub struct StructuredLogger {
    instance: String,
}

impl StructuredLogger {
    pub fn new(instance: impl Into<String>) -> Self {
        Self {
            instance: instance.into(),
        }
    }

    /// Log a completed evaluation; locked verdicts log at warn
    pub fn log_evaluation(&self, metric: &str, result: &EvaluationResult) {
        let pattern = result
            .fingerprint
            .as_ref()
            .map(|f| f.pattern.as_str())
            .unwrap_or("none");

        if result.status == VerdictStatus::Locked {
            warn!(
                event = "evaluation_completed",
                instance = %self.instance,
                metric = %metric,
                status = %result.status,
                trust_score = result.trust_score,
                current_value = result.current_value,
                z_score = result.z_score,
                signals = result.signals.len(),
                persistent = result.persistent_anomaly,
                pattern = %pattern,
                "Metric locked"
            );
        } else {
            info!(
                event = "evaluation_completed",
                instance = %self.instance,
                metric = %metric,
                status = %result.status,
                trust_score = result.trust_score,
                current_value = result.current_value,
                z_score = result.z_score,
                signals = result.signals.len(),
                persistent = result.persistent_anomaly,
                pattern = %pattern,
                "Metric evaluated"
            );
        }

        for signal in &result.signal_details {
            self.log_signal(metric, signal);
        }
    }

    fn log_signal(&self, metric: &str, signal: &Signal) {
        match signal.severity {
            Severity::Critical => {
                warn!(
                    event = "signal_fired",
                    instance = %self.instance,
                    metric = %metric,
                    signal_type = %signal.signal_type,
                    category = %signal.category,
                    severity = %signal.severity,
                    value = signal.value,
                    details = %signal.message,
                    "Critical signal fired"
                );
            }
            _ => {
                info!(
                    event = "signal_fired",
                    instance = %self.instance,
                    metric = %metric,
                    signal_type = %signal.signal_type,
                    category = %signal.category,
                    severity = %signal.severity,
                    value = signal.value,
                    details = %signal.message,
                    "Signal fired"
                );
            }
        }
    }

    pub fn log_evaluation_error(&self, metric: &str, kind: &str, reason: &str) {
        warn!(
            event = "evaluation_failed",
            instance = %self.instance,
            metric = %metric,
            kind = %kind,
            reason = %reason,
            "Evaluation produced no score"
        );
    }

    pub fn log_publish_failure(&self, metric: &str, is_safe: bool, error: &str) {
        warn!(
            event = "verdict_publish_failed",
            instance = %self.instance,
            metric = %metric,
            is_safe = is_safe,
            error = %error,
            "Failed to publish trust flag to host"
        );
    }

    pub fn log_reset(&self, metric: &str) {
        info!(
            event = "monitor_reset",
            instance = %self.instance,
            metric = %metric,
            "Monitor reset to normal"
        );
    }

    pub fn log_threshold_change(&self, metric: &str, old: f64, new: f64) {
        info!(
            event = "threshold_adjusted",
            instance = %self.instance,
            metric = %metric,
            old_z_threshold = old,
            new_z_threshold = new,
            "Z-score threshold adjusted"
        );
    }

    pub fn log_demo_override(&self, metric: &str, value: Option<f64>) {
        warn!(
            event = "demo_override_set",
            instance = %self.instance,
            metric = %metric,
            value = ?value,
            "Demo value injection changed"
        );
    }

    pub fn log_startup(&self, version: &str, monitors: usize) {
        info!(
            event = "agent_started",
            instance = %self.instance,
            agent_version = %version,
            monitors = monitors,
            "Trust agent started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "agent_shutdown",
            instance = %self.instance,
            reason = %reason,
            "Trust agent shutting down"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::TrustEngine;
    use crate::config::EngineConfig;

    #[test]
    fn test_engine_metrics_record() {
        let metrics = EngineMetrics::new();
        let mut engine = TrustEngine::new(EngineConfig::default()).unwrap();
        let result = engine.evaluate_values(&[20.0, 21.0, 22.0, -4.0]).unwrap();

        metrics.observe_evaluation_latency(0.0004);
        metrics.record_evaluation("margin", &result);
        metrics.inc_evaluation_errors("margin", "no_numeric_data");
        metrics.inc_verdict_publish_failures();
        metrics.set_monitors_configured(1);

        let families = prometheus::gather();
        assert!(families
            .iter()
            .any(|f| f.get_name() == "trust_engine_signals_total"));
    }

    #[test]
    fn test_structured_logger_creation() {
        let logger = StructuredLogger::new("test-instance");
        assert_eq!(logger.instance, "test-instance");
    }
}
