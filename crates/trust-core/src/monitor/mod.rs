//! Monitored metrics
//!
//! A [`MetricMonitor`] ties one [`TrustEngine`] to a data source and a
//! verdict sink. Evaluations for the same metric never overlap: a trigger
//! arriving while one is in flight is coalesced into a single pending
//! re-evaluation.

mod scheduler;
mod sink;
mod source;

pub use scheduler::{MonitorRegistry, MonitorScheduler};
pub use sink::{ParameterSink, ParameterStore, ParameterValue};
pub use source::{FileTableSource, PushTableSource};

use crate::audit::{AuditEntry, AuditLog, DEFAULT_AUDIT_CAPACITY};
use crate::config::EngineConfig;
use crate::engine::TrustEngine;
use crate::error::ConfigError;
use crate::health::{components, HealthRegistry};
use crate::models::EvaluationResult;
use crate::observability::{EngineMetrics, StructuredLogger};
use crate::table::DataTable;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};

/// Default time allowed for a data fetch
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Supplies the raw table for an evaluation
#[async_trait]
pub trait DataSource: Send + Sync {
    async fn fetch(&self) -> Result<DataTable>;
}

/// Receives the outward trust flag
#[async_trait]
pub trait VerdictSink: Send + Sync {
    async fn publish(&self, metric: &str, is_safe: bool) -> Result<()>;
}

/// Latest known state of a monitor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum MonitorState {
    /// No evaluation has completed yet
    Pending,
    /// Scored; carries the full result
    Scored { result: Box<EvaluationResult> },
    /// No score could be produced. Distinct from a LOCKED verdict.
    Error {
        kind: String,
        reason: String,
        at: DateTime<Utc>,
    },
}

impl MonitorState {
    pub fn result(&self) -> Option<&EvaluationResult> {
        match self {
            MonitorState::Scored { result } => Some(result),
            _ => None,
        }
    }
}

/// What happened to a trigger request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerOutcome {
    /// This call ran the evaluation (and any queued follow-up)
    Completed,
    /// An evaluation was in flight; one follow-up is queued
    Queued,
}

/// Per-monitor runtime settings
#[derive(Debug, Clone)]
pub struct MonitorSettings {
    pub fetch_timeout: Duration,
    /// Publish `false` when an evaluation fails
    pub fail_closed: bool,
    pub audit_capacity: usize,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            fail_closed: true,
            audit_capacity: DEFAULT_AUDIT_CAPACITY,
        }
    }
}

/// One monitored metric
pub struct MetricMonitor {
    name: String,
    engine: Mutex<TrustEngine>,
    source: Arc<dyn DataSource>,
    sink: Arc<dyn VerdictSink>,
    settings: MonitorSettings,
    state: RwLock<MonitorState>,
    audit: AuditLog,
    in_flight: AtomicBool,
    pending: AtomicBool,
    health: HealthRegistry,
    metrics: EngineMetrics,
    logger: StructuredLogger,
}

impl MetricMonitor {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn state(&self) -> MonitorState {
        self.state.read().await.clone()
    }

    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    pub async fn recent_values(&self) -> Vec<f64> {
        self.engine.lock().await.recent_values()
    }

    pub async fn config(&self) -> EngineConfig {
        self.engine.lock().await.config().clone()
    }

    pub async fn demo_override(&self) -> Option<f64> {
        self.engine.lock().await.demo_override()
    }

    pub async fn poll_interval(&self) -> Duration {
        self.engine.lock().await.config().poll_interval()
    }

    /// Request an evaluation
    ///
    /// Runs it now unless one is in flight, in which case at most one
    /// follow-up is queued and this call returns immediately.
    pub async fn trigger(&self) -> TriggerOutcome {
        if self.in_flight.swap(true, Ordering::AcqRel) {
            self.pending.store(true, Ordering::Release);
            return TriggerOutcome::Queued;
        }

        loop {
            self.run_cycle().await;

            if self.pending.swap(false, Ordering::AcqRel) {
                continue;
            }
            self.in_flight.store(false, Ordering::Release);

            // A request may have queued between the swap and the release
            if !self.pending.load(Ordering::Acquire) || self.in_flight.swap(true, Ordering::AcqRel)
            {
                break;
            }
            self.pending.store(false, Ordering::Release);
        }

        TriggerOutcome::Completed
    }

    /// Clear demo override and persistence history
    pub async fn reset(&self) {
        self.engine.lock().await.reset_to_normal();
        self.logger.log_reset(&self.name);
    }

    pub async fn set_z_threshold(&self, value: f64) -> Result<(), ConfigError> {
        let mut engine = self.engine.lock().await;
        let old = engine.config().z_threshold;
        engine.set_z_threshold(value)?;
        self.logger.log_threshold_change(&self.name, old, value);
        Ok(())
    }

    pub async fn set_demo_override(&self, value: Option<f64>) -> Result<(), ConfigError> {
        self.engine.lock().await.set_demo_override(value)?;
        self.logger.log_demo_override(&self.name, value);
        Ok(())
    }

    async fn run_cycle(&self) {
        let start = Instant::now();

        let table = match tokio::time::timeout(self.settings.fetch_timeout, self.source.fetch()).await
        {
            Ok(Ok(table)) => {
                self.health.record_success(components::DATA_SOURCE).await;
                table
            }
            Ok(Err(e)) => {
                let reason = format!("{:#}", e);
                self.health
                    .record_failure(components::DATA_SOURCE, reason.clone())
                    .await;
                self.fail("fetch_failed", &reason).await;
                return;
            }
            Err(_) => {
                let reason = format!(
                    "Data fetch exceeded {}ms",
                    self.settings.fetch_timeout.as_millis()
                );
                self.health
                    .record_failure(components::DATA_SOURCE, reason.clone())
                    .await;
                self.fail("fetch_timeout", &reason).await;
                return;
            }
        };

        let outcome = self.engine.lock().await.evaluate_table(&table);
        self.metrics
            .observe_evaluation_latency(start.elapsed().as_secs_f64());

        match outcome {
            Ok(result) => {
                self.health.record_success(components::EVALUATOR).await;
                self.metrics.record_evaluation(&self.name, &result);
                self.logger.log_evaluation(&self.name, &result);
                self.audit.record(AuditEntry::scored(&self.name, &result));

                let is_safe = result.is_safe;
                *self.state.write().await = MonitorState::Scored {
                    result: Box::new(result),
                };
                self.publish(is_safe).await;
            }
            Err(e) => {
                self.health
                    .record_failure(components::EVALUATOR, e.to_string())
                    .await;
                self.fail(e.kind(), &e.to_string()).await;
            }
        }
    }

    async fn fail(&self, kind: &str, reason: &str) {
        self.metrics.inc_evaluation_errors(&self.name, kind);
        self.logger.log_evaluation_error(&self.name, kind, reason);
        self.audit.record(AuditEntry::failed(&self.name, reason));

        *self.state.write().await = MonitorState::Error {
            kind: kind.to_string(),
            reason: reason.to_string(),
            at: Utc::now(),
        };

        if self.settings.fail_closed {
            self.publish(false).await;
        }
    }

    /// Write the flag; failures are logged and counted, never propagated
    async fn publish(&self, is_safe: bool) {
        match self.sink.publish(&self.name, is_safe).await {
            Ok(()) => self.health.record_success(components::VERDICT_SINK).await,
            Err(e) => {
                let error = format!("{:#}", e);
                self.logger.log_publish_failure(&self.name, is_safe, &error);
                self.metrics.inc_verdict_publish_failures();
                self.health
                    .record_failure(components::VERDICT_SINK, error)
                    .await;
            }
        }
    }
}

/// Builder for [`MetricMonitor`]
pub struct MonitorBuilder {
    name: String,
    config: EngineConfig,
    source: Option<Arc<dyn DataSource>>,
    sink: Option<Arc<dyn VerdictSink>>,
    settings: MonitorSettings,
    health: Option<HealthRegistry>,
    logger: Option<StructuredLogger>,
}

impl MonitorBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            config: EngineConfig::default(),
            source: None,
            sink: None,
            settings: MonitorSettings::default(),
            health: None,
            logger: None,
        }
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn source(mut self, source: Arc<dyn DataSource>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn sink(mut self, sink: Arc<dyn VerdictSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn fetch_timeout(mut self, timeout: Duration) -> Self {
        self.settings.fetch_timeout = timeout;
        self
    }

    pub fn fail_closed(mut self, fail_closed: bool) -> Self {
        self.settings.fail_closed = fail_closed;
        self
    }

    pub fn audit_capacity(mut self, capacity: usize) -> Self {
        self.settings.audit_capacity = capacity;
        self
    }

    pub fn health(mut self, health: HealthRegistry) -> Self {
        self.health = Some(health);
        self
    }

    pub fn logger(mut self, logger: StructuredLogger) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn build(self) -> Result<MetricMonitor> {
        let source = self
            .source
            .ok_or_else(|| anyhow::anyhow!("Data source is required"))?;
        let sink = self
            .sink
            .ok_or_else(|| anyhow::anyhow!("Verdict sink is required"))?;
        let engine = TrustEngine::new(self.config)
            .map_err(|e| anyhow::anyhow!("Invalid configuration for '{}': {}", self.name, e))?;

        Ok(MetricMonitor {
            engine: Mutex::new(engine),
            source,
            sink,
            state: RwLock::new(MonitorState::Pending),
            audit: AuditLog::new(self.settings.audit_capacity),
            settings: self.settings,
            in_flight: AtomicBool::new(false),
            pending: AtomicBool::new(false),
            health: self.health.unwrap_or_default(),
            metrics: EngineMetrics::new(),
            logger: self
                .logger
                .unwrap_or_else(|| StructuredLogger::new("trust-agent")),
            name: self.name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VerdictStatus;
    use crate::table::daily_table;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::Notify;

    const HISTORY: [f64; 10] = [20.0, 22.0, 21.0, 23.0, 22.0, 21.0, 20.0, 22.0, 23.0, 21.0];

    /// Records every published flag
    #[derive(Default)]
    struct RecordingSink {
        published: std::sync::Mutex<Vec<bool>>,
        fail: bool,
    }

    #[async_trait]
    impl VerdictSink for RecordingSink {
        async fn publish(&self, _metric: &str, is_safe: bool) -> Result<()> {
            self.published.lock().unwrap().push(is_safe);
            if self.fail {
                anyhow::bail!("host rejected parameter write");
            }
            Ok(())
        }
    }

    /// Blocks each fetch until released, counting calls
    struct GatedSource {
        calls: AtomicUsize,
        gate: Notify,
    }

    #[async_trait]
    impl DataSource for GatedSource {
        async fn fetch(&self) -> Result<DataTable> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.gate.notified().await;
            Ok(daily_table("Margin", &HISTORY))
        }
    }

    fn build(
        source: Arc<dyn DataSource>,
        sink: Arc<RecordingSink>,
        config: EngineConfig,
    ) -> MetricMonitor {
        MonitorBuilder::new("margin")
            .config(config)
            .source(source)
            .sink(sink)
            .build()
            .unwrap()
    }

    async fn pushed(values: &[f64]) -> Arc<PushTableSource> {
        let source = Arc::new(PushTableSource::new());
        source.push(daily_table("Gross Margin", values)).await;
        source
    }

    #[tokio::test]
    async fn test_scored_cycle_publishes_flag() {
        let sink = Arc::new(RecordingSink::default());
        let monitor = build(pushed(&HISTORY).await, sink.clone(), EngineConfig::default());

        assert_eq!(monitor.state().await, MonitorState::Pending);
        assert_eq!(monitor.trigger().await, TriggerOutcome::Completed);

        let state = monitor.state().await;
        let result = state.result().unwrap();
        assert_eq!(result.status, VerdictStatus::Safe);
        assert_eq!(result.trust_score, 100.0);
        assert!(!result.duplicate_info.has_duplicates);
        assert_eq!(*sink.published.lock().unwrap(), vec![true]);
        assert_eq!(monitor.audit().len(), 1);
        assert_eq!(monitor.recent_values().await, vec![21.0]);
    }

    #[tokio::test]
    async fn test_missing_metric_is_error_state_and_fails_closed() {
        let sink = Arc::new(RecordingSink::default());
        let source = Arc::new(PushTableSource::new());
        source.push(daily_table("Sales", &HISTORY)).await;
        let monitor = build(source, sink.clone(), EngineConfig::default());

        monitor.trigger().await;

        match monitor.state().await {
            MonitorState::Error { kind, .. } => assert_eq!(kind, "metric_not_found"),
            other => panic!("expected error state, got {:?}", other),
        }
        assert_eq!(*sink.published.lock().unwrap(), vec![false]);
        assert_eq!(monitor.audit().recent(1)[0].status, "ERROR");
    }

    #[tokio::test]
    async fn test_fail_open_skips_publish_on_error() {
        let sink = Arc::new(RecordingSink::default());
        let monitor = MonitorBuilder::new("margin")
            .source(Arc::new(PushTableSource::new()))
            .sink(sink.clone())
            .fail_closed(false)
            .build()
            .unwrap();

        monitor.trigger().await;
        assert!(matches!(
            monitor.state().await,
            MonitorState::Error { ref kind, .. } if kind == "fetch_failed"
        ));
        assert!(sink.published.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_publish_failure_keeps_result() {
        let sink = Arc::new(RecordingSink {
            fail: true,
            ..Default::default()
        });
        let health = HealthRegistry::new();
        health.register_pipeline().await;
        let monitor = MonitorBuilder::new("margin")
            .source(pushed(&HISTORY).await)
            .sink(sink.clone())
            .health(health.clone())
            .build()
            .unwrap();

        monitor.trigger().await;

        assert!(monitor.state().await.result().is_some());
        let report = health.health().await;
        assert_eq!(
            report.components[components::VERDICT_SINK].consecutive_failures,
            1
        );
    }

    #[tokio::test]
    async fn test_fetch_timeout_is_error() {
        let source = Arc::new(GatedSource {
            calls: AtomicUsize::new(0),
            gate: Notify::new(),
        });
        let sink = Arc::new(RecordingSink::default());
        let monitor = MonitorBuilder::new("margin")
            .source(source)
            .sink(sink)
            .fetch_timeout(Duration::from_millis(20))
            .build()
            .unwrap();

        monitor.trigger().await;
        assert!(matches!(
            monitor.state().await,
            MonitorState::Error { ref kind, .. } if kind == "fetch_timeout"
        ));
    }

    #[tokio::test]
    async fn test_concurrent_triggers_coalesce_into_one_follow_up() {
        let source = Arc::new(GatedSource {
            calls: AtomicUsize::new(0),
            gate: Notify::new(),
        });
        let sink = Arc::new(RecordingSink::default());
        let monitor = Arc::new(build(source.clone(), sink.clone(), EngineConfig::default()));

        let first = tokio::spawn({
            let monitor = monitor.clone();
            async move { monitor.trigger().await }
        });

        while source.calls.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }

        // Three requests while in flight collapse into one pending run
        for _ in 0..3 {
            assert_eq!(monitor.trigger().await, TriggerOutcome::Queued);
        }

        source.gate.notify_one();
        while source.calls.load(Ordering::SeqCst) < 2 {
            tokio::task::yield_now().await;
        }
        source.gate.notify_one();

        assert_eq!(first.await.unwrap(), TriggerOutcome::Completed);
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
        assert_eq!(sink.published.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_reset_after_lock_restores_safe() {
        let sink = Arc::new(RecordingSink::default());
        let config = EngineConfig {
            allow_demo_override: true,
            ..Default::default()
        };
        let monitor = build(pushed(&HISTORY).await, sink.clone(), config);

        monitor.set_demo_override(Some(2400.0)).await.unwrap();
        monitor.trigger().await;
        assert_eq!(
            monitor.state().await.result().unwrap().status,
            VerdictStatus::Locked
        );

        monitor.reset().await;
        monitor.trigger().await;
        let state = monitor.state().await;
        let result = state.result().unwrap();
        assert_eq!(result.status, VerdictStatus::Safe);
        assert_eq!(result.trust_score, 100.0);
        assert_eq!(*sink.published.lock().unwrap(), vec![false, true]);
    }

    #[tokio::test]
    async fn test_builder_requires_source_and_sink() {
        assert!(MonitorBuilder::new("margin").build().is_err());
        assert!(MonitorBuilder::new("margin")
            .source(Arc::new(PushTableSource::new()))
            .build()
            .is_err());
    }

    #[tokio::test]
    async fn test_builder_rejects_invalid_config() {
        let config = EngineConfig {
            lock_threshold: 95.0,
            ..Default::default()
        };
        let result = MonitorBuilder::new("margin")
            .config(config)
            .source(Arc::new(PushTableSource::new()))
            .sink(Arc::new(RecordingSink::default()))
            .build();
        assert!(result.is_err());
    }
}
