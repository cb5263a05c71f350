//! Trust engine for hero metrics
//!
//! This crate provides the core functionality for:
//! - Parsing host tables and locating the monitored metric column
//! - Ensemble anomaly detection and trust scoring
//! - The SAFE / WARNING / LOCKED verdict with a root-cause fingerprint
//! - Per-metric monitors, polling, audit log and dashboard aggregation
//! - Health checks and observability

pub mod anomaly;
pub mod audit;
pub mod config;
pub mod dashboard;
pub mod engine;
pub mod error;
pub mod health;
pub mod history;
pub mod models;
pub mod monitor;
pub mod observability;
pub mod table;

pub use audit::{AuditEntry, AuditLog};
pub use config::{EngineConfig, EnsembleWeights, RatioBand};
pub use dashboard::{DashboardStatus, DisplayState, MetricSummary};
pub use engine::{evaluate, EvaluationInput, TrustEngine};
pub use error::{ConfigError, EngineError};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use monitor::{
    DataSource, MetricMonitor, MonitorBuilder, MonitorRegistry, MonitorScheduler, MonitorState,
    TriggerOutcome, VerdictSink,
};
pub use observability::{EngineMetrics, StructuredLogger};
pub use table::{Cell, DataTable};
