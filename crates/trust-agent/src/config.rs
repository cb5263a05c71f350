//! Agent configuration

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use trust_core::EngineConfig;

/// Config file read when `TRUST_AGENT_CONFIG` is unset
pub const DEFAULT_CONFIG_FILE: &str = "trust-agent.toml";

/// Agent configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    /// Instance name attached to every log event
    #[serde(default = "default_instance_name")]
    pub instance_name: String,

    /// API server port for health, metrics and control
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Time allowed for one data fetch, in milliseconds
    #[serde(default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,

    /// Publish an unsafe flag when an evaluation fails
    #[serde(default = "default_fail_closed")]
    pub fail_closed: bool,

    /// Monitored hero metrics
    #[serde(default = "default_metrics")]
    pub metrics: Vec<MetricSpec>,
}

/// One monitored metric
#[derive(Debug, Clone, Deserialize)]
pub struct MetricSpec {
    pub name: String,

    /// JSON table exported by the host. Without it the table must be pushed
    /// through the API.
    #[serde(default)]
    pub table_path: Option<PathBuf>,

    /// Host parameter receiving the trust flag; defaults to `<name>_is_safe`
    #[serde(default)]
    pub parameter: Option<String>,

    #[serde(default)]
    pub engine: EngineConfig,
}

impl MetricSpec {
    pub fn parameter_name(&self) -> String {
        self.parameter
            .clone()
            .unwrap_or_else(|| format!("{}_is_safe", self.name))
    }
}

fn default_instance_name() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "trust-agent".to_string())
}

fn default_api_port() -> u16 {
    8080
}

fn default_fetch_timeout_ms() -> u64 {
    10_000
}

fn default_fail_closed() -> bool {
    true
}

fn default_metrics() -> Vec<MetricSpec> {
    vec![MetricSpec {
        name: "gross_margin".to_string(),
        table_path: None,
        parameter: None,
        engine: EngineConfig::default(),
    }]
}

impl AgentConfig {
    /// Load configuration from the config file and environment
    ///
    /// `TRUST_AGENT_CONFIG` names a required file; otherwise
    /// `trust-agent.toml` is read if present. Environment variables prefixed
    /// `TRUST_AGENT` (nested with `__`) override file values.
    pub fn load() -> Result<Self> {
        match std::env::var("TRUST_AGENT_CONFIG") {
            Ok(path) => Self::load_from(Path::new(&path), true),
            Err(_) => Self::load_from(Path::new(DEFAULT_CONFIG_FILE), false),
        }
    }

    pub fn load_from(path: &Path, required: bool) -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::from(path).required(required))
            .add_source(
                config::Environment::with_prefix("TRUST_AGENT")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to read configuration from {}", path.display()))?;

        let agent: AgentConfig = config
            .try_deserialize()
            .context("Failed to deserialize agent configuration")?;
        agent.validate()?;
        Ok(agent)
    }

    /// Reject duplicate metric names and invalid engine settings
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for metric in &self.metrics {
            if metric.name.trim().is_empty() {
                bail!("Metric name must not be empty");
            }
            if !seen.insert(metric.name.as_str()) {
                bail!("Metric '{}' is configured more than once", metric.name);
            }
            metric
                .engine
                .validate()
                .with_context(|| format!("Invalid engine settings for '{}'", metric.name))?;
        }
        if self.fetch_timeout_ms == 0 {
            bail!("fetch_timeout_ms must be positive");
        }
        Ok(())
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }
}
