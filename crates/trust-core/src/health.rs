//! Health tracking for the trust agent
//!
//! Each pipeline stage (data source, evaluator, verdict sink) reports its
//! outcomes here. Consecutive failures degrade a component and eventually
//! mark it unhealthy; a single success restores it. Liveness and readiness
//! probes read the aggregate.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Consecutive failures after which a degraded component becomes unhealthy
pub const DEFAULT_UNHEALTHY_AFTER: u32 = 5;

/// Health status of a component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Health of one pipeline stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub status: ComponentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub consecutive_failures: u32,
    pub last_check_timestamp: i64,
}

impl ComponentHealth {
    fn healthy() -> Self {
        Self {
            status: ComponentStatus::Healthy,
            message: None,
            consecutive_failures: 0,
            last_check_timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

/// Aggregate health response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: ComponentStatus,
    pub components: HashMap<String, ComponentHealth>,
}

impl HealthResponse {
    /// Worst status across components; an empty set is healthy
    pub fn compute_status(components: &HashMap<String, ComponentHealth>) -> ComponentStatus {
        components
            .values()
            .map(|c| c.status)
            .max_by_key(|status| match status {
                ComponentStatus::Healthy => 0,
                ComponentStatus::Degraded => 1,
                ComponentStatus::Unhealthy => 2,
            })
            .unwrap_or(ComponentStatus::Healthy)
    }
}

/// Readiness response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Component names for health tracking
pub mod components {
    pub const DATA_SOURCE: &str = "data_source";
    pub const EVALUATOR: &str = "evaluator";
    pub const VERDICT_SINK: &str = "verdict_sink";

    pub const ALL: [&str; 3] = [DATA_SOURCE, EVALUATOR, VERDICT_SINK];
}

/// Shared registry of component health
#[derive(Debug, Clone)]
pub struct HealthRegistry {
    components: Arc<RwLock<HashMap<String, ComponentHealth>>>,
    ready: Arc<RwLock<bool>>,
    unhealthy_after: u32,
}

impl Default for HealthRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthRegistry {
    pub fn new() -> Self {
        Self {
            components: Arc::new(RwLock::new(HashMap::new())),
            ready: Arc::new(RwLock::new(false)),
            unhealthy_after: DEFAULT_UNHEALTHY_AFTER,
        }
    }

    pub fn with_unhealthy_after(mut self, failures: u32) -> Self {
        self.unhealthy_after = failures.max(1);
        self
    }

    /// Register every pipeline component as healthy
    pub async fn register_pipeline(&self) {
        let mut map = self.components.write().await;
        for name in components::ALL {
            map.insert(name.to_string(), ComponentHealth::healthy());
        }
    }

    /// A stage completed; clears its failure streak
    pub async fn record_success(&self, name: &str) {
        let mut map = self.components.write().await;
        map.insert(name.to_string(), ComponentHealth::healthy());
    }

    /// A stage failed; degrades it, or marks it unhealthy once the streak
    /// reaches the configured limit
    pub async fn record_failure(&self, name: &str, message: impl Into<String>) {
        let mut map = self.components.write().await;
        let failures = map
            .get(name)
            .map(|c| c.consecutive_failures)
            .unwrap_or(0)
            + 1;
        let status = if failures >= self.unhealthy_after {
            ComponentStatus::Unhealthy
        } else {
            ComponentStatus::Degraded
        };
        map.insert(
            name.to_string(),
            ComponentHealth {
                status,
                message: Some(message.into()),
                consecutive_failures: failures,
                last_check_timestamp: chrono::Utc::now().timestamp(),
            },
        );
    }

    pub async fn set_ready(&self, ready: bool) {
        *self.ready.write().await = ready;
    }

    pub async fn health(&self) -> HealthResponse {
        let components = self.components.read().await.clone();
        let status = HealthResponse::compute_status(&components);
        HealthResponse { status, components }
    }

    /// Ready once started and no component is unhealthy
    pub async fn readiness(&self) -> ReadinessResponse {
        if !*self.ready.read().await {
            return ReadinessResponse {
                ready: false,
                reason: Some("Agent not yet initialized".to_string()),
            };
        }

        let unhealthy: Vec<String> = self
            .components
            .read()
            .await
            .iter()
            .filter(|(_, c)| c.status == ComponentStatus::Unhealthy)
            .map(|(name, _)| name.clone())
            .collect();

        if unhealthy.is_empty() {
            ReadinessResponse {
                ready: true,
                reason: None,
            }
        } else {
            ReadinessResponse {
                ready: false,
                reason: Some(format!("Unhealthy components: {}", unhealthy.join(", "))),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_registry_is_healthy() {
        let registry = HealthRegistry::new();
        let health = registry.health().await;
        assert_eq!(health.status, ComponentStatus::Healthy);
        assert!(health.components.is_empty());
    }

    #[tokio::test]
    async fn test_pipeline_registration() {
        let registry = HealthRegistry::new();
        registry.register_pipeline().await;

        let health = registry.health().await;
        assert_eq!(health.components.len(), 3);
        assert_eq!(
            health.components[components::EVALUATOR].status,
            ComponentStatus::Healthy
        );
    }

    #[tokio::test]
    async fn test_failure_streak_escalates() {
        let registry = HealthRegistry::new().with_unhealthy_after(2);
        registry.register_pipeline().await;

        registry
            .record_failure(components::DATA_SOURCE, "fetch timed out")
            .await;
        assert_eq!(registry.health().await.status, ComponentStatus::Degraded);

        registry
            .record_failure(components::DATA_SOURCE, "fetch timed out")
            .await;
        let health = registry.health().await;
        assert_eq!(health.status, ComponentStatus::Unhealthy);
        assert_eq!(health.components[components::DATA_SOURCE].consecutive_failures, 2);
    }

    #[tokio::test]
    async fn test_success_restores_component() {
        let registry = HealthRegistry::new();
        registry.register_pipeline().await;
        registry
            .record_failure(components::VERDICT_SINK, "host unreachable")
            .await;
        registry.record_success(components::VERDICT_SINK).await;

        assert_eq!(registry.health().await.status, ComponentStatus::Healthy);
    }

    #[tokio::test]
    async fn test_readiness() {
        let registry = HealthRegistry::new().with_unhealthy_after(1);
        registry.register_pipeline().await;
        assert!(!registry.readiness().await.ready);

        registry.set_ready(true).await;
        assert!(registry.readiness().await.ready);

        registry.record_failure(components::EVALUATOR, "boom").await;
        let readiness = registry.readiness().await;
        assert!(!readiness.ready);
        assert!(readiness.reason.unwrap().contains("evaluator"));
    }
}
