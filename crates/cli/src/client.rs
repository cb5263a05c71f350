//! API client for communicating with the trust agent

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use reqwest::{Client, Method, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::BTreeMap;
use url::Url;

/// Non-success answer from the agent
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Unknown metric: {0}")]
    NotFound(String),
    #[error("Rejected by agent ({status}): {message}")]
    Rejected { status: StatusCode, message: String },
}

/// API client for the trust agent
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = Url::parse(base_url).context("Invalid API URL")?;

        Ok(Self { client, base_url })
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send::<T, ()>(Method::GET, path, None).await
    }

    /// Make a POST request with JSON body
    pub async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        self.send(Method::POST, path, Some(body)).await
    }

    /// Make a POST request without a body
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send::<T, ()>(Method::POST, path, None).await
    }

    /// Make a PUT request with JSON body
    pub async fn put<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        self.send(Method::PUT, path, Some(body)).await
    }

    async fn send<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let mut request = self.client.request(method, url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.context("Failed to send request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error)
                .unwrap_or(body);
            if status == StatusCode::NOT_FOUND {
                return Err(ApiError::NotFound(message).into());
            }
            return Err(ApiError::Rejected { status, message }.into());
        }

        response.json().await.context("Failed to parse response")
    }
}

/// Path of a per-metric endpoint
pub fn monitor_path(metric: &str, action: Option<&str>) -> String {
    match action {
        Some(action) => format!("api/v1/monitors/{}/{}", metric, action),
        None => format!("api/v1/monitors/{}", metric),
    }
}

// API response types

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardStatus {
    pub is_safe: bool,
    pub status: String,
    pub message: String,
    pub metrics_checked: usize,
    pub anomalies_detected: usize,
    pub errors: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence_score: Option<f64>,
    pub details: Vec<MetricSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_audit: Option<AuditEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricSummary {
    pub metric: String,
    pub state: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trust_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorView {
    pub metric: String,
    /// `pending`, `scored` or `error`
    pub state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<EvaluationResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub recent_values: Vec<f64>,
    pub z_threshold: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub demo_override: Option<f64>,
    pub poll_interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationResponse {
    pub outcome: String,
    pub monitor: MonitorView,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub status: String,
    pub is_safe: bool,
    pub trust_score: f64,
    pub signal_details: Vec<SignalDetail>,
    #[serde(default)]
    pub category_breakdown: BTreeMap<String, CategoryScore>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<Fingerprint>,
    pub persistent_anomaly: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric_column: Option<String>,
    pub current_value: f64,
    pub statistics: Statistics,
    pub z_score: f64,
    pub message: String,
    pub evaluated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalDetail {
    #[serde(rename = "type")]
    pub signal_type: String,
    pub category: String,
    pub severity: String,
    pub value: f64,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryScore {
    pub score: f64,
    pub weight: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fingerprint {
    pub pattern: String,
    pub description: String,
    pub root_cause: String,
    pub recommended_action: String,
    pub category: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Statistics {
    pub mean: f64,
    pub std_deviation: f64,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub metric: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline_mean: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline_std: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trust_score: Option<f64>,
    pub status: String,
    pub message: String,
    pub checked_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdRequest {
    pub z_threshold: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemoOverrideRequest {
    pub value: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushResponse {
    pub queued: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_dashboard() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v1/dashboard")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"is_safe":false,"status":"LOCKED","message":"1 metric(s) locked for anomalies",
                    "metrics_checked":1,"anomalies_detected":1,"errors":0,"confidence_score":7.5,
                    "details":[{"metric":"margin","state":"LOCKED","trust_score":7.5,
                    "current_value":2400.0,"pattern":"DECIMAL_SHIFT","message":"Locked"}]}"#,
            )
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let dashboard: DashboardStatus = client.get("api/v1/dashboard").await.unwrap();

        mock.assert_async().await;
        assert!(!dashboard.is_safe);
        assert_eq!(dashboard.details[0].pattern.as_deref(), Some("DECIMAL_SHIFT"));
        assert!(dashboard.last_audit.is_none());
    }

    #[tokio::test]
    async fn test_not_found_maps_to_api_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/v1/monitors/revenue/evaluate")
            .with_status(404)
            .with_body(r#"{"error":"Unknown metric 'revenue'"}"#)
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let err = client
            .post_empty::<EvaluationResponse>(&monitor_path("revenue", Some("evaluate")))
            .await
            .unwrap_err();

        match err.downcast_ref::<ApiError>() {
            Some(ApiError::NotFound(message)) => assert!(message.contains("revenue")),
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_rejection_carries_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/v1/monitors/margin/demo-override")
            .match_body(mockito::Matcher::Json(serde_json::json!({ "value": 2400.0 })))
            .with_status(403)
            .with_body(r#"{"error":"Demo value injection is disabled"}"#)
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let err = client
            .post::<EvaluationResponse, _>(
                &monitor_path("margin", Some("demo-override")),
                &DemoOverrideRequest {
                    value: Some(2400.0),
                },
            )
            .await
            .unwrap_err();

        match err.downcast_ref::<ApiError>() {
            Some(ApiError::Rejected { status, .. }) => assert_eq!(*status, StatusCode::FORBIDDEN),
            other => panic!("expected Rejected, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_monitor_view_error_state() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/v1/monitors/profit")
            .with_status(200)
            .with_body(
                r#"{"metric":"profit","state":"error","kind":"fetch_failed",
                    "reason":"Failed to read table file","at":"2026-01-01T00:00:00Z",
                    "recent_values":[],"z_threshold":2.5,"poll_interval_secs":30}"#,
            )
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let view: MonitorView = client.get(&monitor_path("profit", None)).await.unwrap();
        assert_eq!(view.state, "error");
        assert_eq!(view.kind.as_deref(), Some("fetch_failed"));
        assert!(view.result.is_none());
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(ApiClient::new("not a url").is_err());
    }
}
