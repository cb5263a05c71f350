//! HTTP API for health checks, Prometheus metrics and monitor control

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use prometheus::{Encoder, TextEncoder};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};
use trust_core::{
    health::{ComponentStatus, HealthRegistry},
    monitor::{
        MetricMonitor, MonitorRegistry, MonitorState, ParameterStore, PushTableSource,
        TriggerOutcome,
    },
    ConfigError, DataTable, EngineMetrics,
};

/// Default number of audit entries returned
const DEFAULT_AUDIT_LIMIT: usize = 20;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub registry: MonitorRegistry,
    pub parameters: Arc<ParameterStore>,
    /// Push sources by metric name; monitors reading files have none
    pub push_sources: HashMap<String, Arc<PushTableSource>>,
    pub health_registry: HealthRegistry,
    pub metrics: EngineMetrics,
}

impl AppState {
    pub fn new(
        registry: MonitorRegistry,
        parameters: Arc<ParameterStore>,
        push_sources: HashMap<String, Arc<PushTableSource>>,
        health_registry: HealthRegistry,
        metrics: EngineMetrics,
    ) -> Self {
        Self {
            registry,
            parameters,
            push_sources,
            health_registry,
            metrics,
        }
    }

    fn monitor(&self, name: &str) -> Result<Arc<MetricMonitor>, Response> {
        self.registry.get(name).ok_or_else(|| {
            error_response(StatusCode::NOT_FOUND, format!("Unknown metric '{}'", name))
        })
    }
}

/// Error body for every non-2xx control response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
        .into_response()
}

fn config_error_response(err: ConfigError) -> Response {
    let status = match err {
        ConfigError::DemoOverrideDisabled => StatusCode::FORBIDDEN,
        _ => StatusCode::BAD_REQUEST,
    };
    error_response(status, err.to_string())
}

/// Monitor detail view
#[derive(Debug, Serialize)]
pub struct MonitorView {
    pub metric: String,
    #[serde(flatten)]
    pub state: MonitorState,
    pub recent_values: Vec<f64>,
    pub z_threshold: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub demo_override: Option<f64>,
    pub poll_interval_secs: u64,
}

impl MonitorView {
    async fn build(monitor: &MetricMonitor) -> Self {
        let config = monitor.config().await;
        Self {
            metric: monitor.name().to_string(),
            state: monitor.state().await,
            recent_values: monitor.recent_values().await,
            z_threshold: config.z_threshold,
            demo_override: monitor.demo_override().await,
            poll_interval_secs: config.poll_interval_secs,
        }
    }
}

/// Outcome of a control action that re-evaluates
#[derive(Debug, Serialize)]
pub struct EvaluationResponse {
    pub outcome: TriggerOutcome,
    pub monitor: MonitorView,
}

async fn evaluate_now(monitor: &MetricMonitor) -> Json<EvaluationResponse> {
    let outcome = monitor.trigger().await;
    Json(EvaluationResponse {
        outcome,
        monitor: MonitorView::build(monitor).await,
    })
}

#[derive(Debug, Deserialize)]
pub struct ThresholdRequest {
    pub z_threshold: f64,
}

#[derive(Debug, Deserialize)]
pub struct DemoOverrideRequest {
    pub value: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct AuditQuery {
    pub limit: Option<usize>,
}

/// Health check response - returns 200 if healthy, 503 if unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy => StatusCode::OK,
        ComponentStatus::Degraded => StatusCode::OK, // Still operational
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

/// Readiness check response - returns 200 if ready, 503 if not ready
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics() -> Response {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string());
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
        .into_response()
}

async fn dashboard(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.registry.dashboard().await)
}

async fn get_monitor(State(state): State<Arc<AppState>>, Path(name): Path<String>) -> Response {
    match state.monitor(&name) {
        Ok(monitor) => Json(MonitorView::build(&monitor).await).into_response(),
        Err(response) => response,
    }
}

/// Replace the pushed table and queue an evaluation
async fn push_table(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(table): Json<DataTable>,
) -> Response {
    if let Err(response) = state.monitor(&name) {
        return response;
    }
    let Some(source) = state.push_sources.get(&name) else {
        return error_response(
            StatusCode::CONFLICT,
            format!("Metric '{}' reads its table from a file", name),
        );
    };

    source.push(table).await;
    state.registry.trigger(&name);
    info!(metric = %name, "Table pushed, evaluation queued");

    (StatusCode::ACCEPTED, Json(serde_json::json!({ "queued": true }))).into_response()
}

async fn evaluate(State(state): State<Arc<AppState>>, Path(name): Path<String>) -> Response {
    match state.monitor(&name) {
        Ok(monitor) => evaluate_now(&monitor).await.into_response(),
        Err(response) => response,
    }
}

async fn reset(State(state): State<Arc<AppState>>, Path(name): Path<String>) -> Response {
    let monitor = match state.monitor(&name) {
        Ok(monitor) => monitor,
        Err(response) => return response,
    };
    monitor.reset().await;
    evaluate_now(&monitor).await.into_response()
}

async fn set_threshold(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(request): Json<ThresholdRequest>,
) -> Response {
    let monitor = match state.monitor(&name) {
        Ok(monitor) => monitor,
        Err(response) => return response,
    };
    if let Err(e) = monitor.set_z_threshold(request.z_threshold).await {
        return config_error_response(e);
    }
    evaluate_now(&monitor).await.into_response()
}

async fn set_demo_override(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(request): Json<DemoOverrideRequest>,
) -> Response {
    let monitor = match state.monitor(&name) {
        Ok(monitor) => monitor,
        Err(response) => return response,
    };
    if let Err(e) = monitor.set_demo_override(request.value).await {
        warn!(metric = %name, error = %e, "Rejected demo value injection");
        return config_error_response(e);
    }
    evaluate_now(&monitor).await.into_response()
}

async fn audit(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Query(query): Query<AuditQuery>,
) -> Response {
    match state.monitor(&name) {
        Ok(monitor) => {
            let limit = query.limit.unwrap_or(DEFAULT_AUDIT_LIMIT);
            Json(monitor.audit().recent(limit)).into_response()
        }
        Err(response) => response,
    }
}

async fn parameters(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.parameters.snapshot())
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .route("/api/v1/dashboard", get(dashboard))
        .route("/api/v1/parameters", get(parameters))
        .route("/api/v1/monitors/:name", get(get_monitor))
        .route("/api/v1/monitors/:name/table", put(push_table))
        .route("/api/v1/monitors/:name/evaluate", post(evaluate))
        .route("/api/v1/monitors/:name/reset", post(reset))
        .route("/api/v1/monitors/:name/threshold", post(set_threshold))
        .route("/api/v1/monitors/:name/demo-override", post(set_demo_override))
        .route("/api/v1/monitors/:name/audit", get(audit))
        .with_state(state)
}

/// Start the API server
pub async fn serve(
    port: u16,
    state: Arc<AppState>,
    mut shutdown: tokio::sync::broadcast::Receiver<()>,
) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
        })
        .await?;

    Ok(())
}
