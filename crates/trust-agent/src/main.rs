//! Trust agent - hero metric trust scoring service
//!
//! Polls the host's tables for each configured hero metric, scores them and
//! publishes a show/hide flag per metric.

use anyhow::Result;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use trust_agent::{api, config::AgentConfig};
use trust_core::{
    health::HealthRegistry,
    monitor::{
        DataSource, FileTableSource, MonitorBuilder, MonitorRegistry, MonitorScheduler,
        ParameterSink, ParameterStore, PushTableSource,
    },
    observability::{EngineMetrics, StructuredLogger},
};

const AGENT_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting trust-agent");

    let config = AgentConfig::load()?;
    info!(
        instance = %config.instance_name,
        monitors = config.metrics.len(),
        "Agent configured"
    );

    let health_registry = HealthRegistry::new();
    health_registry.register_pipeline().await;

    let metrics = EngineMetrics::new();
    let logger = StructuredLogger::new(&config.instance_name);
    let parameters = Arc::new(ParameterStore::new());
    let registry = MonitorRegistry::new();
    let mut push_sources = HashMap::new();

    for spec in &config.metrics {
        let source: Arc<dyn DataSource> = match &spec.table_path {
            Some(path) => Arc::new(FileTableSource::new(path)),
            None => {
                let push = Arc::new(PushTableSource::new());
                push_sources.insert(spec.name.clone(), push.clone());
                push
            }
        };

        let monitor = MonitorBuilder::new(&spec.name)
            .config(spec.engine.clone())
            .source(source)
            .sink(Arc::new(ParameterSink::new(
                parameters.clone(),
                spec.parameter_name(),
            )))
            .fetch_timeout(config.fetch_timeout())
            .fail_closed(config.fail_closed)
            .health(health_registry.clone())
            .logger(logger.clone())
            .build()?;
        registry.insert(monitor);
    }

    metrics.set_monitors_configured(registry.len() as i64);
    logger.log_startup(AGENT_VERSION, registry.len());

    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    let app_state = Arc::new(api::AppState::new(
        registry.clone(),
        parameters,
        push_sources,
        health_registry.clone(),
        metrics,
    ));

    let scheduler_handle = tokio::spawn(MonitorScheduler::new(registry).run(shutdown_tx.clone()));
    let api_handle = tokio::spawn(api::serve(
        config.api_port,
        app_state,
        shutdown_tx.subscribe(),
    ));

    // Mark agent as ready after initialization
    health_registry.set_ready(true).await;

    tokio::signal::ctrl_c().await?;
    logger.log_shutdown("SIGINT received");
    health_registry.set_ready(false).await;
    let _ = shutdown_tx.send(());

    let _ = scheduler_handle.await;
    match api_handle.await {
        Ok(Err(e)) => error!(error = %e, "API server exited with error"),
        Err(e) => error!(error = %e, "API server task failed"),
        Ok(Ok(())) => {}
    }

    info!("Shutdown complete");
    Ok(())
}
