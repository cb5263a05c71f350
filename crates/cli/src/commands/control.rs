//! Commands that change a monitor or force a re-evaluation

use anyhow::{Context, Result};
use std::path::Path;

use super::monitors::print_monitor;
use crate::client::{
    monitor_path, ApiClient, DemoOverrideRequest, EvaluationResponse, PushResponse,
    ThresholdRequest,
};
use crate::output::{print_info, print_json, print_success, print_warning, OutputFormat};

fn print_evaluation(response: &EvaluationResponse, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(response)?,
        OutputFormat::Table => {
            if response.outcome == "queued" {
                print_info("An evaluation was already running; a re-run has been queued");
            }
            print_monitor(&response.monitor);
        }
    }
    Ok(())
}

/// Force an immediate evaluation
pub async fn evaluate(client: &ApiClient, metric: &str, format: OutputFormat) -> Result<()> {
    let response: EvaluationResponse = client
        .post_empty(&monitor_path(metric, Some("evaluate")))
        .await?;
    print_evaluation(&response, format)
}

/// Push a JSON table file to a push-fed monitor
pub async fn push_table(
    client: &ApiClient,
    metric: &str,
    file: &Path,
    format: OutputFormat,
) -> Result<()> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read table file {}", file.display()))?;
    let table: serde_json::Value =
        serde_json::from_str(&content).context("Table file is not valid JSON")?;

    let response: PushResponse = client
        .put(&monitor_path(metric, Some("table")), &table)
        .await?;

    match format {
        OutputFormat::Json => print_json(&response)?,
        OutputFormat::Table => {
            print_success(&format!("Table pushed to '{}', evaluation queued", metric))
        }
    }
    Ok(())
}

/// Clear injected values and persistence, then re-evaluate
pub async fn reset(client: &ApiClient, metric: &str, format: OutputFormat) -> Result<()> {
    let response: EvaluationResponse = client
        .post_empty(&monitor_path(metric, Some("reset")))
        .await?;
    if let OutputFormat::Table = format {
        print_success(&format!("'{}' reset to normal", metric));
    }
    print_evaluation(&response, format)
}

/// Adjust the z-score threshold
pub async fn set_threshold(
    client: &ApiClient,
    metric: &str,
    z_threshold: f64,
    format: OutputFormat,
) -> Result<()> {
    let response: EvaluationResponse = client
        .post(
            &monitor_path(metric, Some("threshold")),
            &ThresholdRequest { z_threshold },
        )
        .await?;
    if let OutputFormat::Table = format {
        print_success(&format!("Z-score threshold for '{}' set to {:.2}", metric, z_threshold));
    }
    print_evaluation(&response, format)
}

/// Inject a demo value, or clear it when none is given
pub async fn inject(
    client: &ApiClient,
    metric: &str,
    value: Option<f64>,
    format: OutputFormat,
) -> Result<()> {
    let response: EvaluationResponse = client
        .post(
            &monitor_path(metric, Some("demo-override")),
            &DemoOverrideRequest { value },
        )
        .await?;
    if let OutputFormat::Table = format {
        match value {
            Some(v) => print_warning(&format!("Injected {:.2} as latest '{}' value", v, metric)),
            None => print_success(&format!("Cleared injected value for '{}'", metric)),
        }
    }
    print_evaluation(&response, format)
}
