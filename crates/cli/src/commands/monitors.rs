//! Read-only monitor commands

use anyhow::Result;
use colored::Colorize;
use tabled::Tabled;

use crate::client::{monitor_path, ApiClient, AuditEntry, DashboardStatus, MonitorView};
use crate::output::{
    color_status, color_trust, format_value, print_error, print_info, print_json, print_rows,
    print_success, print_warning, truncate, OutputFormat,
};

/// Row for the dashboard table
#[derive(Tabled)]
struct MetricRow {
    #[tabled(rename = "Metric")]
    metric: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Trust")]
    trust: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Pattern")]
    pattern: String,
    #[tabled(rename = "Message")]
    message: String,
}

/// Row for a monitor's fired signals
#[derive(Tabled)]
struct SignalRow {
    #[tabled(rename = "Signal")]
    signal: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Severity")]
    severity: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Details")]
    details: String,
}

/// Row for audit entries
#[derive(Tabled)]
struct AuditRow {
    #[tabled(rename = "Checked")]
    checked_at: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Mean")]
    mean: String,
    #[tabled(rename = "Std")]
    std: String,
    #[tabled(rename = "Z")]
    z_score: String,
    #[tabled(rename = "Trust")]
    trust: String,
    #[tabled(rename = "Message")]
    message: String,
}

/// Show the aggregate dashboard status
pub async fn show_dashboard(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let dashboard: DashboardStatus = client.get("api/v1/dashboard").await?;

    match format {
        OutputFormat::Json => print_json(&dashboard)?,
        OutputFormat::Table => {
            if dashboard.is_safe {
                print_success(&dashboard.message);
            } else {
                print_error(&dashboard.message);
            }
            println!(
                "Status: {}  Checked: {}  Anomalies: {}  Errors: {}  Confidence: {}",
                color_status(&dashboard.status),
                dashboard.metrics_checked,
                dashboard.anomalies_detected,
                dashboard.errors,
                color_trust(dashboard.confidence_score),
            );

            if dashboard.details.is_empty() {
                print_warning("No metrics are being monitored");
                return Ok(());
            }

            let rows: Vec<MetricRow> = dashboard
                .details
                .iter()
                .map(|d| MetricRow {
                    metric: d.metric.clone(),
                    state: color_status(&d.state),
                    trust: color_trust(d.trust_score),
                    value: format_value(d.current_value),
                    pattern: d.pattern.clone().unwrap_or_else(|| "-".to_string()),
                    message: truncate(&d.message, 60),
                })
                .collect();
            print_rows(rows);

            if let Some(entry) = &dashboard.last_audit {
                print_info(&format!(
                    "Last check: {} {} at {}",
                    entry.metric,
                    entry.status,
                    entry.checked_at.format("%Y-%m-%d %H:%M:%S UTC")
                ));
            }
        }
    }

    Ok(())
}

/// Show one monitor in detail
pub async fn show_status(client: &ApiClient, metric: &str, format: OutputFormat) -> Result<()> {
    let view: MonitorView = client.get(&monitor_path(metric, None)).await?;

    match format {
        OutputFormat::Json => print_json(&view)?,
        OutputFormat::Table => print_monitor(&view),
    }

    Ok(())
}

/// Human-readable monitor detail, shared by the control commands
pub fn print_monitor(view: &MonitorView) {
    println!("{} {}", "Metric:".bold(), view.metric);
    println!(
        "{} {}  (z-threshold {:.2}, poll every {}s)",
        "State:".bold(),
        color_status(&view.state),
        view.z_threshold,
        view.poll_interval_secs
    );
    if let Some(value) = view.demo_override {
        print_warning(&format!("Demo value injected: {:.2}", value));
    }

    if let (Some(kind), Some(reason)) = (&view.kind, &view.reason) {
        print_error(&format!("{}: {}", kind, reason));
    }

    let Some(result) = &view.result else {
        if view.state == "pending" {
            print_info("Awaiting first evaluation");
        }
        return;
    };

    println!(
        "{} {}  {} {}  {} {:.2}",
        "Verdict:".bold(),
        color_status(&result.status),
        "Trust:".bold(),
        color_trust(Some(result.trust_score)),
        "Value:".bold(),
        result.current_value
    );
    println!(
        "{} mean {:.2}, std {:.2}, n {}, z {:.2}",
        "Baseline:".bold(),
        result.statistics.mean,
        result.statistics.std_deviation,
        result.statistics.count,
        result.z_score
    );
    if !result.category_breakdown.is_empty() {
        let parts: Vec<String> = result
            .category_breakdown
            .iter()
            .map(|(category, score)| format!("{} {:.0} (w {:.2})", category, score.score, score.weight))
            .collect();
        println!("{} {}", "Categories:".bold(), parts.join(", "));
    }
    if result.persistent_anomaly {
        print_warning("Anomaly is persistent across recent evaluations");
    }
    println!("{}", result.message);

    if !result.signal_details.is_empty() {
        let rows: Vec<SignalRow> = result
            .signal_details
            .iter()
            .map(|s| SignalRow {
                signal: s.signal_type.clone(),
                category: s.category.clone(),
                severity: s.severity.clone(),
                value: format!("{:.3}", s.value),
                details: truncate(&s.message, 60),
            })
            .collect();
        print_rows(rows);
    }

    if let Some(fingerprint) = &result.fingerprint {
        println!("{} {} ({})", "Pattern:".bold(), fingerprint.pattern, fingerprint.category);
        println!("{} {}", "Root cause:".bold(), fingerprint.root_cause);
        println!("{} {}", "Action:".bold(), fingerprint.recommended_action);
    }

    if !view.recent_values.is_empty() {
        let values: Vec<String> = view.recent_values.iter().map(|v| format!("{:.2}", v)).collect();
        println!("{} {}", "Recent:".bold(), values.join(", "));
    }
}

/// Show the audit log of one monitor
pub async fn show_audit(
    client: &ApiClient,
    metric: &str,
    limit: usize,
    format: OutputFormat,
) -> Result<()> {
    let path = format!("{}?limit={}", monitor_path(metric, Some("audit")), limit);
    let entries: Vec<AuditEntry> = client.get(&path).await?;

    match format {
        OutputFormat::Json => print_json(&entries)?,
        OutputFormat::Table => {
            if entries.is_empty() {
                print_warning("No audit entries yet");
                return Ok(());
            }

            let total = entries.len();
            let rows: Vec<AuditRow> = entries
                .into_iter()
                .map(|e| AuditRow {
                    checked_at: e.checked_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                    status: color_status(&e.status),
                    value: format_value(e.current_value),
                    mean: format_value(e.baseline_mean),
                    std: format_value(e.baseline_std),
                    z_score: format_value(e.z_score),
                    trust: color_trust(e.trust_score),
                    message: truncate(&e.message, 50),
                })
                .collect();
            print_rows(rows);
            println!("\nTotal: {} entries", total);
        }
    }

    Ok(())
}
