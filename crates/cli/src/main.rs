//! Metric trust agent CLI
//!
//! A command-line tool for checking dashboard trust status, inspecting
//! monitors and driving the manual controls of the trust agent.

mod client;
mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{control, monitors};
use std::path::PathBuf;

/// Metric trust agent CLI
#[derive(Parser)]
#[command(name = "trustctl")]
#[command(author, version, about = "CLI for the Metric Trust Engine", long_about = None)]
pub struct Cli {
    /// Agent API URL (can also be set via TRUSTCTL_API_URL env var)
    #[arg(long, env = "TRUSTCTL_API_URL")]
    pub api_url: Option<String>,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the aggregate trust status of every metric
    Dashboard,

    /// Show the latest evaluation of one metric
    Status {
        /// Metric name
        metric: String,
    },

    /// Force an immediate evaluation
    Evaluate {
        /// Metric name
        metric: String,
    },

    /// Push a JSON table ({"columns": [...], "rows": [[...]]}) and re-evaluate
    Push {
        /// Metric name
        metric: String,

        /// Path to the table file
        #[arg(long)]
        file: PathBuf,
    },

    /// Clear injected values and anomaly persistence
    Reset {
        /// Metric name
        metric: String,
    },

    /// Adjust the z-score threshold
    Threshold {
        /// Metric name
        metric: String,

        /// New threshold
        value: f64,
    },

    /// Inject a demo value as the latest reading; omit the value to clear it
    Inject {
        /// Metric name
        metric: String,

        /// Injected value
        #[arg(allow_negative_numbers = true)]
        value: Option<f64>,
    },

    /// Show recent audit entries
    Audit {
        /// Metric name
        metric: String,

        /// Maximum number of entries
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        output::print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let api_url = config::Config::load()?.resolve_api_url(cli.api_url);
    let client = client::ApiClient::new(&api_url)?;
    let format = cli.format;

    match cli.command {
        Commands::Dashboard => monitors::show_dashboard(&client, format).await?,
        Commands::Status { metric } => monitors::show_status(&client, &metric, format).await?,
        Commands::Evaluate { metric } => control::evaluate(&client, &metric, format).await?,
        Commands::Push { metric, file } => {
            control::push_table(&client, &metric, &file, format).await?
        }
        Commands::Reset { metric } => control::reset(&client, &metric, format).await?,
        Commands::Threshold { metric, value } => {
            control::set_threshold(&client, &metric, value, format).await?
        }
        Commands::Inject { metric, value } => {
            control::inject(&client, &metric, value, format).await?
        }
        Commands::Audit { metric, limit } => {
            monitors::show_audit(&client, &metric, limit, format).await?
        }
    }

    Ok(())
}
