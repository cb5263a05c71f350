//! Output formatting utilities

use anyhow::Result;
use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Print a value as pretty JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print rows as a rounded table
pub fn print_rows<T: Tabled>(rows: Vec<T>) {
    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Color a verdict or monitor state
pub fn color_status(status: &str) -> String {
    match status.to_lowercase().as_str() {
        "safe" | "scored" => status.green().to_string(),
        "warning" => status.yellow().to_string(),
        "pending" | "unknown" => status.blue().to_string(),
        "locked" | "error" => status.red().bold().to_string(),
        _ => status.to_string(),
    }
}

/// Format an optional trust score, colored by verdict band
pub fn color_trust(score: Option<f64>) -> String {
    match score {
        Some(score) => {
            let formatted = format!("{:.1}", score);
            if score >= 90.0 {
                formatted.green().to_string()
            } else if score >= 65.0 {
                formatted.yellow().to_string()
            } else {
                formatted.red().to_string()
            }
        }
        None => "-".dimmed().to_string(),
    }
}

/// Format an optional number with two decimals
pub fn format_value(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.2}", v))
        .unwrap_or_else(|| "-".to_string())
}

/// Shorten long messages for table cells
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let head: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(Some(21.456)), "21.46");
        assert_eq!(format_value(None), "-");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a much longer message", 10), "a much ...");
    }
}
