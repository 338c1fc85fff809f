//! Output formatting utilities

use anyhow::Result;
use clap::ValueEnum;
use colored::Colorize;
use rightsize_lib::models::{Classification, RecommendationStatus};
use serde::Serialize;

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

pub fn format_usd(amount: f64) -> String {
    format!("${:.2}", amount)
}

/// Format confidence as percentage
pub fn format_confidence(confidence: f64) -> String {
    format!("{:.0}%", confidence * 100.0)
}

/// Color status based on value
pub fn color_status(status: RecommendationStatus) -> String {
    let label = status.as_str();
    match status {
        RecommendationStatus::Pending => label.yellow().to_string(),
        RecommendationStatus::Approved => label.green().to_string(),
        RecommendationStatus::Overridden => label.red().to_string(),
        RecommendationStatus::NoAction => label.dimmed().to_string(),
    }
}

pub fn color_classification(classification: Classification) -> String {
    let label = classification.as_str();
    match classification {
        Classification::Underpowered => label.red().to_string(),
        Classification::Overprovisioned => label.cyan().to_string(),
        Classification::RightSized => label.green().to_string(),
    }
}

/// Color confidence based on value
pub fn color_confidence(confidence: f64) -> String {
    let formatted = format_confidence(confidence);
    if confidence >= 0.85 {
        formatted.green().to_string()
    } else {
        formatted.yellow().to_string()
    }
}

/// Shorten long (uuid) identifiers for table display
pub fn truncate_id(id: &str) -> String {
    if id.chars().count() > 8 {
        format!("{}...", id.chars().take(8).collect::<String>())
    } else {
        id.to_string()
    }
}
