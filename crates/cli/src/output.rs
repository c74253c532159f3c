//! Output formatting utilities

use clap::ValueEnum;
use colored::Colorize;
use esrb_lib::GameClassificationResult;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

impl OutputFormat {
    /// Parse a format name from the config file
    pub fn parse(name: &str) -> Option<Self> {
        <Self as ValueEnum>::from_str(name, true).ok()
    }
}

/// Print a table from a list of rows
pub fn print_table<T: Tabled>(rows: &[T]) {
    if rows.is_empty() {
        println!("{}", "No items found".yellow());
        return;
    }
    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);
}

/// Print any serializable value as pretty JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Row for classification tables
#[derive(Tabled)]
pub struct ClassificationRow {
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Rating")]
    rating: String,
    #[tabled(rename = "Confidence")]
    confidence: String,
    #[tabled(rename = "E")]
    everyone: String,
    #[tabled(rename = "E10+")]
    everyone_ten_plus: String,
    #[tabled(rename = "T")]
    teen: String,
    #[tabled(rename = "M")]
    mature: String,
}

impl From<&GameClassificationResult> for ClassificationRow {
    fn from(result: &GameClassificationResult) -> Self {
        Self {
            title: result.title.clone(),
            rating: result.esrb_rating().bold().to_string(),
            confidence: color_confidence(result.confidence()),
            everyone: format_confidence(result.everyone_probability()),
            everyone_ten_plus: format_confidence(result.everyone_ten_plus_probability()),
            teen: format_confidence(result.teen_probability()),
            mature: format_confidence(result.mature_probability()),
        }
    }
}

/// Print classification results in the requested format
pub fn print_classifications(
    results: &[GameClassificationResult],
    format: OutputFormat,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Table => {
            let rows: Vec<ClassificationRow> = results.iter().map(ClassificationRow::from).collect();
            print_table(&rows);
            Ok(())
        }
        OutputFormat::Json => print_json(results),
    }
}

pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Format a probability as a percentage with two decimals
pub fn format_confidence(confidence: f32) -> String {
    format!("{:.2}%", confidence * 100.0)
}

/// Color status based on value
pub fn color_status(status: &str) -> String {
    match status.to_lowercase().as_str() {
        "healthy" | "ready" => status.green().to_string(),
        "unhealthy" | "not ready" => status.red().to_string(),
        _ => status.to_string(),
    }
}

/// Color confidence based on value
pub fn color_confidence(confidence: f32) -> String {
    let formatted = format_confidence(confidence);
    if confidence >= 0.8 {
        formatted.green().to_string()
    } else if confidence >= 0.6 {
        formatted.yellow().to_string()
    } else {
        formatted.red().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_confidence() {
        assert_eq!(format_confidence(0.8523), "85.23%");
        assert_eq!(format_confidence(1.0), "100.00%");
    }

    #[test]
    fn test_parse_output_format() {
        assert_eq!(OutputFormat::parse("JSON"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::parse("table"), Some(OutputFormat::Table));
        assert_eq!(OutputFormat::parse("yaml"), None);
    }
}
