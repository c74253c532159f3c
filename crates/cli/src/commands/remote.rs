//! Commands against a running prediction server

use anyhow::{Context, Result};
use esrb_lib::{load_games, ComponentStatus, GameClassificationResult};
use std::path::Path;
use tabled::Tabled;

use crate::client::ApiClient;
use crate::output::{color_status, print_classifications, print_json, print_table, OutputFormat};
use crate::samples::sample_games;

/// Row for the component health table
#[derive(Tabled)]
struct ComponentRow {
    #[tabled(rename = "Component")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Message")]
    message: String,
}

fn status_name(status: ComponentStatus) -> &'static str {
    match status {
        ComponentStatus::Healthy => "healthy",
        ComponentStatus::Unhealthy => "unhealthy",
    }
}

/// Classify games through the server, one request per game
pub async fn predict(client: &ApiClient, input: Option<&Path>, format: OutputFormat) -> Result<()> {
    let games = match input {
        Some(path) => load_games(path)
            .with_context(|| format!("Failed to read games from {}", path.display()))?,
        None => sample_games(),
    };

    let mut results = Vec::with_capacity(games.len());
    for game in games {
        let prediction = client
            .predict(&game)
            .await
            .with_context(|| format!("Prediction failed for \"{}\"", game.title))?;
        results.push(GameClassificationResult::new(game.title, prediction));
    }

    print_classifications(&results, format)
}

/// Show server health
pub async fn health(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let health = client.health().await?;

    match format {
        OutputFormat::Json => print_json(&health)?,
        OutputFormat::Table => {
            println!("Server status: {}", color_status(status_name(health.status)));
            let mut rows: Vec<ComponentRow> = health
                .components
                .iter()
                .map(|(name, component)| ComponentRow {
                    name: name.clone(),
                    status: color_status(status_name(component.status)),
                    message: component.message.clone().unwrap_or_default(),
                })
                .collect();
            rows.sort_by(|a, b| a.name.cmp(&b.name));
            print_table(&rows);
        }
    }
    Ok(())
}
