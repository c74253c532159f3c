//! Local prediction with a saved model

use anyhow::{Context, Result};
use esrb_lib::{load_games, EsrbPredictor, GameClassificationResult, ModelWrapper};
use std::path::Path;

use crate::config::Settings;
use crate::output::{print_classifications, print_info, print_warning, OutputFormat};
use crate::samples::sample_games;

/// Classify games from `input`, or the built-in samples, with the saved model
pub fn run(settings: &Settings, input: Option<&Path>) -> Result<()> {
    let mut predictor = EsrbPredictor::new();
    predictor
        .load(&settings.model_path)
        .with_context(|| format!("Could not load the model from {}", settings.model_path.display()))?;

    if let (Some(info), OutputFormat::Table) = (predictor.model_info(), settings.format) {
        let trained_at = info.trained_at.with_timezone(&chrono::Local);
        print_info(&format!(
            "Using {} trained {}",
            info.trainer_name,
            trained_at.format("%Y-%m-%d %H:%M")
        ));
    }

    let games = match input {
        Some(path) => load_games(path)
            .with_context(|| format!("Failed to read games from {}", path.display()))?,
        None => sample_games(),
    };
    if games.is_empty() && settings.format == OutputFormat::Table {
        print_warning("No games to classify");
        return Ok(());
    }

    let results: Vec<GameClassificationResult> = predictor.classify_many(&games)?.collect();
    print_classifications(&results, settings.format)
}
