//! Non-interactive training

use anyhow::{Context, Result};
use esrb_lib::automl::{MulticlassMetrics, NoopReporter};
use esrb_lib::{
    EsrbPredictor, ModelWrapper, PredictorConfig, ProgressReporter, RunDetail, StructuredLogger,
    TrainingSummary,
};
use std::path::Path;
use std::time::Duration;
use tabled::Tabled;

use crate::config::Settings;
use crate::output::{print_info, print_json, print_success, print_table, OutputFormat};
use crate::progress::ConsoleProgressReporter;

/// Row for the trial table
#[derive(Tabled)]
struct RunRow {
    #[tabled(rename = "Trainer")]
    trainer: String,
    #[tabled(rename = "Runtime")]
    runtime: String,
    #[tabled(rename = "Macro Acc")]
    macro_accuracy: String,
    #[tabled(rename = "Micro Acc")]
    micro_accuracy: String,
    #[tabled(rename = "Log Loss")]
    log_loss: String,
}

impl From<&RunDetail> for RunRow {
    fn from(run: &RunDetail) -> Self {
        let metric = |f: fn(&MulticlassMetrics) -> f64| {
            run.validation_metrics
                .as_ref()
                .map_or_else(|| "-".to_string(), |m| format!("{:.4}", f(m)))
        };
        Self {
            trainer: run.trainer_name.clone(),
            runtime: format!("{:.2}s", run.runtime_secs),
            macro_accuracy: metric(|m| m.macro_accuracy),
            micro_accuracy: metric(|m| m.micro_accuracy),
            log_loss: metric(|m| m.log_loss),
        }
    }
}

/// Train within `seconds` and save the model to `output` (or the configured model path).
/// With `split`, that fraction of the training file is held out for validation instead
/// of reading the validation file.
pub fn run(settings: &Settings, seconds: u64, output: Option<&Path>, split: Option<f64>) -> Result<()> {
    if seconds == 0 {
        anyhow::bail!("You must train for at least one second");
    }
    let output = output.unwrap_or(&settings.model_path);
    let budget = Duration::from_secs(seconds);

    let mut predictor = EsrbPredictor::with_config(PredictorConfig {
        optimizing_metric: settings.optimizing_metric,
        ..Default::default()
    })
    .with_logger(StructuredLogger::new("esrb-cli"));

    let mut reporter: Box<dyn ProgressReporter> = match settings.format {
        OutputFormat::Table => {
            print_info(&format!(
                "Training on {} for up to {} second(s), optimizing {}",
                settings.training_data.display(),
                seconds,
                settings.optimizing_metric
            ));
            Box::new(ConsoleProgressReporter::new(std::io::stdout()))
        }
        OutputFormat::Json => Box::new(NoopReporter),
    };

    let summary = match split {
        Some(fraction) => predictor.train_split_with_progress(
            &settings.training_data,
            fraction,
            budget,
            reporter.as_mut(),
        ),
        None => predictor.train_with_progress(
            &settings.training_data,
            &settings.validation_data,
            budget,
            reporter.as_mut(),
        ),
    }
    .context("Training failed")?;

    predictor
        .save(output)
        .with_context(|| format!("Could not save the model to {}", output.display()))?;

    match settings.format {
        OutputFormat::Table => print_summary(&summary, output),
        OutputFormat::Json => print_json(&serde_json::json!({
            "trainer": summary.trainer_name,
            "metric": summary.metric,
            "score": summary.best_score(),
            "classes": summary.classes,
            "trainingRows": summary.training_rows,
            "validationRows": summary.validation_rows,
            "runs": summary.runs,
            "model": output,
        }))?,
    }
    Ok(())
}

fn print_summary(summary: &TrainingSummary, output: &Path) {
    println!();
    let rows: Vec<RunRow> = summary.runs.iter().map(RunRow::from).collect();
    print_table(&rows);
    println!();
    println!("{}", summary.best_metrics.confusion_matrix.formatted_table());
    print_success(&format!(
        "Best model {} ({} = {:.4}) saved to {}",
        summary.trainer_name,
        summary.metric,
        summary.best_score(),
        output.display()
    ));
}
