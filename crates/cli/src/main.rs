//! ESRB Rating Predictor CLI
//!
//! Trains rating classifiers from content descriptor data, classifies games
//! with a saved model, and talks to a running prediction server.

mod client;
mod commands;
mod config;
mod menu;
mod output;
mod progress;
mod samples;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use esrb_lib::{
    EsrbPredictor, OptimizingMetric, PredictorConfig, StructuredLogger, DEFAULT_TEST_FRACTION,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use config::{Config, Settings};
use menu::{Menu, MenuFiles};
use output::{print_error, OutputFormat};

/// ESRB Rating Predictor CLI
#[derive(Parser)]
#[command(name = "esrb")]
#[command(author, version, about = "ESRB rating predictor", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Runs the interactive menu when omitted
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Args, Debug, Default, Clone)]
pub struct GlobalArgs {
    /// Prediction server URL (can also be set via ESRB_API_URL env var)
    #[arg(long, env = "ESRB_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Model artifact path
    #[arg(long, env = "ESRB_MODEL_PATH", global = true)]
    pub model: Option<PathBuf>,

    /// Training CSV
    #[arg(long, global = true)]
    pub training_data: Option<PathBuf>,

    /// Validation CSV
    #[arg(long, global = true)]
    pub validation_data: Option<PathBuf>,

    /// Metric the model search optimizes (macro_accuracy, micro_accuracy, log_loss, log_loss_reduction)
    #[arg(long, global = true)]
    pub metric: Option<OptimizingMetric>,

    /// Output format
    #[arg(long, short, global = true)]
    pub format: Option<OutputFormat>,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Interactive train / save / load / predict menu
    Menu,

    /// Train a model and save it
    Train {
        /// Training time budget in seconds
        #[arg(long, short, default_value_t = 10)]
        seconds: u64,

        /// Where to save the model (defaults to --model)
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Hold out this fraction of the training data for validation
        /// instead of reading the validation file (0.2 when no value is given)
        #[arg(long, value_name = "FRACTION", num_args = 0..=1)]
        split: Option<Option<f64>>,
    },

    /// Classify games with a saved model
    Predict {
        /// CSV of games to classify (defaults to the built-in samples)
        #[arg(long, short)]
        input: Option<PathBuf>,
    },

    /// Commands against a running prediction server
    #[command(subcommand)]
    Remote(RemoteCommands),
}

#[derive(Subcommand)]
pub enum RemoteCommands {
    /// Classify games through the server
    Predict {
        /// CSV of games to classify (defaults to the built-in samples)
        #[arg(long, short)]
        input: Option<PathBuf>,
    },

    /// Show server health
    Health,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.global.verbose);

    if let Err(e) = run(cli) {
        print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Ignoring unreadable config file");
        Config::default()
    });
    let settings = Settings::resolve(&cli.global, config);

    match cli.command.unwrap_or(Commands::Menu) {
        Commands::Menu => {
            let predictor = EsrbPredictor::with_config(PredictorConfig {
                optimizing_metric: settings.optimizing_metric,
                ..Default::default()
            })
            .with_logger(StructuredLogger::new("esrb-cli"));
            let files = MenuFiles {
                model: settings.model_path.clone(),
                training_data: settings.training_data.clone(),
                validation_data: settings.validation_data.clone(),
            };
            let stdin = std::io::stdin();
            let mut menu = Menu::new(stdin.lock(), std::io::stdout(), predictor, files);
            menu.run()?;
        }
        Commands::Train {
            seconds,
            output,
            split,
        } => {
            let split = split.map(|fraction| fraction.unwrap_or(DEFAULT_TEST_FRACTION));
            commands::train::run(&settings, seconds, output.as_deref(), split)?;
        }
        Commands::Predict { input } => {
            commands::predict::run(&settings, input.as_deref())?;
        }
        Commands::Remote(remote) => {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            let client = client::ApiClient::new(&settings.api_url)?;
            runtime.block_on(async {
                match remote {
                    RemoteCommands::Predict { input } => {
                        commands::remote::predict(&client, input.as_deref(), settings.format).await
                    }
                    RemoteCommands::Health => commands::remote::health(&client, settings.format).await,
                }
            })?;
        }
    }

    Ok(())
}
