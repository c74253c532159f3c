//! ESRB rating predictor
//!
//! [`EsrbPredictor`] owns at most one trained model. It starts untrained,
//! becomes ready after a successful `train` or `load`, and stays ready from
//! then on. Every successful train or load replaces the model wholesale and
//! drops the cached inference engine.

pub mod artifact;
mod features;
mod inference;
mod output;

pub use artifact::{compute_checksum, DEFAULT_MODEL_FILE};
pub use features::{DataSchema, FeatureExtractor};
pub use inference::{InferenceStats, PredictionEngine};
pub use output::{GameClassificationResult, PredictionResult};

use crate::automl::{
    Classifier, ExperimentSettings, LogReporter, MulticlassExperiment, MulticlassMetrics,
    OptimizingMetric, ProgressReporter, RunDetail,
};
use crate::dataset::{LabeledDataset, DEFAULT_SEED};
use crate::error::{PredictorError, Result};
use crate::models::GameInfo;
use crate::observability::{PredictorMetrics, StructuredLogger};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Train, predict and persist operations over a single held model
pub trait ModelWrapper {
    /// Train from a training file and a validation file within `budget`
    fn train(
        &mut self,
        training_path: &Path,
        validation_path: &Path,
        budget: Duration,
    ) -> Result<TrainingSummary>;

    fn predict(&mut self, game: &GameInfo) -> Result<PredictionResult>;

    fn save(&self, path: &Path) -> Result<()>;

    /// Replace the held model with the one stored at `path`.
    ///
    /// On failure the previously held model is kept.
    fn load(&mut self, path: &Path) -> Result<()>;

    fn is_ready(&self) -> bool;
}

/// Settings applied to every training run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictorConfig {
    pub optimizing_metric: OptimizingMetric,
    /// Shuffle seed for single-file training
    pub seed: u64,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            optimizing_metric: OptimizingMetric::default(),
            seed: DEFAULT_SEED,
        }
    }
}

/// A fitted classifier together with everything needed to apply it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainedModel {
    /// Class labels; probability column `i` belongs to `classes[i]`
    pub classes: Vec<String>,
    pub schema: DataSchema,
    pub classifier: Classifier,
    pub trainer_name: String,
    pub metric: OptimizingMetric,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_metrics: Option<MulticlassMetrics>,
    pub trained_at: DateTime<Utc>,
}

impl TrainedModel {
    /// Check that classes, schema and classifier dimensions agree
    pub fn validate(&self) -> Result<()> {
        if self.classes.len() < 2 {
            return Err(PredictorError::Artifact(format!(
                "model has {} classes, need at least 2",
                self.classes.len()
            )));
        }
        for (i, class) in self.classes.iter().enumerate() {
            if self.classes[..i].contains(class) {
                return Err(PredictorError::Artifact(format!("duplicate class '{}'", class)));
            }
        }
        FeatureExtractor::new(&self.schema)?;
        self.classifier
            .validate(self.schema.num_features(), self.classes.len())
            .map_err(PredictorError::Artifact)
    }

    pub fn info(&self) -> ModelInfo {
        ModelInfo {
            trainer_name: self.trainer_name.clone(),
            classes: self.classes.clone(),
            feature_columns: self.schema.feature_columns.clone(),
            metric: self.metric,
            score: self
                .validation_metrics
                .as_ref()
                .map(|m| self.metric.value(m)),
            trained_at: self.trained_at,
        }
    }
}

/// Public description of the held model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    pub trainer_name: String,
    pub classes: Vec<String>,
    pub feature_columns: Vec<String>,
    pub metric: OptimizingMetric,
    /// Validation score of `metric`, if known
    pub score: Option<f64>,
    pub trained_at: DateTime<Utc>,
}

/// Outcome of a successful training call
#[derive(Debug, Clone)]
pub struct TrainingSummary {
    pub trainer_name: String,
    pub metric: OptimizingMetric,
    pub best_metrics: MulticlassMetrics,
    /// Every trial in execution order
    pub runs: Vec<RunDetail>,
    pub classes: Vec<String>,
    pub training_rows: usize,
    pub validation_rows: usize,
    pub elapsed: Duration,
}

impl TrainingSummary {
    /// Validation score of the winning run under the optimizing metric
    pub fn best_score(&self) -> f64 {
        self.metric.value(&self.best_metrics)
    }
}

/// The ESRB rating predictor facade
pub struct EsrbPredictor {
    config: PredictorConfig,
    model: Option<Arc<TrainedModel>>,
    engine: Option<PredictionEngine>,
    metrics: Option<PredictorMetrics>,
    logger: StructuredLogger,
}

impl Default for EsrbPredictor {
    fn default() -> Self {
        Self::new()
    }
}

impl EsrbPredictor {
    pub fn new() -> Self {
        Self::with_config(PredictorConfig::default())
    }

    pub fn with_config(config: PredictorConfig) -> Self {
        Self {
            config,
            model: None,
            engine: None,
            metrics: None,
            logger: StructuredLogger::new("esrb-lib"),
        }
    }

    /// Record training and inference in the global Prometheus registry
    pub fn with_metrics(mut self, metrics: PredictorMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn with_logger(mut self, logger: StructuredLogger) -> Self {
        self.logger = logger;
        self
    }

    pub fn config(&self) -> &PredictorConfig {
        &self.config
    }

    pub fn set_optimizing_metric(&mut self, metric: OptimizingMetric) {
        self.config.optimizing_metric = metric;
    }

    pub fn model_info(&self) -> Option<ModelInfo> {
        self.model.as_ref().map(|m| m.info())
    }

    /// Train from separate files, reporting each trial to `reporter`
    pub fn train_with_progress(
        &mut self,
        training_path: &Path,
        validation_path: &Path,
        budget: Duration,
        reporter: &mut dyn ProgressReporter,
    ) -> Result<TrainingSummary> {
        let train = LabeledDataset::from_csv(training_path)?;
        let validation = LabeledDataset::from_csv_with_schema(validation_path, train.schema())?;
        self.fit(&train, &validation, budget, reporter)
    }

    /// Train from one file, holding out `test_fraction` of it for validation
    pub fn train_split(
        &mut self,
        data_path: &Path,
        test_fraction: f64,
        budget: Duration,
    ) -> Result<TrainingSummary> {
        self.train_split_with_progress(data_path, test_fraction, budget, &mut LogReporter)
    }

    pub fn train_split_with_progress(
        &mut self,
        data_path: &Path,
        test_fraction: f64,
        budget: Duration,
        reporter: &mut dyn ProgressReporter,
    ) -> Result<TrainingSummary> {
        if !(test_fraction > 0.0 && test_fraction < 1.0) {
            return Err(PredictorError::InvalidTestFraction(test_fraction));
        }
        let data = LabeledDataset::from_csv(data_path)?;
        let (train, validation) = data.train_test_split(test_fraction, self.config.seed);
        self.fit(&train, &validation, budget, reporter)
    }

    /// Run the model search on in-memory datasets and keep the winner
    pub fn fit(
        &mut self,
        train: &LabeledDataset,
        validation: &LabeledDataset,
        budget: Duration,
        reporter: &mut dyn ProgressReporter,
    ) -> Result<TrainingSummary> {
        let started = Instant::now();
        let settings = ExperimentSettings::new(budget).with_metric(self.config.optimizing_metric);
        let metric = settings.optimizing_metric;
        let experiment = MulticlassExperiment::new(settings);

        let result = experiment.execute(train, validation, reporter);
        let elapsed = started.elapsed();
        if let Some(metrics) = &self.metrics {
            metrics.observe_training_duration(elapsed.as_secs_f64());
        }
        let result = result?;

        let best = result.best_run().clone();
        let best_metrics = best.validation_metrics.clone().ok_or_else(|| {
            PredictorError::Training("best run has no validation metrics".to_string())
        })?;

        let model = TrainedModel {
            classes: result.classes.clone(),
            schema: train.schema().clone(),
            classifier: result.best_model,
            trainer_name: best.trainer_name.clone(),
            metric,
            validation_metrics: Some(best_metrics.clone()),
            trained_at: Utc::now(),
        };
        self.replace_model(model);

        let summary = TrainingSummary {
            trainer_name: best.trainer_name,
            metric,
            best_metrics,
            runs: result.runs,
            classes: result.classes,
            training_rows: train.len(),
            validation_rows: validation.len(),
            elapsed,
        };

        if let Some(metrics) = &self.metrics {
            let failed = summary
                .runs
                .iter()
                .filter(|r| r.validation_metrics.is_none())
                .count();
            metrics.inc_trials(summary.runs.len() as u64, failed as u64);
        }
        self.logger.log_training_completed(
            &summary.trainer_name,
            &metric.to_string(),
            summary.best_score(),
            summary.runs.len(),
            elapsed.as_secs_f64(),
        );

        Ok(summary)
    }

    /// Predict every game lazily, in input order.
    ///
    /// Fails up front if no model is held.
    pub fn predict_many<'a, I>(
        &'a mut self,
        games: I,
    ) -> Result<impl Iterator<Item = PredictionResult> + 'a>
    where
        I: IntoIterator<Item = &'a GameInfo>,
        I::IntoIter: 'a,
    {
        let metrics = self.metrics;
        let engine = self.engine("predicting ESRB ratings")?;
        Ok(games.into_iter().map(move |game| {
            let start = Instant::now();
            let result = engine.predict(game);
            if let Some(metrics) = &metrics {
                metrics.observe_prediction_latency(start.elapsed().as_secs_f64());
            }
            result
        }))
    }

    /// Like [`predict_many`](Self::predict_many), pairing each result with the game title
    pub fn classify_many<'a, I>(
        &'a mut self,
        games: I,
    ) -> Result<impl Iterator<Item = GameClassificationResult> + 'a>
    where
        I: IntoIterator<Item = &'a GameInfo>,
        I::IntoIter: 'a,
    {
        let metrics = self.metrics;
        let engine = self.engine("classifying games")?;
        Ok(games.into_iter().map(move |game| {
            let start = Instant::now();
            let result = GameClassificationResult::new(game.title.clone(), engine.predict(game));
            if let Some(metrics) = &metrics {
                metrics.observe_prediction_latency(start.elapsed().as_secs_f64());
            }
            result
        }))
    }

    /// Engine bound to the current model, built on first use
    fn engine(&mut self, operation: &'static str) -> Result<&PredictionEngine> {
        let model = match &self.model {
            Some(model) => Arc::clone(model),
            None => {
                if let Some(metrics) = &self.metrics {
                    metrics.inc_prediction_errors();
                }
                return Err(PredictorError::ModelNotReady { operation });
            }
        };

        let stale = self
            .engine
            .as_ref()
            .map_or(true, |engine| !engine.is_bound_to(&model));
        if stale {
            debug!(trainer = %model.trainer_name, "Building prediction engine");
            self.engine = Some(PredictionEngine::bind(model)?);
        }

        self.engine
            .as_ref()
            .ok_or(PredictorError::ModelNotReady { operation })
    }

    fn replace_model(&mut self, model: TrainedModel) {
        if let Some(metrics) = &self.metrics {
            metrics.set_model(&model.trainer_name, &model.metric.to_string());
        }
        info!(
            trainer = %model.trainer_name,
            classes = ?model.classes,
            features = model.schema.num_features(),
            "Model replaced"
        );
        if let Some(retired) = self.engine.take() {
            let stats = retired.stats();
            info!(
                total_inferences = stats.total_inferences,
                slow_inferences = stats.slow_inferences,
                "Retired prediction engine"
            );
        }
        self.model = Some(Arc::new(model));
    }
}

impl ModelWrapper for EsrbPredictor {
    fn train(
        &mut self,
        training_path: &Path,
        validation_path: &Path,
        budget: Duration,
    ) -> Result<TrainingSummary> {
        self.train_with_progress(training_path, validation_path, budget, &mut LogReporter)
    }

    fn predict(&mut self, game: &GameInfo) -> Result<PredictionResult> {
        let metrics = self.metrics;
        let start = Instant::now();
        let result = self.engine("predicting ESRB ratings")?.predict(game);
        if let Some(metrics) = &metrics {
            metrics.observe_prediction_latency(start.elapsed().as_secs_f64());
        }
        Ok(result)
    }

    fn save(&self, path: &Path) -> Result<()> {
        let model = self.model.as_ref().ok_or(PredictorError::ModelNotReady {
            operation: "saving",
        })?;
        artifact::save_atomic(model, path)?;
        self.logger
            .log_model_saved(&path.display().to_string(), &model.trainer_name);
        Ok(())
    }

    fn load(&mut self, path: &Path) -> Result<()> {
        let shown = path.display().to_string();
        match artifact::load_verified(path) {
            Ok(model) => {
                self.logger.log_model_loaded(&shown, Ok(&model.trainer_name));
                self.replace_model(model);
                Ok(())
            }
            Err(e) => {
                self.logger.log_model_loaded(&shown, Err(&e.to_string()));
                Err(e)
            }
        }
    }

    fn is_ready(&self) -> bool {
        self.model.is_some()
    }
}
