//! Automated model search for multi-class ESRB classification
//!
//! An experiment walks a list of candidate trainers within a wall-clock
//! budget, scores every fitted candidate on the validation set with the
//! configured metric and keeps the best one.

mod classifier;
mod metrics;
mod progress;
mod trainers;

pub use classifier::{softmax, BernoulliNaiveBayes, Classifier, SoftmaxRegression};
pub use metrics::{argmax, ConfusionMatrix, MulticlassMetrics};
pub use progress::{CollectingReporter, LogReporter, NoopReporter, ProgressReporter};
pub use trainers::{default_candidates, LogisticRegressionTrainer, NaiveBayesTrainer, Trainer};

use crate::dataset::LabeledDataset;
use crate::error::{PredictorError, Result};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Metric the search optimizes on the validation set
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizingMetric {
    #[default]
    MacroAccuracy,
    MicroAccuracy,
    LogLoss,
    LogLossReduction,
}

impl OptimizingMetric {
    /// Value of this metric in `metrics`
    pub fn value(&self, metrics: &MulticlassMetrics) -> f64 {
        match self {
            OptimizingMetric::MacroAccuracy => metrics.macro_accuracy,
            OptimizingMetric::MicroAccuracy => metrics.micro_accuracy,
            OptimizingMetric::LogLoss => metrics.log_loss,
            OptimizingMetric::LogLossReduction => metrics.log_loss_reduction,
        }
    }

    pub fn lower_is_better(&self) -> bool {
        matches!(self, OptimizingMetric::LogLoss)
    }

    /// Returns true if `candidate` strictly beats `incumbent`
    pub fn is_better(&self, candidate: f64, incumbent: f64) -> bool {
        if self.lower_is_better() {
            candidate < incumbent
        } else {
            candidate > incumbent
        }
    }
}

impl fmt::Display for OptimizingMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OptimizingMetric::MacroAccuracy => "macro_accuracy",
            OptimizingMetric::MicroAccuracy => "micro_accuracy",
            OptimizingMetric::LogLoss => "log_loss",
            OptimizingMetric::LogLossReduction => "log_loss_reduction",
        };
        f.write_str(name)
    }
}

impl FromStr for OptimizingMetric {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "macro_accuracy" | "macro" => Ok(OptimizingMetric::MacroAccuracy),
            "micro_accuracy" | "micro" | "accuracy" => Ok(OptimizingMetric::MicroAccuracy),
            "log_loss" | "logloss" => Ok(OptimizingMetric::LogLoss),
            "log_loss_reduction" => Ok(OptimizingMetric::LogLossReduction),
            other => Err(format!("Unknown optimizing metric '{}'", other)),
        }
    }
}

/// Experiment configuration
#[derive(Debug, Clone)]
pub struct ExperimentSettings {
    /// Wall-clock budget; checked before each trial after the first
    pub max_experiment_time: Duration,
    pub optimizing_metric: OptimizingMetric,
}

impl ExperimentSettings {
    pub fn new(max_experiment_time: Duration) -> Self {
        Self {
            max_experiment_time,
            optimizing_metric: OptimizingMetric::default(),
        }
    }

    pub fn with_metric(mut self, metric: OptimizingMetric) -> Self {
        self.optimizing_metric = metric;
        self
    }
}

/// Outcome of a single trial
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunDetail {
    pub trainer_name: String,
    pub runtime_secs: f64,
    /// `None` if the trial failed
    pub validation_metrics: Option<MulticlassMetrics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result of a finished experiment
#[derive(Debug, Clone)]
pub struct ExperimentResult {
    /// Every trial in execution order
    pub runs: Vec<RunDetail>,
    /// Index into `runs` of the winning trial
    pub best_index: usize,
    pub best_model: Classifier,
    /// Class labels; index `i` is probability column `i`
    pub classes: Vec<String>,
}

impl ExperimentResult {
    pub fn best_run(&self) -> &RunDetail {
        &self.runs[self.best_index]
    }
}

/// Multi-class model search over a fixed candidate list
pub struct MulticlassExperiment {
    settings: ExperimentSettings,
    trainers: Vec<Box<dyn Trainer>>,
}

impl MulticlassExperiment {
    pub fn new(settings: ExperimentSettings) -> Self {
        Self::with_trainers(settings, default_candidates())
    }

    pub fn with_trainers(settings: ExperimentSettings, trainers: Vec<Box<dyn Trainer>>) -> Self {
        Self { settings, trainers }
    }

    pub fn settings(&self) -> &ExperimentSettings {
        &self.settings
    }

    /// Run the search.
    ///
    /// The first candidate always runs. Failing candidates are reported and
    /// skipped; the experiment fails only when no candidate succeeded.
    pub fn execute(
        &self,
        train: &LabeledDataset,
        validation: &LabeledDataset,
        reporter: &mut dyn ProgressReporter,
    ) -> Result<ExperimentResult> {
        if train.schema() != validation.schema() {
            return Err(PredictorError::Schema(
                "training and validation data have different columns".to_string(),
            ));
        }
        if self.trainers.is_empty() {
            return Err(PredictorError::Training("no candidate trainers".to_string()));
        }

        let classes = train.classes();
        if classes.len() < 2 {
            return Err(PredictorError::Training(format!(
                "training data needs at least 2 distinct labels, found {}",
                classes.len()
            )));
        }

        let x_train = train.features()?;
        let y_train: Array1<usize> = train
            .labels()
            .map(|l| class_index(&classes, l))
            .collect::<Option<Vec<_>>>()
            .map(Array1::from)
            .ok_or_else(|| PredictorError::Training("unindexed training label".to_string()))?;

        // Rows whose label never occurs in training cannot be scored
        let known: Vec<_> = validation
            .rows()
            .iter()
            .filter_map(|row| class_index(&classes, &row.esrb_rating).map(|i| (row, i)))
            .collect();
        if known.len() < validation.len() {
            warn!(
                skipped = validation.len() - known.len(),
                "Validation rows with labels unseen in training were skipped"
            );
        }
        if known.is_empty() {
            return Err(PredictorError::Training(
                "validation data has no rows with labels seen in training".to_string(),
            ));
        }
        let validation_set = LabeledDataset::new(
            validation.schema().clone(),
            known.iter().map(|(row, _)| (*row).clone()).collect(),
        );
        let x_valid = validation_set.features()?;
        let y_valid: Vec<usize> = known.iter().map(|(_, i)| *i).collect();

        let total = y_train.len() as f64;
        let prior: Vec<f64> = (0..classes.len())
            .map(|c| y_train.iter().filter(|&&y| y == c).count() as f64 / total)
            .collect();

        let metric = self.settings.optimizing_metric;
        let budget = self.settings.max_experiment_time;
        let started = Instant::now();
        let mut runs = Vec::new();
        let mut best: Option<(usize, f64, Classifier)> = None;

        info!(
            candidates = self.trainers.len(),
            train_rows = train.len(),
            validation_rows = validation_set.len(),
            budget_secs = budget.as_secs_f64(),
            metric = %metric,
            "Starting model search"
        );

        for (i, trainer) in self.trainers.iter().enumerate() {
            if i > 0 && started.elapsed() >= budget {
                debug!(completed = i, "Time budget exhausted");
                break;
            }

            let trial_started = Instant::now();
            let outcome = trainer.fit(&x_train, &y_train, classes.len()).and_then(|model| {
                let probs = model.predict_proba_batch(&x_valid);
                if probs.iter().any(|p| !p.is_finite()) {
                    return Err(PredictorError::Training(format!(
                        "{} produced non-finite probabilities",
                        trainer.name()
                    )));
                }
                let metrics = MulticlassMetrics::evaluate(&probs, &y_valid, &classes, &prior);
                Ok((model, metrics))
            });
            let runtime_secs = trial_started.elapsed().as_secs_f64();

            let run = match outcome {
                Ok((model, metrics)) => {
                    let score = metric.value(&metrics);
                    let improves = best
                        .as_ref()
                        .map_or(true, |(_, incumbent, _)| metric.is_better(score, *incumbent));
                    if improves {
                        best = Some((runs.len(), score, model));
                    }
                    RunDetail {
                        trainer_name: trainer.name(),
                        runtime_secs,
                        validation_metrics: Some(metrics),
                        error: None,
                    }
                }
                Err(e) => RunDetail {
                    trainer_name: trainer.name(),
                    runtime_secs,
                    validation_metrics: None,
                    error: Some(e.to_string()),
                },
            };

            reporter.report(&run);
            runs.push(run);
        }

        let (best_index, best_score, best_model) = best.ok_or_else(|| {
            PredictorError::Training(format!("none of {} trials completed", runs.len()))
        })?;

        info!(
            trials = runs.len(),
            best_trainer = %runs[best_index].trainer_name,
            best_score = best_score,
            metric = %metric,
            elapsed_secs = started.elapsed().as_secs_f64(),
            "Model search finished"
        );

        Ok(ExperimentResult {
            runs,
            best_index,
            best_model,
            classes,
        })
    }
}

fn class_index(classes: &[String], label: &str) -> Option<usize> {
    classes.iter().position(|c| c == label)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    const TRAIN: &str = "\
title,violence,blood,strong_language,mild_cartoon_violence,esrb_rating
a,0,0,0,1,E
b,0,0,0,1,E
c,0,0,0,0,E
d,1,0,0,0,T
e,1,0,0,0,T
f,1,1,0,0,T
g,1,1,1,0,M
h,0,1,1,0,M
i,1,1,1,0,M
";

    const VALID: &str = "\
title,violence,blood,strong_language,mild_cartoon_violence,esrb_rating
j,0,0,0,1,E
k,1,0,0,0,T
l,1,1,1,0,M
m,0,0,0,0,RP
";

    fn datasets() -> (LabeledDataset, LabeledDataset) {
        let train = LabeledDataset::from_reader(TRAIN.as_bytes(), Path::new("train.csv"), None)
            .unwrap();
        let valid = LabeledDataset::from_reader(
            VALID.as_bytes(),
            Path::new("valid.csv"),
            Some(train.schema()),
        )
        .unwrap();
        (train, valid)
    }

    struct FailingTrainer;

    impl Trainer for FailingTrainer {
        fn name(&self) -> String {
            "Failing".to_string()
        }

        fn fit(&self, _x: &ndarray::Array2<f64>, _y: &Array1<usize>, _k: usize) -> Result<Classifier> {
            Err(PredictorError::Training("boom".to_string()))
        }
    }

    #[test]
    fn test_execute_reports_every_trial() {
        let (train, valid) = datasets();
        let experiment = MulticlassExperiment::with_trainers(
            ExperimentSettings::new(Duration::from_secs(60)),
            vec![
                Box::new(NaiveBayesTrainer { alpha: 1.0 }),
                Box::new(NaiveBayesTrainer { alpha: 0.5 }),
            ],
        );
        let mut reporter = CollectingReporter::default();
        let result = experiment.execute(&train, &valid, &mut reporter).unwrap();

        assert_eq!(result.runs.len(), 2);
        assert_eq!(reporter.runs, result.runs);
        assert_eq!(result.classes, vec!["E", "T", "M"]);
        let metrics = result.best_run().validation_metrics.as_ref().unwrap();
        // The RP row is not scored
        assert_eq!(metrics.confusion_matrix.total(), 3);
    }

    #[test]
    fn test_zero_budget_still_runs_first_trial() {
        let (train, valid) = datasets();
        let experiment = MulticlassExperiment::with_trainers(
            ExperimentSettings::new(Duration::ZERO),
            vec![
                Box::new(NaiveBayesTrainer { alpha: 1.0 }),
                Box::new(NaiveBayesTrainer { alpha: 0.5 }),
            ],
        );
        let result = experiment.execute(&train, &valid, &mut NoopReporter).unwrap();
        assert_eq!(result.runs.len(), 1);
        assert_eq!(result.best_index, 0);
    }

    #[test]
    fn test_failed_trial_is_skipped() {
        let (train, valid) = datasets();
        let experiment = MulticlassExperiment::with_trainers(
            ExperimentSettings::new(Duration::from_secs(60)),
            vec![Box::new(FailingTrainer), Box::new(NaiveBayesTrainer { alpha: 1.0 })],
        );
        let result = experiment.execute(&train, &valid, &mut NoopReporter).unwrap();
        assert_eq!(result.runs.len(), 2);
        assert!(result.runs[0].validation_metrics.is_none());
        assert_eq!(result.runs[0].error.as_deref(), Some("Training failed: boom"));
        assert_eq!(result.best_index, 1);
    }

    #[test]
    fn test_all_trials_failing_is_an_error() {
        let (train, valid) = datasets();
        let experiment = MulticlassExperiment::with_trainers(
            ExperimentSettings::new(Duration::from_secs(60)),
            vec![Box::new(FailingTrainer)],
        );
        let err = experiment.execute(&train, &valid, &mut NoopReporter).unwrap_err();
        assert!(matches!(err, PredictorError::Training(_)));
    }

    #[test]
    fn test_best_run_respects_metric_direction() {
        let (train, valid) = datasets();
        let experiment = MulticlassExperiment::with_trainers(
            ExperimentSettings::new(Duration::from_secs(60)).with_metric(OptimizingMetric::LogLoss),
            vec![
                Box::new(NaiveBayesTrainer { alpha: 5.0 }),
                Box::new(NaiveBayesTrainer { alpha: 0.1 }),
            ],
        );
        let result = experiment.execute(&train, &valid, &mut NoopReporter).unwrap();
        let best = result.best_run().validation_metrics.as_ref().unwrap().log_loss;
        for run in &result.runs {
            assert!(best <= run.validation_metrics.as_ref().unwrap().log_loss);
        }
    }

    #[test]
    fn test_single_class_training_rejected() {
        let train = LabeledDataset::from_reader(
            "title,violence,esrb_rating\na,1,T\nb,0,T\n".as_bytes(),
            Path::new("train.csv"),
            None,
        )
        .unwrap();
        let experiment = MulticlassExperiment::new(ExperimentSettings::new(Duration::from_secs(1)));
        let err = experiment.execute(&train, &train, &mut NoopReporter).unwrap_err();
        assert!(matches!(err, PredictorError::Training(_)));
    }

    #[test]
    fn test_metric_parsing_and_direction() {
        assert_eq!("log-loss".parse::<OptimizingMetric>().unwrap(), OptimizingMetric::LogLoss);
        assert_eq!(
            "MACRO_ACCURACY".parse::<OptimizingMetric>().unwrap(),
            OptimizingMetric::MacroAccuracy
        );
        assert!("f1".parse::<OptimizingMetric>().is_err());
        assert!(OptimizingMetric::LogLoss.is_better(0.1, 0.2));
        assert!(OptimizingMetric::MacroAccuracy.is_better(0.9, 0.8));
        assert!(!OptimizingMetric::MacroAccuracy.is_better(0.8, 0.8));
    }
}
