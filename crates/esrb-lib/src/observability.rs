//! Observability infrastructure for the ESRB predictor
//!
//! Provides:
//! - Prometheus metrics (training duration, trial counts, prediction latency, model info)
//! - Structured JSON logging with tracing

use prometheus::{
    register_gauge_vec, register_histogram, register_int_counter, register_int_gauge, GaugeVec,
    Histogram, IntCounter, IntGauge,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Default histogram buckets for latency measurements (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0,
];

/// Buckets for whole training runs (in seconds)
const TRAINING_BUCKETS: &[f64] = &[0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0, 600.0];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<PredictorMetricsInner> = OnceLock::new();

struct PredictorMetricsInner {
    training_duration_seconds: Histogram,
    trials_total: IntCounter,
    failed_trials_total: IntCounter,
    prediction_latency_seconds: Histogram,
    predictions_total: IntCounter,
    prediction_errors_total: IntCounter,
    model_loaded: IntGauge,
    model_info: GaugeVec,
}

impl PredictorMetricsInner {
    fn new() -> Self {
        Self {
            training_duration_seconds: register_histogram!(
                "esrb_predictor_training_duration_seconds",
                "Wall-clock time spent in model search",
                TRAINING_BUCKETS.to_vec()
            )
            .expect("Failed to register training_duration_seconds"),

            trials_total: register_int_counter!(
                "esrb_predictor_trials_total",
                "Total number of model search trials run"
            )
            .expect("Failed to register trials_total"),

            failed_trials_total: register_int_counter!(
                "esrb_predictor_failed_trials_total",
                "Total number of model search trials that produced no model"
            )
            .expect("Failed to register failed_trials_total"),

            prediction_latency_seconds: register_histogram!(
                "esrb_predictor_prediction_latency_seconds",
                "Time spent running inference for a single game",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register prediction_latency_seconds"),

            predictions_total: register_int_counter!(
                "esrb_predictor_predictions_total",
                "Total number of ratings predicted"
            )
            .expect("Failed to register predictions_total"),

            prediction_errors_total: register_int_counter!(
                "esrb_predictor_prediction_errors_total",
                "Total number of failed prediction requests"
            )
            .expect("Failed to register prediction_errors_total"),

            model_loaded: register_int_gauge!(
                "esrb_predictor_model_loaded",
                "1 if a trained model is available for inference"
            )
            .expect("Failed to register model_loaded"),

            model_info: register_gauge_vec!(
                "esrb_predictor_model_info",
                "Information about the currently held model",
                &["trainer", "metric"]
            )
            .expect("Failed to register model_info"),
        }
    }
}

/// Predictor metrics for Prometheus exposition
///
/// A lightweight handle to the global metrics instance; clones share the
/// same underlying metrics.
#[derive(Clone, Copy)]
pub struct PredictorMetrics {
    inner: &'static PredictorMetricsInner,
}

impl Default for PredictorMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl PredictorMetrics {
    /// Create a metrics handle, registering the global metrics on first call
    pub fn new() -> Self {
        Self {
            inner: GLOBAL_METRICS.get_or_init(PredictorMetricsInner::new),
        }
    }

    pub fn observe_training_duration(&self, duration_secs: f64) {
        self.inner.training_duration_seconds.observe(duration_secs);
    }

    /// Count finished trials, `failed` of which produced no model
    pub fn inc_trials(&self, total: u64, failed: u64) {
        self.inner.trials_total.inc_by(total);
        self.inner.failed_trials_total.inc_by(failed);
    }

    pub fn observe_prediction_latency(&self, duration_secs: f64) {
        self.inner.prediction_latency_seconds.observe(duration_secs);
        self.inner.predictions_total.inc();
    }

    pub fn inc_prediction_errors(&self) {
        self.inner.prediction_errors_total.inc();
    }

    /// Record the model now held by the predictor
    pub fn set_model(&self, trainer: &str, metric: &str) {
        self.inner.model_info.reset();
        self.inner
            .model_info
            .with_label_values(&[trainer, metric])
            .set(1.0);
        self.inner.model_loaded.set(1);
    }
}

/// Structured logger for predictor events
///
/// Emits `event = ...` records for the lifecycle of the process and its model.
#[derive(Debug, Clone)]
pub struct StructuredLogger {
    source: String,
}

impl StructuredLogger {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn log_startup(&self, version: &str, model_path: &str) {
        info!(
            event = "startup",
            source = %self.source,
            version = %version,
            model_path = %model_path,
            "ESRB predictor started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "shutdown",
            source = %self.source,
            reason = %reason,
            "ESRB predictor shutting down"
        );
    }

    pub fn log_training_completed(
        &self,
        trainer: &str,
        metric: &str,
        score: f64,
        trials: usize,
        elapsed_secs: f64,
    ) {
        info!(
            event = "training_completed",
            source = %self.source,
            trainer = %trainer,
            metric = %metric,
            score = score,
            trials = trials,
            elapsed_secs = elapsed_secs,
            "Model search completed"
        );
    }

    pub fn log_model_saved(&self, path: &str, trainer: &str) {
        info!(
            event = "model_saved",
            source = %self.source,
            path = %path,
            trainer = %trainer,
            "Model saved"
        );
    }

    /// Log a load attempt; on failure the previous model stays in place
    pub fn log_model_loaded(&self, path: &str, result: Result<&str, &str>) {
        match result {
            Ok(trainer) => info!(
                event = "model_loaded",
                source = %self.source,
                path = %path,
                trainer = %trainer,
                "Model loaded"
            ),
            Err(error) => warn!(
                event = "model_load_failed",
                source = %self.source,
                path = %path,
                error = %error,
                "Model load failed, keeping previous model"
            ),
        }
    }

    pub fn log_prediction(&self, title: &str, rating: &str, confidence: f32) {
        info!(
            event = "prediction_generated",
            source = %self.source,
            title = %title,
            rating = %rating,
            confidence = confidence,
            "Predicted ESRB rating"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predictor_metrics_creation() {
        let metrics = PredictorMetrics::new();
        let again = PredictorMetrics::new();

        metrics.observe_training_duration(1.5);
        metrics.inc_trials(3, 1);
        metrics.observe_prediction_latency(0.0002);
        again.inc_prediction_errors();
        again.set_model("BernoulliNaiveBayes(alpha=1)", "macro_accuracy");

        let families = prometheus::gather();
        assert!(families
            .iter()
            .any(|f| f.get_name() == "esrb_predictor_predictions_total"));
    }

    #[test]
    fn test_structured_logger_creation() {
        let logger = StructuredLogger::new("test");
        assert_eq!(logger.source(), "test");
        logger.log_model_loaded("Model.json", Err("missing"));
    }
}
