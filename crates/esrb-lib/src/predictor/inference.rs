//! Inference engine bound to one trained model

use super::features::FeatureExtractor;
use super::output::PredictionResult;
use super::TrainedModel;
use crate::error::Result;
use crate::models::GameInfo;
use ndarray::Array1;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Maximum inference latency before warning
const MAX_INFERENCE_MS: u128 = 5;

/// Applies a trained model to single records.
///
/// Built lazily by the facade and discarded whenever the model changes, so an
/// engine never outlives the model it was bound to.
pub struct PredictionEngine {
    model: Arc<TrainedModel>,
    extractor: FeatureExtractor,
    inference_count: AtomicU64,
    slow_inference_count: AtomicU64,
}

impl PredictionEngine {
    pub fn bind(model: Arc<TrainedModel>) -> Result<Self> {
        let extractor = FeatureExtractor::new(&model.schema)?;
        Ok(Self {
            model,
            extractor,
            inference_count: AtomicU64::new(0),
            slow_inference_count: AtomicU64::new(0),
        })
    }

    /// Returns true if this engine was built for `model`
    pub fn is_bound_to(&self, model: &Arc<TrainedModel>) -> bool {
        Arc::ptr_eq(&self.model, model)
    }

    pub fn predict(&self, game: &GameInfo) -> PredictionResult {
        let start = Instant::now();

        let features = Array1::from(self.extractor.extract(game));
        let probabilities = self.model.classifier.predict_proba(features.view());
        let result = PredictionResult::from_probabilities(&self.model.classes, &probabilities);

        let elapsed = start.elapsed();
        self.inference_count.fetch_add(1, Ordering::Relaxed);
        if elapsed.as_millis() > MAX_INFERENCE_MS {
            self.slow_inference_count.fetch_add(1, Ordering::Relaxed);
            warn!(elapsed_ms = elapsed.as_millis(), "Inference exceeded {}ms target", MAX_INFERENCE_MS);
        } else {
            debug!(
                elapsed_us = elapsed.as_micros(),
                rating = %result.esrb_rating,
                "Inference completed"
            );
        }

        result
    }

    pub fn stats(&self) -> InferenceStats {
        InferenceStats {
            total_inferences: self.inference_count.load(Ordering::Relaxed),
            slow_inferences: self.slow_inference_count.load(Ordering::Relaxed),
        }
    }
}

/// Inference statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InferenceStats {
    pub total_inferences: u64,
    pub slow_inferences: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automl::{Classifier, OptimizingMetric, SoftmaxRegression};
    use crate::predictor::DataSchema;

    fn model() -> Arc<TrainedModel> {
        Arc::new(TrainedModel {
            classes: vec!["E".into(), "M".into()],
            schema: DataSchema::from_header(["blood_and_gore", "esrb_rating"]).unwrap(),
            classifier: Classifier::Logistic(SoftmaxRegression {
                weights: vec![vec![-3.0, 3.0]],
                intercept: vec![0.5, -0.5],
            }),
            trainer_name: "fixed".into(),
            metric: OptimizingMetric::MacroAccuracy,
            validation_metrics: None,
            trained_at: chrono::Utc::now(),
        })
    }

    #[test]
    fn test_engine_predicts_from_bound_model() {
        let engine = PredictionEngine::bind(model()).unwrap();

        let gory = GameInfo::new("Gory").with("blood_and_gore");
        assert_eq!(engine.predict(&gory).esrb_rating, "M");
        let tame = GameInfo::new("Tame");
        let result = engine.predict(&tame);
        assert_eq!(result.esrb_rating, "E");
        assert_eq!(result.labels, vec!["E", "M"]);

        assert_eq!(engine.stats().total_inferences, 2);
    }

    #[test]
    fn test_engine_tracks_its_model() {
        let bound = model();
        let engine = PredictionEngine::bind(bound.clone()).unwrap();
        assert!(engine.is_bound_to(&bound));
        assert!(!engine.is_bound_to(&model()));
    }
}
