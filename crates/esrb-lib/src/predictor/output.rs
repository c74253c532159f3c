//! Prediction results returned to callers
//!
//! Scores are carried together with the label order they were produced in,
//! so per-rating lookups never depend on a fixed column position.

use crate::automl::argmax;
use crate::models::EsrbRating;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Predicted rating plus the full class distribution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionResult {
    /// Label with the highest score
    pub esrb_rating: String,
    /// Class probabilities, `score[i]` belongs to `labels[i]`
    pub score: Vec<f32>,
    pub labels: Vec<String>,
}

impl PredictionResult {
    /// Build from class probabilities in `labels` order.
    ///
    /// Negative or non-finite inputs are clamped to zero. The predicted label
    /// is the first maximum of the stored `f32` scores.
    pub fn from_probabilities(labels: &[String], probabilities: &[f64]) -> Self {
        let score: Vec<f32> = probabilities
            .iter()
            .map(|&p| if p.is_finite() { p.max(0.0) as f32 } else { 0.0 })
            .collect();
        let best = argmax(score.iter().map(|&s| s as f64));
        Self {
            esrb_rating: labels.get(best).cloned().unwrap_or_default(),
            score,
            labels: labels.to_vec(),
        }
    }

    /// Score of the predicted label
    pub fn confidence(&self) -> f32 {
        self.score.iter().copied().fold(0.0, f32::max)
    }

    /// Score for an exact class label, `None` if the model has no such class
    pub fn probability(&self, label: &str) -> Option<f32> {
        self.labels
            .iter()
            .position(|l| l == label)
            .and_then(|i| self.score.get(i).copied())
    }

    /// Score for a rating, accepting any of its label spellings
    pub fn rating_probability(&self, rating: EsrbRating) -> f32 {
        self.labels
            .iter()
            .zip(&self.score)
            .filter(|(label, _)| rating.matches(label))
            .map(|(_, &s)| s)
            .sum()
    }

    /// Predicted rating if the label is one of the four known ratings
    pub fn rating(&self) -> Option<EsrbRating> {
        self.esrb_rating.parse().ok()
    }
}

/// A prediction for a titled game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameClassificationResult {
    pub title: String,
    pub prediction: PredictionResult,
}

impl GameClassificationResult {
    pub fn new(title: impl Into<String>, prediction: PredictionResult) -> Self {
        Self {
            title: title.into(),
            prediction,
        }
    }

    pub fn esrb_rating(&self) -> &str {
        &self.prediction.esrb_rating
    }

    pub fn confidence(&self) -> f32 {
        self.prediction.confidence()
    }

    pub fn everyone_probability(&self) -> f32 {
        self.prediction.rating_probability(EsrbRating::Everyone)
    }

    pub fn everyone_ten_plus_probability(&self) -> f32 {
        self.prediction.rating_probability(EsrbRating::EveryoneTenPlus)
    }

    pub fn teen_probability(&self) -> f32 {
        self.prediction.rating_probability(EsrbRating::Teen)
    }

    pub fn mature_probability(&self) -> f32 {
        self.prediction.rating_probability(EsrbRating::Mature)
    }
}

impl fmt::Display for GameClassificationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "E: {:.2}%, E10+: {:.2}%, T: {:.2}%, M: {:.2}%",
            self.everyone_probability() * 100.0,
            self.everyone_ten_plus_probability() * 100.0,
            self.teen_probability() * 100.0,
            self.mature_probability() * 100.0
        )
    }
}
