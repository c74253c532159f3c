//! ESRB rating prediction library
//!
//! This crate provides the core functionality for:
//! - Game content descriptor records and CSV loading
//! - Automated search for a multi-class rating classifier
//! - A predictor facade with train, predict, save and load
//! - Health checks and observability

pub mod automl;
pub mod dataset;
pub mod error;
pub mod health;
pub mod models;
pub mod observability;
pub mod predictor;

pub use automl::{OptimizingMetric, ProgressReporter, RunDetail};
pub use dataset::{load_games, LabeledDataset, DEFAULT_TEST_FRACTION};
pub use error::{PredictorError, Result};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{PredictorMetrics, StructuredLogger};
pub use predictor::{
    EsrbPredictor, GameClassificationResult, ModelInfo, ModelWrapper, PredictionResult,
    PredictorConfig, TrainedModel, TrainingSummary, DEFAULT_MODEL_FILE,
};
