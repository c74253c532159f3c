//! Progress reporting for model search trials

use super::RunDetail;
use tracing::{info, warn};

/// Receives every finished trial while an experiment runs
pub trait ProgressReporter {
    fn report(&mut self, run: &RunDetail);
}

/// Discards progress
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn report(&mut self, _run: &RunDetail) {}
}

/// Logs each trial through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl ProgressReporter for LogReporter {
    fn report(&mut self, run: &RunDetail) {
        match &run.validation_metrics {
            Some(metrics) => info!(
                trainer = %run.trainer_name,
                runtime_secs = run.runtime_secs,
                macro_accuracy = metrics.macro_accuracy,
                log_loss = metrics.log_loss,
                "Trial completed"
            ),
            None => warn!(
                trainer = %run.trainer_name,
                runtime_secs = run.runtime_secs,
                error = run.error.as_deref().unwrap_or("unknown"),
                "Trial did not complete"
            ),
        }
    }
}

/// Collects trials in memory
#[derive(Debug, Default, Clone)]
pub struct CollectingReporter {
    pub runs: Vec<RunDetail>,
}

impl ProgressReporter for CollectingReporter {
    fn report(&mut self, run: &RunDetail) {
        self.runs.push(run.clone());
    }
}
