//! Console progress for model search trials

use esrb_lib::{ProgressReporter, RunDetail};
use std::io::Write;

/// Prints one line per finished trial
pub struct ConsoleProgressReporter<W: Write> {
    out: W,
}

impl<W: Write> ConsoleProgressReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> ProgressReporter for ConsoleProgressReporter<W> {
    fn report(&mut self, run: &RunDetail) {
        // Progress lines are best effort
        let _ = match &run.validation_metrics {
            Some(metrics) => writeln!(
                self.out,
                "{} ran in {:.2} seconds with accuracy of {:.2}%",
                run.trainer_name,
                run.runtime_secs,
                metrics.macro_accuracy * 100.0
            ),
            None => writeln!(
                self.out,
                "{} ran in {:.2} seconds but did not complete. Time likely expired.",
                run.trainer_name, run.runtime_secs
            ),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_run_line() {
        let mut out = Vec::new();
        ConsoleProgressReporter::new(&mut out).report(&RunDetail {
            trainer_name: "LbfgsLogisticRegression(l2=1, max_iter=100)".into(),
            runtime_secs: 0.5,
            validation_metrics: None,
            error: Some("boom".into()),
        });
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "LbfgsLogisticRegression(l2=1, max_iter=100) ran in 0.50 seconds but did not complete. Time likely expired.\n"
        );
    }
}
