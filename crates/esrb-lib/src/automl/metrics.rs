//! Evaluation metrics for multi-class models

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Probabilities are clamped to this floor before taking logs
const LOG_LOSS_EPSILON: f64 = 1e-15;

/// Confusion matrix for a `K`-class classifier, rows are truth, columns predictions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub classes: Vec<String>,
    /// `counts[truth][predicted]`
    pub counts: Vec<Vec<u32>>,
}

impl ConfusionMatrix {
    pub fn new(classes: Vec<String>) -> Self {
        let k = classes.len();
        Self {
            classes,
            counts: vec![vec![0; k]; k],
        }
    }

    pub fn add(&mut self, truth: usize, predicted: usize) {
        if let Some(cell) = self.counts.get_mut(truth).and_then(|r| r.get_mut(predicted)) {
            *cell = cell.saturating_add(1);
        }
    }

    pub fn get(&self, truth: usize, predicted: usize) -> u32 {
        self.counts[truth][predicted]
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().flatten().map(|&c| c as u64).sum()
    }

    /// `TP / (TP + FN)` per class, `None` for classes absent from the truth
    pub fn recall(&self, class: usize) -> Option<f64> {
        let support: u32 = self.counts[class].iter().sum();
        (support > 0).then(|| self.get(class, class) as f64 / support as f64)
    }

    /// `TP / (TP + FP)` per class, `None` if the class was never predicted
    pub fn precision(&self, class: usize) -> Option<f64> {
        let predicted: u32 = self.counts.iter().map(|r| r[class]).sum();
        (predicted > 0).then(|| self.get(class, class) as f64 / predicted as f64)
    }

    /// Human-readable confusion table with per-class recall and precision
    pub fn formatted_table(&self) -> String {
        let width = self
            .classes
            .iter()
            .map(String::len)
            .chain(std::iter::once(6))
            .max()
            .unwrap_or(6);
        let rule = "=".repeat((width + 3) * self.classes.len() + 8);
        let mut out = String::new();

        let _ = writeln!(out, "Confusion table");
        let _ = writeln!(out, "{:>9} ||{}", "", rule);
        let _ = write!(out, "{:>9} ||", "PREDICTED");
        for class in &self.classes {
            let _ = write!(out, " {:>width$} |", class, width = width);
        }
        let _ = writeln!(out, " Recall");
        let _ = writeln!(out, "{:<9} ||{}", "TRUTH", rule);

        for (i, class) in self.classes.iter().enumerate() {
            let _ = write!(out, "{:>9} ||", class);
            for j in 0..self.classes.len() {
                let _ = write!(out, " {:>width$} |", self.get(i, j), width = width);
            }
            let _ = writeln!(out, " {}", format_ratio(self.recall(i)));
        }

        let _ = writeln!(out, "{:>9} ||{}", "", rule);
        let _ = write!(out, "{:>9} ||", "Precision");
        for j in 0..self.classes.len() {
            let _ = write!(out, " {:>width$} |", format_ratio(self.precision(j)), width = width);
        }
        let _ = writeln!(out);
        out
    }
}

fn format_ratio(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.4}", v))
}

/// Validation metrics for a multi-class run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MulticlassMetrics {
    /// Fraction of rows classified correctly
    pub micro_accuracy: f64,
    /// Mean of per-class recall over classes present in the truth
    pub macro_accuracy: f64,
    /// Mean negative log probability of the true class
    pub log_loss: f64,
    /// `1 - log_loss / prior_log_loss`; higher is better
    pub log_loss_reduction: f64,
    pub per_class_log_loss: Vec<f64>,
    pub confusion_matrix: ConfusionMatrix,
}

impl MulticlassMetrics {
    /// Evaluate class probabilities against truth indices.
    ///
    /// `prior` holds the training class frequencies used as the baseline for
    /// the log-loss reduction.
    pub fn evaluate(probs: &Array2<f64>, truth: &[usize], classes: &[String], prior: &[f64]) -> Self {
        let k = classes.len();
        let mut confusion = ConfusionMatrix::new(classes.to_vec());
        let mut loss_sum = 0.0;
        let mut prior_loss_sum = 0.0;
        let mut class_loss = vec![0.0; k];
        let mut class_rows = vec![0u32; k];

        for (row, &t) in probs.rows().into_iter().zip(truth) {
            let predicted = argmax(row.iter().copied());
            confusion.add(t, predicted);

            let loss = -row[t].max(LOG_LOSS_EPSILON).ln();
            loss_sum += loss;
            class_loss[t] += loss;
            class_rows[t] += 1;
            prior_loss_sum += -prior.get(t).copied().unwrap_or(0.0).max(LOG_LOSS_EPSILON).ln();
        }

        let n = truth.len().max(1) as f64;
        let correct: u64 = (0..k).map(|i| confusion.get(i, i) as u64).sum();
        let recalls: Vec<f64> = (0..k).filter_map(|i| confusion.recall(i)).collect();
        let macro_accuracy = if recalls.is_empty() {
            0.0
        } else {
            recalls.iter().sum::<f64>() / recalls.len() as f64
        };
        let log_loss = loss_sum / n;
        let prior_log_loss = prior_loss_sum / n;
        let log_loss_reduction = if prior_log_loss > 0.0 {
            1.0 - log_loss / prior_log_loss
        } else {
            0.0
        };
        let per_class_log_loss = class_loss
            .iter()
            .zip(&class_rows)
            .map(|(&l, &rows)| if rows == 0 { 0.0 } else { l / rows as f64 })
            .collect();

        Self {
            micro_accuracy: correct as f64 / n,
            macro_accuracy,
            log_loss,
            log_loss_reduction,
            per_class_log_loss,
            confusion_matrix: confusion,
        }
    }
}

/// Index of the largest value, first one on ties
pub fn argmax(values: impl IntoIterator<Item = f64>) -> usize {
    let mut best = 0usize;
    let mut best_val = f64::NEG_INFINITY;
    for (idx, v) in values.into_iter().enumerate() {
        if v > best_val {
            best_val = v;
            best = idx;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn classes() -> Vec<String> {
        vec!["E".into(), "T".into(), "M".into()]
    }

    #[test]
    fn test_perfect_predictions() {
        let probs = array![[0.9, 0.05, 0.05], [0.1, 0.8, 0.1], [0.0, 0.1, 0.9]];
        let m = MulticlassMetrics::evaluate(&probs, &[0, 1, 2], &classes(), &[1.0 / 3.0; 3]);
        assert_eq!(m.micro_accuracy, 1.0);
        assert_eq!(m.macro_accuracy, 1.0);
        assert!(m.log_loss > 0.0);
        assert!(m.log_loss_reduction > 0.0);
        assert_eq!(m.confusion_matrix.total(), 3);
    }

    #[test]
    fn test_macro_accuracy_averages_recall() {
        // Three E rows (all right), one T row (wrong)
        let probs = array![
            [0.9, 0.1, 0.0],
            [0.9, 0.1, 0.0],
            [0.9, 0.1, 0.0],
            [0.9, 0.1, 0.0]
        ];
        let m = MulticlassMetrics::evaluate(&probs, &[0, 0, 0, 1], &classes(), &[0.5, 0.25, 0.25]);
        assert!((m.micro_accuracy - 0.75).abs() < 1e-12);
        // Recall E = 1.0, recall T = 0.0, M absent
        assert!((m.macro_accuracy - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_log_loss_clamps_zero_probability() {
        let probs = array![[1.0, 0.0, 0.0]];
        let m = MulticlassMetrics::evaluate(&probs, &[1], &classes(), &[1.0 / 3.0; 3]);
        assert!(m.log_loss.is_finite());
        assert!(m.log_loss > 30.0);
    }

    #[test]
    fn test_precision_and_recall() {
        let mut cm = ConfusionMatrix::new(classes());
        cm.add(0, 0);
        cm.add(0, 1);
        cm.add(1, 1);
        assert_eq!(cm.recall(0), Some(0.5));
        assert_eq!(cm.precision(1), Some(0.5));
        assert_eq!(cm.recall(2), None);
        assert_eq!(cm.precision(2), None);
    }

    #[test]
    fn test_formatted_table_lists_classes() {
        let mut cm = ConfusionMatrix::new(classes());
        cm.add(2, 2);
        let table = cm.formatted_table();
        assert!(table.contains("PREDICTED"));
        assert!(table.contains("Precision"));
        assert!(table.contains("1.0000"));
        for class in classes() {
            assert!(table.contains(&class));
        }
    }

    #[test]
    fn test_argmax_first_on_ties() {
        assert_eq!(argmax([0.2, 0.4, 0.4]), 1);
        assert_eq!(argmax(Vec::<f64>::new()), 0);
    }
}
