//! Candidate trainers explored by the model search

use super::classifier::{BernoulliNaiveBayes, Classifier, SoftmaxRegression};
use crate::error::{PredictorError, Result};
use linfa::prelude::*;
use linfa_logistic::MultiLogisticRegression;
use ndarray::{Array1, Array2};

/// A model family with fixed hyperparameters
pub trait Trainer: Send + Sync {
    /// Display name including hyperparameters
    fn name(&self) -> String;

    /// Fit on `x` with class indices `y` in `0..num_classes`
    fn fit(&self, x: &Array2<f64>, y: &Array1<usize>, num_classes: usize) -> Result<Classifier>;
}

/// Bernoulli naive Bayes with additive smoothing
#[derive(Debug, Clone)]
pub struct NaiveBayesTrainer {
    pub alpha: f64,
}

impl Trainer for NaiveBayesTrainer {
    fn name(&self) -> String {
        format!("BernoulliNaiveBayes(alpha={})", self.alpha)
    }

    fn fit(&self, x: &Array2<f64>, y: &Array1<usize>, num_classes: usize) -> Result<Classifier> {
        let labels = y.to_vec();
        BernoulliNaiveBayes::fit(x, &labels, num_classes, self.alpha)
            .map(Classifier::NaiveBayes)
            .map_err(|e| PredictorError::Training(format!("{}: {}", self.name(), e)))
    }
}

/// Multinomial logistic regression optimized with L-BFGS
#[derive(Debug, Clone)]
pub struct LogisticRegressionTrainer {
    /// L2 regularization strength
    pub alpha: f64,
    pub max_iterations: u64,
}

impl Trainer for LogisticRegressionTrainer {
    fn name(&self) -> String {
        format!(
            "LbfgsLogisticRegression(l2={}, max_iter={})",
            self.alpha, self.max_iterations
        )
    }

    fn fit(&self, x: &Array2<f64>, y: &Array1<usize>, num_classes: usize) -> Result<Classifier> {
        let dataset = Dataset::new(x.clone(), y.clone());
        let fitted = MultiLogisticRegression::default()
            .alpha(self.alpha)
            .max_iterations(self.max_iterations)
            .fit(&dataset)
            .map_err(|e| PredictorError::Training(format!("{}: {}", self.name(), e)))?;

        // Class columns follow the sorted label order, which is 0..num_classes
        // as long as every class index occurs in `y`.
        let params = fitted.params();
        let intercept = fitted.intercept();
        if params.ncols() != num_classes || intercept.len() != num_classes {
            return Err(PredictorError::Training(format!(
                "{}: fitted {} classes, expected {}",
                self.name(),
                params.ncols(),
                num_classes
            )));
        }

        let weights = params.rows().into_iter().map(|r| r.to_vec()).collect();
        Ok(Classifier::Logistic(SoftmaxRegression {
            weights,
            intercept: intercept.to_vec(),
        }))
    }
}

/// Default search space, cheapest candidates first
pub fn default_candidates() -> Vec<Box<dyn Trainer>> {
    let mut candidates: Vec<Box<dyn Trainer>> = Vec::new();
    for alpha in [1.0, 0.5, 0.1, 2.0] {
        candidates.push(Box::new(NaiveBayesTrainer { alpha }));
    }
    for (alpha, max_iterations) in [
        (1.0, 100),
        (0.1, 100),
        (0.01, 200),
        (0.001, 300),
        (0.1, 500),
        (0.0001, 500),
    ] {
        candidates.push(Box::new(LogisticRegressionTrainer {
            alpha,
            max_iterations,
        }));
    }
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn toy() -> (Array2<f64>, Array1<usize>) {
        let x = array![
            [1.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 1.0, 1.0],
            [0.0, 0.0, 1.0],
            [0.0, 0.0, 1.0],
            [1.0, 0.0, 1.0]
        ];
        let y = array![0, 0, 0, 1, 1, 1, 2, 2, 2];
        (x, y)
    }

    #[test]
    fn test_naive_bayes_trainer_fits() {
        let (x, y) = toy();
        let model = NaiveBayesTrainer { alpha: 1.0 }.fit(&x, &y, 3).unwrap();
        assert!(model.validate(3, 3).is_ok());
    }

    #[test]
    fn test_logistic_trainer_fits() {
        let (x, y) = toy();
        let model = LogisticRegressionTrainer {
            alpha: 0.1,
            max_iterations: 100,
        }
        .fit(&x, &y, 3)
        .unwrap();
        assert!(model.validate(3, 3).is_ok());

        let p = model.predict_proba(x.row(0));
        assert!(p[0] > p[2]);
    }

    #[test]
    fn test_trainer_names_include_hyperparameters() {
        assert_eq!(
            NaiveBayesTrainer { alpha: 0.5 }.name(),
            "BernoulliNaiveBayes(alpha=0.5)"
        );
        assert!(LogisticRegressionTrainer {
            alpha: 0.01,
            max_iterations: 200
        }
        .name()
        .contains("max_iter=200"));
    }

    #[test]
    fn test_default_candidates_start_with_naive_bayes() {
        let candidates = default_candidates();
        assert!(candidates.len() >= 2);
        assert!(candidates[0].name().starts_with("BernoulliNaiveBayes"));
    }
}
