//! Fitted classifiers produced by the model search
//!
//! Both model families are stored as plain parameter tables so the model
//! artifact does not depend on any trainer's internal representation.

use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};

/// A fitted multi-class classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Classifier {
    NaiveBayes(BernoulliNaiveBayes),
    Logistic(SoftmaxRegression),
}

impl Classifier {
    pub fn num_classes(&self) -> usize {
        match self {
            Classifier::NaiveBayes(m) => m.class_log_prior.len(),
            Classifier::Logistic(m) => m.intercept.len(),
        }
    }

    pub fn num_features(&self) -> usize {
        match self {
            Classifier::NaiveBayes(m) => m.feature_log_prob.first().map_or(0, Vec::len),
            Classifier::Logistic(m) => m.weights.len(),
        }
    }

    /// Class probabilities for one feature vector, in class index order
    pub fn predict_proba(&self, x: ArrayView1<f64>) -> Vec<f64> {
        let logits = match self {
            Classifier::NaiveBayes(m) => m.joint_log_likelihood(x),
            Classifier::Logistic(m) => m.logits(x),
        };
        softmax(&logits)
    }

    /// Class probabilities for every row of `x`
    pub fn predict_proba_batch(&self, x: &Array2<f64>) -> Array2<f64> {
        let k = self.num_classes();
        let mut out = Array2::zeros((x.nrows(), k));
        for (i, row) in x.rows().into_iter().enumerate() {
            for (j, p) in self.predict_proba(row).into_iter().enumerate() {
                out[[i, j]] = p;
            }
        }
        out
    }

    /// Validate internal dimensions against an expected shape
    pub fn validate(&self, num_features: usize, num_classes: usize) -> Result<(), String> {
        if self.num_classes() != num_classes {
            return Err(format!(
                "classifier has {} classes, expected {}",
                self.num_classes(),
                num_classes
            ));
        }
        if self.num_features() != num_features {
            return Err(format!(
                "classifier has {} features, expected {}",
                self.num_features(),
                num_features
            ));
        }
        let consistent = match self {
            Classifier::NaiveBayes(m) => {
                m.feature_log_prob.len() == num_classes
                    && m.feature_log_neg_prob.len() == num_classes
                    && m.feature_log_neg_prob.iter().all(|r| r.len() == num_features)
            }
            Classifier::Logistic(m) => m.weights.iter().all(|r| r.len() == num_classes),
        };
        if consistent {
            Ok(())
        } else {
            Err("classifier parameter tables are ragged".to_string())
        }
    }
}

/// Bernoulli naive Bayes over binary descriptor features
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BernoulliNaiveBayes {
    pub alpha: f64,
    /// log P(class)
    pub class_log_prior: Vec<f64>,
    /// log P(feature = 1 | class), `[class][feature]`
    pub feature_log_prob: Vec<Vec<f64>>,
    /// log P(feature = 0 | class), `[class][feature]`
    pub feature_log_neg_prob: Vec<Vec<f64>>,
}

impl BernoulliNaiveBayes {
    /// Fit with additive (Laplace/Lidstone) smoothing `alpha`
    pub fn fit(x: &Array2<f64>, y: &[usize], num_classes: usize, alpha: f64) -> Result<Self, String> {
        let (n_samples, n_features) = x.dim();
        if n_samples == 0 {
            return Err("cannot fit with empty data".to_string());
        }
        if y.len() != n_samples {
            return Err("number of samples in X and y must match".to_string());
        }
        if num_classes < 2 {
            return Err("need at least 2 classes".to_string());
        }

        let alpha = alpha.max(1e-10);
        let mut class_counts = vec![0.0f64; num_classes];
        let mut feature_counts = vec![vec![0.0f64; n_features]; num_classes];

        for (row, &class) in x.rows().into_iter().zip(y) {
            if class >= num_classes {
                return Err(format!("class index {} out of range", class));
            }
            class_counts[class] += 1.0;
            for (count, &value) in feature_counts[class].iter_mut().zip(row.iter()) {
                if value > 0.5 {
                    *count += 1.0;
                }
            }
        }

        let total = n_samples as f64;
        let class_log_prior = class_counts
            .iter()
            .map(|&c| (c.max(1e-9) / total).ln())
            .collect();

        let mut feature_log_prob = Vec::with_capacity(num_classes);
        let mut feature_log_neg_prob = Vec::with_capacity(num_classes);
        for (class, counts) in feature_counts.iter().enumerate() {
            let denom = class_counts[class] + 2.0 * alpha;
            let probs: Vec<f64> = counts.iter().map(|&c| (c + alpha) / denom).collect();
            feature_log_prob.push(probs.iter().map(|p| p.ln()).collect());
            feature_log_neg_prob.push(probs.iter().map(|p| (1.0 - p).ln()).collect());
        }

        Ok(Self {
            alpha,
            class_log_prior,
            feature_log_prob,
            feature_log_neg_prob,
        })
    }

    fn joint_log_likelihood(&self, x: ArrayView1<f64>) -> Vec<f64> {
        self.class_log_prior
            .iter()
            .enumerate()
            .map(|(class, prior)| {
                let pos = &self.feature_log_prob[class];
                let neg = &self.feature_log_neg_prob[class];
                prior
                    + x.iter()
                        .enumerate()
                        .map(|(f, &v)| if v > 0.5 { pos[f] } else { neg[f] })
                        .sum::<f64>()
            })
            .collect()
    }
}

/// Multinomial logistic regression parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoftmaxRegression {
    /// `[feature][class]`
    pub weights: Vec<Vec<f64>>,
    /// `[class]`
    pub intercept: Vec<f64>,
}

impl SoftmaxRegression {
    fn logits(&self, x: ArrayView1<f64>) -> Vec<f64> {
        let mut logits = self.intercept.clone();
        for (row, &v) in self.weights.iter().zip(x.iter()) {
            if v == 0.0 {
                continue;
            }
            for (logit, w) in logits.iter_mut().zip(row) {
                *logit += w * v;
            }
        }
        logits
    }
}

/// Numerically stable softmax
pub fn softmax(logits: &[f64]) -> Vec<f64> {
    let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return vec![1.0 / logits.len().max(1) as f64; logits.len()];
    }
    let exps: Vec<f64> = logits.iter().map(|l| (l - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}
