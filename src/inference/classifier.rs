//! Multinomial logistic regression trained with full-batch gradient descent.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    /// Class labels, sorted.
    pub classes: Vec<String>,
    /// One weight row per class.
    pub coef: Vec<Vec<f64>>,
    pub intercept: Vec<f64>,
}

/// Training hyper-parameters.
#[derive(Debug, Clone, Copy)]
pub struct TrainParams {
    /// Inverse regularization strength.
    pub c: f64,
    pub max_iter: usize,
    pub learning_rate: f64,
    /// Stop once the gradient norm drops below this.
    pub tolerance: f64,
}

impl Default for TrainParams {
    fn default() -> Self {
        Self {
            c: 1.0,
            max_iter: 600,
            learning_rate: 1.0,
            tolerance: 1e-5,
        }
    }
}

fn softmax(scores: &mut [f64]) {
    let max = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let mut sum = 0.0;
    for score in scores.iter_mut() {
        *score = (*score - max).exp();
        sum += *score;
    }
    for score in scores.iter_mut() {
        *score /= sum;
    }
}

impl LogisticRegression {
    /// Fit on dense feature rows. `labels` must be as long as `rows`.
    pub fn fit(rows: &[Vec<f64>], labels: &[String], params: TrainParams) -> Self {
        let mut classes: Vec<String> = labels.to_vec();
        classes.sort();
        classes.dedup();

        let n_samples = rows.len().max(1) as f64;
        let n_features = rows.first().map(|r| r.len()).unwrap_or(0);
        let n_classes = classes.len();

        let targets: Vec<usize> = labels
            .iter()
            .map(|label| classes.binary_search(label).unwrap_or(0))
            .collect();

        let mut model = Self {
            classes,
            coef: vec![vec![0.0; n_features]; n_classes],
            intercept: vec![0.0; n_classes],
        };
        if n_classes < 2 {
            return model;
        }

        // Per-sample share of the L2 penalty.
        let l2 = 1.0 / (params.c * n_samples);

        for _ in 0..params.max_iter {
            let mut grad_w = vec![vec![0.0; n_features]; n_classes];
            let mut grad_b = vec![0.0; n_classes];

            for (row, &target) in rows.iter().zip(&targets) {
                let probabilities = model.predict_proba(row);
                for (k, probability) in probabilities.iter().enumerate() {
                    let error = probability - if k == target { 1.0 } else { 0.0 };
                    if error == 0.0 {
                        continue;
                    }
                    grad_b[k] += error;
                    for (g, x) in grad_w[k].iter_mut().zip(row) {
                        *g += error * x;
                    }
                }
            }

            let mut norm_sq = 0.0;
            for k in 0..n_classes {
                for (j, g) in grad_w[k].iter_mut().enumerate() {
                    *g = *g / n_samples + l2 * model.coef[k][j];
                    norm_sq += *g * *g;
                }
                grad_b[k] /= n_samples;
                norm_sq += grad_b[k] * grad_b[k];
            }

            if norm_sq.sqrt() < params.tolerance {
                break;
            }

            for k in 0..n_classes {
                for (w, g) in model.coef[k].iter_mut().zip(&grad_w[k]) {
                    *w -= params.learning_rate * g;
                }
                model.intercept[k] -= params.learning_rate * grad_b[k];
            }
        }

        model
    }

    /// Class probabilities for one feature row, in `classes` order.
    pub fn predict_proba(&self, row: &[f64]) -> Vec<f64> {
        if self.classes.len() == 1 {
            return vec![1.0];
        }
        let mut scores: Vec<f64> = self
            .coef
            .iter()
            .zip(&self.intercept)
            .map(|(weights, bias)| {
                bias + weights.iter().zip(row).map(|(w, x)| w * x).sum::<f64>()
            })
            .collect();
        softmax(&mut scores);
        scores
    }

    /// Index of the most probable class, with its probability.
    pub fn predict_best(&self, row: &[f64]) -> Option<(usize, f64)> {
        self.predict_proba(row)
            .into_iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
    }
}
