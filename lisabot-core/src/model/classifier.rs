// File: lisabot-core/src/model/classifier.rs

use serde::{Deserialize, Serialize};

use crate::model::{ProbabilityEstimator, SparseVector};

/// One binary logistic model per label. Probabilities are independent, so several labels
/// can clear the threshold at once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneVsRestLogistic {
    n_features: usize,
    weights: Vec<Vec<f64>>,
    biases: Vec<f64>,
}

impl OneVsRestLogistic {
    pub fn new(n_features: usize, weights: Vec<Vec<f64>>, biases: Vec<f64>) -> Self {
        Self { n_features, weights, biases }
    }

    pub fn weights(&self) -> &[Vec<f64>] {
        &self.weights
    }

    pub fn is_consistent(&self) -> bool {
        self.weights.len() == self.biases.len()
            && self.weights.iter().all(|w| w.len() == self.n_features)
    }

    pub(crate) fn decision(&self, label: usize, features: &SparseVector) -> f64 {
        let w = &self.weights[label];
        features
            .iter()
            .filter_map(|&(idx, value)| w.get(idx).map(|wi| wi * value))
            .sum::<f64>()
            + self.biases[label]
    }
}

pub(crate) fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

impl ProbabilityEstimator for OneVsRestLogistic {
    fn predict_proba(&self, features: &SparseVector) -> Vec<f64> {
        (0..self.weights.len())
            .map(|label| sigmoid(self.decision(label, features)))
            .collect()
    }

    fn n_labels(&self) -> usize {
        self.weights.len()
    }
}
