// File: lisabot-core/src/model/tfidf.rs

use serde::{Deserialize, Serialize};

use crate::model::{FeatureTransform, SparseVector};

/// Inverse-document-frequency weighting followed by L2 normalisation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TfidfTransformer {
    idf: Vec<f64>,
}

impl TfidfTransformer {
    pub fn from_idf(idf: Vec<f64>) -> Self {
        Self { idf }
    }

    /// Smoothed idf: `ln((1 + n) / (1 + df)) + 1`.
    pub fn fit(rows: &[SparseVector], n_features: usize) -> Self {
        let mut df = vec![0usize; n_features];
        for row in rows {
            for &(idx, value) in row {
                if value != 0.0 && idx < n_features {
                    df[idx] += 1;
                }
            }
        }
        let n = rows.len() as f64;
        let idf = df
            .into_iter()
            .map(|d| ((1.0 + n) / (1.0 + d as f64)).ln() + 1.0)
            .collect();
        Self { idf }
    }

    pub fn idf(&self) -> &[f64] {
        &self.idf
    }
}

impl FeatureTransform for TfidfTransformer {
    fn transform(&self, features: SparseVector) -> SparseVector {
        let mut weighted: SparseVector = features
            .into_iter()
            .filter_map(|(idx, value)| self.idf.get(idx).map(|w| (idx, value * w)))
            .collect();
        let norm = weighted.iter().map(|(_, v)| v * v).sum::<f64>().sqrt();
        if norm > 0.0 {
            for (_, v) in weighted.iter_mut() {
                *v /= norm;
            }
        }
        weighted
    }

    fn n_features(&self) -> usize {
        self.idf.len()
    }
}
